//! Type-aware table sorting.
//!
//! Rows are plain string cells; each column declares how its cells compare.
//! Ties on the sort column fall back to the remaining columns left to right
//! so repeated sorts produce a stable total order.

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Text,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    pub fn flip(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }

    pub fn indicator(self) -> &'static str {
        match self {
            Direction::Ascending => "▲",
            Direction::Descending => "▼",
        }
    }
}

/// Compare two cells under a column's type. Unparseable integers count as
/// zero; text compares case-insensitively; unparseable timestamps sort
/// before parseable ones.
pub fn compare_cells(kind: ColumnKind, a: &str, b: &str) -> Ordering {
    match kind {
        ColumnKind::Integer => {
            let a = a.trim().parse::<i64>().unwrap_or(0);
            let b = b.trim().parse::<i64>().unwrap_or(0);
            a.cmp(&b)
        }
        ColumnKind::Text => a.trim().to_lowercase().cmp(&b.trim().to_lowercase()),
        ColumnKind::Timestamp => parse_timestamp(a).cmp(&parse_timestamp(b)),
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Reorder `rows` by `column`. `kinds` gives each column's comparison type;
/// missing cells compare as empty strings.
pub fn sort_rows(
    rows: &mut [Vec<String>],
    column: usize,
    kinds: &[ColumnKind],
    direction: Direction,
) {
    let kind_of = |i: usize| kinds.get(i).copied().unwrap_or(ColumnKind::Text);
    let cell = |row: &Vec<String>, i: usize| -> String {
        row.get(i).map(|s| s.trim().to_string()).unwrap_or_default()
    };

    rows.sort_by(|a, b| {
        let mut ord = compare_cells(kind_of(column), &cell(a, column), &cell(b, column));

        if ord == Ordering::Equal {
            // Tie-break over the remaining columns for stability.
            let width = a.len().max(b.len());
            for i in 0..width {
                if i == column {
                    continue;
                }
                ord = compare_cells(kind_of(i), &cell(a, i), &cell(b, i));
                if ord != Ordering::Equal {
                    break;
                }
            }
        }

        match direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn integer_columns_compare_numerically() {
        assert_eq!(compare_cells(ColumnKind::Integer, "9", "10"), Ordering::Less);
        assert_eq!(compare_cells(ColumnKind::Integer, "-3", "2"), Ordering::Less);
        // unparseable counts as zero
        assert_eq!(compare_cells(ColumnKind::Integer, "x", "0"), Ordering::Equal);
    }

    #[test]
    fn text_columns_ignore_case() {
        assert_eq!(compare_cells(ColumnKind::Text, "Beta", "alpha"), Ordering::Greater);
        assert_eq!(compare_cells(ColumnKind::Text, "ALPHA", "alpha"), Ordering::Equal);
    }

    #[test]
    fn timestamp_columns_compare_by_parsed_time() {
        assert_eq!(
            compare_cells(
                ColumnKind::Timestamp,
                "2024-03-01 08:00:00",
                "2024-03-01 09:30:00"
            ),
            Ordering::Less
        );
        // date-only format
        assert_eq!(
            compare_cells(ColumnKind::Timestamp, "2024-02-29", "2024-03-01"),
            Ordering::Less
        );
        // unparseable sorts first
        assert_eq!(
            compare_cells(ColumnKind::Timestamp, "-", "2024-03-01"),
            Ordering::Less
        );
    }

    #[test]
    fn sorts_rows_by_column_and_direction() {
        let kinds = [ColumnKind::Integer, ColumnKind::Text];
        let mut table = rows(&[&["3", "c"], &["1", "a"], &["2", "b"]]);

        sort_rows(&mut table, 0, &kinds, Direction::Ascending);
        assert_eq!(table[0][0], "1");
        assert_eq!(table[2][0], "3");

        sort_rows(&mut table, 0, &kinds, Direction::Descending);
        assert_eq!(table[0][0], "3");
        assert_eq!(table[2][0], "1");
    }

    #[test]
    fn ties_fall_back_to_remaining_columns() {
        let kinds = [ColumnKind::Integer, ColumnKind::Text, ColumnKind::Timestamp];
        let mut table = rows(&[
            &["1", "zed", "2024-01-02"],
            &["1", "ant", "2024-01-03"],
            &["1", "ant", "2024-01-01"],
        ]);

        sort_rows(&mut table, 0, &kinds, Direction::Ascending);
        assert_eq!(table[0][1], "ant");
        assert_eq!(table[0][2], "2024-01-01");
        assert_eq!(table[1][2], "2024-01-03");
        assert_eq!(table[2][1], "zed");
    }

    #[test]
    fn ragged_rows_compare_missing_cells_as_empty() {
        let kinds = [ColumnKind::Text, ColumnKind::Text];
        let mut table = rows(&[&["b", "x"], &["a"]]);
        sort_rows(&mut table, 1, &kinds, Direction::Ascending);
        assert_eq!(table[0][0], "a");
    }
}
