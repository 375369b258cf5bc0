use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::sort::ColumnKind;

/// Construction attributes for one range track, read once per build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackConfig {
    /// Derives the form-field identifiers (`{id}__gte` / `{id}__lte` for
    /// the two-handle case, `{id}-slider-{index}` otherwise).
    pub id: String,

    /// Display title; falls back to `id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default = "default_num_sliders")]
    pub num_sliders: usize,

    #[serde(default)]
    pub slider_min: f64,

    #[serde(default = "default_slider_max")]
    pub slider_max: f64,

    /// JSON-encoded array of floats/nulls, in the scale of min..max.
    /// Kept as a string attribute; parsed at widget construction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_values: Option<String>,
}

fn default_num_sliders() -> usize {
    2
}

fn default_slider_max() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    pub name: String,
    pub kind: ColumnKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub columns: Vec<TableColumn>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub tracks: Vec<TrackConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableConfig>,
}

impl AppConfig {
    /// Get the default config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("rangetrack");
        Ok(config_dir.join("config.toml"))
    }

    /// Load config from an explicit path, the default location, or fall
    /// back to the built-in demo configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read config {}", path.display()))?;
            return toml::from_str(&content)
                .with_context(|| format!("cannot parse config {}", path.display()));
        }

        if let Ok(path) = Self::config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(content) => match toml::from_str(&content) {
                        Ok(config) => return Ok(config),
                        Err(e) => tracing::warn!("Failed to parse config: {}", e),
                    },
                    Err(e) => tracing::warn!("Failed to read config: {}", e),
                }
            }
        }

        Ok(Self::demo())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Built-in demo: a couple of filter tracks plus a sortable task table.
    pub fn demo() -> Self {
        Self {
            tracks: vec![
                TrackConfig {
                    id: "obs_freq".to_string(),
                    label: Some("Observing frequency (MHz)".to_string()),
                    num_sliders: 2,
                    slider_min: 70.0,
                    slider_max: 300.0,
                    initial_values: Some("[120, 231.5]".to_string()),
                },
                TrackConfig {
                    id: "score".to_string(),
                    label: Some("Classifier score".to_string()),
                    num_sliders: 2,
                    slider_min: 0.0,
                    slider_max: 100.0,
                    initial_values: None,
                },
                TrackConfig {
                    id: "confidence".to_string(),
                    label: Some("Confidence bands".to_string()),
                    num_sliders: 3,
                    slider_min: 0.0,
                    slider_max: 1.0,
                    initial_values: Some("[0.2, null, 0.8]".to_string()),
                },
            ],
            table: Some(TableConfig {
                columns: vec![
                    TableColumn {
                        name: "ID".to_string(),
                        kind: ColumnKind::Integer,
                    },
                    TableColumn {
                        name: "Task name".to_string(),
                        kind: ColumnKind::Text,
                    },
                    TableColumn {
                        name: "Start".to_string(),
                        kind: ColumnKind::Timestamp,
                    },
                    TableColumn {
                        name: "End".to_string(),
                        kind: ColumnKind::Timestamp,
                    },
                ],
                rows: vec![
                    row(&["12", "survey_a", "2024-03-01 08:00:00", "2024-03-01 09:30:00"]),
                    row(&["3", "calibration", "2024-03-01 06:15:00", "2024-03-01 06:45:00"]),
                    row(&["27", "survey_b", "2024-02-29 22:00:00", "2024-03-01 02:10:00"]),
                    row(&["8", "follow_up", "2024-03-02 10:00:00", "2024-03-02 11:00:00"]),
                    row(&["19", "maintenance", "2024-03-01 12:00:00", "2024-03-01 13:30:00"]),
                ],
            }),
        }
    }
}

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::demo();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(config.tracks.len(), deserialized.tracks.len());
        assert_eq!(deserialized.tracks[0].id, "obs_freq");
        assert_eq!(deserialized.tracks[0].num_sliders, 2);
        let table = deserialized.table.unwrap();
        assert_eq!(table.columns[0].kind, ColumnKind::Integer);
        assert_eq!(table.rows.len(), 5);
    }

    #[test]
    fn test_attribute_defaults() {
        let config: TrackConfig = toml::from_str(r#"id = "score""#).unwrap();
        assert_eq!(config.num_sliders, 2);
        assert_eq!(config.slider_min, 0.0);
        assert_eq!(config.slider_max, 1.0);
        assert!(config.initial_values.is_none());
        assert!(config.label.is_none());
    }

    #[test]
    fn test_column_kind_names() {
        let table: TableConfig = toml::from_str(
            r#"
            columns = [
                { name = "ID", kind = "integer" },
                { name = "Name", kind = "text" },
                { name = "Start", kind = "timestamp" },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(table.columns[2].kind, ColumnKind::Timestamp);
        assert!(table.rows.is_empty());
    }
}
