use std::sync::OnceLock;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{App, Focus, HitMap, Popup};
use crate::theme::Theme;
use crate::track::RangeTrack;

// Load theme colors from system (Omarchy/Hyprland) once at startup
static THEME: OnceLock<Theme> = OnceLock::new();

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::load)
}

fn accent() -> Color { theme().accent }
fn track_color() -> Color { theme().track }
fn marker() -> Color { theme().marker }
fn marker_active() -> Color { theme().marker_active }
fn inactive() -> Color { theme().inactive }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn bg_selected() -> Color { theme().bg_selected }
fn header() -> Color { theme().header }
fn warning() -> Color { theme().warning }

const TRACK_BOX_HEIGHT: u16 = 4;

pub fn draw(f: &mut Frame, app: &mut App) {
    let area = f.area();
    let mut hits = HitMap::default();

    let mut constraints = vec![Constraint::Length(1)]; // Info line
    for _ in &app.tracks {
        constraints.push(Constraint::Length(TRACK_BOX_HEIGHT));
    }
    constraints.push(if app.has_table() {
        Constraint::Min(5) // Table box
    } else {
        Constraint::Min(0)
    });
    constraints.push(Constraint::Length(1)); // Footer

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    draw_info_line(f, app, chunks[0]);
    for (t, track) in app.tracks.iter().enumerate() {
        let focused = app.focus == Focus::Track(t);
        let selected = if focused { Some(app.selected_handle) } else { None };
        draw_track_box(f, track, focused, selected, chunks[1 + t], &mut hits);
    }
    if app.has_table() {
        draw_table_box(f, app, chunks[1 + app.tracks.len()], &mut hits);
    }
    draw_footer(f, app, chunks[chunks.len() - 1]);

    if app.popup == Popup::Help {
        draw_help_popup(f);
    }

    app.hits = hits;
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status, Style::default().fg(warning())))
    } else if app.captured_fields.is_some() {
        Line::from(Span::styled(
            "Filter snapshot held for exit",
            Style::default().fg(text_dim()),
        ))
    } else {
        Line::from(Span::styled("Ready", Style::default().fg(text_dim())))
    };

    let info = Paragraph::new(line).alignment(Alignment::Center);
    f.render_widget(info, area);
}

fn draw_track_box(
    f: &mut Frame,
    track: &RangeTrack,
    focused: bool,
    selected: Option<usize>,
    area: Rect,
    hits: &mut HitMap,
) {
    let border_color = if focused { accent() } else { inactive() };
    let title_style = if focused {
        Style::default().fg(accent()).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(inactive())
    };

    let block = Block::default()
        .title(Span::styled(format!(" {} ", track.title()), title_style))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.height < 2 || inner.width < 4 {
        hits.track_lines.push(Rect::default());
        hits.inputs.push(Vec::new());
        return;
    }

    let line_area = Rect::new(inner.x, inner.y, inner.width, 1);
    f.render_widget(track_line(track, selected, inner.width), line_area);
    hits.track_lines.push(line_area);

    let fields_area = Rect::new(inner.x, inner.y + 1, inner.width, 1);
    let fields = input_fields(track, focused, selected, fields_area, hits);
    f.render_widget(Paragraph::new(fields), fields_area);
}

/// The track line with one marker per handle. Markers are placed in index
/// order; the active (or keyboard-selected) handle is placed again last so
/// it sits on top when markers overlap.
fn track_line(track: &RangeTrack, selected: Option<usize>, width: u16) -> Paragraph<'static> {
    let mut cells: Vec<(char, Style)> =
        vec![('─', Style::default().fg(track_color())); width as usize];

    let top = track.active_handle().or(selected);
    let mut place = |handle: usize, style: Style| {
        let offset = track.marker_offset(handle, width) as usize;
        if offset < cells.len() {
            cells[offset] = ('●', style);
        }
    };

    for handle in 0..track.num_handles() {
        place(handle, Style::default().fg(marker()));
    }
    if let Some(handle) = top {
        if handle < track.num_handles() {
            place(
                handle,
                Style::default().fg(marker_active()).add_modifier(Modifier::BOLD),
            );
        }
    }

    let spans: Vec<Span> = cells
        .into_iter()
        .map(|(c, style)| Span::styled(c.to_string(), style))
        .collect();
    Paragraph::new(Line::from(spans))
}

/// Labeled input fields, one per handle, laid out on a single row. Field
/// rects are recorded as they are placed so mouse presses can focus them.
fn input_fields(
    track: &RangeTrack,
    focused: bool,
    selected: Option<usize>,
    area: Rect,
    hits: &mut HitMap,
) -> Line<'static> {
    let mut spans = Vec::new();
    let mut rects = Vec::new();
    let mut x = area.x;

    for handle in 0..track.num_handles() {
        let active = focused && selected == Some(handle);
        let label = format!("{}: ", track.input_label(handle));
        let value = if active {
            format!("[{}_]", track.input(handle))
        } else {
            format!("[{}]", track.input(handle))
        };

        let label_style = if active {
            Style::default().fg(accent())
        } else {
            Style::default().fg(text_dim())
        };
        let value_style = if active {
            Style::default().fg(text()).bg(bg_selected())
        } else {
            Style::default().fg(text())
        };

        x += label.len() as u16;
        let field = Rect::new(x, area.y, value.len() as u16, 1);
        x += value.len() as u16 + 2;
        rects.push(field);

        spans.push(Span::styled(label, label_style));
        spans.push(Span::styled(value, value_style));
        spans.push(Span::raw("  "));
    }

    hits.inputs.push(rects);
    Line::from(spans)
}

fn draw_table_box(f: &mut Frame, app: &App, area: Rect, hits: &mut HitMap) {
    let focused = app.focus == Focus::Table;
    let border_color = if focused { accent() } else { inactive() };
    let title_style = if focused {
        Style::default().fg(accent()).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(inactive())
    };

    let block = Block::default()
        .title(Span::styled(" Tasks ", title_style))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);

    let ncols = app.columns.len() as u16;
    if ncols == 0 || inner.width < ncols {
        f.render_widget(block, area);
        return;
    }
    let col_width = inner.width / ncols;

    let header_cells: Vec<Span> = app
        .columns
        .iter()
        .enumerate()
        .map(|(c, column)| {
            let mut name = column.name.clone();
            if app.sort_column == Some(c) {
                name = format!("{} {}", name, app.sort_direction.indicator());
            }
            let mut style = Style::default().fg(header());
            if focused && c == app.selected_column {
                style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
            }
            Span::styled(name, style)
        })
        .collect();

    for c in 0..ncols {
        hits.header_cells
            .push(Rect::new(inner.x + c * col_width, inner.y, col_width, 1));
    }

    let rows: Vec<Row> = app
        .rows
        .iter()
        .map(|row| {
            Row::new(
                row.iter()
                    .map(|cell| Span::styled(cell.clone(), Style::default().fg(text())))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();

    let widths = vec![Constraint::Length(col_width); ncols as usize];
    let table = Table::new(rows, widths)
        .header(Row::new(header_cells))
        .column_spacing(0)
        .block(block);

    f.render_widget(table, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints: Vec<(&str, &str)> = match app.focus {
        Focus::Track(_) => vec![
            ("Tab", "Next"),
            ("←/→", "Handle"),
            ("0-9", "Edit"),
            ("Enter", "Apply"),
            ("s", "Snapshot"),
            ("h", "Help"),
        ],
        Focus::Table => vec![
            ("Tab", "Next"),
            ("←/→", "Column"),
            ("Enter", "Sort"),
            ("s", "Snapshot"),
            ("h", "Help"),
        ],
    };

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 { 4 } else { hints.len() };

    let hint_spans: Vec<Span> = hints
        .iter()
        .take(max_hints)
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(accent())),
                Span::styled(format!(" {} │ ", action), Style::default().fg(text_dim())),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 60 },
        if area.height < 30 { 90 } else { 70 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(Span::styled(
            "═══ Tracks ═══",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  Mouse      ", Style::default().fg(accent())),
            Span::raw("Drag a ● marker; handles never cross"),
        ]),
        Line::from(vec![
            Span::styled("  ←/→        ", Style::default().fg(accent())),
            Span::raw("Select a handle on the focused track"),
        ]),
        Line::from(vec![
            Span::styled("  0-9 . -    ", Style::default().fg(accent())),
            Span::raw("Type into the handle's field"),
        ]),
        Line::from(vec![
            Span::styled("  Enter      ", Style::default().fg(accent())),
            Span::raw("Apply the typed value (no neighbor clamp)"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "═══ Table ═══",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  Click/Enter", Style::default().fg(accent())),
            Span::raw(" Sort by column; repeat to flip direction"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "═══ Filters ═══",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  s          ", Style::default().fg(accent())),
            Span::raw("Snapshot filter fields (JSON on exit)"),
        ]),
        Line::from(vec![
            Span::styled("  r          ", Style::default().fg(accent())),
            Span::raw("Reload configuration (full rebuild)"),
        ]),
        Line::from(vec![
            Span::styled("  q          ", Style::default().fg(accent())),
            Span::raw("Quit"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("h", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(
                    " rangetrack Help ",
                    Style::default().fg(accent()),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
