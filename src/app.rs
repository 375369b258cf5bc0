use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};
use std::path::PathBuf;
use std::time::Instant;

use crate::config::{AppConfig, TableColumn};
use crate::sort::{self, Direction};
use crate::track::RangeTrack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Track(usize),
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
}

/// Screen regions recorded during the last draw, used to route mouse
/// presses. Motion while a drag is live bypasses these entirely (capture
/// semantics).
#[derive(Debug, Default, Clone)]
pub struct HitMap {
    /// One rect per track: the row the track line occupies.
    pub track_lines: Vec<Rect>,
    /// Input field rects, per track, per handle.
    pub inputs: Vec<Vec<Rect>>,
    /// Table header cells, one per column.
    pub header_cells: Vec<Rect>,
}

pub struct App {
    pub tracks: Vec<RangeTrack>,
    pub focus: Focus,
    pub selected_handle: usize,
    pub popup: Popup,

    // Table state (bottom section)
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Vec<String>>,
    pub selected_column: usize,
    pub sort_column: Option<usize>,
    pub sort_direction: Direction,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    // Filter snapshot taken with 's', printed after the terminal restores
    pub captured_fields: Option<String>,

    // Which track owns the live drag, if any
    pub drag_track: Option<usize>,

    pub hits: HitMap,

    config_path: Option<PathBuf>,
}

impl App {
    pub fn new(config: &AppConfig, config_path: Option<PathBuf>) -> Result<Self> {
        let tracks = config
            .tracks
            .iter()
            .cloned()
            .map(RangeTrack::new)
            .collect::<Result<Vec<_>, _>>()?;

        let (columns, rows) = match &config.table {
            Some(table) => (table.columns.clone(), table.rows.clone()),
            None => (Vec::new(), Vec::new()),
        };

        Ok(Self {
            tracks,
            focus: Focus::Track(0),
            selected_handle: 0,
            popup: Popup::None,
            columns,
            rows,
            selected_column: 0,
            sort_column: None,
            sort_direction: Direction::default(),
            status_message: None,
            status_message_time: None,
            captured_fields: None,
            drag_track: None,
            hits: HitMap::default(),
            config_path,
        })
    }

    /// Set a status message (auto-clears after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    pub fn has_table(&self) -> bool {
        !self.columns.is_empty()
    }

    fn focused_track(&mut self) -> Option<(&mut RangeTrack, usize)> {
        match self.focus {
            Focus::Track(i) => {
                let handle = self.selected_handle;
                self.tracks.get_mut(i).map(|t| (t, handle))
            }
            Focus::Table => None,
        }
    }

    /// Rebuild every widget from a freshly loaded configuration. Full
    /// teardown: handle positions, drag state and the table all reset.
    pub fn reload(&mut self) -> Result<()> {
        let config = AppConfig::load(self.config_path.as_deref())?;
        for (track, track_config) in self.tracks.iter_mut().zip(config.tracks.iter()) {
            track.update(track_config.clone())?;
        }
        if config.tracks.len() != self.tracks.len() {
            self.tracks = config
                .tracks
                .iter()
                .cloned()
                .map(RangeTrack::new)
                .collect::<Result<Vec<_>, _>>()?;
        }
        if let Some(table) = &config.table {
            self.columns = table.columns.clone();
            self.rows = table.rows.clone();
        } else {
            self.columns.clear();
            self.rows.clear();
        }
        self.focus = Focus::Track(0);
        self.selected_handle = 0;
        self.sort_column = None;
        self.sort_direction = Direction::default();
        self.drag_track = None;
        self.set_status("Configuration reloaded");
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.popup == Popup::Help {
            if matches!(
                key.code,
                KeyCode::Esc
                    | KeyCode::Enter
                    | KeyCode::Char('q')
                    | KeyCode::Char('h')
                    | KeyCode::Char('?')
            ) {
                self.popup = Popup::None;
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Tab => self.focus_next(),
            KeyCode::BackTab => self.focus_prev(),

            KeyCode::Left => match self.focus {
                Focus::Track(_) => {
                    self.selected_handle = self.selected_handle.saturating_sub(1);
                }
                Focus::Table => {
                    self.selected_column = self.selected_column.saturating_sub(1);
                }
            },
            KeyCode::Right => match self.focus {
                Focus::Track(i) => {
                    if let Some(track) = self.tracks.get(i) {
                        let max = track.num_handles() - 1;
                        self.selected_handle = (self.selected_handle + 1).min(max);
                    }
                }
                Focus::Table => {
                    let max = self.columns.len().saturating_sub(1);
                    self.selected_column = (self.selected_column + 1).min(max);
                }
            },

            KeyCode::Enter => match self.focus {
                Focus::Track(_) => {
                    if let Some((track, handle)) = self.focused_track() {
                        track.commit_input(handle);
                        let value = track.input(handle).to_string();
                        let name = track.field_name(handle);
                        self.set_status(format!("{} = {}", name, value));
                    }
                }
                Focus::Table => self.sort_by(self.selected_column),
            },

            KeyCode::Backspace => {
                if let Some((track, handle)) = self.focused_track() {
                    track.pop_input(handle);
                }
            }

            KeyCode::Char('s') => self.capture_fields()?,
            KeyCode::Char('r') => {
                if let Err(e) = self.reload() {
                    self.set_status(format!("Reload failed: {}", e));
                }
            }
            KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,

            KeyCode::Char(c) => {
                if let Some((track, handle)) = self.focused_track() {
                    track.push_input(handle, c);
                }
            }

            _ => {}
        }
        Ok(())
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.popup != Popup::None {
            return;
        }
        let point = Position::new(mouse.column, mouse.row);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.mouse_down(point),
            MouseEventKind::Drag(MouseButton::Left) => {
                // Captured: motion anywhere routes to the active handle.
                if let Some(t) = self.drag_track {
                    let width = self.track_width(t);
                    self.tracks[t].drag_move(mouse.column as f64, width);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(t) = self.drag_track.take() {
                    let width = self.track_width(t);
                    self.tracks[t].end_drag(mouse.column as f64, width);
                }
            }
            _ => {}
        }
    }

    fn mouse_down(&mut self, point: Position) {
        // Press on a track line: capture the nearest handle.
        for t in 0..self.hits.track_lines.len().min(self.tracks.len()) {
            let line = self.hits.track_lines[t];
            if !line.contains(point) {
                continue;
            }
            if let Some(handle) = self.nearest_handle(t, point.x, line) {
                self.focus = Focus::Track(t);
                self.selected_handle = handle;
                self.drag_track = Some(t);
                self.tracks[t].begin_drag(handle, point.x as f64);
            }
            return;
        }

        // Press on an input field: move focus there.
        for (t, fields) in self.hits.inputs.iter().enumerate() {
            for (handle, rect) in fields.iter().enumerate() {
                if rect.contains(point) {
                    self.focus = Focus::Track(t);
                    self.selected_handle = handle;
                    return;
                }
            }
        }

        // Press on a table header: sort by that column.
        let header_hit = self
            .hits
            .header_cells
            .iter()
            .position(|rect| rect.contains(point));
        if let Some(column) = header_hit {
            self.focus = Focus::Table;
            self.selected_column = column;
            self.sort_by(column);
        }
    }

    fn nearest_handle(&self, track: usize, x: u16, line: Rect) -> Option<usize> {
        let track = &self.tracks[track];
        (0..track.num_handles()).min_by_key(|&h| {
            let marker = line.x + track.marker_offset(h, line.width);
            (marker as i32 - x as i32).abs()
        })
    }

    fn track_width(&self, track: usize) -> f64 {
        self.hits
            .track_lines
            .get(track)
            .map(|r| r.width as f64)
            .unwrap_or(0.0)
    }

    fn focus_next(&mut self) {
        self.focus = match self.focus {
            Focus::Track(i) if i + 1 < self.tracks.len() => Focus::Track(i + 1),
            Focus::Track(_) if self.has_table() => Focus::Table,
            Focus::Track(_) | Focus::Table => Focus::Track(0),
        };
        self.selected_handle = 0;
    }

    fn focus_prev(&mut self) {
        self.focus = match self.focus {
            Focus::Track(0) if self.has_table() => Focus::Table,
            Focus::Track(0) => Focus::Track(self.tracks.len().saturating_sub(1)),
            Focus::Track(i) => Focus::Track(i - 1),
            Focus::Table => Focus::Track(self.tracks.len().saturating_sub(1)),
        };
        self.selected_handle = 0;
    }

    /// Sort the table rows by a column. Repeat sorts on the same column flip
    /// the direction; switching columns starts ascending again.
    pub fn sort_by(&mut self, column: usize) {
        if column >= self.columns.len() {
            return;
        }
        self.sort_direction = if self.sort_column == Some(column) {
            self.sort_direction.flip()
        } else {
            Direction::Ascending
        };
        self.sort_column = Some(column);

        let kinds: Vec<_> = self.columns.iter().map(|c| c.kind).collect();
        sort::sort_rows(&mut self.rows, column, &kinds, self.sort_direction);
        self.set_status(format!(
            "Sorted by {} {}",
            self.columns[column].name,
            self.sort_direction.indicator()
        ));
    }

    /// One form field per handle, name -> display value to 2 decimals.
    pub fn filter_fields(&self) -> serde_json::Value {
        let mut fields = serde_json::Map::new();
        for track in &self.tracks {
            for handle in 0..track.num_handles() {
                fields.insert(
                    track.field_name(handle),
                    serde_json::Value::String(format!("{:.2}", track.display_value(handle))),
                );
            }
        }
        serde_json::Value::Object(fields)
    }

    fn capture_fields(&mut self) -> Result<()> {
        self.captured_fields = Some(serde_json::to_string_pretty(&self.filter_fields())?);
        self.set_status("Filter fields captured (printed on exit)");
        Ok(())
    }

    pub fn tick(&mut self) {
        // Clear status message after 3 seconds
        if let Some(time) = self.status_message_time {
            if time.elapsed().as_secs() >= 3 {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }
}
