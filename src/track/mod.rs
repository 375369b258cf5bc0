//! Multi-handle range track widget state.
//!
//! A `RangeTrack` keeps N ordered handle positions on a bounded 1-D track,
//! each normalized to [0, 1] and paired with a numeric input buffer. Handles
//! cannot cross while dragging; the text-edit path intentionally skips the
//! neighbor clamp (see `edit_value`).

use thiserror::Error;

use crate::config::TrackConfig;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("track '{id}' needs at least one slider")]
    NoSliders { id: String },

    #[error("track '{id}' has an empty range (min {min} >= max {max})")]
    EmptyRange { id: String, min: f64, max: f64 },

    #[error("track '{id}' has malformed initial-values JSON")]
    InitialValues {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Transient drag context. One per track, shared by all of its handles;
/// while `Active`, every pointer-move event routes to `handle` no matter
/// where on the screen it lands (the capture-layer behavior).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Drag {
    Idle,
    Active {
        handle: usize,
        /// Screen column the next displacement is measured from. Reset to
        /// the current pointer position after every committed move, so
        /// displacement accumulates incrementally instead of being
        /// recomputed from the original press point.
        anchor_x: f64,
        /// Last observed pointer column.
        last_x: f64,
    },
}

#[derive(Debug)]
pub struct RangeTrack {
    config: TrackConfig,
    /// Normalized handle positions, weakly increasing.
    values: Vec<f64>,
    /// Display buffer per handle, rewritten by non-drag render passes.
    inputs: Vec<String>,
    drag: Drag,
}

impl RangeTrack {
    pub fn new(config: TrackConfig) -> Result<Self, TrackError> {
        if config.num_sliders == 0 {
            return Err(TrackError::NoSliders {
                id: config.id.clone(),
            });
        }
        if config.slider_max <= config.slider_min {
            return Err(TrackError::EmptyRange {
                id: config.id.clone(),
                min: config.slider_min,
                max: config.slider_max,
            });
        }

        let mut values = initial_positions(&config)?;

        // First-handle NaN guard. The render pass sweeps all handles, but
        // handle 0 is additionally coerced at construction; the two guard
        // points are kept separate on purpose.
        if values[0].is_nan() {
            values[0] = 0.0;
        }

        let inputs = vec![String::new(); values.len()];
        let mut track = Self {
            config,
            values,
            inputs,
            drag: Drag::Idle,
        };
        track.render(false);
        Ok(track)
    }

    /// Full teardown and rebuild from a new configuration. Handle positions,
    /// drag state and input buffers are all reset; there is no incremental
    /// diffing against the previous configuration.
    pub fn update(&mut self, config: TrackConfig) -> Result<(), TrackError> {
        *self = Self::new(config)?;
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn title(&self) -> &str {
        self.config.label.as_deref().unwrap_or(&self.config.id)
    }

    pub fn num_handles(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn input(&self, handle: usize) -> &str {
        &self.inputs[handle]
    }

    /// Handle position mapped back into the configured [min, max] range.
    pub fn display_value(&self, handle: usize) -> f64 {
        let span = self.config.slider_max - self.config.slider_min;
        span * self.values[handle] + self.config.slider_min
    }

    /// Form-field name for a handle. The two-handle case feeds a query
    /// filter directly (`__gte`/`__lte` suffixes); other counts get plain
    /// indexed identifiers.
    pub fn field_name(&self, handle: usize) -> String {
        if self.values.len() == 2 {
            if handle == 0 {
                format!("{}__gte", self.config.id)
            } else {
                format!("{}__lte", self.config.id)
            }
        } else {
            format!("{}-slider-{}", self.config.id, handle)
        }
    }

    pub fn input_label(&self, handle: usize) -> String {
        if self.values.len() == 2 {
            if handle == 0 { "Min".into() } else { "Max".into() }
        } else {
            format!("{}", handle)
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, Drag::Active { .. })
    }

    /// The handle whose stacking order is raised while a drag is live.
    pub fn active_handle(&self) -> Option<usize> {
        match self.drag {
            Drag::Active { handle, .. } => Some(handle),
            Drag::Idle => None,
        }
    }

    /// Capture a handle at screen column `x`. Ignored while another drag is
    /// live: the capture layer swallows presses on other handles.
    pub fn begin_drag(&mut self, handle: usize, x: f64) {
        if handle >= self.values.len() || self.is_dragging() {
            return;
        }
        tracing::debug!(track = %self.config.id, handle, x, "drag start");
        self.drag = Drag::Active {
            handle,
            anchor_x: x,
            last_x: x,
        };
    }

    /// Pointer moved to column `x` while captured. The proposed position is
    /// clamped so the handle never crosses its neighbors (0.0 and 1.0 at the
    /// track ends), then the anchor is reset to `x`.
    pub fn drag_move(&mut self, x: f64, track_width: f64) {
        let Drag::Active { handle, anchor_x, .. } = self.drag else {
            return;
        };
        if track_width <= 0.0 {
            return;
        }

        let delta = (x - anchor_x) / track_width;
        let prev = if handle == 0 { 0.0 } else { self.values[handle - 1] };
        let next = if handle == self.values.len() - 1 {
            1.0
        } else {
            self.values[handle + 1]
        };

        let mut value = self.values[handle] + delta;
        if value < prev {
            value = prev;
        }
        if value > next {
            value = next;
        }
        self.values[handle] = value;

        self.drag = Drag::Active {
            handle,
            anchor_x: x,
            last_x: x,
        };
        // Pure-drag update: the marker already reflects the new position,
        // the input echo waits for drag end.
        self.render(true);
    }

    /// Finalize the drag at column `x`, release capture and restore normal
    /// stacking order.
    pub fn end_drag(&mut self, x: f64, track_width: f64) {
        if !self.is_dragging() {
            return;
        }
        self.drag_move(x, track_width);
        tracing::debug!(track = %self.config.id, "drag end");
        self.drag = Drag::Idle;
        self.render(false);
    }

    /// Append a character to a handle's input buffer (in-progress edit).
    pub fn push_input(&mut self, handle: usize, c: char) {
        if c.is_ascii_digit() || c == '.' || c == '-' || c == '+' {
            self.inputs[handle].push(c);
        }
    }

    pub fn pop_input(&mut self, handle: usize) {
        self.inputs[handle].pop();
    }

    /// Commit a handle's input buffer through the text-edit path. Malformed
    /// numbers become NaN and flow through the render-pass coercion.
    pub fn commit_input(&mut self, handle: usize) {
        let entered = self.inputs[handle]
            .trim()
            .parse::<f64>()
            .unwrap_or(f64::NAN);
        self.edit_value(handle, entered);
    }

    /// Set handle `handle` from an entered display value. Unlike the drag
    /// path this applies no clamping against neighbors: an intentional,
    /// arguably inconsistent asymmetry that is preserved as-is. Do not
    /// unify the two paths without confirming product intent.
    pub fn edit_value(&mut self, handle: usize, entered: f64) {
        if handle >= self.values.len() {
            return;
        }
        let span = self.config.slider_max - self.config.slider_min;
        self.values[handle] = (entered - self.config.slider_min) / span;
        // Marker-only render: the other input buffers keep whatever the
        // user typed, only handles 0/1 are echoed back specifically.
        self.render(true);
        if handle <= 1 {
            self.sync_input(handle);
        }
    }

    /// Render pass: sweep NaN positions to 0.0, then (unless this is a
    /// pure-drag update) echo every display value into its input buffer,
    /// rounded to 2 decimal places.
    pub fn render(&mut self, skip_inputs: bool) {
        for v in &mut self.values {
            if v.is_nan() {
                *v = 0.0;
            }
        }
        if skip_inputs {
            return;
        }
        for i in 0..self.values.len() {
            self.sync_input(i);
        }
    }

    fn sync_input(&mut self, handle: usize) {
        self.inputs[handle] = format!("{:.2}", self.display_value(handle));
    }

    /// Marker column for a handle on a track of `track_width` cells. A small
    /// proportional inset reserves room for the marker itself at the right
    /// edge.
    pub fn marker_offset(&self, handle: usize, track_width: u16) -> u16 {
        if track_width == 0 {
            return 0;
        }
        let usable = (track_width - 1) as f64;
        (self.values[handle] * 0.98 * usable).round() as u16
    }
}

/// Initial normalized positions for a track.
///
/// Even distribution (`i/(N-1)`, or 0.5 for a single handle) applies when no
/// initial values are given, when the supplied array length does not match,
/// and always for N = 1 - a single handle centers regardless of any supplied
/// value, a documented quirk that is preserved rather than fixed. Null
/// entries fall back per-index. Malformed JSON is a fatal configuration
/// error.
fn initial_positions(config: &TrackConfig) -> Result<Vec<f64>, TrackError> {
    let n = config.num_sliders;
    let even = |i: usize| {
        if n == 1 {
            0.5
        } else {
            i as f64 / (n - 1) as f64
        }
    };

    let Some(raw) = &config.initial_values else {
        return Ok((0..n).map(even).collect());
    };

    let supplied: Vec<Option<f64>> =
        serde_json::from_str(raw).map_err(|source| TrackError::InitialValues {
            id: config.id.clone(),
            source,
        })?;

    if n == 1 || supplied.len() != n {
        return Ok((0..n).map(even).collect());
    }

    let span = config.slider_max - config.slider_min;
    Ok(supplied
        .iter()
        .enumerate()
        .map(|(i, v)| match v {
            Some(v) => (v - config.slider_min) / span,
            None => even(i),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(id: &str, n: usize, min: f64, max: f64, initial: Option<&str>) -> TrackConfig {
        TrackConfig {
            id: id.to_string(),
            label: None,
            num_sliders: n,
            slider_min: min,
            slider_max: max,
            initial_values: initial.map(String::from),
        }
    }

    fn assert_weakly_increasing(track: &RangeTrack) {
        for w in track.values().windows(2) {
            assert!(w[0] <= w[1], "handles crossed: {:?}", track.values());
        }
    }

    #[test]
    fn default_two_handles_span_the_track() {
        let track = RangeTrack::new(config("score", 2, 0.0, 100.0, None)).unwrap();
        assert_eq!(track.values(), &[0.0, 1.0]);
        assert_eq!(track.input(0), "0.00");
        assert_eq!(track.input(1), "100.00");
    }

    #[test]
    fn even_distribution_without_initial_values() {
        let track = RangeTrack::new(config("t", 5, 0.0, 1.0, None)).unwrap();
        assert_eq!(track.values(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_weakly_increasing(&track);
    }

    #[test]
    fn initial_values_are_normalized() {
        let track =
            RangeTrack::new(config("t", 2, 0.0, 200.0, Some("[50, 150]"))).unwrap();
        assert_eq!(track.values(), &[0.25, 0.75]);
    }

    #[test]
    fn null_entries_fall_back_per_index() {
        let track =
            RangeTrack::new(config("t", 3, 0.0, 1.0, Some("[0.2, null, 0.8]"))).unwrap();
        assert_eq!(track.values(), &[0.2, 0.5, 0.8]);
    }

    #[test]
    fn length_mismatch_falls_back_to_even_distribution() {
        let track = RangeTrack::new(config("t", 3, 0.0, 1.0, Some("[0.2, 0.8]"))).unwrap();
        assert_eq!(track.values(), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn single_handle_always_centers() {
        let track = RangeTrack::new(config("t", 1, 0.0, 10.0, Some("[9.0]"))).unwrap();
        assert_eq!(track.values(), &[0.5]);

        let track = RangeTrack::new(config("t", 1, 0.0, 10.0, None)).unwrap();
        assert_eq!(track.values(), &[0.5]);
    }

    #[test]
    fn malformed_initial_values_json_is_fatal() {
        let err = RangeTrack::new(config("t", 2, 0.0, 1.0, Some("[0.2,"))).unwrap_err();
        assert!(matches!(err, TrackError::InitialValues { .. }));
    }

    #[test]
    fn empty_range_is_rejected() {
        let err = RangeTrack::new(config("t", 2, 5.0, 5.0, None)).unwrap_err();
        assert!(matches!(err, TrackError::EmptyRange { .. }));
    }

    #[test]
    fn zero_sliders_is_rejected() {
        let err = RangeTrack::new(config("t", 0, 0.0, 1.0, None)).unwrap_err();
        assert!(matches!(err, TrackError::NoSliders { .. }));
    }

    #[test]
    fn drag_clamps_to_previous_neighbor() {
        let mut track =
            RangeTrack::new(config("t", 3, 0.0, 1.0, Some("[0.2, 0.5, 0.8]"))).unwrap();
        track.begin_drag(1, 100.0);
        // delta of -0.5 on a 200-cell track: proposal 0.0, clamped at 0.2
        track.drag_move(0.0, 200.0);
        assert_eq!(track.values()[1], 0.2);
        assert_weakly_increasing(&track);
    }

    #[test]
    fn drag_clamps_to_next_neighbor() {
        let mut track =
            RangeTrack::new(config("t", 3, 0.0, 1.0, Some("[0.2, 0.5, 0.8]"))).unwrap();
        track.begin_drag(1, 0.0);
        track.drag_move(500.0, 100.0);
        assert_eq!(track.values()[1], 0.8);
    }

    #[test]
    fn end_handles_clamp_to_track_bounds() {
        let mut track = RangeTrack::new(config("t", 2, 0.0, 1.0, Some("[0.3, 0.7]"))).unwrap();
        track.begin_drag(0, 100.0);
        track.drag_move(-900.0, 100.0);
        assert_eq!(track.values()[0], 0.0);
        track.end_drag(-900.0, 100.0);

        track.begin_drag(1, 0.0);
        track.drag_move(900.0, 100.0);
        assert_eq!(track.values()[1], 1.0);
    }

    #[test]
    fn displacement_is_incremental_from_the_anchor() {
        let mut track = RangeTrack::new(config("t", 2, 0.0, 1.0, Some("[0.0, 1.0]"))).unwrap();
        track.begin_drag(0, 100.0);
        track.drag_move(110.0, 100.0);
        assert!((track.values()[0] - 0.1).abs() < 1e-9);
        // same column again: anchor was reset, so no further displacement
        track.drag_move(110.0, 100.0);
        assert!((track.values()[0] - 0.1).abs() < 1e-9);
    }

    #[test]
    fn ordering_holds_for_any_move_sequence() {
        let mut track = RangeTrack::new(config("t", 4, 0.0, 1.0, None)).unwrap();
        let deltas = [35.0, -80.0, 12.0, 260.0, -500.0, 7.0, 91.0, -3.0];
        for (i, step) in deltas.iter().cycle().take(64).enumerate() {
            let handle = i % 4;
            track.begin_drag(handle, 0.0);
            track.drag_move(*step, 100.0);
            track.end_drag(*step, 100.0);
            assert_weakly_increasing(&track);
        }
    }

    #[test]
    fn inputs_are_skipped_during_drag_and_echoed_on_release() {
        let mut track = RangeTrack::new(config("pos", 2, 0.0, 100.0, None)).unwrap();
        track.begin_drag(0, 0.0);
        track.drag_move(50.0, 100.0);
        // mid-drag: marker moved, input echo deferred
        assert_eq!(track.values()[0], 0.5);
        assert_eq!(track.input(0), "0.00");
        track.end_drag(50.0, 100.0);
        assert_eq!(track.input(0), "50.00");
        assert!(!track.is_dragging());
    }

    #[test]
    fn stacking_order_follows_the_active_drag() {
        let mut track = RangeTrack::new(config("t", 2, 0.0, 1.0, None)).unwrap();
        assert_eq!(track.active_handle(), None);
        track.begin_drag(1, 10.0);
        assert_eq!(track.active_handle(), Some(1));
        // presses on other handles are swallowed while captured
        track.begin_drag(0, 20.0);
        assert_eq!(track.active_handle(), Some(1));
        track.end_drag(10.0, 100.0);
        assert_eq!(track.active_handle(), None);
    }

    #[test]
    fn text_edit_skips_the_neighbor_clamp() {
        let mut track = RangeTrack::new(config("t", 2, 0.0, 100.0, None)).unwrap();
        // push handle 1 below handle 0's position: allowed on this path
        track.edit_value(1, 25.0);
        track.edit_value(0, 75.0);
        assert_eq!(track.values(), &[0.75, 0.25]);
    }

    #[test]
    fn text_edit_scenario_two_handles() {
        let mut track = RangeTrack::new(config("f", 2, 0.0, 100.0, None)).unwrap();
        assert_eq!(track.input(0), "0.00");
        assert_eq!(track.input(1), "100.00");

        track.edit_value(0, 50.0);
        assert_eq!(track.values()[0], 0.5);
        assert_eq!(track.values()[1], 1.0);
        track.render(false);
        assert_eq!(track.input(0), "50.00");
        assert_eq!(track.input(1), "100.00");
    }

    #[test]
    fn committed_input_round_trips_to_two_decimals() {
        let mut track = RangeTrack::new(config("t", 2, -50.0, 50.0, None)).unwrap();
        let len = track.input(0).len();
        for _ in 0..len {
            track.pop_input(0);
        }
        for c in "12.5".chars() {
            track.push_input(0, c);
        }
        track.commit_input(0);
        track.render(false);
        assert_eq!(track.input(0), "12.50");
    }

    #[test]
    fn malformed_input_coerces_to_track_start() {
        let mut track = RangeTrack::new(config("t", 2, 0.0, 100.0, Some("[40, 60]"))).unwrap();
        let len = track.input(0).len();
        for _ in 0..len {
            track.pop_input(0);
        }
        track.commit_input(0); // empty buffer parses to NaN
        // NaN swept to 0.0 by the render pass inside the edit
        assert_eq!(track.values()[0], 0.0);
    }

    #[test]
    fn update_rebuilds_from_scratch() {
        let mut track = RangeTrack::new(config("t", 2, 0.0, 100.0, None)).unwrap();
        track.begin_drag(0, 0.0);
        track.drag_move(30.0, 100.0);
        assert!(track.is_dragging());

        track
            .update(config("t", 3, 0.0, 10.0, Some("[2, null, 8]")))
            .unwrap();
        assert!(!track.is_dragging());
        assert_eq!(track.values(), &[0.2, 0.5, 0.8]);
        assert_eq!(track.input(1), "5.00");
    }

    #[test]
    fn field_names_for_the_filter_form() {
        let pair = RangeTrack::new(config("obs_freq", 2, 0.0, 1.0, None)).unwrap();
        assert_eq!(pair.field_name(0), "obs_freq__gte");
        assert_eq!(pair.field_name(1), "obs_freq__lte");
        assert_eq!(pair.input_label(0), "Min");
        assert_eq!(pair.input_label(1), "Max");

        let triple = RangeTrack::new(config("obs_freq", 3, 0.0, 1.0, None)).unwrap();
        assert_eq!(triple.field_name(2), "obs_freq-slider-2");
        assert_eq!(triple.input_label(2), "2");
    }

    #[test]
    fn marker_offsets_stay_inside_the_track() {
        let track = RangeTrack::new(config("t", 3, 0.0, 1.0, None)).unwrap();
        for handle in 0..3 {
            let off = track.marker_offset(handle, 40);
            assert!(off < 40);
        }
        assert_eq!(track.marker_offset(0, 40), 0);
        assert!(track.marker_offset(2, 40) >= track.marker_offset(1, 40));
    }
}
