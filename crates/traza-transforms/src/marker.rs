//! Marker tables attached to frequency-domain traces.
//!
//! Each trace owns a [`MarkerSet`]; the transform updates it every frame
//! according to the configured [`crate::settings::MarkerPolicy`]. Consumers
//! on other threads never touch the live set: they receive a
//! [`MarkerSnapshot`] through the engine's one-shot hand-off instead.

use rustfft::num_complex::Complex;

pub use traza_core::MAX_MARKERS;

/// Slots beyond the user-visible markers; families that derive extra
/// positions (image, harmonics pushed past the visible set) park them here.
const RESERVED_SLOTS: usize = 2;

/// One marker on a trace.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Whether the transform maintains this marker.
    pub active: bool,
    /// Trace bin the marker sits on.
    pub bin: usize,
    /// X coordinate, refined below bin granularity where the transform
    /// interpolates.
    pub x: f32,
    /// Y coordinate in the trace's units.
    pub y: f32,
    /// Phase at the marker bin in degrees; NaN when the trace carries no
    /// phase.
    pub angle: f32,
    /// Complex bin value behind the marker; zero when the trace carries
    /// no phase.
    pub vector: Complex<f32>,
    /// Display label, `M1`..`M10` by default.
    pub label: String,
}

impl Default for Marker {
    fn default() -> Self {
        Self {
            active: false,
            bin: 0,
            x: 0.0,
            y: 0.0,
            angle: f32::NAN,
            vector: Complex::new(0.0, 0.0),
            label: String::new(),
        }
    }
}

impl Marker {
    /// Drop the marker's position data, keeping activation and label.
    pub fn clear_position(&mut self) {
        self.bin = 0;
        self.x = 0.0;
        self.y = 0.0;
        self.angle = f32::NAN;
        self.vector = Complex::new(0.0, 0.0);
    }
}

/// Phase difference between two markers' bin vectors, in degrees within
/// `(-180, 180]`.
///
/// Either marker without phase data (zero vector) yields `0.0`.
pub fn phase_difference_deg(a: &Marker, b: &Marker) -> f32 {
    (a.vector * b.vector.conj()).arg().to_degrees()
}

/// Fixed-capacity marker table owned by one trace.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSet {
    slots: Vec<Marker>,
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerSet {
    /// Table with every slot inactive.
    pub fn new() -> Self {
        Self {
            slots: vec![Marker::default(); MAX_MARKERS + RESERVED_SLOTS],
        }
    }

    /// Activate the first `count` markers (capped at [`MAX_MARKERS`]) and
    /// deactivate the rest, assigning `M1`.. labels to unlabeled slots.
    pub fn activate(&mut self, count: usize) {
        let count = count.min(MAX_MARKERS);
        for (i, marker) in self.slots.iter_mut().enumerate() {
            marker.active = i < count;
            if marker.active && marker.label.is_empty() {
                marker.label = format!("M{}", i + 1);
            }
        }
    }

    /// Deactivate every marker, keeping positions and labels.
    pub fn deactivate_all(&mut self) {
        for marker in &mut self.slots {
            marker.active = false;
        }
    }

    /// All slots, active prefix first.
    pub fn slots(&self) -> &[Marker] {
        &self.slots
    }

    /// Mutable slot access, used to pin bins for fixed-marker plots.
    pub fn slots_mut(&mut self) -> &mut [Marker] {
        &mut self.slots
    }

    /// The contiguous active prefix.
    pub fn active(&self) -> impl Iterator<Item = &Marker> {
        self.slots.iter().take_while(|marker| marker.active)
    }

    /// Length of the contiguous active prefix.
    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Detached copy of the table for cross-thread consumers.
    pub fn snapshot(&self) -> MarkerSnapshot {
        MarkerSnapshot {
            markers: self.slots.clone(),
        }
    }
}

/// One-shot copy of a marker table, published after the owning trace
/// completes a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSnapshot {
    /// Marker slots in rank order, active prefix first.
    pub markers: Vec<Marker>,
}

/// Place a marker on `bin` of a finished trace, attaching the complex bin
/// vector for phase-carrying traces.
pub(crate) fn place_marker(
    marker: &mut Marker,
    bin: usize,
    x_axis: &[f32],
    y_axis: &[f32],
    spectrum: &[Complex<f64>],
    carries_phase: bool,
) {
    let bin = bin.min(y_axis.len().saturating_sub(1));
    marker.bin = bin;
    marker.x = x_axis[bin];
    marker.y = y_axis[bin];
    if carries_phase {
        let v = spectrum[bin];
        marker.vector = Complex::new(v.re as f32, v.im as f32);
        marker.angle = marker.vector.arg().to_degrees();
    } else {
        marker.vector = Complex::new(0.0, 0.0);
        marker.angle = f32::NAN;
    }
}
