//! Cross-correlation traces over two I/Q pairs.
//!
//! [`XcorrTransform`] correlates two complex captures against lag,
//! computed as an FFT-based circular correlation over buffers zero-padded
//! to `2N - 1` so linear lags never wrap. The trace is normalized by both
//! signals' peak magnitudes, so a pure delay between matched antennas
//! reads near 1.0 regardless of capture level.
//!
//! Signals are assembled as `Q + jI`, quadrature on the real axis. That
//! matches the receive chain this trace was built against; flipping it
//! mirrors every reported phase, so it stays as the hardware defined it.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use traza_core::{PeakTable, parabolic_peak};

use crate::error::TransformError;
use crate::marker::{MarkerSet, place_marker};
use crate::settings::{MarkerPolicy, XcorrSettings};
use crate::source::SharedSamples;

/// Correlation trace over two I/Q pairs against lag.
pub struct XcorrTransform {
    settings: XcorrSettings,
    i0: SharedSamples,
    q0: SharedSamples,
    i1: SharedSamples,
    q1: SharedSamples,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    padded_a: Vec<Complex<f64>>,
    padded_b: Vec<Complex<f64>>,
    /// Accumulated complex correlation across frames.
    acc: Vec<Complex<f64>>,
    /// Whether `acc` holds a first frame yet.
    seeded: bool,
    x_axis: Vec<f32>,
    y_axis: Vec<f32>,
    markers: MarkerSet,
    peaks: PeakTable,
    owns_markers: bool,
}

impl XcorrTransform {
    /// Build a correlation over two I/Q pairs, first pair then second,
    /// in-phase before quadrature within each.
    pub fn new(
        channels: [SharedSamples; 4],
        settings: XcorrSettings,
    ) -> Result<Self, TransformError> {
        settings.validate()?;
        let n = settings.num_samples;
        let padded_len = 2 * n - 1;

        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(padded_len);
        let inverse = planner.plan_fft_inverse(padded_len);

        let mut padded_a = Vec::new();
        padded_a.try_reserve_exact(padded_len)?;
        padded_a.resize(padded_len, Complex::new(0.0, 0.0));
        let padded_b = padded_a.clone();
        let acc = padded_a.clone();

        let mut x_axis = Vec::new();
        x_axis.try_reserve_exact(padded_len)?;
        x_axis.extend((0..padded_len).map(|i| (i as f64 - (n - 1) as f64) as f32));
        let mut y_axis = Vec::new();
        y_axis.try_reserve_exact(padded_len)?;
        y_axis.resize(padded_len, 0.0);

        let mut markers = MarkerSet::new();
        if settings.markers != MarkerPolicy::Off {
            markers.activate(settings.active_markers);
        }

        let [i0, q0, i1, q1] = channels;
        Ok(Self {
            settings,
            i0,
            q0,
            i1,
            q1,
            forward,
            inverse,
            padded_a,
            padded_b,
            acc,
            seeded: false,
            x_axis,
            y_axis,
            markers,
            peaks: PeakTable::new(),
            owns_markers: false,
        })
    }

    /// Correlate the current captures and fold them into the trace.
    pub fn update(&mut self) -> Result<(), TransformError> {
        let n = self.settings.num_samples;
        let padded_len = 2 * n - 1;

        // First pair leads unless the reverse flag mirrors the lag axis.
        let (peak_a, peak_b) = {
            let i0 = self.i0.borrow();
            let q0 = self.q0.borrow();
            let i1 = self.i1.borrow();
            let q1 = self.q1.borrow();
            let (lead_i, lead_q, trail_i, trail_q) = if self.settings.reverse {
                (&*i1, &*q1, &*i0, &*q0)
            } else {
                (&*i0, &*q0, &*i1, &*q1)
            };

            // Leading signal fills the tail of its padded buffer, trailing
            // signal the head; the asymmetry is what turns the circular
            // product into linear lags.
            self.padded_a.fill(Complex::new(0.0, 0.0));
            for (dst, (i, q)) in self.padded_a[n - 1..]
                .iter_mut()
                .zip(lead_i.iter().zip(lead_q.iter()).take(n))
            {
                *dst = Complex::new(f64::from(*q), f64::from(*i));
            }
            self.padded_b.fill(Complex::new(0.0, 0.0));
            for (dst, (i, q)) in self.padded_b[..n]
                .iter_mut()
                .zip(trail_i.iter().zip(trail_q.iter()).take(n))
            {
                *dst = Complex::new(f64::from(*q), f64::from(*i));
            }

            let peak_a = self.padded_a[n - 1..]
                .iter()
                .map(|c| c.norm())
                .fold(0.0, f64::max);
            let peak_b = self.padded_b[..n]
                .iter()
                .map(|c| c.norm())
                .fold(0.0, f64::max);
            (peak_a, peak_b)
        };

        if peak_a == 0.0 || peak_b == 0.0 {
            // A silent capture has nothing to normalize against; correlate
            // it as the all-zero trace instead of dividing by zero.
            self.fold_frame(|_| Complex::new(0.0, 0.0));
        } else {
            self.forward.process(&mut self.padded_a);
            self.forward.process(&mut self.padded_b);
            // The padded length folded into the scale undoes the
            // unnormalized inverse transform.
            let scale = padded_len as f64 * peak_a * peak_b * 2.0;
            for (a, b) in self.padded_a.iter_mut().zip(self.padded_b.iter()) {
                *a = *a * b.conj() / scale;
            }
            self.inverse.process(&mut self.padded_a);
            let frame = &self.padded_a;
            let averaging = self.averaging();
            match (self.seeded, averaging) {
                (true, Some(avg)) => {
                    for (slot, new) in self.acc.iter_mut().zip(frame.iter()) {
                        *slot = (*slot * (avg - 1.0) + new) / avg;
                    }
                }
                _ => self.acc.copy_from_slice(frame),
            }
            self.seeded = true;
        }

        let post_scale = 2.0 / n as f64;
        for (y, c) in self.y_axis.iter_mut().zip(self.acc.iter()) {
            *y = (c.re * post_scale) as f32;
        }

        self.update_markers();
        Ok(())
    }

    fn averaging(&self) -> Option<f64> {
        (self.settings.averaging > 1).then(|| f64::from(self.settings.averaging))
    }

    fn fold_frame(&mut self, frame: impl Fn(usize) -> Complex<f64>) {
        match (self.seeded, self.averaging()) {
            (true, Some(avg)) => {
                for (i, slot) in self.acc.iter_mut().enumerate() {
                    *slot = (*slot * (avg - 1.0) + frame(i)) / avg;
                }
            }
            _ => {
                for (i, slot) in self.acc.iter_mut().enumerate() {
                    *slot = frame(i);
                }
            }
        }
        self.seeded = true;
    }

    fn update_markers(&mut self) {
        match self.settings.markers {
            MarkerPolicy::Off | MarkerPolicy::TwoTone => {}
            MarkerPolicy::Peak => {
                self.peaks.reset();
                self.peaks.scan_abs(&self.y_axis, 0);
                self.place_refined_peaks();
            }
            MarkerPolicy::Fixed => {
                for marker in self.markers.slots_mut() {
                    if !marker.active {
                        break;
                    }
                    place_marker(marker, marker.bin, &self.x_axis, &self.y_axis, &[], false);
                }
            }
            // Rejected by XcorrSettings::validate.
            MarkerPolicy::OneTone | MarkerPolicy::Image => {}
        }
    }

    /// Place peak markers with sub-bin refinement.
    ///
    /// The parabola is fit through the magnitudes around each peak, then
    /// the center sample's sign is restored, so negative correlation lobes
    /// refine the same way positive ones do.
    fn place_refined_peaks(&mut self) {
        for (rank, marker) in self.markers.slots_mut().iter_mut().enumerate() {
            if !marker.active {
                break;
            }
            let bin = self.peaks.bin(rank);
            if bin < 1 || bin + 1 >= self.y_axis.len() || self.peaks.level(rank) <= 0.0 {
                marker.clear_position();
                continue;
            }
            let refined = parabolic_peak(
                f64::from(self.y_axis[bin - 1].abs()),
                f64::from(self.y_axis[bin].abs()),
                f64::from(self.y_axis[bin + 1].abs()),
            );
            marker.bin = bin;
            marker.x = (f64::from(self.x_axis[bin]) + refined.offset) as f32;
            marker.y = (refined.amplitude as f32).copysign(self.y_axis[bin]);
            marker.angle = f32::NAN;
            marker.vector = Complex::new(0.0, 0.0);
        }
    }

    /// Clear accumulation so the next update starts a fresh first frame.
    pub fn reset(&mut self) {
        self.acc.fill(Complex::new(0.0, 0.0));
        self.seeded = false;
        self.y_axis.fill(0.0);
        self.peaks.reset();
    }

    /// Lag axis in samples, `-(N-1) ..= N-1` with zero lag centered.
    pub fn x_axis(&self) -> &[f32] {
        &self.x_axis
    }

    /// Normalized correlation against lag, real part only.
    pub fn y_axis(&self) -> &[f32] {
        &self.y_axis
    }

    /// This trace's marker table.
    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    /// Mutable marker access, used to pin bins for fixed-marker plots.
    pub fn markers_mut(&mut self) -> &mut MarkerSet {
        &mut self.markers
    }

    /// Whether this trace publishes the plot's live markers.
    pub fn owns_markers(&self) -> bool {
        self.owns_markers
    }

    pub(crate) fn set_owns_markers(&mut self, owns: bool) {
        self.owns_markers = owns;
    }

    /// The configuration this trace runs under.
    pub fn settings(&self) -> &XcorrSettings {
        &self.settings
    }
}
