//! Swept-spectrum traces stitched from LO sweep steps.
//!
//! A narrowband front end cannot show more spectrum than one capture
//! covers, so the sweep tunes its LO across [`SweepSettings::step_count`]
//! discrete frequencies and keeps only the clip span each analog filter
//! passes cleanly. [`SweepTransform`] runs one FFT per step into its
//! segment of a shared trace; a frame is only [`UpdateStatus::Complete`]
//! once every segment of the current sweep has landed.

use traza_core::{PeakTable, fft_corr_db, power_db};

use crate::NO_DATA;
use crate::error::TransformError;
use crate::fft::accumulate_bin;
use crate::fft_state::{FftMode, FftState};
use crate::marker::{MarkerSet, place_marker};
use crate::settings::{Averaging, MarkerPolicy, SweepSettings};
use crate::source::{ChannelMeta, SharedSamples};

/// Progress of a multi-step trace after one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    /// More steps are needed before the trace shows a full frame.
    Assembling,
    /// The trace finished a frame on this update.
    Complete,
}

/// Spectrum trace assembled across LO sweep steps of one I/Q pair.
///
/// The capture loop retunes the LO between updates; the transform only
/// tracks which segment the next capture belongs to.
pub struct SweepTransform {
    settings: SweepSettings,
    channel_i: SharedSamples,
    channel_q: SharedSamples,
    /// One plan per step, so a mid-sweep resize never mixes segment shapes.
    states: Vec<FftState>,
    fft_corr: f64,
    correction_db: f64,
    lower_clip: usize,
    clip_width: usize,
    /// Segment the next update writes; wraps to 0 when a sweep completes.
    step_index: usize,
    x_axis: Vec<f32>,
    y_axis: Vec<f32>,
    markers: MarkerSet,
    peaks: PeakTable,
    owns_markers: bool,
}

impl SweepTransform {
    /// Build a sweep over an I/Q pair, in-phase first.
    pub fn new(
        meta: &ChannelMeta,
        channel_i: SharedSamples,
        channel_q: SharedSamples,
        settings: SweepSettings,
    ) -> Result<Self, TransformError> {
        settings.validate()?;
        let window = settings.window_function()?;
        let fft_corr =
            fft_corr_db(meta.bits_used).ok_or_else(|| TransformError::InvalidBitDepth {
                channel: meta.name.clone(),
            })?;
        let correction_db = settings.power_offset_db
            + if settings.window_correction {
                window.power_correction_db()
            } else {
                0.0
            };

        let fs = meta.sampling_frequency;
        let fft_size = settings.fft_size;
        // Bins the analog filter passes cleanly, centered on the LO.
        let half_span = (settings.filter_bandwidth * fft_size as f64 / (2.0 * fs)) as usize;
        if half_span == 0 {
            return Err(TransformError::EmptySweepClip {
                bandwidth: settings.filter_bandwidth,
                sampling_frequency: fs,
            });
        }
        if half_span > fft_size / 2 {
            return Err(TransformError::OversizedSweepClip {
                bandwidth: settings.filter_bandwidth,
                sampling_frequency: fs,
            });
        }
        let lower_clip = fft_size / 2 - half_span;
        let clip_width = 2 * half_span;

        let mut states = Vec::new();
        states.try_reserve_exact(settings.step_count)?;
        for _ in 0..settings.step_count {
            let mut state = FftState::new(window);
            state.ensure_sized(fft_size, FftMode::Complex)?;
            states.push(state);
        }

        let trace_len = settings.step_count * clip_width;
        let bin_hz = fs / fft_size as f64;
        let mut x_axis = Vec::new();
        x_axis.try_reserve_exact(trace_len)?;
        for step in 0..settings.step_count {
            let lo = settings.start_frequency + settings.filter_bandwidth * step as f64;
            x_axis.extend(
                (lower_clip..lower_clip + clip_width)
                    .map(|j| (j as f64 * bin_hz - fs / 2.0 + lo) as f32),
            );
        }
        let mut y_axis = Vec::new();
        y_axis.try_reserve_exact(trace_len)?;
        y_axis.resize(trace_len, NO_DATA);

        let mut markers = MarkerSet::new();
        if settings.markers != MarkerPolicy::Off {
            markers.activate(settings.active_markers);
        }

        Ok(Self {
            settings,
            channel_i,
            channel_q,
            states,
            fft_corr,
            correction_db,
            lower_clip,
            clip_width,
            step_index: 0,
            x_axis,
            y_axis,
            markers,
            peaks: PeakTable::new(),
            owns_markers: false,
        })
    }

    /// Run the capture of the current sweep step into its segment.
    ///
    /// Returns [`UpdateStatus::Complete`] only on the update that fills the
    /// last segment; markers are finalized on that update too, since the
    /// peak table is not meaningful over a half-assembled trace.
    pub fn update_step(&mut self) -> Result<UpdateStatus, TransformError> {
        let fft_size = self.settings.fft_size;
        let state = &mut self.states[self.step_index];
        state.ensure_sized(fft_size, FftMode::Complex)?;
        {
            let i_data = self.channel_i.borrow();
            let q_data = self.channel_q.borrow();
            state.run_complex(&i_data, &q_data)?;
        }

        let m = state.m();
        let averaging = Averaging::from_factor(self.settings.averaging);
        let total_corr = self.fft_corr + self.correction_db;
        let seg_start = self.step_index * self.clip_width;
        let spectrum = state.output();
        for (offset, bin) in spectrum
            .iter()
            .skip(self.lower_clip)
            .take(self.clip_width)
            .enumerate()
        {
            let magnitude = (power_db(bin.re, bin.im, m) + total_corr) as f32;
            accumulate_bin(&mut self.y_axis[seg_start + offset], magnitude, averaging);
        }

        if self.settings.markers == MarkerPolicy::Peak {
            if self.step_index == 0 {
                self.peaks.reset();
                self.peaks.seed(0, self.y_axis[0]);
            }
            // Reach two bins back so segment-boundary maxima keep their
            // left context; candidate ranges of adjacent steps stay disjoint.
            let from = seg_start.saturating_sub(2);
            self.peaks
                .scan(&self.y_axis[from..seg_start + self.clip_width], from);
        }

        self.step_index += 1;
        if self.step_index < self.settings.step_count {
            return Ok(UpdateStatus::Assembling);
        }
        self.step_index = 0;
        self.finalize_markers();
        Ok(UpdateStatus::Complete)
    }

    /// Convert the sweep's tracked bins into marker positions.
    ///
    /// Stitched traces carry no phase: every marker keeps a NaN angle and a
    /// zero vector.
    fn finalize_markers(&mut self) {
        match self.settings.markers {
            MarkerPolicy::Off | MarkerPolicy::TwoTone => {}
            MarkerPolicy::Peak => {
                for (rank, marker) in self.markers.slots_mut().iter_mut().enumerate() {
                    if !marker.active {
                        break;
                    }
                    place_marker(
                        marker,
                        self.peaks.bin(rank),
                        &self.x_axis,
                        &self.y_axis,
                        &[],
                        false,
                    );
                }
            }
            MarkerPolicy::Fixed => {
                for marker in self.markers.slots_mut() {
                    if !marker.active {
                        break;
                    }
                    place_marker(marker, marker.bin, &self.x_axis, &self.y_axis, &[], false);
                }
            }
            // Rejected by SweepSettings::validate.
            MarkerPolicy::OneTone | MarkerPolicy::Image => {}
        }
    }

    /// Restart the sweep: accumulation, segment cursor and peak tracking
    /// all return to their first-frame state. Plans are kept.
    pub fn reset(&mut self) {
        self.y_axis.fill(NO_DATA);
        self.step_index = 0;
        self.peaks.reset();
    }

    /// Stitched x axis in Hz, monotonically increasing across segments.
    pub fn x_axis(&self) -> &[f32] {
        &self.x_axis
    }

    /// Stitched trace in dB; segments not yet visited this capture hold
    /// [`NO_DATA`].
    pub fn y_axis(&self) -> &[f32] {
        &self.y_axis
    }

    /// This trace's marker table, refreshed once per completed sweep.
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

    /// Segment the next update writes, `0..step_count`.
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// Bins kept per sweep step.
    pub fn clip_width(&self) -> usize {
        self.clip_width
    }

    /// The configuration this trace runs under.
    pub fn settings(&self) -> &SweepSettings {
        &self.settings
    }
}
