//! Spectrum traces: windowed FFT, dB conversion, accumulation and markers.
//!
//! One [`FftTransform`] serves one trace. Real channels produce a
//! one-sided spectrum of `fft_size / 2` bins; I/Q pairs produce a centered
//! spectrum of `fft_size` bins with DC in the middle. Every update windows
//! the current capture, transforms it, converts bin power to dB and folds
//! the result into the accumulated trace according to the configured
//! averaging policy.

use traza_core::{MAX_MARKERS, PeakTable, climb_to_local_max, fft_corr_db, power_db};

use crate::NO_DATA;
use crate::error::TransformError;
use crate::fft_state::{FftMode, FftState};
use crate::marker::{MarkerSet, place_marker};
use crate::settings::{Averaging, FftSettings, MarkerPolicy};
use crate::source::{ChannelMeta, SharedSamples};

/// Fold one new magnitude into an accumulated trace slot.
///
/// A slot still holding the [`NO_DATA`] sentinel takes the new value
/// outright regardless of policy, so the first frame after a reset seeds
/// the trace.
pub(crate) fn accumulate_bin(slot: &mut f32, magnitude: f32, averaging: Averaging) {
    if *slot == NO_DATA {
        *slot = magnitude;
        return;
    }
    match averaging {
        Averaging::PeakHold => {
            if magnitude >= *slot {
                *slot = magnitude;
            }
        }
        Averaging::MinHold => {
            if magnitude <= *slot {
                *slot = magnitude;
            }
        }
        Averaging::Exponential(weight) => {
            *slot = ((1.0 - weight) * f64::from(*slot) + weight * f64::from(magnitude)) as f32;
        }
    }
}

/// Spectrum trace fed by one real channel or one I/Q pair.
pub struct FftTransform {
    settings: FftSettings,
    mode: FftMode,
    channel_i: SharedSamples,
    channel_q: Option<SharedSamples>,
    state: FftState,
    /// Full-scale correction from the channel's bit depth.
    fft_corr: f64,
    /// Configured power offset plus optional window correction.
    correction_db: f64,
    x_axis: Vec<f32>,
    y_axis: Vec<f32>,
    markers: MarkerSet,
    peaks: PeakTable,
    owns_markers: bool,
}

impl FftTransform {
    /// Build a real-mode transform over one channel.
    pub fn real(
        meta: &ChannelMeta,
        data: SharedSamples,
        settings: FftSettings,
    ) -> Result<Self, TransformError> {
        Self::build(meta, data, None, settings)
    }

    /// Build a complex-mode transform over an I/Q pair, in-phase first.
    pub fn complex(
        meta: &ChannelMeta,
        i_data: SharedSamples,
        q_data: SharedSamples,
        settings: FftSettings,
    ) -> Result<Self, TransformError> {
        Self::build(meta, i_data, Some(q_data), settings)
    }

    fn build(
        meta: &ChannelMeta,
        channel_i: SharedSamples,
        channel_q: Option<SharedSamples>,
        settings: FftSettings,
    ) -> Result<Self, TransformError> {
        settings.validate()?;
        let mode = if channel_q.is_some() {
            FftMode::Complex
        } else {
            FftMode::Real
        };
        if settings.markers == MarkerPolicy::Image && mode == FftMode::Real {
            return Err(TransformError::UnsupportedMarkerPolicy {
                policy: MarkerPolicy::Image,
                transform: "real FFT",
            });
        }
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

        let mut state = FftState::new(window);
        state.ensure_sized(settings.fft_size, mode)?;
        let m = state.m();

        let bin_hz = meta.sampling_frequency / settings.fft_size as f64;
        let mut x_axis = Vec::new();
        x_axis.try_reserve_exact(m)?;
        match mode {
            FftMode::Real => x_axis.extend((0..m).map(|i| (i as f64 * bin_hz) as f32)),
            FftMode::Complex => x_axis.extend(
                (0..m).map(|i| (i as f64 * bin_hz - meta.sampling_frequency / 2.0) as f32),
            ),
        }
        let mut y_axis = Vec::new();
        y_axis.try_reserve_exact(m)?;
        y_axis.resize(m, NO_DATA);

        let mut markers = MarkerSet::new();
        if settings.markers != MarkerPolicy::Off {
            markers.activate(settings.active_markers);
        }

        Ok(Self {
            settings,
            mode,
            channel_i,
            channel_q,
            state,
            fft_corr,
            correction_db,
            x_axis,
            y_axis,
            markers,
            peaks: PeakTable::new(),
            owns_markers: false,
        })
    }

    /// Run one capture frame through the transform.
    pub fn update(&mut self) -> Result<(), TransformError> {
        self.state.ensure_sized(self.settings.fft_size, self.mode)?;
        match self.mode {
            FftMode::Real => {
                let data = self.channel_i.borrow();
                self.state.run_real(&data)?;
            }
            FftMode::Complex => {
                let i_data = self.channel_i.borrow();
                let q_data = self
                    .channel_q
                    .as_ref()
                    .ok_or(TransformError::ModeMismatch)?
                    .borrow();
                self.state.run_complex(&i_data, &q_data)?;
            }
        }

        let m = self.state.m();
        let averaging = Averaging::from_factor(self.settings.averaging);
        let total_corr = self.fft_corr + self.correction_db;
        let spectrum = self.state.output();
        for (slot, bin) in self.y_axis.iter_mut().zip(spectrum.iter()) {
            let magnitude = (power_db(bin.re, bin.im, m) + total_corr) as f32;
            accumulate_bin(slot, magnitude, averaging);
        }

        self.update_markers();
        Ok(())
    }

    /// Clear accumulation so the next update starts a fresh first pass.
    ///
    /// Plans, window tables and axis buffers are kept.
    pub fn reset(&mut self) {
        self.y_axis.fill(NO_DATA);
        self.peaks.reset();
    }

    /// X axis in Hz: `[0, fs/2)` one-sided or `[-fs/2, fs/2)` centered.
    pub fn x_axis(&self) -> &[f32] {
        &self.x_axis
    }

    /// Accumulated trace in dB; bins still holding [`NO_DATA`] have not
    /// seen a frame since the last reset.
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

    /// Input mode this trace was built for.
    pub fn mode(&self) -> FftMode {
        self.mode
    }

    /// The configuration this trace runs under.
    pub fn settings(&self) -> &FftSettings {
        &self.settings
    }

    /// Display bin carrying DC: the first bin one-sided, the center bin
    /// centered.
    fn dc_bin(&self) -> usize {
        match self.mode {
            FftMode::Real => 0,
            FftMode::Complex => self.state.m() / 2,
        }
    }

    fn update_markers(&mut self) {
        match self.settings.markers {
            // TwoTone is reserved and intentionally places nothing.
            MarkerPolicy::Off | MarkerPolicy::TwoTone => {}
            MarkerPolicy::Peak => {
                self.scan_peaks();
                self.place_peak_markers();
            }
            MarkerPolicy::Fixed => self.place_fixed_markers(),
            MarkerPolicy::OneTone => {
                self.scan_peaks();
                self.place_one_tone_markers();
            }
            MarkerPolicy::Image => {
                self.scan_peaks();
                self.place_image_markers();
            }
        }
    }

    /// Rebuild the peak table from the accumulated trace.
    ///
    /// The scan never visits bin 0, so it is planted as the initial top
    /// entry; on one-sided spectra that is DC, which the one-tone family
    /// counts on.
    fn scan_peaks(&mut self) {
        self.peaks.reset();
        self.peaks.seed(0, self.y_axis[0]);
        self.peaks.scan(&self.y_axis, 0);
    }

    fn place_peak_markers(&mut self) {
        let carries_phase = self.mode == FftMode::Complex;
        let spectrum = self.state.output();
        for (rank, marker) in self.markers.slots_mut().iter_mut().enumerate() {
            if !marker.active || rank > MAX_MARKERS {
                break;
            }
            place_marker(
                marker,
                self.peaks.bin(rank),
                &self.x_axis,
                &self.y_axis,
                spectrum,
                carries_phase,
            );
        }
    }

    fn place_fixed_markers(&mut self) {
        let carries_phase = self.mode == FftMode::Complex;
        let spectrum = self.state.output();
        for marker in self.markers.slots_mut() {
            if !marker.active {
                break;
            }
            place_marker(
                marker,
                marker.bin,
                &self.x_axis,
                &self.y_axis,
                spectrum,
                carries_phase,
            );
        }
    }

    fn place_one_tone_markers(&mut self) {
        let m = self.state.m();
        let dc_bin = self.dc_bin();
        let mut fundamental = self.peaks.bin(0);
        if fundamental == dc_bin {
            // DC outweighs the tone; the next contender is the fundamental.
            fundamental = self.peaks.bin(1);
        }
        let carries_phase = self.mode == FftMode::Complex;
        let mode = self.mode;
        let spectrum = self.state.output();
        for (rank, marker) in self.markers.slots_mut().iter_mut().enumerate() {
            if !marker.active {
                break;
            }
            let bin = match rank {
                0 => fundamental,
                1 => dc_bin,
                harmonic => {
                    let predicted = predict_harmonic(fundamental, dc_bin, harmonic, m, mode);
                    climb_to_local_max(&self.y_axis, predicted)
                }
            };
            place_marker(marker, bin, &self.x_axis, &self.y_axis, spectrum, carries_phase);
        }
    }

    fn place_image_markers(&mut self) {
        let m = self.state.m();
        let dc_bin = self.dc_bin();
        let fundamental = self.peaks.bin(0);
        let spectrum = self.state.output();
        for (rank, marker) in self.markers.slots_mut().iter_mut().enumerate() {
            if !marker.active {
                break;
            }
            match rank {
                0 => place_marker(marker, fundamental, &self.x_axis, &self.y_axis, spectrum, true),
                1 => place_marker(marker, dc_bin, &self.x_axis, &self.y_axis, spectrum, true),
                2 => {
                    let image = (m - fundamental.min(m)) % m;
                    place_marker(marker, image, &self.x_axis, &self.y_axis, spectrum, true);
                }
                _ => marker.clear_position(),
            }
        }
    }
}

/// Predicted display bin of harmonic `harmonic` of a tone at `fundamental`.
///
/// One-sided spectra fold at Nyquist; centered spectra wrap modulo the
/// sampling rate around DC.
fn predict_harmonic(
    fundamental: usize,
    dc_bin: usize,
    harmonic: usize,
    m: usize,
    mode: FftMode,
) -> usize {
    match mode {
        FftMode::Real => {
            let span = 2 * m;
            let mut bin = (fundamental * harmonic) % span;
            if bin >= m {
                bin = span - bin;
            }
            bin.min(m - 1)
        }
        FftMode::Complex => {
            let offset = fundamental as i64 - dc_bin as i64;
            let wrapped = (dc_bin as i64 + offset * harmonic as i64).rem_euclid(m as i64);
            wrapped as usize
        }
    }
}
