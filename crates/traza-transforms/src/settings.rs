//! Per-domain plot configuration with validation.
//!
//! Settings structs are plain serializable data; nothing here touches
//! hardware or allocates trace buffers. Each carries a `validate` method
//! that transform constructors call before sizing anything, so a bad
//! configuration is rejected with a [`TransformError`] instead of
//! producing a silently wrong trace.

use serde::{Deserialize, Serialize};
use traza_core::WindowFunction;

use crate::error::TransformError;

/// Smallest supported FFT size.
pub const FFT_SIZE_MIN: usize = 64;

/// Largest supported FFT size.
pub const FFT_SIZE_MAX: usize = 4_194_304;

/// Averaging factor that selects min-hold accumulation.
pub const MIN_HOLD_FACTOR: u32 = 128;

/// Plot domains an engine can be configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlotDomain {
    /// Sample traces against time or sample index.
    Time,
    /// Spectra from real channels or I/Q pairs.
    Fft,
    /// One channel against another, point by point.
    Constellation,
    /// Correlation of two I/Q pairs against lag.
    CrossCorrelation,
    /// Spectrum stitched from LO sweep steps.
    SweptSpectrum,
}

/// Marker families a plot can maintain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarkerPolicy {
    /// No markers.
    #[default]
    Off,
    /// Track the strongest local maxima, strongest first.
    Peak,
    /// Pin markers to caller-chosen bins and re-read their levels.
    Fixed,
    /// Fundamental, DC and predicted harmonics of a single tone.
    OneTone,
    /// Reserved; currently behaves as [`MarkerPolicy::Off`].
    TwoTone,
    /// Fundamental, DC and the image mirrored around DC.
    Image,
}

/// Accumulation policy derived from a plot's averaging factor.
///
/// The factor is a single knob: `0` holds peaks, [`MIN_HOLD_FACTOR`] holds
/// minima, anything else blends exponentially with weight `1 / factor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Averaging {
    /// Keep the largest level seen per bin.
    PeakHold,
    /// Keep the smallest level seen per bin.
    MinHold,
    /// Exponential moving average with the given new-frame weight.
    Exponential(f64),
}

impl Averaging {
    /// Decode a plot's averaging factor.
    pub fn from_factor(factor: u32) -> Self {
        match factor {
            0 => Averaging::PeakHold,
            MIN_HOLD_FACTOR => Averaging::MinHold,
            n => Averaging::Exponential(1.0 / f64::from(n)),
        }
    }
}

fn valid_fft_size(size: usize) -> bool {
    size.is_power_of_two() && (FFT_SIZE_MIN..=FFT_SIZE_MAX).contains(&size)
}

fn lookup_window(name: &str) -> Result<WindowFunction, TransformError> {
    WindowFunction::from_name(name).ok_or_else(|| TransformError::UnknownWindow(name.to_string()))
}

/// Configuration for spectrum plots over real channels or I/Q pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FftSettings {
    /// Transform size in samples; a power of two between [`FFT_SIZE_MIN`]
    /// and [`FFT_SIZE_MAX`].
    pub fft_size: usize,
    /// Window name as listed by [`WindowFunction::name`].
    pub window: String,
    /// Averaging factor; see [`Averaging::from_factor`].
    pub averaging: u32,
    /// Constant dB offset added to every bin.
    pub power_offset_db: f64,
    /// Fold the window's power correction into every bin.
    pub window_correction: bool,
    /// Marker family to maintain.
    pub markers: MarkerPolicy,
    /// Markers to activate, capped at [`traza_core::MAX_MARKERS`].
    pub active_markers: usize,
}

impl Default for FftSettings {
    fn default() -> Self {
        Self {
            fft_size: 4096,
            window: WindowFunction::Hanning.name().to_string(),
            averaging: 0,
            power_offset_db: 0.0,
            window_correction: false,
            markers: MarkerPolicy::Off,
            active_markers: 4,
        }
    }
}

impl FftSettings {
    /// Check structural validity without sizing any buffers.
    pub fn validate(&self) -> Result<(), TransformError> {
        if !valid_fft_size(self.fft_size) {
            return Err(TransformError::InvalidFftSize(self.fft_size));
        }
        lookup_window(&self.window)?;
        Ok(())
    }

    pub(crate) fn window_function(&self) -> Result<WindowFunction, TransformError> {
        lookup_window(&self.window)
    }
}

/// Configuration for swept-spectrum plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSettings {
    /// Per-step transform size; a power of two between [`FFT_SIZE_MIN`]
    /// and [`FFT_SIZE_MAX`].
    pub fft_size: usize,
    /// Window name as listed by [`WindowFunction::name`].
    pub window: String,
    /// Averaging factor applied per stitched bin across sweeps.
    pub averaging: u32,
    /// Constant dB offset added to every bin.
    pub power_offset_db: f64,
    /// Fold the window's power correction into every bin.
    pub window_correction: bool,
    /// Center frequency of the first sweep step, in Hz.
    pub start_frequency: f64,
    /// Analog filter bandwidth kept from each step, in Hz; also the LO
    /// increment between steps.
    pub filter_bandwidth: f64,
    /// Number of LO steps per sweep.
    pub step_count: usize,
    /// Marker family to maintain; harmonic families are undefined for
    /// stitched traces.
    pub markers: MarkerPolicy,
    /// Markers to activate, capped at [`traza_core::MAX_MARKERS`].
    pub active_markers: usize,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            fft_size: 4096,
            window: WindowFunction::Hanning.name().to_string(),
            averaging: 0,
            power_offset_db: 0.0,
            window_correction: false,
            start_frequency: 0.0,
            filter_bandwidth: 0.0,
            step_count: 1,
            markers: MarkerPolicy::Off,
            active_markers: 4,
        }
    }
}

impl SweepSettings {
    /// Check structural validity without sizing any buffers.
    ///
    /// Whether the clip span is usable also depends on the channel's
    /// sampling frequency; that check happens at transform construction.
    pub fn validate(&self) -> Result<(), TransformError> {
        if !valid_fft_size(self.fft_size) {
            return Err(TransformError::InvalidFftSize(self.fft_size));
        }
        lookup_window(&self.window)?;
        if self.step_count == 0 {
            return Err(TransformError::EmptySweep);
        }
        if !(self.filter_bandwidth.is_finite() && self.filter_bandwidth > 0.0) {
            return Err(TransformError::NonPositiveBandwidth(self.filter_bandwidth));
        }
        match self.markers {
            MarkerPolicy::Off | MarkerPolicy::Peak | MarkerPolicy::Fixed | MarkerPolicy::TwoTone => {
                Ok(())
            }
            policy @ (MarkerPolicy::OneTone | MarkerPolicy::Image) => {
                Err(TransformError::UnsupportedMarkerPolicy {
                    policy,
                    transform: "swept spectrum",
                })
            }
        }
    }

    pub(crate) fn window_function(&self) -> Result<WindowFunction, TransformError> {
        lookup_window(&self.window)
    }
}

/// Configuration for cross-correlation plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XcorrSettings {
    /// Samples taken from each channel per frame.
    pub num_samples: usize,
    /// Averaging factor; values above 1 blend correlations across frames.
    pub averaging: u32,
    /// Correlate in the opposite order, mirroring the lag axis.
    pub reverse: bool,
    /// Marker family to maintain; harmonic families are undefined for
    /// correlation traces.
    pub markers: MarkerPolicy,
    /// Markers to activate, capped at [`traza_core::MAX_MARKERS`].
    pub active_markers: usize,
}

impl Default for XcorrSettings {
    fn default() -> Self {
        Self {
            num_samples: 4096,
            averaging: 0,
            reverse: false,
            markers: MarkerPolicy::Off,
            active_markers: 4,
        }
    }
}

impl XcorrSettings {
    /// Check structural validity without sizing any buffers.
    pub fn validate(&self) -> Result<(), TransformError> {
        if self.num_samples < 2 {
            return Err(TransformError::ShortCorrelation(self.num_samples));
        }
        match self.markers {
            MarkerPolicy::Off | MarkerPolicy::Peak | MarkerPolicy::Fixed | MarkerPolicy::TwoTone => {
                Ok(())
            }
            policy @ (MarkerPolicy::OneTone | MarkerPolicy::Image) => {
                Err(TransformError::UnsupportedMarkerPolicy {
                    policy,
                    transform: "cross-correlation",
                })
            }
        }
    }
}

/// Configuration for time-domain plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSettings {
    /// Samples shown per channel.
    pub num_samples: usize,
    /// Spread the x axis over `0..max_x_axis` instead of sample indices.
    pub max_x_axis: Option<f32>,
    /// Replace each sample with its reciprocal before scaling.
    pub invert: bool,
    /// Multiply each sample by this factor.
    pub multiply: Option<f32>,
    /// Add this offset to each sample, after any multiply.
    pub add: Option<f32>,
}

impl Default for TimeSettings {
    fn default() -> Self {
        Self {
            num_samples: 4096,
            max_x_axis: None,
            invert: false,
            multiply: None,
            add: None,
        }
    }
}

impl TimeSettings {
    /// Check structural validity without sizing any buffers.
    pub fn validate(&self) -> Result<(), TransformError> {
        if self.num_samples == 0 {
            return Err(TransformError::EmptyCapture);
        }
        Ok(())
    }
}

/// Configuration for constellation plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstellationSettings {
    /// Samples shown per frame.
    pub num_samples: usize,
}

impl Default for ConstellationSettings {
    fn default() -> Self {
        Self { num_samples: 4096 }
    }
}

impl ConstellationSettings {
    /// Check structural validity without sizing any buffers.
    pub fn validate(&self) -> Result<(), TransformError> {
        if self.num_samples == 0 {
            return Err(TransformError::EmptyCapture);
        }
        Ok(())
    }
}

/// Per-domain configuration selecting which transforms a plot runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlotSettings {
    /// Sample traces against time.
    Time(TimeSettings),
    /// Spectrum traces, one per real channel or I/Q pair.
    Fft(FftSettings),
    /// One trace plotting channel pairs point by point.
    Constellation(ConstellationSettings),
    /// One trace correlating two I/Q pairs.
    CrossCorrelation(XcorrSettings),
    /// One stitched trace over LO sweep steps.
    SweptSpectrum(SweepSettings),
}

impl PlotSettings {
    /// Domain this configuration belongs to.
    pub fn domain(&self) -> PlotDomain {
        match self {
            PlotSettings::Time(_) => PlotDomain::Time,
            PlotSettings::Fft(_) => PlotDomain::Fft,
            PlotSettings::Constellation(_) => PlotDomain::Constellation,
            PlotSettings::CrossCorrelation(_) => PlotDomain::CrossCorrelation,
            PlotSettings::SweptSpectrum(_) => PlotDomain::SweptSpectrum,
        }
    }

    /// Check structural validity of the wrapped settings.
    pub fn validate(&self) -> Result<(), TransformError> {
        match self {
            PlotSettings::Time(settings) => settings.validate(),
            PlotSettings::Fft(settings) => settings.validate(),
            PlotSettings::Constellation(settings) => settings.validate(),
            PlotSettings::CrossCorrelation(settings) => settings.validate(),
            PlotSettings::SweptSpectrum(settings) => settings.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(FftSettings::default().validate().is_ok());
        assert!(XcorrSettings::default().validate().is_ok());
        assert!(TimeSettings::default().validate().is_ok());
        assert!(ConstellationSettings::default().validate().is_ok());
        // The sweep default carries a zero bandwidth placeholder.
        assert!(matches!(
            SweepSettings::default().validate(),
            Err(TransformError::NonPositiveBandwidth(_))
        ));
    }

    #[test]
    fn fft_size_must_be_a_power_of_two_in_range() {
        let mut settings = FftSettings::default();
        for bad in [0, 32, 100, 8_388_608] {
            settings.fft_size = bad;
            assert!(
                matches!(settings.validate(), Err(TransformError::InvalidFftSize(size)) if size == bad),
                "size {bad} should be rejected"
            );
        }
        settings.fft_size = FFT_SIZE_MIN;
        assert!(settings.validate().is_ok());
        settings.fft_size = FFT_SIZE_MAX;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn unknown_window_is_rejected() {
        let settings = FftSettings {
            window: "Kaiser".to_string(),
            ..FftSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(TransformError::UnknownWindow(name)) if name == "Kaiser"
        ));
    }

    #[test]
    fn sweep_rejects_harmonic_marker_families() {
        let settings = SweepSettings {
            filter_bandwidth: 1000.0,
            markers: MarkerPolicy::OneTone,
            ..SweepSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(TransformError::UnsupportedMarkerPolicy { policy: MarkerPolicy::OneTone, .. })
        ));
    }

    #[test]
    fn sweep_rejects_zero_steps() {
        let settings = SweepSettings {
            filter_bandwidth: 1000.0,
            step_count: 0,
            ..SweepSettings::default()
        };
        assert!(matches!(settings.validate(), Err(TransformError::EmptySweep)));
    }

    #[test]
    fn xcorr_needs_two_samples() {
        let settings = XcorrSettings {
            num_samples: 1,
            ..XcorrSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(TransformError::ShortCorrelation(1))
        ));
    }

    #[test]
    fn averaging_factor_decodes_all_three_policies() {
        assert_eq!(Averaging::from_factor(0), Averaging::PeakHold);
        assert_eq!(Averaging::from_factor(MIN_HOLD_FACTOR), Averaging::MinHold);
        match Averaging::from_factor(4) {
            Averaging::Exponential(weight) => assert!((weight - 0.25).abs() < 1e-12),
            other => panic!("expected exponential averaging, got {other:?}"),
        }
    }

    #[test]
    fn plot_settings_carry_their_domain() {
        assert_eq!(
            PlotSettings::Fft(FftSettings::default()).domain(),
            PlotDomain::Fft
        );
        assert_eq!(
            PlotSettings::CrossCorrelation(XcorrSettings::default()).domain(),
            PlotDomain::CrossCorrelation
        );
    }

    #[test]
    fn settings_round_trip_through_json() {
        let settings = PlotSettings::Fft(FftSettings {
            fft_size: 8192,
            window: "Blackman-Harris".to_string(),
            averaging: 16,
            power_offset_db: -1.5,
            window_correction: true,
            markers: MarkerPolicy::OneTone,
            active_markers: 5,
        });
        let json = serde_json::to_string(&settings).unwrap();
        let back: PlotSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: FftSettings = serde_json::from_str(r#"{"fft_size": 1024}"#).unwrap();
        assert_eq!(settings.fft_size, 1024);
        assert_eq!(settings.window, "Hanning");
        assert_eq!(settings.active_markers, 4);
    }
}
