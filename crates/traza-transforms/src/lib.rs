//! Traza Transforms - the plot transform engine
//!
//! This crate turns raw capture buffers into plot-ready traces:
//!
//! - [`fft`] - Windowed spectra with accumulation policies and markers
//! - [`sweep`] - Swept spectra stitched across LO steps
//! - [`xcorr`] - Cross-correlation of two I/Q pairs against lag
//! - [`time`] - Time-domain and constellation traces
//! - [`dispatcher`] - Transform selection, marker ownership, snapshot hand-off
//! - [`source`] - The seam to external capture producers and math channels
//! - [`settings`] - Serializable per-domain configuration with validation
//! - [`fft_state`] - Lazily sized FFT plans and work buffers
//! - [`marker`] - Marker tables and cross-thread snapshots
//! - [`signal`] - Synthetic captures for tests and demos
//!
//! # Execution Model
//!
//! Everything runs on one thread: an external scheduler calls
//! [`PlotEngine::tick`] at its capture cadence (tens of hertz), and every
//! transform update is synchronous CPU work within that tick. The single
//! cross-thread boundary is the marker snapshot hand-off, a one-shot
//! channel a consumer may block on from elsewhere.
//!
//! # Example
//!
//! ```rust
//! use traza_transforms::settings::{FftSettings, MarkerPolicy, PlotSettings};
//! use traza_transforms::signal::quadrature_tone;
//! use traza_transforms::source::{CaptureChannel, ChannelMeta, SampleSource};
//! use traza_transforms::{PlotEngine, UpdateStatus};
//!
//! // An I/Q pair carrying a tone 12 bins above the capture center.
//! let (i, q) = quadrature_tone(1.0e6, 12.0 * 1.0e6 / 1024.0, 0.5, 1024);
//! let channels: Vec<Box<dyn SampleSource>> = vec![
//!     Box::new(CaptureChannel::with_data(
//!         ChannelMeta::new("voltage0_i", 12, 1.0e6).complex_pair(),
//!         i,
//!     )),
//!     Box::new(CaptureChannel::with_data(
//!         ChannelMeta::new("voltage0_q", 12, 1.0e6).complex_pair(),
//!         q,
//!     )),
//! ];
//!
//! let mut engine = PlotEngine::new(PlotSettings::Fft(FftSettings {
//!     fft_size: 1024,
//!     markers: MarkerPolicy::Peak,
//!     active_markers: 1,
//!     ..FftSettings::default()
//! }));
//! engine.activate(channels).unwrap();
//! assert_eq!(engine.tick().unwrap(), UpdateStatus::Complete);
//!
//! let trace = &engine.traces()[0];
//! assert_eq!(trace.y_axis().len(), 1024);
//! assert_eq!(engine.live_markers().unwrap().slots()[0].bin, 512 + 12);
//! ```

pub mod dispatcher;
pub mod error;
pub mod fft;
pub mod fft_state;
pub mod marker;
pub mod settings;
pub mod signal;
pub mod source;
pub mod sweep;
pub mod time;
pub mod xcorr;

// Re-export main types at crate root
pub use dispatcher::{ActivationReport, PlotEngine, SetupValidator, Trace};
pub use error::{DispatchError, TransformError};
pub use fft::FftTransform;
pub use fft_state::{FftMode, FftState};
pub use marker::{Marker, MarkerSet, MarkerSnapshot, phase_difference_deg};
pub use settings::{MarkerPolicy, PlotDomain, PlotSettings};
pub use source::{CaptureChannel, ChannelMeta, MathChannel, SampleSource, SharedSamples};
pub use sweep::{SweepTransform, UpdateStatus};
pub use time::{ConstellationTransform, TimeTransform};
pub use xcorr::XcorrTransform;

/// Sentinel filling frequency traces before their first frame.
///
/// Any real magnitude is far below it, so accumulation can tell "never
/// written since reset" apart from every legitimate dB value.
pub const NO_DATA: f32 = f32::MAX;
