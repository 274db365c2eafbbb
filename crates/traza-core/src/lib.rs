//! Traza Core - spectral display primitives
//!
//! This crate provides the allocation-free building blocks behind traza's
//! plot transforms: window tables, spectrum reordering, peak tracking and
//! level conversion. Everything here operates on caller-owned slices so the
//! same code serves desktop plots and embedded captures.
//!
//! # Core Abstractions
//!
//! ## Windowing
//!
//! - [`WindowFunction`] - The supported FFT windows, keyed by UI name
//! - [`window_weight`] / [`window_power_offset_db`] - Name-based lookups
//!   with unit-weight fallback
//!
//! ## Spectrum Layout
//!
//! - [`fftshift`] - In-place rotation into centered display order
//! - [`fftshift_index`] - Index mapping between raw and centered order
//!
//! ## Peak Tracking
//!
//! - [`PeakTable`] - Ranked table of the strongest local maxima
//! - [`climb_to_local_max`] - Uphill walk from a predicted bin
//! - [`parabolic_peak`] - Sub-bin vertex refinement from three samples
//!
//! ## Levels
//!
//! - [`power_db`] - Bin power to normalized dB
//! - [`fft_corr_db`] - Full-scale correction from converter bit depth
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible for embedded capture frontends.
//! Disable the default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! traza-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use traza_core::{PeakTable, WindowFunction, power_db};
//!
//! // Window one frame of samples.
//! let window = WindowFunction::Hanning;
//! let frame: Vec<f64> = (0..1024)
//!     .map(|j| window.weight(j, 1024))
//!     .collect();
//!
//! // Rank the local maxima of a finished trace.
//! let trace = [-90.0, -40.0, -80.0, -75.0, -12.0, -60.0];
//! let mut peaks = PeakTable::new();
//! peaks.seed(0, trace[0]);
//! peaks.scan(&trace, 0);
//! assert_eq!(peaks.bin(0), 4);
//!
//! // Convert a bin to display dB.
//! let level = power_db(512.0, 0.0, 1024);
//! assert!(level < 0.0);
//! # let _ = frame;
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod interp;
pub mod level;
pub mod peaks;
pub mod shift;
pub mod window;

// Re-export main types at crate root
pub use interp::{ParabolicPeak, parabolic_peak};
pub use level::{fft_corr_db, power_db};
pub use peaks::{LEVEL_FLOOR, MAX_MARKERS, PeakTable, climb_to_local_max};
pub use shift::{fftshift, fftshift_index};
pub use window::{WindowFunction, window_power_offset_db, window_weight};
