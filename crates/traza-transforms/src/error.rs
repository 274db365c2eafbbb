//! Error types for transform construction and the update loop.

use std::collections::TryReserveError;
use thiserror::Error;

use crate::settings::{MarkerPolicy, PlotDomain};

/// Errors fatal to a single transform instance.
///
/// During plot activation these skip the offending channel rather than
/// tearing the whole plot down; once a transform runs they abort its tick.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Window name not found in the supported table
    #[error("unknown window function: {0:?}")]
    UnknownWindow(String),

    /// FFT size outside the supported power-of-two range
    #[error("invalid FFT size {0}: must be a power of two between 64 and 4194304")]
    InvalidFftSize(usize),

    /// Plan size too small or odd for the half-spectrum layout
    #[error("cannot plan an FFT of size {0}: must be even and at least 2")]
    UnplannableFftSize(usize),

    /// Channel metadata reports no significant bits
    #[error("channel {channel:?} reports zero significant bits")]
    InvalidBitDepth {
        /// Name of the channel with the bad metadata.
        channel: String,
    },

    /// Sweep settings carry a non-positive filter bandwidth
    #[error("sweep filter bandwidth must be positive, got {0}")]
    NonPositiveBandwidth(f64),

    /// Sweep clip span rounds down to zero bins
    #[error(
        "sweep clip span is empty: {bandwidth} Hz bandwidth against {sampling_frequency} Hz sampling rate"
    )]
    EmptySweepClip {
        /// Configured filter bandwidth in Hz.
        bandwidth: f64,
        /// Channel sampling frequency in Hz.
        sampling_frequency: f64,
    },

    /// Sweep clip span is wider than the FFT itself
    #[error(
        "sweep clip span exceeds the FFT: {bandwidth} Hz bandwidth against {sampling_frequency} Hz sampling rate"
    )]
    OversizedSweepClip {
        /// Configured filter bandwidth in Hz.
        bandwidth: f64,
        /// Channel sampling frequency in Hz.
        sampling_frequency: f64,
    },

    /// Sweep configured with no steps
    #[error("sweep step count must be at least 1")]
    EmptySweep,

    /// Correlation window too short to hold a lag axis
    #[error("cross-correlation needs at least 2 samples per channel, got {0}")]
    ShortCorrelation(usize),

    /// Trace configured with no samples
    #[error("transform needs at least one sample per channel")]
    EmptyCapture,

    /// Marker policy undefined for this transform family
    #[error("marker policy {policy:?} is not available for {transform} transforms")]
    UnsupportedMarkerPolicy {
        /// The rejected policy.
        policy: MarkerPolicy,
        /// Transform family that cannot honor it.
        transform: &'static str,
    },

    /// Trace buffer allocation failed
    #[error("trace allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    /// FFT backend reported a processing error
    #[error("FFT execution failed: {0}")]
    Execution(String),

    /// Update ran before buffers were sized
    #[error("transform buffers are not sized yet")]
    Unsized,

    /// Update ran against buffers sized for the other input mode
    #[error("transform buffers are sized for a different input mode")]
    ModeMismatch,
}

/// Errors that reject a whole plot configuration.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Channel count impossible for the requested domain
    #[error("{domain:?} plots cannot run with {count} channel(s)")]
    InvalidChannelCount {
        /// Requested plot domain.
        domain: PlotDomain,
        /// Number of channels attached to the plot.
        count: usize,
    },

    /// Complex channel without an adjacent partner
    #[error("complex channel {0:?} has no adjacent pair partner")]
    UnpairedComplexChannel(String),

    /// Injected device validation refused the channel set
    #[error("setup validation rejected the channel set: {0}")]
    SetupRejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_window_display_quotes_the_name() {
        let err = TransformError::UnknownWindow("Kaiser".to_string());
        assert_eq!(err.to_string(), "unknown window function: \"Kaiser\"");
    }

    #[test]
    fn invalid_fft_size_display_names_the_range() {
        let msg = TransformError::InvalidFftSize(100).to_string();
        assert!(msg.contains("100"), "got: {msg}");
        assert!(msg.contains("power of two"), "got: {msg}");
    }

    #[test]
    fn sweep_clip_display_carries_both_rates() {
        let msg = TransformError::EmptySweepClip {
            bandwidth: 10.0,
            sampling_frequency: 100_000.0,
        }
        .to_string();
        assert!(msg.contains("10"), "got: {msg}");
        assert!(msg.contains("100000"), "got: {msg}");
    }

    #[test]
    fn unsupported_policy_display_names_the_family() {
        let msg = TransformError::UnsupportedMarkerPolicy {
            policy: MarkerPolicy::Image,
            transform: "real FFT",
        }
        .to_string();
        assert!(msg.contains("Image"), "got: {msg}");
        assert!(msg.contains("real FFT"), "got: {msg}");
    }

    #[test]
    fn invalid_channel_count_display_names_the_domain() {
        let msg = DispatchError::InvalidChannelCount {
            domain: PlotDomain::Constellation,
            count: 3,
        }
        .to_string();
        assert!(msg.contains("Constellation"), "got: {msg}");
        assert!(msg.contains("3"), "got: {msg}");
    }
}
