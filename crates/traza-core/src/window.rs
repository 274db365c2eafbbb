//! FFT window functions and their display power corrections.
//!
//! Each window is identified by the exact name shown in capture UIs, so
//! configuration strings round-trip through [`WindowFunction::from_name`] /
//! [`WindowFunction::name`] without translation tables.
//!
//! # Windows
//!
//! | Window | Main lobe | Character |
//! |--------|-----------|-----------|
//! | [`WindowFunction::Boxcar`] | Narrowest | Best resolution, worst leakage |
//! | [`WindowFunction::Hanning`] | Narrow | General-purpose default |
//! | [`WindowFunction::BlackmanHarris`] | Wide | Low sidelobes for dynamic range |
//! | [`WindowFunction::FlatTop`] | Widest | Amplitude-accurate level readings |
//!
//! The cosine-sum family (`3 Term Cosine` .. `7 Term Cosine`) trades main-lobe
//! width for progressively lower sidelobes.
//!
//! # Power correction
//!
//! Every window attenuates the signal by its coherent gain, which shifts the
//! displayed spectrum down by a window-dependent number of dB.
//! [`WindowFunction::power_correction_db`] returns the constant that
//! compensates for this, folded together with the fixed display offset shared
//! by all windows.

use libm::{cos, fabs, sin};

/// Window applied to capture frames before the forward FFT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFunction {
    /// Raised cosine, the general-purpose default.
    Hanning,
    /// Rectangular window (no shaping).
    Boxcar,
    /// Linear taper to zero at both ends.
    Triangular,
    /// Parabolic taper.
    Welch,
    /// Half-cycle sine taper.
    Cosine,
    /// Raised cosine on a pedestal.
    Hamming,
    /// Blackman window with exact 18608ths coefficients.
    ExactBlackman,
    /// Three-term cosine sum.
    Cosine3Term,
    /// Four-term cosine sum.
    Cosine4Term,
    /// Five-term cosine sum.
    Cosine5Term,
    /// Six-term cosine sum.
    Cosine6Term,
    /// Seven-term cosine sum.
    Cosine7Term,
    /// Four-term minimum-sidelobe window.
    BlackmanHarris,
    /// Five-term amplitude-flat window for level measurements.
    FlatTop,
}

impl WindowFunction {
    /// Every supported window, in UI listing order.
    pub const ALL: [WindowFunction; 14] = [
        WindowFunction::Hanning,
        WindowFunction::Boxcar,
        WindowFunction::Triangular,
        WindowFunction::Welch,
        WindowFunction::Cosine,
        WindowFunction::Hamming,
        WindowFunction::ExactBlackman,
        WindowFunction::Cosine3Term,
        WindowFunction::Cosine4Term,
        WindowFunction::Cosine5Term,
        WindowFunction::Cosine6Term,
        WindowFunction::Cosine7Term,
        WindowFunction::BlackmanHarris,
        WindowFunction::FlatTop,
    ];

    /// Look up a window by its UI name.
    ///
    /// Returns `None` for unrecognized names; callers decide whether that is
    /// a hard error (transform construction) or a boxcar fallback (display
    /// paths).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Hanning" => Some(WindowFunction::Hanning),
            "Boxcar" => Some(WindowFunction::Boxcar),
            "Triangular" => Some(WindowFunction::Triangular),
            "Welch" => Some(WindowFunction::Welch),
            "Cosine" => Some(WindowFunction::Cosine),
            "Hamming" => Some(WindowFunction::Hamming),
            "Exact Blackman" => Some(WindowFunction::ExactBlackman),
            "3 Term Cosine" => Some(WindowFunction::Cosine3Term),
            "4 Term Cosine" => Some(WindowFunction::Cosine4Term),
            "5 Term Cosine" => Some(WindowFunction::Cosine5Term),
            "6 Term Cosine" => Some(WindowFunction::Cosine6Term),
            "7 Term Cosine" => Some(WindowFunction::Cosine7Term),
            "Blackman-Harris" => Some(WindowFunction::BlackmanHarris),
            "Flat Top" => Some(WindowFunction::FlatTop),
            _ => None,
        }
    }

    /// The UI name this window is listed under.
    pub fn name(&self) -> &'static str {
        match self {
            WindowFunction::Hanning => "Hanning",
            WindowFunction::Boxcar => "Boxcar",
            WindowFunction::Triangular => "Triangular",
            WindowFunction::Welch => "Welch",
            WindowFunction::Cosine => "Cosine",
            WindowFunction::Hamming => "Hamming",
            WindowFunction::ExactBlackman => "Exact Blackman",
            WindowFunction::Cosine3Term => "3 Term Cosine",
            WindowFunction::Cosine4Term => "4 Term Cosine",
            WindowFunction::Cosine5Term => "5 Term Cosine",
            WindowFunction::Cosine6Term => "6 Term Cosine",
            WindowFunction::Cosine7Term => "7 Term Cosine",
            WindowFunction::BlackmanHarris => "Blackman-Harris",
            WindowFunction::FlatTop => "Flat Top",
        }
    }

    /// Weight for sample `j` of an `n`-point window.
    ///
    /// All windows are symmetric: `weight(j, n) == weight(n - 1 - j, n)`,
    /// with endpoints included (the cosine sums evaluate over `n - 1`
    /// intervals, not `n`). Degenerate windows of fewer than two points
    /// return `1.0`.
    ///
    /// # Arguments
    /// * `j` - Sample index in `0..n`
    /// * `n` - Window length in samples
    pub fn weight(&self, j: usize, n: usize) -> f64 {
        if n < 2 {
            return 1.0;
        }
        let x = core::f64::consts::TAU * j as f64 / (n - 1) as f64;
        match self {
            WindowFunction::Hanning => 0.5 * (1.0 - cos(x)),
            WindowFunction::Boxcar => 1.0,
            WindowFunction::Triangular => {
                let half = (n - 1) as f64 / 2.0;
                1.0 - fabs((j as f64 - half) / half)
            }
            WindowFunction::Welch => {
                let half = (n - 1) as f64 / 2.0;
                let t = (j as f64 - half) / half;
                1.0 - t * t
            }
            WindowFunction::Cosine => sin(core::f64::consts::PI * j as f64 / (n - 1) as f64),
            WindowFunction::Hamming => 0.54 - 0.46 * cos(x),
            WindowFunction::ExactBlackman => {
                7938.0 / 18608.0 - 9240.0 / 18608.0 * cos(x) + 1430.0 / 18608.0 * cos(2.0 * x)
            }
            WindowFunction::Cosine3Term => {
                0.4243801 - 0.4973406 * cos(x) + 0.0782793 * cos(2.0 * x)
            }
            WindowFunction::Cosine4Term => {
                0.3635819 - 0.4891775 * cos(x) + 0.1365995 * cos(2.0 * x) - 0.0106411 * cos(3.0 * x)
            }
            WindowFunction::Cosine5Term => {
                0.3232153 - 0.4714921 * cos(x) + 0.1755341 * cos(2.0 * x)
                    - 0.0284969 * cos(3.0 * x)
                    + 0.0012614 * cos(4.0 * x)
            }
            WindowFunction::Cosine6Term => {
                0.2935579 - 0.4519357 * cos(x) + 0.2014165 * cos(2.0 * x)
                    - 0.0479261 * cos(3.0 * x)
                    + 0.0050261 * cos(4.0 * x)
                    - 0.0001376 * cos(5.0 * x)
            }
            WindowFunction::Cosine7Term => {
                0.2712203 - 0.4334446 * cos(x) + 0.2180041 * cos(2.0 * x)
                    - 0.0657853 * cos(3.0 * x)
                    + 0.0107618 * cos(4.0 * x)
                    - 0.0007700 * cos(5.0 * x)
                    + 0.0000137 * cos(6.0 * x)
            }
            WindowFunction::BlackmanHarris => {
                0.35875 - 0.48829 * cos(x) + 0.14128 * cos(2.0 * x) - 0.01168 * cos(3.0 * x)
            }
            WindowFunction::FlatTop => {
                0.21557895 - 0.41663158 * cos(x) + 0.277263158 * cos(2.0 * x)
                    - 0.083578947 * cos(3.0 * x)
                    + 0.006947368 * cos(4.0 * x)
            }
        }
    }

    /// Power correction in dB, added per displayed bin when window
    /// compensation is enabled.
    pub fn power_correction_db(&self) -> f64 {
        match self {
            WindowFunction::Hanning => 1.77,
            WindowFunction::Boxcar => -4.25,
            WindowFunction::Triangular => 1.77,
            WindowFunction::Welch => -0.73,
            WindowFunction::Cosine => -0.33,
            WindowFunction::Hamming => 1.10,
            WindowFunction::ExactBlackman => 3.15,
            WindowFunction::Cosine3Term => 3.19,
            WindowFunction::Cosine4Term => 4.54,
            WindowFunction::Cosine5Term => 5.56,
            WindowFunction::Cosine6Term => 6.40,
            WindowFunction::Cosine7Term => 7.08,
            WindowFunction::BlackmanHarris => 4.65,
            WindowFunction::FlatTop => 9.08,
        }
    }
}

/// Weight for sample `j` of an `n`-point window named `name`.
///
/// Unknown names weigh every sample at zero, blanking the transform input
/// until the configuration is corrected.
pub fn window_weight(name: &str, j: usize, n: usize) -> f64 {
    match WindowFunction::from_name(name) {
        Some(window) => window.weight(j, n),
        None => {
            #[cfg(feature = "tracing")]
            tracing::warn!("unknown window function {name:?}, using zero weight");
            0.0
        }
    }
}

/// Power correction in dB for the window named `name`, `0.0` when unknown.
pub fn window_power_offset_db(name: &str) -> f64 {
    match WindowFunction::from_name(name) {
        Some(window) => window.power_correction_db(),
        None => {
            #[cfg(feature = "tracing")]
            tracing::warn!("unknown window function {name:?}, using zero power correction");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_round_trips() {
        for window in WindowFunction::ALL {
            assert_eq!(WindowFunction::from_name(window.name()), Some(window));
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert_eq!(WindowFunction::from_name("Kaiser"), None);
        assert_eq!(WindowFunction::from_name("hanning"), None);
    }

    #[test]
    fn boxcar_is_all_ones() {
        for j in 0..256 {
            assert_eq!(WindowFunction::Boxcar.weight(j, 256), 1.0);
        }
    }

    #[test]
    fn windows_are_symmetric() {
        let n = 511;
        for window in WindowFunction::ALL {
            for j in 0..n {
                let a = window.weight(j, n);
                let b = window.weight(n - 1 - j, n);
                assert!(
                    (a - b).abs() < 1e-12,
                    "{} asymmetric at {j}: {a} vs {b}",
                    window.name()
                );
            }
        }
    }

    #[test]
    fn hanning_midpoint_is_unity() {
        let n = 1025;
        assert!((WindowFunction::Hanning.weight(n / 2, n) - 1.0).abs() < 1e-12);
        assert!(WindowFunction::Hanning.weight(0, n).abs() < 1e-12);
    }

    #[test]
    fn corrections_track_coherent_gain() {
        // The per-window correction equals the shared display offset minus
        // the coherent gain in dB, rounded to two decimals.
        for window in WindowFunction::ALL {
            let n = 65536;
            let mean: f64 = (0..n).map(|j| window.weight(j, n)).sum::<f64>() / n as f64;
            let derived = -4.25 - 20.0 * libm::log10(mean);
            let stored = window.power_correction_db();
            assert!(
                (derived - stored).abs() < 0.011,
                "{}: derived {derived:.4} vs stored {stored}",
                window.name()
            );
        }
    }

    #[test]
    fn degenerate_lengths_yield_unit_weight() {
        for window in WindowFunction::ALL {
            assert_eq!(window.weight(0, 0), 1.0);
            assert_eq!(window.weight(0, 1), 1.0);
        }
    }

    #[test]
    fn free_functions_fall_back_gracefully() {
        assert_eq!(window_weight("Hanning", 0, 64), 0.0);
        assert_eq!(window_weight("No Such Window", 17, 64), 0.0);
        assert_eq!(window_weight("No Such Window", 0, 64), 0.0);
        assert_eq!(window_power_offset_db("Flat Top"), 9.08);
        assert_eq!(window_power_offset_db("No Such Window"), 0.0);
    }
}
