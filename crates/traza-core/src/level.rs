//! Bin power to dB conversion and full-scale normalization.

use libm::{exp2, log10};

/// Power of one FFT bin in dB, normalized by the bin count `m`.
///
/// Zero-power bins are clamped to the smallest positive double before the
/// logarithm, so silent captures produce a deep but finite level instead
/// of `-inf`.
pub fn power_db(re: f64, im: f64, m: usize) -> f64 {
    let mut power = re * re + im * im;
    if power == 0.0 {
        power = f64::MIN_POSITIVE;
    }
    let m = m as f64;
    10.0 * log10(power / (m * m))
}

/// Full-scale correction in dB for samples from a converter with
/// `bits_used` significant bits.
///
/// Raw codes span `±2^(bits_used - 1)`; this constant rescales bin powers
/// so a full-scale tone reads near 0 dB. Returns `None` when `bits_used`
/// is zero, which marks a channel that never reported its resolution.
pub fn fft_corr_db(bits_used: u32) -> Option<f64> {
    if bits_used == 0 {
        return None;
    }
    Some(20.0 * log10(2.0 / exp2(f64::from(bits_used - 1))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_bin_of_unit_spectrum_is_zero_db() {
        assert!(power_db(1.0, 0.0, 1).abs() < 1e-12);
    }

    #[test]
    fn bin_count_normalization_scales_down() {
        // Same bin value over m bins reads 20*log10(m) lower.
        let reference = power_db(4.0, 3.0, 1);
        let normalized = power_db(4.0, 3.0, 100);
        assert!((reference - normalized - 40.0).abs() < 1e-9);
    }

    #[test]
    fn silence_is_finite() {
        let level = power_db(0.0, 0.0, 4096);
        assert!(level.is_finite());
        assert!(level < -3000.0);
    }

    #[test]
    fn two_bit_converters_need_no_correction() {
        // Full scale is ±2, exactly the reference amplitude.
        let corr = fft_corr_db(2).unwrap();
        assert!(corr.abs() < 1e-12);
    }

    #[test]
    fn twelve_bit_correction_matches_closed_form() {
        let corr = fft_corr_db(12).unwrap();
        let expected = 20.0 * log10(2.0 / 2048.0);
        assert!((corr - expected).abs() < 1e-12);
        assert!(corr < 0.0);
    }

    #[test]
    fn zero_bit_depth_is_rejected() {
        assert_eq!(fft_corr_db(0), None);
    }
}
