//! Spectrum reordering between raw FFT order and centered display order.
//!
//! A complex FFT emits bins in `[0, fs)` order: DC first, positive
//! frequencies, then negative frequencies. Displays want `[-fs/2, fs/2)`
//! with DC in the middle. [`fftshift`] converts in place; [`fftshift_index`]
//! maps a single index without touching the data.

/// Rotate a full complex spectrum into centered display order.
///
/// After the shift, element `i` holds what raw bin `(i + len/2) % len`
/// held, putting DC at `len / 2`. For even lengths the operation is its
/// own inverse.
pub fn fftshift<T>(bins: &mut [T]) {
    let half = bins.len() / 2;
    bins.rotate_left(half);
}

/// Raw FFT bin that lands at `display_bin` after [`fftshift`] of an
/// `m`-bin spectrum.
///
/// For even `m` this map is an involution, so it also answers the reverse
/// question: which display bin a raw bin lands at.
pub fn fftshift_index(display_bin: usize, m: usize) -> usize {
    if display_bin < m / 2 {
        display_bin + m / 2
    } else {
        display_bin - m / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_centers_dc() {
        let mut bins: [usize; 8] = [0, 1, 2, 3, 4, 5, 6, 7];
        fftshift(&mut bins);
        assert_eq!(bins, [4, 5, 6, 7, 0, 1, 2, 3]);
    }

    #[test]
    fn shift_twice_is_identity_for_even_lengths() {
        let original: Vec<u32> = (0..64).collect();
        let mut bins = original.clone();
        fftshift(&mut bins);
        fftshift(&mut bins);
        assert_eq!(bins, original);
    }

    #[test]
    fn index_map_matches_data_shift() {
        let m = 16;
        let raw: Vec<usize> = (0..m).collect();
        let mut shifted = raw.clone();
        fftshift(&mut shifted);
        for display_bin in 0..m {
            assert_eq!(shifted[display_bin], raw[fftshift_index(display_bin, m)]);
        }
    }

    #[test]
    fn empty_spectrum_is_untouched() {
        let mut bins: [u8; 0] = [];
        fftshift(&mut bins);
        assert!(bins.is_empty());
    }
}
