//! Synthetic capture signals for tests, benches and the demo.
//!
//! Nothing here reads hardware; these generators fill [`crate::source`]
//! buffers with known content so transform output can be checked against
//! closed-form expectations.

/// Real sinusoid of `len` samples at `frequency` Hz, sampled at `fs` Hz.
pub fn tone(fs: f64, frequency: f64, amplitude: f64, len: usize) -> Vec<f32> {
    (0..len)
        .map(|n| (amplitude * (std::f64::consts::TAU * frequency * n as f64 / fs).cos()) as f32)
        .collect()
}

/// Quadrature pair `(I, Q)` rotating at `frequency` Hz, in-phase first.
///
/// Fed to a complex FFT as `I + jQ`, the pair lands on the positive side
/// of the centered spectrum for positive frequencies.
pub fn quadrature_tone(
    fs: f64,
    frequency: f64,
    amplitude: f64,
    len: usize,
) -> (Vec<f32>, Vec<f32>) {
    let i = (0..len)
        .map(|n| (amplitude * (std::f64::consts::TAU * frequency * n as f64 / fs).cos()) as f32)
        .collect();
    let q = (0..len)
        .map(|n| (amplitude * (std::f64::consts::TAU * frequency * n as f64 / fs).sin()) as f32)
        .collect();
    (i, q)
}

/// Copy of `samples` delayed by `delay` positions, zero-filled at the
/// front; used to give correlation tests a known lag.
pub fn delayed(samples: &[f32], delay: usize) -> Vec<f32> {
    let mut out = vec![0.0; samples.len()];
    for (dst, src) in out.iter_mut().skip(delay).zip(samples.iter()) {
        *dst = *src;
    }
    out
}

/// Deterministic white noise in `[-amplitude, amplitude]` from a xorshift
/// generator, so repeated runs see identical captures.
pub fn white_noise(seed: u32, amplitude: f32, len: usize) -> Vec<f32> {
    let mut state = if seed == 0 { 0xdead_beef } else { seed };
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state as i32 as f32) / (i32::MAX as f32) * amplitude
        })
        .collect()
}
