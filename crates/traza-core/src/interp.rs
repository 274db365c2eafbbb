//! Sub-bin peak refinement by parabolic interpolation.

/// Refined peak position from three neighboring samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParabolicPeak {
    /// Signed offset from the center sample, in bins, within `[-0.5, 0.5]`
    /// when the center sample really is the discrete maximum.
    pub offset: f64,
    /// Interpolated amplitude at the vertex.
    pub amplitude: f64,
}

/// Fit a parabola through `(-1, y_prev)`, `(0, y_peak)`, `(1, y_next)` and
/// return its vertex.
///
/// When the three points are collinear the parabola degenerates; the center
/// sample is returned unchanged with a zero offset.
pub fn parabolic_peak(y_prev: f64, y_peak: f64, y_next: f64) -> ParabolicPeak {
    let denom = y_prev - 2.0 * y_peak + y_next;
    if denom == 0.0 {
        return ParabolicPeak {
            offset: 0.0,
            amplitude: y_peak,
        };
    }
    let offset = (y_prev - y_next) / (2.0 * denom);
    let amplitude = y_peak - 0.25 * (y_prev - y_next) * offset;
    ParabolicPeak { offset, amplitude }
}
