//! Time-domain and constellation traces.
//!
//! Neither trace runs an FFT. [`TimeTransform`] shows one channel against
//! sample index with optional elementwise shaping; [`ConstellationTransform`]
//! plots one channel against another point by point, a pure display remap.

use crate::error::TransformError;
use crate::settings::{ConstellationSettings, TimeSettings};
use crate::source::SharedSamples;

/// Value substituted for the reciprocal of a zero sample, matching what
/// capture frontends report for an open input.
const INVERSE_OF_ZERO: f32 = 65_535.0;

/// One channel's samples against time.
pub struct TimeTransform {
    settings: TimeSettings,
    channel: SharedSamples,
    x_axis: Vec<f32>,
    y_axis: Vec<f32>,
}

impl TimeTransform {
    /// Build a time trace over one channel.
    pub fn new(channel: SharedSamples, settings: TimeSettings) -> Result<Self, TransformError> {
        settings.validate()?;
        let n = settings.num_samples;
        let mut x_axis = Vec::new();
        x_axis.try_reserve_exact(n)?;
        match settings.max_x_axis {
            Some(max_x) => x_axis.extend((0..n).map(|i| i as f32 * max_x / n as f32)),
            None => x_axis.extend((0..n).map(|i| i as f32)),
        }
        let mut y_axis = Vec::new();
        y_axis.try_reserve_exact(n)?;
        y_axis.resize(n, 0.0);
        Ok(Self {
            settings,
            channel,
            x_axis,
            y_axis,
        })
    }

    /// Copy the current capture into the trace, applying inverse, multiply
    /// and add in that fixed order.
    pub fn update(&mut self) -> Result<(), TransformError> {
        let data = self.channel.borrow();
        let n = self.settings.num_samples;
        for (slot, sample) in self
            .y_axis
            .iter_mut()
            .zip(data.iter().copied().chain(std::iter::repeat(0.0)))
            .take(n)
        {
            let mut value = sample;
            if self.settings.invert {
                value = if value == 0.0 {
                    INVERSE_OF_ZERO
                } else {
                    1.0 / value
                };
            }
            if let Some(factor) = self.settings.multiply {
                value *= factor;
            }
            if let Some(offset) = self.settings.add {
                value += offset;
            }
            *slot = value;
        }
        Ok(())
    }

    /// X axis: sample index, or scaled into `0..max_x_axis` when configured.
    pub fn x_axis(&self) -> &[f32] {
        &self.x_axis
    }

    /// Shaped samples of the last update.
    pub fn y_axis(&self) -> &[f32] {
        &self.y_axis
    }

    /// The configuration this trace runs under.
    pub fn settings(&self) -> &TimeSettings {
        &self.settings
    }
}

/// One channel against another, point by point.
///
/// The trace owns copies of both captures; there is no shaping, only the
/// remap from two time series onto a plane.
pub struct ConstellationTransform {
    settings: ConstellationSettings,
    channel_x: SharedSamples,
    channel_y: SharedSamples,
    x_axis: Vec<f32>,
    y_axis: Vec<f32>,
}

impl ConstellationTransform {
    /// Build a constellation over an x/y channel pair.
    pub fn new(
        channel_x: SharedSamples,
        channel_y: SharedSamples,
        settings: ConstellationSettings,
    ) -> Result<Self, TransformError> {
        settings.validate()?;
        let n = settings.num_samples;
        let mut x_axis = Vec::new();
        x_axis.try_reserve_exact(n)?;
        x_axis.resize(n, 0.0);
        let mut y_axis = Vec::new();
        y_axis.try_reserve_exact(n)?;
        y_axis.resize(n, 0.0);
        Ok(Self {
            settings,
            channel_x,
            channel_y,
            x_axis,
            y_axis,
        })
    }

    /// Copy the current captures into the trace.
    pub fn update(&mut self) -> Result<(), TransformError> {
        let n = self.settings.num_samples;
        let x_data = self.channel_x.borrow();
        for (slot, sample) in self
            .x_axis
            .iter_mut()
            .zip(x_data.iter().copied().chain(std::iter::repeat(0.0)))
            .take(n)
        {
            *slot = sample;
        }
        let y_data = self.channel_y.borrow();
        for (slot, sample) in self
            .y_axis
            .iter_mut()
            .zip(y_data.iter().copied().chain(std::iter::repeat(0.0)))
            .take(n)
        {
            *slot = sample;
        }
        Ok(())
    }

    /// First channel's samples of the last update.
    pub fn x_axis(&self) -> &[f32] {
        &self.x_axis
    }

    /// Second channel's samples of the last update.
    pub fn y_axis(&self) -> &[f32] {
        &self.y_axis
    }

    /// The configuration this trace runs under.
    pub fn settings(&self) -> &ConstellationSettings {
        &self.settings
    }
}
