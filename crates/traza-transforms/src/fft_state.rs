//! Lazily sized FFT plans and work buffers shared by the frequency
//! transforms.
//!
//! Plans and buffers are expensive relative to a frame update, so
//! [`FftState`] caches them keyed on `(fft_size, mode)` and rebuilds only
//! when the requested shape changes. Requesting the current shape again is
//! free and touches nothing, which keeps per-tick reconfiguration checks
//! cheap.

use std::sync::Arc;

use realfft::{RealFftPlanner, RealToComplex};
use rustfft::FftPlanner;
use rustfft::num_complex::Complex;
use traza_core::{WindowFunction, fftshift};

use crate::error::TransformError;

/// How input channels feed the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftMode {
    /// One real channel; one-sided output of `fft_size / 2` bins.
    Real,
    /// An I/Q pair combined into complex samples; `fft_size` centered bins.
    Complex,
}

struct PlanCache {
    fft_size: usize,
    mode: FftMode,
    window: Vec<f64>,
    real_plan: Option<Arc<dyn RealToComplex<f64>>>,
    complex_plan: Option<Arc<dyn rustfft::Fft<f64>>>,
    real_input: Vec<f64>,
    complex_input: Vec<Complex<f64>>,
    output: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

/// One transform's FFT plan, window table and work buffers.
pub struct FftState {
    window_function: WindowFunction,
    cache: Option<PlanCache>,
}

impl FftState {
    /// Unsized state for the given window; call
    /// [`ensure_sized`](Self::ensure_sized) before running.
    pub fn new(window_function: WindowFunction) -> Self {
        Self {
            window_function,
            cache: None,
        }
    }

    /// The window this state shapes frames with.
    pub fn window_function(&self) -> WindowFunction {
        self.window_function
    }

    /// Build plan, window table and buffers for the given shape.
    ///
    /// A no-op when the current cache already matches, so callers invoke
    /// this unconditionally at the top of every update. Sizes must be even
    /// and at least 2; the configuration layer enforces the stricter
    /// power-of-two range before anything reaches this point.
    pub fn ensure_sized(&mut self, fft_size: usize, mode: FftMode) -> Result<(), TransformError> {
        if self
            .cache
            .as_ref()
            .is_some_and(|cache| cache.fft_size == fft_size && cache.mode == mode)
        {
            return Ok(());
        }
        if fft_size < 2 || fft_size % 2 != 0 {
            return Err(TransformError::UnplannableFftSize(fft_size));
        }
        // Drop the stale plan before allocating the replacement.
        self.cache = None;

        let mut window = Vec::new();
        window.try_reserve_exact(fft_size)?;
        window.extend((0..fft_size).map(|j| self.window_function.weight(j, fft_size)));

        let cache = match mode {
            FftMode::Real => {
                let plan = RealFftPlanner::<f64>::new().plan_fft_forward(fft_size);
                let mut real_input = Vec::new();
                real_input.try_reserve_exact(fft_size)?;
                real_input.resize(fft_size, 0.0);
                let mut output = Vec::new();
                output.try_reserve_exact(fft_size / 2 + 1)?;
                output.resize(fft_size / 2 + 1, Complex::new(0.0, 0.0));
                let mut scratch = Vec::new();
                scratch.try_reserve_exact(plan.get_scratch_len())?;
                scratch.resize(plan.get_scratch_len(), Complex::new(0.0, 0.0));
                PlanCache {
                    fft_size,
                    mode,
                    window,
                    real_plan: Some(plan),
                    complex_plan: None,
                    real_input,
                    complex_input: Vec::new(),
                    output,
                    scratch,
                }
            }
            FftMode::Complex => {
                let plan = FftPlanner::<f64>::new().plan_fft_forward(fft_size);
                let scratch_len = plan.get_outofplace_scratch_len();
                let mut complex_input = Vec::new();
                complex_input.try_reserve_exact(fft_size)?;
                complex_input.resize(fft_size, Complex::new(0.0, 0.0));
                let mut output = Vec::new();
                output.try_reserve_exact(fft_size)?;
                output.resize(fft_size, Complex::new(0.0, 0.0));
                let mut scratch = Vec::new();
                scratch.try_reserve_exact(scratch_len)?;
                scratch.resize(scratch_len, Complex::new(0.0, 0.0));
                PlanCache {
                    fft_size,
                    mode,
                    window,
                    real_plan: None,
                    complex_plan: Some(plan),
                    real_input: Vec::new(),
                    complex_input,
                    output,
                    scratch,
                }
            }
        };
        self.cache = Some(cache);
        Ok(())
    }

    /// Output bins produced per frame: `fft_size / 2` one-sided or
    /// `fft_size` centered; 0 while unsized.
    pub fn m(&self) -> usize {
        match &self.cache {
            None => 0,
            Some(cache) => match cache.mode {
                FftMode::Real => cache.fft_size / 2,
                FftMode::Complex => cache.fft_size,
            },
        }
    }

    /// Currently sized transform length, if any.
    pub fn fft_size(&self) -> Option<usize> {
        self.cache.as_ref().map(|cache| cache.fft_size)
    }

    /// Currently sized input mode, if any.
    pub fn mode(&self) -> Option<FftMode> {
        self.cache.as_ref().map(|cache| cache.mode)
    }

    /// The cached window table, if sized.
    pub fn window(&self) -> Option<&[f64]> {
        self.cache.as_ref().map(|cache| cache.window.as_slice())
    }

    /// Window one real frame and transform it.
    ///
    /// Frames shorter than the FFT size are zero-padded; longer frames are
    /// truncated.
    pub fn run_real(&mut self, samples: &[f32]) -> Result<(), TransformError> {
        let cache = self.cache.as_mut().ok_or(TransformError::Unsized)?;
        let plan = cache.real_plan.as_ref().ok_or(TransformError::ModeMismatch)?;
        cache.real_input.fill(0.0);
        for (dst, (sample, weight)) in cache
            .real_input
            .iter_mut()
            .zip(samples.iter().zip(cache.window.iter()))
        {
            *dst = f64::from(*sample) * *weight;
        }
        plan.process_with_scratch(&mut cache.real_input, &mut cache.output, &mut cache.scratch)
            .map_err(|err| TransformError::Execution(err.to_string()))
    }

    /// Window an I/Q frame into complex samples and transform it, leaving
    /// the output in centered display order.
    ///
    /// Channels shorter than the FFT size are zero-padded; longer channels
    /// are truncated.
    pub fn run_complex(
        &mut self,
        i_samples: &[f32],
        q_samples: &[f32],
    ) -> Result<(), TransformError> {
        let cache = self.cache.as_mut().ok_or(TransformError::Unsized)?;
        let plan = cache
            .complex_plan
            .as_ref()
            .ok_or(TransformError::ModeMismatch)?;
        cache.complex_input.fill(Complex::new(0.0, 0.0));
        for (dst, ((i, q), weight)) in cache.complex_input.iter_mut().zip(
            i_samples
                .iter()
                .zip(q_samples.iter())
                .zip(cache.window.iter()),
        ) {
            *dst = Complex::new(f64::from(*i) * *weight, f64::from(*q) * *weight);
        }
        plan.process_outofplace_with_scratch(
            &mut cache.complex_input,
            &mut cache.output,
            &mut cache.scratch,
        );
        fftshift(&mut cache.output);
        Ok(())
    }

    /// Transformed bins of the last frame: `m()` entries, centered for
    /// complex mode and one-sided for real mode.
    pub fn output(&self) -> &[Complex<f64>] {
        match &self.cache {
            None => &[],
            Some(cache) => match cache.mode {
                FftMode::Real => &cache.output[..cache.fft_size / 2],
                FftMode::Complex => &cache.output,
            },
        }
    }
}
