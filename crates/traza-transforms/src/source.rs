//! Sample sources: the seam between capture producers and transforms.
//!
//! Transforms never talk to acquisition hardware. They hold a
//! [`SharedSamples`] handle per channel and re-read it on every update,
//! while an external capture loop refills the buffers between ticks.
//! [`MathChannel`] derives one channel from others the same way a hardware
//! channel would deliver it, so downstream transforms cannot tell the
//! difference.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

/// Static description of one capture channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMeta {
    /// Channel name, used in logs and error reports.
    pub name: String,
    /// Significant bits per sample from the converter; zero is invalid.
    pub bits_used: u32,
    /// Sampling frequency in Hz.
    pub sampling_frequency: f64,
    /// This channel is one half of an I/Q pair and pairs with its list
    /// neighbor, in-phase first.
    pub is_complex_pair: bool,
}

impl ChannelMeta {
    /// Describe a real channel.
    pub fn new(name: impl Into<String>, bits_used: u32, sampling_frequency: f64) -> Self {
        Self {
            name: name.into(),
            bits_used,
            sampling_frequency,
            is_complex_pair: false,
        }
    }

    /// Mark this channel as half of an I/Q pair.
    pub fn complex_pair(mut self) -> Self {
        self.is_complex_pair = true;
        self
    }
}

/// Cloneable handle to an externally refreshed sample buffer.
///
/// Clones share the same storage, so a capture loop writing through one
/// handle is immediately visible to every transform reading through
/// another.
#[derive(Debug, Clone, Default)]
pub struct SharedSamples {
    inner: Rc<RefCell<Vec<f32>>>,
}

impl SharedSamples {
    /// Handle owning the given initial samples.
    pub fn new(initial: Vec<f32>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(initial)),
        }
    }

    /// Zero-filled handle of the given length.
    pub fn with_len(len: usize) -> Self {
        Self::new(vec![0.0; len])
    }

    /// Replace the buffer contents, keeping its allocation when possible.
    pub fn write(&self, samples: &[f32]) {
        let mut buffer = self.inner.borrow_mut();
        buffer.clear();
        buffer.extend_from_slice(samples);
    }

    /// Read access to the current samples.
    ///
    /// The borrow must not be held across a [`write`](Self::write) from the
    /// same thread; transforms take it only for the duration of one update.
    pub fn borrow(&self) -> Ref<'_, Vec<f32>> {
        self.inner.borrow()
    }

    /// Number of samples currently buffered.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Whether the buffer currently holds no samples.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

/// One channel's worth of samples plus its metadata.
///
/// Implementations decide where samples come from; the engine only asks
/// them to [`prepare`](SampleSource::prepare) before transforms read.
pub trait SampleSource {
    /// Channel description.
    fn meta(&self) -> &ChannelMeta;

    /// Refresh derived data before transforms read the buffer.
    fn prepare(&mut self);

    /// Handle to this channel's sample buffer.
    fn data(&self) -> SharedSamples;

    /// Record whether an active plot currently consumes this channel.
    fn set_used(&mut self, used: bool);

    /// Whether an active plot currently consumes this channel.
    fn used(&self) -> bool;
}

/// Channel whose buffer an external capture loop refreshes in place.
#[derive(Debug)]
pub struct CaptureChannel {
    meta: ChannelMeta,
    data: SharedSamples,
    used: bool,
}

impl CaptureChannel {
    /// Channel starting with an empty buffer.
    pub fn new(meta: ChannelMeta) -> Self {
        Self {
            meta,
            data: SharedSamples::default(),
            used: false,
        }
    }

    /// Channel pre-filled with the given samples.
    pub fn with_data(meta: ChannelMeta, samples: Vec<f32>) -> Self {
        Self {
            meta,
            data: SharedSamples::new(samples),
            used: false,
        }
    }
}

impl SampleSource for CaptureChannel {
    fn meta(&self) -> &ChannelMeta {
        &self.meta
    }

    fn prepare(&mut self) {}

    fn data(&self) -> SharedSamples {
        self.data.clone()
    }

    fn set_used(&mut self, used: bool) {
        self.used = used;
    }

    fn used(&self) -> bool {
        self.used
    }
}

/// Virtual channel computed from other channels' buffers.
///
/// The expression runs during [`prepare`](SampleSource::prepare), after the
/// capture loop refreshed the inputs and before any transform reads, so a
/// math channel is never one frame stale relative to its inputs.
pub struct MathChannel {
    meta: ChannelMeta,
    inputs: Vec<SharedSamples>,
    expression: Box<dyn FnMut(&[&[f32]], &mut Vec<f32>)>,
    data: SharedSamples,
    scratch: Vec<f32>,
    used: bool,
}

impl MathChannel {
    /// Channel evaluating `expression` over `inputs` on every prepare.
    pub fn new(
        meta: ChannelMeta,
        inputs: Vec<SharedSamples>,
        expression: impl FnMut(&[&[f32]], &mut Vec<f32>) + 'static,
    ) -> Self {
        Self {
            meta,
            inputs,
            expression: Box::new(expression),
            data: SharedSamples::default(),
            scratch: Vec::new(),
            used: false,
        }
    }
}

impl SampleSource for MathChannel {
    fn meta(&self) -> &ChannelMeta {
        &self.meta
    }

    fn prepare(&mut self) {
        self.scratch.clear();
        {
            let borrowed: Vec<Ref<'_, Vec<f32>>> =
                self.inputs.iter().map(SharedSamples::borrow).collect();
            let slices: Vec<&[f32]> = borrowed.iter().map(|input| input.as_slice()).collect();
            (self.expression)(&slices, &mut self.scratch);
        }
        self.data.write(&self.scratch);
    }

    fn data(&self) -> SharedSamples {
        self.data.clone()
    }

    fn set_used(&mut self, used: bool) {
        self.used = used;
    }

    fn used(&self) -> bool {
        self.used
    }
}

impl fmt::Debug for MathChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MathChannel")
            .field("meta", &self.meta)
            .field("inputs", &self.inputs.len())
            .field("used", &self.used)
            .finish_non_exhaustive()
    }
}
