//! Plot engine: transform selection, marker ownership and the snapshot
//! hand-off.
//!
//! One [`PlotEngine`] serves one plot. Given the plot's domain and its
//! enabled channels it instantiates the right transforms in a fixed
//! pairing order, designates exactly one of them the live marker owner,
//! and runs them all from [`PlotEngine::tick`], the entry point an
//! external scheduler calls at its capture cadence.
//!
//! Marker snapshots are the only state that crosses threads. A consumer
//! calls [`PlotEngine::request_marker_snapshot`] and blocks on the
//! returned receiver; the tick that next completes a frame fulfills the
//! request. One request is outstanding at a time, and deactivating the
//! plot cancels it by dropping the sender.

use std::sync::mpsc::{Receiver, SyncSender, sync_channel};

use tracing::{debug, warn};

use crate::error::{DispatchError, TransformError};
use crate::fft::FftTransform;
use crate::marker::{MarkerSet, MarkerSnapshot};
use crate::settings::PlotSettings;
use crate::source::{ChannelMeta, SampleSource};
use crate::sweep::{SweepTransform, UpdateStatus};
use crate::time::{ConstellationTransform, TimeTransform};
use crate::xcorr::XcorrTransform;

/// Checks a channel set against device constraints before activation.
///
/// The GUI layer injects this to veto combinations its hardware cannot
/// capture together; the engine itself only checks counts and pairing.
pub type SetupValidator = Box<dyn Fn(&[ChannelMeta]) -> Result<(), String>>;

/// One running transform and its trace.
pub enum Trace {
    /// Samples against time.
    Time(TimeTransform),
    /// Spectrum of one real channel or I/Q pair.
    Fft(FftTransform),
    /// One channel against another.
    Constellation(ConstellationTransform),
    /// Correlation of two I/Q pairs against lag.
    CrossCorrelation(XcorrTransform),
    /// Spectrum stitched across LO sweep steps.
    SweptSpectrum(SweepTransform),
}

impl Trace {
    /// Run one update; multi-step traces report their assembly progress.
    fn update(&mut self) -> Result<UpdateStatus, TransformError> {
        match self {
            Trace::Time(t) => t.update().map(|()| UpdateStatus::Complete),
            Trace::Fft(t) => t.update().map(|()| UpdateStatus::Complete),
            Trace::Constellation(t) => t.update().map(|()| UpdateStatus::Complete),
            Trace::CrossCorrelation(t) => t.update().map(|()| UpdateStatus::Complete),
            Trace::SweptSpectrum(t) => t.update_step(),
        }
    }

    /// X axis of the trace, in the domain's units.
    pub fn x_axis(&self) -> &[f32] {
        match self {
            Trace::Time(t) => t.x_axis(),
            Trace::Fft(t) => t.x_axis(),
            Trace::Constellation(t) => t.x_axis(),
            Trace::CrossCorrelation(t) => t.x_axis(),
            Trace::SweptSpectrum(t) => t.x_axis(),
        }
    }

    /// Y axis of the trace, in the domain's units.
    pub fn y_axis(&self) -> &[f32] {
        match self {
            Trace::Time(t) => t.y_axis(),
            Trace::Fft(t) => t.y_axis(),
            Trace::Constellation(t) => t.y_axis(),
            Trace::CrossCorrelation(t) => t.y_axis(),
            Trace::SweptSpectrum(t) => t.y_axis(),
        }
    }

    /// Marker table, for the trace families that keep one.
    pub fn markers(&self) -> Option<&MarkerSet> {
        match self {
            Trace::Time(_) | Trace::Constellation(_) => None,
            Trace::Fft(t) => Some(t.markers()),
            Trace::CrossCorrelation(t) => Some(t.markers()),
            Trace::SweptSpectrum(t) => Some(t.markers()),
        }
    }

    /// Mutable marker access, used to pin bins for fixed-marker plots.
    pub fn markers_mut(&mut self) -> Option<&mut MarkerSet> {
        match self {
            Trace::Time(_) | Trace::Constellation(_) => None,
            Trace::Fft(t) => Some(t.markers_mut()),
            Trace::CrossCorrelation(t) => Some(t.markers_mut()),
            Trace::SweptSpectrum(t) => Some(t.markers_mut()),
        }
    }

    /// Whether this trace publishes the plot's live markers.
    pub fn owns_markers(&self) -> bool {
        match self {
            Trace::Time(_) | Trace::Constellation(_) => false,
            Trace::Fft(t) => t.owns_markers(),
            Trace::CrossCorrelation(t) => t.owns_markers(),
            Trace::SweptSpectrum(t) => t.owns_markers(),
        }
    }

    fn set_owns_markers(&mut self, owns: bool) {
        match self {
            Trace::Time(_) | Trace::Constellation(_) => {}
            Trace::Fft(t) => t.set_owns_markers(owns),
            Trace::CrossCorrelation(t) => t.set_owns_markers(owns),
            Trace::SweptSpectrum(t) => t.set_owns_markers(owns),
        }
    }

    /// Clear accumulation so the next tick starts a fresh first frame.
    fn reset(&mut self) {
        match self {
            Trace::Time(_) | Trace::Constellation(_) => {}
            Trace::Fft(t) => t.reset(),
            Trace::CrossCorrelation(t) => t.reset(),
            Trace::SweptSpectrum(t) => t.reset(),
        }
    }
}

/// What activation produced: transforms running and channels skipped.
///
/// A skipped channel is a soft failure, configuration problems on one
/// channel must not tear down the rest of the plot.
pub struct ActivationReport {
    /// Transforms now running.
    pub activated: usize,
    /// Channels that could not be activated, with the reason.
    pub skipped: Vec<(String, TransformError)>,
}

/// One plot's transforms, channels and marker hand-off.
pub struct PlotEngine {
    settings: PlotSettings,
    validator: Option<SetupValidator>,
    channels: Vec<Box<dyn SampleSource>>,
    traces: Vec<Trace>,
    pending_snapshot: Option<SyncSender<MarkerSnapshot>>,
}

impl PlotEngine {
    /// Engine for the given plot configuration, no device validation.
    pub fn new(settings: PlotSettings) -> Self {
        Self {
            settings,
            validator: None,
            channels: Vec::new(),
            traces: Vec::new(),
            pending_snapshot: None,
        }
    }

    /// Engine whose activations must pass the injected device check.
    pub fn with_validator(settings: PlotSettings, validator: SetupValidator) -> Self {
        Self {
            validator: Some(validator),
            ..Self::new(settings)
        }
    }

    /// Build transforms for the given channel set and start serving it.
    ///
    /// Channels are consumed in list order; I/Q pairs are adjacent with the
    /// in-phase channel first. A previous activation's transforms are torn
    /// down first, which also cancels any pending snapshot request.
    pub fn activate(
        &mut self,
        channels: Vec<Box<dyn SampleSource>>,
    ) -> Result<ActivationReport, DispatchError> {
        self.deactivate();

        let metas: Vec<ChannelMeta> = channels.iter().map(|c| c.meta().clone()).collect();
        if let Some(validator) = &self.validator {
            validator(&metas).map_err(DispatchError::SetupRejected)?;
        }

        self.channels = channels;
        let mut skipped = Vec::new();
        fn keep(
            result: Result<Trace, TransformError>,
            name: &str,
            traces: &mut Vec<Trace>,
            skipped: &mut Vec<(String, TransformError)>,
        ) {
            match result {
                Ok(trace) => traces.push(trace),
                Err(err) => {
                    warn!(channel = name, error = %err, "skipping transform");
                    skipped.push((name.to_string(), err));
                }
            }
        }

        let mut traces = Vec::new();
        match &self.settings {
            PlotSettings::Time(settings) => {
                if self.channels.is_empty() {
                    return Err(self.bad_count(0));
                }
                for channel in &self.channels {
                    keep(
                        TimeTransform::new(channel.data(), settings.clone()).map(Trace::Time),
                        &channel.meta().name,
                        &mut traces,
                        &mut skipped,
                    );
                }
            }
            PlotSettings::Fft(settings) => {
                if self.channels.is_empty() {
                    return Err(self.bad_count(0));
                }
                let mut index = 0;
                while index < self.channels.len() {
                    let meta = self.channels[index].meta().clone();
                    if meta.is_complex_pair {
                        let partner = self
                            .channels
                            .get(index + 1)
                            .filter(|c| c.meta().is_complex_pair)
                            .ok_or_else(|| {
                                DispatchError::UnpairedComplexChannel(meta.name.clone())
                            })?;
                        keep(
                            FftTransform::complex(
                                &meta,
                                self.channels[index].data(),
                                partner.data(),
                                settings.clone(),
                            )
                            .map(Trace::Fft),
                            &meta.name,
                            &mut traces,
                            &mut skipped,
                        );
                        index += 2;
                    } else {
                        keep(
                            FftTransform::real(
                                &meta,
                                self.channels[index].data(),
                                settings.clone(),
                            )
                            .map(Trace::Fft),
                            &meta.name,
                            &mut traces,
                            &mut skipped,
                        );
                        index += 1;
                    }
                }
            }
            PlotSettings::Constellation(settings) => {
                if self.channels.len() != 2 {
                    return Err(self.bad_count(self.channels.len()));
                }
                keep(
                    ConstellationTransform::new(
                        self.channels[0].data(),
                        self.channels[1].data(),
                        settings.clone(),
                    )
                    .map(Trace::Constellation),
                    &self.channels[0].meta().name,
                    &mut traces,
                    &mut skipped,
                );
            }
            PlotSettings::CrossCorrelation(settings) => {
                if self.channels.len() != 4 {
                    return Err(self.bad_count(self.channels.len()));
                }
                keep(
                    XcorrTransform::new(
                        [
                            self.channels[0].data(),
                            self.channels[1].data(),
                            self.channels[2].data(),
                            self.channels[3].data(),
                        ],
                        settings.clone(),
                    )
                    .map(Trace::CrossCorrelation),
                    &self.channels[0].meta().name,
                    &mut traces,
                    &mut skipped,
                );
            }
            PlotSettings::SweptSpectrum(settings) => {
                if self.channels.len() != 2 {
                    return Err(self.bad_count(self.channels.len()));
                }
                let meta = self.channels[0].meta().clone();
                keep(
                    SweepTransform::new(
                        &meta,
                        self.channels[0].data(),
                        self.channels[1].data(),
                        settings.clone(),
                    )
                    .map(Trace::SweptSpectrum),
                    &meta.name,
                    &mut traces,
                    &mut skipped,
                );
            }
        }

        // The first marker-carrying trace publishes the plot's live set;
        // the rest keep private tables under the same policy.
        if let Some(owner) = traces.iter_mut().find(|trace| trace.markers().is_some()) {
            owner.set_owns_markers(true);
        }
        for channel in &mut self.channels {
            channel.set_used(true);
        }
        debug!(
            domain = ?self.settings.domain(),
            activated = traces.len(),
            skipped = skipped.len(),
            "plot activated"
        );
        self.traces = traces;
        Ok(ActivationReport {
            activated: self.traces.len(),
            skipped,
        })
    }

    fn bad_count(&self, count: usize) -> DispatchError {
        DispatchError::InvalidChannelCount {
            domain: self.settings.domain(),
            count,
        }
    }

    /// Run one scheduler tick: prepare every channel, update every trace.
    ///
    /// Returns [`UpdateStatus::Complete`] when every trace finished a
    /// frame; a sweep mid-assembly keeps the whole plot at
    /// [`UpdateStatus::Assembling`]. A pending snapshot request is
    /// fulfilled on the completing tick.
    pub fn tick(&mut self) -> Result<UpdateStatus, TransformError> {
        for channel in &mut self.channels {
            channel.prepare();
        }
        let mut status = UpdateStatus::Complete;
        for trace in &mut self.traces {
            if trace.update()? == UpdateStatus::Assembling {
                status = UpdateStatus::Assembling;
            }
        }
        if status == UpdateStatus::Complete {
            self.publish_snapshot();
        }
        Ok(status)
    }

    /// Ask for a one-shot copy of the live marker table.
    ///
    /// The returned receiver yields once the next frame completes. A new
    /// request supersedes an unfulfilled one, and deactivation cancels it;
    /// in both cases the superseded receiver reports disconnection rather
    /// than blocking forever.
    pub fn request_marker_snapshot(&mut self) -> Receiver<MarkerSnapshot> {
        let (sender, receiver) = sync_channel(1);
        self.pending_snapshot = Some(sender);
        receiver
    }

    fn publish_snapshot(&mut self) {
        let Some(sender) = self.pending_snapshot.take() else {
            return;
        };
        let snapshot = self
            .live_markers()
            .map_or_else(|| MarkerSnapshot { markers: Vec::new() }, MarkerSet::snapshot);
        // A consumer that gave up and dropped its receiver is not an error.
        let _ = sender.send(snapshot);
    }

    /// The marker table of the owning trace, if this plot has one.
    pub fn live_markers(&self) -> Option<&MarkerSet> {
        self.traces
            .iter()
            .find(|trace| trace.owns_markers())
            .and_then(Trace::markers)
    }

    /// Running traces in channel order.
    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    /// Mutable trace access, used to pin bins for fixed-marker plots.
    pub fn traces_mut(&mut self) -> &mut [Trace] {
        &mut self.traces
    }

    /// The configuration this plot runs under.
    pub fn settings(&self) -> &PlotSettings {
        &self.settings
    }

    /// Clear every trace's accumulation without tearing transforms down.
    pub fn reset(&mut self) {
        for trace in &mut self.traces {
            trace.reset();
        }
    }

    /// Tear down all transforms and release their channels.
    ///
    /// Dropping the pending sender here is what guarantees a consumer
    /// blocked on a snapshot of a removed plot wakes up with a
    /// disconnection instead of waiting on a trace that no longer exists.
    pub fn deactivate(&mut self) {
        if !self.traces.is_empty() {
            debug!(domain = ?self.settings.domain(), "plot deactivated");
        }
        self.traces.clear();
        self.pending_snapshot = None;
        for channel in &mut self.channels {
            channel.set_used(false);
        }
    }
}
