//! Spectrum demo: complex FFT with peak markers, a swept spectrum, and a
//! cross-correlation delay estimate, all driven through the plot engine.
//!
//! Run with: cargo run -p traza-transforms --example spectrum_demo

use traza_transforms::settings::{
    FftSettings, MarkerPolicy, PlotSettings, SweepSettings, XcorrSettings,
};
use traza_transforms::signal::{delayed, quadrature_tone, tone, white_noise};
use traza_transforms::source::{CaptureChannel, ChannelMeta, SampleSource};
use traza_transforms::{PlotEngine, UpdateStatus};

const FS: f64 = 1_000_000.0;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    fft_demo();
    sweep_demo();
    xcorr_demo();
}

fn iq_pair(name: &str, i: Vec<f32>, q: Vec<f32>) -> Vec<Box<dyn SampleSource>> {
    vec![
        Box::new(CaptureChannel::with_data(
            ChannelMeta::new(format!("{name}_i"), 12, FS).complex_pair(),
            i,
        )),
        Box::new(CaptureChannel::with_data(
            ChannelMeta::new(format!("{name}_q"), 12, FS).complex_pair(),
            q,
        )),
    ]
}

fn fft_demo() {
    println!("=== Complex FFT with Peak Markers ===\n");

    let fft_size = 4096;
    let bin_hz = FS / fft_size as f64;
    let tone_hz = 100.0 * bin_hz;
    let (i, q) = quadrature_tone(FS, tone_hz, 0.5, fft_size);

    let mut engine = PlotEngine::new(PlotSettings::Fft(FftSettings {
        fft_size,
        markers: MarkerPolicy::Peak,
        active_markers: 3,
        window_correction: true,
        ..FftSettings::default()
    }));
    engine.activate(iq_pair("voltage0", i, q)).unwrap();
    engine.tick().unwrap();

    println!("Input: {tone_hz:.0} Hz tone at amplitude 0.5, fs = {FS:.0} Hz");
    println!("FFT size: {fft_size}, window: Hanning (power corrected)\n");
    println!("{:>6} {:>8} {:>12} {:>10}", "Label", "Bin", "Freq (Hz)", "dB");
    println!("{:->6} {:->8} {:->12} {:->10}", "", "", "", "");
    for marker in engine.live_markers().unwrap().active() {
        println!(
            "{:>6} {:>8} {:>12.1} {:>10.2}",
            marker.label, marker.bin, marker.x, marker.y
        );
    }
    println!();
}

fn sweep_demo() {
    println!("=== Swept Spectrum across 8 LO Steps ===\n");

    let fft_size = 1024;
    let (i, q) = quadrature_tone(FS, 12.0 * FS / fft_size as f64, 0.5, fft_size);

    let mut engine = PlotEngine::new(PlotSettings::SweptSpectrum(SweepSettings {
        fft_size,
        filter_bandwidth: FS / 4.0,
        step_count: 8,
        markers: MarkerPolicy::Peak,
        active_markers: 1,
        ..SweepSettings::default()
    }));
    engine.activate(iq_pair("voltage0", i, q)).unwrap();

    let mut ticks = 0;
    loop {
        ticks += 1;
        if engine.tick().unwrap() == UpdateStatus::Complete {
            break;
        }
    }

    let trace = &engine.traces()[0];
    println!("Sweep assembled in {ticks} ticks");
    println!(
        "Stitched span: {:.0} Hz .. {:.0} Hz over {} bins",
        trace.x_axis()[0],
        trace.x_axis()[trace.x_axis().len() - 1],
        trace.y_axis().len()
    );
    let marker = &engine.live_markers().unwrap().slots()[0];
    println!(
        "Sweep peak: bin {} at {:.1} Hz, {:.2} dB\n",
        marker.bin, marker.x, marker.y
    );
}

fn xcorr_demo() {
    println!("=== Cross-Correlation Delay Estimate ===\n");

    let n = 2048;
    let delay = 37;
    let reference = white_noise(0xdecaf, 0.4, n);
    let probe: Vec<f32> = delayed(&reference, delay)
        .iter()
        .zip(white_noise(0xc0ffee, 0.05, n))
        .map(|(s, noise)| s + noise)
        .collect();
    let quiet = tone(FS, FS / 64.0, 0.02, n);

    let channels: Vec<Box<dyn SampleSource>> = vec![
        Box::new(CaptureChannel::with_data(
            ChannelMeta::new("voltage0_i", 12, FS),
            reference,
        )),
        Box::new(CaptureChannel::with_data(
            ChannelMeta::new("voltage0_q", 12, FS),
            quiet.clone(),
        )),
        Box::new(CaptureChannel::with_data(
            ChannelMeta::new("voltage1_i", 12, FS),
            probe,
        )),
        Box::new(CaptureChannel::with_data(
            ChannelMeta::new("voltage1_q", 12, FS),
            quiet,
        )),
    ];

    let mut engine = PlotEngine::new(PlotSettings::CrossCorrelation(XcorrSettings {
        num_samples: n,
        markers: MarkerPolicy::Peak,
        active_markers: 1,
        ..XcorrSettings::default()
    }));
    engine.activate(channels).unwrap();
    engine.tick().unwrap();

    let marker = &engine.live_markers().unwrap().slots()[0];
    println!("Injected delay: {delay} samples");
    println!(
        "Correlation peak: bin {} (lag {:.2} samples), level {:.3}",
        marker.bin,
        marker.x,
        marker.y
    );
}
