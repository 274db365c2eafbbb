//! Integration tests for the transform engine's public API.
//!
//! Each scenario drives a whole plot the way the capture scheduler would:
//! synthetic channels in, periodic ticks, traces and marker snapshots out.

use traza_transforms::settings::{
    FftSettings, MarkerPolicy, PlotSettings, SweepSettings, TimeSettings, XcorrSettings,
};
use traza_transforms::signal::{delayed, quadrature_tone, tone, white_noise};
use traza_transforms::source::{CaptureChannel, ChannelMeta, MathChannel, SampleSource};
use traza_transforms::{NO_DATA, PlotEngine, UpdateStatus};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const FS: f64 = 1.0e6;

fn real_channel(name: &str, samples: Vec<f32>) -> Box<dyn SampleSource> {
    Box::new(CaptureChannel::with_data(
        ChannelMeta::new(name, 12, FS),
        samples,
    ))
}

fn iq_pair(name: &str, frequency: f64, amplitude: f64, len: usize) -> Vec<Box<dyn SampleSource>> {
    let (i, q) = quadrature_tone(FS, frequency, amplitude, len);
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

// ===========================================================================
// 1. FFT dB round-trip
// ===========================================================================

/// A bin-aligned sinusoid through a boxcar FFT must read its theoretical
/// level within 0.1 dB once the bit-depth correction is accounted for.
#[test]
fn fft_db_level_round_trips() {
    let fft_size = 4096;
    let amplitude = 700.0;
    let bin = 300;
    let frequency = bin as f64 * FS / fft_size as f64;

    let mut engine = PlotEngine::new(PlotSettings::Fft(FftSettings {
        fft_size,
        window: "Boxcar".to_string(),
        ..FftSettings::default()
    }));
    engine
        .activate(vec![real_channel(
            "voltage0",
            tone(FS, frequency, amplitude, fft_size),
        )])
        .unwrap();
    engine.tick().unwrap();

    // fft_corr for 12 bits: 20*log10(2 / 2^11).
    let fft_corr = 20.0 * (2.0f64 / 2048.0).log10();
    let expected = 20.0 * amplitude.log10() + fft_corr;
    let actual = f64::from(engine.traces()[0].y_axis()[bin]);
    assert!(
        (actual - expected).abs() < 0.1,
        "bin {bin} reads {actual:.3} dB, expected {expected:.3}"
    );
}

/// Window correction restores the level a non-flat window attenuates.
#[test]
fn window_correction_recovers_the_tone_level() {
    let fft_size = 4096;
    let bin = 300;
    let frequency = bin as f64 * FS / fft_size as f64;
    let samples = tone(FS, frequency, 700.0, fft_size);

    let run = |window_correction: bool| {
        let mut engine = PlotEngine::new(PlotSettings::Fft(FftSettings {
            fft_size,
            window: "Flat Top".to_string(),
            window_correction,
            ..FftSettings::default()
        }));
        engine
            .activate(vec![real_channel("voltage0", samples.clone())])
            .unwrap();
        engine.tick().unwrap();
        engine.traces()[0].y_axis()[bin]
    };

    let corrected = run(true);
    let uncorrected = run(false);
    assert!((f64::from(corrected - uncorrected) - 9.08).abs() < 0.01);
}

// ===========================================================================
// 2. Accumulation policies across frames
// ===========================================================================

#[test]
fn hold_policies_track_extremes_across_frames() {
    let fft_size = 1024;
    let bin = 100;
    let frequency = bin as f64 * FS / fft_size as f64;
    let amplitudes = [400.0, 900.0, 150.0, 600.0];

    let run = |averaging: u32| {
        let channel = CaptureChannel::with_data(
            ChannelMeta::new("voltage0", 12, FS),
            tone(FS, frequency, amplitudes[0], fft_size),
        );
        let data = channel.data();
        let mut engine = PlotEngine::new(PlotSettings::Fft(FftSettings {
            fft_size,
            window: "Boxcar".to_string(),
            averaging,
            ..FftSettings::default()
        }));
        engine.activate(vec![Box::new(channel)]).unwrap();
        for amplitude in amplitudes {
            data.write(&tone(FS, frequency, amplitude, fft_size));
            engine.tick().unwrap();
        }
        f64::from(engine.traces()[0].y_axis()[bin])
    };

    let fft_corr = 20.0 * (2.0f64 / 2048.0).log10();
    let level = |amplitude: f64| 20.0 * amplitude.log10() + fft_corr;

    // Peak hold keeps the loudest frame, min hold the quietest.
    assert!((run(0) - level(900.0)).abs() < 0.1);
    assert!((run(128) - level(150.0)).abs() < 0.1);

    // Exponential averaging matches the closed-form recurrence.
    let mut expected = level(amplitudes[0]);
    for amplitude in &amplitudes[1..] {
        expected = 0.75 * expected + 0.25 * level(*amplitude);
    }
    assert!((run(4) - expected).abs() < 0.1);
}

// ===========================================================================
// 3. Marker families
// ===========================================================================

/// The one-tone family refuses to call DC the fundamental: when the raw
/// peak search lands on the DC bin, markers 0 and 1 swap.
#[test]
fn one_tone_markers_swap_off_dc() {
    let fft_size = 1024;
    let frequency = 10.0 * FS / fft_size as f64;
    let mut samples = tone(FS, frequency, 80.0, fft_size);
    for sample in &mut samples {
        *sample += 500.0;
    }

    let mut engine = PlotEngine::new(PlotSettings::Fft(FftSettings {
        fft_size,
        window: "Boxcar".to_string(),
        markers: MarkerPolicy::OneTone,
        active_markers: 2,
        ..FftSettings::default()
    }));
    engine
        .activate(vec![real_channel("voltage0", samples)])
        .unwrap();
    engine.tick().unwrap();

    let markers = engine.live_markers().unwrap();
    assert_ne!(markers.slots()[0].bin, 0, "fundamental must leave DC");
    assert_eq!(markers.slots()[0].bin, 10);
    assert_eq!(markers.slots()[1].bin, 0, "DC marker takes bin 0");
}

#[test]
fn marker_snapshot_travels_to_a_consumer_thread() {
    let fft_size = 1024;
    let mut engine = PlotEngine::new(PlotSettings::Fft(FftSettings {
        fft_size,
        markers: MarkerPolicy::Peak,
        active_markers: 3,
        ..FftSettings::default()
    }));
    engine
        .activate(iq_pair("voltage0", 40.0 * FS / fft_size as f64, 100.0, fft_size))
        .unwrap();

    let receiver = engine.request_marker_snapshot();
    let consumer = std::thread::spawn(move || receiver.recv().unwrap());
    engine.tick().unwrap();

    let snapshot = consumer.join().unwrap();
    assert_eq!(snapshot.markers[0].bin, fft_size / 2 + 40);
    assert_eq!(snapshot.markers[0].label, "M1");
    assert!(!snapshot.markers[0].angle.is_nan());
}

// ===========================================================================
// 4. Swept spectrum assembly
// ===========================================================================

#[test]
fn sweep_assembles_a_monotonic_spectrum_and_signals_once() {
    let fft_size = 1024;
    let step_count = 8;
    let settings = SweepSettings {
        fft_size,
        window: "Hanning".to_string(),
        start_frequency: 70.0e6,
        filter_bandwidth: FS / 4.0,
        step_count,
        ..SweepSettings::default()
    };
    let mut engine = PlotEngine::new(PlotSettings::SweptSpectrum(settings));
    engine
        .activate(iq_pair("voltage0", 12.0 * FS / fft_size as f64, 100.0, fft_size))
        .unwrap();

    let mut completions = 0;
    for _ in 0..2 * step_count {
        if engine.tick().unwrap() == UpdateStatus::Complete {
            completions += 1;
        }
    }
    assert_eq!(completions, 2, "one completion per full sweep");

    let trace = &engine.traces()[0];
    assert!(trace.x_axis().windows(2).all(|pair| pair[1] > pair[0]));
    assert!(trace.y_axis().iter().all(|y| *y != NO_DATA));
    // A quarter-bandwidth clip keeps fft_size/4 bins per step.
    assert_eq!(trace.y_axis().len(), step_count * fft_size / 4);
}

// ===========================================================================
// 5. Cross-correlation
// ===========================================================================

#[test]
fn correlation_finds_the_inserted_delay_through_noise() {
    let n = 2048;
    let delay = 200;
    let (i, q) = quadrature_tone(FS, 37.0 * FS / n as f64, 100.0, n);
    let noisy = |samples: &[f32], seed: u32| -> Vec<f32> {
        samples
            .iter()
            .zip(white_noise(seed, 5.0, samples.len()))
            .map(|(s, w)| s + w)
            .collect()
    };
    let channels: Vec<Box<dyn SampleSource>> = vec![
        real_channel("i0", noisy(&i, 1)),
        real_channel("q0", noisy(&q, 2)),
        real_channel("i1", noisy(&delayed(&i, delay), 3)),
        real_channel("q1", noisy(&delayed(&q, delay), 4)),
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
    assert_eq!(marker.bin, n - 1 - delay);
    assert!((f64::from(marker.x) + delay as f64).abs() <= 0.5);
}

// ===========================================================================
// 6. Math channels inside a plot
// ===========================================================================

#[test]
fn math_channels_recompute_before_each_frame() {
    let base = CaptureChannel::with_data(ChannelMeta::new("voltage0", 12, FS), vec![1.0; 16]);
    let data = base.data();
    let doubled = MathChannel::new(
        ChannelMeta::new("voltage0_x2", 12, FS),
        vec![base.data()],
        |inputs, out| out.extend(inputs[0].iter().map(|s| s * 2.0)),
    );

    let mut engine = PlotEngine::new(PlotSettings::Time(TimeSettings {
        num_samples: 16,
        ..TimeSettings::default()
    }));
    engine.activate(vec![Box::new(doubled)]).unwrap();

    engine.tick().unwrap();
    assert_eq!(engine.traces()[0].y_axis()[0], 2.0);

    // The capture loop refreshes the base channel; the math channel
    // follows on the same tick.
    data.write(&[5.0; 16]);
    engine.tick().unwrap();
    assert_eq!(engine.traces()[0].y_axis()[0], 10.0);
}
