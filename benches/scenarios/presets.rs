//! Benchmarks for the registry's preset path.

use std::hint::black_box;

use criterion::Criterion;
use orpheus_dsp::{AudioEngine, EngineConfig, PortValue, Preset, SynthEngine};

pub fn bench_presets(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/presets");

    let mut engine = AudioEngine::new(EngineConfig::default()).unwrap();
    let synth = SynthEngine::new(&mut engine).unwrap();
    let registry = synth.registry();
    registry.set_port_value("org.orpheus.delay:time", PortValue::Float(0.5));
    let preset = registry.capture_state();

    group.bench_function("capture_state", |b| {
        b.iter(|| black_box(registry.capture_state()))
    });

    group.bench_function("restore_state", |b| {
        b.iter(|| registry.restore_state(black_box(&preset)))
    });

    group.bench_function("restore_empty", |b| {
        b.iter(|| registry.restore_state(black_box(&Preset::new())))
    });

    group.bench_function("set_port_value", |b| {
        b.iter(|| {
            registry.set_port_value(
                black_box("org.orpheus.voices:voice_7_tune"),
                PortValue::Float(0.25),
            )
        })
    });

    group.finish();
}
