//! Benchmarks for rendering whole blocks through the engine.

use criterion::{BenchmarkId, Criterion};
use orpheus_dsp::plugin::voice::VOICE_COUNT;
use orpheus_dsp::plugin::DuoLfoMode;
use orpheus_dsp::unit::arithmetic::{INPUT_A, INPUT_B, INPUT_C};
use orpheus_dsp::unit::{oscillator, Multiply, MultiplyAdd, Oscillator};
use orpheus_dsp::{AudioEngine, EngineConfig, PortValue, SynthEngine};

use crate::BLOCK_SIZES;

fn engine(block_size: usize) -> AudioEngine {
    let config = EngineConfig::default().with_block_size(block_size);
    // Benchmarks only use valid configs
    AudioEngine::new(config).unwrap()
}

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for &size in BLOCK_SIZES {
        // === SCHEDULER OVERHEAD ===
        // A long chain of cheap units: cost is dominated by pulling
        let mut chain = engine(size);
        let osc = chain.add(Oscillator::sine()).unwrap();
        chain.set_constant(osc.input(oscillator::FREQUENCY), 220.0).unwrap();
        let mut last = osc;
        for _ in 0..64 {
            let gain = chain.add(Multiply::new()).unwrap();
            chain.connect(last.output(), gain.input(INPUT_A)).unwrap();
            chain.set_constant(gain.input(INPUT_B), 0.999).unwrap();
            last = gain;
        }
        chain.set_output(last.output(), last.output()).unwrap();
        group.bench_with_input(BenchmarkId::new("chain_64", size), &size, |b, _| {
            b.iter(|| chain.render_block())
        });

        // === FEEDBACK LOOP ===
        // Self-cycle: the unit reads its own previous block
        let mut feedback = engine(size);
        let acc = feedback.add(MultiplyAdd::new()).unwrap();
        feedback.connect(acc.output(), acc.input(INPUT_A)).unwrap();
        feedback.set_constant(acc.input(INPUT_B), 0.5).unwrap();
        feedback.set_constant(acc.input(INPUT_C), 0.1).unwrap();
        feedback.set_output(acc.output(), acc.output()).unwrap();
        group.bench_with_input(BenchmarkId::new("self_cycle", size), &size, |b, _| {
            b.iter(|| feedback.render_block())
        });

        // === FULL SYNTH, IDLE ===
        let mut idle = engine(size);
        let _idle_synth = SynthEngine::new(&mut idle).unwrap();
        group.bench_with_input(BenchmarkId::new("synth_idle", size), &size, |b, _| {
            b.iter(|| idle.render_block())
        });

        // === FULL SYNTH, ALL VOICES ===
        // Every gate open, square duo-LFO vibrato and full delay modulation
        let mut busy = engine(size);
        let synth = SynthEngine::new(&mut busy).unwrap();
        let registry = synth.registry();
        registry.set_port_value("org.orpheus.voices:vibrato", PortValue::Float(1.0));
        registry.set_port_value("org.orpheus.delay:mod_depth", PortValue::Float(1.0));
        registry.set_port_value("org.orpheus.distortion:mix", PortValue::Float(0.5));
        synth.duo_lfo().set_triangle_mode(false);
        synth.duo_lfo().set_mode(DuoLfoMode::Or);
        for voice in 0..VOICE_COUNT {
            synth.set_gate(voice, true);
        }
        group.bench_with_input(BenchmarkId::new("synth_all_voices", size), &size, |b, _| {
            b.iter(|| busy.render_block())
        });
    }

    group.finish();
}
