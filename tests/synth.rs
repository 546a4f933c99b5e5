use approx::assert_abs_diff_eq;
use orpheus_dsp::plugin::voice::VOICE_COUNT;
use orpheus_dsp::synth::{envelope_times, voice_frequency};
use orpheus_dsp::{AudioEngine, EngineConfig, PortValue, SynthEngine};

fn synth() -> (AudioEngine, SynthEngine) {
    let config = EngineConfig::default().with_block_size(256);
    let mut engine = AudioEngine::new(config).unwrap();
    let synth = SynthEngine::new(&mut engine).unwrap();
    (engine, synth)
}

fn peak(engine: &mut AudioEngine, blocks: usize) -> f32 {
    let mut peak = 0.0f32;
    for _ in 0..blocks {
        engine.render_block();
        let (left, right) = engine.stereo_block();
        for s in left.iter().chain(right) {
            assert!(s.is_finite() && s.abs() <= 1.0);
            peak = peak.max(s.abs());
        }
    }
    peak
}

#[test]
fn registry_covers_every_plugin() {
    let (_engine, synth) = synth();
    let registry = synth.registry();
    // 75 voice ports, 5 duo-lfo, 12 pans + 2 master, 5 delay, 2 distortion
    assert_eq!(registry.len(), 75 + 5 + 14 + 5 + 2);
    assert_eq!(registry.plugins().len(), 5);
    assert!(registry.contains("org.orpheus.voices:voice_11_tune"));
    assert!(registry.contains("org.orpheus.voices:quad_2_hold"));
    assert!(registry.contains("org.orpheus.duolfo:mode"));
    assert!(registry.contains("org.orpheus.stereo:pan_11"));
    assert!(registry.contains("org.orpheus.delay:mod_depth"));
    assert!(registry.contains("org.orpheus.distortion:drive"));

    let descriptors = registry.descriptors();
    assert_eq!(descriptors.len(), registry.len());
    assert_eq!(descriptors[0].qualified_symbol, "org.orpheus.voices:voice_0_tune");
}

#[test]
fn silent_until_gated() {
    let (mut engine, synth) = synth();
    assert_eq!(peak(&mut engine, 8), 0.0);

    assert!(synth.set_gate(0, true));
    assert!(synth.is_gate_open(0));
    assert!(peak(&mut engine, 20) > 0.01);
    assert!(synth.peak_level() > 0.0);
    assert!(!synth.set_gate(VOICE_COUNT, true));
}

#[test]
fn hold_drones_without_gates() {
    let (mut engine, synth) = synth();
    assert!(synth
        .registry()
        .set_port_value("org.orpheus.voices:quad_1_hold", PortValue::Float(1.0)));
    assert!(peak(&mut engine, 20) > 0.01);
    assert!(!synth.is_gate_open(4));
}

#[test]
fn tune_and_quad_pitch_drive_frequency() {
    let (_engine, synth) = synth();
    let registry = synth.registry();
    assert_abs_diff_eq!(synth.voice_frequency(0).unwrap(), 220.0, epsilon = 0.01);

    registry.set_port_value("org.orpheus.voices:voice_0_tune", PortValue::Float(1.0));
    assert_abs_diff_eq!(synth.voice_frequency(0).unwrap(), 880.0, epsilon = 0.01);

    registry.set_port_value("org.orpheus.voices:quad_0_pitch", PortValue::Float(1.0));
    assert_abs_diff_eq!(synth.voice_frequency(0).unwrap(), 1760.0, epsilon = 0.05);
    assert_abs_diff_eq!(synth.voice_frequency(3).unwrap(), 440.0, epsilon = 0.01);
    // Quad 1 is untouched
    assert_abs_diff_eq!(synth.voice_frequency(4).unwrap(), 220.0, epsilon = 0.01);
}

#[test]
fn global_params_reach_other_plugins() {
    let (_engine, synth) = synth();
    let registry = synth.registry();

    registry.set_port_value("org.orpheus.voices:feedback", PortValue::Float(1.0));
    assert_abs_diff_eq!(synth.delay().feedback(), 0.95, epsilon = 1e-6);

    assert!(!synth.duo_lfo().is_linked());
    registry.set_port_value("org.orpheus.voices:coupling", PortValue::Float(1.0));
    assert!(synth.duo_lfo().is_linked());
}

#[test]
fn mapping_curves() {
    assert_abs_diff_eq!(voice_frequency(0.0, 0.5), 55.0, epsilon = 1e-4);
    assert_abs_diff_eq!(voice_frequency(0.5, 0.0), 110.0, epsilon = 1e-3);
    let (attack, release) = envelope_times(0.0);
    assert_abs_diff_eq!(attack, 0.002);
    assert_abs_diff_eq!(release, 0.02);
    let (attack, release) = envelope_times(1.0);
    assert_abs_diff_eq!(attack, 1.502, epsilon = 1e-6);
    assert_abs_diff_eq!(release, 3.02, epsilon = 1e-6);
}
