use approx::assert_abs_diff_eq;
use orpheus_dsp::engine::UNIT_SIGNAL_LIMIT;
use orpheus_dsp::plugin::{delay::MAX_FEEDBACK, DelayPlugin};
use orpheus_dsp::unit::arithmetic::{INPUT_A, INPUT_B, INPUT_C};
use orpheus_dsp::unit::{pass_through, MultiplyAdd, PassThrough};
use orpheus_dsp::{AudioEngine, DspPlugin, EngineConfig, PortValue};

fn engine(block: usize) -> AudioEngine {
    let config = EngineConfig::default()
        .with_sample_rate(1_000.0)
        .with_block_size(block);
    AudioEngine::new(config).unwrap()
}

#[test]
fn second_connect_replaces_first_source() {
    let mut engine = engine(8);
    let a = engine.add(PassThrough::new()).unwrap();
    let b = engine.add(PassThrough::new()).unwrap();
    let x = engine.add(PassThrough::new()).unwrap();
    engine.set_constant(a.input(pass_through::INPUT), 0.1).unwrap();
    engine.set_constant(b.input(pass_through::INPUT), 0.7).unwrap();

    engine.connect(a.output(), x.input(pass_through::INPUT)).unwrap();
    engine.connect(b.output(), x.input(pass_through::INPUT)).unwrap();
    assert_eq!(engine.source_of(x.input(pass_through::INPUT)), Some(b.output()));

    engine.set_output(x.output(), x.output()).unwrap();
    engine.render_block();
    assert_eq!(engine.stereo_block().0, &[0.7; 8]);
}

#[test]
fn handle_rewires_from_another_thread() {
    let mut engine = engine(8);
    let a = engine.add(PassThrough::new()).unwrap();
    let b = engine.add(PassThrough::new()).unwrap();
    let x = engine.add(PassThrough::new()).unwrap();
    engine.set_constant(a.input(pass_through::INPUT), 0.25).unwrap();
    engine.set_constant(b.input(pass_through::INPUT), -0.5).unwrap();
    engine.connect(a.output(), x.input(pass_through::INPUT)).unwrap();
    engine.set_output(x.output(), x.output()).unwrap();

    engine.render_block();
    assert_eq!(engine.stereo_block().0[0], 0.25);

    let handle = engine.handle();
    std::thread::spawn(move || handle.connect(b.output(), x.input(pass_through::INPUT)))
        .join()
        .unwrap()
        .unwrap();

    engine.render_block();
    assert_eq!(engine.stereo_block().0[0], -0.5);
    assert_eq!(engine.source_of(x.input(pass_through::INPUT)), Some(b.output()));
}

#[test]
fn feedback_delay_stays_bounded_and_decays() {
    let mut engine = engine(64);
    let mut delay = DelayPlugin::new();
    delay.initialize(&mut engine).unwrap();
    delay.set_port_value("feedback", PortValue::Float(0.999));
    delay.set_port_value("mix", PortValue::Float(1.0));
    delay.set_port_value("time", PortValue::Float(0.01));
    assert_eq!(delay.feedback(), MAX_FEEDBACK);

    let input = delay.audio_input("in_left").unwrap();
    let out = delay.audio_output("out_left").unwrap();
    engine.set_output(out, out).unwrap();

    // One block of full-scale burst, then silence
    engine.set_constant(input, 1.0).unwrap();
    engine.render_block();
    engine.set_constant(input, 0.0).unwrap();

    let mut loudest = 0.0f32;
    let mut last = 0.0f32;
    for block in 0..200 {
        engine.render_block();
        let peak = engine
            .output(out)
            .unwrap()
            .iter()
            .fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(peak <= 1.0 + 1e-5, "block {block} peaked at {peak}");
        loudest = loudest.max(peak);
        last = peak;
    }
    assert!(loudest > 0.5);
    assert!(last < 0.01, "tail still at {last}");
}

#[test]
fn runaway_loop_is_bounded() {
    let mut engine = engine(16);
    // acc = acc · 2 + 1, fed back through itself
    let acc = engine.add(MultiplyAdd::new()).unwrap();
    engine.connect(acc.output(), acc.input(INPUT_A)).unwrap();
    engine.set_constant(acc.input(INPUT_B), 2.0).unwrap();
    engine.set_constant(acc.input(INPUT_C), 1.0).unwrap();
    engine.set_output(acc.output(), acc.output()).unwrap();

    for _ in 0..40 {
        engine.render_block();
        let block = engine.output(acc.output()).unwrap();
        assert!(block.iter().all(|s| s.is_finite() && s.abs() <= UNIT_SIGNAL_LIMIT));
        let (left, right) = engine.stereo_block();
        assert!(left.iter().chain(right).all(|s| s.abs() <= 1.0));
    }
    assert_eq!(engine.output(acc.output()).unwrap()[0], UNIT_SIGNAL_LIMIT);
}

#[test]
fn non_finite_constants_become_silence() {
    let mut engine = engine(8);
    let nan = engine.add(PassThrough::new()).unwrap();
    let inf = engine.add(PassThrough::new()).unwrap();
    engine.set_constant(nan.input(pass_through::INPUT), f32::NAN).unwrap();
    engine.set_constant(inf.input(pass_through::INPUT), f32::INFINITY).unwrap();
    engine.set_output(nan.output(), inf.output()).unwrap();

    engine.render_block();
    let (left, right) = engine.stereo_block();
    assert!(left.iter().chain(right).all(|&s| s == 0.0));
}

#[test]
fn disconnected_branch_keeps_its_state() {
    let mut engine = engine(4);
    let counter = engine.add(MultiplyAdd::new()).unwrap();
    engine.connect(counter.output(), counter.input(INPUT_A)).unwrap();
    engine.set_constant(counter.input(INPUT_B), 1.0).unwrap();
    engine.set_constant(counter.input(INPUT_C), 1.0).unwrap();
    let out = engine.add(PassThrough::new()).unwrap();
    engine.connect(counter.output(), out.input(pass_through::INPUT)).unwrap();
    engine.set_output(out.output(), out.output()).unwrap();

    engine.render_block();
    assert_abs_diff_eq!(engine.stereo_block().0[0], 1.0);

    engine.disconnect(out.input(pass_through::INPUT)).unwrap();
    for _ in 0..5 {
        engine.render_block();
    }
    engine.connect(counter.output(), out.input(pass_through::INPUT)).unwrap();
    engine.render_block();
    // The counter only advanced on the blocks it was pulled
    assert_abs_diff_eq!(engine.output(counter.output()).unwrap()[0], 2.0);
}
