//! Audio setup: device, engine and the render callback

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::RingBuffer;
use tracing::{error, info};

use orpheus_dsp::{AudioEngine, EngineConfig, RingSink, SynthEngine};

use super::ui::{UiApp, SCOPE_CAPACITY};

/// Stereo frames the engine may run ahead of the device.
const RING_FRAMES: usize = 16_384;

/// Main application builder
pub struct Orpheus {
    block_size: usize,
}

impl Orpheus {
    pub fn new() -> Self {
        Self { block_size: 256 }
    }

    /// Open the default device, start the synth and hand the terminal to the UI.
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        let engine_config = EngineConfig::default()
            .with_sample_rate(sample_rate)
            .with_block_size(self.block_size);
        let mut engine = AudioEngine::new(engine_config).wrap_err("invalid engine config")?;
        let synth = SynthEngine::new(&mut engine).wrap_err("failed to build synth")?;

        let (sink, mut device_rx) = RingSink::new(RING_FRAMES);
        engine.set_sink(sink);
        synth.on_start();
        engine.start()?;
        info!(sample_rate, channels, block_size = self.block_size, "audio configured");

        // Mono mixdown for the scope, dropped when the UI falls behind
        let (mut scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_CAPACITY * 4);
        let block_samples = self.block_size * 2;

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let needed = (data.len() / channels.max(1)) * 2;
                let missing = needed.saturating_sub(device_rx.slots());
                for _ in 0..missing.div_ceil(block_samples) {
                    engine.tick();
                }

                for frame in data.chunks_mut(channels.max(1)) {
                    let left = device_rx.pop().unwrap_or(0.0);
                    let right = device_rx.pop().unwrap_or(0.0);
                    match frame {
                        [mono] => *mono = left,
                        [l, r, rest @ ..] => {
                            *l = left;
                            *r = right;
                            rest.fill(0.0);
                        }
                        [] => {}
                    }
                    let _ = scope_tx.push(0.5 * (left + right));
                }
            },
            |err| error!(%err, "audio stream error"),
            None,
        )?;
        stream.play()?;

        let mut terminal = ratatui::init();
        let result = UiApp::new(synth, scope_rx, sample_rate).run(&mut terminal);
        ratatui::restore();
        drop(stream);
        result
    }
}

impl Default for Orpheus {
    fn default() -> Self {
        Self::new()
    }
}
