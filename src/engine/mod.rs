mod command;
mod sink;

pub use command::{EngineHandle, GraphCommand};
pub use sink::{AudioSink, BufferSink, RingSink};

use std::mem;
use std::sync::Arc;

use rtrb::{Consumer, RingBuffer};
use tracing::{debug, info};

use crate::atomic::{AtomicParam, ControlValue};
use crate::config::EngineConfig;
use crate::dsp::distortion::{flush_non_finite, hard_clip};
use crate::error::{Error, Result};
use crate::unit::{
    AudioUnit, InputId, Inputs, OutputId, RenderCtx, Signal, UnitId, MAX_UNIT_INPUTS,
};

use self::command::UnitShape;

/// Bound applied to every unit output before anything reads it.
pub const UNIT_SIGNAL_LIMIT: f32 = 1.0e6;

/*
Pull Scheduling
===============

Units are registered in any order. Each block the engine asks its ROOTS
for output, and every unit asks its connected sources first:

    root (main L) ──pulls──▶ Multiply ──pulls──▶ Oscillator
                                  └──pulls──▶ Envelope

Roots are the two main-output taps plus anything started with
`start_unit` (meters that nobody listens to would otherwise never run).


Generation Counter
------------------

A unit reachable from two roots must only render once per block. Every
block bumps `generation`; a slot remembers the generation it last rendered
in and is skipped when they match.

A unit nothing pulls is simply not rendered. Its phase and memory stay
frozen until it is connected again, which is what lets a disconnected
branch keep its own state.


Cycles
------

Feedback loops are legal. While a unit is rendering it is marked
`visiting`; reaching it again reads its PREVIOUS block:

    ┌──────────────┐
    ▼              │
  Delay ──▶ MultiplyAdd (feedback)
              ▲
              │ reads Delay's last block
              └── one block of extra delay at the cycle-breaking point

Outputs are double-buffered. A unit renders into `scratch` and only then
swaps it with `output`, so the previous block is still intact while the
current one is being computed.


Sanitizing
----------

Every unit output is flushed (NaN/inf → 0, clamped to ±UNIT_SIGNAL_LIMIT)
and the final stereo pair is hard-clipped to ±1. A blown-up feedback loop
produces silence, never garbage at the speakers.


Rewiring While Running
----------------------

Control threads hold an `EngineHandle`. Connect/disconnect requests go
through an rtrb SPSC queue the render thread drains at the start of each
block. Input constants are atomics read once per block, so writing one
needs no queue at all.
*/

struct Slot {
    unit: Option<Box<dyn AudioUnit>>,
    sources: Vec<Option<UnitId>>,
    constants: Vec<ControlValue>,
    output: Vec<f32>,
    scratch: Vec<f32>,
    generation: u64,
    visiting: bool,
}

/// Owns every registered unit and renders the graph block by block.
pub struct AudioEngine {
    config: EngineConfig,
    slots: Vec<Slot>,
    commands: Consumer<GraphCommand>,
    handle: EngineHandle,
    roots: Vec<UnitId>,
    main_output: Option<(UnitId, UnitId)>,
    left: Vec<f32>,
    right: Vec<f32>,
    generation: u64,
    frame: u64,
    sink: Option<Box<dyn AudioSink>>,
    running: bool,
    interleave_pos: usize,
}

impl AudioEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let (producer, commands) = RingBuffer::new(config.command_capacity);
        let block_size = config.block_size;
        Ok(Self {
            config,
            slots: Vec::new(),
            commands,
            handle: EngineHandle::new(producer),
            roots: Vec::new(),
            main_output: None,
            left: vec![0.0; block_size],
            right: vec![0.0; block_size],
            generation: 0,
            frame: 0,
            sink: None,
            running: false,
            interleave_pos: block_size,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.config.block_size
    }

    /// Frames rendered since construction.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn unit_count(&self) -> usize {
        self.slots.len()
    }

    /// Control-side handle for rewiring and constants.
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Register a unit. Every input starts at its declared default constant.
    pub fn add<U: AudioUnit + 'static>(&mut self, unit: U) -> Result<UnitId> {
        self.add_unit(Box::new(unit))
    }

    pub fn add_unit(&mut self, unit: Box<dyn AudioUnit>) -> Result<UnitId> {
        let specs = unit.inputs();
        if specs.len() > MAX_UNIT_INPUTS {
            return Err(Error::TooManyInputs {
                name: unit.name(),
                count: specs.len(),
            });
        }

        let id = UnitId(self.slots.len());
        let constants: Vec<ControlValue> = specs
            .iter()
            .map(|spec| Arc::new(AtomicParam::new(spec.default)))
            .collect();

        self.handle.register(UnitShape {
            name: unit.name(),
            inputs: specs,
            constants: constants.clone(),
        });
        debug!(unit = %id, name = unit.name(), "unit added");

        self.slots.push(Slot {
            unit: Some(unit),
            sources: vec![None; specs.len()],
            constants,
            output: vec![0.0; self.config.block_size],
            scratch: vec![0.0; self.config.block_size],
            generation: 0,
            visiting: false,
        });
        Ok(id)
    }

    /// Resolve an input by name.
    pub fn input(&self, unit: UnitId, name: &str) -> Result<InputId> {
        self.handle.input(unit, name)
    }

    pub fn unit_name(&self, unit: UnitId) -> Result<&'static str> {
        self.handle.unit_name(unit)
    }

    fn check_unit(&self, unit: UnitId) -> Result<()> {
        if unit.index() < self.slots.len() {
            Ok(())
        } else {
            Err(Error::UnknownUnit(unit))
        }
    }

    /// Connect immediately. Queued handle commands are applied first so the
    /// final topology matches the order the requests were made in.
    pub fn connect(&mut self, source: OutputId, input: InputId) -> Result<()> {
        self.check_unit(source.unit())?;
        self.handle.validate_input(input)?;
        self.apply_pending_commands();
        self.slots[input.unit.index()].sources[input.index] = Some(source.unit());
        Ok(())
    }

    pub fn disconnect(&mut self, input: InputId) -> Result<()> {
        self.handle.validate_input(input)?;
        self.apply_pending_commands();
        self.slots[input.unit.index()].sources[input.index] = None;
        Ok(())
    }

    /// The output currently feeding `input`, if any.
    pub fn source_of(&self, input: InputId) -> Option<OutputId> {
        self.slots
            .get(input.unit.index())?
            .sources
            .get(input.index)
            .copied()
            .flatten()
            .map(UnitId::output)
    }

    /// The shared constant of `input`, used whenever it is unconnected.
    pub fn constant(&self, input: InputId) -> Result<ControlValue> {
        self.handle.constant(input)
    }

    pub fn set_constant(&self, input: InputId, value: f32) -> Result<()> {
        self.handle.set_constant(input, value)
    }

    /// Make `input` read its constant from `value` instead of its own atomic.
    ///
    /// Plugins use this to let a port's backing field drive a unit directly.
    pub fn bind_constant(&mut self, input: InputId, value: ControlValue) -> Result<()> {
        self.handle.validate_input(input)?;
        self.slots[input.unit.index()].constants[input.index] = Arc::clone(&value);
        self.handle.rebind_constant(input, value);
        Ok(())
    }

    /// Render `unit` every block even when nothing downstream pulls it.
    pub fn start_unit(&mut self, unit: UnitId) -> Result<()> {
        self.check_unit(unit)?;
        if !self.roots.contains(&unit) {
            self.roots.push(unit);
        }
        Ok(())
    }

    pub fn stop_unit(&mut self, unit: UnitId) {
        self.roots.retain(|root| *root != unit);
    }

    /// Route two unit outputs to the main stereo output.
    pub fn set_output(&mut self, left: OutputId, right: OutputId) -> Result<()> {
        self.check_unit(left.unit())?;
        self.check_unit(right.unit())?;
        self.main_output = Some((left.unit(), right.unit()));
        Ok(())
    }

    pub fn set_sink<S: AudioSink + 'static>(&mut self, sink: S) {
        self.sink = Some(Box::new(sink));
    }

    /// Begin delivering blocks to the sink. Starting twice is a no-op.
    pub fn start(&mut self) -> Result<()> {
        if self.sink.is_none() {
            return Err(Error::NoAudioSink);
        }
        if !self.running {
            self.running = true;
            info!(
                sample_rate = self.config.sample_rate,
                block_size = self.config.block_size,
                units = self.slots.len(),
                "engine started"
            );
        }
        Ok(())
    }

    /// Stop delivering blocks. Stopping a stopped engine is a no-op.
    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            info!(frames = self.frame, "engine stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Apply every queued [`GraphCommand`].
    pub fn apply_pending_commands(&mut self) {
        while let Ok(command) = self.commands.pop() {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: GraphCommand) {
        // Handles validate before queuing; anything still out of range is ignored
        match command {
            GraphCommand::Connect { source, input } => {
                if source.unit().index() >= self.slots.len() {
                    return;
                }
                if let Some(slot) = self
                    .slots
                    .get_mut(input.unit.index())
                    .and_then(|slot| slot.sources.get_mut(input.index))
                {
                    *slot = Some(source.unit());
                }
            }
            GraphCommand::Disconnect { input } => {
                if let Some(slot) = self
                    .slots
                    .get_mut(input.unit.index())
                    .and_then(|slot| slot.sources.get_mut(input.index))
                {
                    *slot = None;
                }
            }
        }
    }

    /// Render one block into the sink, if running. Returns whether a block was rendered.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.render_block();
        if let Some(sink) = self.sink.as_mut() {
            sink.write_block(&self.left, &self.right);
        }
        true
    }

    /// Render one block regardless of the running state.
    ///
    /// The result is available from [`stereo_block`](Self::stereo_block) and,
    /// per unit, from [`output`](Self::output).
    pub fn render_block(&mut self) {
        self.apply_pending_commands();
        self.generation += 1;
        let frames = self.config.block_size;

        for i in 0..self.roots.len() {
            let root = self.roots[i];
            self.pull(root.index(), frames);
        }

        match self.main_output {
            Some((left, right)) => {
                self.pull(left.index(), frames);
                self.pull(right.index(), frames);
                for (dst, src) in self.left.iter_mut().zip(&self.slots[left.index()].output) {
                    *dst = hard_clip(*src, 1.0);
                }
                for (dst, src) in self.right.iter_mut().zip(&self.slots[right.index()].output) {
                    *dst = hard_clip(*src, 1.0);
                }
            }
            None => {
                self.left.fill(0.0);
                self.right.fill(0.0);
            }
        }

        self.frame += frames as u64;
        self.interleave_pos = 0;
    }

    fn pull(&mut self, index: usize, frames: usize) {
        {
            let slot = &mut self.slots[index];
            if slot.generation == self.generation || slot.visiting {
                return;
            }
            slot.visiting = true;
        }

        for k in 0..self.slots[index].sources.len() {
            if let Some(source) = self.slots[index].sources[k] {
                self.pull(source.index(), frames);
            }
        }

        let (mut unit, mut scratch) = {
            let slot = &mut self.slots[index];
            match slot.unit.take() {
                Some(unit) => (unit, mem::take(&mut slot.scratch)),
                None => {
                    slot.visiting = false;
                    return;
                }
            }
        };

        let ctx = RenderCtx {
            sample_rate: self.config.sample_rate,
            frame: self.frame,
        };
        {
            let slot = &self.slots[index];
            let count = slot.sources.len();
            let mut signals = [Signal::Constant(0.0); MAX_UNIT_INPUTS];
            for (k, signal) in signals.iter_mut().take(count).enumerate() {
                *signal = match slot.sources[k] {
                    // A source still marked visiting hands out its previous block
                    Some(source) => Signal::Buffer(&self.slots[source.index()].output[..frames]),
                    None => Signal::Constant(slot.constants[k].get()),
                };
            }
            unit.render(&Inputs::new(&signals[..count]), &mut scratch[..frames], &ctx);
        }
        flush_non_finite(&mut scratch[..frames], UNIT_SIGNAL_LIMIT);

        let generation = self.generation;
        let slot = &mut self.slots[index];
        slot.scratch = mem::replace(&mut slot.output, scratch);
        slot.unit = Some(unit);
        slot.generation = generation;
        slot.visiting = false;
    }

    /// The main stereo pair of the last rendered block, clipped to ±1.
    pub fn stereo_block(&self) -> (&[f32], &[f32]) {
        (&self.left, &self.right)
    }

    /// Last block computed by a unit. Units nothing pulled keep their old block.
    pub fn output(&self, output: OutputId) -> Option<&[f32]> {
        self.slots
            .get(output.unit().index())
            .map(|slot| slot.output.as_slice())
    }

    /// Fill an interleaved device buffer, rendering blocks as needed.
    ///
    /// Left and right go to the first two channels, further channels get
    /// silence and a mono device gets the left channel. The sink is bypassed.
    /// Outputs silence while stopped.
    pub fn process_interleaved(&mut self, out: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        if !self.running {
            out.fill(0.0);
            return;
        }

        for frame in out.chunks_mut(channels) {
            if self.interleave_pos >= self.left.len() {
                self.render_block();
            }
            let left = self.left[self.interleave_pos];
            let right = self.right[self.interleave_pos];
            match frame {
                [mono] => *mono = left,
                [l, r, rest @ ..] => {
                    *l = left;
                    *r = right;
                    rest.fill(0.0);
                }
                [] => {}
            }
            self.interleave_pos += 1;
        }
    }
}
