//! Lock-free topology changes from control threads.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rtrb::Producer;
use tracing::warn;

use crate::atomic::ControlValue;
use crate::error::{Error, Result};
use crate::unit::{InputId, InputSpec, OutputId, UnitId};

/// A rewiring request, applied by the render thread at the next block start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GraphCommand {
    /// Replace whatever feeds `input` with `source`.
    Connect { source: OutputId, input: InputId },
    /// Revert `input` to its constant.
    Disconnect { input: InputId },
}

/// What a control thread needs to know about one registered unit.
pub(crate) struct UnitShape {
    pub name: &'static str,
    pub inputs: &'static [InputSpec],
    pub constants: Vec<ControlValue>,
}

struct Shared {
    producer: Mutex<Producer<GraphCommand>>,
    shapes: RwLock<Vec<UnitShape>>,
}

/// Cloneable control-side view of an [`AudioEngine`](super::AudioEngine).
///
/// Plugins keep one of these so port setters running on any thread can
/// rewire the graph or write input constants without touching the engine.
#[derive(Clone)]
pub struct EngineHandle {
    shared: Arc<Shared>,
}

impl EngineHandle {
    pub(crate) fn new(producer: Producer<GraphCommand>) -> Self {
        Self {
            shared: Arc::new(Shared {
                producer: Mutex::new(producer),
                shapes: RwLock::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn register(&self, shape: UnitShape) {
        self.shared.shapes.write().push(shape);
    }

    pub(crate) fn rebind_constant(&self, input: InputId, value: ControlValue) {
        if let Some(slot) = self
            .shared
            .shapes
            .write()
            .get_mut(input.unit.index())
            .and_then(|shape| shape.constants.get_mut(input.index))
        {
            *slot = value;
        }
    }

    /// Number of units registered so far.
    pub fn unit_count(&self) -> usize {
        self.shared.shapes.read().len()
    }

    /// Type name of a registered unit.
    pub fn unit_name(&self, unit: UnitId) -> Result<&'static str> {
        self.shared
            .shapes
            .read()
            .get(unit.index())
            .map(|shape| shape.name)
            .ok_or(Error::UnknownUnit(unit))
    }

    /// Resolve an input by name.
    pub fn input(&self, unit: UnitId, name: &str) -> Result<InputId> {
        let shapes = self.shared.shapes.read();
        let shape = shapes.get(unit.index()).ok_or(Error::UnknownUnit(unit))?;
        shape
            .inputs
            .iter()
            .position(|spec| spec.name == name)
            .map(|index| unit.input(index))
            .ok_or_else(|| Error::UnknownInput {
                unit,
                name: name.to_string(),
            })
    }

    pub(crate) fn validate_input(&self, input: InputId) -> Result<()> {
        let shapes = self.shared.shapes.read();
        let shape = shapes
            .get(input.unit.index())
            .ok_or(Error::UnknownUnit(input.unit))?;
        if input.index >= shape.inputs.len() {
            return Err(Error::InputOutOfRange {
                unit: input.unit,
                index: input.index,
            });
        }
        Ok(())
    }

    fn validate_unit(&self, unit: UnitId) -> Result<()> {
        if unit.index() < self.unit_count() {
            Ok(())
        } else {
            Err(Error::UnknownUnit(unit))
        }
    }

    /// The shared constant of `input`. Writes are picked up at the next block.
    pub fn constant(&self, input: InputId) -> Result<ControlValue> {
        self.validate_input(input)?;
        let shapes = self.shared.shapes.read();
        Ok(Arc::clone(&shapes[input.unit.index()].constants[input.index]))
    }

    pub fn set_constant(&self, input: InputId, value: f32) -> Result<()> {
        self.constant(input)?.set(value);
        Ok(())
    }

    /// Queue a connection. Single source per input: an existing source is replaced.
    pub fn connect(&self, source: OutputId, input: InputId) -> Result<()> {
        self.validate_unit(source.unit())?;
        self.validate_input(input)?;
        self.send(GraphCommand::Connect { source, input })
    }

    /// Queue a disconnection; the input falls back to its constant.
    pub fn disconnect(&self, input: InputId) -> Result<()> {
        self.validate_input(input)?;
        self.send(GraphCommand::Disconnect { input })
    }

    fn send(&self, command: GraphCommand) -> Result<()> {
        self.shared.producer.lock().push(command).map_err(|_| {
            warn!(?command, "graph command queue full, dropping command");
            Error::CommandQueueFull
        })
    }
}
