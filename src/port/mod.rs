//! Typed control ports.
//!
//! A port is immutable metadata (symbol, type, default, range) plus a getter
//! and setter closure over a plugin's atomic state. Ports are the only way
//! anything outside a plugin reads or changes it: UI, presets, MIDI mapping
//! and automation all go through [`ControlPort::get`] / [`ControlPort::set`].
//!
//! Setting never fails. A value of the wrong type is coerced to the port's
//! type, then clamped to its range.

mod builder;
mod symbol;

pub use builder::{BoolPortBuilder, FloatPortBuilder, IntPortBuilder, PortsBuilder};
pub use symbol::{MalformedSymbol, QualifiedSymbol};

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortType {
    Float,
    Int,
    Bool,
}

/// Current value of a port.
///
/// With the `serde` feature this serializes untagged, so a preset is a flat
/// JSON object of numbers and booleans. `Int` is listed before `Float` so whole
/// numbers deserialize as integers.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PortValue {
    Int(i32),
    Float(f32),
    Bool(bool),
}

impl PortValue {
    pub fn port_type(&self) -> PortType {
        match self {
            PortValue::Float(_) => PortType::Float,
            PortValue::Int(_) => PortType::Int,
            PortValue::Bool(_) => PortType::Bool,
        }
    }

    pub fn as_f32(&self) -> f32 {
        match *self {
            PortValue::Float(v) => v,
            PortValue::Int(v) => v as f32,
            PortValue::Bool(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Floats round to the nearest integer; NaN becomes 0.
    pub fn as_i32(&self) -> i32 {
        match *self {
            PortValue::Float(v) if v.is_nan() => 0,
            PortValue::Float(v) => v.round() as i32,
            PortValue::Int(v) => v,
            PortValue::Bool(v) => v as i32,
        }
    }

    /// Numbers are true at 0.5 and above.
    pub fn as_bool(&self) -> bool {
        match *self {
            PortValue::Float(v) => v >= 0.5,
            PortValue::Int(v) => v >= 1,
            PortValue::Bool(v) => v,
        }
    }

    /// Convert to `port_type`.
    pub fn coerce(self, port_type: PortType) -> PortValue {
        match port_type {
            PortType::Float => PortValue::Float(self.as_f32()),
            PortType::Int => PortValue::Int(self.as_i32()),
            PortType::Bool => PortValue::Bool(self.as_bool()),
        }
    }
}

impl fmt::Display for PortValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortValue::Float(v) => write!(f, "{v:.3}"),
            PortValue::Int(v) => write!(f, "{v}"),
            PortValue::Bool(v) => write!(f, "{}", if *v { "on" } else { "off" }),
        }
    }
}

impl From<f32> for PortValue {
    fn from(value: f32) -> Self {
        PortValue::Float(value)
    }
}

impl From<i32> for PortValue {
    fn from(value: i32) -> Self {
        PortValue::Int(value)
    }
}

impl From<bool> for PortValue {
    fn from(value: bool) -> Self {
        PortValue::Bool(value)
    }
}

/// Static description of a port, also used for discovery (MIDI learn, tools).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PortDescriptor {
    pub symbol: String,
    pub name: String,
    pub port_type: PortType,
    pub default: PortValue,
    pub min: Option<PortValue>,
    pub max: Option<PortValue>,
    /// Position in the plugin's port list, offset by the plugin's start index.
    pub index: u32,
}

impl PortDescriptor {
    /// Coerce `value` to this port's type and clamp it to the declared range.
    pub fn normalize(&self, value: PortValue) -> PortValue {
        match value.coerce(self.port_type) {
            PortValue::Float(v) => {
                let v = if v.is_nan() { self.default.as_f32() } else { v };
                let lo = self.min.map_or(f32::NEG_INFINITY, |m| m.as_f32());
                let hi = self.max.map_or(f32::INFINITY, |m| m.as_f32());
                PortValue::Float(v.clamp(lo, hi))
            }
            PortValue::Int(v) => {
                let lo = self.min.map_or(i32::MIN, |m| m.as_i32());
                let hi = self.max.map_or(i32::MAX, |m| m.as_i32());
                PortValue::Int(v.clamp(lo, hi))
            }
            other => other,
        }
    }
}

pub type PortGetter = Box<dyn Fn() -> Option<PortValue> + Send + Sync>;
pub type PortSetter = Box<dyn Fn(PortValue) + Send + Sync>;

/// A port bound to live plugin state.
pub struct ControlPort {
    descriptor: PortDescriptor,
    getter: PortGetter,
    setter: PortSetter,
}

impl ControlPort {
    /// The setter always receives a value already normalized to the descriptor.
    pub fn new(descriptor: PortDescriptor, getter: PortGetter, setter: PortSetter) -> Self {
        Self {
            descriptor,
            getter,
            setter,
        }
    }

    pub fn descriptor(&self) -> &PortDescriptor {
        &self.descriptor
    }

    pub fn symbol(&self) -> &str {
        &self.descriptor.symbol
    }

    pub fn port_type(&self) -> PortType {
        self.descriptor.port_type
    }

    pub fn default_value(&self) -> PortValue {
        self.descriptor.default
    }

    /// Current value; `None` when the backing state cannot be read.
    pub fn get(&self) -> Option<PortValue> {
        (self.getter)()
    }

    /// Coerce, clamp and apply. Returns the value actually applied.
    pub fn set(&self, value: PortValue) -> PortValue {
        let value = self.descriptor.normalize(value);
        (self.setter)(value);
        value
    }

    pub fn reset(&self) {
        self.set(self.descriptor.default);
    }
}

impl fmt::Debug for ControlPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlPort")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
