//! Declarative construction of a plugin's port list.
//!
//! ```
//! use std::sync::Arc;
//! use orpheus_dsp::atomic::AtomicParam;
//! use orpheus_dsp::port::PortsBuilder;
//!
//! let gain = Arc::new(AtomicParam::new(0.5));
//! let mut ports = PortsBuilder::new(10);
//! ports.float("gain").default(0.5).range(0.0, 1.0).param(Arc::clone(&gain));
//! ports.boolean("bypass").bind(|| false, |_| {});
//! let ports = ports.build();
//!
//! assert_eq!(ports[0].descriptor().index, 10);
//! assert_eq!(ports[1].descriptor().index, 11);
//! ```

use std::sync::Arc;

use crate::atomic::{AtomicFlag, AtomicInt, ControlValue};
use crate::port::{ControlPort, PortDescriptor, PortType, PortValue};

/// Collects ports in declaration order, numbering them from a start index.
pub struct PortsBuilder {
    next_index: u32,
    ports: Vec<ControlPort>,
}

impl PortsBuilder {
    pub fn new(start_index: u32) -> Self {
        Self {
            next_index: start_index,
            ports: Vec::new(),
        }
    }

    pub fn float(&mut self, symbol: impl Into<String>) -> FloatPortBuilder<'_> {
        let symbol = symbol.into();
        FloatPortBuilder {
            name: symbol.clone(),
            symbol,
            default: 0.0,
            range: None,
            parent: self,
        }
    }

    pub fn int(&mut self, symbol: impl Into<String>) -> IntPortBuilder<'_> {
        let symbol = symbol.into();
        IntPortBuilder {
            name: symbol.clone(),
            symbol,
            default: 0,
            range: None,
            parent: self,
        }
    }

    pub fn boolean(&mut self, symbol: impl Into<String>) -> BoolPortBuilder<'_> {
        let symbol = symbol.into();
        BoolPortBuilder {
            name: symbol.clone(),
            symbol,
            default: false,
            parent: self,
        }
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn build(self) -> Vec<ControlPort> {
        self.ports
    }

    fn push(
        &mut self,
        symbol: String,
        name: String,
        default: PortValue,
        range: Option<(PortValue, PortValue)>,
        getter: impl Fn() -> Option<PortValue> + Send + Sync + 'static,
        setter: impl Fn(PortValue) + Send + Sync + 'static,
    ) {
        let descriptor = PortDescriptor {
            symbol,
            name,
            port_type: default.port_type(),
            default,
            min: range.map(|(lo, _)| lo),
            max: range.map(|(_, hi)| hi),
            index: self.next_index,
        };
        self.next_index += 1;
        self.ports
            .push(ControlPort::new(descriptor, Box::new(getter), Box::new(setter)));
    }
}

pub struct FloatPortBuilder<'a> {
    parent: &'a mut PortsBuilder,
    symbol: String,
    name: String,
    default: f32,
    range: Option<(f32, f32)>,
}

impl FloatPortBuilder<'_> {
    /// Human-readable label. Defaults to the symbol.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn default(mut self, value: f32) -> Self {
        self.default = value;
        self
    }

    pub fn range(mut self, min: f32, max: f32) -> Self {
        self.range = Some((min, max));
        self
    }

    /// Finish the port with explicit getter/setter closures.
    pub fn bind(
        self,
        get: impl Fn() -> f32 + Send + Sync + 'static,
        set: impl Fn(f32) + Send + Sync + 'static,
    ) {
        self.parent.push(
            self.symbol,
            self.name,
            PortValue::Float(self.default),
            self.range
                .map(|(lo, hi)| (PortValue::Float(lo), PortValue::Float(hi))),
            move || Some(PortValue::Float(get())),
            move |value| set(value.as_f32()),
        );
    }

    /// Finish the port backed directly by an atomic.
    pub fn param(self, value: ControlValue) {
        let reader = Arc::clone(&value);
        self.bind(move || reader.get(), move |v| value.set(v));
    }
}

pub struct IntPortBuilder<'a> {
    parent: &'a mut PortsBuilder,
    symbol: String,
    name: String,
    default: i32,
    range: Option<(i32, i32)>,
}

impl IntPortBuilder<'_> {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn default(mut self, value: i32) -> Self {
        self.default = value;
        self
    }

    pub fn range(mut self, min: i32, max: i32) -> Self {
        self.range = Some((min, max));
        self
    }

    pub fn bind(
        self,
        get: impl Fn() -> i32 + Send + Sync + 'static,
        set: impl Fn(i32) + Send + Sync + 'static,
    ) {
        self.parent.push(
            self.symbol,
            self.name,
            PortValue::Int(self.default),
            self.range
                .map(|(lo, hi)| (PortValue::Int(lo), PortValue::Int(hi))),
            move || Some(PortValue::Int(get())),
            move |value| set(value.as_i32()),
        );
    }

    pub fn atomic(self, value: Arc<AtomicInt>) {
        let reader = Arc::clone(&value);
        self.bind(move || reader.get(), move |v| value.set(v));
    }
}

pub struct BoolPortBuilder<'a> {
    parent: &'a mut PortsBuilder,
    symbol: String,
    name: String,
    default: bool,
}

impl BoolPortBuilder<'_> {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn default(mut self, value: bool) -> Self {
        self.default = value;
        self
    }

    pub fn bind(
        self,
        get: impl Fn() -> bool + Send + Sync + 'static,
        set: impl Fn(bool) + Send + Sync + 'static,
    ) {
        self.parent.push(
            self.symbol,
            self.name,
            PortValue::Bool(self.default),
            None,
            move || Some(PortValue::Bool(get())),
            move |value| set(value.as_bool()),
        );
    }

    pub fn flag(self, value: Arc<AtomicFlag>) {
        let reader = Arc::clone(&value);
        self.bind(move || reader.get(), move |v| value.set(v));
    }
}
