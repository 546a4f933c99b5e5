//! Every controllable parameter in the system, addressed by qualified symbol.
//!
//! Presets, MIDI mapping and automation all come through here. The index is
//! built lazily on first use from the fixed plugin set; plugins can't be
//! added or removed afterwards.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

use tracing::{debug, trace, warn};

use crate::plugin::DspPlugin;
use crate::port::{ControlPort, PortDescriptor, PortValue, QualifiedSymbol};

/// A captured state: qualified symbol → value. Sorted for stable output.
pub type Preset = BTreeMap<String, PortValue>;

/// Where a qualified symbol points: plugin and port position.
#[derive(Debug, Clone, Copy)]
struct PortRef {
    plugin: usize,
    port: usize,
}

/// A port's descriptor together with its system-wide key.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedDescriptor {
    pub qualified_symbol: String,
    pub descriptor: PortDescriptor,
}

pub struct PortRegistry {
    plugins: Vec<Arc<dyn DspPlugin>>,
    index: OnceLock<HashMap<String, PortRef>>,
}

impl PortRegistry {
    pub fn new(plugins: Vec<Arc<dyn DspPlugin>>) -> Self {
        Self {
            plugins,
            index: OnceLock::new(),
        }
    }

    pub fn plugins(&self) -> &[Arc<dyn DspPlugin>] {
        &self.plugins
    }

    pub fn plugin(&self, uri: &str) -> Option<&Arc<dyn DspPlugin>> {
        self.plugins.iter().find(|plugin| plugin.uri() == uri)
    }

    fn index(&self) -> &HashMap<String, PortRef> {
        self.index.get_or_init(|| {
            let mut index = HashMap::new();
            for (p, plugin) in self.plugins.iter().enumerate() {
                for (i, port) in plugin.ports().iter().enumerate() {
                    let key = QualifiedSymbol::new(plugin.uri(), port.symbol()).to_string();
                    // Last registration wins
                    if index.insert(key.clone(), PortRef { plugin: p, port: i }).is_some() {
                        warn!(symbol = %key, "qualified symbol collision, earlier port shadowed");
                    }
                }
            }
            debug!(plugins = self.plugins.len(), ports = index.len(), "port index built");
            index
        })
    }

    fn resolve(&self, qualified: &str) -> Option<&ControlPort> {
        let port = self.index().get(qualified)?;
        self.plugins.get(port.plugin)?.ports().get(port.port)
    }

    /// Number of addressable ports.
    pub fn len(&self) -> usize {
        self.index().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index().is_empty()
    }

    pub fn contains(&self, qualified: &str) -> bool {
        self.index().contains_key(qualified)
    }

    /// Set by qualified symbol. `false` for a malformed symbol or unknown
    /// plugin/port; out-of-range values are clamped, never rejected.
    pub fn set_port_value(&self, qualified: &str, value: PortValue) -> bool {
        match QualifiedSymbol::parse(qualified) {
            Some(symbol) => self.set(&symbol, value),
            None => false,
        }
    }

    pub fn get_port_value(&self, qualified: &str) -> Option<PortValue> {
        self.get(&QualifiedSymbol::parse(qualified)?)
    }

    /// Typed-key variant of [`set_port_value`](Self::set_port_value).
    pub fn set(&self, symbol: &QualifiedSymbol, value: PortValue) -> bool {
        match self.resolve(&symbol.to_string()) {
            Some(port) => {
                port.set(value);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, symbol: &QualifiedSymbol) -> Option<PortValue> {
        self.resolve(&symbol.to_string())?.get()
    }

    /// Snapshot of every port. Ports whose getter yields nothing are skipped.
    pub fn capture_state(&self) -> Preset {
        self.index()
            .iter()
            .filter_map(|(key, port)| {
                let value = self.plugins.get(port.plugin)?.ports().get(port.port)?.get()?;
                Some((key.clone(), value))
            })
            .collect()
    }

    /// Reset every port to its default, then apply `values`.
    ///
    /// Afterwards each port holds either its default or a value from
    /// `values`, never anything left over from an earlier state. Unknown
    /// keys are ignored so older or partial presets always load.
    ///
    /// Both phases walk the plugins in registration order, so a port whose
    /// setter writes through to a later plugin's port (the voice plugin's
    /// `feedback` driving the delay's) is overridden by that port's own
    /// preset value.
    pub fn restore_state(&self, values: &Preset) {
        for plugin in &self.plugins {
            for port in plugin.ports() {
                port.reset();
            }
        }

        let index = self.index();
        for (p, plugin) in self.plugins.iter().enumerate() {
            for (i, port) in plugin.ports().iter().enumerate() {
                let key = QualifiedSymbol::new(plugin.uri(), port.symbol()).to_string();
                let Some(value) = values.get(&key) else {
                    continue;
                };
                // Shadowed ports are not addressable
                if index.get(&key).is_some_and(|r| r.plugin == p && r.port == i) {
                    port.set(*value);
                }
            }
        }
        for key in values.keys().filter(|key| !index.contains_key(*key)) {
            trace!(symbol = %key, "ignoring unknown preset key");
        }
    }

    /// Every port's descriptor, ordered by plugin then declaration.
    pub fn descriptors(&self) -> Vec<QualifiedDescriptor> {
        self.plugins
            .iter()
            .flat_map(|plugin| {
                plugin.ports().iter().map(move |port| QualifiedDescriptor {
                    qualified_symbol: QualifiedSymbol::new(plugin.uri(), port.symbol()).to_string(),
                    descriptor: port.descriptor().clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AudioEngine;
    use crate::error::Result;
    use crate::plugin::AudioEndpoints;
    use crate::port::{PortDescriptor, PortType, PortsBuilder};

    /// A plugin whose ports are whatever the test hands it.
    struct Fixture {
        uri: &'static str,
        ports: Vec<ControlPort>,
        endpoints: AudioEndpoints,
    }

    impl DspPlugin for Fixture {
        fn uri(&self) -> &str {
            self.uri
        }

        fn initialize(&mut self, _engine: &mut AudioEngine) -> Result<()> {
            Ok(())
        }

        fn ports(&self) -> &[ControlPort] {
            &self.ports
        }

        fn endpoints(&self) -> &AudioEndpoints {
            &self.endpoints
        }
    }

    fn fixture(uri: &'static str, ports: Vec<ControlPort>) -> Arc<dyn DspPlugin> {
        Arc::new(Fixture {
            uri,
            ports,
            endpoints: AudioEndpoints::new(),
        })
    }

    fn gain_port(start: u32, value: &Arc<crate::atomic::AtomicParam>) -> Vec<ControlPort> {
        let mut ports = PortsBuilder::new(start);
        ports.float("gain").default(0.5).range(0.0, 1.0).param(Arc::clone(value));
        ports.build()
    }

    #[test]
    fn uri_with_colons_resolves() {
        let gain = Arc::new(crate::atomic::AtomicParam::new(0.5));
        let registry = PortRegistry::new(vec![fixture("urn:test:amp", gain_port(0, &gain))]);
        assert!(registry.set_port_value("urn:test:amp:gain", PortValue::Float(0.2)));
        assert_eq!(gain.get(), 0.2);
        assert!(registry.contains("urn:test:amp:gain"));
    }

    #[test]
    fn collision_keeps_last_plugin() {
        let first = Arc::new(crate::atomic::AtomicParam::new(0.5));
        let second = Arc::new(crate::atomic::AtomicParam::new(0.5));
        let registry = PortRegistry::new(vec![
            fixture("amp", gain_port(0, &first)),
            fixture("amp", gain_port(10, &second)),
        ]);
        assert_eq!(registry.len(), 1);

        registry.restore_state(&Preset::from([("amp:gain".to_string(), PortValue::Float(0.9))]));
        assert_eq!(second.get(), 0.9);
    }

    #[test]
    fn capture_skips_unreadable_ports() {
        let descriptor = PortDescriptor {
            symbol: "ghost".into(),
            name: "Ghost".into(),
            port_type: PortType::Float,
            default: PortValue::Float(0.0),
            min: None,
            max: None,
            index: 0,
        };
        let ghost = ControlPort::new(descriptor, Box::new(|| None), Box::new(|_| {}));
        let gain = Arc::new(crate::atomic::AtomicParam::new(0.5));
        let mut ports = gain_port(1, &gain);
        ports.push(ghost);

        let registry = PortRegistry::new(vec![fixture("amp", ports)]);
        let state = registry.capture_state();
        assert_eq!(state.len(), 1);
        assert_eq!(state.get("amp:gain"), Some(&PortValue::Float(0.5)));
    }

    #[test]
    fn descriptors_carry_qualified_symbols() {
        let gain = Arc::new(crate::atomic::AtomicParam::new(0.5));
        let registry = PortRegistry::new(vec![fixture("amp", gain_port(7, &gain))]);
        let descriptors = registry.descriptors();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].qualified_symbol, "amp:gain");
        assert_eq!(descriptors[0].descriptor.index, 7);
        assert_eq!(descriptors[0].descriptor.max, Some(PortValue::Float(1.0)));
    }
}
