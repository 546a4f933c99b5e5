use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::atomic::{AtomicFlag, AtomicInt, AtomicParam, ControlValue};
use crate::engine::{AudioEngine, EngineHandle};
use crate::error::{Error, Result};
use crate::plugin::{AudioEndpoints, DspPlugin};
use crate::port::{ControlPort, PortsBuilder};
use crate::unit::arithmetic::{INPUT_A, INPUT_B, INPUT_C};
use crate::unit::oscillator::FREQUENCY;
use crate::unit::{
    pass_through, Add, Maximum, Minimum, Multiply, MultiplyAdd, Oscillator, OutputId,
    PassThrough, UnitId,
};

pub const URI: &str = "org.orpheus.duolfo";
const PORT_START_INDEX: u32 = 100;

/*
Duo-LFO Patch
=============

Two LFOs (A and B), each running as a square AND a triangle oscillator,
merged with logic (see `dsp/lfo.rs` for the maths):

  SQUARE branch, product logic in the unipolar domain

    sqA ─▶ ×0.5+0.5 ─ ua ─┬─▶ ua·ub ───────────┬─▶ ×2-1 ─▶ AND
    sqB ─▶ ×0.5+0.5 ─ ub ─┤                    │
                          └─▶ ua+ub ─▶ −(ua·ub)┴─▶ ×2-1 ─▶ OR

  TRIANGLE branch, fuzzy logic directly on bipolar signals

    triA, triB ─▶ MIN ─▶ AND
    triA, triB ─▶ MAX ─▶ OR

  Output proxy

    [selected branch] ─▶ PassThrough ─▶ "output"


Switching By Rewiring
---------------------

Mode (AND/OFF/OR) and waveform (square/triangle) changes DISCONNECT the
proxy's single input and reconnect it to the matching branch. Only that
branch is pulled by the engine, so the other three cost nothing and keep
their own oscillator phase until selected again.

OFF sets the proxy's constant to 0 first, then disconnects: the output is
a static zero, not a gain of zero on a still-running signal.


Link
----

LFO A's square feeds B's square frequency:

    freqB' = sqA · depth + freqB        depth = freqB · 0.5 when linked, else 0

Triangles are never linked.
*/

/// Logic mode. The discriminants are the `mode` port values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuoLfoMode {
    And = 0,
    Off = 1,
    Or = 2,
}

impl DuoLfoMode {
    pub fn from_index(index: i32) -> Self {
        match index {
            i32::MIN..=0 => DuoLfoMode::And,
            1 => DuoLfoMode::Off,
            _ => DuoLfoMode::Or,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DuoLfoMode::And => "AND",
            DuoLfoMode::Off => "OFF",
            DuoLfoMode::Or => "OR",
        }
    }
}

/// Branch outputs and the proxy, known once the plugin is initialized.
struct Wiring {
    proxy: UnitId,
    and_square: OutputId,
    or_square: OutputId,
    and_triangle: OutputId,
    or_triangle: OutputId,
}

struct Shared {
    handle: EngineHandle,
    freq_a: ControlValue,
    freq_b: ControlValue,
    link_depth: ControlValue,
    proxy_constant: OnceLock<ControlValue>,
    mode: AtomicInt,
    triangle: AtomicFlag,
    linked: AtomicFlag,
    wiring: OnceLock<Wiring>,
    reconnect_lock: Mutex<()>,
}

impl Shared {
    fn mode(&self) -> DuoLfoMode {
        DuoLfoMode::from_index(self.mode.get())
    }

    fn update_link_depth(&self) {
        let depth = if self.linked.get() {
            self.freq_b.get() * 0.5
        } else {
            0.0
        };
        self.link_depth.set(depth);
    }

    /// Point the proxy at the branch matching the current state.
    fn reconnect(&self) {
        let Some(wiring) = self.wiring.get() else {
            return;
        };
        // Serializes compute-and-push so two setters can't interleave their commands
        let _guard = self.reconnect_lock.lock();
        let proxy_input = wiring.proxy.input(pass_through::INPUT);

        let source = match (self.mode(), self.triangle.get()) {
            (DuoLfoMode::Off, _) => None,
            (DuoLfoMode::And, false) => Some(wiring.and_square),
            (DuoLfoMode::Or, false) => Some(wiring.or_square),
            (DuoLfoMode::And, true) => Some(wiring.and_triangle),
            (DuoLfoMode::Or, true) => Some(wiring.or_triangle),
        };

        let result = match source {
            Some(source) => self.handle.connect(source, proxy_input),
            None => {
                if let Some(constant) = self.proxy_constant.get() {
                    constant.set(0.0);
                }
                self.handle.disconnect(proxy_input)
            }
        };
        if let Err(err) = result {
            warn!(%err, mode = self.mode().label(), "duo-lfo reconnect failed");
        }
    }
}

/// Two LFOs combined with AND/OR logic into one modulation output.
pub struct DuoLfoPlugin {
    shared: Arc<Shared>,
    ports: Vec<ControlPort>,
    endpoints: AudioEndpoints,
}

impl DuoLfoPlugin {
    pub fn new(handle: EngineHandle) -> Self {
        let shared = Arc::new(Shared {
            handle,
            freq_a: Arc::new(AtomicParam::new(0.5)),
            freq_b: Arc::new(AtomicParam::new(0.75)),
            link_depth: Arc::new(AtomicParam::new(0.0)),
            proxy_constant: OnceLock::new(),
            mode: AtomicInt::new(DuoLfoMode::And as i32),
            triangle: AtomicFlag::new(true),
            linked: AtomicFlag::new(false),
            wiring: OnceLock::new(),
            reconnect_lock: Mutex::new(()),
        });

        let mut ports = PortsBuilder::new(PORT_START_INDEX);
        ports
            .float("freq_a")
            .name("LFO A Rate")
            .default(0.5)
            .range(0.01, 20.0)
            .param(Arc::clone(&shared.freq_a));

        let (get, set) = (Arc::clone(&shared), Arc::clone(&shared));
        ports
            .float("freq_b")
            .name("LFO B Rate")
            .default(0.75)
            .range(0.01, 20.0)
            .bind(
                move || get.freq_b.get(),
                move |hz| {
                    set.freq_b.set(hz);
                    set.update_link_depth();
                },
            );

        let (get, set) = (Arc::clone(&shared), Arc::clone(&shared));
        ports
            .int("mode")
            .name("Logic Mode")
            .default(DuoLfoMode::And as i32)
            .range(0, 2)
            .bind(
                move || get.mode.get(),
                move |mode| {
                    set.mode.set(mode);
                    set.reconnect();
                },
            );

        let (get, set) = (Arc::clone(&shared), Arc::clone(&shared));
        ports.boolean("triangle").name("Triangle").default(true).bind(
            move || get.triangle.get(),
            move |on| {
                set.triangle.set(on);
                set.reconnect();
            },
        );

        let (get, set) = (Arc::clone(&shared), Arc::clone(&shared));
        ports.boolean("link").name("Link A→B").default(false).bind(
            move || get.linked.get(),
            move |on| {
                set.linked.set(on);
                set.update_link_depth();
            },
        );

        Self {
            shared,
            ports: ports.build(),
            endpoints: AudioEndpoints::new(),
        }
    }

    pub fn mode(&self) -> DuoLfoMode {
        self.shared.mode()
    }

    pub fn set_mode(&self, mode: DuoLfoMode) {
        self.shared.mode.set(mode as i32);
        self.shared.reconnect();
    }

    pub fn is_triangle_mode(&self) -> bool {
        self.shared.triangle.get()
    }

    pub fn set_triangle_mode(&self, triangle: bool) {
        self.shared.triangle.set(triangle);
        self.shared.reconnect();
    }

    pub fn is_linked(&self) -> bool {
        self.shared.linked.get()
    }

    pub fn set_link(&self, linked: bool) {
        self.shared.linked.set(linked);
        self.shared.update_link_depth();
    }

    /// Current FM depth applied from A's square to B's square, in Hz.
    pub fn link_depth(&self) -> f32 {
        self.shared.link_depth.get()
    }

    pub fn output(&self) -> Option<OutputId> {
        self.endpoints.output("output")
    }
}

fn unipolar(engine: &mut AudioEngine, source: UnitId) -> Result<UnitId> {
    let unit = engine.add(MultiplyAdd::new())?;
    engine.connect(source.output(), unit.input(INPUT_A))?;
    engine.set_constant(unit.input(INPUT_B), 0.5)?;
    engine.set_constant(unit.input(INPUT_C), 0.5)?;
    Ok(unit)
}

fn bipolar(engine: &mut AudioEngine, source: UnitId) -> Result<UnitId> {
    let unit = engine.add(MultiplyAdd::new())?;
    engine.connect(source.output(), unit.input(INPUT_A))?;
    engine.set_constant(unit.input(INPUT_B), 2.0)?;
    engine.set_constant(unit.input(INPUT_C), -1.0)?;
    Ok(unit)
}

fn combine(engine: &mut AudioEngine, unit: UnitId, a: UnitId, b: UnitId) -> Result<UnitId> {
    engine.connect(a.output(), unit.input(INPUT_A))?;
    engine.connect(b.output(), unit.input(INPUT_B))?;
    Ok(unit)
}

impl DspPlugin for DuoLfoPlugin {
    fn uri(&self) -> &str {
        URI
    }

    fn initialize(&mut self, engine: &mut AudioEngine) -> Result<()> {
        if self.shared.wiring.get().is_some() {
            return Err(Error::AlreadyInitialized(URI.to_string()));
        }
        let shared = &self.shared;

        let square_a = engine.add(Oscillator::square())?;
        let triangle_a = engine.add(Oscillator::triangle())?;
        let square_b = engine.add(Oscillator::square())?;
        let triangle_b = engine.add(Oscillator::triangle())?;
        engine.bind_constant(square_a.input(FREQUENCY), Arc::clone(&shared.freq_a))?;
        engine.bind_constant(triangle_a.input(FREQUENCY), Arc::clone(&shared.freq_a))?;
        engine.bind_constant(triangle_b.input(FREQUENCY), Arc::clone(&shared.freq_b))?;

        let link = engine.add(MultiplyAdd::new())?;
        engine.connect(square_a.output(), link.input(INPUT_A))?;
        engine.bind_constant(link.input(INPUT_B), Arc::clone(&shared.link_depth))?;
        engine.bind_constant(link.input(INPUT_C), Arc::clone(&shared.freq_b))?;
        engine.connect(link.output(), square_b.input(FREQUENCY))?;

        let ua = unipolar(engine, square_a)?;
        let ub = unipolar(engine, square_b)?;
        let and_u = engine.add(Multiply::new())?;
        let and_u = combine(engine, and_u, ua, ub)?;
        let sum = engine.add(Add::new())?;
        let sum = combine(engine, sum, ua, ub)?;
        // or = (ua + ub) - ua·ub
        let or_u = engine.add(MultiplyAdd::new())?;
        engine.connect(and_u.output(), or_u.input(INPUT_A))?;
        engine.set_constant(or_u.input(INPUT_B), -1.0)?;
        engine.connect(sum.output(), or_u.input(INPUT_C))?;
        let and_square = bipolar(engine, and_u)?;
        let or_square = bipolar(engine, or_u)?;

        let min = engine.add(Minimum::new())?;
        let and_triangle = combine(engine, min, triangle_a, triangle_b)?;
        let max = engine.add(Maximum::new())?;
        let or_triangle = combine(engine, max, triangle_a, triangle_b)?;

        let proxy = engine.add(PassThrough::new())?;
        let proxy_constant = engine.constant(proxy.input(pass_through::INPUT))?;

        let wiring = Wiring {
            proxy,
            and_square: and_square.output(),
            or_square: or_square.output(),
            and_triangle: and_triangle.output(),
            or_triangle: or_triangle.output(),
        };
        if shared.wiring.set(wiring).is_err()
            || shared.proxy_constant.set(proxy_constant).is_err()
        {
            return Err(Error::AlreadyInitialized(URI.to_string()));
        }
        self.endpoints.add_output("output", proxy.output());

        shared.update_link_depth();
        shared.reconnect();
        engine.apply_pending_commands();
        debug!(
            uri = URI,
            mode = shared.mode().label(),
            triangle = shared.triangle.get(),
            "plugin initialized"
        );
        Ok(())
    }

    fn ports(&self) -> &[ControlPort] {
        &self.ports
    }

    fn endpoints(&self) -> &AudioEndpoints {
        &self.endpoints
    }
}
