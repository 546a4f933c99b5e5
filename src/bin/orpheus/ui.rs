//! Terminal UI: port browser, meter and scope
//!
//! The synth lives on this thread; every edit goes through the port
//! registry, which only touches atomics and the engine's command queue.

use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, List, ListItem, ListState,
        Paragraph,
    },
    DefaultTerminal, Frame,
};
use rtrb::Consumer;
use tracing::debug;

use orpheus_dsp::registry::QualifiedDescriptor;
use orpheus_dsp::{PortType, PortValue, Preset, SynthEngine};

/// Samples shown by the scope
pub const SCOPE_CAPACITY: usize = 1024;

/// Voices the space bar plays
const KEYBOARD_VOICES: usize = 4;

/// Float ports move by this fraction of their range per key press.
const FLOAT_STEPS: f32 = 100.0;

pub struct UiApp {
    synth: SynthEngine,
    descriptors: Vec<QualifiedDescriptor>,
    list_state: ListState,
    scope_rx: Consumer<f32>,
    scope: Vec<f32>,
    sample_rate: f32,
    gates_open: bool,
    snapshot: Option<Preset>,
    status: String,
    should_quit: bool,
}

impl UiApp {
    pub fn new(synth: SynthEngine, scope_rx: Consumer<f32>, sample_rate: f32) -> Self {
        let descriptors = synth.registry().descriptors();
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            synth,
            descriptors,
            list_state,
            scope_rx,
            scope: vec![0.0; SCOPE_CAPACITY],
            sample_rate,
            gates_open: false,
            snapshot: None,
            status: String::new(),
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_scope();
            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }
        Ok(())
    }

    fn poll_scope(&mut self) {
        while let Ok(sample) = self.scope_rx.pop() {
            self.scope.push(sample);
        }
        if self.scope.len() > SCOPE_CAPACITY {
            let excess = self.scope.len() - SCOPE_CAPACITY;
            self.scope.drain(0..excess);
        }
    }

    fn selected(&self) -> Option<&QualifiedDescriptor> {
        self.descriptors.get(self.list_state.selected()?)
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up => self.list_state.select_previous(),
            KeyCode::Down => self.list_state.select_next(),
            KeyCode::Left => self.nudge(-1.0),
            KeyCode::Right => self.nudge(1.0),
            KeyCode::Char(' ') => {
                self.gates_open = !self.gates_open;
                for voice in 0..KEYBOARD_VOICES {
                    self.synth.set_gate(voice, self.gates_open);
                }
            }
            KeyCode::Char('s') => {
                let preset = self.synth.registry().capture_state();
                self.status = format!("snapshot: {} ports", preset.len());
                self.snapshot = Some(preset);
            }
            KeyCode::Char('r') => match &self.snapshot {
                Some(preset) => {
                    self.synth.registry().restore_state(preset);
                    self.status = "snapshot restored".to_string();
                }
                None => self.status = "no snapshot yet".to_string(),
            },
            KeyCode::Char('d') => {
                self.synth.registry().restore_state(&Preset::new());
                self.status = "defaults restored".to_string();
            }
            _ => {}
        }
    }

    /// Step the selected port one notch in `direction`.
    fn nudge(&mut self, direction: f32) {
        let Some(port) = self.selected() else {
            return;
        };
        let registry = self.synth.registry();
        let key = port.qualified_symbol.clone();
        let descriptor = &port.descriptor;
        let current = registry
            .get_port_value(&key)
            .unwrap_or(descriptor.default);

        let next = match descriptor.port_type {
            PortType::Bool => PortValue::Bool(!current.as_bool()),
            PortType::Int => PortValue::Int(current.as_i32() + direction as i32),
            PortType::Float => {
                let (min, max) = match (descriptor.min, descriptor.max) {
                    (Some(min), Some(max)) => (min.as_f32(), max.as_f32()),
                    _ => (0.0, 1.0),
                };
                let step = (max - min) / FLOAT_STEPS;
                PortValue::Float(current.as_f32() + direction * step)
            }
        };
        registry.set_port_value(&key, next);
        debug!(symbol = %key, ?next, "port nudged");
    }

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status
                Constraint::Length(3), // Meter
                Constraint::Min(8),    // Ports
                Constraint::Length(8), // Scope
                Constraint::Length(1), // Help
            ])
            .split(frame.area());

        self.render_status(frame, chunks[0]);
        self.render_meter(frame, chunks[1]);
        self.render_ports(frame, chunks[2]);
        render_scope(frame, chunks[3], &self.scope);

        let help = Paragraph::new(
            " [↑↓] Select  [←→] Adjust  [Space] Gate  [S] Snapshot  [R] Restore  [D] Defaults  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[4]);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let lfo = self.synth.duo_lfo();
        let shape = if lfo.is_triangle_mode() { "triangle" } else { "square" };
        let link = if lfo.is_linked() { "linked" } else { "free" };
        let gate = if self.gates_open { "● gate" } else { "○ gate" };

        let line = Line::from(vec![
            Span::styled(
                format!(" {:.1}kHz  ", self.sample_rate / 1000.0),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                format!("{gate}  "),
                Style::default().fg(if self.gates_open { Color::Green } else { Color::Yellow }),
            ),
            Span::styled(
                format!("duo-lfo: {} {} {}  ", lfo.mode().label(), shape, link),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(self.status.clone(), Style::default().fg(Color::Magenta)),
        ]);
        let block = Block::default().title(" orpheus ").borders(Borders::ALL);
        frame.render_widget(Paragraph::new(line).block(block), area);
    }

    fn render_meter(&self, frame: &mut Frame, area: Rect) {
        let peak = self.synth.peak_level().abs().min(1.0);
        let color = if peak > 0.9 { Color::Red } else { Color::Green };
        let gauge = Gauge::default()
            .block(Block::default().title(" Peak ").borders(Borders::ALL))
            .gauge_style(Style::default().fg(color))
            .ratio(f64::from(peak))
            .label(format!("{peak:.2}"));
        frame.render_widget(gauge, area);
    }

    fn render_ports(&mut self, frame: &mut Frame, area: Rect) {
        let registry = self.synth.registry();
        let items: Vec<ListItem> = self
            .descriptors
            .iter()
            .map(|port| {
                let value = registry
                    .get_port_value(&port.qualified_symbol)
                    .map_or_else(|| "-".to_string(), |value| value.to_string());
                ListItem::new(Line::from(vec![
                    Span::raw(format!("{:<44}", port.qualified_symbol)),
                    Span::styled(value, Style::default().fg(Color::Cyan)),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!(" Ports ({}) ", self.descriptors.len()))
                    .borders(Borders::ALL),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, area, &mut self.list_state);
    }
}

fn render_scope(frame: &mut Frame, area: Rect, samples: &[f32]) {
    let data: Vec<(f64, f64)> = samples
        .iter()
        .enumerate()
        .map(|(i, &sample)| (i as f64 / samples.len() as f64, f64::from(sample)))
        .collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(Block::default().title(" Scope ").borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-1.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(chart, area);
}
