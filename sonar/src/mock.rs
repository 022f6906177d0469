//! Host-side stand-ins for the timer and the runtime.

use crate::capture::{EdgeState, Phase};
use crate::isr::{on_interrupt, IsrOutcome};
use crate::signal::BinarySignal;
use crate::state::{SonarState, Stage};
use crate::task::Scheduler;
use crate::timer::{
    Edge, EdgeCapture, IrqSource, Polarity, PulseGenerator, SharedTimer, TimerBase,
};
use embedded_hal::blocking::delay::DelayMs;
use fugit::MillisDurationU32;
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Disable,
    Enable,
    PinOutput,
    PinInput,
    Base(u16, u16),
    Pulse(u16, Polarity),
    Capture(Edge),
    Listen(IrqSource),
    Unlisten(IrqSource),
    Clear(IrqSource),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerMode {
    Off,
    Pulse,
    Capture,
}

#[derive(Debug)]
pub struct MockTimer {
    pub enabled: bool,
    pub mode: TimerMode,
    pub edge: Option<Edge>,
    pub pending_update: bool,
    pub pending_capture: bool,
    pub listening_update: bool,
    pub listening_capture: bool,
    pub capture_value: u16,
    pub reconfigured_while_enabled: usize,
    pub ops: Vec<Op>,
}

impl MockTimer {
    pub fn new() -> Self {
        MockTimer {
            enabled: false,
            mode: TimerMode::Off,
            edge: None,
            pending_update: false,
            pending_capture: false,
            listening_update: false,
            listening_capture: false,
            capture_value: 0,
            reconfigured_while_enabled: 0,
            ops: Vec::new(),
        }
    }

    /// Simulate the channel latching the counter.
    pub fn latch(&mut self, counter: u16) {
        self.capture_value = counter;
        self.pending_capture = true;
    }

    fn reconfigure(&mut self, op: Op) {
        if self.enabled {
            self.reconfigured_while_enabled += 1;
        }
        self.ops.push(op);
    }
}

impl TimerBase for MockTimer {
    fn disable(&mut self) {
        self.enabled = false;
        self.ops.push(Op::Disable);
    }

    fn enable(&mut self) {
        self.enabled = true;
        self.ops.push(Op::Enable);
    }

    fn configure_base(&mut self, prescaler: u16, period: u16) {
        self.reconfigure(Op::Base(prescaler, period));
    }

    fn listen(&mut self, source: IrqSource) {
        match source {
            IrqSource::Update => self.listening_update = true,
            IrqSource::Capture => self.listening_capture = true,
        }
        self.ops.push(Op::Listen(source));
    }

    fn unlisten(&mut self, source: IrqSource) {
        match source {
            IrqSource::Update => self.listening_update = false,
            IrqSource::Capture => self.listening_capture = false,
        }
        self.ops.push(Op::Unlisten(source));
    }

    fn is_interrupt_pending(&self, source: IrqSource) -> bool {
        match source {
            IrqSource::Update => self.pending_update,
            IrqSource::Capture => self.pending_capture,
        }
    }

    fn clear_interrupt(&mut self, source: IrqSource) {
        match source {
            IrqSource::Update => self.pending_update = false,
            IrqSource::Capture => self.pending_capture = false,
        }
        self.ops.push(Op::Clear(source));
    }
}

impl PulseGenerator for MockTimer {
    fn configure_pin_output(&mut self) {
        self.reconfigure(Op::PinOutput);
    }

    fn configure_pulse_channel(&mut self, pulse: u16, polarity: Polarity) {
        self.mode = TimerMode::Pulse;
        self.edge = None;
        self.reconfigure(Op::Pulse(pulse, polarity));
    }
}

impl EdgeCapture for MockTimer {
    fn configure_pin_input(&mut self) {
        self.reconfigure(Op::PinInput);
    }

    fn configure_capture_channel(&mut self, edge: Edge) {
        // Flipping the edge on a running capture is allowed.
        self.mode = TimerMode::Capture;
        self.edge = Some(edge);
        self.ops.push(Op::Capture(edge));
    }

    fn read_capture_value(&self) -> u16 {
        self.capture_value
    }
}

/// Hardware activity injected while the task waits. Events are delivered
/// whether or not the timer listens for them, to exercise stray interrupts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HwEvent {
    Update,
    Compare,
    Edge(u16),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitRecord {
    pub stage: Stage,
    pub phase: Phase,
    pub edge: EdgeState,
    pub timeout: MillisDurationU32,
}

/// Runs the interrupt handler for a scripted list of events on every wait.
/// A wait with no script left behaves as a timeout. Every distinct stage seen
/// during waits and delays is appended to `stages`.
pub struct ScriptedScheduler<'a> {
    timer: &'a SharedTimer<MockTimer>,
    state: &'a SonarState,
    script: VecDeque<Vec<HwEvent>>,
    pub waits: Vec<WaitRecord>,
    pub interrupts: Vec<IsrOutcome>,
    pub delays: Vec<u32>,
    pub stages: Vec<Stage>,
}

impl<'a> ScriptedScheduler<'a> {
    pub fn new(
        timer: &'a SharedTimer<MockTimer>,
        state: &'a SonarState,
        script: Vec<Vec<HwEvent>>,
    ) -> Self {
        ScriptedScheduler {
            timer,
            state,
            script: script.into(),
            waits: Vec::new(),
            interrupts: Vec::new(),
            delays: Vec::new(),
            stages: Vec::new(),
        }
    }

    fn trace_stage(&mut self) {
        let stage = self.state.stage();
        if self.stages.last() != Some(&stage) {
            self.stages.push(stage);
        }
    }
}

impl<'a> Scheduler for ScriptedScheduler<'a> {
    fn wait(&mut self, signal: &BinarySignal, timeout: MillisDurationU32) -> bool {
        self.trace_stage();
        self.waits.push(WaitRecord {
            stage: self.state.stage(),
            phase: self.state.phase(),
            edge: self.state.edge_state(),
            timeout,
        });

        let events = self.script.pop_front().unwrap_or_default();
        for event in events {
            let state = self.state;
            let outcome = self
                .timer
                .with(|timer| {
                    match event {
                        HwEvent::Update => timer.pending_update = true,
                        HwEvent::Compare => timer.pending_capture = true,
                        HwEvent::Edge(counter) => timer.latch(counter),
                    }
                    on_interrupt(timer, state.capture_side(), signal)
                })
                .expect("timer installed");
            self.interrupts.push(outcome);
            self.trace_stage();
        }

        signal.try_take().is_ok()
    }
}

impl<'a> DelayMs<u32> for ScriptedScheduler<'a> {
    fn delay_ms(&mut self, ms: u32) {
        self.trace_stage();
        self.delays.push(ms);
    }
}
