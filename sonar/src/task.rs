//! Periodic measurement task.

use crate::capture::EdgeState;
use crate::config::{Config, TimerTiming};
use crate::distance::{ticks_to_cm, BAD_VALUE};
use crate::signal::BinarySignal;
use crate::state::{SonarState, Stage, TaskSide};
use crate::timer::{start_echo_capture, start_trigger_pulse, SharedTimer, SonarTimer};
use embedded_hal::blocking::delay::DelayMs;
use fugit::MillisDurationU32;

/// Blocking wait used by the task, provided by the runtime it runs under.
pub trait Scheduler {
    /// Wait until `signal` is given or `timeout` expires. Returns `true` if
    /// the signal was taken.
    fn wait(&mut self, signal: &BinarySignal, timeout: MillisDurationU32) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    Measured(i32),
    /// The trigger pulse never completed.
    TriggerTimeout,
    /// No echo started within the timeout: nothing in range.
    NoEcho,
    /// Echo started but didn't end within the timeout.
    OutOfRange,
}

impl CycleOutcome {
    /// Value published for this outcome.
    pub fn distance_cm(&self) -> i32 {
        match *self {
            CycleOutcome::Measured(cm) => cm,
            _ => BAD_VALUE,
        }
    }
}

pub struct MeasurementTask<'a, T, S> {
    timer: &'a SharedTimer<T>,
    state: TaskSide<'a>,
    signal: &'a BinarySignal,
    scheduler: S,
    config: Config,
    timing: TimerTiming,
}

impl<'a, T, S> MeasurementTask<'a, T, S>
where
    T: SonarTimer,
    S: Scheduler + DelayMs<u32>,
{
    pub fn new(
        timer: &'a SharedTimer<T>,
        state: &'a SonarState,
        signal: &'a BinarySignal,
        scheduler: S,
        config: Config,
        timing: TimerTiming,
    ) -> Self {
        MeasurementTask {
            timer,
            state: state.task_side(),
            signal,
            scheduler,
            config,
            timing,
        }
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    pub fn release(self) -> S {
        self.scheduler
    }

    /// Run one cycle: measure, publish, then sleep the inter-measurement
    /// delay. Exactly one value is published per cycle.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        let outcome = self.measure();

        self.state.enter(Stage::Publishing);
        self.state.publish(outcome.distance_cm());
        self.scheduler.delay_ms(self.config.measurement_delay.ticks());
        self.state.enter(Stage::Idle);

        outcome
    }

    /// Measure forever, reporting each cycle to `report`.
    pub fn run(mut self, mut report: impl FnMut(CycleOutcome)) -> ! {
        loop {
            let outcome = self.run_cycle();
            report(outcome);
        }
    }

    fn measure(&mut self) -> CycleOutcome {
        let state = self.state;
        let signal = self.signal;
        let timing = self.timing;

        state.enter(Stage::Triggering);
        let triggered = self.timer.with(|timer| {
            state.begin_cycle();
            signal.clear();
            start_trigger_pulse(timer, &timing.trigger);
        });
        if triggered.is_none() {
            return CycleOutcome::TriggerTimeout;
        }

        state.enter(Stage::AwaitingTriggerDone);
        if !self.scheduler.wait(signal, self.config.timeout) {
            return CycleOutcome::TriggerTimeout;
        }

        self.timer.with(|timer| {
            state.arm_echo();
            start_echo_capture(timer, &timing.echo);
        });
        // The interrupt handler's rising edge moves this on to
        // AwaitingEchoEnd.
        state.enter(Stage::AwaitingEchoStart);

        // Only the falling edge gives the signal.
        if !self.scheduler.wait(signal, self.config.timeout) {
            return match state.edge_state() {
                EdgeState::AwaitingRisingEdge => CycleOutcome::NoEcho,
                EdgeState::AwaitingFallingEdge => CycleOutcome::OutOfRange,
            };
        }

        CycleOutcome::Measured(ticks_to_cm(
            state.raw_duration(),
            self.config.echo_tick,
            self.config.micros_per_cm,
        ))
    }
}
