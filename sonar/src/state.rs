//! State shared between the interrupt handler and the measurement task.
//!
//! [`SonarState`] only hands out narrow handles. The interrupt handler gets a
//! [`CaptureSide`] and is the only writer of the capture results. The task gets
//! a [`TaskSide`] and is the only writer of the published distance. Everyone
//! else gets a [`DistanceReader`].
//!
//! The task's [`Stage`] lives here too, so it can be observed while the task
//! is blocked in a wait.

use crate::capture::{CaptureSample, EdgeState, Phase};
use crate::distance::{as_reading, BAD_VALUE};
use core::cell::Cell;
use critical_section::Mutex;

/// Where the measurement task is within a cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Idle,
    Triggering,
    AwaitingTriggerDone,
    AwaitingEchoStart,
    /// Rising edge latched, waiting for the falling one. Entered by the
    /// interrupt handler, not by the task.
    AwaitingEchoEnd,
    /// Distance published. Lasts through the inter-measurement delay.
    Publishing,
}

pub struct SonarState {
    stage: Mutex<Cell<Stage>>,
    phase: Mutex<Cell<Phase>>,
    edge: Mutex<Cell<EdgeState>>,
    sample: Mutex<Cell<CaptureSample>>,
    raw_duration: Mutex<Cell<u16>>,
    distance: Mutex<Cell<i32>>,
}

impl SonarState {
    pub const fn new() -> Self {
        Self {
            stage: Mutex::new(Cell::new(Stage::Idle)),
            phase: Mutex::new(Cell::new(Phase::Trigger)),
            edge: Mutex::new(Cell::new(EdgeState::AwaitingRisingEdge)),
            sample: Mutex::new(Cell::new(CaptureSample::new(0, 0))),
            raw_duration: Mutex::new(Cell::new(0)),
            distance: Mutex::new(Cell::new(BAD_VALUE)),
        }
    }

    pub fn capture_side(&self) -> CaptureSide<'_> {
        CaptureSide { state: self }
    }

    pub fn task_side(&self) -> TaskSide<'_> {
        TaskSide { state: self }
    }

    pub fn reader(&self) -> DistanceReader<'_> {
        DistanceReader { state: self }
    }

    pub fn stage(&self) -> Stage {
        critical_section::with(|cs| {
            let stage = self.stage.borrow(cs).get();
            let edge = self.edge.borrow(cs).get();
            match (stage, edge) {
                (Stage::AwaitingEchoStart, EdgeState::AwaitingFallingEdge) => {
                    Stage::AwaitingEchoEnd
                }
                _ => stage,
            }
        })
    }

    pub fn phase(&self) -> Phase {
        critical_section::with(|cs| self.phase.borrow(cs).get())
    }

    pub fn edge_state(&self) -> EdgeState {
        critical_section::with(|cs| self.edge.borrow(cs).get())
    }

    pub fn sample(&self) -> CaptureSample {
        critical_section::with(|cs| self.sample.borrow(cs).get())
    }

    fn set_phase(&self, phase: Phase) {
        critical_section::with(|cs| self.phase.borrow(cs).set(phase));
    }

    fn set_edge_state(&self, edge: EdgeState) {
        critical_section::with(|cs| self.edge.borrow(cs).set(edge));
    }
}

impl Default for SonarState {
    fn default() -> Self {
        Self::new()
    }
}

/// Interrupt handler's view of the state.
#[derive(Clone, Copy)]
pub struct CaptureSide<'a> {
    state: &'a SonarState,
}

impl<'a> CaptureSide<'a> {
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn edge_state(&self) -> EdgeState {
        self.state.edge_state()
    }

    /// Trigger pulse done, echo phase begins.
    pub fn finish_trigger(&self) {
        self.state.set_phase(Phase::Echo);
    }

    pub fn latch_rising(&self, counter: u16) {
        critical_section::with(|cs| {
            let sample = self.state.sample.borrow(cs);
            sample.set(CaptureSample::new(counter, sample.get().second));
            self.state.edge.borrow(cs).set(EdgeState::AwaitingFallingEdge);
        });
    }

    /// Store the falling edge and the resulting pulse length in ticks.
    pub fn latch_falling(&self, counter: u16) -> u16 {
        critical_section::with(|cs| {
            let cell = self.state.sample.borrow(cs);
            let sample = CaptureSample::new(cell.get().first, counter);
            cell.set(sample);

            let raw_duration = sample.raw_duration();
            self.state.raw_duration.borrow(cs).set(raw_duration);
            raw_duration
        })
    }
}

/// Measurement task's view of the state.
#[derive(Clone, Copy)]
pub struct TaskSide<'a> {
    state: &'a SonarState,
}

impl<'a> TaskSide<'a> {
    pub fn enter(&self, stage: Stage) {
        critical_section::with(|cs| self.state.stage.borrow(cs).set(stage));
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    /// Reset the protocol state machine for a new cycle.
    pub fn begin_cycle(&self) {
        self.state.set_phase(Phase::Trigger);
        self.state.set_edge_state(EdgeState::AwaitingRisingEdge);
    }

    pub fn arm_echo(&self) {
        self.state.set_edge_state(EdgeState::AwaitingRisingEdge);
    }

    pub fn edge_state(&self) -> EdgeState {
        self.state.edge_state()
    }

    // Only valid after the falling edge signal was taken.
    pub fn raw_duration(&self) -> u16 {
        critical_section::with(|cs| self.state.raw_duration.borrow(cs).get())
    }

    pub fn publish(&self, distance_cm: i32) {
        critical_section::with(|cs| self.state.distance.borrow(cs).set(distance_cm));
    }

    pub fn reader(&self) -> DistanceReader<'a> {
        self.state.reader()
    }
}

/// Read-only access to the last published distance. Never blocks.
#[derive(Clone, Copy)]
pub struct DistanceReader<'a> {
    state: &'a SonarState,
}

impl<'a> DistanceReader<'a> {
    /// Last published distance in centimeters, or [`BAD_VALUE`].
    pub fn last_cm(&self) -> i32 {
        critical_section::with(|cs| self.state.distance.borrow(cs).get())
    }

    pub fn last(&self) -> Option<u32> {
        as_reading(self.last_cm())
    }
}
