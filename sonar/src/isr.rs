//! Capture state machine, run from the sensor timer's interrupt handler.

use crate::capture::{EdgeState, Phase};
use crate::signal::BinarySignal;
use crate::state::CaptureSide;
use crate::timer::{Edge, EdgeCapture, IrqSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IsrEvent {
    /// Trigger pulse finished, task woken to arm the echo capture.
    TriggerDone,
    /// Echo started at this counter value.
    RisingEdge(u16),
    /// Echo finished, pulse length in ticks.
    EchoDone(u16),
    /// Interrupt that doesn't fit the current phase. Cleared and ignored.
    Spurious(IrqSource),
    /// Nothing pending.
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IsrOutcome {
    pub event: IsrEvent,
    /// The signal woke the task; request a context switch on exit.
    pub reschedule: bool,
}

impl IsrOutcome {
    const fn quiet(event: IsrEvent) -> Self {
        Self {
            event,
            reschedule: false,
        }
    }
}

/// Handle one pending timer interrupt.
///
/// Update is checked before capture and only one source is serviced per call.
/// A source still pending re-enters the handler.
pub fn on_interrupt<T: EdgeCapture>(
    timer: &mut T,
    capture: CaptureSide<'_>,
    signal: &BinarySignal,
) -> IsrOutcome {
    if timer.is_interrupt_pending(IrqSource::Update) {
        let outcome = match capture.phase() {
            Phase::Trigger => {
                capture.finish_trigger();
                IsrOutcome {
                    event: IsrEvent::TriggerDone,
                    reschedule: signal.give_from_isr(),
                }
            }
            Phase::Echo => IsrOutcome::quiet(IsrEvent::Spurious(IrqSource::Update)),
        };
        timer.clear_interrupt(IrqSource::Update);

        outcome
    } else if timer.is_interrupt_pending(IrqSource::Capture) {
        let outcome = match (capture.phase(), capture.edge_state()) {
            (Phase::Echo, EdgeState::AwaitingRisingEdge) => {
                let counter = timer.read_capture_value();
                capture.latch_rising(counter);
                timer.configure_capture_channel(Edge::Falling);

                IsrOutcome::quiet(IsrEvent::RisingEdge(counter))
            }
            (Phase::Echo, EdgeState::AwaitingFallingEdge) => {
                let raw_duration = capture.latch_falling(timer.read_capture_value());

                IsrOutcome {
                    event: IsrEvent::EchoDone(raw_duration),
                    reschedule: signal.give_from_isr(),
                }
            }
            // Compare match of the trigger pulse
            (Phase::Trigger, _) => IsrOutcome::quiet(IsrEvent::Spurious(IrqSource::Capture)),
        };
        timer.clear_interrupt(IrqSource::Capture);

        outcome
    } else {
        IsrOutcome::quiet(IsrEvent::None)
    }
}
