//! Capabilities the driver needs from the timer that owns the sensor pin.
//!
//! One timer channel serves both phases. [`PulseGenerator`] is the trigger
//! configuration (pin as output, one-shot pulse) and [`EdgeCapture`] the echo
//! configuration (pin as floating input, input capture). Switching between
//! them always disables the timer first, so no interrupt can come from a half
//! configured peripheral.

use crate::config::{CaptureTiming, PulseTiming};
use core::cell::RefCell;
use critical_section::Mutex;

/// Interrupt sources of the sensor timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IrqSource {
    /// Counter reload. Marks the end of the one-shot trigger pulse.
    Update,
    /// Compare match in trigger mode, latched edge in echo mode.
    Capture,
}

/// Output level while the trigger pulse is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    Rising,
    Falling,
}

pub trait TimerBase {
    fn disable(&mut self);
    fn enable(&mut self);
    fn configure_base(&mut self, prescaler: u16, period: u16);
    fn listen(&mut self, source: IrqSource);
    fn unlisten(&mut self, source: IrqSource);
    fn is_interrupt_pending(&self, source: IrqSource) -> bool;
    fn clear_interrupt(&mut self, source: IrqSource);

    fn clear_all_interrupts(&mut self) {
        self.clear_interrupt(IrqSource::Update);
        self.clear_interrupt(IrqSource::Capture);
    }
}

pub trait PulseGenerator: TimerBase {
    fn configure_pin_output(&mut self);
    /// Emit a single pulse, active from `pulse` until the end of the period.
    fn configure_pulse_channel(&mut self, pulse: u16, polarity: Polarity);
}

pub trait EdgeCapture: TimerBase {
    fn configure_pin_input(&mut self);
    /// Capture the counter on `edge`. Also called from the interrupt handler
    /// to flip the edge while the timer runs.
    fn configure_capture_channel(&mut self, edge: Edge);
    fn read_capture_value(&self) -> u16;
}

/// A timer that can run both halves of the protocol.
pub trait SonarTimer: PulseGenerator + EdgeCapture {}

impl<T: PulseGenerator + EdgeCapture> SonarTimer for T {}

/// Program a one-shot trigger pulse and start it.
pub fn start_trigger_pulse<T: PulseGenerator>(timer: &mut T, timing: &PulseTiming) {
    timer.disable();

    timer.configure_pin_output();
    timer.configure_base(timing.prescaler, timing.period);
    timer.configure_pulse_channel(timing.pulse, Polarity::ActiveHigh);
    timer.clear_all_interrupts();
    // The compare match halfway through the pulse is of no interest.
    timer.unlisten(IrqSource::Capture);
    timer.listen(IrqSource::Update);

    timer.enable();
}

/// Switch to rising edge capture on the same channel and start counting.
pub fn start_echo_capture<T: EdgeCapture>(timer: &mut T, timing: &CaptureTiming) {
    timer.disable();

    timer.configure_pin_input();
    timer.configure_base(timing.prescaler, timing.period);
    timer.configure_capture_channel(Edge::Rising);
    timer.listen(IrqSource::Capture);

    timer.enable();
    // Reconfiguring the pin may have produced a bogus edge.
    timer.clear_all_interrupts();
}

/// Timer shared between the measurement task and the interrupt handler.
///
/// Every access runs inside a critical section, so the handler never sees the
/// timer in the middle of a reconfiguration.
pub struct SharedTimer<T> {
    timer: Mutex<RefCell<Option<T>>>,
}

impl<T> SharedTimer<T> {
    pub const fn new() -> Self {
        Self {
            timer: Mutex::new(RefCell::new(None)),
        }
    }

    pub fn install(&self, timer: T) {
        critical_section::with(|cs| {
            self.timer.replace(cs, Some(timer));
        });
    }

    pub fn release(&self) -> Option<T> {
        critical_section::with(|cs| self.timer.replace(cs, None))
    }

    /// Run `f` on the timer. Returns `None` if no timer is installed.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        critical_section::with(|cs| self.timer.borrow_ref_mut(cs).as_mut().map(f))
    }
}

impl<T> Default for SharedTimer<T> {
    fn default() -> Self {
        Self::new()
    }
}
