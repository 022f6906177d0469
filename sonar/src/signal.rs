use core::cell::Cell;
use core::convert::Infallible;
use critical_section::Mutex;

/// Single-slot wakeup flag handed from an interrupt handler to a task.
///
/// Giving an already raised signal is a no-op: at most one outstanding wakeup
/// is ever meaningful for the ranging protocol.
pub struct BinarySignal {
    raised: Mutex<Cell<bool>>,
}

impl BinarySignal {
    pub const fn new() -> Self {
        Self {
            raised: Mutex::new(Cell::new(false)),
        }
    }

    // Raise the signal. This function is interrupt-safe and never blocks.
    // Returns true if the signal was not raised before, i.e. a waiting task
    // can now proceed and the scheduler should run it.
    pub fn give_from_isr(&self) -> bool {
        critical_section::with(|cs| !self.raised.borrow(cs).replace(true))
    }

    /// Consume the signal if it is raised.
    pub fn try_take(&self) -> nb::Result<(), Infallible> {
        if critical_section::with(|cs| self.raised.borrow(cs).replace(false)) {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Drop a stale wakeup left over from an abandoned cycle.
    pub fn clear(&self) {
        critical_section::with(|cs| self.raised.borrow(cs).set(false));
    }

    #[cfg(test)]
    pub(crate) fn is_raised(&self) -> bool {
        critical_section::with(|cs| self.raised.borrow(cs).get())
    }
}

impl Default for BinarySignal {
    fn default() -> Self {
        Self::new()
    }
}
