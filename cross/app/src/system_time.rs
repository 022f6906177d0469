#![deny(unsafe_code)]

use core::cell::Cell;
use cortex_m::asm::wfi;
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;
use cortex_m_rt::exception;
use critical_section::Mutex;
use embedded_hal::blocking::delay::DelayMs;
use fugit::MillisDurationU32;
use sonar::{BinarySignal, Scheduler};
use stm32f1xx_hal::rcc::Clocks;

pub type Instant = fugit::TimerInstantU32<1000>;
pub type Duration = fugit::TimerDurationU32<1000>;

static TICKS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

pub struct Ticker {
    // Owned so nothing else reprograms SysTick.
    _syst: SYST,
}

impl Ticker {
    // Setup SysTick to tick at 1kHz
    pub fn new(mut syst: SYST, clocks: &Clocks) -> Self {
        let reload = clocks.sysclk().to_Hz() / 1000 - 1;

        syst.set_clock_source(SystClkSource::Core);
        syst.set_reload(reload);
        syst.clear_current();
        syst.enable_interrupt();
        syst.enable_counter();

        Ticker { _syst: syst }
    }

    // Get current tick count
    pub fn get_ticks(&self) -> u32 {
        critical_section::with(|cs| TICKS.borrow(cs).get())
    }

    pub fn now(&self) -> Instant {
        Instant::from_ticks(self.get_ticks())
    }
}

// The task runs in thread mode and sleeps between interrupts. The sonar
// interrupt and SysTick both wake it up, so a timed wait is a WFI loop.
impl Scheduler for Ticker {
    fn wait(&mut self, signal: &BinarySignal, timeout: MillisDurationU32) -> bool {
        let deadline = self.now() + timeout;

        loop {
            if signal.try_take().is_ok() {
                return true;
            }
            if self.now() >= deadline {
                return false;
            }
            wfi();
        }
    }
}

impl DelayMs<u32> for Ticker {
    fn delay_ms(&mut self, ms: u32) {
        let deadline = self.now() + Duration::millis(ms);

        while self.now() < deadline {
            wfi();
        }
    }
}

#[exception]
fn SysTick() {
    critical_section::with(|cs| {
        let ticks = TICKS.borrow(cs).get();
        TICKS.borrow(cs).set(ticks.wrapping_add(1));
    });
}
