#![deny(unsafe_code)]
#![no_std]
#![no_main]

mod board;
mod error;
mod ranging;
mod system_time;
mod tim3;

use panic_probe as _;

use board::Board;
use cortex_m_rt::entry;
use rtt_target::rprintln;
use rtt_target::rtt_init_print;
use sonar::{Config, CycleOutcome};
use stm32f1xx_hal::pac;

/// The LED lights up while something is closer than this.
const PROXIMITY_CM: u32 = 20;

#[entry]
fn main() -> ! {
    rtt_init_print!();

    let cp = pac::CorePeripherals::take().unwrap();
    let dp = pac::Peripherals::take().unwrap();
    let mut nvic = cp.NVIC;

    let board = Board::new(cp.SYST, dp);
    let mut led = board.led;

    let task = ranging::start(
        board.sonar_timer,
        board.sonar_clock,
        board.ticker,
        &mut nvic,
        Config::new(),
    )
    .unwrap();

    rprintln!("sonar started");

    task.run(|outcome| {
        match outcome {
            CycleOutcome::Measured(cm) => rprintln!("distance {} cm", cm),
            CycleOutcome::TriggerTimeout => rprintln!("trigger timeout"),
            CycleOutcome::NoEcho => rprintln!("no echo"),
            CycleOutcome::OutOfRange => rprintln!("out of range"),
        }

        match sonar::distance::as_reading(ranging::last_distance_cm()) {
            Some(cm) if cm < PROXIMITY_CM => led.set_high(),
            _ => led.set_low(),
        }
    })
}
