use crate::error::Error;
use crate::system_time::Ticker;
use crate::tim3::Tim3Sonar;

use cortex_m::peripheral::NVIC;
use rtt_target::rprintln;
use sonar::{
    on_interrupt, BinarySignal, Config, IsrEvent, MeasurementTask, SharedTimer, SonarState,
};
use stm32f1xx_hal::pac::{interrupt, Interrupt};
use stm32f1xx_hal::time::Hertz;

/// NVIC priority of the sonar interrupt. STM32F1 implements the top 4 bits.
pub const IRQ_PRIORITY: u8 = 7 << 4;

pub type Task = MeasurementTask<'static, Tim3Sonar, Ticker>;

static TIMER: SharedTimer<Tim3Sonar> = SharedTimer::new();
static STATE: SonarState = SonarState::new();
static SIGNAL: BinarySignal = BinarySignal::new();

/// One-time setup. Hands the timer to the interrupt handler, enables the
/// interrupt and returns the measurement task to run in thread mode.
pub fn start(
    timer: Tim3Sonar,
    timer_clock: Hertz,
    ticker: Ticker,
    nvic: &mut NVIC,
    config: Config,
) -> Result<Task, Error> {
    let timing = config.timing(timer_clock)?;
    rprintln!("sonar trigger {:?}", timing.trigger);
    rprintln!("sonar echo {:?}", timing.echo);

    TIMER.install(timer);

    #[allow(unsafe_code)]
    unsafe {
        nvic.set_priority(Interrupt::TIM3, IRQ_PRIORITY);
        NVIC::unmask(Interrupt::TIM3);
    }

    Ok(MeasurementTask::new(&TIMER, &STATE, &SIGNAL, ticker, config, timing))
}

/// Last published distance in centimeters, or `sonar::BAD_VALUE`.
pub fn last_distance_cm() -> i32 {
    STATE.reader().last_cm()
}

#[interrupt]
fn TIM3() {
    // Thread mode resumes from WFI when this returns, so the reschedule hint
    // needs no action here.
    let outcome = TIMER.with(|timer| on_interrupt(timer, STATE.capture_side(), &SIGNAL));

    if let Some(outcome) = outcome {
        if let IsrEvent::Spurious(source) = outcome.event {
            rprintln!("sonar: spurious {:?} interrupt", source);
        }
    }
}
