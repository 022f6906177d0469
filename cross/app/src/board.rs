#![deny(unsafe_code)]

use crate::system_time::Ticker;
use crate::tim3::Tim3Sonar;

use cortex_m::peripheral::SYST;
use rtt_target::rprintln;
use stm32f1xx_hal::gpio::{Output, PushPull, PA5};
use stm32f1xx_hal::pac;
use stm32f1xx_hal::prelude::*;
use stm32f1xx_hal::time::Hertz;

pub type Led = PA5<Output<PushPull>>;

pub struct Board {
    pub ticker: Ticker,
    pub led: Led,
    pub sonar_timer: Tim3Sonar,
    pub sonar_clock: Hertz,
}

impl Board {
    pub fn new(syst: SYST, dp: pac::Peripherals) -> Self {
        // Enable debug while sleeping to keep probe-rs happy while WFI
        dp.DBGMCU.cr.modify(|_, w| {
            w.dbg_sleep().set_bit();
            w.dbg_standby().set_bit();
            w.dbg_stop().set_bit()
        });
        // Sonar timer and its port are driven at register level, so the HAL
        // doesn't enable their clocks.
        dp.RCC.apb1enr.modify(|_, w| w.tim3en().enabled());
        dp.RCC.apb2enr.modify(|_, w| w.iopcen().enabled());

        // Configure the clock.
        let mut flash = dp.FLASH.constrain();
        let rcc = dp.RCC.constrain();
        let clocks = rcc
            .cfgr
            .use_hse(8.MHz())
            .sysclk(72.MHz())
            .pclk1(36.MHz())
            .freeze(&mut flash.acr);

        let mut afio = dp.AFIO.constrain();

        // TIM3 full remap: CH3 on PC8
        #[allow(unsafe_code)]
        afio.mapr
            .modify_mapr(|_, w| unsafe { w.tim3_remap().bits(0b11) });

        let mut gpioa = dp.GPIOA.split();
        let led = gpioa.pa5.into_push_pull_output(&mut gpioa.crl);

        let ticker = Ticker::new(syst, &clocks);
        let sonar_clock = clocks.pclk1_tim();
        rprintln!("sysclk {} sonar timer {}", clocks.sysclk(), sonar_clock);

        Board {
            ticker,
            led,
            sonar_timer: Tim3Sonar::new(dp.TIM3, dp.GPIOC),
            sonar_clock,
        }
    }
}
