//! TIM3 channel 3 on PC8 (full remap) as the sonar timer.
//!
//! The pin flips between alternate function output and floating input, and
//! the channel between one-pulse PWM and input capture. The HAL has no API for
//! switching a channel at runtime, so this works on the PAC registers.

use sonar::timer::{Edge, EdgeCapture, IrqSource, Polarity, PulseGenerator, TimerBase};
use stm32f1xx_hal::pac::{GPIOC, TIM3};

// PC8 is the low nibble of CRH.
const CRH_PC8: u32 = 0xF;
const PC8_AF_PUSH_PULL_50MHZ: u32 = 0b1011;
const PC8_FLOATING_INPUT: u32 = 0b0100;

// CCR3
const CAPTURE_CHANNEL: usize = 2;

pub struct Tim3Sonar {
    tim: TIM3,
    gpio: GPIOC,
}

impl Tim3Sonar {
    /// TIM3 and GPIOC clocks must be enabled, and TIM3 fully remapped.
    pub fn new(tim: TIM3, gpio: GPIOC) -> Self {
        let mut timer = Tim3Sonar { tim, gpio };
        timer.disable();
        timer
    }

    // No typed accessor covers a single pin of CRH.
    #[allow(unsafe_code)]
    fn set_pin_mode(&mut self, mode: u32) {
        self.gpio
            .crh
            .modify(|r, w| unsafe { w.bits((r.bits() & !CRH_PC8) | mode) });
    }

    fn disable_channel(&mut self) {
        // CC3S is only writable while the channel is off.
        self.tim
            .ccer
            .modify(|_, w| w.cc3e().clear_bit().cc3p().clear_bit());
    }

    fn enable_channel(&mut self, invert: bool) {
        self.tim
            .ccer
            .modify(|_, w| w.cc3p().bit(invert).cc3e().set_bit());
    }
}

impl TimerBase for Tim3Sonar {
    fn disable(&mut self) {
        self.tim.cr1.modify(|_, w| w.cen().clear_bit());
    }

    fn enable(&mut self) {
        self.tim.cr1.modify(|_, w| w.cen().set_bit());
    }

    fn configure_base(&mut self, prescaler: u16, period: u16) {
        // No ARR preload, and only overflows raise the update interrupt.
        self.tim
            .cr1
            .modify(|_, w| w.arpe().clear_bit().urs().set_bit());
        self.tim.psc.write(|w| w.psc().bits(prescaler));
        self.tim.arr.write(|w| w.arr().bits(period));
        self.tim.cnt.write(|w| w.cnt().bits(0));

        // Load the prescaler now instead of at the next overflow.
        self.tim.egr.write(|w| w.ug().set_bit());
    }

    fn listen(&mut self, source: IrqSource) {
        match source {
            IrqSource::Update => self.tim.dier.modify(|_, w| w.uie().set_bit()),
            IrqSource::Capture => self.tim.dier.modify(|_, w| w.cc3ie().set_bit()),
        }
    }

    fn unlisten(&mut self, source: IrqSource) {
        match source {
            IrqSource::Update => self.tim.dier.modify(|_, w| w.uie().clear_bit()),
            IrqSource::Capture => self.tim.dier.modify(|_, w| w.cc3ie().clear_bit()),
        }
    }

    fn is_interrupt_pending(&self, source: IrqSource) -> bool {
        let sr = self.tim.sr.read();
        let dier = self.tim.dier.read();
        match source {
            IrqSource::Update => sr.uif().bit_is_set() && dier.uie().bit_is_set(),
            IrqSource::Capture => sr.cc3if().bit_is_set() && dier.cc3ie().bit_is_set(),
        }
    }

    fn clear_interrupt(&mut self, source: IrqSource) {
        match source {
            IrqSource::Update => self.tim.sr.modify(|_, w| w.uif().clear_bit()),
            IrqSource::Capture => self
                .tim
                .sr
                .modify(|_, w| w.cc3if().clear_bit().cc3of().clear_bit()),
        }
    }
}

impl PulseGenerator for Tim3Sonar {
    fn configure_pin_output(&mut self) {
        self.set_pin_mode(PC8_AF_PUSH_PULL_50MHZ);
    }

    fn configure_pulse_channel(&mut self, pulse: u16, polarity: Polarity) {
        self.disable_channel();

        // PWM mode 2: inactive below the compare value, active from it to
        // the end of the period. No compare preload.
        let ccmr2 = self.tim.ccmr2_output();
        ccmr2.reset();
        ccmr2.modify(|_, w| w.cc3s().output().oc3m().pwm_mode2());
        self.tim.ccr[CAPTURE_CHANNEL].write(|w| w.ccr().bits(pulse));

        self.enable_channel(polarity == Polarity::ActiveLow);

        // Stop the counter at the end of the period.
        self.tim.cr1.modify(|_, w| w.opm().set_bit());
    }
}

impl EdgeCapture for Tim3Sonar {
    fn configure_pin_input(&mut self) {
        self.set_pin_mode(PC8_FLOATING_INPUT);
    }

    fn configure_capture_channel(&mut self, edge: Edge) {
        self.disable_channel();

        // IC3 on TI3, no input prescaler, no filter.
        let ccmr2 = self.tim.ccmr2_input();
        ccmr2.reset();
        ccmr2.modify(|_, w| w.cc3s().ti3());

        self.enable_channel(edge == Edge::Falling);

        // Free running counter while capturing.
        self.tim.cr1.modify(|_, w| w.opm().clear_bit());
    }

    fn read_capture_value(&self) -> u16 {
        self.tim.ccr[CAPTURE_CHANNEL].read().ccr().bits()
    }
}
