use crate::capture::COUNTER_MAX;
use crate::error::Error;
use fugit::{HertzU32, MicrosDurationU32, MillisDurationU32, NanosDurationU32};

/// No obstacle in range: the sensor gives up after 38 ms.
pub const PROTOCOL_TIMEOUT: MillisDurationU32 = MillisDurationU32::millis(38);
/// Pause between cycles, above the sensor's minimum re-trigger interval.
pub const MEASUREMENT_DELAY: MillisDurationU32 = MillisDurationU32::millis(100);
pub const TRIGGER_PULSE: MicrosDurationU32 = MicrosDurationU32::micros(10);
/// 72 MHz / 180 = 400 kHz.
pub const ECHO_TICK: NanosDurationU32 = NanosDurationU32::nanos(2500);
/// Round trip of sound in air per centimeter of range.
pub const MICROS_PER_CM: u32 = 58;

const NANOS_PER_SEC: u64 = 1_000_000_000;
const NANOS_PER_MILLI: u64 = 1_000_000;
const MICROS_PER_SEC: u64 = 1_000_000;
const COUNTER_STEPS: u64 = COUNTER_MAX as u64 + 1;

/// Ranging tunables. Defaults match an HC-SR04 on a 72 MHz timer clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub timeout: MillisDurationU32,
    pub measurement_delay: MillisDurationU32,
    pub trigger_pulse: MicrosDurationU32,
    pub echo_tick: NanosDurationU32,
    pub micros_per_cm: u32,
}

/// Time base and compare value for the one-shot trigger pulse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PulseTiming {
    pub prescaler: u16,
    pub period: u16,
    pub pulse: u16,
}

/// Time base for echo capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureTiming {
    pub prescaler: u16,
    pub period: u16,
}

/// Register values for both timer configurations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerTiming {
    pub trigger: PulseTiming,
    pub echo: CaptureTiming,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            timeout: PROTOCOL_TIMEOUT,
            measurement_delay: MEASUREMENT_DELAY,
            trigger_pulse: TRIGGER_PULSE,
            echo_tick: ECHO_TICK,
            micros_per_cm: MICROS_PER_CM,
        }
    }

    pub const fn timeout(mut self, timeout: MillisDurationU32) -> Self {
        self.timeout = timeout;
        self
    }

    pub const fn measurement_delay(mut self, delay: MillisDurationU32) -> Self {
        self.measurement_delay = delay;
        self
    }

    pub const fn trigger_pulse(mut self, pulse: MicrosDurationU32) -> Self {
        self.trigger_pulse = pulse;
        self
    }

    pub const fn echo_tick(mut self, tick: NanosDurationU32) -> Self {
        self.echo_tick = tick;
        self
    }

    pub const fn micros_per_cm(mut self, micros_per_cm: u32) -> Self {
        self.micros_per_cm = micros_per_cm;
        self
    }

    /// Derive the timer register values for a timer running at `clock`.
    ///
    /// The trigger period covers twice the pulse width, and the compare value
    /// sits in the middle, so the output is high for the second half. The echo
    /// time base must not wrap more than once within the protocol timeout.
    pub fn timing(&self, clock: HertzU32) -> Result<TimerTiming, Error> {
        let clock_hz = u64::from(clock.to_Hz());
        if clock_hz == 0 {
            return Err(Error::ZeroClock);
        }
        if self.echo_tick.ticks() == 0 {
            return Err(Error::ZeroTick);
        }
        if self.micros_per_cm == 0 {
            return Err(Error::ZeroConversion);
        }

        let trigger_counts = clock_hz * 2 * u64::from(self.trigger_pulse.ticks()) / MICROS_PER_SEC;
        if trigger_counts < 2 {
            return Err(Error::PulseOutOfRange);
        }
        let trigger_prescaler = (trigger_counts - 1) / COUNTER_STEPS;
        let trigger_period = trigger_counts / (trigger_prescaler + 1) - 1;
        let trigger = PulseTiming {
            prescaler: u16::try_from(trigger_prescaler).map_err(|_| Error::PulseOutOfRange)?,
            period: trigger_period as u16,
            pulse: (trigger_period / 2) as u16,
        };

        let echo_clocks = clock_hz * u64::from(self.echo_tick.ticks());
        let echo_divider = echo_clocks / NANOS_PER_SEC;
        if echo_divider == 0 || echo_divider > COUNTER_STEPS {
            return Err(Error::PrescalerOutOfRange);
        }
        // Distances are converted with the configured tick, so the hardware
        // must count at exactly that rate.
        if echo_clocks % NANOS_PER_SEC != 0 {
            return Err(Error::InexactTick);
        }
        let echo = CaptureTiming {
            prescaler: (echo_divider - 1) as u16,
            period: COUNTER_MAX,
        };

        let echo_range_nanos = u64::from(COUNTER_MAX) * u64::from(self.echo_tick.ticks());
        if echo_range_nanos <= u64::from(self.timeout.ticks()) * NANOS_PER_MILLI {
            return Err(Error::EchoRangeTooShort);
        }

        Ok(TimerTiming { trigger, echo })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOCK: HertzU32 = HertzU32::MHz(72);

    #[test]
    fn test_default_timing() {
        let timing = Config::new().timing(CLOCK).unwrap();

        assert_eq!(
            timing.trigger,
            PulseTiming {
                prescaler: 0,
                period: 1439,
                pulse: 719,
            }
        );
        assert_eq!(
            timing.echo,
            CaptureTiming {
                prescaler: 179,
                period: 0xFFFF,
            }
        );
    }

    #[test]
    fn test_long_trigger_pulse_uses_prescaler() {
        // 72 MHz * 2ms = 144000 counts, more than one counter period
        let timing = Config::new()
            .trigger_pulse(MicrosDurationU32::micros(1000))
            .timing(CLOCK)
            .unwrap();

        assert_eq!(timing.trigger.prescaler, 2);
        assert_eq!(timing.trigger.period, 47999);
        assert_eq!(timing.trigger.pulse, 23999);
    }

    #[test]
    fn test_degenerate_config() {
        assert_eq!(Config::new().timing(HertzU32::Hz(0)), Err(Error::ZeroClock));
        assert_eq!(
            Config::new().echo_tick(NanosDurationU32::nanos(0)).timing(CLOCK),
            Err(Error::ZeroTick)
        );
        assert_eq!(
            Config::new().micros_per_cm(0).timing(CLOCK),
            Err(Error::ZeroConversion)
        );
    }

    #[test]
    fn test_trigger_pulse_too_short_for_clock() {
        assert_eq!(
            Config::new().timing(HertzU32::kHz(50)),
            Err(Error::PulseOutOfRange)
        );
    }

    #[test]
    fn test_echo_prescaler_out_of_range() {
        // 2.5us is shorter than one cycle of a 100 kHz clock
        assert_eq!(
            Config::new().timing(HertzU32::kHz(100)),
            Err(Error::PrescalerOutOfRange)
        );
        assert_eq!(
            Config::new()
                .echo_tick(NanosDurationU32::nanos(1_000_000))
                .timing(CLOCK),
            Err(Error::PrescalerOutOfRange)
        );
    }

    #[test]
    fn test_echo_tick_must_divide_clock() {
        // 1 MHz * 2.5us = 2.5 clocks, the prescaler would round it to 2
        assert_eq!(Config::new().timing(HertzU32::MHz(1)), Err(Error::InexactTick));

        let timing = Config::new()
            .echo_tick(NanosDurationU32::nanos(2000))
            .timing(HertzU32::MHz(1))
            .unwrap();
        assert_eq!(timing.echo.prescaler, 1);
        assert_eq!(timing.trigger.period, 19);

        // 72 MHz * 2.5us is exactly 180 clocks
        assert!(Config::new().timing(HertzU32::MHz(72)).is_ok());
        assert_eq!(
            Config::new()
                .echo_tick(NanosDurationU32::nanos(2510))
                .timing(HertzU32::MHz(72)),
            Err(Error::InexactTick)
        );
    }

    #[test]
    fn test_echo_range_must_exceed_timeout() {
        // 65535 * 0.5us = 32.7ms < 38ms
        assert_eq!(
            Config::new()
                .echo_tick(NanosDurationU32::nanos(500))
                .timing(CLOCK),
            Err(Error::EchoRangeTooShort)
        );
        assert!(Config::new()
            .echo_tick(NanosDurationU32::nanos(500))
            .timeout(MillisDurationU32::millis(30))
            .timing(CLOCK)
            .is_ok());
    }
}
