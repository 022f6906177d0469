use core::fmt::{Display, Formatter};

/// Configuration errors. The ranging protocol itself never fails; a bad cycle
/// publishes [`crate::BAD_VALUE`] instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Error {
    ZeroClock,
    ZeroTick,
    ZeroConversion,
    PulseOutOfRange,
    PrescalerOutOfRange,
    InexactTick,
    EchoRangeTooShort,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.pad(match *self {
            Error::ZeroClock => "timer clock is zero",
            Error::ZeroTick => "echo tick period is zero",
            Error::ZeroConversion => "conversion constant is zero",
            Error::PulseOutOfRange => "trigger pulse can't be generated at this clock",
            Error::PrescalerOutOfRange => "echo tick needs an out of range prescaler",
            Error::InexactTick => "echo tick is not a whole number of timer clocks",
            Error::EchoRangeTooShort => "counter wraps before the protocol timeout",
        })
    }
}
