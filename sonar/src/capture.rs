/// Largest value of the 16-bit capture counter.
pub const COUNTER_MAX: u16 = 0xFFFF;

/// Fixed offset subtracted from every measured interval.
///
/// The input capture latches one tick late relative to the counter start, so
/// the raw difference between two captures is one tick too long. Kept as a
/// calibration constant; the value was measured on the reference board.
pub const CAPTURE_LATENCY_TICKS: u16 = 1;

/// Which half of the ranging protocol the timer is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Trigger,
    Echo,
}

/// Echo edge the capture channel is waiting for. Only meaningful in
/// [`Phase::Echo`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeState {
    AwaitingRisingEdge,
    AwaitingFallingEdge,
}

/// Counter values latched at the rising (`first`) and falling (`second`)
/// edges of the echo pulse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CaptureSample {
    pub first: u16,
    pub second: u16,
}

impl CaptureSample {
    pub const fn new(first: u16, second: u16) -> Self {
        Self { first, second }
    }

    /// Ticks between the two edges, corrected for a single counter wraparound
    /// and for [`CAPTURE_LATENCY_TICKS`].
    ///
    /// The counter can wrap at most once between the edges because its full
    /// period is longer than the protocol timeout, so `second <= first` always
    /// means exactly one wrap. The result saturates at zero.
    pub fn raw_duration(&self) -> u16 {
        let elapsed = if self.second > self.first {
            u32::from(self.second - self.first)
        } else {
            u32::from(COUNTER_MAX - self.first) + u32::from(self.second)
        };

        // elapsed <= COUNTER_MAX here, so the narrowing can't truncate.
        elapsed.saturating_sub(u32::from(CAPTURE_LATENCY_TICKS)) as u16
    }
}
