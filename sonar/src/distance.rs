use fugit::NanosDurationU32;

/// Published instead of a distance when a cycle produced no valid reading:
/// trigger timeout, no echo, or echo longer than the protocol allows.
pub const BAD_VALUE: i32 = -1;

/// Convert an echo pulse length in capture ticks to centimeters.
///
/// `micros_per_cm` is the round-trip time of sound per centimeter of range.
/// The division truncates, which is well within the sensor's precision.
pub fn ticks_to_cm(raw_duration: u16, tick: NanosDurationU32, micros_per_cm: u32) -> i32 {
    // Work in nanoseconds, so fractional tick periods (2.5us) stay exact.
    let pulse_nanos = u64::from(raw_duration) * u64::from(tick.ticks());

    match pulse_nanos.checked_div(u64::from(micros_per_cm) * 1000) {
        Some(cm) => i32::try_from(cm).unwrap_or(i32::MAX),
        None => BAD_VALUE,
    }
}

/// Map a published value to `Some(cm)`, or `None` for [`BAD_VALUE`].
pub fn as_reading(distance_cm: i32) -> Option<u32> {
    u32::try_from(distance_cm).ok()
}
