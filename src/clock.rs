//! Millisecond timestamps shared by every subsystem.
//!
//! The whole firmware runs off one free-running `u32` millisecond counter.
//! All elapsed-time checks go through [`elapsed`], which uses wrapping
//! subtraction so comparisons stay correct when the counter rolls over
//! (every ~49.7 days).

/// Milliseconds on the shared monotonic clock.
pub type Millis = u32;

/// Time from `since` to `now`, correct across counter wraparound.
#[inline]
pub fn elapsed(now: Millis, since: Millis) -> Millis {
    now.wrapping_sub(since)
}

/// Whether at least `duration` has passed since `since`.
#[inline]
pub fn has_elapsed(now: Millis, since: Millis, duration: Millis) -> bool {
    elapsed(now, since) >= duration
}
