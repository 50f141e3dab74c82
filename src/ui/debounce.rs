//! Button gesture recogniser.
//!
//! Pure state machine fed once per loop tick with the raw (already
//! polarity-corrected) button level.  It produces at most one
//! [`ButtonEvent`] per call:
//!
//! - a level change is accepted only after it has been stable for
//!   [`BUTTON_DEBOUNCE_MS`];
//! - short presses are counted and reported as `Click(n)` once the button
//!   has been released for longer than [`BUTTON_MULTI_CLICK_MS`];
//! - a press held for [`BUTTON_LONG_PRESS_MS`] yields one `LongPressStart`
//!   and its release one `LongPressEnd`, never a click.

use crate::clock::{elapsed, has_elapsed, Millis};
use crate::config::{BUTTON_DEBOUNCE_MS, BUTTON_LONG_PRESS_MS, BUTTON_MULTI_CLICK_MS};
use crate::ui::ButtonEvent;

pub struct Debouncer {
    /// Last raw level seen.
    raw: bool,
    /// Time of the last raw transition.
    raw_since: Millis,
    /// Debounced level.
    stable: bool,
    /// When the current press started (raw transition time).
    pressed_at: Millis,
    /// The current press cycle has been claimed by a long press.
    long_press: bool,
    /// Releases counted since the last reported click.
    pending: u8,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

impl Debouncer {
    pub const fn new() -> Self {
        Self {
            raw: false,
            raw_since: 0,
            stable: false,
            pressed_at: 0,
            long_press: false,
            pending: 0,
        }
    }

    /// Feed the current level (`true` = pressed) sampled at `now`.
    pub fn update(&mut self, pressed: bool, now: Millis) -> Option<ButtonEvent> {
        if pressed != self.raw {
            self.raw = pressed;
            self.raw_since = now;
        }

        if self.raw != self.stable && has_elapsed(now, self.raw_since, BUTTON_DEBOUNCE_MS) {
            self.stable = self.raw;
            if self.stable {
                self.pressed_at = self.raw_since;
            } else if self.long_press {
                self.long_press = false;
                return Some(ButtonEvent::LongPressEnd);
            } else {
                self.pending = self.pending.saturating_add(1);
            }
        }

        if self.stable
            && !self.long_press
            && has_elapsed(now, self.pressed_at, BUTTON_LONG_PRESS_MS)
        {
            self.long_press = true;
            self.pending = 0;
            return Some(ButtonEvent::LongPressStart);
        }

        if !self.stable && self.pending > 0 && elapsed(now, self.raw_since) > BUTTON_MULTI_CLICK_MS {
            let count = self.pending;
            self.pending = 0;
            return Some(ButtonEvent::Click(count));
        }

        None
    }

    /// Debounced level.
    pub fn is_pressed(&self) -> bool {
        self.stable
    }
}
