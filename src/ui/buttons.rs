//! GPIO button input.
//!
//! One physical button, active-low with internal pull-up.  The pin is
//! sampled once per main-loop tick; debouncing and gesture detection are
//! done by [`deskpet::ui::debounce::Debouncer`].

use embassy_nrf::gpio::{AnyPin, Input, Pull};

pub struct Button {
    pin: Input<'static>,
}

impl Button {
    pub fn new(pin: AnyPin) -> Self {
        Self {
            pin: Input::new(pin, Pull::Up),
        }
    }

    /// Raw level, `true` while held down.
    pub fn is_pressed(&self) -> bool {
        self.pin.is_low()
    }
}
