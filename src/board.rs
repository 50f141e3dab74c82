//! Hardware collaborators and the context that owns them.
//!
//! The core never talks to peripherals directly.  Everything it drives is
//! reached through the traits below, bundled into a [`Devices`] value that
//! the coordinator passes by `&mut` into whichever sub-engine is active.
//! The firmware binary implements [`Board`] for the nRF52840 peripherals;
//! tests implement it with recording fakes.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_hal::delay::DelayNs;

use crate::config::MOTOR_PULSE_MS;
use crate::drive::{Direction, Drivetrain, Motor};
use crate::error::Error;
use crate::melody::Buzzer;

/// Monochrome drawing surface with an explicit flush.
pub trait Surface: DrawTarget<Color = BinaryColor> {
    /// Push the frame buffer to the panel.
    fn present(&mut self) -> Result<(), Error>;
}

/// Outgoing half of the companion-app link.
pub trait LinkControl {
    /// Send a text message to the connected app.
    fn send(&mut self, text: &str) -> Result<(), Error>;

    /// Enable or disable the radio.  Disabling stops advertising and drops
    /// an active connection; enabling resumes advertising.
    fn set_enabled(&mut self, enabled: bool);
}

/// Source of randomness for behaviour and animation.
pub trait RandomSource {
    /// Uniform value in `low..high`.  Returns `low` for an empty range.
    fn range(&mut self, low: u32, high: u32) -> u32;

    /// `true` with probability `numerator / denominator`.
    fn chance(&mut self, numerator: u32, denominator: u32) -> bool {
        self.range(0, denominator) < numerator
    }
}

impl RandomSource for nanorand::WyRand {
    fn range(&mut self, low: u32, high: u32) -> u32 {
        use nanorand::Rng;

        if high <= low {
            return low;
        }
        self.generate_range(low..high)
    }
}

/// Concrete collaborator types of one hardware target.
pub trait Board {
    type Display: Surface;
    type Motor: Motor;
    type Buzzer: Buzzer;
    type Delay: DelayNs;
    type Link: LinkControl;
    type Rng: RandomSource;
}

/// All collaborators of the pet, owned in one place.
pub struct Devices<B: Board> {
    pub display: B::Display,
    pub drive: Drivetrain<B::Motor>,
    pub buzzer: B::Buzzer,
    pub delay: B::Delay,
    pub link: B::Link,
    pub rng: B::Rng,
}

impl<B: Board> Devices<B> {
    pub fn new(
        display: B::Display,
        motor: B::Motor,
        buzzer: B::Buzzer,
        delay: B::Delay,
        link: B::Link,
        rng: B::Rng,
    ) -> Self {
        Self {
            display,
            drive: Drivetrain::new(motor),
            buzzer,
            delay,
            link,
            rng,
        }
    }

    /// Drive for one bounded pulse, then stop.
    ///
    /// This is the only blocking call in the core.
    pub fn pulse(&mut self, direction: Direction) {
        self.drive.run(direction);
        self.delay.delay_ms(MOTOR_PULSE_MS);
        self.drive.stop();
    }

    /// Blank the panel and push the empty frame.
    pub fn blank(&mut self) {
        let _ = self.display.clear(BinaryColor::Off);
        self.present();
    }

    /// Push the current frame, logging (not propagating) a flush failure.
    pub fn present(&mut self) {
        if let Err(e) = self.display.present() {
            warn!("Display flush failed: {:?}", e);
        }
    }
}
