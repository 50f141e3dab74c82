//! nRF52840 implementations of the motor and buzzer collaborators.
//!
//! Motors hang off a dual H-bridge (two inputs per side).  The buzzer is a
//! passive piezo on PWM0; melodies are handed to [`buzzer_task`] so the
//! main loop never waits for a tune to finish.

use defmt::{debug, warn};
use deskpet::drive::Motor;
use deskpet::melody::{Buzzer, Melody};
use embassy_nrf::gpio::{AnyPin, Level, Output, OutputDrive};
use embassy_nrf::pwm::SimplePwm;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Timer;

/// Melodies waiting to be played.
static MELODIES: Channel<CriticalSectionRawMutex, Melody, 2> = Channel::new();

/// Two DC motors behind an H-bridge.
pub struct GpioMotor {
    left_a: Output<'static>,
    left_b: Output<'static>,
    right_a: Output<'static>,
    right_b: Output<'static>,
}

impl GpioMotor {
    pub fn new(left_a: AnyPin, left_b: AnyPin, right_a: AnyPin, right_b: AnyPin) -> Self {
        let out = |pin| Output::new(pin, Level::Low, OutputDrive::Standard);
        Self {
            left_a: out(left_a),
            left_b: out(left_b),
            right_a: out(right_a),
            right_b: out(right_b),
        }
    }

    fn set(&mut self, left: (bool, bool), right: (bool, bool)) {
        self.left_a.set_level(left.0.into());
        self.left_b.set_level(left.1.into());
        self.right_a.set_level(right.0.into());
        self.right_b.set_level(right.1.into());
    }
}

impl Motor for GpioMotor {
    fn forward(&mut self) {
        self.set((true, false), (true, false));
    }

    fn backward(&mut self) {
        self.set((false, true), (false, true));
    }

    fn left(&mut self) {
        self.set((false, true), (true, false));
    }

    fn right(&mut self) {
        self.set((true, false), (false, true));
    }

    fn stop(&mut self) {
        self.set((false, false), (false, false));
    }
}

/// [`Buzzer`] handle: queues the melody for [`buzzer_task`].
pub struct PwmBuzzer;

impl Buzzer for PwmBuzzer {
    fn play(&mut self, melody: &Melody) {
        if MELODIES.try_send(melody.clone()).is_err() {
            warn!("Buzzer: busy, melody dropped");
        }
    }
}

/// Play queued melodies on the piezo.
#[embassy_executor::task]
pub async fn buzzer_task(mut pwm: SimplePwm<'static, embassy_nrf::peripherals::PWM0>) -> ! {
    pwm.disable();
    loop {
        let melody = MELODIES.receive().await;
        debug!("Buzzer: playing {} notes", melody.len());

        for note in &melody {
            if note.frequency_hz > 0 {
                pwm.set_period(note.frequency_hz);
                pwm.enable();
                pwm.set_duty(0, pwm.max_duty() / 2);
            }
            Timer::after_millis(note.duration_ms as u64).await;
            pwm.disable();
            Timer::after_millis(note.pause_ms as u64).await;
        }
    }
}
