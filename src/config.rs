//! Application-wide constants and compile-time configuration.
//!
//! All timing parameters, geometry, protocol constants and pin
//! assignments live here so they can be tuned in one place.

use crate::clock::Millis;

// Button

/// A level change must stay stable this long before it is accepted (ms).
pub const BUTTON_DEBOUNCE_MS: Millis = 50;

/// Quiet window after the last release that closes a multi-click (ms).
pub const BUTTON_MULTI_CLICK_MS: Millis = 300;

/// Hold time that turns a press into a long press (ms).
pub const BUTTON_LONG_PRESS_MS: Millis = 800;

/// Click count that opens the settings menu from the idle animation.
pub const MENU_CLICK_COUNT: u8 = 5;

// Modes

/// How long a notification stays on screen (ms).
pub const NOTIFICATION_DURATION_MS: Millis = 15_000;

/// Media mode ends after this long without a qualifying amplitude (ms).
pub const MEDIA_TIMEOUT_MS: Millis = 5_000;

/// Amplitude a media update must exceed to claim the screen.
pub const MEDIA_AMPLITUDE_THRESHOLD: f32 = 0.01;

// Mood engine

/// Dwell time in the default mood before wandering off (ms).
pub const MOOD_IDLE_MS: Millis = 5_000;
/// Dwell time in the curious mood (ms).
pub const MOOD_CURIOSITY_MS: Millis = 10_000;
/// Dwell time in the sleepy and asleep moods (ms).
pub const MOOD_SLEEP_MS: Millis = 10_000;
/// Dwell time in the angry mood (ms).
pub const MOOD_ANGRY_MS: Millis = 5_000;
/// Dwell time in the happy mood (ms).
pub const MOOD_HAPPY_MS: Millis = 500;
/// Dwell time in the scare (after-shock) mood (ms).
pub const MOOD_SCARE_MS: Millis = 4_000;
/// Dwell time in the scared mood (ms).
pub const MOOD_SCARED_MS: Millis = 2_000;

/// Random interval between autonomous moves in the default mood (ms, half-open).
pub const WANDER_INTERVAL_DEFAULT_MS: (Millis, Millis) = (1_600, 10_000);
/// Random interval between autonomous moves in the curious mood (ms, half-open).
pub const WANDER_INTERVAL_CURIOUS_MS: (Millis, Millis) = (3_200, 10_000);

/// Length of a single motor pulse (ms).
pub const MOTOR_PULSE_MS: u32 = 75;

/// Number of autonomous moves remembered by the left/right balancer.
pub const MOVEMENT_HISTORY_LEN: usize = 6;

// Display

/// OLED geometry (SSD1306 128×64).
pub const SCREEN_WIDTH: i32 = 128;
pub const SCREEN_HEIGHT: i32 = 64;

/// Width of one glyph of the 6×10 font, in pixels.
pub const GLYPH_WIDTH: i32 = 6;

/// Minimum time between two frames of the idle eyes (ms).
pub const EYES_FRAME_MS: Millis = 100;

/// Minimum time between two frames of the media visualiser (ms, ~30 FPS).
pub const MEDIA_FRAME_MS: Millis = 1_000 / 30;

/// Marquee step interval for over-wide text (ms).
pub const SCROLL_STEP_MS: Millis = 100;

// Companion-app link

/// Largest message accepted from the companion app, in bytes.
pub const MAX_MESSAGE_LEN: usize = 512;

/// Link events buffered between two loop iterations.
pub const LINK_QUEUE_LEN: usize = 8;

/// Advertised device name.
pub const BLE_DEVICE_NAME: &str = "DeskPet";

/// 128-bit UUID of the companion service, `1b5dccd3-ef4d-4df0-94b2-7f411f1e0844`.
pub const BLE_SERVICE_UUID: &str = "1b5dccd3-ef4d-4df0-94b2-7f411f1e0844";

/// 128-bit UUID of the message characteristic, `1999eae0-d5ad-4909-aff3-4a8875149db5`.
pub const BLE_MESSAGE_UUID: &str = "1999eae0-d5ad-4909-aff3-4a8875149db5";

/// Greeting sent to the companion app right after it connects.
pub const LINK_GREETING: &str = "Ready";

// Settings

/// Maximum number of stored network credentials.
pub const MAX_NETWORKS: usize = 10;

/// Flash page index where the settings store starts (4 KB per page on nRF52840).
pub const STORAGE_FLASH_PAGE_START: u32 = 240;

/// Number of flash pages reserved for the settings store.
pub const STORAGE_FLASH_PAGE_COUNT: u32 = 4;

// Main loop

/// Period of the cooperative main loop (ms).
pub const TICK_MS: u64 = 5;

// GPIO pin assignments (nRF52840-DK defaults)
//
// Logical names only; the concrete `embassy_nrf::peripherals::*` are picked
// in `main.rs`.  Adjust for your own board.
//
//   Button        → P0.11 (active-low, internal pull-up)
//   I²C SDA       → P0.26
//   I²C SCL       → P0.27
//   Buzzer (PWM0) → P0.13
//   Motor IN1..4  → P0.03, P0.04, P0.28, P0.29
