//! Host-testable core of the deskpet firmware.
//!
//! Everything that decides what the pet does lives here: the button
//! debouncer, the companion-app message classifier, the mood engine, the
//! menu, the media and notification presenters and the coordinator that
//! arbitrates between them.  Hardware is reached only through the traits in
//! [`board`], so the whole behaviour runs under `cargo test` on the host.
//!
//! Usage: `cargo test --lib` or `cargo test`
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and wires these modules to the nRF52840 peripherals.

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to every module below.
#[macro_use]
mod fmt;

// ═══════════════════════════════════════════════════════════════════════════
// Foundations
// ═══════════════════════════════════════════════════════════════════════════

pub mod clock;
pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════════════════
// Collaborators
// ═══════════════════════════════════════════════════════════════════════════

pub mod board;
pub mod drive;
pub mod melody;
pub mod settings;

// ═══════════════════════════════════════════════════════════════════════════
// Link, behaviour and screens
// ═══════════════════════════════════════════════════════════════════════════

pub mod ble;
pub mod pet;
pub mod ui;

// ═══════════════════════════════════════════════════════════════════════════
// Arbitration
// ═══════════════════════════════════════════════════════════════════════════

pub mod coordinator;
pub mod mode;

pub use coordinator::Coordinator;
pub use error::{Error, LinkError};
pub use mode::Mode;

#[cfg(test)]
mod testing;
