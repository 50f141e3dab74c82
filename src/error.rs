//! Unified error type for deskpet.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging.

/// Top-level error type used across the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Companion-app messages
    /// The payload is not a well-formed message document.
    Decode,

    /// The payload does not fit the receive buffer.
    PayloadTooLarge,

    // Link
    /// The BLE link reported an error.
    Link(LinkError),

    // Storage
    /// Flash read/write/erase failed.
    Storage,

    /// The settings record has no room for another entry.
    StorageFull,

    // Display
    /// The OLED could not be initialised or flushed.
    Display,

    // Generic
    /// Buffer too small for the requested operation.
    BufferOverflow,
}

/// Subset of BLE errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Advertising could not be started.
    AdvertiseFailed,
    /// A GATT notification could not be queued.
    NotifyFailed,
    /// No companion app is connected.
    NotConnected,
}

// Convenience conversions

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Error::Link(e)
    }
}

impl From<serde_json_core::de::Error> for Error {
    fn from(_: serde_json_core::de::Error) -> Self {
        Error::Decode
    }
}
