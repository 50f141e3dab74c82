//! User interface: button input and everything drawn on the OLED.
//!
//! - [`debounce`] turns the raw button level into gestures.
//! - [`eyes`] renders the idle animation.
//! - [`menu`] / [`menu_tree`] implement the settings menu.
//! - [`media`] and [`notification`] are the bounded-lifetime presenters.
//! - [`text`] holds shared text layout helpers.

pub mod debounce;
pub mod eyes;
pub mod media;
pub mod menu;
pub mod menu_tree;
pub mod notification;
pub mod text;

/// Gesture recognised on the single pushbutton.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    /// One or more short presses closed by a quiet window; carries the count.
    Click(u8),
    /// The button has been held for the long-press time.
    LongPressStart,
    /// A long press was released.
    LongPressEnd,
}
