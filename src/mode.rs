//! Top-level mode routing table.
//!
//! Exactly one [`Mode`] owns the display and motors at a time.  [`route`]
//! decides, for the current mode and an incoming [`Stimulus`], what the
//! coordinator should do.  It is a pure function so every rule can be
//! checked in isolation.

use crate::config::MENU_CLICK_COUNT;
use crate::ui::ButtonEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Idle eyes driven by the mood engine.
    Animation,
    /// Audio visualiser.
    Media,
    /// Notification card.
    Notification,
    /// Settings menu.
    Menu,
}

/// Something the coordinator has to react to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stimulus {
    Notification,
    /// A media update; `qualifies` if its amplitude is above the threshold.
    Media { qualifies: bool },
    Unrecognized,
    DecodeError,
    NotificationExpired,
    MediaTimeout,
    Button(ButtonEvent),
    /// The menu asked to close.
    MenuExit,
    Disconnected,
}

/// What to do with a stimulus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Route {
    /// Ignore it.
    Drop,
    /// Leave the current mode and enter another.
    Switch(Mode),
    /// Stay, handing the payload to the current mode's presenter.
    Stay,
    /// Pass the button event to the active sub-engine.
    Forward,
    /// Leave Notification and go back to where it interrupted.
    Restore,
}

pub fn route(mode: Mode, stimulus: Stimulus) -> Route {
    use Mode::*;

    match (mode, stimulus) {
        (_, Stimulus::DecodeError | Stimulus::Unrecognized) => Route::Drop,

        (Menu, Stimulus::Notification) => Route::Drop,
        (Notification, Stimulus::Notification) => Route::Stay,
        (_, Stimulus::Notification) => Route::Switch(Notification),

        (Notification, Stimulus::NotificationExpired) => Route::Restore,
        (_, Stimulus::NotificationExpired) => Route::Drop,

        (Notification | Menu, Stimulus::Media { .. }) => Route::Drop,
        (Media, Stimulus::Media { .. }) => Route::Stay,
        (Animation, Stimulus::Media { qualifies: true }) => Route::Switch(Media),
        (Animation, Stimulus::Media { qualifies: false }) => Route::Drop,

        (Media, Stimulus::MediaTimeout) => Route::Switch(Animation),
        (_, Stimulus::MediaTimeout) => Route::Drop,

        (Animation, Stimulus::Button(ButtonEvent::Click(n))) if n == MENU_CLICK_COUNT => {
            Route::Switch(Menu)
        }
        (Animation | Menu, Stimulus::Button(_)) => Route::Forward,
        (Media | Notification, Stimulus::Button(_)) => Route::Drop,

        (Menu, Stimulus::MenuExit) => Route::Switch(Animation),
        (_, Stimulus::MenuExit) => Route::Drop,

        (Menu, Stimulus::Disconnected) => Route::Drop,
        (_, Stimulus::Disconnected) => Route::Switch(Animation),
    }
}
