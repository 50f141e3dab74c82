//! The pet's menu, opened with five clicks from the idle animation.

use crate::drive::Direction;
use crate::settings::Flag;
use crate::ui::menu::{InfoField, MenuAction, MenuItem, MenuNavigator};

pub const ROOT_TITLE: &str = "Menu";

const SETTINGS: &[MenuItem] = &[
    MenuItem::toggle("Bluetooth", Flag::Bluetooth),
    MenuItem::toggle("WiFi", Flag::Wifi),
];

const MOTOR_TEST: &[MenuItem] = &[
    MenuItem::action("Forward", MenuAction::Drive(Direction::Forward)),
    MenuItem::action("Backward", MenuAction::Drive(Direction::Backward)),
    MenuItem::action("Left", MenuAction::Drive(Direction::Left)),
    MenuItem::action("Right", MenuAction::Drive(Direction::Right)),
];

const INFO: &[MenuItem] = &[
    MenuItem::info("Uptime", InfoField::Uptime),
    MenuItem::info("Networks", InfoField::Networks),
    MenuItem::info("Link", InfoField::Link),
    MenuItem::info("Version", InfoField::Version),
];

pub const ROOT: &[MenuItem] = &[
    MenuItem::submenu("Settings", SETTINGS),
    MenuItem::submenu("Motor test", MOTOR_TEST),
    MenuItem::action("Play chime", MenuAction::PlayChime),
    MenuItem::submenu("Info", INFO),
    MenuItem::action("Exit", MenuAction::Exit),
];

/// Navigator positioned at the root of the pet's menu.
pub const fn navigator() -> MenuNavigator {
    MenuNavigator::new(ROOT_TITLE, ROOT)
}
