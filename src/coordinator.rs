//! Top-level arbiter between the pet's modes.
//!
//! The [`Coordinator`] consumes button gestures, link events and the clock,
//! asks [`route`] what each one means in the current [`Mode`], and hands
//! per-tick work to whichever sub-engine owns the screen.  Every switch runs
//! `leave(old)`, blanks the panel, then `enter(new)`, so no timer of an
//! abandoned mode can fire afterwards.

use core::fmt::Write as _;

use crate::ble::message::{classify, IncomingEvent};
use crate::ble::LinkEvent;
use crate::board::{Board, Devices, LinkControl};
use crate::clock::{elapsed, Millis};
use crate::config::{LINK_GREETING, MAX_NETWORKS, MEDIA_AMPLITUDE_THRESHOLD, MEDIA_TIMEOUT_MS};
use crate::melody::{self, Buzzer, BOOT_CHIME};
use crate::mode::{route, Mode, Route, Stimulus};
use crate::pet::{Mood, MoodEngine};
use crate::settings::{Flag, Settings};
use crate::ui::media::MediaPresenter;
use crate::ui::menu::{InfoField, InfoText, MenuAction, MenuHost, MenuNavigator, MenuSignal, MenuView};
use crate::ui::menu_tree;
use crate::ui::notification::NotificationPresenter;
use crate::ui::ButtonEvent;

pub struct Coordinator {
    mode: Mode,
    /// Where to go once the notification card expires.
    return_mode: Mode,
    pet: MoodEngine,
    menu: MenuNavigator,
    media: MediaPresenter,
    notification: NotificationPresenter,
    settings: Settings,
    /// Start of Media or its last update above the amplitude threshold.
    media_at: Millis,
    connected: bool,
    booted_at: Millis,
    /// A long press closed the menu; its release must not reach the pet.
    swallow_release: bool,
}

impl Coordinator {
    pub fn new(settings: Settings) -> Self {
        Self {
            mode: Mode::Animation,
            return_mode: Mode::Animation,
            pet: MoodEngine::new(),
            menu: menu_tree::navigator(),
            media: MediaPresenter::new(),
            notification: NotificationPresenter::new(),
            settings,
            media_at: 0,
            connected: false,
            booted_at: 0,
            swallow_release: false,
        }
    }

    /// Boot: play the chime, bring the link up if enabled and start the idle
    /// animation.
    pub fn start<B: Board>(&mut self, dev: &mut Devices<B>, now: Millis) {
        self.booted_at = now;
        dev.buzzer.play(&melody::parse(BOOT_CHIME));

        let bluetooth = self.settings.flag(Flag::Bluetooth);
        info!("Coordinator: starting, bluetooth {}", bluetooth);
        dev.link.set_enabled(bluetooth);

        dev.blank();
        self.mode = Mode::Animation;
        self.enter(dev, Mode::Animation, now);
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn mood(&self) -> Mood {
        self.pet.mood()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn handle_button<B: Board>(&mut self, dev: &mut Devices<B>, event: ButtonEvent, now: Millis) {
        if self.swallow_release {
            self.swallow_release = false;
            if event == ButtonEvent::LongPressEnd {
                return;
            }
        }
        match route(self.mode, Stimulus::Button(event)) {
            Route::Forward => match self.mode {
                Mode::Animation => self.pet.handle_button(dev, event, now),
                Mode::Menu => {
                    let mut host = MenuContext {
                        dev: &mut *dev,
                        settings: &mut self.settings,
                        connected: self.connected,
                        uptime: elapsed(now, self.booted_at),
                    };
                    if self.menu.handle_button(&mut host, event) == MenuSignal::Exit {
                        self.swallow_release = event == ButtonEvent::LongPressStart;
                        let next = route(self.mode, Stimulus::MenuExit);
                        self.follow(dev, next, now);
                    }
                }
                _ => {}
            },
            next => self.follow(dev, next, now),
        }
    }

    pub fn handle_link<B: Board>(&mut self, dev: &mut Devices<B>, event: LinkEvent, now: Millis) {
        match event {
            LinkEvent::Connected => {
                info!("Link: connected");
                self.connected = true;
                if let Err(e) = dev.link.send(LINK_GREETING) {
                    warn!("Link: greeting failed: {:?}", e);
                }
            }
            LinkEvent::Disconnected => {
                info!("Link: disconnected");
                self.connected = false;
                let next = route(self.mode, Stimulus::Disconnected);
                self.follow(dev, next, now);
            }
            LinkEvent::Received(text) => self.handle_message(dev, &text, now),
        }
    }

    /// Classify a raw message from the app and act on it.
    pub fn handle_message<B: Board>(&mut self, dev: &mut Devices<B>, text: &str, now: Millis) {
        self.handle_incoming(dev, classify(text), now);
    }

    pub fn handle_incoming<B: Board>(&mut self, dev: &mut Devices<B>, event: IncomingEvent, now: Millis) {
        let stimulus = match &event {
            IncomingEvent::Notification(_) => Stimulus::Notification,
            IncomingEvent::Media(payload) => Stimulus::Media {
                qualifies: payload.amplitude() > MEDIA_AMPLITUDE_THRESHOLD,
            },
            IncomingEvent::Unrecognized => Stimulus::Unrecognized,
            IncomingEvent::DecodeError => Stimulus::DecodeError,
        };
        let next = route(self.mode, stimulus);

        match (next, event) {
            // Keep the track metadata current under a notification card.
            (Route::Drop, IncomingEvent::Media(payload))
                if self.mode == Mode::Notification && self.return_mode == Mode::Media =>
            {
                self.media.apply(&payload, now);
            }
            (Route::Drop, _) => debug!("Coordinator: dropped {} in {}", stimulus, self.mode),
            (Route::Switch(Mode::Notification), IncomingEvent::Notification(payload)) => {
                self.return_mode = match self.mode {
                    Mode::Media if self.media_timed_out(now) => Mode::Animation,
                    mode => mode,
                };
                self.switch(dev, Mode::Notification, now);
                self.notification.show(payload, now);
            }
            (Route::Stay, IncomingEvent::Notification(payload)) => self.notification.show(payload, now),
            (Route::Switch(Mode::Media) | Route::Stay, IncomingEvent::Media(payload)) => {
                if next != Route::Stay {
                    self.switch(dev, Mode::Media, now);
                }
                if matches!(stimulus, Stimulus::Media { qualifies: true }) {
                    self.media_at = now;
                }
                self.media.apply(&payload, now);
            }
            (next, _) => self.follow(dev, next, now),
        }
    }

    /// Per-tick work: expire timers, then let the active mode draw.
    pub fn update<B: Board>(&mut self, dev: &mut Devices<B>, now: Millis) {
        if self.mode == Mode::Notification && self.notification.is_expired(now) {
            let next = route(self.mode, Stimulus::NotificationExpired);
            self.follow(dev, next, now);
        }
        if self.mode == Mode::Media && self.media_timed_out(now) {
            let next = route(self.mode, Stimulus::MediaTimeout);
            self.follow(dev, next, now);
        }

        let drawn = match self.mode {
            Mode::Animation => {
                // Presents its own frames.
                self.pet.update(dev, now);
                false
            }
            Mode::Media => self.media.render(&mut dev.display, &mut dev.rng, now),
            Mode::Notification => self.notification.render(&mut dev.display, now),
            Mode::Menu => {
                let status = MenuStatus {
                    settings: &self.settings,
                    connected: self.connected,
                    uptime: elapsed(now, self.booted_at),
                };
                self.menu.render(&mut dev.display, &status, now)
            }
        };
        if drawn {
            dev.present();
        }
    }

    fn follow<B: Board>(&mut self, dev: &mut Devices<B>, next: Route, now: Millis) {
        match next {
            Route::Switch(mode) => self.switch(dev, mode, now),
            Route::Restore => self.switch(dev, self.return_mode, now),
            Route::Drop | Route::Stay | Route::Forward => {}
        }
    }

    fn media_timed_out(&self, now: Millis) -> bool {
        elapsed(now, self.media_at) > MEDIA_TIMEOUT_MS
    }

    fn switch<B: Board>(&mut self, dev: &mut Devices<B>, to: Mode, now: Millis) {
        info!("Mode: {} -> {}", self.mode, to);
        self.leave(dev);
        dev.blank();
        self.mode = to;
        self.enter(dev, to, now);
    }

    fn leave<B: Board>(&mut self, dev: &mut Devices<B>) {
        match self.mode {
            Mode::Animation => {
                dev.drive.stop();
                self.pet.suspend();
            }
            Mode::Media => self.media.stop(),
            Mode::Notification => self.notification.dismiss(),
            Mode::Menu => self.menu.reset(),
        }
    }

    fn enter<B: Board>(&mut self, dev: &mut Devices<B>, mode: Mode, now: Millis) {
        match mode {
            Mode::Animation => self.pet.resume(dev, now),
            Mode::Media => {
                self.media_at = now;
                self.media.start(now);
            }
            Mode::Notification => {}
            Mode::Menu => self.menu.reset(),
        }
    }
}

/// Read-only state shown by the menu.
struct MenuStatus<'a> {
    settings: &'a Settings,
    connected: bool,
    uptime: Millis,
}

impl MenuView for MenuStatus<'_> {
    fn flag(&self, flag: Flag) -> bool {
        self.settings.flag(flag)
    }

    fn info(&self, field: InfoField) -> InfoText {
        let mut text = InfoText::new();
        let _ = match field {
            InfoField::Uptime => {
                let secs = self.uptime / 1000;
                write!(text, "{}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
            }
            InfoField::Networks => write!(text, "{}/{}", self.settings.networks().len(), MAX_NETWORKS),
            InfoField::Link => text.write_str(if !self.settings.flag(Flag::Bluetooth) {
                "Off"
            } else if self.connected {
                "Connected"
            } else {
                "Waiting"
            }),
            InfoField::Version => text.write_str(env!("CARGO_PKG_VERSION")),
        };
        text
    }
}

/// What the menu acts on while it has the button.
struct MenuContext<'a, B: Board> {
    dev: &'a mut Devices<B>,
    settings: &'a mut Settings,
    connected: bool,
    uptime: Millis,
}

impl<B: Board> MenuContext<'_, B> {
    fn status(&self) -> MenuStatus<'_> {
        MenuStatus {
            settings: self.settings,
            connected: self.connected,
            uptime: self.uptime,
        }
    }
}

impl<B: Board> MenuView for MenuContext<'_, B> {
    fn flag(&self, flag: Flag) -> bool {
        self.settings.flag(flag)
    }

    fn info(&self, field: InfoField) -> InfoText {
        self.status().info(field)
    }
}

impl<B: Board> MenuHost for MenuContext<'_, B> {
    fn set_flag(&mut self, flag: Flag, value: bool) {
        self.settings.set_flag(flag, value);
    }

    fn toggled(&mut self, flag: Flag, value: bool) {
        info!("Settings: {} -> {}", flag, value);
        if flag == Flag::Bluetooth {
            self.dev.link.set_enabled(value);
        }
    }

    fn run(&mut self, action: MenuAction) {
        match action {
            MenuAction::Drive(direction) => self.dev.pulse(direction),
            MenuAction::PlayChime => self.dev.buzzer.play(&melody::parse(BOOT_CHIME)),
            MenuAction::Exit => {}
        }
    }
}
