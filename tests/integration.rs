//! Integration tests for the deskpet behaviour core, driven end-to-end
//! through the public API with a fake board.

use std::cell::RefCell;
use std::rc::Rc;

use deskpet::ble::LinkEvent;
use deskpet::board::{Board, Devices, LinkControl, Surface};
use deskpet::drive::{Direction, Motor};
use deskpet::melody::{Buzzer, Melody};
use deskpet::pet::Mood;
use deskpet::settings::{Flag, Settings};
use deskpet::ui::debounce::Debouncer;
use deskpet::ui::ButtonEvent;
use deskpet::{Coordinator, Error, Mode};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_hal::delay::DelayNs;
use nanorand::WyRand;

// ════════════════════════════════════════════════════════════════════════════
// Fake board
// ════════════════════════════════════════════════════════════════════════════

struct Screen {
    lit: Vec<bool>,
    presents: usize,
}

impl Screen {
    fn new() -> Self {
        Self {
            lit: vec![false; 128 * 64],
            presents: 0,
        }
    }

    fn is_blank(&self) -> bool {
        !self.lit.iter().any(|p| *p)
    }
}

impl OriginDimensions for Screen {
    fn size(&self) -> Size {
        Size::new(128, 64)
    }
}

impl DrawTarget for Screen {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            if (0..128).contains(&p.x) && (0..64).contains(&p.y) {
                self.lit[(p.y * 128 + p.x) as usize] = color.is_on();
            }
        }
        Ok(())
    }
}

impl Surface for Screen {
    fn present(&mut self) -> Result<(), Error> {
        self.presents += 1;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Call {
    Run(Direction),
    Stop,
}

/// Motor whose call log stays readable after the devices are built.
#[derive(Clone, Default)]
struct SharedMotor(Rc<RefCell<Vec<Call>>>);

impl Motor for SharedMotor {
    fn forward(&mut self) {
        self.0.borrow_mut().push(Call::Run(Direction::Forward));
    }
    fn backward(&mut self) {
        self.0.borrow_mut().push(Call::Run(Direction::Backward));
    }
    fn left(&mut self) {
        self.0.borrow_mut().push(Call::Run(Direction::Left));
    }
    fn right(&mut self) {
        self.0.borrow_mut().push(Call::Run(Direction::Right));
    }
    fn stop(&mut self) {
        self.0.borrow_mut().push(Call::Stop);
    }
}

#[derive(Default)]
struct Speaker {
    played: usize,
}

impl Buzzer for Speaker {
    fn play(&mut self, _melody: &Melody) {
        self.played += 1;
    }
}

struct Instant;

impl DelayNs for Instant {
    fn delay_ns(&mut self, _ns: u32) {}
}

#[derive(Default)]
struct Radio {
    sent: Vec<String>,
    enabled: Option<bool>,
}

impl LinkControl for Radio {
    fn send(&mut self, text: &str) -> Result<(), Error> {
        self.sent.push(text.to_string());
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = Some(enabled);
    }
}

struct FakeBoard;

impl Board for FakeBoard {
    type Display = Screen;
    type Motor = SharedMotor;
    type Buzzer = Speaker;
    type Delay = Instant;
    type Link = Radio;
    type Rng = WyRand;
}

struct Rig {
    pet: Coordinator,
    dev: Devices<FakeBoard>,
    motor: Rc<RefCell<Vec<Call>>>,
}

impl Rig {
    fn boot() -> Self {
        let motor = SharedMotor::default();
        let log = motor.0.clone();
        let mut dev = Devices::new(
            Screen::new(),
            motor,
            Speaker::default(),
            Instant,
            Radio::default(),
            WyRand::new_seed(7),
        );
        let mut pet = Coordinator::new(Settings::new());
        pet.start(&mut dev, 0);
        Self { pet, dev, motor: log }
    }

    fn message(&mut self, text: &str, now: u32) {
        self.pet.handle_message(&mut self.dev, text, now);
    }

    fn button(&mut self, event: ButtonEvent, now: u32) {
        self.pet.handle_button(&mut self.dev, event, now);
    }

    fn tick(&mut self, now: u32) {
        self.pet.update(&mut self.dev, now);
    }
}

const NOTIFICATION: &str = r#"{"type":"notification","app":"WhatsApp","time":"2024-05-01 09:15:00","texts":["Lunch?","At noon"]}"#;

fn media(amplitude: f32) -> String {
    format!(
        r#"{{"type":"media","title":"Track","artist":"Artist","status":"playing","is_playing":true,"audio_amplitude":{{"amplitude":{},"peak":{},"rms":0.1}}}}"#,
        amplitude, amplitude
    )
}

// ════════════════════════════════════════════════════════════════════════════
// Mode switching
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn boot_starts_in_animation() {
    let rig = Rig::boot();
    assert_eq!(rig.pet.mode(), Mode::Animation);
    assert_eq!(rig.pet.mood(), Mood::Default);
    assert_eq!(rig.dev.buzzer.played, 1);
    assert_eq!(rig.dev.link.enabled, Some(true));
}

#[test]
fn loud_media_takes_over_then_times_out() {
    let mut rig = Rig::boot();
    rig.message(&media(0.5), 1_000);
    assert_eq!(rig.pet.mode(), Mode::Media);

    rig.tick(6_000);
    assert_eq!(rig.pet.mode(), Mode::Media);
    rig.tick(6_001);
    assert_eq!(rig.pet.mode(), Mode::Animation);
    assert_eq!(rig.pet.mood(), Mood::Default);
}

#[test]
fn quiet_media_updates_do_not_extend_the_session() {
    let mut rig = Rig::boot();
    rig.message(&media(0.5), 0);
    rig.message(&media(0.0), 4_000);
    assert_eq!(rig.pet.mode(), Mode::Media);

    rig.tick(5_001);
    assert_eq!(rig.pet.mode(), Mode::Animation);
}

#[test]
fn media_visualiser_draws_frames() {
    let mut rig = Rig::boot();
    rig.message(&media(0.8), 0);
    let before = rig.dev.display.presents;
    for t in (0..500).step_by(40) {
        rig.tick(t);
    }
    assert!(rig.dev.display.presents > before);
    assert!(!rig.dev.display.is_blank());
}

#[test]
fn notification_interrupts_media_and_returns() {
    let mut rig = Rig::boot();
    rig.message(&media(0.5), 0);
    rig.message(NOTIFICATION, 1_000);
    assert_eq!(rig.pet.mode(), Mode::Notification);

    // Music keeps playing under the card.
    for t in (2_000..=16_000).step_by(2_000) {
        rig.message(&media(0.5), t);
        rig.tick(t);
    }
    rig.tick(16_000);
    assert_eq!(rig.pet.mode(), Mode::Media);
}

#[test]
fn notification_returns_to_media_without_further_updates() {
    let mut rig = Rig::boot();
    rig.message(&media(0.5), 0);
    rig.tick(500);
    rig.message(NOTIFICATION, 1_000);

    rig.tick(16_000);
    assert_eq!(rig.pet.mode(), Mode::Media);
    rig.tick(21_001);
    assert_eq!(rig.pet.mode(), Mode::Animation);
}

#[test]
fn notification_expires_back_to_animation() {
    let mut rig = Rig::boot();
    rig.message(NOTIFICATION, 500);
    rig.tick(600);
    assert_eq!(rig.pet.mode(), Mode::Notification);
    assert!(!rig.dev.display.is_blank());

    rig.tick(15_500);
    assert_eq!(rig.pet.mode(), Mode::Animation);
}

#[test]
fn junk_changes_nothing() {
    let mut rig = Rig::boot();
    rig.message(&media(0.5), 0);
    for junk in ["", "not json", "{\"type\":", r#"{"type":"weather","temp":21}"#] {
        rig.message(junk, 100);
        assert_eq!(rig.pet.mode(), Mode::Media);
    }
}

#[test]
fn quoted_payload_is_accepted() {
    let mut rig = Rig::boot();
    let quoted = format!("\"{}\"", NOTIFICATION.replace('"', "\\\""));
    rig.message(&quoted, 0);
    assert_eq!(rig.pet.mode(), Mode::Notification);
}

#[test]
fn disconnect_leaves_media() {
    let mut rig = Rig::boot();
    rig.pet.handle_link(&mut rig.dev, LinkEvent::Connected, 0);
    assert_eq!(rig.dev.link.sent, vec!["Ready".to_string()]);

    rig.message(&media(0.5), 10);
    rig.pet.handle_link(&mut rig.dev, LinkEvent::Disconnected, 20);
    assert_eq!(rig.pet.mode(), Mode::Animation);
    assert!(!rig.pet.is_connected());
}

#[test]
fn received_link_event_is_classified() {
    let mut rig = Rig::boot();
    let text = heapless::String::try_from(NOTIFICATION).unwrap();
    rig.pet.handle_link(&mut rig.dev, LinkEvent::Received(text), 0);
    assert_eq!(rig.pet.mode(), Mode::Notification);
}

// ════════════════════════════════════════════════════════════════════════════
// Button and menu
// ════════════════════════════════════════════════════════════════════════════

/// Feed five quick presses through the debouncer and return the gesture.
fn five_clicks(debouncer: &mut Debouncer, start: u32) -> Option<ButtonEvent> {
    let mut t = start;
    let mut out = None;
    for _ in 0..5 {
        for (pressed, hold) in [(true, 80), (false, 80)] {
            for _ in 0..hold / 5 {
                t += 5;
                out = out.or(debouncer.update(pressed, t));
            }
        }
    }
    for _ in 0..100 {
        t += 5;
        out = out.or(debouncer.update(false, t));
    }
    out
}

#[test]
fn five_clicks_open_menu_and_exit_returns() {
    let mut rig = Rig::boot();
    let mut debouncer = Debouncer::new();
    let gesture = five_clicks(&mut debouncer, 0);
    assert_eq!(gesture, Some(ButtonEvent::Click(5)));

    rig.button(ButtonEvent::Click(5), 1_000);
    assert_eq!(rig.pet.mode(), Mode::Menu);
    rig.tick(1_005);
    assert!(!rig.dev.display.is_blank());

    // Up wraps to the last item, "Exit".
    rig.button(ButtonEvent::Click(3), 1_100);
    rig.button(ButtonEvent::Click(2), 1_200);
    assert_eq!(rig.pet.mode(), Mode::Animation);
    assert_eq!(rig.pet.mood(), Mood::Default);
}

#[test]
fn menu_ignores_link_traffic() {
    let mut rig = Rig::boot();
    rig.button(ButtonEvent::Click(5), 0);
    rig.message(NOTIFICATION, 10);
    rig.message(&media(0.9), 20);
    rig.pet.handle_link(&mut rig.dev, LinkEvent::Disconnected, 30);
    assert_eq!(rig.pet.mode(), Mode::Menu);
}

#[test]
fn wifi_toggle_marks_settings_dirty() {
    let mut rig = Rig::boot();
    rig.button(ButtonEvent::Click(5), 0);
    rig.button(ButtonEvent::Click(2), 10); // Settings
    rig.button(ButtonEvent::Click(1), 20); // WiFi
    rig.button(ButtonEvent::Click(2), 30);

    assert!(rig.pet.settings().flag(Flag::Wifi));
    assert!(rig.pet.settings().is_dirty());
    // Radio untouched by the WiFi toggle.
    assert_eq!(rig.dev.link.enabled, Some(true));

    let mut record = [0u8; deskpet::settings::RECORD_MAX_LEN];
    let len = rig.pet.settings().encode(&mut record).unwrap();
    let restored = Settings::decode(&record[..len]).unwrap();
    assert!(restored.flag(Flag::Wifi));
    assert!(restored.flag(Flag::Bluetooth));
}

#[test]
fn buttons_are_ignored_while_presenting() {
    let mut rig = Rig::boot();
    rig.message(NOTIFICATION, 0);
    rig.button(ButtonEvent::Click(5), 10);
    rig.button(ButtonEvent::LongPressStart, 20);
    assert_eq!(rig.pet.mode(), Mode::Notification);
}

#[test]
fn petting_makes_the_pet_react() {
    let mut rig = Rig::boot();
    rig.button(ButtonEvent::LongPressStart, 100);
    assert_eq!(rig.pet.mood(), Mood::LongHappy);
    rig.button(ButtonEvent::LongPressEnd, 900);
    assert_eq!(rig.pet.mood(), Mood::Happy);

    rig.button(ButtonEvent::Click(4), 1_000);
    assert_eq!(rig.pet.mood(), Mood::Scared);
}

// ════════════════════════════════════════════════════════════════════════════
// Motors
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn every_move_ends_with_one_stop() {
    let mut rig = Rig::boot();
    for t in (0..60_000).step_by(50) {
        rig.tick(t);
    }

    let calls = rig.motor.borrow();
    // The drivetrain stops once at construction.
    assert_eq!(calls.first(), Some(&Call::Stop));
    for pair in calls[1..].chunks(2) {
        assert!(matches!(pair[0], Call::Run(_)), "{:?}", pair);
        assert_eq!(pair.get(1), Some(&Call::Stop));
    }
}

#[test]
fn leaving_animation_does_not_stop_twice() {
    let mut rig = Rig::boot();
    let before = rig.motor.borrow().len();

    rig.message(&media(0.5), 10);
    rig.tick(5_100);
    rig.message(NOTIFICATION, 5_200);
    rig.tick(20_300);

    let calls = rig.motor.borrow();
    assert!(calls[before..].iter().all(|c| *c != Call::Stop));
}
