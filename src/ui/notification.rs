//! Notification card.
//!
//! Layout: app icon and name on the first row, the time (HH:MM:SS) right
//! aligned below it, a separator, up to three text lines and a progress bar
//! along the bottom edge that fills as the card's lifetime runs out.
//! Over-wide name and lines scroll as a marquee.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    Line, PrimitiveStyle, Rectangle, RoundedRectangle, Triangle,
};
use heapless::String;

use crate::ble::message::NotificationPayload;
use crate::clock::{elapsed, has_elapsed, Millis};
use crate::config::{NOTIFICATION_DURATION_MS, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::ui::text::{self, Marquee, ScrollClock};

/// Lines that fit on the card.
pub const VISIBLE_LINES: usize = 3;

const NAME_X: i32 = 18;
const NAME_GAP: i32 = 12;
const LINE_GAP: i32 = 18;
const FIRST_LINE_Y: i32 = 25;
const LINE_HEIGHT: i32 = 12;
/// Timestamps look like `YYYY-MM-DD HH:MM:SS`; the clock part starts here.
const TIME_OFFSET: usize = 11;

/// Icon drawn next to the app name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AppIcon {
    Chat,
    PaperPlane,
    Envelope,
    Bell,
}

impl AppIcon {
    /// Pick an icon by case-insensitive match on the app name.
    pub fn for_app(app: &str) -> Self {
        let mut lower: String<32> = String::new();
        for c in app.chars() {
            if lower.push(c.to_ascii_lowercase()).is_err() {
                break;
            }
        }
        if lower.contains("whatsapp") {
            AppIcon::Chat
        } else if lower.contains("telegram") {
            AppIcon::PaperPlane
        } else if lower.contains("gmail") || lower.contains("email") {
            AppIcon::Envelope
        } else {
            AppIcon::Bell
        }
    }

    fn draw<D>(self, target: &mut D)
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let on = PrimitiveStyle::with_fill(BinaryColor::On);
        let off = PrimitiveStyle::with_fill(BinaryColor::Off);
        let line = |a: (i32, i32), b: (i32, i32), color: BinaryColor| {
            Line::new(Point::new(a.0, a.1), Point::new(b.0, b.1))
                .into_styled(PrimitiveStyle::with_stroke(color, 1))
        };

        match self {
            AppIcon::Chat => {
                let bubble = Rectangle::new(Point::new(2, 2), Size::new(12, 10));
                let _ = RoundedRectangle::with_equal_corners(bubble, Size::new(2, 2))
                    .into_styled(on)
                    .draw(target);
                let _ = Triangle::new(Point::new(12, 10), Point::new(14, 12), Point::new(12, 12))
                    .into_styled(on)
                    .draw(target);
                let _ = line((4, 5), (9, 5), BinaryColor::Off).draw(target);
                let _ = line((4, 8), (9, 8), BinaryColor::Off).draw(target);
            }
            AppIcon::PaperPlane => {
                let _ = Triangle::new(Point::new(2, 8), Point::new(14, 2), Point::new(14, 14))
                    .into_styled(on)
                    .draw(target);
                let _ = Triangle::new(Point::new(8, 8), Point::new(14, 8), Point::new(11, 11))
                    .into_styled(off)
                    .draw(target);
            }
            AppIcon::Envelope => {
                let _ = Rectangle::new(Point::new(2, 4), Size::new(12, 8))
                    .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
                    .draw(target);
                let _ = line((2, 4), (8, 8), BinaryColor::On).draw(target);
                let _ = line((13, 4), (8, 8), BinaryColor::On).draw(target);
            }
            AppIcon::Bell => {
                let body = Rectangle::new(Point::new(5, 3), Size::new(6, 7));
                let _ = RoundedRectangle::with_equal_corners(body, Size::new(2, 2))
                    .into_styled(on)
                    .draw(target);
                let _ = Rectangle::new(Point::new(7, 2), Size::new(2, 2))
                    .into_styled(on)
                    .draw(target);
                let _ = Rectangle::new(Point::new(4, 10), Size::new(8, 2))
                    .into_styled(on)
                    .draw(target);
                let _ = Rectangle::new(Point::new(6, 6), Size::new(4, 3))
                    .into_styled(off)
                    .draw(target);
            }
        }
    }
}

pub struct NotificationPresenter {
    payload: NotificationPayload,
    icon: AppIcon,
    shown_at: Millis,
    active: bool,
    /// Index 0 scrolls the app name, 1.. the visible lines.
    marquees: [Marquee; VISIBLE_LINES + 1],
    scroll_clock: ScrollClock,
    redraw: bool,
}

impl Default for NotificationPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationPresenter {
    pub fn new() -> Self {
        Self {
            payload: NotificationPayload::default(),
            icon: AppIcon::Bell,
            shown_at: 0,
            active: false,
            marquees: [Marquee::default(); VISIBLE_LINES + 1],
            scroll_clock: ScrollClock::default(),
            redraw: false,
        }
    }

    /// Show `payload`, restarting the countdown.
    pub fn show(&mut self, payload: NotificationPayload, now: Millis) {
        info!(
            "Notification from {=str}: {} lines",
            payload.app.as_str(),
            payload.lines.0.len()
        );
        self.icon = AppIcon::for_app(&payload.app);
        self.payload = payload;
        self.shown_at = now;
        self.active = true;
        self.marquees = [Marquee::default(); VISIBLE_LINES + 1];
        self.scroll_clock.restart(now);
        self.redraw = true;
    }

    pub fn dismiss(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn payload(&self) -> &NotificationPayload {
        &self.payload
    }

    pub fn icon(&self) -> AppIcon {
        self.icon
    }

    /// Whether the card's lifetime has run out.
    pub fn is_expired(&self, now: Millis) -> bool {
        self.active && has_elapsed(now, self.shown_at, NOTIFICATION_DURATION_MS)
    }

    /// Milliseconds left before the card expires.
    pub fn remaining(&self, now: Millis) -> Millis {
        if !self.active {
            return 0;
        }
        NOTIFICATION_DURATION_MS.saturating_sub(elapsed(now, self.shown_at))
    }

    /// Draw the card when it changed or a scroll step is due.
    ///
    /// Returns `true` when a frame was drawn and needs presenting.
    pub fn render<D>(&mut self, target: &mut D, now: Millis) -> bool
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        if !self.active || self.is_expired(now) {
            return false;
        }
        let step = self.scroll_clock.tick(now);
        if !step && !self.redraw {
            return false;
        }
        self.redraw = false;

        let _ = target.clear(BinaryColor::Off);
        self.icon.draw(target);

        let app = self.payload.app.as_str();
        self.marquees[0].draw(
            target,
            app,
            Point::new(NAME_X, 0),
            SCREEN_WIDTH - NAME_X - 14,
            NAME_GAP,
        );

        let time = clock_part(&self.payload.time);
        if !time.is_empty() {
            let x = SCREEN_WIDTH - text::width(time) - 2;
            text::draw(target, time, Point::new(x, 11), BinaryColor::On);
        }

        let _ = Line::new(Point::new(0, 22), Point::new(SCREEN_WIDTH - 1, 22))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(target);

        for (i, line) in self.payload.lines.0.iter().take(VISIBLE_LINES).enumerate() {
            let y = FIRST_LINE_Y + i as i32 * LINE_HEIGHT;
            self.marquees[i + 1].draw(target, line, Point::new(2, y), SCREEN_WIDTH - 4, LINE_GAP);
        }

        let progress = elapsed(now, self.shown_at) as i32 * SCREEN_WIDTH / NOTIFICATION_DURATION_MS as i32;
        if progress > 0 {
            let _ = Line::new(
                Point::new(0, SCREEN_HEIGHT - 2),
                Point::new(progress - 1, SCREEN_HEIGHT - 2),
            )
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(target);
        }

        if step {
            self.marquees[0].advance(text::width(app), SCREEN_WIDTH - NAME_X - 14, NAME_GAP);
            for (i, line) in self.payload.lines.0.iter().take(VISIBLE_LINES).enumerate() {
                self.marquees[i + 1].advance(text::width(line), SCREEN_WIDTH - 4, LINE_GAP);
            }
        }

        true
    }
}

/// `HH:MM:SS` part of a `YYYY-MM-DD HH:MM:SS` timestamp (empty if shorter).
pub fn clock_part(timestamp: &str) -> &str {
    match timestamp.char_indices().nth(TIME_OFFSET) {
        Some((i, _)) => &timestamp[i..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::message::{Lines, Text};
    use crate::testing::FrameBuffer;

    fn payload(app: &str, lines: &[&str]) -> NotificationPayload {
        let mut l = Lines::default();
        for line in lines {
            let _ = l.0.push(Text::new(line));
        }
        NotificationPayload {
            app: Text::new(app),
            time: Text::new("2024-05-01 12:34:56"),
            lines: l,
        }
    }

    #[test]
    fn icon_by_app_name() {
        assert_eq!(AppIcon::for_app("WhatsApp Business"), AppIcon::Chat);
        assert_eq!(AppIcon::for_app("TELEGRAM"), AppIcon::PaperPlane);
        assert_eq!(AppIcon::for_app("Gmail"), AppIcon::Envelope);
        assert_eq!(AppIcon::for_app("Work Email"), AppIcon::Envelope);
        assert_eq!(AppIcon::for_app("Calendar"), AppIcon::Bell);
        assert_eq!(AppIcon::for_app(""), AppIcon::Bell);
    }

    #[test]
    fn clock_part_of_timestamp() {
        assert_eq!(clock_part("2024-05-01 12:34:56"), "12:34:56");
        assert_eq!(clock_part("12:34"), "");
        assert_eq!(clock_part(""), "");
    }

    #[test]
    fn expires_after_fifteen_seconds() {
        let mut n = NotificationPresenter::new();
        n.show(payload("x", &["a"]), 1_000);
        assert!(!n.is_expired(15_999));
        assert_eq!(n.remaining(15_999), 1);
        assert!(n.is_expired(16_000));
        assert_eq!(n.remaining(16_000), 0);
    }

    #[test]
    fn show_again_restarts_countdown() {
        let mut n = NotificationPresenter::new();
        n.show(payload("x", &["a"]), 0);
        n.show(payload("y", &["b"]), 10_000);
        assert!(!n.is_expired(20_000));
        assert_eq!(n.payload().app.as_str(), "y");
    }

    #[test]
    fn dismissed_card_never_expires_or_draws() {
        let mut n = NotificationPresenter::new();
        let mut fb = FrameBuffer::new();
        n.show(payload("x", &["a"]), 0);
        n.dismiss();
        assert!(!n.is_expired(60_000));
        assert!(!n.render(&mut fb, 100));
    }

    #[test]
    fn draws_on_show_then_on_scroll_steps() {
        let mut n = NotificationPresenter::new();
        let mut fb = FrameBuffer::new();
        n.show(payload("Telegram", &["hello", "world"]), 0);
        assert!(n.render(&mut fb, 0));
        assert!(fb.lit() > 0);
        assert!(!n.render(&mut fb, 50));
        assert!(n.render(&mut fb, 100));
    }

    #[test]
    fn progress_bar_grows() {
        let mut n = NotificationPresenter::new();
        let mut fb = FrameBuffer::new();
        n.show(payload("x", &[]), 0);
        n.render(&mut fb, 0);
        assert!(!fb.pixel(10, 62));
        n.render(&mut fb, 7_500);
        assert!(fb.pixel(10, 62));
        assert!(fb.pixel(63, 62));
        assert!(!fb.pixel(70, 62));
    }
}
