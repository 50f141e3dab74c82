//! Text layout helpers shared by the presenters and the menu.
//!
//! All text uses the 6×10 ASCII font with a top baseline, so a string's
//! on-screen width is `chars × GLYPH_WIDTH`.

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use heapless::String;

use crate::clock::{elapsed, Millis};
use crate::config::{GLYPH_WIDTH, SCROLL_STEP_MS};

/// Pixels a marquee advances per step.
const SCROLL_STEP_PX: i32 = 2;

pub fn style(color: BinaryColor) -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(color)
        .build()
}

/// Width of `text` in pixels.
pub fn width(text: &str) -> i32 {
    text.chars().count() as i32 * GLYPH_WIDTH
}

/// Draw `text` with its top-left corner at `origin`.
pub fn draw<D>(target: &mut D, text: &str, origin: Point, color: BinaryColor)
where
    D: DrawTarget<Color = BinaryColor>,
{
    let _ = Text::with_baseline(text, origin, style(color), Baseline::Top).draw(target);
}

/// Copy `text`, replacing the tail with `...` when it is longer than
/// `max_chars` characters.
pub fn ellipsize<const N: usize>(text: &str, max_chars: usize) -> String<N> {
    let mut out = String::new();
    if text.chars().count() <= max_chars {
        for c in text.chars() {
            if out.push(c).is_err() {
                break;
            }
        }
        return out;
    }
    for c in text.chars().take(max_chars.saturating_sub(3)) {
        if out.push(c).is_err() {
            break;
        }
    }
    let _ = out.push_str("...");
    out
}

/// Horizontal scroll state of one over-wide line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Marquee {
    offset: i32,
}

impl Marquee {
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Advance by one step if `text_width` does not fit `available`,
    /// wrapping after a full loop of `text_width + gap` pixels.
    pub fn advance(&mut self, text_width: i32, available: i32, gap: i32) {
        if text_width > available {
            self.offset += SCROLL_STEP_PX;
            if self.offset > text_width + gap {
                self.offset = 0;
            }
        }
    }

    /// Draw `text` at `origin`, scrolled when it does not fit `available`.
    /// Over-wide text is drawn twice so the loop appears seamless.
    pub fn draw<D>(&self, target: &mut D, text: &str, origin: Point, available: i32, gap: i32)
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let text_width = width(text);
        if text_width <= available {
            draw(target, text, origin, BinaryColor::On);
            return;
        }
        let loop_width = text_width + gap;
        let x = origin.x - self.offset % loop_width;
        draw(target, text, Point::new(x, origin.y), BinaryColor::On);
        draw(target, text, Point::new(x + loop_width, origin.y), BinaryColor::On);
    }
}

/// Rate limiter for marquee steps.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScrollClock {
    last_step: Millis,
}

impl ScrollClock {
    pub fn restart(&mut self, now: Millis) {
        self.last_step = now;
    }

    /// True once per [`SCROLL_STEP_MS`].
    pub fn tick(&mut self, now: Millis) -> bool {
        if elapsed(now, self.last_step) < SCROLL_STEP_MS {
            return false;
        }
        self.last_step = now;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_counts_chars() {
        assert_eq!(width(""), 0);
        assert_eq!(width("abc"), 18);
    }

    #[test]
    fn ellipsize_short_text_unchanged() {
        let s: String<32> = ellipsize("Bluetooth", 15);
        assert_eq!(s.as_str(), "Bluetooth");
    }

    #[test]
    fn ellipsize_long_text() {
        let s: String<32> = ellipsize("A very long menu label", 15);
        assert_eq!(s.as_str(), "A very long ...");
        assert_eq!(s.chars().count(), 15);
    }

    #[test]
    fn marquee_only_moves_when_text_overflows() {
        let mut m = Marquee::default();
        m.advance(50, 100, 12);
        assert_eq!(m.offset(), 0);
        m.advance(200, 100, 12);
        assert_eq!(m.offset(), 2);
    }

    #[test]
    fn marquee_wraps_after_full_loop() {
        let mut m = Marquee::default();
        for _ in 0..(110 / 2) {
            m.advance(100, 50, 10);
        }
        assert_eq!(m.offset(), 110);
        m.advance(100, 50, 10);
        assert_eq!(m.offset(), 0);
    }

    #[test]
    fn scroll_clock_limits_rate() {
        let mut c = ScrollClock::default();
        c.restart(0);
        assert!(!c.tick(50));
        assert!(c.tick(100));
        assert!(!c.tick(150));
        assert!(c.tick(200));
    }
}
