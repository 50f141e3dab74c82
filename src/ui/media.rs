//! Audio visualiser shown while media is playing on the companion device.
//!
//! Sixteen bars chase amplitude-driven targets with velocity smoothing,
//! each with a falling peak marker.  When the update carries a usable title
//! or artist, a two-line header (play/pause glyph plus scrolling text)
//! takes the top 20 rows and the bars shrink to fit below it.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle, Triangle};

use crate::ble::message::{MediaPayload, Text};
use crate::board::RandomSource;
use crate::clock::{elapsed, Millis};
use crate::config::{MEDIA_AMPLITUDE_THRESHOLD, MEDIA_FRAME_MS, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::ui::text::{self, Marquee, ScrollClock};

pub const BAR_COUNT: usize = 16;

const HEADER_HEIGHT: i32 = 20;
const TEXT_MARGIN_LEFT: i32 = 12;
const SCROLL_GAP: i32 = 18;
/// Levels older than this are treated as silence (ms).
const LEVELS_TIMEOUT_MS: Millis = 500;
/// A peak marker drops one pixel per this interval (ms).
const PEAK_DECAY_MS: Millis = 50;
const SMOOTHING: f32 = 0.7;
const FADE: f32 = 0.95;

#[derive(Clone, Copy, Debug, Default)]
struct Bar {
    height: f32,
    target: f32,
    velocity: f32,
    peak: i32,
    peak_at: Millis,
}

pub struct MediaPresenter {
    title: Text<48>,
    artist: Text<48>,
    playing: bool,
    amplitude: f32,
    peak: f32,
    levels_at: Millis,
    bars: [Bar; BAR_COUNT],
    title_scroll: Marquee,
    artist_scroll: Marquee,
    scroll_clock: ScrollClock,
    last_frame: Option<Millis>,
    active: bool,
}

impl Default for MediaPresenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a metadata field carries a real value.
fn known(field: &str) -> bool {
    !field.is_empty() && field != "Unknown"
}

impl MediaPresenter {
    pub fn new() -> Self {
        Self {
            title: Text::default(),
            artist: Text::default(),
            playing: false,
            amplitude: 0.0,
            peak: 0.0,
            levels_at: 0,
            bars: [Bar::default(); BAR_COUNT],
            title_scroll: Marquee::default(),
            artist_scroll: Marquee::default(),
            scroll_clock: ScrollClock::default(),
            last_frame: None,
            active: false,
        }
    }

    /// Begin visualising.  Bars start from the floor.
    pub fn start(&mut self, now: Millis) {
        self.active = true;
        self.bars = [Bar::default(); BAR_COUNT];
        self.last_frame = None;
        self.scroll_clock.restart(now);
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the header is shown.
    pub fn has_metadata(&self) -> bool {
        known(&self.title) || known(&self.artist)
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Take the latest update from the app.
    pub fn apply(&mut self, payload: &MediaPayload, now: Millis) {
        if payload.title != self.title {
            self.title_scroll.reset();
            debug!("Media: title {=str}", payload.title.as_str());
        }
        if payload.artist != self.artist {
            self.artist_scroll.reset();
        }
        self.title = payload.title.clone();
        self.artist = payload.artist.clone();
        self.playing = payload.playing;

        if let Some(levels) = payload.levels {
            self.amplitude = levels.amplitude.clamp(0.0, 1.0);
            self.peak = levels.peak.clamp(0.0, 1.0);
            self.levels_at = now;
        }
    }

    /// Advance the animation and draw a frame if one is due.
    ///
    /// Returns `true` when a frame was drawn and needs presenting.
    pub fn render<D, R>(&mut self, target: &mut D, rng: &mut R, now: Millis) -> bool
    where
        D: DrawTarget<Color = BinaryColor>,
        R: RandomSource + ?Sized,
    {
        if !self.active {
            return false;
        }

        if elapsed(now, self.levels_at) > LEVELS_TIMEOUT_MS {
            self.amplitude = 0.0;
            self.peak = 0.0;
        }

        if let Some(last) = self.last_frame {
            if elapsed(now, last) < MEDIA_FRAME_MS {
                return false;
            }
        }
        self.last_frame = Some(now);

        let _ = target.clear(BinaryColor::Off);

        let metadata = self.has_metadata();
        let (top, height) = if metadata {
            self.draw_header(target);
            let _ = Line::new(
                Point::new(0, HEADER_HEIGHT - 1),
                Point::new(SCREEN_WIDTH - 1, HEADER_HEIGHT - 1),
            )
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(target);
            (HEADER_HEIGHT, SCREEN_HEIGHT - HEADER_HEIGHT)
        } else {
            (0, SCREEN_HEIGHT)
        };

        let loud = self.amplitude > MEDIA_AMPLITUDE_THRESHOLD || self.peak > MEDIA_AMPLITUDE_THRESHOLD;
        if loud || self.playing {
            self.generate_targets(rng, height as f32, now);
        } else {
            for bar in &mut self.bars {
                bar.target *= FADE;
            }
        }

        self.draw_bars(target, top, height, now);

        if metadata && self.scroll_clock.tick(now) {
            let available = SCREEN_WIDTH - TEXT_MARGIN_LEFT - 2;
            self.title_scroll.advance(text::width(&self.title), available, SCROLL_GAP);
            self.artist_scroll.advance(text::width(&self.artist), available, SCROLL_GAP);
        }

        true
    }

    fn generate_targets<R: RandomSource + ?Sized>(&mut self, rng: &mut R, height: f32, now: Millis) {
        let base = self.amplitude * height;
        let boost = if self.peak > self.amplitude {
            (self.peak - self.amplitude) * height * 0.5
        } else {
            0.0
        };
        let t = now as f32 * 0.002;

        for (i, bar) in self.bars.iter_mut().enumerate() {
            let phase = i as f32 / BAR_COUNT as f32 * core::f32::consts::TAU;
            let wave = libm::sinf(phase + t) * 0.3 + 1.0;
            let jitter = rng.range(80, 120) as f32 / 100.0;
            bar.target = (base * wave * jitter + boost).clamp(0.0, height);
        }
    }

    fn draw_bars<D>(&mut self, target: &mut D, top: i32, height: i32, now: Millis)
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let slot = SCREEN_WIDTH / BAR_COUNT as i32;
        let width = (slot - 1) as u32;
        let fill = PrimitiveStyle::with_fill(BinaryColor::On);
        let stroke = PrimitiveStyle::with_stroke(BinaryColor::On, 1);

        for (i, bar) in self.bars.iter_mut().enumerate() {
            let x = i as i32 * slot;

            let diff = bar.target - bar.height;
            bar.velocity = bar.velocity * SMOOTHING + diff * (1.0 - SMOOTHING);
            bar.height = (bar.height + bar.velocity).clamp(0.0, height as f32);

            let h = bar.height as i32;
            if h > 0 {
                let _ = Rectangle::new(Point::new(x, top + height - h), Size::new(width, h as u32))
                    .into_styled(fill)
                    .draw(target);
            }

            if bar.peak > 0 {
                let y = top + height - bar.peak;
                let _ = Line::new(Point::new(x, y), Point::new(x + width as i32 - 1, y))
                    .into_styled(stroke)
                    .draw(target);
                if elapsed(now, bar.peak_at) > PEAK_DECAY_MS {
                    bar.peak -= 1;
                    bar.peak_at = now;
                }
            }
            if h > bar.peak {
                bar.peak = h;
                bar.peak_at = now;
            }
        }
    }

    fn draw_header<D>(&self, target: &mut D)
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let available = SCREEN_WIDTH - TEXT_MARGIN_LEFT - 2;

        for (field, scroll, y) in [
            (&self.title, &self.title_scroll, 0),
            (&self.artist, &self.artist_scroll, 10),
        ] {
            if !known(field) {
                continue;
            }
            let w = text::width(field);
            if w > available {
                scroll.draw(target, field, Point::new(TEXT_MARGIN_LEFT, y), available, SCROLL_GAP);
                // Keep the glyph column clear of scrolled text.
                let _ = Rectangle::new(Point::new(0, y), Size::new((TEXT_MARGIN_LEFT - 1) as u32, 9))
                    .into_styled(PrimitiveStyle::with_fill(BinaryColor::Off))
                    .draw(target);
            } else {
                let x = TEXT_MARGIN_LEFT + (available - w) / 2;
                text::draw(target, field, Point::new(x, y), BinaryColor::On);
            }
        }

        let fill = PrimitiveStyle::with_fill(BinaryColor::On);
        if self.playing {
            let _ = Triangle::new(Point::new(2, 2), Point::new(2, 8), Point::new(7, 5))
                .into_styled(fill)
                .draw(target);
        } else {
            for x in [2, 6] {
                let _ = Rectangle::new(Point::new(x, 2), Size::new(2, 6))
                    .into_styled(fill)
                    .draw(target);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::message::AudioLevels;
    use crate::testing::{FrameBuffer, ScriptedRng};

    fn payload(title: &str, artist: &str, amplitude: f32) -> MediaPayload {
        MediaPayload {
            title: Text::new(title),
            artist: Text::new(artist),
            status: Text::new("playing"),
            playing: amplitude > 0.0,
            levels: Some(AudioLevels {
                amplitude,
                peak: amplitude,
                rms: amplitude / 2.0,
            }),
        }
    }

    #[test]
    fn metadata_requires_a_known_field() {
        let mut m = MediaPresenter::new();
        m.apply(&payload("", "Unknown", 0.5), 0);
        assert!(!m.has_metadata());
        m.apply(&payload("Song", "Unknown", 0.5), 0);
        assert!(m.has_metadata());
        m.apply(&payload("Unknown", "Band", 0.5), 0);
        assert!(m.has_metadata());
    }

    #[test]
    fn frames_are_rate_limited() {
        let mut m = MediaPresenter::new();
        let mut fb = FrameBuffer::new();
        let mut rng = ScriptedRng::constant(100);
        m.start(0);
        m.apply(&payload("", "", 0.5), 0);
        assert!(m.render(&mut fb, &mut rng, 0));
        assert!(!m.render(&mut fb, &mut rng, 20));
        assert!(m.render(&mut fb, &mut rng, 33));
    }

    #[test]
    fn inactive_presenter_draws_nothing() {
        let mut m = MediaPresenter::new();
        let mut fb = FrameBuffer::new();
        assert!(!m.render(&mut fb, &mut ScriptedRng::constant(0), 0));
        m.start(0);
        m.stop();
        assert!(!m.render(&mut fb, &mut ScriptedRng::constant(0), 100));
    }

    #[test]
    fn bars_rise_with_amplitude() {
        let mut m = MediaPresenter::new();
        let mut fb = FrameBuffer::new();
        let mut rng = ScriptedRng::constant(100);
        m.start(0);
        let mut t = 0;
        for _ in 0..10 {
            m.apply(&payload("", "", 0.8), t);
            m.render(&mut fb, &mut rng, t);
            t += 40;
        }
        assert!(fb.lit() > 500);
    }

    #[test]
    fn stale_levels_count_as_silence() {
        let mut m = MediaPresenter::new();
        let mut fb = FrameBuffer::new();
        let mut rng = ScriptedRng::constant(100);
        m.start(0);
        m.apply(&payload("", "", 0.8), 0);
        m.render(&mut fb, &mut rng, 400);
        assert!(m.amplitude() > 0.0);
        m.render(&mut fb, &mut rng, 501);
        assert_eq!(m.amplitude(), 0.0);
    }

    #[test]
    fn silence_fades_bars_out() {
        let mut m = MediaPresenter::new();
        let mut fb = FrameBuffer::new();
        let mut rng = ScriptedRng::constant(100);
        m.start(0);
        let mut t = 0;
        for _ in 0..10 {
            m.apply(&payload("", "", 0.8), t);
            m.render(&mut fb, &mut rng, t);
            t += 40;
        }
        let loud = fb.lit();

        let mut quiet = payload("", "", 0.0);
        quiet.playing = false;
        for _ in 0..200 {
            m.apply(&quiet, t);
            m.render(&mut fb, &mut rng, t);
            t += 40;
        }
        assert!(fb.lit() < loud / 4);
    }
}
