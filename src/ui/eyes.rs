//! Animated eyes for the idle animation.
//!
//! Two filled rounded rectangles with black eyelid overlays.  Each mood
//! picks an [`EyeStyle`]; the renderer adds the life on top: automatic
//! blinking, idle gaze wander, flicker, sweat drops and a short laugh
//! bounce.  Frames are rate-limited to one per [`EYES_FRAME_MS`].

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    Circle, PrimitiveStyle, Rectangle, RoundedRectangle, Triangle,
};

use crate::board::RandomSource;
use crate::clock::{elapsed, has_elapsed, Millis};
use crate::config::{EYES_FRAME_MS, SCREEN_HEIGHT, SCREEN_WIDTH};

const BLINK_MS: Millis = 200;
const BLINK_INTERVAL_MS: (Millis, Millis) = (2_000, 4_000);
const WANDER_INTERVAL_MS: (Millis, Millis) = (2_000, 4_000);
const LAUGH_MS: Millis = 500;
const LAUGH_BOUNCE_PX: i32 = 5;
/// Gaze offset beyond which the curious look enlarges the outer eye.
const CURIOUS_GAZE_PX: i32 = 10;
const CURIOUS_GROWTH_PX: i32 = 8;
const SWEAT_FALL_PX: i32 = 14;

/// Eyelid shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Expression {
    Neutral,
    /// Lower lid pushed up.
    Happy,
    /// Outer upper corners drooping.
    Tired,
    /// Inner upper corners drooping.
    Angry,
}

/// Vertical placement of the eye pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Placement {
    Center,
    South,
}

/// Static look of the eyes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EyeStyle {
    pub width: i32,
    pub height: i32,
    pub radius: u32,
    pub spacing: i32,
    pub expression: Expression,
    pub placement: Placement,
    pub autoblink: bool,
    pub idle_wander: bool,
    /// Horizontal flicker amplitude in pixels (0 = off).
    pub h_flicker: i32,
    /// Vertical flicker amplitude in pixels (0 = off).
    pub v_flicker: i32,
    pub sweat: bool,
    pub curious: bool,
}

impl EyeStyle {
    /// Plain open eyes, centred and blinking.
    pub const NEUTRAL: EyeStyle = EyeStyle {
        width: 30,
        height: 36,
        radius: 6,
        spacing: 16,
        expression: Expression::Neutral,
        placement: Placement::Center,
        autoblink: true,
        idle_wander: false,
        h_flicker: 0,
        v_flicker: 0,
        sweat: false,
        curious: false,
    };
}

/// Eye animation state.
pub struct Eyes {
    style: EyeStyle,
    last_frame: Option<Millis>,
    last_blink: Millis,
    blink_interval: Millis,
    blink_from: Option<Millis>,
    last_wander: Millis,
    wander_interval: Millis,
    gaze: Point,
    gaze_target: Point,
    flicker: bool,
    laugh_from: Option<Millis>,
    sweat_y: i32,
}

impl Default for Eyes {
    fn default() -> Self {
        Self::new()
    }
}

impl Eyes {
    pub const fn new() -> Self {
        Self {
            style: EyeStyle::NEUTRAL,
            last_frame: None,
            last_blink: 0,
            blink_interval: BLINK_INTERVAL_MS.0,
            blink_from: None,
            last_wander: 0,
            wander_interval: WANDER_INTERVAL_MS.0,
            gaze: Point::zero(),
            gaze_target: Point::zero(),
            flicker: false,
            laugh_from: None,
            sweat_y: 0,
        }
    }

    pub fn style(&self) -> &EyeStyle {
        &self.style
    }

    /// Switch to a new look.  The next [`Eyes::update`] draws immediately.
    pub fn set_style(&mut self, style: EyeStyle, now: Millis) {
        self.style = style;
        self.last_frame = None;
        self.blink_from = None;
        self.last_blink = now;
        self.last_wander = now;
        self.laugh_from = None;
        if !style.idle_wander {
            self.gaze_target = Point::zero();
        }
    }

    /// Play the short laugh bounce.
    pub fn laugh(&mut self, now: Millis) {
        self.laugh_from = Some(now);
    }

    pub fn is_blinking(&self) -> bool {
        self.blink_from.is_some()
    }

    /// Advance the animation and draw a frame if one is due.
    ///
    /// Returns `true` when a frame was drawn and needs presenting.
    pub fn update<D, R>(&mut self, target: &mut D, rng: &mut R, now: Millis) -> bool
    where
        D: DrawTarget<Color = BinaryColor>,
        R: RandomSource + ?Sized,
    {
        if let Some(last) = self.last_frame {
            if elapsed(now, last) < EYES_FRAME_MS {
                return false;
            }
        }
        self.last_frame = Some(now);

        self.advance(rng, now);
        self.render(target, now);
        true
    }

    fn advance<R: RandomSource + ?Sized>(&mut self, rng: &mut R, now: Millis) {
        if let Some(from) = self.blink_from {
            if has_elapsed(now, from, BLINK_MS) {
                self.blink_from = None;
            }
        } else if self.style.autoblink && has_elapsed(now, self.last_blink, self.blink_interval) {
            self.blink_from = Some(now);
            self.last_blink = now;
            self.blink_interval = rng.range(BLINK_INTERVAL_MS.0, BLINK_INTERVAL_MS.1);
        }

        if self.style.idle_wander && has_elapsed(now, self.last_wander, self.wander_interval) {
            let (max_x, max_y) = self.gaze_limits();
            self.gaze_target = Point::new(
                rng.range(0, (2 * max_x + 1) as u32) as i32 - max_x,
                rng.range(0, (2 * max_y + 1) as u32) as i32 - max_y,
            );
            self.last_wander = now;
            self.wander_interval = rng.range(WANDER_INTERVAL_MS.0, WANDER_INTERVAL_MS.1);
        }
        // Ease halfway towards the target each frame.
        self.gaze += (self.gaze_target - self.gaze) / 2;

        self.flicker = !self.flicker;

        if let Some(from) = self.laugh_from {
            if has_elapsed(now, from, LAUGH_MS) {
                self.laugh_from = None;
            }
        }

        if self.style.sweat {
            self.sweat_y = (self.sweat_y + 2) % SWEAT_FALL_PX;
        }
    }

    /// Largest gaze offset that keeps both eyes on screen.
    fn gaze_limits(&self) -> (i32, i32) {
        let s = &self.style;
        let max_x = (SCREEN_WIDTH - (2 * s.width + s.spacing)) / 2 - 2;
        let max_y = (SCREEN_HEIGHT - s.height) / 2 - 2;
        (max_x.max(0), max_y.max(0))
    }

    fn render<D>(&self, target: &mut D, now: Millis)
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let s = &self.style;
        let _ = target.clear(BinaryColor::Off);

        let mut offset = self.gaze;
        if self.flicker {
            offset += Point::new(s.h_flicker, s.v_flicker);
        }
        if let Some(from) = self.laugh_from {
            let phase = elapsed(now, from) / 100;
            offset.y += if phase % 2 == 0 { -LAUGH_BOUNCE_PX } else { LAUGH_BOUNCE_PX };
        }

        let height = match self.blink_from {
            Some(from) => {
                let half = (BLINK_MS / 2) as i32;
                let e = elapsed(now, from) as i32;
                (s.height * (e - half).abs() / half).max(1)
            }
            None => s.height,
        };

        let left_x = (SCREEN_WIDTH - (2 * s.width + s.spacing)) / 2 + offset.x;
        let right_x = left_x + s.width + s.spacing;
        let base_y = match s.placement {
            Placement::Center => (SCREEN_HEIGHT - s.height) / 2,
            Placement::South => SCREEN_HEIGHT - s.height - 2,
        } + offset.y;

        let mut left_h = height;
        let mut right_h = height;
        if s.curious && self.blink_from.is_none() {
            if self.gaze.x <= -CURIOUS_GAZE_PX {
                left_h += CURIOUS_GROWTH_PX;
            } else if self.gaze.x >= CURIOUS_GAZE_PX {
                right_h += CURIOUS_GROWTH_PX;
            }
        }

        // Shrink around the vertical centre so a blink closes both lids.
        let left = Rectangle::new(
            Point::new(left_x, base_y + (s.height - left_h) / 2),
            Size::new(s.width as u32, left_h as u32),
        );
        let right = Rectangle::new(
            Point::new(right_x, base_y + (s.height - right_h) / 2),
            Size::new(s.width as u32, right_h as u32),
        );

        for (eye, outer_is_left) in [(left, true), (right, false)] {
            draw_eye(target, eye, s.radius);
            draw_lid(target, eye, s.expression, s.radius, outer_is_left);
        }

        if s.sweat {
            let fill = PrimitiveStyle::with_fill(BinaryColor::On);
            for x in [left_x - 6, right_x + s.width + 3] {
                let _ = Circle::new(Point::new(x, 2 + self.sweat_y), 3)
                    .into_styled(fill)
                    .draw(target);
            }
        }
    }
}

fn draw_eye<D>(target: &mut D, eye: Rectangle, radius: u32)
where
    D: DrawTarget<Color = BinaryColor>,
{
    let r = radius.min(eye.size.height / 2);
    let _ = RoundedRectangle::with_equal_corners(eye, Size::new(r, r))
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
        .draw(target);
}

fn draw_lid<D>(target: &mut D, eye: Rectangle, expression: Expression, radius: u32, outer_is_left: bool)
where
    D: DrawTarget<Color = BinaryColor>,
{
    let lid = PrimitiveStyle::with_fill(BinaryColor::Off);
    let x0 = eye.top_left.x - 1;
    let x1 = eye.top_left.x + eye.size.width as i32;
    let top = eye.top_left.y - 1;
    let mid = eye.top_left.y + eye.size.height as i32 / 2;

    // Which upper corner droops.
    let droop_left = match expression {
        Expression::Neutral => return,
        Expression::Happy => {
            let cover = Rectangle::new(
                Point::new(x0, mid),
                Size::new(eye.size.width + 2, eye.size.height),
            );
            let _ = RoundedRectangle::with_equal_corners(cover, Size::new(radius, radius))
                .into_styled(lid)
                .draw(target);
            return;
        }
        Expression::Tired => outer_is_left,
        Expression::Angry => !outer_is_left,
    };

    let low = if droop_left {
        Point::new(x0, mid)
    } else {
        Point::new(x1, mid)
    };
    let _ = Triangle::new(Point::new(x0, top), Point::new(x1, top), low)
        .into_styled(lid)
        .draw(target);
}
