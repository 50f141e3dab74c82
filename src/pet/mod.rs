//! Autonomous pet behaviour.
//!
//! The [`MoodEngine`] owns the idle animation: it is active only while the
//! coordinator is in Animation mode.  Each [`Mood`] has an entry action (an
//! eye style), an optional dwell time after which a weighted random successor
//! is picked, and reactions to button gestures.  Default and Curiosity also
//! nudge the chassis around at random intervals, balanced by
//! [`history::MovementHistory`].

pub mod history;
pub mod transitions;

use crate::board::{Board, Devices, RandomSource};
use crate::clock::{has_elapsed, Millis};
use crate::drive::Direction;
use crate::ui::eyes::{EyeStyle, Eyes, Expression, Placement};
use crate::ui::ButtonEvent;

use history::MovementHistory;
use transitions::{dwell, pick, transition, wander_interval, Reaction, Trigger};

/// Emotional state of the pet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mood {
    Default,
    Happy,
    LongHappy,
    Scared,
    /// After-shock following Scared.
    Scare,
    Curiosity,
    Sleepy,
    Asleep,
    Angry,
}

impl Mood {
    /// Eye style shown while in this mood.
    pub fn eye_style(self) -> EyeStyle {
        let base = EyeStyle {
            width: 32,
            height: 36,
            radius: 8,
            autoblink: false,
            ..EyeStyle::NEUTRAL
        };
        match self {
            Mood::Default => EyeStyle::NEUTRAL,
            Mood::Happy => EyeStyle {
                expression: Expression::Happy,
                ..base
            },
            Mood::LongHappy => EyeStyle {
                expression: Expression::Happy,
                v_flicker: 5,
                ..base
            },
            Mood::Scared => EyeStyle {
                expression: Expression::Tired,
                h_flicker: 3,
                v_flicker: 3,
                sweat: true,
                ..base
            },
            Mood::Scare => EyeStyle {
                expression: Expression::Tired,
                h_flicker: 3,
                v_flicker: 3,
                ..base
            },
            Mood::Curiosity => EyeStyle {
                autoblink: true,
                idle_wander: true,
                curious: true,
                ..base
            },
            Mood::Sleepy => EyeStyle {
                expression: Expression::Tired,
                height: 20,
                autoblink: true,
                ..base
            },
            Mood::Asleep => EyeStyle {
                placement: Placement::South,
                height: 3,
                radius: 0,
                ..base
            },
            Mood::Angry => EyeStyle {
                expression: Expression::Angry,
                h_flicker: 2,
                ..base
            },
        }
    }
}

pub struct MoodEngine {
    mood: Mood,
    /// When the current mood was entered.
    since: Millis,
    last_move: Millis,
    move_interval: Millis,
    history: MovementHistory,
    eyes: Eyes,
    active: bool,
}

impl Default for MoodEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MoodEngine {
    pub const fn new() -> Self {
        Self {
            mood: Mood::Default,
            since: 0,
            last_move: 0,
            move_interval: 0,
            history: MovementHistory::new(),
            eyes: Eyes::new(),
            active: false,
        }
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn history(&self) -> &MovementHistory {
        &self.history
    }

    /// Start (or restart) the idle animation from the default mood.
    pub fn resume<B: Board>(&mut self, dev: &mut Devices<B>, now: Millis) {
        self.active = true;
        self.last_move = now;
        self.move_interval = random_interval(Mood::Default, &mut dev.rng);
        self.enter(Mood::Default, now);
    }

    /// Freeze all timers.  Nothing fires until the next [`MoodEngine::resume`].
    pub fn suspend(&mut self) {
        self.active = false;
    }

    /// React to a button gesture.
    pub fn handle_button<B: Board>(&mut self, dev: &mut Devices<B>, event: ButtonEvent, now: Millis) {
        if !self.active {
            return;
        }
        let trigger = match event {
            ButtonEvent::Click(n) => Trigger::Click(n),
            ButtonEvent::LongPressStart => Trigger::LongPressStart,
            ButtonEvent::LongPressEnd => Trigger::LongPressEnd,
        };
        self.fire(dev, trigger, now);
    }

    /// Per-tick work: dwell exits, wandering and the eye animation.
    pub fn update<B: Board>(&mut self, dev: &mut Devices<B>, now: Millis) {
        if !self.active {
            return;
        }

        if let Some(limit) = dwell(self.mood) {
            if has_elapsed(now, self.since, limit) {
                self.fire(dev, Trigger::Dwell, now);
            }
        }

        if wander_interval(self.mood).is_some() && has_elapsed(now, self.last_move, self.move_interval) {
            let direction = self.history.choose(&mut dev.rng);
            self.wander(dev, direction);
            self.last_move = now;
            self.move_interval = random_interval(self.mood, &mut dev.rng);
        }

        if self.eyes.update(&mut dev.display, &mut dev.rng, now) {
            dev.present();
        }
    }

    fn fire<B: Board>(&mut self, dev: &mut Devices<B>, trigger: Trigger, now: Millis) {
        let Some(outcomes) = transition(self.mood, trigger) else {
            return;
        };
        let Some(outcome) = pick(outcomes, &mut dev.rng) else {
            return;
        };

        info!("Mood: {} -> {} on {}", self.mood, outcome.mood, trigger);
        self.enter(outcome.mood, now);
        if outcome.reaction == Reaction::Recoil {
            dev.pulse(Direction::Backward);
        }
    }

    fn enter(&mut self, mood: Mood, now: Millis) {
        self.mood = mood;
        self.since = now;
        self.eyes.set_style(mood.eye_style(), now);
        if mood == Mood::Happy {
            self.eyes.laugh(now);
        }
    }

    fn wander<B: Board>(&mut self, dev: &mut Devices<B>, direction: Direction) {
        debug!("Wander: {}", direction);
        dev.pulse(direction);
        self.history.record(direction);
    }
}

fn random_interval<R: RandomSource + ?Sized>(mood: Mood, rng: &mut R) -> Millis {
    let (low, high) = wander_interval(mood).unwrap_or(crate::config::WANDER_INTERVAL_DEFAULT_MS);
    rng.range(low, high)
}
