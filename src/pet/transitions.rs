//! Mood transition table.
//!
//! Everything the mood engine decides is expressed here as data:
//! [`transition`] maps a (mood, trigger) pair to a weighted list of
//! outcomes, [`dwell`] gives each mood's automatic exit time and
//! [`wander_interval`] the random range between autonomous moves.

use crate::board::RandomSource;
use crate::clock::Millis;
use crate::config::{
    MOOD_ANGRY_MS, MOOD_CURIOSITY_MS, MOOD_HAPPY_MS, MOOD_IDLE_MS, MOOD_SCARED_MS, MOOD_SCARE_MS,
    MOOD_SLEEP_MS, WANDER_INTERVAL_CURIOUS_MS, WANDER_INTERVAL_DEFAULT_MS,
};
use crate::pet::Mood;

/// What caused a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    /// The mood's dwell time ran out.
    Dwell,
    Click(u8),
    LongPressStart,
    LongPressEnd,
}

/// Side effect performed together with a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reaction {
    None,
    /// Short backward motor pulse.
    Recoil,
}

/// One possible result of a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Outcome {
    pub mood: Mood,
    pub weight: u8,
    pub reaction: Reaction,
}

const fn to(mood: Mood, weight: u8) -> Outcome {
    Outcome {
        mood,
        weight,
        reaction: Reaction::None,
    }
}

const fn recoil(mood: Mood, weight: u8) -> Outcome {
    Outcome {
        mood,
        weight,
        reaction: Reaction::Recoil,
    }
}

const PETTED: &[Outcome] = &[to(Mood::Happy, 7), recoil(Mood::Angry, 3)];
const WOKEN: &[Outcome] = &[recoil(Mood::Angry, 1)];
const STARTLED: &[Outcome] = &[to(Mood::Scared, 1)];
const HUGGED: &[Outcome] = &[to(Mood::LongHappy, 1)];
const RELEASED: &[Outcome] = &[to(Mood::Happy, 1)];

const IDLE_DRIFT: &[Outcome] = &[to(Mood::Curiosity, 8), to(Mood::Sleepy, 2)];
const CURIOUS_DRIFT: &[Outcome] = &[to(Mood::Default, 7), to(Mood::Sleepy, 3)];
const WAKE_UP: &[Outcome] = &[to(Mood::Default, 8), to(Mood::Sleepy, 2)];
const CALM_DOWN: &[Outcome] = &[to(Mood::Default, 1)];
const AFTERSHOCK: &[Outcome] = &[to(Mood::Scare, 1)];
const DOZE_OFF: &[Outcome] = &[to(Mood::Asleep, 1)];

/// Possible outcomes of `trigger` in `mood`, or `None` if it is ignored.
pub fn transition(mood: Mood, trigger: Trigger) -> Option<&'static [Outcome]> {
    use Mood::*;

    match (mood, trigger) {
        (Default | Curiosity, Trigger::Dwell) => Some(match mood {
            Default => IDLE_DRIFT,
            _ => CURIOUS_DRIFT,
        }),
        (Happy | Angry | Scare, Trigger::Dwell) => Some(CALM_DOWN),
        (Scared, Trigger::Dwell) => Some(AFTERSHOCK),
        (Sleepy, Trigger::Dwell) => Some(DOZE_OFF),
        (Asleep, Trigger::Dwell) => Some(WAKE_UP),
        (LongHappy, Trigger::Dwell) => None,

        (Scared, Trigger::Click(4)) => None,
        (_, Trigger::Click(4)) => Some(STARTLED),
        (Sleepy | Asleep, Trigger::Click(_)) => Some(WOKEN),
        (Default | Curiosity, Trigger::Click(1)) => Some(PETTED),
        (_, Trigger::Click(_)) => None,

        (Default | Curiosity, Trigger::LongPressStart) => Some(HUGGED),
        (_, Trigger::LongPressStart) => None,
        (_, Trigger::LongPressEnd) => Some(RELEASED),
    }
}

/// Automatic exit time of `mood`, `None` if it only ends on input.
pub fn dwell(mood: Mood) -> Option<Millis> {
    match mood {
        Mood::Default => Some(MOOD_IDLE_MS),
        Mood::Curiosity => Some(MOOD_CURIOSITY_MS),
        Mood::Happy => Some(MOOD_HAPPY_MS),
        Mood::Angry => Some(MOOD_ANGRY_MS),
        Mood::Scared => Some(MOOD_SCARED_MS),
        Mood::Scare => Some(MOOD_SCARE_MS),
        Mood::Sleepy | Mood::Asleep => Some(MOOD_SLEEP_MS),
        Mood::LongHappy => None,
    }
}

/// Random range (half-open, ms) between autonomous moves in `mood`.
pub fn wander_interval(mood: Mood) -> Option<(Millis, Millis)> {
    match mood {
        Mood::Default => Some(WANDER_INTERVAL_DEFAULT_MS),
        Mood::Curiosity => Some(WANDER_INTERVAL_CURIOUS_MS),
        _ => None,
    }
}

/// Weighted pick among `outcomes`.
pub fn pick<R: RandomSource + ?Sized>(outcomes: &'static [Outcome], rng: &mut R) -> Option<Outcome> {
    let total: u32 = outcomes.iter().map(|o| o.weight as u32).sum();
    let mut roll = rng.range(0, total);
    for outcome in outcomes {
        if roll < outcome.weight as u32 {
            return Some(*outcome);
        }
        roll -= outcome.weight as u32;
    }
    outcomes.last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRng;
    use Mood::*;

    const ALL: [Mood; 9] = [
        Default, Happy, LongHappy, Scared, Scare, Curiosity, Sleepy, Asleep, Angry,
    ];

    fn moods(outcomes: Option<&'static [Outcome]>) -> Vec<(Mood, u8)> {
        outcomes
            .unwrap_or(&[])
            .iter()
            .map(|o| (o.mood, o.weight))
            .collect()
    }

    #[test]
    fn dwell_table() {
        let cases: &[(Mood, &[(Mood, u8)])] = &[
            (Default, &[(Curiosity, 8), (Sleepy, 2)]),
            (Curiosity, &[(Default, 7), (Sleepy, 3)]),
            (Happy, &[(Default, 1)]),
            (Angry, &[(Default, 1)]),
            (Scared, &[(Scare, 1)]),
            (Scare, &[(Default, 1)]),
            (Sleepy, &[(Asleep, 1)]),
            (Asleep, &[(Default, 8), (Sleepy, 2)]),
            (LongHappy, &[]),
        ];
        for (mood, expected) in cases {
            assert_eq!(moods(transition(*mood, Trigger::Dwell)), *expected, "{:?}", mood);
        }
    }

    #[test]
    fn dwell_times() {
        assert_eq!(dwell(Default), Some(5_000));
        assert_eq!(dwell(Curiosity), Some(10_000));
        assert_eq!(dwell(Happy), Some(500));
        assert_eq!(dwell(Angry), Some(5_000));
        assert_eq!(dwell(Scared), Some(2_000));
        assert_eq!(dwell(Scare), Some(4_000));
        assert_eq!(dwell(Sleepy), Some(10_000));
        assert_eq!(dwell(Asleep), Some(10_000));
        assert_eq!(dwell(LongHappy), None);
    }

    #[test]
    fn single_click_pets_idle_moods() {
        for mood in [Default, Curiosity] {
            let outcomes = transition(mood, Trigger::Click(1)).unwrap();
            assert_eq!(outcomes[0], to(Happy, 7));
            assert_eq!(outcomes[1], recoil(Angry, 3));
        }
        for mood in [Happy, LongHappy, Scared, Scare, Angry] {
            assert_eq!(transition(mood, Trigger::Click(1)), None, "{:?}", mood);
        }
    }

    #[test]
    fn four_clicks_scare_everything_but_scared() {
        for mood in ALL {
            let expected: Vec<(Mood, u8)> = if mood == Scared { vec![] } else { vec![(Scared, 1)] };
            assert_eq!(moods(transition(mood, Trigger::Click(4))), expected, "{:?}", mood);
        }
    }

    #[test]
    fn waking_a_sleeper_makes_it_angry() {
        for mood in [Sleepy, Asleep] {
            for clicks in [1, 2, 3, 6] {
                let outcomes = transition(mood, Trigger::Click(clicks)).unwrap();
                assert_eq!(outcomes, [recoil(Angry, 1)]);
            }
        }
    }

    #[test]
    fn long_press() {
        for mood in ALL {
            let start = moods(transition(mood, Trigger::LongPressStart));
            if matches!(mood, Default | Curiosity) {
                assert_eq!(start, [(LongHappy, 1)]);
            } else {
                assert!(start.is_empty(), "{:?}", mood);
            }
            assert_eq!(moods(transition(mood, Trigger::LongPressEnd)), [(Happy, 1)]);
        }
    }

    #[test]
    fn other_click_counts_are_ignored_when_awake() {
        for clicks in [2, 3, 5, 7] {
            assert_eq!(transition(Default, Trigger::Click(clicks)), None);
        }
    }

    #[test]
    fn wander_only_when_idle_or_curious() {
        assert_eq!(wander_interval(Default), Some((1_600, 10_000)));
        assert_eq!(wander_interval(Curiosity), Some((3_200, 10_000)));
        for mood in [Happy, LongHappy, Scared, Scare, Sleepy, Asleep, Angry] {
            assert_eq!(wander_interval(mood), None);
        }
    }

    #[test]
    fn pick_respects_weights() {
        let outcomes = transition(Default, Trigger::Click(1)).unwrap();
        for roll in 0..7 {
            let o = pick(outcomes, &mut ScriptedRng::constant(roll)).unwrap();
            assert_eq!(o.mood, Happy);
        }
        for roll in 7..10 {
            let o = pick(outcomes, &mut ScriptedRng::constant(roll)).unwrap();
            assert_eq!(o.mood, Angry);
            assert_eq!(o.reaction, Reaction::Recoil);
        }
    }
}
