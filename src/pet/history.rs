//! Left/right balancer for autonomous moves.
//!
//! The pet turns on the spot when wandering.  To keep it from drifting off
//! the desk, the last [`MOVEMENT_HISTORY_LEN`] autonomous moves are kept
//! with running left/right counts; once the window is full and unbalanced,
//! the next move is forced to the deficient side.

use heapless::Deque;

use crate::board::RandomSource;
use crate::config::MOVEMENT_HISTORY_LEN;
use crate::drive::Direction;

pub struct MovementHistory {
    moves: Deque<Direction, MOVEMENT_HISTORY_LEN>,
    left: u8,
    right: u8,
}

impl Default for MovementHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl MovementHistory {
    pub const fn new() -> Self {
        Self {
            moves: Deque::new(),
            left: 0,
            right: 0,
        }
    }

    /// Pick the next autonomous move.
    pub fn choose<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Direction {
        if self.moves.is_full() && self.left != self.right {
            return if self.left < self.right {
                Direction::Left
            } else {
                Direction::Right
            };
        }
        let i = rng.range(0, Direction::ALL.len() as u32) as usize;
        Direction::ALL[i % Direction::ALL.len()]
    }

    /// Remember a move that was made.  A full, balanced window starts over.
    pub fn record(&mut self, direction: Direction) {
        if self.moves.is_full() {
            if let Some(oldest) = self.moves.pop_front() {
                self.count(oldest, false);
            }
        }
        let _ = self.moves.push_back(direction);
        self.count(direction, true);

        if self.moves.is_full() && self.left == self.right {
            trace!("Movement history balanced, resetting");
            self.clear();
        }
    }

    pub fn clear(&mut self) {
        self.moves.clear();
        self.left = 0;
        self.right = 0;
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// (left, right) counts over the window.
    pub fn balance(&self) -> (u8, u8) {
        (self.left, self.right)
    }

    fn count(&mut self, direction: Direction, add: bool) {
        let counter = match direction {
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
            Direction::Forward | Direction::Backward => return,
        };
        if add {
            *counter += 1;
        } else {
            *counter -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRng;
    use Direction::*;

    fn history(moves: &[Direction]) -> MovementHistory {
        let mut h = MovementHistory::new();
        for m in moves {
            h.record(*m);
        }
        h
    }

    #[test]
    fn full_balanced_window_resets() {
        let h = history(&[Left, Right, Forward, Backward, Forward, Backward]);
        assert!(h.is_empty());
        assert_eq!(h.balance(), (0, 0));
    }

    #[test]
    fn full_unbalanced_window_forces_deficient_side() {
        let mut rng = ScriptedRng::constant(0); // would pick Forward
        let h = history(&[Left, Left, Forward, Forward, Backward, Backward]);
        assert_eq!(h.len(), MOVEMENT_HISTORY_LEN);
        assert_eq!(h.choose(&mut rng), Right);

        let h = history(&[Right, Forward, Forward, Forward, Backward, Backward]);
        assert_eq!(h.choose(&mut rng), Left);
    }

    #[test]
    fn partial_window_picks_uniformly() {
        let h = history(&[Left, Left]);
        for (v, expected) in [(0, Forward), (1, Backward), (2, Left), (3, Right)] {
            assert_eq!(h.choose(&mut ScriptedRng::constant(v)), expected);
        }
    }

    #[test]
    fn counters_track_the_window() {
        let mut h = history(&[Left, Left, Left, Forward, Forward, Forward]);
        assert_eq!(h.balance(), (3, 0));
        // Evicts the oldest Left.
        h.record(Right);
        assert_eq!(h.balance(), (2, 1));
        assert_eq!(h.len(), MOVEMENT_HISTORY_LEN);
    }

    #[test]
    fn forced_move_rebalances_and_resets() {
        let mut h = history(&[Left, Forward, Forward, Forward, Forward, Forward]);
        let mut rng = ScriptedRng::constant(0);
        let next = h.choose(&mut rng);
        assert_eq!(next, Right);
        // Evicts Left, window becomes (0, 1): still unbalanced.
        h.record(next);
        assert_eq!(h.balance(), (0, 1));
        assert_eq!(h.choose(&mut rng), Left);
    }
}
