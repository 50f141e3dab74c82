//! Two-motor chassis control.
//!
//! The hardware driver only knows how to energise the H-bridge in one of
//! four directions or to release it.  [`Drivetrain`] wraps it, remembers
//! what the chassis is doing and makes `stop` idempotent, so leaving a mode
//! twice never issues a second stop to an already-stopped bridge.

/// Direction of a chassis move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    /// All directions, in the order used for uniform random picks.
    pub const ALL: [Direction; 4] = [
        Direction::Forward,
        Direction::Backward,
        Direction::Left,
        Direction::Right,
    ];
}

/// Motor driver collaborator (H-bridge with two DC motors).
pub trait Motor {
    fn forward(&mut self);
    fn backward(&mut self);
    fn left(&mut self);
    fn right(&mut self);
    fn stop(&mut self);
}

/// Stateful wrapper around a [`Motor`].
pub struct Drivetrain<M> {
    motor: M,
    running: Option<Direction>,
}

impl<M: Motor> Drivetrain<M> {
    /// Take ownership of the driver and make sure the bridge is released.
    pub fn new(mut motor: M) -> Self {
        motor.stop();
        Self {
            motor,
            running: None,
        }
    }

    /// Start driving in `direction` (no-op if already doing so).
    pub fn run(&mut self, direction: Direction) {
        if self.running == Some(direction) {
            return;
        }
        debug!("Drive: {}", direction);
        match direction {
            Direction::Forward => self.motor.forward(),
            Direction::Backward => self.motor.backward(),
            Direction::Left => self.motor.left(),
            Direction::Right => self.motor.right(),
        }
        self.running = Some(direction);
    }

    /// Release the bridge.  Calling this on a stopped chassis does nothing.
    pub fn stop(&mut self) {
        if self.running.take().is_some() {
            self.motor.stop();
        }
    }

    /// Direction currently being driven, if any.
    pub fn running(&self) -> Option<Direction> {
        self.running
    }

    /// Borrow the underlying driver.
    pub fn motor(&self) -> &M {
        &self.motor
    }
}
