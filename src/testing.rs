//! Host fakes shared by the unit tests.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_hal::delay::DelayNs;

use crate::board::{Board, Devices, LinkControl, RandomSource, Surface};
use crate::drive::{Direction, Motor};
use crate::error::Error;
use crate::melody::{Buzzer, Melody};

const W: usize = 128;
const H: usize = 64;

/// In-memory 128×64 monochrome frame buffer.
pub struct FrameBuffer {
    pixels: [[bool; W]; H],
    pub presents: usize,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            pixels: [[false; W]; H],
            presents: 0,
        }
    }

    /// Number of lit pixels.
    pub fn lit(&self) -> usize {
        self.pixels.iter().flatten().filter(|p| **p).count()
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[y][x]
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(W as u32, H as u32)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, color) in pixels {
            if (0..W as i32).contains(&p.x) && (0..H as i32).contains(&p.y) {
                self.pixels[p.y as usize][p.x as usize] = color.is_on();
            }
        }
        Ok(())
    }
}

impl Surface for FrameBuffer {
    fn present(&mut self) -> Result<(), Error> {
        self.presents += 1;
        Ok(())
    }
}

/// Random source returning a fixed script of values, cycling.
///
/// Each value is mapped into the requested range as `low + v % span`.
pub struct ScriptedRng {
    values: Vec<u32>,
    next: usize,
}

impl ScriptedRng {
    pub fn new(values: &[u32]) -> Self {
        Self {
            values: values.to_vec(),
            next: 0,
        }
    }

    pub fn constant(value: u32) -> Self {
        Self::new(&[value])
    }
}

impl RandomSource for ScriptedRng {
    fn range(&mut self, low: u32, high: u32) -> u32 {
        let v = self.values[self.next % self.values.len()];
        self.next += 1;
        if high <= low {
            return low;
        }
        if (low..high).contains(&v) {
            v
        } else {
            low + v % (high - low)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotorCall {
    Run(Direction),
    Stop,
}

#[derive(Default)]
pub struct RecordingMotor {
    pub calls: Vec<MotorCall>,
}

impl RecordingMotor {
    pub fn moves(&self) -> Vec<Direction> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                MotorCall::Run(d) => Some(*d),
                MotorCall::Stop => None,
            })
            .collect()
    }
}

impl Motor for RecordingMotor {
    fn forward(&mut self) {
        self.calls.push(MotorCall::Run(Direction::Forward));
    }
    fn backward(&mut self) {
        self.calls.push(MotorCall::Run(Direction::Backward));
    }
    fn left(&mut self) {
        self.calls.push(MotorCall::Run(Direction::Left));
    }
    fn right(&mut self) {
        self.calls.push(MotorCall::Run(Direction::Right));
    }
    fn stop(&mut self) {
        self.calls.push(MotorCall::Stop);
    }
}

#[derive(Default)]
pub struct RecordingBuzzer {
    pub played: Vec<Melody>,
}

impl Buzzer for RecordingBuzzer {
    fn play(&mut self, melody: &Melody) {
        self.played.push(melody.clone());
    }
}

#[derive(Default)]
pub struct RecordingLink {
    pub sent: Vec<String>,
    pub enabled: Vec<bool>,
}

impl LinkControl for RecordingLink {
    fn send(&mut self, text: &str) -> Result<(), Error> {
        self.sent.push(text.into());
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled.push(enabled);
    }
}

/// Delay that only accumulates the requested time.
#[derive(Default)]
pub struct NoDelay {
    pub total_ns: u64,
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

pub struct TestBoard;

impl Board for TestBoard {
    type Display = FrameBuffer;
    type Motor = RecordingMotor;
    type Buzzer = RecordingBuzzer;
    type Delay = NoDelay;
    type Link = RecordingLink;
    type Rng = ScriptedRng;
}

pub fn devices(rng: ScriptedRng) -> Devices<TestBoard> {
    Devices::new(
        FrameBuffer::new(),
        RecordingMotor::default(),
        RecordingBuzzer::default(),
        NoDelay::default(),
        RecordingLink::default(),
        rng,
    )
}
