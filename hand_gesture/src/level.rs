//! Continuous levels driven by pinch distance.
//!
//! Each [`Channel`] owns one [`ChannelLevel`] for the whole session.  The
//! [`LevelController`] turns the change in pinch distance between two
//! cycles into a change of level, clamped to `[0, 100]`.
//!
//! | Hand  | Channel    | Sink                                  |
//! |-------|------------|---------------------------------------|
//! | Left  | Volume     | [`VolumeSink`] — scalar `0.0..=1.0`   |
//! | Right | Brightness | [`BrightnessSink`] — percent `0..=100`|

use log::debug;

use crate::error::ActuatorError;
use crate::landmark::Handedness;

/// Level units gained per unit of pinch-distance change.
pub const DEFAULT_SCALE: f32 = 1000.0;

pub const LEVEL_MIN: f32 = 0.0;
pub const LEVEL_MAX: f32 = 100.0;

// ════════════════════════════════════════════════════════════════════════════
// Channel
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Volume,
    Brightness,
}

impl Channel {
    /// Fixed binding: the left hand drives volume, the right brightness.
    pub fn for_hand(hand: Handedness) -> Channel {
        match hand {
            Handedness::Left  => Channel::Volume,
            Handedness::Right => Channel::Brightness,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Channel::Volume     => "Volume",
            Channel::Brightness => "Brightness",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ChannelLevel
// ════════════════════════════════════════════════════════════════════════════

/// A clamped scalar plus the pinch distance seen on its last update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelLevel {
    value:          f32,
    previous_pinch: Option<f32>,
}

impl ChannelLevel {
    pub fn new(initial: f32) -> Self {
        ChannelLevel { value: clamp_level(initial), previous_pinch: None }
    }

    pub fn value(&self) -> f32 { self.value }

    pub fn previous_pinch(&self) -> Option<f32> { self.previous_pinch }

    pub fn set(&mut self, value: f32) {
        self.value = clamp_level(value);
    }
}

impl Default for ChannelLevel {
    fn default() -> Self { ChannelLevel::new(LEVEL_MIN) }
}

/// Clamp into `[LEVEL_MIN, LEVEL_MAX]`.  NaN collapses to the minimum.
pub fn clamp_level(v: f32) -> f32 {
    if v.is_nan() { LEVEL_MIN } else { v.clamp(LEVEL_MIN, LEVEL_MAX) }
}

// ════════════════════════════════════════════════════════════════════════════
// LevelController
// ════════════════════════════════════════════════════════════════════════════

/// What one controller update did to a channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LevelUpdate {
    /// First sample: the distance was recorded, the level left alone.
    Recorded { pinch: f32 },
    /// The level was recomputed (possibly to the same value).
    Applied { from: f32, to: f32 },
}

impl LevelUpdate {
    pub fn applied_value(&self) -> Option<f32> {
        match self {
            LevelUpdate::Applied { to, .. } => Some(*to),
            LevelUpdate::Recorded { .. }    => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelController {
    scale: f32,
}

impl LevelController {
    pub fn new(scale: f32) -> Self {
        LevelController { scale }
    }

    pub fn scale(&self) -> f32 { self.scale }

    /// `clamp(level + (current - previous) * scale)`, or `None` when there
    /// is no previous distance yet.
    pub fn step(&self, current: f32, previous: Option<f32>, level: f32) -> Option<f32> {
        previous.map(|prev| clamp_level(level + (current - prev) * self.scale))
    }

    /// Feed a new pinch distance into `channel` and remember it for the
    /// next cycle.
    pub fn update(&self, channel: &mut ChannelLevel, pinch: f32) -> LevelUpdate {
        let result = match self.step(pinch, channel.previous_pinch, channel.value) {
            Some(to) => {
                let from = channel.value;
                channel.value = to;
                LevelUpdate::Applied { from, to }
            }
            None => LevelUpdate::Recorded { pinch },
        };
        channel.previous_pinch = Some(pinch);
        result
    }
}

impl Default for LevelController {
    fn default() -> Self { LevelController::new(DEFAULT_SCALE) }
}

// ════════════════════════════════════════════════════════════════════════════
// Sinks — external setters
// ════════════════════════════════════════════════════════════════════════════

/// System audio endpoint.
pub trait VolumeSink {
    /// `scalar` is in `0.0..=1.0`.
    fn set_volume(&mut self, scalar: f32) -> Result<(), ActuatorError>;
}

/// Display backlight.
pub trait BrightnessSink {
    fn set_brightness(&mut self, percent: u8) -> Result<(), ActuatorError>;
}

/// Convert a `[0, 100]` level into the brightness sink's integer percent.
pub fn level_to_percent(level: f32) -> u8 {
    clamp_level(level).round() as u8
}

/// Push `level` for `channel` to the matching sink.
pub fn push_level(
    channel:    Channel,
    level:      f32,
    volume:     &mut dyn VolumeSink,
    brightness: &mut dyn BrightnessSink,
) -> Result<(), ActuatorError> {
    debug!("push {} = {:.1}", channel.name(), level);
    match channel {
        Channel::Volume     => volume.set_volume(clamp_level(level) / LEVEL_MAX),
        Channel::Brightness => brightness.set_brightness(level_to_percent(level)),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
