//! Hand observations as delivered by the landmark detector.
//!
//! A hand is 21 normalized points in the MediaPipe order, `x`/`y` in
//! `[0, 1]` relative to the frame with the origin at the top-left and `y`
//! growing downward.  Observations live for one processing cycle only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GestureError, GestureResult};

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices
// ════════════════════════════════════════════════════════════════════════════

/// Number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_CMC:  usize = 1;
pub const THUMB_MCP:  usize = 2;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_DIP:  usize = 7;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP:   usize = 13;
pub const RING_PIP:   usize = 14;
pub const RING_DIP:   usize = 15;
pub const RING_TIP:   usize = 16;
pub const PINKY_MCP:  usize = 17;
pub const PINKY_PIP:  usize = 18;
pub const PINKY_DIP:  usize = 19;
pub const PINKY_TIP:  usize = 20;

/// The five fingertips, thumb first.
pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Bone segments between landmarks, for drawing a tracked hand.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (WRIST, THUMB_CMC), (THUMB_CMC, THUMB_MCP), (THUMB_MCP, THUMB_IP), (THUMB_IP, THUMB_TIP),
    (WRIST, INDEX_MCP), (INDEX_MCP, INDEX_PIP), (INDEX_PIP, INDEX_DIP), (INDEX_DIP, INDEX_TIP),
    (INDEX_MCP, MIDDLE_MCP), (MIDDLE_MCP, MIDDLE_PIP), (MIDDLE_PIP, MIDDLE_DIP), (MIDDLE_DIP, MIDDLE_TIP),
    (MIDDLE_MCP, RING_MCP), (RING_MCP, RING_PIP), (RING_PIP, RING_DIP), (RING_DIP, RING_TIP),
    (RING_MCP, PINKY_MCP), (PINKY_MCP, PINKY_PIP), (PINKY_PIP, PINKY_DIP), (PINKY_DIP, PINKY_TIP),
    (WRIST, PINKY_MCP),
];

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// One normalized landmark point.  `z` is detector-relative depth and is
/// carried along but not used by any classifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32) -> Self {
        Landmark { x, y, z: 0.0 }
    }

    /// Planar distance to another landmark, in normalized units.
    pub fn distance_to(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Project into pixel space.
    pub fn to_pixels(&self, frame: FrameSize) -> (f32, f32) {
        (self.x * frame.width as f32, self.y * frame.height as f32)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Handedness
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Handedness::Left  => "Left",
            Handedness::Right => "Right",
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Handedness {
    type Err = GestureError;

    fn from_str(s: &str) -> GestureResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left"  => Ok(Handedness::Left),
            "right" => Ok(Handedness::Right),
            _       => Err(GestureError::Handedness(s.to_string())),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FrameSize
// ════════════════════════════════════════════════════════════════════════════

/// Pixel dimensions of the frame the landmarks were detected in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSize {
    pub width:  u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        FrameSize { width, height }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandObservation
// ════════════════════════════════════════════════════════════════════════════

/// One tracked hand in the current cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct HandObservation {
    pub handedness: Handedness,
    points:         [Landmark; LANDMARK_COUNT],
}

impl HandObservation {
    /// Build an observation from detector output.  Anything other than
    /// exactly 21 points is rejected.
    pub fn new(handedness: Handedness, points: &[Landmark]) -> GestureResult<Self> {
        let points: [Landmark; LANDMARK_COUNT] = points.try_into().map_err(|_| {
            GestureError::LandmarkCount { expected: LANDMARK_COUNT, got: points.len() }
        })?;
        Ok(HandObservation { handedness, points })
    }

    pub fn from_array(handedness: Handedness, points: [Landmark; LANDMARK_COUNT]) -> Self {
        HandObservation { handedness, points }
    }

    pub fn landmark(&self, index: usize) -> &Landmark {
        &self.points[index]
    }

    pub fn landmarks(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    pub fn landmarks_mut(&mut self) -> &mut [Landmark; LANDMARK_COUNT] {
        &mut self.points
    }

    pub fn wrist(&self) -> &Landmark     { &self.points[WRIST] }
    pub fn thumb_tip(&self) -> &Landmark { &self.points[THUMB_TIP] }
    pub fn index_tip(&self) -> &Landmark { &self.points[INDEX_TIP] }

    /// Mirror horizontally (`x -> 1 - x`), as when the camera image is
    /// flipped into a selfie view.  Handedness labels are left untouched.
    pub fn mirrored(mut self) -> Self {
        for p in self.points.iter_mut() {
            p.x = 1.0 - p.x;
        }
        self
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
