//! Gesture classification — pure predicates over a single hand.
//!
//! Nothing here keeps state between frames; every function looks at the
//! current observation only and always returns a definite answer.

use serde::{Deserialize, Serialize};

use crate::landmark::{FrameSize, HandObservation, FINGERTIPS};

// ════════════════════════════════════════════════════════════════════════════
// Rect — pixel-space region
// ════════════════════════════════════════════════════════════════════════════

/// Axis-aligned pixel rectangle.
///
/// [`Rect::contains`] is inclusive on all four edges, so a point lying
/// exactly on a border (corners included) is inside.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left:   f32,
    pub top:    f32,
    pub right:  f32,
    pub bottom: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Rect { left, top, right, bottom }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }

    pub fn width(&self) -> f32  { self.right - self.left }
    pub fn height(&self) -> f32 { self.bottom - self.top }
}

// ════════════════════════════════════════════════════════════════════════════
// Predicates
// ════════════════════════════════════════════════════════════════════════════

/// Distance between the thumb tip and the index fingertip, in normalized
/// coordinates.
pub fn pinch_distance(hand: &HandObservation) -> f32 {
    hand.index_tip().distance_to(hand.thumb_tip())
}

/// Coarse fist test: every fingertip sits above the wrist on screen
/// (numerically smaller `y`).
///
/// This misreads some orientations (an open hand held upright passes).
/// Callers rely on exactly this behaviour, so it stays a heuristic.
pub fn is_fist(hand: &HandObservation) -> bool {
    let wrist_y = hand.wrist().y;
    FINGERTIPS.iter().all(|&tip| hand.landmark(tip).y < wrist_y)
}

/// Whether the index fingertip, projected into pixels, lies in `region`.
pub fn is_pointing_at_region(hand: &HandObservation, frame: FrameSize, region: &Rect) -> bool {
    let (x, y) = hand.index_tip().to_pixels(frame);
    region.contains(x, y)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
