//! Synthetic hand poses.
//!
//! Used by the keyboard/mouse simulator to puppet two hands without a
//! camera, and by tests.  The poses are built around the classifier's
//! heuristics: a *relaxed* hand hangs with its fingertips below the wrist
//! (not a fist), a *fist* has every fingertip above it.  In both, the
//! thumb and index tips sit exactly `pinch` apart.

use crate::landmark::{
    Handedness, HandObservation, Landmark, LANDMARK_COUNT, INDEX_TIP, THUMB_TIP, WRIST,
};

/// Horizontal spacing between neighbouring fingers.
const FINGER_SPREAD: f32 = 0.03;
/// Vertical distance between consecutive joints of one finger.
const JOINT_STEP:    f32 = 0.04;
/// Vertical offset of curled joints above the wrist in a fist.
const CURL_STEP:     f32 = 0.015;

/// Fingers hanging below the wrist; `pinch` between thumb and index tip.
pub fn relaxed(handedness: Handedness, wrist: Landmark, pinch: f32) -> HandObservation {
    let mut pts = fan(wrist, JOINT_STEP);
    let tip_y = wrist.y + 5.0 * JOINT_STEP;
    pts[THUMB_TIP] = Landmark::new(wrist.x - pinch / 2.0, tip_y);
    pts[INDEX_TIP] = Landmark::new(wrist.x + pinch / 2.0, tip_y);
    HandObservation::from_array(handedness, pts)
}

/// Fingers curled above the wrist; `pinch` between thumb and index tip.
pub fn fist(handedness: Handedness, wrist: Landmark, pinch: f32) -> HandObservation {
    let mut pts = fan(wrist, -CURL_STEP);
    let tip_y = wrist.y - 5.0 * CURL_STEP;
    pts[THUMB_TIP] = Landmark::new(wrist.x - pinch / 2.0, tip_y);
    pts[INDEX_TIP] = Landmark::new(wrist.x + pinch / 2.0, tip_y);
    HandObservation::from_array(handedness, pts)
}

/// Move the index fingertip, leaving the rest of the hand in place.
pub fn with_index_tip(mut hand: HandObservation, tip: Landmark) -> HandObservation {
    hand.landmarks_mut()[INDEX_TIP] = tip;
    hand
}

/// Five fingers of four joints each, spread around the wrist and stepping
/// `step` per joint (positive = downward on screen).
fn fan(wrist: Landmark, step: f32) -> [Landmark; LANDMARK_COUNT] {
    let mut pts = [wrist; LANDMARK_COUNT];
    pts[WRIST] = wrist;
    for finger in 0..5 {
        let x = wrist.x + (finger as f32 - 2.0) * FINGER_SPREAD;
        for joint in 0..4 {
            let idx = 1 + finger * 4 + joint;
            pts[idx] = Landmark::new(x, wrist.y + step * (joint as f32 + 1.0));
        }
    }
    pts
}
