//! # hand_gesture
//!
//! Turns per-frame hand landmarks into continuous levels (volume,
//! brightness) and discrete application launches.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Hand | Action |
//! |---|---|---|
//! | Pinch opens / closes | Left | Volume up / down (Δdistance × 1000) |
//! | Pinch opens / closes | Right | Brightness up / down |
//! | Both hands fisted | Both | Show the application menu, freeze levels |
//! | Index over a menu item | Pointer hand | Select that item |
//! | Left fist + right index in the launch region | Both | Launch the selection (once), hide menu |
//! | Release either fist | Either | Hide the menu |
//!
//! ## Layers
//!
//! * [`classifier`] — pure predicates over one hand: pinch distance, fist,
//!   pointing-at-region.
//! * [`level`] / [`lock`] — clamped channel levels and the per-hand locks
//!   that gate them.
//! * [`menu`] / [`launch`] — the on-screen list and deduplicated launching.
//! * [`session`] — the state machine tying it together, one call per frame.
//!
//! Everything the core does to the outside world goes through the
//! collaborator traits ([`VolumeSink`], [`BrightnessSink`],
//! [`ProcessInspector`], [`ProcessLauncher`]), so the whole machine runs
//! in tests against [`recording`] doubles.

pub mod classifier;
pub mod error;
pub mod landmark;
pub mod launch;
pub mod level;
pub mod lock;
pub mod menu;
pub mod pose;
pub mod recording;
pub mod session;

pub use classifier::{is_fist, is_pointing_at_region, pinch_distance, Rect};
pub use error::{ActuatorError, GestureError, GestureResult};
pub use landmark::{FrameSize, HandObservation, Handedness, Landmark};
pub use launch::{AppLaunchGuard, LaunchCommand, LaunchOutcome, ProcessInspector, ProcessLauncher};
pub use level::{BrightnessSink, Channel, ChannelLevel, LevelController, LevelUpdate, VolumeSink};
pub use lock::{EngagementLock, EngagementLocks};
pub use menu::{MenuItem, MenuState};
pub use session::{CycleReport, Effects, Mode, Overlay, PointerHand, Session, SessionConfig};
