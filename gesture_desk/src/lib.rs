//! # gesture_desk
//!
//! Desktop shell around the [`hand_gesture`] session: hand sources,
//! OS-facing collaborators, the overlay window and the cycle loop.
//!
//! ## Hand sources
//!
//! * `sim` (default) — **Simulation mode**: two puppet hands driven from the
//!   overlay window.  No camera required.
//! * `pipe` — an external landmark detector (for example a MediaPipe helper
//!   that owns the camera) writing one JSON line per frame.
//! * `leap` — **Hardware mode**: a LeapMotion controller via LeapC, behind
//!   the `leap` cargo feature.
//!
//! ### Simulation controls
//!
//! | Key | Effect |
//! |---|---|
//! | `1` / `2` | Show / hide the left / right hand |
//! | `F` / `J` | Toggle a fist on the left / right hand |
//! | `A` / `S` (hold) | Close / open the left pinch (volume) |
//! | `K` / `L` (hold) | Close / open the right pinch (brightness) |
//! | mouse | Right index fingertip |
//! | `Q` / `Escape` | Quit |
//!
//! Opening the menu: `F` then `J`.  Point at an item with the mouse, then
//! move into the launch region (100..300 px square) to launch it.

pub mod app;
pub mod config;
pub mod source;
pub mod system;
pub mod visualizer;
