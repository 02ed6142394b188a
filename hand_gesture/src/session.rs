//! Interaction state machine.
//!
//! `Session` owns all state that outlives a frame (the two channel levels,
//! the engagement locks and the menu) and advances it one processing cycle
//! at a time through [`Session::process_cycle`].  Side effects go through
//! the collaborators bundled in [`Effects`].
//!
//! ## Modes
//!
//! | From               | Condition (one cycle)          | To                 |
//! |--------------------|--------------------------------|--------------------|
//! | ContinuousControl  | exactly two hands, both fists  | MenuActive         |
//! | MenuActive         | fewer than two fists           | ContinuousControl  |
//! | MenuActive         | launch gesture on a selection  | ContinuousControl  |
//!
//! Dropping below two fists hides the menu, drops the selection and
//! releases both engagement locks.  A launch hides the menu but keeps the
//! locks, and the menu stays shut until the fists have been let go once.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::classifier::{is_fist, is_pointing_at_region, pinch_distance, Rect};
use crate::landmark::{FrameSize, HandObservation, Handedness};
use crate::launch::{AppLaunchGuard, LaunchOutcome, ProcessInspector, ProcessLauncher};
use crate::level::{
    push_level, BrightnessSink, Channel, ChannelLevel, LevelController, LevelUpdate, VolumeSink,
    DEFAULT_SCALE,
};
use crate::lock::EngagementLocks;
use crate::menu::{MenuItem, MenuState};

/// Where the right hand must point for a launch, in pixels.
pub const DEFAULT_LAUNCH_REGION: Rect = Rect::new(100.0, 100.0, 300.0, 300.0);

// ════════════════════════════════════════════════════════════════════════════
// Configuration
// ════════════════════════════════════════════════════════════════════════════

/// Which hand's index fingertip is hit-tested against the menu.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointerHand {
    /// Whichever hand the detector listed last this cycle.
    #[default]
    LastObserved,
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub scale:              f32,
    pub initial_volume:     f32,
    pub initial_brightness: f32,
    pub launch_region:      Rect,
    pub pointer_hand:       PointerHand,
    pub menu:               Vec<MenuItem>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            scale:              DEFAULT_SCALE,
            initial_volume:     0.0,
            initial_brightness: 0.0,
            launch_region:      DEFAULT_LAUNCH_REGION,
            pointer_hand:       PointerHand::LastObserved,
            menu:               Vec::new(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Effects — external collaborators for one cycle
// ════════════════════════════════════════════════════════════════════════════

pub struct Effects<'a> {
    pub volume:     &'a mut dyn VolumeSink,
    pub brightness: &'a mut dyn BrightnessSink,
    pub inspector:  &'a mut dyn ProcessInspector,
    pub launcher:   &'a mut dyn ProcessLauncher,
}

// ════════════════════════════════════════════════════════════════════════════
// Mode / Overlay / CycleReport
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    ContinuousControl,
    MenuActive,
}

/// What the renderer should draw this cycle: level bars or the menu,
/// never both.
#[derive(Clone, Debug, PartialEq)]
pub enum Overlay<'a> {
    Bars { volume: f32, brightness: f32 },
    Menu { items: &'a [MenuItem], selected: Option<usize> },
}

/// Summary of one processing cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct CycleReport {
    pub mode_before:   Mode,
    pub mode_after:    Mode,
    pub fist_count:    usize,
    pub level_updates: Vec<(Channel, LevelUpdate)>,
    pub selected:      Option<usize>,
    pub launch:        Option<(usize, LaunchOutcome)>,
}

impl CycleReport {
    fn idle(mode: Mode, selected: Option<usize>) -> Self {
        CycleReport {
            mode_before:   mode,
            mode_after:    mode,
            fist_count:    0,
            level_updates: Vec::new(),
            selected,
            launch:        None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Session
// ════════════════════════════════════════════════════════════════════════════

pub struct Session {
    controller:    LevelController,
    volume:        ChannelLevel,
    brightness:    ChannelLevel,
    locks:         EngagementLocks,
    menu:          MenuState,
    launch_region: Rect,
    pointer_hand:  PointerHand,
    /// Set by a launch; cleared once fewer than two fists are seen.
    menu_latched:  bool,
}

impl Session {
    pub fn new(cfg: SessionConfig) -> Self {
        Session {
            controller:    LevelController::new(cfg.scale),
            volume:        ChannelLevel::new(cfg.initial_volume),
            brightness:    ChannelLevel::new(cfg.initial_brightness),
            locks:         EngagementLocks::default(),
            menu:          MenuState::new(cfg.menu),
            launch_region: cfg.launch_region,
            pointer_hand:  cfg.pointer_hand,
            menu_latched:  false,
        }
    }

    /// Push the starting levels to both sinks so the system matches the
    /// session before the first frame.
    pub fn prime(&mut self, fx: &mut Effects<'_>) {
        for channel in [Channel::Volume, Channel::Brightness] {
            let level = self.level(channel).value();
            self.push(channel, level, fx);
        }
    }

    // ── one processing cycle ─────────────────────────────────────────────

    pub fn process_cycle(
        &mut self,
        hands: &[HandObservation],
        frame: FrameSize,
        fx:    &mut Effects<'_>,
    ) -> CycleReport {
        let mut report = CycleReport::idle(self.mode(), self.menu.selected());
        if hands.is_empty() {
            return report;
        }

        // ── continuous control, gated per hand ───────────────────────────
        let mut fist_count = 0;
        let mut left:  Option<&HandObservation> = None;
        let mut right: Option<&HandObservation> = None;
        let controller = self.controller;

        for hand in hands {
            let side = hand.handedness;
            match side {
                Handedness::Left  => left  = Some(hand),
                Handedness::Right => right = Some(hand),
            }

            if self.locks.get(side).should_update() {
                let channel = Channel::for_hand(side);
                let update = controller.update(self.level_mut(channel), pinch_distance(hand));
                if let Some(to) = update.applied_value() {
                    self.push(channel, to, fx);
                }
                self.locks.get_mut(side).engage();
                report.level_updates.push((channel, update));
            }

            if is_fist(hand) {
                fist_count += 1;
            }
        }
        report.fist_count = fist_count;

        // ── mode arbitration ─────────────────────────────────────────────
        if hands.len() == 2 && fist_count == 2 && !self.menu.is_visible() && !self.menu_latched {
            info!("two fists: menu shown");
            self.menu.show();
        }
        if self.locks.end_cycle(fist_count) {
            if self.menu.is_visible() {
                info!("fists released: menu hidden");
                self.menu.hide();
            }
            if self.menu_latched {
                debug!("fists released: menu re-armed");
                self.menu_latched = false;
            }
        }

        // ── menu selection and launch ────────────────────────────────────
        if self.menu.is_visible() {
            if let Some(pointer) = self.pointer(hands) {
                let (x, y) = pointer.index_tip().to_pixels(frame);
                if let Some(i) = self.menu.select_at(x, y) {
                    debug!("pointer at ({:.0}, {:.0}) selects item {}", x, y, i);
                }
            }

            if let Some(index) = self.menu.selected() {
                if self.launch_gesture(left, right, frame) {
                    let outcome = self.launch(index, fx);
                    report.launch = Some((index, outcome));
                    info!("menu hidden until the fists are released");
                    self.menu.hide();
                    self.menu_latched = true;
                }
            }
        }

        report.selected = self.menu.selected();
        report.mode_after = self.mode();
        report
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        if self.menu.is_visible() { Mode::MenuActive } else { Mode::ContinuousControl }
    }

    pub fn level(&self, channel: Channel) -> &ChannelLevel {
        match channel {
            Channel::Volume     => &self.volume,
            Channel::Brightness => &self.brightness,
        }
    }

    pub fn volume(&self) -> f32     { self.volume.value() }
    pub fn brightness(&self) -> f32 { self.brightness.value() }
    pub fn menu(&self) -> &MenuState { &self.menu }
    pub fn locks(&self) -> &EngagementLocks { &self.locks }

    pub fn overlay(&self) -> Overlay<'_> {
        if self.menu.is_visible() {
            Overlay::Menu { items: self.menu.items(), selected: self.menu.selected() }
        } else {
            Overlay::Bars { volume: self.volume(), brightness: self.brightness() }
        }
    }

    // ── internals ────────────────────────────────────────────────────────

    fn level_mut(&mut self, channel: Channel) -> &mut ChannelLevel {
        match channel {
            Channel::Volume     => &mut self.volume,
            Channel::Brightness => &mut self.brightness,
        }
    }

    fn push(&self, channel: Channel, level: f32, fx: &mut Effects<'_>) {
        if let Err(e) = push_level(channel, level, &mut *fx.volume, &mut *fx.brightness) {
            warn!("{} sink failed: {}", channel.name(), e);
        }
    }

    fn pointer<'h>(&self, hands: &'h [HandObservation]) -> Option<&'h HandObservation> {
        match self.pointer_hand {
            PointerHand::LastObserved => hands.last(),
            PointerHand::Left  => hands.iter().rev().find(|h| h.handedness == Handedness::Left),
            PointerHand::Right => hands.iter().rev().find(|h| h.handedness == Handedness::Right),
        }
    }

    /// Left hand engaged and fisted, right index inside the launch region.
    fn launch_gesture(
        &self,
        left:  Option<&HandObservation>,
        right: Option<&HandObservation>,
        frame: FrameSize,
    ) -> bool {
        let left_ready = self.locks.get(Handedness::Left).is_engaged()
            && left.is_some_and(is_fist);
        left_ready && right.is_some_and(|r| is_pointing_at_region(r, frame, &self.launch_region))
    }

    fn launch(&self, index: usize, fx: &mut Effects<'_>) -> LaunchOutcome {
        let item = &self.menu.items()[index];
        info!("launch gesture on \"{}\"", item.label);
        AppLaunchGuard::launch_once(
            &mut *fx.inspector,
            &mut *fx.launcher,
            &item.process_name,
            &item.command,
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
