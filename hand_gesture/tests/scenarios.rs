//! End-to-end cycles through `Session` with recording collaborators.

use hand_gesture::pose;
use hand_gesture::recording::{Recorder, StaticProcesses};
use hand_gesture::{
    pinch_distance, Channel, FrameSize, HandObservation, Handedness, Landmark, LaunchCommand,
    LaunchOutcome, LevelUpdate, MenuItem, Mode, Session, SessionConfig,
};
use proptest::prelude::*;

const FRAME: FrameSize = FrameSize::new(640, 480);

fn menu() -> Vec<MenuItem> {
    [
        ("Notepad", "notepad.exe"),
        ("Calculator", "calc.exe"),
        ("Paint", "mspaint.exe"),
        ("WordPad", "write.exe"),
        ("Snipping Tool", "snippingtool.exe"),
    ]
    .iter()
    .map(|(label, prog)| MenuItem::new(label, LaunchCommand::new(prog, Vec::new()).unwrap()))
    .collect()
}

fn session() -> Session {
    Session::new(SessionConfig { menu: menu(), ..SessionConfig::default() })
}

fn open(side: Handedness, pinch: f32) -> HandObservation {
    pose::relaxed(side, Landmark::new(0.4, 0.2), pinch)
}

fn fist(side: Handedness, pinch: f32) -> HandObservation {
    pose::fist(side, Landmark::new(0.6, 0.85), pinch)
}

fn px(x: f32, y: f32) -> Landmark {
    Landmark::new(x / FRAME.width as f32, y / FRAME.height as f32)
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

// ── continuous control ───────────────────────────────────────────────────

#[test]
fn pinch_sequence_drives_volume() {
    let mut s = session();
    let mut rec = Recorder::default();

    let r = s.process_cycle(&[open(Handedness::Left, 0.10)], FRAME, &mut rec.effects());
    assert!(matches!(&r.level_updates[..], [(Channel::Volume, LevelUpdate::Recorded { .. })]));
    assert_eq!(s.volume(), 0.0);

    s.process_cycle(&[open(Handedness::Left, 0.12)], FRAME, &mut rec.effects());
    assert!(close(s.volume(), 20.0));

    s.process_cycle(&[open(Handedness::Left, 0.09)], FRAME, &mut rec.effects());
    assert_eq!(s.volume(), 0.0);

    assert_eq!(rec.volume.values.len(), 2);
    assert!(close(rec.volume.values[0], 0.2));
    assert_eq!(rec.volume.values[1], 0.0);
}

#[test]
fn unchanged_level_is_still_pushed() {
    let mut s = session();
    let mut rec = Recorder::default();
    for _ in 0..3 {
        s.process_cycle(&[open(Handedness::Left, 0.10)], FRAME, &mut rec.effects());
    }
    assert_eq!(rec.volume.values, vec![0.0, 0.0]);
}

#[test]
fn both_hands_update_independently_each_cycle() {
    let mut s = session();
    let mut rec = Recorder::default();
    s.process_cycle(&[open(Handedness::Left, 0.10), open(Handedness::Right, 0.20)], FRAME, &mut rec.effects());
    s.process_cycle(&[open(Handedness::Left, 0.15), open(Handedness::Right, 0.23)], FRAME, &mut rec.effects());
    assert!(close(s.volume(), 50.0));
    assert!(close(s.brightness(), 30.0));
    assert_eq!(s.mode(), Mode::ContinuousControl);
}

// ── engagement lock ──────────────────────────────────────────────────────

#[test]
fn double_fist_freezes_volume() {
    let mut s = session();
    let mut rec = Recorder::default();
    for pinch in [0.05, 0.20, 0.12] {
        s.process_cycle(&[fist(Handedness::Left, pinch), fist(Handedness::Right, 0.1)], FRAME, &mut rec.effects());
        assert_eq!(s.volume(), 0.0);
    }
    assert!(rec.volume.values.is_empty());
}

#[test]
fn double_fist_allows_one_update_then_freezes() {
    let mut s = session();
    let mut rec = Recorder::default();
    s.process_cycle(&[open(Handedness::Left, 0.10), open(Handedness::Right, 0.10)], FRAME, &mut rec.effects());

    // Entering the pose: one update from 0.10 to 0.13.
    s.process_cycle(&[fist(Handedness::Left, 0.13), fist(Handedness::Right, 0.10)], FRAME, &mut rec.effects());
    let frozen = s.volume();
    assert!(close(frozen, 30.0));

    for pinch in [0.01, 0.30, 0.02] {
        let r = s.process_cycle(&[fist(Handedness::Left, pinch), fist(Handedness::Right, pinch)], FRAME, &mut rec.effects());
        assert!(r.level_updates.is_empty());
        assert_eq!(s.volume(), frozen);
    }

    // The cycle that breaks the pose is still locked; it only reopens the locks.
    let r = s.process_cycle(&[open(Handedness::Left, 0.14), open(Handedness::Right, 0.10)], FRAME, &mut rec.effects());
    assert!(r.level_updates.is_empty());
    assert_eq!(s.volume(), frozen);

    // Updates resume against the last recorded distance (0.13).
    s.process_cycle(&[open(Handedness::Left, 0.14), open(Handedness::Right, 0.10)], FRAME, &mut rec.effects());
    assert!(close(s.volume(), 40.0));
}

// ── mode transitions ─────────────────────────────────────────────────────

#[test]
fn two_fists_open_menu_and_release_closes_it() {
    let mut s = session();
    let mut rec = Recorder::default();

    let r = s.process_cycle(&[fist(Handedness::Left, 0.1), fist(Handedness::Right, 0.1)], FRAME, &mut rec.effects());
    assert_eq!((r.mode_before, r.mode_after), (Mode::ContinuousControl, Mode::MenuActive));

    // Select item 1 with the right index (x < 100 keeps it out of the launch region).
    let right = pose::with_index_tip(fist(Handedness::Right, 0.1), px(95.0, 140.0));
    let r = s.process_cycle(&[fist(Handedness::Left, 0.1), right], FRAME, &mut rec.effects());
    assert_eq!(r.selected, Some(1));

    let r = s.process_cycle(&[fist(Handedness::Left, 0.1), open(Handedness::Right, 0.1)], FRAME, &mut rec.effects());
    assert_eq!((r.mode_before, r.mode_after), (Mode::MenuActive, Mode::ContinuousControl));
    assert_eq!(r.selected, None);
    assert_eq!(s.menu().selected(), None);
    assert!(!s.locks().get(Handedness::Left).is_engaged());
    assert!(!s.locks().get(Handedness::Right).is_engaged());

    // Reopening starts without a stale selection.
    let r = s.process_cycle(&[fist(Handedness::Left, 0.1), fist(Handedness::Right, 0.1)], FRAME, &mut rec.effects());
    assert_eq!(r.mode_after, Mode::MenuActive);
    assert_eq!(r.selected, None);
}

#[test]
fn single_hand_fist_never_opens_menu() {
    let mut s = session();
    let mut rec = Recorder::default();
    let r = s.process_cycle(&[fist(Handedness::Left, 0.1)], FRAME, &mut rec.effects());
    assert_eq!(r.fist_count, 1);
    assert_eq!(s.mode(), Mode::ContinuousControl);
}

// ── launching ────────────────────────────────────────────────────────────

/// Menu open with item 2 selected, right index still outside the region.
fn session_with_item_two_selected(rec: &mut Recorder) -> Session {
    let mut s = session();
    let right = pose::with_index_tip(fist(Handedness::Right, 0.1), px(95.0, 190.0));
    let r = s.process_cycle(&[fist(Handedness::Left, 0.1), right], FRAME, &mut rec.effects());
    assert_eq!(r.selected, Some(2));
    assert!(r.launch.is_none());
    s
}

#[test]
fn launch_gesture_launches_selected_item_once() {
    let mut rec = Recorder::default();
    let mut s = session_with_item_two_selected(&mut rec);

    let right = pose::with_index_tip(fist(Handedness::Right, 0.1), px(150.0, 190.0));
    let r = s.process_cycle(&[fist(Handedness::Left, 0.1), right], FRAME, &mut rec.effects());

    assert_eq!(r.launch, Some((2, LaunchOutcome::Launched)));
    assert_eq!(rec.launcher.launched.len(), 1);
    assert_eq!(rec.launcher.launched[0].program(), "mspaint.exe");
    assert_eq!(r.mode_after, Mode::ContinuousControl);
    assert!(!s.menu().is_visible());
    assert_eq!(s.menu().selected(), None);

    // Letting go afterwards launches nothing further.
    s.process_cycle(&[open(Handedness::Left, 0.1), open(Handedness::Right, 0.1)], FRAME, &mut rec.effects());
    assert_eq!(rec.launcher.launched.len(), 1);
}

#[test]
fn held_launch_pose_launches_once_and_keeps_levels_frozen() {
    let mut rec = Recorder::default();
    let mut s = session_with_item_two_selected(&mut rec);

    let mut launches = 0;
    for step in 0..6 {
        let pinch = 0.10 + 0.02 * step as f32;
        let right = pose::with_index_tip(fist(Handedness::Right, pinch), px(150.0, 190.0));
        let r = s.process_cycle(&[fist(Handedness::Left, pinch), right], FRAME, &mut rec.effects());
        launches += r.launch.iter().count();
        assert!(r.level_updates.is_empty());
        assert_eq!(r.mode_after, Mode::ContinuousControl);
    }

    assert_eq!(launches, 1);
    assert_eq!(rec.launcher.launched.len(), 1);
    assert_eq!(s.volume(), 0.0);
    assert_eq!(s.brightness(), 0.0);
    assert!(rec.volume.values.is_empty() && rec.brightness.values.is_empty());
}

#[test]
fn menu_reopens_after_fists_are_released() {
    let mut rec = Recorder::default();
    let mut s = session_with_item_two_selected(&mut rec);
    let right = pose::with_index_tip(fist(Handedness::Right, 0.1), px(150.0, 190.0));
    s.process_cycle(&[fist(Handedness::Left, 0.1), right], FRAME, &mut rec.effects());
    assert_eq!(rec.launcher.launched.len(), 1);

    // Still held: stays shut.
    let r = s.process_cycle(&[fist(Handedness::Left, 0.1), fist(Handedness::Right, 0.1)], FRAME, &mut rec.effects());
    assert_eq!(r.mode_after, Mode::ContinuousControl);

    // Let go once, then two fists open it again.
    s.process_cycle(&[open(Handedness::Left, 0.1), open(Handedness::Right, 0.1)], FRAME, &mut rec.effects());
    assert!(!s.locks().get(Handedness::Left).is_engaged());
    let r = s.process_cycle(&[fist(Handedness::Left, 0.1), fist(Handedness::Right, 0.1)], FRAME, &mut rec.effects());
    assert_eq!(r.mode_after, Mode::MenuActive);
    assert_eq!(rec.launcher.launched.len(), 1);
}

#[test]
fn running_application_is_not_relaunched() {
    let mut rec = Recorder { processes: StaticProcesses::with(&["mspaint.exe"]), ..Recorder::default() };
    let mut s = session_with_item_two_selected(&mut rec);

    let right = pose::with_index_tip(fist(Handedness::Right, 0.1), px(150.0, 190.0));
    let r = s.process_cycle(&[fist(Handedness::Left, 0.1), right], FRAME, &mut rec.effects());

    assert_eq!(r.launch, Some((2, LaunchOutcome::AlreadyRunning)));
    assert!(rec.launcher.launched.is_empty());
    assert_eq!(rec.processes.queries, 1);
    assert!(!s.menu().is_visible());
}

#[test]
fn no_launch_without_left_fist() {
    let mut rec = Recorder::default();
    let mut s = session_with_item_two_selected(&mut rec);

    // Left hand relaxed: fist count drops, menu closes before any launch check.
    let right = pose::with_index_tip(fist(Handedness::Right, 0.1), px(150.0, 190.0));
    let r = s.process_cycle(&[open(Handedness::Left, 0.1), right], FRAME, &mut rec.effects());
    assert!(r.launch.is_none());
    assert!(rec.launcher.launched.is_empty());
    assert_eq!(rec.processes.queries, 0);
}

#[test]
fn launch_region_edges_are_inclusive() {
    let mut rec = Recorder::default();
    let mut s = session_with_item_two_selected(&mut rec);
    // Bottom-left corner of the launch region, which also lies in item 4's box.
    let right = pose::with_index_tip(fist(Handedness::Right, 0.1), px(100.0, 300.0));
    let r = s.process_cycle(&[fist(Handedness::Left, 0.1), right], FRAME, &mut rec.effects());
    assert_eq!(r.launch, Some((4, LaunchOutcome::Launched)));
    assert_eq!(rec.launcher.launched[0].program(), "snippingtool.exe");
}

// ── properties ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn level_matches_clamped_fold(pinches in proptest::collection::vec(0.0f32..0.3, 1..40)) {
        let mut s = session();
        let mut rec = Recorder::default();
        let mut model = 0.0f32;
        let mut prev: Option<f32> = None;

        for p in pinches {
            let hand = open(Handedness::Left, p);
            let d = pinch_distance(&hand);
            if let Some(q) = prev {
                model = (model + (d - q) * 1000.0).clamp(0.0, 100.0);
            }
            prev = Some(d);
            s.process_cycle(&[hand], FRAME, &mut rec.effects());
            prop_assert_eq!(s.volume(), model);
            prop_assert!((0.0..=100.0).contains(&s.volume()));
        }
    }

    #[test]
    fn level_frozen_while_double_fist_held(pinches in proptest::collection::vec(0.0f32..0.3, 2..20)) {
        let mut s = session();
        let mut rec = Recorder::default();
        s.process_cycle(&[open(Handedness::Left, 0.1), open(Handedness::Right, 0.1)], FRAME, &mut rec.effects());
        s.process_cycle(&[fist(Handedness::Left, pinches[0]), fist(Handedness::Right, 0.1)], FRAME, &mut rec.effects());
        let frozen = (s.volume(), s.brightness());
        for p in &pinches[1..] {
            s.process_cycle(&[fist(Handedness::Left, *p), fist(Handedness::Right, *p)], FRAME, &mut rec.effects());
            prop_assert_eq!((s.volume(), s.brightness()), frozen);
        }
    }
}
