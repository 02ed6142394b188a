//! The cycle loop and application wiring.
//!
//! One cycle = acquire a frame → detect hands → advance the session →
//! draw the overlay → check for a stop request.  Everything runs on the
//! calling thread; the source is released on every way out of the loop.

use std::sync::mpsc;

use anyhow::bail;
use log::{info, warn};

use hand_gesture::{Effects, FrameSize, Session};

use crate::config::{DeskConfig, SourceKind};
use crate::source::{HandSource, PipeHandSource, SimHandSource};
use crate::system::Actuators;
use crate::visualizer::{HeadlessRenderer, Renderer, Visualizer, WIN_H, WIN_W};

// ════════════════════════════════════════════════════════════════════════════
// LoopSummary
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// Q, Escape or the window was closed.
    StopRequested,
    /// The source had no more frames.
    SourceExhausted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopSummary {
    pub cycles:   u64,
    pub launches: u64,
    pub exit:     ExitReason,
}

/// Releases the wrapped source when dropped, including during unwinding.
struct ReleaseOnExit<'a>(&'a mut dyn HandSource);

impl Drop for ReleaseOnExit<'_> {
    fn drop(&mut self) {
        info!("releasing {}", self.0.name());
        self.0.release();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run_loop
// ════════════════════════════════════════════════════════════════════════════

pub fn run_loop(
    session:  &mut Session,
    source:   &mut dyn HandSource,
    renderer: &mut dyn Renderer,
    fx:       &mut Effects<'_>,
) -> LoopSummary {
    let mut guard = ReleaseOnExit(source);
    let mut cycles = 0u64;
    let mut launches = 0u64;

    let exit = loop {
        // 1. Acquire
        let Some(frame) = guard.0.next_frame() else {
            break ExitReason::SourceExhausted;
        };

        // 2. Detect
        let hands = guard.0.detect(&frame);

        // 3. Advance the session
        let report = session.process_cycle(&hands, frame.size, fx);
        cycles += 1;
        if let Some((index, outcome)) = report.launch {
            launches += 1;
            info!("cycle {}: item {} -> {:?}", cycles, index, outcome);
        }

        // 4. Draw
        renderer.draw(&session.overlay(), &hands, frame.size);

        // 5. Stop?
        if renderer.stop_requested() {
            break ExitReason::StopRequested;
        }
    };

    drop(guard);
    LoopSummary { cycles, launches, exit }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — wiring from a DeskConfig
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// This is the entry point called from `main.rs`.  It builds the session
/// and collaborators from `cfg`, opens the hand source and the renderer,
/// primes the sinks and drives the cycle loop until it ends.
pub fn run(cfg: DeskConfig) -> anyhow::Result<LoopSummary> {
    cfg.validate()?;
    let mut session = Session::new(cfg.to_session_config()?);
    let mut actuators = Actuators::from_config(&cfg);

    // ── Source and renderer ───────────────────────────────────────────────
    let (mut source, mut renderer): (Box<dyn HandSource>, Box<dyn Renderer>) = match cfg.source {
        SourceKind::Sim => {
            let (sim_tx, sim_rx) = mpsc::channel();
            let vis = Visualizer::new(Some(sim_tx), cfg.launch_region)?;
            let sim = SimHandSource::new(sim_rx, FrameSize::new(WIN_W as u32, WIN_H as u32));
            let source: Box<dyn HandSource> = Box::new(sim);
            let renderer: Box<dyn Renderer> = Box::new(vis);
            (source, renderer)
        }
        SourceKind::Pipe => {
            let Some(detector) = &cfg.detector else {
                bail!("source 'pipe' needs a detector command");
            };
            let pipe: Box<dyn HandSource> = Box::new(PipeHandSource::spawn(detector, cfg.mirror)?);
            (pipe, make_renderer(&cfg)?)
        }
        SourceKind::Leap => (open_leap()?, make_renderer(&cfg)?),
    };
    info!("hand source: {}", source.name());

    session.prime(&mut actuators.effects());
    let summary = run_loop(&mut session, source.as_mut(), renderer.as_mut(), &mut actuators.effects());

    info!(
        "stopped after {} cycles ({:?}), {} launch gesture(s)",
        summary.cycles, summary.exit, summary.launches
    );
    if summary.cycles == 0 {
        warn!("the hand source produced no frames");
    }
    Ok(summary)
}

fn make_renderer(cfg: &DeskConfig) -> anyhow::Result<Box<dyn Renderer>> {
    if cfg.headless {
        Ok(Box::new(HeadlessRenderer::default()))
    } else {
        Ok(Box::new(Visualizer::new(None, cfg.launch_region)?))
    }
}

#[cfg(feature = "leap")]
fn open_leap() -> anyhow::Result<Box<dyn HandSource>> {
    Ok(Box::new(crate::source::LeapHandSource::open()?))
}

#[cfg(not(feature = "leap"))]
fn open_leap() -> anyhow::Result<Box<dyn HandSource>> {
    bail!("LeapMotion support is not compiled in; rebuild with `--features leap`")
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use hand_gesture::pose;
    use hand_gesture::recording::Recorder;
    use hand_gesture::recording::StaticProcesses;
    use hand_gesture::{HandObservation, Handedness, Landmark, Mode, Overlay};

    use crate::source::Frame;

    const FRAME: FrameSize = FrameSize::new(640, 480);

    /// Replays a fixed list of frames and counts releases.
    struct ScriptedSource {
        frames:   VecDeque<Vec<HandObservation>>,
        releases: usize,
    }

    impl ScriptedSource {
        fn new(frames: Vec<Vec<HandObservation>>) -> Self {
            ScriptedSource { frames: frames.into(), releases: 0 }
        }
    }

    impl HandSource for ScriptedSource {
        fn next_frame(&mut self) -> Option<Frame> {
            let hands = self.frames.pop_front()?;
            Some(Frame { size: FRAME, hands })
        }
        fn detect(&mut self, frame: &Frame) -> Vec<HandObservation> { frame.hands.clone() }
        fn release(&mut self) { self.releases += 1; }
        fn name(&self) -> &'static str { "scripted" }
    }

    /// Records overlay kinds and stops after `stop_after` draws.
    #[derive(Default)]
    struct ProbeRenderer {
        modes:      Vec<Mode>,
        stop_after: Option<usize>,
    }

    impl Renderer for ProbeRenderer {
        fn draw(&mut self, overlay: &Overlay<'_>, _hands: &[HandObservation], _frame: FrameSize) {
            self.modes.push(match overlay {
                Overlay::Bars { .. } => Mode::ContinuousControl,
                Overlay::Menu { .. } => Mode::MenuActive,
            });
        }
        fn stop_requested(&mut self) -> bool {
            self.stop_after.is_some_and(|n| self.modes.len() >= n)
        }
    }

    fn session() -> Session {
        Session::new(DeskConfig::default().to_session_config().unwrap())
    }

    fn open(side: Handedness, pinch: f32) -> HandObservation {
        pose::relaxed(side, Landmark::new(0.4, 0.2), pinch)
    }

    fn fist(side: Handedness) -> HandObservation {
        pose::fist(side, Landmark::new(0.6, 0.85), 0.1)
    }

    fn pointing(px: f32, py: f32) -> HandObservation {
        let tip = Landmark::new(px / FRAME.width as f32, py / FRAME.height as f32);
        pose::with_index_tip(fist(Handedness::Right), tip)
    }

    #[test]
    fn exhausted_source_is_released_once() {
        let mut src = ScriptedSource::new(vec![
            vec![open(Handedness::Left, 0.10)],
            vec![open(Handedness::Left, 0.15)],
        ]);
        let mut renderer = ProbeRenderer::default();
        let mut rec = Recorder::default();
        let mut s = session();

        let summary = run_loop(&mut s, &mut src, &mut renderer, &mut rec.effects());

        assert_eq!(summary, LoopSummary { cycles: 2, launches: 0, exit: ExitReason::SourceExhausted });
        assert_eq!(src.releases, 1);
        assert!((s.volume() - 50.0).abs() < 1e-3);
        assert_eq!(renderer.modes.len(), 2);
    }

    #[test]
    fn stop_request_ends_the_loop_and_releases() {
        let frames = vec![vec![open(Handedness::Right, 0.1)]; 10];
        let mut src = ScriptedSource::new(frames);
        let mut renderer = ProbeRenderer { stop_after: Some(3), ..ProbeRenderer::default() };
        let mut rec = Recorder::default();
        let mut s = session();

        let summary = run_loop(&mut s, &mut src, &mut renderer, &mut rec.effects());

        assert_eq!(summary.exit, ExitReason::StopRequested);
        assert_eq!(summary.cycles, 3);
        assert_eq!(src.releases, 1);
        assert_eq!(src.frames.len(), 7);
    }

    #[test]
    fn empty_frames_keep_running() {
        let mut src = ScriptedSource::new(vec![Vec::new(); 4]);
        let mut renderer = ProbeRenderer::default();
        let mut rec = Recorder::default();
        let mut s = session();

        let summary = run_loop(&mut s, &mut src, &mut renderer, &mut rec.effects());
        assert_eq!(summary.cycles, 4);
        assert!(rec.volume.values.is_empty() && rec.brightness.values.is_empty());
    }

    #[test]
    fn menu_then_launch_through_the_loop() {
        let frames = vec![
            vec![fist(Handedness::Left), fist(Handedness::Right)],
            vec![fist(Handedness::Left), pointing(95.0, 190.0)],   // select Paint
            vec![fist(Handedness::Left), pointing(150.0, 190.0)],  // into the launch region
            vec![open(Handedness::Left, 0.1), open(Handedness::Right, 0.1)],
        ];
        let mut src = ScriptedSource::new(frames);
        let mut renderer = ProbeRenderer::default();
        let mut rec = Recorder::default();
        let mut s = session();

        let summary = run_loop(&mut s, &mut src, &mut renderer, &mut rec.effects());

        assert_eq!(summary.launches, 1);
        assert_eq!(rec.launcher.launched.len(), 1);
        assert_eq!(rec.launcher.launched[0].program(), "mspaint.exe");
        assert_eq!(
            renderer.modes,
            [Mode::MenuActive, Mode::MenuActive, Mode::ContinuousControl, Mode::ContinuousControl]
        );
    }

    #[test]
    fn already_running_app_counts_as_a_launch_gesture() {
        let frames = vec![
            vec![fist(Handedness::Left), pointing(95.0, 90.0)],    // select Notepad
            vec![fist(Handedness::Left), pointing(150.0, 105.0)],
        ];
        let mut src = ScriptedSource::new(frames);
        let mut renderer = ProbeRenderer::default();
        let mut rec = Recorder {
            processes: StaticProcesses::with(&["notepad.exe"]),
            ..Recorder::default()
        };
        let mut s = session();

        let summary = run_loop(&mut s, &mut src, &mut renderer, &mut rec.effects());
        assert_eq!(summary.launches, 1);
        assert!(rec.launcher.launched.is_empty());
        assert_eq!(s.mode(), Mode::ContinuousControl);
        assert_eq!(s.menu().selected(), None);
    }

    #[test]
    fn run_rejects_invalid_config_before_opening_anything() {
        let cfg = DeskConfig { source: SourceKind::Pipe, detector: None, ..DeskConfig::default() };
        assert!(run(cfg).is_err());
    }
}
