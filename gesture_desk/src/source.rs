//! Hand sources — frame acquisition plus landmark detection.
//!
//! The public interface is the [`HandSource`] trait.  The cycle loop does
//! not care whether hands come from puppets in the simulator window, an
//! external detector process or LeapMotion hardware.

use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc::{Receiver, TryRecvError};

use anyhow::Context;
use log::{debug, info, warn};
use serde::Deserialize;

use hand_gesture::pose;
use hand_gesture::{FrameSize, HandObservation, Handedness, Landmark};

use crate::config::CommandSpec;

// ════════════════════════════════════════════════════════════════════════════
// Frame / HandSource
// ════════════════════════════════════════════════════════════════════════════

/// One acquired frame: its pixel size and the raw hands seen in it.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub size:  FrameSize,
    pub hands: Vec<HandObservation>,
}

/// Frame source and detector in one.
pub trait HandSource {
    /// Next frame, or `None` when acquisition failed or the stream ended.
    fn next_frame(&mut self) -> Option<Frame>;

    /// Hands in `frame`, in detector order.
    fn detect(&mut self, frame: &Frame) -> Vec<HandObservation>;

    /// Free the underlying device or process.  Safe to call repeatedly;
    /// only the first call does anything.
    fn release(&mut self);

    fn name(&self) -> &'static str;
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandSource — keyboard/mouse puppets (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input from the simulator window.
#[derive(Clone, Debug, PartialEq)]
pub enum SimInput {
    KeyDown(SimKey),
    /// Mouse position in frame pixels; the right index fingertip follows it.
    Pointer { x: f32, y: f32 },
}

/// Simulated key codes (mapped from minifb keys).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    ToggleLeft,       // 1
    ToggleRight,      // 2
    FistLeft,         // F
    FistRight,        // J
    PinchLeftClose,   // A
    PinchLeftOpen,    // S
    PinchRightClose,  // K
    PinchRightOpen,   // L
}

pub const PINCH_STEP:    f32 = 0.005;
pub const PINCH_MAX:     f32 = 0.30;
const DEFAULT_PINCH:     f32 = 0.10;
const LEFT_WRIST:        Landmark = Landmark::new(0.80, 0.55);
const RIGHT_WRIST:       Landmark = Landmark::new(0.62, 0.75);

/// State of one puppet hand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Puppet {
    pub shown: bool,
    pub fist:  bool,
    pub pinch: f32,
}

impl Default for Puppet {
    fn default() -> Self {
        Puppet { shown: true, fist: false, pinch: DEFAULT_PINCH }
    }
}

impl Puppet {
    fn adjust(&mut self, delta: f32) {
        self.pinch = (self.pinch + delta).clamp(0.0, PINCH_MAX);
    }

    fn pose(&self, handedness: Handedness, wrist: Landmark) -> HandObservation {
        if self.fist {
            pose::fist(handedness, wrist, self.pinch)
        } else {
            pose::relaxed(handedness, wrist, self.pinch)
        }
    }
}

/// Shift every landmark so the index fingertip lands on `target`.
/// Pinch distance and fist shape are unchanged.
fn place_index_tip(mut hand: HandObservation, target: Landmark) -> HandObservation {
    let tip = *hand.index_tip();
    let (dx, dy) = (target.x - tip.x, target.y - tip.y);
    for p in hand.landmarks_mut().iter_mut() {
        p.x += dx;
        p.y += dy;
    }
    hand
}

/// Puppet hands driven by [`SimInput`] events from the visualizer.
///
/// Frames are reported at the visualizer's size so pointer pixels and
/// frame pixels coincide.
pub struct SimHandSource {
    rx:       Receiver<SimInput>,
    size:     FrameSize,
    pub left:  Puppet,
    pub right: Puppet,
    pointer:  Option<Landmark>,
    released: bool,
}

impl SimHandSource {
    pub fn new(rx: Receiver<SimInput>, size: FrameSize) -> Self {
        SimHandSource {
            rx,
            size,
            left:     Puppet::default(),
            right:    Puppet::default(),
            pointer:  None,
            released: false,
        }
    }

    fn apply(&mut self, input: SimInput) {
        match input {
            SimInput::KeyDown(SimKey::ToggleLeft)      => self.left.shown  = !self.left.shown,
            SimInput::KeyDown(SimKey::ToggleRight)     => self.right.shown = !self.right.shown,
            SimInput::KeyDown(SimKey::FistLeft)        => self.left.fist   = !self.left.fist,
            SimInput::KeyDown(SimKey::FistRight)       => self.right.fist  = !self.right.fist,
            SimInput::KeyDown(SimKey::PinchLeftClose)  => self.left.adjust(-PINCH_STEP),
            SimInput::KeyDown(SimKey::PinchLeftOpen)   => self.left.adjust(PINCH_STEP),
            SimInput::KeyDown(SimKey::PinchRightClose) => self.right.adjust(-PINCH_STEP),
            SimInput::KeyDown(SimKey::PinchRightOpen)  => self.right.adjust(PINCH_STEP),
            SimInput::Pointer { x, y } => {
                self.pointer = Some(Landmark::new(
                    x / self.size.width as f32,
                    y / self.size.height as f32,
                ));
            }
        }
    }

    /// Current puppets, left first.
    pub fn puppet_hands(&self) -> Vec<HandObservation> {
        let mut hands = Vec::with_capacity(2);
        if self.left.shown {
            hands.push(self.left.pose(Handedness::Left, LEFT_WRIST));
        }
        if self.right.shown {
            let hand = self.right.pose(Handedness::Right, RIGHT_WRIST);
            hands.push(match self.pointer {
                Some(target) => place_index_tip(hand, target),
                None         => hand,
            });
        }
        hands
    }
}

impl HandSource for SimHandSource {
    fn next_frame(&mut self) -> Option<Frame> {
        if self.released {
            return None;
        }
        loop {
            match self.rx.try_recv() {
                Ok(input)                       => self.apply(input),
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => return None,
            }
        }
        Some(Frame { size: self.size, hands: self.puppet_hands() })
    }

    fn detect(&mut self, frame: &Frame) -> Vec<HandObservation> {
        frame.hands.clone()
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            debug!("[sim] released");
        }
    }

    fn name(&self) -> &'static str { "simulator" }
}

impl Drop for SimHandSource {
    fn drop(&mut self) { self.release(); }
}

// ════════════════════════════════════════════════════════════════════════════
// PipeHandSource — external detector process
// ════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize, Debug)]
struct HandJson {
    handedness: String,
    landmarks:  Vec<Landmark>,
}

#[derive(Deserialize, Debug)]
struct FrameJson {
    width:  u32,
    height: u32,
    #[serde(default)]
    hands:  Vec<HandJson>,
    #[serde(default)]
    error:  Option<String>,
}

/// Parse one detector line.  Malformed hands are dropped with a warning;
/// a malformed line is an error.
pub fn parse_frame_line(line: &str) -> anyhow::Result<Frame> {
    let json: FrameJson = serde_json::from_str(line)
        .with_context(|| format!("parsing detector line {:?}", line.trim()))?;
    if let Some(err) = &json.error {
        warn!("[pipe] detector reported: {}", err);
    }
    let hands = json
        .hands
        .into_iter()
        .filter_map(|h| {
            let side = h
                .handedness
                .parse::<Handedness>()
                .map_err(|e| warn!("[pipe] dropping hand: {}", e))
                .ok()?;
            HandObservation::new(side, &h.landmarks)
                .map_err(|e| warn!("[pipe] dropping {} hand: {}", side, e))
                .ok()
        })
        .collect();
    Ok(Frame { size: FrameSize::new(json.width, json.height), hands })
}

/// Longest detector line accepted; longer lines are skipped.
pub const MAX_LINE_BYTES: u64 = 1 << 20;

#[derive(Debug, PartialEq, Eq)]
enum LineRead {
    Eof,
    Line,
    TooLong,
}

/// Read one `\n`-terminated line into `buf`, never buffering more than
/// `limit` bytes.  An overlong line is consumed up to its newline and
/// reported as `TooLong`.
fn read_capped_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>, limit: u64) -> io::Result<LineRead> {
    buf.clear();
    let n = reader.by_ref().take(limit).read_until(b'\n', buf)?;
    if n == 0 {
        return Ok(LineRead::Eof);
    }
    if buf.ends_with(b"\n") || (n as u64) < limit {
        return Ok(LineRead::Line);
    }
    loop {
        buf.clear();
        let n = reader.by_ref().take(limit).read_until(b'\n', buf)?;
        if n == 0 || buf.ends_with(b"\n") {
            buf.clear();
            return Ok(LineRead::TooLong);
        }
    }
}

/// Spawns a landmark detector and reads one JSON object per line from its
/// stdout:
///
/// ```json
/// {"width":640,"height":480,"hands":[{"handedness":"Left","landmarks":[{"x":0.5,"y":0.5,"z":0.0}, ...]}]}
/// ```
///
/// End of output ends the stream.  Blank lines, lines that are not UTF-8
/// or JSON, and lines over [`MAX_LINE_BYTES`] are skipped with a warning.
/// The child is killed on release.
pub struct PipeHandSource {
    child:  Option<Child>,
    reader: BufReader<ChildStdout>,
    mirror: bool,
    line:   Vec<u8>,
}

impl PipeHandSource {
    pub fn spawn(spec: &CommandSpec, mirror: bool) -> anyhow::Result<Self> {
        info!("[pipe] starting detector: {} {:?}", spec.program, spec.args);
        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("starting detector {}", spec.program))?;
        let stdout = child.stdout.take().context("detector stdout not captured")?;
        Ok(PipeHandSource {
            child:  Some(child),
            reader: BufReader::new(stdout),
            mirror,
            line:   Vec::new(),
        })
    }
}

impl HandSource for PipeHandSource {
    fn next_frame(&mut self) -> Option<Frame> {
        self.child.as_ref()?;
        loop {
            match read_capped_line(&mut self.reader, &mut self.line, MAX_LINE_BYTES) {
                Ok(LineRead::Eof) => {
                    info!("[pipe] detector output ended");
                    return None;
                }
                Ok(LineRead::TooLong) => {
                    warn!("[pipe] skipping line over {} bytes", MAX_LINE_BYTES);
                }
                Ok(LineRead::Line) => match std::str::from_utf8(&self.line) {
                    Ok(line) if line.trim().is_empty() => continue,
                    Ok(line) => match parse_frame_line(line) {
                        Ok(frame) => return Some(frame),
                        Err(e)    => warn!("[pipe] skipping line: {:#}", e),
                    },
                    Err(e) => warn!("[pipe] skipping line that is not UTF-8: {}", e),
                },
                Err(e) => {
                    warn!("[pipe] read failed: {}", e);
                    return None;
                }
            }
        }
    }

    fn detect(&mut self, frame: &Frame) -> Vec<HandObservation> {
        if self.mirror {
            frame.hands.iter().cloned().map(HandObservation::mirrored).collect()
        } else {
            frame.hands.clone()
        }
    }

    fn release(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!("[pipe] kill: {}", e);
            }
            match child.wait() {
                Ok(status) => info!("[pipe] detector stopped ({})", status),
                Err(e)     => warn!("[pipe] waiting for detector: {}", e),
            }
        }
    }

    fn name(&self) -> &'static str { "detector pipe" }
}

impl Drop for PipeHandSource {
    fn drop(&mut self) { self.release(); }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapHandSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Hands from a LeapMotion controller, re-expressed in the 21-point
/// layout.  Requires the `leap` feature flag and the LeapC shared library.
///
/// Leap coordinates (mm, y up) are projected onto a virtual 640×480 frame:
/// x ∈ [-200, 200] → [0, 1], y ∈ [100, 500] → [1, 0].
#[cfg(feature = "leap")]
pub struct LeapHandSource {
    connection: Option<leaprs::Connection>,
}

#[cfg(feature = "leap")]
const LEAP_FRAME: FrameSize = FrameSize::new(640, 480);

#[cfg(feature = "leap")]
impl LeapHandSource {
    pub fn open() -> anyhow::Result<Self> {
        use leaprs::*;
        let mut connection = Connection::create(ConnectionConfig::default())
            .map_err(|e| anyhow::anyhow!("creating LeapC connection: {:?}", e))?;
        connection
            .open()
            .map_err(|e| anyhow::anyhow!("opening LeapMotion device: {:?}", e))?;
        Ok(LeapHandSource { connection: Some(connection) })
    }
}

#[cfg(feature = "leap")]
fn leap_point(x: f32, y: f32, z: f32) -> Landmark {
    Landmark {
        x: ((x + 200.0) / 400.0).clamp(0.0, 1.0),
        y: (1.0 - (y - 100.0) / 400.0).clamp(0.0, 1.0),
        z: z / 400.0,
    }
}

#[cfg(feature = "leap")]
fn leap_hand(hand: &leaprs::Hand) -> Option<HandObservation> {
    macro_rules! joint {
        ($v:expr) => {{ let v = $v; leap_point(v.x, v.y, v.z) }};
    }

    let side = if hand.hand_type() == leaprs::HandType::Left {
        Handedness::Left
    } else {
        Handedness::Right
    };
    let digits: Vec<_> = hand.digits().collect();
    if digits.len() < 5 { return None; }

    // Wrist ≈ base of the middle metacarpal; then MCP, PIP, DIP, tip per digit.
    let mut points = Vec::with_capacity(hand_gesture::landmark::LANDMARK_COUNT);
    points.push(joint!(digits[2].metacarpal().prev_joint()));
    for d in &digits {
        points.push(joint!(d.proximal().prev_joint()));
        points.push(joint!(d.intermediate().prev_joint()));
        points.push(joint!(d.distal().prev_joint()));
        points.push(joint!(d.distal().next_joint()));
    }
    HandObservation::new(side, &points).ok()
}

#[cfg(feature = "leap")]
impl HandSource for LeapHandSource {
    fn next_frame(&mut self) -> Option<Frame> {
        use leaprs::Event;
        let connection = self.connection.as_mut()?;
        let msg = match connection.poll(100) {
            Ok(m)  => m,
            Err(_) => return Some(Frame { size: LEAP_FRAME, hands: Vec::new() }),
        };
        let hands = match msg.event() {
            Event::Tracking(frame) => frame.hands().filter_map(|h| leap_hand(&h)).collect(),
            _                      => Vec::new(),
        };
        Some(Frame { size: LEAP_FRAME, hands })
    }

    fn detect(&mut self, frame: &Frame) -> Vec<HandObservation> {
        frame.hands.clone()
    }

    fn release(&mut self) {
        if self.connection.take().is_some() {
            info!("[leap] connection closed");
        }
    }

    fn name(&self) -> &'static str { "LeapMotion" }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
