//! Software-rendered overlay using `minifb`.
//!
//! Layout (continuous control):
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ mode                                                         │
//! │    ┌──┐                                              ┌──┐    │
//! │    │  │  VOLUME         tracked hands           BRIGHTNESS │  │
//! │    │██│                                              │██│    │
//! │    └──┘                                              └──┘    │
//! │    NN%                                               NN%     │
//! │ key legend                                                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! In menu mode the bars give way to the item list (selected item green)
//! and the outline of the launch region.

use std::sync::mpsc::Sender;

use log::{debug, info};
use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};

use hand_gesture::landmark::HAND_CONNECTIONS;
use hand_gesture::menu::{item_box, item_origin};
use hand_gesture::{FrameSize, HandObservation, Handedness, Overlay, Rect};

use crate::source::{SimInput, SimKey};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:       usize = 640;
pub const WIN_H:       usize = 480;
const BAR_LEFT_X:      usize = 50;
const BAR_RIGHT_X:     usize = WIN_W - 80;
const BAR_TOP:         usize = 150;
const BAR_W:           usize = 30;
const BAR_H:           usize = 300;
const BAR_BORDER:      usize = 3;
const TEXT_SCALE:      usize = 2;
const BG_COLOR:        u32   = 0xFF1A1A2E;
const BAR_COLOR:       u32   = 0xFF00C853;
const TEXT_COLOR:      u32   = 0xFFEEEEEE;
const SELECTED_COLOR:  u32   = 0xFF00FF00;
const REGION_COLOR:    u32   = 0xFF555577;
const LEFT_HAND:       u32   = 0xFF4FC3F7;
const RIGHT_HAND:      u32   = 0xFFFFB74D;
const LEGEND_COLOR:    u32   = 0xFF888888;

pub const SIM_LEGEND: &str =
    "1/2=hands  F/J=fists  A/S K/L=pinch  mouse=point  Q=quit";

// ════════════════════════════════════════════════════════════════════════════
// Renderer
// ════════════════════════════════════════════════════════════════════════════

/// Per-cycle output surface.
pub trait Renderer {
    fn draw(&mut self, overlay: &Overlay<'_>, hands: &[HandObservation], frame: FrameSize);

    /// True once the user asked to quit.
    fn stop_requested(&mut self) -> bool;
}

/// Filled height of a level bar, in pixels.
pub fn bar_fill_px(level: f32) -> usize {
    (level.clamp(0.0, 100.0) * BAR_H as f32 / 100.0).round() as usize
}

/// Frame pixel → window pixel.
fn to_window(x: f32, y: f32, frame: FrameSize) -> (isize, isize) {
    let fw = frame.width.max(1) as f32;
    let fh = frame.height.max(1) as f32;
    ((x * WIN_W as f32 / fw) as isize, (y * WIN_H as f32 / fh) as isize)
}

// ════════════════════════════════════════════════════════════════════════════
// Canvas — the framebuffer and its drawing primitives
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas {
    buf: Vec<u32>,
}

impl Default for Canvas {
    fn default() -> Self { Canvas { buf: vec![BG_COLOR; WIN_W * WIN_H] } }
}

impl Canvas {
    pub fn pixel(&self, x: usize, y: usize) -> u32 { self.buf[y * WIN_W + x] }

    pub fn buffer(&self) -> &[u32] { &self.buf }

    /// Render one cycle.
    pub fn render(
        &mut self,
        overlay: &Overlay<'_>,
        hands:   &[HandObservation],
        frame:   FrameSize,
        legend:  Option<&str>,
    ) {
        self.buf.fill(BG_COLOR);

        match overlay {
            Overlay::Bars { volume, brightness } => {
                self.draw_label("CONTROL", 10, 10, 1, TEXT_COLOR);
                self.draw_bar("VOLUME",     BAR_LEFT_X,  *volume);
                self.draw_bar("BRIGHTNESS", BAR_RIGHT_X, *brightness);
            }
            Overlay::Menu { items, selected } => {
                self.draw_label("MENU", 10, 10, 1, TEXT_COLOR);
                self.draw_menu(items.iter().map(|m| m.label.as_str()), *selected, frame);
            }
        }

        for hand in hands {
            self.draw_hand(hand);
        }

        if let Some(text) = legend {
            self.draw_label(text, 10, WIN_H - 10, 1, LEGEND_COLOR);
        }
    }

    // ── Bars ──────────────────────────────────────────────────────────────

    fn draw_bar(&mut self, caption: &str, x: usize, level: f32) {
        for inset in 0..BAR_BORDER {
            self.draw_border(x + inset, BAR_TOP + inset, BAR_W - 2 * inset, BAR_H - 2 * inset, BAR_COLOR);
        }
        let fill = bar_fill_px(level);
        self.fill_rect(x, BAR_TOP + BAR_H - fill, BAR_W, fill, BAR_COLOR);

        let cap_x = x.saturating_sub(caption.len() * 2).max(2).min(WIN_W - caption.len() * 4 - 2);
        self.draw_label(caption, cap_x, BAR_TOP - 14, 1, TEXT_COLOR);
        let pct = format!("{}%", level.round() as i32);
        self.draw_label(&pct, x, BAR_TOP + BAR_H + 6, TEXT_SCALE, TEXT_COLOR);
    }

    // ── Menu ──────────────────────────────────────────────────────────────

    fn draw_menu<'a>(
        &mut self,
        labels:   impl Iterator<Item = &'a str>,
        selected: Option<usize>,
        frame:    FrameSize,
    ) {
        for (i, label) in labels.enumerate() {
            let is_sel = selected == Some(i);
            let color = if is_sel { SELECTED_COLOR } else { TEXT_COLOR };

            let b = item_box(i);
            if is_sel {
                let (x0, y0, w, h) = self.window_rect(&b, frame);
                self.fill_rect(x0, y0, w, h, blend(BG_COLOR, SELECTED_COLOR, 0.2));
            }
            self.draw_frame_rect(&b, frame, if is_sel { SELECTED_COLOR } else { REGION_COLOR });

            let (ox, oy) = item_origin(i);
            let (wx, wy) = to_window(ox, oy, frame);
            let top = (wy - 14).max(0) as usize;
            self.draw_label(label, wx.max(0) as usize, top, TEXT_SCALE, color);
        }
    }

    /// Outline the launch region.
    pub fn draw_region(&mut self, region: &Rect, frame: FrameSize) {
        self.draw_frame_rect(region, frame, REGION_COLOR);
    }

    fn window_rect(&self, r: &Rect, frame: FrameSize) -> (usize, usize, usize, usize) {
        let (x0, y0) = to_window(r.left, r.top, frame);
        let (x1, y1) = to_window(r.right, r.bottom, frame);
        let (x0, y0) = (x0.max(0) as usize, y0.max(0) as usize);
        let (x1, y1) = (x1.max(0) as usize, y1.max(0) as usize);
        (x0, y0, x1.saturating_sub(x0) + 1, y1.saturating_sub(y0) + 1)
    }

    fn draw_frame_rect(&mut self, r: &Rect, frame: FrameSize, color: u32) {
        let (x, y, w, h) = self.window_rect(r, frame);
        self.draw_border(x, y, w, h, color);
    }

    // ── Hands ─────────────────────────────────────────────────────────────

    fn draw_hand(&mut self, hand: &HandObservation) {
        let color = match hand.handedness {
            Handedness::Left  => LEFT_HAND,
            Handedness::Right => RIGHT_HAND,
        };
        let pts: Vec<(isize, isize)> = hand
            .landmarks()
            .iter()
            .map(|p| ((p.x * WIN_W as f32) as isize, (p.y * WIN_H as f32) as isize))
            .collect();

        for &(a, b) in HAND_CONNECTIONS.iter() {
            self.draw_line(pts[a], pts[b], color);
        }
        for &(x, y) in &pts {
            if x >= 1 && y >= 1 {
                self.fill_rect(x as usize - 1, y as usize - 1, 3, 3, TEXT_COLOR);
            }
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(WIN_H) {
            for col in x..(x+w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..(x+w).min(WIN_W) {
            if y < WIN_H           { self.buf[y           * WIN_W + col] = color; }
            if y+h-1 < WIN_H       { self.buf[(y+h-1)     * WIN_W + col] = color; }
        }
        for row in y..(y+h).min(WIN_H) {
            if x < WIN_W           { self.buf[row * WIN_W + x    ] = color; }
            if x+w-1 < WIN_W       { self.buf[row * WIN_W + x+w-1] = color; }
        }
    }

    fn set_pixel(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < WIN_W && (y as usize) < WIN_H {
            self.buf[y as usize * WIN_W + x as usize] = color;
        }
    }

    fn draw_line(&mut self, (x0, y0): (isize, isize), (x1, y1): (isize, isize), color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.set_pixel(x, y, color);
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    /// Minimal bitmap font — 3×5 characters, `scale` pixels per dot.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > WIN_W { break; }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer — minifb window
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:       Window,
    canvas:       Canvas,
    /// Present only when the simulator is the hand source.
    sim_tx:       Option<Sender<SimInput>>,
    last_pointer: Option<(f32, f32)>,
    region:       Rect,
}

impl Visualizer {
    pub fn new(sim_tx: Option<Sender<SimInput>>, region: Rect) -> anyhow::Result<Self> {
        let mut window = Window::new(
            "Gesture Desk",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| anyhow::anyhow!("opening window: {}", e))?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            canvas: Canvas::default(),
            sim_tx,
            last_pointer: None,
            region,
        })
    }

    /// Forward keyboard and mouse to the simulator.  Returns false when
    /// the window should close.
    fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        // Keys that trigger on first press only
        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        if one_shot(Key::Q) || one_shot(Key::Escape) {
            info!("quit requested from the window");
            return false;
        }

        let Some(tx) = &self.sim_tx else { return true; };

        // Keys that repeat while held
        let held = |k: Key| self.window.is_key_pressed(k, KeyRepeat::Yes);

        let mut keys = Vec::new();
        for (key, sim) in [
            (Key::Key1, SimKey::ToggleLeft),
            (Key::Key2, SimKey::ToggleRight),
            (Key::F,    SimKey::FistLeft),
            (Key::J,    SimKey::FistRight),
        ] {
            if one_shot(key) { keys.push(sim); }
        }
        for (key, sim) in [
            (Key::A, SimKey::PinchLeftClose),
            (Key::S, SimKey::PinchLeftOpen),
            (Key::K, SimKey::PinchRightClose),
            (Key::L, SimKey::PinchRightOpen),
        ] {
            if held(key) { keys.push(sim); }
        }
        for key in keys {
            let _ = tx.send(SimInput::KeyDown(key));
        }

        if let Some((x, y)) = self.window.get_mouse_pos(MouseMode::Discard) {
            if self.last_pointer != Some((x, y)) {
                self.last_pointer = Some((x, y));
                let _ = tx.send(SimInput::Pointer { x, y });
            }
        }

        true
    }
}

impl Renderer for Visualizer {
    fn draw(&mut self, overlay: &Overlay<'_>, hands: &[HandObservation], frame: FrameSize) {
        let legend = self.sim_tx.as_ref().map(|_| SIM_LEGEND);
        self.canvas.render(overlay, hands, frame, legend);
        if matches!(overlay, Overlay::Menu { .. }) {
            self.canvas.draw_region(&self.region, frame);
        }
        self.window.update_with_buffer(self.canvas.buffer(), WIN_W, WIN_H).ok();
    }

    fn stop_requested(&mut self) -> bool {
        !self.poll_input()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HeadlessRenderer
// ════════════════════════════════════════════════════════════════════════════

/// Renders nothing; logs what would have been shown.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    pub frames: u64,
}

impl Renderer for HeadlessRenderer {
    fn draw(&mut self, overlay: &Overlay<'_>, hands: &[HandObservation], frame: FrameSize) {
        self.frames += 1;
        match overlay {
            Overlay::Bars { volume, brightness } => debug!(
                "[headless] {}x{} hands={} volume={:.0}% brightness={:.0}%",
                frame.width, frame.height, hands.len(), volume, brightness
            ),
            Overlay::Menu { items, selected } => debug!(
                "[headless] {}x{} hands={} menu selected={:?}",
                frame.width, frame.height, hands.len(),
                selected.and_then(|i| items.get(i)).map(|m| m.label.as_str())
            ),
        }
    }

    fn stop_requested(&mut self) -> bool { false }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0-t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar,br) << 16) | (lerp(ag,bg) << 8) | lerp(ab,bb)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
