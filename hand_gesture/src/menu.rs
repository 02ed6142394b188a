//! Application-selection menu: items, layout and hit-testing.
//!
//! The menu is a fixed vertical list.  Item `i` has its label origin at
//! `(100, 100 + 50·i)` and a box spanning `-10..+200` horizontally and
//! `-30..+10` vertically around that origin:
//!
//! ```text
//!   (90, 70) ┌──────────────────────────┐
//!            │ Notepad                  │  item 0
//!            └──────────────────────────┘ (300, 110)
//!  (90, 120) ┌──────────────────────────┐
//!            │ Calculator               │  item 1
//!            └──────────────────────────┘ (300, 160)
//! ```

use serde::{Deserialize, Serialize};

use crate::classifier::Rect;
use crate::launch::LaunchCommand;

// ════════════════════════════════════════════════════════════════════════════
// Layout
// ════════════════════════════════════════════════════════════════════════════

pub const ITEM_ORIGIN_X: f32 = 100.0;
pub const ITEM_ORIGIN_Y: f32 = 100.0;
pub const ITEM_SPACING:  f32 = 50.0;
const BOX_LEFT:   f32 = -10.0;
const BOX_TOP:    f32 = -30.0;
const BOX_RIGHT:  f32 = 200.0;
const BOX_BOTTOM: f32 = 10.0;

/// Label origin of item `index`.
pub fn item_origin(index: usize) -> (f32, f32) {
    (ITEM_ORIGIN_X, ITEM_ORIGIN_Y + index as f32 * ITEM_SPACING)
}

/// Bounding box of item `index`.
pub fn item_box(index: usize) -> Rect {
    let (x, y) = item_origin(index);
    Rect::new(x + BOX_LEFT, y + BOX_TOP, x + BOX_RIGHT, y + BOX_BOTTOM)
}

// ════════════════════════════════════════════════════════════════════════════
// MenuItem
// ════════════════════════════════════════════════════════════════════════════

/// One launchable entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub label:        String,
    pub command:      LaunchCommand,
    /// Name matched against running processes.  Defaults to the file name
    /// of the command's program.
    pub process_name: String,
}

impl MenuItem {
    pub fn new(label: &str, command: LaunchCommand) -> Self {
        let process_name = command.program_file_name();
        MenuItem { label: label.to_string(), command, process_name }
    }

    pub fn with_process_name(mut self, name: &str) -> Self {
        self.process_name = name.to_string();
        self
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MenuState
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MenuState {
    visible:  bool,
    items:    Vec<MenuItem>,
    selected: Option<usize>,
}

impl MenuState {
    pub fn new(items: Vec<MenuItem>) -> Self {
        MenuState { visible: false, items, selected: None }
    }

    pub fn is_visible(&self) -> bool { self.visible }

    pub fn items(&self) -> &[MenuItem] { &self.items }

    /// The current selection.  Always `None` while hidden.
    pub fn selected(&self) -> Option<usize> {
        if self.visible { self.selected } else { None }
    }

    pub fn selected_item(&self) -> Option<&MenuItem> {
        self.selected().and_then(|i| self.items.get(i))
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    /// Hide and drop any selection, so nothing stale is acted on later.
    pub fn hide(&mut self) {
        self.visible = false;
        self.selected = None;
    }

    /// First item whose box contains the pixel `(x, y)`.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<usize> {
        (0..self.items.len()).find(|&i| item_box(i).contains(x, y))
    }

    /// Hit-test and, on a hit, make that item the selection.  A miss keeps
    /// the previous selection.
    pub fn select_at(&mut self, x: f32, y: f32) -> Option<usize> {
        if !self.visible {
            return None;
        }
        let hit = self.hit_test(x, y);
        if hit.is_some() {
            self.selected = hit;
        }
        hit
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> MenuState {
        let items = ["notepad.exe", "calc.exe", "mspaint.exe"]
            .iter()
            .map(|p| MenuItem::new(p, LaunchCommand::new(p, Vec::new()).unwrap()))
            .collect();
        MenuState::new(items)
    }

    #[test]
    fn item_boxes_follow_fixed_layout() {
        assert_eq!(item_box(0), Rect::new(90.0, 70.0, 300.0, 110.0));
        assert_eq!(item_box(2), Rect::new(90.0, 170.0, 300.0, 210.0));
    }

    #[test]
    fn hit_test_inclusive_corners() {
        let m = menu();
        assert_eq!(m.hit_test(90.0, 70.0), Some(0));
        assert_eq!(m.hit_test(300.0, 110.0), Some(0));
        assert_eq!(m.hit_test(90.0, 120.0), Some(1));
        assert_eq!(m.hit_test(300.0, 160.0), Some(1));
    }

    #[test]
    fn hit_test_gap_between_items_misses() {
        let m = menu();
        assert_eq!(m.hit_test(150.0, 115.0), None);
        assert_eq!(m.hit_test(301.0, 90.0), None);
        assert_eq!(m.hit_test(150.0, 230.0), None);
    }

    #[test]
    fn selection_only_while_visible() {
        let mut m = menu();
        assert_eq!(m.select_at(150.0, 140.0), None);
        m.show();
        assert_eq!(m.select_at(150.0, 140.0), Some(1));
        assert_eq!(m.selected(), Some(1));
        m.hide();
        assert_eq!(m.selected(), None);
        m.show();
        assert_eq!(m.selected(), None);
    }

    #[test]
    fn miss_keeps_selection() {
        let mut m = menu();
        m.show();
        m.select_at(150.0, 190.0);
        m.select_at(600.0, 600.0);
        assert_eq!(m.selected(), Some(2));
    }

    #[test]
    fn process_name_defaults_to_program() {
        let item = MenuItem::new("Calc", LaunchCommand::new("/usr/bin/gnome-calculator", Vec::new()).unwrap());
        assert_eq!(item.process_name, "gnome-calculator");
        let item = item.with_process_name("calc");
        assert_eq!(item.process_name, "calc");
    }
}
