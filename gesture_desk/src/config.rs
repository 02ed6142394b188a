//! Desk configuration.
//!
//! Every field has a default, so an empty (or missing) YAML file gives the
//! stock setup: keyboard simulation, log-only sinks and the five classic
//! Windows accessories in the menu.
//!
//! ```yaml
//! source: pipe
//! detector:
//!   program: python3
//!   args: [hand_detect.py]
//! mirror: true
//! volume_command:
//!   program: amixer
//!   args: [-q, sset, Master, "{percent}%"]
//! brightness_command:
//!   program: brightnessctl
//!   args: [-q, set, "{percent}%"]
//! menu:
//!   - label: Editor
//!     program: /usr/bin/gedit
//! ```

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use hand_gesture::session::DEFAULT_LAUNCH_REGION;
use hand_gesture::level::DEFAULT_SCALE;
use hand_gesture::{LaunchCommand, MenuItem, PointerHand, Rect, SessionConfig};

// ════════════════════════════════════════════════════════════════════════════
// Pieces
// ════════════════════════════════════════════════════════════════════════════

/// Where hand observations come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Keyboard and mouse puppet hands in the visualizer window.
    #[default]
    Sim,
    /// External landmark detector writing JSON lines to stdout.
    Pipe,
    /// LeapMotion controller (requires the `leap` feature).
    Leap,
}

/// A program and its argument vector.  Never run through a shell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args:    Vec<String>,
}

impl CommandSpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        CommandSpec {
            program: program.to_string(),
            args:    args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// One menu entry as written in the config file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub label:        String,
    pub program:      String,
    #[serde(default)]
    pub args:         Vec<String>,
    /// Process name checked before launching; defaults to the program's
    /// file name.
    #[serde(default)]
    pub process_name: Option<String>,
}

impl MenuEntry {
    fn new(label: &str, program: &str) -> Self {
        MenuEntry {
            label:        label.to_string(),
            program:      program.to_string(),
            args:         Vec::new(),
            process_name: None,
        }
    }

    pub fn to_menu_item(&self) -> anyhow::Result<MenuItem> {
        let command = LaunchCommand::new(&self.program, self.args.clone())
            .with_context(|| format!("menu entry {:?}", self.label))?;
        let item = MenuItem::new(&self.label, command);
        Ok(match &self.process_name {
            Some(name) => item.with_process_name(name),
            None       => item,
        })
    }
}

pub fn default_menu() -> Vec<MenuEntry> {
    vec![
        MenuEntry::new("Notepad",       "notepad.exe"),
        MenuEntry::new("Calculator",    "calc.exe"),
        MenuEntry::new("Paint",         "mspaint.exe"),
        MenuEntry::new("WordPad",       "write.exe"),
        MenuEntry::new("Snipping Tool", "snippingtool.exe"),
    ]
}

// ════════════════════════════════════════════════════════════════════════════
// DeskConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub source:             SourceKind,
    /// Detector command for `source: pipe`.
    pub detector:           Option<CommandSpec>,
    /// Flip detector x coordinates (`x -> 1 - x`) for a selfie view.
    pub mirror:             bool,
    /// Run without a window.  Not usable with the simulator.
    pub headless:           bool,
    /// Log launches instead of spawning anything.
    pub dry_run:            bool,
    /// Level points per unit of normalized pinch change.
    pub sensitivity:        f32,
    pub initial_volume:     f32,
    pub initial_brightness: f32,
    pub launch_region:      Rect,
    pub pointer_hand:       PointerHand,
    /// `{percent}` and `{scalar}` in the args are substituted per call.
    pub volume_command:     Option<CommandSpec>,
    pub brightness_command: Option<CommandSpec>,
    pub menu:               Vec<MenuEntry>,
}

impl Default for DeskConfig {
    fn default() -> Self {
        DeskConfig {
            source:             SourceKind::Sim,
            detector:           None,
            mirror:             false,
            headless:           false,
            dry_run:            false,
            sensitivity:        DEFAULT_SCALE,
            initial_volume:     0.0,
            initial_brightness: 0.0,
            launch_region:      DEFAULT_LAUNCH_REGION,
            pointer_hand:       PointerHand::LastObserved,
            volume_command:     None,
            brightness_command: None,
            menu:               default_menu(),
        }
    }
}

impl DeskConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading desk config {}", path_ref.display()))?;
        let config: DeskConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing desk config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Reject settings that would make the session meaningless.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.sensitivity.is_finite() || self.sensitivity <= 0.0 {
            bail!("sensitivity must be a positive number, got {}", self.sensitivity);
        }
        if self.launch_region.width() < 0.0 || self.launch_region.height() < 0.0 {
            bail!("launch region is inverted: {:?}", self.launch_region);
        }
        if self.source == SourceKind::Pipe && self.detector.is_none() {
            bail!("source 'pipe' needs a detector command (--detector or `detector:`)");
        }
        if self.source == SourceKind::Sim && self.headless {
            bail!("the simulator is driven from the window; it cannot run headless");
        }
        Ok(())
    }

    pub fn to_session_config(&self) -> anyhow::Result<SessionConfig> {
        let menu = self
            .menu
            .iter()
            .map(MenuEntry::to_menu_item)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(SessionConfig {
            scale:              self.sensitivity,
            initial_volume:     self.initial_volume,
            initial_brightness: self.initial_brightness,
            launch_region:      self.launch_region,
            pointer_hand:       self.pointer_hand,
            menu,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
