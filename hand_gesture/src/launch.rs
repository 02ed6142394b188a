//! Launching menu applications without duplicates.
//!
//! [`AppLaunchGuard`] asks a [`ProcessInspector`] whether the target is
//! already running and only then hands the [`LaunchCommand`] to a
//! [`ProcessLauncher`].  Launch failures stop at this boundary.

use std::collections::HashSet;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ActuatorError, GestureError, GestureResult};

/// Characters a shell would interpret.  Commands are never run through a
/// shell, but a program name containing these is almost certainly a
/// mistake carried over from a shell string.
const SHELL_META: &[char] = &[';', '|', '&', '$', '<', '>', '`'];

// ════════════════════════════════════════════════════════════════════════════
// LaunchCommand
// ════════════════════════════════════════════════════════════════════════════

/// A program plus argument vector, checked at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCommand", into = "RawCommand")]
pub struct LaunchCommand {
    program: String,
    args:    Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RawCommand {
    program: String,
    #[serde(default)]
    args:    Vec<String>,
}

impl TryFrom<RawCommand> for LaunchCommand {
    type Error = GestureError;

    fn try_from(raw: RawCommand) -> GestureResult<Self> {
        LaunchCommand::new(&raw.program, raw.args)
    }
}

impl From<LaunchCommand> for RawCommand {
    fn from(cmd: LaunchCommand) -> Self {
        RawCommand { program: cmd.program, args: cmd.args }
    }
}

impl LaunchCommand {
    pub fn new(program: &str, args: Vec<String>) -> GestureResult<Self> {
        let program = program.trim();
        if program.is_empty() {
            return Err(GestureError::Command("empty program".to_string()));
        }
        if program.contains('\0') || args.iter().any(|a| a.contains('\0')) {
            return Err(GestureError::Command(format!("{program:?} contains NUL")));
        }
        if program.contains(SHELL_META) {
            return Err(GestureError::Command(format!(
                "{program:?} contains shell metacharacters"
            )));
        }
        Ok(LaunchCommand { program: program.to_string(), args })
    }

    pub fn program(&self) -> &str { &self.program }

    pub fn args(&self) -> &[String] { &self.args }

    /// Final path component of the program, e.g. `calc.exe` for
    /// `C:\Windows\calc.exe` or `gedit` for `/usr/bin/gedit`.
    pub fn program_file_name(&self) -> String {
        match self.program.rsplit(&['/', '\\'][..]).next() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.program.clone(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Collaborators
// ════════════════════════════════════════════════════════════════════════════

/// Lists the names of currently running processes.
pub trait ProcessInspector {
    fn process_names(&mut self) -> Result<HashSet<String>, ActuatorError>;
}

/// Starts a process and forgets about it.
pub trait ProcessLauncher {
    fn launch(&mut self, command: &LaunchCommand) -> Result<(), ActuatorError>;
}

// ════════════════════════════════════════════════════════════════════════════
// AppLaunchGuard
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// A launch was issued (it may still have failed at the OS level).
    Launched,
    /// A process with the same name was already running.
    AlreadyRunning,
}

pub struct AppLaunchGuard;

impl AppLaunchGuard {
    /// Exact, case-sensitive name match against the process list.  An
    /// inspector failure counts as "not running".
    pub fn is_running(inspector: &mut dyn ProcessInspector, process_name: &str) -> bool {
        match inspector.process_names() {
            Ok(names) => names.contains(process_name),
            Err(e) => {
                warn!("process list unavailable: {}", e);
                false
            }
        }
    }

    /// Launch `command` unless `process_name` is already running.
    pub fn launch_once(
        inspector:    &mut dyn ProcessInspector,
        launcher:     &mut dyn ProcessLauncher,
        process_name: &str,
        command:      &LaunchCommand,
    ) -> LaunchOutcome {
        if Self::is_running(inspector, process_name) {
            info!("{} already running; not launching", process_name);
            return LaunchOutcome::AlreadyRunning;
        }
        info!("launching {}", command.program());
        if let Err(e) = launcher.launch(command) {
            warn!("launch of {} failed: {}", command.program(), e);
        }
        LaunchOutcome::Launched
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
