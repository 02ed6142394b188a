//! OS-facing collaborators: level sinks, process table, launcher.
//!
//! | Type                    | Implements                     | Backend                    |
//! |-------------------------|--------------------------------|----------------------------|
//! | `CommandVolumeSink`     | `VolumeSink`                   | configured helper program  |
//! | `CommandBrightnessSink` | `BrightnessSink`               | configured helper program  |
//! | `LogSink`               | both sinks                     | log only                   |
//! | `SysinfoInspector`      | `ProcessInspector`             | `sysinfo` process table    |
//! | `SpawnLauncher`         | `ProcessLauncher`              | `std::process::Command`    |

use std::collections::HashSet;
use std::process::{Child, Command, Stdio};

use log::{debug, info, warn};
use sysinfo::{ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System};

use hand_gesture::level::level_to_percent;
use hand_gesture::recording::RecordingLauncher;
use hand_gesture::{
    ActuatorError, BrightnessSink, Effects, LaunchCommand, ProcessInspector, ProcessLauncher,
    VolumeSink,
};

use crate::config::{CommandSpec, DeskConfig};

// ════════════════════════════════════════════════════════════════════════════
// Command-backed sinks
// ════════════════════════════════════════════════════════════════════════════

/// Substitute `{percent}` (0–100 integer) and `{scalar}` (0.00–1.00) in
/// every argument.
pub fn render_args(args: &[String], percent: u8, scalar: f32) -> Vec<String> {
    let scalar = format!("{:.2}", scalar);
    let percent = percent.to_string();
    args.iter()
        .map(|a| a.replace("{percent}", &percent).replace("{scalar}", &scalar))
        .collect()
}

/// Run `spec` with the rendered args and wait for it.
fn run_helper(what: &str, spec: &CommandSpec, percent: u8, scalar: f32) -> Result<(), ActuatorError> {
    let args = render_args(&spec.args, percent, scalar);
    debug!("{}: {} {:?}", what, spec.program, args);
    let status = Command::new(&spec.program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .status()
        .map_err(|source| ActuatorError::Spawn { what: what.to_string(), source })?;
    if status.success() {
        Ok(())
    } else {
        Err(ActuatorError::Status { what: what.to_string(), status: status.to_string() })
    }
}

pub struct CommandVolumeSink {
    spec: CommandSpec,
}

impl CommandVolumeSink {
    pub fn new(spec: CommandSpec) -> Self { CommandVolumeSink { spec } }
}

impl VolumeSink for CommandVolumeSink {
    fn set_volume(&mut self, scalar: f32) -> Result<(), ActuatorError> {
        let scalar = scalar.clamp(0.0, 1.0);
        run_helper("volume helper", &self.spec, level_to_percent(scalar * 100.0), scalar)
    }
}

pub struct CommandBrightnessSink {
    spec: CommandSpec,
}

impl CommandBrightnessSink {
    pub fn new(spec: CommandSpec) -> Self { CommandBrightnessSink { spec } }
}

impl BrightnessSink for CommandBrightnessSink {
    fn set_brightness(&mut self, percent: u8) -> Result<(), ActuatorError> {
        let percent = percent.min(100);
        run_helper("brightness helper", &self.spec, percent, percent as f32 / 100.0)
    }
}

/// Sink used when no helper program is configured.
#[derive(Debug, Default)]
pub struct LogSink;

impl VolumeSink for LogSink {
    fn set_volume(&mut self, scalar: f32) -> Result<(), ActuatorError> {
        info!("volume -> {}%", level_to_percent(scalar * 100.0));
        Ok(())
    }
}

impl BrightnessSink for LogSink {
    fn set_brightness(&mut self, percent: u8) -> Result<(), ActuatorError> {
        info!("brightness -> {}%", percent);
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Processes
// ════════════════════════════════════════════════════════════════════════════

pub struct SysinfoInspector {
    system: System,
}

impl SysinfoInspector {
    pub fn new() -> Self {
        SysinfoInspector { system: System::new() }
    }
}

impl Default for SysinfoInspector {
    fn default() -> Self { Self::new() }
}

impl ProcessInspector for SysinfoInspector {
    fn process_names(&mut self) -> Result<HashSet<String>, ActuatorError> {
        self.system
            .refresh_processes_specifics(ProcessesToUpdate::All, ProcessRefreshKind::new());
        let names: HashSet<String> = self
            .system
            .processes()
            .values()
            .filter(|p| p.status() != ProcessStatus::Zombie)
            .map(|p| p.name().to_string_lossy().into_owned())
            .collect();
        debug!("process table: {} distinct names", names.len());
        Ok(names)
    }
}

/// Fire-and-forget launcher.  The child's stdio is detached; its handle is
/// held until the child has exited and been reaped.
#[derive(Debug, Default)]
pub struct SpawnLauncher {
    children: Vec<Child>,
}

impl SpawnLauncher {
    /// Collect every child that has exited.  Returns how many are still
    /// running.
    pub fn reap(&mut self) -> usize {
        self.children.retain_mut(|child| match child.try_wait() {
            Ok(None)         => true,
            Ok(Some(status)) => {
                debug!("pid {} exited: {}", child.id(), status);
                false
            }
            Err(e) => {
                warn!("pid {}: {}", child.id(), e);
                false
            }
        });
        self.children.len()
    }
}

impl ProcessLauncher for SpawnLauncher {
    fn launch(&mut self, command: &LaunchCommand) -> Result<(), ActuatorError> {
        self.reap();
        let child = Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ActuatorError::Spawn {
                what: command.program().to_string(),
                source,
            })?;
        info!("started {} (pid {})", command.program(), child.id());
        self.children.push(child);
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Actuators — owned collaborator set
// ════════════════════════════════════════════════════════════════════════════

/// The four collaborators a session needs, chosen from the config.
pub struct Actuators {
    pub volume:     Box<dyn VolumeSink>,
    pub brightness: Box<dyn BrightnessSink>,
    pub inspector:  Box<dyn ProcessInspector>,
    pub launcher:   Box<dyn ProcessLauncher>,
}

impl Actuators {
    pub fn from_config(cfg: &DeskConfig) -> Self {
        let volume: Box<dyn VolumeSink> = match &cfg.volume_command {
            Some(spec) => Box::new(CommandVolumeSink::new(spec.clone())),
            None       => Box::new(LogSink),
        };
        let brightness: Box<dyn BrightnessSink> = match &cfg.brightness_command {
            Some(spec) => Box::new(CommandBrightnessSink::new(spec.clone())),
            None       => Box::new(LogSink),
        };
        let launcher: Box<dyn ProcessLauncher> = if cfg.dry_run {
            Box::new(RecordingLauncher::default())
        } else {
            Box::new(SpawnLauncher::default())
        };
        Actuators {
            volume,
            brightness,
            inspector: Box::new(SysinfoInspector::new()),
            launcher,
        }
    }

    pub fn effects(&mut self) -> Effects<'_> {
        Effects {
            volume:     self.volume.as_mut(),
            brightness: self.brightness.as_mut(),
            inspector:  self.inspector.as_mut(),
            launcher:   self.launcher.as_mut(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_substituted() {
        let args = vec!["sset".to_string(), "Master".to_string(), "{percent}%".to_string(), "{scalar}".to_string()];
        assert_eq!(render_args(&args, 42, 0.42), ["sset", "Master", "42%", "0.42"]);
    }

    #[test]
    fn args_without_placeholders_pass_through() {
        let args = vec!["--quiet".to_string()];
        assert_eq!(render_args(&args, 7, 0.07), ["--quiet"]);
    }

    #[cfg(unix)]
    #[test]
    fn helper_exit_status_is_reported() {
        let mut ok = CommandVolumeSink::new(CommandSpec::new("true", &["{percent}"]));
        assert!(ok.set_volume(0.5).is_ok());

        let mut failing = CommandBrightnessSink::new(CommandSpec::new("false", &[]));
        match failing.set_brightness(30) {
            Err(ActuatorError::Status { what, .. }) => assert_eq!(what, "brightness helper"),
            other => panic!("expected a status error, got {:?}", other),
        }
    }

    #[test]
    fn missing_helper_is_a_spawn_error() {
        let mut sink = CommandVolumeSink::new(CommandSpec::new("/nonexistent/volume-helper", &[]));
        assert!(matches!(sink.set_volume(0.1), Err(ActuatorError::Spawn { .. })));
    }

    #[test]
    fn launcher_reports_missing_program() {
        let cmd = LaunchCommand::new("/nonexistent/app", Vec::new()).unwrap();
        assert!(matches!(SpawnLauncher::default().launch(&cmd), Err(ActuatorError::Spawn { .. })));
    }

    #[test]
    fn process_table_is_not_empty() {
        let names = SysinfoInspector::new().process_names().unwrap();
        assert!(!names.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn exited_child_is_reaped_and_not_reported_running() {
        use std::time::{Duration, Instant};
        use hand_gesture::AppLaunchGuard;

        let mut launcher = SpawnLauncher::default();
        let cmd = LaunchCommand::new("true", Vec::new()).unwrap();
        launcher.launch(&cmd).unwrap();

        let mut inspector = SysinfoInspector::new();
        let deadline = Instant::now() + Duration::from_secs(5);
        while AppLaunchGuard::is_running(&mut inspector, "true") && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(50));
        }
        assert!(!AppLaunchGuard::is_running(&mut inspector, "true"));

        let deadline = Instant::now() + Duration::from_secs(5);
        while launcher.reap() > 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(50));
        }
        assert_eq!(launcher.reap(), 0);
    }

    #[test]
    fn log_sinks_never_fail() {
        assert!(LogSink.set_volume(0.3).is_ok());
        assert!(LogSink.set_brightness(80).is_ok());
    }
}
