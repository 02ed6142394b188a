//! In-memory collaborators that remember every call instead of touching
//! the system.  Used for dry runs and by tests.

use std::collections::HashSet;

use crate::error::ActuatorError;
use crate::launch::{LaunchCommand, ProcessInspector, ProcessLauncher};
use crate::level::{BrightnessSink, VolumeSink};
use crate::session::Effects;

#[derive(Debug, Default)]
pub struct RecordingVolume {
    pub values: Vec<f32>,
    pub fail:   bool,
}

impl VolumeSink for RecordingVolume {
    fn set_volume(&mut self, scalar: f32) -> Result<(), ActuatorError> {
        self.values.push(scalar);
        if self.fail { Err(ActuatorError::Other("volume endpoint gone".into())) } else { Ok(()) }
    }
}

#[derive(Debug, Default)]
pub struct RecordingBrightness {
    pub values: Vec<u8>,
    pub fail:   bool,
}

impl BrightnessSink for RecordingBrightness {
    fn set_brightness(&mut self, percent: u8) -> Result<(), ActuatorError> {
        self.values.push(percent);
        if self.fail { Err(ActuatorError::Other("no backlight".into())) } else { Ok(()) }
    }
}

/// A fixed process table.
#[derive(Debug, Default)]
pub struct StaticProcesses {
    pub names:   HashSet<String>,
    pub queries: usize,
}

impl StaticProcesses {
    pub fn with(names: &[&str]) -> Self {
        StaticProcesses { names: names.iter().map(|n| n.to_string()).collect(), queries: 0 }
    }
}

impl ProcessInspector for StaticProcesses {
    fn process_names(&mut self) -> Result<HashSet<String>, ActuatorError> {
        self.queries += 1;
        Ok(self.names.clone())
    }
}

#[derive(Debug, Default)]
pub struct RecordingLauncher {
    pub launched: Vec<LaunchCommand>,
}

impl ProcessLauncher for RecordingLauncher {
    fn launch(&mut self, command: &LaunchCommand) -> Result<(), ActuatorError> {
        log::info!("(dry run) would launch {} {:?}", command.program(), command.args());
        self.launched.push(command.clone());
        Ok(())
    }
}

/// All four collaborators together.
#[derive(Debug, Default)]
pub struct Recorder {
    pub volume:     RecordingVolume,
    pub brightness: RecordingBrightness,
    pub processes:  StaticProcesses,
    pub launcher:   RecordingLauncher,
}

impl Recorder {
    pub fn effects(&mut self) -> Effects<'_> {
        Effects {
            volume:     &mut self.volume,
            brightness: &mut self.brightness,
            inspector:  &mut self.processes,
            launcher:   &mut self.launcher,
        }
    }
}
