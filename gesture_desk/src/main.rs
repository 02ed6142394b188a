//! gesture_desk — interactive entry point.

use std::path::PathBuf;

use clap::Parser;

use gesture_desk::app::run;
use gesture_desk::config::{CommandSpec, DeskConfig, SourceKind};

#[derive(Parser)]
#[command(author, version, about = "Hand-gesture volume, brightness and app launcher")]
struct Args {
    /// Load settings from a YAML file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Where hands come from
    #[arg(long, value_enum)]
    source: Option<SourceKind>,
    /// Detector command for `--source pipe`, split on whitespace
    #[arg(long)]
    detector: Option<String>,
    /// Flip detector x coordinates (selfie view)
    #[arg(long, default_value_t = false)]
    mirror: bool,
    /// No window; log overlays instead
    #[arg(long, default_value_t = false)]
    headless: bool,
    /// Log launches instead of starting applications
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Level points per unit of normalized pinch change
    #[arg(long)]
    sensitivity: Option<f32>,
}

impl Args {
    fn apply(self, cfg: &mut DeskConfig) -> anyhow::Result<()> {
        if let Some(source) = self.source {
            cfg.source = source;
        }
        if let Some(line) = self.detector {
            let mut words = line.split_whitespace();
            let Some(program) = words.next() else {
                anyhow::bail!("--detector is empty");
            };
            cfg.detector = Some(CommandSpec {
                program: program.to_string(),
                args:    words.map(str::to_string).collect(),
            });
        }
        cfg.mirror   |= self.mirror;
        cfg.headless |= self.headless;
        cfg.dry_run  |= self.dry_run;
        if let Some(s) = self.sensitivity {
            cfg.sensitivity = s;
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => DeskConfig::load(path)?,
        None       => DeskConfig::default(),
    };
    args.apply(&mut cfg)?;

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Gesture Desk — pinch, fist and point controller       ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    match cfg.source {
        SourceKind::Sim  => println!("  Source: keyboard/mouse simulation"),
        SourceKind::Pipe => println!("  Source: landmark detector pipe"),
        SourceKind::Leap => println!("  Source: LeapMotion hardware"),
    }
    println!("  Menu:   {} item(s){}", cfg.menu.len(), if cfg.dry_run { "  (dry run)" } else { "" });
    println!();

    run(cfg)?;
    Ok(())
}
