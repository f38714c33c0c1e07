//! Run command: play the boot chain through.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use bootsim::{
    BootEngine, BootEvent, BootMode, BootStatus, Phase, Scheduler, SimScheduler, Speed,
    StageCatalog, SystemScheduler,
};
use bootsim_config::BootSimConfig;

use super::render;
use crate::style::colors::SemanticStyle;
use crate::style::{print_success, print_warn};

/// Command-line overrides for a run.
pub struct RunArgs {
    pub mode: Option<BootMode>,
    pub speed: Option<f64>,
    pub realtime: bool,
    pub step: bool,
}

pub fn run(config: &BootSimConfig, args: &RunArgs) -> Result<()> {
    let mode = args.mode.unwrap_or(config.simulation.mode);
    let speed = match args.speed {
        Some(multiplier) => Speed::new(multiplier).context("Invalid --speed")?,
        None => config.speed()?,
    };
    let catalog = StageCatalog::secure_boot();
    tracing::debug!(%mode, %speed, realtime = args.realtime, step = args.step, "starting run");

    println!(
        "{} {} image at {}",
        "Booting".header(),
        mode.to_string().info(),
        speed.to_string().info()
    );

    if args.step || !config.simulation.autoplay {
        let mut engine = BootEngine::new(catalog, mode, speed, SimScheduler::new());
        step_through(&mut engine);
        finish(&engine, config);
    } else if args.realtime {
        let mut engine = BootEngine::new(catalog, mode, speed, SystemScheduler::new());
        play_through(&mut engine, true);
        finish(&engine, config);
    } else {
        let mut engine = BootEngine::new(catalog, mode, speed, SimScheduler::new());
        play_through(&mut engine, false);
        finish(&engine, config);
    }

    Ok(())
}

/// Plays on timers until nothing is armed.
fn play_through<S: Scheduler>(engine: &mut BootEngine<S>, realtime: bool) {
    engine.play();
    print_events(engine);

    while let Some(due) = engine.next_due() {
        let wait = due.saturating_sub(engine.scheduler().now_ms());
        if realtime && wait > 0 {
            thread::sleep(Duration::from_millis(wait));
        }
        engine.advance_by(wait);
        print_events(engine);
    }
}

/// Steps stage by stage without timers.
fn step_through<S: Scheduler>(engine: &mut BootEngine<S>) {
    println!("{}", format!("    {}", engine.current_stage_name()).info());
    while engine.phase() != Phase::Complete {
        engine.next();
        print_events(engine);
    }
}

fn print_events<S: Scheduler>(engine: &mut BootEngine<S>) {
    let now = engine.scheduler().now_ms();
    for event in engine.drain_events() {
        let stamp = format!("[{now:>6} ms]").muted();
        match event {
            BootEvent::StageChanged { to, .. } => {
                let name = engine
                    .catalog()
                    .get(to)
                    .map_or(bootsim::COMPLETE_STAGE_NAME, |stage| stage.name.as_str());
                println!("{stamp} {} {}", format!("stage {to}").muted(), name.info());
            }
            BootEvent::PlaybackChanged { playing } => {
                let what = if playing { "playing" } else { "stopped" };
                println!("{stamp} {}", what.muted());
            }
            BootEvent::StatusChanged { from, to } => {
                println!("{stamp} {}", format!("status {from} → {to}").muted());
            }
            BootEvent::SpeedChanged { from, to } => {
                println!("{stamp} {}", format!("speed {from} → {to}").muted());
            }
            BootEvent::Completed { status } => {
                let text = format!("complete: {status}");
                let styled = if status == BootStatus::Success {
                    text.success()
                } else {
                    text.error()
                };
                println!("{stamp} {styled}");
            }
        }
    }
}

fn finish<S: Scheduler>(engine: &BootEngine<S>, config: &BootSimConfig) {
    let projection = engine.projection();

    render::status(&projection);
    if config.display.show_registers {
        render::registers(&projection);
    }
    if config.display.show_memory {
        render::memory(&projection);
    }

    println!();
    match engine.boot_status() {
        BootStatus::Success => print_success("Chain of trust verified; control handed to the OS"),
        status => print_warn(&format!(
            "Boot ended {status}: {}",
            projection.label.detail()
        )),
    }
}
