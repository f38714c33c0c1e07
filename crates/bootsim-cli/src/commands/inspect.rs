//! Inspect command: seek to a stage and show the derived hardware view.

use anyhow::{Context, Result};
use bootsim::{BootEngine, BootMode};
use bootsim_config::BootSimConfig;

use super::render;
use crate::style::colors::SemanticStyle;
use crate::style::print_labeled;

pub fn run(config: &BootSimConfig, stage: u32, mode: Option<BootMode>, json: bool) -> Result<()> {
    let mode = mode.unwrap_or(config.simulation.mode);
    let mut engine = BootEngine::simulated(mode);
    engine
        .go_to_stage(stage)
        .with_context(|| format!("Cannot inspect stage {stage}"))?;

    let snapshot = engine.snapshot();

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!(
        "{} {}",
        format!("Stage {}/{}", snapshot.stage, snapshot.total_stages).header(),
        snapshot.stage_name.info()
    );
    if let Some(instruction) = &snapshot.instruction {
        print_labeled("Instruction", &instruction.code());
    }
    print_labeled("Mode", &snapshot.mode.to_string());
    print_labeled("Progress", &format!("{}%", snapshot.percent()));

    render::status(&snapshot.projection);
    render::flags(&snapshot.projection);
    if config.display.show_registers {
        render::registers(&snapshot.projection);
    }
    if config.display.show_memory {
        render::memory(&snapshot.projection);
    }
    render::sub_steps(&snapshot.sub_steps);

    Ok(())
}
