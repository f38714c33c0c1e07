//! Stages command: list the boot catalog.

use anyhow::Result;
use bootsim::StageCatalog;

use crate::style::colors::SemanticStyle;
use crate::style::print_data_table;

pub fn run(json: bool) -> Result<()> {
    let catalog = StageCatalog::secure_boot();

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    let rows: Vec<Vec<String>> = catalog
        .iter()
        .map(|stage| {
            vec![
                stage.index.to_string(),
                stage.name.clone(),
                format!("{:.1} s", stage.duration_ms as f64 / 1000.0),
                stage.sub_steps.len().to_string(),
                stage.instruction.clone(),
            ]
        })
        .collect();

    print_data_table(&["#", "Stage", "Duration", "Checks", "Instruction"], &rows);
    println!(
        "{}",
        format!(
            "({} stages, {:.1} s at 1x)",
            catalog.count(),
            catalog.total_duration_ms() as f64 / 1000.0
        )
        .muted()
    );

    Ok(())
}
