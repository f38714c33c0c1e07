//! Shared renderers for projections and sub-steps.

use bootsim::{EntityStatus, Projection, SubStepView, format_bytes, format_hex};

use crate::style::colors::SemanticStyle;
use crate::style::{print_data_table, print_info_table, print_labeled, print_section};

pub fn status(projection: &Projection) {
    let label = projection.label;
    print_section("Status");
    println!("  {}", label.text().by_severity(label.severity()));
    print_labeled("Detail", label.detail());
}

pub fn flags(projection: &Projection) {
    print_section("Hardware");
    let entries: Vec<(&str, String)> = projection
        .flags
        .entries()
        .into_iter()
        .map(|(name, on)| {
            let value = if on { "on".success() } else { "off".muted() };
            (name, value)
        })
        .collect();
    print_info_table(&entries);
}

pub fn registers(projection: &Projection) {
    print_section("Registers");
    let entries: Vec<(&str, String)> = projection
        .registers
        .entries()
        .into_iter()
        .map(|(name, value)| (name, format_hex(value).code()))
        .collect();
    print_info_table(&entries);
}

pub fn memory(projection: &Projection) {
    print_section("Memory");
    let rows: Vec<Vec<String>> = projection
        .memory
        .iter()
        .map(|region| {
            vec![
                format_hex(region.address),
                region.label.to_string(),
                format_bytes(&region.bytes),
            ]
        })
        .collect();
    print_data_table(&["Address", "Region", "Bytes"], &rows);
}

fn entity_status(status: EntityStatus) -> String {
    match status {
        EntityStatus::Idle => "idle".muted(),
        EntityStatus::Verifying => "verifying".info(),
        EntityStatus::Verified => "verified".success(),
        EntityStatus::Failed => "FAILED".error(),
    }
}

pub fn sub_steps(views: &[SubStepView]) {
    print_section("Verification");
    let rows: Vec<Vec<String>> = views
        .iter()
        .map(|view| {
            vec![
                view.stage.to_string(),
                view.title.clone(),
                format!("{} → {}", view.verifier.name, view.target.name),
                entity_status(view.target.status),
                view.signature.map_or_else(|| "-".muted(), entity_status),
            ]
        })
        .collect();
    print_data_table(&["#", "Check", "Verifier → Target", "Status", "Signature"], &rows);
}
