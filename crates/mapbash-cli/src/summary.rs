use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use mapbash_core::RunReport;

/// Print one row per world: rendered map types or the failure.
pub fn print(report: &RunReport) {
    if report.outcomes.is_empty() && report.skipped.is_empty() {
        println!("  No worlds to render.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["World", "Status", "Map types"]);

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(manifest) => {
                let types = manifest
                    .types
                    .iter()
                    .map(|t| format!("{} ({}-{})", t.id, t.min_zoom, t.max_zoom))
                    .collect::<Vec<_>>()
                    .join(", ");
                table.add_row(vec![outcome.world.as_str(), "ok", types.as_str()]);
            }
            Err(err) => {
                let message = err.to_string();
                table.add_row(vec![outcome.world.as_str(), "failed", message.as_str()]);
            }
        }
    }
    for world in &report.skipped {
        table.add_row(vec![world.as_str(), "skipped", ""]);
    }

    println!();
    println!("{table}");
    println!();
    let line = format!(
        "  {} rendered, {} failed, {} skipped",
        report.succeeded(),
        report.outcomes.len() - report.succeeded(),
        report.skipped.len()
    );
    if report.is_success() {
        println!("{}", line.green());
    } else {
        println!("{}", line.yellow());
    }
}
