//! Console summary formatting

use std::path::Path;

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use pagecheck_harness::RunOutcome;

/// Print the end-of-run summary block
pub fn print_summary(name: &str, outcome: &RunOutcome, report_path: &Path) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec!["Check", "Result", "Details"]);
    for record in &outcome.records {
        let result = if record.passed {
            "PASS".green()
        } else {
            "FAIL".red()
        };
        table.add_row(vec![
            record.name.clone(),
            result.to_string(),
            record.details.clone(),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!("Checklist: {} ({} ms)", name, outcome.duration_ms);
    println!("✅ Passed: {}/{}", outcome.passed(), outcome.total());
    println!("❌ Failed: {}/{}", outcome.failed(), outcome.total());
    println!("📈 Success rate: {}%", outcome.success_rate());
    if let Some(fault) = &outcome.fault {
        print_warning(&format!("run aborted early: {fault}"));
    }
    println!("📄 Report: {}", report_path.display());
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("⚠️  {}", message);
}
