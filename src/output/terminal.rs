// Colored end-of-run summary.

use colored::Colorize;

use crate::pipeline::RunReport;

/// Print what the run computed and which files it produced.
pub fn display_summary(report: &RunReport) {
    println!(
        "\n{}",
        format!(
            "=== Similarities of 0 - {} ({} model) ===",
            report.max_number, report.model_name
        )
        .bold()
    );

    let n = report.matrix_size;
    println!("  Matrix: {n} x {n}");
    match report.value_range {
        Some((low, high)) => println!("  Range:  {low:.4} .. {high:.4}"),
        None => println!("  Range:  {}", "no finite values".red()),
    }
    if report.nan_entries > 0 {
        println!(
            "  {} {} undefined entries (zero-norm embeddings)",
            "~".yellow(),
            report.nan_entries
        );
    }

    if report.files.is_empty() {
        println!("  {}", "No files written".dimmed());
    } else {
        println!("  Files:");
        for file in &report.files {
            println!("    {}", file.display().to_string().green());
        }
    }
    if let Some(session) = &report.session {
        println!("  Browser session: {}", session.display().to_string().dimmed());
    }
    println!();
}
