//! CLI command implementations

pub mod discover;
pub mod issues;
pub mod prs;

pub use discover::ProjectsArgs;
pub use issues::IssuesArgs;
pub use prs::PrsArgs;

use transplant_github::CopyReport;

/// Print a job's run summary
pub(crate) fn print_report(report: &CopyReport) {
    println!();
    println!("Created: {}", report.created);
    if report.skipped > 0 {
        println!("Skipped: {}", report.skipped);
    }
    if report.errors.is_empty() {
        println!("Errors:  0");
    } else {
        println!("Errors:  {}", report.errors.len());
        for error in &report.errors {
            println!("  - {}", error);
        }
    }
}
