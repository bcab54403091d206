//! Printing of file and row outcomes.

use tagvault_core::{OutcomeStatus, PersistReport, RepairOutcome};

use crate::error::CliError;

/// Print the one-line summary followed by every failed target and profile.
pub fn print_persist_report(operation: &str, report: &PersistReport) {
    let marker = match report.status() {
        OutcomeStatus::Complete => "✓",
        OutcomeStatus::Partial => "!",
        OutcomeStatus::TotalFailure => "✗",
    };
    println!("{marker} {operation}: {report}");
    if let Some(primary) = &report.files.primary_path {
        println!("  primary copy: {}", primary.display());
    }
    for failed in &report.files.failed_paths {
        println!("  target {failed}");
    }
    for failed in &report.rows.failures {
        println!("  replica {failed}");
    }
}

pub fn print_repair_outcome(outcome: &RepairOutcome) {
    println!(
        "Repaired {} copy(ies); {} already present",
        outcome.repaired(),
        outcome.already_present.len()
    );
    for path in &outcome.files.successful_paths {
        println!("  copied   {}", path.display());
    }
    for path in &outcome.already_present {
        println!("  present  {}", path.display());
    }
    for failed in &outcome.files.failed_paths {
        println!("  failed   {failed}");
    }
}

/// Map a total failure to `CliError::Unavailable`; anything else passes.
pub fn ensure_some_success(
    operation: &str,
    status: OutcomeStatus,
    detail: impl FnOnce() -> String,
) -> Result<(), CliError> {
    if status == OutcomeStatus::TotalFailure {
        return Err(CliError::Unavailable(format!("{operation}: {}", detail())));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_total_failure_is_an_error() {
        assert!(ensure_some_success("save", OutcomeStatus::Partial, String::new).is_ok());
        assert!(ensure_some_success("save", OutcomeStatus::Complete, String::new).is_ok());
        let err = ensure_some_success("save", OutcomeStatus::TotalFailure, || {
            "nothing reachable".to_string()
        })
        .unwrap_err();
        assert_eq!(err.exit_code(), 75);
        assert!(err.to_string().contains("nothing reachable"));
    }
}
