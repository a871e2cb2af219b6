use bookvault_core::config::Settings;
use bookvault_core::sync::SyncReport;

use crate::commands::common::open_existing_service;
use crate::error::CliError;

pub async fn run_sync(dry_run: bool, as_json: bool, settings: &Settings) -> Result<(), CliError> {
    let service = open_existing_service(settings)?;
    let job = settings.reconcile_job().with_dry_run(dry_run);
    let report = service.reconcile(&job).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in format_sync_report(&report) {
            println!("{line}");
        }
    }

    Ok(())
}

pub fn format_sync_report(report: &SyncReport) -> Vec<String> {
    if report.is_noop() {
        return vec![format!(
            "Vault is up to date (cursor {})",
            report.previous_cursor
        )];
    }

    let verb = if report.dry_run {
        "Would create"
    } else {
        "Created"
    };
    vec![
        format!("Found {} record(s) past cursor {}", report.found, report.previous_cursor),
        format!("{verb} {} file(s), skipped {} already present", report.created, report.skipped),
        if report.dry_run {
            format!("Cursor would advance to {}", report.cursor)
        } else {
            format!("Cursor now at {}", report.cursor)
        },
    ]
}
