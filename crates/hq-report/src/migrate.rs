//! Schema migration framework.

use crate::ReportError;
use crate::schema::Report;

pub const LATEST_VERSION: u32 = 1;

pub fn migrate_to_latest(mut report: Report) -> Result<Report, ReportError> {
    if report.version > LATEST_VERSION {
        return Err(ReportError::Migration {
            what: format!(
                "Version {} is newer than supported version {}",
                report.version, LATEST_VERSION
            ),
        });
    }
    while report.version < LATEST_VERSION {
        report = migrate_one_version(report)?;
    }
    Ok(report)
}

fn migrate_one_version(report: Report) -> Result<Report, ReportError> {
    match report.version {
        0 => migrate_v0_to_v1(report),
        v => Err(ReportError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

/// Version 0 reports predate the version field; `updated_at` may lag `created_at`.
fn migrate_v0_to_v1(mut report: Report) -> Result<Report, ReportError> {
    if report.updated_at < report.created_at {
        report.updated_at = report.created_at;
    }
    report.version = 1;
    Ok(report)
}
