//! Report validation logic.
//!
//! [`validate_report`] is the completeness gate in front of export: it
//! collects every problem instead of stopping at the first one.
//! [`check_integrity`] covers structural problems that only hand-edited or
//! corrupted data can have.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::migrate::LATEST_VERSION;
use crate::schema::{Report, Room};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    #[error("Hospital name is required")]
    MissingHospitalName,

    #[error("Report number is required")]
    MissingReportNumber,

    #[error("Measurement date is required")]
    MissingMeasurementDate,

    #[error("Tester name is required")]
    MissingTesterName,

    #[error("At least one room is required")]
    NoRooms,

    #[error("Room {position} ({label}): room name is required")]
    MissingRoomName { position: usize, label: String },

    #[error("Room {position} ({label}): surface area must be positive (got {value})")]
    NonPositiveArea {
        position: usize,
        label: String,
        value: f64,
    },

    #[error("Room {position} ({label}): height must be positive (got {value})")]
    NonPositiveHeight {
        position: usize,
        label: String,
        value: f64,
    },

    #[error("Room {position} ({label}): at least one test is required")]
    NoTests { position: usize, label: String },
}

/// Result of the validation gate: `valid` iff `errors` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub errors: Vec<String>,
    #[serde(skip)]
    pub issues: Vec<ValidationIssue>,
}

impl ValidationOutcome {
    fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        Self {
            valid: issues.is_empty(),
            errors: issues.iter().map(|i| i.to_string()).collect(),
            issues,
        }
    }
}

pub fn validate_report(report: &Report) -> ValidationOutcome {
    let mut issues = Vec::new();
    let info = report.info();

    if info.hospital_name.trim().is_empty() {
        issues.push(ValidationIssue::MissingHospitalName);
    }
    if info.report_number.trim().is_empty() {
        issues.push(ValidationIssue::MissingReportNumber);
    }
    if info.measurement_date.is_none() {
        issues.push(ValidationIssue::MissingMeasurementDate);
    }
    if info.tester_name.trim().is_empty() {
        issues.push(ValidationIssue::MissingTesterName);
    }

    if report.rooms().is_empty() {
        issues.push(ValidationIssue::NoRooms);
    }
    for (i, room) in report.rooms().iter().enumerate() {
        validate_room(i + 1, room, &mut issues);
    }

    ValidationOutcome::from_issues(issues)
}

fn validate_room(position: usize, room: &Room, issues: &mut Vec<ValidationIssue>) {
    let label = room.label();

    if room.name().trim().is_empty() {
        issues.push(ValidationIssue::MissingRoomName {
            position,
            label: label.clone(),
        });
    }
    if room.surface_area_m2() <= 0.0 {
        issues.push(ValidationIssue::NonPositiveArea {
            position,
            label: label.clone(),
            value: room.surface_area_m2(),
        });
    }
    if room.height_m() <= 0.0 {
        issues.push(ValidationIssue::NonPositiveHeight {
            position,
            label: label.clone(),
            value: room.height_m(),
        });
    }
    if room.tests().is_empty() {
        issues.push(ValidationIssue::NoTests { position, label });
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum IntegrityIssue {
    #[error("Duplicate room id: {id}")]
    DuplicateRoomId { id: String },

    #[error("Duplicate test id: {id} in room '{room}'")]
    DuplicateTestId { id: String, room: String },

    #[error("Duplicate {kind} index {index} in room '{room}'")]
    DuplicateIndex {
        kind: String,
        index: u32,
        room: String,
    },

    #[error("Invalid index 0 for test {id} in room '{room}'")]
    ZeroIndex { id: String, room: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn check_integrity(report: &Report) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();

    if report.version() > LATEST_VERSION {
        issues.push(IntegrityIssue::UnsupportedVersion {
            version: report.version(),
        });
    }

    let mut room_ids = HashSet::new();
    for room in report.rooms() {
        if !room_ids.insert(room.id()) {
            issues.push(IntegrityIssue::DuplicateRoomId {
                id: room.id().to_string(),
            });
        }

        let mut test_ids = HashSet::new();
        let mut ordinals = HashSet::new();
        for test in room.tests() {
            if !test_ids.insert(test.id()) {
                issues.push(IntegrityIssue::DuplicateTestId {
                    id: test.id().to_string(),
                    room: room.label(),
                });
            }
            if test.index() == 0 {
                issues.push(IntegrityIssue::ZeroIndex {
                    id: test.id().to_string(),
                    room: room.label(),
                });
            } else if !ordinals.insert((test.kind(), test.index())) {
                issues.push(IntegrityIssue::DuplicateIndex {
                    kind: test.kind().to_string(),
                    index: test.index(),
                    room: room.label(),
                });
            }
        }
    }

    issues
}
