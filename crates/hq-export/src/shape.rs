//! Format-neutral document model.

use chrono::{DateTime, Utc};
use hq_core::{TestKind, round2};
use hq_criteria::{CriteriaTable, Derived, TestData, report_verdict};
use hq_report::{Report, ReportEditor, Room, TestInstance};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub label: String,
    pub value: String,
}

fn field(label: &str, value: impl Into<String>) -> Field {
    Field {
        label: label.to_string(),
        value: value.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentsEntry {
    pub section: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestRow {
    pub kind: TestKind,
    /// `"<kind label> #<index>"`
    pub title: String,
    pub values: Vec<Field>,
    pub criteria: String,
    pub meets_criteria: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindSummary {
    pub label: String,
    pub instances: usize,
    pub passed: usize,
    pub meets_criteria: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomSection {
    pub section: String,
    pub heading: String,
    pub facts: Vec<Field>,
    pub tests: Vec<TestRow>,
    pub kinds: Vec<KindSummary>,
    pub meets_criteria: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub report_number: String,
    pub generated_at: DateTime<Utc>,
    pub info: Vec<Field>,
    pub contents: Vec<ContentsEntry>,
    pub rooms: Vec<RoomSection>,
    pub meets_criteria: bool,
}

impl ReportDocument {
    /// File name without extension: report number (or "report") plus generation time.
    pub fn file_stem(&self) -> String {
        let number: String = self
            .report_number
            .trim()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let number = if number.is_empty() { "report".to_string() } else { number };
        format!(
            "hvac-{}-{}",
            number,
            self.generated_at.format("%Y%m%dT%H%M%SZ")
        )
    }
}

pub fn verdict_label(meets_criteria: bool) -> &'static str {
    if meets_criteria { "PASS" } else { "FAIL" }
}

/// Flatten a report; outcomes are read as stored, so re-derive first when in doubt.
pub fn shape_document(
    report: &Report,
    table: &CriteriaTable,
    generated_at: DateTime<Utc>,
) -> ReportDocument {
    let info = report.info();
    let verdicts = ReportEditor::new(table).room_verdicts(report);

    let rooms: Vec<RoomSection> = report
        .rooms()
        .iter()
        .zip(&verdicts)
        .enumerate()
        .map(|(i, (room, verdict))| RoomSection {
            section: (i + 1).to_string(),
            heading: room_heading(room),
            facts: room_facts(room),
            tests: room.tests().iter().map(test_row).collect(),
            kinds: verdict
                .kinds
                .iter()
                .map(|k| KindSummary {
                    label: k.kind.label().to_string(),
                    instances: k.instances,
                    passed: k.passed,
                    meets_criteria: k.meets_criteria,
                })
                .collect(),
            meets_criteria: verdict.meets_criteria,
        })
        .collect();

    let contents = rooms
        .iter()
        .map(|r| ContentsEntry {
            section: r.section.clone(),
            title: r.heading.clone(),
        })
        .collect();

    ReportDocument {
        title: "HVAC Qualification Test Report".to_string(),
        report_number: info.report_number.clone(),
        generated_at,
        info: vec![
            field("Hospital", info.hospital_name.clone()),
            field("Report number", info.report_number.clone()),
            field(
                "Measurement date",
                info.measurement_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ),
            field("Tested by", info.tester_name.clone()),
            field("Prepared by", info.preparer_name.clone()),
            field("Approved by", info.approver_name.clone()),
        ],
        contents,
        rooms,
        meets_criteria: report_verdict(&verdicts),
    }
}

fn room_heading(room: &Room) -> String {
    match (room.room_number().trim(), room.name().trim()) {
        ("", "") => "Unnamed room".to_string(),
        ("", name) => name.to_string(),
        (number, "") => number.to_string(),
        (number, name) => format!("{number} {name}"),
    }
}

fn room_facts(room: &Room) -> Vec<Field> {
    vec![
        field("Room number", room.room_number()),
        field("Room name", room.name()),
        field("Surface area", format!("{:.2} m2", room.surface_area_m2())),
        field("Height", format!("{:.2} m", room.height_m())),
        field("Volume", format!("{:.2} m3", room.display_volume())),
        field("Room class", room.room_class().label()),
        field("Test mode", room.test_mode().label()),
        field("Flow type", room.flow_type().label()),
    ]
}

fn test_row(test: &TestInstance) -> TestRow {
    TestRow {
        kind: test.kind(),
        title: format!("{} #{}", test.kind().label(), test.index()),
        values: test_values(test),
        criteria: test.criteria().to_string(),
        meets_criteria: test.meets_criteria(),
    }
}

fn test_values(test: &TestInstance) -> Vec<Field> {
    let derived = test.outcome().derived;
    match test.data() {
        TestData::Airflow(a) => {
            let mut values = vec![
                field("Measurement point", a.point.clone()),
                field("Air speed", format!("{:.2} m/s", a.air_speed_mps)),
                field(
                    "Filter size",
                    format!("{:.2} x {:.2} m", a.filter_width_m, a.filter_length_m),
                ),
                field("Filter units", a.filter_units.max(1).to_string()),
            ];
            if let Derived::Airflow(d) = derived {
                values.push(field("Flow rate per unit", format!("{:.2} m3/h", d.flow_rate_m3h)));
                values.push(field("Total flow rate", format!("{:.2} m3/h", d.total_flow_rate_m3h)));
                values.push(field("Air change rate", d.air_change_rate.to_string()));
            }
            values
        }
        TestData::PressureDifference(p) => vec![
            field("Reference area", p.reference_area.clone()),
            field("Pressure difference", format!("{:.1} Pa", p.pressure_pa)),
        ],
        TestData::FlowDirection(d) => vec![
            field("Reference area", d.reference_area.clone()),
            field("Expected", d.expected.label()),
            field("Observed", d.observed.label()),
        ],
        TestData::HepaLeakage(h) => vec![
            field("Filter", h.filter.clone()),
            field("Leakage", format!("{} %", h.leakage_percent)),
        ],
        TestData::ParticleCount(p) => {
            let mut values = vec![field("Location", p.location.clone())];
            for channel in &p.channels {
                values.push(field(
                    &format!(">= {} um", channel.size_um),
                    format!("{} /m3", round2(channel.count_per_m3)),
                ));
            }
            if let Derived::ParticleCount { implied_iso_class } = derived {
                values.push(field(
                    "Measured ISO class",
                    implied_iso_class
                        .map(|n| format!("ISO {n:.1}"))
                        .unwrap_or_else(|| "not determined".to_string()),
                ));
            }
            values
        }
        TestData::RecoveryTime(r) => vec![field(
            "Recovery time",
            format!("{:.1} min", r.recovery_minutes),
        )],
        TestData::TemperatureHumidity(th) => vec![
            field("Temperature", format!("{:.1} C", th.temperature_c)),
            field("Relative humidity", format!("{:.1} %", th.humidity_percent)),
        ],
        TestData::Noise(n) => vec![field("Noise level", format!("{:.1} dB(A)", n.level_dba))],
    }
}
