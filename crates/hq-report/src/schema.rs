//! Report schema definitions.
//!
//! Derived values (room volume, test outcomes) live next to the inputs they
//! come from but can only be written by [`crate::builder::ReportEditor`].
//! Room volume is also recomputed whenever a room is deserialized.

use chrono::{DateTime, NaiveDate, Utc};
use hq_core::{FlowType, ReportId, RoomClass, RoomId, TestId, TestKind, TestMode, round2};
use hq_criteria::{RoomContext, TestData, TestOutcome, room_volume};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReportInfo {
    #[serde(default)]
    pub hospital_name: String,
    #[serde(default)]
    pub report_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_date: Option<NaiveDate>,
    #[serde(default)]
    pub tester_name: String,
    #[serde(default)]
    pub preparer_name: String,
    #[serde(default)]
    pub approver_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub(crate) id: ReportId,
    #[serde(default)]
    pub(crate) version: u32,
    pub(crate) info: ReportInfo,
    #[serde(default)]
    pub(crate) rooms: Vec<Room>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Report {
    pub fn id(&self) -> ReportId {
        self.id
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn info(&self) -> &ReportInfo {
        &self.info
    }

    /// Rooms in document order.
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn test_count(&self) -> usize {
        self.rooms.iter().map(|r| r.tests.len()).sum()
    }

    pub(crate) fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|r| r.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "RoomRecord")]
pub struct Room {
    pub(crate) id: RoomId,
    pub(crate) room_number: String,
    pub(crate) name: String,
    pub(crate) surface_area_m2: f64,
    pub(crate) height_m: f64,
    pub(crate) volume_m3: f64,
    pub(crate) test_mode: TestMode,
    pub(crate) flow_type: FlowType,
    pub(crate) room_class: RoomClass,
    pub(crate) tests: Vec<TestInstance>,
}

/// Wire shape of a room; the stored volume is ignored and recomputed.
#[derive(Deserialize)]
struct RoomRecord {
    id: RoomId,
    #[serde(default)]
    room_number: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    surface_area_m2: f64,
    #[serde(default)]
    height_m: f64,
    #[serde(default)]
    test_mode: TestMode,
    #[serde(default)]
    flow_type: FlowType,
    #[serde(default)]
    room_class: RoomClass,
    #[serde(default)]
    tests: Vec<TestInstance>,
}

impl From<RoomRecord> for Room {
    fn from(r: RoomRecord) -> Self {
        let mut room = Room {
            id: r.id,
            room_number: r.room_number,
            name: r.name,
            surface_area_m2: 0.0,
            height_m: 0.0,
            volume_m3: 0.0,
            test_mode: r.test_mode,
            flow_type: r.flow_type,
            room_class: r.room_class,
            tests: r.tests,
        };
        room.set_dimensions(r.surface_area_m2, r.height_m);
        room
    }
}

impl Room {
    pub(crate) fn new(id: RoomId) -> Self {
        Self {
            id,
            room_number: String::new(),
            name: String::new(),
            surface_area_m2: 0.0,
            height_m: 0.0,
            volume_m3: 0.0,
            test_mode: TestMode::default(),
            flow_type: FlowType::default(),
            room_class: RoomClass::default(),
            tests: Vec::new(),
        }
    }

    /// The only place volume is written.
    pub(crate) fn set_dimensions(&mut self, surface_area_m2: f64, height_m: f64) {
        self.surface_area_m2 = hq_core::non_negative(surface_area_m2);
        self.height_m = hq_core::non_negative(height_m);
        self.volume_m3 = room_volume(self.surface_area_m2, self.height_m);
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn room_number(&self) -> &str {
        &self.room_number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn surface_area_m2(&self) -> f64 {
        self.surface_area_m2
    }

    pub fn height_m(&self) -> f64 {
        self.height_m
    }

    /// Full-precision volume, m³.
    pub fn volume_m3(&self) -> f64 {
        self.volume_m3
    }

    /// Volume rounded to 2 decimals for display.
    pub fn display_volume(&self) -> f64 {
        round2(self.volume_m3)
    }

    pub fn test_mode(&self) -> TestMode {
        self.test_mode
    }

    pub fn flow_type(&self) -> FlowType {
        self.flow_type
    }

    pub fn room_class(&self) -> RoomClass {
        self.room_class
    }

    pub fn tests(&self) -> &[TestInstance] {
        &self.tests
    }

    pub fn test(&self, id: TestId) -> Option<&TestInstance> {
        self.tests.iter().find(|t| t.id == id)
    }

    pub fn tests_of_kind(&self, kind: TestKind) -> impl Iterator<Item = &TestInstance> {
        self.tests.iter().filter(move |t| t.kind() == kind)
    }

    pub fn context(&self) -> RoomContext {
        RoomContext {
            room_class: self.room_class,
            test_mode: self.test_mode,
            flow_type: self.flow_type,
            volume_m3: self.volume_m3,
        }
    }

    /// Number or, when unassigned, a placeholder for messages.
    pub fn label(&self) -> String {
        if self.room_number.trim().is_empty() {
            "no number".to_string()
        } else {
            self.room_number.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestInstance {
    pub(crate) id: TestId,
    /// 1-based ordinal among tests of the same kind in the room.
    pub(crate) index: u32,
    pub(crate) data: TestData,
    pub(crate) outcome: TestOutcome,
}

impl TestInstance {
    pub fn id(&self) -> TestId {
        self.id
    }

    pub fn kind(&self) -> TestKind {
        self.data.kind()
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn data(&self) -> &TestData {
        &self.data
    }

    pub fn outcome(&self) -> &TestOutcome {
        &self.outcome
    }

    pub fn meets_criteria(&self) -> bool {
        self.outcome.meets_criteria
    }

    pub fn criteria(&self) -> &str {
        &self.outcome.criteria
    }
}
