//! Mutation entry points for report aggregates.
//!
//! Every edit goes through [`ReportEditor`], which recomputes room volume and
//! re-evaluates the affected tests before returning, then bumps `updated_at`.
//! Ordinal indices tolerate gaps: removing a test never renumbers the others,
//! and a new test gets one past the highest index of its kind in the room.

use chrono::{DateTime, Utc};
use hq_core::{FlowType, ReportId, RoomClass, RoomId, TestId, TestKind, TestMode};
use hq_criteria::{CriteriaTable, RoomVerdict, TestData, evaluate, room_verdict};

use crate::migrate::LATEST_VERSION;
use crate::schema::{Report, ReportInfo, Room, TestInstance};

pub type BuilderResult<T> = Result<T, BuilderError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BuilderError {
    #[error("Room not found: {room_id}")]
    RoomNotFound { room_id: RoomId },

    #[error("Test not found: {test_id} in room {room_id}")]
    TestNotFound { room_id: RoomId, test_id: TestId },

    #[error("Room position {position} out of range (rooms={len})")]
    PositionOutOfRange { position: usize, len: usize },
}

/// User-editable room fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoomDraft {
    pub room_number: String,
    pub name: String,
    pub surface_area_m2: f64,
    pub height_m: f64,
    pub test_mode: TestMode,
    pub flow_type: FlowType,
    pub room_class: RoomClass,
}

impl RoomDraft {
    pub fn from_room(room: &Room) -> Self {
        Self {
            room_number: room.room_number.clone(),
            name: room.name.clone(),
            surface_area_m2: room.surface_area_m2,
            height_m: room.height_m,
            test_mode: room.test_mode,
            flow_type: room.flow_type,
            room_class: room.room_class,
        }
    }
}

/// Applies edits to reports using one criteria table.
#[derive(Debug, Clone, Copy)]
pub struct ReportEditor<'a> {
    criteria: &'a CriteriaTable,
}

impl<'a> ReportEditor<'a> {
    pub fn new(criteria: &'a CriteriaTable) -> Self {
        Self { criteria }
    }

    pub fn criteria(&self) -> &'a CriteriaTable {
        self.criteria
    }

    pub fn create_report(&self, info: ReportInfo) -> Report {
        let now = Utc::now();
        let report = Report {
            id: ReportId::new(),
            version: LATEST_VERSION,
            info,
            rooms: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tracing::debug!(report_id = %report.id, "created report");
        report
    }

    pub fn update_info(&self, report: &mut Report, info: ReportInfo) {
        report.info = info;
        touch(report);
    }

    pub fn add_room(&self, report: &mut Report, draft: RoomDraft) -> RoomId {
        let mut id = RoomId::new();
        while report.room(id).is_some() {
            id = RoomId::new();
        }
        let mut room = Room::new(id);
        self.apply_draft(&mut room, draft);
        report.rooms.push(room);
        touch(report);
        tracing::debug!(report_id = %report.id, room_id = %id, "added room");
        id
    }

    pub fn update_room(
        &self,
        report: &mut Report,
        room_id: RoomId,
        draft: RoomDraft,
    ) -> BuilderResult<()> {
        let room = report
            .room_mut(room_id)
            .ok_or(BuilderError::RoomNotFound { room_id })?;
        self.apply_draft(room, draft);
        touch(report);
        Ok(())
    }

    /// Change only the geometry; volume and every test in the room follow.
    pub fn set_room_dimensions(
        &self,
        report: &mut Report,
        room_id: RoomId,
        surface_area_m2: f64,
        height_m: f64,
    ) -> BuilderResult<()> {
        let room = report
            .room_mut(room_id)
            .ok_or(BuilderError::RoomNotFound { room_id })?;
        room.set_dimensions(surface_area_m2, height_m);
        self.reevaluate_room(room);
        touch(report);
        Ok(())
    }

    pub fn remove_room(&self, report: &mut Report, room_id: RoomId) -> BuilderResult<Room> {
        let pos = report
            .rooms
            .iter()
            .position(|r| r.id == room_id)
            .ok_or(BuilderError::RoomNotFound { room_id })?;
        let room = report.rooms.remove(pos);
        touch(report);
        tracing::debug!(report_id = %report.id, room_id = %room_id, "removed room");
        Ok(room)
    }

    /// Move a room to `position` in document order.
    pub fn move_room(
        &self,
        report: &mut Report,
        room_id: RoomId,
        position: usize,
    ) -> BuilderResult<()> {
        let len = report.rooms.len();
        if position >= len {
            return Err(BuilderError::PositionOutOfRange { position, len });
        }
        let from = report
            .rooms
            .iter()
            .position(|r| r.id == room_id)
            .ok_or(BuilderError::RoomNotFound { room_id })?;
        let room = report.rooms.remove(from);
        report.rooms.insert(position, room);
        touch(report);
        Ok(())
    }

    pub fn add_test(
        &self,
        report: &mut Report,
        room_id: RoomId,
        data: TestData,
    ) -> BuilderResult<TestId> {
        let room = report
            .room_mut(room_id)
            .ok_or(BuilderError::RoomNotFound { room_id })?;
        let mut id = TestId::new();
        while room.test(id).is_some() {
            id = TestId::new();
        }
        let index = next_index(room, data.kind());
        let outcome = evaluate(&data, &room.context(), self.criteria);
        room.tests.push(TestInstance {
            id,
            index,
            data,
            outcome,
        });
        touch(report);
        tracing::debug!(room_id = %room_id, test_id = %id, index, "added test");
        Ok(id)
    }

    pub fn update_test(
        &self,
        report: &mut Report,
        room_id: RoomId,
        test_id: TestId,
        data: TestData,
    ) -> BuilderResult<()> {
        let room = report
            .room_mut(room_id)
            .ok_or(BuilderError::RoomNotFound { room_id })?;
        let context = room.context();
        let kind_changed = room
            .test(test_id)
            .map(|t| t.kind() != data.kind())
            .ok_or(BuilderError::TestNotFound { room_id, test_id })?;
        let new_index = kind_changed.then(|| next_index(room, data.kind()));

        let test = room
            .tests
            .iter_mut()
            .find(|t| t.id == test_id)
            .ok_or(BuilderError::TestNotFound { room_id, test_id })?;
        if let Some(index) = new_index {
            test.index = index;
        }
        test.outcome = evaluate(&data, &context, self.criteria);
        test.data = data;
        touch(report);
        Ok(())
    }

    pub fn remove_test(
        &self,
        report: &mut Report,
        room_id: RoomId,
        test_id: TestId,
    ) -> BuilderResult<TestInstance> {
        let room = report
            .room_mut(room_id)
            .ok_or(BuilderError::RoomNotFound { room_id })?;
        let pos = room
            .tests
            .iter()
            .position(|t| t.id == test_id)
            .ok_or(BuilderError::TestNotFound { room_id, test_id })?;
        let test = room.tests.remove(pos);
        touch(report);
        Ok(test)
    }

    /// Recompute every derived value in the report without touching `updated_at`.
    pub fn rederive(&self, report: &mut Report) {
        for room in &mut report.rooms {
            let (area, height) = (room.surface_area_m2, room.height_m);
            room.set_dimensions(area, height);
            self.reevaluate_room(room);
        }
    }

    /// Per-room verdicts under the table's aggregation policy, in document order.
    pub fn room_verdicts(&self, report: &Report) -> Vec<RoomVerdict> {
        report
            .rooms
            .iter()
            .map(|room| {
                room_verdict(
                    room.tests.iter().map(|t| (t.kind(), &t.outcome)),
                    self.criteria.aggregation,
                )
            })
            .collect()
    }

    fn apply_draft(&self, room: &mut Room, draft: RoomDraft) {
        room.room_number = draft.room_number;
        room.name = draft.name;
        room.test_mode = draft.test_mode;
        room.flow_type = draft.flow_type;
        room.room_class = draft.room_class;
        room.set_dimensions(draft.surface_area_m2, draft.height_m);
        self.reevaluate_room(room);
    }

    fn reevaluate_room(&self, room: &mut Room) {
        let context = room.context();
        for test in &mut room.tests {
            test.outcome = evaluate(&test.data, &context, self.criteria);
        }
    }
}

fn next_index(room: &Room, kind: TestKind) -> u32 {
    room.tests_of_kind(kind).map(|t| t.index).max().unwrap_or(0) + 1
}

fn touch(report: &mut Report) {
    report.updated_at = later(Utc::now(), report.updated_at);
}

fn later(a: DateTime<Utc>, b: DateTime<Utc>) -> DateTime<Utc> {
    if a > b { a } else { b }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hq_criteria::{AirChangeRate, AirflowData, Derived, PressureData};

    fn info() -> ReportInfo {
        ReportInfo {
            hospital_name: "City Hospital".to_string(),
            report_number: "HV-001".to_string(),
            measurement_date: chrono::NaiveDate::from_ymd_opt(2026, 3, 14),
            tester_name: "A. Tester".to_string(),
            ..Default::default()
        }
    }

    fn operating_room() -> RoomDraft {
        RoomDraft {
            room_number: "OR-1".to_string(),
            name: "Operating room 1".to_string(),
            surface_area_m2: 20.0,
            height_m: 3.0,
            room_class: RoomClass::ClassIb,
            ..Default::default()
        }
    }

    fn airflow(flow: f64, units: u32) -> TestData {
        TestData::Airflow(AirflowData {
            point: "ceiling".to_string(),
            air_speed_mps: 0.0,
            filter_width_m: 0.0,
            filter_length_m: 0.0,
            flow_rate_m3h: Some(flow),
            filter_units: units,
        })
    }

    fn pressure(area: &str, pa: f64) -> TestData {
        TestData::PressureDifference(PressureData {
            reference_area: area.to_string(),
            pressure_pa: pa,
        })
    }

    #[test]
    fn room_volume_follows_dimensions() {
        let table = CriteriaTable::default();
        let editor = ReportEditor::new(&table);
        let mut report = editor.create_report(info());
        let room_id = editor.add_room(&mut report, operating_room());
        assert_eq!(report.room(room_id).unwrap().volume_m3(), 60.0);

        editor
            .set_room_dimensions(&mut report, room_id, 25.0, 3.2)
            .unwrap();
        assert_eq!(report.room(room_id).unwrap().volume_m3(), 25.0 * 3.2);
        assert_eq!(report.room(room_id).unwrap().display_volume(), 80.0);
    }

    #[test]
    fn negative_dimensions_are_clamped() {
        let table = CriteriaTable::default();
        let editor = ReportEditor::new(&table);
        let mut report = editor.create_report(info());
        let mut draft = operating_room();
        draft.surface_area_m2 = -5.0;
        let room_id = editor.add_room(&mut report, draft);
        let room = report.room(room_id).unwrap();
        assert_eq!(room.surface_area_m2(), 0.0);
        assert_eq!(room.volume_m3(), 0.0);
    }

    #[test]
    fn resizing_room_reevaluates_airflow() {
        let table = CriteriaTable::default();
        let editor = ReportEditor::new(&table);
        let mut report = editor.create_report(info());
        let room_id = editor.add_room(&mut report, operating_room());
        let test_id = editor
            .add_test(&mut report, room_id, airflow(972.0, 2))
            .unwrap();
        assert!(report.room(room_id).unwrap().test(test_id).unwrap().meets_criteria());

        // 1944 m³/h into 120 m³ = 16.2 ACH, below 20
        editor
            .set_room_dimensions(&mut report, room_id, 40.0, 3.0)
            .unwrap();
        let test = report.room(room_id).unwrap().test(test_id).unwrap();
        assert!(!test.meets_criteria());
        match test.outcome().derived {
            Derived::Airflow(d) => assert_eq!(d.air_change_rate, AirChangeRate::Defined(16.2)),
            other => panic!("unexpected derived {other:?}"),
        }
    }

    #[test]
    fn changing_room_class_reevaluates() {
        let table = CriteriaTable::default();
        let editor = ReportEditor::new(&table);
        let mut report = editor.create_report(info());
        let room_id = editor.add_room(&mut report, operating_room());
        let test_id = editor
            .add_test(&mut report, room_id, airflow(900.0, 1))
            .unwrap();
        assert!(!report.room(room_id).unwrap().test(test_id).unwrap().meets_criteria());

        let mut draft = RoomDraft::from_room(report.room(room_id).unwrap());
        draft.room_class = RoomClass::ClassIi;
        editor.update_room(&mut report, room_id, draft).unwrap();
        assert!(report.room(room_id).unwrap().test(test_id).unwrap().meets_criteria());
    }

    #[test]
    fn indices_are_per_kind_and_tolerate_gaps() {
        let table = CriteriaTable::default();
        let editor = ReportEditor::new(&table);
        let mut report = editor.create_report(info());
        let room_id = editor.add_room(&mut report, operating_room());

        let p1 = editor
            .add_test(&mut report, room_id, pressure("corridor", 8.0))
            .unwrap();
        let p2 = editor
            .add_test(&mut report, room_id, pressure("anteroom", 7.0))
            .unwrap();
        let a1 = editor
            .add_test(&mut report, room_id, airflow(972.0, 2))
            .unwrap();

        let room = report.room(room_id).unwrap();
        assert_eq!(room.test(p1).unwrap().index(), 1);
        assert_eq!(room.test(p2).unwrap().index(), 2);
        assert_eq!(room.test(a1).unwrap().index(), 1);

        editor.remove_test(&mut report, room_id, p1).unwrap();
        let p3 = editor
            .add_test(&mut report, room_id, pressure("storage", 9.0))
            .unwrap();
        let room = report.room(room_id).unwrap();
        assert_eq!(room.test(p2).unwrap().index(), 2);
        assert_eq!(room.test(p3).unwrap().index(), 3);
    }

    #[test]
    fn changing_kind_assigns_fresh_index() {
        let table = CriteriaTable::default();
        let editor = ReportEditor::new(&table);
        let mut report = editor.create_report(info());
        let room_id = editor.add_room(&mut report, operating_room());
        editor
            .add_test(&mut report, room_id, airflow(972.0, 2))
            .unwrap();
        let t = editor
            .add_test(&mut report, room_id, pressure("corridor", 8.0))
            .unwrap();
        editor
            .update_test(&mut report, room_id, t, airflow(500.0, 1))
            .unwrap();
        let test = report.room(room_id).unwrap().test(t).unwrap();
        assert_eq!(test.kind(), TestKind::Airflow);
        assert_eq!(test.index(), 2);
    }

    #[test]
    fn mutations_bump_updated_at() {
        let table = CriteriaTable::default();
        let editor = ReportEditor::new(&table);
        let mut report = editor.create_report(info());
        let before = report.updated_at();
        editor.add_room(&mut report, operating_room());
        assert!(report.updated_at() >= before);
        assert!(report.updated_at() >= report.created_at());
    }

    #[test]
    fn missing_targets_are_errors() {
        let table = CriteriaTable::default();
        let editor = ReportEditor::new(&table);
        let mut report = editor.create_report(info());
        let ghost = RoomId::new();
        assert_eq!(
            editor.add_test(&mut report, ghost, airflow(1.0, 1)),
            Err(BuilderError::RoomNotFound { room_id: ghost })
        );
        let room_id = editor.add_room(&mut report, operating_room());
        let missing = TestId::new();
        assert!(matches!(
            editor.remove_test(&mut report, room_id, missing),
            Err(BuilderError::TestNotFound { .. })
        ));
    }

    #[test]
    fn move_room_reorders() {
        let table = CriteriaTable::default();
        let editor = ReportEditor::new(&table);
        let mut report = editor.create_report(info());
        let a = editor.add_room(&mut report, operating_room());
        let b = editor.add_room(&mut report, operating_room());
        editor.move_room(&mut report, b, 0).unwrap();
        assert_eq!(report.rooms()[0].id(), b);
        assert_eq!(report.rooms()[1].id(), a);
        assert!(matches!(
            editor.move_room(&mut report, a, 5),
            Err(BuilderError::PositionOutOfRange { position: 5, len: 2 })
        ));
    }

    #[test]
    fn pressure_room_verdict_is_and_of_readings() {
        let mut table = CriteriaTable::default();
        table.aggregation = hq_criteria::AggregationPolicy::AnyMustPass;
        let editor = ReportEditor::new(&table);
        let mut report = editor.create_report(info());
        let room_id = editor.add_room(&mut report, operating_room());
        editor
            .add_test(&mut report, room_id, pressure("corridor", 8.0))
            .unwrap();
        editor
            .add_test(&mut report, room_id, pressure("anteroom", 3.0))
            .unwrap();
        let verdicts = editor.room_verdicts(&report);
        assert!(!verdicts[0].meets_criteria);
    }
}
