use chrono::NaiveDate;
use hq_core::{FlowType, RoomClass, TestMode};
use hq_criteria::*;
use hq_report::*;

fn sample_report(table: &CriteriaTable) -> Report {
    let editor = ReportEditor::new(table);
    let mut report = editor.create_report(ReportInfo {
        hospital_name: "City Hospital".to_string(),
        report_number: "HV-2026-014".to_string(),
        measurement_date: NaiveDate::from_ymd_opt(2026, 3, 14),
        tester_name: "A. Tester".to_string(),
        preparer_name: "B. Preparer".to_string(),
        approver_name: "C. Approver".to_string(),
    });

    let or1 = editor.add_room(
        &mut report,
        RoomDraft {
            room_number: "OR-1".to_string(),
            name: "Operating room 1".to_string(),
            surface_area_m2: 42.5,
            height_m: 3.1,
            test_mode: TestMode::AtRest,
            flow_type: FlowType::Unidirectional,
            room_class: RoomClass::ClassIb,
        },
    );
    editor
        .add_test(
            &mut report,
            or1,
            TestData::Airflow(AirflowData {
                point: "ceiling diffuser".to_string(),
                air_speed_mps: 0.27,
                filter_width_m: 0.61,
                filter_length_m: 1.22,
                flow_rate_m3h: None,
                filter_units: 6,
            }),
        )
        .unwrap();
    editor
        .add_test(
            &mut report,
            or1,
            TestData::ParticleCount(ParticleCountData {
                location: "table".to_string(),
                channels: vec![
                    ParticleChannel {
                        size_um: 0.5,
                        count_per_m3: 1210.0,
                    },
                    ParticleChannel {
                        size_um: 5.0,
                        count_per_m3: 3.0,
                    },
                ],
                target_iso_class: None,
            }),
        )
        .unwrap();
    editor
        .add_test(
            &mut report,
            or1,
            TestData::FlowDirection(FlowDirectionData {
                reference_area: "corridor".to_string(),
                expected: AirDirection::Outward,
                observed: AirDirection::Outward,
            }),
        )
        .unwrap();

    let icu = editor.add_room(
        &mut report,
        RoomDraft {
            room_number: "ICU-3".to_string(),
            name: "Intensive care bay".to_string(),
            surface_area_m2: 0.0,
            height_m: 2.9,
            test_mode: TestMode::InOperation,
            flow_type: FlowType::Turbulent,
            room_class: RoomClass::IntensiveCare,
        },
    );
    editor
        .add_test(
            &mut report,
            icu,
            TestData::Airflow(AirflowData {
                point: "grille".to_string(),
                air_speed_mps: 0.0,
                filter_width_m: 0.0,
                filter_length_m: 0.0,
                flow_rate_m3h: Some(410.0),
                filter_units: 2,
            }),
        )
        .unwrap();
    editor
        .add_test(
            &mut report,
            icu,
            TestData::TemperatureHumidity(TemperatureHumidityData {
                temperature_c: 22.4,
                humidity_percent: 47.0,
            }),
        )
        .unwrap();

    report
}

#[test]
fn json_roundtrip_reproduces_report() {
    let table = CriteriaTable::default();
    let report = sample_report(&table);

    let json = to_json_string(&report).unwrap();
    let loaded = from_json_str(&json).unwrap();

    assert_eq!(report, loaded);
}

#[test]
fn file_roundtrip_reproduces_report() {
    let table = CriteriaTable::default();
    let report = sample_report(&table);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    save_json(&path, &report).unwrap();
    let loaded = load_json(&path).unwrap();

    assert_eq!(report, loaded);
    match loaded.rooms()[1].tests()[0].outcome().derived {
        Derived::Airflow(d) => assert_eq!(d.air_change_rate, AirChangeRate::Undefined),
        other => panic!("unexpected derived {other:?}"),
    }
}

#[test]
fn stale_stored_volume_is_recomputed_on_load() {
    let table = CriteriaTable::default();
    let report = sample_report(&table);

    let mut value: serde_json::Value = serde_json::from_str(&to_json_string(&report).unwrap()).unwrap();
    value["rooms"][0]["volume_m3"] = serde_json::json!(999.0);
    let loaded = from_json_str(&value.to_string()).unwrap();

    assert_eq!(loaded.rooms()[0].volume_m3(), 42.5 * 3.1);
}

#[test]
fn unversioned_report_is_migrated() {
    let table = CriteriaTable::default();
    let report = sample_report(&table);

    let mut value: serde_json::Value = serde_json::from_str(&to_json_string(&report).unwrap()).unwrap();
    value.as_object_mut().unwrap().remove("version");
    let loaded = from_json_str(&value.to_string()).unwrap();

    assert_eq!(loaded.version(), LATEST_VERSION);
}

#[test]
fn newer_version_is_refused() {
    let table = CriteriaTable::default();
    let report = sample_report(&table);

    let mut value: serde_json::Value = serde_json::from_str(&to_json_string(&report).unwrap()).unwrap();
    value["version"] = serde_json::json!(LATEST_VERSION + 8);

    let err = from_json_str(&value.to_string()).unwrap_err();
    assert!(format!("{err}").contains("newer than supported"));
}

#[test]
fn duplicate_room_ids_fail_integrity() {
    let table = CriteriaTable::default();
    let report = sample_report(&table);

    let mut value: serde_json::Value = serde_json::from_str(&to_json_string(&report).unwrap()).unwrap();
    let first_id = value["rooms"][0]["id"].clone();
    value["rooms"][1]["id"] = first_id;

    let err = from_json_str(&value.to_string()).unwrap_err();
    assert!(format!("{err}").contains("Duplicate room id"));
}
