use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use hq_core::{DocumentFormat, RoomClass};
use hq_criteria::{CriteriaTable, NoiseData, TestData};
use hq_report::{Report, ReportEditor, ReportInfo, RoomDraft};
use hq_store::*;

fn report(number: &str) -> Report {
    let table = CriteriaTable::default();
    let editor = ReportEditor::new(&table);
    let mut report = editor.create_report(ReportInfo {
        hospital_name: "City Hospital".to_string(),
        report_number: number.to_string(),
        measurement_date: NaiveDate::from_ymd_opt(2026, 5, 2),
        tester_name: "A. Tester".to_string(),
        ..ReportInfo::default()
    });
    let room = editor.add_room(
        &mut report,
        RoomDraft {
            room_number: "101".to_string(),
            name: "Recovery".to_string(),
            surface_area_m2: 18.0,
            height_m: 2.8,
            room_class: RoomClass::Other,
            ..RoomDraft::default()
        },
    );
    editor
        .add_test(&mut report, room, TestData::Noise(NoiseData { level_dba: 44.0 }))
        .unwrap();
    report
}

fn record(name: &str) -> ReportFileRecord {
    ReportFileRecord {
        file_name: name.to_string(),
        created_at: Utc::now(),
        size_bytes: 3,
        sha256: artifact_digest(b"abc"),
    }
}

#[test]
fn save_get_and_delete_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsBlobStore::open(dir.path()).unwrap());
    let repo = BlobReportRepository::new(store.clone());

    let first = report("HV-1");
    let second = report("HV-2");
    repo.save(&first).unwrap();
    repo.save(&second).unwrap();

    let all = repo.get_all().unwrap();
    assert_eq!(all, vec![first.clone(), second.clone()]);
    assert_eq!(repo.get_by_id(second.id()).unwrap(), Some(second.clone()));
    assert!(dir.path().join("hvac-reports.json").is_file());

    // A fresh repository over the same directory sees the same state.
    let reopened = BlobReportRepository::new(Arc::new(FsBlobStore::open(dir.path()).unwrap()));
    assert_eq!(reopened.get_all().unwrap().len(), 2);

    assert!(repo.delete(first.id()).unwrap());
    assert!(!repo.delete(first.id()).unwrap());
    assert_eq!(repo.get_all().unwrap(), vec![second]);
}

#[test]
fn saving_existing_report_replaces_in_place() {
    let repo = BlobReportRepository::new(Arc::new(MemoryBlobStore::new()));
    let table = CriteriaTable::default();
    let editor = ReportEditor::new(&table);

    let mut first = report("HV-1");
    let second = report("HV-2");
    repo.save(&first).unwrap();
    repo.save(&second).unwrap();

    let mut info = first.info().clone();
    info.approver_name = "C. Approver".to_string();
    editor.update_info(&mut first, info);
    repo.save(&first).unwrap();

    let all = repo.get_all().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id(), first.id());
    assert_eq!(all[0].info().approver_name, "C. Approver");
}

#[test]
fn corrupt_report_blob_is_discarded() {
    let store = Arc::new(MemoryBlobStore::new());
    store.put(REPORTS_KEY, "{ not json").unwrap();
    let repo = BlobReportRepository::new(store.clone());

    assert!(repo.get_all().unwrap().is_empty());
    assert_eq!(store.get(REPORTS_KEY).unwrap(), None);

    let fresh = report("HV-3");
    repo.save(&fresh).unwrap();
    assert_eq!(repo.get_all().unwrap(), vec![fresh]);
}

#[test]
fn unreadable_entry_is_skipped() {
    let store = Arc::new(MemoryBlobStore::new());
    let good = report("HV-4");
    let content = format!(
        "[{}, {{\"id\": \"not-a-uuid\"}}]",
        serde_json::to_string(&good).unwrap()
    );
    store.put(REPORTS_KEY, &content).unwrap();

    let repo = BlobReportRepository::new(store);
    assert_eq!(repo.get_all().unwrap(), vec![good]);
}

#[test]
fn non_utf8_report_blob_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hvac-reports.json"), [0xff, 0xfe, 0x00, 0x80]).unwrap();
    let repo = BlobReportRepository::new(Arc::new(FsBlobStore::open(dir.path()).unwrap()));

    assert!(repo.get_all().unwrap().is_empty());
    assert!(!dir.path().join("hvac-reports.json").exists());

    let fresh = report("HV-8");
    repo.save(&fresh).unwrap();
    assert_eq!(repo.get_all().unwrap(), vec![fresh]);
}

#[test]
fn non_utf8_file_index_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hvac-report-files.json"), [0xc3, 0x28]).unwrap();
    let index = ReportFileIndex::new(Arc::new(FsBlobStore::open(dir.path()).unwrap()));

    assert!(index.all().unwrap().is_empty());
    let id = report("HV-9").id();
    index.record(id, DocumentFormat::Pdf, record("r.pdf")).unwrap();
    assert!(index.get(id).unwrap().pdf.is_some());
}

#[test]
fn unreadable_entries_survive_saves_and_deletes_of_others() {
    let store = Arc::new(MemoryBlobStore::new());
    let mut future = serde_json::to_value(report("HV-10")).unwrap();
    future["version"] = serde_json::json!(9);
    store
        .put(REPORTS_KEY, &serde_json::to_string(&vec![future.clone()]).unwrap())
        .unwrap();
    let repo = BlobReportRepository::new(store.clone());
    assert!(repo.get_all().unwrap().is_empty());

    let other = report("HV-11");
    repo.save(&other).unwrap();
    assert!(repo.delete(other.id()).unwrap());
    repo.save(&report("HV-12")).unwrap();

    let raw: Vec<serde_json::Value> =
        serde_json::from_str(&store.get(REPORTS_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(raw.len(), 2);
    assert_eq!(raw[0], future);
}

#[test]
fn file_index_keeps_latest_record_per_format() {
    let store = Arc::new(MemoryBlobStore::new());
    let index = ReportFileIndex::new(store.clone());
    let a = report("HV-5");
    let b = report("HV-6");

    index.record(a.id(), DocumentFormat::Pdf, record("a-1.pdf")).unwrap();
    index.record(a.id(), DocumentFormat::Pdf, record("a-2.pdf")).unwrap();
    index.record(a.id(), DocumentFormat::Excel, record("a.csv")).unwrap();
    index.record(b.id(), DocumentFormat::Pdf, record("b.pdf")).unwrap();

    let files = index.get(a.id()).unwrap();
    assert_eq!(files.get(DocumentFormat::Pdf).unwrap().file_name, "a-2.pdf");
    assert_eq!(files.get(DocumentFormat::Excel).unwrap().file_name, "a.csv");
    assert_eq!(index.all().unwrap().len(), 2);

    let removed = index.remove(a.id()).unwrap();
    assert!(!removed.is_empty());
    assert!(index.get(a.id()).unwrap().is_empty());
    assert!(index.get(b.id()).unwrap().pdf.is_some());
}

#[test]
fn file_index_serializes_as_object_keyed_by_report_id() {
    let store = Arc::new(MemoryBlobStore::new());
    let index = ReportFileIndex::new(store.clone());
    let a = report("HV-7");
    index.record(a.id(), DocumentFormat::Excel, record("a.csv")).unwrap();

    let raw = store.get(FILES_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &value[a.id().to_string()];
    assert_eq!(entry["excel"]["file_name"], "a.csv");
    assert!(entry.get("pdf").is_none());
}

#[test]
fn corrupt_file_index_is_discarded() {
    let store = Arc::new(MemoryBlobStore::new());
    store.put(FILES_KEY, "[1, 2").unwrap();
    let index = ReportFileIndex::new(store.clone());

    assert!(index.all().unwrap().is_empty());
    assert_eq!(store.get(FILES_KEY).unwrap(), None);
}

#[test]
fn concurrent_records_for_different_reports_all_land() {
    let store = Arc::new(MemoryBlobStore::new());
    let index = Arc::new(ReportFileIndex::new(store));
    let ids: Vec<_> = (0..8).map(|i| report(&format!("HV-{i}")).id()).collect();

    let handles: Vec<_> = ids
        .iter()
        .map(|&id| {
            let index = index.clone();
            std::thread::spawn(move || {
                index.record(id, DocumentFormat::Pdf, record("r.pdf")).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(index.all().unwrap().len(), ids.len());
}
