#![cfg(feature = "sqlite")]

use chrono::NaiveDate;
use schedule_export::config::{ExportFormat, ExportParameters};
use schedule_export::external_id::{ExternalIdChangeSet, ExternalIdType};
use schedule_export::model::{Project, ProjectSnapshot, Task, TaskStatus, WorkArea};
use schedule_export::persistence::{ExternalIdStore, SqliteExternalIdStore};
use schedule_export::ProjectExporter;
use tempfile::NamedTempFile;
use uuid::Uuid;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn snapshot() -> ProjectSnapshot {
    let project = Project {
        id: Uuid::new_v4(),
        title: "SQLite Project".into(),
        start: d(2025, 1, 6),
        end: d(2025, 2, 28),
        author: None,
    };
    let area = WorkArea::new(Uuid::new_v4(), "Basement", None);
    let mut task = Task::new(Uuid::new_v4(), "Waterproofing", TaskStatus::Open);
    task.work_area = Some(area.id);
    task.start = Some(d(2025, 1, 13));
    task.end = Some(d(2025, 1, 17));

    let mut snapshot = ProjectSnapshot::new(project);
    snapshot.work_areas.push(area);
    snapshot.tasks.push(task);
    snapshot
}

#[test]
fn sqlite_store_survives_reopening() {
    let file = NamedTempFile::new().unwrap();
    let snapshot = snapshot();
    let exporter = ProjectExporter::new(ExportParameters::new(ExportFormat::PrimaveraP6Xml))
        .with_today(d(2025, 1, 10));

    {
        let store = SqliteExternalIdStore::new(file.path()).expect("open store");
        let output = exporter
            .export_with_store(&snapshot, &store)
            .expect("first export");
        assert_eq!(output.changes.created.len(), 2);
    }

    let store = SqliteExternalIdStore::new(file.path()).expect("reopen store");
    let stored = store
        .find_all(snapshot.project.id, ExternalIdType::P6)
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|id| !id.is_new));
    assert!(store
        .find_all(snapshot.project.id, ExternalIdType::MsProject)
        .unwrap()
        .is_empty());

    let output = exporter
        .export_with_store(&snapshot, &store)
        .expect("second export");
    assert!(output.changes.created.is_empty());
    assert_eq!(output.changes.updated.len(), 2);
}

#[test]
fn deletions_are_applied_in_one_transaction() {
    let store = SqliteExternalIdStore::in_memory().unwrap();
    let mut snapshot = snapshot();
    let exporter = ProjectExporter::new(ExportParameters::new(ExportFormat::MsProjectXml))
        .with_today(d(2025, 1, 10));
    exporter.export_with_store(&snapshot, &store).unwrap();

    snapshot.tasks.clear();
    let output = exporter.export_with_store(&snapshot, &store).unwrap();
    assert_eq!(output.changes.deleted.len(), 1);

    let stored = store
        .find_all(snapshot.project.id, ExternalIdType::MsProject)
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].object_identifier, snapshot.work_areas[0].id);

    store.apply(&ExternalIdChangeSet::default()).unwrap();
    assert_eq!(
        store
            .find_all(snapshot.project.id, ExternalIdType::MsProject)
            .unwrap()
            .len(),
        1
    );
}
