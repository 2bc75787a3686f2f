use schedule_export::config::{
    ExportFormat, MilestoneSchedulingType, TaskSchedulingType, load_export_parameters,
    load_workday_configuration,
};
use schedule_export::external_id::{
    ExternalId, ExternalIdChangeSet, ExternalIdType, ObjectType,
};
use schedule_export::persistence::{
    ExternalIdStore, InMemoryExternalIdStore, JsonFileExternalIdStore, PersistenceError,
    load_external_ids_from_csv, load_external_ids_from_json, save_external_ids_to_csv,
    save_external_ids_to_json,
};
use std::io::Write;
use tempfile::{NamedTempFile, tempdir};
use uuid::Uuid;

fn external_id(project_id: Uuid, object_type: ObjectType, unique_id: i32) -> ExternalId {
    let object_identifier = Uuid::new_v4();
    ExternalId {
        identifier: Uuid::new_v4(),
        project_id,
        id_type: ExternalIdType::MsProject,
        object_identifier,
        object_type,
        guid: Some(object_identifier),
        unique_id,
        file_id: unique_id + 1,
        activity_id: None,
        wbs: None,
        is_new: false,
    }
}

fn sample_ids() -> Vec<ExternalId> {
    let project_id = Uuid::new_v4();
    let mut area = external_id(project_id, ObjectType::WorkArea, 1);
    area.wbs = Some("PRJ-1".into());
    area.activity_id = Some("A1".into());
    let mut task = external_id(project_id, ObjectType::Task, 2);
    task.guid = None;
    vec![area, task]
}

#[test]
fn json_round_trip_preserves_all_fields() {
    let ids = sample_ids();
    let file = NamedTempFile::new().unwrap();

    save_external_ids_to_json(&ids, file.path()).unwrap();
    let loaded = load_external_ids_from_json(file.path()).unwrap();

    assert_eq!(loaded, ids);
}

#[test]
fn csv_round_trip_preserves_optional_fields() {
    let ids = sample_ids();
    let file = NamedTempFile::new().unwrap();

    save_external_ids_to_csv(&ids, file.path()).unwrap();
    let loaded = load_external_ids_from_csv(file.path()).unwrap();

    assert_eq!(loaded, ids);
    assert_eq!(loaded[0].wbs.as_deref(), Some("PRJ-1"));
    assert_eq!(loaded[1].guid, None);
    assert_eq!(loaded[1].wbs, None);
}

#[test]
fn csv_with_unknown_id_type_is_invalid() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "identifier,project_id,id_type,object_identifier,object_type,guid,unique_id,file_id,activity_id,wbs"
    )
    .unwrap();
    writeln!(
        file,
        "{},{},ASTA,{},TASK,,1,2,,",
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4()
    )
    .unwrap();

    let err = load_external_ids_from_csv(file.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn duplicate_objects_are_rejected() {
    let mut ids = sample_ids();
    let mut duplicate = ids[1].clone();
    duplicate.identifier = Uuid::new_v4();
    ids.push(duplicate);

    let err = InMemoryExternalIdStore::with_ids(ids).err().unwrap();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn in_memory_store_applies_change_sets() {
    let ids = sample_ids();
    let project_id = ids[0].project_id;
    let store = InMemoryExternalIdStore::with_ids(ids.clone()).unwrap();

    let mut created = external_id(project_id, ObjectType::Milestone, 3);
    created.is_new = true;
    let changes = ExternalIdChangeSet {
        created: vec![created.clone()],
        updated: vec![ids[0].clone()],
        deleted: vec![ids[1].clone()],
    };
    store.apply(&changes).unwrap();

    let stored = store.find_all(project_id, ExternalIdType::MsProject).unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0], ids[0]);
    assert_eq!(stored[1].identifier, created.identifier);
    assert!(!stored[1].is_new);
    assert!(store
        .find_all(project_id, ExternalIdType::P6)
        .unwrap()
        .is_empty());
}

#[test]
fn json_file_store_starts_empty_and_persists_changes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("external_ids.json");
    let store = JsonFileExternalIdStore::new(&path);
    let ids = sample_ids();
    let project_id = ids[0].project_id;

    assert!(store
        .find_all(project_id, ExternalIdType::MsProject)
        .unwrap()
        .is_empty());

    store
        .apply(&ExternalIdChangeSet {
            created: ids.clone(),
            ..ExternalIdChangeSet::default()
        })
        .unwrap();

    let reopened = JsonFileExternalIdStore::new(&path);
    assert_eq!(
        reopened.find_all(project_id, ExternalIdType::MsProject).unwrap(),
        ids
    );
}

#[test]
fn configuration_files_load_with_defaults() {
    let mut parameters = NamedTempFile::new().unwrap();
    write!(parameters, r#"{{"format": "PRIMAVERA_P6_XML"}}"#).unwrap();
    let loaded = load_export_parameters(parameters.path()).unwrap();
    assert_eq!(loaded.format, ExportFormat::PrimaveraP6Xml);
    assert!(!loaded.include_milestones);
    assert_eq!(loaded.task_scheduling_type, TaskSchedulingType::AutoScheduled);
    assert_eq!(
        loaded.milestone_scheduling_type,
        MilestoneSchedulingType::ManuallyScheduled
    );

    let mut workdays = NamedTempFile::new().unwrap();
    write!(
        workdays,
        r#"{{"start_of_week": "Mon", "working_days": ["Mon", "Tue"], "holidays": [{{"name": "Founders day", "date": "2025-05-02"}}]}}"#
    )
    .unwrap();
    let config = load_workday_configuration(workdays.path()).unwrap();
    assert_eq!(config.working_days.len(), 2);
    assert_eq!(config.holidays[0].name, "Founders day");
    assert!(!config.allow_work_on_non_working_days);
}

#[test]
fn missing_configuration_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let err = load_export_parameters(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, PersistenceError::Io(_)));
}
