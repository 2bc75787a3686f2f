use chrono::{NaiveDate, Weekday};
use schedule_export::config::{ExportFormat, ExportParameters, WorkdayConfiguration};
use schedule_export::error::ExportError;
use schedule_export::external_id::{ExternalId, ObjectType};
use schedule_export::model::{
    Milestone, Project, ProjectSnapshot, Relation, RelationElement, Task, TaskStatus, WorkArea,
    NoteEntry,
};
use schedule_export::persistence::{ExternalIdStore, InMemoryExternalIdStore};
use schedule_export::{ExternalIdType, ProjectExporter, logging};
use std::str::FromStr;
use uuid::Uuid;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    d(2025, 1, 15)
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8(bytes.to_vec()).unwrap()
}

struct Fixture {
    snapshot: ProjectSnapshot,
    area: WorkArea,
    task: Task,
    milestone: Milestone,
}

fn fixture() -> Fixture {
    let project = Project {
        id: Uuid::new_v4(),
        title: "Office & Retail".into(),
        start: d(2025, 1, 6),
        end: d(2025, 3, 28),
        author: Some("Planner".into()),
    };
    let area = WorkArea::new(Uuid::new_v4(), "Ground floor", None);
    let mut task = Task::new(Uuid::new_v4(), "Screed", TaskStatus::Draft);
    task.work_area = Some(area.id);
    task.start = Some(d(2025, 1, 20));
    task.end = Some(d(2025, 1, 24));
    task.craft = Some("Flooring".into());
    let mut milestone = Milestone::new(Uuid::new_v4(), "Dry", d(2025, 1, 31));
    milestone.work_area = Some(area.id);

    let mut snapshot = ProjectSnapshot::new(project);
    snapshot.work_areas.push(area.clone());
    snapshot.tasks.push(task.clone());
    snapshot.milestones.push(milestone.clone());
    snapshot.relations.push(Relation::finish_to_start(
        RelationElement::task(task.id),
        RelationElement::milestone(milestone.id),
    ));
    Fixture {
        snapshot,
        area,
        task,
        milestone,
    }
}

#[test]
fn first_export_of_one_work_area_and_one_draft_task() {
    logging::init_test();
    let fixture = fixture();
    let exporter =
        ProjectExporter::new(ExportParameters::new(ExportFormat::MsProjectXml)).with_today(today());

    let output = exporter.export(&fixture.snapshot, Vec::new()).unwrap();

    assert_eq!(output.format, ExportFormat::MsProjectXml);
    assert!(output.changes.updated.is_empty());
    assert!(output.changes.deleted.is_empty());
    assert_eq!(output.changes.created.len(), 3);

    let area_id = output
        .changes
        .created
        .iter()
        .find(|id| id.object_identifier == fixture.area.id)
        .unwrap();
    assert_eq!(area_id.wbs.as_deref(), Some("1"));
    assert_eq!(area_id.object_type, ObjectType::WorkArea);
    assert_eq!(area_id.id_type, ExternalIdType::MsProject);

    let task_id = output
        .changes
        .created
        .iter()
        .find(|id| id.object_identifier == fixture.task.id)
        .unwrap();
    assert_eq!(task_id.file_id, 3);

    let xml = text(&output.bytes);
    assert!(xml.contains("<Name>Office &amp; Retail</Name>"));
    assert!(xml.contains("<UID>0</UID>"));
    assert!(xml.contains("<WBS>0</WBS>"));
    assert!(xml.contains("<WBS>1.1</WBS>"));
    assert!(xml.contains("<PercentComplete>0</PercentComplete>"));
    assert!(xml.contains("<Manual>0</Manual>"));
    assert!(xml.contains("<Alias>Discipline</Alias>"));
    assert!(xml.contains("<Value>Flooring</Value>"));
    assert!(xml.contains("<Duration>PT40H0M0S</Duration>"));
    assert!(xml.contains("<PredecessorLink>"));
    assert_eq!(output.linked_relations, vec![(fixture.task.id, fixture.milestone.id)]);
}

#[test]
fn re_export_keeps_every_identifier() {
    let fixture = fixture();
    let store = InMemoryExternalIdStore::new();
    let exporter =
        ProjectExporter::new(ExportParameters::new(ExportFormat::MsProjectXml)).with_today(today());

    let first = exporter.export_with_store(&fixture.snapshot, &store).unwrap();
    let after_first = store.all();
    let second = exporter.export_with_store(&fixture.snapshot, &store).unwrap();

    assert_eq!(first.changes.created.len(), 3);
    assert!(second.changes.created.is_empty());
    assert!(second.changes.deleted.is_empty());
    assert_eq!(second.changes.updated.len(), 3);
    assert_eq!(store.all(), after_first);
    assert_eq!(first.bytes, second.bytes);
}

#[test]
fn removed_entities_are_deleted_and_new_ones_continue_the_counters() {
    let fixture = fixture();
    let store = InMemoryExternalIdStore::new();
    let exporter =
        ProjectExporter::new(ExportParameters::new(ExportFormat::MsProjectXml)).with_today(today());
    exporter.export_with_store(&fixture.snapshot, &store).unwrap();

    let mut snapshot = fixture.snapshot.clone();
    snapshot.milestones.clear();
    let mut extra = Task::new(Uuid::new_v4(), "Tiles", TaskStatus::Open);
    extra.work_area = Some(fixture.area.id);
    snapshot.tasks.push(extra.clone());

    let output = exporter.export_with_store(&snapshot, &store).unwrap();

    assert_eq!(output.changes.deleted.len(), 1);
    assert_eq!(output.changes.deleted[0].object_identifier, fixture.milestone.id);
    assert_eq!(output.changes.created.len(), 1);
    assert_eq!(output.changes.created[0].unique_id, 4);
    assert_eq!(output.changes.created[0].file_id, 5);
    assert!(output.linked_relations.is_empty());

    let stored = store
        .find_all(snapshot.project.id, ExternalIdType::MsProject)
        .unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|id| !id.is_new));
}

#[test]
fn primavera_export_has_no_root_task() {
    let fixture = fixture();
    let exporter = ProjectExporter::new(ExportParameters::new(ExportFormat::PrimaveraP6Xml))
        .with_today(today());

    let output = exporter.export(&fixture.snapshot, Vec::new()).unwrap();
    let xml = text(&output.bytes);

    assert!(xml.contains("<APIBusinessObjects"));
    assert!(!xml.contains("<ObjectId>0</ObjectId>"));
    assert!(xml.contains("<Code>1</Code>"));
    assert!(xml.contains("<Type>Finish to Start</Type>"));
    assert!(xml.contains("<Title>Discipline</Title>"));
    assert!(xml.contains("<TextValue>Flooring</TextValue>"));
    assert!(xml.contains("<PlannedStartDate>2025-01-20T08:00:00</PlannedStartDate>"));
    assert!(output
        .changes
        .created
        .iter()
        .all(|id| id.id_type == ExternalIdType::P6));
}

#[test]
fn milestones_and_their_relations_can_be_left_out() {
    let fixture = fixture();
    let mut parameters = ExportParameters::new(ExportFormat::MsProjectXml);
    parameters.include_milestones = false;
    let exporter = ProjectExporter::new(parameters).with_today(today());

    let output = exporter.export(&fixture.snapshot, Vec::new()).unwrap();

    assert_eq!(output.changes.created.len(), 2);
    assert!(output.linked_relations.is_empty());
    assert!(!text(&output.bytes).contains("<Name>Dry</Name>"));
}

#[test]
fn comments_are_only_exported_on_request() {
    let mut fixture = fixture();
    fixture.snapshot.notes.insert(
        fixture.task.id,
        vec![NoteEntry::description("Check moisture first")],
    );

    let exporter =
        ProjectExporter::new(ExportParameters::new(ExportFormat::MsProjectXml)).with_today(today());
    let without = exporter.export(&fixture.snapshot, Vec::new()).unwrap();
    assert!(!text(&without.bytes).contains("Check moisture first"));

    let mut parameters = ExportParameters::new(ExportFormat::MsProjectXml);
    parameters.include_comments = true;
    let exporter = ProjectExporter::new(parameters).with_today(today());
    let with = exporter.export(&fixture.snapshot, Vec::new()).unwrap();
    assert!(text(&with.bytes).contains("<Notes>Check moisture first</Notes>"));
}

#[test]
fn workday_configuration_drives_the_calendar() {
    let mut fixture = fixture();
    fixture.snapshot.workday_configuration = Some(WorkdayConfiguration {
        start_of_week: Weekday::Sun,
        working_days: vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu],
        holidays: Vec::new(),
        allow_work_on_non_working_days: false,
    });
    let exporter =
        ProjectExporter::new(ExportParameters::new(ExportFormat::MsProjectXml)).with_today(today());

    let xml = text(&exporter.export(&fixture.snapshot, Vec::new()).unwrap().bytes);

    assert!(xml.contains("<WeekStartDay>0</WeekStartDay>"));
    // Friday is off, so the finish moves to the following Monday
    assert!(xml.contains("<Duration>PT40H0M0S</Duration>"));
}

#[test]
fn unknown_format_names_are_rejected() {
    assert_eq!(
        ExportFormat::from_str("mspdi").unwrap(),
        ExportFormat::MsProjectXml
    );
    assert_eq!(
        ExportFormat::from_str("Primavera-P6").unwrap(),
        ExportFormat::PrimaveraP6Xml
    );
    assert!(matches!(
        ExportFormat::from_str("asta"),
        Err(ExportError::UnsupportedFormat(name)) if name == "asta"
    ));
}

#[test]
fn ids_from_another_format_do_not_leak_into_the_export() {
    let fixture = fixture();
    let store = InMemoryExternalIdStore::new();
    ProjectExporter::new(ExportParameters::new(ExportFormat::PrimaveraP6Xml))
        .with_today(today())
        .export_with_store(&fixture.snapshot, &store)
        .unwrap();

    let output = ProjectExporter::new(ExportParameters::new(ExportFormat::MsProjectXml))
        .with_today(today())
        .export_with_store(&fixture.snapshot, &store)
        .unwrap();

    assert_eq!(output.changes.created.len(), 3);
    assert!(output.changes.deleted.is_empty());
    assert_eq!(store.all().len(), 6);
}

#[test]
fn relations_survive_guids_assigned_by_another_tool() {
    let fixture = fixture();
    let imported_guid = Uuid::new_v4();
    let existing = vec![ExternalId {
        identifier: Uuid::new_v4(),
        project_id: fixture.snapshot.project.id,
        id_type: ExternalIdType::MsProject,
        object_identifier: fixture.task.id,
        object_type: ObjectType::Task,
        guid: Some(imported_guid),
        unique_id: 12,
        file_id: 14,
        activity_id: None,
        wbs: None,
        is_new: false,
    }];
    let exporter =
        ProjectExporter::new(ExportParameters::new(ExportFormat::MsProjectXml)).with_today(today());

    let output = exporter.export(&fixture.snapshot, existing).unwrap();

    assert_eq!(output.linked_relations, vec![(fixture.task.id, fixture.milestone.id)]);
    let xml = text(&output.bytes);
    assert!(xml.contains(&format!("<GUID>{imported_guid}</GUID>")));
    assert_eq!(xml.matches("<PredecessorLink>").count(), 1);
    assert!(xml.contains("<PredecessorUID>12</PredecessorUID>"));
}
