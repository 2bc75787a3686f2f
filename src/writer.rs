use crate::config::{ExportFormat, ExportParameters, TaskSchedulingType};
use crate::error::{ExportError, ExportResult};
use crate::external_id::{ExternalId, strip_wbs_prefix};
use crate::model::{DayCardStatus, Milestone, NoteEntry, Project, WorkArea};
use crate::project_file::{
    FIELD_ALIAS_CRAFT, ProjectFile, RecordKind, SchedulingFields, StructureFields, TaskHandle,
    TaskRecord,
};
use crate::schedule::{ScheduleCalculator, ScheduleComputation, SchedulingMode, TaskProperties};
use crate::tree::{ExportTree, Node, NodeId, NodeKind, TaskEntry};
use std::collections::BTreeMap;
use tracing::trace;

pub const ROOT_WBS: &str = "0";

/// Walks an [`ExportTree`] depth first and adds one immutable [`TaskRecord`]
/// per node to a [`ProjectFile`].
pub struct NodeWriter<'a> {
    tree: &'a ExportTree,
    calculator: &'a ScheduleCalculator<'a>,
    parameters: &'a ExportParameters,
}

impl<'a> NodeWriter<'a> {
    pub fn new(
        tree: &'a ExportTree,
        calculator: &'a ScheduleCalculator<'a>,
        parameters: &'a ExportParameters,
    ) -> Self {
        Self {
            tree,
            calculator,
            parameters,
        }
    }

    fn format(&self) -> ExportFormat {
        self.parameters.format
    }

    /// Writes the whole tree and returns the external ids of every written node.
    pub fn write_tree(&self, file: &mut ProjectFile) -> ExportResult<Vec<ExternalId>> {
        self.write(file, self.tree.root(), None)
    }

    /// Writes `node` below `parent`, then its children in sibling order. The
    /// node's record is in the file before any child refers to it.
    pub fn write(
        &self,
        file: &mut ProjectFile,
        node: NodeId,
        parent: Option<TaskHandle>,
    ) -> ExportResult<Vec<ExternalId>> {
        let current = self.tree.node(node);
        let mut written = Vec::new();

        let handle = match &current.kind {
            NodeKind::Project(project) => {
                if self.format().has_explicit_root() {
                    Some(file.add_task(self.root_record(project)))
                } else {
                    parent
                }
            }
            NodeKind::WorkArea(Some(work_area)) => {
                let external_id = self.required_external_id(current)?;
                let record = self.work_area_record(file, work_area, external_id, parent);
                written.push(external_id.clone());
                Some(file.add_task(record))
            }
            NodeKind::WorkArea(None) => {
                return Err(ExportError::structural(format!(
                    "{current} was referenced as a parent but never added"
                )));
            }
            NodeKind::Task(entry) => {
                let external_id = self.required_external_id(current)?;
                let record = self.task_record(file, entry, external_id, parent);
                written.push(external_id.clone());
                Some(file.add_task(record))
            }
            NodeKind::Milestone(milestone) => {
                let external_id = self.required_external_id(current)?;
                let record = self.milestone_record(file, milestone, external_id, parent);
                written.push(external_id.clone());
                Some(file.add_task(record))
            }
        };
        trace!(node = %current, "wrote node");

        for child in self.tree.sorted_children(node) {
            written.extend(self.write(file, child, handle)?);
        }
        Ok(written)
    }

    fn required_external_id<'n>(&self, node: &'n Node) -> ExportResult<&'n ExternalId> {
        node.external_id
            .as_ref()
            .ok_or_else(|| ExportError::structural(format!("{node} has no external id")))
    }

    fn root_record(&self, project: &Project) -> TaskRecord {
        TaskRecord {
            kind: RecordKind::Root,
            name: project.title.clone(),
            notes: None,
            percent_complete: None,
            created_date: None,
            custom_text: BTreeMap::new(),
            structure: StructureFields {
                guid: None,
                unique_id: 0,
                file_id: 0,
                wbs: ROOT_WBS.to_string(),
                activity_id: None,
                outline_level: 0,
                parent: None,
            },
            scheduling: SchedulingFields::default(),
        }
    }

    fn work_area_record(
        &self,
        file: &ProjectFile,
        work_area: &WorkArea,
        external_id: &ExternalId,
        parent: Option<TaskHandle>,
    ) -> TaskRecord {
        TaskRecord {
            kind: RecordKind::Summary,
            name: work_area.name.clone(),
            notes: None,
            percent_complete: None,
            created_date: None,
            custom_text: BTreeMap::new(),
            structure: structure_fields(file, external_id, parent),
            scheduling: SchedulingFields::default(),
        }
    }

    fn task_record(
        &self,
        file: &ProjectFile,
        entry: &TaskEntry,
        external_id: &ExternalId,
        parent: Option<TaskHandle>,
    ) -> TaskRecord {
        let task = &entry.task;
        let (properties, computation) = self
            .calculator
            .compute_task(task, self.parameters.task_scheduling_type);
        let scheduling = if self.format().honours_task_mode() {
            ms_project_scheduling(&computation)
        } else {
            p6_scheduling(
                &computation,
                self.parameters.task_scheduling_type == TaskSchedulingType::ManuallyScheduled,
                properties.is_not_started(),
                is_finished_by_status_or_day_cards(&properties, entry),
            )
        };

        TaskRecord {
            kind: RecordKind::Task,
            name: task.name.clone(),
            notes: join_notes(task.description.as_deref(), &entry.notes),
            percent_complete: Some(properties.percent_complete()),
            created_date: task.created_date,
            custom_text: craft_field(file, task.craft.as_deref()),
            structure: structure_fields(file, external_id, parent),
            scheduling,
        }
    }

    fn milestone_record(
        &self,
        file: &ProjectFile,
        milestone: &Milestone,
        external_id: &ExternalId,
        parent: Option<TaskHandle>,
    ) -> TaskRecord {
        let computation = self
            .calculator
            .compute_milestone(milestone.date, self.parameters.milestone_scheduling_type);
        let scheduling = if self.format().honours_task_mode() {
            ms_project_scheduling(&computation)
        } else {
            p6_scheduling(
                &computation,
                computation.scheduling_mode == SchedulingMode::ManuallyScheduled,
                true,
                false,
            )
        };

        TaskRecord {
            kind: RecordKind::Milestone,
            name: milestone.name.clone(),
            notes: join_notes(milestone.description.as_deref(), &[]),
            percent_complete: None,
            created_date: milestone.created_date,
            custom_text: craft_field(file, milestone.craft.as_deref()),
            structure: structure_fields(file, external_id, parent),
            scheduling,
        }
    }
}

fn structure_fields(
    file: &ProjectFile,
    external_id: &ExternalId,
    parent: Option<TaskHandle>,
) -> StructureFields {
    let wbs = external_id
        .wbs
        .as_deref()
        .and_then(strip_wbs_prefix)
        .map(str::to_string)
        .unwrap_or_else(|| generate_wbs(file, parent));
    let activity_id = external_id
        .activity_id
        .as_deref()
        .and_then(strip_wbs_prefix)
        .map(str::to_string)
        .unwrap_or_else(|| wbs.clone());
    let outline_level = parent
        .map(|parent| file.task(parent).structure.outline_level + 1)
        .unwrap_or(1);

    StructureFields {
        guid: external_id.guid,
        unique_id: external_id.unique_id,
        file_id: external_id.file_id,
        wbs,
        activity_id: Some(activity_id),
        outline_level,
        parent,
    }
}

/// WBS of the next child of `parent`: its one-based position, prefixed by the
/// parent's WBS unless the parent is the root.
pub fn generate_wbs(file: &ProjectFile, parent: Option<TaskHandle>) -> String {
    let position = file.child_count(parent) + 1;
    let parent_wbs = parent.map(|parent| file.task(parent).structure.wbs.as_str());
    match parent_wbs {
        None | Some(ROOT_WBS) => position.to_string(),
        Some(wbs) => {
            let wbs = wbs.strip_suffix(".0").unwrap_or(wbs);
            format!("{wbs}.{position}")
        }
    }
}

fn craft_field(file: &ProjectFile, craft: Option<&str>) -> BTreeMap<String, String> {
    let mut custom_text = BTreeMap::new();
    if let (Some(craft), Some(field)) = (craft, file.custom_field_by_alias(FIELD_ALIAS_CRAFT)) {
        custom_text.insert(field.field.clone(), craft.to_string());
    }
    custom_text
}

/// Own description first, then the late bound entries, one per line.
pub fn join_notes(description: Option<&str>, notes: &[NoteEntry]) -> Option<String> {
    let lines: Vec<String> = description
        .map(str::to_string)
        .into_iter()
        .chain(notes.iter().map(NoteEntry::display_value))
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn is_finished_by_status_or_day_cards(properties: &TaskProperties, entry: &TaskEntry) -> bool {
    properties.is_finished()
        || (!entry.day_cards.is_empty()
            && entry
                .day_cards
                .iter()
                .all(|card| matches!(card.status, DayCardStatus::Done | DayCardStatus::Approved)))
}

fn ms_project_scheduling(computation: &ScheduleComputation) -> SchedulingFields {
    SchedulingFields {
        start: computation.start,
        finish: computation.finish,
        duration_days: computation.duration_days,
        task_mode: Some(computation.scheduling_mode),
        ..SchedulingFields::default()
    }
}

/// Primavera distinguishes planned and actual dates; the task mode is not written.
fn p6_scheduling(
    computation: &ScheduleComputation,
    manual: bool,
    not_started: bool,
    finished: bool,
) -> SchedulingFields {
    let mut fields = SchedulingFields {
        start: computation.start,
        finish: computation.finish,
        ..SchedulingFields::default()
    };

    let (actual_start, actual_finish) = if manual {
        (true, true)
    } else {
        (!not_started, finished)
    };

    if actual_start {
        fields.actual_start = computation.start;
    } else {
        fields.planned_start = computation.start;
    }
    fields.remaining_early_start = computation.start;

    if actual_finish {
        fields.actual_finish = computation.finish;
        fields.remaining_early_start = None;
        fields.remaining_early_finish = None;
    } else {
        fields.planned_finish = computation.finish;
        fields.remaining_early_finish = computation.finish;
    }

    if fields.actual_start.is_some() && fields.actual_finish.is_some() {
        fields.actual_duration_days = computation.duration_days;
    } else {
        fields.duration_days = computation.duration_days;
    }
    fields
}
