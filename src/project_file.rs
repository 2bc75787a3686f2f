//! Format independent project file: the records a format writer serializes.

use crate::calendar::WorkCalendar;
use crate::config::ExportFormat;
use crate::model::RelationType;
use crate::schedule::SchedulingMode;
use chrono::NaiveDateTime;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

pub const FIELD_TEXT1: &str = "Text1";
pub const FIELD_ALIAS_CRAFT: &str = "Discipline";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(NodeIndex);

impl TaskHandle {
    pub fn index(&self) -> usize {
        self.0.index()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectProperties {
    pub title: String,
    pub author: Option<String>,
    pub planned_start: NaiveDateTime,
    pub scheduled_finish: NaiveDateTime,
    pub format: ExportFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomField {
    pub field: String,
    pub alias: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Hidden container MS Project expects above every other task.
    Root,
    Summary,
    Task,
    Milestone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureFields {
    pub guid: Option<Uuid>,
    pub unique_id: i32,
    pub file_id: i32,
    pub wbs: String,
    pub activity_id: Option<String>,
    pub outline_level: u32,
    pub parent: Option<TaskHandle>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulingFields {
    pub start: Option<NaiveDateTime>,
    pub finish: Option<NaiveDateTime>,
    pub duration_days: Option<i64>,
    pub task_mode: Option<SchedulingMode>,
    pub planned_start: Option<NaiveDateTime>,
    pub planned_finish: Option<NaiveDateTime>,
    pub actual_start: Option<NaiveDateTime>,
    pub actual_finish: Option<NaiveDateTime>,
    pub remaining_early_start: Option<NaiveDateTime>,
    pub remaining_early_finish: Option<NaiveDateTime>,
    pub actual_duration_days: Option<i64>,
}

/// One fully built task of the project file. Records are immutable once added.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub kind: RecordKind,
    pub name: String,
    pub notes: Option<String>,
    pub percent_complete: Option<u8>,
    pub created_date: Option<NaiveDateTime>,
    /// Values of registered custom fields keyed by field name.
    pub custom_text: BTreeMap<String, String>,
    pub structure: StructureFields,
    pub scheduling: SchedulingFields,
}

impl TaskRecord {
    pub fn is_summary(&self) -> bool {
        matches!(self.kind, RecordKind::Root | RecordKind::Summary)
    }
}

pub struct ProjectFile {
    properties: ProjectProperties,
    calendar: WorkCalendar,
    custom_fields: Vec<CustomField>,
    graph: DiGraph<TaskRecord, RelationType>,
    by_guid: HashMap<Uuid, TaskHandle>,
    by_unique_id: HashMap<i32, TaskHandle>,
}

impl ProjectFile {
    pub fn new(properties: ProjectProperties, calendar: WorkCalendar) -> Self {
        Self {
            properties,
            calendar,
            custom_fields: Vec::new(),
            graph: DiGraph::new(),
            by_guid: HashMap::new(),
            by_unique_id: HashMap::new(),
        }
    }

    pub fn properties(&self) -> &ProjectProperties {
        &self.properties
    }

    pub fn calendar(&self) -> &WorkCalendar {
        &self.calendar
    }

    pub fn register_custom_field(&mut self, field: impl Into<String>, alias: impl Into<String>) {
        let field = field.into();
        let alias = alias.into();
        match self.custom_fields.iter_mut().find(|f| f.field == field) {
            Some(existing) => existing.alias = alias,
            None => self.custom_fields.push(CustomField { field, alias }),
        }
    }

    pub fn custom_fields(&self) -> &[CustomField] {
        &self.custom_fields
    }

    pub fn custom_field_by_alias(&self, alias: &str) -> Option<&CustomField> {
        self.custom_fields.iter().find(|field| field.alias == alias)
    }

    pub fn add_task(&mut self, record: TaskRecord) -> TaskHandle {
        let guid = record.structure.guid;
        let unique_id = record.structure.unique_id;
        let handle = TaskHandle(self.graph.add_node(record));
        if let Some(guid) = guid {
            self.by_guid.insert(guid, handle);
        }
        self.by_unique_id.insert(unique_id, handle);
        handle
    }

    pub fn task(&self, handle: TaskHandle) -> &TaskRecord {
        &self.graph[handle.0]
    }

    pub fn task_by_guid(&self, guid: Uuid) -> Option<TaskHandle> {
        self.by_guid.get(&guid).copied()
    }

    pub fn task_by_unique_id(&self, unique_id: i32) -> Option<TaskHandle> {
        self.by_unique_id.get(&unique_id).copied()
    }

    /// All records in insertion order, which is depth first write order.
    pub fn tasks(&self) -> impl Iterator<Item = (TaskHandle, &TaskRecord)> {
        self.graph
            .node_indices()
            .map(move |index| (TaskHandle(index), &self.graph[index]))
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn child_tasks(&self, parent: Option<TaskHandle>) -> Vec<TaskHandle> {
        self.tasks()
            .filter(|(_, record)| record.structure.parent == parent)
            .map(|(handle, _)| handle)
            .collect()
    }

    pub fn child_count(&self, parent: Option<TaskHandle>) -> usize {
        self.tasks()
            .filter(|(_, record)| record.structure.parent == parent)
            .count()
    }

    /// Adds a finish-to-start link; the edge serves as predecessor entry of
    /// the successor and successor entry of the predecessor.
    pub fn add_relation(&mut self, predecessor: TaskHandle, successor: TaskHandle) {
        if self.graph.find_edge(predecessor.0, successor.0).is_none() {
            self.graph
                .add_edge(predecessor.0, successor.0, RelationType::FinishToStart);
        }
    }

    pub fn predecessors(&self, handle: TaskHandle) -> Vec<TaskHandle> {
        self.linked(handle, Direction::Incoming)
    }

    pub fn successors(&self, handle: TaskHandle) -> Vec<TaskHandle> {
        self.linked(handle, Direction::Outgoing)
    }

    pub fn relations(&self) -> Vec<(TaskHandle, TaskHandle)> {
        let mut relations: Vec<(TaskHandle, TaskHandle)> = self
            .graph
            .edge_indices()
            .filter_map(|edge| self.graph.edge_endpoints(edge))
            .map(|(source, target)| (TaskHandle(source), TaskHandle(target)))
            .collect();
        relations.sort();
        relations
    }

    /// Earliest start and latest finish below a summary record, or the record's
    /// own dates for leaves.
    pub fn span(&self, handle: TaskHandle) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
        let record = self.task(handle);
        if !record.is_summary() {
            return (record.scheduling.start, record.scheduling.finish);
        }
        let mut start: Option<NaiveDateTime> = None;
        let mut finish: Option<NaiveDateTime> = None;
        for child in self.child_tasks(Some(handle)) {
            let (child_start, child_finish) = self.span(child);
            start = match (start, child_start) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
            finish = match (finish, child_finish) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
        }
        (start, finish)
    }

    fn linked(&self, handle: TaskHandle, direction: Direction) -> Vec<TaskHandle> {
        let mut linked: Vec<TaskHandle> = self
            .graph
            .neighbors_directed(handle.0, direction)
            .map(TaskHandle)
            .collect();
        linked.sort();
        linked
    }
}
