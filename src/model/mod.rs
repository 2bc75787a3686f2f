//! Read-only view of the project entities an export works on. Loading them is
//! the caller's business; the engine only consumes them.

pub mod notes;

pub use notes::NoteEntry;

use crate::config::WorkdayConfiguration;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkArea {
    pub id: Uuid,
    pub name: String,
    /// Parent work area; `None` for top-level work areas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Uuid>,
}

impl WorkArea {
    pub fn new(id: Uuid, name: impl Into<String>, parent: Option<Uuid>) -> Self {
        Self {
            id,
            name: name.into(),
            parent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Draft,
    Open,
    Started,
    Closed,
    Accepted,
}

/// Coarse progress bucket derived from [`TaskStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatusClass {
    NotStarted,
    InProgress,
    Finished,
}

impl TaskStatus {
    pub fn class(&self) -> TaskStatusClass {
        match self {
            TaskStatus::Draft | TaskStatus::Open => TaskStatusClass::NotStarted,
            TaskStatus::Started => TaskStatusClass::InProgress,
            TaskStatus::Closed | TaskStatus::Accepted => TaskStatusClass::Finished,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_area: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub craft: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<NaiveDateTime>,
}

impl Task {
    pub fn new(id: Uuid, name: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            status,
            work_area: None,
            craft: None,
            start: None,
            end: None,
            created_date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub craft: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_area: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<NaiveDateTime>,
}

impl Milestone {
    pub fn new(id: Uuid, name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id,
            name: name.into(),
            date,
            description: None,
            craft: None,
            work_area: None,
            created_date: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayCardStatus {
    Open,
    NotDone,
    Done,
    Approved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayCard {
    pub id: Uuid,
    pub task: Uuid,
    pub status: DayCardStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    FinishToStart,
    PartOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationElementType {
    Task,
    Milestone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationElement {
    pub id: Uuid,
    pub element_type: RelationElementType,
}

impl RelationElement {
    pub fn task(id: Uuid) -> Self {
        Self {
            id,
            element_type: RelationElementType::Task,
        }
    }

    pub fn milestone(id: Uuid) -> Self {
        Self {
            id,
            element_type: RelationElementType::Milestone,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub relation_type: RelationType,
    pub source: RelationElement,
    pub target: RelationElement,
}

impl Relation {
    pub fn finish_to_start(source: RelationElement, target: RelationElement) -> Self {
        Self {
            relation_type: RelationType::FinishToStart,
            source,
            target,
        }
    }

    pub fn involves_milestone(&self) -> bool {
        self.source.element_type == RelationElementType::Milestone
            || self.target.element_type == RelationElementType::Milestone
    }
}

/// Everything one export reads, loaded up front before the tree is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub project: Project,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workday_configuration: Option<WorkdayConfiguration>,
    #[serde(default)]
    pub work_areas: Vec<WorkArea>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub day_cards: Vec<DayCard>,
    /// Topic and message text keyed by task id.
    #[serde(default)]
    pub notes: HashMap<Uuid, Vec<NoteEntry>>,
}

impl ProjectSnapshot {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            workday_configuration: None,
            work_areas: Vec::new(),
            tasks: Vec::new(),
            milestones: Vec::new(),
            relations: Vec::new(),
            day_cards: Vec::new(),
            notes: HashMap::new(),
        }
    }
}
