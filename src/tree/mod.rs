//! Hierarchy of an export: project, nested work areas and their tasks and
//! milestones, held in an arena and addressed by [`NodeId`].

pub mod builder;

pub use builder::TreeBuilder;

use crate::external_id::{ExternalId, ExternalIdRegistry};
use crate::model::{DayCard, Milestone, NoteEntry, Project, Relation, Task, WorkArea};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskEntry {
    pub task: Task,
    pub notes: Vec<NoteEntry>,
    pub day_cards: Vec<DayCard>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Project(Project),
    /// `None` while the work area is only known as the parent of another node.
    WorkArea(Option<WorkArea>),
    Task(TaskEntry),
    Milestone(Milestone),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub identifier: Uuid,
    pub external_id: Option<ExternalId>,
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, NodeKind::WorkArea(None))
    }

    pub fn name(&self) -> &str {
        match &self.kind {
            NodeKind::Project(project) => &project.title,
            NodeKind::WorkArea(work_area) => work_area
                .as_ref()
                .map(|work_area| work_area.name.as_str())
                .unwrap_or_default(),
            NodeKind::Task(entry) => &entry.task.name,
            NodeKind::Milestone(milestone) => &milestone.name,
        }
    }

    /// Own start date; work areas derive theirs from their children when written.
    pub fn start_date(&self) -> Option<NaiveDate> {
        match &self.kind {
            NodeKind::Project(project) => Some(project.start),
            NodeKind::WorkArea(_) => None,
            NodeKind::Task(entry) => entry.task.start,
            NodeKind::Milestone(milestone) => Some(milestone.date),
        }
    }

    pub fn finish_date(&self) -> Option<NaiveDate> {
        match &self.kind {
            NodeKind::Project(project) => Some(project.end),
            NodeKind::WorkArea(_) => None,
            NodeKind::Task(entry) => entry.task.end,
            NodeKind::Milestone(milestone) => Some(milestone.date),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            NodeKind::Project(_) => "ProjectNode",
            NodeKind::WorkArea(None) => "PlaceholderNode",
            NodeKind::WorkArea(Some(_)) => "WorkAreaNode",
            NodeKind::Task(_) => "TaskNode",
            NodeKind::Milestone(_) => "MilestoneNode",
        };
        write!(f, "{kind}(identifier={}, name={})", self.identifier, self.name())
    }
}

/// A validated tree ready to be written. Owns the registry its ids came from.
pub struct ExportTree {
    nodes: Vec<Node>,
    root: NodeId,
    index: HashMap<Uuid, NodeId>,
    relations: Vec<Relation>,
    registry: ExternalIdRegistry,
}

impl ExportTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Node of a work area, task or milestone by its domain identifier.
    pub fn find(&self, identifier: Uuid) -> Option<&Node> {
        self.index.get(&identifier).map(|id| self.node(*id))
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn registry(&self) -> &ExternalIdRegistry {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children in write order: file id, start date, milestones before tasks, name.
    pub fn sorted_children(&self, id: NodeId) -> Vec<NodeId> {
        let mut children = self.node(id).children.clone();
        children.sort_by(|a, b| compare_siblings(self.node(*a), self.node(*b)));
        children
    }

    /// Indented outline of the tree in write order.
    pub fn outline(&self) -> String {
        let mut lines = Vec::new();
        self.outline_into(self.root, 0, &mut lines);
        lines.join("\n")
    }

    fn outline_into(&self, id: NodeId, indent: usize, lines: &mut Vec<String>) {
        lines.push(format!("{}{}", " ".repeat(indent), self.node(id)));
        for child in self.sorted_children(id) {
            self.outline_into(child, indent + 2, lines);
        }
    }
}

fn compare_siblings(a: &Node, b: &Node) -> Ordering {
    fn file_id(node: &Node) -> Option<i32> {
        node.external_id.as_ref().map(|id| id.file_id)
    }

    fn kind_rank(node: &Node) -> u8 {
        match node.kind {
            NodeKind::Milestone(_) => 0,
            NodeKind::Task(_) => 1,
            NodeKind::Project(_) | NodeKind::WorkArea(_) => 2,
        }
    }

    none_last(file_id(a), file_id(b))
        .then_with(|| none_last(a.start_date(), b.start_date()))
        .then_with(|| kind_rank(a).cmp(&kind_rank(b)))
        .then_with(|| a.name().cmp(b.name()))
}

fn none_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
