use super::{ExportTree, Node, NodeId, NodeKind, TaskEntry};
use crate::error::{ExportError, ExportResult};
use crate::external_id::{ExternalIdRegistry, ObjectType};
use crate::model::{
    DayCard, Milestone, NoteEntry, Project, Relation, RelationType, Task, WorkArea,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use uuid::Uuid;

/// Builds the export hierarchy from entities that only know their parent id.
///
/// Entities may arrive in any order. A parent that has not been added yet is
/// represented by a placeholder work area whose arena slot is filled in once the
/// real work area shows up.
pub struct TreeBuilder {
    nodes: Vec<Node>,
    root: NodeId,
    work_areas: HashMap<Uuid, NodeId>,
    index: HashMap<Uuid, NodeId>,
    added_work_areas: usize,
    relations: Vec<Relation>,
    registry: ExternalIdRegistry,
}

impl TreeBuilder {
    pub fn new(project: Project, registry: ExternalIdRegistry) -> Self {
        let root = Node {
            identifier: project.id,
            external_id: None,
            children: Vec::new(),
            kind: NodeKind::Project(project),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            work_areas: HashMap::new(),
            index: HashMap::new(),
            added_work_areas: 0,
            relations: Vec::new(),
            registry,
        }
    }

    pub fn registry(&self) -> &ExternalIdRegistry {
        &self.registry
    }

    pub fn add_work_area(&mut self, work_area: WorkArea) -> ExportResult<()> {
        let identifier = work_area.id;
        if self.index.contains_key(&identifier) {
            return Err(ExportError::structural(format!(
                "work area {identifier} added twice"
            )));
        }

        let external_id = self.registry.resolve(ObjectType::WorkArea, identifier);
        let parent = work_area.parent;
        let id = match self.work_areas.get(&identifier).copied() {
            Some(placeholder) => {
                let node = &mut self.nodes[placeholder.0];
                node.kind = NodeKind::WorkArea(Some(work_area));
                node.external_id = Some(external_id);
                placeholder
            }
            None => {
                let id = self.push(Node {
                    identifier,
                    external_id: Some(external_id),
                    children: Vec::new(),
                    kind: NodeKind::WorkArea(Some(work_area)),
                });
                self.work_areas.insert(identifier, id);
                id
            }
        };

        self.index.insert(identifier, id);
        self.added_work_areas += 1;
        self.attach(parent, id);
        Ok(())
    }

    pub fn add_task(
        &mut self,
        task: Task,
        notes: Vec<NoteEntry>,
        day_cards: Vec<DayCard>,
    ) -> ExportResult<()> {
        let identifier = task.id;
        if self.index.contains_key(&identifier) {
            return Err(ExportError::structural(format!(
                "task {identifier} added twice"
            )));
        }

        let external_id = self.registry.resolve(ObjectType::Task, identifier);
        let parent = task.work_area;
        let id = self.push(Node {
            identifier,
            external_id: Some(external_id),
            children: Vec::new(),
            kind: NodeKind::Task(TaskEntry {
                task,
                notes,
                day_cards,
            }),
        });
        self.index.insert(identifier, id);
        self.attach(parent, id);
        Ok(())
    }

    pub fn add_milestone(&mut self, milestone: Milestone) -> ExportResult<()> {
        let identifier = milestone.id;
        if self.index.contains_key(&identifier) {
            return Err(ExportError::structural(format!(
                "milestone {identifier} added twice"
            )));
        }

        let external_id = self.registry.resolve(ObjectType::Milestone, identifier);
        let parent = milestone.work_area;
        let id = self.push(Node {
            identifier,
            external_id: Some(external_id),
            children: Vec::new(),
            kind: NodeKind::Milestone(milestone),
        });
        self.index.insert(identifier, id);
        self.attach(parent, id);
        Ok(())
    }

    pub fn add_relation(&mut self, relation: Relation) -> ExportResult<()> {
        if relation.relation_type != RelationType::FinishToStart {
            return Err(ExportError::InvalidRelation(format!(
                "only finish-to-start relations can be exported, got {:?} from {} to {}",
                relation.relation_type, relation.source.id, relation.target.id
            )));
        }
        self.relations.push(relation);
        Ok(())
    }

    /// Validates the hierarchy and hands it over for writing.
    pub fn build(self) -> ExportResult<ExportTree> {
        self.assert_valid_export_structure()?;
        Ok(ExportTree {
            nodes: self.nodes,
            root: self.root,
            index: self.index,
            relations: self.relations,
            registry: self.registry,
        })
    }

    /// Every added work area must be reachable from the root. A shortfall means a
    /// parent was referenced but never added.
    pub fn assert_valid_export_structure(&self) -> ExportResult<()> {
        let mut reachable = HashSet::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if matches!(node.kind, NodeKind::WorkArea(Some(_))) {
                reachable.insert(id);
            }
            stack.extend(node.children.iter().copied());
        }

        if reachable.len() == self.added_work_areas {
            for id in self.work_areas.values() {
                let node = &self.nodes[id.0];
                if node.is_placeholder() && !node.children.is_empty() {
                    warn!(
                        work_area = %node.identifier,
                        children = node.children.len(),
                        "work area never added, its children are not exported"
                    );
                }
            }
            return Ok(());
        }

        let detached: Vec<String> = self
            .work_areas
            .values()
            .filter(|id| !reachable.contains(*id))
            .map(|id| self.nodes[id.0].to_string())
            .collect();
        Err(ExportError::structural(format!(
            "{} work areas added but {} found in the hierarchy; detached: [{}]",
            self.added_work_areas,
            reachable.len(),
            detached.join(", ")
        )))
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    fn attach(&mut self, parent: Option<Uuid>, child: NodeId) {
        let parent = match parent {
            None => self.root,
            Some(parent) => self.work_area_slot(parent),
        };
        self.nodes[parent.0].children.push(child);
    }

    fn work_area_slot(&mut self, identifier: Uuid) -> NodeId {
        if let Some(id) = self.work_areas.get(&identifier) {
            return *id;
        }
        debug!(work_area = %identifier, "parent not added yet, inserting placeholder");
        let id = self.push(Node {
            identifier,
            external_id: None,
            children: Vec::new(),
            kind: NodeKind::WorkArea(None),
        });
        self.work_areas.insert(identifier, id);
        id
    }
}
