//! Identifier bookkeeping that keeps third-party tools recognising the same
//! entity across repeated file exchanges.

use crate::persistence::PersistenceError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExternalIdType {
    MsProject,
    P6,
}

impl ExternalIdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalIdType::MsProject => "MS_PROJECT",
            ExternalIdType::P6 => "P6",
        }
    }
}

impl FromStr for ExternalIdType {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "MS_PROJECT" => Ok(ExternalIdType::MsProject),
            "P6" => Ok(ExternalIdType::P6),
            other => Err(PersistenceError::InvalidData(format!(
                "invalid id_type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
    WorkArea,
    Task,
    Milestone,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::WorkArea => "WORKAREA",
            ObjectType::Task => "TASK",
            ObjectType::Milestone => "MILESTONE",
        }
    }
}

impl FromStr for ObjectType {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "WORKAREA" => Ok(ObjectType::WorkArea),
            "TASK" => Ok(ObjectType::Task),
            "MILESTONE" => Ok(ObjectType::Milestone),
            other => Err(PersistenceError::InvalidData(format!(
                "invalid object_type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalId {
    pub identifier: Uuid,
    pub project_id: Uuid,
    pub id_type: ExternalIdType,
    pub object_identifier: Uuid,
    pub object_type: ObjectType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<Uuid>,
    pub unique_id: i32,
    pub file_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wbs: Option<String>,
    /// Set on ids allocated during the current export; never persisted.
    #[serde(skip)]
    pub is_new: bool,
}

fn leading_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Some tools prefix WBS values with a project code, so the first digit run
    // counts wherever it starts.
    PATTERN.get_or_init(|| Regex::new(r"[0-9]+").expect("valid WBS pattern"))
}

/// First run of digits in a WBS or activity id, e.g. `PRJ-12.3` and `PRJ.12`
/// both yield 12.
pub fn leading_wbs_number(value: &str) -> Option<u32> {
    leading_number_pattern()
        .find(value)
        .and_then(|number| number.as_str().parse().ok())
}

/// Removes a project-code prefix a third-party tool put in front of a WBS value.
/// Values without any digit are treated as absent.
pub fn strip_wbs_prefix(value: &str) -> Option<&str> {
    value
        .find(|c: char| c.is_ascii_digit())
        .map(|start| &value[start..])
}

/// Hands out external ids for one export of one project in one format.
///
/// Counters are seeded from the persisted snapshot and live only as long as the
/// registry; two concurrent exports of the same project would hand out the same
/// numbers.
pub struct ExternalIdRegistry {
    project_id: Uuid,
    id_type: ExternalIdType,
    original: Vec<ExternalId>,
    ids: HashMap<Uuid, ExternalId>,
    max_unique_id: i32,
    max_file_id: i32,
    max_wbs: u32,
}

impl ExternalIdRegistry {
    pub fn new(project_id: Uuid, id_type: ExternalIdType, existing: Vec<ExternalId>) -> Self {
        let mut original = Vec::with_capacity(existing.len());
        let mut ids = HashMap::with_capacity(existing.len());
        for mut external_id in existing {
            external_id.is_new = false;
            if external_id.project_id != project_id || external_id.id_type != id_type {
                warn!(
                    object = %external_id.object_identifier,
                    id_type = external_id.id_type.as_str(),
                    "ignoring external id of another project or format"
                );
                continue;
            }
            if ids
                .insert(external_id.object_identifier, external_id.clone())
                .is_some()
            {
                warn!(
                    object = %external_id.object_identifier,
                    "duplicate external id in snapshot, keeping the last one"
                );
                original.retain(|id: &ExternalId| {
                    id.object_identifier != external_id.object_identifier
                });
            }
            original.push(external_id);
        }

        let max_unique_id = original.iter().map(|id| id.unique_id).max().unwrap_or(0);
        let max_file_id = original.iter().map(|id| id.file_id).max().unwrap_or(1);
        let max_wbs = original
            .iter()
            .flat_map(|id| [id.activity_id.as_deref(), id.wbs.as_deref()])
            .flatten()
            .filter_map(leading_wbs_number)
            .max()
            .unwrap_or(0);

        debug!(
            %project_id,
            id_type = id_type.as_str(),
            known = original.len(),
            max_unique_id,
            max_file_id,
            max_wbs,
            "seeded external id registry"
        );

        Self {
            project_id,
            id_type,
            original,
            ids,
            max_unique_id,
            max_file_id,
            max_wbs,
        }
    }

    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    pub fn id_type(&self) -> ExternalIdType {
        self.id_type
    }

    /// The persisted snapshot the registry was seeded with.
    pub fn original(&self) -> &[ExternalId] {
        &self.original
    }

    pub fn get(&self, object_identifier: Uuid) -> Option<&ExternalId> {
        self.ids.get(&object_identifier)
    }

    /// Returns the known id for the object or allocates a new one. Known ids are
    /// never renumbered.
    pub fn resolve(&mut self, object_type: ObjectType, object_identifier: Uuid) -> ExternalId {
        if let Some(existing) = self.ids.get(&object_identifier) {
            return existing.clone();
        }

        self.max_unique_id += 1;
        self.max_file_id += 1;
        let wbs = if object_type == ObjectType::WorkArea {
            self.max_wbs += 1;
            Some(self.max_wbs.to_string())
        } else {
            None
        };

        let external_id = ExternalId {
            identifier: Uuid::new_v4(),
            project_id: self.project_id,
            id_type: self.id_type,
            object_identifier,
            object_type,
            guid: Some(object_identifier),
            unique_id: self.max_unique_id,
            file_id: self.max_file_id,
            activity_id: None,
            wbs,
            is_new: true,
        };
        debug!(
            object = %object_identifier,
            object_type = object_type.as_str(),
            unique_id = external_id.unique_id,
            file_id = external_id.file_id,
            "allocated external id"
        );
        self.ids.insert(object_identifier, external_id.clone());
        external_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExternalIdEventKind {
    Created,
    Updated,
    Deleted,
}

impl fmt::Display for ExternalIdEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExternalIdEventKind::Created => "CREATED",
            ExternalIdEventKind::Updated => "UPDATED",
            ExternalIdEventKind::Deleted => "DELETED",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdEvent {
    pub kind: ExternalIdEventKind,
    pub external_id: ExternalId,
}

/// What the persistence layer has to do after a successful export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdChangeSet {
    pub created: Vec<ExternalId>,
    pub updated: Vec<ExternalId>,
    pub deleted: Vec<ExternalId>,
}

impl ExternalIdChangeSet {
    pub fn between(original: &[ExternalId], written: Vec<ExternalId>) -> Self {
        let written_objects: HashSet<Uuid> =
            written.iter().map(|id| id.object_identifier).collect();
        let deleted = original
            .iter()
            .filter(|id| !written_objects.contains(&id.object_identifier))
            .cloned()
            .collect();
        let (created, updated) = written.into_iter().partition(|id| id.is_new);
        Self {
            created,
            updated,
            deleted,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Lifecycle events in the order they are applied: deletions, updates, creations.
    pub fn events(&self) -> Vec<ExternalIdEvent> {
        let deleted = self.deleted.iter().map(|id| (ExternalIdEventKind::Deleted, id));
        let updated = self.updated.iter().map(|id| (ExternalIdEventKind::Updated, id));
        let created = self.created.iter().map(|id| (ExternalIdEventKind::Created, id));
        deleted
            .chain(updated)
            .chain(created)
            .map(|(kind, id)| ExternalIdEvent {
                kind,
                external_id: id.clone(),
            })
            .collect()
    }
}
