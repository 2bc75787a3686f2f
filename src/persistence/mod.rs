use crate::external_id::{ExternalId, ExternalIdChangeSet, ExternalIdType};
use serde_json::Error as SerdeJsonError;
use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Persisted external ids per project and format.
///
/// `apply` runs once per successful export, after the file bytes exist.
pub trait ExternalIdStore {
    fn find_all(
        &self,
        project_id: Uuid,
        id_type: ExternalIdType,
    ) -> PersistenceResult<Vec<ExternalId>>;

    fn apply(&self, changes: &ExternalIdChangeSet) -> PersistenceResult<()>;
}

/// Rejects snapshots a registry could not be seeded from.
pub fn validate_external_ids(ids: &[ExternalId]) -> PersistenceResult<()> {
    let mut seen_identifiers = HashSet::with_capacity(ids.len());
    let mut seen_objects = HashSet::with_capacity(ids.len());
    for id in ids {
        if id.unique_id < 0 || id.file_id < 0 {
            return Err(PersistenceError::InvalidData(format!(
                "external id {} has negative unique id {} or file id {}",
                id.identifier, id.unique_id, id.file_id
            )));
        }
        if !seen_identifiers.insert(id.identifier) {
            return Err(PersistenceError::InvalidData(format!(
                "duplicate external id {}",
                id.identifier
            )));
        }
        if !seen_objects.insert((id.project_id, id.id_type, id.object_identifier)) {
            return Err(PersistenceError::InvalidData(format!(
                "object {} has more than one {} external id in project {}",
                id.object_identifier,
                id.id_type.as_str(),
                id.project_id
            )));
        }
    }
    Ok(())
}

/// Applies a change set to a map of ids keyed by their own identifier.
pub(crate) fn apply_changes(ids: &mut HashMap<Uuid, ExternalId>, changes: &ExternalIdChangeSet) {
    for deleted in &changes.deleted {
        ids.remove(&deleted.identifier);
    }
    for written in changes.updated.iter().chain(&changes.created) {
        let mut stored = written.clone();
        stored.is_new = false;
        ids.insert(stored.identifier, stored);
    }
}

/// Sorted view used by every store so repeated loads see the same order.
pub(crate) fn sorted(ids: impl IntoIterator<Item = ExternalId>) -> Vec<ExternalId> {
    let mut ids: Vec<ExternalId> = ids.into_iter().collect();
    ids.sort_by_key(|id| (id.unique_id, id.identifier));
    ids
}

#[derive(Default)]
pub struct InMemoryExternalIdStore {
    ids: Mutex<HashMap<Uuid, ExternalId>>,
}

impl InMemoryExternalIdStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(ids: Vec<ExternalId>) -> PersistenceResult<Self> {
        validate_external_ids(&ids)?;
        let ids = ids.into_iter().map(|id| (id.identifier, id)).collect();
        Ok(Self {
            ids: Mutex::new(ids),
        })
    }

    pub fn all(&self) -> Vec<ExternalId> {
        let ids = self.ids.lock().expect("external id store mutex poisoned");
        sorted(ids.values().cloned())
    }
}

impl ExternalIdStore for InMemoryExternalIdStore {
    fn find_all(
        &self,
        project_id: Uuid,
        id_type: ExternalIdType,
    ) -> PersistenceResult<Vec<ExternalId>> {
        let ids = self.ids.lock().expect("external id store mutex poisoned");
        Ok(sorted(
            ids.values()
                .filter(|id| id.project_id == project_id && id.id_type == id_type)
                .cloned(),
        ))
    }

    fn apply(&self, changes: &ExternalIdChangeSet) -> PersistenceResult<()> {
        let mut ids = self.ids.lock().expect("external id store mutex poisoned");
        apply_changes(&mut ids, changes);
        Ok(())
    }
}

#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod file;

pub use file::{
    JsonFileExternalIdStore, load_external_ids_from_csv, load_external_ids_from_json,
    save_external_ids_to_csv, save_external_ids_to_json,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteExternalIdStore;
