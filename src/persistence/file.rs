use super::{
    ExternalIdStore, PersistenceError, PersistenceResult, apply_changes, sorted,
    validate_external_ids,
};
use crate::external_id::{ExternalId, ExternalIdChangeSet, ExternalIdType, ObjectType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Serialize, Deserialize)]
struct ExternalIdSnapshot {
    external_ids: Vec<ExternalId>,
}

pub fn save_external_ids_to_json<P: AsRef<Path>>(
    ids: &[ExternalId],
    path: P,
) -> PersistenceResult<()> {
    validate_external_ids(ids)?;
    let snapshot = ExternalIdSnapshot {
        external_ids: ids.to_vec(),
    };
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_external_ids_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<ExternalId>> {
    let file = File::open(path)?;
    let snapshot: ExternalIdSnapshot = serde_json::from_reader(file)?;
    validate_external_ids(&snapshot.external_ids)?;
    Ok(snapshot.external_ids)
}

/// External ids kept in one JSON file, rewritten on every applied change set.
pub struct JsonFileExternalIdStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileExternalIdStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> PersistenceResult<Vec<ExternalId>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        load_external_ids_from_json(&self.path)
    }
}

impl ExternalIdStore for JsonFileExternalIdStore {
    fn find_all(
        &self,
        project_id: Uuid,
        id_type: ExternalIdType,
    ) -> PersistenceResult<Vec<ExternalId>> {
        let _guard = self.lock.lock().expect("json store mutex poisoned");
        Ok(self
            .load()?
            .into_iter()
            .filter(|id| id.project_id == project_id && id.id_type == id_type)
            .collect())
    }

    fn apply(&self, changes: &ExternalIdChangeSet) -> PersistenceResult<()> {
        let _guard = self.lock.lock().expect("json store mutex poisoned");
        let mut ids: HashMap<Uuid, ExternalId> = self
            .load()?
            .into_iter()
            .map(|id| (id.identifier, id))
            .collect();
        apply_changes(&mut ids, changes);
        save_external_ids_to_json(&sorted(ids.into_values()), &self.path)
    }
}

#[derive(Serialize, Deserialize)]
struct ExternalIdCsvRecord {
    identifier: String,
    project_id: String,
    id_type: String,
    object_identifier: String,
    object_type: String,
    guid: String,
    unique_id: i32,
    file_id: i32,
    activity_id: String,
    wbs: String,
}

impl From<&ExternalId> for ExternalIdCsvRecord {
    fn from(id: &ExternalId) -> Self {
        Self {
            identifier: id.identifier.to_string(),
            project_id: id.project_id.to_string(),
            id_type: id.id_type.as_str().to_string(),
            object_identifier: id.object_identifier.to_string(),
            object_type: id.object_type.as_str().to_string(),
            guid: id.guid.map(|guid| guid.to_string()).unwrap_or_default(),
            unique_id: id.unique_id,
            file_id: id.file_id,
            activity_id: id.activity_id.clone().unwrap_or_default(),
            wbs: id.wbs.clone().unwrap_or_default(),
        }
    }
}

impl ExternalIdCsvRecord {
    fn into_external_id(self) -> PersistenceResult<ExternalId> {
        Ok(ExternalId {
            identifier: parse_uuid(&self.identifier)?,
            project_id: parse_uuid(&self.project_id)?,
            id_type: self.id_type.parse::<ExternalIdType>()?,
            object_identifier: parse_uuid(&self.object_identifier)?,
            object_type: self.object_type.parse::<ObjectType>()?,
            guid: parse_optional_uuid(&self.guid)?,
            unique_id: self.unique_id,
            file_id: self.file_id,
            activity_id: parse_string_option(self.activity_id),
            wbs: parse_string_option(self.wbs),
            is_new: false,
        })
    }
}

pub fn save_external_ids_to_csv<P: AsRef<Path>>(
    ids: &[ExternalId],
    path: P,
) -> PersistenceResult<()> {
    validate_external_ids(ids)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for id in ids {
        writer.serialize(ExternalIdCsvRecord::from(id))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_external_ids_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<ExternalId>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut ids = Vec::new();
    for record in reader.deserialize::<ExternalIdCsvRecord>() {
        ids.push(record?.into_external_id()?);
    }
    validate_external_ids(&ids)?;
    Ok(ids)
}

fn parse_uuid(input: &str) -> PersistenceResult<Uuid> {
    Uuid::parse_str(input.trim())
        .map_err(|e| PersistenceError::InvalidData(format!("invalid uuid '{input}': {e}")))
}

fn parse_optional_uuid(input: &str) -> PersistenceResult<Option<Uuid>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    parse_uuid(input).map(Some)
}

fn parse_string_option(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
