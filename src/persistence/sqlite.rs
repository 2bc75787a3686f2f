use super::{ExternalIdStore, PersistenceResult, sorted, validate_external_ids};
use crate::external_id::{ExternalId, ExternalIdChangeSet, ExternalIdType};
use rusqlite::{Connection, Transaction, params};
use std::sync::Mutex;
use uuid::Uuid;

pub struct SqliteExternalIdStore {
    connection: Mutex<Connection>,
}

impl SqliteExternalIdStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS external_ids (
                identifier TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                id_type TEXT NOT NULL,
                object_identifier TEXT NOT NULL,
                external_id_json TEXT NOT NULL,
                UNIQUE (project_id, id_type, object_identifier)
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn delete(&self, tx: &Transaction, ids: &[ExternalId]) -> PersistenceResult<()> {
        let mut stmt = tx.prepare("DELETE FROM external_ids WHERE identifier = ?1")?;
        for id in ids {
            stmt.execute(params![id.identifier.to_string()])?;
        }
        Ok(())
    }

    fn upsert(&self, tx: &Transaction, ids: &[ExternalId]) -> PersistenceResult<()> {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO external_ids \
             (identifier, project_id, id_type, object_identifier, external_id_json) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for id in ids {
            let json = serde_json::to_string(id)?;
            stmt.execute(params![
                id.identifier.to_string(),
                id.project_id.to_string(),
                id.id_type.as_str(),
                id.object_identifier.to_string(),
                json
            ])?;
        }
        Ok(())
    }
}

impl ExternalIdStore for SqliteExternalIdStore {
    fn find_all(
        &self,
        project_id: Uuid,
        id_type: ExternalIdType,
    ) -> PersistenceResult<Vec<ExternalId>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT external_id_json FROM external_ids WHERE project_id = ?1 AND id_type = ?2",
        )?;
        let rows = stmt.query_map(params![project_id.to_string(), id_type.as_str()], |row| {
            row.get::<_, String>(0)
        })?;

        let mut ids = Vec::new();
        for json in rows {
            let json = json?;
            let id: ExternalId = serde_json::from_str(&json)?;
            ids.push(id);
        }

        validate_external_ids(&ids)?;
        Ok(sorted(ids))
    }

    fn apply(&self, changes: &ExternalIdChangeSet) -> PersistenceResult<()> {
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        self.delete(&tx, &changes.deleted)?;
        self.upsert(&tx, &changes.updated)?;
        self.upsert(&tx, &changes.created)?;
        tx.commit()?;
        Ok(())
    }
}
