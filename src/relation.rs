use crate::model::RelationType;
use crate::project_file::{ProjectFile, TaskHandle};
use crate::tree::ExportTree;
use tracing::debug;
use uuid::Uuid;

/// Links the finish-to-start relations of an [`ExportTree`] between records
/// already in the file.
///
/// Runs after the tree write. An endpoint is found through its node's external
/// id: by GUID, or by unique id when the id carries no GUID. Relations with an
/// endpoint that was never written are dropped.
pub struct RelationLinker<'a> {
    tree: &'a ExportTree,
}

impl<'a> RelationLinker<'a> {
    pub fn new(tree: &'a ExportTree) -> Self {
        Self { tree }
    }

    /// Returns the `(source, target)` pairs that made it into the file.
    pub fn link(&self, file: &mut ProjectFile) -> Vec<(Uuid, Uuid)> {
        let mut linked = Vec::new();
        for relation in self.tree.relations() {
            if relation.relation_type != RelationType::FinishToStart {
                debug!(?relation, "skipping relation that is not finish-to-start");
                continue;
            }
            let source = self.written_record(file, relation.source.id);
            let target = self.written_record(file, relation.target.id);
            match (source, target) {
                (Some(predecessor), Some(successor)) => {
                    file.add_relation(predecessor, successor);
                    linked.push((relation.source.id, relation.target.id));
                }
                _ => debug!(
                    source = %relation.source.id,
                    target = %relation.target.id,
                    "dropping relation with an endpoint outside the exported tree"
                ),
            }
        }
        linked
    }

    fn written_record(&self, file: &ProjectFile, object: Uuid) -> Option<TaskHandle> {
        let external_id = self.tree.find(object)?.external_id.as_ref()?;
        match external_id.guid {
            Some(guid) => file.task_by_guid(guid),
            None => file.task_by_unique_id(external_id.unique_id),
        }
    }
}
