use crate::calendar::WorkCalendar;
use crate::config::{ExportFormat, ExportParameters};
use crate::error::ExportResult;
use crate::external_id::{ExternalId, ExternalIdChangeSet, ExternalIdRegistry};
use crate::format::writer_for;
use crate::model::{DayCard, ProjectSnapshot, RelationType};
use crate::persistence::ExternalIdStore;
use crate::project_file::{FIELD_ALIAS_CRAFT, FIELD_TEXT1, ProjectFile, ProjectProperties};
use crate::relation::RelationLinker;
use crate::schedule::{ScheduleCalculator, working_afternoon_end, working_morning_start};
use crate::tree::{ExportTree, TreeBuilder};
use crate::writer::NodeWriter;
use chrono::{Local, NaiveDate};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

/// Result of one export: the file and what the id store has to persist.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub bytes: Vec<u8>,
    pub format: ExportFormat,
    pub changes: ExternalIdChangeSet,
    /// `(source, target)` of every relation that made it into the file.
    pub linked_relations: Vec<(Uuid, Uuid)>,
}

pub struct ProjectExporter {
    parameters: ExportParameters,
    today: NaiveDate,
}

impl ProjectExporter {
    pub fn new(parameters: ExportParameters) -> Self {
        Self {
            parameters,
            today: Local::now().date_naive(),
        }
    }

    /// Reference date for the "started in the past" rule.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn parameters(&self) -> &ExportParameters {
        &self.parameters
    }

    /// Exports the snapshot. Nothing is persisted; the caller stores
    /// `changes` once the bytes are safe.
    pub fn export(
        &self,
        snapshot: &ProjectSnapshot,
        existing_ids: Vec<ExternalId>,
    ) -> ExportResult<ExportOutput> {
        let format = self.parameters.format;
        let project = &snapshot.project;
        let config = snapshot.workday_configuration.as_ref();
        let calendar = WorkCalendar::from_optional_config(config);
        let allow_work_on_non_working_days =
            config.is_some_and(|config| config.allow_work_on_non_working_days);

        let registry = ExternalIdRegistry::new(project.id, format.external_id_type(), existing_ids);
        let tree = self.build_tree(snapshot, registry)?;

        let mut file = ProjectFile::new(
            ProjectProperties {
                title: project.title.clone(),
                author: project.author.clone(),
                planned_start: project.start.and_time(working_morning_start()),
                scheduled_finish: project.end.and_time(working_afternoon_end()),
                format,
            },
            calendar.clone(),
        );
        file.register_custom_field(FIELD_TEXT1, FIELD_ALIAS_CRAFT);

        let calculator =
            ScheduleCalculator::new(&calendar, allow_work_on_non_working_days, self.today);
        let written = NodeWriter::new(&tree, &calculator, &self.parameters).write_tree(&mut file)?;
        let linked_relations = RelationLinker::new(&tree).link(&mut file);
        let changes = ExternalIdChangeSet::between(tree.registry().original(), written);
        let bytes = writer_for(format).write(&file)?;

        info!(
            project = %project.id,
            format = %format,
            records = file.task_count(),
            relations = linked_relations.len(),
            created = changes.created.len(),
            updated = changes.updated.len(),
            deleted = changes.deleted.len(),
            "exported project"
        );

        Ok(ExportOutput {
            bytes,
            format,
            changes,
            linked_relations,
        })
    }

    /// Loads the persisted ids, exports and stores the change set. The store is
    /// only touched after the file has been produced.
    pub fn export_with_store<S: ExternalIdStore + ?Sized>(
        &self,
        snapshot: &ProjectSnapshot,
        store: &S,
    ) -> ExportResult<ExportOutput> {
        let existing = store.find_all(
            snapshot.project.id,
            self.parameters.format.external_id_type(),
        )?;
        let output = self.export(snapshot, existing)?;
        store.apply(&output.changes)?;
        Ok(output)
    }

    fn build_tree(
        &self,
        snapshot: &ProjectSnapshot,
        registry: ExternalIdRegistry,
    ) -> ExportResult<ExportTree> {
        let mut builder = TreeBuilder::new(snapshot.project.clone(), registry);

        for work_area in &snapshot.work_areas {
            builder.add_work_area(work_area.clone())?;
        }

        let mut day_cards: HashMap<Uuid, Vec<DayCard>> = HashMap::new();
        for day_card in &snapshot.day_cards {
            day_cards
                .entry(day_card.task)
                .or_default()
                .push(day_card.clone());
        }
        for task in &snapshot.tasks {
            let notes = if self.parameters.include_comments {
                snapshot.notes.get(&task.id).cloned().unwrap_or_default()
            } else {
                Vec::new()
            };
            let cards = day_cards.remove(&task.id).unwrap_or_default();
            builder.add_task(task.clone(), notes, cards)?;
        }

        if self.parameters.include_milestones {
            for milestone in &snapshot.milestones {
                builder.add_milestone(milestone.clone())?;
            }
        }

        for relation in &snapshot.relations {
            if relation.relation_type != RelationType::FinishToStart {
                continue;
            }
            if !self.parameters.include_milestones && relation.involves_milestone() {
                debug!(
                    source = %relation.source.id,
                    target = %relation.target.id,
                    "skipping milestone relation, milestones are not exported"
                );
                continue;
            }
            builder.add_relation(*relation)?;
        }

        builder.build()
    }
}
