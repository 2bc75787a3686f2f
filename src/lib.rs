//! Export engine turning a project snapshot into MS Project or Primavera P6
//! XML while keeping third-party identifiers stable between exports.

pub mod calendar;
pub mod config;
pub mod error;
pub mod export;
pub mod external_id;
pub mod format;
pub mod logging;
pub mod model;
pub mod persistence;
pub mod project_file;
pub mod relation;
pub mod schedule;
pub mod tree;
pub mod writer;

pub use calendar::WorkCalendar;
pub use config::{
    ExportFormat, ExportParameters, Holiday, MilestoneSchedulingType, TaskSchedulingType,
    WorkdayConfiguration, load_export_parameters, load_workday_configuration,
};
pub use error::{ExportError, ExportResult};
pub use export::{ExportOutput, ProjectExporter};
pub use external_id::{
    ExternalId, ExternalIdChangeSet, ExternalIdEvent, ExternalIdEventKind, ExternalIdRegistry,
    ExternalIdType, ObjectType,
};
pub use persistence::{ExternalIdStore, InMemoryExternalIdStore, PersistenceError};
pub use project_file::{ProjectFile, TaskHandle, TaskRecord};
pub use relation::RelationLinker;
pub use schedule::{ScheduleCalculator, ScheduleComputation, SchedulingMode};
pub use tree::{ExportTree, NodeId, NodeKind, TreeBuilder};
pub use writer::NodeWriter;
