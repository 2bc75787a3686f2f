use crate::error::ExportError;
use crate::external_id::ExternalIdType;
use crate::persistence::PersistenceResult;
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

/// Target file formats. The set is closed; anything else is rejected before an
/// export starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportFormat {
    MsProjectXml,
    PrimaveraP6Xml,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::MsProjectXml => "MS_PROJECT_XML",
            ExportFormat::PrimaveraP6Xml => "PRIMAVERA_P6_XML",
        }
    }

    pub fn external_id_type(&self) -> ExternalIdType {
        match self {
            ExportFormat::MsProjectXml => ExternalIdType::MsProject,
            ExportFormat::PrimaveraP6Xml => ExternalIdType::P6,
        }
    }

    /// MS Project hangs every element below a hidden root task with id 0.
    pub fn has_explicit_root(&self) -> bool {
        matches!(self, ExportFormat::MsProjectXml)
    }

    /// Primavera drops the task mode entirely.
    pub fn honours_task_mode(&self) -> bool {
        matches!(self, ExportFormat::MsProjectXml)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "ms_project_xml" | "ms_project" | "mspdi" => Ok(ExportFormat::MsProjectXml),
            "primavera_p6_xml" | "primavera_p6" | "p6" | "pmxml" => {
                Ok(ExportFormat::PrimaveraP6Xml)
            }
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskSchedulingType {
    #[default]
    AutoScheduled,
    ManuallyScheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilestoneSchedulingType {
    AutoScheduled,
    #[default]
    ManuallyScheduled,
}

/// Caller supplied options for a single export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportParameters {
    pub format: ExportFormat,
    #[serde(default)]
    pub include_milestones: bool,
    #[serde(default)]
    pub include_comments: bool,
    #[serde(default)]
    pub task_scheduling_type: TaskSchedulingType,
    #[serde(default)]
    pub milestone_scheduling_type: MilestoneSchedulingType,
}

impl ExportParameters {
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            include_milestones: true,
            include_comments: false,
            task_scheduling_type: TaskSchedulingType::default(),
            milestone_scheduling_type: MilestoneSchedulingType::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub name: String,
    pub date: NaiveDate,
}

impl Holiday {
    pub fn new(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            date,
        }
    }
}

/// Per-project working time settings. A project without one exports with a
/// Monday to Friday week starting on Monday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkdayConfiguration {
    pub start_of_week: Weekday,
    pub working_days: Vec<Weekday>,
    #[serde(default)]
    pub holidays: Vec<Holiday>,
    #[serde(default)]
    pub allow_work_on_non_working_days: bool,
}

impl Default for WorkdayConfiguration {
    fn default() -> Self {
        Self {
            start_of_week: Weekday::Mon,
            working_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            holidays: Vec::new(),
            allow_work_on_non_working_days: false,
        }
    }
}

pub fn load_export_parameters<P: AsRef<Path>>(path: P) -> PersistenceResult<ExportParameters> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}

pub fn load_workday_configuration<P: AsRef<Path>>(
    path: P,
) -> PersistenceResult<WorkdayConfiguration> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}
