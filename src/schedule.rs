use crate::calendar::WorkCalendar;
use crate::config::{MilestoneSchedulingType, TaskSchedulingType};
use crate::model::{Task, TaskStatusClass};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

pub const WORKING_MORNING_START_HOUR: u32 = 8;
pub const WORKING_AFTERNOON_END_HOUR: u32 = 17;

/// Clock time a working day starts at.
pub fn working_morning_start() -> NaiveTime {
    NaiveTime::from_hms_opt(WORKING_MORNING_START_HOUR, 0, 0).unwrap_or_default()
}

/// Clock time a working day ends at.
pub fn working_afternoon_end() -> NaiveTime {
    NaiveTime::from_hms_opt(WORKING_AFTERNOON_END_HOUR, 0, 0).unwrap_or_default()
}

pub const HUNDRED_PERCENT: u8 = 100;
pub const FIFTY_PERCENT: u8 = 50;
pub const ZERO_PERCENT: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchedulingMode {
    AutoScheduled,
    ManuallyScheduled,
}

impl From<TaskSchedulingType> for SchedulingMode {
    fn from(value: TaskSchedulingType) -> Self {
        match value {
            TaskSchedulingType::AutoScheduled => SchedulingMode::AutoScheduled,
            TaskSchedulingType::ManuallyScheduled => SchedulingMode::ManuallyScheduled,
        }
    }
}

impl From<MilestoneSchedulingType> for SchedulingMode {
    fn from(value: MilestoneSchedulingType) -> Self {
        match value {
            MilestoneSchedulingType::AutoScheduled => SchedulingMode::AutoScheduled,
            MilestoneSchedulingType::ManuallyScheduled => SchedulingMode::ManuallyScheduled,
        }
    }
}

/// Facts about a task that drive snapping and the scheduling mode. All date
/// predicates look at the raw, unsnapped dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskProperties {
    pub status_class: TaskStatusClass,
    pub start_in_the_past: bool,
    pub start_on_non_working_day: bool,
    pub finish_on_non_working_day: bool,
}

impl TaskProperties {
    pub fn is_not_started(&self) -> bool {
        self.status_class == TaskStatusClass::NotStarted
    }

    pub fn is_in_progress(&self) -> bool {
        self.status_class == TaskStatusClass::InProgress
    }

    pub fn is_finished(&self) -> bool {
        self.status_class == TaskStatusClass::Finished
    }

    pub fn start_or_finish_on_non_working_day(&self) -> bool {
        self.start_on_non_working_day || self.finish_on_non_working_day
    }

    /// Work already done on a non-working day must not be moved by the target tool.
    pub fn prevents_rescheduling(&self) -> bool {
        self.start_or_finish_on_non_working_day() && (self.is_in_progress() || self.is_finished())
    }

    pub fn percent_complete(&self) -> u8 {
        match self.status_class {
            TaskStatusClass::Finished => HUNDRED_PERCENT,
            TaskStatusClass::InProgress => FIFTY_PERCENT,
            TaskStatusClass::NotStarted => ZERO_PERCENT,
        }
    }
}

/// Effective scheduling values of one node. Computed on every export, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleComputation {
    pub start: Option<NaiveDateTime>,
    pub finish: Option<NaiveDateTime>,
    pub duration_days: Option<i64>,
    pub scheduling_mode: SchedulingMode,
}

pub struct ScheduleCalculator<'a> {
    calendar: &'a WorkCalendar,
    allow_work_on_non_working_days: bool,
    today: NaiveDate,
}

impl<'a> ScheduleCalculator<'a> {
    pub fn new(
        calendar: &'a WorkCalendar,
        allow_work_on_non_working_days: bool,
        today: NaiveDate,
    ) -> Self {
        Self {
            calendar,
            allow_work_on_non_working_days,
            today,
        }
    }

    pub fn calendar(&self) -> &WorkCalendar {
        self.calendar
    }

    pub fn task_properties(
        &self,
        start: Option<NaiveDate>,
        finish: Option<NaiveDate>,
        status_class: TaskStatusClass,
    ) -> TaskProperties {
        TaskProperties {
            status_class,
            start_in_the_past: start.is_some_and(|date| date < self.today),
            start_on_non_working_day: start
                .is_some_and(|date| !self.calendar.is_working_date(date)),
            finish_on_non_working_day: finish
                .is_some_and(|date| !self.calendar.is_working_date(date)),
        }
    }

    pub fn compute_task(
        &self,
        task: &Task,
        requested: TaskSchedulingType,
    ) -> (TaskProperties, ScheduleComputation) {
        let properties = self.task_properties(task.start, task.end, task.status.class());
        let computation = self.compute(task.start, task.end, &properties, requested);
        (properties, computation)
    }

    pub fn compute(
        &self,
        start: Option<NaiveDate>,
        finish: Option<NaiveDate>,
        properties: &TaskProperties,
        requested: TaskSchedulingType,
    ) -> ScheduleComputation {
        let keep_dates = self.allow_work_on_non_working_days
            || (properties.start_in_the_past
                && properties.start_or_finish_on_non_working_day()
                && (properties.is_in_progress() || properties.is_finished()));

        let (start, finish) = if keep_dates {
            (start, finish)
        } else {
            let snapped_start = start.map(|date| self.calendar.working_date_on_or_after(date));
            let snapped_finish = finish.map(|date| {
                let snapped = self.calendar.working_date_on_or_after(date);
                match snapped_start {
                    Some(start) if start > snapped => start,
                    _ => snapped,
                }
            });
            (snapped_start, snapped_finish)
        };

        let scheduling_mode = if properties.prevents_rescheduling() {
            SchedulingMode::ManuallyScheduled
        } else {
            SchedulingMode::from(requested)
        };

        ScheduleComputation {
            start: start.map(|date| date.and_time(working_morning_start())),
            finish: finish.map(|date| date.and_time(working_afternoon_end())),
            duration_days: match (start, finish) {
                (Some(start), Some(finish)) => Some(self.duration_days(start, finish)),
                _ => None,
            },
            scheduling_mode,
        }
    }

    /// Working days between both dates. A non-working endpoint still counts as
    /// one day each so the target tool does not shrink the bar.
    pub fn duration_days(&self, start: NaiveDate, finish: NaiveDate) -> i64 {
        let raw = self.calendar.count_working_days(start, finish);
        let extra = [start, finish]
            .into_iter()
            .filter(|date| !self.calendar.is_working_date(*date))
            .count() as i64;
        raw + extra
    }

    pub fn compute_milestone(
        &self,
        date: NaiveDate,
        requested: MilestoneSchedulingType,
    ) -> ScheduleComputation {
        let at = date.and_time(working_morning_start());
        ScheduleComputation {
            start: Some(at),
            finish: Some(at),
            duration_days: Some(0),
            scheduling_mode: SchedulingMode::from(requested),
        }
    }
}
