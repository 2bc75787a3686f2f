//! Primavera P6 XML (PMXML). Summary records become WBS elements, leaves become
//! activities. Top-level records have no parent object id.

use super::{
    HOURS_PER_DAY, ProjectWriter, WEEK, WORKING_PERIODS, XmlWriter, format_date, format_date_time,
};
use crate::config::ExportFormat;
use crate::error::ExportResult;
use crate::project_file::{ProjectFile, RecordKind, TaskHandle, TaskRecord};
use chrono::Weekday;

const NAMESPACE: &str = "http://xmlns.oracle.com/Primavera/P6/V8.4/API/BusinessObjects";
const PROJECT_OBJECT_ID: i32 = 1;
const CALENDAR_OBJECT_ID: i32 = 1;

pub struct PmxmlWriter;

impl ProjectWriter for PmxmlWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::PrimaveraP6Xml
    }

    fn write(&self, file: &ProjectFile) -> ExportResult<Vec<u8>> {
        let mut xml = XmlWriter::new();
        xml.open_with("APIBusinessObjects", &[("xmlns", NAMESPACE)])?;

        for (index, field) in file.custom_fields().iter().enumerate() {
            xml.open("UDFType")?;
            xml.element("ObjectId", index + 1)?;
            xml.element("SubjectArea", "Activity")?;
            xml.element("DataType", "Text")?;
            xml.element("Title", &field.alias)?;
            xml.close("UDFType")?;
        }

        write_calendar(&mut xml, file)?;
        write_project(&mut xml, file)?;

        xml.close("APIBusinessObjects")?;
        Ok(xml.finish())
    }
}

fn write_calendar(xml: &mut XmlWriter, file: &ProjectFile) -> ExportResult<()> {
    let calendar = file.calendar();
    xml.open("Calendar")?;
    xml.element("ObjectId", CALENDAR_OBJECT_ID)?;
    xml.element("Name", "Standard")?;
    xml.element("Type", "Global")?;
    xml.element("HoursPerDay", HOURS_PER_DAY)?;
    xml.open("StandardWorkWeek")?;
    for weekday in WEEK {
        xml.open("StandardWorkHours")?;
        xml.element("DayOfWeek", day_name(weekday))?;
        if calendar.is_working_day(weekday) {
            for (from, to) in WORKING_PERIODS {
                xml.open("WorkTime")?;
                xml.element("Start", from)?;
                xml.element("Finish", to)?;
                xml.close("WorkTime")?;
            }
        }
        xml.close("StandardWorkHours")?;
    }
    xml.close("StandardWorkWeek")?;
    let holidays = calendar.holidays();
    if !holidays.is_empty() {
        xml.open("HolidayExceptions")?;
        for (date, _) in holidays {
            xml.open("HolidayException")?;
            xml.element("Date", format_date(date))?;
            xml.close("HolidayException")?;
        }
        xml.close("HolidayExceptions")?;
    }
    xml.close("Calendar")
}

fn write_project(xml: &mut XmlWriter, file: &ProjectFile) -> ExportResult<()> {
    let properties = file.properties();
    xml.open("Project")?;
    xml.element("ObjectId", PROJECT_OBJECT_ID)?;
    xml.element("Name", &properties.title)?;
    xml.optional("ProjectManager", properties.author.as_deref())?;
    xml.element("PlannedStartDate", format_date_time(properties.planned_start))?;
    xml.element(
        "ScheduledFinishDate",
        format_date_time(properties.scheduled_finish),
    )?;
    xml.element("ActivityDefaultCalendarObjectId", CALENDAR_OBJECT_ID)?;

    for (sequence, (handle, record)) in file
        .tasks()
        .filter(|(_, record)| record.kind == RecordKind::Summary)
        .enumerate()
    {
        write_wbs(xml, file, handle, record, sequence)?;
    }

    for (_, record) in file.tasks().filter(|(_, record)| !record.is_summary()) {
        write_activity(xml, file, record)?;
    }

    for (sequence, (predecessor, successor)) in file.relations().into_iter().enumerate() {
        xml.open("Relationship")?;
        xml.element("ObjectId", sequence + 1)?;
        xml.element(
            "PredecessorActivityObjectId",
            file.task(predecessor).structure.unique_id,
        )?;
        xml.element(
            "SuccessorActivityObjectId",
            file.task(successor).structure.unique_id,
        )?;
        xml.element("Type", "Finish to Start")?;
        xml.element("Lag", 0)?;
        xml.close("Relationship")?;
    }

    xml.close("Project")
}

fn parent_object_id(file: &ProjectFile, record: &TaskRecord) -> Option<i32> {
    record
        .structure
        .parent
        .map(|parent| file.task(parent))
        .filter(|parent| parent.kind == RecordKind::Summary)
        .map(|parent| parent.structure.unique_id)
}

fn write_wbs(
    xml: &mut XmlWriter,
    file: &ProjectFile,
    handle: TaskHandle,
    record: &TaskRecord,
    sequence: usize,
) -> ExportResult<()> {
    let (start, finish) = file.span(handle);
    xml.open("WBS")?;
    xml.element("ObjectId", record.structure.unique_id)?;
    xml.optional("GUID", record.structure.guid.map(|guid| format!("{{{guid}}}")))?;
    xml.element("Code", &record.structure.wbs)?;
    xml.element("Name", &record.name)?;
    xml.optional("ParentObjectId", parent_object_id(file, record))?;
    xml.element("ProjectObjectId", PROJECT_OBJECT_ID)?;
    xml.element("SequenceNumber", sequence)?;
    xml.optional("AnticipatedStartDate", start.map(format_date_time))?;
    xml.optional("AnticipatedFinishDate", finish.map(format_date_time))?;
    xml.close("WBS")
}

fn write_activity(xml: &mut XmlWriter, file: &ProjectFile, record: &TaskRecord) -> ExportResult<()> {
    let structure = &record.structure;
    let scheduling = &record.scheduling;
    let hours = |days: i64| days * HOURS_PER_DAY;

    xml.open("Activity")?;
    xml.element("ObjectId", structure.unique_id)?;
    xml.optional("GUID", structure.guid.map(|guid| format!("{{{guid}}}")))?;
    xml.optional("Id", structure.activity_id.as_deref())?;
    xml.element("Name", &record.name)?;
    xml.element(
        "Type",
        match record.kind {
            RecordKind::Milestone => "Finish Milestone",
            _ => "Task Dependent",
        },
    )?;
    xml.element("ProjectObjectId", PROJECT_OBJECT_ID)?;
    xml.optional("WBSObjectId", parent_object_id(file, record))?;
    xml.element("CalendarObjectId", CALENDAR_OBJECT_ID)?;
    xml.optional("PlannedStartDate", scheduling.planned_start.map(format_date_time))?;
    xml.optional("PlannedFinishDate", scheduling.planned_finish.map(format_date_time))?;
    xml.optional("ActualStartDate", scheduling.actual_start.map(format_date_time))?;
    xml.optional("ActualFinishDate", scheduling.actual_finish.map(format_date_time))?;
    xml.optional(
        "RemainingEarlyStartDate",
        scheduling.remaining_early_start.map(format_date_time),
    )?;
    xml.optional(
        "RemainingEarlyFinishDate",
        scheduling.remaining_early_finish.map(format_date_time),
    )?;
    xml.optional("PlannedDuration", scheduling.duration_days.map(hours))?;
    xml.optional("ActualDuration", scheduling.actual_duration_days.map(hours))?;
    xml.optional(
        "PercentComplete",
        record
            .percent_complete
            .map(|percent| f64::from(percent) / 100.0),
    )?;
    xml.optional("CreateDate", record.created_date.map(format_date_time))?;
    xml.optional("Notes", record.notes.as_deref())?;

    for (index, field) in file.custom_fields().iter().enumerate() {
        if let Some(value) = record.custom_text.get(&field.field) {
            xml.open("UDF")?;
            xml.element("TypeObjectId", index + 1)?;
            xml.element("TextValue", value)?;
            xml.close("UDF")?;
        }
    }
    xml.close("Activity")
}

fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
