//! MS Project XML (MSPDI).

use super::{
    HOURS_PER_DAY, ProjectWriter, WEEK, WORKING_PERIODS, XmlWriter, format_date, format_date_time,
};
use crate::config::ExportFormat;
use crate::error::ExportResult;
use crate::project_file::{ProjectFile, RecordKind, TaskHandle};
use crate::schedule::SchedulingMode;

const NAMESPACE: &str = "http://schemas.microsoft.com/project";
const CALENDAR_UID: i32 = 1;
const FINISH_TO_START: i32 = 1;
/// Field ids MS Project uses for the Text1..Text30 custom fields.
const TEXT_FIELD_ID_BASE: i64 = 188_743_730;

pub struct MspdiWriter;

impl ProjectWriter for MspdiWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::MsProjectXml
    }

    fn write(&self, file: &ProjectFile) -> ExportResult<Vec<u8>> {
        let properties = file.properties();
        let mut xml = XmlWriter::new();
        xml.open_with("Project", &[("xmlns", NAMESPACE)])?;
        xml.element("Name", &properties.title)?;
        xml.element("Title", &properties.title)?;
        xml.optional("Author", properties.author.as_deref())?;
        xml.element("ScheduleFromStart", 1)?;
        xml.element("StartDate", format_date_time(properties.planned_start))?;
        xml.element("FinishDate", format_date_time(properties.scheduled_finish))?;
        xml.element(
            "WeekStartDay",
            file.calendar().week_start().num_days_from_sunday(),
        )?;
        xml.element("MinutesPerDay", HOURS_PER_DAY * 60)?;
        xml.element("CalendarUID", CALENDAR_UID)?;

        write_extended_attributes(&mut xml, file)?;
        write_calendar(&mut xml, file)?;

        xml.open("Tasks")?;
        for (handle, _) in file.tasks() {
            write_task(&mut xml, file, handle)?;
        }
        xml.close("Tasks")?;

        xml.close("Project")?;
        Ok(xml.finish())
    }
}

fn text_field_id(field: &str) -> Option<i64> {
    field
        .strip_prefix("Text")
        .and_then(|number| number.parse::<i64>().ok())
        .map(|number| TEXT_FIELD_ID_BASE + number)
}

fn write_extended_attributes(xml: &mut XmlWriter, file: &ProjectFile) -> ExportResult<()> {
    if file.custom_fields().is_empty() {
        return Ok(());
    }
    xml.open("ExtendedAttributes")?;
    for field in file.custom_fields() {
        xml.open("ExtendedAttribute")?;
        xml.optional("FieldID", text_field_id(&field.field))?;
        xml.element("FieldName", &field.field)?;
        xml.element("Alias", &field.alias)?;
        xml.close("ExtendedAttribute")?;
    }
    xml.close("ExtendedAttributes")
}

fn write_calendar(xml: &mut XmlWriter, file: &ProjectFile) -> ExportResult<()> {
    let calendar = file.calendar();
    xml.open("Calendars")?;
    xml.open("Calendar")?;
    xml.element("UID", CALENDAR_UID)?;
    xml.element("Name", "Standard")?;
    xml.element("IsBaseCalendar", 1)?;
    xml.open("WeekDays")?;
    for (day_type, weekday) in WEEK.iter().enumerate() {
        let working = calendar.is_working_day(*weekday);
        xml.open("WeekDay")?;
        xml.element("DayType", day_type + 1)?;
        xml.element("DayWorking", u8::from(working))?;
        if working {
            xml.open("WorkingTimes")?;
            for (from, to) in WORKING_PERIODS {
                xml.open("WorkingTime")?;
                xml.element("FromTime", from)?;
                xml.element("ToTime", to)?;
                xml.close("WorkingTime")?;
            }
            xml.close("WorkingTimes")?;
        }
        xml.close("WeekDay")?;
    }
    for (date, _) in calendar.holidays() {
        xml.open("WeekDay")?;
        xml.element("DayType", 0)?;
        xml.element("DayWorking", 0)?;
        xml.open("TimePeriod")?;
        xml.element("FromDate", format_date(date))?;
        xml.element("ToDate", format!("{}T23:59:00", date.format("%Y-%m-%d")))?;
        xml.close("TimePeriod")?;
        xml.close("WeekDay")?;
    }
    xml.close("WeekDays")?;
    xml.close("Calendar")?;
    xml.close("Calendars")
}

fn write_task(xml: &mut XmlWriter, file: &ProjectFile, handle: TaskHandle) -> ExportResult<()> {
    let record = file.task(handle);
    let structure = &record.structure;
    let (start, finish) = file.span(handle);

    xml.open("Task")?;
    xml.element("UID", structure.unique_id)?;
    xml.optional("GUID", structure.guid)?;
    xml.element("ID", structure.file_id)?;
    xml.element("Name", &record.name)?;
    xml.element("WBS", &structure.wbs)?;
    xml.element("OutlineNumber", &structure.wbs)?;
    xml.element("OutlineLevel", structure.outline_level)?;
    xml.optional("CreateDate", record.created_date.map(format_date_time))?;
    xml.element("Summary", u8::from(record.is_summary()))?;
    xml.element("Milestone", u8::from(record.kind == RecordKind::Milestone))?;
    if let Some(mode) = record.scheduling.task_mode {
        xml.element("Manual", u8::from(mode == SchedulingMode::ManuallyScheduled))?;
    }
    xml.optional("Start", start.map(format_date_time))?;
    xml.optional("Finish", finish.map(format_date_time))?;
    xml.optional(
        "Duration",
        record
            .scheduling
            .duration_days
            .map(|days| format!("PT{}H0M0S", days * HOURS_PER_DAY)),
    )?;
    xml.optional("PercentComplete", record.percent_complete)?;
    xml.optional("Notes", record.notes.as_deref())?;

    for predecessor in file.predecessors(handle) {
        xml.open("PredecessorLink")?;
        xml.element("PredecessorUID", file.task(predecessor).structure.unique_id)?;
        xml.element("Type", FINISH_TO_START)?;
        xml.close("PredecessorLink")?;
    }

    for (field, value) in &record.custom_text {
        xml.open("ExtendedAttribute")?;
        xml.optional("FieldID", text_field_id(field))?;
        xml.element("Value", value)?;
        xml.close("ExtendedAttribute")?;
    }
    xml.close("Task")
}
