//! Serializers from a [`ProjectFile`] to the supported third-party formats.

pub mod mspdi;
pub mod pmxml;

pub use mspdi::MspdiWriter;
pub use pmxml::PmxmlWriter;

use crate::config::ExportFormat;
use crate::error::ExportResult;
use crate::project_file::ProjectFile;
use chrono::{NaiveDate, NaiveDateTime, Weekday};
use std::fmt::{Display, Write};

pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Working hours per calendar day, with the usual lunch break between
/// 12:00 and 13:00.
pub const HOURS_PER_DAY: i64 = 8;
pub const WORKING_PERIODS: [(&str, &str); 2] = [("08:00:00", "12:00:00"), ("13:00:00", "17:00:00")];

pub trait ProjectWriter {
    fn format(&self) -> ExportFormat;

    fn write(&self, file: &ProjectFile) -> ExportResult<Vec<u8>>;
}

pub fn writer_for(format: ExportFormat) -> Box<dyn ProjectWriter> {
    match format {
        ExportFormat::MsProjectXml => Box::new(MspdiWriter),
        ExportFormat::PrimaveraP6Xml => Box::new(PmxmlWriter),
    }
}

pub fn format_date_time(value: NaiveDateTime) -> String {
    value.format(DATE_TIME_FORMAT).to_string()
}

pub fn format_date(value: NaiveDate) -> String {
    value.format("%Y-%m-%dT00:00:00").to_string()
}

/// Escapes markup characters and drops characters XML 1.0 does not allow.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars().filter(|c| is_xml_char(*c)) {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

pub(crate) const WEEK: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Minimal indenting XML emitter.
pub(crate) struct XmlWriter {
    out: String,
    depth: usize,
}

impl XmlWriter {
    pub(crate) fn new() -> Self {
        Self {
            out: String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n"),
            depth: 0,
        }
    }

    pub(crate) fn open(&mut self, tag: &str) -> ExportResult<()> {
        self.open_with(tag, &[])
    }

    pub(crate) fn open_with(&mut self, tag: &str, attributes: &[(&str, &str)]) -> ExportResult<()> {
        self.indent();
        write!(self.out, "<{tag}")?;
        for (name, value) in attributes {
            write!(self.out, " {name}=\"{}\"", escape(value))?;
        }
        writeln!(self.out, ">")?;
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn close(&mut self, tag: &str) -> ExportResult<()> {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        writeln!(self.out, "</{tag}>")?;
        Ok(())
    }

    pub(crate) fn element(&mut self, tag: &str, value: impl Display) -> ExportResult<()> {
        self.indent();
        writeln!(self.out, "<{tag}>{}</{tag}>", escape(&value.to_string()))?;
        Ok(())
    }

    pub(crate) fn optional<T: Display>(&mut self, tag: &str, value: Option<T>) -> ExportResult<()> {
        match value {
            Some(value) => self.element(tag, value),
            None => Ok(()),
        }
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.out.into_bytes()
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }
}
