use crate::config::WorkdayConfiguration;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Working time of a project: which weekdays are worked, which dates are
/// holidays and on which day the week starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    holidays: HashMap<NaiveDate, String>,
    non_working_days: HashSet<Weekday>,
    week_start: Weekday,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self::from_config(&WorkdayConfiguration::default())
    }
}

impl WorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn custom<I, J>(working_days: I, holidays: J) -> Self
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let mut calendar = Self {
            holidays: HashMap::new(),
            non_working_days: HashSet::new(),
            week_start: Weekday::Mon,
        };
        calendar.set_working_days(working_days.into_iter().collect());
        for date in holidays {
            calendar.add_holiday(date, "Holiday");
        }
        calendar
    }

    pub fn from_config(config: &WorkdayConfiguration) -> Self {
        let mut calendar = Self {
            holidays: HashMap::new(),
            non_working_days: HashSet::new(),
            week_start: config.start_of_week,
        };
        calendar.set_working_days(config.working_days.clone());
        for holiday in &config.holidays {
            calendar.add_holiday(holiday.date, holiday.name.clone());
        }
        calendar
    }

    /// Falls back to the default Monday to Friday calendar when the project has
    /// no workday configuration.
    pub fn from_optional_config(config: Option<&WorkdayConfiguration>) -> Self {
        config.map(Self::from_config).unwrap_or_default()
    }

    pub fn add_holiday(&mut self, date: NaiveDate, name: impl Into<String>) {
        self.holidays.insert(date, name.into());
    }

    /// Set custom working days (e.g., Mon-Sat for 6-day weeks)
    pub fn set_working_days(&mut self, days: Vec<Weekday>) {
        self.non_working_days.clear();
        for day in Self::ALL_WEEKDAYS {
            if !days.contains(&day) {
                self.non_working_days.insert(day);
            }
        }
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    pub fn is_working_day(&self, weekday: Weekday) -> bool {
        !self.non_working_days.contains(&weekday)
    }

    pub fn working_days(&self) -> Vec<Weekday> {
        Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| self.is_working_day(*day))
            .collect()
    }

    /// Holidays sorted by date.
    pub fn holidays(&self) -> Vec<(NaiveDate, &str)> {
        let mut holidays: Vec<(NaiveDate, &str)> = self
            .holidays
            .iter()
            .map(|(date, name)| (*date, name.as_str()))
            .collect();
        holidays.sort_by_key(|(date, _)| *date);
        holidays
    }

    pub fn is_working_date(&self, date: NaiveDate) -> bool {
        !self.holidays.contains_key(&date) && self.is_working_day(date.weekday())
    }

    /// First working date on or after `date`. A calendar without any working
    /// day leaves the date untouched.
    pub fn working_date_on_or_after(&self, date: NaiveDate) -> NaiveDate {
        if self.non_working_days.len() == Self::ALL_WEEKDAYS.len() {
            return date;
        }
        let mut current = date;
        while !self.is_working_date(current) {
            current = current + Duration::days(1);
        }
        current
    }

    /// Find the next working date after a given date
    pub fn next_working_date(&self, from: NaiveDate) -> NaiveDate {
        self.working_date_on_or_after(from + Duration::days(1))
    }

    /// Count working dates in the inclusive range
    pub fn count_working_days(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        let mut count = 0;
        let mut current = start;

        while current <= end {
            if self.is_working_date(current) {
                count += 1;
            }
            current = current + Duration::days(1);
        }
        count
    }
}
