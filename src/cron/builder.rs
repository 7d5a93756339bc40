// src/cron/builder.rs

//! Structured schedule form ↔ cron string.
//!
//! The editor works with a frequency plus time of day, weekday set and day of
//! month. [`CronSchedule`] is the validated structured form; [`CronBuilder`]
//! holds every editor field at once so switching frequency does not lose the
//! values of the others.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::error::CronError;
use super::expression::{CronExpression, CronField};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Frequency {
    Hourly,
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        };
        f.write_str(s)
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hourly" => Ok(Frequency::Hourly),
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(format!(
                "invalid frequency: {other} (expected hourly, daily, weekly or monthly)"
            )),
        }
    }
}

/// Hour (0-23) and minute (0-59).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Result<Self, CronError> {
        if hour > 23 {
            return Err(CronError::OutOfRange {
                field: "hour",
                value: hour,
                min: 0,
                max: 23,
            });
        }
        if minute > 59 {
            return Err(CronError::OutOfRange {
                field: "minute",
                value: minute,
                min: 0,
                max: 59,
            });
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }
}

impl Default for TimeOfDay {
    fn default() -> Self {
        Self { hour: 9, minute: 0 }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CronError::InvalidTime(s.to_string());
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;
        TimeOfDay::new(hour, minute)
    }
}

/// Non-empty set of weekdays, 0 (Sunday) to 6 (Saturday).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekdaySet(BTreeSet<u32>);

impl WeekdaySet {
    pub fn new(days: impl IntoIterator<Item = u32>) -> Result<Self, CronError> {
        let mut set = BTreeSet::new();
        for day in days {
            if day > 6 {
                return Err(CronError::OutOfRange {
                    field: "day-of-week",
                    value: day,
                    min: 0,
                    max: 6,
                });
            }
            set.insert(day);
        }
        if set.is_empty() {
            return Err(CronError::EmptyWeekdays);
        }
        Ok(Self(set))
    }

    pub fn contains(&self, day: u32) -> bool {
        self.0.contains(&day)
    }

    /// Days in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for WeekdaySet {
    /// Monday.
    fn default() -> Self {
        Self(BTreeSet::from([1]))
    }
}

/// Day of month, 1-31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayOfMonth(u32);

impl DayOfMonth {
    pub fn new(day: u32) -> Result<Self, CronError> {
        if !(1..=31).contains(&day) {
            return Err(CronError::OutOfRange {
                field: "day-of-month",
                value: day,
                min: 1,
                max: 31,
            });
        }
        Ok(Self(day))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for DayOfMonth {
    fn default() -> Self {
        Self(1)
    }
}

/// Validated structured schedule, one variant per frequency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CronSchedule {
    Hourly,
    Daily { at: TimeOfDay },
    Weekly { at: TimeOfDay, days: WeekdaySet },
    Monthly { at: TimeOfDay, day: DayOfMonth },
}

impl CronSchedule {
    pub fn frequency(&self) -> Frequency {
        match self {
            CronSchedule::Hourly => Frequency::Hourly,
            CronSchedule::Daily { .. } => Frequency::Daily,
            CronSchedule::Weekly { .. } => Frequency::Weekly,
            CronSchedule::Monthly { .. } => Frequency::Monthly,
        }
    }

    pub fn to_expression(&self) -> CronExpression {
        let time = |at: &TimeOfDay| (CronField::single(at.minute()), CronField::single(at.hour()));
        match self {
            CronSchedule::Hourly => CronExpression::from_fields(
                CronField::single(0),
                CronField::Any,
                CronField::Any,
                CronField::Any,
                CronField::Any,
            ),
            CronSchedule::Daily { at } => {
                let (minute, hour) = time(at);
                CronExpression::from_fields(minute, hour, CronField::Any, CronField::Any, CronField::Any)
            }
            CronSchedule::Weekly { at, days } => {
                let (minute, hour) = time(at);
                CronExpression::from_fields(
                    minute,
                    hour,
                    CronField::Any,
                    CronField::Any,
                    CronField::Values(days.iter().collect()),
                )
            }
            CronSchedule::Monthly { at, day } => {
                let (minute, hour) = time(at);
                CronExpression::from_fields(
                    minute,
                    hour,
                    CronField::single(day.get()),
                    CronField::Any,
                    CronField::Any,
                )
            }
        }
    }

    /// Cron string for this schedule.
    pub fn encode(&self) -> String {
        self.to_expression().to_string()
    }

    /// Parse and classify a cron string.
    pub fn decode(expr: &str) -> Result<Self, CronError> {
        let parsed = CronExpression::parse(expr)?;
        Self::from_expression(&parsed)
    }

    /// Classify an expression into the editor's frequencies.
    ///
    /// Fields are inspected in a fixed order: a wildcard hour means hourly,
    /// then wildcard weekday and day-of-month mean daily, then a wildcard
    /// day-of-month means weekly, and anything else is monthly. A weekday
    /// list next to a specific day-of-month is therefore dropped, and the
    /// month field is never looked at.
    pub fn from_expression(expr: &CronExpression) -> Result<Self, CronError> {
        if expr.hour().is_any() {
            return Ok(CronSchedule::Hourly);
        }

        let at = TimeOfDay::new(
            editable(expr.hour(), "hour")?,
            editable(expr.minute(), "minute")?,
        )?;

        if expr.day_of_week().is_any() && expr.day_of_month().is_any() {
            return Ok(CronSchedule::Daily { at });
        }

        if expr.day_of_month().is_any() {
            let days = expr.day_of_week().values().unwrap_or_default();
            return Ok(CronSchedule::Weekly {
                at,
                days: WeekdaySet::new(days.iter().copied())?,
            });
        }

        let day = DayOfMonth::new(editable(expr.day_of_month(), "day-of-month")?)?;
        Ok(CronSchedule::Monthly { at, day })
    }
}

const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CronSchedule::Hourly => f.write_str("hourly, on the hour"),
            CronSchedule::Daily { at } => write!(f, "daily at {at}"),
            CronSchedule::Weekly { at, days } => {
                let names: Vec<&str> = days.iter().map(|d| WEEKDAY_NAMES[d as usize]).collect();
                write!(f, "weekly on {} at {at}", names.join(", "))
            }
            CronSchedule::Monthly { at, day } => write!(f, "monthly on day {} at {at}", day.get()),
        }
    }
}

fn editable(field: &CronField, name: &'static str) -> Result<u32, CronError> {
    field.as_single().ok_or_else(|| CronError::NotEditable {
        field: name,
        value: field.to_string(),
    })
}

/// Editor state: every field of the form, whichever frequency is selected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CronBuilder {
    pub frequency: Frequency,
    pub at: TimeOfDay,
    pub weekdays: WeekdaySet,
    pub day_of_month: DayOfMonth,
}

impl CronBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder state for an existing expression, defaults elsewhere.
    pub fn from_expression(expr: &str) -> Result<Self, CronError> {
        let mut builder = Self::default();
        builder.load(expr)?;
        Ok(builder)
    }

    /// Decode `expr` and overwrite only the fields its frequency controls.
    pub fn load(&mut self, expr: &str) -> Result<Frequency, CronError> {
        let schedule = CronSchedule::decode(expr)?;
        self.apply(&schedule);
        Ok(self.frequency)
    }

    pub fn apply(&mut self, schedule: &CronSchedule) {
        self.frequency = schedule.frequency();
        match schedule {
            CronSchedule::Hourly => {}
            CronSchedule::Daily { at } => self.at = *at,
            CronSchedule::Weekly { at, days } => {
                self.at = *at;
                self.weekdays = days.clone();
            }
            CronSchedule::Monthly { at, day } => {
                self.at = *at;
                self.day_of_month = *day;
            }
        }
    }

    /// Structured schedule for the selected frequency.
    pub fn build(&self) -> CronSchedule {
        match self.frequency {
            Frequency::Hourly => CronSchedule::Hourly,
            Frequency::Daily => CronSchedule::Daily { at: self.at },
            Frequency::Weekly => CronSchedule::Weekly {
                at: self.at,
                days: self.weekdays.clone(),
            },
            Frequency::Monthly => CronSchedule::Monthly {
                at: self.at,
                day: self.day_of_month,
            },
        }
    }

    pub fn expression(&self) -> String {
        self.build().encode()
    }
}
