// src/cron/expression.rs

//! Five-field cron expressions: `minute hour day-of-month month day-of-week`.
//!
//! Each field is `*`, a single integer, or a comma-separated list of
//! integers. Ranges and steps are not part of the format.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::error::CronError;

/// How far ahead `next_after` searches before giving up.
///
/// Five years always contains a 29th of February and every weekday/day
/// combination, so anything that can match at all is found.
const UPCOMING_PREALLOC: usize = 64;

const MAX_LOOKAHEAD_DAYS: u32 = 366 * 5;

#[derive(Debug, Clone, Copy)]
struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
}

const MINUTE: FieldSpec = FieldSpec { name: "minute", min: 0, max: 59 };
const HOUR: FieldSpec = FieldSpec { name: "hour", min: 0, max: 23 };
const DAY_OF_MONTH: FieldSpec = FieldSpec { name: "day-of-month", min: 1, max: 31 };
const MONTH: FieldSpec = FieldSpec { name: "month", min: 1, max: 12 };
const DAY_OF_WEEK: FieldSpec = FieldSpec { name: "day-of-week", min: 0, max: 6 };

/// A single field in a cron expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CronField {
    /// Wildcard (`*`), matches every value.
    Any,
    /// One or more literal values, in the order they were written.
    Values(Vec<u32>),
}

impl CronField {
    pub fn single(value: u32) -> Self {
        CronField::Values(vec![value])
    }

    pub fn is_any(&self) -> bool {
        matches!(self, CronField::Any)
    }

    pub fn matches(&self, value: u32) -> bool {
        match self {
            CronField::Any => true,
            CronField::Values(values) => values.contains(&value),
        }
    }

    /// The value if this field is exactly one literal.
    pub fn as_single(&self) -> Option<u32> {
        match self {
            CronField::Values(values) if values.len() == 1 => Some(values[0]),
            _ => None,
        }
    }

    pub fn values(&self) -> Option<&[u32]> {
        match self {
            CronField::Any => None,
            CronField::Values(values) => Some(values),
        }
    }

    /// Sorted, de-duplicated list of matching values within `spec`'s range.
    fn expand(&self, spec: FieldSpec) -> Vec<u32> {
        match self {
            CronField::Any => (spec.min..=spec.max).collect(),
            CronField::Values(values) => {
                let mut out = values.clone();
                out.sort_unstable();
                out.dedup();
                out
            }
        }
    }

    fn parse(text: &str, spec: FieldSpec) -> Result<Self, CronError> {
        if text == "*" {
            return Ok(CronField::Any);
        }

        let mut values = Vec::new();
        for part in text.split(',') {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(CronError::InvalidField {
                    field: spec.name,
                    value: text.to_string(),
                });
            }
            let value: u32 = part.parse().map_err(|_| CronError::InvalidField {
                field: spec.name,
                value: text.to_string(),
            })?;
            if value < spec.min || value > spec.max {
                return Err(CronError::OutOfRange {
                    field: spec.name,
                    value,
                    min: spec.min,
                    max: spec.max,
                });
            }
            values.push(value);
        }

        Ok(CronField::Values(values))
    }
}

impl fmt::Display for CronField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CronField::Any => f.write_str("*"),
            CronField::Values(values) => {
                let parts: Vec<String> = values.iter().map(u32::to_string).collect();
                f.write_str(&parts.join(","))
            }
        }
    }
}

/// A parsed and range-checked cron expression.
///
/// Serialises as its canonical string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CronExpression {
    minute: CronField,
    hour: CronField,
    day_of_month: CronField,
    month: CronField,
    day_of_week: CronField,
}

impl CronExpression {
    /// Parse a cron expression string.
    ///
    /// - `0 9 * * *`: daily at 09:00
    /// - `30 6 * * 1,3,5`: Monday, Wednesday, Friday at 06:30
    /// - `0 0 1 * *`: first day of every month at midnight
    pub fn parse(expr: &str) -> Result<Self, CronError> {
        let parts: Vec<&str> = expr.split_whitespace().collect();
        if parts.len() != 5 {
            return Err(CronError::FieldCount { found: parts.len() });
        }

        Ok(Self {
            minute: CronField::parse(parts[0], MINUTE)?,
            hour: CronField::parse(parts[1], HOUR)?,
            day_of_month: CronField::parse(parts[2], DAY_OF_MONTH)?,
            month: CronField::parse(parts[3], MONTH)?,
            day_of_week: CronField::parse(parts[4], DAY_OF_WEEK)?,
        })
    }

    /// Build from fields whose values are already known to be in range.
    pub(crate) fn from_fields(
        minute: CronField,
        hour: CronField,
        day_of_month: CronField,
        month: CronField,
        day_of_week: CronField,
    ) -> Self {
        Self {
            minute,
            hour,
            day_of_month,
            month,
            day_of_week,
        }
    }

    pub fn minute(&self) -> &CronField {
        &self.minute
    }

    pub fn hour(&self) -> &CronField {
        &self.hour
    }

    pub fn day_of_month(&self) -> &CronField {
        &self.day_of_month
    }

    pub fn month(&self) -> &CronField {
        &self.month
    }

    pub fn day_of_week(&self) -> &CronField {
        &self.day_of_week
    }

    /// Whether the given minute is a fire time.
    pub fn matches(&self, time: &DateTime<Utc>) -> bool {
        self.minute.matches(time.minute())
            && self.hour.matches(time.hour())
            && self.date_matches(time.date_naive())
    }

    /// First fire time strictly after `after`, or `None` if the expression
    /// can never fire (e.g. `0 0 31 2 *`).
    pub fn next_after(&self, after: &DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start = after.with_second(0)?.with_nanosecond(0)? + TimeDelta::minutes(1);
        let hours = self.hour.expand(HOUR);
        let minutes = self.minute.expand(MINUTE);

        let mut date = start.date_naive();
        for _ in 0..MAX_LOOKAHEAD_DAYS {
            if self.date_matches(date) {
                for &hour in &hours {
                    for &minute in &minutes {
                        let Some(naive) = date.and_hms_opt(hour, minute, 0) else {
                            continue;
                        };
                        let candidate = naive.and_utc();
                        if candidate >= start {
                            return Some(candidate);
                        }
                    }
                }
            }
            date = date.succ_opt()?;
        }

        None
    }

    /// The next `count` fire times after `after`. Stops early if the
    /// expression runs out of fire times.
    pub fn upcoming(&self, after: &DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
        let mut out = Vec::with_capacity(count.min(UPCOMING_PREALLOC));
        let mut cursor = *after;
        while out.len() < count {
            match self.next_after(&cursor) {
                Some(next) => {
                    out.push(next);
                    cursor = next;
                }
                None => break,
            }
        }
        out
    }

    /// Day matching with the usual cron rule: when both day-of-month and
    /// day-of-week are restricted, either one matching is enough.
    fn date_matches(&self, date: NaiveDate) -> bool {
        if !self.month.matches(date.month()) {
            return false;
        }

        let dom = self.day_of_month.matches(date.day());
        let dow = self
            .day_of_week
            .matches(date.weekday().num_days_from_sunday());

        match (self.day_of_month.is_any(), self.day_of_week.is_any()) {
            (true, true) => true,
            (false, true) => dom,
            (true, false) => dow,
            (false, false) => dom || dow,
        }
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.minute, self.hour, self.day_of_month, self.month, self.day_of_week
        )
    }
}

impl FromStr for CronExpression {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CronExpression::parse(s)
    }
}

impl TryFrom<String> for CronExpression {
    type Error = CronError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CronExpression::parse(&value)
    }
}

impl From<CronExpression> for String {
    fn from(value: CronExpression) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn parse_wildcard_matches_everything() {
        let expr = CronExpression::parse("* * * * *").unwrap();
        assert!(expr.matches(&Utc::now()));
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(
            CronExpression::parse("* * *"),
            Err(CronError::FieldCount { found: 3 })
        );
        assert!(matches!(
            CronExpression::parse("60 * * * *"),
            Err(CronError::OutOfRange { field: "minute", value: 60, .. })
        ));
        assert!(matches!(
            CronExpression::parse("0 0 * * 7"),
            Err(CronError::OutOfRange { field: "day-of-week", .. })
        ));
        assert!(matches!(
            CronExpression::parse("0 0 0 * *"),
            Err(CronError::OutOfRange { field: "day-of-month", .. })
        ));
        assert!(matches!(
            CronExpression::parse("*/5 * * * *"),
            Err(CronError::InvalidField { field: "minute", .. })
        ));
        assert!(matches!(
            CronExpression::parse("1,,2 * * * *"),
            Err(CronError::InvalidField { .. })
        ));
        assert!(matches!(
            CronExpression::parse("+5 * * * *"),
            Err(CronError::InvalidField { .. })
        ));
    }

    #[test]
    fn display_is_canonical() {
        let expr = CronExpression::parse("  30   9 * *   1,3,5 ").unwrap();
        assert_eq!(expr.to_string(), "30 9 * * 1,3,5");
    }

    #[test]
    fn next_after_daily() {
        let expr = CronExpression::parse("30 9 * * *").unwrap();
        assert_eq!(
            expr.next_after(&at(2026, 3, 10, 8, 0)),
            Some(at(2026, 3, 10, 9, 30))
        );
        // Exactly at a fire time: the next one is tomorrow.
        assert_eq!(
            expr.next_after(&at(2026, 3, 10, 9, 30)),
            Some(at(2026, 3, 11, 9, 30))
        );
    }

    #[test]
    fn next_after_weekly_picks_next_listed_weekday() {
        // 2026-03-10 is a Tuesday.
        let expr = CronExpression::parse("0 6 * * 1,5").unwrap();
        assert_eq!(
            expr.next_after(&at(2026, 3, 10, 12, 0)),
            Some(at(2026, 3, 13, 6, 0))
        );
    }

    #[test]
    fn day_of_month_and_weekday_are_or_combined() {
        // 15th of the month OR Monday.
        let expr = CronExpression::parse("0 9 15 * 1").unwrap();
        // Tuesday 2026-03-10 → next Monday is the 16th, but the 15th comes first.
        assert_eq!(
            expr.next_after(&at(2026, 3, 10, 12, 0)),
            Some(at(2026, 3, 15, 9, 0))
        );
        assert_eq!(
            expr.next_after(&at(2026, 3, 15, 12, 0)),
            Some(at(2026, 3, 16, 9, 0))
        );
    }

    #[test]
    fn impossible_date_never_fires() {
        let expr = CronExpression::parse("0 0 31 2 *").unwrap();
        assert_eq!(expr.next_after(&at(2026, 1, 1, 0, 0)), None);
    }

    #[test]
    fn leap_day_is_found() {
        let expr = CronExpression::parse("0 0 29 2 *").unwrap();
        assert_eq!(
            expr.next_after(&at(2026, 1, 1, 0, 0)),
            Some(at(2028, 2, 29, 0, 0))
        );
    }

    #[test]
    fn upcoming_returns_consecutive_fire_times() {
        let expr = CronExpression::parse("0 * * * *").unwrap();
        let times = expr.upcoming(&at(2026, 3, 10, 8, 15), 3);
        assert_eq!(
            times,
            vec![at(2026, 3, 10, 9, 0), at(2026, 3, 10, 10, 0), at(2026, 3, 10, 11, 0)]
        );
    }

    #[test]
    fn upcoming_with_huge_count_stops_when_nothing_fires() {
        let expr = CronExpression::parse("0 0 31 2 *").unwrap();
        assert!(expr.upcoming(&at(2026, 1, 1, 0, 0), usize::MAX).is_empty());
    }
}
