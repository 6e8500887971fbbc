//! CF time coordinates to calendar dates
//!
//! Climate models rarely use the real-world calendar. HadGEM output, for
//! example, uses a 360-day year of twelve 30-day months. Time values are
//! stored as offsets such as `days since 1850-01-01`, and converting them
//! to dates needs both the units string and the calendar attribute.

use crate::errors::{Result, TrendError};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Calendar assumed when the time variable has no `calendar` attribute
pub const DEFAULT_CALENDAR: Calendar = Calendar::Day360;

const CUMULATIVE_DAYS_365: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];
const CUMULATIVE_DAYS_366: [i64; 12] = [0, 31, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335];

/// Supported CF calendars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calendar {
    /// Twelve 30-day months
    Day360,
    /// Every year has 365 days
    NoLeap,
    /// Every year has 366 days
    AllLeap,
    /// Proleptic gregorian
    Gregorian,
}

impl Calendar {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day360 => "360_day",
            Self::NoLeap => "noleap",
            Self::AllLeap => "all_leap",
            Self::Gregorian => "standard",
        }
    }

    /// Running day count of `date` in this calendar.
    fn day_number(self, date: CalendarDate) -> Result<i64> {
        let year = i64::from(date.year);
        let month = date.month as usize - 1;
        let day = i64::from(date.day) - 1;
        match self {
            Self::Day360 => Ok(year * 360 + month as i64 * 30 + day),
            Self::NoLeap => Ok(year * 365 + CUMULATIVE_DAYS_365[month] + day),
            Self::AllLeap => Ok(year * 366 + CUMULATIVE_DAYS_366[month] + day),
            Self::Gregorian => {
                let naive = NaiveDate::from_ymd_opt(date.year, date.month, date.day)
                    .ok_or_else(|| TrendError::calendar(format!("invalid date {date}")))?;
                Ok(i64::from(naive.num_days_from_ce()))
            }
        }
    }

    /// Inverse of [`Calendar::day_number`].
    fn date_from_day_number(self, number: i64) -> Result<CalendarDate> {
        let fixed = |year_len: i64, cumulative: &[i64; 12]| {
            let year = number.div_euclid(year_len);
            let day_of_year = number.rem_euclid(year_len);
            let month = cumulative
                .iter()
                .rposition(|&start| start <= day_of_year)
                .unwrap_or(0);
            CalendarDate::from_parts(year, month as u32 + 1, day_of_year - cumulative[month] + 1)
        };

        match self {
            Self::Day360 => {
                let year = number.div_euclid(360);
                let day_of_year = number.rem_euclid(360);
                CalendarDate::from_parts(
                    year,
                    (day_of_year / 30) as u32 + 1,
                    day_of_year % 30 + 1,
                )
            }
            Self::NoLeap => fixed(365, &CUMULATIVE_DAYS_365),
            Self::AllLeap => fixed(366, &CUMULATIVE_DAYS_366),
            Self::Gregorian => {
                let days = i32::try_from(number)
                    .map_err(|_| TrendError::calendar(format!("day {number} out of range")))?;
                let naive = NaiveDate::from_num_days_from_ce_opt(days)
                    .ok_or_else(|| TrendError::calendar(format!("day {number} out of range")))?;
                Ok(CalendarDate {
                    year: naive.year(),
                    month: naive.month(),
                    day: naive.day(),
                })
            }
        }
    }
}

impl FromStr for Calendar {
    type Err = TrendError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "360_day" => Ok(Self::Day360),
            "noleap" | "365_day" => Ok(Self::NoLeap),
            "all_leap" | "366_day" => Ok(Self::AllLeap),
            "standard" | "gregorian" | "proleptic_gregorian" => Ok(Self::Gregorian),
            other => Err(TrendError::calendar(format!("unsupported calendar '{other}'"))),
        }
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A date in a model calendar. Months and days are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CalendarDate {
    #[must_use]
    pub const fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    fn from_parts(year: i64, month: u32, day: i64) -> Result<Self> {
        let year = i32::try_from(year)
            .map_err(|_| TrendError::calendar(format!("year {year} out of range")))?;
        Ok(Self {
            year,
            month,
            day: day as u32,
        })
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Parsed `"<unit> since <reference>"` string
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeUnits {
    /// Length of one unit in days
    pub unit_days: f64,
    pub reference: CalendarDate,
    /// Time of day of the reference, as a fraction of a day
    pub reference_fraction: f64,
}

impl FromStr for TimeUnits {
    type Err = TrendError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let (unit, reference) = lower
            .split_once(" since ")
            .ok_or_else(|| TrendError::calendar(format!("expected '<unit> since <date>', got '{s}'")))?;

        let unit_days = match unit.trim() {
            "days" | "day" | "d" => 1.0,
            "hours" | "hour" | "hr" | "h" => 1.0 / 24.0,
            "minutes" | "minute" | "min" => 1.0 / 1440.0,
            "seconds" | "second" | "sec" | "s" => 1.0 / 86_400.0,
            other => return Err(TrendError::calendar(format!("unsupported time unit '{other}'"))),
        };

        let reference = reference.trim().trim_end_matches('z');
        let (date_part, time_part) = match reference.split_once(['t', ' ']) {
            Some((date, time)) => (date, Some(time.trim())),
            None => (reference, None),
        };

        let fields: Vec<&str> = date_part.split('-').collect();
        let [year, month, day] = fields.as_slice() else {
            return Err(TrendError::calendar(format!("invalid reference date '{date_part}'")));
        };
        let parse = |field: &str| {
            field
                .parse::<i64>()
                .map_err(|_| TrendError::calendar(format!("invalid reference date '{date_part}'")))
        };
        let (year, month, day) = (parse(*year)?, parse(*month)?, parse(*day)?);
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(TrendError::calendar(format!("invalid reference date '{date_part}'")));
        }

        let reference_fraction = match time_part {
            Some(time) if !time.is_empty() => parse_time_of_day(time)?,
            _ => 0.0,
        };

        Ok(Self {
            unit_days,
            reference: CalendarDate::from_parts(year, month as u32, day)?,
            reference_fraction,
        })
    }
}

fn parse_time_of_day(time: &str) -> Result<f64> {
    let mut seconds = 0.0;
    for (field, scale) in time.split(':').zip([3600.0, 60.0, 1.0]) {
        let value: f64 = field
            .parse()
            .map_err(|_| TrendError::calendar(format!("invalid time of day '{time}'")))?;
        seconds += value * scale;
    }
    Ok(seconds / 86_400.0)
}

/// Convert numeric time values to dates.
///
/// Fractional days are truncated towards the start of the day, so the
/// mid-month stamps common in monthly output map to that month.
///
/// # Errors
///
/// Returns [`TrendError::Calendar`] for unparseable units, non-finite time
/// values, or dates the calendar cannot represent.
pub fn num2date(values: &[f64], units: &str, calendar: Calendar) -> Result<Vec<CalendarDate>> {
    let units: TimeUnits = units.parse()?;
    let origin = calendar.day_number(units.reference)? as f64 + units.reference_fraction;

    values
        .iter()
        .map(|&value| {
            if !value.is_finite() {
                return Err(TrendError::calendar(format!("non-finite time value {value}")));
            }
            let day = (origin + value * units.unit_days).floor() as i64;
            calendar.date_from_day_number(day)
        })
        .collect()
}
