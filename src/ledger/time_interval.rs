use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::{FinanceError, Result};

/// Average days per year, used to express durations and date gaps in years.
pub const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Day,
    Week,
    Month,
    Year,
}

/// A count of calendar units. Doubles as a duration (loan term, plant life) and as a
/// recurrence step (payment frequency, roll-up bucket).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TimeInterval {
    pub every: u32,
    pub unit: TimeUnit,
}

impl TimeInterval {
    pub fn days(every: u32) -> Self {
        Self {
            every,
            unit: TimeUnit::Day,
        }
    }

    pub fn months(every: u32) -> Self {
        Self {
            every,
            unit: TimeUnit::Month,
        }
    }

    pub fn years(every: u32) -> Self {
        Self {
            every,
            unit: TimeUnit::Year,
        }
    }

    /// Interval between payments for an instrument paying `per_year` times a year.
    pub fn from_frequency(per_year: u32) -> Result<Self> {
        match per_year {
            0 => Err(FinanceError::InvalidWindow(
                "payment frequency must be at least one per year".into(),
            )),
            f if 12 % f == 0 => Ok(Self::months(12 / f)),
            f if f == 52 => Ok(Self {
                every: 1,
                unit: TimeUnit::Week,
            }),
            f => Ok(Self::days(((DAYS_PER_YEAR / f as f64).round() as u32).max(1))),
        }
    }

    pub fn is_positive(&self) -> bool {
        self.every > 0
    }

    pub fn next_date(&self, from: NaiveDate) -> NaiveDate {
        self.nth_date(from, 1)
    }

    /// Date `steps` intervals after `anchor`, always measured from the anchor so that
    /// month-end clamping never accumulates drift.
    pub fn nth_date(&self, anchor: NaiveDate, steps: i32) -> NaiveDate {
        let n = steps * self.every as i32;
        match self.unit {
            TimeUnit::Day => anchor + Duration::days(n as i64),
            TimeUnit::Week => anchor + Duration::weeks(n as i64),
            TimeUnit::Month => shift_month(anchor, n),
            TimeUnit::Year => shift_year(anchor, n),
        }
    }

    /// Nominal length in years.
    pub fn in_years(&self) -> f64 {
        let every = self.every as f64;
        match self.unit {
            TimeUnit::Day => every / DAYS_PER_YEAR,
            TimeUnit::Week => every * 7.0 / DAYS_PER_YEAR,
            TimeUnit::Month => every / 12.0,
            TimeUnit::Year => every,
        }
    }

    pub fn label(&self) -> String {
        match (self.every, &self.unit) {
            (1, TimeUnit::Day) => "Daily".into(),
            (1, TimeUnit::Week) => "Weekly".into(),
            (1, TimeUnit::Month) => "Monthly".into(),
            (1, TimeUnit::Year) => "Annual".into(),
            (n, unit) => format!("Every {} {:?}{}", n, unit, if n > 1 { "s" } else { "" }),
        }
    }

    /// First day of the calendar bucket holding `date`. Month and year buckets are
    /// aligned to calendar boundaries; day and week buckets are the date itself and
    /// the preceding Monday.
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self.unit {
            TimeUnit::Day => date,
            TimeUnit::Week => {
                let delta = date.weekday().num_days_from_monday() as i64;
                date - Duration::days(delta)
            }
            TimeUnit::Month => {
                let every = self.every.max(1);
                let block = ((date.month() - 1) / every) * every;
                first_of_month(date.year(), block + 1)
            }
            TimeUnit::Year => {
                let every = self.every.max(1) as i32;
                let offset = (date.year() - 1).rem_euclid(every);
                first_of_month(date.year() - offset, 1)
            }
        }
    }
}

/// Fractional years between two dates, negative when `to` precedes `from`.
pub fn year_fraction(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64 / DAYS_PER_YEAR
}

/// Whole anniversaries of `anchor` reached by `date`; negative before the anchor.
pub fn anniversaries(anchor: NaiveDate, date: NaiveDate) -> i32 {
    let mut years = date.year() - anchor.year();
    if shift_year(anchor, years) > date {
        years -= 1;
    }
    years
}

pub fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    (first_of_month(next_year, next_month) - Duration::days(1)).day()
}

pub fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    let index = date.year() * 12 + date.month0() as i32 + months;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}

pub fn shift_year(date: NaiveDate, years: i32) -> NaiveDate {
    shift_month(date, years * 12)
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn nth_date_clamps_month_end_without_drift() {
        let monthly = TimeInterval::months(1);
        let anchor = date(2024, 1, 31);
        assert_eq!(monthly.nth_date(anchor, 1), date(2024, 2, 29));
        assert_eq!(monthly.nth_date(anchor, 2), date(2024, 3, 31));
        assert_eq!(monthly.nth_date(anchor, -2), date(2023, 11, 30));
    }

    #[test]
    fn frequency_maps_to_calendar_interval() {
        assert_eq!(TimeInterval::from_frequency(1).unwrap(), TimeInterval::months(12));
        assert_eq!(TimeInterval::from_frequency(4).unwrap(), TimeInterval::months(3));
        assert_eq!(TimeInterval::from_frequency(365).unwrap(), TimeInterval::days(1));
        assert!(TimeInterval::from_frequency(0).is_err());
    }

    #[test]
    fn bucket_start_aligns_to_calendar() {
        assert_eq!(TimeInterval::months(1).bucket_start(date(2025, 5, 17)), date(2025, 5, 1));
        assert_eq!(TimeInterval::months(3).bucket_start(date(2025, 5, 17)), date(2025, 4, 1));
        assert_eq!(TimeInterval::years(1).bucket_start(date(2025, 5, 17)), date(2025, 1, 1));
    }

    #[test]
    fn anniversaries_count_whole_years() {
        let anchor = date(2020, 3, 1);
        assert_eq!(anniversaries(anchor, date(2020, 3, 1)), 0);
        assert_eq!(anniversaries(anchor, date(2021, 2, 28)), 0);
        assert_eq!(anniversaries(anchor, date(2021, 3, 1)), 1);
        assert_eq!(anniversaries(anchor, date(2020, 2, 29)), -1);
        assert_eq!(anniversaries(anchor, date(2019, 3, 1)), -1);
    }

    #[test]
    fn leap_years_have_366_days() {
        assert_eq!(days_in_year(2024), 366);
        assert_eq!(days_in_year(2100), 365);
        assert_eq!(days_in_month(2023, 2), 28);
    }
}
