use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::{FinanceError, Result};
use crate::ledger::{columns, Ledger, TimeInterval};

/// MACRS general depreciation system, half-year convention: fraction of cost
/// recovered in each year of a recovery period. A period of N years spans N + 1
/// tax years.
pub const MACRS_HALF_YEAR: &[(u32, &[f64])] = &[
    (3, &[0.3333, 0.4445, 0.1481, 0.0741]),
    (5, &[0.2000, 0.3200, 0.1920, 0.1152, 0.1152, 0.0576]),
    (
        7,
        &[0.1429, 0.2449, 0.1749, 0.1249, 0.0893, 0.0892, 0.0893, 0.0446],
    ),
    (
        10,
        &[
            0.1000, 0.1800, 0.1440, 0.1152, 0.0922, 0.0737, 0.0655, 0.0655, 0.0656, 0.0655,
            0.0328,
        ],
    ),
    (
        15,
        &[
            0.0500, 0.0950, 0.0855, 0.0770, 0.0693, 0.0623, 0.0590, 0.0590, 0.0591, 0.0590,
            0.0591, 0.0590, 0.0591, 0.0590, 0.0591, 0.0295,
        ],
    ),
    (
        20,
        &[
            0.03750, 0.07219, 0.06677, 0.06177, 0.05713, 0.05285, 0.04888, 0.04522, 0.04462,
            0.04461, 0.04462, 0.04461, 0.04462, 0.04461, 0.04462, 0.04461, 0.04462, 0.04461,
            0.04462, 0.04461, 0.02231,
        ],
    ),
];

pub fn macrs_table(length: u32) -> Option<&'static [f64]> {
    MACRS_HALF_YEAR
        .iter()
        .find(|(years, _)| *years == length)
        .map(|(_, table)| *table)
}

/// Fraction of a total falling on a date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScheduledFraction {
    pub date: NaiveDate,
    pub fraction: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Depreciation {
    NonDepreciable,
    #[default]
    StraightLine,
    Macrs,
    /// Explicit fractions of cost written off on given dates.
    Schedule { entries: Vec<ScheduledFraction> },
}

impl Depreciation {
    /// Per-day depreciation of `cost` placed in service on `start` and recovered over
    /// `length` years.
    pub fn schedule(&self, item: &str, cost: f64, start: NaiveDate, length: u32) -> Result<Ledger> {
        let bad = |reason: String| FinanceError::BadCapitalDepreciationInput {
            item: item.to_string(),
            reason,
        };
        if !cost.is_finite() {
            return Err(bad(format!("depreciable cost {cost} is not finite")));
        }
        match self {
            Depreciation::NonDepreciable => Ok(Ledger::default()),
            Depreciation::StraightLine => {
                if length == 0 {
                    return Err(bad("depreciation length must be positive".into()));
                }
                let end = TimeInterval::years(length).nth_date(start, 1) - Duration::days(1);
                let mut ledger = Ledger::daily(start, end)?;
                let rate = cost / ledger.len() as f64;
                ledger.set_column(columns::DEPRECIATION, vec![rate; ledger.len()])?;
                Ok(ledger)
            }
            Depreciation::Macrs => {
                if length == 0 {
                    return Err(bad("depreciation length must be positive".into()));
                }
                let table = macrs_table(length).ok_or_else(|| {
                    bad(format!("no MACRS table for a {length}-year recovery period"))
                })?;
                let year = TimeInterval::years(1);
                let end = year.nth_date(start, table.len() as i32) - Duration::days(1);
                let mut ledger = Ledger::daily(start, end)?;
                let mut values = Vec::with_capacity(ledger.len());
                for (y, share) in table.iter().enumerate() {
                    let bucket_start = year.nth_date(start, y as i32);
                    let bucket_end = year.nth_date(start, y as i32 + 1);
                    let days = (bucket_end - bucket_start).num_days() as usize;
                    let rate = cost * share / days as f64;
                    values.extend(std::iter::repeat(rate).take(days));
                }
                ledger.set_column(columns::DEPRECIATION, values)?;
                Ok(ledger)
            }
            Depreciation::Schedule { entries } => {
                let mut ledger = Ledger::default();
                for entry in entries {
                    if entry.date < start {
                        return Err(bad(format!(
                            "schedule entry on {} precedes the in-service date {start}",
                            entry.date
                        )));
                    }
                    if !entry.fraction.is_finite() {
                        return Err(bad(format!("fraction {} is not finite", entry.fraction)));
                    }
                    ledger.add_entry(columns::DEPRECIATION, entry.date, cost * entry.fraction);
                }
                Ok(ledger)
            }
        }
    }
}
