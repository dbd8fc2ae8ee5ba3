use std::collections::BTreeSet;
use std::fmt::Write as _;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::time_interval::TimeInterval;
use crate::errors::{FinanceError, Result};

/// A single named numeric series aligned with the ledger's date index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// Date-indexed table of named numeric columns.
///
/// Dates are kept sorted and unique; every column holds exactly one value per date.
/// Merging is an outer join on dates with absent values read as zero, so rows are
/// never dropped by a merge. Only [`Ledger::slice`] removes rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Ledger {
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl Ledger {
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        let dates: BTreeSet<NaiveDate> = dates.into_iter().collect();
        Self {
            dates: dates.into_iter().collect(),
            columns: Vec::new(),
        }
    }

    /// One row per calendar day from `start` through `end`, inclusive.
    pub fn daily(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(FinanceError::InvalidWindow(format!(
                "end {end} precedes start {start}"
            )));
        }
        let days = (end - start).num_days() as usize + 1;
        let mut dates = Vec::with_capacity(days);
        let mut current = start;
        while current <= end {
            dates.push(current);
            current += Duration::days(1);
        }
        Ok(Self {
            dates,
            columns: Vec::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.column_index(name)
            .map(|idx| self.columns[idx].values.as_slice())
    }

    pub fn require(&self, name: &str) -> Result<&[f64]> {
        self.column(name)
            .ok_or_else(|| FinanceError::MissingColumn(name.to_string()))
    }

    /// Column values, or zeros when the column is absent.
    pub fn column_or_zero(&self, name: &str) -> Vec<f64> {
        self.column(name)
            .map(<[f64]>::to_vec)
            .unwrap_or_else(|| vec![0.0; self.len()])
    }

    /// Inserts or replaces a column. The value count must match the row count.
    pub fn set_column(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if values.len() != self.len() {
            return Err(FinanceError::LengthMismatch {
                column: name.to_string(),
                expected: self.len(),
                found: values.len(),
            });
        }
        match self.column_index(name) {
            Some(idx) => self.columns[idx].values = values,
            None => self.columns.push(Column {
                name: name.to_string(),
                values,
            }),
        }
        Ok(())
    }

    /// Adds `amount` to `name` on `date`, creating the row and the column when absent.
    pub fn add_entry(&mut self, name: &str, date: NaiveDate, amount: f64) {
        let mut entry = Ledger::new([date]);
        entry.columns.push(Column {
            name: name.to_string(),
            values: vec![amount],
        });
        self.merge_add(&entry);
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.columns.remove(idx).values)
    }

    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    pub fn value(&self, name: &str, date: NaiveDate) -> Option<f64> {
        let row = self.position(date)?;
        self.column(name).map(|values| values[row])
    }

    /// Most recent value of `name` dated on or before `date`.
    pub fn value_on_or_before(&self, name: &str, date: NaiveDate) -> Option<f64> {
        let values = self.column(name)?;
        let row = match self.dates.binary_search(&date) {
            Ok(idx) => idx,
            Err(0) => return None,
            Err(idx) => idx - 1,
        };
        Some(values[row])
    }

    /// Every column's value on `date`, in column order.
    pub fn row(&self, date: NaiveDate) -> Option<Vec<(&str, f64)>> {
        let row = self.position(date)?;
        Some(
            self.columns
                .iter()
                .map(|c| (c.name.as_str(), c.values[row]))
                .collect(),
        )
    }

    pub fn total(&self, name: &str) -> f64 {
        self.column(name).map(|v| v.iter().sum()).unwrap_or(0.0)
    }

    /// Rows dated within `start..=end`.
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> Ledger {
        let lo = self.dates.partition_point(|d| *d < start);
        let hi = self.dates.partition_point(|d| *d <= end).max(lo);
        Ledger {
            dates: self.dates[lo..hi].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: c.values[lo..hi].to_vec(),
                })
                .collect(),
        }
    }

    /// Outer join with `other`, adding values of same-named columns.
    pub fn merge_add(&mut self, other: &Ledger) {
        self.merge_with(other, |mine, theirs| mine + theirs);
    }

    /// Outer join with `other`, letting its columns replace same-named ones on the
    /// dates it covers.
    pub fn merge_overwrite(&mut self, other: &Ledger) {
        self.merge_with(other, |_, theirs| theirs);
    }

    /// Copies `other`'s columns onto this ledger's own index, adding values that fall
    /// on shared dates and discarding those outside it. Returns the absolute amount
    /// discarded so callers can report it.
    pub fn absorb(&mut self, other: &Ledger) -> f64 {
        let mut dropped = 0.0;
        for column in &other.columns {
            let mut values = self.column_or_zero(&column.name);
            for (date, value) in other.dates.iter().zip(&column.values) {
                match self.position(*date) {
                    Some(row) => values[row] += value,
                    None => dropped += value.abs(),
                }
            }
            // Lengths match by construction.
            let _ = self.set_column(&column.name, values);
        }
        dropped
    }

    /// Sums every column into calendar buckets of `interval`; each output row is dated
    /// at its bucket start.
    pub fn roll_up(&self, interval: TimeInterval) -> Ledger {
        let mut dates: Vec<NaiveDate> = Vec::new();
        let mut bucket_of = Vec::with_capacity(self.len());
        for date in &self.dates {
            let start = interval.bucket_start(*date);
            if dates.last() != Some(&start) {
                dates.push(start);
            }
            bucket_of.push(dates.len() - 1);
        }
        let columns = self
            .columns
            .iter()
            .map(|c| {
                let mut values = vec![0.0; dates.len()];
                for (bucket, value) in bucket_of.iter().zip(&c.values) {
                    values[*bucket] += value;
                }
                Column {
                    name: c.name.clone(),
                    values,
                }
            })
            .collect();
        Ledger { dates, columns }
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::from("Date");
        for column in &self.columns {
            out.push(',');
            out.push_str(&column.name);
        }
        out.push('\n');
        for (row, date) in self.dates.iter().enumerate() {
            let _ = write!(out, "{date}");
            for column in &self.columns {
                let _ = write!(out, ",{}", column.values[row]);
            }
            out.push('\n');
        }
        out
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    fn merge_with(&mut self, other: &Ledger, combine: impl Fn(f64, f64) -> f64) {
        if other.dates.is_empty() && other.columns.is_empty() {
            return;
        }
        let union: BTreeSet<NaiveDate> = self.dates.iter().chain(&other.dates).copied().collect();
        if union.len() != self.dates.len() {
            let dates: Vec<NaiveDate> = union.into_iter().collect();
            let positions: Vec<usize> = self
                .dates
                .iter()
                .map(|d| dates.binary_search(d).unwrap_or_default())
                .collect();
            for column in &mut self.columns {
                let mut values = vec![0.0; dates.len()];
                for (pos, value) in positions.iter().zip(&column.values) {
                    values[*pos] = *value;
                }
                column.values = values;
            }
            self.dates = dates;
        }
        let rows: Vec<usize> = other
            .dates
            .iter()
            .map(|d| self.dates.binary_search(d).unwrap_or_default())
            .collect();
        for column in &other.columns {
            let idx = match self.column_index(&column.name) {
                Some(idx) => idx,
                None => {
                    self.columns.push(Column {
                        name: column.name.clone(),
                        values: vec![0.0; self.dates.len()],
                    });
                    self.columns.len() - 1
                }
            };
            let target = &mut self.columns[idx].values;
            for (row, value) in rows.iter().zip(&column.values) {
                target[*row] = combine(target[*row], *value);
            }
        }
    }
}
