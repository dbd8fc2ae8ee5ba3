use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::depreciation::ScheduledFraction;
use crate::errors::{FinanceError, Result};
use crate::ledger::{columns, Ledger, TimeInterval};

/// Fixed amount paid on a date, not escalated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScheduledAmount {
    pub date: NaiveDate,
    pub amount: f64,
}

/// How a capital item's installed cost turns into cash outlays.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentTerms {
    /// Spread over construction years by the project's capital-expense breakdown.
    #[default]
    ProjectBreakdown,
    LumpSumOnOrder,
    LumpSumOnDelivery,
    /// Equal instalments every `interval` from order up to (not including) delivery.
    EqualPeriodic { interval: TimeInterval },
    FractionalSchedule { entries: Vec<ScheduledFraction> },
    FixedSchedule { entries: Vec<ScheduledAmount> },
}

/// Dates and cost function an outlay schedule is built from.
pub struct OutlayInputs<'a> {
    pub item: &'a str,
    pub order: NaiveDate,
    pub delivery: NaiveDate,
    pub initial_date: NaiveDate,
    pub breakdown: &'a [f64],
}

impl PaymentTerms {
    /// Outlays keyed by payment date, in the `Capital_expenditures` column.
    pub fn outlays(
        &self,
        inputs: &OutlayInputs<'_>,
        tic: impl Fn(NaiveDate) -> Result<f64>,
    ) -> Result<Ledger> {
        let bad = |reason: String| FinanceError::BadCapitalPaymentInput {
            item: inputs.item.to_string(),
            reason,
        };
        if inputs.delivery < inputs.order {
            return Err(bad(format!(
                "delivery {} precedes order {}",
                inputs.delivery, inputs.order
            )));
        }
        let mut payments: Vec<(NaiveDate, f64)> = Vec::new();
        match self {
            PaymentTerms::ProjectBreakdown => {
                if inputs.breakdown.is_empty() {
                    return Err(bad("project capital-expense breakdown is empty".into()));
                }
                let year = TimeInterval::years(1);
                for (idx, fraction) in inputs.breakdown.iter().enumerate() {
                    let date = year.nth_date(inputs.initial_date, idx as i32);
                    payments.push((date, fraction * tic(date)?));
                }
            }
            PaymentTerms::LumpSumOnOrder => payments.push((inputs.order, tic(inputs.order)?)),
            PaymentTerms::LumpSumOnDelivery => {
                payments.push((inputs.delivery, tic(inputs.delivery)?))
            }
            PaymentTerms::EqualPeriodic { interval } => {
                if !interval.is_positive() {
                    return Err(bad("payment interval must be positive".into()));
                }
                let dates: Vec<NaiveDate> = (0..)
                    .map(|k| interval.nth_date(inputs.order, k))
                    .take_while(|d| *d < inputs.delivery)
                    .collect();
                if dates.is_empty() {
                    return Err(bad("no payment dates between order and delivery".into()));
                }
                let instalment = tic(inputs.order)? / dates.len() as f64;
                payments.extend(dates.into_iter().map(|d| (d, instalment)));
            }
            PaymentTerms::FractionalSchedule { entries } => {
                let total: f64 = entries.iter().map(|e| e.fraction).sum();
                if (total - 1.0).abs() > 1e-6 {
                    return Err(bad(format!("payment fractions sum to {total}, not 1")));
                }
                for entry in entries {
                    payments.push((entry.date, entry.fraction * tic(entry.date)?));
                }
            }
            PaymentTerms::FixedSchedule { entries } => {
                if entries.is_empty() {
                    return Err(bad("fixed payment schedule is empty".into()));
                }
                payments.extend(entries.iter().map(|e| (e.date, e.amount)));
            }
        }

        let mut ledger = Ledger::default();
        for (date, amount) in payments {
            ledger.add_entry(columns::CAPITAL_EXPENDITURES, date, amount);
        }
        Ok(ledger)
    }
}
