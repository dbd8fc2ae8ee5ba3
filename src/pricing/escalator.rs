use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{FinanceError, Result};
use crate::ledger::time_interval::year_fraction;

/// Observation of a price index (for example a plant cost index) on a date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IndexPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Projects a price quoted on one date to an equivalent price on another.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Escalator {
    #[default]
    None,
    /// Compounds at the project's inflation rate; resolved by the schedule context.
    GeneralInflation,
    /// Compounds at a fixed annual rate.
    Inflation { rate: f64 },
    /// Ratio of index values, linearly interpolated between observations and held
    /// flat beyond the first and last.
    Index { points: Vec<IndexPoint> },
}

impl Escalator {
    /// Replaces `GeneralInflation` with a concrete rate.
    pub fn resolve(&self, general_rate: f64) -> Escalator {
        match self {
            Escalator::GeneralInflation => Escalator::Inflation { rate: general_rate },
            other => other.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Escalator::Inflation { rate } if !rate.is_finite() || *rate <= -1.0 => Err(
                FinanceError::BadPricingInput(format!("inflation rate {rate} must exceed -100%")),
            ),
            Escalator::Index { points } if points.is_empty() => Err(
                FinanceError::BadPricingInput("index escalator has no observations".into()),
            ),
            Escalator::Index { points } => match points.iter().find(|p| !(p.value > 0.0)) {
                Some(p) => Err(FinanceError::BadPricingInput(format!(
                    "index value {} on {} must be positive",
                    p.value, p.date
                ))),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }

    /// Multiplier taking a price quoted on `from` to its equivalent on `to`.
    pub fn factor(&self, from: NaiveDate, to: NaiveDate) -> Result<f64> {
        match self {
            Escalator::None => Ok(1.0),
            Escalator::GeneralInflation => Err(FinanceError::BadPricingInput(
                "general inflation must be resolved against the project inflation rate".into(),
            )),
            Escalator::Inflation { rate } => {
                self.validate()?;
                Ok((1.0 + rate).powf(year_fraction(from, to)))
            }
            Escalator::Index { points } => {
                self.validate()?;
                let mut sorted = points.clone();
                sorted.sort_by_key(|p| p.date);
                Ok(index_at(&sorted, to) / index_at(&sorted, from))
            }
        }
    }
}

fn index_at(points: &[IndexPoint], date: NaiveDate) -> f64 {
    let after = points.partition_point(|p| p.date <= date);
    match after {
        0 => points[0].value,
        n if n == points.len() => points[n - 1].value,
        n => {
            let (lo, hi) = (points[n - 1], points[n]);
            let span = (hi.date - lo.date).num_days() as f64;
            let offset = (date - lo.date).num_days() as f64;
            lo.value + (hi.value - lo.value) * offset / span
        }
    }
}
