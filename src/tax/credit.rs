use serde::{Deserialize, Serialize};

use crate::errors::{FinanceError, Result};

/// What a credit is worth in a year.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CreditAmount {
    /// The same amount every year.
    Fixed { amount: f64 },
    /// `rate` per unit of a ledger column summed over the year (for example a
    /// production credit per kilogram).
    PerUnit { column: String, rate: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaxCredit {
    pub name: String,
    pub amount: CreditAmount,
    /// Refundable credits may take the tax below zero.
    #[serde(default)]
    pub refundable: bool,
}

impl TaxCredit {
    pub fn fixed(name: impl Into<String>, amount: f64, refundable: bool) -> Self {
        Self {
            name: name.into(),
            amount: CreditAmount::Fixed { amount },
            refundable,
        }
    }

    pub fn per_unit(
        name: impl Into<String>,
        column: impl Into<String>,
        rate: f64,
        refundable: bool,
    ) -> Self {
        Self {
            name: name.into(),
            amount: CreditAmount::PerUnit {
                column: column.into(),
                rate,
            },
            refundable,
        }
    }

    pub fn column(&self) -> Option<&str> {
        match &self.amount {
            CreditAmount::PerUnit { column, .. } => Some(column),
            CreditAmount::Fixed { .. } => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let value = match &self.amount {
            CreditAmount::Fixed { amount } => *amount,
            CreditAmount::PerUnit { rate, .. } => *rate,
        };
        if !value.is_finite() || value < 0.0 {
            return Err(FinanceError::TaxManager(format!(
                "credit `{}` has invalid value {value}",
                self.name
            )));
        }
        Ok(())
    }

    /// Credit earned in a year; `column_total` is the year's sum of the credit's
    /// column, ignored by fixed credits.
    pub fn earned(&self, column_total: f64) -> f64 {
        match &self.amount {
            CreditAmount::Fixed { amount } => *amount,
            CreditAmount::PerUnit { rate, .. } => rate * column_total,
        }
    }

    /// Tax remaining after this credit.
    pub fn apply(&self, tax: f64, earned: f64) -> f64 {
        if self.refundable {
            tax - earned
        } else {
            tax - earned.min(tax.max(0.0))
        }
    }
}
