//! Debt instruments and the portfolio that aggregates their cash flows.

pub mod loan;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{FinanceError, Result};
use crate::ledger::{columns, Ledger};

pub use loan::{level_payment, Debt, Scheduler};

/// Named collection of debt instruments; member names are unique.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DebtPortfolio {
    #[serde(default)]
    debts: Vec<Debt>,
}

impl DebtPortfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, debt: Debt) -> Result<()> {
        if self.get(&debt.name).is_some() {
            return Err(FinanceError::DuplicateName {
                collection: "debt portfolio".into(),
                name: debt.name,
            });
        }
        debt.validate()?;
        self.debts.push(debt);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Debt> {
        let idx = self.debts.iter().position(|d| d.name == name)?;
        Some(self.debts.remove(idx))
    }

    pub fn get(&self, name: &str) -> Option<&Debt> {
        self.debts.iter().find(|d| d.name == name)
    }

    pub fn debts(&self) -> &[Debt] {
        &self.debts
    }

    pub fn len(&self) -> usize {
        self.debts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.debts.is_empty()
    }

    /// Rejects duplicated names, which deserialisation cannot prevent.
    pub fn validate(&self) -> Result<()> {
        for (idx, debt) in self.debts.iter().enumerate() {
            if self.debts[..idx].iter().any(|d| d.name == debt.name) {
                return Err(FinanceError::DuplicateName {
                    collection: "debt portfolio".into(),
                    name: debt.name.clone(),
                });
            }
            debt.validate()?;
        }
        Ok(())
    }

    /// Every member schedule added date by date, balance included.
    ///
    /// `Principal_balance` is a stock: on a date it is the sum of the balances of
    /// the members paying on that date, not of the whole portfolio. Read it with
    /// [`Ledger::value_on_or_before`] per member and never pass it through
    /// [`Ledger::roll_up`], which sums it within each bucket.
    pub fn schedule(&self) -> Result<Ledger> {
        let mut ledger = Ledger::default();
        for debt in &self.debts {
            ledger.merge_add(&debt.schedule()?);
        }
        Ok(ledger)
    }

    /// Proceeds, interest and principal payments of all members over their whole
    /// terms, without the balance.
    pub fn cash_flows(&self) -> Result<Ledger> {
        let mut ledger = self.schedule()?;
        ledger.remove_column(columns::PRINCIPAL_BALANCE);
        Ok(ledger)
    }

    /// Cash proceeds, interest and principal payments of all members within
    /// `start..=end`.
    pub fn cip(&self, start: NaiveDate, end: NaiveDate) -> Result<Ledger> {
        let mut ledger = self.cash_flows()?.slice(start, end);
        for name in [
            columns::LOAN_PROCEEDS,
            columns::INTEREST,
            columns::PRINCIPAL_PAYMENTS,
        ] {
            if !ledger.has_column(name) {
                let zeros = vec![0.0; ledger.len()];
                ledger.set_column(name, zeros)?;
            }
        }
        Ok(ledger)
    }
}
