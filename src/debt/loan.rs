use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::{FinanceError, Result};
use crate::ledger::{columns, Ledger, TimeInterval};

/// How a debt instrument retires its principal.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Scheduler {
    /// Level payments covering interest and principal.
    #[default]
    Amortizing,
    /// Interest-only payments, principal repaid with the final payment.
    Bullet,
}

/// Level periodic payment retiring `principal` over `periods` payments at
/// `periodic_rate` per payment.
pub fn level_payment(principal: f64, periodic_rate: f64, periods: u32) -> f64 {
    if periods == 0 {
        return 0.0;
    }
    if periodic_rate == 0.0 {
        return principal / periods as f64;
    }
    let growth = (1.0 + periodic_rate).powi(periods as i32);
    principal * periodic_rate * growth / (growth - 1.0)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Debt {
    pub name: String,
    pub principal: f64,
    #[serde(default)]
    pub origination: Option<NaiveDate>,
    #[serde(default)]
    pub term: Option<TimeInterval>,
    /// Annual nominal rate.
    pub rate: f64,
    pub payments_per_year: u32,
    #[serde(default)]
    pub scheduler: Scheduler,
}

impl Debt {
    pub fn loan(
        name: impl Into<String>,
        principal: f64,
        origination: NaiveDate,
        term: TimeInterval,
        rate: f64,
        payments_per_year: u32,
    ) -> Self {
        Self {
            name: name.into(),
            principal,
            origination: Some(origination),
            term: Some(term),
            rate,
            payments_per_year,
            scheduler: Scheduler::Amortizing,
        }
    }

    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    fn bad(&self, reason: impl Into<String>) -> FinanceError {
        FinanceError::BadDebtInput {
            debt: self.name.clone(),
            reason: reason.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let term = self
            .term
            .ok_or_else(|| FinanceError::missing_info(&self.name, "term"))?;
        if self.origination.is_none() {
            return Err(FinanceError::missing_info(&self.name, "origination"));
        }
        if !self.principal.is_finite() || self.principal < 0.0 {
            return Err(self.bad(format!("principal {} must be non-negative", self.principal)));
        }
        if !self.rate.is_finite() || self.rate < 0.0 {
            return Err(self.bad(format!("rate {} must be non-negative", self.rate)));
        }
        if self.payments_per_year == 0 {
            return Err(self.bad("payments per year must be positive"));
        }
        if !term.is_positive() {
            return Err(self.bad("term must be a positive duration"));
        }
        Ok(())
    }

    /// Number of scheduled payments over the term.
    pub fn payment_count(&self) -> Result<u32> {
        self.validate()?;
        let term = self
            .term
            .ok_or_else(|| FinanceError::missing_info(&self.name, "term"))?;
        let count = (term.in_years() * self.payments_per_year as f64).round();
        if count < 1.0 {
            return Err(self.bad(format!(
                "term {} is shorter than one payment period",
                term.label()
            )));
        }
        Ok(count as u32)
    }

    pub fn periodic_payment(&self) -> Result<f64> {
        let periods = self.payment_count()?;
        let periodic_rate = self.rate / self.payments_per_year as f64;
        Ok(match self.scheduler {
            Scheduler::Amortizing => level_payment(self.principal, periodic_rate, periods),
            Scheduler::Bullet => self.principal * periodic_rate,
        })
    }

    /// Proceeds on origination, then interest, principal paid and remaining balance on
    /// each payment date. Payment `k` falls on the last day of the `k`-th period
    /// counted from origination, so an annual loan taken on 1 January pays on
    /// 31 December of the same year.
    pub fn schedule(&self) -> Result<Ledger> {
        let periods = self.payment_count()?;
        let origination = self
            .origination
            .ok_or_else(|| FinanceError::missing_info(&self.name, "origination"))?;
        let interval = TimeInterval::from_frequency(self.payments_per_year)?;
        let periodic_rate = self.rate / self.payments_per_year as f64;
        let payment = self.periodic_payment()?;

        let mut ledger = Ledger::default();
        ledger.add_entry(columns::LOAN_PROCEEDS, origination, self.principal);
        ledger.add_entry(columns::PRINCIPAL_BALANCE, origination, self.principal);

        let mut balance = self.principal;
        for k in 1..=periods {
            if balance <= 0.0 {
                break;
            }
            let date = interval.nth_date(origination, k as i32) - Duration::days(1);
            let interest = balance * periodic_rate;
            let mut principal_paid = match self.scheduler {
                Scheduler::Amortizing => payment - interest,
                Scheduler::Bullet if k == periods => balance,
                Scheduler::Bullet => 0.0,
            };
            if k == periods || principal_paid > balance {
                principal_paid = balance;
            }
            balance -= principal_paid;
            ledger.add_entry(columns::INTEREST, date, interest);
            ledger.add_entry(columns::PRINCIPAL_PAYMENTS, date, principal_paid);
            ledger.add_entry(columns::PRINCIPAL_BALANCE, date, balance);
        }
        tracing::debug!(debt = %self.name, periods, payment, "debt schedule built");
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bond(scheduler: Scheduler) -> Debt {
        Debt::loan("Bond", 1_000.0, date(2020, 1, 1), TimeInterval::years(5), 0.1, 1)
            .with_scheduler(scheduler)
    }

    #[test]
    fn zero_rate_repays_in_equal_parts() {
        assert_eq!(level_payment(1_200.0, 0.0, 12), 100.0);
    }

    #[test]
    fn amortizing_retires_principal() {
        let schedule = bond(Scheduler::Amortizing).schedule().unwrap();
        assert!((schedule.total(columns::PRINCIPAL_PAYMENTS) - 1_000.0).abs() < 1e-9);
        assert_eq!(schedule.value(columns::PRINCIPAL_BALANCE, date(2024, 12, 31)), Some(0.0));
        assert_eq!(schedule.value(columns::INTEREST, date(2020, 12, 31)), Some(100.0));
    }

    #[test]
    fn bullet_pays_interest_then_principal() {
        let schedule = bond(Scheduler::Bullet).schedule().unwrap();
        assert!((schedule.total(columns::INTEREST) - 500.0).abs() < 1e-9);
        assert_eq!(schedule.value(columns::PRINCIPAL_PAYMENTS, date(2023, 12, 31)), Some(0.0));
        assert_eq!(
            schedule.value(columns::PRINCIPAL_PAYMENTS, date(2024, 12, 31)),
            Some(1_000.0)
        );
    }

    #[test]
    fn payments_fall_on_period_ends() {
        let monthly = Debt::loan("Line", 1_200.0, date(2024, 1, 15), TimeInterval::years(1), 0.0, 12);
        let schedule = monthly.schedule().unwrap();
        assert_eq!(schedule.first_date(), Some(date(2024, 1, 15)));
        assert_eq!(schedule.value(columns::PRINCIPAL_PAYMENTS, date(2024, 2, 14)), Some(100.0));
        assert_eq!(schedule.last_date(), Some(date(2025, 1, 14)));
        assert_eq!(schedule.len(), 13);
    }

    #[test]
    fn unset_and_invalid_fields_are_reported() {
        let mut debt = bond(Scheduler::Amortizing);
        debt.term = None;
        assert!(matches!(debt.schedule(), Err(FinanceError::MissingInfo { .. })));

        let mut debt = bond(Scheduler::Amortizing);
        debt.rate = -0.01;
        assert!(matches!(debt.schedule(), Err(FinanceError::BadDebtInput { .. })));

        let mut debt = bond(Scheduler::Amortizing);
        debt.payments_per_year = 0;
        assert!(matches!(debt.schedule(), Err(FinanceError::BadDebtInput { .. })));
    }
}
