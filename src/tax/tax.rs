use chrono::Datelike;
use serde::{Deserialize, Serialize};

use super::carryover::{carry_losses, CarryoverOutcome};
use super::credit::TaxCredit;
use super::kind::TaxKind;
use super::{TaxPolicy, TaxTreatment, DEFAULT_CARRYBACK_YEARS, DEFAULT_CARRYFORWARD_YEARS};
use crate::errors::{FinanceError, Result};
use crate::ledger::time_interval::days_in_year;
use crate::ledger::Ledger;

fn default_carryforward() -> u32 {
    DEFAULT_CARRYFORWARD_YEARS
}

fn default_carryback() -> u32 {
    DEFAULT_CARRYBACK_YEARS
}

/// A tax levied on the sum of `basis` columns less the sum of `deductions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tax {
    pub name: String,
    pub kind: TaxKind,
    #[serde(default)]
    pub basis: Vec<String>,
    #[serde(default)]
    pub deductions: Vec<String>,
    /// Names of credits held by the tax manager, applied in this order.
    #[serde(default)]
    pub credits: Vec<String>,
    #[serde(default = "default_carryforward")]
    pub carryforward_years: u32,
    #[serde(default = "default_carryback")]
    pub carryback_years: u32,
}

/// One calendar year of a tax computation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualTax {
    pub year: i32,
    pub taxable_income: f64,
    /// Taxable income after loss carryback and carryforward.
    pub adjusted_income: f64,
    pub tax_before_credits: f64,
    pub tax: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxComputation {
    pub years: Vec<AnnualTax>,
    /// Tax apportioned onto the rows of the ledger it was computed from.
    pub column: Vec<f64>,
    pub unabsorbed_loss: f64,
    pub expired_loss: f64,
}

impl TaxComputation {
    pub fn annual_taxes(&self) -> Vec<f64> {
        self.years.iter().map(|y| y.tax).collect()
    }
}

struct YearRows {
    year: i32,
    rows: std::ops::Range<usize>,
}

fn group_by_year(ledger: &Ledger) -> Vec<YearRows> {
    let mut groups: Vec<YearRows> = Vec::new();
    for (row, date) in ledger.dates().iter().enumerate() {
        match groups.last_mut() {
            Some(group) if group.year == date.year() => group.rows.end = row + 1,
            _ => groups.push(YearRows {
                year: date.year(),
                rows: row..row + 1,
            }),
        }
    }
    groups
}

fn column_sum(ledger: &Ledger, names: &[String]) -> Result<Vec<f64>> {
    let mut total = vec![0.0; ledger.len()];
    for name in names {
        for (acc, value) in total.iter_mut().zip(ledger.require(name)?) {
            *acc += value;
        }
    }
    Ok(total)
}

impl Tax {
    pub fn new(name: impl Into<String>, kind: TaxKind) -> Self {
        Self {
            name: name.into(),
            kind,
            basis: Vec::new(),
            deductions: Vec::new(),
            credits: Vec::new(),
            carryforward_years: DEFAULT_CARRYFORWARD_YEARS,
            carryback_years: DEFAULT_CARRYBACK_YEARS,
        }
    }

    pub fn on(mut self, basis: &[&str], deductions: &[&str]) -> Self {
        self.basis = basis.iter().map(|s| s.to_string()).collect();
        self.deductions = deductions.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_carryover(mut self, carryback_years: u32, carryforward_years: u32) -> Self {
        self.carryback_years = carryback_years;
        self.carryforward_years = carryforward_years;
        self
    }

    pub fn with_credit(mut self, credit: impl Into<String>) -> Self {
        self.credits.push(credit.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.kind.validate(&self.name)?;
        let needs_income = !matches!(self.kind, TaxKind::Fixed { .. });
        if needs_income && self.basis.is_empty() {
            return Err(FinanceError::TaxUnderdefined {
                tax: self.name.clone(),
                reason: "no basis columns".into(),
            });
        }
        Ok(())
    }

    /// Computes the tax year by year over `ledger` and spreads each year's amount
    /// back onto its rows. `credits` must be this tax's credits, in order.
    pub fn compute(
        &self,
        ledger: &Ledger,
        credits: &[&TaxCredit],
        policy: &TaxPolicy,
    ) -> Result<TaxComputation> {
        self.validate()?;
        let gross = column_sum(ledger, &self.basis)?;
        let deductions = column_sum(ledger, &self.deductions)?;
        let groups = group_by_year(ledger);

        let annual_income: Vec<f64> = groups
            .iter()
            .map(|g| g.rows.clone().map(|r| gross[r] - deductions[r]).sum())
            .collect();
        let outcome = match policy.treatment {
            TaxTreatment::LossCarryover => carry_losses(
                &annual_income,
                self.carryback_years,
                self.carryforward_years,
                policy.carryback_order,
            ),
            TaxTreatment::Masked => CarryoverOutcome {
                adjusted: annual_income.iter().map(|v| v.max(0.0)).collect(),
                unabsorbed: 0.0,
                expired: 0.0,
            },
        };

        let credit_columns = credits
            .iter()
            .map(|credit| credit.column().map(|name| ledger.require(name)).transpose())
            .collect::<Result<Vec<Option<&[f64]>>>>()?;

        let mut years = Vec::with_capacity(groups.len());
        let mut column = vec![0.0; ledger.len()];
        for (idx, group) in groups.iter().enumerate() {
            let adjusted = outcome.adjusted[idx];
            let before_credits = self.kind.tax_due(adjusted);
            let mut tax = before_credits;
            for (credit, values) in credits.iter().zip(&credit_columns) {
                let units: f64 = values.map_or(0.0, |v| v[group.rows.clone()].iter().sum());
                tax = credit.apply(tax, credit.earned(units));
            }
            self.apportion(tax, group, &gross, &mut column);
            years.push(AnnualTax {
                year: group.year,
                taxable_income: annual_income[idx],
                adjusted_income: adjusted,
                tax_before_credits: before_credits,
                tax,
            });
        }

        Ok(TaxComputation {
            years,
            column,
            unabsorbed_loss: outcome.unabsorbed,
            expired_loss: outcome.expired,
        })
    }

    /// Income-proportional taxes follow each row's share of the year's gross
    /// income; the rest accrue evenly per day of the calendar year.
    fn apportion(&self, tax: f64, group: &YearRows, gross: &[f64], column: &mut [f64]) {
        if tax == 0.0 {
            return;
        }
        let rows = group.rows.clone();
        if self.kind.is_income_proportional() {
            let year_gross: f64 = gross[rows.clone()].iter().sum();
            if year_gross != 0.0 {
                for row in rows {
                    column[row] = tax * gross[row] / year_gross;
                }
            } else {
                let share = tax / rows.len() as f64;
                column[rows].iter_mut().for_each(|v| *v = share);
            }
        } else {
            let daily = tax / days_in_year(group.year) as f64;
            column[rows].iter_mut().for_each(|v| *v = daily);
        }
    }
}
