use serde::{Deserialize, Serialize};

use super::credit::TaxCredit;
use super::tax::{Tax, TaxComputation};
use super::TaxPolicy;
use crate::errors::{FinanceError, Result};
use crate::ledger::{columns, Ledger};

/// Named taxes and credits computed together. A tax may deduct another tax's
/// liability by naming it among its deductions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaxManager {
    #[serde(default)]
    taxes: Vec<Tax>,
    #[serde(default)]
    credits: Vec<TaxCredit>,
}

/// Per-tax columns and their sum in `Taxes`, on the input ledger's dates.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxOutcome {
    pub ledger: Ledger,
    pub computations: Vec<(String, TaxComputation)>,
    pub iterations: u32,
    pub converged: bool,
}

impl TaxManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tax(&mut self, tax: Tax) -> Result<()> {
        if self.tax(&tax.name).is_some() {
            return Err(FinanceError::DuplicateName {
                collection: "tax manager".into(),
                name: tax.name,
            });
        }
        tax.validate()?;
        self.taxes.push(tax);
        Ok(())
    }

    pub fn add_credit(&mut self, credit: TaxCredit) -> Result<()> {
        if self.credit(&credit.name).is_some() {
            return Err(FinanceError::DuplicateName {
                collection: "tax credits".into(),
                name: credit.name,
            });
        }
        credit.validate()?;
        self.credits.push(credit);
        Ok(())
    }

    pub fn tax(&self, name: &str) -> Option<&Tax> {
        self.taxes.iter().find(|t| t.name == name)
    }

    pub fn credit(&self, name: &str) -> Option<&TaxCredit> {
        self.credits.iter().find(|c| c.name == name)
    }

    pub fn taxes(&self) -> &[Tax] {
        &self.taxes
    }

    pub fn is_empty(&self) -> bool {
        self.taxes.is_empty()
    }

    /// Checks that every name a tax or credit refers to resolves to a ledger
    /// column, another tax, or a registered credit.
    pub fn validate(&self, ledger: &Ledger) -> Result<()> {
        let known = |name: &str| ledger.has_column(name) || self.tax(name).is_some();
        for (idx, tax) in self.taxes.iter().enumerate() {
            if self.taxes[..idx].iter().any(|t| t.name == tax.name) {
                return Err(FinanceError::DuplicateName {
                    collection: "tax manager".into(),
                    name: tax.name.clone(),
                });
            }
            tax.validate()?;
            if ledger.has_column(&tax.name) || tax.name == columns::TAXES {
                return Err(FinanceError::TaxManager(format!(
                    "tax `{}` would overwrite an existing ledger column",
                    tax.name
                )));
            }
            for name in tax.basis.iter().chain(&tax.deductions) {
                if name == &tax.name {
                    return Err(FinanceError::TaxManager(format!(
                        "tax `{}` refers to itself",
                        tax.name
                    )));
                }
                if !known(name) {
                    return Err(FinanceError::TaxManager(format!(
                        "tax `{}` refers to unknown column or tax `{name}`",
                        tax.name
                    )));
                }
            }
            for credit_name in &tax.credits {
                let credit = self.credit(credit_name).ok_or_else(|| {
                    FinanceError::TaxManager(format!(
                        "tax `{}` refers to unknown credit `{credit_name}`",
                        tax.name
                    ))
                })?;
                credit.validate()?;
                if let Some(column) = credit.column() {
                    if !known(column) {
                        return Err(FinanceError::TaxManager(format!(
                            "credit `{credit_name}` refers to unknown column `{column}`"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn credits_of(&self, tax: &Tax) -> Result<Vec<&TaxCredit>> {
        tax.credits
            .iter()
            .map(|name| {
                self.credit(name).ok_or_else(|| {
                    FinanceError::TaxManager(format!(
                        "tax `{}` refers to unknown credit `{name}`",
                        tax.name
                    ))
                })
            })
            .collect()
    }

    /// Computes every tax against `ledger`, feeding each liability back into the
    /// working ledger, until no annual liability moves by `policy.tolerance` or
    /// more, or `policy.max_iterations` passes have run.
    pub fn build(&self, ledger: &Ledger, policy: &TaxPolicy) -> Result<TaxOutcome> {
        self.validate(ledger)?;
        let mut working = ledger.clone();
        for tax in &self.taxes {
            working.set_column(&tax.name, vec![0.0; working.len()])?;
        }

        let mut previous: Vec<Vec<f64>> = vec![Vec::new(); self.taxes.len()];
        let mut computations = Vec::with_capacity(self.taxes.len());
        let mut iterations = 0;
        let mut converged = false;
        while iterations < policy.max_iterations.max(1) {
            iterations += 1;
            computations.clear();
            let mut max_change: f64 = 0.0;
            for (idx, tax) in self.taxes.iter().enumerate() {
                let credits = self.credits_of(tax)?;
                let computation = tax.compute(&working, &credits, policy)?;
                let annual = computation.annual_taxes();
                let change = if previous[idx].len() == annual.len() {
                    previous[idx]
                        .iter()
                        .zip(&annual)
                        .map(|(old, new)| (old - new).abs())
                        .fold(0.0, f64::max)
                } else {
                    annual.iter().map(|v| v.abs()).fold(0.0, f64::max)
                };
                max_change = max_change.max(change);
                working.set_column(&tax.name, computation.column.clone())?;
                previous[idx] = annual;
                computations.push((tax.name.clone(), computation));
            }
            tracing::trace!(iteration = iterations, max_change, "tax manager pass");
            if max_change < policy.tolerance {
                converged = true;
                break;
            }
        }
        if !converged {
            tracing::warn!(
                iterations,
                tolerance = policy.tolerance,
                "tax liabilities did not converge; using the last pass"
            );
        }

        let mut out = Ledger::new(ledger.dates().iter().copied());
        let mut total = vec![0.0; out.len()];
        for (name, computation) in &computations {
            for (acc, value) in total.iter_mut().zip(&computation.column) {
                *acc += value;
            }
            out.set_column(name, computation.column.clone())?;
        }
        out.set_column(columns::TAXES, total)?;
        Ok(TaxOutcome {
            ledger: out,
            computations,
            iterations,
            converged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tax::TaxKind;
    use chrono::NaiveDate;

    fn ledger() -> Ledger {
        let dates = [2021, 2022, 2023].map(|y| NaiveDate::from_ymd_opt(y, 6, 30).unwrap());
        let mut ledger = Ledger::new(dates);
        ledger.set_column("Revenue", vec![1_000.0; 3]).unwrap();
        ledger.set_column("Production", vec![40.0; 3]).unwrap();
        ledger
    }

    fn state() -> Tax {
        Tax::new("State_tax", TaxKind::Fractional { rate: 0.125 }).on(&["Revenue"], &[])
    }

    fn federal() -> Tax {
        Tax::new("Federal_tax", TaxKind::Fractional { rate: 0.25 })
            .on(&["Revenue"], &["State_tax"])
    }

    #[test]
    fn deductible_tax_feeds_the_next() {
        let mut manager = TaxManager::new();
        manager.add_tax(federal()).unwrap();
        manager.add_tax(state()).unwrap();
        let outcome = manager.build(&ledger(), &TaxPolicy::default()).unwrap();
        assert!(outcome.converged);
        assert_eq!(outcome.iterations, 3);
        let day = NaiveDate::from_ymd_opt(2022, 6, 30).unwrap();
        assert_eq!(outcome.ledger.value("State_tax", day), Some(125.0));
        assert_eq!(outcome.ledger.value("Federal_tax", day), Some(218.75));
        assert_eq!(outcome.ledger.value(columns::TAXES, day), Some(343.75));
    }

    #[test]
    fn credits_resolve_by_name() {
        let mut manager = TaxManager::new();
        manager
            .add_credit(TaxCredit::per_unit("Output", "Production", 0.5, false))
            .unwrap();
        manager.add_tax(state().with_credit("Output")).unwrap();
        let outcome = manager.build(&ledger(), &TaxPolicy::default()).unwrap();
        assert_eq!(outcome.computations[0].1.years[0].tax, 105.0);
    }

    #[test]
    fn unresolved_references_are_reported() {
        let mut manager = TaxManager::new();
        manager
            .add_tax(Tax::new("Royalty", TaxKind::Fractional { rate: 0.1 }).on(&["Revenue"], &["Leases"]))
            .unwrap();
        let err = manager.build(&ledger(), &TaxPolicy::default()).unwrap_err();
        assert!(matches!(err, FinanceError::TaxManager(_)));

        let mut manager = TaxManager::new();
        manager.add_tax(state().with_credit("Missing")).unwrap();
        assert!(matches!(
            manager.build(&ledger(), &TaxPolicy::default()),
            Err(FinanceError::TaxManager(_))
        ));
    }

    #[test]
    fn iteration_cap_is_respected() {
        let mut manager = TaxManager::new();
        manager.add_tax(federal()).unwrap();
        manager.add_tax(state()).unwrap();
        let policy = TaxPolicy {
            max_iterations: 1,
            ..TaxPolicy::default()
        };
        let outcome = manager.build(&ledger(), &policy).unwrap();
        assert_eq!(outcome.iterations, 1);
        assert!(!outcome.converged);
    }
}
