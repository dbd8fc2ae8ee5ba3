use serde::{Deserialize, Serialize};

use crate::errors::{FinanceError, Result};

/// Lower edge of a bracket and the rate (or amount) applying from it upwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bracket {
    pub threshold: f64,
    pub value: f64,
}

impl Bracket {
    pub fn new(threshold: f64, value: f64) -> Self {
        Self { threshold, value }
    }
}

/// How a year's taxable income turns into tax due.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaxKind {
    /// Flat rate on positive income.
    Fractional { rate: f64 },
    /// Marginal rates: each bracket's rate applies to the income inside it.
    GraduatedFractional { brackets: Vec<Bracket> },
    /// Flat amount charged every year, whatever the income.
    Fixed { amount: f64 },
    /// Amount of the bracket containing the income, charged whole.
    GraduatedFixed { brackets: Vec<Bracket> },
}

impl TaxKind {
    /// Whether the tax scales with income; decides how an annual amount is spread
    /// back over the year.
    pub fn is_income_proportional(&self) -> bool {
        matches!(
            self,
            TaxKind::Fractional { .. } | TaxKind::GraduatedFractional { .. }
        )
    }

    pub fn validate(&self, tax: &str) -> Result<()> {
        let underdefined = |reason: String| FinanceError::TaxUnderdefined {
            tax: tax.to_string(),
            reason,
        };
        match self {
            TaxKind::Fractional { rate } if !rate.is_finite() => {
                Err(underdefined(format!("rate {rate} is not finite")))
            }
            TaxKind::Fixed { amount } if !amount.is_finite() => {
                Err(underdefined(format!("amount {amount} is not finite")))
            }
            TaxKind::GraduatedFractional { brackets } | TaxKind::GraduatedFixed { brackets } => {
                if brackets.is_empty() {
                    return Err(underdefined("rate table has no brackets".into()));
                }
                for bracket in brackets {
                    if !bracket.threshold.is_finite() || bracket.threshold < 0.0 {
                        return Err(underdefined(format!(
                            "bracket threshold {} must be non-negative",
                            bracket.threshold
                        )));
                    }
                    if !bracket.value.is_finite() {
                        return Err(underdefined(format!(
                            "bracket value {} is not finite",
                            bracket.value
                        )));
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Tax due on a year's taxable income, before credits.
    pub fn tax_due(&self, income: f64) -> f64 {
        match self {
            TaxKind::Fractional { rate } => income.max(0.0) * rate,
            TaxKind::Fixed { amount } => *amount,
            TaxKind::GraduatedFractional { brackets } => {
                let sorted = sorted(brackets);
                sorted
                    .iter()
                    .enumerate()
                    .map(|(idx, bracket)| {
                        let upper = sorted
                            .get(idx + 1)
                            .map_or(f64::INFINITY, |next| next.threshold);
                        let width = income.min(upper) - bracket.threshold;
                        width.max(0.0) * bracket.value
                    })
                    .sum()
            }
            TaxKind::GraduatedFixed { brackets } => sorted(brackets)
                .iter()
                .rev()
                .find(|bracket| income >= bracket.threshold)
                .map_or(0.0, |bracket| bracket.value),
        }
    }
}

fn sorted(brackets: &[Bracket]) -> Vec<Bracket> {
    let mut sorted = brackets.to_vec();
    sorted.sort_by(|a, b| a.threshold.total_cmp(&b.threshold));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Vec<Bracket> {
        vec![
            Bracket::new(100.0, 0.2),
            Bracket::new(0.0, 0.1),
            Bracket::new(500.0, 0.3),
        ]
    }

    #[test]
    fn graduated_fractional_is_marginal() {
        let kind = TaxKind::GraduatedFractional { brackets: table() };
        assert!((kind.tax_due(50.0) - 5.0).abs() < 1e-12);
        assert!((kind.tax_due(300.0) - (10.0 + 40.0)).abs() < 1e-12);
        assert!((kind.tax_due(1_000.0) - (10.0 + 80.0 + 150.0)).abs() < 1e-12);
        assert_eq!(kind.tax_due(-10.0), 0.0);
    }

    #[test]
    fn graduated_fixed_charges_containing_bracket() {
        let kind = TaxKind::GraduatedFixed {
            brackets: vec![Bracket::new(1_000.0, 50.0), Bracket::new(10_000.0, 400.0)],
        };
        assert_eq!(kind.tax_due(999.0), 0.0);
        assert_eq!(kind.tax_due(1_000.0), 50.0);
        assert_eq!(kind.tax_due(20_000.0), 400.0);
    }

    #[test]
    fn flat_kinds() {
        assert_eq!(TaxKind::Fractional { rate: 0.25 }.tax_due(400.0), 100.0);
        assert_eq!(TaxKind::Fractional { rate: 0.25 }.tax_due(-400.0), 0.0);
        assert_eq!(TaxKind::Fixed { amount: 12.0 }.tax_due(-1.0), 12.0);
    }

    #[test]
    fn empty_or_negative_tables_are_underdefined() {
        let empty = TaxKind::GraduatedFractional { brackets: vec![] };
        assert!(matches!(
            empty.validate("State"),
            Err(FinanceError::TaxUnderdefined { .. })
        ));
        let negative = TaxKind::GraduatedFixed {
            brackets: vec![Bracket::new(-1.0, 1.0)],
        };
        assert!(negative.validate("State").is_err());
    }
}
