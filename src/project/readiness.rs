use std::fmt;

use super::context::ScheduleContext;
use crate::capex::CapitalCosts;
use crate::debt::DebtPortfolio;
use crate::errors::{FinanceError, Result};
use crate::operations::{FixedCosts, VariableCosts};

/// Inputs that must all be installed before a project can be assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Parameters,
    CapitalCosts,
    FixedCosts,
    VariableCosts,
    Debt,
}

impl Gate {
    pub const ALL: [Gate; 5] = [
        Gate::Parameters,
        Gate::CapitalCosts,
        Gate::FixedCosts,
        Gate::VariableCosts,
        Gate::Debt,
    ];
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Gate::Parameters => "complete financial parameters",
            Gate::CapitalCosts => "capital costs",
            Gate::FixedCosts => "fixed costs",
            Gate::VariableCosts => "variable costs",
            Gate::Debt => "debt portfolio",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    Unset,
    Set(T),
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot::Unset
    }
}

impl<T> Slot<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Slot::Set(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Slot::Set(value) => Some(value),
            Slot::Unset => None,
        }
    }
}

/// One slot per gate. The parameters slot holds the schedule context, which only
/// exists once the parameter set is complete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Readiness {
    pub context: Slot<ScheduleContext>,
    pub capital_costs: Slot<CapitalCosts>,
    pub fixed_costs: Slot<FixedCosts>,
    pub variable_costs: Slot<VariableCosts>,
    pub debt: Slot<DebtPortfolio>,
}

/// Borrowed view of a fully gated project.
pub struct ReadyInputs<'a> {
    pub context: &'a ScheduleContext,
    pub capital_costs: &'a CapitalCosts,
    pub fixed_costs: &'a FixedCosts,
    pub variable_costs: &'a VariableCosts,
    pub debt: &'a DebtPortfolio,
}

impl Readiness {
    pub fn is_set(&self, gate: Gate) -> bool {
        match gate {
            Gate::Parameters => self.context.is_set(),
            Gate::CapitalCosts => self.capital_costs.is_set(),
            Gate::FixedCosts => self.fixed_costs.is_set(),
            Gate::VariableCosts => self.variable_costs.is_set(),
            Gate::Debt => self.debt.is_set(),
        }
    }

    pub fn missing(&self) -> Vec<Gate> {
        Gate::ALL.into_iter().filter(|g| !self.is_set(*g)).collect()
    }

    pub fn is_ready(&self) -> bool {
        self.missing().is_empty()
    }

    pub fn require(&self) -> Result<ReadyInputs<'_>> {
        match (
            self.context.get(),
            self.capital_costs.get(),
            self.fixed_costs.get(),
            self.variable_costs.get(),
            self.debt.get(),
        ) {
            (Some(context), Some(capital_costs), Some(fixed_costs), Some(variable_costs), Some(debt)) => {
                Ok(ReadyInputs {
                    context,
                    capital_costs,
                    fixed_costs,
                    variable_costs,
                    debt,
                })
            }
            _ => Err(FinanceError::NotReady {
                missing: self
                    .missing()
                    .iter()
                    .map(Gate::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_readiness_lists_every_gate() {
        let gates = Readiness::default();
        assert_eq!(gates.missing(), Gate::ALL.to_vec());
        match gates.require() {
            Err(FinanceError::NotReady { missing }) => {
                assert!(missing.contains("capital costs"));
                assert!(missing.contains("debt portfolio"));
            }
            _ => panic!("expected a readiness error"),
        }
    }

    #[test]
    fn setting_a_slot_clears_its_gate() {
        let mut gates = Readiness::default();
        gates.debt = Slot::Set(DebtPortfolio::new());
        assert!(gates.is_set(Gate::Debt));
        assert_eq!(gates.missing().len(), 4);
    }
}
