//! Capital items, their payment terms, and depreciation.

pub mod depreciation;
pub mod expense;
pub mod payment;

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{FinanceError, Result};
use crate::project::ScheduleContext;

pub use depreciation::{macrs_table, Depreciation, ScheduledFraction, MACRS_HALF_YEAR};
pub use expense::{CapexSchedule, CapitalExpense, IndirectCapitalExpense, Installation};
pub use payment::{PaymentTerms, ScheduledAmount};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CapitalItem {
    Direct(CapitalExpense),
    Indirect(IndirectCapitalExpense),
    Group(CapitalCosts),
}

impl CapitalItem {
    pub fn name(&self) -> &str {
        match self {
            CapitalItem::Direct(item) => &item.name,
            CapitalItem::Indirect(item) => &item.name,
            CapitalItem::Group(group) => &group.name,
        }
    }
}

/// A named tree of capital items. Indirect items are charged against the direct
/// costs (including nested groups) of the node that holds them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CapitalCosts {
    pub name: String,
    #[serde(default)]
    pub items: Vec<CapitalItem>,
}

impl CapitalCosts {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn add(&mut self, item: CapitalItem) -> Result<()> {
        if self.items.iter().any(|i| i.name() == item.name()) {
            return Err(FinanceError::DuplicateName {
                collection: format!("capital costs `{}`", self.name),
                name: item.name().to_string(),
            });
        }
        self.items.push(item);
        Ok(())
    }

    pub fn add_expense(&mut self, expense: CapitalExpense) -> Result<()> {
        self.add(CapitalItem::Direct(expense))
    }

    pub fn add_indirect(&mut self, expense: IndirectCapitalExpense) -> Result<()> {
        self.add(CapitalItem::Indirect(expense))
    }

    pub fn add_group(&mut self, group: CapitalCosts) -> Result<()> {
        self.add(CapitalItem::Group(group))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Checks item names are unique within each node of the tree.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for item in &self.items {
            if !seen.insert(item.name()) {
                return Err(FinanceError::DuplicateName {
                    collection: format!("capital costs `{}`", self.name),
                    name: item.name().to_string(),
                });
            }
            if let CapitalItem::Group(group) = item {
                group.validate()?;
            }
        }
        Ok(())
    }

    /// Sum of the direct items' installed cost on `date`, plus indirect charges.
    pub fn total_installed_cost(&self, date: NaiveDate, ctx: &ScheduleContext) -> Result<f64> {
        let mut direct = 0.0;
        for item in &self.items {
            match item {
                CapitalItem::Direct(expense) => direct += expense.tic(date, ctx)?,
                CapitalItem::Group(group) => direct += group.total_installed_cost(date, ctx)?,
                CapitalItem::Indirect(_) => {}
            }
        }
        let indirect: f64 = self
            .items
            .iter()
            .filter_map(|item| match item {
                CapitalItem::Indirect(expense) => Some(expense.fraction * direct),
                _ => None,
            })
            .sum();
        Ok(direct + indirect)
    }

    pub fn schedule(&self, ctx: &ScheduleContext) -> Result<CapexSchedule> {
        let mut direct = CapexSchedule::default();
        for item in &self.items {
            match item {
                CapitalItem::Direct(expense) => direct.add(&expense.schedule(ctx)?),
                CapitalItem::Group(group) => direct.add(&group.schedule(ctx)?),
                CapitalItem::Indirect(_) => {}
            }
        }
        let mut total = direct.clone();
        for item in &self.items {
            if let CapitalItem::Indirect(expense) = item {
                total.add(&expense.schedule(&direct.outlays, ctx)?);
            }
        }
        tracing::debug!(
            group = %self.name,
            outlay = total.total_outlay(),
            "capital cost schedule built"
        );
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::columns;
    use crate::pricing::CostQuote;
    use crate::project::context::fixtures::{context, date};

    fn item(name: &str, price: f64) -> CapitalExpense {
        CapitalExpense::new(name)
            .with_quote(CostQuote::new(price, date(2020, 1, 1)))
            .with_installation(Installation::Included)
    }

    fn plant() -> CapitalCosts {
        let mut utilities = CapitalCosts::new("Utilities");
        utilities.add_expense(item("Boiler", 300.0)).unwrap();

        let mut plant = CapitalCosts::new("Plant");
        plant.add_expense(item("Reactor", 700.0)).unwrap();
        plant.add_group(utilities).unwrap();
        plant
            .add_indirect(IndirectCapitalExpense::new("Contingency", 0.2))
            .unwrap();
        plant
    }

    #[test]
    fn tree_aggregates_direct_nested_and_indirect() {
        let ctx = context();
        let schedule = plant().schedule(&ctx).unwrap();
        assert!((schedule.total_outlay() - 1_200.0).abs() < 1e-9);
        assert_eq!(
            schedule.outlays.value(columns::CAPITAL_EXPENDITURES, date(2020, 1, 1)),
            Some(600.0)
        );
        assert!((schedule.total_depreciation() - 1_200.0).abs() < 1e-6);
        let tic = plant().total_installed_cost(date(2020, 1, 1), &ctx).unwrap();
        assert!((tic - 1_200.0).abs() < 1e-9);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut costs = CapitalCosts::new("Plant");
        costs.add_expense(item("Reactor", 1.0)).unwrap();
        let err = costs.add_expense(item("Reactor", 2.0)).unwrap_err();
        assert!(matches!(err, FinanceError::DuplicateName { .. }));
    }
}
