use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{accumulate, daily_column};
use crate::errors::{FinanceError, Result};
use crate::ledger::time_interval::days_in_year;
use crate::ledger::{columns, Ledger};
use crate::pricing::{CostQuote, Escalator, StartupDiscounter};
use crate::project::{RampCategory, ScheduleContext};

/// A recurring cost quoted per year (labour, insurance, maintenance).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixedExpense {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quote: Option<CostQuote>,
    #[serde(default)]
    pub escalator: Escalator,
    #[serde(default)]
    pub startup: Option<StartupDiscounter>,
}

impl FixedExpense {
    pub fn new(name: impl Into<String>, quote: CostQuote) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            quote: Some(quote),
            escalator: Escalator::None,
            startup: None,
        }
    }

    pub fn with_escalator(mut self, escalator: Escalator) -> Self {
        self.escalator = escalator;
        self
    }

    pub fn with_startup(mut self, startup: StartupDiscounter) -> Self {
        self.startup = Some(startup);
        self
    }

    /// Cost charged on `date`: the escalated annual cost spread over that
    /// calendar year's days.
    pub fn daily_cost(&self, date: NaiveDate, ctx: &ScheduleContext) -> Result<f64> {
        let quote = self.quote.as_ref().ok_or_else(|| FinanceError::BadExpenseInput {
            name: self.name.clone(),
            reason: "cost quote is not set".into(),
        })?;
        let annual = quote.cost(Some(&ctx.capacity))?;
        let escalation = ctx.escalation(&self.escalator, quote.date, date)?;
        Ok(annual * escalation / days_in_year(date.year()) as f64)
    }

    pub fn schedule(&self, ctx: &ScheduleContext) -> Result<Ledger> {
        let ramp = ctx.ramp(self.startup.as_ref(), RampCategory::FixedCost);
        ramp.validate()?;
        daily_column(ctx, columns::FIXED_COSTS, |date| {
            Ok(self.daily_cost(date, ctx)? * ramp.factor(ctx.startup_date, date))
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FixedCosts {
    #[serde(default)]
    pub items: Vec<FixedExpense>,
    #[serde(default)]
    pub detailed: bool,
}

impl FixedCosts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: FixedExpense) -> Result<()> {
        if self.items.iter().any(|i| i.name == item.name) {
            return Err(FinanceError::DuplicateName {
                collection: "fixed costs".into(),
                name: item.name,
            });
        }
        self.items.push(item);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn schedule(&self, ctx: &ScheduleContext) -> Result<Ledger> {
        let mut total = daily_column(ctx, columns::FIXED_COSTS, |_| Ok(0.0))?;
        for item in &self.items {
            let schedule = item.schedule(ctx)?;
            accumulate(&mut total, columns::FIXED_COSTS, &item.name, &schedule, self.detailed)?;
        }
        tracing::debug!(
            items = self.items.len(),
            total = total.total(columns::FIXED_COSTS),
            "fixed cost schedule built"
        );
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::member_column;
    use crate::project::context::fixtures::{context, date};

    fn labour() -> FixedExpense {
        FixedExpense::new("Labour", CostQuote::new(36_600.0, date(2020, 1, 1)))
    }

    #[test]
    fn annual_cost_spreads_over_leap_aware_days() {
        let ctx = context();
        let ledger = labour().schedule(&ctx).unwrap();
        assert_eq!(ledger.value(columns::FIXED_COSTS, date(2024, 2, 29)), Some(100.0));
        let y2023 = ledger.slice(date(2023, 1, 1), date(2023, 12, 31));
        assert!((y2023.total(columns::FIXED_COSTS) - 36_600.0).abs() < 1e-6);
    }

    #[test]
    fn detailed_costs_keep_member_columns() {
        let ctx = context();
        let mut costs = FixedCosts::new();
        costs.detailed = true;
        costs.add(labour()).unwrap();
        costs
            .add(FixedExpense::new("Insurance", CostQuote::new(3_660.0, date(2020, 1, 1))))
            .unwrap();
        let ledger = costs.schedule(&ctx).unwrap();
        let day = date(2024, 6, 1);
        assert!((ledger.value(columns::FIXED_COSTS, day).unwrap() - 110.0).abs() < 1e-9);
        assert_eq!(
            ledger.value(&member_column(columns::FIXED_COSTS, "Insurance"), day),
            Some(10.0)
        );
    }

    #[test]
    fn missing_quote_is_rejected() {
        let ctx = context();
        let mut item = labour();
        item.quote = None;
        assert!(matches!(
            item.schedule(&ctx),
            Err(FinanceError::BadExpenseInput { .. })
        ));
    }
}
