use serde::{Deserialize, Serialize};

use super::{accumulate, daily_column};
use crate::errors::{FinanceError, Result};
use crate::ledger::{columns, Ledger};
use crate::pricing::{CostQuote, Escalator, StartupDiscounter};
use crate::project::{RampCategory, ScheduleContext};

fn default_usage() -> f64 {
    1.0
}

/// A cost consumed in proportion to a production stream (feedstock, utilities).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariableExpense {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Price per consumed unit.
    #[serde(default)]
    pub quote: Option<CostQuote>,
    #[serde(default)]
    pub escalator: Escalator,
    /// Units consumed per unit of output.
    #[serde(default = "default_usage")]
    pub usage: f64,
    /// Production stream the expense follows; `None` is the primary product.
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub startup: Option<StartupDiscounter>,
}

impl VariableExpense {
    pub fn new(name: impl Into<String>, quote: CostQuote, usage: f64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            quote: Some(quote),
            escalator: Escalator::None,
            usage,
            stream: None,
            startup: None,
        }
    }

    pub fn with_escalator(mut self, escalator: Escalator) -> Self {
        self.escalator = escalator;
        self
    }

    pub fn linked_to(mut self, stream: impl Into<String>) -> Self {
        self.stream = Some(stream.into());
        self
    }

    /// Daily cost given the nameplate daily output of the linked stream.
    ///
    /// The ramp is this expense's own override or the project's variable-cost
    /// fraction. A by-product's production ramp is not applied to the costs
    /// linked to it.
    pub fn schedule(&self, ctx: &ScheduleContext, output_per_day: f64) -> Result<Ledger> {
        let bad = |reason: String| FinanceError::BadExpenseInput {
            name: self.name.clone(),
            reason,
        };
        let quote = self
            .quote
            .as_ref()
            .ok_or_else(|| bad("cost quote is not set".into()))?;
        if !self.usage.is_finite() || self.usage < 0.0 {
            return Err(bad(format!("usage {} must be non-negative", self.usage)));
        }
        let ramp = ctx.ramp(self.startup.as_ref(), RampCategory::VariableCost);
        ramp.validate()?;
        let unit_cost = quote.cost(Some(&ctx.capacity))?;
        daily_column(ctx, columns::VARIABLE_COSTS, |date| {
            let price = unit_cost * ctx.escalation(&self.escalator, quote.date, date)?;
            Ok(price * self.usage * output_per_day * ramp.factor(ctx.startup_date, date))
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VariableCosts {
    #[serde(default)]
    pub items: Vec<VariableExpense>,
    #[serde(default)]
    pub detailed: bool,
}

impl VariableCosts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: VariableExpense) -> Result<()> {
        if self.items.iter().any(|i| i.name == item.name) {
            return Err(FinanceError::DuplicateName {
                collection: "variable costs".into(),
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

    /// `output_of` maps a stream name (`None` for the primary product) to its
    /// nameplate daily output.
    pub fn schedule(
        &self,
        ctx: &ScheduleContext,
        output_of: impl Fn(Option<&str>) -> Option<f64>,
    ) -> Result<Ledger> {
        let mut total = daily_column(ctx, columns::VARIABLE_COSTS, |_| Ok(0.0))?;
        for item in &self.items {
            let output = output_of(item.stream.as_deref()).ok_or_else(|| {
                FinanceError::UnknownProduct {
                    expense: item.name.clone(),
                    product: item.stream.clone().unwrap_or_default(),
                }
            })?;
            let schedule = item.schedule(ctx, output)?;
            accumulate(&mut total, columns::VARIABLE_COSTS, &item.name, &schedule, self.detailed)?;
        }
        tracing::debug!(
            items = self.items.len(),
            total = total.total(columns::VARIABLE_COSTS),
            "variable cost schedule built"
        );
        Ok(total)
    }
}
