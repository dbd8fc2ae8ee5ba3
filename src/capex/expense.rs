use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::depreciation::Depreciation;
use super::payment::{OutlayInputs, PaymentTerms};
use crate::errors::{FinanceError, Result};
use crate::ledger::{columns, Ledger};
use crate::pricing::{CostQuote, Escalator};
use crate::project::ScheduleContext;

/// Converts a purchased-equipment cost into an installed cost.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Installation {
    /// Quote already includes installation.
    Included,
    /// Multiplies the purchase cost (installation factor).
    Factor { factor: f64 },
    /// Adds a fixed installation charge.
    Markup { amount: f64 },
}

impl Installation {
    pub fn installed_cost(&self, cost: f64) -> f64 {
        match self {
            Installation::Included => cost,
            Installation::Factor { factor } => cost * factor,
            Installation::Markup { amount } => cost + amount,
        }
    }
}

/// Outlay and depreciation schedules of one capital item or a group of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapexSchedule {
    pub outlays: Ledger,
    pub depreciation: Ledger,
}

impl CapexSchedule {
    pub fn add(&mut self, other: &CapexSchedule) {
        self.outlays.merge_add(&other.outlays);
        self.depreciation.merge_add(&other.depreciation);
    }

    pub fn total_outlay(&self) -> f64 {
        self.outlays.total(columns::CAPITAL_EXPENDITURES)
    }

    pub fn total_depreciation(&self) -> f64 {
        self.depreciation.total(columns::DEPRECIATION)
    }
}

/// Builds the depreciation of `cost` once the item is in service: at startup, or
/// at its last outlay when that comes later.
pub(crate) fn depreciate(
    item: &str,
    method: Option<&Depreciation>,
    length: Option<u32>,
    outlays: &Ledger,
    ctx: &ScheduleContext,
) -> Result<Ledger> {
    let method = method.unwrap_or(&ctx.depreciation);
    let length = length.unwrap_or(ctx.depreciation_length);
    let in_service = outlays
        .last_date()
        .map_or(ctx.startup_date, |last| last.max(ctx.startup_date));
    method.schedule(
        item,
        outlays.total(columns::CAPITAL_EXPENDITURES),
        in_service,
        length,
    )
}

/// A directly quoted piece of capital equipment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapitalExpense {
    pub name: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quote: Option<CostQuote>,
    #[serde(default)]
    pub escalator: Escalator,
    #[serde(default)]
    pub installation: Option<Installation>,
    /// Falls back to the project depreciation method when unset.
    #[serde(default)]
    pub depreciation: Option<Depreciation>,
    #[serde(default)]
    pub depreciation_length: Option<u32>,
    #[serde(default)]
    pub payment_terms: PaymentTerms,
    /// Defaults to the project's initial date.
    #[serde(default)]
    pub order_date: Option<NaiveDate>,
    /// Defaults to the project's startup date.
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
}

impl CapitalExpense {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: String::new(),
            description: String::new(),
            quote: None,
            escalator: Escalator::None,
            installation: None,
            depreciation: None,
            depreciation_length: None,
            payment_terms: PaymentTerms::default(),
            order_date: None,
            delivery_date: None,
        }
    }

    pub fn with_quote(mut self, quote: CostQuote) -> Self {
        self.quote = Some(quote);
        self
    }

    pub fn with_installation(mut self, installation: Installation) -> Self {
        self.installation = Some(installation);
        self
    }

    pub fn with_escalator(mut self, escalator: Escalator) -> Self {
        self.escalator = escalator;
        self
    }

    pub fn with_depreciation(mut self, method: Depreciation, length: Option<u32>) -> Self {
        self.depreciation = Some(method);
        self.depreciation_length = length;
        self
    }

    pub fn with_payment_terms(mut self, terms: PaymentTerms) -> Self {
        self.payment_terms = terms;
        self
    }

    pub fn ordered(mut self, order: NaiveDate, delivery: NaiveDate) -> Self {
        self.order_date = Some(order);
        self.delivery_date = Some(delivery);
        self
    }

    /// Total installed cost, escalated from the quote date to `date`.
    pub fn tic(&self, date: NaiveDate, ctx: &ScheduleContext) -> Result<f64> {
        let bad = |reason: &str| FinanceError::BadCapitalTicInput {
            item: self.name.clone(),
            reason: reason.to_string(),
        };
        let quote = self.quote.as_ref().ok_or_else(|| bad("cost quote is not set"))?;
        let installation = self
            .installation
            .as_ref()
            .ok_or_else(|| bad("installation model is not set"))?;
        let escalation = ctx.escalation(&self.escalator, quote.date, date)?;
        let cost = quote.cost(Some(&ctx.capacity))?;
        Ok(escalation * installation.installed_cost(cost))
    }

    pub fn schedule(&self, ctx: &ScheduleContext) -> Result<CapexSchedule> {
        // Fail on an underdefined item even when its payment terms never price it.
        self.tic(ctx.initial_date, ctx)?;
        let inputs = OutlayInputs {
            item: &self.name,
            order: self.order_date.unwrap_or(ctx.initial_date),
            delivery: self.delivery_date.unwrap_or(ctx.startup_date),
            initial_date: ctx.initial_date,
            breakdown: &ctx.capex_breakdown,
        };
        let outlays = self
            .payment_terms
            .outlays(&inputs, |date| self.tic(date, ctx))?;
        let depreciation = depreciate(
            &self.name,
            self.depreciation.as_ref(),
            self.depreciation_length,
            &outlays,
            ctx,
        )?;
        Ok(CapexSchedule {
            outlays,
            depreciation,
        })
    }
}

/// A capital cost charged as a fraction of the direct costs of its group
/// (engineering, contingency, permitting).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndirectCapitalExpense {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub fraction: f64,
    #[serde(default)]
    pub depreciation: Option<Depreciation>,
    #[serde(default)]
    pub depreciation_length: Option<u32>,
}

impl IndirectCapitalExpense {
    pub fn new(name: impl Into<String>, fraction: f64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            fraction,
            depreciation: None,
            depreciation_length: None,
        }
    }

    pub fn schedule(&self, direct: &Ledger, ctx: &ScheduleContext) -> Result<CapexSchedule> {
        if !self.fraction.is_finite() || self.fraction < 0.0 {
            return Err(FinanceError::BadCapitalTicInput {
                item: self.name.clone(),
                reason: format!("fraction {} must be non-negative", self.fraction),
            });
        }
        let mut outlays = Ledger::new(direct.dates().iter().copied());
        let values = direct
            .column_or_zero(columns::CAPITAL_EXPENDITURES)
            .into_iter()
            .map(|v| v * self.fraction)
            .collect();
        outlays.set_column(columns::CAPITAL_EXPENDITURES, values)?;
        let depreciation = depreciate(
            &self.name,
            self.depreciation.as_ref(),
            self.depreciation_length,
            &outlays,
            ctx,
        )?;
        Ok(CapexSchedule {
            outlays,
            depreciation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::Scaler;
    use crate::project::context::fixtures::{context, date};
    use crate::quantity::Quantity;

    fn pump() -> CapitalExpense {
        CapitalExpense::new("Pump")
            .with_quote(CostQuote::new(1_000.0, date(2020, 1, 1)))
            .with_installation(Installation::Factor { factor: 1.5 })
    }

    #[test]
    fn tic_requires_quote_and_installation() {
        let ctx = context();
        let bare = CapitalExpense::new("Pump");
        assert!(matches!(
            bare.tic(ctx.initial_date, &ctx),
            Err(FinanceError::BadCapitalTicInput { .. })
        ));
        let no_install = bare.with_quote(CostQuote::new(1.0, date(2020, 1, 1)));
        assert!(no_install.schedule(&ctx).is_err());
    }

    #[test]
    fn tic_escalates_and_scales() {
        let mut ctx = context();
        ctx.inflation_rate = 0.05;
        let item = CapitalExpense::new("Tank")
            .with_quote(
                CostQuote::new(100.0, date(2020, 1, 1))
                    .scaled(Quantity::new(500.0, "kg/day"), Scaler::Linear),
            )
            .with_installation(Installation::Markup { amount: 10.0 })
            .with_escalator(Escalator::GeneralInflation);
        let later = date(2022, 1, 1);
        let years = (later - date(2020, 1, 1)).num_days() as f64 / 365.25;
        let expected = 1.05_f64.powf(years) * (200.0 + 10.0);
        assert!((item.tic(later, &ctx).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn schedule_depreciates_total_outlay_from_startup() {
        let ctx = context();
        let schedule = pump().schedule(&ctx).unwrap();
        assert!((schedule.total_outlay() - 1_500.0).abs() < 1e-9);
        assert_eq!(schedule.depreciation.first_date(), Some(ctx.startup_date));
        assert!((schedule.total_depreciation() - 1_500.0).abs() < 1e-6);
    }

    #[test]
    fn indirect_follows_direct_outlays() {
        let ctx = context();
        let direct = pump().schedule(&ctx).unwrap();
        let engineering = IndirectCapitalExpense::new("Engineering", 0.1)
            .schedule(&direct.outlays, &ctx)
            .unwrap();
        assert!((engineering.total_outlay() - 150.0).abs() < 1e-9);
        assert_eq!(engineering.outlays.dates(), direct.outlays.dates());
    }
}
