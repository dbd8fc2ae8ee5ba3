use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{FinanceError, Result};
use crate::ledger::{columns, Ledger};
use crate::pricing::{CostQuote, Escalator, StartupDiscounter};
use crate::project::{RampCategory, ScheduleContext};
use crate::quantity::Quantity;

/// A saleable output and how it is priced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Price per unit of output.
    #[serde(default)]
    pub price: Option<CostQuote>,
    #[serde(default)]
    pub escalator: Escalator,
}

impl Product {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            price: None,
            escalator: Escalator::None,
        }
    }

    pub fn priced(mut self, price: CostQuote, escalator: Escalator) -> Self {
        self.price = Some(price);
        self.escalator = escalator;
        self
    }

    pub fn price_on(&self, date: NaiveDate, ctx: &ScheduleContext) -> Result<f64> {
        let quote = self
            .price
            .as_ref()
            .ok_or_else(|| FinanceError::missing_info(&self.name, "price"))?;
        Ok(quote.price * ctx.escalation(&self.escalator, quote.date, date)?)
    }
}

/// A product made at a nameplate rate, ramped up after startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Production {
    pub product: Product,
    /// Nameplate output; rate units such as `kg/year` are converted to per day.
    pub rate: Quantity,
    /// Overrides the project's revenue ramp.
    #[serde(default)]
    pub startup: Option<StartupDiscounter>,
}

impl Production {
    pub fn new(product: Product, rate: Quantity) -> Self {
        Self {
            product,
            rate,
            startup: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.product.name
    }

    pub fn nameplate_per_day(&self) -> f64 {
        self.rate.per_day()
    }

    /// Daily `<name>_rate`, `<name>_price` and `<name>_revenue` columns.
    pub fn schedule(&self, ctx: &ScheduleContext) -> Result<Ledger> {
        let name = self.name();
        if !self.rate.value.is_finite() || self.rate.value < 0.0 {
            return Err(FinanceError::BadExpenseInput {
                name: name.to_string(),
                reason: format!("production rate {} must be non-negative", self.rate),
            });
        }
        let ramp = ctx.ramp(self.startup.as_ref(), RampCategory::Revenue);
        ramp.validate()?;
        let nameplate = self.nameplate_per_day();

        let mut ledger = ctx.operating_ledger()?;
        let mut rates = Vec::with_capacity(ledger.len());
        let mut prices = Vec::with_capacity(ledger.len());
        for date in ledger.dates() {
            rates.push(nameplate * ramp.factor(ctx.startup_date, *date));
            prices.push(self.product.price_on(*date, ctx)?);
        }
        let revenue = rates.iter().zip(&prices).map(|(r, p)| r * p).collect();
        ledger.set_column(&columns::rate_of(name), rates)?;
        ledger.set_column(&columns::price_of(name), prices)?;
        ledger.set_column(&columns::revenue_of(name), revenue)?;
        Ok(ledger)
    }
}

/// By-product streams sold alongside the primary product.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductionPortfolio {
    #[serde(default)]
    pub streams: Vec<Production>,
    /// Keep every stream's columns in the project ledger.
    #[serde(default)]
    pub detailed: bool,
}

impl ProductionPortfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, stream: Production) -> Result<()> {
        if self.get(stream.name()).is_some() {
            return Err(FinanceError::DuplicateName {
                collection: "production portfolio".into(),
                name: stream.name().to_string(),
            });
        }
        self.streams.push(stream);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Production> {
        self.streams.iter().find(|s| s.name() == name)
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Member columns merged together plus their combined revenue in `Sales`.
    pub fn schedule(&self, ctx: &ScheduleContext) -> Result<Ledger> {
        let mut total = ctx.operating_ledger()?;
        let mut sales = vec![0.0; total.len()];
        for stream in &self.streams {
            let schedule = stream.schedule(ctx)?;
            let revenue = schedule.column_or_zero(&columns::revenue_of(stream.name()));
            // Stream schedules share the operating index.
            for (acc, value) in sales.iter_mut().zip(revenue) {
                *acc += value;
            }
            if self.detailed {
                total.merge_add(&schedule);
            }
        }
        total.set_column(columns::SALES, sales)?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TimeInterval;
    use crate::project::context::fixtures::{context, date};

    fn hydrogen() -> Production {
        Production::new(
            Product::new("Hydrogen").priced(CostQuote::new(2.0, date(2020, 1, 1)), Escalator::None),
            Quantity::new(365.0, "kg/year"),
        )
    }

    #[test]
    fn revenue_is_rate_times_price() {
        let ctx = context();
        let ledger = hydrogen().schedule(&ctx).unwrap();
        assert_eq!(ledger.first_date(), Some(ctx.startup_date));
        let rate = ledger.value("Hydrogen_rate", date(2023, 5, 1)).unwrap();
        assert!((rate - 365.0 / 365.25).abs() < 1e-9);
        let revenue = ledger.value("Hydrogen_revenue", date(2023, 5, 1)).unwrap();
        assert!((revenue - 2.0 * rate).abs() < 1e-12);
    }

    #[test]
    fn ramp_discounts_startup_window() {
        let mut ctx = context();
        ctx.startup_fractions.revenue = 0.5;
        ctx.startup_period = TimeInterval::months(6);
        let ledger = hydrogen().schedule(&ctx).unwrap();
        let early = ledger.value("Hydrogen_rate", date(2022, 3, 1)).unwrap();
        let late = ledger.value("Hydrogen_rate", date(2022, 8, 1)).unwrap();
        assert!((early * 2.0 - late).abs() < 1e-12);
    }

    #[test]
    fn unpriced_product_is_reported() {
        let ctx = context();
        let stream = Production::new(Product::new("Oxygen"), Quantity::new(1.0, "kg/day"));
        assert!(matches!(
            stream.schedule(&ctx),
            Err(FinanceError::MissingInfo { .. })
        ));
    }

    #[test]
    fn portfolio_sums_sales() {
        let ctx = context();
        let mut portfolio = ProductionPortfolio::new();
        portfolio.add(hydrogen()).unwrap();
        portfolio
            .add(Production::new(
                Product::new("Oxygen").priced(CostQuote::new(0.1, date(2020, 1, 1)), Escalator::None),
                Quantity::new(8.0, "kg/day"),
            ))
            .unwrap();
        let ledger = portfolio.schedule(&ctx).unwrap();
        let day = date(2024, 1, 1);
        let expected = 2.0 * 365.0 / 365.25 + 0.8;
        assert!((ledger.value(columns::SALES, day).unwrap() - expected).abs() < 1e-9);
        assert!(!ledger.has_column("Oxygen_rate"));
        assert!(portfolio.add(hydrogen()).is_err());
    }
}
