//! Price projection strategies shared by capital, operating and revenue schedules.

pub mod escalator;
pub mod scaler;
pub mod startup;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{FinanceError, Result};
use crate::quantity::Quantity;

pub use escalator::{Escalator, IndexPoint};
pub use scaler::Scaler;
pub use startup::StartupDiscounter;

/// A price quoted on a date for a given capacity basis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostQuote {
    pub price: f64,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basis: Option<Quantity>,
    #[serde(default)]
    pub scaler: Scaler,
}

impl CostQuote {
    pub fn new(price: f64, date: NaiveDate) -> Self {
        Self {
            price,
            date,
            basis: None,
            scaler: Scaler::None,
        }
    }

    pub fn scaled(mut self, basis: Quantity, scaler: Scaler) -> Self {
        self.basis = Some(basis);
        self.scaler = scaler;
        self
    }

    /// Quoted price rescaled to `capacity`, still as of the quote date.
    pub fn cost(&self, capacity: Option<&Quantity>) -> Result<f64> {
        if !self.price.is_finite() {
            return Err(FinanceError::BadPricingInput(format!(
                "quoted price {} is not finite",
                self.price
            )));
        }
        self.scaler.scale(self.price, self.basis.as_ref(), capacity)
    }
}
