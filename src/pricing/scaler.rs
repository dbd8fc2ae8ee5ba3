use serde::{Deserialize, Serialize};

use crate::errors::{FinanceError, Result};
use crate::quantity::Quantity;

/// Rescales a quoted cost from its capacity basis to the project capacity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    #[default]
    None,
    Linear,
    /// Six-tenths style power law: `cost * (target / basis) ^ exponent`.
    Exponential { exponent: f64 },
    /// Whole units of the quoted size: `cost * ceil(target / basis)`.
    Stepped,
}

impl Scaler {
    pub fn scale(
        &self,
        cost: f64,
        basis: Option<&Quantity>,
        target: Option<&Quantity>,
    ) -> Result<f64> {
        if matches!(self, Scaler::None) {
            return Ok(cost);
        }
        let basis = basis.ok_or_else(|| FinanceError::missing_info("cost quote", "basis"))?;
        let target = target.ok_or_else(|| FinanceError::missing_info("project", "capacity"))?;
        let ratio = target.ratio_to(basis)?;
        if ratio < 0.0 {
            return Err(FinanceError::BadPricingInput(format!(
                "capacity ratio {ratio} is negative"
            )));
        }
        Ok(match self {
            Scaler::None => cost,
            Scaler::Linear => cost * ratio,
            Scaler::Exponential { exponent } => cost * ratio.powf(*exponent),
            Scaler::Stepped => cost * ratio.ceil(),
        })
    }
}
