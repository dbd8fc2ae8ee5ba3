//! Tax engine: bracketed tax kinds, credits, loss carryover, and the manager that
//! resolves taxes depending on one another.

pub mod carryover;
pub mod credit;
pub mod kind;
pub mod manager;
#[allow(clippy::module_inception)]
pub mod tax;

use serde::{Deserialize, Serialize};

pub use carryover::{carry_losses, CarrybackOrder, CarryoverOutcome};
pub use credit::{CreditAmount, TaxCredit};
pub use kind::{Bracket, TaxKind};
pub use manager::{TaxManager, TaxOutcome};
pub use tax::{AnnualTax, Tax, TaxComputation};

pub const DEFAULT_CARRYFORWARD_YEARS: u32 = 20;
pub const DEFAULT_CARRYBACK_YEARS: u32 = 2;
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// How losses affect other years' taxes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaxTreatment {
    /// Losses are carried back, then forward, before tax is computed.
    #[default]
    LossCarryover,
    /// Each year stands alone; a year with no taxable income pays nothing and its
    /// loss is forgotten.
    Masked,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxPolicy {
    pub treatment: TaxTreatment,
    pub carryback_order: CarrybackOrder,
    pub max_iterations: u32,
    pub tolerance: f64,
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self {
            treatment: TaxTreatment::default(),
            carryback_order: CarrybackOrder::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}
