//! The capital project orchestrator: financial parameters, readiness gating,
//! daily assembly of the master ledger and the profitability metrics derived
//! from it.

pub mod capital_project;
pub mod context;
pub mod metrics;
pub mod params;
pub mod readiness;

pub use capital_project::{CapitalProject, DEFAULT_INCOME_TAX, PRIMARY_PRODUCT};
pub use context::{RampCategory, ScheduleContext, StartupFractions};
pub use metrics::{cash_flows_by_period, irr, npv, IrrSettings};
pub use params::{FinancialParameters, ParameterKey, ParameterValue, ValueKind};
pub use readiness::{Gate, Readiness, ReadyInputs, Slot};
