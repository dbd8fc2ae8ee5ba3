#![doc(test(attr(deny(warnings))))]

//! Project Finance simulates the lifetime cash flows of a capital investment
//! project. Capital, operating, financing and tax inputs are assembled into a
//! daily ledger, from which roll-ups, NPV and IRR are derived.

pub mod capex;
pub mod cli;
pub mod config;
pub mod debt;
pub mod errors;
pub mod ledger;
pub mod operations;
pub mod pricing;
pub mod project;
pub mod quantity;
pub mod report;
pub mod storage;
pub mod tax;
pub mod utils;

use std::sync::Once;

pub use errors::{FinanceError, Result};
pub use project::CapitalProject;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing with the default filter and emits a startup log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(None);
        tracing::info!("project finance tracing initialized");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
