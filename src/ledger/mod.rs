//! Date-indexed ledger primitive, calendar intervals, and the column names the
//! project engine writes.

#[allow(clippy::module_inception)]
pub mod ledger;
pub mod time_interval;

pub use ledger::{Column, Ledger};
pub use time_interval::{TimeInterval, TimeUnit};

/// Column names of the master ledger.
pub mod columns {
    pub const PERIOD: &str = "Period";
    pub const CAPITAL_EXPENDITURES: &str = "Capital_expenditures";
    pub const DEPRECIATION: &str = "Depreciation";
    pub const PRODUCTION: &str = "Production";
    pub const SALES_PRICE: &str = "Sales_price";
    pub const SALES: &str = "Sales";
    pub const SALVAGE: &str = "Salvage";
    pub const REVENUE: &str = "Revenue";
    pub const VARIABLE_COSTS: &str = "Variable_costs";
    pub const FIXED_COSTS: &str = "Fixed_costs";
    pub const LOAN_PROCEEDS: &str = "Loan_proceeds";
    pub const INTEREST: &str = "Interest";
    pub const PRINCIPAL_PAYMENTS: &str = "Principal_payments";
    pub const PRINCIPAL_BALANCE: &str = "Principal_balance";
    pub const DECOMMISSIONING_COSTS: &str = "Decommissioning_costs";
    pub const COST_OF_SALES: &str = "Cost_of_sales";
    pub const EBITDA: &str = "EBITDA";
    pub const PRE_DEPRECIATION_INCOME: &str = "Pre-depreciation_income";
    pub const TAXABLE_INCOME: &str = "Taxable_income";
    pub const TAXES: &str = "Taxes";
    pub const AFTER_TAX_INCOME: &str = "After-tax_income";
    pub const NET_CASH_FLOW: &str = "Net_cash_flow";

    /// Column holding the daily rate of a production stream.
    pub fn rate_of(stream: &str) -> String {
        format!("{stream}_rate")
    }

    pub fn price_of(stream: &str) -> String {
        format!("{stream}_price")
    }

    pub fn revenue_of(stream: &str) -> String {
        format!("{stream}_revenue")
    }
}
