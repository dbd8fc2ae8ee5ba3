//! Recurring operating schedules: production and revenue, fixed costs, and
//! production-linked variable costs. Every schedule covers the operating window
//! with one row per day.

pub mod fixed;
pub mod production;
pub mod variable;

use chrono::NaiveDate;

use crate::errors::Result;
use crate::ledger::Ledger;
use crate::project::ScheduleContext;

pub use fixed::{FixedCosts, FixedExpense};
pub use production::{Product, Production, ProductionPortfolio};
pub use variable::{VariableCosts, VariableExpense};

/// Column name under which a detailed container keeps one member's values.
pub fn member_column(total: &str, member: &str) -> String {
    format!("{total}:{member}")
}

/// Evaluates `value` on every operating day into column `name`.
pub(crate) fn daily_column(
    ctx: &ScheduleContext,
    name: &str,
    mut value: impl FnMut(NaiveDate) -> Result<f64>,
) -> Result<Ledger> {
    let mut ledger = ctx.operating_ledger()?;
    let values = ledger
        .dates()
        .iter()
        .map(|date| value(*date))
        .collect::<Result<Vec<f64>>>()?;
    ledger.set_column(name, values)?;
    Ok(ledger)
}

/// Adds each member ledger's `column` into `total`, keeping the member's own
/// values under a prefixed name when `detailed` is set.
pub(crate) fn accumulate(
    total: &mut Ledger,
    column: &str,
    member: &str,
    schedule: &Ledger,
    detailed: bool,
) -> Result<()> {
    total.merge_add(schedule);
    if detailed {
        let mut own = Ledger::new(schedule.dates().iter().copied());
        own.set_column(&member_column(column, member), schedule.column_or_zero(column))?;
        total.merge_add(&own);
    }
    Ok(())
}
