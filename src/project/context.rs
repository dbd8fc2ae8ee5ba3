use chrono::{Duration, NaiveDate};

use crate::capex::Depreciation;
use crate::errors::Result;
use crate::ledger::{Ledger, TimeInterval};
use crate::pricing::{Escalator, StartupDiscounter};
use crate::quantity::Quantity;

/// Which startup ramp default an operating schedule falls back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampCategory {
    Revenue,
    VariableCost,
    FixedCost,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartupFractions {
    pub revenue: f64,
    pub variable_cost: f64,
    pub fixed_cost: f64,
}

/// Project-wide settings every schedule builder reads, derived once from a complete
/// set of financial parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleContext {
    pub initial_date: NaiveDate,
    pub analysis_end: NaiveDate,
    pub startup_date: NaiveDate,
    /// First day after the plant's life.
    pub plant_end: NaiveDate,
    pub inflation_rate: f64,
    pub capacity: Quantity,
    pub capex_breakdown: Vec<f64>,
    pub startup_period: TimeInterval,
    pub startup_fractions: StartupFractions,
    pub depreciation: Depreciation,
    pub depreciation_length: u32,
}

impl ScheduleContext {
    /// Last operating day: the end of plant life or of the analysis, whichever is first.
    pub fn operations_end(&self) -> NaiveDate {
        (self.plant_end - Duration::days(1)).min(self.analysis_end)
    }

    /// Date of end-of-life entries (salvage, decommissioning).
    pub fn terminal_date(&self) -> NaiveDate {
        self.operations_end()
    }

    /// One row per operating day; empty when startup falls after the analysis window.
    pub fn operating_ledger(&self) -> Result<Ledger> {
        let start = self.startup_date.max(self.initial_date);
        let end = self.operations_end();
        if start > end {
            return Ok(Ledger::default());
        }
        Ledger::daily(start, end)
    }

    pub fn escalation(&self, escalator: &Escalator, from: NaiveDate, to: NaiveDate) -> Result<f64> {
        escalator.resolve(self.inflation_rate).factor(from, to)
    }

    pub fn default_ramp(&self, category: RampCategory) -> StartupDiscounter {
        let fraction = match category {
            RampCategory::Revenue => self.startup_fractions.revenue,
            RampCategory::VariableCost => self.startup_fractions.variable_cost,
            RampCategory::FixedCost => self.startup_fractions.fixed_cost,
        };
        StartupDiscounter::Fractional {
            fraction,
            duration: self.startup_period,
        }
    }

    pub fn ramp(&self, explicit: Option<&StartupDiscounter>, category: RampCategory) -> StartupDiscounter {
        explicit.copied().unwrap_or_else(|| self.default_ramp(category))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Ten-year analysis from 2020, two construction years, no ramp, no inflation.
    pub fn context() -> ScheduleContext {
        ScheduleContext {
            initial_date: date(2020, 1, 1),
            analysis_end: date(2029, 12, 31),
            startup_date: date(2022, 1, 1),
            plant_end: date(2042, 1, 1),
            inflation_rate: 0.0,
            capacity: Quantity::new(1000.0, "kg/day"),
            capex_breakdown: vec![0.5, 0.5],
            startup_period: TimeInterval::years(1),
            startup_fractions: StartupFractions {
                revenue: 1.0,
                variable_cost: 1.0,
                fixed_cost: 1.0,
            },
            depreciation: Depreciation::StraightLine,
            depreciation_length: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn operating_window_is_clipped_to_analysis() {
        let ctx = context();
        let ops = ctx.operating_ledger().unwrap();
        assert_eq!(ops.first_date(), Some(date(2022, 1, 1)));
        assert_eq!(ops.last_date(), Some(date(2029, 12, 31)));
    }

    #[test]
    fn operating_window_is_empty_when_startup_is_late() {
        let mut ctx = context();
        ctx.startup_date = date(2031, 1, 1);
        assert!(ctx.operating_ledger().unwrap().is_empty());
    }
}
