use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{FinanceError, Result};
use crate::ledger::TimeInterval;

/// Ramp factor applied to a quantity during the window that opens at startup.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StartupDiscounter {
    #[default]
    None,
    Fractional {
        fraction: f64,
        duration: TimeInterval,
    },
}

impl StartupDiscounter {
    pub fn validate(&self) -> Result<()> {
        match self {
            StartupDiscounter::Fractional { fraction, .. } if !(0.0..=1.0).contains(fraction) => {
                Err(FinanceError::BadPricingInput(format!(
                    "startup fraction {fraction} must lie in [0, 1]"
                )))
            }
            _ => Ok(()),
        }
    }

    /// `fraction` on dates in `[startup, startup + duration)`, 1.0 elsewhere.
    pub fn factor(&self, startup: NaiveDate, date: NaiveDate) -> f64 {
        match self {
            StartupDiscounter::None => 1.0,
            StartupDiscounter::Fractional { fraction, duration } => {
                if date >= startup && date < duration.nth_date(startup, 1) {
                    *fraction
                } else {
                    1.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fraction_applies_inside_window_only() {
        let ramp = StartupDiscounter::Fractional {
            fraction: 0.5,
            duration: TimeInterval::months(6),
        };
        let startup = date(2025, 1, 1);
        assert_eq!(ramp.factor(startup, date(2024, 12, 31)), 1.0);
        assert_eq!(ramp.factor(startup, startup), 0.5);
        assert_eq!(ramp.factor(startup, date(2025, 6, 30)), 0.5);
        assert_eq!(ramp.factor(startup, date(2025, 7, 1)), 1.0);
    }

    #[test]
    fn fraction_outside_unit_interval_is_rejected() {
        let ramp = StartupDiscounter::Fractional {
            fraction: 1.5,
            duration: TimeInterval::years(1),
        };
        assert!(ramp.validate().is_err());
    }
}
