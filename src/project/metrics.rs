use std::collections::BTreeMap;

use crate::errors::{FinanceError, Result};
use crate::ledger::{columns, Ledger};

/// Bracket and stopping rule for the IRR search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IrrSettings {
    pub lower: f64,
    pub upper: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for IrrSettings {
    fn default() -> Self {
        Self {
            lower: 0.001,
            upper: 1.0,
            tolerance: 1e-10,
            max_iterations: 200,
        }
    }
}

/// Net cash flow summed per whole project year (`Period`).
pub fn cash_flows_by_period(ledger: &Ledger) -> Result<Vec<(i32, f64)>> {
    let periods = ledger.require(columns::PERIOD)?;
    let flows = ledger.require(columns::NET_CASH_FLOW)?;
    let mut by_period: BTreeMap<i32, f64> = BTreeMap::new();
    for (period, flow) in periods.iter().zip(flows) {
        *by_period.entry(*period as i32).or_insert(0.0) += flow;
    }
    Ok(by_period.into_iter().collect())
}

pub fn npv(flows: &[(i32, f64)], rate: f64) -> f64 {
    flows
        .iter()
        .map(|(period, flow)| flow / (1.0 + rate).powi(*period))
        .sum()
}

/// Rate in `settings.lower..settings.upper` at which [`npv`] is zero, by bisection.
pub fn irr(flows: &[(i32, f64)], settings: &IrrSettings) -> Result<f64> {
    let no_root = || FinanceError::NoRootFound {
        lower: settings.lower,
        upper: settings.upper,
    };
    let (mut lo, mut hi) = (settings.lower, settings.upper);
    let (mut f_lo, f_hi) = (npv(flows, lo), npv(flows, hi));
    if !f_lo.is_finite() || !f_hi.is_finite() {
        return Err(no_root());
    }
    if f_lo == 0.0 {
        return Ok(lo);
    }
    if f_hi == 0.0 {
        return Ok(hi);
    }
    if f_lo.signum() == f_hi.signum() {
        return Err(no_root());
    }
    for _ in 0..settings.max_iterations {
        let mid = 0.5 * (lo + hi);
        let f_mid = npv(flows, mid);
        if f_mid == 0.0 || 0.5 * (hi - lo) < settings.tolerance {
            return Ok(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    Ok(0.5 * (lo + hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn npv_discounts_by_whole_periods() {
        let flows = [(0, -100.0), (1, 110.0)];
        assert!(npv(&flows, 0.1).abs() < 1e-12);
        assert_eq!(npv(&flows, 0.0), 10.0);
    }

    #[test]
    fn irr_finds_the_zero_of_npv() {
        let flows = [(0, -1_000.0), (1, 300.0), (2, 400.0), (3, 500.0)];
        let rate = irr(&flows, &IrrSettings::default()).unwrap();
        assert!(npv(&flows, rate).abs() < 1e-6);
        assert!(rate > 0.08 && rate < 0.09);
    }

    #[test]
    fn no_sign_change_means_no_root() {
        let flows = [(0, 100.0), (1, 100.0)];
        assert!(matches!(
            irr(&flows, &IrrSettings::default()),
            Err(FinanceError::NoRootFound { .. })
        ));
    }
}
