use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Order in which a loss is offset against the years of its carryback window.
///
/// This is a tax-policy choice; jurisdictions differ.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CarrybackOrder {
    #[default]
    MostRecentFirst,
    OldestFirst,
}

/// Result of netting losses across years.
#[derive(Debug, Clone, PartialEq)]
pub struct CarryoverOutcome {
    /// Taxable income per year after carryback and carryforward; loss years are zero.
    pub adjusted: Vec<f64>,
    /// Loss still carried forward after the last year.
    pub unabsorbed: f64,
    /// Loss pushed out of the full carryforward queue unused.
    pub expired: f64,
}

/// Walks consecutive years in order. A loss first reduces positive income in up to
/// `carryback_years` earlier years, then waits in a FIFO queue to offset later
/// profits. The queue holds at most `carryforward_years` losses; queuing one more
/// drops the oldest, however many years each has waited.
pub fn carry_losses(
    income: &[f64],
    carryback_years: u32,
    carryforward_years: u32,
    order: CarrybackOrder,
) -> CarryoverOutcome {
    let mut adjusted = income.to_vec();
    let mut queue: VecDeque<f64> = VecDeque::new();
    let mut expired = 0.0;

    for year in 0..adjusted.len() {
        if adjusted[year] < 0.0 {
            let mut loss = -adjusted[year];
            let first = year.saturating_sub(carryback_years as usize);
            let window: Vec<usize> = match order {
                CarrybackOrder::MostRecentFirst => (first..year).rev().collect(),
                CarrybackOrder::OldestFirst => (first..year).collect(),
            };
            for prior in window {
                if loss <= 0.0 {
                    break;
                }
                let used = adjusted[prior].max(0.0).min(loss);
                adjusted[prior] -= used;
                loss -= used;
            }
            if loss > 0.0 {
                queue.push_back(loss);
                while queue.len() > carryforward_years as usize {
                    if let Some(oldest) = queue.pop_front() {
                        expired += oldest;
                    }
                }
            }
            adjusted[year] = 0.0;
        } else {
            while adjusted[year] > 0.0 {
                let Some(front) = queue.front_mut() else {
                    break;
                };
                let used = front.min(adjusted[year]);
                adjusted[year] -= used;
                *front -= used;
                if *front <= 0.0 {
                    queue.pop_front();
                }
            }
        }
    }

    CarryoverOutcome {
        adjusted,
        unabsorbed: queue.iter().sum(),
        expired,
    }
}
