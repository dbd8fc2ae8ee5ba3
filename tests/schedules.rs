mod common;

use common::date;
use project_finance::capex::{macrs_table, Depreciation};
use project_finance::debt::{Debt, DebtPortfolio};
use project_finance::ledger::{columns, Ledger, TimeInterval};
use project_finance::tax::{carry_losses, CarrybackOrder, Tax, TaxKind, TaxPolicy};

#[test]
fn straight_line_depreciation_is_level_and_conserves_cost() {
    let cost = 90_000.0;
    let ledger = Depreciation::StraightLine
        .schedule("Compressor", cost, date(2021, 7, 1), 4)
        .unwrap();
    let days = (date(2025, 7, 1) - date(2021, 7, 1)).num_days() as usize;
    assert_eq!(ledger.len(), days);
    let values = ledger.column(columns::DEPRECIATION).unwrap();
    assert!(values.iter().all(|v| (v - cost / days as f64).abs() < 1e-12));
    assert!((ledger.total(columns::DEPRECIATION) - cost).abs() < 1e-6);
}

#[test]
fn three_year_macrs_matches_the_published_table() {
    let ledger = Depreciation::Macrs
        .schedule("Truck", 200.0, date(2021, 1, 1), 3)
        .unwrap();
    let annual = ledger.roll_up(TimeInterval::years(1));
    let totals = annual.column(columns::DEPRECIATION).unwrap();
    let expected = [0.3333, 0.4445, 0.1481, 0.0741].map(|share| share * 200.0);
    assert_eq!(totals.len(), expected.len());
    for (total, want) in totals.iter().zip(expected) {
        assert!((total - want).abs() < 1e-9, "{total} vs {want}");
    }
    assert_eq!(macrs_table(3).unwrap(), &[0.3333, 0.4445, 0.1481, 0.0741]);
}

#[test]
fn loan_amortization_matches_the_worked_example() {
    let loan = Debt::loan(
        "Plant loan",
        686_000.0,
        date(2015, 1, 1),
        TimeInterval::years(20),
        0.085,
        1,
    );
    let schedule = loan.schedule().unwrap();
    let year_end = date(2015, 12, 31);
    assert_eq!(schedule.value(columns::LOAN_PROCEEDS, date(2015, 1, 1)), Some(686_000.0));
    let interest = schedule.value(columns::INTEREST, year_end).unwrap();
    let principal = schedule.value(columns::PRINCIPAL_PAYMENTS, year_end).unwrap();
    let balance = schedule
        .value_on_or_before(columns::PRINCIPAL_BALANCE, year_end)
        .unwrap();
    assert!((interest - 58_310.0).abs() < 1e-2);
    assert!((principal - 14_180.29).abs() < 1e-2);
    assert!((balance - 671_819.71).abs() < 1e-2);
    assert_eq!(schedule.last_date(), Some(date(2034, 12, 31)));
}

#[test]
fn portfolio_cip_is_restricted_to_the_window() {
    let mut portfolio = DebtPortfolio::new();
    portfolio
        .add(Debt::loan("A", 1_000.0, date(2020, 1, 1), TimeInterval::years(4), 0.05, 1))
        .unwrap();
    portfolio
        .add(Debt::loan("B", 500.0, date(2021, 1, 1), TimeInterval::years(2), 0.0, 2))
        .unwrap();
    assert!(portfolio
        .add(Debt::loan("A", 1.0, date(2020, 1, 1), TimeInterval::years(1), 0.0, 1))
        .is_err());

    let cip = portfolio.cip(date(2020, 1, 1), date(2021, 12, 31)).unwrap();
    assert!(!cip.has_column(columns::PRINCIPAL_BALANCE));
    assert_eq!(cip.total(columns::LOAN_PROCEEDS), 1_500.0);
    assert!(cip.last_date().unwrap() <= date(2021, 12, 31));
    // B pays 125 twice in 2021 at a zero rate.
    assert_eq!(cip.value(columns::PRINCIPAL_PAYMENTS, date(2021, 6, 30)), Some(125.0));
}

#[test]
fn two_loss_years_are_absorbed_by_the_profit_year() {
    let outcome = carry_losses(&[-60.0, -40.0, 150.0], 2, 10, CarrybackOrder::MostRecentFirst);
    assert_eq!(outcome.adjusted, vec![0.0, 0.0, 50.0]);
    assert_eq!(outcome.unabsorbed, 0.0);
    assert_eq!(outcome.expired, 0.0);

    let dates = [2021, 2022, 2023].map(|y| date(y, 12, 31));
    let mut ledger = Ledger::new(dates);
    ledger.set_column("Income", vec![-60.0, -40.0, 150.0]).unwrap();
    let tax = Tax::new("Tax", TaxKind::Fractional { rate: 0.5 })
        .on(&["Income"], &[])
        .with_carryover(2, 10);
    let computation = tax.compute(&ledger, &[], &TaxPolicy::default()).unwrap();
    assert_eq!(computation.column, vec![0.0, 0.0, 25.0]);
    assert_eq!(computation.unabsorbed_loss, 0.0);
}
