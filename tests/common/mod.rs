#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use project_finance::capex::{CapitalCosts, CapitalExpense, Depreciation, Installation};
use project_finance::debt::{Debt, DebtPortfolio};
use project_finance::ledger::TimeInterval;
use project_finance::operations::{FixedCosts, FixedExpense, VariableCosts, VariableExpense};
use project_finance::pricing::CostQuote;
use project_finance::project::{CapitalProject, FinancialParameters, ParameterKey, ParameterValue};
use project_finance::quantity::Quantity;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A fresh directory that outlives the calling test.
pub fn temp_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Ten-year analysis from 2020 with one construction year.
pub fn parameters() -> FinancialParameters {
    use ParameterKey::*;
    use ParameterValue as V;
    let mut params = FinancialParameters::new();
    for (key, value) in [
        (InitialDate, V::Date(date(2020, 1, 1))),
        (AnalysisPeriod, V::Duration(TimeInterval::years(10))),
        (PlantLife, V::Duration(TimeInterval::years(20))),
        (StateTaxRate, V::Number(0.05)),
        (FederalTaxRate, V::Number(0.20)),
        (InflationRate, V::Number(0.0)),
        (Capacity, V::Quantity(Quantity::new(100.0, "kg/day"))),
        (CapitalExpenseBreakdown, V::Fractions(vec![1.0])),
        (StartupPeriod, V::Duration(TimeInterval::months(6))),
        (StartupRevenueFraction, V::Number(0.5)),
        (StartupVariableCostFraction, V::Number(0.5)),
        (StartupFixedCostFraction, V::Number(1.0)),
        (SalvageValue, V::Number(0.05)),
        (DecommissioningCost, V::Number(0.02)),
        (DepreciationMethod, V::Depreciation(Depreciation::StraightLine)),
        (DepreciationLength, V::Integer(5)),
    ] {
        params.set(key, value).expect("valid parameter");
    }
    params
}

pub fn capital_costs() -> CapitalCosts {
    let mut capex = CapitalCosts::new("Plant");
    capex
        .add_expense(
            CapitalExpense::new("Reactor")
                .with_quote(CostQuote::new(1_500_000.0, date(2020, 1, 1)))
                .with_installation(Installation::Factor { factor: 1.2 }),
        )
        .expect("add reactor");
    capex
}

pub fn fixed_costs() -> FixedCosts {
    let mut fixed = FixedCosts::new();
    fixed
        .add(FixedExpense::new("Labor", CostQuote::new(20_000.0, date(2020, 1, 1))))
        .expect("add labor");
    fixed
}

pub fn variable_costs() -> VariableCosts {
    let mut variable = VariableCosts::new();
    variable
        .add(VariableExpense::new(
            "Feedstock",
            CostQuote::new(1.5, date(2020, 1, 1)),
            1.0,
        ))
        .expect("add feedstock");
    variable
}

pub fn debt() -> DebtPortfolio {
    let mut debt = DebtPortfolio::new();
    debt.add(Debt::loan(
        "Term loan",
        150_000.0,
        date(2020, 1, 1),
        TimeInterval::years(5),
        0.06,
        12,
    ))
    .expect("add loan");
    debt
}

/// Every gate set; ready to assemble.
pub fn ready_project() -> CapitalProject {
    let mut project = CapitalProject::new("Test plant");
    project.set_financial_parameters(parameters()).expect("parameters");
    project.set_capital_costs(capital_costs()).expect("capital costs");
    project.set_fixed_costs(fixed_costs()).expect("fixed costs");
    project.set_variable_costs(variable_costs()).expect("variable costs");
    project.set_debt(debt()).expect("debt");
    project
}

/// Sales price that leaves the test plant profitable.
pub const PRICE: f64 = 12.0;
