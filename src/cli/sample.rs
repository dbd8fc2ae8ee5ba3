use chrono::NaiveDate;

use crate::capex::{
    CapitalCosts, CapitalExpense, Depreciation, IndirectCapitalExpense, Installation, PaymentTerms,
};
use crate::debt::{Debt, DebtPortfolio};
use crate::errors::{FinanceError, Result};
use crate::ledger::TimeInterval;
use crate::operations::{FixedCosts, FixedExpense, VariableCosts, VariableExpense};
use crate::pricing::{CostQuote, Escalator, Scaler};
use crate::project::{CapitalProject, FinancialParameters, ParameterKey, ParameterValue};
use crate::quantity::Quantity;
use crate::storage::ProjectFile;

const SAMPLE_PRICE: f64 = 5.0;

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| {
        FinanceError::invalid_parameter("date", format!("{y}-{m}-{d} is not a calendar date"))
    })
}

/// A 50 t/day hydrogen plant: two construction years, thirty years of analysis.
pub fn sample_project() -> Result<CapitalProject> {
    use ParameterKey::*;
    use ParameterValue as V;

    let start = date(2025, 1, 1)?;
    let mut params = FinancialParameters::new();
    for (key, value) in [
        (InitialDate, V::Date(start)),
        (AnalysisPeriod, V::Duration(TimeInterval::years(30))),
        (PlantLife, V::Duration(TimeInterval::years(25))),
        (StateTaxRate, V::Number(0.06)),
        (FederalTaxRate, V::Number(0.21)),
        (InflationRate, V::Number(0.02)),
        (Capacity, V::Quantity(Quantity::new(50_000.0, "kg/day"))),
        (CapitalExpenseBreakdown, V::Fractions(vec![0.4, 0.6])),
        (StartupPeriod, V::Duration(TimeInterval::years(1))),
        (StartupRevenueFraction, V::Number(0.75)),
        (StartupVariableCostFraction, V::Number(0.75)),
        (StartupFixedCostFraction, V::Number(1.0)),
        (SalvageValue, V::Number(0.1)),
        (DecommissioningCost, V::Number(0.1)),
        (DepreciationMethod, V::Depreciation(Depreciation::Macrs)),
        (DepreciationLength, V::Integer(7)),
    ] {
        params.set(key, value)?;
    }

    let mut capex = CapitalCosts::new("Plant");
    capex.add_expense(
        CapitalExpense::new("Electrolyser")
            .with_quote(
                CostQuote::new(60_000_000.0, start)
                    .scaled(Quantity::new(40_000.0, "kg/day"), Scaler::Exponential { exponent: 0.6 }),
            )
            .with_installation(Installation::Factor { factor: 1.3 })
            .with_escalator(Escalator::GeneralInflation),
    )?;
    capex.add_expense(
        CapitalExpense::new("Compression")
            .with_quote(CostQuote::new(8_000_000.0, start))
            .with_installation(Installation::Markup { amount: 500_000.0 })
            .with_payment_terms(PaymentTerms::LumpSumOnDelivery),
    )?;
    capex.add_indirect(IndirectCapitalExpense::new("Engineering", 0.12))?;

    let mut fixed = FixedCosts::new();
    fixed.add(
        FixedExpense::new("Labor", CostQuote::new(3_500_000.0, start))
            .with_escalator(Escalator::GeneralInflation),
    )?;
    fixed.add(FixedExpense::new("Insurance", CostQuote::new(900_000.0, start)))?;

    let mut variable = VariableCosts::new();
    variable.add(
        VariableExpense::new("Electricity", CostQuote::new(0.05, start), 52.0)
            .with_escalator(Escalator::GeneralInflation),
    )?;
    variable.add(VariableExpense::new("Water", CostQuote::new(0.002, start), 9.0))?;

    let mut debt = DebtPortfolio::new();
    debt.add(Debt::loan(
        "Construction loan",
        40_000_000.0,
        start,
        TimeInterval::years(15),
        0.065,
        4,
    ))?;

    let mut project = CapitalProject::new("Sample hydrogen plant");
    project.set_financial_parameters(params)?;
    project.set_capital_costs(capex)?;
    project.set_fixed_costs(fixed)?;
    project.set_variable_costs(variable)?;
    project.set_debt(debt)?;
    Ok(project)
}

/// [`sample_project`] as a project file carrying its sales price.
pub fn sample_file() -> Result<ProjectFile> {
    let mut file = ProjectFile::from_project(&sample_project()?);
    file.sales_price = Some(SAMPLE_PRICE);
    Ok(file)
}
