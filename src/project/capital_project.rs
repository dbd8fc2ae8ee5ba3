use super::context::ScheduleContext;
use super::metrics::{self, cash_flows_by_period};
use super::params::{FinancialParameters, ParameterKey};
use super::readiness::{Gate, Readiness, Slot};
use crate::capex::CapitalCosts;
use crate::config::EngineConfig;
use crate::debt::DebtPortfolio;
use crate::errors::{FinanceError, Result};
use crate::ledger::time_interval::anniversaries;
use crate::ledger::{columns, Ledger};
use crate::operations::{FixedCosts, Product, Production, ProductionPortfolio, VariableCosts};
use crate::pricing::{CostQuote, Escalator};
use crate::report::{self, Resolution};
use crate::tax::{Tax, TaxKind, TaxManager};

/// Name of the primary product stream; variable expenses without a stream link
/// consume it.
pub const PRIMARY_PRODUCT: &str = "Production";

/// Name of the income tax used when no tax manager is installed.
pub const DEFAULT_INCOME_TAX: &str = "Income_tax";

/// A capital investment project: its inputs, readiness gates and master ledger.
///
/// Inputs are installed through the `set_*` methods in any order. Once every gate
/// is set, [`CapitalProject::assemble_financials`] rebuilds the daily ledger from
/// scratch, so repeated calls with the same inputs give the same ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct CapitalProject {
    pub name: String,
    config: EngineConfig,
    parameters: Option<FinancialParameters>,
    gates: Readiness,
    by_products: ProductionPortfolio,
    tax_manager: Option<TaxManager>,
    ledger: Option<Ledger>,
}

/// Derived columns written after every schedule is in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line {
    Revenue,
    CostOfSales,
    Ebitda,
    PreDepreciationIncome,
    TaxableIncome,
}

impl CapitalProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, EngineConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: EngineConfig) -> Self {
        Self {
            name: name.into(),
            config,
            parameters: None,
            gates: Readiness::default(),
            by_products: ProductionPortfolio::default(),
            tax_manager: None,
            ledger: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }

    /// Stores the parameters. A complete set also opens the parameters gate and
    /// starts a fresh master ledger with its `Period` column; an incomplete one is
    /// kept for later but leaves the gate closed.
    pub fn set_financial_parameters(&mut self, parameters: FinancialParameters) -> Result<()> {
        if parameters.is_complete() {
            let context = parameters.to_context()?;
            let ledger = period_ledger(&context)?;
            tracing::info!(
                project = %self.name,
                start = %context.initial_date,
                end = %context.analysis_end,
                rows = ledger.len(),
                "master ledger initialised"
            );
            self.gates.context = Slot::Set(context);
            self.ledger = Some(ledger);
        } else {
            tracing::debug!(
                project = %self.name,
                missing = parameters.missing().len(),
                "financial parameters stored incomplete"
            );
            self.gates.context = Slot::Unset;
            self.ledger = None;
        }
        self.parameters = Some(parameters);
        Ok(())
    }

    pub fn set_capital_costs(&mut self, costs: CapitalCosts) -> Result<()> {
        costs.validate()?;
        self.gates.capital_costs = Slot::Set(costs);
        Ok(())
    }

    pub fn set_fixed_costs(&mut self, costs: FixedCosts) -> Result<()> {
        self.gates.fixed_costs = Slot::Set(costs);
        Ok(())
    }

    pub fn set_variable_costs(&mut self, costs: VariableCosts) -> Result<()> {
        self.gates.variable_costs = Slot::Set(costs);
        Ok(())
    }

    pub fn set_debt(&mut self, debt: DebtPortfolio) -> Result<()> {
        debt.validate()?;
        self.gates.debt = Slot::Set(debt);
        Ok(())
    }

    /// By-product streams sold next to the primary product. None may reuse the
    /// primary product's name.
    pub fn set_by_products(&mut self, by_products: ProductionPortfolio) -> Result<()> {
        if by_products.get(PRIMARY_PRODUCT).is_some() {
            return Err(FinanceError::DuplicateName {
                collection: "production portfolio".into(),
                name: PRIMARY_PRODUCT.into(),
            });
        }
        self.by_products = by_products;
        Ok(())
    }

    /// Replaces the default income tax; `None` restores it.
    pub fn set_tax_manager(&mut self, manager: Option<TaxManager>) {
        self.tax_manager = manager;
    }

    pub fn parameters(&self) -> Option<&FinancialParameters> {
        self.parameters.as_ref()
    }

    pub fn context(&self) -> Option<&ScheduleContext> {
        self.gates.context.get()
    }

    pub fn capital_costs(&self) -> Option<&CapitalCosts> {
        self.gates.capital_costs.get()
    }

    pub fn fixed_costs(&self) -> Option<&FixedCosts> {
        self.gates.fixed_costs.get()
    }

    pub fn variable_costs(&self) -> Option<&VariableCosts> {
        self.gates.variable_costs.get()
    }

    pub fn debt(&self) -> Option<&DebtPortfolio> {
        self.gates.debt.get()
    }

    pub fn by_products(&self) -> &ProductionPortfolio {
        &self.by_products
    }

    pub fn tax_manager(&self) -> Option<&TaxManager> {
        self.tax_manager.as_ref()
    }

    pub fn missing_gates(&self) -> Vec<Gate> {
        self.gates.missing()
    }

    pub fn is_ready(&self) -> bool {
        self.gates.is_ready()
    }

    /// The master ledger; before assembly it holds only `Period`.
    pub fn financials(&self) -> Option<&Ledger> {
        self.ledger.as_ref()
    }

    /// Builds every schedule and income-statement line into the master ledger.
    /// `price` is the primary product's sales price per unit of capacity, quoted
    /// as of the initial date and escalated at the project inflation rate.
    pub fn assemble_financials(&mut self, price: f64) -> Result<&Ledger> {
        let inputs = self.gates.require()?;
        if !price.is_finite() {
            return Err(FinanceError::BadPricingInput(format!(
                "sales price {price} is not a number"
            )));
        }
        let ctx = inputs.context;
        let mut ledger = period_ledger(ctx)?;

        // Capital outlays and depreciation.
        let capex = inputs.capital_costs.schedule(ctx)?;
        let dropped = ledger.absorb(&capex.outlays) + ledger.absorb(&capex.depreciation);
        warn_dropped(&self.name, "capital costs", dropped);
        ensure_columns(&mut ledger, &[columns::CAPITAL_EXPENDITURES, columns::DEPRECIATION])?;
        stage(&ledger, columns::CAPITAL_EXPENDITURES);

        // Production, pricing and sales.
        let primary = self.primary_production(price, ctx)?;
        let dropped = ledger.absorb(&primary) + ledger.absorb(&self.by_products.schedule(ctx)?);
        warn_dropped(&self.name, "production", dropped);
        ensure_columns(
            &mut ledger,
            &[columns::PRODUCTION, columns::SALES_PRICE, columns::SALES],
        )?;
        stage(&ledger, columns::SALES);

        let total_capex = capex.total_outlay();
        let terminal = ctx.terminal_date();
        let salvage = self.fraction(ParameterKey::SalvageValue)? * total_capex;
        ensure_columns(&mut ledger, &[columns::SALVAGE])?;
        ledger.add_entry(columns::SALVAGE, terminal, salvage);
        derive(&mut ledger, Line::Revenue)?;
        stage(&ledger, columns::REVENUE);

        // Operating costs.
        let capacity = ctx.capacity.per_day();
        let by_products = &self.by_products;
        let variable = inputs.variable_costs.schedule(ctx, |stream| match stream {
            None => Some(capacity),
            Some(PRIMARY_PRODUCT) => Some(capacity),
            Some(name) => by_products.get(name).map(Production::nameplate_per_day),
        })?;
        let dropped = ledger.absorb(&variable);
        warn_dropped(&self.name, "variable costs", dropped);
        let dropped = ledger.absorb(&inputs.fixed_costs.schedule(ctx)?);
        warn_dropped(&self.name, "fixed costs", dropped);
        ensure_columns(&mut ledger, &[columns::VARIABLE_COSTS, columns::FIXED_COSTS])?;
        stage(&ledger, columns::VARIABLE_COSTS);
        stage(&ledger, columns::FIXED_COSTS);

        // Debt service.
        let dropped = ledger.absorb(&inputs.debt.cash_flows()?);
        warn_dropped(&self.name, "debt service", dropped);
        ensure_columns(
            &mut ledger,
            &[columns::LOAN_PROCEEDS, columns::INTEREST, columns::PRINCIPAL_PAYMENTS],
        )?;
        stage(&ledger, columns::INTEREST);

        let decommissioning = self.fraction(ParameterKey::DecommissioningCost)? * total_capex;
        ensure_columns(&mut ledger, &[columns::DECOMMISSIONING_COSTS])?;
        ledger.add_entry(columns::DECOMMISSIONING_COSTS, terminal, decommissioning);

        for line in [
            Line::CostOfSales,
            Line::Ebitda,
            Line::PreDepreciationIncome,
            Line::TaxableIncome,
        ] {
            derive(&mut ledger, line)?;
        }
        stage(&ledger, columns::TAXABLE_INCOME);

        // Taxes.
        let manager = match &self.tax_manager {
            Some(manager) => manager.clone(),
            None => self.default_tax_manager()?,
        };
        let outcome = manager.build(&ledger, &self.config.tax_policy())?;
        ledger.absorb(&outcome.ledger);
        tracing::debug!(
            iterations = outcome.iterations,
            converged = outcome.converged,
            taxes = ledger.total(columns::TAXES),
            "taxes computed"
        );

        let taxable = ledger.require(columns::TAXABLE_INCOME)?.to_vec();
        let taxes = ledger.require(columns::TAXES)?;
        let after_tax: Vec<f64> = taxable.iter().zip(taxes).map(|(t, tax)| t - tax).collect();
        ledger.set_column(columns::AFTER_TAX_INCOME, after_tax)?;

        let net = combine(
            &ledger,
            &[columns::AFTER_TAX_INCOME, columns::LOAN_PROCEEDS, columns::DEPRECIATION],
            &[columns::CAPITAL_EXPENDITURES, columns::PRINCIPAL_PAYMENTS],
        )?;
        ledger.set_column(columns::NET_CASH_FLOW, net)?;

        tracing::info!(
            project = %self.name,
            rows = ledger.len(),
            net_cash_flow = ledger.total(columns::NET_CASH_FLOW),
            "financials assembled"
        );
        Ok(self.ledger.insert(ledger))
    }

    pub fn roll_up_monthly(&self) -> Result<Ledger> {
        self.roll_up(Resolution::Monthly)
    }

    pub fn roll_up_annual(&self) -> Result<Ledger> {
        self.roll_up(Resolution::Annual)
    }

    /// Master ledger summed into calendar buckets. `Period` is re-derived from
    /// each bucket's start instead of summed.
    pub fn roll_up(&self, resolution: Resolution) -> Result<Ledger> {
        let ledger = self.assembled()?;
        let interval = match resolution.interval() {
            Some(interval) => interval,
            None => return Ok(ledger.clone()),
        };
        let initial = self.require_context()?.initial_date;
        let mut rolled = ledger.roll_up(interval);
        let periods = rolled
            .dates()
            .iter()
            .map(|date| anniversaries(initial, (*date).max(initial)) as f64)
            .collect();
        rolled.set_column(columns::PERIOD, periods)?;
        Ok(rolled)
    }

    /// Net cash flow discounted by whole project years.
    pub fn calc_npv(&self, rate: f64) -> Result<f64> {
        let flows = cash_flows_by_period(self.assembled()?)?;
        Ok(metrics::npv(&flows, rate))
    }

    pub fn calc_irr(&self) -> Result<f64> {
        let flows = cash_flows_by_period(self.assembled()?)?;
        metrics::irr(&flows, &self.config.irr_settings())
    }

    pub fn render_financials(&self, resolution: Resolution) -> Result<String> {
        let ledger = self.roll_up(resolution)?;
        Ok(report::render_ledger(&ledger))
    }

    pub fn print_financials(&self, resolution: Resolution) -> Result<()> {
        println!("{}", self.render_financials(resolution)?);
        Ok(())
    }

    fn assembled(&self) -> Result<&Ledger> {
        match &self.ledger {
            Some(ledger) if ledger.has_column(columns::NET_CASH_FLOW) => Ok(ledger),
            _ => Err(FinanceError::NotReady {
                missing: "assembled financials".into(),
            }),
        }
    }

    fn require_context(&self) -> Result<&ScheduleContext> {
        self.gates.context.get().ok_or_else(|| FinanceError::NotReady {
            missing: Gate::Parameters.to_string(),
        })
    }

    fn fraction(&self, key: ParameterKey) -> Result<f64> {
        self.parameters
            .as_ref()
            .ok_or_else(|| FinanceError::MissingParameter(key.name().to_string()))?
            .number(key)
    }

    /// The primary product at nameplate capacity, mapped onto `Production`,
    /// `Sales_price` and `Sales`.
    fn primary_production(&self, price: f64, ctx: &ScheduleContext) -> Result<Ledger> {
        let product = Product::new(PRIMARY_PRODUCT).priced(
            CostQuote::new(price, ctx.initial_date),
            Escalator::GeneralInflation,
        );
        let mut schedule = Production::new(product, ctx.capacity.clone()).schedule(ctx)?;
        let mut mapped = Ledger::new(schedule.dates().iter().copied());
        for (from, to) in [
            (columns::rate_of(PRIMARY_PRODUCT), columns::PRODUCTION),
            (columns::price_of(PRIMARY_PRODUCT), columns::SALES_PRICE),
            (columns::revenue_of(PRIMARY_PRODUCT), columns::SALES),
        ] {
            let values = schedule
                .remove_column(&from)
                .ok_or(FinanceError::MissingColumn(from))?;
            mapped.set_column(to, values)?;
        }
        Ok(mapped)
    }

    fn default_tax_manager(&self) -> Result<TaxManager> {
        let rate = self
            .parameters
            .as_ref()
            .ok_or_else(|| FinanceError::MissingParameter(ParameterKey::StateTaxRate.name().into()))?
            .income_tax_rate()?;
        let tax = Tax::new(DEFAULT_INCOME_TAX, TaxKind::Fractional { rate })
            .on(
                &[columns::REVENUE],
                &[columns::COST_OF_SALES, columns::INTEREST, columns::DEPRECIATION],
            )
            .with_carryover(self.config.carryback_years, self.config.carryforward_years);
        let mut manager = TaxManager::new();
        manager.add_tax(tax)?;
        Ok(manager)
    }
}

/// Daily rows over the analysis window with whole project years in `Period`.
fn period_ledger(ctx: &ScheduleContext) -> Result<Ledger> {
    let mut ledger = Ledger::daily(ctx.initial_date, ctx.analysis_end)?;
    let periods = ledger
        .dates()
        .iter()
        .map(|date| anniversaries(ctx.initial_date, *date) as f64)
        .collect();
    ledger.set_column(columns::PERIOD, periods)?;
    Ok(ledger)
}

fn ensure_columns(ledger: &mut Ledger, names: &[&str]) -> Result<()> {
    for name in names {
        if !ledger.has_column(name) {
            let zeros = vec![0.0; ledger.len()];
            ledger.set_column(name, zeros)?;
        }
    }
    Ok(())
}

/// Row-wise sum of `plus` columns less `minus` columns.
fn combine(ledger: &Ledger, plus: &[&str], minus: &[&str]) -> Result<Vec<f64>> {
    let mut out = vec![0.0; ledger.len()];
    for (names, sign) in [(plus, 1.0), (minus, -1.0)] {
        for name in names {
            for (acc, value) in out.iter_mut().zip(ledger.require(name)?) {
                *acc += sign * value;
            }
        }
    }
    Ok(out)
}

fn derive(ledger: &mut Ledger, line: Line) -> Result<()> {
    let (name, plus, minus): (&str, &[&str], &[&str]) = match line {
        Line::Revenue => (columns::REVENUE, &[columns::SALES, columns::SALVAGE], &[]),
        Line::CostOfSales => (
            columns::COST_OF_SALES,
            &[
                columns::FIXED_COSTS,
                columns::VARIABLE_COSTS,
                columns::DECOMMISSIONING_COSTS,
            ],
            &[],
        ),
        Line::Ebitda => (columns::EBITDA, &[columns::REVENUE], &[columns::COST_OF_SALES]),
        Line::PreDepreciationIncome => (
            columns::PRE_DEPRECIATION_INCOME,
            &[columns::EBITDA],
            &[columns::INTEREST],
        ),
        Line::TaxableIncome => (
            columns::TAXABLE_INCOME,
            &[columns::PRE_DEPRECIATION_INCOME],
            &[columns::DEPRECIATION],
        ),
    };
    let values = combine(ledger, plus, minus)?;
    ledger.set_column(name, values)
}

/// Reports amounts that fell outside the master ledger's dates when a stage was
/// absorbed.
fn warn_dropped(project: &str, stage: &str, dropped: f64) {
    if dropped > 0.0 {
        tracing::warn!(
            project,
            stage,
            dropped,
            "scheduled amounts outside the analysis window were dropped"
        );
    }
}

fn stage(ledger: &Ledger, column: &str) {
    tracing::debug!(column, total = ledger.total(column), "assembly stage written");
}
