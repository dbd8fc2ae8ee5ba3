use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capex::CapitalCosts;
use crate::config::EngineConfig;
use crate::debt::DebtPortfolio;
use crate::errors::{FinanceError, Result};
use crate::operations::{FixedCosts, ProductionPortfolio, VariableCosts};
use crate::project::{CapitalProject, FinancialParameters};
use crate::tax::TaxManager;

pub const PROJECT_SCHEMA_VERSION: u32 = 1;

/// On-disk form of a [`CapitalProject`]: its inputs, never its ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectFile {
    pub schema_version: u32,
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<EngineConfig>,
    /// Primary product price used when none is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_price: Option<f64>,
    #[serde(default)]
    pub financial_parameters: Option<FinancialParameters>,
    #[serde(default)]
    pub capital_costs: Option<CapitalCosts>,
    #[serde(default)]
    pub fixed_costs: Option<FixedCosts>,
    #[serde(default)]
    pub variable_costs: Option<VariableCosts>,
    #[serde(default)]
    pub debt_portfolio: Option<DebtPortfolio>,
    #[serde(default)]
    pub by_products: ProductionPortfolio,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_manager: Option<TaxManager>,
}

impl ProjectFile {
    pub fn from_project(project: &CapitalProject) -> Self {
        let now = Utc::now();
        Self {
            schema_version: PROJECT_SCHEMA_VERSION,
            id: Uuid::new_v4(),
            name: project.name.clone(),
            created_at: now,
            updated_at: now,
            config: Some(project.config().clone()),
            sales_price: None,
            financial_parameters: project.parameters().cloned(),
            capital_costs: project.capital_costs().cloned(),
            fixed_costs: project.fixed_costs().cloned(),
            variable_costs: project.variable_costs().cloned(),
            debt_portfolio: project.debt().cloned(),
            by_products: project.by_products().clone(),
            tax_manager: project.tax_manager().cloned(),
        }
    }

    /// Refreshes the inputs from `project`, keeping identity and creation time.
    pub fn update_from(&mut self, project: &CapitalProject) {
        let fresh = Self::from_project(project);
        *self = Self {
            id: self.id,
            created_at: self.created_at,
            sales_price: self.sales_price,
            ..fresh
        };
    }

    /// Rebuilds the project through its setters, so every input is validated and
    /// the gates open exactly as they would for a hand-built project.
    pub fn to_project(&self) -> Result<CapitalProject> {
        if self.schema_version > PROJECT_SCHEMA_VERSION {
            return Err(FinanceError::Storage(format!(
                "project `{}` uses schema version {}, newer than {}",
                self.name, self.schema_version, PROJECT_SCHEMA_VERSION
            )));
        }
        let mut project =
            CapitalProject::with_config(self.name.clone(), self.config.clone().unwrap_or_default());
        if let Some(parameters) = &self.financial_parameters {
            project.set_financial_parameters(parameters.clone())?;
        }
        if let Some(costs) = &self.capital_costs {
            project.set_capital_costs(costs.clone())?;
        }
        if let Some(costs) = &self.fixed_costs {
            project.set_fixed_costs(costs.clone())?;
        }
        if let Some(costs) = &self.variable_costs {
            project.set_variable_costs(costs.clone())?;
        }
        if let Some(debt) = &self.debt_portfolio {
            project.set_debt(debt.clone())?;
        }
        project.set_by_products(self.by_products.clone())?;
        project.set_tax_manager(self.tax_manager.clone());
        Ok(project)
    }
}
