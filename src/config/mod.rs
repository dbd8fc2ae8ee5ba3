use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::errors::Result;
use crate::project::IrrSettings;
use crate::tax::{
    CarrybackOrder, TaxPolicy, TaxTreatment, DEFAULT_CARRYBACK_YEARS, DEFAULT_CARRYFORWARD_YEARS,
    DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE,
};
use crate::utils::{app_data_dir, write_atomic};

const CONFIG_FILE: &str = "config.json";

/// Engine policy settings. Every field has a default so partial files load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub tax_treatment: TaxTreatment,
    pub carryback_order: CarrybackOrder,
    pub carryforward_years: u32,
    pub carryback_years: u32,
    pub tax_max_iterations: u32,
    pub tax_tolerance: f64,
    pub irr_lower: f64,
    pub irr_upper: f64,
    pub irr_tolerance: f64,
    pub irr_max_iterations: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let irr = IrrSettings::default();
        Self {
            tax_treatment: TaxTreatment::default(),
            carryback_order: CarrybackOrder::default(),
            carryforward_years: DEFAULT_CARRYFORWARD_YEARS,
            carryback_years: DEFAULT_CARRYBACK_YEARS,
            tax_max_iterations: DEFAULT_MAX_ITERATIONS,
            tax_tolerance: DEFAULT_TOLERANCE,
            irr_lower: irr.lower,
            irr_upper: irr.upper,
            irr_tolerance: irr.tolerance,
            irr_max_iterations: irr.max_iterations,
            log_filter: None,
        }
    }
}

impl EngineConfig {
    pub fn tax_policy(&self) -> TaxPolicy {
        TaxPolicy {
            treatment: self.tax_treatment,
            carryback_order: self.carryback_order,
            max_iterations: self.tax_max_iterations,
            tolerance: self.tax_tolerance,
        }
    }

    pub fn irr_settings(&self) -> IrrSettings {
        IrrSettings {
            lower: self.irr_lower,
            upper: self.irr_upper,
            tolerance: self.irr_tolerance,
            max_iterations: self.irr_max_iterations,
        }
    }
}

/// Loads and saves the engine configuration file.
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Uses `config.json` under the application directory.
    pub fn new() -> Self {
        Self::with_path(app_data_dir().join(CONFIG_FILE))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<EngineConfig> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            let config = serde_json::from_str(&data)?;
            tracing::debug!(path = %self.path.display(), "engine configuration loaded");
            Ok(config)
        } else {
            Ok(EngineConfig::default())
        }
    }

    pub fn save(&self, config: &EngineConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
