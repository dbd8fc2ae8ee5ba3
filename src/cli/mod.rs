//! Command-line entry point: load a project file, assemble it and report the
//! profitability metrics and financial statements.

pub mod sample;

use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use colored::Colorize;

use crate::config::ConfigManager;
use crate::errors::{FinanceError, Result};
use crate::project::{CapitalProject, ParameterKey};
use crate::report::{self, Resolution};
use crate::storage::{load_project_from_path, save_project_to_path};
use crate::tax::TaxTreatment;
use crate::utils::{build_info, init_tracing};

pub use sample::{sample_file, sample_project};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliResolution {
    Daily,
    Monthly,
    Annual,
}

impl From<CliResolution> for Resolution {
    fn from(value: CliResolution) -> Self {
        match value {
            CliResolution::Daily => Resolution::Daily,
            CliResolution::Monthly => Resolution::Monthly,
            CliResolution::Annual => Resolution::Annual,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliTaxTreatment {
    LossCarryover,
    Masked,
}

impl From<CliTaxTreatment> for TaxTreatment {
    fn from(value: CliTaxTreatment) -> Self {
        match value {
            CliTaxTreatment::LossCarryover => TaxTreatment::LossCarryover,
            CliTaxTreatment::Masked => TaxTreatment::Masked,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "project_finance_cli",
    version,
    about = "Assemble a capital project's cash flows and report NPV and IRR"
)]
pub struct Cli {
    /// Project file (JSON)
    project: Option<PathBuf>,

    /// Sales price of the primary product; defaults to the price stored in the file
    #[arg(long)]
    price: Option<f64>,

    /// Discount rate for NPV
    #[arg(long, default_value_t = 0.1)]
    discount_rate: f64,

    #[arg(long, value_enum, default_value_t = CliResolution::Annual)]
    resolution: CliResolution,

    /// Write the ledger at the chosen resolution as CSV
    #[arg(long, value_name = "OUT")]
    csv: Option<PathBuf>,

    /// Engine configuration file; overrides any configuration stored in the project
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    tax_treatment: Option<CliTaxTreatment>,

    /// Skip the financial statement table
    #[arg(long)]
    summary_only: bool,

    /// Write a sample project file and exit
    #[arg(long, value_name = "OUT")]
    template: Option<PathBuf>,

    /// List the financial parameters and their value types
    #[arg(long)]
    list_parameters: bool,

    #[arg(long)]
    build_info: bool,
}

/// Parses the process arguments and runs the command.
pub fn run_cli() -> Result<()> {
    run(Cli::parse())
}

pub fn run(cli: Cli) -> Result<()> {
    if cli.build_info {
        for line in build_info::current().lines() {
            println!("{line}");
        }
        return Ok(());
    }
    if cli.list_parameters {
        for key in ParameterKey::ALL {
            let optional = if key.is_optional() { " (optional)" } else { "" };
            println!("{:<28} {}{optional}", key.name(), key.kind().label());
        }
        return Ok(());
    }
    if let Some(out) = &cli.template {
        save_project_to_path(&sample_file()?, out)?;
        println!("Sample project written to {}", out.display());
        return Ok(());
    }

    let path = cli.project.as_ref().ok_or_else(|| {
        FinanceError::Storage("no project file given (see --help)".into())
    })?;
    let file = load_project_from_path(path)?;
    let mut config = match (&cli.config, &file.config) {
        (Some(config_path), _) => ConfigManager::with_path(config_path).load()?,
        (None, Some(stored)) => stored.clone(),
        (None, None) => ConfigManager::new().load()?,
    };
    if let Some(treatment) = cli.tax_treatment {
        config.tax_treatment = treatment.into();
    }
    init_tracing(config.log_filter.as_deref());

    let price = cli.price.or(file.sales_price).ok_or_else(|| {
        FinanceError::BadPricingInput("no sales price in the project file; pass --price".into())
    })?;
    let mut project = file.to_project()?;
    project.set_config(config);
    project.assemble_financials(price)?;
    report_project(&project, &cli, price)
}

fn report_project(project: &CapitalProject, cli: &Cli, price: f64) -> Result<()> {
    let resolution = Resolution::from(cli.resolution);
    println!("{}", format!("=== {} ===", project.name).bold());
    println!("Sales price     : {price}");
    println!(
        "NPV @ {:>5.2}%   : {}",
        cli.discount_rate * 100.0,
        report::format_amount(project.calc_npv(cli.discount_rate)?)
    );
    match project.calc_irr() {
        Ok(rate) => println!("IRR             : {:.2}%", rate * 100.0),
        Err(FinanceError::NoRootFound { lower, upper }) => println!(
            "IRR             : {}",
            format!("no root between {lower} and {upper}").yellow()
        ),
        Err(err) => return Err(err),
    }

    let ledger = project.roll_up(resolution)?;
    if let Some(out) = &cli.csv {
        fs::write(out, ledger.to_csv())?;
        println!("{resolution} ledger written to {}", out.display());
    }
    if !cli.summary_only {
        println!();
        println!("{}", report::render_ledger(&ledger));
    }
    Ok(())
}
