mod common;

use assert_cmd::Command;
use common::temp_dir;
use predicates::prelude::*;
use predicates::str::contains;
use project_finance::cli::sample_file;
use project_finance::debt::{Debt, DebtPortfolio};
use project_finance::ledger::TimeInterval;
use project_finance::storage::save_project_to_path;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("project_finance_cli").unwrap();
    cmd.env("PROJECT_FINANCE_HOME", temp_dir())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn template_then_run_reports_metrics() {
    let dir = temp_dir();
    let project = dir.join("sample.json");
    let csv = dir.join("annual.csv");

    cli()
        .arg("--template")
        .arg(&project)
        .assert()
        .success()
        .stdout(contains("Sample project written"));

    cli()
        .arg(&project)
        .arg("--csv")
        .arg(&csv)
        .assert()
        .success()
        .stdout(contains("NPV @"))
        .stdout(contains("IRR"))
        .stdout(contains("Net_cash_flow"));

    let exported = std::fs::read_to_string(&csv).unwrap();
    assert!(exported.starts_with("Date,Period,"));
    assert_eq!(exported.lines().count(), 1 + 30);
}

#[test]
fn monthly_summary_with_price_override() {
    let dir = temp_dir();
    let project = dir.join("sample.json");
    cli().arg("--template").arg(&project).assert().success();
    cli()
        .arg(&project)
        .args(["--price", "6.5", "--resolution", "monthly", "--summary-only"])
        .args(["--tax-treatment", "masked"])
        .assert()
        .success()
        .stdout(contains("Sales price     : 6.5"))
        .stdout(contains("Net_cash_flow").not());
}

#[test]
fn loan_taken_before_the_initial_date_is_reported() {
    let path = temp_dir().join("early_loan.json");
    let mut file = sample_file().unwrap();
    let mut debt = DebtPortfolio::new();
    debt.add(Debt::loan(
        "Bridge loan",
        10_000_000.0,
        common::date(2024, 1, 1),
        TimeInterval::years(10),
        0.07,
        4,
    ))
    .unwrap();
    file.debt_portfolio = Some(debt);
    save_project_to_path(&file, &path).unwrap();

    cli()
        .arg(&path)
        .arg("--summary-only")
        .assert()
        .success()
        .stderr(contains("scheduled amounts outside the analysis window were dropped"))
        .stderr(contains("debt service"));
}

#[test]
fn missing_project_file_fails() {
    cli()
        .arg(temp_dir().join("absent.json"))
        .assert()
        .failure()
        .stderr(contains("Error:"));
}

#[test]
fn lists_parameters() {
    cli()
        .arg("--list-parameters")
        .assert()
        .success()
        .stdout(contains("InitialDate"))
        .stdout(contains("StartupDate").and(contains("(optional)")));
}

#[test]
fn prints_build_info() {
    cli()
        .arg("--build-info")
        .assert()
        .success()
        .stdout(contains("version"));
}
