use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::context::{ScheduleContext, StartupFractions};
use crate::capex::Depreciation;
use crate::errors::{FinanceError, Result};
use crate::ledger::TimeInterval;
use crate::quantity::Quantity;

/// The fixed set of financial parameters a project accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ParameterKey {
    InitialDate,
    StartupDate,
    AnalysisPeriod,
    PlantLife,
    StateTaxRate,
    FederalTaxRate,
    InflationRate,
    Capacity,
    CapitalExpenseBreakdown,
    StartupPeriod,
    StartupRevenueFraction,
    StartupVariableCostFraction,
    StartupFixedCostFraction,
    SalvageValue,
    DecommissioningCost,
    DepreciationMethod,
    DepreciationLength,
}

/// Shape a parameter's value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Date,
    Number,
    Integer,
    Duration,
    Quantity,
    Fractions,
    Depreciation,
}

impl ValueKind {
    pub fn label(self) -> &'static str {
        match self {
            ValueKind::Date => "date",
            ValueKind::Number => "number",
            ValueKind::Integer => "integer",
            ValueKind::Duration => "duration",
            ValueKind::Quantity => "quantity",
            ValueKind::Fractions => "fraction list",
            ValueKind::Depreciation => "depreciation method",
        }
    }
}

impl ParameterKey {
    pub const ALL: [ParameterKey; 17] = [
        ParameterKey::InitialDate,
        ParameterKey::StartupDate,
        ParameterKey::AnalysisPeriod,
        ParameterKey::PlantLife,
        ParameterKey::StateTaxRate,
        ParameterKey::FederalTaxRate,
        ParameterKey::InflationRate,
        ParameterKey::Capacity,
        ParameterKey::CapitalExpenseBreakdown,
        ParameterKey::StartupPeriod,
        ParameterKey::StartupRevenueFraction,
        ParameterKey::StartupVariableCostFraction,
        ParameterKey::StartupFixedCostFraction,
        ParameterKey::SalvageValue,
        ParameterKey::DecommissioningCost,
        ParameterKey::DepreciationMethod,
        ParameterKey::DepreciationLength,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ParameterKey::InitialDate => "InitialDate",
            ParameterKey::StartupDate => "StartupDate",
            ParameterKey::AnalysisPeriod => "AnalysisPeriod",
            ParameterKey::PlantLife => "PlantLife",
            ParameterKey::StateTaxRate => "StateTaxRate",
            ParameterKey::FederalTaxRate => "FederalTaxRate",
            ParameterKey::InflationRate => "InflationRate",
            ParameterKey::Capacity => "Capacity",
            ParameterKey::CapitalExpenseBreakdown => "CapitalExpenseBreakdown",
            ParameterKey::StartupPeriod => "StartupPeriod",
            ParameterKey::StartupRevenueFraction => "StartupRevenueFraction",
            ParameterKey::StartupVariableCostFraction => "StartupVariableCostFraction",
            ParameterKey::StartupFixedCostFraction => "StartupFixedCostFraction",
            ParameterKey::SalvageValue => "SalvageValue",
            ParameterKey::DecommissioningCost => "DecommissioningCost",
            ParameterKey::DepreciationMethod => "DepreciationMethod",
            ParameterKey::DepreciationLength => "DepreciationLength",
        }
    }

    pub fn kind(self) -> ValueKind {
        match self {
            ParameterKey::InitialDate | ParameterKey::StartupDate => ValueKind::Date,
            ParameterKey::AnalysisPeriod | ParameterKey::PlantLife | ParameterKey::StartupPeriod => {
                ValueKind::Duration
            }
            ParameterKey::Capacity => ValueKind::Quantity,
            ParameterKey::CapitalExpenseBreakdown => ValueKind::Fractions,
            ParameterKey::DepreciationMethod => ValueKind::Depreciation,
            ParameterKey::DepreciationLength => ValueKind::Integer,
            _ => ValueKind::Number,
        }
    }

    /// Whether a parameter set is complete without this key.
    pub fn is_optional(self) -> bool {
        matches!(self, ParameterKey::StartupDate)
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParameterKey {
    type Err = FinanceError;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(key) = ParameterKey::ALL.iter().find(|k| k.name() == s) {
            return Ok(*key);
        }
        let suggestion = ParameterKey::ALL
            .iter()
            .map(|k| (k.name(), strsim::jaro_winkler(&s.to_lowercase(), &k.name().to_lowercase())))
            .filter(|(_, score)| *score > 0.8)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(name, _)| name.to_string());
        Err(FinanceError::UnknownParameter {
            name: s.to_string(),
            suggestion,
        })
    }
}

impl TryFrom<String> for ParameterKey {
    type Error = FinanceError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ParameterKey> for String {
    fn from(key: ParameterKey) -> Self {
        key.name().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParameterValue {
    Date(NaiveDate),
    Number(f64),
    Integer(u32),
    Duration(TimeInterval),
    Quantity(Quantity),
    Fractions(Vec<f64>),
    Depreciation(Depreciation),
}

impl ParameterValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ParameterValue::Date(_) => ValueKind::Date,
            ParameterValue::Number(_) => ValueKind::Number,
            ParameterValue::Integer(_) => ValueKind::Integer,
            ParameterValue::Duration(_) => ValueKind::Duration,
            ParameterValue::Quantity(_) => ValueKind::Quantity,
            ParameterValue::Fractions(_) => ValueKind::Fractions,
            ParameterValue::Depreciation(_) => ValueKind::Depreciation,
        }
    }
}

fn check_fraction(key: ParameterKey, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(FinanceError::invalid_parameter(
            key.name(),
            format!("{value} must lie in [0, 1]"),
        ));
    }
    Ok(())
}

/// Checks a value's shape and range for `key`.
fn validate(key: ParameterKey, value: &ParameterValue) -> Result<()> {
    if value.kind() != key.kind() {
        return Err(FinanceError::ParameterType {
            name: key.name().to_string(),
            expected: key.kind().label(),
            found: value.kind().label(),
        });
    }
    let invalid = |reason: String| FinanceError::invalid_parameter(key.name(), reason);
    match (key, value) {
        (_, ParameterValue::Number(n)) if !n.is_finite() => Err(invalid(format!("{n} is not finite"))),
        (
            ParameterKey::StateTaxRate
            | ParameterKey::FederalTaxRate
            | ParameterKey::StartupRevenueFraction
            | ParameterKey::StartupVariableCostFraction
            | ParameterKey::StartupFixedCostFraction
            | ParameterKey::SalvageValue
            | ParameterKey::DecommissioningCost,
            ParameterValue::Number(n),
        ) => check_fraction(key, *n),
        (ParameterKey::InflationRate, ParameterValue::Number(n)) if *n <= -1.0 => {
            Err(invalid(format!("{n} must exceed -100%")))
        }
        (_, ParameterValue::Duration(d)) if !d.is_positive() => {
            Err(invalid(format!("duration {} must be positive", d.label())))
        }
        (_, ParameterValue::Quantity(q)) if !(q.value > 0.0 && q.value.is_finite()) => {
            Err(invalid(format!("capacity {q} must be positive")))
        }
        (_, ParameterValue::Fractions(parts)) => {
            if parts.is_empty() {
                return Err(invalid("breakdown is empty".into()));
            }
            if let Some(bad) = parts.iter().find(|p| !(**p >= 0.0 && p.is_finite())) {
                return Err(invalid(format!("fraction {bad} must be non-negative")));
            }
            let total: f64 = parts.iter().sum();
            if (total - 1.0).abs() > 1e-6 {
                return Err(invalid(format!("fractions sum to {total}, not 1")));
            }
            Ok(())
        }
        (_, ParameterValue::Integer(0)) => Err(invalid("must be positive".into())),
        _ => Ok(()),
    }
}

/// Validated map from [`ParameterKey`] to value. Every assignment is checked for
/// shape and range; cross-parameter rules are checked when a schedule context is
/// derived.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "BTreeMap<ParameterKey, ParameterValue>")]
#[serde(into = "BTreeMap<ParameterKey, ParameterValue>")]
pub struct FinancialParameters {
    values: BTreeMap<ParameterKey, ParameterValue>,
}

impl TryFrom<BTreeMap<ParameterKey, ParameterValue>> for FinancialParameters {
    type Error = FinanceError;

    fn try_from(values: BTreeMap<ParameterKey, ParameterValue>) -> Result<Self> {
        for (key, value) in &values {
            validate(*key, value)?;
        }
        Ok(Self { values })
    }
}

impl From<FinancialParameters> for BTreeMap<ParameterKey, ParameterValue> {
    fn from(params: FinancialParameters) -> Self {
        params.values
    }
}

impl FinancialParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: ParameterKey, value: ParameterValue) -> Result<()> {
        validate(key, &value)?;
        self.values.insert(key, value);
        Ok(())
    }

    /// Sets a parameter by name, suggesting the closest valid name on a typo.
    pub fn set_named(&mut self, name: &str, value: ParameterValue) -> Result<()> {
        self.set(name.parse()?, value)
    }

    pub fn unset(&mut self, key: ParameterKey) -> Option<ParameterValue> {
        self.values.remove(&key)
    }

    pub fn get(&self, key: ParameterKey) -> Option<&ParameterValue> {
        self.values.get(&key)
    }

    /// Required keys that have no value yet.
    pub fn missing(&self) -> Vec<ParameterKey> {
        ParameterKey::ALL
            .iter()
            .copied()
            .filter(|k| !k.is_optional() && !self.values.contains_key(k))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    fn require(&self, key: ParameterKey) -> Result<&ParameterValue> {
        self.values
            .get(&key)
            .ok_or_else(|| FinanceError::MissingParameter(key.name().to_string()))
    }

    fn mismatch(key: ParameterKey, value: &ParameterValue) -> FinanceError {
        FinanceError::ParameterType {
            name: key.name().to_string(),
            expected: key.kind().label(),
            found: value.kind().label(),
        }
    }

    pub fn date(&self, key: ParameterKey) -> Result<NaiveDate> {
        match self.require(key)? {
            ParameterValue::Date(d) => Ok(*d),
            other => Err(Self::mismatch(key, other)),
        }
    }

    pub fn number(&self, key: ParameterKey) -> Result<f64> {
        match self.require(key)? {
            ParameterValue::Number(n) => Ok(*n),
            other => Err(Self::mismatch(key, other)),
        }
    }

    pub fn integer(&self, key: ParameterKey) -> Result<u32> {
        match self.require(key)? {
            ParameterValue::Integer(n) => Ok(*n),
            other => Err(Self::mismatch(key, other)),
        }
    }

    pub fn duration(&self, key: ParameterKey) -> Result<TimeInterval> {
        match self.require(key)? {
            ParameterValue::Duration(d) => Ok(*d),
            other => Err(Self::mismatch(key, other)),
        }
    }

    pub fn quantity(&self, key: ParameterKey) -> Result<&Quantity> {
        match self.require(key)? {
            ParameterValue::Quantity(q) => Ok(q),
            other => Err(Self::mismatch(key, other)),
        }
    }

    pub fn fractions(&self, key: ParameterKey) -> Result<&[f64]> {
        match self.require(key)? {
            ParameterValue::Fractions(f) => Ok(f),
            other => Err(Self::mismatch(key, other)),
        }
    }

    pub fn depreciation(&self, key: ParameterKey) -> Result<&Depreciation> {
        match self.require(key)? {
            ParameterValue::Depreciation(d) => Ok(d),
            other => Err(Self::mismatch(key, other)),
        }
    }

    /// Startup date, or the initial date plus one year per construction year of the
    /// capital-expense breakdown when unset.
    pub fn startup_date(&self) -> Result<NaiveDate> {
        if self.values.contains_key(&ParameterKey::StartupDate) {
            return self.date(ParameterKey::StartupDate);
        }
        let initial = self.date(ParameterKey::InitialDate)?;
        let years = self.fractions(ParameterKey::CapitalExpenseBreakdown)?.len();
        Ok(TimeInterval::years(1).nth_date(initial, years as i32))
    }

    /// Combined state and federal income tax rate.
    pub fn income_tax_rate(&self) -> Result<f64> {
        Ok(self.number(ParameterKey::StateTaxRate)? + self.number(ParameterKey::FederalTaxRate)?)
    }

    pub fn to_context(&self) -> Result<ScheduleContext> {
        if let Some(key) = self.missing().first() {
            return Err(FinanceError::MissingParameter(key.name().to_string()));
        }
        let initial_date = self.date(ParameterKey::InitialDate)?;
        let startup_date = self.startup_date()?;
        if startup_date < initial_date {
            return Err(FinanceError::invalid_parameter(
                ParameterKey::StartupDate.name(),
                format!("{startup_date} precedes the initial date {initial_date}"),
            ));
        }
        let analysis_end =
            self.duration(ParameterKey::AnalysisPeriod)?.nth_date(initial_date, 1) - Duration::days(1);
        let plant_end = self.duration(ParameterKey::PlantLife)?.nth_date(startup_date, 1);
        Ok(ScheduleContext {
            initial_date,
            analysis_end,
            startup_date,
            plant_end,
            inflation_rate: self.number(ParameterKey::InflationRate)?,
            capacity: self.quantity(ParameterKey::Capacity)?.clone(),
            capex_breakdown: self.fractions(ParameterKey::CapitalExpenseBreakdown)?.to_vec(),
            startup_period: self.duration(ParameterKey::StartupPeriod)?,
            startup_fractions: StartupFractions {
                revenue: self.number(ParameterKey::StartupRevenueFraction)?,
                variable_cost: self.number(ParameterKey::StartupVariableCostFraction)?,
                fixed_cost: self.number(ParameterKey::StartupFixedCostFraction)?,
            },
            depreciation: self.depreciation(ParameterKey::DepreciationMethod)?.clone(),
            depreciation_length: self.integer(ParameterKey::DepreciationLength)?,
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Complete parameters: twenty-year analysis from 2020, two construction years.
    pub fn parameters() -> FinancialParameters {
        use ParameterKey::*;
        use ParameterValue as V;
        let mut params = FinancialParameters::new();
        let entries = [
            (InitialDate, V::Date(date(2020, 1, 1))),
            (AnalysisPeriod, V::Duration(TimeInterval::years(20))),
            (PlantLife, V::Duration(TimeInterval::years(30))),
            (StateTaxRate, V::Number(0.06)),
            (FederalTaxRate, V::Number(0.21)),
            (InflationRate, V::Number(0.0)),
            (Capacity, V::Quantity(Quantity::new(1_000.0, "kg/day"))),
            (CapitalExpenseBreakdown, V::Fractions(vec![0.4, 0.6])),
            (StartupPeriod, V::Duration(TimeInterval::years(1))),
            (StartupRevenueFraction, V::Number(0.5)),
            (StartupVariableCostFraction, V::Number(0.75)),
            (StartupFixedCostFraction, V::Number(1.0)),
            (SalvageValue, V::Number(0.1)),
            (DecommissioningCost, V::Number(0.1)),
            (DepreciationMethod, V::Depreciation(Depreciation::Macrs)),
            (DepreciationLength, V::Integer(7)),
        ];
        for (key, value) in entries {
            params.set(key, value).unwrap();
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn typo_gets_a_suggestion() {
        let mut params = FinancialParameters::new();
        let err = params
            .set_named("InflatoinRate", ParameterValue::Number(0.02))
            .unwrap_err();
        match err {
            FinanceError::UnknownParameter { suggestion, .. } => {
                assert_eq!(suggestion.as_deref(), Some("InflationRate"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn values_are_checked_on_assignment() {
        let mut params = FinancialParameters::new();
        assert!(matches!(
            params.set(ParameterKey::InitialDate, ParameterValue::Number(1.0)),
            Err(FinanceError::ParameterType { .. })
        ));
        assert!(matches!(
            params.set(ParameterKey::StateTaxRate, ParameterValue::Number(1.5)),
            Err(FinanceError::InvalidParameter { .. })
        ));
        assert!(params
            .set(
                ParameterKey::CapitalExpenseBreakdown,
                ParameterValue::Fractions(vec![0.5, 0.4])
            )
            .is_err());
    }

    #[test]
    fn completeness_ignores_startup_date() {
        let mut params = parameters();
        assert!(params.is_complete());
        params.unset(ParameterKey::Capacity);
        assert_eq!(params.missing(), vec![ParameterKey::Capacity]);
        assert!(matches!(
            params.to_context(),
            Err(FinanceError::MissingParameter(_))
        ));
    }

    #[test]
    fn startup_defaults_to_end_of_construction() {
        let ctx = parameters().to_context().unwrap();
        assert_eq!(ctx.startup_date, date(2022, 1, 1));
        assert_eq!(ctx.analysis_end, date(2039, 12, 31));
        assert_eq!(ctx.plant_end, date(2052, 1, 1));
        assert_eq!(ctx.operations_end(), date(2039, 12, 31));
    }

    #[test]
    fn startup_before_initial_date_is_rejected() {
        let mut params = parameters();
        params
            .set(ParameterKey::StartupDate, ParameterValue::Date(date(2019, 1, 1)))
            .unwrap();
        assert!(params.to_context().is_err());
    }

    #[test]
    fn json_round_trip_rejects_unknown_keys() {
        let params = parameters();
        let json = serde_json::to_string(&params).unwrap();
        let back: FinancialParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
        let bad = r#"{"Capacty": {"type": "number", "value": 1.0}}"#;
        assert!(serde_json::from_str::<FinancialParameters>(bad).is_err());
    }
}
