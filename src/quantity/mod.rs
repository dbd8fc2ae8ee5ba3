//! Dimensioned values: a magnitude paired with a unit-of-measure string.
//!
//! Units are either a single term (`kg`) or a ratio of two terms (`kg/day`). Terms
//! found in the built-in table convert within their dimension; any other term is
//! treated as its own dimension and only matches itself.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{FinanceError, Result};

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    None,
    Mass,
    Volume,
    Energy,
    Power,
    Time,
}

/// (symbol, dimension, factor to the dimension's base unit)
const UNITS: &[(&str, Dimension, f64)] = &[
    ("", Dimension::None, 1.0),
    ("-", Dimension::None, 1.0),
    ("kg", Dimension::Mass, 1.0),
    ("g", Dimension::Mass, 1e-3),
    ("tonne", Dimension::Mass, 1e3),
    ("t", Dimension::Mass, 1e3),
    ("lb", Dimension::Mass, 0.453_592_37),
    ("ton", Dimension::Mass, 907.184_74),
    ("m^3", Dimension::Volume, 1.0),
    ("L", Dimension::Volume, 1e-3),
    ("gal", Dimension::Volume, 3.785_411_784e-3),
    ("bbl", Dimension::Volume, 0.158_987_294_928),
    ("J", Dimension::Energy, 1.0),
    ("kJ", Dimension::Energy, 1e3),
    ("MJ", Dimension::Energy, 1e6),
    ("GJ", Dimension::Energy, 1e9),
    ("kWh", Dimension::Energy, 3.6e6),
    ("MWh", Dimension::Energy, 3.6e9),
    ("BTU", Dimension::Energy, 1_055.055_85),
    ("MMBTU", Dimension::Energy, 1.055_055_85e9),
    ("W", Dimension::Power, 1.0),
    ("kW", Dimension::Power, 1e3),
    ("MW", Dimension::Power, 1e6),
    ("s", Dimension::Time, 1.0),
    ("min", Dimension::Time, 60.0),
    ("hr", Dimension::Time, 3_600.0),
    ("h", Dimension::Time, 3_600.0),
    ("day", Dimension::Time, SECONDS_PER_DAY),
    ("week", Dimension::Time, 7.0 * SECONDS_PER_DAY),
    ("year", Dimension::Time, 365.25 * SECONDS_PER_DAY),
    ("yr", Dimension::Time, 365.25 * SECONDS_PER_DAY),
];

#[derive(Debug, Clone, PartialEq)]
enum Term {
    Known(Dimension, f64),
    Opaque(String),
}

impl Term {
    fn parse(symbol: &str) -> Self {
        let symbol = symbol.trim();
        UNITS
            .iter()
            .find(|(s, _, _)| *s == symbol)
            .map(|(_, dim, factor)| Term::Known(*dim, *factor))
            .unwrap_or_else(|| Term::Opaque(symbol.to_string()))
    }

    fn factor(&self) -> f64 {
        match self {
            Term::Known(_, factor) => *factor,
            Term::Opaque(_) => 1.0,
        }
    }

    fn compatible(&self, other: &Term) -> bool {
        match (self, other) {
            (Term::Known(a, _), Term::Known(b, _)) => a == b,
            (Term::Opaque(a), Term::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Unit {
    numerator: Term,
    denominator: Option<Term>,
}

impl Unit {
    fn parse(unit: &str) -> Self {
        match unit.split_once('/') {
            Some((num, den)) => Unit {
                numerator: Term::parse(num),
                denominator: Some(Term::parse(den)),
            },
            None => Unit {
                numerator: Term::parse(unit),
                denominator: None,
            },
        }
    }

    fn factor(&self) -> f64 {
        self.numerator.factor() / self.denominator.as_ref().map_or(1.0, Term::factor)
    }

    fn compatible(&self, other: &Unit) -> bool {
        let denominators = match (&self.denominator, &other.denominator) {
            (Some(a), Some(b)) => a.compatible(b),
            (None, None) => true,
            _ => false,
        };
        denominators && self.numerator.compatible(&other.numerator)
    }

    fn is_dimensionless(&self) -> bool {
        self.denominator.is_none() && matches!(self.numerator, Term::Known(Dimension::None, _))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: String,
}

impl Quantity {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }

    pub fn dimensionless(value: f64) -> Self {
        Self::new(value, "")
    }

    pub fn is_compatible(&self, other: &Quantity) -> bool {
        Unit::parse(&self.unit).compatible(&Unit::parse(&other.unit))
    }

    pub fn convert_to(&self, unit: &str) -> Result<Quantity> {
        let from = Unit::parse(&self.unit);
        let to = Unit::parse(unit);
        if !from.compatible(&to) {
            return Err(FinanceError::IncompatibleUnits {
                left: self.unit.clone(),
                right: unit.to_string(),
            });
        }
        Ok(Quantity::new(self.value * from.factor() / to.factor(), unit))
    }

    pub fn checked_add(&self, other: &Quantity) -> Result<Quantity> {
        let other = other.convert_to(&self.unit)?;
        Ok(Quantity::new(self.value + other.value, self.unit.clone()))
    }

    pub fn checked_sub(&self, other: &Quantity) -> Result<Quantity> {
        let other = other.convert_to(&self.unit)?;
        Ok(Quantity::new(self.value - other.value, self.unit.clone()))
    }

    pub fn scale(&self, factor: f64) -> Quantity {
        Quantity::new(self.value * factor, self.unit.clone())
    }

    pub fn mul(&self, other: &Quantity) -> Quantity {
        let unit = match (
            Unit::parse(&self.unit).is_dimensionless(),
            Unit::parse(&other.unit).is_dimensionless(),
        ) {
            (true, _) => other.unit.clone(),
            (_, true) => self.unit.clone(),
            _ => format!("{}*{}", self.unit, other.unit),
        };
        Quantity::new(self.value * other.value, unit)
    }

    pub fn checked_div(&self, other: &Quantity) -> Result<Quantity> {
        if other.value == 0.0 {
            return Err(FinanceError::DivisionByZero(format!("{self} / {other}")));
        }
        if self.is_compatible(other) {
            let other = other.convert_to(&self.unit)?;
            return Ok(Quantity::dimensionless(self.value / other.value));
        }
        let unit = if Unit::parse(&other.unit).is_dimensionless() {
            self.unit.clone()
        } else {
            format!("{}/{}", self.unit, other.unit)
        };
        Ok(Quantity::new(self.value / other.value, unit))
    }

    /// Dimensionless ratio `self / other` after converting `other` into this unit.
    pub fn ratio_to(&self, other: &Quantity) -> Result<f64> {
        let quotient = self.checked_div(other)?;
        if !Unit::parse(&quotient.unit).is_dimensionless() {
            return Err(FinanceError::IncompatibleUnits {
                left: self.unit.clone(),
                right: other.unit.clone(),
            });
        }
        Ok(quotient.value)
    }

    /// Magnitude per day for rate quantities (`kg/year` -> kg per day). Quantities
    /// without a time denominator are taken to be daily already.
    pub fn per_day(&self) -> f64 {
        let unit = Unit::parse(&self.unit);
        match unit.denominator {
            Some(Term::Known(Dimension::Time, seconds)) => self.value * SECONDS_PER_DAY / seconds,
            _ => self.value,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, self.unit)
        }
    }
}
