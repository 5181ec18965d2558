//! Core domain types for QT interval correction.
//!
//! This module defines the values passed into calculators and criteria:
//! - Units, sex and interval/rate tags
//! - Measurements used for QTc/QTp calculation and for classification
//! - Formula classification tags

use serde::{Deserialize, Serialize};
use std::fmt;

/// Age in whole years
pub type Age = u32;

// These only document the unit of a returned f64.
pub type Sec = f64;
pub type Msec = f64;

// ============================================================================
// Measurement Tags
// ============================================================================

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unspecified,
}

impl Sex {
    pub fn is_specified(self) -> bool {
        self != Sex::Unspecified
    }
}

/// Units for intervals
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    Sec,
    Msec,
}

impl Units {
    /// Re-express `value` given in `from` units in these units
    pub fn convert(self, value: f64, from: Units) -> f64 {
        match (from, self) {
            (Units::Sec, Units::Msec) => crate::units::sec_to_msec(value),
            (Units::Msec, Units::Sec) => crate::units::msec_to_sec(value),
            _ => value,
        }
    }
}

/// Whether the second measurement is an RR interval or a heart rate
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IntervalRateType {
    Interval,
    Rate,
}

// ============================================================================
// Measurements
// ============================================================================

/// Parameters needed to calculate QTc or QTp.
///
/// `units` applies to `qt` and, for `IntervalRateType::Interval`, to
/// `interval_rate`. A rate is always in beats per minute.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct QtMeasurement {
    /// Not needed for QTp
    pub qt: Option<f64>,
    pub interval_rate: f64,
    pub units: Units,
    pub interval_rate_type: IntervalRateType,
    #[serde(default)]
    pub sex: Sex,
    #[serde(default)]
    pub age: Option<Age>,
}

impl QtMeasurement {
    pub fn new(
        qt: Option<f64>,
        interval_rate: f64,
        units: Units,
        interval_rate_type: IntervalRateType,
    ) -> Self {
        Self {
            qt,
            interval_rate,
            units,
            interval_rate_type,
            sex: Sex::Unspecified,
            age: None,
        }
    }

    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = sex;
        self
    }

    pub fn with_age(mut self, age: Age) -> Self {
        self.age = Some(age);
        self
    }
}

/// A corrected QT value to be classified against a criterion
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct QtcMeasurement {
    pub qtc: f64,
    pub units: Units,
    #[serde(default)]
    pub sex: Sex,
    #[serde(default)]
    pub age: Option<Age>,
}

impl QtcMeasurement {
    pub fn new(qtc: f64, units: Units) -> Self {
        Self {
            qtc,
            units,
            sex: Sex::Unspecified,
            age: None,
        }
    }

    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = sex;
        self
    }

    pub fn with_age(mut self, age: Age) -> Self {
        self.age = Some(age);
        self
    }

    /// The QTc value expressed in `units`
    pub fn qtc_in(&self, units: Units) -> f64 {
        units.convert(self.qtc, self.units)
    }
}

// ============================================================================
// Formula Classification
// ============================================================================

/// Mathematical shape of a formula
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FormulaClassification {
    Linear,
    Rational,
    Power,
    Logarithmic,
    Exponential,
    Other,
}

impl FormulaClassification {
    pub fn name(self) -> &'static str {
        match self {
            FormulaClassification::Linear => "linear",
            FormulaClassification::Rational => "rational",
            FormulaClassification::Power => "power",
            FormulaClassification::Logarithmic => "logarithmic",
            FormulaClassification::Exponential => "exponential",
            FormulaClassification::Other => "other",
        }
    }
}

impl fmt::Display for FormulaClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
