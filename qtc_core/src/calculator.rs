//! Calculators wrapping a single QTc or QTp equation.
//!
//! Every equation works in seconds only. A calculator converts whatever the
//! caller has (seconds, milliseconds or a heart rate) into seconds, runs the
//! equation, and converts the result back:
//!
//! ```text
//! msec -> sec -> equation -> sec -> msec
//! bpm  -> sec -> equation -> sec
//! ```

use crate::error::{Error, Parameter, Result};
use crate::types::{Age, FormulaClassification, IntervalRateType, Msec, QtMeasurement, Sec, Sex, Units};
use crate::units::{bpm_to_sec, msec_to_sec, sec_to_msec};
use serde::Serialize;
use std::fmt;

// ============================================================================
// Equations
// ============================================================================

/// A QTc formula: `(qt, rr, sex, age) -> qtc`, all intervals in seconds
pub trait QtcEquation: Send + Sync {
    fn qtc(&self, qt: Sec, rr: Sec, sex: Sex, age: Option<Age>) -> Result<Sec>;
}

/// A QTp formula: `(rr, sex, age) -> qtp`, all intervals in seconds
pub trait QtpEquation: Send + Sync {
    fn qtp(&self, rr: Sec, sex: Sex, age: Option<Age>) -> Result<Sec>;
}

impl<F> QtcEquation for F
where
    F: Fn(Sec, Sec, Sex, Option<Age>) -> Result<Sec> + Send + Sync,
{
    fn qtc(&self, qt: Sec, rr: Sec, sex: Sex, age: Option<Age>) -> Result<Sec> {
        self(qt, rr, sex, age)
    }
}

impl<F> QtpEquation for F
where
    F: Fn(Sec, Sex, Option<Age>) -> Result<Sec> + Send + Sync,
{
    fn qtp(&self, rr: Sec, sex: Sex, age: Option<Age>) -> Result<Sec> {
        self(rr, sex, age)
    }
}

// ============================================================================
// Formula Metadata
// ============================================================================

/// Descriptive data about a published formula
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct FormulaInfo {
    pub long_name: String,
    pub short_name: String,
    pub reference: String,
    /// Human readable equation
    pub equation: String,
    pub classification: FormulaClassification,
    /// False for pediatric-only formulas
    pub for_adults: bool,
    pub notes: String,
    pub publication_year: Option<i32>,
    pub number_of_subjects: Option<u32>,
}

impl FormulaInfo {
    pub fn new(
        long_name: impl Into<String>,
        short_name: impl Into<String>,
        reference: impl Into<String>,
        equation: impl Into<String>,
        classification: FormulaClassification,
    ) -> Self {
        Self {
            long_name: long_name.into(),
            short_name: short_name.into(),
            reference: reference.into(),
            equation: equation.into(),
            classification,
            for_adults: true,
            notes: String::new(),
            publication_year: None,
            number_of_subjects: None,
        }
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn pediatric(mut self) -> Self {
        self.for_adults = false;
        self
    }

    pub fn published(mut self, year: i32) -> Self {
        self.publication_year = Some(year);
        self
    }

    pub fn subjects(mut self, count: u32) -> Self {
        self.number_of_subjects = Some(count);
        self
    }
}

// ============================================================================
// Calculator
// ============================================================================

/// A formula's metadata plus its seconds-based equation.
///
/// Built once when a registry is populated and never mutated afterwards.
pub struct Calculator<E: ?Sized> {
    info: FormulaInfo,
    equation: Box<E>,
}

pub type QtcCalculator = Calculator<dyn QtcEquation>;
pub type QtpCalculator = Calculator<dyn QtpEquation>;

impl<E: ?Sized> Calculator<E> {
    pub fn info(&self) -> &FormulaInfo {
        &self.info
    }

    pub fn long_name(&self) -> &str {
        &self.info.long_name
    }

    pub fn short_name(&self) -> &str {
        &self.info.short_name
    }

    pub fn reference(&self) -> &str {
        &self.info.reference
    }

    pub fn classification(&self) -> FormulaClassification {
        self.info.classification
    }

    pub fn classification_name(&self) -> &'static str {
        self.info.classification.name()
    }
}

impl<E: ?Sized> fmt::Debug for Calculator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Calculator")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl Calculator<dyn QtcEquation> {
    pub fn new(info: FormulaInfo, equation: impl QtcEquation + 'static) -> Self {
        Self {
            info,
            equation: Box::new(equation),
        }
    }

    pub fn calculate_sec(&self, qt_in_sec: f64, rr_in_sec: f64, sex: Sex, age: Option<Age>) -> Result<Sec> {
        self.equation.qtc(qt_in_sec, rr_in_sec, sex, age)
    }

    pub fn calculate_msec(&self, qt_in_msec: f64, rr_in_msec: f64, sex: Sex, age: Option<Age>) -> Result<Msec> {
        let qtc = self
            .equation
            .qtc(msec_to_sec(qt_in_msec), msec_to_sec(rr_in_msec), sex, age)?;
        Ok(sec_to_msec(qtc))
    }

    pub fn calculate_sec_from_rate(&self, qt_in_sec: f64, rate: f64, sex: Sex, age: Option<Age>) -> Result<Sec> {
        self.equation.qtc(qt_in_sec, bpm_to_sec(rate), sex, age)
    }

    pub fn calculate_msec_from_rate(&self, qt_in_msec: f64, rate: f64, sex: Sex, age: Option<Age>) -> Result<Msec> {
        let qtc = self
            .equation
            .qtc(msec_to_sec(qt_in_msec), bpm_to_sec(rate), sex, age)?;
        Ok(sec_to_msec(qtc))
    }

    /// Calculate QTc in the same units the measurement was given in
    pub fn calculate(&self, m: &QtMeasurement) -> Result<f64> {
        let qt = m
            .qt
            .ok_or(Error::ParameterRequired(Parameter::Qt))?;
        let qtc = match (m.units, m.interval_rate_type) {
            (Units::Sec, IntervalRateType::Interval) => {
                self.calculate_sec(qt, m.interval_rate, m.sex, m.age)
            }
            (Units::Msec, IntervalRateType::Interval) => {
                self.calculate_msec(qt, m.interval_rate, m.sex, m.age)
            }
            (Units::Sec, IntervalRateType::Rate) => {
                self.calculate_sec_from_rate(qt, m.interval_rate, m.sex, m.age)
            }
            (Units::Msec, IntervalRateType::Rate) => {
                self.calculate_msec_from_rate(qt, m.interval_rate, m.sex, m.age)
            }
        }?;
        tracing::trace!("{} = {} ({:?})", self.info.short_name, qtc, m.units);
        Ok(qtc)
    }
}

impl Calculator<dyn QtpEquation> {
    pub fn new(info: FormulaInfo, equation: impl QtpEquation + 'static) -> Self {
        Self {
            info,
            equation: Box::new(equation),
        }
    }

    pub fn calculate_sec(&self, rr_in_sec: f64, sex: Sex, age: Option<Age>) -> Result<Sec> {
        self.equation.qtp(rr_in_sec, sex, age)
    }

    pub fn calculate_msec(&self, rr_in_msec: f64, sex: Sex, age: Option<Age>) -> Result<Msec> {
        let qtp = self.equation.qtp(msec_to_sec(rr_in_msec), sex, age)?;
        Ok(sec_to_msec(qtp))
    }

    pub fn calculate_sec_from_rate(&self, rate: f64, sex: Sex, age: Option<Age>) -> Result<Sec> {
        self.equation.qtp(bpm_to_sec(rate), sex, age)
    }

    pub fn calculate_msec_from_rate(&self, rate: f64, sex: Sex, age: Option<Age>) -> Result<Msec> {
        let qtp = self.equation.qtp(bpm_to_sec(rate), sex, age)?;
        Ok(sec_to_msec(qtp))
    }

    /// Calculate QTp in the units the measurement was given in; `qt` is ignored
    pub fn calculate(&self, m: &QtMeasurement) -> Result<f64> {
        let qtp = match (m.units, m.interval_rate_type) {
            (Units::Sec, IntervalRateType::Interval) => {
                self.calculate_sec(m.interval_rate, m.sex, m.age)
            }
            (Units::Msec, IntervalRateType::Interval) => {
                self.calculate_msec(m.interval_rate, m.sex, m.age)
            }
            (Units::Sec, IntervalRateType::Rate) => {
                self.calculate_sec_from_rate(m.interval_rate, m.sex, m.age)
            }
            (Units::Msec, IntervalRateType::Rate) => {
                self.calculate_msec_from_rate(m.interval_rate, m.sex, m.age)
            }
        }?;
        tracing::trace!("{} = {} ({:?})", self.info.short_name, qtp, m.units);
        Ok(qtp)
    }
}
