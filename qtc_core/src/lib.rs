#![forbid(unsafe_code)]

//! Heart-rate correction of the QT interval.
//!
//! This crate provides:
//! - Unit conversions between seconds, milliseconds and heart rate
//! - QTc and QTp calculators for published correction formulas
//! - The Rabkin cubic-spline QTc/QTp formula
//! - Literature criteria for classifying a QTc as normal or abnormal
//! - A registry resolving formula and criterion identifiers

pub mod types;
pub mod error;
pub mod units;
pub mod calculator;
pub mod rabkin;
pub mod formulas;
pub mod criteria;
pub mod registry;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Error, Parameter, Result};
pub use types::*;
pub use calculator::{Calculator, FormulaInfo, QtcCalculator, QtcEquation, QtpCalculator, QtpEquation};
pub use formulas::{Formula, QtcFormula, QtpFormula};
pub use criteria::{AgeConstraint, Comparison, Criterion, QtcTest, Severity, TestSuite};
pub use registry::{default_registry, CalculatorRef, Registry};
pub use config::Config;
