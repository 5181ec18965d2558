//! Error types for the qtc_core library.

use crate::types::Age;
use std::fmt;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// A measurement value a formula may refuse to run without
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Parameter {
    Qt,
    Sex,
    Age,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Parameter::Qt => "QT interval",
            Parameter::Sex => "sex",
            Parameter::Age => "age",
        };
        f.write_str(name)
    }
}

/// Core error type for qtc_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The formula cannot be evaluated without this parameter
    #[error("Parameter required: {0}")]
    ParameterRequired(Parameter),

    /// Age lies outside the population the formula was derived from
    #[error("Age {age} is outside the validated range {min}..={max}")]
    AgeOutOfRange { age: Age, min: Age, max: Age },

    /// Unknown formula identifier
    #[error("Undefined formula: {0}")]
    UndefinedFormula(String),

    /// Unknown criterion identifier
    #[error("Undefined criterion: {0}")]
    UndefinedCriterion(String),

    /// Registry validation error
    #[error("Registry error: {0}")]
    Registry(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::ParameterRequired(Parameter::Sex);
        assert_eq!(err.to_string(), "Parameter required: sex");

        let err = Error::AgeOutOfRange {
            age: 40,
            min: 0,
            max: 17,
        };
        assert_eq!(
            err.to_string(),
            "Age 40 is outside the validated range 0..=17"
        );

        let err = Error::UndefinedCriterion("ESC-2099".into());
        assert!(err.to_string().contains("ESC-2099"));
    }
}
