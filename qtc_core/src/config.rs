//! Configuration file support.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/qtc/config.toml`.

use crate::criteria::{Criterion, QtcTest, TestSuite};
use crate::formulas::{QtcFormula, QtpFormula};
use crate::registry::Registry;
use crate::types::Units;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub criteria: CriteriaConfig,
}

/// Formulas, criterion and units used when a caller does not name one
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_qtc_formula")]
    pub qtc_formula: String,

    #[serde(default = "default_qtp_formula")]
    pub qtp_formula: String,

    #[serde(default = "default_criterion")]
    pub criterion: String,

    #[serde(default = "default_units")]
    pub units: Units,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            qtc_formula: default_qtc_formula(),
            qtp_formula: default_qtp_formula(),
            criterion: default_criterion(),
            units: default_units(),
        }
    }
}

impl DefaultsConfig {
    pub fn qtc_formula(&self) -> Result<QtcFormula> {
        self.qtc_formula.parse()
    }

    pub fn qtp_formula(&self) -> Result<QtpFormula> {
        self.qtp_formula.parse()
    }
}

/// A user-defined criterion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomCriterion {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub requires_sex: bool,
    #[serde(default)]
    pub requires_age: bool,
    #[serde(default)]
    pub tests: Vec<QtcTest>,
}

impl CustomCriterion {
    pub fn to_suite(&self) -> TestSuite {
        TestSuite {
            name: self.name.clone(),
            reference: self.reference.clone(),
            description: self.description.clone(),
            notes: self.notes.clone(),
            tests: self.tests.clone(),
            requires_sex: self.requires_sex,
            requires_age: self.requires_age,
        }
    }
}

/// Criteria configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct CriteriaConfig {
    #[serde(default)]
    pub custom: Vec<CustomCriterion>,
}

// Default value functions
fn default_qtc_formula() -> String {
    QtcFormula::Bzt.code().into()
}

fn default_qtp_formula() -> String {
    QtpFormula::Arr.code().into()
}

fn default_criterion() -> String {
    Criterion::Fda2005.id().into()
}

fn default_units() -> Units {
    Units::Msec
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("qtc").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// The built-in registry extended with this configuration's custom criteria
    pub fn registry(&self) -> Result<Registry> {
        Registry::from_config(self)
    }

    /// Check that every default names something the registry knows
    pub fn validate(&self, registry: &Registry) -> Result<()> {
        registry.qtc_calculator(self.defaults.qtc_formula()?)?;
        registry.qtp_calculator(self.defaults.qtp_formula()?)?;
        registry.criterion(&self.defaults.criterion)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{Comparison, Severity};
    use crate::types::Sex;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.defaults.qtc_formula().unwrap(), QtcFormula::Bzt);
        assert_eq!(config.defaults.qtp_formula().unwrap(), QtpFormula::Arr);
        assert_eq!(config.defaults.criterion, "FDA-2005");
        assert_eq!(config.defaults.units, Units::Msec);
        assert!(config.criteria.custom.is_empty());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[defaults]
qtc_formula = "QTcFRD"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.defaults.qtc_formula().unwrap(), QtcFormula::Frd);
        assert_eq!(config.defaults.criterion, "FDA-2005"); // default
    }

    #[test]
    fn test_unknown_formula_name() {
        let toml_str = r#"
[defaults]
qtp_formula = "QTpXYZ"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(matches!(
            config.defaults.qtp_formula(),
            Err(Error::UndefinedFormula(_))
        ));
        assert!(config.validate(&Registry::builtin()).is_err());
    }

    #[test]
    fn test_custom_criteria() {
        let toml_str = r#"
[defaults]
criterion = "Ward-2024"

[[criteria.custom]]
id = "Ward-2024"
name = "Ward telemetry protocol"
requires_sex = true

[[criteria.custom.tests]]
value = 470.0
units = "msec"
comparison = "greater_than"
sex = "female"

[[criteria.custom.tests]]
value = 460.0
units = "msec"
comparison = "greater_than"
sex = "male"

[[criteria.custom.tests]]
value = 500.0
units = "msec"
comparison = "greater_than"
severity = "severe"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        let registry = config.registry().unwrap();
        assert!(config.validate(&registry).is_ok());

        let suite = registry.criterion(&config.defaults.criterion).unwrap();
        assert!(suite.requires_sex);
        let m = crate::QtcMeasurement::new(465.0, Units::Msec);
        assert_eq!(suite.severity(&m), Severity::Undefined);
        assert_eq!(suite.severity(&m.with_sex(Sex::Male)), Severity::Abnormal);
        assert_eq!(suite.severity(&m.with_sex(Sex::Female)), Severity::Normal);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.defaults.units = Units::Sec;
        config.criteria.custom.push(CustomCriterion {
            id: "Local".into(),
            name: "Local limit".into(),
            reference: String::new(),
            description: "QTc >= 480 msec".into(),
            notes: None,
            requires_sex: false,
            requires_age: false,
            tests: vec![QtcTest::new(480.0, Units::Msec, Comparison::GreaterThanOrEqual)
                .for_age(18, Comparison::GreaterThanOrEqual)],
        });
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.defaults.units, Units::Sec);
        assert_eq!(loaded.criteria.custom.len(), 1);
        assert_eq!(loaded.criteria.custom[0].tests, config.criteria.custom[0].tests);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_from(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
