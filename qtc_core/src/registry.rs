//! Lookup from formula and criterion identifiers to calculators and test suites.
//!
//! A `Registry` is populated once and then only read. `default_registry()`
//! hands out a shared instance holding the built-in literature tables;
//! callers that need other formulas or criteria (tests, user configuration)
//! build their own and pass it around.

use crate::calculator::{FormulaInfo, QtcCalculator, QtpCalculator};
use crate::config::Config;
use crate::criteria::{self, Severity, TestSuite};
use crate::error::{Error, Result};
use crate::formulas::{self, Formula, QtcFormula, QtpFormula};
use crate::types::{QtMeasurement, QtcMeasurement};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Cached built-in registry
static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(Registry::builtin);

/// Get a reference to the cached built-in registry
pub fn default_registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}

/// Either kind of calculator, as returned by a lookup on a string identifier
#[derive(Clone, Copy, Debug)]
pub enum CalculatorRef<'a> {
    Qtc(&'a QtcCalculator),
    Qtp(&'a QtpCalculator),
}

impl CalculatorRef<'_> {
    pub fn info(&self) -> &FormulaInfo {
        match self {
            CalculatorRef::Qtc(c) => c.info(),
            CalculatorRef::Qtp(c) => c.info(),
        }
    }

    /// QTc or QTp, in the measurement's units
    pub fn calculate(&self, m: &QtMeasurement) -> Result<f64> {
        match self {
            CalculatorRef::Qtc(c) => c.calculate(m),
            CalculatorRef::Qtp(c) => c.calculate(m),
        }
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    qtc: HashMap<QtcFormula, QtcCalculator>,
    qtp: HashMap<QtpFormula, QtpCalculator>,
    criteria: HashMap<String, TestSuite>,
}

impl Registry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in formula and criterion
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (formula, calculator) in formulas::qtc_calculators() {
            registry.insert_qtc(formula, calculator);
        }
        for (formula, calculator) in formulas::qtp_calculators() {
            registry.insert_qtp(formula, calculator);
        }
        for (criterion, suite) in criteria::criteria() {
            registry.insert_criterion(criterion.id(), suite);
        }
        tracing::debug!(
            "Built registry: {} QTc, {} QTp formulas, {} criteria",
            registry.qtc.len(),
            registry.qtp.len(),
            registry.criteria.len()
        );
        registry
    }

    /// The built-in registry plus the custom criteria from `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::builtin();

        for custom in &config.criteria.custom {
            if registry.find_criterion(&custom.id).is_some() {
                return Err(Error::Registry(format!(
                    "Criterion id '{}' is already defined",
                    custom.id
                )));
            }
            tracing::info!("Adding custom criterion '{}'", custom.id);
            registry.insert_criterion(custom.id.clone(), custom.to_suite());
        }

        let errors = registry.validate();
        if !errors.is_empty() {
            return Err(Error::Registry(errors.join("; ")));
        }
        Ok(registry)
    }

    pub fn insert_qtc(&mut self, formula: QtcFormula, calculator: QtcCalculator) -> Option<QtcCalculator> {
        self.qtc.insert(formula, calculator)
    }

    pub fn insert_qtp(&mut self, formula: QtpFormula, calculator: QtpCalculator) -> Option<QtpCalculator> {
        self.qtp.insert(formula, calculator)
    }

    pub fn insert_criterion(&mut self, id: impl Into<String>, suite: TestSuite) -> Option<TestSuite> {
        self.criteria.insert(id.into(), suite)
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    pub fn qtc_calculator(&self, formula: QtcFormula) -> Result<&QtcCalculator> {
        self.qtc
            .get(&formula)
            .ok_or_else(|| Error::UndefinedFormula(formula.code().to_string()))
    }

    pub fn qtp_calculator(&self, formula: QtpFormula) -> Result<&QtpCalculator> {
        self.qtp
            .get(&formula)
            .ok_or_else(|| Error::UndefinedFormula(formula.code().to_string()))
    }

    /// Resolve a short code such as `QTcBZT` or `QTpRBK`
    pub fn calculator(&self, code: &str) -> Result<CalculatorRef<'_>> {
        match code.parse::<Formula>()? {
            Formula::Qtc(f) => self.qtc_calculator(f).map(CalculatorRef::Qtc),
            Formula::Qtp(f) => self.qtp_calculator(f).map(CalculatorRef::Qtp),
        }
    }

    /// Resolve a criterion id such as `FDA-2005`, ignoring ASCII case
    pub fn criterion(&self, id: &str) -> Result<&TestSuite> {
        self.find_criterion(id)
            .ok_or_else(|| Error::UndefinedCriterion(id.to_string()))
    }

    fn find_criterion(&self, id: &str) -> Option<&TestSuite> {
        self.criteria.get(id).or_else(|| {
            self.criteria
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(id))
                .map(|(_, suite)| suite)
        })
    }

    /// Registered QTc formulas, in declaration order
    pub fn qtc_formulas(&self) -> Vec<QtcFormula> {
        QtcFormula::ALL
            .into_iter()
            .filter(|f| self.qtc.contains_key(f))
            .collect()
    }

    /// Registered QTp formulas, in declaration order
    pub fn qtp_formulas(&self) -> Vec<QtpFormula> {
        QtpFormula::ALL
            .into_iter()
            .filter(|f| self.qtp.contains_key(f))
            .collect()
    }

    /// Registered criterion ids, sorted
    pub fn criterion_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.criteria.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    // ========================================================================
    // Classification
    // ========================================================================

    /// Correct the measured QT with `formula` and classify it against `criterion`
    pub fn classify(&self, formula: QtcFormula, criterion: &str, m: &QtMeasurement) -> Result<Severity> {
        let suite = self.criterion(criterion)?;
        let qtc = self.qtc_calculator(formula)?.calculate(m)?;

        let measurement = QtcMeasurement {
            qtc,
            units: m.units,
            sex: m.sex,
            age: m.age,
        };
        Ok(suite.severity(&measurement))
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Check the registry for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut short_names = HashSet::new();

        let infos = self
            .qtc
            .values()
            .map(|c| c.info())
            .chain(self.qtp.values().map(|c| c.info()));
        for info in infos {
            if info.short_name.is_empty() {
                errors.push(format!("Formula '{}' has empty short name", info.long_name));
            } else if !short_names.insert(info.short_name.as_str()) {
                errors.push(format!("Duplicate formula short name '{}'", info.short_name));
            }
            if info.long_name.is_empty() {
                errors.push(format!("Formula '{}' has empty name", info.short_name));
            }
            if info.reference.is_empty() {
                errors.push(format!("Formula '{}' has no reference", info.short_name));
            }
        }

        for (id, suite) in &self.criteria {
            if id.is_empty() {
                errors.push("Criterion has empty ID".to_string());
            }
            if suite.name.is_empty() {
                errors.push(format!("Criterion '{}' has empty name", id));
            }
            if suite.tests.is_empty() {
                errors.push(format!("Criterion '{}' has no tests", id));
            }
            for test in &suite.tests {
                if test.severity == Severity::Undefined {
                    errors.push(format!(
                        "Criterion '{}': test {} {} has undefined severity",
                        id,
                        test.comparison.symbol(),
                        test.value
                    ));
                }
                if !test.value.is_finite() {
                    errors.push(format!("Criterion '{}': threshold is not finite", id));
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::QtcEquation;
    use crate::config::CustomCriterion;
    use crate::criteria::{Comparison, QtcTest};
    use crate::types::{Age, FormulaClassification, IntervalRateType, Sec, Sex, Units};

    struct Doubling;

    impl QtcEquation for Doubling {
        fn qtc(&self, qt: Sec, _rr: Sec, _sex: Sex, _age: Option<Age>) -> Result<Sec> {
            Ok(qt * 2.0)
        }
    }

    fn custom(id: &str) -> CustomCriterion {
        CustomCriterion {
            id: id.into(),
            name: "Ward protocol".into(),
            reference: "Local".into(),
            description: "QTc > 500 msec".into(),
            notes: None,
            requires_sex: false,
            requires_age: false,
            tests: vec![QtcTest::new(500.0, Units::Msec, Comparison::GreaterThan)
                .severity(Severity::Severe)],
        }
    }

    #[test]
    fn test_builtin_registry_is_complete() {
        let registry = default_registry();
        assert_eq!(registry.qtc_formulas(), QtcFormula::ALL.to_vec());
        assert_eq!(registry.qtp_formulas(), QtpFormula::ALL.to_vec());
        assert_eq!(
            registry.criterion_ids(),
            vec!["AHA-2009", "FDA-2005", "Goldenberg-2006", "Schwartz-1985"]
        );
    }

    #[test]
    fn test_builtin_registry_validates() {
        let errors = Registry::builtin().validate();
        assert!(
            errors.is_empty(),
            "Built-in registry has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_lookup_by_code() {
        let registry = default_registry();
        match registry.calculator("QTcFRD").unwrap() {
            CalculatorRef::Qtc(c) => assert_eq!(c.long_name(), "Fridericia"),
            CalculatorRef::Qtp(_) => panic!("QTcFRD resolved to a QTp calculator"),
        }
        match registry.calculator("qtpbdl").unwrap() {
            CalculatorRef::Qtp(c) => assert_eq!(c.long_name(), "Boudoulas"),
            CalculatorRef::Qtc(_) => panic!("QTpBDL resolved to a QTc calculator"),
        }
        assert!(matches!(
            registry.calculator("QTcNOPE"),
            Err(Error::UndefinedFormula(_))
        ));
    }

    #[test]
    fn test_lookup_criterion() {
        let registry = default_registry();
        assert_eq!(registry.criterion("FDA-2005").unwrap().name, "FDA, 2005");
        assert_eq!(registry.criterion("fda-2005").unwrap().name, "FDA, 2005");
        assert!(matches!(
            registry.criterion("ESC-2099"),
            Err(Error::UndefinedCriterion(id)) if id == "ESC-2099"
        ));
    }

    #[test]
    fn test_empty_registry_fails_lookups() {
        let registry = Registry::new();
        assert!(matches!(
            registry.qtc_calculator(QtcFormula::Bzt),
            Err(Error::UndefinedFormula(code)) if code == "QTcBZT"
        ));
        assert!(registry.qtp_calculator(QtpFormula::Arr).is_err());
        assert!(registry.criterion("FDA-2005").is_err());
    }

    #[test]
    fn test_injected_calculator() {
        let mut registry = Registry::new();
        registry.insert_qtc(
            QtcFormula::Bzt,
            QtcCalculator::new(
                FormulaInfo::new("Double", "QTcDBL", "Test double", "2*QT", FormulaClassification::Other),
                Doubling,
            ),
        );
        let calc = registry.calculator("QTcBZT").unwrap();
        let m = QtMeasurement::new(Some(400.0), 1000.0, Units::Msec, IntervalRateType::Interval);
        assert!((calc.calculate(&m).unwrap() - 800.0).abs() < 1e-9);
    }

    #[test]
    fn test_classify() {
        let registry = default_registry();
        // 400 msec at 120 bpm: Bazett QTc = 565.7 msec
        let m = QtMeasurement::new(Some(400.0), 120.0, Units::Msec, IntervalRateType::Rate);
        assert_eq!(registry.classify(QtcFormula::Bzt, "FDA-2005", &m).unwrap(), Severity::Severe);
        assert_eq!(registry.classify(QtcFormula::Bzt, "AHA-2009", &m).unwrap(), Severity::Undefined);
        assert_eq!(
            registry
                .classify(QtcFormula::Bzt, "AHA-2009", &m.with_sex(Sex::Male))
                .unwrap(),
            Severity::Abnormal
        );
        assert!(registry.classify(QtcFormula::Bzt, "ESC-2099", &m).is_err());
    }

    #[test]
    fn test_classify_propagates_formula_errors() {
        let registry = default_registry();
        let m = QtMeasurement::new(Some(400.0), 800.0, Units::Msec, IntervalRateType::Interval);
        assert!(matches!(
            registry.classify(QtcFormula::Rbk, "FDA-2005", &m),
            Err(Error::ParameterRequired(_))
        ));
    }

    #[test]
    fn test_from_config_adds_custom_criteria() {
        let mut config = Config::default();
        config.criteria.custom.push(custom("Ward-2024"));

        let registry = Registry::from_config(&config).unwrap();
        let suite = registry.criterion("Ward-2024").unwrap();
        assert_eq!(
            suite.severity(&QtcMeasurement::new(510.0, Units::Msec)),
            Severity::Severe
        );
        assert!(registry.criterion("FDA-2005").is_ok());
    }

    #[test]
    fn test_from_config_rejects_duplicate_ids() {
        let mut config = Config::default();
        config.criteria.custom.push(custom("fda-2005"));
        assert!(matches!(
            Registry::from_config(&config),
            Err(Error::Registry(_))
        ));
    }

    #[test]
    fn test_from_config_rejects_empty_suites() {
        let mut config = Config::default();
        let mut empty = custom("Empty");
        empty.tests.clear();
        config.criteria.custom.push(empty);
        let err = Registry::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("has no tests"));
    }

    #[test]
    fn test_registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                std::thread::spawn(move || {
                    let calc = default_registry().qtc_calculator(QtcFormula::Frd).unwrap();
                    calc.calculate_sec(0.4, 0.5 + f64::from(i) * 0.1, Sex::Unspecified, None)
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_finite());
        }
    }
}
