//! Literature criteria for abnormal QTc values.
//!
//! A criterion is a `TestSuite`: a set of threshold tests drawn from one
//! publication. Each test can be limited to one sex and/or an age range.
//! The suite reports the most severe classification among the tests that
//! fire, `Normal` when none fire, and `Undefined` when the suite needs a sex
//! or age the measurement does not carry.

use crate::error::{Error, Result};
use crate::types::{Age, QtcMeasurement, Sex, Units};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Comparison and Severity
// ============================================================================

/// `lhs <op> rhs`, where lhs is the measured value and rhs the threshold
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl Comparison {
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::GreaterThan => lhs > rhs,
            Comparison::GreaterThanOrEqual => lhs >= rhs,
            Comparison::LessThan => lhs < rhs,
            Comparison::LessThanOrEqual => lhs <= rhs,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::GreaterThan => ">",
            Comparison::GreaterThanOrEqual => ">=",
            Comparison::LessThan => "<",
            Comparison::LessThanOrEqual => "<=",
        }
    }
}

/// Clinical classification, ordered from least to most severe.
///
/// `Undefined` means the criterion could not be applied to the measurement.
/// It sorts below `Normal` and is never the severity of a test.
#[derive(
    Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Undefined,
    Normal,
    Borderline,
    #[default]
    Abnormal,
    Mild,
    Moderate,
    Severe,
    Error,
}

impl Severity {
    pub fn name(self) -> &'static str {
        match self {
            Severity::Undefined => "undefined",
            Severity::Normal => "normal",
            Severity::Borderline => "borderline",
            Severity::Abnormal => "abnormal",
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
            Severity::Error => "error",
        }
    }

    /// True for every classification worse than normal
    pub fn is_abnormal(self) -> bool {
        self > Severity::Normal
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Threshold Tests
// ============================================================================

/// Age cutoff for a test.
///
/// The test is skipped when `age <comparison> measured_age` holds, so the
/// admitted ages for a cutoff of 15 are:
///
/// | comparison              | admits         |
/// |-------------------------|----------------|
/// | `less_than`             | 15 and under   |
/// | `less_than_or_equal`    | under 15       |
/// | `greater_than`          | 15 and over    |
/// | `greater_than_or_equal` | over 15        |
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct AgeConstraint {
    pub age: Age,
    pub comparison: Comparison,
}

impl AgeConstraint {
    pub fn admits(&self, measured_age: Age) -> bool {
        !self
            .comparison
            .holds(f64::from(self.age), f64::from(measured_age))
    }
}

/// One threshold rule, e.g. QTc > 470 msec in women is abnormal
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QtcTest {
    pub value: f64,
    pub units: Units,
    pub comparison: Comparison,
    /// `Unspecified` applies the test to both sexes
    #[serde(default)]
    pub sex: Sex,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<AgeConstraint>,
}

impl QtcTest {
    pub fn new(value: f64, units: Units, comparison: Comparison) -> Self {
        Self {
            value,
            units,
            comparison,
            sex: Sex::Unspecified,
            severity: Severity::Abnormal,
            age: None,
        }
    }

    pub fn for_sex(mut self, sex: Sex) -> Self {
        self.sex = sex;
        self
    }

    pub fn for_age(mut self, age: Age, comparison: Comparison) -> Self {
        self.age = Some(AgeConstraint { age, comparison });
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// True when the test applies to this measurement and its threshold is crossed
    pub fn is_abnormal(&self, m: &QtcMeasurement) -> bool {
        let qtc = m.qtc_in(self.units);

        if self.sex.is_specified() && self.sex != m.sex {
            return false;
        }

        if let Some(constraint) = &self.age {
            match m.age {
                Some(age) if constraint.admits(age) => {}
                _ => return false,
            }
        }

        self.comparison.holds(qtc, self.value)
    }
}

// ============================================================================
// Test Suites
// ============================================================================

/// A named set of tests from one literature source
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TestSuite {
    pub name: String,
    pub reference: String,
    /// The criterion in prose
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub requires_sex: bool,
    #[serde(default)]
    pub requires_age: bool,
    pub tests: Vec<QtcTest>,
}

impl TestSuite {
    /// Whether the measurement carries the demographics this suite needs
    pub fn applies_to(&self, m: &QtcMeasurement) -> bool {
        !((self.requires_sex && !m.sex.is_specified()) || (self.requires_age && m.age.is_none()))
    }

    /// Tests that fire for this measurement, in suite order
    pub fn abnormal_tests(&self, m: &QtcMeasurement) -> Vec<&QtcTest> {
        self.tests.iter().filter(|t| t.is_abnormal(m)).collect()
    }

    /// The most severe firing test; the first one listed wins a tie
    pub fn failing_test(&self, m: &QtcMeasurement) -> Option<&QtcTest> {
        self.abnormal_tests(m)
            .into_iter()
            .fold(None, |worst: Option<&QtcTest>, test| match worst {
                Some(w) if w.severity >= test.severity => Some(w),
                _ => Some(test),
            })
    }

    pub fn severity(&self, m: &QtcMeasurement) -> Severity {
        if !self.applies_to(m) {
            tracing::debug!("{}: missing sex or age, severity undefined", self.name);
            return Severity::Undefined;
        }

        let severity = self
            .failing_test(m)
            .map_or(Severity::Normal, |test| test.severity);
        tracing::debug!("{}: QTc {} {:?} is {}", self.name, m.qtc, m.units, severity);
        severity
    }
}

// ============================================================================
// Built-in Criteria
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Criterion {
    Schwartz1985,
    Fda2005,
    Aha2009,
    Goldenberg2006,
}

impl Criterion {
    pub const ALL: [Criterion; 4] = [
        Criterion::Schwartz1985,
        Criterion::Fda2005,
        Criterion::Aha2009,
        Criterion::Goldenberg2006,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Criterion::Schwartz1985 => "Schwartz-1985",
            Criterion::Fda2005 => "FDA-2005",
            Criterion::Aha2009 => "AHA-2009",
            Criterion::Goldenberg2006 => "Goldenberg-2006",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Criterion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Criterion::ALL
            .into_iter()
            .find(|c| c.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UndefinedCriterion(s.to_string()))
    }
}

/// All built-in criteria
pub fn criteria() -> Vec<(Criterion, TestSuite)> {
    use Comparison::*;
    let msec = Units::Msec;

    vec![
        (
            Criterion::Schwartz1985,
            TestSuite {
                name: "Schwartz, 1985".into(),
                reference: "Schwartz PJ. Idiopathic long QT syndrome: Progress and questions. American Heart Journal. 1985;109(2):399-411. doi:10.1016/0002-8703(85)90626-X".into(),
                description: "QTc > 440 msec".into(),
                notes: Some("Simple but outdated criterion, from long QT syndrome data. Overdiagnoses long QTc and no reckoning of sex difference in QT duration.".into()),
                tests: vec![QtcTest::new(440.0, msec, GreaterThan)],
                requires_sex: false,
                requires_age: false,
            },
        ),
        (
            Criterion::Fda2005,
            TestSuite {
                name: "FDA, 2005".into(),
                reference: "Food and Drug Administration, HHS. International Conference on Harmonisation; guidance on E14 Clinical Evaluation of QT/QTc Interval Prolongation and Proarrhythmic Potential for Non-Antiarrhythmic Drugs. Fed Regist. 2005;70(202):61134-61135.".into(),
                description: "QTc > 450 msec mild, > 480 msec moderate, > 500 msec severe prolongation".into(),
                notes: Some("Thresholds of regulatory concern in drug trials".into()),
                tests: vec![
                    QtcTest::new(450.0, msec, GreaterThan).severity(Severity::Mild),
                    QtcTest::new(480.0, msec, GreaterThan).severity(Severity::Moderate),
                    QtcTest::new(500.0, msec, GreaterThan).severity(Severity::Severe),
                ],
                requires_sex: false,
                requires_age: false,
            },
        ),
        (
            Criterion::Aha2009,
            TestSuite {
                name: "AHA/ACCF/HRS, 2009".into(),
                reference: "Rautaharju PM, Surawicz B, Gettes LS. AHA/ACCF/HRS recommendations for the standardization and interpretation of the electrocardiogram: part IV: the ST segment, T and U waves, and the QT interval. J Am Coll Cardiol. 2009;53(11):982-991. doi:10.1016/j.jacc.2008.12.014".into(),
                description: "QTc >= 450 msec (men), >= 460 msec (women) prolonged; QTc <= 390 msec short".into(),
                notes: None,
                tests: vec![
                    QtcTest::new(450.0, msec, GreaterThanOrEqual).for_sex(Sex::Male),
                    QtcTest::new(460.0, msec, GreaterThanOrEqual).for_sex(Sex::Female),
                    QtcTest::new(390.0, msec, LessThanOrEqual),
                ],
                requires_sex: true,
                requires_age: false,
            },
        ),
        (
            Criterion::Goldenberg2006,
            TestSuite {
                name: "Goldenberg, 2006".into(),
                reference: "Goldenberg I, Moss AJ, Zareba W. QT interval: how to measure it and what is \"normal\". J Cardiovasc Electrophysiol. 2006;17(3):333-336. doi:10.1111/j.1540-8167.2006.00408.x".into(),
                description: "Age 15 and under: QTc >= 440 msec borderline, > 460 msec prolonged. Over 15: men >= 430 msec borderline, > 450 msec prolonged; women >= 450 msec borderline, > 470 msec prolonged".into(),
                notes: None,
                tests: vec![
                    QtcTest::new(440.0, msec, GreaterThanOrEqual)
                        .for_age(15, LessThan)
                        .severity(Severity::Borderline),
                    QtcTest::new(460.0, msec, GreaterThan).for_age(15, LessThan),
                    QtcTest::new(430.0, msec, GreaterThanOrEqual)
                        .for_sex(Sex::Male)
                        .for_age(15, GreaterThanOrEqual)
                        .severity(Severity::Borderline),
                    QtcTest::new(450.0, msec, GreaterThan)
                        .for_sex(Sex::Male)
                        .for_age(15, GreaterThanOrEqual),
                    QtcTest::new(450.0, msec, GreaterThanOrEqual)
                        .for_sex(Sex::Female)
                        .for_age(15, GreaterThanOrEqual)
                        .severity(Severity::Borderline),
                    QtcTest::new(470.0, msec, GreaterThan)
                        .for_sex(Sex::Female)
                        .for_age(15, GreaterThanOrEqual),
                ],
                requires_sex: true,
                requires_age: true,
            },
        ),
    ]
}
