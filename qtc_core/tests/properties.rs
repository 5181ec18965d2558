//! Cross-module properties of the built-in registry.
//!
//! These tests verify:
//! - Every unit entry point agrees with the seconds-based equation
//! - Rate-independent formulas leave QT unchanged at 60 bpm
//! - Suites report the worst matching severity and gate on demographics
//! - Reference values for Bazett, FDA, AHA and the Rabkin spline basis

use qtc_core::units::{sec_to_bpm, sec_to_msec};
use qtc_core::*;

const DELTA: f64 = 0.000_000_1;

const QT_VALUES: [f64; 4] = [0.3, 0.36, 0.42, 0.5];
const RR_VALUES: [f64; 6] = [0.4, 0.6, 0.85, 1.0, 1.2, 1.6];

const SEXES: [Sex; 3] = [Sex::Male, Sex::Female, Sex::Unspecified];

/// Covers the Ashman age steps (15, 32, 45) and the Yoshinaga age limit
const AGES: [Option<Age>; 6] = [None, Some(8), Some(15), Some(30), Some(44), Some(70)];

fn close(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance * b.abs().max(1.0)
}

#[test]
fn test_qtc_unit_entry_points_agree() {
    let registry = default_registry();
    for formula in registry.qtc_formulas() {
        let calc = registry.qtc_calculator(formula).unwrap();
        let mut computed = 0;
        for sex in SEXES {
            for age in AGES {
                for qt in QT_VALUES {
                    for rr in RR_VALUES {
                        let sec = calc.calculate_sec(qt, rr, sex, age);
                        let msec = calc.calculate_msec(sec_to_msec(qt), sec_to_msec(rr), sex, age);
                        let sec_rate = calc.calculate_sec_from_rate(qt, sec_to_bpm(rr), sex, age);
                        let msec_rate =
                            calc.calculate_msec_from_rate(sec_to_msec(qt), sec_to_bpm(rr), sex, age);

                        // A rejected sex/age pair is rejected by every entry point
                        let Ok(sec) = sec else {
                            assert!(msec.is_err() && sec_rate.is_err() && msec_rate.is_err());
                            continue;
                        };
                        computed += 1;
                        let label = format!("{} {:?} {:?}", formula, sex, age);
                        assert!(close(msec.unwrap(), sec_to_msec(sec), 1e-9), "{} msec", label);
                        assert!(close(sec_rate.unwrap(), sec, 1e-9), "{} rate/sec", label);
                        assert!(
                            close(msec_rate.unwrap(), sec_to_msec(sec), 1e-9),
                            "{} rate/msec",
                            label
                        );
                    }
                }
            }
        }
        assert!(computed > 0, "{} rejected every input", formula);
    }
}

#[test]
fn test_qtp_unit_entry_points_agree() {
    let registry = default_registry();
    for formula in registry.qtp_formulas() {
        let calc = registry.qtp_calculator(formula).unwrap();
        let mut computed = 0;
        for sex in SEXES {
            for age in AGES {
                for rr in RR_VALUES {
                    let sec = calc.calculate_sec(rr, sex, age);
                    let msec = calc.calculate_msec(sec_to_msec(rr), sex, age);
                    let sec_rate = calc.calculate_sec_from_rate(sec_to_bpm(rr), sex, age);
                    let msec_rate = calc.calculate_msec_from_rate(sec_to_bpm(rr), sex, age);

                    let Ok(sec) = sec else {
                        assert!(msec.is_err() && sec_rate.is_err() && msec_rate.is_err());
                        continue;
                    };
                    computed += 1;
                    let label = format!("{} {:?} {:?}", formula, sex, age);
                    assert!(close(msec.unwrap(), sec_to_msec(sec), 1e-9), "{} msec", label);
                    assert!(close(sec_rate.unwrap(), sec, 1e-9), "{} rate/sec", label);
                    assert!(
                        close(msec_rate.unwrap(), sec_to_msec(sec), 1e-9),
                        "{} rate/msec",
                        label
                    );
                }
            }
        }
        assert!(computed > 0, "{} rejected every input", formula);
    }
}

#[test]
fn test_sex_specific_formulas_run_for_both_sexes() {
    let registry = default_registry();
    let rbk = registry.qtc_calculator(QtcFormula::Rbk).unwrap();
    let bdl = registry.qtp_calculator(QtpFormula::Bdl).unwrap();
    let ash = registry.qtp_calculator(QtpFormula::Ash).unwrap();
    for sex in [Sex::Male, Sex::Female] {
        assert!(rbk.calculate_msec(400.0, 800.0, sex, None).is_ok());
        assert!(bdl.calculate_msec(800.0, sex, None).is_ok());
        for age in [8, 15, 30, 44, 45, 70] {
            assert!(ash.calculate_msec(800.0, sex, Some(age)).is_ok());
        }
    }
    assert!(rbk.calculate_msec(400.0, 800.0, Sex::Unspecified, None).is_err());
    assert!(ash.calculate_msec(800.0, Sex::Male, None).is_err());
}

#[test]
fn test_measurement_dispatch_matches_entry_points() {
    let registry = default_registry();
    let calc = registry.qtc_calculator(QtcFormula::Frd).unwrap();

    let by_rate = QtMeasurement::new(Some(0.4), 75.0, Units::Sec, IntervalRateType::Rate);
    let by_interval = QtMeasurement::new(Some(400.0), 800.0, Units::Msec, IntervalRateType::Interval);
    let sec = calc.calculate(&by_rate).unwrap();
    let msec = calc.calculate(&by_interval).unwrap();
    assert!(close(sec_to_msec(sec), msec, 1e-9));
    assert!(msec > 400.0);
}

#[test]
fn test_equipoise_at_60_bpm() {
    let registry = default_registry();
    for formula in registry.qtc_formulas() {
        let calc = registry.qtc_calculator(formula).unwrap();
        let shape = calc.classification();
        if !matches!(
            shape,
            FormulaClassification::Power | FormulaClassification::Linear | FormulaClassification::Rational
        ) {
            continue;
        }
        for qt in QT_VALUES {
            let qtc = calc.calculate_sec(qt, 1.0, Sex::Unspecified, None).unwrap();
            assert!((qtc - qt).abs() < DELTA, "{} corrects at 60 bpm", formula);
        }
    }
}

#[test]
fn test_rabkin_equipoise_at_60_bpm() {
    let calc = default_registry().qtc_calculator(QtcFormula::Rbk).unwrap();
    let qtc = calc.calculate_msec_from_rate(410.0, 60.0, Sex::Male, Some(45)).unwrap();
    assert!((qtc - 410.0).abs() < 1e-6);
}

#[test]
fn test_severity_is_worst_matching_test() {
    let registry = default_registry();
    for id in registry.criterion_ids() {
        let suite = registry.criterion(id).unwrap();
        for qtc in (300..=620).step_by(5) {
            for sex in [Sex::Male, Sex::Female] {
                for age in [5, 15, 16, 40, 80] {
                    let m = QtcMeasurement::new(f64::from(qtc), Units::Msec)
                        .with_sex(sex)
                        .with_age(age);
                    let worst = suite
                        .abnormal_tests(&m)
                        .iter()
                        .map(|t| t.severity)
                        .max()
                        .unwrap_or(Severity::Normal);
                    assert_eq!(suite.severity(&m), worst, "{} at {} msec", id, qtc);
                }
            }
        }
    }
}

#[test]
fn test_suites_requiring_sex_are_undefined_without_it() {
    let registry = default_registry();
    for id in registry.criterion_ids() {
        let suite = registry.criterion(id).unwrap();
        if !suite.requires_sex {
            continue;
        }
        for qtc in (300..=620).step_by(10) {
            let m = QtcMeasurement::new(f64::from(qtc), Units::Msec).with_age(40);
            assert_eq!(suite.severity(&m), Severity::Undefined, "{}", id);
        }
    }
}

#[test]
fn test_bazett_reference_value() {
    let calc = default_registry().qtc_calculator(QtcFormula::Bzt).unwrap();
    let qtc = calc.calculate_sec(0.3, 1.0, Sex::Unspecified, None).unwrap();
    assert!((qtc - 0.3).abs() < DELTA);
}

#[test]
fn test_fda_2005_reference_values() {
    let fda = default_registry().criterion("FDA-2005").unwrap();
    let severity = |qtc| fda.severity(&QtcMeasurement::new(qtc, Units::Msec));
    assert_eq!(severity(485.0), Severity::Moderate);
    assert_eq!(severity(455.0), Severity::Mild);
    assert_eq!(severity(600.0), Severity::Severe);
    assert_eq!(severity(450.0), Severity::Normal);
}

#[test]
fn test_aha_2009_reference_values() {
    let aha = default_registry().criterion("AHA-2009").unwrap();
    let m = QtcMeasurement::new(460.0, Units::Msec);
    assert_eq!(aha.severity(&m), Severity::Undefined);
    assert_eq!(aha.severity(&m.with_sex(Sex::Female)), Severity::Abnormal);
}

#[test]
fn test_rabkin_basis_reference_values() {
    assert!((rabkin::b1(60.0) - 0.055_523_4).abs() < 1e-6);
    assert!((rabkin::b2(60.0) - 0.450_207_9).abs() < 1e-6);
    assert!((rabkin::b3(60.0) - 0.494_211_8).abs() < 1e-6);
    assert_eq!(rabkin::b1(80.0), 0.0);
    assert_eq!(rabkin::b2(80.0), 0.0);
}

#[test]
fn test_unknown_identifiers_fail() {
    let registry = default_registry();
    assert!(matches!(registry.calculator("QTcZZZ"), Err(Error::UndefinedFormula(_))));
    assert!(matches!(registry.criterion("ZZZ-1900"), Err(Error::UndefinedCriterion(_))));
}
