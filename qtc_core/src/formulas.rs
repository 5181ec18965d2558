//! Built-in QTc and QTp formulas.
//!
//! Formula identifiers follow the nomenclature of Rabkin and Cheng, 2015
//! (World J Cardiol 2015;7:315-325). Each formula's math lives in its own
//! equation strategy: the shared power and linear families as small structs,
//! one-off formulas as plain functions.

use crate::calculator::{FormulaInfo, QtcCalculator, QtcEquation, QtpCalculator, QtpEquation};
use crate::error::{Error, Parameter, Result};
use crate::rabkin::{RabkinQtc, RabkinQtp};
use crate::types::{Age, FormulaClassification, Sec, Sex};
use crate::units::{msec_to_sec, sec_to_bpm};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QtcFormula {
    Bzt,  // Bazett
    Frd,  // Fridericia
    Frm,  // Framingham
    Hdg,  // Hodges
    Rtha, // Rautaharju (2014)a
    Myd,  // Mayeda
    Arr,  // Arrowood
    Kwt,  // Kawataki
    Dmt,  // Dmitrienko
    Yos,  // Yoshinaga
    Rbk,  // Rabkin
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QtpFormula {
    Arr, // Arrowood
    Bdl, // Boudoulas
    Ash, // Ashman
    Bzt, // Bazett
    Rbk, // Rabkin
}

/// Any formula identifier; every identifier is either QTc or QTp, never both
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Formula {
    Qtc(QtcFormula),
    Qtp(QtpFormula),
}

impl QtcFormula {
    pub const ALL: [QtcFormula; 11] = [
        QtcFormula::Bzt,
        QtcFormula::Frd,
        QtcFormula::Frm,
        QtcFormula::Hdg,
        QtcFormula::Rtha,
        QtcFormula::Myd,
        QtcFormula::Arr,
        QtcFormula::Kwt,
        QtcFormula::Dmt,
        QtcFormula::Yos,
        QtcFormula::Rbk,
    ];

    /// Short code, e.g. `QTcBZT`
    pub fn code(self) -> &'static str {
        match self {
            QtcFormula::Bzt => "QTcBZT",
            QtcFormula::Frd => "QTcFRD",
            QtcFormula::Frm => "QTcFRM",
            QtcFormula::Hdg => "QTcHDG",
            QtcFormula::Rtha => "QTcRTHa",
            QtcFormula::Myd => "QTcMYD",
            QtcFormula::Arr => "QTcARR",
            QtcFormula::Kwt => "QTcKWT",
            QtcFormula::Dmt => "QTcDMT",
            QtcFormula::Yos => "QTcYOS",
            QtcFormula::Rbk => "QTcRBK",
        }
    }
}

impl QtpFormula {
    pub const ALL: [QtpFormula; 5] = [
        QtpFormula::Arr,
        QtpFormula::Bdl,
        QtpFormula::Ash,
        QtpFormula::Bzt,
        QtpFormula::Rbk,
    ];

    /// Short code, e.g. `QTpARR`
    pub fn code(self) -> &'static str {
        match self {
            QtpFormula::Arr => "QTpARR",
            QtpFormula::Bdl => "QTpBDL",
            QtpFormula::Ash => "QTpASH",
            QtpFormula::Bzt => "QTpBZT",
            QtpFormula::Rbk => "QTpRBK",
        }
    }
}

impl Formula {
    pub fn code(self) -> &'static str {
        match self {
            Formula::Qtc(f) => f.code(),
            Formula::Qtp(f) => f.code(),
        }
    }
}

impl fmt::Display for QtcFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Display for QtpFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// Codes are matched case-insensitively.
impl FromStr for QtcFormula {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        QtcFormula::ALL
            .into_iter()
            .find(|f| f.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UndefinedFormula(s.to_string()))
    }
}

impl FromStr for QtpFormula {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        QtpFormula::ALL
            .into_iter()
            .find(|f| f.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UndefinedFormula(s.to_string()))
    }
}

impl FromStr for Formula {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.parse::<QtcFormula>()
            .map(Formula::Qtc)
            .or_else(|_| s.parse::<QtpFormula>().map(Formula::Qtp))
    }
}

// ============================================================================
// Equation Strategies
// ============================================================================

/// QTc = QT / RR^exponent
#[derive(Clone, Copy, Debug)]
pub struct Power {
    pub exponent: f64,
}

impl QtcEquation for Power {
    fn qtc(&self, qt: Sec, rr: Sec, _sex: Sex, _age: Option<Age>) -> Result<Sec> {
        Ok(qt / rr.powf(self.exponent))
    }
}

/// QTc = QT + alpha * (1 - RR)
#[derive(Clone, Copy, Debug)]
pub struct Linear {
    pub alpha: f64,
}

impl QtcEquation for Linear {
    fn qtc(&self, qt: Sec, rr: Sec, _sex: Sex, _age: Option<Age>) -> Result<Sec> {
        Ok(qt + self.alpha * (1.0 - rr))
    }
}

/// Restricts an equation to an age range. Without an age the equation runs.
#[derive(Clone, Copy, Debug)]
pub struct AgeRestricted<E> {
    pub min: Age,
    pub max: Age,
    pub equation: E,
}

impl<E> AgeRestricted<E> {
    fn check(&self, age: Option<Age>) -> Result<()> {
        match age {
            Some(age) if age < self.min || age > self.max => Err(Error::AgeOutOfRange {
                age,
                min: self.min,
                max: self.max,
            }),
            _ => Ok(()),
        }
    }
}

impl<E: QtcEquation> QtcEquation for AgeRestricted<E> {
    fn qtc(&self, qt: Sec, rr: Sec, sex: Sex, age: Option<Age>) -> Result<Sec> {
        self.check(age)?;
        self.equation.qtc(qt, rr, sex, age)
    }
}

impl<E: QtpEquation> QtpEquation for AgeRestricted<E> {
    fn qtp(&self, rr: Sec, sex: Sex, age: Option<Age>) -> Result<Sec> {
        self.check(age)?;
        self.equation.qtp(rr, sex, age)
    }
}

/// Notes for both Rabkin calculators
pub const RABKIN_NOTES: &str = "Provisional: spline coefficients are placeholders, not the published \
regression table. Not for clinical use. Sex required; age refines the prediction when given";

/// Oldest age, years, treated as pediatric
pub const PEDIATRIC_MAX_AGE: Age = 17;

fn qtc_hdg(qt: Sec, rr: Sec, _sex: Sex, _age: Option<Age>) -> Result<Sec> {
    Ok(qt + 0.00175 * (sec_to_bpm(rr) - 60.0))
}

fn qtc_rtha(qt: Sec, rr: Sec, _sex: Sex, _age: Option<Age>) -> Result<Sec> {
    Ok(qt * (120.0 + sec_to_bpm(rr)) / 180.0)
}

fn qtc_arr(qt: Sec, rr: Sec, _sex: Sex, _age: Option<Age>) -> Result<Sec> {
    Ok(qt + 0.304 - 0.492 * (-0.008 * sec_to_bpm(rr)).exp())
}

fn qtp_arr(rr: Sec, _sex: Sex, _age: Option<Age>) -> Result<Sec> {
    Ok(0.12 + 0.492 * (-0.008 * sec_to_bpm(rr)).exp())
}

fn qtp_bdl(rr: Sec, sex: Sex, _age: Option<Age>) -> Result<Sec> {
    let hr = sec_to_bpm(rr);
    match sex {
        Sex::Male => Ok(msec_to_sec(521.0 - 2.0 * hr)),
        Sex::Female => Ok(msec_to_sec(511.0 - 1.8 * hr)),
        Sex::Unspecified => Err(Error::ParameterRequired(Parameter::Sex)),
    }
}

// QT = K * log10(10 * (RR + k)); K steps up with age, later in men.
fn qtp_ash(rr: Sec, sex: Sex, age: Option<Age>) -> Result<Sec> {
    let age = age.ok_or(Error::ParameterRequired(Parameter::Age))?;
    let k = 0.07;
    let big_k = match sex {
        Sex::Male if age < 45 => 0.375,
        Sex::Male => 0.380,
        Sex::Female if age < 15 => 0.375,
        Sex::Female if age <= 32 => 0.385,
        Sex::Female => 0.390,
        Sex::Unspecified => return Err(Error::ParameterRequired(Parameter::Sex)),
    };
    Ok(big_k * (10.0 * (rr + k)).log10())
}

// QT = k * sqrt(RR); k is 0.37 for men and children, 0.40 for women.
fn qtp_bzt(rr: Sec, sex: Sex, _age: Option<Age>) -> Result<Sec> {
    let k = match sex {
        Sex::Male => 0.37,
        Sex::Female => 0.40,
        Sex::Unspecified => return Err(Error::ParameterRequired(Parameter::Sex)),
    };
    Ok(k * rr.sqrt())
}

// ============================================================================
// Literature Tables
// ============================================================================

/// All built-in QTc calculators
pub fn qtc_calculators() -> Vec<(QtcFormula, QtcCalculator)> {
    vec![
        (
            QtcFormula::Bzt,
            QtcCalculator::new(
                FormulaInfo::new(
                    "Bazett",
                    "QTcBZT",
                    "Bazett HC. An analysis of the time relations of electrocardiograms. Heart 1920;7:353-367.",
                    "QT/RR^0.5",
                    FormulaClassification::Power,
                )
                .published(1920)
                .notes("Oldest, most common formula, but inaccurate at extremes of heart rate"),
                Power { exponent: 0.5 },
            ),
        ),
        (
            QtcFormula::Frd,
            QtcCalculator::new(
                FormulaInfo::new(
                    "Fridericia",
                    "QTcFRD",
                    "Fridericia L. Die sytolendauer in elektrokardiogramm bei normalen menschen und bei herzkranken. Acta Med Scand. 1920;53:469-486.",
                    "QT/RR^0.333",
                    FormulaClassification::Power,
                )
                .published(1920),
                Power { exponent: 1.0 / 3.0 },
            ),
        ),
        (
            QtcFormula::Frm,
            QtcCalculator::new(
                FormulaInfo::new(
                    "Framingham (Sagie)",
                    "QTcFRM",
                    "Sagie A, Larson MG, Goldberg RJ, Bengtson JR, Levy D. An improved method for adjusting the QT interval for heart rate (the Framingham Heart Study). Am J Cardiol. 1992;70:797-801.",
                    "QT + 0.154*(1-RR)",
                    FormulaClassification::Linear,
                )
                .published(1992)
                .subjects(5018),
                Linear { alpha: 0.154 },
            ),
        ),
        (
            QtcFormula::Hdg,
            QtcCalculator::new(
                FormulaInfo::new(
                    "Hodges",
                    "QTcHDG",
                    "Hodges M, Salerno D, Erlien D. Bazett's QT correction reviewed: Evidence that a linear QT correction for heart rate is better. J Am Coll Cardiol. 1983;1:694.",
                    "QT + 1.75*(HR-60)",
                    // Linear in HR; filed as rational in the Rabkin and Cheng
                    // 2015 nomenclature this table follows.
                    FormulaClassification::Rational,
                )
                .published(1983),
                qtc_hdg,
            ),
        ),
        (
            QtcFormula::Rtha,
            QtcCalculator::new(
                FormulaInfo::new(
                    "Rautaharju (2014)a",
                    "QTcRTHa",
                    "Rautaharju PM, Mason JW, Akiyama T. New age- and sex-specific criteria for QT prolongation based on rate correction formulas that minimize bias at the upper normal limits. Int J Cardiol. 2014;174:535-540.",
                    "QT * (120 + HR)/180",
                    FormulaClassification::Rational,
                )
                .published(2014),
                qtc_rtha,
            ),
        ),
        (
            QtcFormula::Myd,
            QtcCalculator::new(
                FormulaInfo::new(
                    "Mayeda",
                    "QTcMYD",
                    "Mayeda I. On time relation between systolic duration of heart and pulse rate. Acta Sch Med Univ Imp. 1934;17:53-55.",
                    "QT/RR^0.604",
                    FormulaClassification::Power,
                )
                .published(1934),
                Power { exponent: 0.604 },
            ),
        ),
        (
            QtcFormula::Arr,
            QtcCalculator::new(
                FormulaInfo::new(
                    "Arrowood",
                    "QTcARR",
                    "Arrowood JA, Kline J, Simpson PM, Quigg RJ, Pippin JJ, Nixon JV, Mohanty PK. Modulation of the QT interval: effects of graded exercise and reflex cardiovascular stimulation. J Appl Physiol. 1993;75:2217-2223.",
                    "QT + 0.304 - 0.492*e^(-0.008*HR)",
                    FormulaClassification::Other,
                )
                .published(1993),
                qtc_arr,
            ),
        ),
        (
            QtcFormula::Kwt,
            QtcCalculator::new(
                FormulaInfo::new(
                    "Kawataki",
                    "QTcKWT",
                    "Kawataki M, Kashima T, Toda H, Tanaka H. Relation between QT interval and heart rate. Applications and limitations of Bazett's formula. J Electrocardiol. 1984;17:371-375.",
                    "QT/RR^0.25",
                    FormulaClassification::Power,
                )
                .published(1984),
                Power { exponent: 0.25 },
            ),
        ),
        (
            QtcFormula::Dmt,
            QtcCalculator::new(
                FormulaInfo::new(
                    "Dmitrienko",
                    "QTcDMT",
                    "Dmitrienko AA, Sides GD, Winters KJ, et al. Electrocardiogram reference ranges derived from a standardized clinical trial population. Drug Inf J. 2005;39:395-405.",
                    "QT/RR^0.413",
                    FormulaClassification::Power,
                )
                .published(2005),
                Power { exponent: 0.413 },
            ),
        ),
        (
            QtcFormula::Yos,
            QtcCalculator::new(
                FormulaInfo::new(
                    "Yoshinaga",
                    "QTcYOS",
                    "Yoshinaga M, Tomari T, Aihoshi S, et al. Exponential correction of QT interval to minimize the effect of the heart rate in children. Jpn Circ J. 1993;57:102-108.",
                    "QT/RR^0.31",
                    FormulaClassification::Power,
                )
                .published(1993)
                .pediatric()
                .notes("Children"),
                AgeRestricted {
                    min: 0,
                    max: PEDIATRIC_MAX_AGE,
                    equation: Power { exponent: 0.31 },
                },
            ),
        ),
        (
            QtcFormula::Rbk,
            QtcCalculator::new(
                FormulaInfo::new(
                    "Rabkin",
                    "QTcRBK",
                    "Rabkin SW, Szefer E, Thompson DJS. A new QT interval correction formulae to adjust for increases in heart rate. JACC Clin Electrophysiol. 2017;3:756-766.",
                    "QTp(60) + (QT - QTp(HR)), QTp a cubic spline in HR",
                    FormulaClassification::Other,
                )
                .published(2017)
                .notes(RABKIN_NOTES),
                RabkinQtc,
            ),
        ),
    ]
}

/// All built-in QTp calculators
pub fn qtp_calculators() -> Vec<(QtpFormula, QtpCalculator)> {
    vec![
        (
            QtpFormula::Arr,
            QtpCalculator::new(
                FormulaInfo::new(
                    "Arrowood",
                    "QTpARR",
                    "Arrowood JA, Kline J, Simpson PM, Quigg RJ, Pippin JJ, Nixon JV, Mohanty PK. Modulation of the QT interval: effects of graded exercise and reflex cardiovascular stimulation. J Appl Physiol (1985). 1993;75:2217-2223.",
                    "0.12 + 0.492e^(-0.008*HR)",
                    FormulaClassification::Exponential,
                )
                .published(1993),
                qtp_arr,
            ),
        ),
        (
            QtpFormula::Bdl,
            QtpCalculator::new(
                FormulaInfo::new(
                    "Boudoulas",
                    "QTpBDL",
                    "Boudoulas H, Geleris P, Lewis RP, Rittgers SE. Linear relationship between electrical systole, mechanical systole, and heart rate. Chest 1981;80:613-617.",
                    "Males: QT = 521 - 2.0*HR; Females: QT = 511 - 1.8*HR (msec)",
                    FormulaClassification::Linear,
                )
                .published(1981),
                qtp_bdl,
            ),
        ),
        (
            QtpFormula::Ash,
            QtpCalculator::new(
                FormulaInfo::new(
                    "Ashman",
                    "QTpASH",
                    "Ashman R. The normal duration of the Q-T interval. Am Heart J 1942;23:522-534.",
                    "QT = K log[10(RR + k)], K and k sex and age dependent",
                    FormulaClassification::Logarithmic,
                )
                .published(1942),
                qtp_ash,
            ),
        ),
        (
            QtpFormula::Bzt,
            QtpCalculator::new(
                FormulaInfo::new(
                    "Bazett",
                    "QTpBZT",
                    "Bazett HC. An analysis of the time relations of electrocardiograms. Heart 1920;7:353-367.",
                    "QT = K*sqrt(RR), K = 0.37 (men), 0.40 (women)",
                    FormulaClassification::Power,
                )
                .published(1920),
                qtp_bzt,
            ),
        ),
        (
            QtpFormula::Rbk,
            QtpCalculator::new(
                FormulaInfo::new(
                    "Rabkin",
                    "QTpRBK",
                    "Rabkin SW, Szefer E, Thompson DJS. A new QT interval correction formulae to adjust for increases in heart rate. JACC Clin Electrophysiol. 2017;3:756-766.",
                    "Cubic spline in HR, knots at 35, 61, 67, 73, 81, 156 bpm",
                    FormulaClassification::Other,
                )
                .published(2017)
                .notes(RABKIN_NOTES),
                RabkinQtp,
            ),
        ),
    ]
}
