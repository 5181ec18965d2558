//! Rabkin QTc/QTp, built on a cubic spline over heart rate.
//!
//! The predicted QT is a natural cubic B-spline in heart rate with boundary
//! knots at 35 and 156 bpm and interior knots at 61, 67, 73 and 81 bpm.
//! The basis functions are written out piece by piece in terms of a linear
//! ramp `f(x, c0, c1) = (x - c0) / (c1 - c0)`, its complement `g = 1 - f`
//! and an indicator `ind(x, min, max)`, so each `bk` is non-zero only on its
//! knot-bounded support and the pieces meet continuously. Spans are
//! half-open except the last, which includes the upper boundary knot.
//! Rates outside the knot domain are clamped to it, so predicted QT is
//! flat beyond either boundary.
//!
//! Reference: Rabkin SW, Szefer E, Thompson DJS. A new QT interval
//! correction formulae to adjust for increases in heart rate. JACC Clin
//! Electrophysiol. 2017;3:756-766.

use crate::calculator::{QtcEquation, QtpEquation};
use crate::error::{Error, Parameter, Result};
use crate::types::{Age, Msec, Sec, Sex};
use crate::units::{msec_to_sec, sec_to_bpm, sec_to_msec};

/// Lower and upper boundary knots, bpm
pub const RATE_DOMAIN: (f64, f64) = (35.0, 156.0);

/// Reference rate the QTc is rebased to
pub const REFERENCE_RATE: f64 = 60.0;

// Model coefficients, msec. The intercept is the predicted male QT at the
// lower boundary knot. These are provisional values, not the published
// regression table; the calculators say so in their notes.
const INTERCEPT: f64 = 460.0;
const SPLINE_COEFFICIENTS: [f64; 7] = [
    -19.87, -44.62, -66.03, -84.91, -111.26, -149.53, -179.35,
];
const FEMALE_OFFSET: f64 = 8.7;
const AGE_SLOPE: f64 = 0.21;

// ============================================================================
// Basis Function Building Blocks
// ============================================================================

fn f(x: f64, c0: f64, c1: f64) -> f64 {
    (x - c0) / (c1 - c0)
}

fn f2(x: f64, c0: f64, c1: f64) -> f64 {
    f(x, c0, c1).powi(2)
}

fn f3(x: f64, c0: f64, c1: f64) -> f64 {
    f(x, c0, c1).powi(3)
}

fn g(x: f64, c0: f64, c1: f64) -> f64 {
    1.0 - f(x, c0, c1)
}

fn g2(x: f64, c0: f64, c1: f64) -> f64 {
    g(x, c0, c1).powi(2)
}

fn g3(x: f64, c0: f64, c1: f64) -> f64 {
    g(x, c0, c1).powi(3)
}

/// 1 on `[min, max)`, 0 elsewhere
fn ind(x: f64, min: f64, max: f64) -> f64 {
    if min <= x && x < max {
        1.0
    } else {
        0.0
    }
}

/// 1 on `[min, max]`, 0 elsewhere; used for the span ending at the upper knot
fn ind_last(x: f64, min: f64, max: f64) -> f64 {
    if min <= x && x <= max {
        1.0
    } else {
        0.0
    }
}

// ============================================================================
// Basis Functions
// ============================================================================

/// Absorbed into the intercept; kept so the full basis sums to one.
pub fn b0(x: f64) -> f64 {
    g3(x, 35.0, 61.0) * ind(x, 35.0, 61.0)
}

pub fn b1(x: f64) -> f64 {
    f(x, 35.0, 61.0)
        * (g2(x, 35.0, 61.0) + g(x, 35.0, 61.0) * g(x, 35.0, 67.0) + g2(x, 35.0, 67.0))
        * ind(x, 35.0, 61.0)
        + g2(x, 35.0, 67.0) * g(x, 61.0, 67.0) * ind(x, 61.0, 67.0)
}

pub fn b2(x: f64) -> f64 {
    f(x, 35.0, 61.0)
        * f(x, 35.0, 67.0)
        * (g(x, 35.0, 61.0) + g(x, 35.0, 67.0) + g(x, 35.0, 73.0))
        * ind(x, 35.0, 61.0)
        + f(x, 35.0, 67.0)
            * g(x, 61.0, 67.0)
            * (g(x, 35.0, 67.0) + g(x, 35.0, 73.0))
            * ind(x, 61.0, 67.0)
        + f(x, 61.0, 67.0) * g(x, 35.0, 73.0) * g(x, 61.0, 73.0) * ind(x, 61.0, 67.0)
        + g(x, 35.0, 73.0) * g(x, 61.0, 73.0) * g(x, 67.0, 73.0) * ind(x, 67.0, 73.0)
}

pub fn b3(x: f64) -> f64 {
    f(x, 35.0, 61.0) * f(x, 35.0, 67.0) * f(x, 35.0, 73.0) * ind(x, 35.0, 61.0)
        + f(x, 35.0, 73.0)
            * (f(x, 35.0, 67.0) * g(x, 61.0, 67.0) + f(x, 61.0, 67.0) * g(x, 61.0, 73.0))
            * ind(x, 61.0, 67.0)
        + f(x, 61.0, 67.0) * f(x, 61.0, 73.0) * g(x, 61.0, 81.0) * ind(x, 61.0, 67.0)
        + g(x, 67.0, 73.0)
            * (f(x, 35.0, 73.0) * g(x, 61.0, 73.0) + f(x, 61.0, 73.0) * g(x, 61.0, 81.0))
            * ind(x, 67.0, 73.0)
        + f(x, 67.0, 73.0) * g(x, 61.0, 81.0) * g(x, 67.0, 81.0) * ind(x, 67.0, 73.0)
        + g(x, 61.0, 81.0) * g(x, 67.0, 81.0) * g(x, 73.0, 81.0) * ind(x, 73.0, 81.0)
}

pub fn b4(x: f64) -> f64 {
    f(x, 61.0, 67.0) * f(x, 61.0, 73.0) * f(x, 61.0, 81.0) * ind(x, 61.0, 67.0)
        + f(x, 61.0, 81.0)
            * (f(x, 61.0, 73.0) * g(x, 67.0, 73.0) + f(x, 67.0, 73.0) * g(x, 67.0, 81.0))
            * ind(x, 67.0, 73.0)
        + f(x, 67.0, 73.0) * f(x, 67.0, 81.0) * g(x, 67.0, 156.0) * ind(x, 67.0, 73.0)
        + g(x, 73.0, 81.0)
            * (f(x, 61.0, 81.0) * g(x, 67.0, 81.0) + f(x, 67.0, 81.0) * g(x, 67.0, 156.0))
            * ind(x, 73.0, 81.0)
        + f(x, 73.0, 81.0) * g(x, 67.0, 156.0) * g(x, 73.0, 156.0) * ind(x, 73.0, 81.0)
        + g(x, 67.0, 156.0) * g(x, 73.0, 156.0) * g(x, 81.0, 156.0) * ind_last(x, 81.0, 156.0)
}

pub fn b5(x: f64) -> f64 {
    f(x, 67.0, 73.0) * f(x, 67.0, 81.0) * f(x, 67.0, 156.0) * ind(x, 67.0, 73.0)
        + f(x, 67.0, 156.0)
            * (f(x, 67.0, 81.0) * g(x, 73.0, 81.0) + f(x, 73.0, 81.0) * g(x, 73.0, 156.0))
            * ind(x, 73.0, 81.0)
        + f(x, 73.0, 81.0) * f(x, 73.0, 156.0) * g(x, 73.0, 156.0) * ind(x, 73.0, 81.0)
        + g(x, 81.0, 156.0)
            * (f(x, 67.0, 156.0) * g(x, 73.0, 156.0) + f(x, 73.0, 156.0) * g(x, 73.0, 156.0))
            * ind_last(x, 81.0, 156.0)
        + f(x, 81.0, 156.0) * g(x, 73.0, 156.0) * g(x, 81.0, 156.0) * ind_last(x, 81.0, 156.0)
}

pub fn b6(x: f64) -> f64 {
    f(x, 73.0, 81.0) * f2(x, 73.0, 156.0) * ind(x, 73.0, 81.0)
        + f(x, 73.0, 156.0)
            * (f(x, 73.0, 156.0) * g(x, 81.0, 156.0) + f(x, 81.0, 156.0) * g(x, 81.0, 156.0))
            * ind_last(x, 81.0, 156.0)
        + f2(x, 81.0, 156.0) * g(x, 81.0, 156.0) * ind_last(x, 81.0, 156.0)
}

pub fn b7(x: f64) -> f64 {
    f3(x, 81.0, 156.0) * ind_last(x, 81.0, 156.0)
}

// ============================================================================
// QTp / QTc
// ============================================================================

/// Predicted QT in msec at `rate` bpm
pub fn qtp_msec(rate: f64, sex: Sex, age: Option<Age>) -> Result<Msec> {
    let sex_offset = match sex {
        Sex::Male => 0.0,
        Sex::Female => FEMALE_OFFSET,
        Sex::Unspecified => return Err(Error::ParameterRequired(Parameter::Sex)),
    };

    let (low, high) = RATE_DOMAIN;
    let x = rate.clamp(low, high);
    if x != rate {
        tracing::warn!(
            "Rabkin spline evaluated at {} bpm, outside its {}-{} bpm domain; using {} bpm",
            rate,
            low,
            high,
            x
        );
    }

    let basis = [b1(x), b2(x), b3(x), b4(x), b5(x), b6(x), b7(x)];
    let spline: f64 = SPLINE_COEFFICIENTS
        .iter()
        .zip(basis.iter())
        .map(|(beta, b)| beta * b)
        .sum();
    let age_term = age.map_or(0.0, |age| AGE_SLOPE * f64::from(age));

    Ok(INTERCEPT + spline + sex_offset + age_term)
}

/// Shift the measured QT by the gap between predicted QT at the measured
/// rate and at 60 bpm, for the same sex and age
pub fn qtc_msec(qt: Msec, rate: f64, sex: Sex, age: Option<Age>) -> Result<Msec> {
    let reference = qtp_msec(REFERENCE_RATE, sex, age)?;
    let predicted = qtp_msec(rate, sex, age)?;
    Ok(reference + (qt - predicted))
}

/// QTc equation strategy
#[derive(Clone, Copy, Debug, Default)]
pub struct RabkinQtc;

impl QtcEquation for RabkinQtc {
    fn qtc(&self, qt: Sec, rr: Sec, sex: Sex, age: Option<Age>) -> Result<Sec> {
        let qtc = qtc_msec(sec_to_msec(qt), sec_to_bpm(rr), sex, age)?;
        Ok(msec_to_sec(qtc))
    }
}

/// QTp equation strategy
#[derive(Clone, Copy, Debug, Default)]
pub struct RabkinQtp;

impl QtpEquation for RabkinQtp {
    fn qtp(&self, rr: Sec, sex: Sex, age: Option<Age>) -> Result<Sec> {
        Ok(msec_to_sec(qtp_msec(sec_to_bpm(rr), sex, age)?))
    }
}
