//! Conversions between seconds, milliseconds and beats per minute.
//!
//! All conversions follow IEEE-754 semantics: a zero interval or rate yields
//! `inf`, and NaN propagates. Callers that may feed degenerate values should
//! check `is_finite()` on the result.

pub fn sec_to_msec(sec: f64) -> f64 {
    sec * 1000.0
}

pub fn msec_to_sec(msec: f64) -> f64 {
    msec / 1000.0
}

pub fn bpm_to_sec(bpm: f64) -> f64 {
    60.0 / bpm
}

pub fn sec_to_bpm(sec: f64) -> f64 {
    60.0 / sec
}

pub fn bpm_to_msec(bpm: f64) -> f64 {
    60_000.0 / bpm
}

pub fn msec_to_bpm(msec: f64) -> f64 {
    60_000.0 / msec
}
