//! Measure-offset (anacrusis) arithmetic
//!
//! Weights are in units of the time signature's denominator, so a quarter
//! note in 4/4 weighs 1 and an eighth in 6/8 weighs 1. All arithmetic is
//! checked: a weight that does not fit is reported against its token.

use num_rational::Rational64;

use super::errors::RenderError;
use crate::models::{NoteToken, TuneElement};

/// Upper bound on numerator/denominator doublings when normalizing
const MAX_DOUBLINGS: u32 = 16;

/// Token types that end the measure being measured
const MEASURE_BOUNDARIES: &[&str] = &["bar", "line_end", "part_end", "repeat_end"];

/// Duration weight of a note of `length` (4 = quarter) with `dots` dots.
///
/// With `d` dots the weight is `denominator * (2^(d+1) - 1) / (length * 2^d)`.
/// Returns `None` when that does not fit in 64 bits.
pub fn note_weight(denominator: u32, length: u32, dots: u32) -> Option<Rational64> {
    if length == 0 {
        return None;
    }
    let scale = 2i64.checked_pow(dots)?;
    let numer = i64::from(denominator).checked_mul(scale.checked_mul(2)?.checked_sub(1)?)?;
    let denom = i64::from(length).checked_mul(scale)?;
    Some(Rational64::new(numer, denom))
}

fn checked_add(a: Rational64, b: Rational64) -> Option<Rational64> {
    let numer = a
        .numer()
        .checked_mul(*b.denom())?
        .checked_add(b.numer().checked_mul(*a.denom())?)?;
    let denom = a.denom().checked_mul(*b.denom())?;
    Some(Rational64::new(numer, denom))
}

/// Units in one counted measure. Compound meters count one beat group.
pub fn measure_count(time: (u32, u32)) -> u32 {
    let (numerator, _) = time;
    if numerator > 3 && numerator % 3 == 0 {
        3
    } else {
        numerator
    }
}

fn token_weight(token: &NoteToken, denominator: u32) -> Result<Option<Rational64>, RenderError> {
    let Some(length) = token.kwarg("length").or_else(|| token.arg(1)) else {
        return Ok(None);
    };
    let Some(length) = length.parse::<u32>().ok().filter(|&l| l > 0) else {
        return Ok(None);
    };
    note_weight(denominator, length, token.dot_count())
        .map(Some)
        .ok_or_else(|| RenderError::invalid_note(token, "duration weight out of range"))
}

/// Unfilled part of the measure before the first boundary, in denominator units
pub fn remainder(
    time: (u32, u32),
    elements: &[TuneElement],
) -> Result<Option<Rational64>, RenderError> {
    let (_, denominator) = time;
    let count = i64::from(measure_count(time));
    if denominator == 0 || count == 0 {
        return Ok(None);
    }

    let mut sum = Rational64::from_integer(0);
    let mut last = None;
    let mut bounded = false;
    for token in elements.iter().filter_map(TuneElement::as_note) {
        if MEASURE_BOUNDARIES.contains(&token.note_type.as_str()) {
            bounded = true;
            break;
        }
        if !token.is_note() {
            continue;
        }
        if let Some(weight) = token_weight(token, denominator)? {
            sum = checked_add(sum, weight)
                .ok_or_else(|| RenderError::invalid_note(token, "measure length out of range"))?;
            last = Some(token);
        }
    }
    if !bounded {
        return Ok(None);
    }

    // (count - sum) mod count, on the common denominator
    let (numer, denom) = (*sum.numer(), *sum.denom());
    let Some(span) = count.checked_mul(denom) else {
        let token = last.cloned().unwrap_or_else(|| NoteToken::new("note"));
        return Err(RenderError::invalid_note(&token, "measure length out of range"));
    };
    let filled = numer.rem_euclid(span);
    if filled == 0 {
        return Ok(Some(Rational64::from_integer(0)));
    }
    Ok(Some(Rational64::new(span - filled, denom)))
}

/// `(numerator, denominator)` of the offset with an integer numerator
pub fn normalize(remaining: Rational64, denominator: u32) -> Option<(i64, i64)> {
    let (numer, denom) = (*remaining.numer(), *remaining.denom());
    let denominator = i64::from(denominator);
    let power_of_two = denom > 0 && denom & (denom - 1) == 0;
    if power_of_two && denom.trailing_zeros() <= MAX_DOUBLINGS {
        return Some((numer, denominator.checked_mul(denom)?));
    }
    let exact = Rational64::new(numer, denom.checked_mul(denominator)?);
    Some((*exact.numer(), *exact.denom()))
}

pub fn offset_command(numerator: i64, denominator: i64) -> String {
    format!(
        "\\set Timing.measurePosition = #(ly:make-moment {}/{})",
        numerator, denominator
    )
}

/// Offset command for the section starting at `elements`, if it is partial
pub fn pending_offset(
    time: (u32, u32),
    elements: &[TuneElement],
) -> Result<Option<String>, RenderError> {
    let Some(remaining) = remainder(time, elements)? else {
        return Ok(None);
    };
    if remaining == Rational64::from_integer(0) {
        return Ok(None);
    }
    match normalize(remaining, time.1) {
        Some((numerator, denominator)) => Ok(Some(offset_command(numerator, denominator))),
        None => {
            log::warn!("Measure offset {} does not fit, skipping", remaining);
            Ok(None)
        }
    }
}
