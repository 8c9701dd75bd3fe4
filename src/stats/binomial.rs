//! Exact binomial test
use statrs::distribution::{Binomial, Discrete, DiscreteCDF};

use crate::{f64_from_u64, SunburstResult};

/// Outcomes are considered as likely as the observed one within this relative tolerance
const RELATIVE_TOLERANCE: f64 = 1.0 + 1e-7;

/// Calculates the two-sided p-value of observing `successes` in `trials`
/// with a success `probability`
///
/// The p-value is the sum of the probabilities of all outcomes that are
/// at most as likely as the observed one.
///
/// The tail of the observed outcome is taken from the cumulative distribution.
/// The probability mass function is monotonic on the opposite side of the
/// mean, so the boundary of the opposite tail is found by bisection.
///
/// # Errors
///
/// [`crate::SunburstError::Statistics`] if `probability` is not within `[0, 1]`
#[allow(clippy::float_cmp)]
pub fn two_sided(successes: u64, trials: u64, probability: f64) -> SunburstResult<f64> {
    let binomial = Binomial::new(probability, trials)?;
    let expected = probability * f64_from_u64(trials);
    let observed = f64_from_u64(successes);

    if observed == expected {
        return Ok(1.0);
    }

    let threshold = binomial.pmf(successes) * RELATIVE_TOLERANCE;
    let less_likely = |x: u64| binomial.pmf(x) <= threshold;

    let pvalue = if observed < expected {
        // decreasing from the mean to `trials`
        let upper = match first_match(u64_from_f64(expected.ceil()), trials, less_likely) {
            // `expected` > 0, so the boundary is at least 1
            Some(boundary) => binomial.sf(boundary - 1),
            None => 0.0,
        };
        binomial.cdf(successes) + upper
    } else {
        // increasing from 0 to the mean
        let lower = match last_match(0, u64_from_f64(expected.floor()), less_likely) {
            Some(boundary) => binomial.cdf(boundary),
            None => 0.0,
        };
        // `successes` > `expected` >= 0
        binomial.sf(successes - 1) + lower
    };
    Ok(pvalue.min(1.0))
}

/// Returns the first `x` in `lo..=hi` for which `pred` holds,
/// given that `pred` never switches back from `true` to `false`
fn first_match(mut lo: u64, mut hi: u64, pred: impl Fn(u64) -> bool) -> Option<u64> {
    if lo > hi || !pred(hi) {
        return None;
    }
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid) {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    Some(lo)
}

/// Returns the last `x` in `lo..=hi` for which `pred` holds,
/// given that `pred` never switches back from `false` to `true`
fn last_match(mut lo: u64, mut hi: u64, pred: impl Fn(u64) -> bool) -> Option<u64> {
    if lo > hi || !pred(lo) {
        return None;
    }
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if pred(mid) {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    Some(lo)
}

/// `value` is always a non-negative whole number below the number of trials
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn u64_from_f64(value: f64) -> u64 {
    value as u64
}
