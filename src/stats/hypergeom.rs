//! One-sided hypergeometric test
use statrs::distribution::{DiscreteCDF, Hypergeometric};

use crate::SunburstResult;

/// Calculates the probability to draw `observed` or more successes
///
/// The distribution has a `population` (N) containing `successes` (K)
/// from which `draws` (n) items are drawn.
///
/// # Errors
///
/// [`crate::SunburstError::Statistics`] if `successes` or `draws`
/// are larger than the `population`
pub fn survival(observed: u64, population: u64, successes: u64, draws: u64) -> SunburstResult<f64> {
    let hyper = Hypergeometric::new(population, successes, draws)?;
    if observed == 0 {
        return Ok(1.0);
    }
    // subtracting 1, because we want to test including `observed`
    // e.g. "7 or more", but sf by default calculates "more than 7"
    Ok(hyper.sf(observed - 1))
}
