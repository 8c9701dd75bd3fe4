//! Enrichment analysis of a classification against a reference set
//!
//! Every class of the sample is tested for over- or under-representation
//! compared to the same class in the reference set. The test result is
//! stored in each row as signed `log10(p-value)`: positive values mark
//! over-represented classes, negative values under-represented ones.
//!
//! Two tests are available, see [`EnrichmentTest`].
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use tracing::debug;

use crate::classes::ClassAbundance;
use crate::proportion::checked_max;
use crate::table::{Row, SunburstTable};
use crate::{f64_from_u64, f64_from_usize, SunburstError, SunburstResult};

pub mod binomial;
pub mod hypergeom;

/// Significance level before the Bonferroni correction
const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Significant p-values are reported with this number of decimals
const PVALUE_DECIMALS: i32 = 10;

/// The statistical test of the enrichment analysis
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentTest {
    /// Two-sided exact binomial test of the sample count, with the
    /// reference proportion as success probability
    #[default]
    Binomial,
    /// One-sided hypergeometric test, drawing the sample from the reference
    Hypergeometric,
}

impl EnrichmentTest {
    /// Calculates the p-value of observing `observed` of `draws` items in a class
    /// that contains `successes` of the `population` items in the reference
    ///
    /// # Errors
    ///
    /// [`SunburstError::Statistics`] if the parameters do not describe a valid distribution
    pub fn pvalue(
        &self,
        observed: u64,
        draws: u64,
        successes: u64,
        population: u64,
    ) -> SunburstResult<f64> {
        match self {
            EnrichmentTest::Binomial => binomial::two_sided(
                observed,
                draws,
                f64_from_u64(successes) / f64_from_u64(population),
            ),
            EnrichmentTest::Hypergeometric => {
                hypergeom::survival(observed, population, successes, draws)
            }
        }
    }
}

impl Display for EnrichmentTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrichmentTest::Binomial => write!(f, "Binomial"),
            EnrichmentTest::Hypergeometric => write!(f, "Hypergeometric"),
        }
    }
}

impl FromStr for EnrichmentTest {
    type Err = SunburstError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "binomial" => Ok(EnrichmentTest::Binomial),
            "hypergeometric" => Ok(EnrichmentTest::Hypergeometric),
            _ => Err(SunburstError::UnknownTest(s.to_string())),
        }
    }
}

/// The key used to find the reference count of a row
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKey {
    /// The reference is keyed by class id
    Id,
    /// The reference is keyed by the label of the class
    #[default]
    Label,
}

impl ReferenceKey {
    fn key<'a>(&self, row: &'a Row) -> &'a str {
        match self {
            ReferenceKey::Id => row.id(),
            ReferenceKey::Label => row.label(),
        }
    }
}

/// Significantly enriched or depleted classes and their p-value
///
/// Each label appears once. The classes are sorted by ascending p-value
/// once returned from [`enrichment`].
#[derive(Debug, Default, Clone)]
pub struct SignificantClasses {
    classes: Vec<(String, f64)>,
    index: HashMap<String, usize>,
}

impl SignificantClasses {
    /// Constructs a new, empty [`SignificantClasses`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class or replaces the p-value of a class that is already present
    pub fn insert<S: Into<String>>(&mut self, label: S, pvalue: f64) {
        let label = label.into();
        match self.index.get(&label) {
            Some(idx) => self.classes[*idx].1 = pvalue,
            None => {
                self.index.insert(label.clone(), self.classes.len());
                self.classes.push((label, pvalue));
            }
        }
    }

    /// Returns the p-value of a class, if it is significant
    pub fn get(&self, label: &str) -> Option<f64> {
        self.index.get(label).map(|idx| self.classes[*idx].1)
    }

    /// Returns `true` if the class is significant
    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Returns the number of significant classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if no class is significant
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Returns an iterator of labels and p-values
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.classes
            .iter()
            .map(|(label, pvalue)| (label.as_str(), *pvalue))
    }

    /// Sorts the classes by ascending p-value, keeping the insertion order of ties
    fn sort(&mut self) {
        self.classes.sort_by(|a, b| a.1.total_cmp(&b.1));
        for (idx, (label, _)) in self.classes.iter().enumerate() {
            self.index.insert(label.clone(), idx);
        }
    }
}

/// Tests every row of `table` for enrichment in comparison to `reference`
///
/// The total number of items is the largest count of the table (sample)
/// and of the `reference`, respectively. The reference count of a row is
/// looked up by its id or label, depending on `key`, and is 0 if the class
/// is missing from the reference.
///
/// The signed `log10(p-value)` is added to each row. A class is significant
/// if its p-value is below `0.05 / n`, `n` being the number of distinct
/// row ids (Bonferroni correction).
///
/// # Errors
///
/// - [`SunburstError::EmptyTable`] if the table has no rows
/// - [`SunburstError::NoObservations`] if all counts of the table or the reference are 0
/// - [`SunburstError::Statistics`] if the sample does not fit the reference,
///   e.g. for a hypergeometric test with more sample than reference items
///
/// # Examples
///
/// ```
/// use ontosunburst::{enrichment, ClassAbundance, EnrichmentTest, ReferenceKey, Row, SunburstTable};
///
/// let mut table: SunburstTable = [
///     Row::new("root", "root", "", 10),
///     Row::new("a", "a", "root", 6),
///     Row::new("b", "b", "root", 4),
/// ]
/// .into_iter()
/// .collect();
///
/// let reference: ClassAbundance = [("root", 100), ("a", 20), ("b", 80)].into_iter().collect();
///
/// let significant = enrichment(
///     &mut table,
///     &reference,
///     EnrichmentTest::Binomial,
///     ReferenceKey::Label
/// ).unwrap();
///
/// // `a` is over-represented, `b` is under-represented
/// assert!(table.get("a").unwrap().log_pvalue().unwrap() > 0.0);
/// assert!(table.get("b").unwrap().log_pvalue().unwrap() < 0.0);
/// assert_eq!(significant.len(), 2);
/// assert!(!significant.contains("root"));
/// ```
pub fn enrichment(
    table: &mut SunburstTable,
    reference: &ClassAbundance,
    test: EnrichmentTest,
    key: ReferenceKey,
) -> SunburstResult<SignificantClasses> {
    let draws = checked_max(table)?;
    let population = match reference.max() {
        Some(max) if max > 0 => max,
        _ => return Err(SunburstError::NoObservations),
    };
    let threshold = SIGNIFICANCE_LEVEL / f64_from_usize(table.distinct_ids());

    let mut significant = SignificantClasses::new();
    for row in table.iter_mut() {
        let observed = row.count();
        let successes = reference.get(key.key(row)).unwrap_or_default();
        let pvalue = test.pvalue(observed, draws, successes, population)?;
        debug!(
            "{} test of {}\tPopulation: {}, Successes: {}, Draws: {}, Observed: {}, p-value: {}",
            test,
            row.id(),
            population,
            successes,
            draws,
            observed,
            pvalue
        );

        let over_represented = f64_from_u64(observed) / f64_from_u64(draws)
            > f64_from_u64(successes) / f64_from_u64(population);
        if over_represented {
            row.set_log_pvalue(-pvalue.log10());
        } else {
            row.set_log_pvalue(pvalue.log10());
        }

        if pvalue < threshold {
            significant.insert(row.label(), round(pvalue));
        }
    }
    significant.sort();
    Ok(significant)
}

fn round(pvalue: f64) -> f64 {
    let factor = 10f64.powi(PVALUE_DECIMALS);
    (pvalue * factor).round() / factor
}
