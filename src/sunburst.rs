//! Assembly of the complete sunburst data
//!
//! [`Sunburst`] runs all steps, from the classification to the rows that
//! are handed over to the renderer:
//!
//! 1. [`flatten`] the classification
//! 2. [`add_proportions`]
//! 3. for comparisons: [`proportion_difference`] and [`enrichment`]
//! 4. [`trim_root`]
use std::fmt::Display;
use std::str::FromStr;

use tracing::debug;

use crate::classes::{ChildrenMap, ClassAbundance, Names, ParentMap};
use crate::flatten::flatten;
use crate::proportion::{add_proportions, proportion_difference, BranchValues};
use crate::stats::{enrichment, EnrichmentTest, ReferenceKey, SignificantClasses};
use crate::table::{Row, SunburstTable};
use crate::trim::trim_root;
use crate::{f64_from_u64, SunburstError, SunburstResult};

/// The kind of sunburst
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SunburstKind {
    /// The proportion of every class in a single set
    #[default]
    Proportion,
    /// The enrichment of every class in a set compared to a reference set
    Comparison,
}

impl Display for SunburstKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SunburstKind::Proportion => write!(f, "proportion"),
            SunburstKind::Comparison => write!(f, "comparison"),
        }
    }
}

impl FromStr for SunburstKind {
    type Err = SunburstError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "proportion" => Ok(SunburstKind::Proportion),
            "comparison" => Ok(SunburstKind::Comparison),
            _ => Err(SunburstError::UnknownSunburstKind(s.to_string())),
        }
    }
}

/// Builder for the data of a sunburst
///
/// By default, a full [`SunburstKind::Proportion`] sunburst with
/// [`BranchValues::Total`] is built and the children of the root keep
/// the removed root as parent.
///
/// # Examples
///
/// ```
/// use ontosunburst::{ClassAbundance, ChildrenMap, EnrichmentTest, ParentMap, Sunburst, SunburstKind};
///
/// let abundance: ClassAbundance = [("root", 10), ("a", 6), ("b", 4)].into_iter().collect();
/// let reference: ClassAbundance = [("root", 100), ("a", 20), ("b", 80)].into_iter().collect();
/// let parents: ParentMap = [("a", vec!["root"]), ("b", vec!["root"])].into_iter().collect();
/// let children = ChildrenMap::new();
///
/// let sunburst = Sunburst::new(&abundance, &parents, &children, "root")
///     .reference(&reference)
///     .test(EnrichmentTest::Hypergeometric)
///     .reparent(true)
///     .build()
///     .unwrap();
///
/// assert_eq!(sunburst.kind(), SunburstKind::Comparison);
/// assert!(sunburst.significant().unwrap().contains("a"));
/// assert_eq!(sunburst.table().parents(), vec!["", ""]);
/// ```
#[must_use]
pub struct Sunburst<'a> {
    abundance: &'a ClassAbundance,
    parents: &'a ParentMap,
    children: &'a ChildrenMap,
    root: &'a str,
    names: Option<&'a Names>,
    full: bool,
    branch_values: BranchValues,
    reparent: bool,
    kind: SunburstKind,
    reference: Option<&'a ClassAbundance>,
    test: EnrichmentTest,
    key: ReferenceKey,
}

impl<'a> Sunburst<'a> {
    /// Constructs a new [`Sunburst`] builder for a classification
    pub fn new(
        abundance: &'a ClassAbundance,
        parents: &'a ParentMap,
        children: &'a ChildrenMap,
        root: &'a str,
    ) -> Self {
        Self {
            abundance,
            parents,
            children,
            root,
            names: None,
            full: true,
            branch_values: BranchValues::default(),
            reparent: false,
            kind: SunburstKind::default(),
            reference: None,
            test: EnrichmentTest::default(),
            key: ReferenceKey::default(),
        }
    }

    /// Labels the classes with their display names
    pub fn names(mut self, names: &'a Names) -> Self {
        self.names = Some(names);
        self
    }

    /// Duplicate classes below all their parents (`true`, default) or show
    /// every class only once (`false`)
    pub fn full(mut self, full: bool) -> Self {
        self.full = full;
        self
    }

    /// Sets the branch value convention
    pub fn branch_values(mut self, branch_values: BranchValues) -> Self {
        self.branch_values = branch_values;
        self
    }

    /// Turns the children of the root into roots of the sunburst
    pub fn reparent(mut self, reparent: bool) -> Self {
        self.reparent = reparent;
        self
    }

    /// Sets the kind of the sunburst
    ///
    /// [`SunburstKind::Comparison`] requires a [`Sunburst::reference`]
    pub fn kind(mut self, kind: SunburstKind) -> Self {
        self.kind = kind;
        self
    }

    /// Compares the classification to a reference classification
    ///
    /// This switches the kind to [`SunburstKind::Comparison`]
    pub fn reference(mut self, reference: &'a ClassAbundance) -> Self {
        self.reference = Some(reference);
        self.kind = SunburstKind::Comparison;
        self
    }

    /// Sets the statistical test of a comparison
    pub fn test(mut self, test: EnrichmentTest) -> Self {
        self.test = test;
        self
    }

    /// Sets whether the reference is keyed by class id or label
    pub fn reference_key(mut self, key: ReferenceKey) -> Self {
        self.key = key;
        self
    }

    /// Builds the sunburst data
    ///
    /// # Errors
    ///
    /// - [`SunburstError::MissingReference`] for a comparison without reference
    /// - any error of [`flatten`], [`add_proportions`] and [`enrichment`]
    pub fn build(&self) -> SunburstResult<SunburstData> {
        let mut table = flatten(
            self.abundance,
            self.parents,
            self.children,
            self.root,
            self.names,
            self.full,
        )?;
        add_proportions(&mut table, self.branch_values)?;

        let significant = match self.kind {
            SunburstKind::Proportion => None,
            SunburstKind::Comparison => {
                let reference = self.reference.ok_or(SunburstError::MissingReference)?;
                proportion_difference(&mut table, reference)?;
                Some(enrichment(&mut table, reference, self.test, self.key)?)
            }
        };

        trim_root(&mut table, self.reparent);
        debug!("Built {} sunburst with {} rows", self.kind, table.len());

        Ok(SunburstData {
            table,
            kind: self.kind,
            branch_values: self.branch_values,
            significant,
        })
    }
}

/// Everything a renderer needs to draw a sunburst
#[derive(Debug, Clone)]
pub struct SunburstData {
    table: SunburstTable,
    kind: SunburstKind,
    branch_values: BranchValues,
    significant: Option<SignificantClasses>,
}

impl SunburstData {
    /// The rows of the sunburst, without the root
    pub fn table(&self) -> &SunburstTable {
        &self.table
    }

    /// Consumes the data and returns the table
    pub fn into_table(self) -> SunburstTable {
        self.table
    }

    /// The kind of the sunburst
    pub fn kind(&self) -> SunburstKind {
        self.kind
    }

    /// The branch value convention the values are computed for
    pub fn branch_values(&self) -> BranchValues {
        self.branch_values
    }

    /// The significant classes of a comparison, sorted by p-value
    pub fn significant(&self) -> Option<&SignificantClasses> {
        self.significant.as_ref()
    }

    /// The value of the row's segment
    ///
    /// The relative proportion for [`BranchValues::Total`], the count otherwise.
    pub fn branch_value(&self, row: &Row) -> f64 {
        match self.branch_values {
            BranchValues::Total => row.relative_proportion().unwrap_or(row.proportion()),
            BranchValues::Remainder => f64_from_u64(row.count()),
        }
    }

    /// The segment values of all rows
    pub fn branch_value_column(&self) -> Vec<f64> {
        self.table.iter().map(|row| self.branch_value(row)).collect()
    }
}
