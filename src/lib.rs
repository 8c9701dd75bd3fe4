//! Sunburst data for ontology classifications
//!
//! `ontosunburst` turns the classification of a set of biological objects
//! (metabolites, enzymes, ChEBI roles, GO terms...) into the flat table that a
//! sunburst renderer needs, and optionally compares the classification against
//! a reference set with an enrichment analysis.
//!
//! The input is a [`ClassAbundance`] (how many objects belong to each class),
//! a [`ParentMap`] and a [`ChildrenMap`] describing the ontology. Classes with
//! more than one parent are duplicated below every parent, so that the
//! directed acyclic graph of the ontology becomes a forest.
//!
//! # Examples
//!
//! ```
//! use ontosunburst::{BranchValues, ClassAbundance, ParentMap, ChildrenMap, Sunburst};
//!
//! let abundance: ClassAbundance = [("root", 10), ("a", 6), ("b", 4)].into_iter().collect();
//!
//! let mut parents = ParentMap::new();
//! parents.add("a", "root");
//! parents.add("b", "root");
//! let children = ChildrenMap::new();
//!
//! let sunburst = Sunburst::new(&abundance, &parents, &children, "root")
//!     .branch_values(BranchValues::Remainder)
//!     .build()
//!     .unwrap();
//!
//! // the root is cut before rendering
//! assert_eq!(sunburst.table().len(), 2);
//!
//! let a = sunburst.table().get("a").unwrap();
//! assert_eq!(a.parent(), "root");
//! assert!((a.proportion() - 0.6).abs() < f64::EPSILON);
//! ```
use thiserror::Error;

pub mod classes;
pub mod flatten;
pub mod proportion;
pub mod stats;
pub mod sunburst;
pub mod table;
pub mod trim;

pub use classes::{ChildrenMap, ClassAbundance, Names, ParentMap, Relations};
pub use flatten::flatten;
pub use proportion::{add_proportions, proportion_difference, BranchValues};
pub use stats::{enrichment, EnrichmentTest, ReferenceKey, SignificantClasses};
pub use sunburst::{Sunburst, SunburstData, SunburstKind};
pub use table::{Row, SunburstTable};
pub use trim::trim_root;

/// Separator between a class id and the ancestor it was duplicated under
pub const DUPLICATE_SEPARATOR: &str = "__";

/// Main Error type for this crate
#[derive(Error, Debug)]
pub enum SunburstError {
    /// The statistical test is not known
    #[error("test parameter must be in : [Binomial, Hypergeometric], got {0}")]
    UnknownTest(String),
    /// The kind of sunburst is not known
    #[error("sunburst kind must be in : [proportion, comparison], got {0}")]
    UnknownSunburstKind(String),
    /// The branch value convention is not known
    #[error("branch values must be in : [total, remainder], got {0}")]
    UnknownBranchValues(String),
    /// The table does not contain any rows
    #[error("the table does not contain any class")]
    EmptyTable,
    /// All counts are zero, so no proportion can be derived
    #[error("no objects are classified, the total count is 0")]
    NoObservations,
    /// A class has an empty id, which is reserved for "no parent"
    #[error("class ids must not be empty")]
    EmptyClassId,
    /// A class other than the root has no parent
    #[error("class {0} has no parent")]
    MissingParents(String),
    /// A comparison was requested without a reference set
    #[error("a comparison requires a reference class abundance")]
    MissingReference,
    /// The parameters of a statistical distribution are invalid
    #[error("invalid distribution parameters: {0}")]
    Statistics(String),
}

impl From<statrs::StatsError> for SunburstError {
    fn from(err: statrs::StatsError) -> Self {
        SunburstError::Statistics(err.to_string())
    }
}

/// Shortcut for `Result<T, SunburstError>`
pub type SunburstResult<T> = Result<T, SunburstError>;

/// Counts are integers but most calculations happen in floating point
#[allow(clippy::cast_precision_loss)]
pub(crate) fn f64_from_u64(n: u64) -> f64 {
    n as f64
}

/// Same as [`f64_from_u64`], for lengths of collections
#[allow(clippy::cast_precision_loss)]
pub(crate) fn f64_from_usize(n: usize) -> f64 {
    n as f64
}
