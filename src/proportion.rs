//! Proportions and branch values of the sunburst rows
//!
//! Every row gets a [`Row::proportion`](crate::Row::proportion), its count relative to the
//! largest count of the table. It is used to color the sunburst.
//!
//! With [`BranchValues::Total`] the renderer expects that the value of a parent is at
//! least the sum of the values of its children. Because classes are duplicated below
//! all their parents, the counts of the children of a row can exceed the count of the
//! row itself. The relative proportion distributes the value of every parent among
//! its children instead.
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::classes::ClassAbundance;
use crate::table::SunburstTable;
use crate::{f64_from_u64, SunburstError, SunburstResult};

/// The value distributed among the roots of the sunburst
const ROOT_BRANCH_VALUE: f64 = 1_000_000.0;

/// Relation between the value of a parent and the values of its children
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BranchValues {
    /// The value of a parent is the total of its branch, its children are
    /// drawn proportionally to the parent.
    #[default]
    Total,
    /// The value of a parent is added to the values of its children
    Remainder,
}

impl BranchValues {
    /// Returns `true` for [`BranchValues::Total`]
    pub fn is_total(&self) -> bool {
        matches!(self, BranchValues::Total)
    }
}

impl Display for BranchValues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BranchValues::Total => write!(f, "total"),
            BranchValues::Remainder => write!(f, "remainder"),
        }
    }
}

impl FromStr for BranchValues {
    type Err = SunburstError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "total" => Ok(BranchValues::Total),
            "remainder" => Ok(BranchValues::Remainder),
            _ => Err(SunburstError::UnknownBranchValues(s.to_string())),
        }
    }
}

/// Adds the proportion, and for [`BranchValues::Total`] the relative proportion, to all rows
///
/// The proportion is `count / max_count`. The relative proportion of the
/// roots is their share of `1 000 000`; every child gets the truncated share
/// of its parent's relative proportion, based on the counts of all children
/// of the parent (or the parent's own count, if that is larger).
///
/// # Note
///
/// Truncation can leave deep rows with a relative proportion below 1. These
/// are repaired on a best-effort basis by propagating the values once more,
/// starting at the parents of the affected rows. The relative proportions of
/// the children of a row are not guaranteed to add up to the row's value.
///
/// Rows whose parent has no row of its own, such as a class duplicated below
/// an unclassified parent, keep their proportion as relative proportion and
/// render as near-zero segments.
///
/// # Errors
///
/// - [`SunburstError::EmptyTable`] if the table has no rows
/// - [`SunburstError::NoObservations`] if all counts are 0
///
/// # Examples
///
/// ```
/// use ontosunburst::{add_proportions, BranchValues, Row, SunburstTable};
///
/// let mut table: SunburstTable = [
///     Row::new("root", "root", "", 10),
///     Row::new("a", "a", "root", 6),
///     Row::new("b", "b", "root", 4),
/// ]
/// .into_iter()
/// .collect();
///
/// add_proportions(&mut table, BranchValues::Total).unwrap();
///
/// assert!((table.get("a").unwrap().proportion() - 0.6).abs() < f64::EPSILON);
/// assert_eq!(table.get("root").unwrap().relative_proportion(), Some(1_000_000.0));
/// assert_eq!(table.get("a").unwrap().relative_proportion(), Some(600_000.0));
/// ```
pub fn add_proportions(table: &mut SunburstTable, branch_values: BranchValues) -> SunburstResult<()> {
    let max_count = checked_max(table)?;
    let total = f64_from_u64(max_count);

    for row in table.iter_mut() {
        let proportion = f64_from_u64(row.count()) / total;
        row.set_proportion(proportion);
        row.set_relative_proportion(branch_values.is_total().then_some(proportion));
    }

    if branch_values.is_total() {
        let propagation = Propagation::new(table, max_count);
        propagation.run(table, "");
        propagation.repair(table);
    }
    Ok(())
}

/// Adds the difference between the proportion of each row and the proportion of
/// the same class in a reference set
///
/// The reference is looked up by the label of the row. Classes missing from
/// the reference have a reference proportion of 0.
///
/// # Errors
///
/// - [`SunburstError::EmptyTable`] if the table has no rows
/// - [`SunburstError::NoObservations`] if all counts of the table or the reference are 0
pub fn proportion_difference(
    table: &mut SunburstTable,
    reference: &ClassAbundance,
) -> SunburstResult<()> {
    let total = f64_from_u64(checked_max(table)?);
    let reference_total = match reference.max() {
        Some(max) if max > 0 => f64_from_u64(max),
        _ => return Err(SunburstError::NoObservations),
    };

    for row in table.iter_mut() {
        let reference_count = reference.get(row.label()).unwrap_or_default();
        let difference =
            f64_from_u64(row.count()) / total - f64_from_u64(reference_count) / reference_total;
        row.set_proportion_difference(difference);
    }
    Ok(())
}

/// Returns the largest count of the table, ensuring that it can be used as divisor
pub(crate) fn checked_max(table: &SunburstTable) -> SunburstResult<u64> {
    match table.max_count() {
        None => Err(SunburstError::EmptyTable),
        Some(0) => Err(SunburstError::NoObservations),
        Some(max) => Ok(max),
    }
}

/// Top-down distribution of the relative proportions
///
/// The rows are addressed by their position in the table; the structure
/// of the table does not change during the propagation.
struct Propagation {
    /// Positions of the children of every parent id
    children: HashMap<String, Vec<usize>>,
    max_count: u64,
}

impl Propagation {
    fn new(table: &SunburstTable, max_count: u64) -> Self {
        let mut children: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, row) in table.iter().enumerate() {
            children.entry(row.parent().to_string()).or_default().push(idx);
        }
        Self {
            children,
            max_count,
        }
    }

    /// Distributes the relative proportion of `parent` among its children, recursively
    ///
    /// An empty `parent` stands for the virtual parent of all roots.
    fn run(&self, table: &mut SunburstTable, parent: &str) {
        let (parent_value, parent_count) = if parent.is_empty() {
            (ROOT_BRANCH_VALUE, self.max_count)
        } else {
            match table.index_of(parent) {
                Some(idx) => {
                    let row = &table.rows()[idx];
                    (
                        row.relative_proportion().unwrap_or(row.proportion()),
                        row.count(),
                    )
                }
                None => {
                    trace!("No row for parent {}", parent);
                    return;
                }
            }
        };
        let children = match self.children.get(parent) {
            Some(children) => children,
            None => return,
        };

        let children_count: u64 = children.iter().map(|idx| table.rows()[*idx].count()).sum();
        let total = f64_from_u64(parent_count.max(children_count));

        for idx in children {
            let row = table.row_mut(*idx);
            let value = if total > 0.0 {
                ((f64_from_u64(row.count()) / total) * parent_value).trunc()
            } else {
                0.0
            };
            row.set_relative_proportion(Some(value));
        }

        for idx in children {
            let child = table.rows()[*idx].id().to_string();
            // an empty id would restart the propagation at the virtual root
            if !child.is_empty() && self.children.contains_key(&child) {
                self.run(table, &child);
            }
        }
    }

    /// Propagates the values once more from the parents of all rows whose
    /// relative proportion dropped below 1
    fn repair(&self, table: &mut SunburstTable) {
        let mut seen = HashSet::new();
        let parents: Vec<String> = table
            .iter()
            .filter(|row| row.relative_proportion().is_some_and(|value| value < 1.0))
            .map(|row| row.parent().to_string())
            .filter(|parent| seen.insert(parent.clone()))
            .collect();

        if parents.is_empty() {
            return;
        }
        debug!("Repairing branch values below {} parents", parents.len());
        for parent in &parents {
            self.run(table, parent);
        }

        let remaining = table
            .iter()
            .filter(|row| row.relative_proportion().is_some_and(|value| value < 1.0))
            .count();
        debug!("{} rows with a branch value below 1 after repair", remaining);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::table::Row;

    fn simple() -> SunburstTable {
        [
            Row::new("root", "root", "", 10),
            Row::new("a", "a", "root", 6),
            Row::new("b", "b", "root", 4),
        ]
        .into_iter()
        .collect()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{a} != {b}");
    }

    #[test]
    fn proportions() {
        let mut table = simple();
        add_proportions(&mut table, BranchValues::Remainder).unwrap();

        let proportions: Vec<f64> = table.iter().map(Row::proportion).collect();
        assert_close(proportions[0], 1.0);
        assert_close(proportions[1], 0.6);
        assert_close(proportions[2], 0.4);
        assert!(table.iter().all(|row| row.relative_proportion().is_none()));
    }

    #[test]
    fn proportion_bounds() {
        let mut table = simple();
        table.push(Row::new("c", "c", "a", 1));
        add_proportions(&mut table, BranchValues::Total).unwrap();

        assert!(table
            .iter()
            .all(|row| row.proportion() > 0.0 && row.proportion() <= 1.0));
        assert_eq!(
            table.iter().filter(|row| row.proportion() == 1.0).count(),
            1
        );
    }

    #[test]
    fn relative_proportions() {
        let mut table: SunburstTable = [
            Row::new("root", "root", "", 10),
            Row::new("a", "a", "root", 5),
            Row::new("b", "b", "root", 5),
            Row::new("c", "c", "a", 4),
            Row::new("d", "d", "a", 1),
        ]
        .into_iter()
        .collect();
        add_proportions(&mut table, BranchValues::Total).unwrap();

        let relative = |id: &str| table.get(id).unwrap().relative_proportion().unwrap();
        assert_close(relative("root"), 1_000_000.0);
        assert_close(relative("a"), 500_000.0);
        assert_close(relative("b"), 500_000.0);
        assert_close(relative("c"), 400_000.0);
        assert_close(relative("d"), 100_000.0);
    }

    #[test]
    fn duplicated_children_exceed_parent() {
        // children sum to 5 while the parent count is 4
        let mut table: SunburstTable = [
            Row::new("root", "root", "", 4),
            Row::new("x", "x", "root", 3),
            Row::new("y", "y", "root", 2),
        ]
        .into_iter()
        .collect();
        add_proportions(&mut table, BranchValues::Total).unwrap();

        let relative = |id: &str| table.get(id).unwrap().relative_proportion().unwrap();
        assert_close(relative("x"), 600_000.0);
        assert_close(relative("y"), 400_000.0);
        assert!(relative("x") + relative("y") <= relative("root"));
    }

    #[test]
    fn values_are_truncated() {
        let mut table: SunburstTable = [
            Row::new("root", "root", "", 3),
            Row::new("a", "a", "root", 1),
            Row::new("b", "b", "root", 2),
        ]
        .into_iter()
        .collect();
        add_proportions(&mut table, BranchValues::Total).unwrap();

        let relative = |id: &str| table.get(id).unwrap().relative_proportion().unwrap();
        assert_close(relative("a"), 333_333.0);
        assert_close(relative("b"), 666_666.0);
    }

    #[test]
    fn children_never_exceed_parent() {
        let mut table: SunburstTable = [
            Row::new("root", "root", "", 7),
            Row::new("a", "a", "root", 5),
            Row::new("b", "b", "root", 3),
            Row::new("c", "c", "a", 4),
            Row::new("d", "d", "a", 3),
            Row::new("e", "e", "c", 1),
            Row::new("f", "f", "c", 2),
        ]
        .into_iter()
        .collect();
        add_proportions(&mut table, BranchValues::Total).unwrap();

        for parent in table.iter() {
            let children: f64 = table
                .children(parent.id())
                .map(|row| row.relative_proportion().unwrap())
                .sum();
            assert!(children <= parent.relative_proportion().unwrap());
        }
    }

    #[test]
    fn dangling_parents_keep_their_proportion() {
        let mut table = simple();
        table.push(Row::new("orphan", "orphan", "missing", 5));
        add_proportions(&mut table, BranchValues::Total).unwrap();

        let orphan = table.get("orphan").unwrap();
        assert_close(orphan.relative_proportion().unwrap(), 0.5);
    }

    #[test]
    fn repair_reseeds_from_parents() {
        let mut table: SunburstTable = [
            Row::new("root", "root", "", 2_000_000),
            Row::new("a", "a", "root", 1),
        ]
        .into_iter()
        .collect();
        add_proportions(&mut table, BranchValues::Total).unwrap();

        // a gets trunc(0.5) == 0 and the repair pass cannot lift it
        assert_close(table.get("a").unwrap().relative_proportion().unwrap(), 0.0);
        assert_close(
            table.get("root").unwrap().relative_proportion().unwrap(),
            1_000_000.0,
        );
    }

    #[test]
    fn repair_propagates_below_dangling_parents() {
        let mut table: SunburstTable = [
            Row::new("root", "root", "", 10),
            Row::new("x", "x", "missing", 4),
            Row::new("y", "y", "x", 2),
        ]
        .into_iter()
        .collect();
        add_proportions(&mut table, BranchValues::Total).unwrap();

        // x keeps its proportion, y gets trunc(2 / 4 * 0.4) in the second pass
        let relative = |id: &str| table.get(id).unwrap().relative_proportion().unwrap();
        assert_close(relative("root"), 1_000_000.0);
        assert_close(relative("x"), 0.4);
        assert_close(relative("y"), 0.0);
    }

    #[test]
    fn empty_id_below_root() {
        let mut table: SunburstTable = [
            Row::new("root", "root", "", 10),
            Row::new("", "", "root", 4),
        ]
        .into_iter()
        .collect();
        add_proportions(&mut table, BranchValues::Total).unwrap();

        let rows = table.rows();
        assert_close(rows[0].relative_proportion().unwrap(), 1_000_000.0);
        assert_close(rows[1].relative_proportion().unwrap(), 400_000.0);
    }

    #[test]
    fn empty_and_zero_tables() {
        let mut table = SunburstTable::new();
        assert!(matches!(
            add_proportions(&mut table, BranchValues::Total),
            Err(SunburstError::EmptyTable)
        ));

        let mut table: SunburstTable = [Row::new("root", "root", "", 0)].into_iter().collect();
        assert!(matches!(
            add_proportions(&mut table, BranchValues::Remainder),
            Err(SunburstError::NoObservations)
        ));
    }

    #[test]
    fn difference_to_reference() {
        let mut table = simple();
        let reference: ClassAbundance =
            [("root", 100), ("a", 30), ("b", 40)].into_iter().collect();
        proportion_difference(&mut table, &reference).unwrap();

        let difference = |id: &str| table.get(id).unwrap().proportion_difference().unwrap();
        assert_close(difference("root"), 0.0);
        assert_close(difference("a"), 0.3);
        assert_close(difference("b"), 0.0);
    }

    #[test]
    fn difference_to_empty_reference() {
        let mut table = simple();
        assert!(matches!(
            proportion_difference(&mut table, &ClassAbundance::new()),
            Err(SunburstError::NoObservations)
        ));
    }

    #[test]
    fn parse_branch_values() {
        assert_eq!("total".parse::<BranchValues>().unwrap(), BranchValues::Total);
        assert_eq!(
            "Remainder".parse::<BranchValues>().unwrap(),
            BranchValues::Remainder
        );
        assert!("sum".parse::<BranchValues>().is_err());
        assert_eq!(BranchValues::Remainder.to_string(), "remainder");
    }
}
