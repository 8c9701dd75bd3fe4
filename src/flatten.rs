//! Flattening of the classification graph into sunburst rows
//!
//! Ontologies are directed acyclic graphs: a class can have several parents.
//! A sunburst can only show trees, so every class with more than one parent
//! is duplicated below each of its parents, together with its whole subtree.
use tracing::{debug, trace};

use crate::classes::{ChildrenMap, ClassAbundance, Names, ParentMap};
use crate::table::{Row, SunburstTable};
use crate::{SunburstError, SunburstResult, DUPLICATE_SEPARATOR};

/// Builds the [`SunburstTable`] of a classification
///
/// Every class of `abundance` is added as a row below its first parent.
/// `root` is added without parent.
///
/// If `full` is `true`, a class with more than one parent is added once more
/// for every additional parent `p`, with the id `<class>__<p>`. All descendants
/// of the class (according to `children`) are duplicated below it as well,
/// each level appending `__<ancestor>` to the ids. Descendants missing from
/// `abundance` are skipped along with their subtree.
///
/// If `full` is `false`, only the first parent of each class is used and
/// every class appears exactly once.
///
/// Labels are taken from `names`, falling back to the class id.
///
/// # Errors
///
/// - [`SunburstError::EmptyClassId`] if a class id is empty
/// - [`SunburstError::MissingParents`] if a class other than `root` has no parents
///
/// # Examples
///
/// ```
/// use ontosunburst::{flatten, ClassAbundance, ParentMap, ChildrenMap};
///
/// let abundance: ClassAbundance = [("root", 5), ("a", 3), ("b", 2), ("c", 2)]
///     .into_iter()
///     .collect();
///
/// let parents: ParentMap = [
///     ("a", vec!["root"]),
///     ("b", vec!["root"]),
///     ("c", vec!["a", "b"]),
/// ]
/// .into_iter()
/// .collect();
///
/// let children: ChildrenMap = [
///     ("root", vec!["a", "b"]),
///     ("a", vec!["c"]),
///     ("b", vec!["c"]),
/// ]
/// .into_iter()
/// .collect();
///
/// let full = flatten(&abundance, &parents, &children, "root", None, true).unwrap();
/// assert_eq!(full.ids(), vec!["root", "a", "b", "c", "c__b"]);
/// assert_eq!(full.get("c__b").unwrap().parent(), "b");
///
/// let reduced = flatten(&abundance, &parents, &children, "root", None, false).unwrap();
/// assert_eq!(reduced.ids(), vec!["root", "a", "b", "c"]);
/// ```
pub fn flatten(
    abundance: &ClassAbundance,
    parents: &ParentMap,
    children: &ChildrenMap,
    root: &str,
    names: Option<&Names>,
    full: bool,
) -> SunburstResult<SunburstTable> {
    let flattener = Flattener {
        abundance,
        children,
        names,
    };
    let mut table = SunburstTable::with_capacity(abundance.len());

    for (class, count) in abundance {
        if class.is_empty() {
            return Err(SunburstError::EmptyClassId);
        }
        if class == root {
            table.push(Row::new(class, flattener.label(class), "", count));
            continue;
        }
        let class_parents = match parents.get(class) {
            Some(class_parents) if !class_parents.is_empty() => class_parents,
            _ => return Err(SunburstError::MissingParents(class.to_string())),
        };

        table.push(Row::new(class, flattener.label(class), &class_parents[0], count));

        if !full {
            continue;
        }
        for parent in &class_parents[1..] {
            let origin = format!("{DUPLICATE_SEPARATOR}{parent}");
            let duplicate = format!("{class}{origin}");
            trace!("Duplicating {} below {}", class, parent);
            table.push(Row::new(
                duplicate.clone(),
                flattener.label(class),
                parent,
                count,
            ));
            for child in children.get(class).unwrap_or_default() {
                table.extend(flattener.subtree(child, &origin, &duplicate));
            }
        }
    }

    debug!(
        "Flattened {} classes into {} rows",
        abundance.len(),
        table.len()
    );
    Ok(table)
}

struct Flattener<'a> {
    abundance: &'a ClassAbundance,
    children: &'a ChildrenMap,
    names: Option<&'a Names>,
}

impl Flattener<'_> {
    fn label(&self, id: &str) -> String {
        self.names
            .and_then(|names| names.get(id))
            .map_or_else(|| id.to_string(), Clone::clone)
    }

    /// Returns the rows of `child` and all its descendants, duplicated below `parent`
    ///
    /// `origin` is the suffix that makes the ids of the duplicated rows unique.
    fn subtree(&self, child: &str, origin: &str, parent: &str) -> Vec<Row> {
        let count = match self.abundance.get(child) {
            Some(count) => count,
            None => {
                trace!("Skipping unclassified descendant {}", child);
                return Vec::new();
            }
        };
        let id = format!("{child}{origin}");
        let mut rows = vec![Row::new(id.clone(), self.label(child), parent, count)];

        if let Some(grandchildren) = self.children.get(child) {
            let nested_origin = format!("{origin}{DUPLICATE_SEPARATOR}{child}");
            for grandchild in grandchildren {
                rows.extend(self.subtree(grandchild, &nested_origin, &id));
            }
        }
        rows
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// ```text
    ///        root
    ///       /    \
    ///      x      y
    ///       \    /
    ///         z
    ///         |
    ///         w
    ///         |
    ///         v
    /// ```
    fn diamond() -> (ClassAbundance, ParentMap, ChildrenMap) {
        let abundance: ClassAbundance = [
            ("root", 4),
            ("x", 3),
            ("y", 2),
            ("z", 2),
            ("w", 1),
            ("v", 1),
        ]
        .into_iter()
        .collect();
        let parents: ParentMap = [
            ("x", vec!["root"]),
            ("y", vec!["root"]),
            ("z", vec!["x", "y"]),
            ("w", vec!["z"]),
            ("v", vec!["w"]),
        ]
        .into_iter()
        .collect();
        let children: ChildrenMap = [
            ("root", vec!["x", "y"]),
            ("x", vec!["z"]),
            ("y", vec!["z"]),
            ("z", vec!["w"]),
            ("w", vec!["v"]),
        ]
        .into_iter()
        .collect();
        (abundance, parents, children)
    }

    #[test]
    fn single_parents() {
        let abundance: ClassAbundance = [("root", 10), ("a", 6), ("b", 4)].into_iter().collect();
        let parents: ParentMap = [("a", vec!["root"]), ("b", vec!["root"])]
            .into_iter()
            .collect();
        let table = flatten(&abundance, &parents, &ChildrenMap::new(), "root", None, true).unwrap();

        let expected = vec![
            Row::new("root", "root", "", 10),
            Row::new("a", "a", "root", 6),
            Row::new("b", "b", "root", 4),
        ];
        assert_eq!(table.rows(), &expected[..]);
    }

    #[test]
    fn full_duplicates_subtrees() {
        let (abundance, parents, children) = diamond();
        let table = flatten(&abundance, &parents, &children, "root", None, true).unwrap();

        assert_eq!(
            table.ids(),
            vec!["root", "x", "y", "z", "z__y", "w__y", "v__y__w", "w", "v"]
        );
        assert_eq!(table.get("z__y").unwrap().parent(), "y");
        assert_eq!(table.get("w__y").unwrap().parent(), "z__y");
        assert_eq!(table.get("v__y__w").unwrap().parent(), "w__y");
        assert_eq!(table.get("v__y__w").unwrap().label(), "v");
        assert_eq!(table.get("w__y").unwrap().count(), 1);
    }

    #[test]
    fn reduced_uses_first_parent() {
        let (abundance, parents, children) = diamond();
        let table = flatten(&abundance, &parents, &children, "root", None, false).unwrap();

        assert_eq!(table.ids(), vec!["root", "x", "y", "z", "w", "v"]);
        assert_eq!(table.get("z").unwrap().parent(), "x");
    }

    #[test]
    fn one_row_per_parent() {
        let (abundance, parents, children) = diamond();
        let table = flatten(&abundance, &parents, &children, "root", None, true).unwrap();

        let z_rows: Vec<&Row> = table.iter().filter(|row| row.label() == "z").collect();
        assert_eq!(z_rows.len(), 2);
        assert_ne!(z_rows[0].id(), z_rows[1].id());
        assert_eq!(z_rows[0].parent(), "x");
        assert_eq!(z_rows[1].parent(), "y");
        assert!(z_rows.iter().all(|row| row.count() == 2));
    }

    #[test]
    fn unclassified_descendants_are_skipped() {
        let (abundance, parents, mut children) = diamond();
        children.insert("z", ["w", "ghost"]);
        children.insert("ghost", ["w"]);
        let table = flatten(&abundance, &parents, &children, "root", None, true).unwrap();

        assert!(table.iter().all(|row| !row.id().starts_with("ghost")));
        assert_eq!(table.len(), 9);
    }

    #[test]
    fn duplicate_below_unclassified_parent() {
        let abundance: ClassAbundance = [("root", 5), ("c", 3)].into_iter().collect();
        let parents: ParentMap = [("c", vec!["root", "p2"])].into_iter().collect();
        let children = ChildrenMap::new();

        let table = flatten(&abundance, &parents, &children, "root", None, true).unwrap();
        assert_eq!(table.ids(), vec!["root", "c", "c__p2"]);
        assert_eq!(table.get("c__p2").unwrap().count(), 3);
        assert_eq!(table.get("c__p2").unwrap().parent(), "p2");

        let table = flatten(&abundance, &parents, &children, "root", None, false).unwrap();
        assert_eq!(table.ids(), vec!["root", "c"]);
    }

    #[test]
    fn labels_from_names() {
        let (abundance, parents, children) = diamond();
        let mut names = Names::new();
        names.insert("z".to_string(), "Zeta".to_string());
        names.insert("root".to_string(), "All".to_string());

        let table = flatten(&abundance, &parents, &children, "root", Some(&names), true).unwrap();
        assert_eq!(table.get("root").unwrap().label(), "All");
        assert_eq!(table.get("z").unwrap().label(), "Zeta");
        assert_eq!(table.get("z__y").unwrap().label(), "Zeta");
        assert_eq!(table.get("w").unwrap().label(), "w");
    }

    #[test]
    fn missing_parents() {
        let abundance: ClassAbundance = [("root", 2), ("orphan", 1)].into_iter().collect();
        let mut parents = ParentMap::new();
        let children = ChildrenMap::new();

        let err = flatten(&abundance, &parents, &children, "root", None, true).unwrap_err();
        assert!(matches!(err, SunburstError::MissingParents(class) if class == "orphan"));

        parents.insert("orphan", Vec::<String>::new());
        let err = flatten(&abundance, &parents, &children, "root", None, true).unwrap_err();
        assert!(matches!(err, SunburstError::MissingParents(_)));
    }

    #[test]
    fn empty_class_id() {
        let abundance: ClassAbundance = [("root", 2), ("", 1)].into_iter().collect();
        let parents: ParentMap = [("", vec!["root"])].into_iter().collect();

        let err = flatten(&abundance, &parents, &ChildrenMap::new(), "root", None, true)
            .unwrap_err();
        assert!(matches!(err, SunburstError::EmptyClassId));

        let abundance: ClassAbundance = [("", 2)].into_iter().collect();
        let err = flatten(&abundance, &parents, &ChildrenMap::new(), "", None, true).unwrap_err();
        assert!(matches!(err, SunburstError::EmptyClassId));
    }

    #[test]
    fn empty_abundance() {
        let table = flatten(
            &ClassAbundance::new(),
            &ParentMap::new(),
            &ChildrenMap::new(),
            "root",
            None,
            true,
        )
        .unwrap();
        assert!(table.is_empty());
    }
}
