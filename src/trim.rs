//! Removal of the ontology root before rendering
use std::collections::HashSet;

use tracing::debug;

use crate::table::SunburstTable;

/// Removes the root rows of the sunburst
///
/// Every row with the largest count of the table is treated as root; after
/// duplication there can be several of them.
///
/// If `reparent` is `true`, the children of the removed rows become roots
/// themselves. Otherwise they keep referencing their removed parent and
/// the renderer has to treat them as roots.
///
/// # Examples
///
/// ```
/// use ontosunburst::{trim_root, Row, SunburstTable};
///
/// let mut table: SunburstTable = [
///     Row::new("root", "root", "", 10),
///     Row::new("a", "a", "root", 6),
///     Row::new("b", "b", "root", 4),
/// ]
/// .into_iter()
/// .collect();
///
/// trim_root(&mut table, true);
///
/// assert_eq!(table.ids(), vec!["a", "b"]);
/// assert_eq!(table.parents(), vec!["", ""]);
/// ```
pub fn trim_root(table: &mut SunburstTable, reparent: bool) {
    let max_count = match table.max_count() {
        Some(max_count) => max_count,
        None => return,
    };
    let roots: HashSet<String> = table
        .iter()
        .filter(|row| row.count() == max_count)
        .map(|row| row.id().to_string())
        .collect();
    debug!("Removing {} root rows", roots.len());

    table.retain(|row| row.count() != max_count);

    if reparent {
        for row in table.iter_mut() {
            if roots.contains(row.parent()) {
                row.set_parent(String::new());
            }
        }
    }
}
