//! The flat table of classes handed over to the sunburst renderer
use std::collections::HashMap;

/// A single class in the sunburst
///
/// A class with several parents is represented by one row per parent,
/// each with its own unique id (see [`crate::flatten`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    id: String,
    label: String,
    parent: String,
    count: u64,
    proportion: f64,
    relative_proportion: Option<f64>,
    log_pvalue: Option<f64>,
    proportion_difference: Option<f64>,
}

impl Row {
    /// Constructs a new row without any derived values
    ///
    /// An empty `parent` marks the row as a root of the sunburst.
    pub fn new<S, T, U>(id: S, label: T, parent: U, count: u64) -> Self
    where
        S: Into<String>,
        T: Into<String>,
        U: Into<String>,
    {
        Self {
            id: id.into(),
            label: label.into(),
            parent: parent.into(),
            count,
            proportion: 0.0,
            relative_proportion: None,
            log_pvalue: None,
            proportion_difference: None,
        }
    }

    /// The unique id of the row
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The displayed label, shared by all duplicates of a class
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The id of the parent row, empty for roots
    pub fn parent(&self) -> &str {
        &self.parent
    }

    /// Returns `true` if the row has no parent
    pub fn is_root(&self) -> bool {
        self.parent.is_empty()
    }

    /// The number of classified objects in the class
    pub fn count(&self) -> u64 {
        self.count
    }

    /// The count relative to the largest count of the table, in `(0, 1]`
    ///
    /// Is `0.0` until [`crate::add_proportions`] was called
    pub fn proportion(&self) -> f64 {
        self.proportion
    }

    /// The branch value for sunbursts with [`crate::BranchValues::Total`]
    pub fn relative_proportion(&self) -> Option<f64> {
        self.relative_proportion
    }

    /// The signed `log10` of the enrichment p-value
    ///
    /// Positive for over-represented classes, negative for
    /// under-represented ones. Set by [`crate::enrichment`].
    pub fn log_pvalue(&self) -> Option<f64> {
        self.log_pvalue
    }

    /// The enrichment p-value, recovered from [`Row::log_pvalue`]
    pub fn pvalue(&self) -> Option<f64> {
        self.log_pvalue.map(|score| 10f64.powf(-score.abs()))
    }

    /// The difference between the sample and the reference proportion
    pub fn proportion_difference(&self) -> Option<f64> {
        self.proportion_difference
    }

    pub(crate) fn set_parent(&mut self, parent: String) {
        self.parent = parent;
    }

    pub(crate) fn set_proportion(&mut self, proportion: f64) {
        self.proportion = proportion;
    }

    pub(crate) fn set_relative_proportion(&mut self, value: Option<f64>) {
        self.relative_proportion = value;
    }

    pub(crate) fn set_log_pvalue(&mut self, value: f64) {
        self.log_pvalue = Some(value);
    }

    pub(crate) fn set_proportion_difference(&mut self, value: f64) {
        self.proportion_difference = Some(value);
    }
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// The rows of a sunburst, in the order they were emitted
///
/// Rows are addressed by their id through a hash index. If an id occurs
/// more than once, the first row with that id is the addressable one.
///
/// The table is built once per sunburst and then transformed in place:
///
/// ```mermaid
/// graph LR
///     A[ClassAbundance<br>ParentMap<br>ChildrenMap] -->|flatten| B[SunburstTable]
///     B -->|add_proportions| C[proportions]
///     C -->|enrichment| D[p-values]
///     D -->|trim_root| E[renderer]
/// ```
///
/// # Examples
///
/// ```
/// use ontosunburst::{Row, SunburstTable};
///
/// let mut table = SunburstTable::new();
/// table.push(Row::new("root", "root", "", 10));
/// table.push(Row::new("a", "a", "root", 6));
///
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.max_count(), Some(10));
/// assert_eq!(table.get("a").unwrap().parent(), "root");
/// assert_eq!(table.children("root").count(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct SunburstTable {
    rows: Vec<Row>,
    index: HashMap<String, usize>,
}

impl SunburstTable {
    /// Constructs a new, empty [`SunburstTable`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a new, empty [`SunburstTable`] with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Appends a row to the end of the table
    pub fn push(&mut self, row: Row) {
        self.index
            .entry(row.id.clone())
            .or_insert(self.rows.len());
        self.rows.push(row);
    }

    /// Returns the number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the row with the given id
    pub fn get(&self, id: &str) -> Option<&Row> {
        self.index.get(id).map(|idx| &self.rows[*idx])
    }

    /// Returns `true` if a row with the given id exists
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Returns all rows, in order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns an iterator over all rows
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Returns an iterator over the direct children of `parent`
    ///
    /// Use an empty `parent` to iterate the roots.
    pub fn children<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = &'a Row> + 'a {
        self.rows.iter().filter(move |row| row.parent == parent)
    }

    /// Returns the largest count, i.e. the count of the root(s)
    pub fn max_count(&self) -> Option<u64> {
        self.rows.iter().map(Row::count).max()
    }

    /// Returns the number of distinct row ids
    pub fn distinct_ids(&self) -> usize {
        self.index.len()
    }

    /// The ids of all rows, for renderers that expect parallel arrays
    pub fn ids(&self) -> Vec<&str> {
        self.rows.iter().map(Row::id).collect()
    }

    /// The labels of all rows
    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(Row::label).collect()
    }

    /// The parent ids of all rows
    pub fn parents(&self) -> Vec<&str> {
        self.rows.iter().map(Row::parent).collect()
    }

    /// The counts of all rows
    pub fn counts(&self) -> Vec<u64> {
        self.rows.iter().map(Row::count).collect()
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub(crate) fn row_mut(&mut self, idx: usize) -> &mut Row {
        &mut self.rows[idx]
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Row> {
        self.rows.iter_mut()
    }

    /// Keeps only the rows for which `keep` returns `true`
    pub(crate) fn retain<F: FnMut(&Row) -> bool>(&mut self, keep: F) {
        self.rows.retain(keep);
        self.reindex();
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (idx, row) in self.rows.iter().enumerate() {
            self.index.entry(row.id.clone()).or_insert(idx);
        }
    }
}

impl FromIterator<Row> for SunburstTable {
    fn from_iter<T: IntoIterator<Item = Row>>(iter: T) -> Self {
        let mut table = SunburstTable::new();
        for row in iter {
            table.push(row);
        }
        table
    }
}

impl Extend<Row> for SunburstTable {
    fn extend<T: IntoIterator<Item = Row>>(&mut self, iter: T) {
        for row in iter {
            self.push(row);
        }
    }
}

impl<'a> IntoIterator for &'a SunburstTable {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;
    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn table() -> SunburstTable {
        [
            Row::new("root", "root", "", 10),
            Row::new("a", "a", "root", 6),
            Row::new("b", "b", "root", 4),
            Row::new("c", "c", "a", 2),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn lookup_by_id() {
        let table = table();
        assert_eq!(table.len(), 4);
        assert_eq!(table.get("c").unwrap().count(), 2);
        assert!(table.get("d").is_none());
        assert!(table.get("root").unwrap().is_root());
    }

    #[test]
    fn first_duplicate_id_wins() {
        let mut table = table();
        table.push(Row::new("a", "a", "b", 1));
        assert_eq!(table.len(), 5);
        assert_eq!(table.distinct_ids(), 4);
        assert_eq!(table.get("a").unwrap().parent(), "root");
    }

    #[test]
    fn children_and_roots() {
        let table = table();
        let children: Vec<&str> = table.children("root").map(Row::id).collect();
        assert_eq!(children, vec!["a", "b"]);
        let roots: Vec<&str> = table.children("").map(Row::id).collect();
        assert_eq!(roots, vec!["root"]);
        assert_eq!(table.children("c").count(), 0);
    }

    #[test]
    fn retain_rebuilds_index() {
        let mut table = table();
        table.retain(|row| row.id() != "a");
        assert_eq!(table.len(), 3);
        assert!(table.get("a").is_none());
        assert_eq!(table.get("c").unwrap().count(), 2);
        assert_eq!(table.index_of("c"), Some(2));
    }

    #[test]
    fn parallel_columns() {
        let table = table();
        assert_eq!(table.ids(), vec!["root", "a", "b", "c"]);
        assert_eq!(table.parents(), vec!["", "root", "root", "a"]);
        assert_eq!(table.counts(), vec![10, 6, 4, 2]);
        assert_eq!(table.max_count(), Some(10));
    }

    #[test]
    fn pvalue_from_score() {
        let mut row = Row::new("a", "a", "", 1);
        assert!(row.pvalue().is_none());
        row.set_log_pvalue(2.0);
        assert!((row.pvalue().unwrap() - 0.01).abs() < 1e-12);
        row.set_log_pvalue(-2.0);
        assert!((row.pvalue().unwrap() - 0.01).abs() < 1e-12);
    }
}
