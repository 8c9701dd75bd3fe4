//! Input collections describing a classification
//!
//! The ontology-resolution layer (ChEBI or GO SPARQL endpoints, MetaCyc or EC
//! tables) produces three mappings that are consumed here as is:
//!
//! - [`ClassAbundance`]: the number of classified objects per class
//! - [`ParentMap`]: the parents of every class, first parent first
//! - [`ChildrenMap`]: the children of every class
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use smallvec::SmallVec;

/// Display names of classes, keyed by class id
///
/// Classes without a name are labelled with their id.
pub type Names = HashMap<String, String>;

/// Most ontology classes have only a handful of parents or children
const DEFAULT_NUM_RELATIONS: usize = 4;

type RelatedIds = SmallVec<[String; DEFAULT_NUM_RELATIONS]>;

/// The number of classified objects for every class
///
/// Unlike a `HashMap`, the abundance keeps the insertion order of the
/// classes. The order of the classes determines the order of the rows
/// of the [`crate::SunburstTable`].
///
/// # Examples
///
/// ```
/// use ontosunburst::ClassAbundance;
///
/// let mut abundance = ClassAbundance::new();
/// abundance.insert("FRAMES", 3);
/// abundance.insert("Lipids", 2);
/// abundance.insert("Sugars", 1);
///
/// assert_eq!(abundance.len(), 3);
/// assert_eq!(abundance.get("Lipids"), Some(2));
/// assert_eq!(abundance.max(), Some(3));
///
/// let ids: Vec<&str> = abundance.iter().map(|(id, _)| id).collect();
/// assert_eq!(ids, vec!["FRAMES", "Lipids", "Sugars"]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct ClassAbundance {
    classes: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl ClassAbundance {
    /// Constructs a new, empty [`ClassAbundance`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a new, empty [`ClassAbundance`] with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            classes: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Sets the count of a class
    ///
    /// If the class is already present, its count is replaced but
    /// it keeps its position. Returns the previous count, if any.
    pub fn insert<S: Into<String>>(&mut self, id: S, count: u64) -> Option<u64> {
        match self.index.entry(id.into()) {
            Entry::Occupied(entry) => {
                let previous = self.classes[*entry.get()].1;
                self.classes[*entry.get()].1 = count;
                Some(previous)
            }
            Entry::Vacant(entry) => {
                self.classes.push((entry.key().clone(), count));
                entry.insert(self.classes.len() - 1);
                None
            }
        }
    }

    /// Returns the count of the class or `None` if the class is not present
    pub fn get(&self, id: &str) -> Option<u64> {
        self.index.get(id).map(|idx| self.classes[*idx].1)
    }

    /// Returns `true` if the class is present
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Returns the number of classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if no class is present
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Returns the highest count, i.e. the count of the root class
    ///
    /// Returns `None` if the abundance is empty
    pub fn max(&self) -> Option<u64> {
        self.classes.iter().map(|(_, count)| *count).max()
    }

    /// Returns an iterator of all classes and their counts, in insertion order
    pub fn iter(&self) -> Abundances<'_> {
        Abundances::new(self.classes.iter())
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for ClassAbundance {
    fn from_iter<T: IntoIterator<Item = (K, u64)>>(iter: T) -> Self {
        let mut abundance = ClassAbundance::new();
        for (id, count) in iter {
            abundance.insert(id, count);
        }
        abundance
    }
}

impl<'a> IntoIterator for &'a ClassAbundance {
    type Item = (&'a str, u64);
    type IntoIter = Abundances<'a>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the classes of a [`ClassAbundance`]
pub struct Abundances<'a> {
    inner: std::slice::Iter<'a, (String, u64)>,
}

impl<'a> Abundances<'a> {
    fn new(inner: std::slice::Iter<'a, (String, u64)>) -> Self {
        Self { inner }
    }
}

impl<'a> Iterator for Abundances<'a> {
    type Item = (&'a str, u64);
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(id, count)| (id.as_str(), *count))
    }
}

/// Directed relations between classes
///
/// Used both as [`ParentMap`] and as [`ChildrenMap`]. The order of the
/// related classes is kept: for parents, the first one is the main parent
/// of a class.
///
/// # Examples
///
/// ```
/// use ontosunburst::ParentMap;
///
/// let mut parents = ParentMap::new();
/// parents.add("c", "cde");
/// parents.add("c", "cf");
///
/// assert_eq!(parents.get("c"), Some(&["cde".to_string(), "cf".to_string()][..]));
/// assert!(parents.get("x").is_none());
/// ```
#[derive(Debug, Default, Clone)]
pub struct Relations {
    inner: HashMap<String, RelatedIds>,
}

/// The parents of every class, the first parent being the main one
pub type ParentMap = Relations;

/// The children of every class
pub type ChildrenMap = Relations;

impl Relations {
    /// Constructs a new, empty [`Relations`] map
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `related` to the relations of `id`
    pub fn add<S: Into<String>, T: Into<String>>(&mut self, id: S, related: T) {
        self.inner.entry(id.into()).or_default().push(related.into());
    }

    /// Replaces all relations of `id`
    pub fn insert<S, I, T>(&mut self, id: S, related: I)
    where
        S: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.inner
            .insert(id.into(), related.into_iter().map(Into::into).collect());
    }

    /// Returns the related classes of `id` or `None` if `id` has no entry
    pub fn get(&self, id: &str) -> Option<&[String]> {
        self.inner.get(id).map(SmallVec::as_slice)
    }

    /// Returns `true` if `id` has an entry
    pub fn contains(&self, id: &str) -> bool {
        self.inner.contains_key(id)
    }

    /// Returns the number of classes with an entry
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if no class has an entry
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns an iterator of all classes and their related classes, in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.inner
            .iter()
            .map(|(id, related)| (id.as_str(), related.as_slice()))
    }
}

impl<K, I, T> FromIterator<(K, I)> for Relations
where
    K: Into<String>,
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    fn from_iter<U: IntoIterator<Item = (K, I)>>(iter: U) -> Self {
        let mut relations = Relations::new();
        for (id, related) in iter {
            relations.insert(id, related);
        }
        relations
    }
}
