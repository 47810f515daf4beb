use std::collections::BTreeSet;

use crate::identifier::Identifier;

/// A type-safe wrapper for external raw input sources.
///
/// Raw sources sit conceptually at layer -1: they are supplied by the caller
/// on every evaluation pass, are never registered as nodes, and are always
/// valid inputs.
///
/// # Examples
///
/// ```
/// use pkg_dag::config::RawSources;
///
/// let mut sources = RawSources::new();
/// sources.add("110^0-900".parse().unwrap());
/// assert!(sources.contains(&"110^0-900".parse().unwrap()));
/// assert_eq!(sources.iter().count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSources(pub BTreeSet<Identifier>);

impl RawSources {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns false if the source was already declared.
    pub fn add(&mut self, id: Identifier) -> bool {
        self.0.insert(id)
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.0.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identifier> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Identifier>> for RawSources {
    fn from(ids: Vec<Identifier>) -> Self {
        Self(ids.into_iter().collect())
    }
}

impl From<RawSources> for Vec<Identifier> {
    fn from(value: RawSources) -> Self {
        value.0.into_iter().collect()
    }
}
