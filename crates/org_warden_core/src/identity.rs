//! Case-insensitive identities for logins and repository names.
//!
//! GitHub compares logins and repository names without regard to case. Every set
//! operation in the reconciler goes through [`normalize`], while the first spelling
//! seen for each identity is kept so API calls and messages echo what the user wrote.

use std::collections::BTreeMap;

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;

/// Canonical form used to compare logins and repository names.
pub fn normalize(name: &str) -> String {
    name.to_lowercase()
}

/// A set of names compared case-insensitively that remembers their original spelling.
///
/// Iteration order is the order of the normalized names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginSet {
    entries: BTreeMap<String, String>,
}

impl LoginSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `name`, keeping the existing spelling if it is already present.
    ///
    /// Returns `true` when the name was not yet in the set.
    pub fn insert(&mut self, name: &str) -> bool {
        let key = normalize(name);
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&normalize(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Original spellings, ordered by normalized name.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }

    /// Names present in either set; spellings from `self` win.
    pub fn union(&self, other: &LoginSet) -> LoginSet {
        let mut entries = self.entries.clone();
        for (key, name) in &other.entries {
            entries.entry(key.clone()).or_insert_with(|| name.clone());
        }
        LoginSet { entries }
    }

    pub fn difference(&self, other: &LoginSet) -> LoginSet {
        self.filtered(|key| !other.entries.contains_key(key))
    }

    pub fn intersection(&self, other: &LoginSet) -> LoginSet {
        self.filtered(|key| other.entries.contains_key(key))
    }

    /// Original spellings as owned strings.
    pub fn to_vec(&self) -> Vec<String> {
        self.entries.values().cloned().collect()
    }

    fn filtered(&self, keep: impl Fn(&str) -> bool) -> LoginSet {
        LoginSet {
            entries: self
                .entries
                .iter()
                .filter(|(key, _)| keep(key))
                .map(|(key, name)| (key.clone(), name.clone()))
                .collect(),
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for LoginSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = LoginSet::new();
        for name in iter {
            set.insert(name.as_ref());
        }
        set
    }
}

/// Returns `Some(value)` when a declared value is set and differs from the live one.
///
/// `None` on the declared side means "leave as is" and never produces a change.
pub fn apply_if_set<T>(live: Option<&T>, declared: Option<&T>) -> Option<T>
where
    T: PartialEq + Clone,
{
    match declared {
        Some(want) if live != Some(want) => Some(want.clone()),
        _ => None,
    }
}
