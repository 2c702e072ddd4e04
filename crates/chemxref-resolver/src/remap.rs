//! Corrections for known-bad ChEMBL identifiers.
//!
//! Some ChEMBL ids handed out by upstream sources point at deprecated or
//! wrong records. They are swapped for the correct id before any lookup.

use std::collections::HashMap;

use chemxref_common::entities::normalise_id;
use tracing::debug;

/// Built-in corrections, `bad → good`.
pub const KNOWN_BAD_CHEMBL: &[(&str, &str)] = &[
    ("CHEMBL2029132", "CHEMBL2367706"),
];

#[derive(Debug, Clone)]
pub struct RemapTable {
    entries: HashMap<String, String>,
}

impl Default for RemapTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RemapTable {
    pub fn builtin() -> Self {
        let entries = KNOWN_BAD_CHEMBL
            .iter()
            .map(|(bad, good)| (bad.to_string(), good.to_string()))
            .collect();
        Self { entries }
    }

    pub fn empty() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Add corrections on top of the current table. Later entries win.
    pub fn extend<I, K, V>(&mut self, extra: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (bad, good) in extra {
            self.entries.insert(normalise_id(bad.as_ref()), normalise_id(good.as_ref()));
        }
    }

    /// The corrected id, or the input (normalised) when it is not known-bad.
    pub fn apply(&self, id: &str) -> String {
        let id = normalise_id(id);
        match self.entries.get(&id) {
            Some(good) => {
                debug!(bad = %id, good = %good, "Substituting known-bad ChEMBL id");
                good.clone()
            }
            None => id,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_correction() {
        let table = RemapTable::builtin();
        assert_eq!(table.apply("CHEMBL2029132"), "CHEMBL2367706");
        assert_eq!(table.apply(" chembl2029132 "), "CHEMBL2367706");
        assert_eq!(table.apply("CHEMBL25"), "CHEMBL25");
    }

    #[test]
    fn test_extend_adds_and_overrides() {
        let mut table = RemapTable::builtin();
        table.extend([("chembl1", "chembl2"), ("CHEMBL2029132", "CHEMBL9")]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.apply("CHEMBL1"), "CHEMBL2");
        assert_eq!(table.apply("CHEMBL2029132"), "CHEMBL9");
    }

    #[test]
    fn test_empty_table_is_identity() {
        let table = RemapTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.apply("CHEMBL2029132"), "CHEMBL2029132");
    }
}
