/// Core record types shared by the resolver, the structure fetcher and the
/// similarity engine.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::XrefError;

lazy_static! {
    static ref DRUGBANK_ID: Regex = Regex::new(r"(?i)^DB\d+$").unwrap();
    static ref CHEMBL_ID: Regex = Regex::new(r"(?i)^CHEMBL\d+$").unwrap();
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Stable join key for a record across resolution, structure fetch and
/// similarity passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self { Self::new() }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which catalog an identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    /// Primary catalog (DrugBank), e.g. `DB00945`.
    DrugBank,
    /// Secondary catalog (ChEMBL), e.g. `CHEMBL25`.
    Chembl,
}

impl IdentifierKind {
    /// Classify an identifier by its prefix pattern.
    pub fn detect(id: &str) -> Option<Self> {
        let id = id.trim();
        if DRUGBANK_ID.is_match(id) {
            Some(Self::DrugBank)
        } else if CHEMBL_ID.is_match(id) {
            Some(Self::Chembl)
        } else {
            None
        }
    }

    /// The catalog on the other side of a cross-reference.
    pub fn counterpart(self) -> Self {
        match self {
            Self::DrugBank => Self::Chembl,
            Self::Chembl => Self::DrugBank,
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DrugBank => f.write_str("DrugBank"),
            Self::Chembl => f.write_str("ChEMBL"),
        }
    }
}

/// Normalise an identifier to the canonical upper-case, trimmed form.
pub fn normalise_id(id: &str) -> String {
    id.trim().to_ascii_uppercase()
}

// ---------------------------------------------------------------------------
// Resolution outcome
// ---------------------------------------------------------------------------

/// The fallback strategy that produced a resolved identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    DetailPage,
    CrossReference,
    NameSearch,
    InteractiveSearch,
}

/// How much a resolution should be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// A single unambiguous answer.
    Exact,
    /// The first of several candidates was accepted.
    Ambiguous,
    /// Every strategy was exhausted.
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub resolved: Option<String>,
    pub strategy: Option<Strategy>,
    pub confidence: Confidence,
}

impl Resolution {
    pub fn found(id: impl Into<String>, strategy: Strategy, ambiguous: bool) -> Self {
        Self {
            resolved: Some(id.into()),
            strategy: Some(strategy),
            confidence: if ambiguous { Confidence::Ambiguous } else { Confidence::Exact },
        }
    }

    pub fn unresolved() -> Self {
        Self { resolved: None, strategy: None, confidence: Confidence::Unresolved }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

// ---------------------------------------------------------------------------
// Drug record
// ---------------------------------------------------------------------------

/// One input row. Holds one identifier on input and both (or an explicit
/// miss) after resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugRecord {
    pub id: RecordId,
    pub name: Option<String>,
    pub drugbank_id: Option<String>,
    pub chembl_id: Option<String>,
    pub smiles: Option<String>,
    pub resolution: Option<Resolution>,
    pub created_at: DateTime<Utc>,
}

impl DrugRecord {
    /// Build a record from a raw identifier, routing it to the right column.
    pub fn from_identifier(raw_id: &str, name: Option<String>) -> Result<Self, XrefError> {
        let kind = IdentifierKind::detect(raw_id)
            .ok_or_else(|| XrefError::InvalidIdentifier(raw_id.to_string()))?;
        let id = normalise_id(raw_id);
        let mut record = Self::unidentified(name);
        match kind {
            IdentifierKind::DrugBank => record.drugbank_id = Some(id),
            IdentifierKind::Chembl => record.chembl_id = Some(id),
        }
        Ok(record)
    }

    /// A record with neither identifier. Kept in place so output rows line
    /// up with input rows; the batch skips it.
    pub fn unidentified(name: Option<String>) -> Self {
        Self {
            id: RecordId::new(),
            name,
            drugbank_id: None,
            chembl_id: None,
            smiles: None,
            resolution: None,
            created_at: Utc::now(),
        }
    }

    /// The identifier supplied at input time and its kind. DrugBank wins if
    /// both columns are populated.
    pub fn known(&self) -> Option<(&str, IdentifierKind)> {
        self.drugbank_id
            .as_deref()
            .map(|id| (id, IdentifierKind::DrugBank))
            .or_else(|| self.chembl_id.as_deref().map(|id| (id, IdentifierKind::Chembl)))
    }

    /// Write a resolution into the column that was missing.
    pub fn apply(&mut self, known_kind: IdentifierKind, resolution: Resolution) {
        match known_kind.counterpart() {
            IdentifierKind::DrugBank => self.drugbank_id = resolution.resolved.clone(),
            IdentifierKind::Chembl => self.chembl_id = resolution.resolved.clone(),
        }
        self.resolution = Some(resolution);
    }

    /// `(drugbank_id, chembl_id)`.
    pub fn identifier_pair(&self) -> (Option<&str>, Option<&str>) {
        (self.drugbank_id.as_deref(), self.chembl_id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_kind() {
        assert_eq!(IdentifierKind::detect("DB00945"), Some(IdentifierKind::DrugBank));
        assert_eq!(IdentifierKind::detect(" db00945 "), Some(IdentifierKind::DrugBank));
        assert_eq!(IdentifierKind::detect("CHEMBL25"), Some(IdentifierKind::Chembl));
        assert_eq!(IdentifierKind::detect("chembl25"), Some(IdentifierKind::Chembl));
        assert_eq!(IdentifierKind::detect("2244"), None);
        assert_eq!(IdentifierKind::detect("DBX"), None);
        assert_eq!(IdentifierKind::detect(""), None);
    }

    #[test]
    fn test_record_routes_identifier() {
        let rec = DrugRecord::from_identifier("chembl25", Some("aspirin".into())).unwrap();
        assert_eq!(rec.identifier_pair(), (None, Some("CHEMBL25")));
        assert_eq!(rec.known(), Some(("CHEMBL25", IdentifierKind::Chembl)));

        let rec = DrugRecord::from_identifier("DB00945", None).unwrap();
        assert_eq!(rec.identifier_pair(), (Some("DB00945"), None));
    }

    #[test]
    fn test_record_rejects_unknown_format() {
        let err = DrugRecord::from_identifier("CID2244", None).unwrap_err();
        assert!(matches!(err, XrefError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_apply_fills_missing_side() {
        let mut rec = DrugRecord::from_identifier("DB00945", None).unwrap();
        rec.apply(IdentifierKind::DrugBank, Resolution::found("CHEMBL25", Strategy::DetailPage, false));
        assert_eq!(rec.identifier_pair(), (Some("DB00945"), Some("CHEMBL25")));
        assert_eq!(rec.resolution.as_ref().unwrap().confidence, Confidence::Exact);

        let mut rec = DrugRecord::from_identifier("CHEMBL1", None).unwrap();
        rec.apply(IdentifierKind::Chembl, Resolution::unresolved());
        assert_eq!(rec.identifier_pair(), (None, Some("CHEMBL1")));
        assert_eq!(rec.resolution.as_ref().unwrap().confidence, Confidence::Unresolved);
    }

    #[test]
    fn test_record_ids_are_unique() {
        assert_ne!(RecordId::new(), RecordId::new());
    }
}
