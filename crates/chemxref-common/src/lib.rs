//! Shared types, errors and the sandboxed HTTP client used by every chemxref crate.

pub mod error;
pub mod entities;
pub mod sandbox;

// Re-export commonly used types
pub use entities::{Confidence, DrugRecord, IdentifierKind, RecordId, Resolution, Strategy};
pub use error::{Result, XrefError};
