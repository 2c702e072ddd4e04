//! Identifier resolution between DrugBank and ChEMBL, and structure fetch.
//!
//! The resolver walks an ordered fallback chain per record:
//!
//! DrugBank → ChEMBL: detail page → UniChem → name search on ChEMBL
//! ChEMBL → DrugBank: UniChem → interactive DrugBank search
//!
//! A source that errors or has no answer just hands over to the next one.
//! Only an exhausted chain gives an unresolved record, and the batch keeps
//! going.

pub mod remap;
pub mod candidate;
pub mod session;
pub mod resolver;
pub mod batch;
pub mod structures;

pub use batch::{resolve_batch, BatchReport};
pub use candidate::{CandidatePicker, FirstCandidate, Picked};
pub use remap::RemapTable;
pub use resolver::Resolver;
pub use session::{SessionSlot, SessionState};
pub use structures::{apply_structures, StructureFetcher};

#[cfg(test)]
pub(crate) mod testing;
