//! Chemical similarity for drug records.
//!
//! Structures come in as optional SMILES strings. Each one is parsed and
//! fingerprinted through a [`ChemistryCapability`]. The resulting
//! fingerprints are compared pairwise into a symmetric [`SimilarityMatrix`].
//! A structure that is missing or does not parse is handled by the
//! [`MissingPolicy`] rather than failing the whole matrix.

pub mod error;
pub mod molecule;
pub mod smiles;
pub mod fingerprint;
pub mod chemistry;
pub mod matrix;

pub use chemistry::{ChemistryCapability, MorganCapability};
pub use error::SmilesError;
pub use matrix::{
    compute_similarity, matrix_from_fingerprints, similarity_for_records, MissingPolicy,
    RecordSimilarity, SimilarityMatrix, SimilarityReport,
};
