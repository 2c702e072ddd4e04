//! Pairwise similarity matrix over a set of optional structures.

use chemxref_common::entities::{DrugRecord, RecordId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chemistry::ChemistryCapability;

/// What to do with entries that have no usable fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Keep the row; every pair involving it scores 0 (diagonal stays 1).
    #[default]
    KeepAndZero,
    /// Remove the entry before computing and report it as dropped.
    DropMissing,
}

/// Square, symmetric, row-major. Diagonal is 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityMatrix {
    n: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// `n × n` with zeros off the diagonal.
    fn identity(n: usize) -> Self {
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
        }
        Self { n, values }
    }

    fn set_pair(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.n + j] = value;
        self.values[j * self.n + i] = value;
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        (i < self.n && j < self.n).then(|| self.values[i * self.n + j])
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        if self.n == 0 {
            return Vec::new();
        }
        self.values.chunks(self.n).map(<[f64]>::to_vec).collect()
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.n).all(|i| (i + 1..self.n).all(|j| self.values[i * self.n + j] == self.values[j * self.n + i]))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityReport {
    pub matrix: SimilarityMatrix,
    /// Input indices removed under [`MissingPolicy::DropMissing`].
    pub dropped: Vec<usize>,
}

impl SimilarityReport {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

/// Build the matrix from precomputed fingerprints.
///
/// Only `i < j` pairs are scored; the lower triangle is a mirror. Scores are
/// clamped to `[0, 1]`.
pub fn matrix_from_fingerprints<F>(
    fingerprints: &[Option<F>],
    policy: MissingPolicy,
    similarity: impl Fn(&F, &F) -> f64,
) -> SimilarityReport {
    let (kept, dropped): (Vec<Option<&F>>, Vec<usize>) = match policy {
        MissingPolicy::KeepAndZero => (fingerprints.iter().map(Option::as_ref).collect(), Vec::new()),
        MissingPolicy::DropMissing => {
            let dropped = fingerprints
                .iter()
                .enumerate()
                .filter_map(|(i, fp)| fp.is_none().then_some(i))
                .collect();
            (fingerprints.iter().filter_map(Option::as_ref).map(Some).collect(), dropped)
        }
    };

    let n = kept.len();
    let mut matrix = SimilarityMatrix::identity(n);
    for i in 0..n {
        for j in i + 1..n {
            if let (Some(a), Some(b)) = (kept[i], kept[j]) {
                matrix.set_pair(i, j, unit_score(similarity(a, b)));
            }
        }
    }

    SimilarityReport { matrix, dropped }
}

/// Non-finite scores count as no similarity.
fn unit_score(raw: f64) -> f64 {
    if raw.is_finite() {
        raw.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Fingerprint every structure with `capability` and build the matrix.
/// Missing and unparsable structures are both "no fingerprint".
pub fn compute_similarity<C, S>(
    structures: &[Option<S>],
    capability: &C,
    policy: MissingPolicy,
) -> SimilarityReport
where
    C: ChemistryCapability,
    S: AsRef<str>,
{
    let fingerprints: Vec<Option<C::Fingerprint>> = structures
        .iter()
        .map(|s| s.as_ref().and_then(|s| capability.fingerprint_smiles(s.as_ref())))
        .collect();
    let missing = fingerprints.iter().filter(|f| f.is_none()).count();
    debug!(total = structures.len(), missing, ?policy, "Fingerprints computed");

    matrix_from_fingerprints(&fingerprints, policy, |a, b| capability.similarity(a, b))
}

/// Similarity result with rows labeled by record.
#[derive(Debug, Clone, Serialize)]
pub struct RecordSimilarity {
    /// Row/column order of `matrix`.
    pub record_ids: Vec<RecordId>,
    pub dropped: Vec<RecordId>,
    pub matrix: SimilarityMatrix,
}

pub fn similarity_for_records<C: ChemistryCapability>(
    records: &[DrugRecord],
    capability: &C,
    policy: MissingPolicy,
) -> RecordSimilarity {
    let structures: Vec<Option<&str>> = records.iter().map(|r| r.smiles.as_deref()).collect();
    let report = compute_similarity(&structures, capability, policy);

    let dropped: Vec<RecordId> = report.dropped.iter().map(|&i| records[i].id).collect();
    let record_ids = records
        .iter()
        .enumerate()
        .filter(|(i, _)| !report.dropped.contains(i))
        .map(|(_, r)| r.id)
        .collect();

    info!(
        records = records.len(),
        dim = report.matrix.dim(),
        dropped = dropped.len(),
        "Similarity matrix computed"
    );
    RecordSimilarity { record_ids, dropped, matrix: report.matrix }
}
