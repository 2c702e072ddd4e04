//! Disambiguation policy for multi-candidate answers.
//!
//! Cross-reference lookups and name searches can return several ids. The
//! policy decides which one to accept and whether the choice was ambiguous.

/// The chosen candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Picked {
    pub index: usize,
    pub ambiguous: bool,
}

pub trait CandidatePicker: Send + Sync {
    /// `None` when there is nothing acceptable to pick.
    fn pick(&self, candidates: &[String]) -> Option<Picked>;
}

/// Accept the first candidate. Flags the pick as ambiguous when there was
/// more than one.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstCandidate;

impl CandidatePicker for FirstCandidate {
    fn pick(&self, candidates: &[String]) -> Option<Picked> {
        if candidates.is_empty() {
            None
        } else {
            Some(Picked { index: 0, ambiguous: candidates.len() > 1 })
        }
    }
}
