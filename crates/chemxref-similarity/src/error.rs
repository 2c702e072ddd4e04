use thiserror::Error;

/// Why a SMILES string could not be turned into a molecule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SmilesError {
    #[error("empty SMILES string")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unknown element '{0}'")]
    UnknownElement(String),

    #[error("unterminated bracket atom starting at position {0}")]
    UnclosedBracket(usize),

    #[error("unclosed ring bond(s): {0:?}")]
    UnclosedRing(Vec<u16>),

    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("{0} at position {1} has no preceding atom")]
    Dangling(&'static str, usize),

    #[error("invalid ring bond number at position {0}")]
    InvalidRingNumber(usize),

    #[error("charge out of range on bracket atom at position {0}")]
    ChargeOutOfRange(usize),

    #[error("bond valence overflow on atom {0}")]
    ValenceOverflow(usize),
}
