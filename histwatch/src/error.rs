use std::{fmt, sync::Arc};

/// Why a sequence failed to match the recorded history.
///
/// All variants describe the same failure kind; they differ only in the
/// message reported to the test author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// The wait budget ran out before enough entries were recorded.
    NotEnoughEntries { available: usize, wanted: usize },

    /// The entry at `position` differs from the expected identifier.
    Unexpected {
        got: String,
        expected: String,
        position: usize,
    },

    /// The sequence matched but entries remain where the history
    /// was supposed to be fully described.
    Leftover(Vec<String>),
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::NotEnoughEntries { available, wanted } => {
                write!(f, "not enough entries (have {available}, want {wanted})")
            }
            Mismatch::Unexpected { got, expected, .. } => {
                write!(f, "got {got} instead of {expected}")
            }
            Mismatch::Leftover(rest) => write!(f, "didn't describe all history: {rest:?}"),
        }
    }
}

/// The single error type for all histwatch operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Expectation(Mismatch),

    #[error("expected history to fail matching {0:?}, but it matched")]
    UnexpectedMatch(Vec<String>),

    #[error("External error: {0}")]
    External(#[source] Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn external(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::External(Arc::new(e))
    }

    /// Returns `true` if this error came from a failed match.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Error::Expectation(_))
    }
}

impl From<Mismatch> for Error {
    fn from(m: Mismatch) -> Self {
        Error::Expectation(m)
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Expectation(a), Self::Expectation(b)) => a == b,
            (Self::UnexpectedMatch(a), Self::UnexpectedMatch(b)) => a == b,
            (Self::External(a), Self::External(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Error {}
