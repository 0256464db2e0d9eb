use thiserror::Error;

/// A specialized result type for matrix operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The ways in which a [`Matrix`] or [`Named`] call can reject its input.
///
/// Every error is raised synchronously by the call that received the bad
/// input, before any mutation takes place; a failing call leaves the matrix
/// in its previous state. Searches never produce errors: an exhausted search
/// space is a normal return.
///
/// [`Matrix`]: `crate::Matrix`
/// [`Named`]: `crate::Named`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An item or option index beyond the current bounds of the matrix.
    #[error("{what} {index} is out of range (bound is {bound})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        bound: usize,
    },
    /// A dense row, a permutation or an internal size check saw a length
    /// other than the one it requires.
    #[error("{what} has size {actual}, expected {expected}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A sequence passed as a permutation repeats an entry, or a column
    /// permutation does not map the primary prefix onto itself.
    #[error("{what} is not a valid permutation (offending position {position})")]
    InvalidPermutation {
        what: &'static str,
        position: usize,
    },
    /// An option with no items was offered to `add_option`.
    #[error("option contains no items")]
    EmptyOption,
    /// The same item identity was given twice to a [`Named`] constructor.
    ///
    /// [`Named`]: `crate::Named`
    #[error("duplicate item {0}")]
    DuplicateItem(String),
    /// A [`Named`] lookup used an identifier the matrix has never seen.
    ///
    /// [`Named`]: `crate::Named`
    #[error("unknown identifier {0}")]
    NotFound(String),
}
