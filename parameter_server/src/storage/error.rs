use std::{
    error::Error,
    fmt::{self, Display},
};

/// The specific result type for size mismatch checks inside the storage module.
pub type Result<T> = std::result::Result<T, SizeMismatchErr>;

/// Error returned whenever a gradient, the parameters or an external buffer don't
/// have the length the store or an optimizer expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeMismatchErr {
    pub got: usize,
    pub expected: usize,
}

impl SizeMismatchErr {
    /// Returns `Ok` if both lengths are equal.
    pub fn check(got: usize, expected: usize) -> Result<()> {
        if got != expected {
            return Err(Self { got, expected });
        }

        Ok(())
    }
}

impl Display for SizeMismatchErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "the provided buffer has {} values but {} were expected",
            self.got, self.expected
        )
    }
}

impl Error for SizeMismatchErr {}
