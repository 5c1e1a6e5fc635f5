use thiserror::Error;

// -----------------------------------------------------------------------------
// Error

/// Error returned by the fallible conversions of [`UniquePtr`](crate::UniquePtr).
///
/// # Examples
///
/// ```
/// use uniq_ptr::{PtrError, UniquePtr};
///
/// let ptr = UniquePtr::<u32>::null();
/// assert_eq!(ptr.try_into_inner(), Err(PtrError::Empty));
/// ```
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PtrError {
    #[error("UniquePtr is empty, there is no value to take out")]
    Empty,
}
