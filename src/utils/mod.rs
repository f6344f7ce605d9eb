/*!
# Utilities

Provides
- the [`Dsf`] disjoint-set forest, which also serves as the output shape of
  [`divvy_rectangle`](crate::algo::divvy_rectangle),
- [`TryFromLength`], the fallible counterpart of `vec![value; len]` that every
  scratch-owning algorithm uses in its `try_new` constructor.
*/

use crate::error::Result;

pub mod dsf;

pub use dsf::Dsf;

/// Helper trait for scratch buffers that are created with a fixed length.
///
/// In contrast to `vec![value; len]`, allocation failure is reported as
/// [`Error::OutOfMemory`](crate::error::Error::OutOfMemory) instead of aborting.
pub trait TryFromLength: Sized {
    /// Element type the buffer is filled with
    type Value;

    /// Creates a buffer of exactly `len` copies of `value`
    fn try_filled(len: usize, value: Self::Value) -> Result<Self>;
}

impl<T> TryFromLength for Vec<T>
where
    T: Clone,
{
    type Value = T;

    fn try_filled(len: usize, value: T) -> Result<Self> {
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(len)?;
        buffer.resize(len, value);
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_filled_has_requested_length() {
        let buffer: Vec<u32> = Vec::try_filled(7, 3).unwrap();
        assert_eq!(buffer, vec![3; 7]);

        let empty: Vec<bool> = Vec::try_filled(0, true).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn try_filled_reports_impossible_request() {
        assert!(Vec::<u64>::try_filled(usize::MAX, 0).is_err());
    }
}
