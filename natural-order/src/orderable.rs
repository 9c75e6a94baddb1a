use std::cmp::Ordering;

use crate::error::OrderingResult;
use crate::key::NaturalOrderKey;

/// Records that sort by a derived [`NaturalOrderKey`].
///
/// The key is derived data: implementors recompute it from their own fields in
/// [`refresh_natural_key`](Self::refresh_natural_key) and never accept it from
/// callers.
pub trait NaturallyOrderable {
    fn natural_key(&self) -> &NaturalOrderKey;

    /// Recompute the key from the fields it is derived from.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError::ValueRange`](crate::OrderingError::ValueRange)
    /// when a derived component does not fit a slot. The previous key must be
    /// kept in that case.
    fn refresh_natural_key(&mut self) -> OrderingResult<()>;

    fn cmp_natural(&self, other: &Self) -> Ordering {
        self.natural_key().cmp(other.natural_key())
    }
}

/// Stable sort by natural key; equal keys keep their input order
pub fn sort_naturally<T: NaturallyOrderable>(items: &mut [T]) {
    items.sort_by(|a, b| a.cmp_natural(b));
}
