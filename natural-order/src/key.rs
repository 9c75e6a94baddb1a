use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::error::{OrderingError, OrderingResult};

/// Number of subkey slots in every key
pub const SUBKEY_SLOTS: usize = 6;

/// Largest value a slot can hold
pub const MAX_SUBKEY: u16 = u16::MAX;

/// Fixed-width natural ordering key.
///
/// Six positional slots, each either unset or a value in `0..=65535`. Slots
/// are addressed 1 through 6. Keys compare slot by slot; the first slot that
/// differs decides. An unset slot sorts before any set value, so a key that
/// stops early sorts ahead of one that continues (`1/2` before `1/2/0`) and
/// an all-unset key sorts ahead of everything else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NaturalOrderKey {
    slots: [Option<u16>; SUBKEY_SLOTS],
}

impl NaturalOrderKey {
    /// A key with every slot unset
    pub const fn unset() -> Self {
        Self {
            slots: [None; SUBKEY_SLOTS],
        }
    }

    pub const fn from_slots(slots: [Option<u16>; SUBKEY_SLOTS]) -> Self {
        Self { slots }
    }

    /// Build a key from unchecked values.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingError::ValueRange`] for the first value outside
    /// `0..=65535`.
    pub fn try_from_values(values: [Option<i64>; SUBKEY_SLOTS]) -> OrderingResult<Self> {
        let mut key = Self::unset();
        for (index, value) in values.into_iter().enumerate() {
            key.set(index + 1, value)?;
        }
        Ok(key)
    }

    /// Set slot `slot` (1-based), or clear it with `None`.
    ///
    /// The key is left untouched on error.
    ///
    /// # Errors
    ///
    /// - [`OrderingError::SlotIndex`] if `slot` is not in `1..=6`
    /// - [`OrderingError::ValueRange`] if `value` is outside `0..=65535`
    pub fn set(&mut self, slot: usize, value: Option<i64>) -> OrderingResult<()> {
        let target = slot
            .checked_sub(1)
            .and_then(|index| self.slots.get_mut(index))
            .ok_or(OrderingError::SlotIndex(slot))?;
        *target = value.map(|v| checked_subkey(slot, v)).transpose()?;
        Ok(())
    }

    /// Builder form of [`set`](Self::set).
    ///
    /// # Errors
    ///
    /// Same as [`set`](Self::set).
    pub fn with(mut self, slot: usize, value: i64) -> OrderingResult<Self> {
        self.set(slot, Some(value))?;
        Ok(self)
    }

    /// Value of slot `slot` (1-based); `None` when unset or out of bounds
    pub fn get(&self, slot: usize) -> Option<u16> {
        slot.checked_sub(1)
            .and_then(|index| self.slots.get(index))
            .copied()
            .flatten()
    }

    pub fn slots(&self) -> [Option<u16>; SUBKEY_SLOTS] {
        self.slots
    }

    pub fn is_unset(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn clear(&mut self) {
        self.slots = [None; SUBKEY_SLOTS];
    }
}

/// Validate a raw value for `slot`
///
/// # Errors
///
/// Returns [`OrderingError::ValueRange`] when `value` does not fit a slot.
pub fn checked_subkey(slot: usize, value: i64) -> OrderingResult<u16> {
    u16::try_from(value).map_err(|_| OrderingError::ValueRange { slot, value })
}

fn compare_slot(a: Option<u16>, b: Option<u16>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.cmp(&b),
    }
}

impl Ord for NaturalOrderKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.slots
            .iter()
            .zip(other.slots.iter())
            .map(|(a, b)| compare_slot(*a, *b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for NaturalOrderKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<[Option<u16>; SUBKEY_SLOTS]> for NaturalOrderKey {
    fn from(slots: [Option<u16>; SUBKEY_SLOTS]) -> Self {
        Self::from_slots(slots)
    }
}

impl fmt::Display for NaturalOrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (index, slot) in self.slots.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            match slot {
                Some(value) => write!(f, "{}", value)?,
                None => f.write_str("-")?,
            }
        }
        f.write_str(")")
    }
}
