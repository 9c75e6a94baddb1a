use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderingError {
    /// A subkey value does not fit the slot width
    #[error("Subkey value {value} in slot {slot} is outside 0..={max}", max = crate::MAX_SUBKEY)]
    ValueRange { slot: usize, value: i64 },

    /// A numeric component too long to read as an integer
    #[error("Subkey value {digits} in slot {slot} is outside 0..={max}", max = crate::MAX_SUBKEY)]
    DigitsRange { slot: usize, digits: String },

    #[error("Subkey slot {0} does not exist (slots are 1..={n})", n = crate::SUBKEY_SLOTS)]
    SlotIndex(usize),
}

pub type OrderingResult<T> = std::result::Result<T, OrderingError>;
