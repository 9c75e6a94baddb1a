//! Natural ordering keys
//!
//! Names such as `Ethernet1/10` or rack unit positions do not sort correctly
//! as strings. Records that need natural ordering carry a [`NaturalOrderKey`]:
//! six optional numeric slots derived from the name, compared slot by slot.
//!
//! Slot values are limited to `0..=65535`; anything else is rejected with
//! [`OrderingError::ValueRange`] when the slot is assigned. Unset slots sort
//! before set ones.
//!
//! # Example
//!
//! ```rust
//! use natural_order::NaturalOrderKey;
//!
//! let port_2 = NaturalOrderKey::unset().with(1, 1)?.with(2, 2)?;
//! let port_10 = NaturalOrderKey::unset().with(1, 1)?.with(2, 10)?;
//! assert!(port_2 < port_10);
//!
//! assert!(NaturalOrderKey::unset().with(1, 65536).is_err());
//! # Ok::<(), natural_order::OrderingError>(())
//! ```

pub mod error;
pub mod key;
pub mod orderable;

pub use error::*;
pub use key::*;
pub use orderable::*;
