//! Correctly rounded conversion of decimal strings to IEEE-754 doubles.
//!
//! The crate converts the leading decimal number of a byte range into the
//! nearest representable `f64`, together with the number of bytes consumed
//! and an overflow/underflow flag. Inputs with up to `DBL_DIG` significant
//! digits and a small exponent are handled with a single table-driven
//! floating-point operation; everything else goes through an exact
//! big-integer comparison that adjusts the approximation one unit in the
//! last place at a time until it is correctly rounded, with ties broken
//! to even.
//!
//! The big-integer arithmetic draws its storage from a scratch arena so a
//! conversion performs no heap allocation for realistic inputs. `parse`
//! carries the scratch on the stack; `parse_with` accepts a caller-owned
//! buffer for callers that want to place or reuse it themselves.
//!
//! ```
//! let parsed = dtod::parse(b"3.14159265358979");
//! assert_eq!(parsed.value, 3.14159265358979);
//! assert_eq!(parsed.consumed, 16);
//! assert_eq!(parsed.status, dtod::Status::Ok);
//! ```

// FEATURES

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

/// Facade around the core features for name mangling.
pub(crate) mod lib {
    #[cfg(feature = "std")]
    pub(crate) use std::*;

    #[cfg(not(feature = "std"))]
    pub(crate) use core::*;

    #[cfg(feature = "std")]
    pub(crate) use std::{boxed::Box, vec::Vec};

    #[cfg(not(feature = "std"))]
    pub(crate) use ::alloc::{boxed::Box, vec::Vec};
}

// MODULES
mod algorithm;
mod arena;
mod bignum;
mod digit;
mod float;
mod parse;
mod powers;
mod scan;

// API
pub use self::arena::SCRATCH_LIMBS;
pub use self::parse::{parse, parse_with, to_f64, Parsed, Status};
