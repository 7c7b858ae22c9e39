//! Public entry points.

use crate::algorithm::convert;
use crate::arena::{Arena, SCRATCH_LIMBS};
use crate::bignum::Limb;
use crate::lib::fmt::{self, Display};
use crate::scan::{scan, Scanned};

/// Outcome flag of a conversion.
///
/// Not a failure: a usable double always accompanies it. Overflow and
/// underflow report that the decimal value fell outside the representable
/// range and a sentinel was returned in its place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// The value is the correctly rounded conversion of the input.
    Ok,
    /// Magnitude above the largest finite double; the value is
    /// `f64::MAX` with the input's sign.
    Overflow,
    /// Magnitude rounded to zero; the value is zero with the input's
    /// sign.
    Underflow,
}

impl Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => f.write_str("ok"),
            Status::Overflow => f.write_str("decimal magnitude above the double range"),
            Status::Underflow => f.write_str("decimal magnitude rounded to zero"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Status {}

/// Result of one conversion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Parsed {
    /// The nearest representable double, or a range sentinel.
    pub value: f64,
    /// Bytes of input belonging to the number; 0 when the input had no
    /// digits at all (the value is then 0.0 with `Status::Ok`, and the
    /// caller decides whether that constitutes an error).
    pub consumed: usize,
    pub status: Status,
}

/// Convert the leading decimal number of `input` to the nearest `f64`.
///
/// The scratch arena backing the big-integer arithmetic lives on the
/// stack for the duration of the call.
///
/// ```
/// assert_eq!(dtod::parse(b"0.1abc").value, 0.1);
/// assert_eq!(dtod::parse(b"0.1abc").consumed, 3);
/// ```
pub fn parse(input: &[u8]) -> Parsed {
    let mut scratch = [0; SCRATCH_LIMBS];
    parse_with(&mut scratch, input)
}

/// Like [`parse`], over a caller-supplied scratch buffer.
///
/// `SCRATCH_LIMBS` limbs keep the conversion free of heap allocation for
/// realistic inputs; a smaller buffer still converts correctly and falls
/// back to the heap for what does not fit.
pub fn parse_with(scratch: &mut [Limb], input: &[u8]) -> Parsed {
    let mut arena = Arena::new(scratch);
    match scan(input) {
        Scanned::Nothing => Parsed {
            value: 0.0,
            consumed: 0,
            status: Status::Ok,
        },
        Scanned::Zero { neg, consumed } => Parsed {
            value: if neg { -0.0 } else { 0.0 },
            consumed,
            status: Status::Ok,
        },
        Scanned::Number(number) => {
            let (magnitude, status) = convert(&mut arena, &number);
            Parsed {
                value: if number.neg { -magnitude } else { magnitude },
                consumed: number.consumed,
                status,
            }
        }
    }
}

/// Convenience for callers that only want the value, the shape a driver
/// uses when decoding numeric text fields.
pub fn to_f64(input: &[u8]) -> f64 {
    parse(input).value
}

// TESTS
// -----

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_test() {
        let p = parse(b"0");
        assert_eq!((p.value, p.consumed, p.status), (0.0, 1, Status::Ok));

        let p = parse(b"3.14159265358979");
        assert_eq!(p.value, 3.14159265358979);
        assert_eq!(p.consumed, 16);

        let p = parse(b"-2.5e3,next");
        assert_eq!((p.value, p.consumed), (-2500.0, 6));
    }

    #[test]
    fn nothing_consumed_test() {
        let p = parse(b"   ");
        assert_eq!((p.value, p.consumed, p.status), (0.0, 0, Status::Ok));
        assert_eq!(parse(b"").consumed, 0);
        assert_eq!(parse(b"x").consumed, 0);
    }

    #[test]
    fn signed_zero_test() {
        let p = parse(b"-0");
        assert_eq!(p.value, 0.0);
        assert!(p.value.is_sign_negative());
        assert_eq!(p.status, Status::Ok);

        let p = parse(b"-1e-400");
        assert_eq!(p.value, 0.0);
        assert!(p.value.is_sign_negative());
        assert_eq!(p.status, Status::Underflow);
    }

    #[test]
    fn range_sentinel_test() {
        let p = parse(b"1e400");
        assert_eq!((p.value, p.status), (f64::MAX, Status::Overflow));
        let p = parse(b"-1e400");
        assert_eq!((p.value, p.status), (-f64::MAX, Status::Overflow));
    }

    #[test]
    fn caller_scratch_test() {
        // A deliberately tiny scratch buffer forces the heap fallback
        // without changing the result.
        let mut scratch = [0; 8];
        let p = parse_with(&mut scratch, b"2.2250738585072011e-308");
        assert_eq!(p.value, 2.2250738585072011e-308);
        assert_eq!(p.status, Status::Ok);
    }

    #[test]
    fn to_f64_test() {
        assert_eq!(to_f64(b"42"), 42.0);
        assert_eq!(to_f64(b"junk"), 0.0);
    }
}
