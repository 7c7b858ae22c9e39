//! Precomputed power tables for the conversion algorithm.

use crate::bignum::Limb;

/// Precalculated values of 10**i for i in range [0, 22].
/// Each value can be **exactly** represented as an `f64`.
pub(crate) const TENS: [f64; 23] = [
    1.0,
    10.0,
    100.0,
    1000.0,
    10000.0,
    100000.0,
    1000000.0,
    10000000.0,
    100000000.0,
    1000000000.0,
    10000000000.0,
    100000000000.0,
    1000000000000.0,
    10000000000000.0,
    100000000000000.0,
    1000000000000000.0,
    10000000000000000.0,
    100000000000000000.0,
    1000000000000000000.0,
    10000000000000000000.0,
    100000000000000000000.0,
    1000000000000000000000.0,
    10000000000000000000000.0,
];

/// 10**(16 * 2**i), for scaling the initial approximation upward.
pub(crate) const BIGTENS: [f64; 5] = [1e16, 1e32, 1e64, 1e128, 1e256];

/// 10**-(16 * 2**i), for scaling the initial approximation downward.
///
/// The last entry is 2**106 * 1e-256 so that a scaled approximation stays
/// normalized while the exact comparison runs; the scale factor is divided
/// back out once the result has converged.
pub(crate) const TINYTENS: [f64; 5] = [
    1e-16,
    1e-32,
    1e-64,
    1e-128,
    9007199254740992.0 * 9007199254740992e-256,
];

/// Small powers of five for the low bits of a power-of-five multiply.
pub(crate) const P05: [Limb; 3] = [5, 25, 125];

/// 5**(4 * 2**i) as little-endian limbs, i in [0, 6].
///
/// Larger powers are produced by squaring the last entry on the fly.
pub(crate) const POW5: [&[Limb]; 7] = [
    // 5^4
    &[0x00000271],
    // 5^8
    &[0x0005f5e1],
    // 5^16
    &[0x86f26fc1, 0x00000023],
    // 5^32
    &[0x85acef81, 0x2d6d415b, 0x000004ee],
    // 5^64
    &[0xbf6a1f01, 0x6e38ed64, 0xdaa797ed, 0xe93ff9f4, 0x00184f03],
    // 5^128
    &[
        0x2e953e01, 0x03df9909, 0x0f1538fd, 0x2374e42f, 0xd3cff5ec, 0xc404dc08, 0xbccdb0da,
        0xa6337f19, 0xe91f2603, 0x0000024e,
    ],
    // 5^256
    &[
        0x982e7c01, 0xbed3875b, 0xd8d99f72, 0x12152f87, 0x6bde50c6, 0xcf4a6e70, 0xd595d80f,
        0x26b2716e, 0xadc666b0, 0x1d153624, 0x3c42d35a, 0x63ff540e, 0xcc5573c0, 0x65f9ef17,
        0x55bc28f2, 0x80dcc7f7, 0xf46eeddc, 0x5fdcefce, 0x000553f7,
    ],
];

// TESTS
// -----

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tens_exact_test() {
        let mut v: u128 = 1;
        for t in &TENS {
            assert_eq!(*t, v as f64);
            v *= 10;
        }
    }

    #[test]
    fn pow5_table_test() {
        // Each table entry is the square of the previous one.
        for w in POW5.windows(2) {
            let mut square = [0u64; 40];
            for (i, &x) in w[0].iter().enumerate() {
                let mut carry = 0u64;
                for (j, &y) in w[0].iter().enumerate() {
                    let t = x as u64 * y as u64 + square[i + j] + carry;
                    square[i + j] = t & 0xffff_ffff;
                    carry = t >> 32;
                }
                square[i + w[0].len()] += carry;
            }
            for (i, &limb) in w[1].iter().enumerate() {
                assert_eq!(square[i], limb as u64);
            }
            for s in &square[w[1].len()..] {
                assert_eq!(*s, 0);
            }
        }
    }
}
