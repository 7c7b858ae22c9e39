//! The conversion engine.
//!
//! A scanned number is first attempted on the fast path: with at most
//! `DBL_DIG` significant digits and an exponent within the exact
//! power-of-ten table, one floating multiply or divide is already
//! correctly rounded. Everything else builds an initial approximation by
//! table-driven scaling and then refines it against the exact decimal
//! value: both sides are scaled by powers of 2 and 5 into comparable big
//! integers, their difference is weighed against half an ulp, and the
//! approximation moves by a ratio-sized number of ulps until it is the
//! nearest double, with ties broken to even.
//!
//! Near the bottom of the exponent range the approximation is kept
//! scaled up by 2^(2P) so ulp arithmetic stays in normalized territory;
//! the scale is divided back out after convergence.

use crate::arena::Arena;
use crate::bignum::{cmp, copy, diff, i2b, is_zero, lshift, mult, pow5mult, s2b};
use crate::float::{
    d2b, ratio2, ulp, Raw, BIAS, BIG0, BIG1, BNDRY_MASK, DBL_DIG, DBL_MAX_10_EXP, DBL_MAX_EXP,
    EMIN, EXP_1, EXP_MASK, EXP_MSK1, EXP_SHIFT, LOG2P, N_BIGTENS, P, SCALE_BIT, TEN_PMAX, TINY1,
};
use crate::lib::cmp::Ordering;
use crate::parse::Status;
use crate::powers::{BIGTENS, TENS, TINYTENS};
use crate::scan::Scan;

/// Bound on refinement passes. Convergence takes a handful; the bound
/// only guards against regressions in the arithmetic underneath.
const MAX_ROUNDS: u32 = 64;

/// Outcome of one refinement pass.
enum Step {
    /// The approximation is correctly rounded.
    Accept,
    /// Adjusted by at least one ulp; compare again.
    Retry,
    /// Fell below the smallest denormal.
    Tiny,
    /// Pushed past the largest finite double.
    Huge,
}

/// Convert a scanned number to its magnitude and status. The caller
/// applies the sign.
pub(crate) fn convert(a: &mut Arena, scan: &Scan) -> (f64, Status) {
    let nd = scan.nd;
    let e = scan.e;

    // The first DBL_DIG + 1 digits as a double, exactly.
    let k = nd.min(DBL_DIG + 1);
    let mut rv = Raw(scan.y as f64);
    if k > 9 {
        rv.0 = TENS[k - 9] * rv.0 + scan.z as f64;
    }

    if nd <= DBL_DIG {
        // Round-to-nearest regime: a single multiply or divide by an
        // exact power of ten is correctly rounded on its own.
        if e == 0 {
            return (rv.0, Status::Ok);
        }
        if e > 0 {
            if e <= TEN_PMAX {
                return (rv.0 * TENS[e as usize], Status::Ok);
            }
            let slack = DBL_DIG - nd;
            if e <= TEN_PMAX + slack as i32 {
                // Slide unused mantissa digits over from the exponent;
                // the first multiply stays exact.
                let e = e - slack as i32;
                return (rv.0 * TENS[slack] * TENS[e as usize], Status::Ok);
            }
        } else if e >= -TEN_PMAX {
            return (rv.0 / TENS[-e as usize], Status::Ok);
        }
    }

    // Starting approximation rv * 10^e1. The clamp keeps the exponent
    // arithmetic safe for absurd digit counts; anything beyond it is
    // deep in overflow/underflow territory anyway.
    let mut e1 = (e as i64 + nd as i64 - k as i64).clamp(-40_000, 40_000) as i32;
    let mut scale: i32 = 0;

    if e1 > 0 {
        let i = (e1 & 15) as usize;
        if i != 0 {
            rv.0 *= TENS[i];
        }
        e1 &= !15;
        if e1 != 0 {
            if e1 > DBL_MAX_10_EXP {
                return (f64::MAX, Status::Overflow);
            }
            e1 >>= 4;
            let mut j = 0;
            while e1 > 1 {
                if e1 & 1 != 0 {
                    rv.0 *= BIGTENS[j];
                }
                j += 1;
                e1 >>= 1;
            }
            // The last multiplication could overflow; do it with the
            // exponent pulled down by 2^P and check before restoring.
            rv.set_word0(rv.word0() - P as u32 * EXP_MSK1);
            rv.0 *= BIGTENS[j];
            let z = rv.word0() & EXP_MASK;
            if z > EXP_MSK1 * (DBL_MAX_EXP + BIAS - P) as u32 {
                return (f64::MAX, Status::Overflow);
            }
            if z > EXP_MSK1 * (DBL_MAX_EXP + BIAS - 1 - P) as u32 {
                // Restoring would overflow; saturate at the largest
                // finite value and let the refinement loop decide.
                rv.set_word0(BIG0);
                rv.set_word1(BIG1);
            } else {
                rv.set_word0(rv.word0() + P as u32 * EXP_MSK1);
            }
        }
    } else if e1 < 0 {
        e1 = -e1;
        let i = (e1 & 15) as usize;
        if i != 0 {
            rv.0 /= TENS[i];
        }
        e1 >>= 4;
        if e1 != 0 {
            if e1 >= 1 << N_BIGTENS {
                return (0.0, Status::Underflow);
            }
            if e1 & SCALE_BIT != 0 {
                // Keep the approximation scaled by 2^(2P) so it stays
                // normalized while the exact comparison runs.
                scale = 2 * P;
            }
            let mut j = 0;
            while e1 > 0 {
                if e1 & 1 != 0 {
                    rv.0 *= TINYTENS[j];
                }
                j += 1;
                e1 >>= 1;
            }
            let j = 2 * P + 1 - ((rv.word0() & EXP_MASK) >> EXP_SHIFT) as i32;
            if scale != 0 && j > 0 {
                // Scaled rv is denormal; zap the j low bits.
                if j >= 32 {
                    rv.set_word1(0);
                    if j >= 53 {
                        rv.set_word0((P as u32 + 2) * EXP_MSK1);
                    } else {
                        rv.set_word0(rv.word0() & (0xffff_ffff << (j - 32)));
                    }
                } else {
                    rv.set_word1(rv.word1() & (0xffff_ffff << j));
                }
                if rv.0 == 0.0 {
                    return (0.0, Status::Underflow);
                }
            }
        }
    }

    // Now the hard part: adjusting rv to the correct value against the
    // exact digits. True value = bd0 * 10^e.
    let bd0 = s2b(a, scan.digits, scan.nd0, nd, scan.y);
    let mut rounds = 0;

    loop {
        rounds += 1;
        let mut bd = copy(a, &bd0);
        let (mut bb, bbe, bbbits) = d2b(a, rv.0); // rv = bb * 2^bbe
        let mut bs = i2b(a, 1);

        // Powers of 2 and 5 that bring bd * 10^e, bb * 2^bbe and the
        // half-ulp unit bs onto one scale.
        let (mut bb2, bb5, mut bd2, bd5) = if e >= 0 {
            (0i32, 0i32, e, e)
        } else {
            (-e, -e, 0i32, 0i32)
        };
        if bbe >= 0 {
            bb2 += bbe;
        } else {
            bd2 -= bbe;
        }
        let mut bs2 = bb2;
        let mut j = bbe - scale;
        let logb = j + bbbits - 1; // logb(rv)
        if logb < EMIN {
            // denormal
            j += P - EMIN;
        } else {
            j = P + 1 - bbbits;
        }
        bb2 += j;
        bd2 += j;
        bd2 += scale;
        let common = bb2.min(bd2).min(bs2);
        if common > 0 {
            bb2 -= common;
            bd2 -= common;
            bs2 -= common;
        }
        if bb5 > 0 {
            bs = pow5mult(a, bs, bb5 as u32);
            let t = mult(a, &bs, &bb);
            a.bfree(bb);
            bb = t;
        }
        if bb2 > 0 {
            bb = lshift(a, bb, bb2 as usize);
        }
        if bd5 > 0 {
            bd = pow5mult(a, bd, bd5 as u32);
        }
        if bd2 > 0 {
            bd = lshift(a, bd, bd2 as usize);
        }
        if bs2 > 0 {
            bs = lshift(a, bs, bs2 as usize);
        }

        let mut delta = diff(a, &bb, &bd);
        let dsign = delta.sign;
        delta.sign = false;

        let step = 'adjust: {
            match cmp(a, &delta, &bs) {
                Ordering::Less => {
                    // Error below half an ulp: done, unless the mantissa
                    // is a power of two whose lower neighbors are closer.
                    if dsign
                        || rv.word1() != 0
                        || rv.word0() & BNDRY_MASK != 0
                        || (rv.word0() & EXP_MASK) <= (2 * P as u32 + 1) * EXP_MSK1
                    {
                        break 'adjust Step::Accept;
                    }
                    if is_zero(a, &delta) {
                        // exact result
                        break 'adjust Step::Accept;
                    }
                    delta = lshift(a, delta, LOG2P as usize);
                    if cmp(a, &delta, &bs) == Ordering::Greater {
                        break 'adjust drop_down(&mut rv, scale);
                    }
                    Step::Accept
                }
                Ordering::Equal => {
                    // Exactly half-way between two representables.
                    if dsign {
                        if rv.word0() & BNDRY_MASK == BNDRY_MASK {
                            let y = rv.word0() & EXP_MASK;
                            let all_ones = if scale != 0 && y <= 2 * P as u32 * EXP_MSK1 {
                                // Denormal under scaling: only the bits
                                // above the zapped ones may be set.
                                let sh = 2 * P as u32 + 1 - (y >> EXP_SHIFT);
                                if sh >= 32 {
                                    0
                                } else {
                                    0xffff_ffff << sh
                                }
                            } else {
                                0xffff_ffff
                            };
                            if rv.word1() == all_ones {
                                // boundary case: increment the exponent
                                if rv.word0() == BIG0 && rv.word1() == BIG1 {
                                    break 'adjust Step::Huge;
                                }
                                rv.set_word0((rv.word0() & EXP_MASK) + EXP_MSK1);
                                rv.set_word1(0);
                                break 'adjust Step::Accept;
                            }
                        }
                    } else if rv.word0() & BNDRY_MASK == 0 && rv.word1() == 0 {
                        break 'adjust drop_down(&mut rv, scale);
                    }
                    if rv.word1() & 1 == 0 {
                        // low bit already even: keep rv
                        break 'adjust Step::Accept;
                    }
                    if dsign {
                        rv.0 += ulp(rv.0);
                    } else {
                        rv.0 -= ulp(rv.0);
                        if rv.0 == 0.0 {
                            break 'adjust Step::Tiny;
                        }
                    }
                    Step::Accept
                }
                Ordering::Greater => {
                    // Off by more than half an ulp: move by the measured
                    // ratio, at least one ulp, toward the exact value.
                    let mut aadj = ratio2(a, &delta, &bs);
                    let mut aadj1: f64;
                    if aadj <= 2.0 {
                        if dsign {
                            aadj = 1.0;
                            aadj1 = 1.0;
                        } else if rv.word1() != 0 || rv.word0() & BNDRY_MASK != 0 {
                            if rv.word1() == TINY1 && rv.word0() == 0 {
                                break 'adjust Step::Tiny;
                            }
                            aadj = 1.0;
                            aadj1 = -1.0;
                        } else {
                            // power of two to be rounded down: the gap
                            // below is half the gap above
                            if aadj < 1.0 {
                                aadj = 0.5;
                            } else {
                                aadj *= 0.5;
                            }
                            aadj1 = -aadj;
                        }
                    } else {
                        aadj *= 0.5;
                        aadj1 = if dsign { aadj } else { -aadj };
                    }

                    let y = rv.word0() & EXP_MASK;
                    if y == EXP_MSK1 * (DBL_MAX_EXP + BIAS - 1) as u32 {
                        // Top of the exponent range: adjust with the
                        // exponent pulled down by 2^P, as above.
                        let rv0 = rv;
                        rv.set_word0(rv.word0() - P as u32 * EXP_MSK1);
                        rv.0 += aadj1 * ulp(rv.0);
                        if rv.word0() & EXP_MASK >= EXP_MSK1 * (DBL_MAX_EXP + BIAS - P) as u32 {
                            if rv0.word0() == BIG0 && rv0.word1() == BIG1 {
                                break 'adjust Step::Huge;
                            }
                            rv.set_word0(BIG0);
                            rv.set_word1(BIG1);
                            break 'adjust Step::Retry;
                        }
                        rv.set_word0(rv.word0() + P as u32 * EXP_MSK1);
                    } else {
                        if scale != 0 && y <= 2 * P as u32 * EXP_MSK1 {
                            // Denormal under scaling: round the step to
                            // whole ulps of the final precision.
                            if aadj <= 0x7fff_ffff as f64 {
                                let mut z = aadj as u32;
                                if z == 0 {
                                    z = 1;
                                }
                                aadj = z as f64;
                                aadj1 = if dsign { aadj } else { -aadj };
                            }
                            let mut adj = Raw(aadj1);
                            adj.set_word0(adj.word0() + (2 * P as u32 + 1) * EXP_MSK1 - y);
                            aadj1 = adj.0;
                        }
                        rv.0 += aadj1 * ulp(rv.0);
                    }

                    let z = rv.word0() & EXP_MASK;
                    if scale == 0 && y == z {
                        // Can we stop now?
                        let l = aadj as i64;
                        aadj -= l as f64;
                        // The tolerances below are conservative.
                        if dsign || rv.word1() != 0 || rv.word0() & BNDRY_MASK != 0 {
                            if !(0.4999999..=0.5000001).contains(&aadj) {
                                break 'adjust Step::Accept;
                            }
                        } else if aadj < 0.4999999 / 2.0 {
                            break 'adjust Step::Accept;
                        }
                    }
                    Step::Retry
                }
            }
        };

        a.bfree(bb);
        a.bfree(bd);
        a.bfree(bs);
        a.bfree(delta);
        match step {
            Step::Accept => break,
            Step::Retry => {
                if rounds >= MAX_ROUNDS {
                    debug_assert!(false, "refinement did not converge");
                    break;
                }
            }
            Step::Tiny => {
                a.bfree(bd0);
                return (0.0, Status::Underflow);
            }
            Step::Huge => {
                a.bfree(bd0);
                return (f64::MAX, Status::Overflow);
            }
        }
    }
    a.bfree(bd0);

    if scale != 0 {
        let mut unscale = Raw(0.0);
        unscale.set_word0(EXP_1 - 2 * P as u32 * EXP_MSK1);
        rv.0 *= unscale.0;
    }
    if rv.0 == 0.0 {
        return (0.0, Status::Underflow);
    }
    (rv.0, Status::Ok)
}

/// Boundary case while rounding down: decrement the exponent and fill
/// the mantissa, or report underflow when already at the bottom.
fn drop_down(rv: &mut Raw, scale: i32) -> Step {
    if scale != 0 {
        let l = rv.word0() & EXP_MASK;
        if l <= (2 * P as u32 + 1) * EXP_MSK1 {
            if l > (P as u32 + 2) * EXP_MSK1 {
                // round even: accept rv
                return Step::Accept;
            }
            // rv would drop below the smallest denormal
            return Step::Tiny;
        }
    }
    let l = (rv.word0() & EXP_MASK) - EXP_MSK1;
    rv.set_word0(l | BNDRY_MASK);
    rv.set_word1(0xffff_ffff);
    Step::Accept
}

// TESTS
// -----

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{scan, Scanned};
    use crate::SCRATCH_LIMBS;

    fn conv(input: &str) -> (f64, Status) {
        let mut scratch = [0; SCRATCH_LIMBS];
        let mut a = Arena::new(&mut scratch);
        match scan(input.as_bytes()) {
            Scanned::Number(s) => convert(&mut a, &s),
            _ => panic!("scanner did not yield a number for {:?}", input),
        }
    }

    fn check(input: &str, expected: f64) {
        let (value, status) = conv(input);
        assert_eq!(value, expected, "{:?}", input);
        assert_eq!(status, Status::Ok, "{:?}", input);
    }

    #[test]
    fn fast_path_test() {
        check("7", 7.0);
        check("125", 125.0);
        check("2.5", 2.5);
        check("1e22", 1e22);
        check("123456789012345e-5", 1234567890.12345);
        check("123456789012345e-22", 123456789012345e-22);
        // Slack digits slide over from the exponent.
        check("123e25", 123e25);
        check("9e-23", 9e-23);
    }

    #[test]
    fn refinement_test() {
        // 16+ digits force the exact comparison.
        check("3.141592653589793", 3.141592653589793);
        check("2.718281828459045235360287", 2.718281828459045235360287);
        check("123456789012345678", 123456789012345678.0);
        check("8.98846567431158e307", 8.98846567431158e307);
        check("2.2250738585072011e-308", 2.2250738585072011e-308);
        check("22250738585072011e-324", 2.2250738585072011e-308);
        check("1.7976931348623157e308", f64::MAX);
        check("4.9406564584124654e-324", 5e-324);
    }

    #[test]
    fn tie_even_test() {
        // 2^53 + 1 is halfway; ties go to the even mantissa below.
        check("9007199254740993", 9007199254740992.0);
        // 2^53 + 3 is halfway; ties go to the even mantissa above.
        check("9007199254740995", 9007199254740996.0);
        // A digit past the halfway point breaks the tie upward.
        check("9007199254740993.0000000000000001", 9007199254740994.0);
        check("7205759403792793199999e-5", 72057594037927928.0);
        check("7205759403792793200001e-5", 72057594037927936.0);
    }

    #[test]
    fn long_digit_test() {
        check(
            "1014120480182583464902367222169599999e-5",
            10141204801825834086073718800384.0,
        );
        check(
            "1014120480182583464902367222169600001e-5",
            10141204801825835211973625643008.0,
        );
        check("42.000000000000000000001", 42.000000000000000000001);
    }

    #[test]
    fn overflow_test() {
        assert_eq!(conv("1e309"), (f64::MAX, Status::Overflow));
        assert_eq!(conv("1e99999"), (f64::MAX, Status::Overflow));
        assert_eq!(conv("17976931348623159e292"), (f64::MAX, Status::Overflow));
        // The largest finite double itself is fine.
        check("17976931348623157e292", f64::MAX);
    }

    #[test]
    fn underflow_test() {
        assert_eq!(conv("1e-400"), (0.0, Status::Underflow));
        assert_eq!(conv("1e-324"), (0.0, Status::Underflow));
        assert_eq!(conv("2e-324"), (0.0, Status::Underflow));
        // Above half the smallest denormal rounds up into range.
        check("3e-324", 5e-324);
        check("4e-324", 5e-324);
    }

    #[test]
    fn denormal_test() {
        check("5e-324", 5e-324);
        check("1e-320", 1e-320);
        check("2.2250738585072014e-308", f64::MIN_POSITIVE);
        check("1.1e-308", 1.1e-308);
    }
}
