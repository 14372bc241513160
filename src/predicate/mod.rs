//! Per-item search predicates
//!
//! A predicate decides whether the run of `k` consecutive integers starting at
//! `start` has the property being searched for. Predicates are pure: the same
//! `(start, k)` always yields the same answer, whichever worker or batch
//! evaluates it. The scheduler only sees the [`Predicate`] trait.
//!
//! # Example
//!
//! ```
//! use runsearch::predicate::{Predicate, SquareSumPredicate};
//!
//! let predicate = SquareSumPredicate;
//!
//! // 3² + 4² = 25 = 5²
//! assert!(predicate.evaluate(3, 2));
//! assert!(!predicate.evaluate(1, 2));
//! ```

/// A pure, stateless test over a run of `k` consecutive integers
pub trait Predicate: Send + Sync {
    /// Evaluate the run `start, start + 1, ..., start + k - 1`
    fn evaluate(&self, start: u64, k: u64) -> bool;

    /// Short human-readable name, used in reports
    fn name(&self) -> &'static str;
}

/// "Is the sum of the squares of k consecutive integers a perfect square?"
///
/// Uses the closed form `S(m) = m(m+1)(2m+1)/6` for the sum of the first `m`
/// squares, so a run costs O(1) regardless of `k`. Arithmetic is done in
/// checked `u128`; a run whose sum does not fit reports `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquareSumPredicate;

impl Predicate for SquareSumPredicate {
    fn evaluate(&self, start: u64, k: u64) -> bool {
        if k == 0 {
            return false;
        }
        match run_square_sum(start, k) {
            Some(sum) => is_perfect_square(sum),
            None => false,
        }
    }

    fn name(&self) -> &'static str {
        "square-sum"
    }
}

/// Sum of squares of `start..start + k`, or `None` on overflow
pub fn run_square_sum(start: u64, k: u64) -> Option<u128> {
    let last = (start as u128).checked_add(k as u128)?.checked_sub(1)?;
    let upper = sum_of_squares(last)?;
    let lower = match (start as u128).checked_sub(1) {
        Some(before) => sum_of_squares(before)?,
        None => 0,
    };
    upper.checked_sub(lower)
}

/// `1² + 2² + ... + m²`
fn sum_of_squares(m: u128) -> Option<u128> {
    let a = m;
    let b = m.checked_add(1)?;
    let c = m.checked_mul(2)?.checked_add(1)?;
    // One of m, m+1 is even and one of m, m+1, 2m+1 is divisible by 3;
    // divide early to keep the product in range.
    let (mut a, mut b, mut c) = (a, b, c);
    if a % 2 == 0 {
        a /= 2;
    } else {
        b /= 2;
    }
    if a % 3 == 0 {
        a /= 3;
    } else if b % 3 == 0 {
        b /= 3;
    } else {
        c /= 3;
    }
    a.checked_mul(b)?.checked_mul(c)
}

/// Floor of the square root of `n`
pub fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    // 2^ceil(bits/2) is always >= sqrt(n); Newton descends from above.
    let bits = 128 - n.leading_zeros();
    let mut x: u128 = 1 << ((bits + 1) / 2);
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            return x;
        }
        x = y;
    }
}

/// True if `n` is the square of an integer
pub fn is_perfect_square(n: u128) -> bool {
    let root = isqrt(n);
    root * root == n
}
