//! Nearest subset sum.
//!
//! A customer pays several open invoices in one transfer, or one invoice in
//! several; given the candidate amounts, find the combination of at least two
//! whose total is closest to what arrived.
//!
//! Exhaustive over all 2^n subsets, so `n` is capped at [`MAX_AMOUNTS`].
//! Amounts are handled in cents to keep totals exact.

use anyhow::{Result, bail};

pub const MAX_AMOUNTS: usize = 20;

/// Largest magnitude in cents for an amount or target; any sum of
/// [`MAX_AMOUNTS`] amounts minus a target stays within `i64`.
const MAX_CENTS: i64 = i64::MAX / (MAX_AMOUNTS as i64 + 1);

/// Closest combination found for a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SumMatch {
    pub sum_cents: i64,
    pub combination_cents: Vec<i64>,
    /// target - sum; positive when the combination falls short
    pub difference_cents: i64,
}

impl SumMatch {
    pub fn sum(&self) -> f64 {
        from_cents(self.sum_cents)
    }

    pub fn combination(&self) -> Vec<f64> {
        self.combination_cents.iter().copied().map(from_cents).collect()
    }

    pub fn count(&self) -> usize {
        self.combination_cents.len()
    }

    pub fn difference(&self) -> f64 {
        from_cents(self.difference_cents)
    }
}

#[derive(Debug, Clone)]
pub struct SumFinder {
    cents: Vec<i64>,
}

impl SumFinder {
    pub fn new(amounts: &[f64]) -> Result<Self> {
        if amounts.len() > MAX_AMOUNTS {
            bail!(
                "{} amounts given, at most {} can be combined",
                amounts.len(),
                MAX_AMOUNTS
            );
        }
        let cents = amounts.iter().map(|&a| to_cents(a)).collect::<Result<Vec<_>>>()?;
        Ok(Self { cents })
    }

    /// Number of combinations with two or more summands.
    pub fn combination_count(&self) -> u64 {
        let n = self.cents.len() as u32;
        if n < 2 { 0 } else { (1u64 << n) - u64::from(n) - 1 }
    }

    /// Sum of all amounts.
    pub fn total(&self) -> f64 {
        from_cents(self.cents.iter().sum())
    }

    /// Combination closest to `target`; `None` with fewer than two amounts.
    ///
    /// Ties go to the smaller sum, then to the combination of the earliest amounts.
    pub fn nearest(&self, target: f64) -> Result<Option<SumMatch>> {
        let target = to_cents(target)?;
        let n = self.cents.len();

        // (distance, sum, mask)
        let mut best: Option<(i64, i64, u32)> = None;
        for mask in 1u32..(1u32 << n) {
            if mask.count_ones() < 2 {
                continue;
            }
            let sum = self.sum_of(mask);
            let key = ((target - sum).abs(), sum, mask);
            if best.is_none_or(|b| key < b) {
                best = Some(key);
            }
        }

        Ok(best.map(|(_, sum, mask)| SumMatch {
            sum_cents: sum,
            combination_cents: self.pick(mask),
            difference_cents: target - sum,
        }))
    }

    fn sum_of(&self, mask: u32) -> i64 {
        self.cents
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << *i) != 0)
            .map(|(_, c)| c)
            .sum()
    }

    fn pick(&self, mask: u32) -> Vec<i64> {
        self.cents
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << *i) != 0)
            .map(|(_, &c)| c)
            .collect()
    }
}

fn to_cents(amount: f64) -> Result<i64> {
    if !amount.is_finite() {
        bail!("amount {amount} is not a finite number");
    }
    let cents = (amount * 100.0).round();
    if cents.abs() > MAX_CENTS as f64 {
        bail!("amount {amount} is too large to combine");
    }
    Ok(cents as i64)
}

fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}
