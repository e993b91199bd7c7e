//! String similarity policies used to match reference products
//!
//! Scores are on a 0-100 scale. `ratio` is the normalised indel similarity
//! `200 * LCS / (|a| + |b|)`, `partial_ratio` the best `ratio` of the shorter
//! string against every equal-length window of the longer one.

use serde::{Deserialize, Serialize};

/// Decides whether a consumer's reference product matches a supplier group.
pub trait Similarity {
    fn similar(&self, a: &str, b: &str) -> bool;
}

impl<F> Similarity for F
where
    F: Fn(&str, &str) -> bool,
{
    fn similar(&self, a: &str, b: &str) -> bool {
        self(a, b)
    }
}

/// Exact string equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactSimilarity;

impl Similarity for ExactSimilarity {
    fn similar(&self, a: &str, b: &str) -> bool {
        a == b
    }
}

/// Fuzzy match: similar if `partial_ratio > partial_threshold` or
/// `ratio > ratio_threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuzzySimilarity {
    pub partial_threshold: f64,
    pub ratio_threshold: f64,
}

impl Default for FuzzySimilarity {
    fn default() -> Self {
        Self {
            partial_threshold: 90.0,
            ratio_threshold: 40.0,
        }
    }
}

impl Similarity for FuzzySimilarity {
    fn similar(&self, a: &str, b: &str) -> bool {
        partial_ratio(a, b) > self.partial_threshold || ratio(a, b) > self.ratio_threshold
    }
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

/// Normalised indel similarity of two strings.
#[must_use]
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best [`ratio`] of the shorter string against any window of the longer.
#[must_use]
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let mut best = 0.0_f64;
    for window in long.windows(short.len()) {
        best = best.max(ratio_chars(&short, window));
        if best >= 100.0 {
            break;
        }
    }
    best
}
