//! Cosine similarity over sparse histograms.

use std::collections::HashMap;

use super::histogram::{Fingerprint, Histogram};

/// Cosine similarity of two histograms in `[0, 1]`.
///
/// Tokens missing from one side count as zero, so the dot product only needs
/// the shared keys and each norm only its own entries. Returns 0 when either
/// histogram has zero norm.
pub fn similarity(
    h1: &Histogram,
    h2: &Histogram,
) -> f64
{
    let n1 = norm(h1);
    let n2 = norm(h2);
    let denom = n1 * n2;
    if denom == 0.0
    {
        return 0.0;
    }

    // Index the smaller side, probe with the larger one
    let (small, large) = if h1.len() <= h2.len() { (h1, h2) } else { (h2, h1) };
    let lookup: HashMap<Fingerprint, u32> = small
        .iter()
        .copied()
        .collect();

    let dot: f64 = large
        .iter()
        .filter_map(|(fp, c)| {
            lookup
                .get(fp)
                .map(|other| f64::from(*c) * f64::from(*other))
        })
        .sum();

    (dot / denom).clamp(0.0, 1.0)
}

fn norm(h: &Histogram) -> f64
{
    h.iter()
        .map(|(_, c)| f64::from(*c).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests
{
    use super::*;
    use proptest::prelude::*;

    fn hist(pairs: &[(u64, u32)]) -> Histogram
    {
        Histogram::from_entries(pairs.iter().copied())
    }

    #[test]
    fn test_known_value()
    {
        // (1,1) . (1,0) / (sqrt2 * 1)
        let a = hist(&[(1, 1), (2, 1)]);
        let b = hist(&[(1, 3)]);
        let s = similarity(&a, &b);
        assert!((s - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_disjoint_is_zero()
    {
        let a = hist(&[(1, 4), (2, 1)]);
        let b = hist(&[(3, 2), (4, 9)]);
        assert_eq!(similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_empty_is_zero()
    {
        let a = hist(&[(1, 4)]);
        let empty = Histogram::default();
        assert_eq!(similarity(&a, &empty), 0.0);
        assert_eq!(similarity(&empty, &a), 0.0);
        assert_eq!(similarity(&empty, &empty), 0.0);
    }

    #[test]
    fn test_scale_invariant()
    {
        let a = hist(&[(1, 1), (2, 2), (3, 3)]);
        let b = hist(&[(1, 10), (2, 20), (3, 30)]);
        assert!((similarity(&a, &b) - 1.0).abs() < 1e-12);
    }

    fn arb_histogram() -> impl Strategy<Value = Histogram>
    {
        prop::collection::vec((0u64..64, 1u32..50), 0..40).prop_map(Histogram::from_entries)
    }

    proptest! {
        #[test]
        fn prop_self_similarity_is_one(h in arb_histogram()) {
            let s = similarity(&h, &h);
            if h.is_empty() {
                prop_assert_eq!(s, 0.0);
            } else {
                prop_assert!((s - 1.0).abs() < 1e-9);
            }
        }

        #[test]
        fn prop_symmetric(a in arb_histogram(), b in arb_histogram()) {
            prop_assert_eq!(similarity(&a, &b), similarity(&b, &a));
        }

        #[test]
        fn prop_bounded(a in arb_histogram(), b in arb_histogram()) {
            let s = similarity(&a, &b);
            prop_assert!((0.0..=1.0).contains(&s));
        }

        #[test]
        fn prop_order_independent(a in arb_histogram(), b in arb_histogram()) {
            let mut rev: Vec<_> = a.entries().to_vec();
            rev.reverse();
            let shuffled = Histogram::from_entries(rev);
            prop_assert!((similarity(&a, &b) - similarity(&shuffled, &b)).abs() < 1e-12);
        }
    }
}
