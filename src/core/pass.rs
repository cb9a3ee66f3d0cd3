//! One refinement pass: build histograms, sort, score neighbours, shortlist.
//!
//! Sorting histograms by their natural order puts files with the same
//! dominant words next to each other, so only adjacent pairs get scored.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use itertools::Itertools;
use tracing::{debug, info, instrument};

use super::error::CompareError;
use super::histogram::Histogram;
use super::pool::WorkerPool;
use super::similarity::similarity;

/// Pairs scoring above this fraction of the pass maximum make the shortlist.
pub const SHORTLIST_RATIO: f64 = 0.90;

/// Total token budget an unbounded pass spreads across its files.
pub const HISTOGRAM_BUDGET: usize = 50_000_000;

/// How many entries each histogram of a pass may keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistogramBound
{
    /// Keep the `k` most frequent tokens.
    Top(usize),
    /// Spread [`HISTOGRAM_BUDGET`] evenly over the files of the pass.
    Unbounded,
}

impl HistogramBound
{
    /// Concrete `k` for a pass over `files` files.
    pub fn resolve(
        self,
        files: usize,
    ) -> usize
    {
        match self
        {
            Self::Top(k) => k,
            Self::Unbounded => (HISTOGRAM_BUDGET / files.max(1)).max(1),
        }
    }

    pub fn is_unbounded(self) -> bool
    {
        matches!(self, Self::Unbounded)
    }
}

impl Default for HistogramBound
{
    fn default() -> Self
    {
        Self::Top(50)
    }
}

impl fmt::Display for HistogramBound
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        match self
        {
            Self::Top(k) => write!(f, "{k}"),
            Self::Unbounded => f.write_str("auto"),
        }
    }
}

impl FromStr for HistogramBound
{
    type Err = CompareError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") || s.eq_ignore_ascii_case("unbounded")
        {
            return Ok(Self::Unbounded);
        }
        match s.parse::<usize>()
        {
            Ok(k) if k > 0 => Ok(Self::Top(k)),
            _ => Err(CompareError::InvalidCompareLen(s.to_string())),
        }
    }
}

/// Highest-scoring adjacent pair of a pass, as indices into its file list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestPair
{
    pub score: f64,
    pub first: usize,
    pub second: usize,
}

/// Scores and shortlist derived from one sorted histogram sequence.
#[derive(Debug, Clone)]
pub struct Ranking
{
    pub best: BestPair,
    /// Original file indices, deduplicated, in sorted-sequence order.
    pub shortlist: Vec<usize>,
    pub found_unique: bool,
    /// Adjacent-pair scores in sorted-sequence order.
    pub scores: Vec<f64>,
    pub sorted_index: Vec<usize>,
}

/// Everything a pass hands back to the loop.
#[derive(Debug, Clone)]
pub struct PassOutcome
{
    pub best: BestPair,
    pub shortlist: Vec<PathBuf>,
    pub found_unique: bool,
    pub scores: Vec<f64>,
    pub compare_len: usize,
}

/// Run one pass over `files` with histograms capped by `bound`.
#[instrument(skip_all, fields(files = files.len(), bound = %bound))]
pub fn run_pass(
    files: &[PathBuf],
    bound: HistogramBound,
    pool: &WorkerPool,
) -> Result<PassOutcome, CompareError>
{
    if files.len() < 2
    {
        return Err(CompareError::TooFewFiles { found: files.len() });
    }

    let k = bound.resolve(files.len());
    info!(files = files.len(), compare_len = k, "comparing files");

    let histograms = pool.map(files, |path| Histogram::from_file(path, k));
    let ranking = rank(&histograms, pool)?;

    let shortlist: Vec<PathBuf> = ranking
        .shortlist
        .iter()
        .map(|&i| files[i].clone())
        .collect();

    debug!(
        best = ranking.best.score,
        shortlist = shortlist.len(),
        unique = ranking.found_unique,
        "pass complete"
    );

    Ok(PassOutcome {
        best: ranking.best,
        shortlist,
        found_unique: ranking.found_unique,
        scores: ranking.scores,
        compare_len: k,
    })
}

/// Sort histograms, score adjacent pairs, derive best pair and shortlist.
pub fn rank(
    histograms: &[Histogram],
    pool: &WorkerPool,
) -> Result<Ranking, CompareError>
{
    if histograms.len() < 2
    {
        return Err(CompareError::TooFewFiles { found: histograms.len() });
    }

    let mut sorted_index: Vec<usize> = (0..histograms.len()).collect();
    sorted_index.sort_by(|&a, &b| histograms[a].cmp(&histograms[b]));

    let pairs: Vec<(&Histogram, &Histogram)> = sorted_index
        .iter()
        .tuple_windows()
        .map(|(&a, &b)| (&histograms[a], &histograms[b]))
        .collect();
    let scores = pool.map_pairs(&pairs, |(a, b)| similarity(a, b));

    // First occurrence wins on ties
    let (argmax, max) = scores
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::MIN), |acc, (i, s)| if s > acc.1 { (i, s) } else { acc });

    let best = BestPair {
        score: max,
        first: sorted_index[argmax],
        second: sorted_index[argmax + 1],
    };

    let cutoff = SHORTLIST_RATIO * max;
    let positions: BTreeSet<usize> = scores
        .iter()
        .enumerate()
        .filter(|(_, s)| **s > cutoff)
        .flat_map(|(i, _)| [i, i + 1])
        .collect();
    let shortlist = positions
        .into_iter()
        .map(|p| sorted_index[p])
        .collect();

    let found_unique = scores
        .iter()
        .filter(|s| **s == max)
        .count()
        == 1;

    Ok(Ranking { best, shortlist, found_unique, scores, sorted_index })
}

#[cfg(test)]
mod tests
{
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn texts(items: &[&str]) -> Vec<Histogram>
    {
        items
            .iter()
            .map(|t| Histogram::from_text(t, 50))
            .collect()
    }

    #[test]
    fn test_bound_parse_and_resolve()
    {
        assert_eq!("auto".parse::<HistogramBound>().unwrap(), HistogramBound::Unbounded);
        assert_eq!("120".parse::<HistogramBound>().unwrap(), HistogramBound::Top(120));
        assert!("0".parse::<HistogramBound>().is_err());
        assert!("lots".parse::<HistogramBound>().is_err());

        assert_eq!(HistogramBound::Unbounded.resolve(1000), 50_000);
        assert_eq!(HistogramBound::Top(8).resolve(1000), 8);
        assert_eq!(HistogramBound::Unbounded.resolve(100_000_000), 1);
    }

    #[test]
    fn test_identical_pair_is_best()
    {
        let hs = texts(&[
            "apple banana cherry",
            "one two three four",
            "red green blue",
            "one two three four",
        ]);
        let r = rank(&hs, &WorkerPool::sequential()).unwrap();

        let mut pair = [r.best.first, r.best.second];
        pair.sort();
        assert_eq!(pair, [1, 3]);
        assert!((r.best.score - 1.0).abs() < 1e-12);
        assert!(r.found_unique);
        assert_eq!(r.scores.len(), 3);
    }

    #[test]
    fn test_shortlist_contains_best_pair()
    {
        let hs = texts(&[
            "a a a b b c",
            "a a a b b d",
            "x y z",
            "a a b",
            "q r s t",
        ]);
        let r = rank(&hs, &WorkerPool::sequential()).unwrap();
        assert!(r.shortlist.contains(&r.best.first));
        assert!(r.shortlist.contains(&r.best.second));

        let mut dedup = r.shortlist.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), r.shortlist.len());
    }

    #[test]
    fn test_ties_are_not_unique()
    {
        let hs = texts(&["same words", "same words", "other text", "other text"]);
        let r = rank(&hs, &WorkerPool::sequential()).unwrap();
        assert!((r.best.score - 1.0).abs() < 1e-12);
        assert!(!r.found_unique);
        assert_eq!(r.shortlist.len(), 4);
    }

    #[test]
    fn test_all_zero_scores_give_empty_shortlist()
    {
        let hs = texts(&["alpha", "beta", "gamma"]);
        let r = rank(&hs, &WorkerPool::sequential()).unwrap();
        assert_eq!(r.best.score, 0.0);
        assert!(r.shortlist.is_empty());
        assert!(!r.found_unique);
    }

    #[test]
    fn test_empty_histograms_score_zero()
    {
        let hs = vec![Histogram::default(), Histogram::default(), Histogram::from_text("w", 5)];
        let r = rank(&hs, &WorkerPool::sequential()).unwrap();
        assert!(r.scores.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_too_few_files()
    {
        let hs = texts(&["only"]);
        assert!(matches!(
            rank(&hs, &WorkerPool::sequential()),
            Err(CompareError::TooFewFiles { found: 1 })
        ));
        assert!(matches!(
            run_pass(&[], HistogramBound::Top(5), &WorkerPool::sequential()),
            Err(CompareError::TooFewFiles { found: 0 })
        ));
    }

    #[test]
    fn test_run_pass_on_disk_with_missing_file()
    {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("a.txt"), "the quick brown fox jumps").unwrap();
        fs::write(root.join("b.txt"), "the quick brown fox jumps").unwrap();
        fs::write(root.join("c.txt"), "lorem ipsum dolor sit amet").unwrap();

        let files = vec![
            root.join("a.txt"),
            root.join("missing.txt"),
            root.join("c.txt"),
            root.join("b.txt"),
        ];
        let out = run_pass(&files, HistogramBound::Top(50), &WorkerPool::sequential()).unwrap();

        let mut pair = [out.best.first, out.best.second];
        pair.sort();
        assert_eq!(pair, [0, 3]);
        assert_eq!(out.compare_len, 50);
        assert_eq!(out.shortlist.len(), 2);
        assert!(out.shortlist.contains(&files[0]));
        assert!(out.shortlist.contains(&files[3]));
    }

    #[test]
    fn test_parallel_rank_matches_sequential()
    {
        let hs: Vec<Histogram> = (0..300)
            .map(|i| Histogram::from_text(&format!("w{} w{} w{}", i % 7, i % 11, i % 13), 50))
            .collect();
        let seq = rank(&hs, &WorkerPool::sequential()).unwrap();
        let par = rank(&hs, &WorkerPool::new(4).unwrap()).unwrap();
        assert_eq!(seq.scores, par.scores);
        assert_eq!(seq.best, par.best);
        assert_eq!(seq.shortlist, par.shortlist);
    }
}
