//! Coarse-to-fine refinement loop.
//!
//! Each pass shrinks the candidate set to its shortlist and grows the
//! histogram bound, until the shortlist collapses, stops changing, becomes
//! small enough for full-resolution histograms, or the bound passes
//! [`BAILOUT_COMPARE_LEN`].

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, instrument};

use super::error::CompareError;
use super::pass::{BestPair, HistogramBound, PassOutcome, run_pass};
use super::pool::WorkerPool;

/// Shortlists smaller than this get full-resolution histograms.
pub const EXHAUSTIVE_SHORTLIST_LEN: usize = 500;

/// Bound past which the loop gives up and reports its current best.
pub const BAILOUT_COMPARE_LEN: usize = 10_000;

pub const MIN_SCALE_FACTOR: usize = 2;
pub const MAX_SCALE_FACTOR: usize = 6;

/// Tunables of a refinement run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefineOptions
{
    pub initial_bound: HistogramBound,
    pub workers: usize,
    pub scale_factor: usize,
}

impl Default for RefineOptions
{
    fn default() -> Self
    {
        Self { initial_bound: HistogramBound::default(), workers: 1, scale_factor: 2 }
    }
}

impl RefineOptions
{
    pub fn validate(&self) -> Result<(), CompareError>
    {
        if !(MIN_SCALE_FACTOR..=MAX_SCALE_FACTOR).contains(&self.scale_factor)
        {
            return Err(CompareError::InvalidScaleFactor(self.scale_factor));
        }
        if self.workers == 0
        {
            return Err(CompareError::InvalidWorkers);
        }
        Ok(())
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminal
{
    /// One or zero candidates left.
    Converged,
    /// Shortlist equals the searched files and a single best score exists.
    StableUnique,
    /// The pass just run used full-resolution histograms.
    Exhaustive,
    /// The bound grew past the ceiling without converging.
    Bailout,
}

/// Per-pass summary for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassReport
{
    pub files: usize,
    pub compare_len: usize,
    pub shortlist: usize,
    pub best_score: f64,
    pub found_unique: bool,
    /// Adjacent-pair scores in sorted order, `files - 1` of them.
    pub scores: Vec<f64>,
}

impl PassReport
{
    fn new(
        files: usize,
        outcome: &PassOutcome,
    ) -> Self
    {
        Self {
            files,
            compare_len: outcome.compare_len,
            shortlist: outcome.shortlist.len(),
            best_score: outcome.best.score,
            found_unique: outcome.found_unique,
            scores: outcome
                .scores
                .clone(),
        }
    }
}

/// Final answer: the two files judged most similar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match
{
    pub score: f64,
    pub first: PathBuf,
    pub second: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RefineOutcome
{
    pub best: Match,
    pub terminal: Terminal,
    pub passes: Vec<PassReport>,
    /// Shortlist produced by the last pass.
    pub shortlist: Vec<PathBuf>,
}

/// Find the most similar pair among `files`.
pub fn find_most_similar_pair(
    files: &[PathBuf],
    options: &RefineOptions,
) -> Result<RefineOutcome, CompareError>
{
    find_most_similar_pair_with(files, options, |_, _| {})
}

/// Like [`find_most_similar_pair`], calling `on_pass` before every pass
/// with the file count and bound it is about to use.
#[instrument(skip_all, fields(files = files.len()))]
pub fn find_most_similar_pair_with<F>(
    files: &[PathBuf],
    options: &RefineOptions,
    mut on_pass: F,
) -> Result<RefineOutcome, CompareError>
where
    F: FnMut(usize, HistogramBound),
{
    if files.is_empty()
    {
        return Err(CompareError::EmptyCorpus);
    }
    if files.len() < 2
    {
        return Err(CompareError::TooFewFiles { found: files.len() });
    }
    options.validate()?;

    let pool = WorkerPool::new(options.workers)?;
    let mut bound = options.initial_bound;
    let mut searched: Vec<PathBuf> = files.to_vec();
    let mut passes = Vec::new();

    on_pass(searched.len(), bound);
    let mut outcome = run_pass(&searched, bound, &pool)?;
    passes.push(PassReport::new(searched.len(), &outcome));

    let terminal = if bound.is_unbounded()
    {
        Terminal::Exhaustive
    }
    else
    {
        loop
        {
            if outcome.shortlist.len() <= 1
            {
                break Terminal::Converged;
            }

            bound = next_bound(bound, outcome.shortlist.len(), options.scale_factor);
            searched = std::mem::take(&mut outcome.shortlist);

            on_pass(searched.len(), bound);
            outcome = run_pass(&searched, bound, &pool)?;
            passes.push(PassReport::new(searched.len(), &outcome));

            // Checked in this order: a stable unique result outranks exhaustion.
            // Both lists are in sorted order, so a reordering counts as a change.
            if outcome.found_unique && outcome.shortlist == searched
            {
                break Terminal::StableUnique;
            }
            if bound.is_unbounded()
            {
                break Terminal::Exhaustive;
            }

            if matches!(bound, HistogramBound::Top(k) if k > BAILOUT_COMPARE_LEN)
            {
                break Terminal::Bailout;
            }
        }
    };

    info!(passes = passes.len(), ?terminal, score = outcome.best.score, "refinement finished");

    let best = resolve(&searched, outcome.best);
    debug!(first = %best.first.display(), second = %best.second.display(), "best pair");

    Ok(RefineOutcome { best, terminal, passes, shortlist: outcome.shortlist })
}

/// Bound for the pass after one that produced `shortlist_len` candidates.
pub fn next_bound(
    current: HistogramBound,
    shortlist_len: usize,
    scale_factor: usize,
) -> HistogramBound
{
    if shortlist_len < EXHAUSTIVE_SHORTLIST_LEN
    {
        return HistogramBound::Unbounded;
    }
    match current
    {
        HistogramBound::Top(k) => HistogramBound::Top(k.saturating_mul(scale_factor)),
        HistogramBound::Unbounded => HistogramBound::Unbounded,
    }
}

fn resolve(
    files: &[PathBuf],
    best: BestPair,
) -> Match
{
    Match {
        score: best.score,
        first: files[best.first].clone(),
        second: files[best.second].clone(),
    }
}
