//! Errors surfaced by the comparison core.
//!
//! Unreadable files and zero-norm comparisons are not errors: they degrade to
//! empty histograms and zero scores. Only input-contract violations land here.

use miette::Diagnostic;

#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum CompareError
{
    #[error("no input files to compare")]
    #[diagnostic(
        code(simpair::empty_corpus),
        help("point simpair at a directory that contains at least two files")
    )]
    EmptyCorpus,

    #[error("need at least 2 files to compare, found {found}")]
    #[diagnostic(code(simpair::too_few_files))]
    TooFewFiles { found: usize },

    #[error("scale factor must be between 2 and 6, got {0}")]
    #[diagnostic(code(simpair::scale_factor))]
    InvalidScaleFactor(usize),

    #[error("worker count must be at least 1")]
    #[diagnostic(code(simpair::workers))]
    InvalidWorkers,

    #[error("invalid compare length '{0}' (expected a positive integer or 'auto')")]
    #[diagnostic(code(simpair::compare_len))]
    InvalidCompareLen(String),

    #[error("failed to start worker pool: {0}")]
    #[diagnostic(code(simpair::pool))]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
