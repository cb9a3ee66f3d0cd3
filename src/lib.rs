//! **simpair** - find the two most similar files in a directory tree
//!
//! Files are profiled as bounded word-frequency histograms and compared with
//! cosine similarity. A coarse-to-fine loop scores only neighbours in sorted
//! histogram order, keeps the best-scoring candidates, and repeats with larger
//! histograms until one pair stands out.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Comparison core - histograms, scoring, refinement passes and loop
pub mod core {
    /// Input-contract errors with diagnostic codes
    pub mod error;
    pub use error::CompareError;

    /// Top-K token fingerprint histograms
    pub mod histogram;
    pub use histogram::{Fingerprint, Histogram};

    /// Cosine similarity over sparse histograms
    pub mod similarity;
    pub use similarity::similarity;

    /// Order-preserving bounded worker pool (rayon)
    pub mod pool;
    pub use pool::WorkerPool;

    /// Single refinement pass: build, sort, score neighbours, shortlist
    pub mod pass;
    pub use pass::{BestPair, HistogramBound, PassOutcome, run_pass};

    /// Multi-pass refinement loop with escalating histogram bounds
    pub mod refine;
    pub use refine::{
        Match, PassReport, RefineOptions, RefineOutcome, Terminal, find_most_similar_pair,
    };

    /// `find` command: walk, refine, report
    pub mod find;
    pub use find::run as find_run;
}

/// Infrastructure - configuration, I/O, walking and logging
pub mod infra {
    /// Layered configuration with TOML/YAML/JSON files and env overrides
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Memory-mapped file I/O for large files (>1MB threshold)
    pub mod io;
    pub use io::{FileContent, read_file_smart};

    /// Corpus walking with optional ignore-file support
    pub mod walk;
    pub use walk::FileWalker;

    /// Tracing subscriber initialization
    pub mod logging;
}

pub use crate::cli::{AppContext, Cli, Commands};
pub use crate::core::{
    CompareError, Histogram, HistogramBound, Match, RefineOptions, find_most_similar_pair,
    find_run, similarity,
};
pub use crate::infra::{Config, FileWalker, load_config};
