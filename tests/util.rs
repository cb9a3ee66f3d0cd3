//! Shared test utilities for integration tests
//!
//! Synthesizes corpora of random-text files with a fixed seed so the
//! refinement scenarios are reproducible.

#![allow(dead_code)]

use std::path::PathBuf;

use assert_fs::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Vocabulary size random files draw from
pub const VOCAB: usize = 2000;

/// Words per random file
pub const WORDS_PER_FILE: usize = 200;

/// Random filler text: `words` tokens from a shared vocabulary, broken into
/// lines of ten.
pub fn random_text(
    rng: &mut StdRng,
    words: usize,
) -> String
{
    let mut out = String::with_capacity(words * 6);
    for i in 0..words
    {
        out.push_str(&format!("w{}", rng.random_range(0..VOCAB)));
        out.push(if i % 10 == 9 { '\n' } else { ' ' });
    }
    out
}

/// A document dominated by one word, so it is easy to tell apart from the
/// random filler files and its near-duplicates sort next to it.
pub fn distinctive_text(rng: &mut StdRng) -> String
{
    let mut out = String::new();
    for para in 0..8
    {
        for i in 0..40
        {
            if i % 4 == 0
            {
                out.push_str("keystone ");
            }
            else
            {
                out.push_str(&format!("d{} ", rng.random_range(0..60)));
            }
        }
        out.push_str(&format!("end{para}\n\n"));
    }
    out
}

/// A paragraph of words that appear nowhere else in the corpus.
pub fn inserted_paragraph() -> String
{
    (0..25)
        .map(|i| format!("inserted{i}"))
        .collect::<Vec<_>>()
        .join(" ")
        + "\n\n"
}

/// Write `n` random files named `rand_NNNN.txt` into `tmp`.
pub fn write_random_files(
    tmp: &assert_fs::TempDir,
    rng: &mut StdRng,
    n: usize,
) -> Vec<PathBuf>
{
    (0..n)
        .map(|i| {
            let name = format!("rand_{i:04}.txt");
            let child = tmp.child(&name);
            child
                .write_str(&random_text(rng, WORDS_PER_FILE))
                .expect("write random file");
            child
                .path()
                .to_path_buf()
        })
        .collect()
}

pub fn seeded(seed: u64) -> StdRng
{
    StdRng::seed_from_u64(seed)
}
