//! Bounded word-frequency histograms.
//!
//! A file is split on `\n`, each line on `' '`, tokens are trimmed of
//! trailing whitespace and empty ones dropped. Counts are kept per token
//! fingerprint and truncated to the `k` most frequent entries.

use std::path::Path;

use indexmap::IndexMap;
use tracing::warn;
use xxhash_rust::xxh64::xxh64;

use crate::infra::io::read_file_smart;

/// Fixed-width stand-in for a token string (xxh64, seed 0).
///
/// Two distinct tokens may collide and are then counted as one word. At 64
/// bits this is negligible for realistic vocabularies and keeps histograms
/// independent of token length.
pub type Fingerprint = u64;

/// Top-K token profile of one file, ordered by descending count.
///
/// Equal counts keep the order in which the tokens first appeared, so the
/// derived `Ord` (lexicographic over the entries) is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Histogram
{
    entries: Vec<(Fingerprint, u32)>,
}

impl Histogram
{
    /// Build from raw text, keeping at most `k` entries.
    pub fn from_text(
        text: &str,
        k: usize,
    ) -> Self
    {
        let mut counts: IndexMap<Fingerprint, u32> = IndexMap::new();

        for token in tokens(text)
        {
            add_count(
                counts
                    .entry(fingerprint(token))
                    .or_insert(0),
                1,
            );
        }

        let mut entries: Vec<(Fingerprint, u32)> = counts.into_iter().collect();

        // Stable sort keeps first-occurrence order among equal counts
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(k);

        Self { entries }
    }

    /// Build from a file on disk. Unreadable files yield an empty histogram.
    pub fn from_file(
        path: &Path,
        k: usize,
    ) -> Self
    {
        match read_file_smart(path)
        {
            Ok(content) => Self::from_text(content.as_ref(), k),
            Err(err) =>
            {
                warn!(path = %path.display(), error = %format!("{err:#}"), "unreadable file, using empty histogram");
                Self::default()
            }
        }
    }

    /// Assemble directly from entries. Duplicate fingerprints are merged and
    /// zero counts dropped so the histogram invariants hold.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Fingerprint, u32)>,
    {
        let mut counts: IndexMap<Fingerprint, u32> = IndexMap::new();
        for (fp, count) in entries
        {
            if count > 0
            {
                add_count(counts.entry(fp).or_insert(0), count);
            }
        }

        let mut entries: Vec<(Fingerprint, u32)> = counts.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        Self { entries }
    }

    pub fn entries(&self) -> &[(Fingerprint, u32)]
    {
        &self.entries
    }

    pub fn len(&self) -> usize
    {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Fingerprint, u32)>
    {
        self.entries.iter()
    }
}

/// Counts saturate at `u32::MAX` instead of wrapping on huge inputs.
fn add_count(
    slot: &mut u32,
    by: u32,
)
{
    *slot = slot.saturating_add(by);
}

/// Fingerprint a single token.
pub fn fingerprint(token: &str) -> Fingerprint
{
    xxh64(token.as_bytes(), 0)
}

/// Split text into tokens: per line, per space, trailing whitespace trimmed.
pub fn tokens(text: &str) -> impl Iterator<Item = &str>
{
    text.split('\n')
        .flat_map(|line| line.split(' '))
        .map(str::trim_end)
        .filter(|t| !t.is_empty())
}
