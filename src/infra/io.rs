use anyhow::{Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

const MMAP_THRESHOLD: u64 = 1024 * 1024; // 1 MiB

/// UTF-8 text of a file, either mapped or read into memory.
///
/// Both variants are validated at read time, so `as_ref` never fails.
pub enum FileContent {
    Mapped(Mmap),
    Buffered(String),
}

impl AsRef<str> for FileContent {
    fn as_ref(&self) -> &str {
        match self {
            // Validated in read_file_smart
            FileContent::Mapped(mmap) => std::str::from_utf8(mmap).unwrap_or_default(),
            FileContent::Buffered(s) => s.as_str(),
        }
    }
}

/// Read a file as UTF-8 text. Files above 1 MiB are memory-mapped.
///
/// The handle is dropped before returning; a mapping stays valid without it.
pub fn read_file_smart<P: AsRef<Path>>(path: P) -> Result<FileContent> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?;

    if !metadata.is_file() {
        anyhow::bail!("{} is not a regular file", path.display());
    }

    if metadata.len() > MMAP_THRESHOLD {
        let file =
            File::open(path).with_context(|| format!("Failed to open file {}", path.display()))?;

        // Safety: read-only map; the corpus is not written during a run
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("Failed to memory-map {}", path.display()))?;

        std::str::from_utf8(&mmap)
            .with_context(|| format!("{} is not valid UTF-8", path.display()))?;

        Ok(FileContent::Mapped(mmap))
    } else {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file {}", path.display()))?;

        Ok(FileContent::Buffered(content))
    }
}
