//! Filepath: src/infra/walk.rs
//! Corpus walker: turns a directory into the flat file list the
//! comparison core consumes.
//! - Every regular file (or symlink to one) counts; ignore files are opt-in
//! - Extra ignore globs (early prune + late filter)
//! - Optional hidden file policy, following symlinks, and max depth
//! - Deterministic ordering so repeated runs compare the same sequence
//!
//! Backed by ripgrep's `ignore` crate and `globset`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};
use tracing::debug;

/// Directory walker with optional ignore-file support and extra globs.
/// Extra globs are applied in two places:
///   1) Early: prune directories during traversal (filter_entry).
///   2) Late: filter out files that still slipped through.
pub struct FileWalker
{
    /// Compiled set of additional ignore patterns
    ignore_patterns: GlobSet,

    /// Honour .gitignore/.ignore files; default false (plain recursive walk)
    respect_ignore_files: bool,

    /// Include hidden (dot) files; default true
    include_hidden: bool,

    /// Follow symbolic links; default false
    follow_symlinks: bool,

    /// Maximum recursion depth; default None (unbounded)
    max_depth: Option<usize>,
}

impl FileWalker
{
    /// Build a walker with additional ignore patterns (e.g. "target/**",
    /// "**/*.bin"). Patterns match on paths relative to the walk root.
    pub fn new(additional_ignores: &[String]) -> Result<Self>
    {
        let mut builder = GlobSetBuilder::new();

        for pattern in additional_ignores
        {
            builder.add(Glob::new(pattern)?);
        }

        Ok(Self {
            ignore_patterns: builder.build()?,
            respect_ignore_files: false,
            include_hidden: true,
            follow_symlinks: false,
            max_depth: None,
        })
    }

    /// (Optional) Honour .gitignore, .ignore and git excludes.
    pub fn with_ignore_files(
        mut self,
        respect: bool,
    ) -> Self
    {
        self.respect_ignore_files = respect;
        self
    }

    /// (Optional) Include or exclude hidden files (dotfiles).
    pub fn with_include_hidden(
        mut self,
        include_hidden: bool,
    ) -> Self
    {
        self.include_hidden = include_hidden;
        self
    }

    /// (Optional) Follow or skip symbolic links (default false).
    pub fn with_follow_symlinks(
        mut self,
        follow: bool,
    ) -> Self
    {
        self.follow_symlinks = follow;
        self
    }

    /// (Optional) Limit recursion depth (`None` = unbounded).
    pub fn with_max_depth(
        mut self,
        depth: Option<usize>,
    ) -> Self
    {
        self.max_depth = depth;
        self
    }

    fn build_walk(
        &self,
        root: &Path,
    ) -> WalkBuilder
    {
        let mut b = WalkBuilder::new(root);

        // standard_filters(false) also clears hidden; set it after
        b.standard_filters(false);

        // WalkBuilder::hidden(true) skips dotfiles
        b.hidden(!self.include_hidden);
        b.ignore(self.respect_ignore_files);
        b.git_ignore(self.respect_ignore_files);
        b.git_global(self.respect_ignore_files);
        b.git_exclude(self.respect_ignore_files);
        b.parents(self.respect_ignore_files);
        b.require_git(false);

        b.follow_links(self.follow_symlinks);
        b.max_depth(self.max_depth);

        let extra = self
            .ignore_patterns
            .clone();
        let root_owned = root.to_path_buf();
        b.filter_entry(move |ent: &DirEntry| {
            let is_dir = ent
                .file_type()
                .map(|ft| ft.is_dir())
                .unwrap_or(false);

            if !is_dir
            {
                return true;
            }

            let rel = ent
                .path()
                .strip_prefix(&root_owned)
                .unwrap_or(ent.path());
            !(extra.is_match(rel) || extra.is_match(ent.path()))
        });

        b
    }

    /// Traverse files under `root`. Returns a **sorted** list of paths.
    pub fn walk_files<P: AsRef<Path>>(
        &self,
        root: P,
    ) -> Vec<PathBuf>
    {
        let root_path = root.as_ref();
        let walker = self
            .build_walk(root_path)
            .build();

        let mut out: Vec<PathBuf> = walker
            .filter_map(|res| match res
            {
                Ok(entry) => Some(entry),
                Err(err) =>
                {
                    debug!(error = %err, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| {
                // Unfollowed symlinks still count when they point at a file
                entry
                    .file_type()
                    .is_some_and(|ft| {
                        ft.is_file() || (ft.is_symlink() && entry.path().is_file())
                    })
            })
            .map(|entry| entry.into_path())
            .filter(|abs| {
                let rel = abs
                    .strip_prefix(root_path)
                    .unwrap_or(abs);
                !self
                    .ignore_patterns
                    .is_match(rel)
            })
            .collect();

        out.sort();

        out
    }
}
