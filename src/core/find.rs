//! `simpair find`: walk a directory, refine, report the closest pair.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled};
use tracing::warn;

use crate::cli::{AppContext, FindArgs};
use crate::core::error::CompareError;
use crate::core::refine::{
    PassReport, RefineOptions, RefineOutcome, Terminal, find_most_similar_pair_with,
};
use crate::infra::config::{CompareConfig, Config, load_config};
use crate::infra::walk::FileWalker;

pub fn run(
    args: FindArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config = load_config().unwrap_or_else(|err| {
        warn!(error = %format!("{err:#}"), "ignoring unreadable configuration");
        Config::default()
    });

    let root = expand_root(&args.path)?;
    let options = resolve_options(&args, &config)?;
    let walker = build_walker(&args, &config)?;

    let files = collect_files(&walker, &root)?;

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("{}", paint(ctx, "DRY RUN: Would compare:", |s| s.yellow().to_string()));
            println!("  Root: {}", root.display());
            println!("  Files: {}", files.len());
            println!("  Compare length: {}", options.initial_bound);
            println!("  Workers: {}", options.workers);
            println!("  Scale factor: {}", options.scale_factor);
        }
        return Ok(());
    }

    let spinner = make_spinner(ctx.quiet || args.json);
    let start = Instant::now();

    let outcome = find_most_similar_pair_with(&files, &options, |n, bound| {
        let k = bound.resolve(n);
        spinner.println(format!(
            "Comparing {n} files using histograms of up to top {k} words in each file"
        ));
        spinner.set_message(format!("pass over {n} files (k = {k})"));
    })?;

    spinner.finish_and_clear();
    let elapsed = start.elapsed();

    if args.json
    {
        print_json(&outcome, files.len(), elapsed)?;
    }
    else
    {
        print_human(&outcome, elapsed, args.passes, ctx);
    }

    Ok(())
}

/// Expand `~` and `$VAR` in the user-supplied root and check it exists.
fn expand_root(path: &Path) -> Result<PathBuf>
{
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand path {raw}"))?;
    let root = PathBuf::from(expanded.as_ref());

    if !root.is_dir()
    {
        anyhow::bail!("Directory: {} not found.", root.display());
    }

    Ok(root)
}

/// CLI flags over config file over defaults.
fn resolve_options(
    args: &FindArgs,
    config: &Config,
) -> Result<RefineOptions>
{
    let merged = CompareConfig {
        compare_len: args
            .compare_len
            .clone()
            .unwrap_or_else(|| {
                config
                    .compare
                    .compare_len
                    .clone()
            }),
        workers: args
            .workers
            .unwrap_or(config.compare.workers),
        scale_factor: args
            .scale_factor
            .unwrap_or(config.compare.scale_factor),
    };
    merged.to_options()
}

fn build_walker(
    args: &FindArgs,
    config: &Config,
) -> Result<FileWalker>
{
    let mut ignore_patterns = config
        .ignore_patterns
        .clone();
    ignore_patterns.extend(
        args.ignore
            .iter()
            .cloned(),
    );

    Ok(FileWalker::new(&ignore_patterns)
        .context("Invalid ignore pattern")?
        .with_ignore_files(args.gitignore || config.walk.gitignore)
        .with_include_hidden(
            args.hidden
                .unwrap_or(config.walk.include_hidden),
        )
        .with_follow_symlinks(config.walk.follow_symlinks)
        .with_max_depth(args.max_depth.or(config.walk.max_depth)))
}

/// Walk `root` and enforce the two-file minimum before the core runs.
fn collect_files(
    walker: &FileWalker,
    root: &Path,
) -> Result<Vec<PathBuf>>
{
    let files = walker.walk_files(root);

    match files.len()
    {
        0 => Err(CompareError::EmptyCorpus)
            .with_context(|| format!("No files found under {}", root.display())),
        1 => Err(CompareError::TooFewFiles { found: 1 })
            .with_context(|| format!("Only one file found under {}", root.display())),
        _ => Ok(files),
    }
}

fn make_spinner(hidden: bool) -> ProgressBar
{
    if hidden
    {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
    {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn paint(
    ctx: &AppContext,
    text: &str,
    style: impl Fn(&str) -> String,
) -> String
{
    if ctx.no_color { text.to_string() } else { style(text) }
}

fn terminal_label(terminal: Terminal) -> &'static str
{
    match terminal
    {
        Terminal::Converged => "converged",
        Terminal::StableUnique => "stable unique match",
        Terminal::Exhaustive => "exhaustive pass",
        Terminal::Bailout => "bailout, best effort",
    }
}

#[derive(Tabled)]
struct PassRow
{
    #[tabled(rename = "pass")]
    index: usize,
    files: usize,
    #[tabled(rename = "top k")]
    compare_len: usize,
    shortlist: usize,
    #[tabled(rename = "best score")]
    best_score: String,
    unique: bool,
}

fn pass_table(passes: &[PassReport]) -> String
{
    let rows = passes
        .iter()
        .enumerate()
        .map(|(i, p)| PassRow {
            index: i + 1,
            files: p.files,
            compare_len: p.compare_len,
            shortlist: p.shortlist,
            best_score: format!("{:.6}", p.best_score),
            unique: p.found_unique,
        });
    Table::new(rows).to_string()
}

fn print_human(
    outcome: &RefineOutcome,
    elapsed: Duration,
    show_passes: bool,
    ctx: &AppContext,
)
{
    if show_passes
    {
        println!("{}", pass_table(&outcome.passes));
    }

    if !ctx.quiet
    {
        println!(
            "\n{:.3} seconds elapsed ({} passes, {})",
            elapsed.as_secs_f64(),
            outcome.passes.len(),
            terminal_label(outcome.terminal)
        );
    }

    let header = format!("Matches found with score {}:", outcome.best.score);
    println!("\n{}\n", paint(ctx, &header, |s| s.green().to_string()));
    println!("{}", outcome.best.first.display());
    println!("{}", outcome.best.second.display());
}

#[derive(Serialize)]
struct FindReport<'a>
{
    score: f64,
    first: &'a Path,
    second: &'a Path,
    terminal: Terminal,
    elapsed_secs: f64,
    files: usize,
    passes: &'a [PassReport],
    shortlist: &'a [PathBuf],
}

fn print_json(
    outcome: &RefineOutcome,
    files: usize,
    elapsed: Duration,
) -> Result<()>
{
    let report = FindReport {
        score: outcome.best.score,
        first: &outcome.best.first,
        second: &outcome.best.second,
        terminal: outcome.terminal,
        elapsed_secs: elapsed.as_secs_f64(),
        files,
        passes: &outcome.passes,
        shortlist: &outcome.shortlist,
    };
    println!("{}", serde_json::to_string(&report).context("Failed to serialize result")?);
    Ok(())
}
