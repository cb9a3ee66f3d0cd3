use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};
use crate::core::pass::HistogramBound;
use crate::core::refine::RefineOptions;

/// Config file names probed in the working directory, first match wins
pub const CONFIG_FILES: [&str; 4] = ["simpair.toml", "simpair.yaml", "simpair.json", ".simpair.toml"];

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Extra ignore globs applied while walking the corpus
    pub ignore_patterns: Vec<String>,

    /// Refinement tunables
    pub compare: CompareConfig,

    /// Corpus walking settings
    pub walk: WalkConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig
{
    /// Initial histogram size bound, a positive integer or "auto"
    pub compare_len: String,
    /// Worker pool size (1 = sequential)
    pub workers: usize,
    /// Bound multiplier between passes, 2..=6
    pub scale_factor: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig
{
    /// Honour .gitignore and friends
    pub gitignore: bool,
    pub include_hidden: bool,
    pub follow_symlinks: bool,
    pub max_depth: Option<usize>,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            ignore_patterns: vec!["**/.git".to_string()],
            compare: CompareConfig::default(),
            walk: WalkConfig::default(),
        }
    }
}

impl Default for CompareConfig
{
    fn default() -> Self
    {
        let defaults = RefineOptions::default();
        Self {
            compare_len: defaults
                .initial_bound
                .to_string(),
            workers: defaults.workers,
            scale_factor: defaults.scale_factor,
        }
    }
}

impl Default for WalkConfig
{
    fn default() -> Self
    {
        Self { gitignore: false, include_hidden: true, follow_symlinks: false, max_depth: None }
    }
}

impl CompareConfig
{
    /// Validated refinement options from this section.
    pub fn to_options(&self) -> Result<RefineOptions>
    {
        let initial_bound: HistogramBound = self
            .compare_len
            .parse()
            .context("Invalid compare.compare_len")?;
        let options =
            RefineOptions { initial_bound, workers: self.workers, scale_factor: self.scale_factor };
        options
            .validate()
            .context("Invalid compare settings")?;
        Ok(options)
    }
}

pub fn load_config() -> Result<Config>
{
    load_config_from(Path::new("."))
}

/// Load config from the first config file found in `dir`, then
/// `SIMPAIR_` environment variables (`SIMPAIR_COMPARE__WORKERS=4`).
pub fn load_config_from(dir: &Path) -> Result<Config>
{
    let mut builder = config::Config::builder();

    for name in CONFIG_FILES
    {
        let path = dir.join(name);
        if path.exists()
        {
            builder = builder.add_source(config::File::from(path));
            break;
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SIMPAIR")
            .prefix_separator("_")
            .separator("__"),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join(CONFIG_FILES[0]);

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("Would write {}:\n{}", config_path.display(), toml_string);
        }
        return Ok(());
    }

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
