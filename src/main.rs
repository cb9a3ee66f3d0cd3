use anyhow::Result;
use clap::Parser;
use simpair::cli::{AppContext, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    simpair::infra::logging::init_tracing(cli.verbose, cli.log_level.as_deref(), cli.log_json)?;

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::Find(args) => simpair::find_run(args, &ctx),
        Commands::Init(args) => simpair::infra::config::init(args, &ctx),
        Commands::Completions(args) => simpair::completion::run(args, &ctx),
    }
}
