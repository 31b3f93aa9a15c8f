use anyhow::{Context, Result};
use clap::Parser;
use distill_core::{KeyFields, Schema, UserAleSchema};
use tracing_subscriber::EnvFilter;

use distill_cli::commands::{around, gaps, ids, segment};
use distill_cli::{Cli, Commands, Config, SchemaConfig};

/// Dispatches a command under a concrete schema.
fn run<S>(command: &Commands, schema: &S, config: &Config) -> Result<()>
where
    S: Schema,
    S::Payload: KeyFields,
{
    match command {
        Commands::Ids { input } => ids::run(schema, input, config),
        Commands::Segment { input, windows } => segment::run(schema, input, windows, config),
        Commands::Gaps {
            input,
            min_gap_ms,
            label,
        } => gaps::run(schema, input, *min_gap_ms, label, config),
        Commands::Around {
            input,
            field,
            value,
            before_ms,
            after_ms,
            label,
        } => {
            let options = around::AroundOptions {
                field,
                value,
                before_ms: *before_ms,
                after_ms: *after_ms,
                label,
            };
            around::run(schema, input, &options, config)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr; stdout carries command output
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    match &config.schema {
        SchemaConfig::Userale => run(command, &UserAleSchema, &config),
        SchemaConfig::Fields(schema) => run(command, schema, &config),
    }
}
