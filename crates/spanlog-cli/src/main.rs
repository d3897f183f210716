//! CLI entry point - the composition root.
//!
//! Configuration is layered and the store is built here; handlers only see
//! the resulting `CliContext`.

use std::io::IsTerminal;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use spanlog_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads SPANLOG_CONFIG
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match run(&cli, command).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(err.exit_code());
        }
    }
}

/// Logs go to stderr so command output stays pipeable.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli, command: &Commands) -> Result<String, CliError> {
    let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    let config = CliConfig::load(cli.config.as_deref(), &cli.settings_flags(), |key| {
        std::env::var(key).ok()
    })?
    .with_color(color);
    let ctx = bootstrap(config);

    match command {
        Commands::Replay(args) => handlers::replay::execute(&ctx, args).await,
        Commands::Export { file, .. } => handlers::export::execute(&ctx, file),
        Commands::Tail { file, lines, span } => {
            handlers::tail::execute(&ctx, file, *lines, span.as_deref())
        }
        Commands::Trace { file, build_span } => handlers::trace::execute(&ctx, file, build_span),
        Commands::Spans { file, manifest } => {
            handlers::spans::execute(&ctx, file, manifest.as_deref())
        }
    }
}
