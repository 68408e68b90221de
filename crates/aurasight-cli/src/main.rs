//! CLI entry point - the composition root.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use aurasight_cli::{Cli, Commands, load_settings, run_console};
use aurasight_session::Vocabulary;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before parsing so AURASIGHT_* variables can feed clap.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = load_settings(cli.config.as_deref(), &cli.overrides)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_console(&settings).await?,
        Commands::Vocabulary => {
            let vocabulary = Vocabulary::from_settings(settings.vocabulary.as_deref());
            for binding in vocabulary.bindings() {
                println!("{:<16} {}", binding.phrase, binding.operation);
            }
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}
