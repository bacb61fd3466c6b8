use clap::Parser;
use mediavault::FileSystemStore;
use mediavault::cli::{Cli, handle_command, load_config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref())?;
    let store = FileSystemStore::new(&config)?;

    let mut stdout = std::io::stdout();
    handle_command(cli.command, &store, &mut stdout).await?;

    Ok(())
}
