use std::path::PathBuf;

use clap::Parser;
use nl_handlers::{handle_command, init_logging, IngestCommands};
use nl_storage::StorageKind;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Turns newsletter emails into stored publications", long_about = None)]
pub struct Cli {
    #[arg(long, value_enum, env = "NL_STORAGE", default_value_t = StorageKind::Memory)]
    storage: StorageKind,
    /// File backing the json storage
    #[arg(long, env = "NL_STORAGE_PATH")]
    storage_path: Option<PathBuf>,
    #[command(subcommand)]
    command: IngestCommands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logger = init_logging().with_prefix("nl");

    let storage = nl_storage::create_storage(cli.storage, cli.storage_path.as_deref()).await?;
    info!("🗞️ Starting with {} storage", cli.storage);

    if let Err(e) = handle_command(cli.command, storage).await {
        logger.error(&format!("{}", e));
        return Err(e.into());
    }
    Ok(())
}
