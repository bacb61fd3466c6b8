//! Command handlers.

use crate::cli::Commands;
use mediavault_error::{MediavaultResult, StorageError, StorageErrorKind};
use mediavault_storage::{ContentHash, ContentStore, FileSystemStore, StorageConfig};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Load configuration from `path`, or from the default sources.
pub fn load_config(path: Option<&Path>) -> MediavaultResult<StorageConfig> {
    match path {
        Some(path) => StorageConfig::from_file(path),
        None => StorageConfig::load(),
    }
}

/// Run one command against `store`, writing its output to `out`.
#[tracing::instrument(skip(store, out))]
pub async fn handle_command(
    command: Commands,
    store: &FileSystemStore,
    out: &mut (dyn Write + Send),
) -> MediavaultResult<()> {
    match command {
        Commands::Store { file } => {
            let stored = if file == Path::new("-") {
                store.store(&mut tokio::io::stdin()).await?
            } else {
                let mut reader = tokio::fs::File::open(&file).await.map_err(|e| {
                    StorageError::new(StorageErrorKind::FileRead(format!(
                        "{}: {}",
                        file.display(),
                        e
                    )))
                })?;
                store.store(&mut reader).await?
            };
            write_line(
                out,
                format_args!(
                    "{}\t{}\t{}\t{}",
                    stored.content_hash,
                    stored.size_bytes,
                    stored.path.display(),
                    if stored.duplicate { "duplicate" } else { "stored" }
                ),
            )
        }
        Commands::Path { hash } => {
            let path = store.path_for(&ContentHash::new(hash))?;
            write_line(out, format_args!("{}", path.display()))
        }
        Commands::Cat { hash } => {
            let data = store.retrieve(&ContentHash::new(hash)).await?;
            out.write_all(&data).map_err(output_error)?;
            out.flush().map_err(output_error)?;
            Ok(())
        }
        Commands::Delete { hash } => {
            let hash = ContentHash::new(hash);
            store.delete(&hash).await?;
            write_line(out, format_args!("deleted {}", hash))
        }
        Commands::Sweep { older_than_secs } => {
            let removed = store
                .sweep_staging(Duration::from_secs(older_than_secs))
                .await?;
            write_line(out, format_args!("removed {} staging directories", removed))
        }
    }
}

fn write_line(out: &mut (dyn Write + Send), line: std::fmt::Arguments<'_>) -> MediavaultResult<()> {
    writeln!(out, "{}", line).map_err(output_error)?;
    Ok(())
}

fn output_error(e: std::io::Error) -> StorageError {
    StorageError::new(StorageErrorKind::FileWrite(format!("output: {}", e)))
}
