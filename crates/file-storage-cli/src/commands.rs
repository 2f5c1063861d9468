//! Subcommand execution against a file storage façade

use crate::args::Command;
use crate::error::{CliError, Result};
use file_storage::{FileStorage, FileStorageError};
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::info;

/// `None` and `-` both mean stdin/stdout
fn file_arg(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| p != Path::new("-"))
}

/// Run a storage subcommand, writing its output to `out`.
///
/// `migrate` needs a raw database connection and is handled by the caller.
pub async fn run<W>(storage: &FileStorage, command: Command, out: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    match command {
        Command::Migrate => {
            return Err(CliError::Config(
                "migrate runs against the database, not the storage".to_string(),
            ))
        }
        Command::Put { name, path } => {
            let stored = match file_arg(path) {
                Some(path) => {
                    let file = tokio::fs::File::open(&path).await?;
                    storage.save(&name, file).await?
                }
                None => storage.save(&name, tokio::io::stdin()).await?,
            };
            info!(name = %stored, "Stored file");
            out.write_all(format!("{}\n", stored).as_bytes()).await?;
        }
        Command::Get { name, path } => {
            let mut reader = storage.open(&name).await?;
            match file_arg(path) {
                Some(path) => {
                    let mut file = tokio::fs::File::create(&path).await?;
                    tokio::io::copy(&mut reader, &mut file).await?;
                    file.flush().await?;
                }
                None => {
                    tokio::io::copy(&mut reader, out).await?;
                }
            }
        }
        Command::Rm { name } => {
            storage.delete(&name).await?;
            info!(name = %name, "Deleted file");
        }
        Command::Exists { name } => {
            let exists = storage.exists(&name).await?;
            out.write_all(format!("{}\n", exists).as_bytes()).await?;
        }
        Command::Stat { name } => {
            let stat = json!({
                "name": name,
                "size": storage.size(&name).await?,
                "created": storage.created_time(&name).await?.to_rfc3339(),
                "modified": storage.modified_time(&name).await?.to_rfc3339(),
                "url": storage.url(&name).await?,
            });
            out.write_all(serde_json::to_string_pretty(&stat)?.as_bytes())
                .await?;
            out.write_all(b"\n").await?;
        }
        Command::Url { name } => match storage.url(&name).await? {
            Some(url) => out.write_all(format!("{}\n", url).as_bytes()).await?,
            None => return Err(FileStorageError::NotFound(name).into()),
        },
    }

    out.flush().await?;
    Ok(())
}
