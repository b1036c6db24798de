use std::{
    io,
    path::{Component, Path, PathBuf},
};

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::api::BatchReport;

/// Somewhere downloaded reports can be written to.
#[async_trait]
pub trait FileSaver: Send + Sync {
    /// Saves `bytes` under `file_name`, returning where it ended up.
    async fn save(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf>;
}

/// Saves files into a single local directory.
#[derive(Debug, Clone)]
pub struct DirSaver {
    dir: PathBuf,
}

impl DirSaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// A bare file name has exactly one normal component.
fn is_bare_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[async_trait]
impl FileSaver for DirSaver {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        if !is_bare_file_name(file_name) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to save outside the output directory: {file_name}"),
            ));
        }

        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        if path.exists() {
            warn!("overwriting existing file {}", path.display());
        }

        std::fs::write(&path, bytes)?;
        debug!(bytes = bytes.len(), "saved {}", path.display());

        Ok(path)
    }
}

/// What happened to each table of a saved batch.
#[derive(Debug, Default)]
pub struct SaveSummary {
    pub saved: Vec<PathBuf>,
    /// Table name and reason, for download and save failures alike.
    pub failed: Vec<(String, String)>,
}

impl SaveSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.saved.len() + self.failed.len()
    }
}

/// Saves every successful download of a batch, in batch order.
pub async fn save_report(report: BatchReport, saver: &dyn FileSaver) -> SaveSummary {
    let mut summary = SaveSummary::default();

    for entry in report {
        match entry.result {
            Ok(result) => match saver.save(&result.file_name, &result.bytes).await {
                Ok(path) => summary.saved.push(path),
                Err(e) => {
                    error!("failed to save {}: {e}", result.file_name);
                    summary.failed.push((entry.table, e.to_string()));
                }
            },
            Err(e) => {
                error!("{}: {e}", entry.table);
                summary.failed.push((entry.table, e.to_string()));
            }
        }
    }

    summary
}
