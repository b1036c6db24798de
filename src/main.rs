use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::*;
use docbridge::{
    api::{ClientApi, DownloadRequest, UploadMode, UploadRequest},
    formats::SupportedFormat,
    storage::{save_report, DirSaver, FileSaver},
    tables::{batch_tables, TABLES},
    Config, RemoteClient,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Backend base URL, overrides API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Request timeout in seconds, overrides API_TIMEOUT_SECS
    #[arg(long, global = true)]
    timeout: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a JPEG, PNG, PDF, or TIFF document for extraction
    Upload {
        file: PathBuf,
        /// One of text, form, ai, legacy
        #[arg(long, default_value = "text")]
        mode: UploadMode,
        /// Declared MIME type, inferred from the extension when omitted
        #[arg(long)]
        mime: Option<String>,
    },
    /// Download one table as CSV
    Download {
        table: String,
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Download several tables one after another, all of them by default
    DownloadAll {
        tables: Vec<String>,
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the tables that can be downloaded
    Tables {},
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if dotenv::dotenv().is_err() {
        warn!("didn't load a .env file")
    }

    let args = Cli::parse();

    let mut config = Config::from_env().context("failed to read configuration")?;
    if let Some(url) = &args.api_url {
        config = config.with_api_url(url);
    }
    if let Some(secs) = args.timeout {
        config.timeout = Duration::from_secs(secs);
    }

    let client: Box<dyn ClientApi> =
        Box::new(RemoteClient::new(config.clone()).context("failed to create client")?);

    match args.command {
        Commands::Upload { file, mode, mime } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string());
            // an unknown extension is left for the client to refuse
            let mime = mime.unwrap_or_else(|| {
                SupportedFormat::from_path(&file)
                    .map(|f| f.mime().to_string())
                    .unwrap_or_else(|_| "application/octet-stream".to_string())
            });

            let result = client
                .submit(UploadRequest::new(file_name, bytes, mime, mode))
                .await?;
            println!("{result}");
        }
        Commands::Download { table, branch, out } => {
            let branch = config.branch_or_default(branch);
            let saver = DirSaver::new(out.unwrap_or_else(|| config.output_dir.clone()));

            let result = client.download(DownloadRequest::new(table, branch)).await?;
            let path = saver
                .save(&result.file_name, &result.bytes)
                .await
                .with_context(|| format!("failed to save {}", result.file_name))?;
            println!("{result} -> {}", path.display());
        }
        Commands::DownloadAll {
            tables,
            branch,
            out,
        } => {
            let branch = config.branch_or_default(branch);
            let saver = DirSaver::new(out.unwrap_or_else(|| config.output_dir.clone()));

            let report = client
                .download_all(branch.as_deref(), &batch_tables(tables))
                .await?;
            let summary = save_report(report, &saver).await;

            for path in &summary.saved {
                println!("saved {}", path.display());
            }
            if !summary.is_success() {
                bail!("{} of {} tables failed", summary.failed.len(), summary.total());
            }
        }
        Commands::Tables {} => {
            for table in TABLES {
                println!("{table}");
            }
        }
    }

    Ok(())
}
