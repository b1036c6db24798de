use anyhow::Context;
use async_trait::async_trait;

use crate::{
    api::{BatchReport, ClientApi, DownloadRequest, DownloadResult, UploadRequest, UploadResult},
    config::Config,
    download::DownloadClient,
    error::Result,
    upload::UploadClient,
};

/// A client that encapsulates all required components. Clones are referenced counted.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct RemoteClient {
    pub upload: UploadClient,
    pub download: DownloadClient,
}

impl RemoteClient {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build http client")?;

        Ok(Self::with_http(http, config))
    }

    /// Shares one connection pool between both clients.
    pub fn with_http(http: reqwest::Client, config: Config) -> Self {
        Self {
            upload: UploadClient::new(http.clone(), config.clone()),
            download: DownloadClient::new(http, config),
        }
    }
}

#[async_trait]
impl ClientApi for RemoteClient {
    async fn submit(&self, request: UploadRequest) -> Result<UploadResult> {
        self.upload.submit(request).await
    }

    async fn download(&self, request: DownloadRequest) -> Result<DownloadResult> {
        self.download.download(request).await
    }

    async fn download_all(
        &self,
        branch_id: Option<&str>,
        tables: &[String],
    ) -> Result<BatchReport> {
        self.download.download_all(branch_id, tables).await
    }
}
