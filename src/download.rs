use tracing::{debug, info, instrument, warn};

use crate::{
    api::{BatchEntry, BatchReport, BranchId, DownloadRequest, DownloadResult},
    config::Config,
    error::{ClientError, Result},
    state::Lifecycle,
    tables::TableName,
};

const DOWNLOAD_PATH: &str = "/download-csv";

/// Fetches CSV exports of backend tables.
#[derive(Debug, Clone)]
pub struct DownloadClient {
    client: reqwest::Client,
    config: Config,
}

impl DownloadClient {
    pub fn new(client: reqwest::Client, config: Config) -> Self {
        Self { client, config }
    }

    #[instrument(skip_all, fields(table = %request.table_name, branch = ?request.branch_id))]
    pub async fn download(&self, request: DownloadRequest) -> Result<DownloadResult> {
        let mut lifecycle = Lifecycle::new("download");
        lifecycle.validating();

        let (table, branch) = match request.validate() {
            Ok(valid) => valid,
            Err(e) => {
                lifecycle.rejected();
                warn!("download refused before sending: {e}");
                return Err(e.into());
            }
        };

        lifecycle.requesting();
        let outcome = self.fetch(table, branch).await;
        lifecycle.finish(&outcome);

        if let Err(e) = &outcome {
            warn!("download failed: {e}");
        }
        outcome
    }

    async fn fetch(&self, table: TableName, branch: BranchId) -> Result<DownloadResult> {
        if table.is_facility_scoped() {
            debug!("{table} is resolved through the facility of branch {branch}");
        }
        let branch = branch.to_string();
        let resp = self
            .client
            .get(self.config.endpoint(DOWNLOAD_PATH))
            .timeout(self.config.timeout)
            .query(&[("table_name", table.as_str()), ("branch_id", branch.as_str())])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            return Err(ClientError::rejected(
                status.as_u16(),
                &body,
                "Error downloading file",
            ));
        }

        Ok(DownloadResult {
            table,
            file_name: table.report_filename(),
            bytes: body.to_vec(),
        })
    }

    /// Downloads `tables` strictly one at a time, in order.
    ///
    /// The branch is validated once up front; after that every table gets an
    /// entry in the report whether it succeeded or not.
    #[instrument(skip_all, fields(branch = ?branch_id, tables = tables.len()))]
    pub async fn download_all(
        &self,
        branch_id: Option<&str>,
        tables: &[String],
    ) -> Result<BatchReport> {
        let branch = BranchId::parse(branch_id).map_err(|e| {
            warn!("batch refused before sending: {e}");
            ClientError::from(e)
        })?;
        let branch = branch.to_string();

        let mut report = BatchReport::default();
        for table in tables {
            let result = self
                .download(DownloadRequest::new(table.as_str(), Some(branch.as_str())))
                .await;
            report.entries.push(BatchEntry {
                table: table.trim().to_string(),
                result,
            });
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "batch download finished"
        );
        Ok(report)
    }
}
