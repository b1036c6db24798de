use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ClientError, Result, ValidationError},
    formats::SupportedFormat,
    tables::TableName,
};

/// Which extraction the backend should run on an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadMode {
    /// The original single endpoint, kept for older deployments.
    Legacy,
    Text,
    Form,
    Ai,
}

impl UploadMode {
    pub fn endpoint(self) -> &'static str {
        match self {
            UploadMode::Legacy => "/upload",
            UploadMode::Text => "/upload-text",
            UploadMode::Form => "/upload-form",
            UploadMode::Ai => "/extract-info",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UploadMode::Legacy => "legacy",
            UploadMode::Text => "text",
            UploadMode::Form => "form",
            UploadMode::Ai => "ai",
        }
    }
}

impl std::fmt::Display for UploadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UploadMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(UploadMode::Legacy),
            "text" => Ok(UploadMode::Text),
            "form" => Ok(UploadMode::Form),
            "ai" => Ok(UploadMode::Ai),
            other => Err(format!(
                "unknown mode `{other}`, expected one of: text, form, ai, legacy"
            )),
        }
    }
}

/// A single file to send to an extraction endpoint.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub declared_mime_type: String,
    pub mode: UploadMode,
}

impl UploadRequest {
    pub fn new(
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        declared_mime_type: impl Into<String>,
        mode: UploadMode,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            declared_mime_type: declared_mime_type.into(),
            mode,
        }
    }

    pub fn validate(&self) -> std::result::Result<SupportedFormat, ValidationError> {
        let format = SupportedFormat::from_mime(&self.declared_mime_type)?;
        if self.bytes.is_empty() {
            return Err(ValidationError::EmptyFile);
        }
        Ok(format)
    }
}

/// What an extraction endpoint returned, shaped by the request's mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum UploadResult {
    Legacy {
        file_name: String,
        extracted_text: String,
    },
    Text {
        extracted_text: String,
        /// Always within `0.0..=100.0`.
        average_confidence: f64,
    },
    Form {
        fields: BTreeMap<String, String>,
    },
    Ai {
        summary: String,
        medicines: Vec<String>,
    },
}

impl UploadResult {
    pub fn mode(&self) -> UploadMode {
        match self {
            UploadResult::Legacy { .. } => UploadMode::Legacy,
            UploadResult::Text { .. } => UploadMode::Text,
            UploadResult::Form { .. } => UploadMode::Form,
            UploadResult::Ai { .. } => UploadMode::Ai,
        }
    }
}

impl std::fmt::Display for UploadResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&serde_json::to_string_pretty(self).map_err(|_| std::fmt::Error)?)
    }
}

/// A validated tenant scope for table exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BranchId(u32);

impl BranchId {
    /// Accepts a positive integer; `None` or blank input is `MissingBranchId`.
    pub fn parse(raw: Option<&str>) -> std::result::Result<Self, ValidationError> {
        let raw = raw
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or(ValidationError::MissingBranchId)?;

        match raw.parse::<u32>() {
            Ok(id) if id > 0 => Ok(BranchId(id)),
            _ => Err(ValidationError::InvalidBranchId(raw.to_string())),
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for BranchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request to export one table for one branch, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub table_name: String,
    pub branch_id: Option<String>,
}

impl DownloadRequest {
    pub fn new(table_name: impl Into<String>, branch_id: Option<impl Into<String>>) -> Self {
        Self {
            table_name: table_name.into(),
            branch_id: branch_id.map(Into::into),
        }
    }

    /// Branch is checked first so a missing branch is reported even for unknown tables.
    pub fn validate(&self) -> std::result::Result<(TableName, BranchId), ValidationError> {
        let branch = BranchId::parse(self.branch_id.as_deref())?;
        let table = TableName::parse(&self.table_name)?;
        Ok((table, branch))
    }
}

/// An exported table. Saving it is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub table: TableName,
    /// `{table}_report.csv`
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Display for DownloadResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} bytes)", self.file_name, self.bytes.len())
    }
}

/// Outcome of one table in a batch.
#[derive(Debug)]
pub struct BatchEntry {
    pub table: String,
    pub result: Result<DownloadResult>,
}

/// Per-table outcomes of a batch download, in request order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn get(&self, table: &str) -> Option<&Result<DownloadResult>> {
        self.entries
            .iter()
            .find(|e| e.table == table)
            .map(|e| &e.result)
    }

    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ClientError)> {
        self.entries.iter().filter_map(|e| match &e.result {
            Err(err) => Some((e.table.as_str(), err)),
            Ok(_) => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &BatchEntry> {
        self.entries.iter()
    }
}

impl IntoIterator for BatchReport {
    type Item = BatchEntry;
    type IntoIter = std::vec::IntoIter<BatchEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// The top-level API of this project
#[async_trait]
pub trait ClientApi: Send + Sync + 'static {
    /// Uploads one file to the endpoint selected by its mode.
    ///
    /// Unsupported or empty files are refused without a network call.
    async fn submit(&self, request: UploadRequest) -> Result<UploadResult>;

    /// Exports one table as CSV bytes.
    async fn download(&self, request: DownloadRequest) -> Result<DownloadResult>;

    /// Exports several tables one after another.
    ///
    /// A failing table is recorded and the batch carries on. Only an invalid
    /// branch fails the whole call, before any request is made.
    async fn download_all(&self, branch_id: Option<&str>, tables: &[String])
        -> Result<BatchReport>;
}
