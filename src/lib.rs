//! Client for the document extraction and table export backend.
//!
//! [`RemoteClient`] uploads scans for text, form, or AI extraction and pulls
//! per-branch CSV exports, behind the [`ClientApi`] trait.

pub mod api;
pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod formats;
pub mod state;
pub mod storage;
pub mod tables;
pub mod upload;

pub use api::ClientApi;
pub use client::RemoteClient;
pub use config::Config;
pub use error::{ClientError, ErrorKind, ValidationError};
