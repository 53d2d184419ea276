//! Export replay.
//!
//! Re-issues the last known query parameters to an export reference so the
//! backend materializes a downloadable dataset. Relative references go
//! through the forwarding proxy, the same path every other data call takes.

use std::path::Path;
use std::time::Duration;

use serde_json::Value;

use finch_core::config::ChatConfig;

use crate::error::ExportError;
use crate::response::{is_absolute, normalize_api_path};
use crate::types::ExportedFile;

/// Filename used when the response names none.
pub const DEFAULT_EXPORT_FILENAME: &str = "export.csv";

/// Replays export requests through the forwarding proxy.
#[derive(Clone)]
pub struct ExportReplayer {
    proxy_base: String,
    default_filename: String,
    http_client: reqwest::Client,
}

impl ExportReplayer {
    pub fn new(proxy_base: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            proxy_base: proxy_base.into(),
            default_filename: DEFAULT_EXPORT_FILENAME.to_string(),
            http_client,
        }
    }

    pub fn from_config(config: &ChatConfig) -> Result<Self, ExportError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExportError::Transport(e.to_string()))?;
        Ok(Self::new(config.proxy_base.clone(), http_client)
            .with_default_filename(config.default_export_filename.clone()))
    }

    pub fn with_default_filename(mut self, filename: impl Into<String>) -> Self {
        self.default_filename = filename.into();
        self
    }

    /// Full locator the request for `export_reference` is sent to.
    pub fn resolve(&self, export_reference: &str) -> String {
        if is_absolute(export_reference) {
            return export_reference.to_string();
        }
        format!(
            "{}{}",
            self.proxy_base.trim_end_matches('/'),
            normalize_api_path(export_reference)
        )
    }

    /// POST `last_params` to the export reference and collect the file.
    pub async fn export_csv(
        &self,
        export_reference: &str,
        last_params: &Value,
    ) -> Result<ExportedFile, ExportError> {
        let reference = export_reference.trim();
        if reference.is_empty() {
            return Err(ExportError::InvalidReference(
                "export reference is empty".to_string(),
            ));
        }
        let url = self.resolve(reference);

        tracing::info!(url = %url, "Replaying export");

        let response = self
            .http_client
            .post(&url)
            .json(last_params)
            .send()
            .await
            .map_err(|e| ExportError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(|e| {
                ExportError::Transport(format!("failed to read export error body: {e}"))
            })?;
            tracing::warn!(status = status.as_u16(), "Export failed");
            return Err(ExportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let headers = response.headers();
        let filename = headers
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_content_disposition)
            .and_then(|name| sanitize_filename(&name))
            .unwrap_or_else(|| self.default_filename.clone());
        let content_type = headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExportError::Transport(format!("failed to read export body: {e}")))?;

        tracing::debug!(filename = %filename, size = bytes.len(), "Export received");

        Ok(ExportedFile {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

// =============================================================================
// Content-Disposition parsing
// =============================================================================

/// Extract the filename from a `Content-Disposition` header value.
///
/// `filename*=UTF-8''...` (percent-encoded) wins over `filename=...`.
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for part in split_params(value) {
        let Some((key, raw)) = part.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let raw = raw.trim();
        if key == "filename*" {
            // charset'lang'value
            let encoded = raw.splitn(3, '\'').nth(2).unwrap_or(raw);
            extended = urlencoding::decode(encoded).ok().map(|c| c.into_owned());
        } else if key == "filename" {
            plain = Some(raw.trim_matches('"').to_string());
        }
    }

    extended.or(plain).filter(|name| !name.is_empty())
}

/// Split header parameters on `;`, ignoring separators inside quotes.
fn split_params(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ';' if !quoted => {
                parts.push(value[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(value[start..].trim());
    parts
}

/// Keep only the final path component so a header cannot steer the save path.
fn sanitize_filename(name: &str) -> Option<String> {
    let normalized = name.replace('\\', "/");
    Path::new(&normalized)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .filter(|n| !n.is_empty() && n != "..")
}

// =============================================================================
// Tests
// =============================================================================
