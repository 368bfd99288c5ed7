//! Chart rendering and artifact validation.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::json;
use std::path::Path;

use super::ChartOption;

/// Files smaller than this are treated as blank renders.
pub const MIN_CHART_FILE_SIZE: u64 = 1024;

/// Leading bytes of a valid PNG file.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Rendering capability: a declarative chart specification plus pixel
/// dimensions in, raster image bytes out.
#[async_trait]
pub trait ChartRenderer: Send + Sync {
    async fn render(&self, option: &ChartOption, width: u32, height: u32) -> Result<Vec<u8>>;
}

/// Client for an HTTP chart export service.
pub struct HttpChartRenderer {
    http: reqwest::Client,
    base_url: String,
}

impl HttpChartRenderer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ChartRenderer for HttpChartRenderer {
    async fn render(&self, option: &ChartOption, width: u32, height: u32) -> Result<Vec<u8>> {
        let url = format!("{}/render", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&json!({ "option": option, "width": width, "height": height }))
            .send()
            .await
            .context("chart render request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("chart renderer returned status {}", status));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Validate a rendered chart file: it must exist, exceed the blank-render
/// size threshold, and carry the PNG signature. Extension is irrelevant.
pub async fn validate_chart_file(path: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("rendered chart missing: {}", path.display()))?;

    if metadata.len() < MIN_CHART_FILE_SIZE {
        return Err(anyhow!(
            "rendered chart too small ({} bytes, minimum {}): {}",
            metadata.len(),
            MIN_CHART_FILE_SIZE,
            path.display()
        ));
    }

    let bytes = tokio::fs::read(path).await?;
    if bytes.len() < PNG_SIGNATURE.len() || bytes[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
        return Err(anyhow!("rendered file is not a PNG: {}", path.display()));
    }
    Ok(())
}
