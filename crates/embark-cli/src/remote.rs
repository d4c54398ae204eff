// Minimal client for a running tracker server.

use anyhow::{anyhow, Context, Result};
use embark_core::AnalysisStatus;
use serde_json::Value;
use uuid::Uuid;

pub struct Client {
    base: String,
}

impl Client {
    pub fn new(server: &str) -> Self {
        Self {
            base: server.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base, path)
    }

    fn get_json(&self, request: ureq::Request) -> Result<Value> {
        let url = request.url().to_string();
        let response = request.call().map_err(|e| match e {
            ureq::Error::Status(code, response) => anyhow!(
                "Server returned {} for {}: {}",
                code,
                url,
                response.into_string().unwrap_or_default()
            ),
            other => anyhow!("Request to {} failed: {}", url, other),
        })?;
        response
            .into_json()
            .with_context(|| format!("Invalid JSON from {}", url))
    }

    /// The analysis record with devices and flags.
    pub fn analysis(&self, id: Uuid) -> Result<Value> {
        self.get_json(ureq::get(&self.url(&format!("/analyses/{}", id))))
    }

    pub fn flags(&self, id: Uuid) -> Result<String> {
        let body = self.get_json(ureq::get(&self.url(&format!("/analyses/{}/flags", id))))?;
        body["flags"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Response carries no flags"))
    }

    /// Vendor device counts, optionally since an RFC 3339 instant.
    pub fn tracker(&self, since: Option<&str>) -> Result<Value> {
        let mut request = ureq::get(&self.url("/tracker"));
        if let Some(since) = since {
            request = request.query("since", since);
        }
        self.get_json(request)
    }
}

/// Extracts the progress blob from an analysis response.
pub fn status_of(analysis: &Value) -> Result<AnalysisStatus> {
    serde_json::from_value(analysis["analysis"]["status"].clone())
        .context("Analysis response carries no status")
}

/// One-line progress summary, e.g. `42.0% Testing phase (s20_shell_check)`.
pub fn progress_line(status: &AnalysisStatus) -> String {
    let mut line = format!("{:.1}%", status.percentage);
    if !status.last_phase.is_empty() {
        line.push(' ');
        line.push_str(&status.last_phase);
    }
    if !status.last_module.is_empty() {
        line.push_str(&format!(" ({})", status.last_module));
    }
    line
}
