//! Result counters of a finished analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Names of the counters plotted by the tracker, in series order.
pub const RESULT_SERIES_LABELS: [&str; 5] = ["strcpy", "cve_high", "cve_medium", "cve_low", "exploits"];

/// Counters imported from the emba results of one analysis.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisResult {
    pub id: Uuid,
    pub firmware_analysis_id: Uuid,
    pub strcpy: i64,
    pub cve_high: i64,
    pub cve_medium: i64,
    pub cve_low: i64,
    pub exploits: i64,
    pub created_at: DateTime<Utc>,
}

/// Counters submitted once an analysis has been parsed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewAnalysisResult {
    pub strcpy: i64,
    pub cve_high: i64,
    pub cve_medium: i64,
    pub cve_low: i64,
    pub exploits: i64,
}

impl NewAnalysisResult {
    pub fn validate(&self) -> Result<(), String> {
        let counters = [
            self.strcpy,
            self.cve_high,
            self.cve_medium,
            self.cve_low,
            self.exploits,
        ];
        for (name, value) in RESULT_SERIES_LABELS.iter().zip(counters) {
            if value < 0 {
                return Err(format!("{} must not be negative: {}", name, value));
            }
        }
        Ok(())
    }
}

impl AnalysisResult {
    /// Counters in [`RESULT_SERIES_LABELS`] order.
    pub fn series(&self) -> [i64; 5] {
        [
            self.strcpy,
            self.cve_high,
            self.cve_medium,
            self.cve_low,
            self.exploits,
        ]
    }
}
