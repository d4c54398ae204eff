//! Aggregations behind the device tracker.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::analysis_result::RESULT_SERIES_LABELS;
use crate::models::{AnalysisResult, FirmwareAnalysis};

/// Window used when no start date is given.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Number of devices a vendor gained since the window start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct VendorDeviceCount {
    pub vendor_name: String,
    pub device_count: i64,
}

/// Result counters of one analysis, as one chart series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDataset {
    pub analysis_id: Uuid,
    /// The firmware version of the analysis.
    pub label: String,
    pub data: [i64; 5],
}

/// Result history of a device across its analyses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceReport {
    pub device_id: Uuid,
    pub labels: Vec<String>,
    pub datasets: Vec<ReportDataset>,
}

pub fn default_since(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(DEFAULT_WINDOW_DAYS)
}

/// Series of one analysis given all results stored for it.
///
/// Exactly one result is expected. No result, or more than one, is treated
/// as missing data and yields zeros.
pub fn dataset_for(analysis: &FirmwareAnalysis, results: &[&AnalysisResult]) -> ReportDataset {
    let data = match results {
        [result] => result.series(),
        [] => {
            tracing::error!("result empty for {}", analysis.id);
            [0; 5]
        }
        _ => {
            tracing::warn!(
                "{} results stored for {}, expected one",
                results.len(),
                analysis.id
            );
            [0; 5]
        }
    };

    ReportDataset {
        analysis_id: analysis.id,
        label: analysis.version.clone(),
        data,
    }
}

/// Builds the report of a device from its analyses and their results.
///
/// Failed analyses are left out. Returns `None` if nothing remains.
pub fn build_device_report(
    device_id: Uuid,
    analyses: &[FirmwareAnalysis],
    results: &[AnalysisResult],
) -> Option<DeviceReport> {
    let mut by_analysis: HashMap<Uuid, Vec<&AnalysisResult>> = HashMap::new();
    for result in results {
        by_analysis
            .entry(result.firmware_analysis_id)
            .or_default()
            .push(result);
    }

    let datasets: Vec<ReportDataset> = analyses
        .iter()
        .filter(|analysis| !analysis.failed)
        .map(|analysis| {
            let stored = by_analysis
                .get(&analysis.id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            dataset_for(analysis, stored)
        })
        .collect();

    if datasets.is_empty() {
        return None;
    }

    Some(DeviceReport {
        device_id,
        labels: RESULT_SERIES_LABELS.iter().map(|s| s.to_string()).collect(),
        datasets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use embark_core::AnalysisStatus;
    use sqlx::types::Json;

    fn make_analysis(version: &str, failed: bool) -> FirmwareAnalysis {
        let id = Uuid::new_v4();
        FirmwareAnalysis {
            id,
            user_id: None,
            pid: None,
            firmware_id: None,
            firmware_name: "fw.bin".to_string(),
            version: version.to_string(),
            notes: String::new(),
            firmware_architecture: None,
            user_emulation_test: false,
            system_emulation_test: false,
            sbom_only_test: false,
            scan_modules: Vec::new(),
            zip_file_id: None,
            path_to_logs: format!("/logs/{}", id),
            log_size: 0,
            start_date: Utc::now(),
            end_date: None,
            scan_time_secs: None,
            duration: None,
            finished: true,
            failed,
            archived: false,
            hidden: false,
            status: Json(AnalysisStatus::default()),
        }
    }

    fn make_result(analysis_id: Uuid, base: i64) -> AnalysisResult {
        AnalysisResult {
            id: Uuid::new_v4(),
            firmware_analysis_id: analysis_id,
            strcpy: base,
            cve_high: base + 1,
            cve_medium: base + 2,
            cve_low: base + 3,
            exploits: base + 4,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_report_skips_failed_analyses() {
        let ok = make_analysis("1.0", false);
        let failed = make_analysis("0.9", true);
        let results = vec![make_result(ok.id, 10), make_result(failed.id, 20)];

        let report =
            build_device_report(Uuid::new_v4(), &[ok.clone(), failed], &results).unwrap();

        assert_eq!(report.labels, RESULT_SERIES_LABELS.to_vec());
        assert_eq!(report.datasets.len(), 1);
        assert_eq!(report.datasets[0].label, "1.0");
        assert_eq!(report.datasets[0].data, [10, 11, 12, 13, 14]);
    }

    #[test]
    fn test_missing_and_duplicate_results_yield_zeros() {
        let missing = make_analysis("1.0", false);
        let duplicated = make_analysis("2.0", false);
        let results = vec![
            make_result(duplicated.id, 1),
            make_result(duplicated.id, 2),
        ];

        let report =
            build_device_report(Uuid::new_v4(), &[missing, duplicated], &results).unwrap();

        assert_eq!(report.datasets[0].data, [0; 5]);
        assert_eq!(report.datasets[1].data, [0; 5]);
    }

    #[test]
    fn test_only_failed_analyses_yield_no_report() {
        let failed = make_analysis("1.0", true);
        assert!(build_device_report(Uuid::new_v4(), &[failed], &[]).is_none());
        assert!(build_device_report(Uuid::new_v4(), &[], &[]).is_none());
    }

    #[test]
    fn test_default_window() {
        let now = Utc::now();
        assert_eq!(now - default_since(now), Duration::days(7));
    }
}
