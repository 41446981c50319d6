// src/models/report.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReportCounts {
    pub downloaded: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl ReportCounts {
    pub fn total(&self) -> u64 {
        self.downloaded + self.skipped + self.failed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub id: String,
    pub started_at: NaiveDateTime,
    pub finished_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub duration_secs: f64,
    #[serde(default)]
    pub summary: ReportCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadedFile {
    pub course: String,
    pub file_name: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedFile {
    pub course: String,
    pub file_name: String,
    #[serde(default)]
    pub error_type: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub course: String,
    pub file_name: String,
    #[serde(default)]
    pub reason: String,
}

/// 一次同步的完整记录，取回后不再变化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub id: String,
    pub started_at: NaiveDateTime,
    pub finished_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub duration_secs: f64,
    #[serde(default)]
    pub summary: ReportCounts,
    #[serde(default)]
    pub downloaded: Vec<DownloadedFile>,
    #[serde(default)]
    pub failed: Vec<FailedFile>,
    #[serde(default)]
    pub skipped: Vec<SkippedFile>,
}

impl SyncReport {
    pub fn to_summary(&self) -> ReportSummary {
        ReportSummary {
            id: self.id.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
            duration_secs: self.duration_secs,
            summary: self.summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_parses_engine_payload() {
        let json = r#"{
            "id": "20240301-093000",
            "started_at": "2024-03-01T09:30:00.125",
            "finished_at": "2024-03-01T09:31:12",
            "duration_secs": 72.0,
            "summary": {"downloaded": 2, "skipped": 1, "failed": 1},
            "downloaded": [{"course": "数据结构与算法", "file_name": "lec01.pdf", "size": 1024}],
            "failed": [{"course": "数据结构与算法", "file_name": "lec02.pdf", "error_type": "HTTPError", "message": "404"}],
            "skipped": [{"course": "高等数学", "file_name": "hw1.pdf", "reason": "exists"}]
        }"#;
        let report: SyncReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.summary.total(), 4);
        assert_eq!(report.failed[0].error_type, "HTTPError");
        assert_eq!(report.to_summary().id, "20240301-093000");
    }
}
