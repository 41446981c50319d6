// src/models/events.rs

use super::Course;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProgressPhase {
    #[default]
    Idle,
    Downloading,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TransferCounters {
    pub downloaded: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// 引擎推送的一次进度快照，每次整体替换，不做字段合并
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,
    /// 从 1 开始计数
    pub current_course_index: usize,
    pub current_course_name: String,
    pub total_courses: usize,
    pub course_files_done: u64,
    pub course_files_total: u64,
    pub current_file: Option<String>,
    pub current_file_size: u64,
    pub current_file_downloaded: u64,
    pub stats: TransferCounters,
    pub failed: bool,
    pub error: Option<String>,
}

impl ProgressEvent {
    pub fn downloading(index: usize, total: usize, done: u64, files: u64) -> Self {
        Self {
            phase: ProgressPhase::Downloading,
            current_course_index: index,
            total_courses: total,
            course_files_done: done,
            course_files_total: files,
            ..Default::default()
        }
    }

    pub fn complete(stats: TransferCounters) -> Self {
        Self {
            phase: ProgressPhase::Complete,
            stats,
            ..Default::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            phase: ProgressPhase::Downloading,
            failed: true,
            error: Some(message.into()),
            ..Default::default()
        }
    }

    /// 失败事件携带的错误信息
    pub fn failure_message(&self) -> Option<String> {
        if !self.failed {
            return None;
        }
        Some(
            self.error
                .clone()
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| "同步过程中发生未知错误".to_string()),
        )
    }

    pub fn course_fraction(&self) -> f64 {
        let total = self.course_files_total.max(1) as f64;
        (self.course_files_done as f64 / total).min(1.0)
    }

    pub fn overall_fraction(&self) -> f64 {
        let finished_courses = self.current_course_index.saturating_sub(1) as f64;
        let total = self.total_courses.max(1) as f64;
        ((finished_courses + self.course_fraction()) / total).clamp(0.0, 1.0)
    }
}

/// 引擎主动推送给客户端的事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum BackendEvent {
    Ready,
    Log(String),
    Courses(Vec<Course>),
    Progress(ProgressEvent),
    SyncCompleted,
    SyncFailed(String),
    FolderSelected(Option<PathBuf>),
}
