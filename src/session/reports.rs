// src/session/reports.rs

use crate::{
    backend::SyncBackend,
    models::{ReportSummary, SyncReport},
};
use log::{debug, warn};
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

/// 同步报告缓存。取报告失败不影响会话，只记录日志。
pub struct ReportCache {
    backend: Arc<dyn SyncBackend>,
    recent: Vec<ReportSummary>,
    details: HashMap<String, SyncReport>,
}

impl ReportCache {
    pub fn new(backend: Arc<dyn SyncBackend>) -> Self {
        Self {
            backend,
            recent: Vec::new(),
            details: HashMap::new(),
        }
    }

    pub fn recent(&self) -> &[ReportSummary] {
        &self.recent
    }

    /// 拉取最近的报告列表（引擎按时间倒序返回）
    pub async fn list_recent(&mut self, limit: usize) -> Vec<ReportSummary> {
        match self.backend.get_sync_reports(limit).await {
            Ok(mut reports) => {
                reports.truncate(limit);
                debug!("获取到 {} 份同步报告", reports.len());
                self.recent = reports;
            }
            Err(e) => {
                warn!("获取同步报告列表失败: {}", e);
                self.recent.clear();
            }
        }
        self.recent.clone()
    }

    /// 优先使用缓存
    pub async fn get(&mut self, id: &str) -> Option<SyncReport> {
        if let Some(report) = self.details.get(id) {
            return Some(report.clone());
        }
        self.fetch(id).await
    }

    /// 从历史记录打开时总是重新获取
    pub async fn refresh(&mut self, id: &str) -> Option<SyncReport> {
        self.fetch(id).await
    }

    async fn fetch(&mut self, id: &str) -> Option<SyncReport> {
        match self.backend.get_sync_report(id).await {
            Ok(report) => {
                self.details.insert(id.to_string(), report.clone());
                Some(report)
            }
            Err(e) => {
                warn!("获取同步报告 '{}' 失败: {}", id, e);
                None
            }
        }
    }
}

/// 本次运行期间的同步完成时间，最新的在前，不落盘
#[derive(Debug, Clone)]
pub struct SessionHistory {
    entries: VecDeque<String>,
    capacity: usize,
}

impl SessionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, timestamp: impl Into<String>) {
        let timestamp = timestamp.into();
        if timestamp.trim().is_empty() {
            return;
        }
        self.entries.retain(|t| *t != timestamp);
        self.entries.push_front(timestamp);
        self.entries.truncate(self.capacity);
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }
}
