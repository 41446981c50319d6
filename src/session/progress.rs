// src/session/progress.rs

use crate::models::{ProgressEvent, ProgressPhase};
use log::debug;

/// 一次进度事件带来的阶段变化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: ProgressPhase,
    pub to: ProgressPhase,
    /// 事件被标记为失败时的错误信息，不会保留在快照中
    pub failure: Option<String>,
}

impl Transition {
    pub fn entered(&self, phase: ProgressPhase) -> bool {
        self.to == phase && self.from != phase
    }
}

/// 进度状态机: Idle -> Downloading -> Complete -> Idle。
///
/// 定时清理（完成后保留 2 秒、下载期间刷新本地统计）由会话控制器根据
/// `Transition` 安排，这里只负责快照本身。
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    snapshot: Option<ProgressEvent>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ProgressPhase {
        self.snapshot
            .as_ref()
            .map_or(ProgressPhase::Idle, |s| s.phase)
    }

    pub fn snapshot(&self) -> Option<&ProgressEvent> {
        self.snapshot.as_ref()
    }

    /// 用新事件整体替换当前快照
    pub fn ingest(&mut self, event: ProgressEvent) -> Transition {
        let from = self.phase();
        if let Some(message) = event.failure_message() {
            debug!("进度事件报告失败: {}", message);
            self.snapshot = None;
            return Transition {
                from,
                to: ProgressPhase::Idle,
                failure: Some(message),
            };
        }

        let to = event.phase;
        self.snapshot = match to {
            ProgressPhase::Idle => None,
            _ => Some(event),
        };
        Transition {
            from,
            to,
            failure: None,
        }
    }

    pub fn clear(&mut self) {
        self.snapshot = None;
    }

    pub fn course_fraction(&self) -> f64 {
        self.snapshot.as_ref().map_or(0.0, |s| s.course_fraction())
    }

    pub fn overall_fraction(&self) -> f64 {
        match &self.snapshot {
            Some(s) if s.phase == ProgressPhase::Complete => 1.0,
            Some(s) => s.overall_fraction(),
            None => 0.0,
        }
    }
}
