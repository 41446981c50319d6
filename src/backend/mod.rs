// src/backend/mod.rs

mod stdio;

pub use stdio::StdioBackend;

use crate::{
    error::AppResult,
    models::{
        BackendEvent, Configuration, CourseConfig, InitState, LocalStats, OperationResult,
        ReportSummary, SyncReport,
    },
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// 外部同步引擎的调用接口。
///
/// `login` 与 `sync_downloads` 只负责发起操作，结果通过 `BackendEvent`
/// 推送回来；其余调用直接返回结果。
#[async_trait]
pub trait SyncBackend: Send + Sync {
    /// 引擎是否已经可以接受调用
    fn is_ready(&self) -> bool;

    async fn get_init_state(&self) -> AppResult<InitState>;
    async fn load_config(&self) -> AppResult<Configuration>;
    async fn save_config(&self, config: &Configuration) -> AppResult<OperationResult>;
    async fn login(&self, config: &Configuration) -> AppResult<()>;
    async fn sync_downloads(&self) -> AppResult<()>;
    /// 返回值的含义取决于平台，见 `FolderPickerMode`
    async fn select_folder(&self) -> AppResult<Option<PathBuf>>;
    async fn update_course_config(&self, id: &str, config: &CourseConfig) -> AppResult<bool>;
    async fn get_sync_reports(&self, limit: usize) -> AppResult<Vec<ReportSummary>>;
    async fn get_sync_report(&self, id: &str) -> AppResult<SyncReport>;
    async fn get_local_stats(&self) -> AppResult<LocalStats>;
    async fn open_folder(&self, name: &str) -> AppResult<OperationResult>;
    async fn open_file(&self, path: &Path) -> AppResult<OperationResult>;
    async fn logout(&self) -> AppResult<OperationResult>;
}

pub type EventSink = mpsc::UnboundedSender<BackendEvent>;

/// 引擎推送事件的通道。发送端交给引擎实现，接收端交给会话控制器。
pub struct EventChannel {
    sink: EventSink,
    inbox: mpsc::UnboundedReceiver<BackendEvent>,
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl EventChannel {
    pub fn new() -> Self {
        let (sink, inbox) = mpsc::unbounded_channel();
        Self { sink, inbox }
    }

    pub fn sink(&self) -> EventSink {
        self.sink.clone()
    }

    pub(crate) fn into_parts(self) -> (EventSink, mpsc::UnboundedReceiver<BackendEvent>) {
        (self.sink, self.inbox)
    }
}
