// src/session/mod.rs

mod account;
pub mod auth;
pub mod config_store;
mod courses;
pub mod folder;
mod lifecycle;
pub mod log_buffer;
pub mod ordering;
pub mod progress;
pub mod reports;
pub mod scheduler;

pub use auth::{FailureKind, classify_failure};
pub use config_store::ConfigStore;
pub use folder::{FolderOutcome, FolderPickerMode};
pub use log_buffer::{LogBuffer, LogEntry};
pub use ordering::order_courses;
pub use progress::{ProgressTracker, Transition};
pub use reports::{ReportCache, SessionHistory};
pub use scheduler::{Scheduler, Tick, TimerKind};

use crate::{
    backend::{EventChannel, EventSink, SyncBackend},
    config::AppConfig,
    error::{AppError, AppResult},
    models::{
        BackendEvent, ConfigPatch, Configuration, Course, CourseUpdate, LocalStats, ProgressEvent,
        ProgressPhase, ReportSummary, SyncReport, SyncState, View,
    },
};
use async_trait::async_trait;
use log::{debug, info};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::{mpsc, oneshot, watch};

/// 需要用户参与的交互：确认框与阻塞式提示
#[async_trait]
pub trait Frontend: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
    fn alert(&self, message: &str);
}

enum Command {
    UpdateConfig(ConfigPatch),
    SaveSettings(oneshot::Sender<AppResult<()>>),
    OpenSettings,
    CloseSettings,
    Login,
    StartSync,
    UpdateCourse { id: String, update: CourseUpdate },
    SetAllCourses { skip: bool },
    Logout,
    SelectFolder,
    OpenFolder(String),
    OpenFile(PathBuf),
    OpenReport(String),
    RefreshReports(usize),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown(oneshot::Sender<()>),
}

/// 会话状态的只读副本，供界面渲染
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub view: View,
    pub syncing: bool,
    pub initialized: bool,
    pub awaiting_folder: bool,
    /// 最近一次同步失败的信息，下次同步开始时清除
    pub last_error: Option<String>,
    pub config: Configuration,
    pub courses: Vec<Course>,
    pub logs: Vec<LogEntry>,
    pub progress: Option<ProgressEvent>,
    pub phase: ProgressPhase,
    pub course_fraction: f64,
    pub overall_fraction: f64,
    pub history: Vec<String>,
    pub reports: Vec<ReportSummary>,
    pub active_report: Option<SyncReport>,
    pub sync_state: SyncState,
    pub local_stats: LocalStats,
}

impl SessionSnapshot {
    pub fn course(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    pub fn enabled_count(&self) -> usize {
        self.courses.iter().filter(|c| !c.skip).count()
    }
}

/// 会话控制器的操作入口，可以在任意任务间克隆使用
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: EventSink,
    state: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    fn send(&self, command: Command) -> AppResult<()> {
        self.commands
            .send(command)
            .map_err(|_| AppError::SessionClosed)
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> AppResult<T> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx))?;
        rx.await.map_err(|_| AppError::SessionClosed)
    }

    pub fn login(&self) -> AppResult<()> {
        self.send(Command::Login)
    }

    pub fn start_sync(&self) -> AppResult<()> {
        self.send(Command::StartSync)
    }

    pub fn update_config(&self, patch: ConfigPatch) -> AppResult<()> {
        self.send(Command::UpdateConfig(patch))
    }

    /// 立即保存配置，成功后返回进入设置页之前的页面
    pub async fn save_settings(&self) -> AppResult<()> {
        self.request(Command::SaveSettings).await?
    }

    pub fn open_settings(&self) -> AppResult<()> {
        self.send(Command::OpenSettings)
    }

    pub fn close_settings(&self) -> AppResult<()> {
        self.send(Command::CloseSettings)
    }

    pub fn update_course(&self, id: impl Into<String>, update: CourseUpdate) -> AppResult<()> {
        self.send(Command::UpdateCourse {
            id: id.into(),
            update,
        })
    }

    pub fn set_all_courses(&self, skip: bool) -> AppResult<()> {
        self.send(Command::SetAllCourses { skip })
    }

    pub fn logout(&self) -> AppResult<()> {
        self.send(Command::Logout)
    }

    pub fn select_folder(&self) -> AppResult<()> {
        self.send(Command::SelectFolder)
    }

    pub fn open_folder(&self, name: impl Into<String>) -> AppResult<()> {
        self.send(Command::OpenFolder(name.into()))
    }

    pub fn open_file(&self, path: impl Into<PathBuf>) -> AppResult<()> {
        self.send(Command::OpenFile(path.into()))
    }

    pub fn open_report(&self, id: impl Into<String>) -> AppResult<()> {
        self.send(Command::OpenReport(id.into()))
    }

    pub fn refresh_reports(&self, limit: usize) -> AppResult<()> {
        self.send(Command::RefreshReports(limit))
    }

    /// 在此之前发出的命令和已送达的引擎事件都处理完后才返回
    pub async fn snapshot(&self) -> AppResult<SessionSnapshot> {
        self.request(Command::Snapshot).await
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.clone()
    }

    /// 以引擎的身份推送一个事件
    pub fn push(&self, event: BackendEvent) -> AppResult<()> {
        self.events
            .send(event)
            .map_err(|_| AppError::SessionClosed)
    }

    pub fn event_sink(&self) -> EventSink {
        self.events.clone()
    }

    /// 取消所有定时器并写回尚未保存的配置
    pub async fn shutdown(&self) -> AppResult<()> {
        self.request(Command::Shutdown).await
    }
}

/// 会话状态机。所有状态只在 `run` 所在的任务里修改。
pub struct SessionController {
    backend: Arc<dyn SyncBackend>,
    frontend: Arc<dyn Frontend>,
    config: Arc<AppConfig>,
    store: ConfigStore,
    logs: LogBuffer,
    progress: ProgressTracker,
    reports: ReportCache,
    history: SessionHistory,
    scheduler: Scheduler,
    view: View,
    previous_view: View,
    syncing: bool,
    initialized: bool,
    awaiting_folder: bool,
    last_error: Option<String>,
    courses: Vec<Course>,
    active_report: Option<SyncReport>,
    sync_state: SyncState,
    local_stats: LocalStats,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedReceiver<BackendEvent>,
    ticks: mpsc::UnboundedReceiver<Tick>,
    state_tx: watch::Sender<SessionSnapshot>,
}

impl SessionController {
    pub fn new(
        backend: Arc<dyn SyncBackend>,
        frontend: Arc<dyn Frontend>,
        config: Arc<AppConfig>,
        channel: EventChannel,
    ) -> (Self, SessionHandle) {
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (tick_tx, ticks) = mpsc::unbounded_channel();
        let (sink, events) = channel.into_parts();
        let (state_tx, state_rx) = watch::channel(SessionSnapshot::default());

        let controller = Self {
            store: ConfigStore::new(backend.clone(), config.timings.config_save_debounce),
            reports: ReportCache::new(backend.clone()),
            logs: LogBuffer::new(config.log_capacity),
            history: SessionHistory::new(config.history_capacity),
            progress: ProgressTracker::new(),
            scheduler: Scheduler::new(tick_tx),
            backend,
            frontend,
            config,
            view: View::Loading,
            previous_view: View::Login,
            syncing: false,
            initialized: false,
            awaiting_folder: false,
            last_error: None,
            courses: Vec::new(),
            active_report: None,
            sync_state: SyncState::default(),
            local_stats: LocalStats::default(),
            commands,
            events,
            ticks,
            state_tx,
        };
        let handle = SessionHandle {
            commands: command_tx,
            events: sink,
            state: state_rx,
        };
        (controller, handle)
    }

    pub async fn run(mut self) {
        info!("会话控制器启动");
        self.start_initialization().await;
        self.publish();

        let mut ack = None;
        loop {
            // 引擎事件先于用户命令处理，`snapshot` 因此能看到之前送达的所有事件
            tokio::select! {
                biased;
                Some(event) = self.events.recv() => self.handle_event(event).await,
                Some(tick) = self.ticks.recv() => self.handle_tick(tick).await,
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown(reply)) => {
                        ack = Some(reply);
                        break;
                    }
                    Some(command) => self.handle_command(command).await,
                    None => {
                        debug!("所有会话句柄均已释放");
                        break;
                    }
                },
            }
            self.publish();
        }

        self.shutdown().await;
        self.publish();
        if let Some(reply) = ack {
            let _ = reply.send(());
        }
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::UpdateConfig(patch) => self.store.update(patch),
            Command::SaveSettings(reply) => {
                let result = self.save_settings().await;
                let _ = reply.send(result);
            }
            Command::OpenSettings => self.open_settings(),
            Command::CloseSettings => self.close_settings(),
            Command::Login => self.login().await,
            Command::StartSync => self.start_sync().await,
            Command::UpdateCourse { id, update } => self.update_course(&id, update).await,
            Command::SetAllCourses { skip } => self.set_all_courses(skip).await,
            Command::Logout => self.logout().await,
            Command::SelectFolder => self.select_folder().await,
            Command::OpenFolder(name) => self.open_folder(&name).await,
            Command::OpenFile(path) => self.open_file(&path).await,
            Command::OpenReport(id) => self.open_report(&id).await,
            Command::RefreshReports(limit) => {
                self.reports.list_recent(limit).await;
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            // 由 run 循环处理
            Command::Shutdown(_) => {}
        }
    }

    async fn shutdown(&mut self) {
        self.scheduler.cancel_all();
        self.store.flush().await;
        info!("会话控制器已停止");
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.snapshot());
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            view: self.view,
            syncing: self.syncing,
            initialized: self.initialized,
            awaiting_folder: self.awaiting_folder,
            last_error: self.last_error.clone(),
            config: self.store.current().clone(),
            courses: self.courses.clone(),
            logs: self.logs.to_vec(),
            progress: self.progress.snapshot().cloned(),
            phase: self.progress.phase(),
            course_fraction: self.progress.course_fraction(),
            overall_fraction: self.progress.overall_fraction(),
            history: self.history.to_vec(),
            reports: self.reports.recent().to_vec(),
            active_report: self.active_report.clone(),
            sync_state: self.sync_state.clone(),
            local_stats: self.local_stats.clone(),
        }
    }
}
