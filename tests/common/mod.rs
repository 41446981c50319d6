// tests/common/mod.rs

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use course_sync::{
    backend::{EventChannel, SyncBackend},
    config::AppConfig,
    error::{AppError, AppResult},
    models::{
        Configuration, Course, CourseConfig, InitState, LocalStats, OperationResult,
        ReportCounts, ReportSummary, SyncReport, SyncState, View,
    },
    session::{Frontend, SessionController, SessionHandle, SessionSnapshot},
};
use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::task::JoinHandle;

/// 可编程的同步引擎替身，记录所有调用
pub struct FakeBackend {
    pub ready: AtomicBool,
    pub init_state: Mutex<Option<InitState>>,
    pub stored_config: Mutex<Option<Configuration>>,
    pub save_delay: Mutex<Duration>,
    pub saved: Mutex<Vec<Configuration>>,
    pub course_updates: Mutex<Vec<(String, CourseConfig)>>,
    pub reports: Mutex<Vec<SyncReport>>,
    pub report_fetches: Mutex<Vec<String>>,
    pub folder: Mutex<Option<PathBuf>>,
    pub sync_error: Mutex<Option<String>>,
    pub logout_result: Mutex<OperationResult>,
    pub open_result: Mutex<OperationResult>,
    pub opened: Mutex<Vec<String>>,
    pub init_calls: AtomicUsize,
    pub load_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub sync_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub stats_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            ready: AtomicBool::new(true),
            init_state: Mutex::new(None),
            stored_config: Mutex::new(None),
            save_delay: Mutex::new(Duration::ZERO),
            saved: Mutex::new(Vec::new()),
            course_updates: Mutex::new(Vec::new()),
            reports: Mutex::new(Vec::new()),
            report_fetches: Mutex::new(Vec::new()),
            folder: Mutex::new(None),
            sync_error: Mutex::new(None),
            logout_result: Mutex::new(OperationResult::ok()),
            open_result: Mutex::new(OperationResult::ok()),
            opened: Mutex::new(Vec::new()),
            init_calls: AtomicUsize::new(0),
            load_calls: AtomicUsize::new(0),
            login_calls: AtomicUsize::new(0),
            sync_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            stats_calls: AtomicUsize::new(0),
        })
    }

    pub fn with_state(state: InitState) -> Arc<Self> {
        let backend = Self::new();
        backend.set_state(state);
        backend
    }

    pub fn set_state(&self, state: InitState) {
        *self.init_state.lock().unwrap() = Some(state);
    }

    pub fn set_last_sync(&self, timestamp: &str) {
        if let Some(state) = self.init_state.lock().unwrap().as_mut() {
            state.state.last_sync = Some(timestamp.to_string());
        }
    }

    pub fn saved_configs(&self) -> Vec<Configuration> {
        self.saved.lock().unwrap().clone()
    }

    pub fn pushed_updates(&self) -> Vec<(String, CourseConfig)> {
        self.course_updates.lock().unwrap().clone()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyncBackend for FakeBackend {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn get_init_state(&self) -> AppResult<InitState> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if !self.is_ready() {
            return Err(AppError::EngineNotReady);
        }
        self.init_state
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AppError::Protocol("init state unavailable".to_string()))
    }

    async fn load_config(&self) -> AppResult<Configuration> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        self.stored_config
            .lock()
            .unwrap()
            .clone()
            .ok_or(AppError::EngineNotReady)
    }

    async fn save_config(&self, config: &Configuration) -> AppResult<OperationResult> {
        let delay = *self.save_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.saved.lock().unwrap().push(config.clone());
        Ok(OperationResult::ok())
    }

    async fn login(&self, _config: &Configuration) -> AppResult<()> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn sync_downloads(&self) -> AppResult<()> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        match self.sync_error.lock().unwrap().clone() {
            Some(message) => Err(AppError::rejected("sync_downloads", message)),
            None => Ok(()),
        }
    }

    async fn select_folder(&self) -> AppResult<Option<PathBuf>> {
        Ok(self.folder.lock().unwrap().clone())
    }

    async fn update_course_config(&self, id: &str, config: &CourseConfig) -> AppResult<bool> {
        self.course_updates
            .lock()
            .unwrap()
            .push((id.to_string(), config.clone()));
        Ok(true)
    }

    async fn get_sync_reports(&self, limit: usize) -> AppResult<Vec<ReportSummary>> {
        Ok(self
            .reports
            .lock()
            .unwrap()
            .iter()
            .take(limit)
            .map(SyncReport::to_summary)
            .collect())
    }

    async fn get_sync_report(&self, id: &str) -> AppResult<SyncReport> {
        self.report_fetches.lock().unwrap().push(id.to_string());
        self.reports
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| AppError::rejected("get_sync_report", "not found"))
    }

    async fn get_local_stats(&self) -> AppResult<LocalStats> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        Ok(LocalStats::default())
    }

    async fn open_folder(&self, name: &str) -> AppResult<OperationResult> {
        self.opened.lock().unwrap().push(name.to_string());
        Ok(self.open_result.lock().unwrap().clone())
    }

    async fn open_file(&self, path: &Path) -> AppResult<OperationResult> {
        self.opened.lock().unwrap().push(path.display().to_string());
        Ok(self.open_result.lock().unwrap().clone())
    }

    async fn logout(&self) -> AppResult<OperationResult> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.logout_result.lock().unwrap().clone())
    }
}

/// 记录提示内容，确认框按预设回答
pub struct RecordingFrontend {
    pub answer: AtomicBool,
    pub confirms: AtomicUsize,
    pub alerts: Mutex<Vec<String>>,
}

impl RecordingFrontend {
    pub fn new(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            answer: AtomicBool::new(answer),
            confirms: AtomicUsize::new(0),
            alerts: Mutex::new(Vec::new()),
        })
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Frontend for RecordingFrontend {
    async fn confirm(&self, _message: &str) -> bool {
        self.confirms.fetch_add(1, Ordering::SeqCst);
        self.answer.load(Ordering::SeqCst)
    }

    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}

pub struct Harness {
    pub backend: Arc<FakeBackend>,
    pub frontend: Arc<RecordingFrontend>,
    pub handle: SessionHandle,
    task: JoinHandle<()>,
}

impl Harness {
    pub fn start(backend: Arc<FakeBackend>) -> Self {
        Self::start_with(backend, RecordingFrontend::new(true), AppConfig::default())
    }

    pub fn start_with(
        backend: Arc<FakeBackend>,
        frontend: Arc<RecordingFrontend>,
        config: AppConfig,
    ) -> Self {
        let (controller, handle) = SessionController::new(
            backend.clone(),
            frontend.clone(),
            Arc::new(config),
            EventChannel::new(),
        );
        let task = tokio::spawn(controller.run());
        Self {
            backend,
            frontend,
            handle,
            task,
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.handle.snapshot().await.unwrap()
    }

    pub async fn stop(self) {
        self.handle.shutdown().await.unwrap();
        self.task.await.unwrap();
    }
}

pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

pub fn course(id: &str, skip: bool) -> Course {
    Course {
        id: id.to_string(),
        name: format!("课程 {}", id),
        skip,
        available_tabs: vec!["教学内容".to_string(), "课程作业".to_string()],
        selected_tabs: vec!["教学内容".to_string()],
        ..Default::default()
    }
}

pub fn credentials() -> Configuration {
    Configuration {
        username: "2100012345".to_string(),
        password: "secret".to_string(),
        download_dir: PathBuf::from("/data/courses"),
        concurrent_downloads: 5,
        ..Default::default()
    }
}

pub fn dashboard_state(courses: Vec<Course>) -> InitState {
    InitState {
        view: View::Dashboard,
        config: credentials(),
        state: SyncState {
            last_sync: None,
            total_files: 42,
        },
        courses,
        local_stats: LocalStats::default(),
        should_auto_sync: false,
    }
}

pub fn report(id: &str, day: u32) -> SyncReport {
    let started_at = NaiveDate::from_ymd_opt(2024, 3, day)
        .and_then(|d| d.and_hms_opt(10, 0, 0))
        .unwrap();
    SyncReport {
        id: id.to_string(),
        started_at,
        finished_at: Some(started_at + chrono::Duration::seconds(90)),
        duration_secs: 90.0,
        summary: ReportCounts {
            downloaded: 3,
            skipped: 1,
            failed: 0,
        },
        downloaded: Vec::new(),
        failed: Vec::new(),
        skipped: Vec::new(),
    }
}
