// src/session/lifecycle.rs

use super::{
    SessionController,
    auth::{FailureKind, classify_failure},
    scheduler::{Tick, TimerKind},
};
use crate::models::{BackendEvent, InitState, ProgressEvent, ProgressPhase, View};
use log::{debug, error, info, trace, warn};

impl SessionController {
    /// 引擎可能在进程启动后才就绪：立即尝试一次，同时轮询就绪状态并设置兜底定时器
    pub(super) async fn start_initialization(&mut self) {
        self.scheduler
            .every(TimerKind::ReadinessPoll, self.config.timings.readiness_poll);
        self.scheduler
            .once(TimerKind::InitFallback, self.config.timings.init_fallback);
        if self.backend.is_ready() {
            self.initialize().await;
        }
    }

    /// 只会成功执行一次，之后的就绪信号直接忽略
    pub(super) async fn initialize(&mut self) {
        if self.initialized {
            debug!("会话已初始化，忽略重复的初始化请求");
            return;
        }
        self.scheduler.cancel(TimerKind::ReadinessPoll);
        self.scheduler.cancel(TimerKind::InitFallback);

        match self.backend.get_init_state().await {
            Ok(state) => {
                self.initialized = true;
                let auto_sync = state.should_auto_sync;
                self.hydrate(state, true);
                info!(
                    "会话初始化完成，当前页面 {:?}，共 {} 门课程",
                    self.view,
                    self.courses.len()
                );
                if auto_sync {
                    debug!("引擎要求自动同步");
                    self.scheduler
                        .once(TimerKind::AutoSync, self.config.timings.auto_sync_delay);
                }
            }
            Err(e) => {
                warn!("获取初始状态失败，转到登录页: {}", e);
                self.view = View::Login;
                // 尽量预填登录表单
                if let Err(e) = self.store.load().await {
                    warn!("加载配置失败: {}", e);
                }
            }
        }
    }

    /// 用引擎返回的状态覆盖本地副本
    pub(super) fn hydrate(&mut self, state: InitState, navigate: bool) {
        if self.store.has_pending_write() {
            debug!("存在未写回的配置修改，保留本地配置");
        } else {
            self.store.replace(state.config);
        }
        self.apply_courses(state.courses);
        if let Some(last_sync) = &state.state.last_sync {
            self.history.record(last_sync.clone());
        }
        self.sync_state = state.state;
        self.local_stats = state.local_stats;
        if navigate {
            self.view = match state.view {
                View::Loading => View::Login,
                view => view,
            };
        }
    }

    pub(super) async fn handle_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Ready => {
                if self.initialized {
                    debug!("会话已初始化，忽略引擎就绪通知");
                } else {
                    self.initialize().await;
                }
            }
            BackendEvent::Log(message) => {
                debug!(target: "engine", "{}", message);
                self.logs.append(message);
            }
            BackendEvent::Courses(courses) => {
                debug!("收到 {} 门课程", courses.len());
                self.apply_courses(courses);
            }
            BackendEvent::Progress(event) => self.ingest_progress(event),
            BackendEvent::SyncCompleted => self.handle_sync_completed().await,
            BackendEvent::SyncFailed(message) => {
                if self.syncing {
                    self.handle_sync_failure(&message);
                } else {
                    debug!("收到同步失败通知，但当前没有进行中的同步: {}", message);
                }
            }
            BackendEvent::FolderSelected(path) => self.handle_folder_selected(path),
        }
    }

    pub(super) async fn handle_tick(&mut self, tick: Tick) {
        if !self.scheduler.accept(tick) {
            trace!("丢弃过期的定时器 {:?}", tick.kind);
            return;
        }
        match tick.kind {
            TimerKind::ReadinessPoll => {
                if self.backend.is_ready() {
                    self.initialize().await;
                }
            }
            TimerKind::InitFallback => {
                debug!("等待引擎就绪超时，直接尝试初始化");
                self.initialize().await;
            }
            TimerKind::AutoSync => self.start_sync().await,
            TimerKind::Reorder => self.reorder_courses(),
            TimerKind::ProgressHold => self.progress.clear(),
            TimerKind::StatsRefresh => self.refresh_local_stats().await,
        }
    }

    fn ingest_progress(&mut self, event: ProgressEvent) {
        let transition = self.progress.ingest(event);

        if let Some(message) = transition.failure {
            self.scheduler.cancel(TimerKind::ProgressHold);
            self.scheduler.cancel(TimerKind::StatsRefresh);
            if self.syncing {
                self.handle_sync_failure(&message);
            } else {
                warn!("收到失败的进度事件，但当前没有进行中的同步: {}", message);
            }
            return;
        }

        match transition.to {
            ProgressPhase::Downloading => {
                if transition.entered(ProgressPhase::Downloading) {
                    self.scheduler.cancel(TimerKind::ProgressHold);
                    self.scheduler
                        .every(TimerKind::StatsRefresh, self.config.timings.stats_refresh);
                }
            }
            ProgressPhase::Complete => {
                self.scheduler.cancel(TimerKind::StatsRefresh);
                if transition.entered(ProgressPhase::Complete) {
                    self.scheduler
                        .once(TimerKind::ProgressHold, self.config.timings.progress_hold);
                }
            }
            ProgressPhase::Idle => {
                self.scheduler.cancel(TimerKind::ProgressHold);
                self.scheduler.cancel(TimerKind::StatsRefresh);
            }
        }
    }

    async fn refresh_local_stats(&mut self) {
        match self.backend.get_local_stats().await {
            Ok(stats) => self.local_stats = stats,
            Err(e) => debug!("刷新本地文件统计失败: {}", e),
        }
    }

    pub(super) fn clear_progress(&mut self) {
        self.progress.clear();
        self.scheduler.cancel(TimerKind::ProgressHold);
        self.scheduler.cancel(TimerKind::StatsRefresh);
    }

    async fn handle_sync_completed(&mut self) {
        if !self.syncing {
            debug!("收到同步完成通知，但当前没有进行中的同步");
        }
        self.syncing = false;
        self.clear_progress();
        self.view = View::Dashboard;
        info!("同步完成");

        match self.backend.get_init_state().await {
            Ok(state) => self.hydrate(state, false),
            Err(e) => warn!("同步完成后刷新状态失败: {}", e),
        }

        let reports = self.reports.list_recent(self.config.report_limit).await;
        if let Some(newest) = reports.first() {
            if let Some(report) = self.reports.get(&newest.id).await {
                self.active_report = Some(report);
            }
        }
    }

    pub(super) fn handle_sync_failure(&mut self, message: &str) {
        self.syncing = false;
        self.clear_progress();
        self.last_error = Some(message.to_string());
        error!("同步失败: {}", message);
        self.frontend.alert(&format!("同步失败: {}", message));

        if classify_failure(message) == FailureKind::Authentication {
            warn!("同步失败疑似认证问题，清空课程并返回登录页");
            self.courses.clear();
            self.scheduler.cancel(TimerKind::Reorder);
            self.view = View::Login;
        }
    }
}
