// src/session/account.rs

use super::{SessionController, folder::FolderOutcome, scheduler::TimerKind};
use crate::{
    constants::methods,
    error::AppResult,
    models::{ConfigPatch, LocalStats, SyncState, View},
};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

impl SessionController {
    /// 同一时刻只允许一个同步；结果通过引擎事件返回
    pub(super) async fn start_sync(&mut self) {
        if self.syncing {
            info!("同步正在进行中，忽略本次请求");
            return;
        }
        self.syncing = true;
        self.last_error = None;
        self.publish();
        info!("开始同步");

        if let Err(e) = self.backend.sync_downloads().await {
            self.handle_sync_failure(&e.to_string());
        }
    }

    pub(super) async fn login(&mut self) {
        if self.syncing {
            info!("同步正在进行中，忽略登录请求");
            return;
        }
        if !self.store.current().has_credentials() {
            self.frontend.alert("请输入学号和密码");
            return;
        }
        self.syncing = true;
        self.last_error = None;
        self.publish();
        info!("使用账号 {} 登录", self.store.current().username);

        let config = self.store.current().clone();
        if let Err(e) = self.backend.login(&config).await {
            self.handle_sync_failure(&e.to_string());
        }
    }

    pub(super) async fn logout(&mut self) {
        if !self.frontend.confirm("确定要退出登录吗？").await {
            debug!("用户取消了退出登录");
            return;
        }

        let result = self
            .backend
            .logout()
            .await
            .and_then(|r| r.into_app_result(methods::LOGOUT));
        match result {
            Ok(()) => {
                self.store.clear_credentials();
                self.courses.clear();
                self.scheduler.cancel(TimerKind::Reorder);
                self.scheduler.cancel(TimerKind::AutoSync);
                self.clear_progress();
                self.syncing = false;
                self.sync_state = SyncState::default();
                self.local_stats = LocalStats::default();
                self.active_report = None;
                self.view = View::Login;
                info!("已退出登录");
            }
            Err(e) => {
                error!("退出登录失败: {}", e);
                self.frontend.alert(&format!("退出登录失败: {}", e));
            }
        }
    }

    pub(super) fn open_settings(&mut self) {
        if self.view != View::Settings {
            self.previous_view = self.view;
            self.view = View::Settings;
        }
    }

    /// 不保存直接返回，已安排的防抖写入照常执行
    pub(super) fn close_settings(&mut self) {
        if self.view == View::Settings {
            self.view = self.previous_view;
        }
    }

    pub(super) async fn save_settings(&mut self) -> AppResult<()> {
        match self.store.save_immediately().await {
            Ok(()) => {
                self.close_settings();
                Ok(())
            }
            Err(e) => {
                error!("保存设置失败: {}", e);
                self.frontend.alert(&format!("保存设置失败: {}", e));
                Err(e)
            }
        }
    }

    pub(super) async fn select_folder(&mut self) {
        match self.config.folder_picker.request(self.backend.as_ref()).await {
            Ok(FolderOutcome::Chosen(Some(path))) => self.apply_download_dir(path),
            Ok(FolderOutcome::Chosen(None)) => debug!("用户取消了目录选择"),
            Ok(FolderOutcome::Pending) => {
                debug!("等待目录选择结果");
                self.awaiting_folder = true;
            }
            Err(e) => {
                error!("打开目录选择框失败: {}", e);
                self.frontend.alert(&format!("选择目录失败: {}", e));
            }
        }
    }

    pub(super) fn handle_folder_selected(&mut self, path: Option<PathBuf>) {
        if !self.awaiting_folder {
            warn!("收到未请求的目录选择结果，已忽略");
            return;
        }
        self.awaiting_folder = false;
        match path {
            Some(path) => self.apply_download_dir(path),
            None => debug!("用户取消了目录选择"),
        }
    }

    fn apply_download_dir(&mut self, path: PathBuf) {
        let path = dunce::simplified(&path).to_path_buf();
        info!("下载目录设置为 {}", path.display());
        self.store.update(ConfigPatch::download_dir(path));
    }

    pub(super) async fn open_folder(&mut self, name: &str) {
        let result = self
            .backend
            .open_folder(name)
            .await
            .and_then(|r| r.into_app_result(methods::OPEN_FOLDER));
        if let Err(e) = result {
            warn!("打开文件夹 '{}' 失败: {}", name, e);
            self.frontend.alert(&format!("无法打开文件夹: {}", e));
        }
    }

    pub(super) async fn open_file(&mut self, path: &Path) {
        let result = self
            .backend
            .open_file(path)
            .await
            .and_then(|r| r.into_app_result(methods::OPEN_FILE));
        if let Err(e) = result {
            warn!("打开文件 '{}' 失败: {}", path.display(), e);
            self.frontend.alert(&format!("无法打开文件: {}", e));
        }
    }
}
