// src/models/mod.rs

pub mod events;
pub mod report;

use crate::{
    constants,
    error::{AppError, AppResult},
};
use clap::ValueEnum;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, path::PathBuf};

pub use events::{BackendEvent, ProgressEvent, ProgressPhase, TransferCounters};
pub use report::{DownloadedFile, FailedFile, ReportCounts, ReportSummary, SkippedFile, SyncReport};

/// 客户端当前展示的页面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Loading,
    Login,
    Dashboard,
    Settings,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chrome,
    Firefox,
    Edge,
    Safari,
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Browser::Chrome => "chrome",
            Browser::Firefox => "firefox",
            Browser::Edge => "edge",
            Browser::Safari => "safari",
        };
        f.write_str(name)
    }
}

/// 用户配置，由同步引擎持久化
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub username: String,
    pub password: String,
    pub download_dir: PathBuf,
    pub browser: Browser,
    pub headless: bool,
    pub concurrent_downloads: usize,
    pub auto_sync: bool,
    pub language: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            download_dir: PathBuf::from(constants::DEFAULT_DOWNLOAD_DIR),
            browser: Browser::default(),
            headless: true,
            concurrent_downloads: constants::DEFAULT_CONCURRENCY,
            auto_sync: false,
            language: constants::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl Configuration {
    pub fn has_credentials(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }

    /// 清除账号信息，保留下载目录、浏览器、并发数等设置
    pub fn clear_credentials(&mut self) {
        self.username.clear();
        self.password.clear();
    }
}

/// 对 `Configuration` 的部分更新，未设置的字段保持原值
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPatch {
    pub username: Option<String>,
    pub password: Option<String>,
    pub download_dir: Option<PathBuf>,
    pub browser: Option<Browser>,
    pub headless: Option<bool>,
    pub concurrent_downloads: Option<usize>,
    pub auto_sync: Option<bool>,
    pub language: Option<String>,
}

impl ConfigPatch {
    pub fn credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            ..Default::default()
        }
    }

    pub fn download_dir(path: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(self, config: &mut Configuration) {
        if let Some(v) = self.username {
            config.username = v;
        }
        if let Some(v) = self.password {
            config.password = v;
        }
        if let Some(v) = self.download_dir {
            config.download_dir = v;
        }
        if let Some(v) = self.browser {
            config.browser = v;
        }
        if let Some(v) = self.headless {
            config.headless = v;
        }
        if let Some(v) = self.concurrent_downloads {
            config.concurrent_downloads = v.max(1);
        }
        if let Some(v) = self.auto_sync {
            config.auto_sync = v;
        }
        if let Some(v) = self.language {
            config.language = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Course {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub available_tabs: Vec<String>,
    #[serde(default)]
    pub selected_tabs: Vec<String>,
}

impl Course {
    pub fn display_name(&self) -> &str {
        let alias = self.alias.trim();
        if alias.is_empty() { self.name.as_str() } else { alias }
    }

    /// 保证 selected_tabs 是 available_tabs 的子集，重复项只保留第一次出现
    pub fn normalize_tabs(&mut self) {
        let available = &self.available_tabs;
        let selected = std::mem::take(&mut self.selected_tabs);
        self.selected_tabs = selected
            .into_iter()
            .filter(|t| available.contains(t))
            .unique()
            .collect();
    }

    pub fn course_config(&self) -> CourseConfig {
        CourseConfig {
            alias: self.alias.trim().to_string(),
            selected_tabs: self.selected_tabs.clone(),
            skip: self.skip,
        }
    }
}

/// 推送给引擎的单门课程配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseConfig {
    pub alias: String,
    pub selected_tabs: Vec<String>,
    pub skip: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseUpdate {
    pub alias: Option<String>,
    pub selected_tabs: Option<Vec<String>>,
    pub skip: Option<bool>,
}

impl CourseUpdate {
    pub fn skip(skip: bool) -> Self {
        Self {
            skip: Some(skip),
            ..Default::default()
        }
    }

    pub fn alias(alias: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            ..Default::default()
        }
    }

    pub fn apply(self, course: &mut Course) {
        if let Some(alias) = self.alias {
            course.alias = alias.trim().to_string();
        }
        if let Some(tabs) = self.selected_tabs {
            course.selected_tabs = tabs;
        }
        if let Some(skip) = self.skip {
            course.skip = skip;
        }
        course.normalize_tabs();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SyncState {
    pub last_sync: Option<String>,
    pub total_files: u64,
}

/// 下载目录中的本地文件统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LocalStats {
    pub total: u64,
    pub courses: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitState {
    pub view: View,
    pub config: Configuration,
    pub state: SyncState,
    pub courses: Vec<Course>,
    pub local_stats: LocalStats,
    pub should_auto_sync: bool,
}

impl Default for InitState {
    fn default() -> Self {
        Self {
            view: View::Login,
            config: Configuration::default(),
            state: SyncState::default(),
            courses: Vec::new(),
            local_stats: LocalStats::default(),
            should_auto_sync: false,
        }
    }
}

/// 引擎对有副作用调用的统一回复
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl OperationResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }

    pub fn into_app_result(self, method: &str) -> AppResult<()> {
        if self.success {
            Ok(())
        } else {
            Err(AppError::rejected(
                method,
                self.error.unwrap_or_else(|| "未知原因".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_patch_only_touches_set_fields() {
        let mut config = Configuration {
            username: "2100012345".into(),
            password: "secret".into(),
            ..Default::default()
        };
        ConfigPatch {
            browser: Some(Browser::Firefox),
            concurrent_downloads: Some(0),
            ..Default::default()
        }
        .apply(&mut config);

        assert_eq!(config.browser, Browser::Firefox);
        // 并发数至少为 1
        assert_eq!(config.concurrent_downloads, 1);
        assert_eq!(config.username, "2100012345");
        assert!(config.has_credentials());
    }

    #[test]
    fn test_course_update_keeps_tabs_within_available() {
        let mut course = Course {
            id: "c1".into(),
            name: "数据结构与算法".into(),
            available_tabs: vec!["教学内容".into(), "课程作业".into()],
            ..Default::default()
        };
        CourseUpdate {
            selected_tabs: Some(vec!["课程作业".into(), "不存在的栏目".into()]),
            alias: Some("  数算 ".into()),
            skip: None,
        }
        .apply(&mut course);

        assert_eq!(course.selected_tabs, vec!["课程作业".to_string()]);
        assert_eq!(course.display_name(), "数算");
    }

    #[test]
    fn test_normalize_tabs_drops_non_adjacent_duplicates() {
        let mut course = Course {
            id: "c2".into(),
            name: "高等数学".into(),
            available_tabs: vec!["教学内容".into(), "课程作业".into()],
            selected_tabs: vec!["教学内容".into(), "课程作业".into(), "教学内容".into()],
            ..Default::default()
        };
        course.normalize_tabs();
        assert_eq!(
            course.course_config().selected_tabs,
            vec!["教学内容".to_string(), "课程作业".to_string()]
        );
    }

    #[test]
    fn test_operation_result_conversion() {
        assert!(OperationResult::ok().into_app_result("logout").is_ok());
        let err = OperationResult::failed("磁盘已满")
            .into_app_result("save_config")
            .unwrap_err();
        assert!(err.to_string().contains("磁盘已满"));
    }
}
