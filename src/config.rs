// src/config.rs

pub mod file;

use self::file::load_or_create_external_config;
use crate::{
    cli::Cli,
    constants::{self, timing},
    error::AppResult,
    session::FolderPickerMode,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfigFromFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

/// 各类防抖与轮询间隔（毫秒）
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TimingsFromFile {
    pub config_save_debounce: Option<u64>,
    pub reorder_debounce: Option<u64>,
    pub progress_hold: Option<u64>,
    pub readiness_poll: Option<u64>,
    pub init_fallback: Option<u64>,
    pub auto_sync_delay: Option<u64>,
    pub stats_refresh: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExternalConfig {
    #[serde(default)]
    pub engine: EngineConfigFromFile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_picker: Option<FolderPickerMode>,
    #[serde(default)]
    pub timings: TimingsFromFile,
    pub log_capacity: Option<usize>,
    pub history_capacity: Option<usize>,
    pub report_limit: Option<usize>,
}

impl ExternalConfig {
    pub(crate) fn default_app_config() -> Self {
        Self {
            engine: EngineConfigFromFile::default(),
            folder_picker: None,
            timings: TimingsFromFile {
                config_save_debounce: Some(timing::CONFIG_SAVE_DEBOUNCE_MS),
                reorder_debounce: Some(timing::REORDER_DEBOUNCE_MS),
                progress_hold: Some(timing::PROGRESS_HOLD_MS),
                readiness_poll: Some(timing::READINESS_POLL_MS),
                init_fallback: Some(timing::INIT_FALLBACK_MS),
                auto_sync_delay: Some(timing::AUTO_SYNC_DELAY_MS),
                stats_refresh: Some(timing::STATS_REFRESH_MS),
            },
            log_capacity: Some(constants::LOG_CAPACITY),
            history_capacity: Some(constants::HISTORY_CAPACITY),
            report_limit: Some(constants::REPORT_FETCH_LIMIT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timings {
    pub config_save_debounce: Duration,
    pub reorder_debounce: Duration,
    pub progress_hold: Duration,
    pub readiness_poll: Duration,
    pub init_fallback: Duration,
    pub auto_sync_delay: Duration,
    pub stats_refresh: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self::from_file(&TimingsFromFile::default())
    }
}

impl Timings {
    fn from_file(file: &TimingsFromFile) -> Self {
        let ms = |value: Option<u64>, default: u64| Duration::from_millis(value.unwrap_or(default));
        Self {
            config_save_debounce: ms(file.config_save_debounce, timing::CONFIG_SAVE_DEBOUNCE_MS),
            reorder_debounce: ms(file.reorder_debounce, timing::REORDER_DEBOUNCE_MS),
            progress_hold: ms(file.progress_hold, timing::PROGRESS_HOLD_MS),
            // 轮询间隔为 0 会让 interval 直接 panic
            readiness_poll: ms(file.readiness_poll, timing::READINESS_POLL_MS)
                .max(Duration::from_millis(1)),
            init_fallback: ms(file.init_fallback, timing::INIT_FALLBACK_MS),
            auto_sync_delay: ms(file.auto_sync_delay, timing::AUTO_SYNC_DELAY_MS),
            stats_refresh: ms(file.stats_refresh, timing::STATS_REFRESH_MS)
                .max(Duration::from_millis(1)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub engine_command: Option<String>,
    pub engine_args: Vec<String>,
    pub folder_picker: FolderPickerMode,
    pub timings: Timings,
    pub log_capacity: usize,
    pub history_capacity: usize,
    pub report_limit: usize,
}

impl AppConfig {
    pub fn new(args: &Cli) -> AppResult<Self> {
        let external_config = load_or_create_external_config()?;
        Ok(Self::from_external(external_config, args))
    }

    /// 命令行参数优先于配置文件，配置文件优先于内置默认值
    pub fn from_external(external: ExternalConfig, args: &Cli) -> Self {
        let engine_command = args.engine.clone().or(external.engine.command);
        let engine_args = if args.engine_args.is_empty() {
            external.engine.args
        } else {
            args.engine_args.clone()
        };

        Self {
            engine_command,
            engine_args,
            folder_picker: args
                .folder_picker
                .or(external.folder_picker)
                .unwrap_or_else(FolderPickerMode::for_current_platform),
            timings: Timings::from_file(&external.timings),
            log_capacity: external.log_capacity.unwrap_or(constants::LOG_CAPACITY),
            history_capacity: external
                .history_capacity
                .unwrap_or(constants::HISTORY_CAPACITY),
            report_limit: external
                .report_limit
                .unwrap_or(constants::REPORT_FETCH_LIMIT),
        }
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine_command: None,
            engine_args: Vec::new(),
            folder_picker: FolderPickerMode::Direct,
            timings: Timings::default(),
            log_capacity: constants::LOG_CAPACITY,
            history_capacity: constants::HISTORY_CAPACITY,
            report_limit: constants::REPORT_FETCH_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_overrides_file_values() {
        let mut external = ExternalConfig::default_app_config();
        external.engine.command = Some("python3".into());
        external.engine.args = vec!["engine.py".into()];
        external.folder_picker = Some(FolderPickerMode::Deferred);
        external.timings.reorder_debounce = Some(500);

        let args = Cli::parse_from([
            "course-sync",
            "--engine",
            "/opt/engine/bin/engine",
            "--folder-picker",
            "direct",
        ]);
        let config = AppConfig::from_external(external, &args);

        assert_eq!(config.engine_command.as_deref(), Some("/opt/engine/bin/engine"));
        // 命令行没有给参数时沿用配置文件
        assert_eq!(config.engine_args, vec!["engine.py".to_string()]);
        assert_eq!(config.folder_picker, FolderPickerMode::Direct);
        assert_eq!(config.timings.reorder_debounce, Duration::from_millis(500));
        assert_eq!(config.timings.progress_hold, Duration::from_millis(2000));
    }

    #[test]
    fn test_defaults_match_documented_timings() {
        let timings = Timings::default();
        assert_eq!(timings.config_save_debounce, Duration::from_millis(300));
        assert_eq!(timings.reorder_debounce, Duration::from_millis(800));
        assert_eq!(timings.readiness_poll, Duration::from_millis(100));
        assert_eq!(timings.init_fallback, Duration::from_millis(1000));
        assert_eq!(timings.stats_refresh, Duration::from_millis(3000));
    }
}
