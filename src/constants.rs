// src/constants.rs

pub const UI_WIDTH: usize = 72;
pub const COURSE_NAME_TRUNCATE_LENGTH: usize = 44;
pub const CONFIG_DIR_NAME: &str = concat!(".", clap::crate_name!());
pub const CONFIG_FILE_NAME: &str = "client.json";
pub const LOG_FILE_NAME: &str = "course-sync.log";
pub const LOG_FALLBACK_FILE_NAME: &str = "fallback.log";
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
pub const DEFAULT_LANGUAGE: &str = "zh-CN";
pub const DEFAULT_CONCURRENCY: usize = 3;

pub const LOG_CAPACITY: usize = 100;
pub const HISTORY_CAPACITY: usize = 10;
pub const REPORT_FETCH_LIMIT: usize = 20;

/// 同步失败信息中出现这些词（不区分大小写）即视为认证失败
pub const AUTH_ERROR_KEYWORDS: &[&str] = &["credentials", "login", "auth", "password", "username"];

pub mod timing {
    pub const CONFIG_SAVE_DEBOUNCE_MS: u64 = 300;
    pub const REORDER_DEBOUNCE_MS: u64 = 800;
    pub const PROGRESS_HOLD_MS: u64 = 2000;
    pub const READINESS_POLL_MS: u64 = 100;
    pub const INIT_FALLBACK_MS: u64 = 1000;
    pub const AUTO_SYNC_DELAY_MS: u64 = 1000;
    pub const STATS_REFRESH_MS: u64 = 3000;
}

pub mod methods {
    pub const GET_INIT_STATE: &str = "get_init_state";
    pub const LOAD_CONFIG: &str = "load_config";
    pub const SAVE_CONFIG: &str = "save_config";
    pub const LOGIN: &str = "login";
    pub const SYNC_DOWNLOADS: &str = "sync_downloads";
    pub const SELECT_FOLDER: &str = "select_folder";
    pub const UPDATE_COURSE_CONFIG: &str = "update_course_config";
    pub const GET_SYNC_REPORTS: &str = "get_sync_reports";
    pub const GET_SYNC_REPORT: &str = "get_sync_report";
    pub const GET_LOCAL_STATS: &str = "get_local_stats";
    pub const OPEN_FOLDER: &str = "open_folder";
    pub const OPEN_FILE: &str = "open_file";
    pub const LOGOUT: &str = "logout";
}
