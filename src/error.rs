// src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("同步引擎尚未就绪")]
    EngineNotReady,
    #[error("同步引擎拒绝了调用 '{method}': {message}")]
    EngineRejected { method: String, message: String },
    #[error("同步引擎进程已退出")]
    EngineClosed,
    #[error("同步引擎协议错误: {0}")]
    Protocol(String),
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),
    #[error("会话已关闭")]
    SessionClosed,
    #[error("用户中断")]
    UserInterrupt,
    #[error("{0}")] // 只打印内部信息，不加任何前缀
    UserInputError(String),
    #[error("未知错误: {0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn rejected(method: &str, message: impl Into<String>) -> Self {
        AppError::EngineRejected {
            method: method.to_string(),
            message: message.into(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
