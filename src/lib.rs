// src/lib.rs

pub mod backend;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod session;
pub mod symbols;
pub mod ui;
pub mod utils;
mod workflows;

use crate::{
    backend::{EventChannel, StdioBackend},
    cli::{Cli, RunMode},
    config::AppConfig,
    error::{AppError, AppResult},
    session::{SessionController, SessionHandle},
    ui::ConsoleFrontend,
};
use colored::*;
use log::{debug, info, warn};
use std::sync::Arc;

/// 库的公共入口点，由 `main.rs` 调用
pub async fn run_from_cli(args: Arc<Cli>) -> AppResult<()> {
    logging::init(args.log_level);
    debug!("CLI 参数: {:?}", args);

    let config = Arc::new(AppConfig::new(&args)?);
    debug!("加载的应用配置: {:?}", config);

    let Some(program) = config.engine_command.clone() else {
        let path = config::file::get_config_dir()?.join(constants::CONFIG_FILE_NAME);
        return Err(AppError::UserInputError(format!(
            "未配置同步引擎。请使用 --engine 指定，或在 {} 中设置 engine.command。",
            path.display()
        )));
    };

    let channel = EventChannel::new();
    let backend = Arc::new(StdioBackend::spawn(
        &program,
        &config.engine_args,
        channel.sink(),
    )?);
    let (controller, handle) = SessionController::new(
        backend,
        Arc::new(ConsoleFrontend),
        config.clone(),
        channel,
    );
    let session = tokio::spawn(controller.run());
    watch_interrupt(handle.clone());

    let result = match args.mode() {
        RunMode::Interactive => workflows::run_interactive(&handle, config.report_limit).await,
        RunMode::Sync => workflows::run_sync_once(&handle).await,
        RunMode::Reports => {
            let limit = args.limit.unwrap_or(config.report_limit);
            workflows::list_reports(&handle, limit).await
        }
    };

    if let Err(e) = handle.shutdown().await {
        debug!("关闭会话时出错: {}", e);
    }
    if let Err(e) = session.await {
        warn!("会话任务异常退出: {}", e);
    }
    result
}

/// Ctrl+C 时先写回未保存的配置再退出
fn watch_interrupt(handle: SessionHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        info!("收到中断信号");
        println!("\n{} 用户强制中断程序。", "[!]".yellow());
        let _ = handle.shutdown().await;
        std::process::exit(130);
    });
}
