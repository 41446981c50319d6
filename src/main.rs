// src/main.rs

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use course_sync::{cli::Cli, error::AppError, run_from_cli};
use std::{env, sync::Arc};

#[tokio::main]
async fn main() {
    // 为 Windows 终端启用 ANSI 颜色支持
    #[cfg(windows)]
    {
        colored::control::set_virtual_terminal(true).ok();
    }

    let bin_name = env::var("CARGO_BIN_NAME").unwrap_or_else(|_| "course-sync".to_string());
    let after_help = format!(
        "示例:\n  # 启动交互模式 (默认)\n  {bin}\n\n  # 指定同步引擎并执行一次同步\n  {bin} --engine python3 --engine-arg engine.py --sync\n\n  # 查看最近 5 份同步报告\n  {bin} --reports --limit 5",
        bin = bin_name
    );

    let cmd = Cli::command().after_help(after_help);
    let args = match Cli::from_arg_matches(&cmd.get_matches()) {
        Ok(args) => Arc::new(args),
        Err(e) => e.exit(),
    };

    match run_from_cli(args).await {
        Ok(()) => {}
        Err(AppError::UserInterrupt) => std::process::exit(130),
        Err(e) => {
            eprintln!("\n{} {}", "[X]".red(), format!("程序执行出错: {}", e).red());
            std::process::exit(1);
        }
    }
}
