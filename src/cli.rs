// src/cli.rs

use crate::session::FolderPickerMode;
use clap::{Parser, ValueEnum, command, crate_version};

/// 定义日志输出级别
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Interactive,
    Sync,
    Reports,
}

// command 属性
#[derive(Parser, Debug, Clone)]
#[command(
    version = crate_version!(),
    about,
    long_about = None,
    disable_help_flag = true,
    disable_version_flag = true,
)]
#[command(group(
    clap::ArgGroup::new("mode")
        .args(&["interactive", "sync", "reports"]),
))]
pub struct Cli {
    // --- 运行模式 (Mode) ---
    /// 启动交互式会话 (默认)
    #[arg(short, long, action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub interactive: bool,
    /// 执行一次同步，完成后打印本次同步报告
    #[arg(short, long, action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub sync: bool,
    /// 列出最近的同步报告
    #[arg(short, long, action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub reports: bool,

    // --- 选项 (Options) ---
    /// 同步引擎的可执行文件，优先于 client.json 中的设置
    #[arg(long, value_name = "PROGRAM", help_heading = "Options")]
    pub engine: Option<String>,
    /// 传给同步引擎的参数，可重复指定
    #[arg(
        long = "engine-arg",
        value_name = "ARG",
        allow_hyphen_values = true,
        action = clap::ArgAction::Append,
        help_heading = "Options"
    )]
    pub engine_args: Vec<String>,
    /// 目录选择结果的返回方式: 'direct' 直接返回, 'deferred' 稍后推送
    #[arg(long, value_enum, help_heading = "Options")]
    pub folder_picker: Option<FolderPickerMode>,
    /// [报告模式] 最多列出的报告数量
    #[arg(long, value_parser = clap::value_parser!(usize), help_heading = "Options")]
    pub limit: Option<usize>,

    // --- 通用选项 (General) ---
    /// 显示此帮助信息并退出
    #[arg(short = 'h', long, action = clap::ArgAction::Help, global = true, help_heading = "General")]
    _help: Option<bool>,
    /// 显示版本信息并退出
    #[arg(short = 'V', long, action = clap::ArgAction::Version, global = true, help_heading = "General")]
    _version: Option<bool>,
    /// (隐藏参数) 设置日志文件的输出级别，用于调试
    #[arg(long, value_enum, default_value_t = LogLevel::Off, global = true, hide = true)]
    pub log_level: LogLevel,
}

impl Cli {
    pub fn mode(&self) -> RunMode {
        if self.sync {
            RunMode::Sync
        } else if self.reports {
            RunMode::Reports
        } else {
            RunMode::Interactive
        }
    }
}
