// src/workflows.rs

use crate::{
    constants,
    error::{AppError, AppResult},
    models::{Browser, ConfigPatch, CourseUpdate, ProgressPhase, SyncReport, View},
    session::{SessionHandle, SessionSnapshot},
    symbols, ui, utils,
};
use clap::ValueEnum;
use colored::*;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use log::{debug, error, info};
use std::time::Duration;

const PROGRESS_SCALE: u64 = 1000;
const REPORT_ENTRY_LIMIT: usize = 15;

/// 等待会话完成初始化（成功或回落到登录页）
pub(crate) async fn wait_until_loaded(handle: &SessionHandle) -> AppResult<SessionSnapshot> {
    let mut rx = handle.subscribe();
    let snapshot = rx
        .wait_for(|s| s.view != View::Loading)
        .await
        .map_err(|_| AppError::SessionClosed)?
        .clone();
    debug!("会话已加载，当前页面 {:?}", snapshot.view);
    Ok(snapshot)
}

fn new_sync_progress_bar() -> ProgressBar {
    let style = ProgressStyle::with_template(
        "{prefix:.bold.cyan} [{elapsed_precise}] [{bar:36.cyan/blue}] {percent:>3}% {wide_msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-");
    let bar = ProgressBar::new(PROGRESS_SCALE);
    bar.set_style(style);
    bar.set_prefix("同步");
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn render_progress(bar: &ProgressBar, snapshot: &SessionSnapshot) {
    bar.set_position((snapshot.overall_fraction * PROGRESS_SCALE as f64) as u64);
    let message = match &snapshot.progress {
        Some(p) if p.phase == ProgressPhase::Downloading => {
            let mut message = format!(
                "课程 {}/{} {} · 文件 {}/{}",
                p.current_course_index,
                p.total_courses,
                utils::truncate_text(
                    &p.current_course_name,
                    constants::COURSE_NAME_TRUNCATE_LENGTH / 2
                ),
                p.course_files_done,
                p.course_files_total
            );
            if let Some(file) = &p.current_file {
                message.push_str(&format!(
                    " · {} ({}/{})",
                    utils::truncate_text(file, 24),
                    HumanBytes(p.current_file_downloaded),
                    HumanBytes(p.current_file_size)
                ));
            }
            message
        }
        Some(p) if p.phase == ProgressPhase::Complete => format!(
            "完成: 下载 {} · 跳过 {} · 失败 {}",
            p.stats.downloaded, p.stats.skipped, p.stats.failed
        ),
        _ => snapshot
            .logs
            .last()
            .map(|entry| entry.message.clone())
            .unwrap_or_else(|| "正在准备...".to_string()),
    };
    bar.set_message(message);
}

/// 跟随一次登录或同步直到结束
async fn follow_sync(handle: &SessionHandle) -> AppResult<SessionSnapshot> {
    let mut rx = handle.subscribe();
    // 之前发出的命令此时已经处理完
    let mut snapshot = handle.snapshot().await?;
    if !snapshot.syncing {
        return Ok(snapshot);
    }

    let bar = new_sync_progress_bar();
    while snapshot.syncing {
        render_progress(&bar, &snapshot);
        rx.changed().await.map_err(|_| AppError::SessionClosed)?;
        snapshot = rx.borrow_and_update().clone();
    }
    bar.finish_and_clear();
    Ok(snapshot)
}

fn finish_sync(snapshot: &SessionSnapshot) -> AppResult<()> {
    match &snapshot.last_error {
        Some(message) => Err(AppError::UserInputError(format!("同步失败: {}", message))),
        None => {
            println!("\n{} 同步完成。", *symbols::OK);
            Ok(())
        }
    }
}

/// 登录页：读取账号密码并登录，登录会触发一次完整同步
async fn login_flow(
    handle: &SessionHandle,
    snapshot: &SessionSnapshot,
) -> AppResult<SessionSnapshot> {
    ui::print_header("登录");
    let default_user = snapshot.config.username.trim();
    let username = ui::prompt(
        "请输入学号",
        (!default_user.is_empty()).then_some(default_user),
    )
    .map_err(|_| AppError::UserInterrupt)?;
    if username.is_empty() {
        return Err(AppError::UserInterrupt);
    }
    let password = ui::prompt_hidden("请输入密码").map_err(|_| AppError::UserInterrupt)?;

    handle.update_config(ConfigPatch::credentials(username, password))?;
    handle.login()?;
    let snapshot = follow_sync(handle).await?;
    finish_sync(&snapshot)?;
    if snapshot.view != View::Dashboard {
        return Err(AppError::UserInputError(
            "登录未完成，请检查账号和密码。".to_string(),
        ));
    }
    Ok(snapshot)
}

pub(crate) async fn run_sync_once(handle: &SessionHandle) -> AppResult<()> {
    let snapshot = wait_until_loaded(handle).await?;
    let snapshot = if snapshot.view == View::Login {
        login_flow(handle, &snapshot).await?
    } else {
        handle.start_sync()?;
        let snapshot = follow_sync(handle).await?;
        finish_sync(&snapshot)?;
        snapshot
    };

    match &snapshot.active_report {
        Some(report) => print_report(report),
        None => println!("{} 引擎没有返回同步报告。", *symbols::INFO),
    }
    Ok(())
}

pub(crate) async fn list_reports(handle: &SessionHandle, limit: usize) -> AppResult<()> {
    let snapshot = wait_until_loaded(handle).await?;
    if !snapshot.initialized {
        return Err(AppError::EngineNotReady);
    }
    handle.refresh_reports(limit)?;
    let snapshot = handle.snapshot().await?;
    print_report_list(&snapshot);
    Ok(())
}

fn print_report_list(snapshot: &SessionSnapshot) {
    ui::print_header("最近的同步报告");
    if snapshot.reports.is_empty() {
        println!("{} 暂无同步报告。", *symbols::INFO);
        return;
    }
    for (i, report) in snapshot.reports.iter().enumerate() {
        println!(
            "  [{}] {}  耗时 {}  {} / {} / {}",
            format!("{:>2}", i + 1).yellow(),
            report.started_at.format("%Y-%m-%d %H:%M:%S"),
            utils::format_duration(report.duration_secs),
            format!("下载 {}", report.summary.downloaded).green(),
            format!("跳过 {}", report.summary.skipped).dimmed(),
            format!("失败 {}", report.summary.failed).red(),
        );
    }
}

pub(crate) fn print_report(report: &SyncReport) {
    let finished = report
        .finished_at
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    let summary = format!(
        "下载 {} · 跳过 {} · 失败 {} · 共 {}",
        report.summary.downloaded,
        report.summary.skipped,
        report.summary.failed,
        report.summary.total()
    );
    let timing = format!(
        "开始 {} · 结束 {} · 耗时 {}",
        report.started_at.format("%Y-%m-%d %H:%M:%S"),
        finished,
        utils::format_duration(report.duration_secs)
    );
    ui::box_message(
        &format!("同步报告 {}", report.id),
        &[summary.as_str(), timing.as_str()],
        |s| s.cyan(),
    );

    if !report.downloaded.is_empty() {
        ui::print_sub_header("新下载");
        for (i, file) in report.downloaded.iter().take(REPORT_ENTRY_LIMIT).enumerate() {
            println!(
                "  [{}] {} / {} ({})",
                format!("{:>2}", i + 1).yellow(),
                file.course,
                file.file_name,
                HumanBytes(file.size)
            );
        }
        print_remaining(report.downloaded.len());
    }
    if !report.failed.is_empty() {
        ui::print_sub_header("失败");
        for file in report.failed.iter().take(REPORT_ENTRY_LIMIT) {
            println!(
                "  {} {} / {}: [{}] {}",
                *symbols::ERROR,
                file.course,
                file.file_name,
                file.error_type,
                file.message
            );
        }
        print_remaining(report.failed.len());
    }
    if !report.skipped.is_empty() {
        ui::print_sub_header("跳过");
        for file in report.skipped.iter().take(REPORT_ENTRY_LIMIT) {
            println!("  - {} / {}: {}", file.course, file.file_name, file.reason.dimmed());
        }
        print_remaining(report.skipped.len());
    }
}

fn print_remaining(total: usize) {
    if total > REPORT_ENTRY_LIMIT {
        println!("  ... 以及另外 {} 项", total - REPORT_ENTRY_LIMIT);
    }
}

fn print_dashboard(snapshot: &SessionSnapshot) {
    ui::print_header("课程同步");
    println!(
        "  账号: {}    课程: {} (启用 {})    本地文件: {}",
        snapshot.config.username.cyan(),
        snapshot.courses.len(),
        snapshot.enabled_count(),
        snapshot.local_stats.total
    );
    println!(
        "  上次同步: {}    下载目录: {}",
        snapshot.sync_state.last_sync.as_deref().unwrap_or("从未同步"),
        snapshot.config.download_dir.display()
    );
    if let Some(message) = &snapshot.last_error {
        println!("  {} 上次同步失败: {}", *symbols::WARN, message.red());
    }
}

fn print_courses(snapshot: &SessionSnapshot) {
    ui::print_sub_header("课程列表");
    if snapshot.courses.is_empty() {
        println!("  暂无课程，请先同步。");
        return;
    }
    for (i, course) in snapshot.courses.iter().enumerate() {
        let marker = if course.skip {
            &*symbols::SKIPPED
        } else {
            &*symbols::ENABLED
        };
        let local = snapshot
            .local_stats
            .courses
            .get(course.display_name())
            .copied()
            .unwrap_or(0);
        let tabs = if course.selected_tabs.is_empty() {
            "-".to_string()
        } else {
            course.selected_tabs.join("、")
        };
        println!(
            "  [{}] {} {}  {} 个文件  栏目: {}",
            format!("{:>2}", i + 1).yellow(),
            marker,
            utils::truncate_text(course.display_name(), constants::COURSE_NAME_TRUNCATE_LENGTH),
            local,
            tabs.dimmed()
        );
    }
}

async fn manage_courses(handle: &SessionHandle) -> AppResult<()> {
    loop {
        let snapshot = handle.snapshot().await?;
        print_courses(&snapshot);
        if snapshot.courses.is_empty() {
            return Ok(());
        }

        let options = vec![
            "切换课程启用状态".to_string(),
            "设置课程别名".to_string(),
            "选择下载栏目".to_string(),
            "打开课程文件夹".to_string(),
        ];
        let choice = ui::selection_menu(&options, "课程管理", "输入序号，直接回车返回");
        let action = match choice.trim().parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => n,
            _ => return Ok(()),
        };

        let input = ui::prompt("请输入课程序号 (支持 1,3,2-4,all)", None).unwrap_or_default();
        let picked: Vec<_> = utils::parse_selection_indices(&input, snapshot.courses.len())
            .into_iter()
            .map(|i| snapshot.courses[i].clone())
            .collect();
        if picked.is_empty() {
            println!("{} 没有选中任何课程。", *symbols::WARN);
            continue;
        }

        match action {
            1 => {
                for course in &picked {
                    handle.update_course(&course.id, CourseUpdate::skip(!course.skip))?;
                }
            }
            2 => {
                for course in &picked {
                    let alias = ui::prompt(&format!("'{}' 的别名 (留空清除)", course.name), None)
                        .unwrap_or_default();
                    handle.update_course(&course.id, CourseUpdate::alias(alias))?;
                }
            }
            3 => {
                for course in &picked {
                    if course.available_tabs.is_empty() {
                        println!("{} '{}' 没有可选栏目。", *symbols::INFO, course.display_name());
                        continue;
                    }
                    let selection = ui::selection_menu(
                        &course.available_tabs,
                        &format!("'{}' 的下载栏目", course.display_name()),
                        "支持格式: 1, 3, 2-4, all",
                    );
                    let count = course.available_tabs.len();
                    let tabs = utils::parse_selection_indices(&selection, count)
                        .into_iter()
                        .map(|i| course.available_tabs[i].clone())
                        .collect();
                    handle.update_course(
                        &course.id,
                        CourseUpdate {
                            selected_tabs: Some(tabs),
                            ..Default::default()
                        },
                    )?;
                }
            }
            _ => {
                for course in &picked {
                    handle.open_folder(course.display_name())?;
                }
            }
        }
    }
}

async fn edit_settings(handle: &SessionHandle) -> AppResult<()> {
    handle.open_settings()?;
    let snapshot = handle.snapshot().await?;
    let config = &snapshot.config;
    ui::print_header("设置");
    println!("  直接回车保留当前值。");

    if ui::confirm(
        &format!("下载目录为 {}，是否重新选择", config.download_dir.display()),
        false,
    ) {
        let path = ui::prompt("输入新目录 (留空则打开系统目录选择框)", None).unwrap_or_default();
        if path.is_empty() {
            handle.select_folder()?;
        } else {
            handle.update_config(ConfigPatch::download_dir(path))?;
        }
    }

    let mut patch = ConfigPatch::default();
    let current_browser = config.browser.to_string();
    let browser = ui::prompt(
        "浏览器 (chrome/firefox/edge/safari)",
        Some(current_browser.as_str()),
    )
    .unwrap_or_default();
    match Browser::from_str(&browser, true) {
        Ok(b) if b != config.browser => patch.browser = Some(b),
        Ok(_) => {}
        Err(_) => println!("{} 无效的浏览器 '{}'，保持不变。", *symbols::WARN, browser),
    }
    let current_concurrency = config.concurrent_downloads.to_string();
    let concurrency =
        ui::prompt("并发下载数", Some(current_concurrency.as_str())).unwrap_or_default();
    match concurrency.parse::<usize>() {
        Ok(n) if n != config.concurrent_downloads => patch.concurrent_downloads = Some(n),
        Ok(_) => {}
        Err(_) => println!("{} 无效的数字 '{}'，保持不变。", *symbols::WARN, concurrency),
    }
    let headless = ui::confirm("以无界面模式运行浏览器", config.headless);
    if headless != config.headless {
        patch.headless = Some(headless);
    }
    let auto_sync = ui::confirm("启动后自动同步", config.auto_sync);
    if auto_sync != config.auto_sync {
        patch.auto_sync = Some(auto_sync);
    }
    handle.update_config(patch)?;

    if ui::confirm("保存设置", true) {
        if handle.save_settings().await.is_ok() {
            println!("{} 设置已保存。", *symbols::OK);
        }
    } else {
        handle.close_settings()?;
    }
    Ok(())
}

async fn browse_reports(handle: &SessionHandle, limit: usize) -> AppResult<()> {
    handle.refresh_reports(limit)?;
    let snapshot = handle.snapshot().await?;
    print_report_list(&snapshot);
    if !snapshot.history.is_empty() {
        println!("\n  本次运行的同步: {}", snapshot.history.join("，").dimmed());
    }
    if snapshot.reports.is_empty() {
        return Ok(());
    }

    let input = ui::prompt("输入报告序号查看详情 (直接回车返回)", None).unwrap_or_default();
    let Some(summary) = input
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| snapshot.reports.get(i))
    else {
        return Ok(());
    };
    handle.open_report(&summary.id)?;
    let snapshot = handle.snapshot().await?;
    let Some(report) = snapshot.active_report.as_ref().filter(|r| r.id == summary.id) else {
        println!("{} 无法获取报告详情。", *symbols::WARN);
        return Ok(());
    };
    print_report(report);

    if report.downloaded.is_empty() {
        return Ok(());
    }
    let input = ui::prompt("输入文件序号打开 (直接回车返回)", None).unwrap_or_default();
    if let Some(file) = input
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| report.downloaded.get(i))
    {
        let path = snapshot
            .config
            .download_dir
            .join(&file.course)
            .join(&file.file_name);
        handle.open_file(path)?;
    }
    Ok(())
}

/// 运行交互模式
pub(crate) async fn run_interactive(handle: &SessionHandle, report_limit: usize) -> AppResult<()> {
    println!("{} 正在连接同步引擎...", *symbols::INFO);
    wait_until_loaded(handle).await?;
    println!("按 {} 可随时退出。", *symbols::CTRL_C);

    loop {
        let snapshot = handle.snapshot().await?;
        if snapshot.view == View::Login {
            match login_flow(handle, &snapshot).await {
                Ok(_) => continue,
                Err(AppError::UserInterrupt) => break,
                Err(e) => {
                    eprintln!("\n{} {}", *symbols::ERROR, e.to_string().red());
                    continue;
                }
            }
        }

        print_dashboard(&snapshot);
        let options = vec![
            "开始同步".to_string(),
            "管理课程".to_string(),
            "启用全部课程".to_string(),
            "禁用全部课程".to_string(),
            "同步报告".to_string(),
            "设置".to_string(),
            "退出登录".to_string(),
        ];
        let choice = ui::selection_menu(&options, "主菜单", "输入序号，直接回车退出");
        let result = match choice.trim() {
            "" => break,
            "1" => {
                handle.start_sync()?;
                let snapshot = follow_sync(handle).await?;
                finish_sync(&snapshot).map(|_| {
                    if let Some(report) = &snapshot.active_report {
                        print_report(report);
                    }
                })
            }
            "2" => manage_courses(handle).await,
            "3" => handle.set_all_courses(false),
            "4" => handle.set_all_courses(true),
            "5" => browse_reports(handle, report_limit).await,
            "6" => edit_settings(handle).await,
            "7" => {
                handle.logout()?;
                // 等待确认框与退出流程结束
                handle.snapshot().await.map(drop)
            }
            other => Err(AppError::UserInputError(format!("无效的选择 '{}'。", other))),
        };

        if let Err(e) = result {
            error!("交互模式操作失败: {}", e);
            match e {
                AppError::UserInterrupt => break,
                AppError::UserInputError(msg) => {
                    eprintln!("\n{} {}", *symbols::WARN, msg.yellow())
                }
                _ => eprintln!("\n{} 操作失败: {}", *symbols::ERROR, e.to_string().red()),
            }
        }
    }

    info!("退出交互模式");
    println!("\n{} 退出交互模式。", *symbols::INFO);
    Ok(())
}
