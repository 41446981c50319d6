// src/backend/stdio.rs

use super::{EventSink, SyncBackend};
use crate::{
    constants::methods,
    error::{AppError, AppResult},
    models::{
        BackendEvent, Configuration, CourseConfig, InitState, LocalStats, OperationResult,
        ReportSummary, SyncReport,
    },
};
use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, error, info, trace, warn};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::{
    path::{Path, PathBuf},
    process::Stdio,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    process::{Child, ChildStdin, ChildStdout, Command},
    sync::{Mutex as TokioMutex, oneshot},
};

type PendingCalls = DashMap<u64, oneshot::Sender<Result<Value, String>>>;

/// 引擎发来的一行消息：调用回复或主动推送
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EngineMessage {
    Response {
        id: u64,
        #[serde(default)]
        result: Value,
        #[serde(default)]
        error: Option<String>,
    },
    Event(BackendEvent),
}

/// 通过子进程 stdin/stdout 上的 JSON 行协议与同步引擎通信
pub struct StdioBackend {
    writer: TokioMutex<ChildStdin>,
    pending: Arc<PendingCalls>,
    ready: Arc<AtomicBool>,
    next_id: AtomicU64,
    _child: Mutex<Child>,
}

impl StdioBackend {
    pub fn spawn(program: &str, args: &[String], sink: EventSink) -> AppResult<Self> {
        info!("启动同步引擎: {} {:?}", program, args);
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Protocol("无法获取引擎的标准输入".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Protocol("无法获取引擎的标准输出".to_string()))?;

        let pending: Arc<PendingCalls> = Arc::new(DashMap::new());
        let ready = Arc::new(AtomicBool::new(false));
        tokio::spawn(read_engine_output(
            stdout,
            pending.clone(),
            ready.clone(),
            sink,
        ));

        Ok(Self {
            writer: TokioMutex::new(stdin),
            pending,
            ready,
            next_id: AtomicU64::new(1),
            _child: Mutex::new(child),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> AppResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        let mut line = serde_json::to_string(&json!({
            "id": id,
            "method": method,
            "params": params,
        }))?;
        line.push('\n');
        trace!("-> {}", line.trim_end());

        {
            let mut writer = self.writer.lock().await;
            let written = match writer.write_all(line.as_bytes()).await {
                Ok(()) => writer.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = written {
                self.pending.remove(&id);
                return Err(e.into());
            }
        }

        match rx.await {
            Ok(Ok(value)) => serde_json::from_value(value).map_err(|e| {
                AppError::Protocol(format!("无法解析 '{}' 的返回值: {}", method, e))
            }),
            Ok(Err(message)) => Err(AppError::rejected(method, message)),
            Err(_) => Err(AppError::EngineClosed),
        }
    }
}

async fn read_engine_output(
    stdout: ChildStdout,
    pending: Arc<PendingCalls>,
    ready: Arc<AtomicBool>,
    sink: EventSink,
) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => dispatch_line(&line, &pending, &ready, &sink),
            Ok(None) => break,
            Err(e) => {
                error!("读取引擎输出失败: {}", e);
                break;
            }
        }
    }
    warn!("同步引擎的输出流已关闭");
    ready.store(false, Ordering::SeqCst);
    // 丢弃发送端，等待中的调用会收到 EngineClosed
    pending.clear();
}

fn dispatch_line(line: &str, pending: &PendingCalls, ready: &AtomicBool, sink: &EventSink) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    trace!("<- {}", line);
    match serde_json::from_str::<EngineMessage>(line) {
        Ok(EngineMessage::Response { id, result, error }) => match pending.remove(&id) {
            Some((_, tx)) => {
                let outcome = match error {
                    Some(message) => Err(message),
                    None => Ok(result),
                };
                let _ = tx.send(outcome);
            }
            None => debug!("收到未知调用 #{} 的回复，已忽略", id),
        },
        Ok(EngineMessage::Event(event)) => {
            if event == BackendEvent::Ready {
                ready.store(true, Ordering::SeqCst);
            }
            if sink.send(event).is_err() {
                debug!("会话已关闭，丢弃引擎事件");
            }
        }
        Err(e) => warn!("无法识别的引擎消息 ({}): {}", e, line),
    }
}

#[async_trait]
impl SyncBackend for StdioBackend {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn get_init_state(&self) -> AppResult<InitState> {
        if !self.is_ready() {
            return Err(AppError::EngineNotReady);
        }
        self.call(methods::GET_INIT_STATE, json!([])).await
    }

    async fn load_config(&self) -> AppResult<Configuration> {
        self.call(methods::LOAD_CONFIG, json!([])).await
    }

    async fn save_config(&self, config: &Configuration) -> AppResult<OperationResult> {
        self.call(methods::SAVE_CONFIG, json!([config])).await
    }

    async fn login(&self, config: &Configuration) -> AppResult<()> {
        self.call::<Value>(methods::LOGIN, json!([config])).await?;
        Ok(())
    }

    async fn sync_downloads(&self) -> AppResult<()> {
        self.call::<Value>(methods::SYNC_DOWNLOADS, json!([])).await?;
        Ok(())
    }

    async fn select_folder(&self) -> AppResult<Option<PathBuf>> {
        self.call(methods::SELECT_FOLDER, json!([])).await
    }

    async fn update_course_config(&self, id: &str, config: &CourseConfig) -> AppResult<bool> {
        self.call(methods::UPDATE_COURSE_CONFIG, json!([id, config]))
            .await
    }

    async fn get_sync_reports(&self, limit: usize) -> AppResult<Vec<ReportSummary>> {
        self.call(methods::GET_SYNC_REPORTS, json!([limit])).await
    }

    async fn get_sync_report(&self, id: &str) -> AppResult<SyncReport> {
        self.call(methods::GET_SYNC_REPORT, json!([id])).await
    }

    async fn get_local_stats(&self) -> AppResult<LocalStats> {
        self.call(methods::GET_LOCAL_STATS, json!([])).await
    }

    async fn open_folder(&self, name: &str) -> AppResult<OperationResult> {
        self.call(methods::OPEN_FOLDER, json!([name])).await
    }

    async fn open_file(&self, path: &Path) -> AppResult<OperationResult> {
        self.call(methods::OPEN_FILE, json!([path])).await
    }

    async fn logout(&self) -> AppResult<OperationResult> {
        self.call(methods::LOGOUT, json!([])).await
    }
}
