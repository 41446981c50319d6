// src/session/config_store.rs

use crate::{
    backend::SyncBackend,
    constants::methods,
    error::AppResult,
    models::{ConfigPatch, Configuration},
};
use log::{debug, info, warn};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::{task::JoinHandle, time};

struct PendingWrite {
    handle: JoinHandle<()>,
    /// 静默期已过、写入已经发出
    started: Arc<AtomicBool>,
}

/// 持有当前配置，并以防抖方式写回引擎。
///
/// `update` 立即修改内存中的配置；写入在最后一次修改后静默 `quiet_period`
/// 才发出，连续修改只会产生一次写入。已经发出的写入不会被中途取消。
pub struct ConfigStore {
    backend: Arc<dyn SyncBackend>,
    current: Configuration,
    quiet_period: Duration,
    pending: Option<PendingWrite>,
}

impl ConfigStore {
    pub fn new(backend: Arc<dyn SyncBackend>, quiet_period: Duration) -> Self {
        Self {
            backend,
            current: Configuration::default(),
            quiet_period,
            pending: None,
        }
    }

    pub fn current(&self) -> &Configuration {
        &self.current
    }

    /// 从引擎读取配置，失败时保留现有内容
    pub async fn load(&mut self) -> AppResult<&Configuration> {
        let config = self.backend.load_config().await?;
        debug!("已从引擎加载配置");
        self.current = config;
        Ok(&self.current)
    }

    /// 用引擎返回的配置覆盖内存副本，不触发写入
    pub fn replace(&mut self, config: Configuration) {
        self.current = config;
    }

    pub fn clear_credentials(&mut self) {
        self.cancel_pending();
        self.current.clear_credentials();
    }

    pub fn update(&mut self, patch: ConfigPatch) {
        if patch.is_empty() {
            return;
        }
        patch.apply(&mut self.current);
        self.schedule_persist();
    }

    pub fn has_pending_write(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| !p.handle.is_finished())
    }

    /// 跳过防抖，直接写入并等待结果
    pub async fn save_immediately(&mut self) -> AppResult<()> {
        self.cancel_pending();
        let result = self.backend.save_config(&self.current).await?;
        result.into_app_result(methods::SAVE_CONFIG)?;
        info!("配置已保存");
        Ok(())
    }

    /// 退出前落盘：尚未发出的写入立即执行，已经发出的写入等待其完成
    pub async fn flush(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if pending.handle.is_finished() {
            return;
        }
        if pending.started.load(Ordering::SeqCst) {
            debug!("等待进行中的配置写入完成");
            if let Err(e) = pending.handle.await {
                warn!("配置写入任务异常结束: {}", e);
            }
        } else {
            pending.handle.abort();
            if let Err(e) = self.save_immediately().await {
                warn!("退出前保存配置失败: {}", e);
            }
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            if !pending.started.load(Ordering::SeqCst) {
                pending.handle.abort();
            }
        }
    }

    fn schedule_persist(&mut self) {
        self.cancel_pending();

        let backend = self.backend.clone();
        let snapshot = self.current.clone();
        let delay = self.quiet_period;
        let started = Arc::new(AtomicBool::new(false));
        let started_flag = started.clone();

        let handle = tokio::spawn(async move {
            time::sleep(delay).await;
            started_flag.store(true, Ordering::SeqCst);
            match backend.save_config(&snapshot).await {
                Ok(result) if result.success => debug!("配置已写回引擎"),
                Ok(result) => warn!(
                    "引擎拒绝保存配置: {}",
                    result.error.unwrap_or_else(|| "未知原因".to_string())
                ),
                Err(e) => warn!("保存配置失败: {}", e),
            }
        });
        self.pending = Some(PendingWrite { handle, started });
    }
}

impl Drop for ConfigStore {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
