// src/session/folder.rs

use crate::{backend::SyncBackend, error::AppResult};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 目录选择对话框在不同平台上的完成方式
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderPickerMode {
    /// 调用直接返回所选路径
    Direct,
    /// 调用立即返回，路径稍后通过 `BackendEvent::FolderSelected` 送达
    Deferred,
}

impl FolderPickerMode {
    pub fn for_current_platform() -> Self {
        if cfg!(target_os = "macos") {
            FolderPickerMode::Deferred
        } else {
            FolderPickerMode::Direct
        }
    }

    pub async fn request(self, backend: &dyn SyncBackend) -> AppResult<FolderOutcome> {
        let returned = backend.select_folder().await?;
        Ok(match self {
            FolderPickerMode::Direct => FolderOutcome::Chosen(returned),
            FolderPickerMode::Deferred => FolderOutcome::Pending,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderOutcome {
    /// `None` 表示用户取消
    Chosen(Option<PathBuf>),
    Pending,
}
