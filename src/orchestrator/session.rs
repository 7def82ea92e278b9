//! 会话状态 - 编排层
//!
//! 持有一次会话中的全部可变状态：当前批次、目标文件夹、目标表格、登录用户。
//!
//! ## 生命周期
//!
//! - 会话开始时为空
//! - 每次选择文件时整体替换批次（旧结果丢弃）
//! - 每次开始处理时由已选文件重新构建批次
//! - 登出时清空用户与目标文件夹
//!
//! 处理与保存互斥：处理中不能保存或重新选择文件，保存中不能开始处理或重新选择文件。
//!
//! 展示层只读取快照、订阅进度事件，并通过本结构发起操作。

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use super::batch_runner::{BatchRunner, RunFlag, SharedBatch};
use super::exporter::{self, ExportOutcome};
use super::progress::{ProgressEvent, ProgressSink};
use crate::clients::{
    AuthGateway, DestinationPicker, ExtractionClient, SpreadsheetClient, StorageClient,
};
use crate::error::{AppResult, ValidationError};
use crate::models::{
    Batch, BatchSummary, Destination, DocumentPayload, SubmissionView, UserProfile,
};

/// 会话依赖的全部外部服务
pub struct SessionClients {
    pub extractor: Arc<dyn ExtractionClient>,
    pub storage: Arc<dyn StorageClient>,
    pub spreadsheet: Arc<dyn SpreadsheetClient>,
    pub picker: Arc<dyn DestinationPicker>,
    pub auth: Arc<dyn AuthGateway>,
}

/// 一次文件选择的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intake {
    pub accepted: usize,
    pub rejected: usize,
}

/// 提供给展示层的会话快照
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub submissions: Vec<SubmissionView>,
    pub summary: BatchSummary,
    pub is_processing: bool,
    pub is_saving: bool,
    pub has_successful_files: bool,
    pub drive_folder: Option<Destination>,
    pub sheet: Option<Destination>,
    pub user: Option<UserProfile>,
}

pub struct Session {
    batch: SharedBatch,
    /// 已接受的文件，每次运行据此重建批次
    selection: RwLock<Vec<DocumentPayload>>,
    folder: RwLock<Option<Destination>>,
    sheet: RwLock<Option<Destination>>,
    user: RwLock<Option<UserProfile>>,
    runner: BatchRunner,
    progress: ProgressSink,
    saving: RunFlag,
    spreadsheet: Arc<dyn SpreadsheetClient>,
    picker: Arc<dyn DestinationPicker>,
    auth: Arc<dyn AuthGateway>,
}

impl Session {
    pub fn new(clients: SessionClients) -> Self {
        let progress = ProgressSink::default();
        Self {
            batch: Arc::new(RwLock::new(Batch::default())),
            selection: RwLock::new(Vec::new()),
            folder: RwLock::new(None),
            sheet: RwLock::new(None),
            user: RwLock::new(None),
            runner: BatchRunner::new(clients.extractor, clients.storage, progress.clone()),
            progress,
            saving: RunFlag::default(),
            spreadsheet: clients.spreadsheet,
            picker: clients.picker,
            auth: clients.auth,
        }
    }

    /// 共享批次（只读使用）
    pub fn batch(&self) -> SharedBatch {
        self.batch.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.progress.subscribe()
    }

    pub fn is_processing(&self) -> bool {
        self.runner.is_processing()
    }

    pub async fn is_signed_in(&self) -> bool {
        self.user.read().await.is_some()
    }

    pub async fn folder(&self) -> Option<Destination> {
        self.folder.read().await.clone()
    }

    pub async fn sheet(&self) -> Option<Destination> {
        self.sheet.read().await.clone()
    }

    /// 选择文件，整体替换当前批次
    ///
    /// 非 PDF 文件被丢弃并计数；处理中或保存中不允许替换批次
    pub async fn select_files(&self, raw_files: Vec<DocumentPayload>) -> AppResult<Intake> {
        let _guard = self.runner.acquire()?;
        if self.saving.is_set() {
            return Err(ValidationError::SaveInProgress.into());
        }

        let (batch, rejected) = Batch::select_files(raw_files);
        let intake = Intake {
            accepted: batch.len(),
            rejected,
        };
        *self.selection.write().await = batch.iter().map(|s| s.payload().clone()).collect();
        *self.batch.write().await = batch;

        if rejected > 0 {
            warn!("⚠️ 已忽略 {} 个文件，只接受 PDF 文件", rejected);
        }
        info!("✓ 已选择 {} 个 PDF 文件", intake.accepted);

        Ok(intake)
    }

    /// 登录；用户取消时返回 `Ok(false)`
    pub async fn sign_in(&self) -> AppResult<bool> {
        match self.auth.sign_in().await? {
            Some(sign_in) => {
                *self.user.write().await = Some(sign_in.profile);
                Ok(true)
            }
            None => {
                info!("登录已取消");
                Ok(false)
            }
        }
    }

    /// 登出：撤销凭据，并清空用户与目标文件夹
    ///
    /// 撤销失败时本地状态仍会清空
    pub async fn sign_out(&self) -> AppResult<()> {
        let result = self.auth.sign_out().await;
        *self.user.write().await = None;
        *self.folder.write().await = None;
        result.map_err(Into::into)
    }

    /// 选择目标文件夹，未登录时先登录
    ///
    /// 登录或选择被取消时返回 `Ok(None)`，已有选择保持不变
    pub async fn choose_folder(&self) -> AppResult<Option<Destination>> {
        if self.is_processing() {
            return Err(ValidationError::RunInProgress.into());
        }
        if !self.is_signed_in().await && !self.sign_in().await? {
            return Ok(None);
        }

        let picked = self.picker.pick_folder().await;
        if let Some(folder) = &picked {
            info!("📁 已选择文件夹: {}", folder.name);
            *self.folder.write().await = Some(folder.clone());
        }
        Ok(picked)
    }

    /// 由已选文件重新构建批次并开始处理
    ///
    /// 处理中返回 `RunInProgress`，保存中返回 `SaveInProgress`
    pub async fn start_run(&self) -> AppResult<BatchSummary> {
        let guard = self.runner.acquire()?;
        if self.saving.is_set() {
            return Err(ValidationError::SaveInProgress.into());
        }

        let files = self.selection.read().await.clone();
        let folder = self.folder().await;
        self.runner
            .run(guard, &self.batch, &files, folder.as_ref())
            .await
    }

    /// 保存提取成功的记录到表格
    ///
    /// 处理中或另一个保存进行中时拒绝；先检查是否有可保存的数据，再弹出表格选择；
    /// 用户取消选择时返回 `Ok(None)`
    ///
    /// 保存标志在整个过程中保持占用，期间不能开始处理或重新选择文件
    pub async fn save_to_sheet(&self) -> AppResult<Option<ExportOutcome>> {
        let _guard = self
            .saving
            .try_acquire()
            .ok_or(ValidationError::SaveInProgress)?;
        if self.is_processing() {
            return Err(ValidationError::RunInProgress.into());
        }

        if !self.batch.read().await.has_successful() {
            return Err(ValidationError::NoEligibleRows.into());
        }

        let Some(sheet) = self.picker.pick_sheet().await else {
            info!("已取消选择表格");
            return Ok(None);
        };
        if self.is_processing() {
            return Err(ValidationError::RunInProgress.into());
        }
        *self.sheet.write().await = Some(sheet.clone());

        let snapshot = self.batch.read().await.clone();
        exporter::export_successful(&snapshot, &sheet, self.spreadsheet.as_ref())
            .await
            .map(Some)
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let batch = self.batch.read().await;
        SessionSnapshot {
            submissions: batch.views(),
            summary: batch.summary(),
            is_processing: self.is_processing(),
            is_saving: self.saving.is_set(),
            has_successful_files: batch.has_successful(),
            drive_folder: self.folder.read().await.clone(),
            sheet: self.sheet.read().await.clone(),
            user: self.user.read().await.clone(),
        }
    }
}
