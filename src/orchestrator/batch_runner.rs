//! 批次处理器 - 编排层
//!
//! ## 职责
//!
//! 按批次顺序逐个处理文档：提取 → 上传，一次只处理一个文档。
//!
//! ## 处理流程（每个文档）
//!
//! 1. 提取状态置为 `processing`
//! 2. 调用提取服务；失败则记录错误并处理下一个文档（不上传）
//! 3. 存储状态置为 `uploading`，调用存储服务，记录文件 ID 或错误
//!
//! ## 设计特点
//!
//! - **严格串行**：每个远程调用完全结束后才开始下一个，不并发
//! - **失败不中断**：单个文档的失败只记录在该文档上
//! - **即时可见**：每次状态变化先写入共享批次并广播事件，再发起下一个远程调用；
//!   远程调用期间不持有锁
//! - **不可重入**：运行标志被占用时，新的运行请求直接拒绝
//! - **每次重建**：每次运行都从已选文件重新构建批次，上一次的结果被丢弃

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::progress::{ProgressEvent, ProgressSink};
use crate::clients::{ExtractionClient, StorageClient};
use crate::error::{AppResult, ValidationError};
use crate::models::document::{EXTRACTION_FALLBACK_MESSAGE, STORAGE_FALLBACK_MESSAGE};
use crate::models::{Batch, BatchSummary, Destination, DocumentPayload, DocumentSubmission};
use crate::utils::logging;

/// 由编排层独占写入的共享批次
pub type SharedBatch = Arc<RwLock<Batch>>;

/// 运行标志：同一时刻只允许一个持有者
#[derive(Debug, Clone, Default)]
pub struct RunFlag(Arc<AtomicBool>);

impl RunFlag {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// 尝试占用标志，已被占用时返回 `None`
    pub fn try_acquire(&self) -> Option<RunGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RunGuard(self.0.clone()))
    }
}

/// 离开作用域时释放运行标志
#[derive(Debug)]
pub struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct BatchRunner {
    extractor: Arc<dyn ExtractionClient>,
    storage: Arc<dyn StorageClient>,
    progress: ProgressSink,
    processing: RunFlag,
}

impl BatchRunner {
    pub fn new(
        extractor: Arc<dyn ExtractionClient>,
        storage: Arc<dyn StorageClient>,
        progress: ProgressSink,
    ) -> Self {
        Self {
            extractor,
            storage,
            progress,
            processing: RunFlag::default(),
        }
    }

    /// 是否有批次正在处理
    pub fn is_processing(&self) -> bool {
        self.processing.is_set()
    }

    /// 占用运行标志；已有批次在处理时返回 `RunInProgress`
    pub fn acquire(&self) -> AppResult<RunGuard> {
        self.processing
            .try_acquire()
            .ok_or_else(|| ValidationError::RunInProgress.into())
    }

    /// 处理整个批次
    ///
    /// 每次运行都由 `files` 重新构建批次（全部为 `pending` / `idle`），
    /// 并在持有运行标志期间替换共享批次
    ///
    /// # 前置条件
    /// - 调用方已通过 [`BatchRunner::acquire`] 占用运行标志
    /// - `files` 非空（否则 `EmptyBatch`）
    /// - 已选择目标文件夹（否则 `NoDestinationFolder`）
    ///
    /// 前置条件不满足时不做任何处理，共享批次保持不变
    ///
    /// # 返回
    /// 处理结束时的批次统计
    pub async fn run(
        &self,
        _guard: RunGuard,
        batch: &SharedBatch,
        files: &[DocumentPayload],
        folder: Option<&Destination>,
    ) -> AppResult<BatchSummary> {
        if files.is_empty() {
            return Err(ValidationError::EmptyBatch.into());
        }
        let folder = folder.ok_or(ValidationError::NoDestinationFolder)?;

        let (fresh, _) = Batch::select_files(files.to_vec());
        let ids: Vec<String> = fresh.iter().map(|s| s.id().to_string()).collect();
        *batch.write().await = fresh;

        let total = ids.len();
        logging::log_batch_start(total, &folder.name);
        self.progress.emit(ProgressEvent::RunStarted { total });

        for (index, id) in ids.iter().enumerate() {
            self.process_one(batch, index, id, total, folder).await?;
        }

        let summary = batch.read().await.summary();
        self.progress.emit(ProgressEvent::RunFinished {
            extracted: summary.extracted,
            uploaded: summary.uploaded,
        });

        Ok(summary)
    }

    /// 处理单个文档：提取成功后立即上传
    async fn process_one(
        &self,
        batch: &SharedBatch,
        index: usize,
        id: &str,
        total: usize,
        folder: &Destination,
    ) -> AppResult<()> {
        let doc_no = index + 1;

        // 1. processing
        let payload: DocumentPayload = self
            .update(batch, index, id, |sub| {
                sub.begin_extraction()?;
                Ok(sub.payload().clone())
            })
            .await?;
        logging::log_document_start(doc_no, total, &payload.file_name);
        self.emit_extraction(batch, index, id).await;

        // 2. 提取
        let extracted = match self.extractor.extract(&payload).await {
            Ok(fields) => {
                info!(
                    "[文档 {}] ✓ 提取成功: {} | {}",
                    doc_no,
                    fields.document_type,
                    logging::truncate_text(&fields.subject, 40)
                );
                self.update(batch, index, id, |sub| Ok(sub.complete_extraction(fields)?))
                    .await?;
                true
            }
            Err(e) => {
                let message = e
                    .upstream_message()
                    .unwrap_or_else(|| EXTRACTION_FALLBACK_MESSAGE.to_string());
                error!("[文档 {}] ❌ 提取失败: {}", doc_no, message);
                self.update(batch, index, id, |sub| Ok(sub.fail_extraction(message)?))
                    .await?;
                false
            }
        };
        self.emit_extraction(batch, index, id).await;

        if !extracted {
            return Ok(());
        }

        // 3. 上传
        self.update(batch, index, id, |sub| Ok(sub.begin_upload()?))
            .await?;
        self.emit_storage(batch, index, id).await;
        info!("[文档 {}] ☁️ 正在上传到文件夹: {}", doc_no, folder.name);

        match self.storage.upload(&folder.id, &payload).await {
            Ok(file_id) => {
                info!("[文档 {}] ✓ 上传成功，文件 ID: {}", doc_no, file_id);
                self.update(batch, index, id, |sub| Ok(sub.complete_upload(file_id)?))
                    .await?;
            }
            Err(e) => {
                let message = e
                    .upstream_message()
                    .unwrap_or_else(|| STORAGE_FALLBACK_MESSAGE.to_string());
                warn!("[文档 {}] ⚠️ 上传失败: {}", doc_no, message);
                self.update(batch, index, id, |sub| Ok(sub.fail_upload(message)?))
                    .await?;
            }
        }
        self.emit_storage(batch, index, id).await;

        Ok(())
    }

    /// 在写锁内修改指定文档，锁在返回前释放
    async fn update<R>(
        &self,
        batch: &SharedBatch,
        index: usize,
        id: &str,
        f: impl FnOnce(&mut DocumentSubmission) -> AppResult<R>,
    ) -> AppResult<R> {
        let mut guard = batch.write().await;
        match guard.at_mut(index) {
            Some(sub) if sub.id() == id => f(sub),
            _ => Err(ValidationError::BatchReplaced.into()),
        }
    }

    async fn emit_extraction(&self, batch: &SharedBatch, index: usize, id: &str) {
        if let Some(status) = batch.read().await.at(index).map(|s| s.extraction_status()) {
            self.progress.emit(ProgressEvent::ExtractionChanged {
                id: id.to_string(),
                status,
            });
        }
    }

    async fn emit_storage(&self, batch: &SharedBatch, index: usize, id: &str) {
        if let Some(status) = batch.read().await.at(index).map(|s| s.storage_status()) {
            self.progress.emit(ProgressEvent::StorageChanged {
                id: id.to_string(),
                status,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_flag_single_holder() {
        let flag = RunFlag::default();
        let guard = flag.try_acquire().unwrap();
        assert!(flag.is_set());
        assert!(flag.try_acquire().is_none());

        drop(guard);
        assert!(!flag.is_set());
        assert!(flag.try_acquire().is_some());
    }
}
