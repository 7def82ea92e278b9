//! 批次：一次选择产生的有序文档集合

use serde::Serialize;
use tracing::warn;

use super::document::{
    DocumentPayload, DocumentSubmission, ExtractionStatus, StorageStatus, SubmissionView,
};

/// 有序文档集合，每次重新选择文件时整体替换
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    submissions: Vec<DocumentSubmission>,
}

/// 批次统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub pending: usize,
    pub extracted: usize,
    pub extraction_failed: usize,
    pub uploaded: usize,
    pub upload_failed: usize,
}

impl Batch {
    /// 从用户选择的文件构建新批次
    ///
    /// 非 PDF 文件被丢弃并计数；标识重复时后出现的文件覆盖先出现的（保留原位置）
    ///
    /// # 返回
    /// `(新批次, 被拒绝的文件数)`
    pub fn select_files(raw_files: Vec<DocumentPayload>) -> (Batch, usize) {
        let mut batch = Batch::default();
        let mut rejected = 0;

        for file in raw_files {
            if !file.is_pdf() {
                rejected += 1;
                continue;
            }

            let submission = DocumentSubmission::new(file);
            match batch
                .submissions
                .iter()
                .position(|s| s.id() == submission.id())
            {
                Some(existing) => {
                    warn!("⚠️ 文件标识重复，后选择的文件将覆盖: {}", submission.id());
                    batch.submissions[existing] = submission;
                }
                None => batch.submissions.push(submission),
            }
        }

        (batch, rejected)
    }

    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentSubmission> {
        self.submissions.iter()
    }

    pub fn get(&self, id: &str) -> Option<&DocumentSubmission> {
        self.submissions.iter().find(|s| s.id() == id)
    }

    pub fn at(&self, index: usize) -> Option<&DocumentSubmission> {
        self.submissions.get(index)
    }

    pub(crate) fn at_mut(&mut self, index: usize) -> Option<&mut DocumentSubmission> {
        self.submissions.get_mut(index)
    }

    /// 按提取状态筛选，保持批次顺序
    pub fn filter_by_status(
        &self,
        status: ExtractionStatus,
    ) -> impl Iterator<Item = &DocumentSubmission> {
        self.submissions
            .iter()
            .filter(move |s| s.extraction_status() == status)
    }

    /// 提取成功的文档（可导出）
    pub fn successful(&self) -> impl Iterator<Item = &DocumentSubmission> {
        self.filter_by_status(ExtractionStatus::Success)
    }

    pub fn has_successful(&self) -> bool {
        self.successful().next().is_some()
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.submissions.len(),
            ..Default::default()
        };
        for sub in &self.submissions {
            match sub.extraction_status() {
                ExtractionStatus::Pending | ExtractionStatus::Processing => summary.pending += 1,
                ExtractionStatus::Success => summary.extracted += 1,
                ExtractionStatus::Error => summary.extraction_failed += 1,
            }
            match sub.storage_status() {
                StorageStatus::Success => summary.uploaded += 1,
                StorageStatus::Error => summary.upload_failed += 1,
                StorageStatus::Idle | StorageStatus::Uploading => {}
            }
        }
        summary
    }

    pub fn views(&self) -> Vec<SubmissionView> {
        self.submissions.iter().map(SubmissionView::from).collect()
    }
}
