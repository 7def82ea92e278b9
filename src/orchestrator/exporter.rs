//! 结果汇总导出
//!
//! 只导出提取成功的文档（与上传结果无关），表头固定七列，按批次顺序追加到表格。
//! 导出过程只读，不修改批次。

use tracing::{error, info};

use crate::clients::SpreadsheetClient;
use crate::error::{AppResult, ExportError, ValidationError};
use crate::models::{Batch, Destination};

/// 导出表头
pub const EXPORT_HEADER: [&str; 7] = [
    "documentType",
    "documentNumber",
    "issueDate",
    "subject",
    "signer",
    "recipients",
    "originalFileName",
];

/// 导出结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    /// 追加的数据行数（不含表头）
    pub appended_rows: usize,
    pub sheet_name: String,
}

impl ExportOutcome {
    pub fn message(&self) -> String {
        format!(
            "已成功保存 {} 条记录到 \"{}\"",
            self.appended_rows, self.sheet_name
        )
    }
}

/// 构建数据行（不含表头），按批次顺序
pub fn build_rows(batch: &Batch) -> Vec<Vec<String>> {
    batch
        .iter()
        .filter_map(|sub| {
            let fields = sub.extracted_fields()?;
            Some(vec![
                fields.document_type.clone(),
                fields.document_number.clone(),
                fields.issue_date.clone(),
                fields.subject.clone(),
                fields.signer.clone(),
                fields.recipients.clone(),
                sub.file_name().to_string(),
            ])
        })
        .collect()
}

/// 把提取成功的文档追加到表格
///
/// 没有可导出的行时返回 `NoEligibleRows`，且不调用表格服务
pub async fn export_successful(
    batch: &Batch,
    sheet: &Destination,
    client: &dyn SpreadsheetClient,
) -> AppResult<ExportOutcome> {
    let rows = build_rows(batch);
    if rows.is_empty() {
        return Err(ValidationError::NoEligibleRows.into());
    }

    let appended_rows = rows.len();
    let mut values = Vec::with_capacity(appended_rows + 1);
    values.push(EXPORT_HEADER.iter().map(|h| h.to_string()).collect());
    values.extend(rows);

    info!("📤 正在保存 {} 条记录到表格: {}", appended_rows, sheet.name);

    match client.append_rows(&sheet.id, &values).await {
        Ok(()) => {
            let outcome = ExportOutcome {
                appended_rows,
                sheet_name: sheet.name.clone(),
            };
            info!("✓ {}", outcome.message());
            Ok(outcome)
        }
        Err(e) => {
            error!("保存到表格失败: {}", e);
            Err(ExportError::SaveFailed {
                sheet_name: sheet.name.clone(),
                source: e,
            }
            .into())
        }
    }
}
