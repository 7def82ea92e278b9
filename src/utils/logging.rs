use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::BatchSummary;

/// 初始化 tracing 订阅器
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info 级别
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n文档提取日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(backend: &str, model: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - PDF 信息提取模式（逐个顺序处理）");
    info!("🤖 提取服务: {} / 模型: {}", backend, model);
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
///
/// # 参数
/// - `total`: 文档总数
/// - `folder_name`: 目标文件夹名称
pub fn log_batch_start(total: usize, folder_name: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理本批文档，共 {} 个", total);
    info!("📁 目标文件夹: {}", folder_name);
    info!("{}", "=".repeat(60));
}

/// 记录单个文档开始处理
pub fn log_document_start(index: usize, total: usize, file_name: &str) {
    info!("\n[文档 {}] {}", index, "─".repeat(30));
    info!("[文档 {}] 处理第 {}/{} 个文件: {}", index, index, total, file_name);
}

/// 打印最终统计信息
///
/// # 参数
/// - `summary`: 批次统计
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(summary: &BatchSummary, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 提取成功: {}/{}", summary.extracted, summary.total);
    info!("❌ 提取失败: {}", summary.extraction_failed);
    info!("☁️ 上传成功: {}", summary.uploaded);
    info!("⚠️ 上传失败: {}", summary.upload_failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
