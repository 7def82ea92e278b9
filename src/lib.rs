//! # Doc Extract Pipeline
//!
//! 批量读取 PDF 公文，借助 AI 提取结构化字段，上传原件到云端硬盘，
//! 并把提取结果汇总追加到表格
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 数据模型层（Models）
//! - `models/` - 文档、批次、目标位置，以及文件加载
//! - `DocumentSubmission` - 每个文档的提取/上传双状态机
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 提示词、响应结构约束、模型输出解析
//!
//! ### ③ 外部服务层（Clients）
//! - `clients/` - 提取 / 存储 / 表格 / 选择器 / 登录，每个一个 trait
//! - 具体实现：Gemini、OpenAI 兼容接口、Google Drive、Google Sheets
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session` - 会话状态，接收用户操作
//! - `orchestrator/batch_runner` - 逐个文档串行处理
//! - `orchestrator/exporter` - 汇总导出到表格
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Batch, DocumentPayload, DocumentSubmission, ExtractedFields};
pub use orchestrator::{BatchRunner, Session, SessionClients};
