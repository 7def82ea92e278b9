//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责文档批次的调度和状态跟踪，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `session` - 会话状态
//! - 持有批次、目标文件夹/表格、登录用户
//! - 接收展示层的操作（选择文件、选择文件夹、开始处理、保存到表格）
//!
//! ### `batch_runner` - 批次处理器
//! - 逐个文档串行执行：提取 → 上传
//! - 维护运行标志，拒绝重入
//!
//! ### `exporter` - 结果导出
//! - 汇总提取成功的文档，追加到表格
//!
//! ### `progress` - 进度事件
//!
//! ## 层次关系
//!
//! ```text
//! session (会话状态 + 用户操作)
//!     ↓
//! batch_runner (处理 Batch) / exporter (汇总导出)
//!     ↓
//! clients (外部服务 trait：提取 / 存储 / 表格 / 选择器 / 登录)
//!     ↓
//! services (提示词与响应解析)
//! ```

pub mod batch_runner;
pub mod exporter;
pub mod progress;
pub mod session;

// 重新导出主要类型
pub use batch_runner::{BatchRunner, RunFlag, RunGuard, SharedBatch};
pub use exporter::{export_successful, ExportOutcome, EXPORT_HEADER};
pub use progress::{ProgressEvent, ProgressSink};
pub use session::{Intake, Session, SessionClients, SessionSnapshot};
