//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和审阅状态，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量文档处理器
//! - 校验输入（空列表直接拒绝）
//! - 严格按顺序逐个调用 UploadClient
//! - 维护状态机（Idle / Running / Completed / Failed）
//! - 维护共享状态行与最近一次错误
//! - 同一时刻只允许一批运行
//!
//! ### `review_session` - 审阅会话
//! - 持有最近一批的全部文档
//! - 选择 / 编辑 / 确认归档 / 重置
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<SelectedFile>)
//!     ↓
//! workflow::UploadClient (处理单个 SelectedFile)
//!     ↓
//! services (能力层：text / fields / submit)
//!
//! review_session (持有 BatchResult)
//!     ↓
//! services::SubmissionSink
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管批量，review_session 管审阅
//! 2. **向下依赖**：编排层 → workflow → services
//! 3. **无业务逻辑**：字段归一化在 workflow 层完成

pub mod batch_processor;
pub mod review_session;

// 重新导出主要类型
pub use batch_processor::{BatchProcessor, BatchState, BatchStatus, ProgressEvent};
pub use review_session::ReviewSession;
