//! # Doc Intake
//!
//! 医疗 PDF 文档接收流水线：选择文件 → 逐个上传并提取文本 → LLM 提取元数据字段
//! → 人工审阅 / 编辑 → 确认归档
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 外部接口层（Clients）
//! - `clients/` - 远程 `/api/upload`、`/api/extract`、`/api/submit` 接口
//! - `IntakeApiClient` - 同时实现三个能力 trait
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个文件或单段文本
//! - `TextExtractor` - PDF → 文本（本地 lopdf 实现）
//! - `FieldExtractor` - 文本 → 七个字段（LLM 实现，未配置 key 时降级）
//! - `SubmissionSink` - 接收最终确认的记录
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个文件"的完整处理流程
//! - `DocumentCtx` - 上下文封装（第几个文件 / 共几个）
//! - `UploadClient` - 流程编排（校验 → 文本 → 字段 → 归一化）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理器，状态机 + 单批运行
//! - `orchestrator/review_session` - 审阅会话，选择 / 编辑 / 确认
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::{App, ReviewCommand};
pub use clients::IntakeApiClient;
pub use config::Config;
pub use error::{FileFailure, PipelineError, PipelineResult, Stage};
pub use models::{
    BatchResult, DocumentSummary, ExtractedFields, FieldExtraction, PipelineOutcome,
    ProcessedDocument, SelectedFile,
};
pub use orchestrator::{BatchProcessor, BatchState, BatchStatus, ProgressEvent, ReviewSession};
pub use services::{
    FieldExtractor, LlmFieldExtractor, PdfTextExtractor, SubmissionSink, TextExtractor,
};
pub use workflow::{DocumentCtx, UploadClient};
