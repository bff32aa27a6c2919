//! 批量文档处理器 - 编排层
//!
//! ## 职责
//!
//! 接收用户选中的文件列表，按输入顺序逐个交给 `UploadClient` 处理，
//! 汇总成功结果；任一文件失败立即中止整批。
//!
//! ## 状态机
//!
//! ```text
//! Idle ──run(非空)──▶ Running ──全部成功──▶ Completed
//!                        └────首个失败────▶ Failed
//! ```
//!
//! ## 设计特点
//!
//! - **严格串行**：所有文件共用一条状态行，同一时刻只处理一个文件
//! - **至多一个失败**：首个失败中止剩余文件，已处理的结果全部丢弃
//! - **单批运行**：已有一批在运行时再次调用 `run` 返回 `Busy`
//! - **状态可观察**：进度文字与最近一次错误同时保留，互不覆盖

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

use crate::error::{FileFailure, PipelineError, PipelineResult, Stage};
use crate::models::{BatchResult, PipelineOutcome, SelectedFile};
use crate::utils::logging;
use crate::workflow::{DocumentCtx, UploadClient};

/// 批处理状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Running,
    Completed { documents: usize },
    Failed(FileFailure),
}

/// 对外可见的批处理状态：状态 + 进度行 + 最近错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchStatus {
    pub state: BatchState,
    pub progress: String,
    pub last_error: Option<String>,
}

impl Default for BatchStatus {
    fn default() -> Self {
        Self {
            state: BatchState::Idle,
            progress: String::new(),
            last_error: None,
        }
    }
}

/// 进度事件：某个文件进入某个阶段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub file_index: usize,
    pub total: usize,
    pub file_name: String,
    pub stage: Stage,
}

impl ProgressEvent {
    /// "uploading" / "extracting"
    pub fn label(&self) -> &'static str {
        self.stage.progress_label()
    }

    /// 写入共享状态行的文字
    pub fn status_line(&self) -> String {
        match self.stage {
            Stage::Upload => format!("Uploading and processing {}...", self.file_name),
            Stage::Extract => format!("Extracting fields for {}...", self.file_name),
        }
    }
}

/// 运行标记守卫，离开作用域时释放
struct RunGuard<'a> {
    running: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(running: &'a AtomicBool) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { running })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// 批量文档处理器
pub struct BatchProcessor {
    upload_client: UploadClient,
    running: AtomicBool,
    status: watch::Sender<BatchStatus>,
    events: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl BatchProcessor {
    pub fn new(upload_client: UploadClient) -> Self {
        let (status, _) = watch::channel(BatchStatus::default());
        Self {
            upload_client,
            running: AtomicBool::new(false),
            status,
            events: None,
        }
    }

    /// 额外把每个进度事件发送到指定通道
    pub fn with_progress_channel(mut self, events: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// 当前状态快照
    pub fn status(&self) -> BatchStatus {
        self.status.borrow().clone()
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<BatchStatus> {
        self.status.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// 记录用户刚选中的文件数量
    pub fn note_selection(&self, count: usize) {
        self.status.send_modify(|status| {
            status.progress = format!("{} file(s) selected", count);
            status.last_error = None;
        });
    }

    /// 回到 Idle，清空进度与错误；运行中返回 `Busy`
    pub fn reset(&self) -> PipelineResult<()> {
        let _guard = RunGuard::acquire(&self.running).ok_or(PipelineError::Busy)?;
        self.status.send_replace(BatchStatus::default());
        Ok(())
    }

    /// 处理一批文件
    ///
    /// 全部成功时返回与输入等长、同序的结果；否则返回首个错误，
    /// 之前已处理的文件结果不返回。
    pub async fn run(&self, files: Vec<SelectedFile>) -> PipelineResult<BatchResult> {
        // 运行中的批次优先，不覆盖它的状态
        let _guard = match RunGuard::acquire(&self.running) {
            Some(guard) => guard,
            None => {
                error!("❌ 已有批次正在运行，拒绝新的请求");
                return Err(PipelineError::Busy);
            }
        };

        if files.is_empty() {
            let err = PipelineError::invalid_input("Please select file(s) first");
            self.status.send_modify(|status| status.last_error = Some(err.to_string()));
            return Err(err);
        }

        let total = files.len();
        logging::log_batch_start(total);
        self.status.send_replace(BatchStatus {
            state: BatchState::Running,
            progress: format!("Processing {} file(s)...", total),
            last_error: None,
        });

        let mut documents = Vec::with_capacity(total);

        // ========== 严格按输入顺序逐个处理 ==========
        for (index, file) in files.iter().enumerate() {
            let ctx = DocumentCtx::new(index + 1, total, file.name());

            let result = self
                .upload_client
                .process_with_progress(file, &ctx, |stage| self.report(&ctx, stage))
                .await;

            match PipelineOutcome::from(result) {
                PipelineOutcome::Processed(document) => documents.push(document),
                PipelineOutcome::Failed(err) => {
                    self.fail(&err, documents.len());
                    return Err(err);
                }
            }
        }

        logging::log_batch_complete(documents.len());
        self.status.send_modify(|status| {
            status.state = BatchState::Completed {
                documents: documents.len(),
            };
            status.progress = format!("Processed {} file(s) successfully!", documents.len());
        });

        Ok(documents)
    }

    /// 覆盖状态行并发出进度事件
    fn report(&self, ctx: &DocumentCtx, stage: Stage) {
        let event = ProgressEvent {
            file_index: ctx.file_index,
            total: ctx.total,
            file_name: ctx.file_name.clone(),
            stage,
        };

        info!("{} ▶ {}", ctx, event.label());

        let line = event.status_line();
        self.status.send_modify(|status| status.progress = line);

        if let Some(events) = &self.events {
            // 接收端已关闭时忽略
            let _ = events.send(event);
        }
    }

    fn fail(&self, err: &PipelineError, processed_before: usize) {
        let message = err.to_string();
        let failure = err.failure().unwrap_or_else(|| FileFailure {
            file_name: String::new(),
            stage: Stage::Upload,
            message: message.clone(),
        });

        logging::log_batch_failed(&failure, processed_before);

        self.status.send_modify(|status| {
            status.state = BatchState::Failed(failure);
            status.progress = format!("Error: {}", message);
            status.last_error = Some(message);
        });
    }
}
