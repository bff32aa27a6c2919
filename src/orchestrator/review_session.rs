//! 审阅会话
//!
//! 持有最近一批处理完成的文档，以及当前选中的文档序号。
//! 所有修改都只作用于当前文档；确认归档后文档仍保留在会话中。

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::models::{field_options, BatchResult, DocumentSummary, ProcessedDocument};
use crate::services::{Submission, SubmissionReceipt, SubmissionSink};

pub struct ReviewSession {
    documents: Vec<ProcessedDocument>,
    active: usize,
    sink: Arc<dyn SubmissionSink>,
}

impl ReviewSession {
    pub fn new(sink: Arc<dyn SubmissionSink>) -> Self {
        Self {
            documents: Vec::new(),
            active: 0,
            sink,
        }
    }

    /// 载入新一批结果，整体替换旧批次，当前序号回到 0
    pub fn load(&mut self, batch: BatchResult) {
        info!("📋 载入 {} 个文档进入审阅", batch.len());
        self.documents = batch;
        self.active = 0;
    }

    /// 切换当前文档；越界时返回 `Index` 错误且不改变当前序号
    pub fn select(&mut self, index: usize) -> PipelineResult<&ProcessedDocument> {
        if index >= self.documents.len() {
            warn!("⚠️ 无效的文档序号: {} (共 {} 个)", index, self.documents.len());
            return Err(PipelineError::Index {
                index,
                len: self.documents.len(),
            });
        }
        self.active = index;
        Ok(&self.documents[index])
    }

    /// 修改当前文档的一个字段，值原样保存
    ///
    /// 不校验字段名，也不对 category / store_in 做归一化。
    pub fn edit(&mut self, field: &str, value: impl Into<String>) -> PipelineResult<()> {
        let len = self.documents.len();
        let active = self.active;
        let document = self
            .documents
            .get_mut(active)
            .ok_or(PipelineError::Index { index: active, len })?;
        document.fields.set(field, value);
        Ok(())
    }

    /// 将当前文档的字段交给归档服务
    ///
    /// 不前进当前序号，也不从会话中移除文档。
    pub async fn confirm_current(&self) -> anyhow::Result<SubmissionReceipt> {
        let document = self.active_document().ok_or(PipelineError::Index {
            index: self.active,
            len: self.documents.len(),
        })?;

        let submission = Submission {
            file_name: document.file.name().to_string(),
            fields: document.fields.clone(),
        };

        info!("📤 确认归档: {}", submission.file_name);
        let receipt = self.sink.submit(&submission).await?;
        if receipt.success {
            info!("✅ 归档成功: {}", submission.file_name);
        } else {
            warn!("❌ 归档未成功: {}", submission.file_name);
        }
        Ok(receipt)
    }

    /// 丢弃全部文档，回到空会话
    pub fn reset(&mut self) {
        self.documents.clear();
        self.active = 0;
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_document(&self) -> Option<&ProcessedDocument> {
        self.documents.get(self.active)
    }

    pub fn documents(&self) -> &[ProcessedDocument] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// 侧边栏列表
    pub fn summaries(&self) -> Vec<DocumentSummary> {
        self.documents.iter().map(ProcessedDocument::summary).collect()
    }

    /// 字段在界面上的初始可选值（仅 category / store_in 有）
    pub fn options_for(&self, field: &str) -> Option<&'static [&'static str]> {
        field_options(field)
    }
}
