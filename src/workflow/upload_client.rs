//! 单文件处理流程 - 流程层
//!
//! 核心职责：定义"一个文件"的完整处理流程
//!
//! 流程顺序：
//! 1. 本地校验（类型 / 大小），不通过则不发出任何请求
//! 2. 文本提取（upload 阶段）
//! 3. 字段提取（extract 阶段）
//! 4. category / store_in 归一化

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, PipelineResult, Stage};
use crate::models::{ProcessedDocument, SelectedFile};
use crate::services::{FieldExtractor, TextExtractor};
use crate::workflow::document_ctx::DocumentCtx;

/// 单文件处理流程
///
/// - 编排两个远程阶段，并把失败映射为带文件名和阶段的错误
/// - 每个阶段都有超时
/// - 不持有批次状态
pub struct UploadClient {
    text_extractor: Arc<dyn TextExtractor>,
    field_extractor: Arc<dyn FieldExtractor>,
    stage_timeout: Duration,
}

impl UploadClient {
    /// 创建新的单文件处理流程
    pub fn new(
        text_extractor: Arc<dyn TextExtractor>,
        field_extractor: Arc<dyn FieldExtractor>,
        stage_timeout: Duration,
    ) -> Self {
        Self {
            text_extractor,
            field_extractor,
            stage_timeout,
        }
    }

    /// 处理单个文件（不关心进度）
    pub async fn process(&self, file: &SelectedFile) -> PipelineResult<ProcessedDocument> {
        self.process_with_progress(file, &DocumentCtx::single(file.name()), |_| {})
            .await
    }

    /// 处理单个文件，每个阶段开始前回调 `on_stage`
    pub async fn process_with_progress<F>(
        &self,
        file: &SelectedFile,
        ctx: &DocumentCtx,
        mut on_stage: F,
    ) -> PipelineResult<ProcessedDocument>
    where
        F: FnMut(Stage),
    {
        // ========== 阶段 1: 上传并提取文本 ==========
        on_stage(Stage::Upload);
        info!("{} 📤 上传并提取文本 ({})", ctx, file.size_label());

        file.validate()?;

        let extracted = tokio::time::timeout(self.stage_timeout, self.text_extractor.extract_text(file))
            .await
            .map_err(|_| self.timed_out(Stage::Upload, file))??;

        let text = extracted.text.trim();
        if text.is_empty() {
            warn!("{} ⚠️ 未提取到任何文本", ctx);
            return Err(PipelineError::stage_failed(
                Stage::Upload,
                file.name(),
                "No text content found in PDF",
            ));
        }

        info!(
            "{} ✓ 文本提取完成: {} 页, {} 字符",
            ctx,
            extracted.pages,
            text.chars().count()
        );

        // ========== 阶段 2: 字段提取 ==========
        on_stage(Stage::Extract);
        info!("{} 🤖 正在提取字段...", ctx);

        let extraction = tokio::time::timeout(self.stage_timeout, self.field_extractor.extract_fields(text))
            .await
            .map_err(|_| self.timed_out(Stage::Extract, file))?
            .map_err(|e| PipelineError::stage_failed(Stage::Extract, file.name(), format!("{:#}", e)))?;

        if let Some(message) = &extraction.message {
            warn!("{} ⚠️ {}", ctx, message);
        }
        if !extraction.missing_fields.is_empty() {
            debug!("{} 缺失字段: {:?}", ctx, extraction.missing_fields);
        }

        let fields = extraction.fields.normalize();

        info!(
            "{} ✓ 字段提取完成 (置信度: {}, 类别: {}, 归档: {})",
            ctx, extraction.confidence, fields.category, fields.store_in
        );

        Ok(ProcessedDocument::new(file.clone(), fields))
    }

    fn timed_out(&self, stage: Stage, file: &SelectedFile) -> PipelineError {
        warn!("{} 阶段超时: {}", stage, file.name());
        PipelineError::stage_failed(
            stage,
            file.name(),
            format!("timed out after {:?}", self.stage_timeout),
        )
    }
}
