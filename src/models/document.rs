use serde::Serialize;
use std::sync::Arc;

use crate::error::{FileFailure, PipelineError};
use crate::models::fields::ExtractedFields;

/// 单个文件大小上限：10 MiB
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// 被视为 PDF 的声明类型
pub const PDF_MIME_TYPES: [&str; 2] = ["application/pdf", "application/octet-stream"];

/// 用户选中的文件
///
/// 内容用 `Arc` 共享，克隆不会复制字节。`size` 是声明大小，
/// 校验只看它，不看实际内容长度。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    mime_type: String,
    size: u64,
    content: Arc<[u8]>,
}

impl SelectedFile {
    /// 由内容创建，声明大小取内容长度
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: Vec<u8>) -> Self {
        let size = content.len() as u64;
        Self::from_parts(name, mime_type, size, content)
    }

    /// 显式给出声明大小
    pub fn from_parts(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
        content: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
            content: Arc::from(content),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// 以 MB 为单位的大小描述，用于列表展示
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size as f64 / 1024.0 / 1024.0)
    }

    /// 发送前的类型与大小校验
    ///
    /// 声明类型为 PDF 或文件名以 `.pdf` 结尾（忽略大小写）二者满足其一即可。
    pub fn validate(&self) -> Result<(), PipelineError> {
        let has_valid_type = PDF_MIME_TYPES.contains(&self.mime_type.as_str());
        let has_valid_extension = self.name.to_lowercase().ends_with(".pdf");

        if !has_valid_type && !has_valid_extension {
            let received = if self.mime_type.is_empty() {
                "unknown type"
            } else {
                self.mime_type.as_str()
            };
            return Err(PipelineError::invalid_file(
                &self.name,
                format!("Only PDF files are supported. Received: {}", received),
            ));
        }

        if self.size > MAX_FILE_SIZE {
            return Err(PipelineError::invalid_file(
                &self.name,
                "File size exceeds 10MB limit",
            ));
        }

        Ok(())
    }
}

/// 处理完成的文档：原文件 + 可编辑字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedDocument {
    pub file: SelectedFile,
    pub fields: ExtractedFields,
}

impl ProcessedDocument {
    pub fn new(file: SelectedFile, fields: ExtractedFields) -> Self {
        Self { file, fields }
    }

    /// 侧边栏摘要：文件名 + 类别
    pub fn summary(&self) -> DocumentSummary {
        let category = if self.fields.category.is_empty() {
            "No Category".to_string()
        } else {
            self.fields.category.clone()
        };
        DocumentSummary {
            name: self.file.name().to_string(),
            category,
        }
    }
}

/// 文档列表中的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub name: String,
    pub category: String,
}

/// 一次批处理的结果，顺序与输入一致
pub type BatchResult = Vec<ProcessedDocument>;

/// 单个文件的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Processed(ProcessedDocument),
    Failed(PipelineError),
}

impl PipelineOutcome {
    /// 失败时的文件名 + 阶段描述；与具体文件无关的错误返回 `None`
    pub fn failure(&self) -> Option<FileFailure> {
        match self {
            PipelineOutcome::Processed(_) => None,
            PipelineOutcome::Failed(e) => e.failure(),
        }
    }
}

impl From<Result<ProcessedDocument, PipelineError>> for PipelineOutcome {
    fn from(result: Result<ProcessedDocument, PipelineError>) -> Self {
        match result {
            Ok(document) => PipelineOutcome::Processed(document),
            Err(e) => PipelineOutcome::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;

    #[test]
    fn test_validate_accepts_pdf_type_or_extension() {
        assert!(SelectedFile::new("a.pdf", "", vec![1]).validate().is_ok());
        assert!(SelectedFile::new("A.PDF", "text/plain", vec![1]).validate().is_ok());
        assert!(SelectedFile::new("scan", "application/pdf", vec![1]).validate().is_ok());
        assert!(SelectedFile::new("blob", "application/octet-stream", vec![1])
            .validate()
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_other_types() {
        let err = SelectedFile::new("photo.png", "image/png", vec![1])
            .validate()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid file photo.png: Only PDF files are supported. Received: image/png"
        );

        let err = SelectedFile::new("notes", "", vec![1]).validate().unwrap_err();
        assert!(err.to_string().ends_with("Received: unknown type"));
    }

    #[test]
    fn test_validate_uses_declared_size() {
        let at_limit = SelectedFile::from_parts("a.pdf", "application/pdf", MAX_FILE_SIZE, vec![]);
        assert!(at_limit.validate().is_ok());

        let over = SelectedFile::from_parts("a.pdf", "application/pdf", MAX_FILE_SIZE + 1, vec![]);
        assert!(matches!(over.validate(), Err(PipelineError::Validation { .. })));
    }

    #[test]
    fn test_summary_defaults_category() {
        let file = SelectedFile::new("a.pdf", "application/pdf", vec![]);
        let mut doc = ProcessedDocument::new(file, ExtractedFields::default());
        assert_eq!(doc.summary().category, "No Category");
        doc.fields.category = "ECG".to_string();
        assert_eq!(doc.summary().category, "ECG");
    }

    #[test]
    fn test_outcome_from_error() {
        let err = PipelineError::stage_failed(Stage::Extract, "b.pdf", "bad json");
        let outcome = PipelineOutcome::from(Err(err));
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.stage, Stage::Extract);
        assert_eq!(failure.file_name, "b.pdf");

        let file = SelectedFile::new("a.pdf", "application/pdf", vec![]);
        let ok = PipelineOutcome::from(Ok(ProcessedDocument::new(file, ExtractedFields::default())));
        assert!(ok.failure().is_none());
    }

    #[test]
    fn test_size_label() {
        let file = SelectedFile::from_parts("a.pdf", "application/pdf", 2 * 1024 * 1024, vec![]);
        assert_eq!(file.size_label(), "2.00 MB");
    }
}
