//! 流水线错误类型
//!
//! 一共五类错误：
//! - `Validation`：发出任何网络请求之前的输入校验失败
//! - `Upload`：文本提取阶段失败（中止整批）
//! - `Extract`：字段提取阶段失败（中止整批）
//! - `Index`：审阅会话中的非法导航
//! - `Busy`：已有一批正在运行时再次启动

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// 单个文件经历的远程阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// 上传并提取文本
    Upload,
    /// 调用 LLM 提取字段
    Extract,
}

impl Stage {
    /// 进度事件里使用的进行时标签
    pub fn progress_label(self) -> &'static str {
        match self {
            Stage::Upload => "uploading",
            Stage::Extract => "extracting",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Upload => write!(f, "upload"),
            Stage::Extract => write!(f, "extract"),
        }
    }
}

/// 流水线错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("{}", validation_message(.file, .reason))]
    Validation {
        file: Option<String>,
        reason: String,
    },

    #[error("Upload failed for {file}: {cause}")]
    Upload { file: String, cause: String },

    #[error("Extraction failed for {file}: {cause}")]
    Extract { file: String, cause: String },

    #[error("Document index {index} is out of range (0..{len})")]
    Index { index: usize, len: usize },

    #[error("A batch is already running")]
    Busy,
}

fn validation_message(file: &Option<String>, reason: &str) -> String {
    match file {
        Some(name) => format!("Invalid file {}: {}", name, reason),
        None => reason.to_string(),
    }
}

impl PipelineError {
    /// 针对某个文件的校验错误
    pub fn invalid_file(file: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::Validation {
            file: Some(file.into()),
            reason: reason.into(),
        }
    }

    /// 与具体文件无关的校验错误（例如空列表）
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        PipelineError::Validation {
            file: None,
            reason: reason.into(),
        }
    }

    /// 按阶段构造远程调用失败
    pub fn stage_failed(stage: Stage, file: impl Into<String>, cause: impl Into<String>) -> Self {
        match stage {
            Stage::Upload => PipelineError::Upload {
                file: file.into(),
                cause: cause.into(),
            },
            Stage::Extract => PipelineError::Extract {
                file: file.into(),
                cause: cause.into(),
            },
        }
    }

    /// 出错的文件名（仅流水线阶段错误有）
    pub fn file_name(&self) -> Option<&str> {
        match self {
            PipelineError::Validation { file, .. } => file.as_deref(),
            PipelineError::Upload { file, .. } | PipelineError::Extract { file, .. } => Some(file),
            PipelineError::Index { .. } | PipelineError::Busy => None,
        }
    }

    /// 出错的阶段；校验失败发生在上传之前，归入 upload
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Validation { file: Some(_), .. } | PipelineError::Upload { .. } => {
                Some(Stage::Upload)
            }
            PipelineError::Extract { .. } => Some(Stage::Extract),
            _ => None,
        }
    }

    /// 转换为单文件失败描述
    pub fn failure(&self) -> Option<FileFailure> {
        Some(FileFailure {
            file_name: self.file_name()?.to_string(),
            stage: self.stage()?,
            message: self.to_string(),
        })
    }
}

/// 单个文件的失败描述：文件名 + 阶段 + 可读原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub file_name: String,
    pub stage: Stage,
    pub message: String,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} @ {}] {}", self.file_name, self.stage, self.message)
    }
}

/// 流水线结果类型
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_labels() {
        assert_eq!(Stage::Upload.to_string(), "upload");
        assert_eq!(Stage::Extract.to_string(), "extract");
        assert_eq!(Stage::Upload.progress_label(), "uploading");
        assert_eq!(Stage::Extract.progress_label(), "extracting");
    }

    #[test]
    fn test_extract_error_names_file_and_stage() {
        let err = PipelineError::stage_failed(Stage::Extract, "b.pdf", "LLM 超时");
        assert_eq!(err.to_string(), "Extraction failed for b.pdf: LLM 超时");

        let failure = err.failure().unwrap();
        assert_eq!(failure.file_name, "b.pdf");
        assert_eq!(failure.stage, Stage::Extract);
    }

    #[test]
    fn test_validation_without_file_has_no_failure() {
        let err = PipelineError::invalid_input("Please select file(s) first");
        assert_eq!(err.to_string(), "Please select file(s) first");
        assert!(err.failure().is_none());

        let err = PipelineError::invalid_file("scan.png", "Only PDF files are supported");
        assert_eq!(err.stage(), Some(Stage::Upload));
        assert_eq!(
            err.to_string(),
            "Invalid file scan.png: Only PDF files are supported"
        );
    }
}
