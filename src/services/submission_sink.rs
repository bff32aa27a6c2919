//! 归档服务 - 业务能力层
//!
//! 只负责"接收最终确认的记录"能力，不关心流程

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::ExtractedFields;

/// 一份待归档的记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub file_name: String,
    pub fields: ExtractedFields,
}

/// 归档回执
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub success: bool,
}

/// 归档能力
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt>;
}

/// 只记录日志的归档实现，总是成功
#[derive(Debug, Default)]
pub struct LogSubmissionSink;

impl LogSubmissionSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SubmissionSink for LogSubmissionSink {
    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt> {
        let body = serde_json::to_string(&submission.fields)?;
        info!("📥 收到最终表单数据 ({}): {}", submission.file_name, body);
        Ok(SubmissionReceipt { success: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_sink_always_succeeds() {
        let sink = LogSubmissionSink::new();
        let submission = Submission {
            file_name: "a.pdf".to_string(),
            fields: ExtractedFields::default(),
        };
        let receipt = sink.submit(&submission).await.unwrap();
        assert!(receipt.success);
    }
}
