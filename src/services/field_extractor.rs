//! 字段提取服务 - 业务能力层
//!
//! 只负责"文本 → 七字段记录"能力
//!
//! 未配置 API key 时不报错，返回固定的兜底记录（置信度 low）。

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::models::{Confidence, ExtractedFields, FieldExtraction, CATEGORIES};
use crate::services::llm_service::LlmService;
use crate::utils::logging::truncate_text;

/// 兜底记录中缺失字段列表的唯一条目
pub const API_KEY_MISSING: &str = "API key not configured";

/// 兜底记录附带的提示
pub const FALLBACK_MESSAGE: &str =
    "Using fallback data - please configure the LLM API key for AI extraction";

/// 字段提取能力
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    async fn extract_fields(&self, text: &str) -> Result<FieldExtraction>;
}

/// 基于 LLM 的字段提取
///
/// API key 通过构造参数显式传入，而不是在调用时读取环境变量。
pub struct LlmFieldExtractor {
    llm: Option<LlmService>,
}

impl LlmFieldExtractor {
    pub fn new(llm: Option<LlmService>) -> Self {
        Self { llm }
    }

    /// 降级模式：不调用任何远程服务
    pub fn unconfigured() -> Self {
        Self { llm: None }
    }

    pub fn is_configured(&self) -> bool {
        self.llm.is_some()
    }
}

#[async_trait]
impl FieldExtractor for LlmFieldExtractor {
    async fn extract_fields(&self, text: &str) -> Result<FieldExtraction> {
        if text.trim().is_empty() {
            anyhow::bail!("No text provided");
        }

        let llm = match &self.llm {
            Some(llm) => llm,
            None => {
                warn!("⚠️ 未配置 LLM API key，使用兜底数据");
                return Ok(fallback_extraction(&today()));
            }
        };

        debug!("文档文本预览: {}", truncate_text(text, 80));

        let (user_message, system_message) = build_extraction_messages(text);
        let response = llm.send_to_llm(&user_message, Some(&system_message)).await?;

        let (fields, missing_fields) = parse_extraction_response(&response)?;

        if !missing_fields.is_empty() {
            info!("LLM 未能提取的字段: {}", missing_fields.join(", "));
        }

        Ok(FieldExtraction {
            fields,
            confidence: Confidence::High,
            missing_fields,
            message: None,
        })
    }
}

/// 固定的兜底提取结果
pub fn fallback_extraction(today: &str) -> FieldExtraction {
    FieldExtraction {
        fields: ExtractedFields::fallback(today),
        confidence: Confidence::Low,
        missing_fields: vec![API_KEY_MISSING.to_string()],
        message: Some(FALLBACK_MESSAGE.to_string()),
    }
}

/// 今天的日期，`YYYY-MM-DD`
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// 构建字段提取的消息
///
/// 返回 (user_message, system_message)
fn build_extraction_messages(text: &str) -> (String, String) {
    let system_message = "You are Samantha, an AI medical document processing assistant. \
                          You extract metadata from medical documents and answer strictly with a valid JSON object."
        .to_string();

    let user_message = format!(
        r#"Extract and return only the following 7 fields from the provided medical document text, strictly as a valid JSON object.

Guidelines:
1. **patient_name**: Full name of the patient.
2. **date_of_report**: Use the actual report creation or issue date (often near the signature). Avoid using service or appointment dates.
3. **subject**: The topic of the document (e.g., SCROTAL ULTRASOUND).
4. **contact_of_source**: Name of the clinic, hospital, radiology center, or lab that produced the document (e.g., iMED Radiology, not individual doctor names or phone numbers).
5. **store_in**: Either "Correspondence" or "Investigations" only.
6. **doctor**: Full name of the referring or signing doctor (usually appears under "Referrer" or with a title like Dr.).
7. **category**: One of the following values: {}.

Return only a valid JSON object with keys: patient_name, date_of_report, subject, contact_of_source, store_in, doctor, and category.

MEDICAL DOCUMENT TEXT:
{}

JSON RESPONSE:"#,
        CATEGORIES.join(", "),
        text
    );

    (user_message, system_message)
}

/// 解析 LLM 的字段提取响应
///
/// 先去掉 ``` 代码块标记；整体不是 JSON 时退而取最外层的 `{...}`。
/// 返回记录和缺失/为空的必填字段。
pub fn parse_extraction_response(response: &str) -> Result<(ExtractedFields, Vec<String>)> {
    let fence_re = Regex::new(r"```(?:json)?\s*")?;
    let cleaned = fence_re.replace_all(response, "");
    let cleaned = cleaned.trim();

    let value: JsonValue = match serde_json::from_str(cleaned) {
        Ok(value) => value,
        Err(_) => {
            let object_re = Regex::new(r"(?s)\{.*\}")?;
            let block = object_re
                .find(cleaned)
                .ok_or_else(|| anyhow::anyhow!("No valid JSON found in AI response"))?;
            serde_json::from_str(block.as_str()).map_err(|e| {
                warn!("无法解析 LLM 响应: '{}'", truncate_text(cleaned, 200));
                anyhow::anyhow!("Invalid JSON in AI response: {}", e)
            })?
        }
    };

    let object = value
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("AI response is not a JSON object"))?;

    Ok(ExtractedFields::from_json_object(object))
}
