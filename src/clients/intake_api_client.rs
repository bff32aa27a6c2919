/// 文档接收 API 客户端
///
/// 封装三个远程接口：
/// - `POST /api/upload`：multipart 上传 PDF，返回文本、页数与 Info
/// - `POST /api/extract`：提交文本，返回字段、置信度与缺失字段
/// - `POST /api/submit`：提交最终确认的字段
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, error};

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult, Stage};
use crate::models::{Confidence, ExtractedFields, FieldExtraction, SelectedFile};
use crate::services::{
    ExtractedText, FieldExtractor, Submission, SubmissionReceipt, SubmissionSink, TextExtractor,
};

/// 文档接收 API 客户端
#[derive(Debug, Clone)]
pub struct IntakeApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl IntakeApiClient {
    /// 创建新的客户端
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// 未配置 `INTAKE_API_BASE_URL` 时返回 `None`
    pub fn from_config(config: &Config) -> Option<Self> {
        config.intake_api_base_url.as_deref().map(Self::new)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// 上传文件，返回 (是否 2xx, 响应体)
    async fn post_upload(&self, file: &SelectedFile) -> Result<(bool, String)> {
        let mime = match file.mime_type() {
            "" => "application/pdf",
            declared => declared,
        };
        let part = Part::bytes(file.content().to_vec())
            .file_name(file.name().to_string())
            .mime_str(mime)?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        let ok = response.status().is_success();
        let body = response.text().await?;
        Ok((ok, body))
    }

    async fn post_json(&self, path: &str, payload: &Value) -> Result<(bool, String)> {
        let response = self
            .http
            .post(self.endpoint(path))
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await?;

        let ok = response.status().is_success();
        let body = response.text().await?;
        Ok((ok, body))
    }
}

/// 解析 `/api/upload` 的响应体
///
/// 失败时返回接口给出的 `error`，没有则为 "Unknown error"。
pub fn parse_upload_response(ok: bool, body: &str) -> std::result::Result<ExtractedText, String> {
    let value: Value = serde_json::from_str(body).unwrap_or(Value::Null);

    if !ok {
        return Err(error_field(&value));
    }

    let text = value
        .get("text")
        .and_then(Value::as_str)
        .ok_or_else(|| "No text content found in PDF".to_string())?;

    let pages = value.get("pages").and_then(Value::as_u64).unwrap_or(0) as usize;

    let info: BTreeMap<String, String> = value
        .get("info")
        .and_then(Value::as_object)
        .map(|object| {
            object
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), value_to_string(v)))
                .collect()
        })
        .unwrap_or_default();

    Ok(ExtractedText {
        text: text.trim().to_string(),
        pages,
        info,
    })
}

/// 解析 `/api/extract` 的响应体
pub fn parse_extract_response(ok: bool, body: &str) -> Result<FieldExtraction> {
    let value: Value = serde_json::from_str(body).unwrap_or(Value::Null);

    if !ok {
        bail!("{}", error_field(&value));
    }

    let object = value
        .get("fields")
        .and_then(Value::as_object)
        .context("Response has no fields object")?;
    let (fields, computed_missing) = ExtractedFields::from_json_object(object);

    let confidence = value
        .get("confidence")
        .cloned()
        .and_then(|c| serde_json::from_value::<Confidence>(c).ok())
        .unwrap_or(Confidence::Low);

    let missing_fields = match value.get("missingFields").and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        None => computed_missing,
    };

    let message = value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(FieldExtraction {
        fields,
        confidence,
        missing_fields,
        message,
    })
}

fn error_field(value: &Value) -> String {
    value
        .get("error")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown error")
        .to_string()
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl TextExtractor for IntakeApiClient {
    async fn extract_text(&self, file: &SelectedFile) -> PipelineResult<ExtractedText> {
        file.validate()?;

        let (ok, body) = self.post_upload(file).await.map_err(|e| {
            error!("上传请求失败 ({}): {}", file.name(), e);
            PipelineError::stage_failed(Stage::Upload, file.name(), e.to_string())
        })?;

        debug!("上传结果 ({}): {}", file.name(), crate::utils::truncate_text(&body, 200));

        parse_upload_response(ok, &body)
            .map_err(|cause| PipelineError::stage_failed(Stage::Upload, file.name(), cause))
    }
}

#[async_trait]
impl FieldExtractor for IntakeApiClient {
    async fn extract_fields(&self, text: &str) -> Result<FieldExtraction> {
        let (ok, body) = self
            .post_json("extract", &json!({ "text": text }))
            .await
            .context("无法连接字段提取接口")?;

        debug!("字段提取结果: {}", crate::utils::truncate_text(&body, 200));

        parse_extract_response(ok, &body)
    }
}

#[async_trait]
impl SubmissionSink for IntakeApiClient {
    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt> {
        let payload = serde_json::to_value(&submission.fields)?;
        let (ok, body) = self.post_json("submit", &payload).await?;

        if !ok {
            return Err(anyhow!("Submit failed for {}: {}", submission.file_name, body));
        }

        let receipt: SubmissionReceipt =
            serde_json::from_str(&body).context("Invalid submit response")?;
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_response_success() {
        let body = r#"{"success":true,"text":"  Patient: Jane  ","pages":2,"info":{"Title":"Referral","IsAcroFormPresent":false,"Author":null}}"#;
        let extracted = parse_upload_response(true, body).unwrap();
        assert_eq!(extracted.text, "Patient: Jane");
        assert_eq!(extracted.pages, 2);
        assert_eq!(extracted.info.get("Title").map(String::as_str), Some("Referral"));
        assert_eq!(
            extracted.info.get("IsAcroFormPresent").map(String::as_str),
            Some("false")
        );
        assert!(!extracted.info.contains_key("Author"));
    }

    #[test]
    fn test_upload_response_error_uses_error_field() {
        let body = r#"{"error":"File size exceeds 10MB limit"}"#;
        assert_eq!(
            parse_upload_response(false, body).unwrap_err(),
            "File size exceeds 10MB limit"
        );
        assert_eq!(parse_upload_response(false, "<html>").unwrap_err(), "Unknown error");
    }

    #[test]
    fn test_extract_response_success() {
        let body = r#"{
            "fields": {"patient_name":"Jane","date_of_report":"2024-01-02","subject":"",
                       "contact_of_source":"City Lab","store_in":"Investigations",
                       "doctor":null,"category":"Pathology"},
            "confidence":"high",
            "missingFields":["subject","doctor"]
        }"#;
        let extraction = parse_extract_response(true, body).unwrap();
        assert_eq!(extraction.fields.patient_name, "Jane");
        assert_eq!(extraction.fields.doctor, "");
        assert_eq!(extraction.confidence, Confidence::High);
        assert_eq!(extraction.missing_fields, vec!["subject", "doctor"]);
        assert!(extraction.message.is_none());
    }

    #[test]
    fn test_extract_response_fallback_message() {
        let body = r#"{"fields":{"category":"Letter"},"confidence":"low","message":"Using fallback data"}"#;
        let extraction = parse_extract_response(true, body).unwrap();
        assert_eq!(extraction.confidence, Confidence::Low);
        assert_eq!(extraction.message.as_deref(), Some("Using fallback data"));
        assert!(extraction.missing_fields.contains(&"patient_name".to_string()));
    }

    #[test]
    fn test_extract_response_error() {
        let body = r#"{"error":"Failed to extract fields","message":"No valid JSON found in AI response"}"#;
        let err = parse_extract_response(false, body).unwrap_err();
        assert_eq!(err.to_string(), "Failed to extract fields");

        assert!(parse_extract_response(true, r#"{"confidence":"high"}"#).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = IntakeApiClient::new("http://localhost:3000/");
        assert_eq!(client.endpoint("upload"), "http://localhost:3000/api/upload");
    }
}
