//! 提取出的元数据字段

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::category::{normalize_category, CATEGORIES};
use crate::models::store_in::{StoreIn, STORE_IN_OPTIONS};

/// 七个必填字段名，顺序即审阅表单顺序
pub const REQUIRED_FIELDS: [&str; 7] = [
    "patient_name",
    "date_of_report",
    "subject",
    "contact_of_source",
    "store_in",
    "doctor",
    "category",
];

/// 文档元数据记录
///
/// 七个已知字段固定为字符串；LLM 额外返回的键保存在 `extra` 中，
/// 审阅时同样可以编辑。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    #[serde(default)]
    pub patient_name: String,
    #[serde(default)]
    pub date_of_report: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub contact_of_source: String,
    #[serde(default)]
    pub store_in: String,
    #[serde(default)]
    pub doctor: String,
    #[serde(default)]
    pub category: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl ExtractedFields {
    /// 降级模式使用的固定兜底记录
    pub fn fallback(today: &str) -> Self {
        Self {
            patient_name: "Sample Patient Name".to_string(),
            date_of_report: today.to_string(),
            subject: "Medical document review".to_string(),
            contact_of_source: "Sample Medical Facility".to_string(),
            store_in: "Correspondence".to_string(),
            doctor: "Dr. Sample Doctor".to_string(),
            category: "Letter".to_string(),
            extra: BTreeMap::new(),
        }
    }

    /// 从 LLM 返回的 JSON 对象构造，同时返回缺失或为空的必填字段
    ///
    /// 非字符串值会被转成字符串，`null` 视为空。
    pub fn from_json_object(object: &Map<String, JsonValue>) -> (Self, Vec<String>) {
        let mut fields = Self::default();
        let mut missing = Vec::new();

        for (key, value) in object {
            let text = match value {
                JsonValue::String(s) => s.clone(),
                JsonValue::Null => String::new(),
                other => other.to_string(),
            };
            fields.set(key, text);
        }

        for name in REQUIRED_FIELDS {
            let present = fields.get(name).map(|v| !v.trim().is_empty()).unwrap_or(false);
            if !present {
                missing.push(name.to_string());
            }
        }

        (fields, missing)
    }

    /// 按字段名读取
    pub fn get(&self, field: &str) -> Option<&str> {
        match field {
            "patient_name" => Some(&self.patient_name),
            "date_of_report" => Some(&self.date_of_report),
            "subject" => Some(&self.subject),
            "contact_of_source" => Some(&self.contact_of_source),
            "store_in" => Some(&self.store_in),
            "doctor" => Some(&self.doctor),
            "category" => Some(&self.category),
            other => self.extra.get(other).map(String::as_str),
        }
    }

    /// 按字段名写入，值原样保存；未知字段写入 `extra`
    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        let value = value.into();
        match field {
            "patient_name" => self.patient_name = value,
            "date_of_report" => self.date_of_report = value,
            "subject" => self.subject = value,
            "contact_of_source" => self.contact_of_source = value,
            "store_in" => self.store_in = value,
            "doctor" => self.doctor = value,
            "category" => self.category = value,
            other => {
                self.extra.insert(other.to_string(), value);
            }
        }
    }

    /// 所有字段（必填字段在前，额外字段按键名排序）
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = REQUIRED_FIELDS
            .iter()
            .map(|name| (*name, self.get(name).unwrap_or_default()))
            .collect();
        entries.extend(self.extra.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        entries
    }

    /// 将 category / store_in 归一到标准集合
    pub fn normalize(mut self) -> Self {
        self.category = normalize_category(&self.category);
        self.store_in = StoreIn::normalize(&self.store_in).name().to_string();
        self
    }
}

/// 某个字段在审阅界面中可选的值；自由文本字段返回 `None`
pub fn field_options(field: &str) -> Option<&'static [&'static str]> {
    match field {
        "category" => Some(&CATEGORIES),
        "store_in" => Some(&STORE_IN_OPTIONS),
        _ => None,
    }
}

/// 提取结果的置信度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

/// 字段提取器的完整返回
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldExtraction {
    pub fields: ExtractedFields,
    pub confidence: Confidence,
    #[serde(default)]
    pub missing_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_object_reports_missing() {
        let value = json!({
            "patient_name": "Jane Citizen",
            "date_of_report": "2024-03-01",
            "subject": "  ",
            "store_in": "Investigations",
            "doctor": null,
            "category": "ECG",
            "urgency": "routine"
        });
        let (fields, missing) = ExtractedFields::from_json_object(value.as_object().unwrap());

        assert_eq!(fields.patient_name, "Jane Citizen");
        assert_eq!(fields.doctor, "");
        assert_eq!(fields.get("urgency"), Some("routine"));
        assert_eq!(missing, vec!["subject", "contact_of_source", "doctor"]);
    }

    #[test]
    fn test_non_string_values_are_stringified() {
        let value = json!({ "date_of_report": 20240301, "subject": true });
        let (fields, _) = ExtractedFields::from_json_object(value.as_object().unwrap());
        assert_eq!(fields.date_of_report, "20240301");
        assert_eq!(fields.subject, "true");
    }

    #[test]
    fn test_set_unknown_field_goes_to_extra() {
        let mut fields = ExtractedFields::fallback("2024-01-01");
        fields.set("doctor", "Dr. Who");
        fields.set("ward", "4B");
        assert_eq!(fields.doctor, "Dr. Who");
        assert_eq!(fields.extra.get("ward").map(String::as_str), Some("4B"));

        let names: Vec<&str> = fields.entries().iter().map(|(k, _)| *k).collect();
        assert_eq!(names.len(), 8);
        assert_eq!(names[0], "patient_name");
        assert_eq!(names[7], "ward");
    }

    #[test]
    fn test_normalize_applies_both_rules() {
        let mut fields = ExtractedFields::fallback("2024-01-01");
        fields.category = "Referral letter to cardiology".to_string();
        fields.store_in = "Inbox".to_string();
        let fields = fields.normalize();
        assert_eq!(fields.category, "Letter");
        assert_eq!(fields.store_in, "Correspondence");
    }

    #[test]
    fn test_field_options() {
        assert_eq!(field_options("category").unwrap().len(), 24);
        assert_eq!(
            field_options("store_in").unwrap(),
            &["Correspondence", "Investigations"]
        );
        assert!(field_options("doctor").is_none());
    }

    #[test]
    fn test_extraction_serializes_camel_case() {
        let extraction = FieldExtraction {
            fields: ExtractedFields::fallback("2024-01-01"),
            confidence: Confidence::Low,
            missing_fields: vec!["API key not configured".to_string()],
            message: None,
        };
        let value = serde_json::to_value(&extraction).unwrap();
        assert_eq!(value["confidence"], "low");
        assert_eq!(value["missingFields"][0], "API key not configured");
        assert_eq!(value["fields"]["category"], "Letter");
    }
}
