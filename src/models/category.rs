//! 文档类别的标准集合
//!
//! 24 个类别名称必须原样保留；LLM 返回的类别不在集合中时按子串规则归一。

use phf::{phf_set, Set};

/// 标准类别，顺序即界面下拉框顺序，也是归一时的匹配优先级
pub const CATEGORIES: [&str; 24] = [
    "Admissions summary",
    "Advance care planning",
    "Allied health letter",
    "Certificate",
    "Clinical notes",
    "Clinical photograph",
    "Consent form",
    "DAS21",
    "Discharge summary",
    "ECG",
    "Email",
    "Form",
    "Immunisation",
    "Indigenous PIP",
    "Letter",
    "Medical imaging report",
    "MyHealth registration",
    "New PT registration form",
    "Pathology results",
    "Patient consent",
    "Record request",
    "Referral letter",
    "Workcover",
    "Workcover consent",
];

static CATEGORY_SET: Set<&'static str> = phf_set! {
    "Admissions summary",
    "Advance care planning",
    "Allied health letter",
    "Certificate",
    "Clinical notes",
    "Clinical photograph",
    "Consent form",
    "DAS21",
    "Discharge summary",
    "ECG",
    "Email",
    "Form",
    "Immunisation",
    "Indigenous PIP",
    "Letter",
    "Medical imaging report",
    "MyHealth registration",
    "New PT registration form",
    "Pathology results",
    "Patient consent",
    "Record request",
    "Referral letter",
    "Workcover",
    "Workcover consent",
};

/// 是否为标准类别（区分大小写）
pub fn is_canonical(category: &str) -> bool {
    CATEGORY_SET.contains(category)
}

/// 归一化类别
///
/// 1. 已是标准类别：原样返回
/// 2. 忽略大小写完全相等：返回对应标准类别
/// 3. 忽略大小写后包含某个标准类别：按标准顺序返回第一个
/// 4. 都不满足：原样返回
pub fn normalize_category(raw: &str) -> String {
    if is_canonical(raw) {
        return raw.to_string();
    }

    let lowered = raw.to_lowercase();

    if let Some(exact) = CATEGORIES.iter().find(|c| c.to_lowercase() == lowered) {
        return exact.to_string();
    }

    CATEGORIES
        .iter()
        .find(|c| lowered.contains(&c.to_lowercase()))
        .map(|c| c.to_string())
        .unwrap_or_else(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_list_agree() {
        assert_eq!(CATEGORY_SET.len(), CATEGORIES.len());
        for c in CATEGORIES {
            assert!(is_canonical(c), "{c}");
        }
    }

    #[test]
    fn test_canonical_value_is_kept() {
        assert_eq!(normalize_category("Pathology results"), "Pathology results");
        assert_eq!(normalize_category("New PT registration form"), "New PT registration form");
    }

    #[test]
    fn test_case_insensitive_exact_match() {
        assert_eq!(normalize_category("discharge SUMMARY"), "Discharge summary");
        assert_eq!(normalize_category("new pt registration form"), "New PT registration form");
    }

    #[test]
    fn test_value_containing_label_maps_to_first_label() {
        assert_eq!(normalize_category("ECG tracing"), "ECG");
        assert_eq!(normalize_category("Specialist LETTER"), "Letter");
        assert_eq!(normalize_category("Blood pathology results report"), "Pathology results");
    }

    #[test]
    fn test_unmatched_value_passes_through() {
        assert_eq!(normalize_category("Radiology"), "Radiology");
        assert_eq!(normalize_category(""), "");
    }
}
