/// 归档位置枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum StoreIn {
    /// 往来信函
    Correspondence,
    /// 检查检验
    Investigations,
}

impl StoreIn {
    /// 全部取值，按界面展示顺序
    pub const ALL: [StoreIn; 2] = [StoreIn::Correspondence, StoreIn::Investigations];

    /// 字段中保存的标准名称
    pub fn name(self) -> &'static str {
        match self {
            StoreIn::Correspondence => "Correspondence",
            StoreIn::Investigations => "Investigations",
        }
    }

    /// 尝试从字符串解析（精确匹配）
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Correspondence" => Some(StoreIn::Correspondence),
            "Investigations" => Some(StoreIn::Investigations),
            _ => None,
        }
    }

    /// 不在标准集合中的值一律归入 Correspondence
    pub fn normalize(s: &str) -> Self {
        Self::from_str(s).unwrap_or(StoreIn::Correspondence)
    }
}

/// 所有合法的归档位置名称
pub const STORE_IN_OPTIONS: [&str; 2] = ["Correspondence", "Investigations"];
