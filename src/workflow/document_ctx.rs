//! 文档处理上下文
//!
//! 封装"我正在处理本批的第几个文件"这一信息

use std::fmt::Display;

/// 文档处理上下文
#[derive(Debug, Clone)]
pub struct DocumentCtx {
    /// 文件在本批中的序号（从1开始）
    pub file_index: usize,

    /// 本批文件总数
    pub total: usize,

    /// 文件名
    pub file_name: String,
}

impl DocumentCtx {
    /// 创建新的文档上下文
    pub fn new(file_index: usize, total: usize, file_name: impl Into<String>) -> Self {
        Self {
            file_index,
            total,
            file_name: file_name.into(),
        }
    }

    /// 单文件处理时使用的上下文
    pub fn single(file_name: impl Into<String>) -> Self {
        Self::new(1, 1, file_name)
    }
}

impl Display for DocumentCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文件 {}/{} {}]", self.file_index, self.total, self.file_name)
    }
}
