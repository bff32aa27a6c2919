use anyhow::Result;
/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::info;

use crate::error::FileFailure;

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n文档处理日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 向日志文件追加一行（带时间戳）
pub fn append_log_line(log_file_path: &str, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;
    writeln!(
        file,
        "[{}] {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        line
    )?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `llm_configured`: 是否配置了 LLM API key
/// - `remote`: 是否使用远程接口
pub fn log_startup(llm_configured: bool, remote: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 医疗文档提取模式");
    info!(
        "🔌 文本/字段提取: {}",
        if remote { "远程接口" } else { "本地解析 + LLM" }
    );
    if !remote && !llm_configured {
        info!("⚠️ 未配置 LLM API key，字段提取将使用兜底数据");
    }
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
///
/// # 参数
/// - `total`: 文件总数
pub fn log_batch_start(total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理本批文件，共 {} 个", total);
    info!("💡 按顺序逐个处理，任一文件失败即中止");
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(processed: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✅ 本批完成: 成功处理 {} 个文件", processed);
    info!("{}", "─".repeat(60));
}

/// 记录批次失败信息
pub fn log_batch_failed(failure: &FileFailure, processed_before: usize) {
    info!("\n{}", "─".repeat(60));
    info!(
        "❌ 本批中止: {} 在 {} 阶段失败（之前已处理 {} 个，结果丢弃）",
        failure.file_name, failure.stage, processed_before
    );
    info!("原因: {}", failure.message);
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("病人姓名很长", 2), "病人...");
    }

    #[test]
    fn test_log_file_header_and_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");
        let path = path.to_str().unwrap();

        init_log_file(path).unwrap();
        append_log_line(path, "a.pdf -> Letter").unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("文档处理日志"));
        assert!(content.trim_end().ends_with("a.pdf -> Letter"));
    }
}
