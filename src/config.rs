use std::time::Duration;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 待处理 PDF 存放目录（命令行未指定文件时使用）
    pub inbox_folder: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 每个远程阶段的超时时间（秒）
    pub stage_timeout_secs: u64,
    // --- LLM 配置 ---
    /// 未配置时字段提取进入降级模式，返回固定的兜底记录
    pub llm_api_key: Option<String>,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 远程接口配置 ---
    /// 设置后改为调用远程 /api/upload、/api/extract、/api/submit
    pub intake_api_base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inbox_folder: "inbox".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            stage_timeout_secs: 120,
            llm_api_key: None,
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-1.5-flash".to_string(),
            intake_api_base_url: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            inbox_folder: std::env::var("INBOX_FOLDER").unwrap_or(default.inbox_folder),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            stage_timeout_secs: std::env::var("STAGE_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.stage_timeout_secs),
            llm_api_key: non_empty_var("LLM_API_KEY").or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            intake_api_base_url: non_empty_var("INTAKE_API_BASE_URL").or(default.intake_api_base_url),
        }
    }

    /// 单个阶段的超时时间
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }
}

/// 空字符串视为未设置
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
