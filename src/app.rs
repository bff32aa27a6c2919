use crate::clients::IntakeApiClient;
use crate::config::Config;
use crate::models::{field_options, load_all_pdf_files, load_selected_file, SelectedFile};
use crate::orchestrator::{BatchProcessor, ReviewSession};
use crate::services::{
    FieldExtractor, LlmFieldExtractor, LlmService, LogSubmissionSink, PdfTextExtractor,
    SubmissionSink, TextExtractor,
};
use crate::utils::logging;
use crate::workflow::UploadClient;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    processor: BatchProcessor,
    session: ReviewSession,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        logging::init_log_file(&config.output_log_file)
            .with_context(|| format!("无法创建日志文件: {}", config.output_log_file))?;

        let (text_extractor, field_extractor, sink, llm_configured) = build_collaborators(&config);
        logging::log_startup(llm_configured, config.intake_api_base_url.is_some());

        let upload_client = UploadClient::new(text_extractor, field_extractor, config.stage_timeout());

        Ok(Self {
            processor: BatchProcessor::new(upload_client),
            session: ReviewSession::new(sink),
            config,
        })
    }

    /// 运行应用主逻辑：处理命令行指定的文件（或收件目录），然后进入审阅循环
    pub async fn run(mut self, paths: Vec<PathBuf>) -> Result<()> {
        let files = self.startup_files(&paths).await?;

        if files.is_empty() {
            warn!("⚠️ 没有找到待处理的 PDF 文件，可在审阅界面中使用 run <路径> 重新选择");
        } else {
            self.process_batch(files).await;
        }

        self.review_loop().await
    }

    /// 启动时的文件选择；收件目录不存在时视为空选择，仍进入审阅循环
    async fn startup_files(&self, paths: &[PathBuf]) -> Result<Vec<SelectedFile>> {
        if paths.is_empty() && !Path::new(&self.config.inbox_folder).is_dir() {
            warn!("⚠️ 收件目录不存在: {}", self.config.inbox_folder);
            return Ok(Vec::new());
        }
        self.select_files(paths).await
    }

    /// 命令行给出路径时逐个加载，否则加载收件目录
    async fn select_files(&self, paths: &[PathBuf]) -> Result<Vec<SelectedFile>> {
        if paths.is_empty() {
            return load_all_pdf_files(&self.config.inbox_folder).await;
        }

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            files.push(load_selected_file(path).await?);
        }
        Ok(files)
    }

    async fn process_batch(&mut self, files: Vec<SelectedFile>) {
        self.processor.note_selection(files.len());
        print_status(&self.processor.status().progress);

        match self.processor.run(files).await {
            Ok(batch) => {
                self.session.load(batch);
                self.record_summaries();
            }
            Err(e) => {
                error!("❌ {}", e);
                self.session.reset();
                if let Err(log_err) = logging::append_log_line(&self.config.output_log_file, &format!("Error: {}", e)) {
                    warn!("写入日志文件失败: {}", log_err);
                }
            }
        }

        print_status(&self.processor.status().progress);
    }

    /// 把侧边栏摘要追加到日志文件
    fn record_summaries(&self) {
        for summary in self.session.summaries() {
            let line = format!("{} -> {}", summary.name, summary.category);
            if let Err(e) = logging::append_log_line(&self.config.output_log_file, &line) {
                warn!("写入日志文件失败: {}", e);
                return;
            }
        }
    }

    async fn review_loop(&mut self) -> Result<()> {
        print_help();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Some(line) = lines.next_line().await.context("读取标准输入失败")? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let command = match ReviewCommand::parse(line) {
                Ok(command) => command,
                Err(message) => {
                    println!("{}", message);
                    continue;
                }
            };

            match command {
                ReviewCommand::Quit => break,
                other => self.execute(other).await,
            }
        }

        info!("👋 审阅结束");
        Ok(())
    }

    async fn execute(&mut self, command: ReviewCommand) {
        match command {
            ReviewCommand::Help => print_help(),
            ReviewCommand::List => self.print_list(),
            ReviewCommand::Show => self.print_active(),
            ReviewCommand::Select(index) => {
                let selected = self.session.select(index).map(|_| ());
                match selected {
                    Ok(()) => self.print_active(),
                    Err(e) => println!("{}", e),
                }
            }
            ReviewCommand::Edit { field, value } => {
                if let Err(e) = self.session.edit(&field, value) {
                    println!("{}", e);
                }
            }
            ReviewCommand::Confirm => match self.session.confirm_current().await {
                Ok(receipt) if receipt.success => println!("Document filed successfully"),
                Ok(_) => println!("Submission was not accepted"),
                Err(e) => println!("{:#}", e),
            },
            ReviewCommand::Reset => match self.processor.reset() {
                Ok(()) => {
                    self.session.reset();
                    println!("Session cleared");
                }
                Err(e) => println!("{}", e),
            },
            ReviewCommand::Run(paths) => match self.select_files(&paths).await {
                Ok(files) => self.process_batch(files).await,
                Err(e) => println!("{:#}", e),
            },
            ReviewCommand::Quit => {}
        }
    }

    fn print_list(&self) {
        if self.session.is_empty() {
            println!("No documents");
            return;
        }
        for (i, summary) in self.session.summaries().iter().enumerate() {
            let marker = if i == self.session.active_index() { "*" } else { " " };
            println!("{} [{}] {} ({})", marker, i, summary.name, summary.category);
        }
    }

    fn print_active(&self) {
        let Some(document) = self.session.active_document() else {
            println!("No documents");
            return;
        };

        println!("{} ({})", document.file.name(), document.file.size_label());
        for (field, value) in document.fields.entries() {
            match field_options(field) {
                Some(options) => println!("  {:<18} {}  [{}]", field, value, options.join(" | ")),
                None => println!("  {:<18} {}", field, value),
            }
        }
    }
}

/// 根据配置选择三个协作者：远程接口或本地解析 + LLM
fn build_collaborators(
    config: &Config,
) -> (
    Arc<dyn TextExtractor>,
    Arc<dyn FieldExtractor>,
    Arc<dyn SubmissionSink>,
    bool,
) {
    if let Some(client) = IntakeApiClient::from_config(config) {
        info!("🔌 使用远程接口: {}", client.base_url());
        let client = Arc::new(client);
        return (client.clone(), client.clone(), client, true);
    }

    let extractor = LlmFieldExtractor::new(LlmService::from_config(config));
    let configured = extractor.is_configured();
    (
        Arc::new(PdfTextExtractor::new()),
        Arc::new(extractor),
        Arc::new(LogSubmissionSink::new()),
        configured,
    )
}

fn print_status(line: &str) {
    if !line.is_empty() {
        println!("{}", line);
    }
}

fn print_help() {
    println!("Commands: list | show | select <n> | edit <field> <value> | confirm | reset | run [paths...] | help | quit");
}

/// 审阅界面的一条命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewCommand {
    Help,
    List,
    Show,
    Select(usize),
    Edit { field: String, value: String },
    Confirm,
    Reset,
    Run(Vec<PathBuf>),
    Quit,
}

impl ReviewCommand {
    /// 解析一行输入；`edit` 的值取字段名之后的整行剩余部分（可为空）
    pub fn parse(line: &str) -> std::result::Result<Self, String> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim_start()),
            None => (line, ""),
        };

        match name.to_lowercase().as_str() {
            "help" | "?" => Ok(ReviewCommand::Help),
            "list" | "ls" => Ok(ReviewCommand::List),
            "show" => Ok(ReviewCommand::Show),
            "select" => rest
                .parse()
                .map(ReviewCommand::Select)
                .map_err(|_| format!("Usage: select <n> (got '{}')", rest)),
            "edit" => {
                let (field, value) = match rest.split_once(char::is_whitespace) {
                    Some((field, value)) => (field, value.trim_start()),
                    None => (rest, ""),
                };
                if field.is_empty() {
                    return Err("Usage: edit <field> <value>".to_string());
                }
                Ok(ReviewCommand::Edit {
                    field: field.to_string(),
                    value: value.to_string(),
                })
            }
            "confirm" => Ok(ReviewCommand::Confirm),
            "reset" => Ok(ReviewCommand::Reset),
            "run" => Ok(ReviewCommand::Run(
                rest.split_whitespace().map(PathBuf::from).collect(),
            )),
            "quit" | "exit" | "q" => Ok(ReviewCommand::Quit),
            other => Err(format!("Unknown command: {}", other)),
        }
    }
}
