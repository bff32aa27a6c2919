use anyhow::Result;
use doc_intake::{logger, App, Config};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logger::init(config.verbose_logging);

    // 命令行参数为待处理的 PDF 路径；为空时读取收件目录
    let paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();

    // 初始化并运行应用
    App::initialize(config).await?.run(paths).await?;

    Ok(())
}
