use std::path::PathBuf;

use anyhow::Result;
use studyai_session::app::App;
use studyai_session::utils::logging;
use studyai_session::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // 可选参数：配置文件路径
    let config_path = std::env::args().nth(1).map(PathBuf::from);

    // 加载配置
    let config = Config::load(config_path.as_deref())?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
