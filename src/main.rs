use ai_word_typer::utils::logging;
use ai_word_typer::{App, Config};
use anyhow::Result;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let (config, config_error) = match Config::try_from_env() {
        Ok(config) => (config, None),
        Err(e) => (Config::from_env(), Some(e)),
    };

    // 初始化日志
    logging::init(config.verbose_logging);
    if let Some(e) = config_error {
        warn!("⚠️ {}，已回退到默认值", e);
    }
    logging::log_startup(&config);

    // 初始化并运行应用
    App::initialize(config).run().await?;

    Ok(())
}
