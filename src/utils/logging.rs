/// 日志工具模块
///
/// 提供日志初始化和常用输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::workflow::SessionStats;

/// 初始化全局日志
///
/// 优先使用 `RUST_LOG`，否则根据 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ai_word_typer={},warn", default_level)));

    // 重复初始化（例如测试中）直接忽略
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 AI 单词打字练习启动");
    info!(
        "🤖 生成服务: {}",
        if config.llm_enabled() {
            config.llm_model_name.as_str()
        } else {
            "未配置 (仅内置词库 / 文件词库)"
        }
    );
    info!("💡 连续答错 {} 次自动显示答案", config.hint_threshold);
    info!("{}", "=".repeat(60));
}

/// 本轮练习总结
///
/// # 参数
/// - `stats`: 本轮统计
/// - `total`: 词库单词数
pub fn log_session_summary(stats: &SessionStats, total: usize) {
    let elapsed = chrono::Local::now() - stats.started_at;
    info!("\n{}", "=".repeat(60));
    info!("📊 本轮练习完成");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!(
        "用时: {} 分 {} 秒",
        elapsed.num_minutes(),
        elapsed.num_seconds() % 60
    );
    info!("{}", "=".repeat(60));
    info!("✅ 答对: {}/{}", stats.correct, total);
    info!("⏭️ 跳过: {}", stats.skipped);
    info!("❌ 答错次数: {}", stats.wrong);
    info!("💡 查看答案: {}", stats.hints);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
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
