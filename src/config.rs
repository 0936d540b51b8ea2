use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// 重新开始时的词库策略
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestartPolicy {
    /// 沿用当前词库，打乱顺序
    Reshuffle,
    /// 用相同主题和数量重新生成（内置词库与文件词库仍然打乱）
    Regenerate,
}

impl FromStr for RestartPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reshuffle" | "shuffle" => Ok(RestartPolicy::Reshuffle),
            "regenerate" | "new" => Ok(RestartPolicy::Regenerate),
            _ => Err(()),
        }
    }
}

/// 手动显示答案时如何处理连续错误计数
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManualHintPolicy {
    /// 清零连续错误计数
    ResetStreak,
    /// 保留连续错误计数
    KeepStreak,
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    /// 单次生成请求的超时时间（秒）
    pub llm_timeout_secs: u64,
    // --- 练习配置 ---
    /// 默认生成数量
    pub default_word_count: usize,
    /// 单次允许生成的最大数量
    pub max_word_count: usize,
    /// 连续答错多少次后自动显示答案
    pub hint_threshold: u32,
    pub manual_hint_policy: ManualHintPolicy,
    pub restart_policy: RestartPolicy,
    // --- 发音配置 ---
    pub audio_enabled: bool,
    /// 发音地址模板，`{text}` 会被替换为单词
    pub audio_url_template: String,
    pub audio_cache_dir: String,
    /// 外部播放器命令（例如 mpv），为空则只下载不播放
    pub audio_player: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://ark.cn-beijing.volces.com/api/v3".to_string(),
            llm_model_name: "doubao-lite-4k-character-240828".to_string(),
            llm_temperature: 0.3,
            llm_timeout_secs: 30,
            default_word_count: 10,
            max_word_count: 50,
            hint_threshold: 3,
            manual_hint_policy: ManualHintPolicy::ResetStreak,
            restart_policy: RestartPolicy::Reshuffle,
            audio_enabled: true,
            audio_url_template: "https://dict.youdao.com/dictvoice?audio={text}&type=2"
                .to_string(),
            audio_cache_dir: "audio_cache".to_string(),
            audio_player: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量读取配置，无法解析的值回退到默认值
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_temperature: std::env::var("LLM_TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_temperature),
            llm_timeout_secs: std::env::var("LLM_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_timeout_secs),
            default_word_count: std::env::var("DEFAULT_WORD_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.default_word_count),
            max_word_count: std::env::var("MAX_WORD_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_word_count),
            hint_threshold: std::env::var("HINT_THRESHOLD").ok().and_then(|v| v.parse().ok()).filter(|n| *n > 0).unwrap_or(default.hint_threshold),
            manual_hint_policy: std::env::var("MANUAL_HINT_RESETS_STREAK").ok().and_then(|v| v.parse::<bool>().ok()).map(hint_policy_from_flag).unwrap_or(default.manual_hint_policy),
            restart_policy: std::env::var("RESTART_POLICY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.restart_policy),
            audio_enabled: std::env::var("AUDIO_ENABLED").ok().and_then(|v| v.parse().ok()).unwrap_or(default.audio_enabled),
            audio_url_template: std::env::var("AUDIO_URL_TEMPLATE").unwrap_or(default.audio_url_template),
            audio_cache_dir: std::env::var("AUDIO_CACHE_DIR").unwrap_or(default.audio_cache_dir),
            audio_player: std::env::var("AUDIO_PLAYER").ok().filter(|v| !v.trim().is_empty()).or(default.audio_player),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 严格读取：任何无法解析的环境变量都会报错
    pub fn try_from_env() -> Result<Self, ConfigError> {
        let config = Self::from_env();
        check_env::<f32>("LLM_TEMPERATURE", "f32")?;
        check_env::<u64>("LLM_TIMEOUT_SECS", "u64")?;
        check_env::<usize>("DEFAULT_WORD_COUNT", "usize")?;
        check_env::<usize>("MAX_WORD_COUNT", "usize")?;
        check_env::<u32>("HINT_THRESHOLD", "u32")?;
        check_env::<bool>("MANUAL_HINT_RESETS_STREAK", "bool")?;
        check_env::<RestartPolicy>("RESTART_POLICY", "reshuffle|regenerate")?;
        check_env::<bool>("AUDIO_ENABLED", "bool")?;
        check_env::<bool>("VERBOSE_LOGGING", "bool")?;
        Ok(config)
    }

    /// 是否配置了生成服务
    pub fn llm_enabled(&self) -> bool {
        !self.llm_api_key.trim().is_empty()
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}

fn hint_policy_from_flag(resets: bool) -> ManualHintPolicy {
    if resets {
        ManualHintPolicy::ResetStreak
    } else {
        ManualHintPolicy::KeepStreak
    }
}

fn check_env<T: FromStr>(var_name: &str, expected_type: &str) -> Result<(), ConfigError> {
    match std::env::var(var_name) {
        Ok(value) if value.parse::<T>().is_err() => Err(ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value,
            expected_type: expected_type.to_string(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_embedded_key() {
        let config = Config::default();
        assert!(config.llm_api_key.is_empty());
        assert!(!config.llm_enabled());
        assert_eq!(config.hint_threshold, 3);
        assert_eq!(config.max_word_count, 50);
    }

    #[test]
    fn test_restart_policy_parse() {
        assert_eq!("reshuffle".parse(), Ok(RestartPolicy::Reshuffle));
        assert_eq!(" Regenerate ".parse(), Ok(RestartPolicy::Regenerate));
        assert!("sometimes".parse::<RestartPolicy>().is_err());
    }

    #[test]
    fn test_hint_policy_from_flag() {
        assert_eq!(hint_policy_from_flag(true), ManualHintPolicy::ResetStreak);
        assert_eq!(hint_policy_from_flag(false), ManualHintPolicy::KeepStreak);
    }

    #[test]
    fn test_try_from_env_rejects_invalid_value() {
        std::env::set_var("HINT_THRESHOLD", "three");
        let result = Config::try_from_env();
        std::env::remove_var("HINT_THRESHOLD");

        match result {
            Err(ConfigError::EnvVarParseFailed { var_name, value, .. }) => {
                assert_eq!(var_name, "HINT_THRESHOLD");
                assert_eq!(value, "three");
            }
            other => panic!("unexpected {:?}", other.map(|c| c.hint_threshold)),
        }
    }
}
