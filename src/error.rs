use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 词库获取错误
    #[error("词库错误: {0}")]
    WordSource(#[from] WordSourceError),
    /// 单词数据错误
    #[error("单词错误: {0}")]
    Word(#[from] WordError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 单词数据校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WordError {
    /// 英文为空
    #[error("英文单词不能为空")]
    EmptyEnglish,
    /// 中文释义为空
    #[error("中文释义不能为空 (单词: {english})")]
    EmptyChinese { english: String },
    /// 词库为空
    #[error("词库不能为空")]
    EmptyList,
}

/// 生成服务调用错误
///
/// 按失败原因细分，调用方据此给出可读提示
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// 请求频率限制 (429)
    #[error("API 调用次数超限")]
    RateLimited,
    /// 密钥无效 (401)
    #[error("API 密钥无效")]
    Unauthorized,
    /// 请求超时
    #[error("请求超时")]
    Timeout,
    /// 其他调用失败
    #[error("调用失败: {0}")]
    Unknown(String),
}

impl ServiceError {
    /// 根据底层错误文本归类
    ///
    /// 传输层错误没有统一的结构，只能从文本中识别状态码和超时
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests") {
            ServiceError::RateLimited
        } else if lower.contains("401")
            || lower.contains("unauthorized")
            || lower.contains("invalid api key")
            || lower.contains("incorrect api key")
        {
            ServiceError::Unauthorized
        } else if lower.contains("timeout") || lower.contains("timed out") {
            ServiceError::Timeout
        } else {
            ServiceError::Unknown(message.to_string())
        }
    }
}

/// 词库获取错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WordSourceError {
    /// 主题或数量不合法
    #[error("输入不合法: {0}")]
    InvalidInput(String),
    /// 上一次生成尚未结束
    #[error("正在生成词库，请稍候")]
    Busy,
    /// 服务调用失败
    #[error("生成服务错误: {0}")]
    Service(#[from] ServiceError),
    /// 服务未返回任何内容
    #[error("未获得 AI 响应")]
    EmptyResponse,
    /// 某一行或某个对象缺少英文/中文
    #[error("单词数据格式不完整: {line}")]
    MalformedEntry { line: String },
    /// 有效单词数量不足
    #[error("有效单词数量不足: 需要 {expected} 个, 实际 {actual} 个")]
    CountMismatch { expected: usize, actual: usize },
}

impl WordSourceError {
    /// 面向用户的提示文本
    pub fn user_message(&self) -> String {
        match self {
            WordSourceError::InvalidInput(reason) => reason.clone(),
            WordSourceError::Busy => "正在生成词库，请等待当前请求完成".to_string(),
            WordSourceError::Service(ServiceError::RateLimited) => {
                "API 调用次数超限，请稍后再试".to_string()
            }
            WordSourceError::Service(ServiceError::Unauthorized) => {
                "API 密钥无效，请检查 LLM_API_KEY".to_string()
            }
            WordSourceError::Service(ServiceError::Timeout) => "请求超时，请重试".to_string(),
            WordSourceError::Service(ServiceError::Unknown(msg)) => {
                format!("生成词库失败: {}", msg)
            }
            WordSourceError::EmptyResponse => "AI 没有返回任何内容，请重试".to_string(),
            WordSourceError::MalformedEntry { line } => {
                format!("解析 AI 响应失败: 单词数据格式不完整: {}", line)
            }
            WordSourceError::CountMismatch { expected, actual } => {
                format!("AI 只生成了 {} 个有效单词（需要 {} 个），请重试", actual, expected)
            }
        }
    }
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 文件内容中的单词不合法
    #[error("词库文件内容不合法 ({path}): {source}")]
    InvalidWords {
        path: String,
        #[source]
        source: WordError,
    },
}

/// 配置错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
