//! 词库来源 - 业务能力层
//!
//! 只负责"拿到一份合法词库"，不关心练习流程
//!
//! 来源：
//! - 内置词库（总是成功）
//! - TOML 词库文件
//! - LLM 按主题生成（单次请求，同一时间只允许一个请求在途）

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::clients::{ChatClient, ChatRequest};
use crate::config::Config;
use crate::error::{AppResult, WordSourceError};
use crate::models::{self, WordList};
use crate::services::word_parser::{fit_to_count, list_marker, parse_reply};

const WORD_LIST_PROMPT: &str = r#"生成{{count}}个与"{{topic}}"主题相关的英语单词。

输出格式要求：
每行一个单词，格式为：英文单词|中文含义
示例：
coffee|咖啡
tea|茶

要求：
- 单词要贴合主题且难度适中
- 首字母不需要大写，除非必要
- 中文释义要简洁准确
- 每行必须包含英文、中文，用|分隔
"#;

const SUGGEST_TOPICS_PROMPT: &str = r#"请生成10个日常英语学习场景建议。这些场景应该是人们在生活中常见的英语交流场景。

输出格式要求：
每行一个场景（中文），一行一个场景
示例：
在咖啡店点单
在酒店办理入住
在机场办理登机

要求：
- 场景要贴近日常生活
- 描述要简洁明了
- 场景要具体实用
- 每行只输出一个场景名称"#;

/// 生成失败时使用的推荐场景
pub const DEFAULT_TOPICS: &[&str] = &[
    "我要预约酒店",
    "我要订机票",
    "我要参加学术会议",
    "我要面试跨境电商职位",
    "我要在超市购物",
];

/// 词库来源服务
///
/// 职责：
/// - 提供内置词库 / 文件词库
/// - 调用 LLM 生成词库并校验
/// - 不持有练习状态
pub struct WordSource {
    client: Option<Arc<dyn ChatClient>>,
    temperature: f32,
    max_count: usize,
    busy: AtomicBool,
}

/// 在途标记，离开作用域时自动释放
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl WordSource {
    /// 创建词库来源
    ///
    /// `client` 为 `None` 时只能使用内置词库和文件词库
    pub fn new(config: &Config, client: Option<Arc<dyn ChatClient>>) -> Self {
        Self {
            client,
            temperature: config.llm_temperature,
            max_count: config.max_word_count,
            busy: AtomicBool::new(false),
        }
    }

    /// 是否可以调用生成服务
    pub fn can_generate(&self) -> bool {
        self.client.is_some()
    }

    /// 当前是否有生成请求在途
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// 内置词库
    pub fn builtin_words(&self) -> WordList {
        models::builtin_words()
    }

    /// 从 TOML 文件加载词库
    pub async fn load_file(&self, path: &Path) -> AppResult<WordList> {
        let (name, words) = models::load_word_list(path).await?;
        if let Some(name) = name {
            info!("📚 词库: {}", name);
        }
        Ok(words)
    }

    /// 按主题生成词库
    pub async fn generate_words(
        &self,
        topic: &str,
        count: usize,
    ) -> Result<WordList, WordSourceError> {
        let mut rng = StdRng::from_entropy();
        self.generate_words_with_rng(topic, count, &mut rng).await
    }

    /// 同 `generate_words`，多余单词的抽取使用指定随机源
    pub async fn generate_words_with_rng<R: Rng + ?Sized + Send>(
        &self,
        topic: &str,
        count: usize,
        rng: &mut R,
    ) -> Result<WordList, WordSourceError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(WordSourceError::InvalidInput("请输入主题".to_string()));
        }
        if count == 0 || count > self.max_count {
            return Err(WordSourceError::InvalidInput(format!(
                "生成数量必须在 1 到 {} 之间",
                self.max_count
            )));
        }

        let client = self.client.as_ref().ok_or_else(|| {
            WordSourceError::InvalidInput("未配置 LLM_API_KEY，无法生成词库".to_string())
        })?;

        let _guard = self.acquire()?;

        info!("🤖 正在生成词库: 主题 \"{}\"，数量 {}", topic, count);

        let prompt = WORD_LIST_PROMPT
            .replace("{{topic}}", topic)
            .replace("{{count}}", &count.to_string());
        let request = ChatRequest::new(prompt).with_temperature(self.temperature);

        let reply = client
            .complete(request)
            .await?
            .ok_or(WordSourceError::EmptyResponse)?;
        debug!("LLM 回复: {}", reply);

        let entries = parse_reply(&reply).map_err(|e| {
            warn!("解析 AI 响应失败: {}", e);
            e
        })?;

        if entries.len() > count {
            debug!("生成了 {} 个单词，随机抽取 {} 个", entries.len(), count);
        }
        let entries = fit_to_count(entries, count, rng)?;

        info!("✓ 词库生成完成，共 {} 个单词", entries.len());

        // fit_to_count 保证至少 count (>=1) 个
        WordList::new(entries).map_err(|_| WordSourceError::EmptyResponse)
    }

    /// 生成推荐练习场景，失败时返回默认场景
    pub async fn suggest_topics(&self) -> Vec<String> {
        let defaults = || DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect();

        let Some(client) = self.client.as_ref() else {
            return defaults();
        };

        let request = ChatRequest::new(SUGGEST_TOPICS_PROMPT)
            .with_temperature(0.7)
            .with_max_tokens(300);

        match client.complete(request).await {
            Ok(Some(content)) => {
                let topics: Vec<String> = content
                    .lines()
                    .map(|line| list_marker().replace(line, "").trim().to_string())
                    .filter(|line| !line.is_empty())
                    .collect();
                if topics.is_empty() {
                    defaults()
                } else {
                    topics
                }
            }
            Ok(None) => defaults(),
            Err(e) => {
                warn!("生成推荐场景失败: {}", e);
                defaults()
            }
        }
    }

    fn acquire(&self) -> Result<BusyGuard<'_>, WordSourceError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| WordSourceError::Busy)?;
        Ok(BusyGuard(&self.busy))
    }
}
