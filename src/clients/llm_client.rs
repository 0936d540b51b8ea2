//! LLM API 客户端 - 基础设施层
//!
//! 只暴露"发一条消息，拿回一段文本"的能力，不认识单词和词库
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（如豆包、Azure、Gemini 等）
//! - 客户端显式构造后注入，不存在全局单例

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ServiceError;

/// 单次聊天请求
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub user_message: String,
    pub system_message: Option<String>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            system_message: None,
            temperature: 0.3,
            max_tokens: None,
        }
    }

    pub fn with_system(mut self, system_message: impl Into<String>) -> Self {
        self.system_message = Some(system_message.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// 聊天补全能力
///
/// 返回 `Ok(None)` 表示服务正常应答但没有内容
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<Option<String>, ServiceError>;
}

/// 基于 async-openai 的客户端
pub struct OpenAiChatClient {
    client: Client<OpenAIConfig>,
    model_name: String,
    timeout: Duration,
}

impl OpenAiChatClient {
    /// 根据配置创建客户端
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            timeout: config.llm_timeout(),
        }
    }

    /// 使用指定模型
    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn build_messages(
        &self,
        request: &ChatRequest,
    ) -> Result<Vec<ChatCompletionRequestMessage>, ServiceError> {
        let mut messages = Vec::new();

        if let Some(sys_msg) = &request.system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg.as_str())
                .build()
                .map_err(|e| ServiceError::Unknown(e.to_string()))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(request.user_message.as_str())
            .build()
            .map_err(|e| ServiceError::Unknown(e.to_string()))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        Ok(messages)
    }
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn complete(&self, request: ChatRequest) -> Result<Option<String>, ServiceError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", request.user_message.len());

        let messages = self.build_messages(&request)?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model_name)
            .messages(messages)
            .temperature(request.temperature);
        if let Some(max_tokens) = request.max_tokens {
            args.max_tokens(max_tokens);
        }
        let chat_request = args
            .build()
            .map_err(|e| ServiceError::Unknown(e.to_string()))?;

        // 单次尝试，超时由这里兜底
        let response = tokio::time::timeout(self.timeout, self.client.chat().create(chat_request))
            .await
            .map_err(|_| {
                warn!("LLM API 调用超时 ({:?})", self.timeout);
                ServiceError::Timeout
            })?
            .map_err(|e| {
                warn!("LLM API 调用失败: {}", e);
                ServiceError::classify(&e.to_string())
            })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty());

        Ok(content)
    }
}
