//! # AI Word Typer
//!
//! 一个终端单词打字练习程序：看中文，打英文
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Clients）
//! - `clients/` - 外部服务客户端，只暴露能力
//! - `ChatClient` - 对话补全能力，`OpenAiChatClient` 为 OpenAI 兼容实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `WordSource` - 内置词库 / 文件词库 / AI 生成词库
//! - `Speaker` - 单词发音
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义一轮练习的完整流程
//! - `SessionController` - 作答判定、提示、跳过、暂停、重新开始
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 终端应用，串联词库选择和练习循环
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ChatClient, ChatRequest, OpenAiChatClient};
pub use config::{Config, ManualHintPolicy, RestartPolicy};
pub use error::{AppError, AppResult, ServiceError, WordSourceError};
pub use models::{WordEntry, WordList};
pub use orchestrator::App;
pub use services::{Speaker, WordSource};
pub use workflow::{Judgement, Rejected, SessionController, SessionOptions, SessionPhase};
