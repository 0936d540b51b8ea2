//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责终端交互和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 终端应用
//! - 管理应用生命周期（初始化、运行）
//! - 选择词库来源（内置 / AI 生成 / 文件）
//! - 把每行输入交给 `SessionController`，输出判定结果
//! - 完成后输出统计，按配置重新开始
//!
//! ### `commands` - 输入解析
//! - 练习中的命令（显示答案、下一个、暂停……）
//! - 菜单和完成界面的选择
//!
//! ## 层次关系
//!
//! ```text
//! app (终端输入输出)
//!     ↓
//! workflow::SessionController (练习状态)
//!     ↓
//! services (能力层：word_source / speech)
//!     ↓
//! clients (基础设施：ChatClient)
//! ```
//!
//! ## 设计原则
//!
//! 1. **向下依赖**：编排层 → workflow → services → clients
//! 2. **无判定逻辑**：对错判断和进度推进全部在 workflow 层

pub mod app;
pub mod commands;

// 重新导出主要类型
pub use app::{App, Flow, ListOrigin, Screen};
