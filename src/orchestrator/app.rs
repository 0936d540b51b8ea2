//! 终端应用 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：根据配置构造 LLM 客户端、发音服务、词库来源和练习会话
//! 2. **词库选择**：内置词库 / AI 生成 / TOML 文件
//! 3. **练习循环**：逐行读取输入，交给 `SessionController` 判定并输出结果
//! 4. **完成处理**：输出统计，按配置重新打乱或重新生成
//!
//! 输入逐行串行处理；生成请求在等待期间不会读取下一行

use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::clients::{ChatClient, OpenAiChatClient};
use crate::config::{Config, RestartPolicy};
use crate::models::WordList;
use crate::orchestrator::commands::{
    parse_command, parse_completion_choice, parse_count, parse_menu_choice, Command,
    CompletionChoice, MenuChoice, HELP_TEXT,
};
use crate::services::word_source::DEFAULT_TOPICS;
use crate::services::{speaker_from_config, WordSource};
use crate::utils::logging::log_session_summary;
use crate::workflow::{Judgement, Rejected, SessionController, SessionOptions};

/// 当前词库的来源，决定重新开始时如何处理
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOrigin {
    Builtin,
    File(PathBuf),
    Generated { topic: String, count: usize },
}

/// 当前界面
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Menu,
    AwaitTopic,
    AwaitCount { topic: String },
    AwaitPath,
    Practice,
    Completed,
}

/// 处理完一行输入后是否继续
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// 应用主结构
pub struct App {
    config: Config,
    word_source: WordSource,
    session: SessionController,
    screen: Screen,
    origin: Option<ListOrigin>,
    suggestions: Vec<String>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Self {
        let client: Option<Arc<dyn ChatClient>> = if config.llm_enabled() {
            Some(Arc::new(OpenAiChatClient::new(&config)))
        } else {
            warn!("⚠️ 未配置 LLM_API_KEY，AI 生成词库不可用");
            None
        };

        let word_source = WordSource::new(&config, client);
        let session = SessionController::new(SessionOptions::from_config(&config))
            .with_speaker(speaker_from_config(&config));

        Self::with_parts(config, word_source, session)
    }

    /// 使用已构造好的组件创建应用
    pub fn with_parts(config: Config, word_source: WordSource, session: SessionController) -> Self {
        Self {
            config,
            word_source,
            session,
            screen: Screen::Menu,
            origin: None,
            suggestions: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn origin(&self) -> Option<&ListOrigin> {
        self.origin.as_ref()
    }

    /// 运行应用主逻辑（标准输入输出）
    pub async fn run(&mut self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout();
        self.run_with_io(stdin, &mut stdout).await
    }

    /// 使用指定输入输出运行，直到输入结束或退出
    pub async fn run_with_io<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        self.render_menu(out)?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if self.handle_line(&line, out).await? == Flow::Quit {
                break;
            }
        }

        writeln!(out, "👋 再见")?;
        info!("程序结束");
        Ok(())
    }

    /// 处理一行输入
    pub async fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        match self.screen.clone() {
            Screen::Menu => self.handle_menu(line, out).await,
            Screen::AwaitTopic => self.handle_topic(line, out),
            Screen::AwaitCount { topic } => self.handle_count(&topic, line, out).await,
            Screen::AwaitPath => self.handle_path(line, out).await,
            Screen::Practice => self.handle_practice(line, out).await,
            Screen::Completed => self.handle_completed(line, out).await,
        }
    }

    // ========== 词库选择 ==========

    async fn handle_menu<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        match parse_menu_choice(line) {
            MenuChoice::Builtin => {
                let words = self.word_source.builtin_words();
                self.start_list(words, ListOrigin::Builtin, out)?;
            }
            MenuChoice::Generate => {
                if self.word_source.can_generate() {
                    self.screen = Screen::AwaitTopic;
                    self.render_topic_prompt(out)?;
                } else {
                    writeln!(out, "❌ 未配置 LLM_API_KEY，无法生成词库")?;
                    self.render_menu(out)?;
                }
            }
            MenuChoice::File => {
                self.screen = Screen::AwaitPath;
                writeln!(out, "请输入词库文件路径（直接回车返回）:")?;
            }
            MenuChoice::Suggest => {
                writeln!(out, "🤖 正在获取推荐场景...")?;
                self.suggestions = self.word_source.suggest_topics().await;
                self.screen = Screen::AwaitTopic;
                self.render_topic_prompt(out)?;
            }
            MenuChoice::Quit => return Ok(Flow::Quit),
            MenuChoice::Unknown => writeln!(out, "请输入 1-4 或 q")?,
        }
        Ok(Flow::Continue)
    }

    fn handle_topic<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        let input = line.trim();
        if input.is_empty() {
            self.screen = Screen::Menu;
            self.render_menu(out)?;
            return Ok(Flow::Continue);
        }

        // 输入编号时使用推荐场景
        let topic = input
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.suggestions.get(i).cloned())
            .unwrap_or_else(|| input.to_string());

        writeln!(
            out,
            "生成数量 (1-{}，回车默认 {}):",
            self.config.max_word_count, self.config.default_word_count
        )?;
        self.screen = Screen::AwaitCount { topic };
        Ok(Flow::Continue)
    }

    async fn handle_count<W: Write>(&mut self, topic: &str, line: &str, out: &mut W) -> Result<Flow> {
        let Some(count) = parse_count(line, self.config.default_word_count, self.config.max_word_count) else {
            writeln!(out, "请输入 1 到 {} 之间的数字", self.config.max_word_count)?;
            return Ok(Flow::Continue);
        };

        writeln!(out, "🤖 生成中...")?;
        match self.word_source.generate_words(topic, count).await {
            Ok(words) => {
                let origin = ListOrigin::Generated {
                    topic: topic.to_string(),
                    count,
                };
                self.start_list(words, origin, out)?;
            }
            Err(e) => {
                error!("生成词库失败: {}", e);
                writeln!(out, "❌ {}", e.user_message())?;
                self.screen = Screen::Menu;
                self.render_menu(out)?;
            }
        }
        Ok(Flow::Continue)
    }

    async fn handle_path<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        let input = line.trim();
        if input.is_empty() {
            self.screen = Screen::Menu;
            self.render_menu(out)?;
            return Ok(Flow::Continue);
        }

        let path = PathBuf::from(input);
        match self.word_source.load_file(&path).await {
            Ok(words) => self.start_list(words, ListOrigin::File(path), out)?,
            Err(e) => {
                warn!("加载词库文件失败: {}", e);
                writeln!(out, "❌ {}", e)?;
                self.screen = Screen::Menu;
                self.render_menu(out)?;
            }
        }
        Ok(Flow::Continue)
    }

    fn start_list<W: Write>(&mut self, words: WordList, origin: ListOrigin, out: &mut W) -> Result<()> {
        debug!("词库来源: {:?}", origin);
        writeln!(out, "开始练习，共 {} 个单词。输入 :h 查看命令", words.len())?;
        self.session.start(words);
        self.origin = Some(origin);
        self.screen = Screen::Practice;
        self.render_word(out)
    }

    // ========== 练习 ==========

    async fn handle_practice<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        match parse_command(line) {
            Command::Answer(text) => match self.session.submit(&text) {
                Ok(Judgement::Correct { completed }) => {
                    writeln!(out, "✅ 正确")?;
                    if completed {
                        self.on_completed(out)?;
                    } else {
                        self.render_word(out)?;
                    }
                }
                Ok(Judgement::Wrong {
                    wrong_parts,
                    hint_revealed,
                    ..
                }) => {
                    writeln!(out, "❌ {}", mark_wrong_parts(&text, &wrong_parts, self.expected_len()))?;
                    if hint_revealed {
                        self.render_hint(out)?;
                    }
                }
                Err(rejected) => self.render_rejected(rejected, out)?,
            },
            Command::ShowHint => match self.session.reveal_hint() {
                Ok(()) => self.render_hint(out)?,
                Err(rejected) => self.render_rejected(rejected, out)?,
            },
            Command::HideHint => {
                if self.session.hide_hint().is_ok() {
                    self.render_word(out)?;
                }
            }
            Command::Next => match self.session.advance() {
                Ok(true) => self.on_completed(out)?,
                Ok(false) => self.render_word(out)?,
                Err(rejected) => self.render_rejected(rejected, out)?,
            },
            Command::TogglePause => match self.session.toggle_pause() {
                Ok(true) => writeln!(out, "⏸️ 已暂停，输入 :p 继续")?,
                Ok(false) => self.render_word(out)?,
                Err(rejected) => self.render_rejected(rejected, out)?,
            },
            Command::Restart => self.restart(out).await?,
            Command::Menu => self.back_to_menu(out)?,
            Command::Help => writeln!(out, "{}", HELP_TEXT)?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn on_completed<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.screen = Screen::Completed;

        let stats = self.session.stats();
        let (_, total) = self.session.progress();
        log_session_summary(stats, total);

        writeln!(out, "🎉 全部完成！")?;
        writeln!(
            out,
            "答对 {}/{}，跳过 {}，答错 {} 次，查看答案 {} 次",
            stats.correct, total, stats.skipped, stats.wrong, stats.hints
        )?;
        writeln!(out, "回车/r 重新开始，m 切换词库，q 退出")?;
        Ok(())
    }

    async fn handle_completed<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        match parse_completion_choice(line) {
            CompletionChoice::Restart => self.restart(out).await?,
            CompletionChoice::Menu => self.back_to_menu(out)?,
            CompletionChoice::Quit => return Ok(Flow::Quit),
            CompletionChoice::Unknown => writeln!(out, "回车/r 重新开始，m 切换词库，q 退出")?,
        }
        Ok(Flow::Continue)
    }

    /// 重新开始
    ///
    /// 生成的词库在 `Regenerate` 策略下重新请求，失败时沿用当前词库打乱
    async fn restart<W: Write>(&mut self, out: &mut W) -> Result<()> {
        if self.config.restart_policy == RestartPolicy::Regenerate {
            if let Some(ListOrigin::Generated { topic, count }) = self.origin.clone() {
                writeln!(out, "🤖 正在重新生成词库...")?;
                match self.word_source.generate_words(&topic, count).await {
                    Ok(words) => {
                        return self.start_list(words, ListOrigin::Generated { topic, count }, out);
                    }
                    Err(e) => {
                        warn!("重新生成词库失败: {}", e);
                        writeln!(out, "❌ {}，沿用当前词库", e.user_message())?;
                    }
                }
            }
        }

        match self.session.restart(true) {
            Ok(()) => {
                self.screen = Screen::Practice;
                writeln!(out, "🔄 已打乱顺序，重新开始")?;
                self.render_word(out)
            }
            Err(_) => self.back_to_menu(out),
        }
    }

    fn back_to_menu<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.session.reset();
        self.origin = None;
        self.screen = Screen::Menu;
        self.render_menu(out)
    }

    fn expected_len(&self) -> usize {
        self.session
            .current()
            .map(|w| w.parts().len())
            .unwrap_or_default()
    }

    // ========== 输出 ==========

    fn render_menu<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "\n{}", "=".repeat(40))?;
        writeln!(out, "AI 超级单词表")?;
        writeln!(out, "{}", "=".repeat(40))?;
        writeln!(out, "1. 本地词库")?;
        if self.word_source.can_generate() {
            writeln!(out, "2. 自定义场景（AI 生成）")?;
        } else {
            writeln!(out, "2. 自定义场景（未配置 LLM_API_KEY）")?;
        }
        writeln!(out, "3. 从 TOML 文件加载")?;
        writeln!(out, "4. 获取推荐场景")?;
        writeln!(out, "q. 退出")?;
        Ok(())
    }

    fn render_topic_prompt<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "推荐场景:")?;
        for (i, topic) in self.suggestions.iter().enumerate() {
            writeln!(out, "  {}. {}", i + 1, topic)?;
        }
        writeln!(out, "请输入你想练习的场景或编号（直接回车返回）:")?;
        Ok(())
    }

    fn render_word<W: Write>(&self, out: &mut W) -> Result<()> {
        let Some(word) = self.session.current() else {
            return Ok(());
        };
        let (done, total) = self.session.progress();
        writeln!(out, "\n进度: {} / {}", done + 1, total)?;
        writeln!(out, "📖 {}", word.chinese())?;
        if self.session.state().is_some_and(|s| s.hint_visible) {
            self.render_hint(out)?;
        }
        Ok(())
    }

    fn render_hint<W: Write>(&self, out: &mut W) -> Result<()> {
        if let Some(word) = self.session.current() {
            if word.soundmark().is_empty() {
                writeln!(out, "💡 {}", word.english())?;
            } else {
                writeln!(out, "💡 {} {}", word.english(), word.soundmark())?;
            }
        }
        Ok(())
    }

    fn render_rejected<W: Write>(&self, rejected: Rejected, out: &mut W) -> Result<()> {
        match rejected {
            Rejected::Paused => writeln!(out, "⏸️ 已暂停，输入 :p 继续")?,
            Rejected::Completed => writeln!(out, "本轮已完成")?,
            Rejected::NotStarted => writeln!(out, "尚未开始练习")?,
        }
        Ok(())
    }
}

/// 标出答错的部分，例如 `thank [yuo]`
fn mark_wrong_parts(answer: &str, wrong_parts: &[usize], expected_len: usize) -> String {
    let typed: Vec<&str> = answer.trim().split(' ').collect();
    let len = expected_len.max(typed.len());
    (0..len)
        .map(|i| {
            let part = typed.get(i).copied().filter(|p| !p.is_empty()).unwrap_or("_");
            if wrong_parts.contains(&i) {
                format!("[{}]", part)
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::clients::ChatRequest;
    use crate::workflow::SessionPhase;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct FixedClient {
        reply: Result<Option<String>, ServiceError>,
    }

    #[async_trait]
    impl ChatClient for FixedClient {
        async fn complete(&self, _request: ChatRequest) -> Result<Option<String>, ServiceError> {
            self.reply.clone()
        }
    }

    /// 按顺序返回预设回复，用完后返回空
    struct SequenceClient {
        replies: Mutex<VecDeque<Result<Option<String>, ServiceError>>>,
    }

    #[async_trait]
    impl ChatClient for SequenceClient {
        async fn complete(&self, _request: ChatRequest) -> Result<Option<String>, ServiceError> {
            self.replies.lock().unwrap().pop_front().unwrap_or(Ok(None))
        }
    }

    fn app_with_reply(reply: Result<Option<String>, ServiceError>, config: Config) -> App {
        let word_source = WordSource::new(&config, Some(Arc::new(FixedClient { reply })));
        App::with_parts(config, word_source, SessionController::default())
    }

    async fn feed(app: &mut App, lines: &[&str]) -> String {
        let mut out = Vec::new();
        for line in lines {
            app.handle_line(line, &mut out).await.unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_generate_practice_and_restart() {
        let mut app = app_with_reply(Ok(Some("coffee|咖啡\ntea|茶".to_string())), Config::default());

        let output = feed(&mut app, &["2", "coffee shop", "2"]).await;
        assert!(output.contains("📖 咖啡"));
        assert_eq!(app.screen(), &Screen::Practice);
        assert_eq!(
            app.origin(),
            Some(&ListOrigin::Generated {
                topic: "coffee shop".to_string(),
                count: 2
            })
        );

        let output = feed(&mut app, &["coffee", "tea"]).await;
        assert!(output.contains("🎉 全部完成"));
        assert_eq!(app.screen(), &Screen::Completed);

        feed(&mut app, &["r"]).await;
        assert_eq!(app.screen(), &Screen::Practice);
        assert_eq!(app.session().current().map(|w| w.english()), Some("coffee"));
    }

    #[tokio::test]
    async fn test_generation_failure_returns_to_menu() {
        let mut app = app_with_reply(Err(ServiceError::Unauthorized), Config::default());

        let output = feed(&mut app, &["2", "hotel", ""]).await;
        assert!(output.contains("API 密钥无效"));
        assert_eq!(app.screen(), &Screen::Menu);
        assert_eq!(app.session().phase(), SessionPhase::NotStarted);
    }

    #[tokio::test]
    async fn test_suggested_topic_by_number() {
        let mut app = app_with_reply(Ok(Some("在咖啡店点单\n在机场办理登机".to_string())), Config::default());

        let output = feed(&mut app, &["4", "2"]).await;
        assert!(output.contains("2. 在机场办理登机"));
        assert_eq!(
            app.screen(),
            &Screen::AwaitCount {
                topic: "在机场办理登机".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_regenerate_policy_requests_new_list() {
        let config = Config {
            restart_policy: RestartPolicy::Regenerate,
            ..Config::default()
        };
        let mut app = app_with_reply(Ok(Some("coffee|咖啡".to_string())), config);

        feed(&mut app, &["2", "coffee", "1", "coffee"]).await;
        assert_eq!(app.screen(), &Screen::Completed);

        let output = feed(&mut app, &[""]).await;
        assert!(output.contains("正在重新生成词库"));
        assert_eq!(app.screen(), &Screen::Practice);
    }

    #[tokio::test]
    async fn test_regenerate_failure_reshuffles_current_list() {
        let config = Config {
            restart_policy: RestartPolicy::Regenerate,
            ..Config::default()
        };
        let client = SequenceClient {
            replies: Mutex::new(VecDeque::from(vec![
                Ok(Some("coffee|咖啡\ntea|茶".to_string())),
                Err(ServiceError::Timeout),
            ])),
        };
        let word_source = WordSource::new(&config, Some(Arc::new(client)));
        let mut app = App::with_parts(config, word_source, SessionController::default());

        feed(&mut app, &["2", "coffee", "2", "coffee", "tea"]).await;
        assert_eq!(app.screen(), &Screen::Completed);

        let output = feed(&mut app, &["r"]).await;
        assert!(output.contains("请求超时"));
        assert!(output.contains("沿用当前词库"));
        assert_eq!(app.screen(), &Screen::Practice);
        assert_eq!(app.session().phase(), SessionPhase::Practicing);
        assert_eq!(app.session().progress(), (0, 2));
        assert_eq!(app.session().current().map(|w| w.english()), Some("coffee"));
    }

    #[tokio::test]
    async fn test_empty_line_counts_as_wrong() {
        let mut app = app_with_reply(Ok(None), Config::default());
        feed(&mut app, &["1"]).await;

        let output = feed(&mut app, &["", ""]).await;
        assert!(output.contains("❌ [_]"));
        assert_eq!(app.session().stats().wrong, 2);
        assert!(!app.session().state().unwrap().hint_visible);

        let output = feed(&mut app, &[""]).await;
        assert!(output.contains("💡 hello"));
        assert_eq!(app.session().progress().0, 0);
    }

    #[tokio::test]
    async fn test_practice_commands() {
        let mut app = app_with_reply(Ok(None), Config::default());

        feed(&mut app, &["1"]).await;
        let output = feed(&mut app, &[":k", ":p", "hello"]).await;
        assert!(output.contains("💡 hello /həˈləʊ/"));
        assert!(output.contains("已暂停"));
        assert_eq!(app.session().progress().0, 0);

        let output = feed(&mut app, &[":p", ":n", "wrold"]).await;
        assert!(output.contains("❌ [wrold]"));
        assert_eq!(app.session().progress().0, 1);

        feed(&mut app, &[":m"]).await;
        assert_eq!(app.screen(), &Screen::Menu);
        assert!(app.origin().is_none());
    }

    #[tokio::test]
    async fn test_run_with_io_until_quit() {
        let mut app = app_with_reply(Ok(None), Config::default());
        let input: &[u8] = "1\nhello\n:q\nworld\n".as_bytes();
        let mut out = Vec::new();

        app.run_with_io(input, &mut out).await.unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("✅ 正确"));
        assert!(output.ends_with("👋 再见\n"));
        assert_eq!(app.session().progress().0, 1);
    }

    #[test]
    fn test_mark_wrong_parts() {
        assert_eq!(mark_wrong_parts("thank yuo", &[1], 2), "thank [yuo]");
        assert_eq!(mark_wrong_parts("thank", &[1], 2), "thank [_]");
        assert_eq!(mark_wrong_parts("", &[0], 1), "[_]");
    }
}
