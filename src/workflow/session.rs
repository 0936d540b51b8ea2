//! 练习会话控制器 - 流程层
//!
//! 核心职责：持有当前词库和练习进度，响应输入事件推进状态
//!
//! 状态流转：
//!
//! ```text
//! NotStarted → Practicing ⇄ Paused
//!                  ↓
//!              Completed → (restart) → Practicing
//! ```

use chrono::{DateTime, Local};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{Config, ManualHintPolicy};
use crate::models::{WordEntry, WordList};
use crate::services::{SilentSpeaker, Speaker};
use crate::workflow::shuffle::reshuffle;

/// 会话所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    Practicing,
    Paused,
    Completed,
}

/// 操作被拒绝的原因（状态不变）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    NotStarted,
    Paused,
    Completed,
}

/// 一次作答的判定结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Judgement {
    /// 答对并前进到下一个单词
    Correct { completed: bool },
    /// 答错
    Wrong {
        /// 按空格拆分后答错的部分下标
        wrong_parts: Vec<usize>,
        /// 本次是否因连续答错而自动显示答案
        hint_revealed: bool,
        /// 当前连续答错次数（显示答案后归零）
        wrong_streak: u32,
    },
}

/// 会话选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// 连续答错多少次后自动显示答案
    pub hint_threshold: u32,
    pub manual_hint_policy: ManualHintPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            hint_threshold: 3,
            manual_hint_policy: ManualHintPolicy::ResetStreak,
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            hint_threshold: config.hint_threshold.max(1),
            manual_hint_policy: config.manual_hint_policy,
        }
    }
}

/// 练习状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub words: WordList,
    /// 当前单词下标，完成时等于词库长度
    pub index: usize,
    pub wrong_streak: u32,
    pub hint_visible: bool,
    pub paused: bool,
    pub completed: bool,
}

/// 本轮练习统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    pub correct: usize,
    pub wrong: usize,
    pub skipped: usize,
    pub hints: usize,
    pub started_at: DateTime<Local>,
}

impl SessionStats {
    fn new() -> Self {
        Self {
            correct: 0,
            wrong: 0,
            skipped: 0,
            hints: 0,
            started_at: Local::now(),
        }
    }
}

/// 练习会话控制器
///
/// - 唯一持有并修改 `SessionState`
/// - 不做任何网络请求，词库由调用方准备好
/// - 发音只调用不等待
pub struct SessionController {
    state: Option<SessionState>,
    stats: SessionStats,
    options: SessionOptions,
    speaker: Arc<dyn Speaker>,
}

impl SessionController {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            state: None,
            stats: SessionStats::new(),
            options,
            speaker: Arc::new(SilentSpeaker),
        }
    }

    pub fn with_speaker(mut self, speaker: Arc<dyn Speaker>) -> Self {
        self.speaker = speaker;
        self
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    // ========== 查询 ==========

    pub fn phase(&self) -> SessionPhase {
        match &self.state {
            None => SessionPhase::NotStarted,
            Some(state) if state.completed => SessionPhase::Completed,
            Some(state) if state.paused => SessionPhase::Paused,
            Some(_) => SessionPhase::Practicing,
        }
    }

    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// 当前需要输入的单词，完成后为 None
    pub fn current(&self) -> Option<&WordEntry> {
        self.state
            .as_ref()
            .filter(|state| !state.completed)
            .and_then(|state| state.words.get(state.index))
    }

    /// (已完成数, 总数)
    pub fn progress(&self) -> (usize, usize) {
        self.state
            .as_ref()
            .map(|state| (state.index, state.words.len()))
            .unwrap_or((0, 0))
    }

    /// 最近练习到的单词：进行中为当前单词，完成后为最后一个
    pub fn last_practiced(&self) -> Option<&WordEntry> {
        self.state
            .as_ref()
            .and_then(|state| state.words.get(state.index.min(state.words.len() - 1)))
    }

    // ========== 操作 ==========

    /// 开始练习，重置全部进度
    pub fn start(&mut self, words: WordList) {
        info!("▶️ 开始练习，共 {} 个单词", words.len());
        self.state = Some(SessionState {
            words,
            index: 0,
            wrong_streak: 0,
            hint_visible: false,
            paused: false,
            completed: false,
        });
        self.stats = SessionStats::new();
        self.speak_current();
    }

    /// 用原始单词开始练习，为空时不做任何事
    pub fn start_entries(&mut self, entries: Vec<WordEntry>) -> bool {
        match WordList::new(entries) {
            Ok(words) => {
                self.start(words);
                true
            }
            Err(_) => {
                debug!("词库为空，忽略开始请求");
                false
            }
        }
    }

    /// 提交一次输入
    ///
    /// 去掉两端空白后与英文完全比对（区分大小写，保留中间空格）
    pub fn submit(&mut self, input: &str) -> Result<Judgement, Rejected> {
        let threshold = self.options.hint_threshold;
        let state = self.active_state()?;

        let answer = input.trim();
        let expected = state
            .words
            .get(state.index)
            .map(|w| w.english().trim().to_string())
            .unwrap_or_default();

        if answer == expected {
            self.stats.correct += 1;
            let completed = self.move_next();
            return Ok(Judgement::Correct { completed });
        }

        let state = self.active_state()?;
        state.wrong_streak += 1;
        let mut hint_revealed = false;
        if state.wrong_streak >= threshold {
            state.hint_visible = true;
            state.wrong_streak = 0;
            hint_revealed = true;
        }
        let wrong_streak = state.wrong_streak;

        self.stats.wrong += 1;
        if hint_revealed {
            self.stats.hints += 1;
            debug!("连续答错 {} 次，显示答案", threshold);
        }

        Ok(Judgement::Wrong {
            wrong_parts: wrong_parts(answer, &expected),
            hint_revealed,
            wrong_streak,
        })
    }

    /// 跳过当前单词
    ///
    /// 返回是否因此完成本轮
    pub fn advance(&mut self) -> Result<bool, Rejected> {
        self.active_state()?;
        self.stats.skipped += 1;
        Ok(self.move_next())
    }

    /// 手动显示答案
    pub fn reveal_hint(&mut self) -> Result<(), Rejected> {
        let policy = self.options.manual_hint_policy;
        let state = self.current_state()?;
        let newly_shown = !state.hint_visible;
        state.hint_visible = true;
        if policy == ManualHintPolicy::ResetStreak {
            state.wrong_streak = 0;
        }
        if newly_shown {
            self.stats.hints += 1;
        }
        Ok(())
    }

    /// 隐藏答案
    pub fn hide_hint(&mut self) -> Result<(), Rejected> {
        self.current_state()?.hint_visible = false;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), Rejected> {
        self.active_state()?.paused = true;
        info!("⏸️ 已暂停");
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), Rejected> {
        let state = self.state.as_mut().ok_or(Rejected::NotStarted)?;
        if state.completed {
            return Err(Rejected::Completed);
        }
        state.paused = false;
        info!("▶️ 继续练习");
        Ok(())
    }

    pub fn toggle_pause(&mut self) -> Result<bool, Rejected> {
        match self.phase() {
            SessionPhase::Paused => self.resume().map(|_| false),
            _ => self.pause().map(|_| true),
        }
    }

    /// 重新开始本轮
    pub fn restart(&mut self, reshuffle: bool) -> Result<(), Rejected> {
        self.restart_with_rng(reshuffle, &mut rand::thread_rng())
    }

    /// 同 `restart`，使用指定随机源
    pub fn restart_with_rng<R: Rng + ?Sized>(
        &mut self,
        shuffle: bool,
        rng: &mut R,
    ) -> Result<(), Rejected> {
        let last = self.last_practiced().map(|w| w.english().to_string());
        let state = self.state.as_mut().ok_or(Rejected::NotStarted)?;

        if shuffle {
            reshuffle(state.words.as_mut_slice(), last.as_deref(), rng);
        }
        state.index = 0;
        state.completed = false;
        state.wrong_streak = 0;
        state.hint_visible = false;
        state.paused = false;

        self.stats = SessionStats::new();
        info!("🔄 重新开始{}", if shuffle { "（已打乱顺序）" } else { "" });
        self.speak_current();
        Ok(())
    }

    /// 回到选择词库，丢弃当前会话
    pub fn reset(&mut self) {
        self.state = None;
        self.stats = SessionStats::new();
    }

    // ========== 内部方法 ==========

    /// 可以作答的状态：已开始、未暂停、未完成
    fn active_state(&mut self) -> Result<&mut SessionState, Rejected> {
        let state = self.state.as_mut().ok_or(Rejected::NotStarted)?;
        if state.completed {
            return Err(Rejected::Completed);
        }
        if state.paused {
            return Err(Rejected::Paused);
        }
        Ok(state)
    }

    /// 有当前单词的状态（暂停时也可以查看答案）
    fn current_state(&mut self) -> Result<&mut SessionState, Rejected> {
        let state = self.state.as_mut().ok_or(Rejected::NotStarted)?;
        if state.completed {
            return Err(Rejected::Completed);
        }
        Ok(state)
    }

    /// 前进一个单词，返回是否完成
    fn move_next(&mut self) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };

        state.index += 1;
        state.wrong_streak = 0;
        state.hint_visible = false;

        if state.index >= state.words.len() {
            state.index = state.words.len();
            state.completed = true;
            info!("🎉 本轮练习完成");
            return true;
        }

        self.speak_current();
        false
    }

    fn speak_current(&self) {
        if let Some(word) = self.current() {
            self.speaker.speak(word.english());
        }
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

/// 按空格逐段比对，返回答错的段下标
fn wrong_parts(answer: &str, expected: &str) -> Vec<usize> {
    let typed: Vec<&str> = answer.split(' ').collect();
    expected
        .split(' ')
        .enumerate()
        .filter(|(i, part)| typed.get(*i) != Some(part))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Mutex;

    /// 记录所有朗读内容
    #[derive(Default)]
    struct RecordingSpeaker {
        spoken: Mutex<Vec<String>>,
    }

    impl Speaker for RecordingSpeaker {
        fn speak(&self, text: &str) {
            self.spoken.lock().unwrap().push(text.to_string());
        }
    }

    fn words(names: &[&str]) -> WordList {
        WordList::new(
            names
                .iter()
                .map(|n| WordEntry::new(*n, "释义", "").unwrap())
                .collect(),
        )
        .unwrap()
    }

    fn started(names: &[&str]) -> SessionController {
        let mut session = SessionController::default();
        session.start(words(names));
        session
    }

    #[test]
    fn test_start_resets_everything() {
        let mut session = started(&["hello", "world"]);
        session.submit("hello").unwrap();
        session.submit("nope").unwrap();

        session.start(words(&["a", "b", "c"]));
        let state = session.state().unwrap();
        assert_eq!(state.index, 0);
        assert_eq!(state.wrong_streak, 0);
        assert!(!state.completed && !state.hint_visible && !state.paused);
        assert_eq!(session.phase(), SessionPhase::Practicing);
        assert_eq!(session.stats().correct, 0);
    }

    #[test]
    fn test_start_entries_ignores_empty() {
        let mut session = SessionController::default();
        assert!(!session.start_entries(Vec::new()));
        assert_eq!(session.phase(), SessionPhase::NotStarted);
    }

    #[test]
    fn test_hello_world_walkthrough() {
        let mut session = started(&["hello", "world"]);

        assert_eq!(
            session.submit("hello"),
            Ok(Judgement::Correct { completed: false })
        );
        assert_eq!(session.progress(), (1, 2));

        assert_eq!(
            session.submit("  world "),
            Ok(Judgement::Correct { completed: true })
        );
        let state = session.state().unwrap();
        assert_eq!(state.index, 2);
        assert!(state.completed);
        assert_eq!(session.phase(), SessionPhase::Completed);
        assert!(session.current().is_none());
    }

    #[test]
    fn test_match_is_case_and_space_sensitive() {
        let mut session = started(&["check in"]);
        assert!(matches!(session.submit("Check in"), Ok(Judgement::Wrong { .. })));
        assert!(matches!(session.submit("check  in"), Ok(Judgement::Wrong { .. })));
        assert_eq!(
            session.submit("check in"),
            Ok(Judgement::Correct { completed: true })
        );
    }

    #[test]
    fn test_correct_answer_never_increases_streak() {
        let mut session = started(&["a", "b", "c"]);
        session.submit("x").unwrap();
        assert_eq!(session.state().unwrap().wrong_streak, 1);

        session.submit("a").unwrap();
        let state = session.state().unwrap();
        assert_eq!(state.index, 1);
        assert_eq!(state.wrong_streak, 0);
    }

    #[test]
    fn test_three_wrong_answers_reveal_hint() {
        let mut session = started(&["apple", "pear"]);

        for expected_streak in 1..=2 {
            match session.submit("apply").unwrap() {
                Judgement::Wrong {
                    hint_revealed,
                    wrong_streak,
                    ..
                } => {
                    assert!(!hint_revealed);
                    assert_eq!(wrong_streak, expected_streak);
                }
                other => panic!("unexpected {:?}", other),
            }
        }

        match session.submit("apply").unwrap() {
            Judgement::Wrong {
                hint_revealed,
                wrong_streak,
                ..
            } => {
                assert!(hint_revealed);
                assert_eq!(wrong_streak, 0);
            }
            other => panic!("unexpected {:?}", other),
        }

        let state = session.state().unwrap();
        assert!(state.hint_visible);
        assert_eq!(state.wrong_streak, 0);
        assert_eq!(state.index, 0);

        // 答对后清除提示
        session.submit("apple").unwrap();
        assert!(!session.state().unwrap().hint_visible);
    }

    #[test]
    fn test_custom_hint_threshold() {
        let mut session = SessionController::new(SessionOptions {
            hint_threshold: 1,
            ..SessionOptions::default()
        });
        session.start(words(&["a"]));
        assert!(matches!(
            session.submit("b"),
            Ok(Judgement::Wrong {
                hint_revealed: true,
                ..
            })
        ));
    }

    #[test]
    fn test_wrong_parts_marks_phrase_words() {
        let mut session = started(&["thank you very much"]);
        match session.submit("thank yuo very").unwrap() {
            Judgement::Wrong { wrong_parts, .. } => assert_eq!(wrong_parts, vec![1, 3]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_manual_hint_policies() {
        let mut session = started(&["a", "b"]);
        session.submit("x").unwrap();
        session.submit("x").unwrap();
        session.reveal_hint().unwrap();
        let state = session.state().unwrap();
        assert!(state.hint_visible);
        assert_eq!(state.wrong_streak, 0);

        let mut keep = SessionController::new(SessionOptions {
            manual_hint_policy: ManualHintPolicy::KeepStreak,
            ..SessionOptions::default()
        });
        keep.start(words(&["a", "b"]));
        keep.submit("x").unwrap();
        keep.submit("x").unwrap();
        keep.reveal_hint().unwrap();
        assert_eq!(keep.state().unwrap().wrong_streak, 2);

        keep.hide_hint().unwrap();
        assert!(!keep.state().unwrap().hint_visible);
    }

    #[test]
    fn test_advance_skips_and_completes_once() {
        let mut session = started(&["a", "b"]);
        assert_eq!(session.advance(), Ok(false));
        assert_eq!(session.advance(), Ok(true));
        assert_eq!(session.advance(), Err(Rejected::Completed));
        assert_eq!(session.submit("b"), Err(Rejected::Completed));
        assert_eq!(session.state().unwrap().index, 2);
        assert_eq!(session.stats().skipped, 2);
    }

    #[test]
    fn test_pause_rejects_input() {
        let mut session = started(&["a", "b"]);
        session.pause().unwrap();
        assert_eq!(session.phase(), SessionPhase::Paused);

        let before = session.state().cloned();
        assert_eq!(session.submit("a"), Err(Rejected::Paused));
        assert_eq!(session.advance(), Err(Rejected::Paused));
        assert_eq!(session.state().cloned(), before);

        session.resume().unwrap();
        assert_eq!(session.phase(), SessionPhase::Practicing);
        assert_eq!(session.toggle_pause(), Ok(true));
        assert_eq!(session.toggle_pause(), Ok(false));
        assert_eq!(session.submit("a"), Ok(Judgement::Correct { completed: false }));
    }

    #[test]
    fn test_not_started_rejects_everything() {
        let mut session = SessionController::default();
        assert_eq!(session.submit("a"), Err(Rejected::NotStarted));
        assert_eq!(session.advance(), Err(Rejected::NotStarted));
        assert_eq!(session.reveal_hint(), Err(Rejected::NotStarted));
        assert_eq!(session.pause(), Err(Rejected::NotStarted));
        assert_eq!(session.restart(true), Err(Rejected::NotStarted));
        assert_eq!(session.progress(), (0, 0));
    }

    #[test]
    fn test_restart_without_shuffle_keeps_order() {
        let mut session = started(&["a", "b", "c"]);
        session.advance().unwrap();
        session.submit("x").unwrap();
        session.restart(false).unwrap();

        let state = session.state().unwrap();
        assert_eq!(state.index, 0);
        assert_eq!(state.wrong_streak, 0);
        assert_eq!(session.current().map(|w| w.english()), Some("a"));
        assert_eq!(session.stats().skipped, 0);
    }

    #[test]
    fn test_restart_reshuffle_avoids_last_word() {
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut session = started(&["a", "b", "c", "d"]);
            while session.advance() == Ok(false) {}
            assert_eq!(session.last_practiced().map(|w| w.english()), Some("d"));

            session.restart_with_rng(true, &mut rng).unwrap();
            assert_eq!(session.phase(), SessionPhase::Practicing);
            assert_ne!(session.current().map(|w| w.english()), Some("d"));
        }
    }

    #[test]
    fn test_speaker_called_on_new_words() {
        let speaker = Arc::new(RecordingSpeaker::default());
        let mut session = SessionController::default().with_speaker(speaker.clone());

        session.start(words(&["hello", "world"]));
        session.submit("hello").unwrap();
        session.submit("wrong").unwrap();
        session.submit("world").unwrap();

        assert_eq!(
            *speaker.spoken.lock().unwrap(),
            vec!["hello".to_string(), "world".to_string()]
        );
    }
}
