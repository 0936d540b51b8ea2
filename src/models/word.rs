use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WordError;

/// 一个练习单元：英文、中文释义、音标
///
/// 构造后不可修改，英文与中文保证非空
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawWordEntry")]
pub struct WordEntry {
    english: String,
    chinese: String,
    soundmark: String,
}

/// 反序列化时的原始形态，校验后转为 `WordEntry`
#[derive(Deserialize)]
struct RawWordEntry {
    #[serde(default)]
    english: String,
    #[serde(default)]
    chinese: String,
    #[serde(default)]
    soundmark: String,
}

impl TryFrom<RawWordEntry> for WordEntry {
    type Error = WordError;

    fn try_from(raw: RawWordEntry) -> Result<Self, Self::Error> {
        WordEntry::new(raw.english, raw.chinese, raw.soundmark)
    }
}

impl WordEntry {
    /// 创建单词，两端空白会被去掉
    pub fn new(
        english: impl Into<String>,
        chinese: impl Into<String>,
        soundmark: impl Into<String>,
    ) -> Result<Self, WordError> {
        let english = english.into().trim().to_string();
        let chinese = chinese.into().trim().to_string();
        let soundmark = soundmark.into().trim().to_string();

        if english.is_empty() {
            return Err(WordError::EmptyEnglish);
        }
        if chinese.is_empty() {
            return Err(WordError::EmptyChinese { english });
        }

        Ok(Self {
            english,
            chinese,
            soundmark,
        })
    }

    pub fn english(&self) -> &str {
        &self.english
    }

    pub fn chinese(&self) -> &str {
        &self.chinese
    }

    /// 音标，可能为空
    pub fn soundmark(&self) -> &str {
        &self.soundmark
    }

    /// 按空格拆分的英文部分（短语逐词比对用）
    pub fn parts(&self) -> Vec<&str> {
        self.english.split(' ').collect()
    }
}

impl fmt::Display for WordEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.soundmark.is_empty() {
            write!(f, "{} {}", self.english, self.chinese)
        } else {
            write!(f, "{} {} {}", self.english, self.soundmark, self.chinese)
        }
    }
}

/// 一次练习使用的有序词库，保证非空
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<WordEntry>", into = "Vec<WordEntry>")]
pub struct WordList {
    words: Vec<WordEntry>,
}

impl TryFrom<Vec<WordEntry>> for WordList {
    type Error = WordError;

    fn try_from(words: Vec<WordEntry>) -> Result<Self, Self::Error> {
        WordList::new(words)
    }
}

impl From<WordList> for Vec<WordEntry> {
    fn from(list: WordList) -> Self {
        list.words
    }
}

impl WordList {
    pub fn new(words: Vec<WordEntry>) -> Result<Self, WordError> {
        if words.is_empty() {
            return Err(WordError::EmptyList);
        }
        Ok(Self { words })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// 词库是否为空（构造时已保证非空）
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WordEntry> {
        self.words.get(index)
    }

    pub fn first(&self) -> &WordEntry {
        &self.words[0]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WordEntry> {
        self.words.iter()
    }

    /// 供洗牌使用，长度不会改变所以不破坏非空保证
    pub(crate) fn as_mut_slice(&mut self) -> &mut [WordEntry] {
        &mut self.words
    }
}

impl<'a> IntoIterator for &'a WordList {
    type Item = &'a WordEntry;
    type IntoIter = std::slice::Iter<'a, WordEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.words.iter()
    }
}
