//! 从 TOML 文件加载自定义词库
//!
//! 文件格式：
//!
//! ```toml
//! name = "咖啡店"
//!
//! [[words]]
//! english = "latte"
//! chinese = "拿铁"
//! soundmark = "/ˈlɑːteɪ/"
//! ```

use serde::Deserialize;
use std::path::Path;
use tokio::fs;

use crate::error::{FileError, WordError};
use crate::models::word::{WordEntry, WordList};

#[derive(Debug, Deserialize)]
struct WordListFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    words: Vec<RawEntry>,
}

/// 先按宽松结构读入，再逐项校验，便于报告是哪一项出错
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    english: String,
    #[serde(default)]
    chinese: String,
    #[serde(default)]
    soundmark: String,
}

/// 解析 TOML 文本为词库
///
/// 返回 (词库名称, 词库)
pub fn parse_word_list(content: &str, path: &str) -> Result<(Option<String>, WordList), FileError> {
    let file: WordListFile = toml::from_str(content).map_err(|source| FileError::TomlParseFailed {
        path: path.to_string(),
        source,
    })?;

    let words = file
        .words
        .into_iter()
        .map(|raw| WordEntry::new(raw.english, raw.chinese, raw.soundmark))
        .collect::<Result<Vec<_>, WordError>>()
        .and_then(WordList::new)
        .map_err(|source| FileError::InvalidWords {
            path: path.to_string(),
            source,
        })?;

    Ok((file.name, words))
}

/// 从 TOML 文件加载词库
pub async fn load_word_list(path: &Path) -> Result<(Option<String>, WordList), FileError> {
    let path_str = path.display().to_string();

    if !fs::try_exists(path).await.unwrap_or(false) {
        return Err(FileError::NotFound { path: path_str });
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|source| FileError::ReadFailed {
            path: path_str.clone(),
            source,
        })?;

    let (name, words) = parse_word_list(&content, &path_str)?;
    tracing::info!("成功加载词库 {}，共 {} 个单词", path_str, words.len());

    Ok((name, words))
}
