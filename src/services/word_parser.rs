//! LLM 回复解析
//!
//! 支持两种格式：
//! - 每行 `英文|中文`，可选第三列音标 `英文|中文|音标`
//! - JSON 对象 `{"words": [{"english": .., "chinese": .., "soundmark": ..}]}`
//!
//! 任何一项缺少英文或中文都会让整次解析失败

use rand::Rng;
use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::OnceLock;

use crate::error::WordSourceError;
use crate::models::WordEntry;
use crate::utils::logging::truncate_text;

/// 行首编号或列表符号，如 `1. `、`2、`、`- `
pub(crate) fn list_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"^\s*(?:\d+\s*[.、:：)\]]\s*|[-*•]\s+)").expect("列表符号正则不合法")
    })
}

/// 解析 LLM 回复
pub fn parse_reply(reply: &str) -> Result<Vec<WordEntry>, WordSourceError> {
    let body = strip_code_fences(reply);
    if body.is_empty() {
        return Err(WordSourceError::EmptyResponse);
    }

    if body.starts_with('{') {
        parse_json(&body)
    } else {
        parse_lines(&body)
    }
}

/// 去掉 ``` 代码块标记行
fn strip_code_fences(reply: &str) -> String {
    reply
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn parse_lines(body: &str) -> Result<Vec<WordEntry>, WordSourceError> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Result<WordEntry, WordSourceError> {
    let cleaned = list_marker().replace(line, "");
    let mut fields = cleaned.split(['|', '｜']).map(str::trim);

    let english = fields.next().unwrap_or_default();
    let chinese = fields.next().unwrap_or_default();
    let soundmark = fields.next().unwrap_or_default();

    WordEntry::new(english, chinese, soundmark).map_err(|_| WordSourceError::MalformedEntry {
        line: line.to_string(),
    })
}

fn parse_json(body: &str) -> Result<Vec<WordEntry>, WordSourceError> {
    let value: JsonValue =
        serde_json::from_str(body).map_err(|_| WordSourceError::MalformedEntry {
            line: truncate_text(body, 80),
        })?;

    let items = value
        .get("words")
        .and_then(|words| words.as_array())
        .ok_or_else(|| WordSourceError::MalformedEntry {
            line: truncate_text(body, 80),
        })?;

    items
        .iter()
        .map(|item| {
            let field = |name: &str| item.get(name).and_then(|v| v.as_str()).unwrap_or_default();
            WordEntry::new(field("english"), field("chinese"), field("soundmark")).map_err(|_| {
                WordSourceError::MalformedEntry {
                    line: item.to_string(),
                }
            })
        })
        .collect()
}

/// 按请求数量整理解析结果
///
/// 不足时报错；多出时随机抽取 `count` 个，保持原有相对顺序
pub fn fit_to_count<R: Rng + ?Sized>(
    entries: Vec<WordEntry>,
    count: usize,
    rng: &mut R,
) -> Result<Vec<WordEntry>, WordSourceError> {
    if entries.len() < count {
        return Err(WordSourceError::CountMismatch {
            expected: count,
            actual: entries.len(),
        });
    }
    if entries.len() == count {
        return Ok(entries);
    }

    let mut picked = rand::seq::index::sample(rng, entries.len(), count).into_vec();
    picked.sort_unstable();

    let mut slots: Vec<Option<WordEntry>> = entries.into_iter().map(Some).collect();
    Ok(picked
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect())
}
