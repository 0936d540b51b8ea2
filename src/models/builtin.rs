//! 内置词库
//!
//! 基础常用词汇，适合日常学习，不依赖网络

use super::word::{WordEntry, WordList};

/// (英文, 中文, 音标)
pub const BUILTIN_WORDS: &[(&str, &str, &str)] = &[
    ("hello", "你好", "/həˈləʊ/"),
    ("world", "世界", "/wɜːld/"),
    // 水果
    ("apple", "苹果", "/ˈæpl/"),
    ("banana", "香蕉", "/bəˈnɑːnə/"),
    ("orange", "橙子", "/ˈɒrɪndʒ/"),
    ("grape", "葡萄", "/ɡreɪp/"),
    ("watermelon", "西瓜", "/ˈwɔːtəmelən/"),
    // 日常用品
    ("book", "书", "/bʊk/"),
    ("pen", "笔", "/pen/"),
    ("table", "桌子", "/ˈteɪbl/"),
    ("chair", "椅子", "/tʃeə/"),
    ("phone", "电话", "/fəʊn/"),
    // 人物
    ("student", "学生", "/ˈstjuːdnt/"),
    ("teacher", "老师", "/ˈtiːtʃə/"),
    ("friend", "朋友", "/frend/"),
    ("family", "家庭", "/ˈfæmɪli/"),
    ("school", "学校", "/skuːl/"),
    // 颜色
    ("red", "红色", "/red/"),
    ("blue", "蓝色", "/bluː/"),
    ("green", "绿色", "/ɡriːn/"),
    // 动物
    ("cat", "猫", "/kæt/"),
    ("dog", "狗", "/dɒɡ/"),
    ("bird", "鸟", "/bɜːd/"),
    // 短语
    ("good morning", "早上好", "/ɡʊd ˈmɔːnɪŋ/"),
    ("thank you", "谢谢你", "/θæŋk juː/"),
    ("check in", "办理入住", "/tʃek ɪn/"),
];

/// 获取内置词库
pub fn builtin_words() -> WordList {
    let words = BUILTIN_WORDS
        .iter()
        .filter_map(|(english, chinese, soundmark)| {
            WordEntry::new(*english, *chinese, *soundmark).ok()
        })
        .collect();
    // 常量表非空且每项合法，见下方测试
    WordList::new(words).unwrap_or_else(|_| unreachable!("内置词库不能为空"))
}
