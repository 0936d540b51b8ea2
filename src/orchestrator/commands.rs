//! 终端输入解析
//!
//! 练习中以 `:` 开头的输入是命令，其余都是答案；空行按答错处理

/// 练习中的输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Answer(String),
    ShowHint,
    HideHint,
    Next,
    TogglePause,
    Restart,
    Menu,
    Help,
    Quit,
}

/// 解析练习中的一行输入
pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    let Some(name) = trimmed.strip_prefix(':') else {
        return Command::Answer(line.to_string());
    };

    match name.trim().to_lowercase().as_str() {
        "k" | "hint" => Command::ShowHint,
        "hide" => Command::HideHint,
        "n" | "next" => Command::Next,
        "p" | "pause" => Command::TogglePause,
        "r" | "restart" => Command::Restart,
        "m" | "menu" => Command::Menu,
        "q" | "quit" | "exit" => Command::Quit,
        "h" | "help" | "?" => Command::Help,
        _ => Command::Answer(line.to_string()),
    }
}

/// 词库选择菜单
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    Builtin,
    Generate,
    File,
    Suggest,
    Quit,
    Unknown,
}

pub fn parse_menu_choice(line: &str) -> MenuChoice {
    match line.trim().to_lowercase().as_str() {
        "1" | "local" => MenuChoice::Builtin,
        "2" | "ai" => MenuChoice::Generate,
        "3" | "file" => MenuChoice::File,
        "4" | "topics" => MenuChoice::Suggest,
        "q" | "quit" | "exit" | ":q" => MenuChoice::Quit,
        _ => MenuChoice::Unknown,
    }
}

/// 完成后的选择
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionChoice {
    Restart,
    Menu,
    Quit,
    Unknown,
}

pub fn parse_completion_choice(line: &str) -> CompletionChoice {
    match line.trim().to_lowercase().as_str() {
        "" | "r" | ":r" | "restart" => CompletionChoice::Restart,
        "m" | ":m" | "menu" => CompletionChoice::Menu,
        "q" | ":q" | "quit" | "exit" => CompletionChoice::Quit,
        _ => CompletionChoice::Unknown,
    }
}

/// 解析生成数量，空行使用默认值
pub fn parse_count(line: &str, default_count: usize, max_count: usize) -> Option<usize> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Some(default_count);
    }
    trimmed
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=max_count).contains(n))
}

pub const HELP_TEXT: &str = "\
命令：
  直接回车    算作答错一次
  :k          显示答案
  :hide       隐藏答案
  :n          下一个
  :p          暂停 / 继续
  :r          重新开始
  :m          切换词库
  :q          退出";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answers_keep_original_text() {
        assert_eq!(
            parse_command(" check in "),
            Command::Answer(" check in ".to_string())
        );
        assert_eq!(parse_command(":unknown"), Command::Answer(":unknown".to_string()));
    }

    #[test]
    fn test_commands() {
        assert_eq!(parse_command(""), Command::Answer(String::new()));
        assert_eq!(parse_command("   "), Command::Answer("   ".to_string()));
        assert_eq!(parse_command(":K"), Command::ShowHint);
        assert_eq!(parse_command(":n"), Command::Next);
        assert_eq!(parse_command(":pause"), Command::TogglePause);
        assert_eq!(parse_command(":q"), Command::Quit);
    }

    #[test]
    fn test_menu_and_completion() {
        assert_eq!(parse_menu_choice(" 1 "), MenuChoice::Builtin);
        assert_eq!(parse_menu_choice("2"), MenuChoice::Generate);
        assert_eq!(parse_menu_choice("x"), MenuChoice::Unknown);
        assert_eq!(parse_completion_choice(""), CompletionChoice::Restart);
        assert_eq!(parse_completion_choice("m"), CompletionChoice::Menu);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("", 10, 50), Some(10));
        assert_eq!(parse_count("5", 10, 50), Some(5));
        assert_eq!(parse_count("0", 10, 50), None);
        assert_eq!(parse_count("51", 10, 50), None);
        assert_eq!(parse_count("abc", 10, 50), None);
    }
}
