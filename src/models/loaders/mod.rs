pub mod toml_loader;

pub use toml_loader::{load_word_list, parse_word_list};
