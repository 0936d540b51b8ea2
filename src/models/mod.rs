pub mod builtin;
pub mod loaders;
pub mod word;

pub use builtin::builtin_words;
pub use loaders::load_word_list;
pub use word::{WordEntry, WordList};
