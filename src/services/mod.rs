pub mod speech;
pub mod word_parser;
pub mod word_source;

pub use speech::{playback_available, speaker_from_config, DictVoiceSpeaker, SilentSpeaker, Speaker};
pub use word_source::WordSource;
