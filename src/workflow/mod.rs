pub mod session;
pub mod shuffle;

pub use session::{
    Judgement, Rejected, SessionController, SessionOptions, SessionPhase, SessionState,
    SessionStats,
};
