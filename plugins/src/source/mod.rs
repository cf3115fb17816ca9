pub mod openai;
pub mod replay;
mod sse;

pub use openai::OpenAiTokenSource;
pub use replay::ReplayTokenSource;
