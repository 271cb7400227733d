//! LLM 客户端
//!
//! `CompletionClient` 是核心逻辑与外部补全服务之间唯一的接缝。

pub mod completion;
pub mod openai_client;
#[cfg(any(test, feature = "test-util"))]
pub mod scripted;

pub use completion::{CompletionClient, CompletionRequest};
pub use openai_client::OpenAiCompletionClient;
#[cfg(any(test, feature = "test-util"))]
pub use scripted::{RecordedRequest, ScriptedCompletionClient};
