// Adapters layer: concrete implementations of the domain ports (storage, http, git).

pub mod git;
pub mod http;
pub mod storage;

pub use git::GitHistory;
pub use http::{AnthropicClient, WebhookClient};
pub use storage::LocalStorage;
