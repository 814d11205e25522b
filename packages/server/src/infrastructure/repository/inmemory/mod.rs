//! InMemory Repository 実装
//!
//! プロセス内の HashMap / Vec をストレージとして使用します。
//! 再起動でデータは失われます。

mod access_token;
mod chat_message;
mod user;

pub use access_token::InMemoryAccessTokenRepository;
pub use chat_message::InMemoryChatMessageRepository;
pub use user::InMemoryUserRepository;
