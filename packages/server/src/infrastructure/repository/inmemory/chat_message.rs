//! InMemory ChatMessage Repository 実装

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ChatMessage, ChatMessageRepository, RepositoryError};

/// Default maximum number of messages kept in memory
pub const DEFAULT_MESSAGE_CAPACITY: usize = 1000;

/// インメモリ ChatMessage Repository 実装
///
/// 容量を超えた場合は古いメッセージから破棄します。
#[derive(Debug)]
pub struct InMemoryChatMessageRepository {
    messages: Mutex<VecDeque<ChatMessage>>,
    capacity: usize,
}

impl InMemoryChatMessageRepository {
    /// 新しい InMemoryChatMessageRepository を作成
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MESSAGE_CAPACITY)
    }

    /// 保持件数を指定して作成
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: Mutex::new(VecDeque::new()),
            capacity,
        }
    }
}

impl Default for InMemoryChatMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatMessageRepository for InMemoryChatMessageRepository {
    async fn save(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        if self.capacity == 0 {
            return Err(RepositoryError::Storage(
                "message store has no capacity".to_string(),
            ));
        }
        let mut messages = self.messages.lock().await;
        while messages.len() >= self.capacity {
            messages.pop_front();
        }
        messages.push_back(message);
        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<ChatMessage>, RepositoryError> {
        let messages = self.messages.lock().await;
        let start = messages.len().saturating_sub(limit);
        Ok(messages.range(start..).cloned().collect())
    }
}
