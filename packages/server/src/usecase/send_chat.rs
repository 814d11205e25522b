//! UseCase: チャット送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendChatUseCase::execute() メソッド
//! - メッセージの永続化とブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - 永続化に失敗したメッセージが誰にも配信されないことを保証
//! - 未認証の接続からは送信できないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：認証済み接続からの送信
//! - 異常系：未認証、空メッセージ、永続化失敗

use std::sync::Arc;

use crate::domain::{
    ChatMessage, ChatMessageRepository, ConnectionId, ConnectionRegistry, MessageContent,
    RegistryError, Timestamp,
};

use super::{
    broadcast::{BroadcastReport, BroadcastUseCase},
    error::SendChatError,
};

/// チャット送信のユースケース
#[derive(Clone)]
pub struct SendChatUseCase {
    registry: Arc<ConnectionRegistry>,
    /// Repository（データアクセス層の抽象化）
    messages: Arc<dyn ChatMessageRepository>,
    broadcaster: BroadcastUseCase,
}

impl SendChatUseCase {
    /// 新しい SendChatUseCase を作成
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        messages: Arc<dyn ChatMessageRepository>,
    ) -> Self {
        let broadcaster = BroadcastUseCase::new(registry.clone());
        Self {
            registry,
            messages,
            broadcaster,
        }
    }

    /// チャット送信を実行
    ///
    /// # Arguments
    ///
    /// * `connection` - 送信元の接続
    /// * `content` - `chat` フレームの content フィールド
    ///
    /// # Returns
    ///
    /// * `Ok(BroadcastReport)` - 永続化とブロードキャストの両方を実行した
    /// * `Err(SendChatError)` - 何も配信していない
    pub async fn execute(
        &self,
        connection: &ConnectionId,
        content: Option<String>,
    ) -> Result<BroadcastReport, SendChatError> {
        let session = self
            .registry
            .get(connection)
            .ok_or(RegistryError::ConnectionNotRegistered(*connection))?;
        if !session.is_authenticated() {
            return Err(SendChatError::AuthenticationRequired);
        }

        let content = MessageContent::new(content.unwrap_or_default())
            .map_err(SendChatError::InvalidContent)?;

        // 1. 永続化（失敗した場合はブロードキャストしない）
        let message = ChatMessage::new(session.username, content.clone(), Timestamp::now());
        self.messages
            .save(message)
            .await
            .map_err(SendChatError::Storage)?;

        // 2. ブロードキャスト
        let report = self.broadcaster.execute(&content, connection)?;
        Ok(report)
    }
}
