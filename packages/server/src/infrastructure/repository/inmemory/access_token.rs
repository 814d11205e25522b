//! InMemory AccessToken Repository 実装

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{AccessToken, AccessTokenRepository, Credential, RepositoryError, Timestamp};

/// インメモリ AccessToken Repository 実装
///
/// トークン文字列をキーに発行済みトークンを保持します。
/// 保存のたびに期限切れのトークンを削除するため、保持数は有効なトークン数で頭打ちになります。
#[derive(Debug, Default)]
pub struct InMemoryAccessTokenRepository {
    tokens: Mutex<HashMap<Credential, AccessToken>>,
}

impl InMemoryAccessTokenRepository {
    /// 新しい InMemoryAccessTokenRepository を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccessTokenRepository for InMemoryAccessTokenRepository {
    async fn save(&self, token: AccessToken) -> Result<(), RepositoryError> {
        let now = Timestamp::now();
        let mut tokens = self.tokens.lock().await;
        let before = tokens.len();
        tokens.retain(|_, issued| !issued.is_expired_at(now));
        let evicted = before - tokens.len();
        if evicted > 0 {
            tracing::debug!("Evicted {} expired token(s)", evicted);
        }
        tokens.insert(token.token.clone(), token);
        Ok(())
    }

    async fn find_by_token(
        &self,
        credential: &Credential,
    ) -> Result<Option<AccessToken>, RepositoryError> {
        let tokens = self.tokens.lock().await;
        Ok(tokens.get(credential).cloned())
    }
}
