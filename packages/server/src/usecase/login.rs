//! UseCase: ログイン処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LoginUseCase::execute() メソッド
//! - パスワード照合とアクセストークンの発行
//!
//! ### なぜこのテストが必要か
//! - 発行されたトークンに正しい有効期限が設定されることを保証
//! - ユーザー不在とパスワード不一致を区別せずに拒否することを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：正しいパスワードでのログイン
//! - 異常系：存在しないユーザー、パスワード不一致、トークン保存失敗

use std::{sync::Arc, time::Duration};

use crate::{
    domain::{
        AccessToken, AccessTokenRepository, CredentialFactory, Timestamp, UserRepository,
        Username,
    },
    infrastructure::auth::PasswordHasher,
};

use super::error::LoginError;

/// ログインのユースケース
#[derive(Clone)]
pub struct LoginUseCase {
    /// Repository（データアクセス層の抽象化）
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn AccessTokenRepository>,
    hasher: PasswordHasher,
    /// 発行するトークンの有効期間
    token_ttl: Duration,
}

impl LoginUseCase {
    /// 新しい LoginUseCase を作成
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn AccessTokenRepository>,
        hasher: PasswordHasher,
        token_ttl: Duration,
    ) -> Self {
        Self {
            users,
            tokens,
            hasher,
            token_ttl,
        }
    }

    /// ログインを実行
    ///
    /// # Returns
    ///
    /// * `Ok(AccessToken)` - 発行して保存したトークン
    /// * `Err(LoginError)` - 認証失敗、または保存失敗
    pub async fn execute(
        &self,
        username: String,
        password: String,
    ) -> Result<AccessToken, LoginError> {
        let username = Username::new(username).map_err(|_| LoginError::InvalidCredentials)?;

        let Some(user) = self.users.find_by_username(&username).await? else {
            tracing::warn!("Login failed, unknown user: {}", username);
            return Err(LoginError::InvalidCredentials);
        };
        let hasher = self.hasher;
        let stored = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .map_err(|e| LoginError::Hashing(e.to_string()))?;
        if !verified {
            tracing::warn!("Login failed, wrong password for user: {}", username);
            return Err(LoginError::InvalidCredentials);
        }

        let created_at = Timestamp::now();
        let ttl_millis = i64::try_from(self.token_ttl.as_millis()).unwrap_or(i64::MAX);
        let token = AccessToken {
            user_id: user.id,
            token: CredentialFactory::generate()?,
            created_at,
            expired_at: created_at.plus_millis(ttl_millis),
        };
        self.tokens.save(token.clone()).await?;

        tracing::info!(
            "Issued token {} for user {} (id: {})",
            token.token.masked(),
            user.username,
            user.id
        );
        Ok(token)
    }
}
