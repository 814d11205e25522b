//! UseCase: 表示名変更処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ChangeUsernameUseCase::execute() メソッド
//! - 新しい名前の検証（空・変更なし・存在しないユーザー）とレジストリ更新
//!
//! ### なぜこのテストが必要か
//! - 無効な名前ではレジストリが変化しないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：登録済みユーザー名への変更
//! - 異常系：空文字、現在と同じ名前、存在しないユーザー名、ストレージ障害

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, RegistryError, UserRepository, Username};

use super::error::ChangeUsernameError;

/// 表示名変更のユースケース
#[derive(Clone)]
pub struct ChangeUsernameUseCase {
    registry: Arc<ConnectionRegistry>,
    /// Repository（データアクセス層の抽象化）
    users: Arc<dyn UserRepository>,
}

impl ChangeUsernameUseCase {
    /// 新しい ChangeUsernameUseCase を作成
    pub fn new(registry: Arc<ConnectionRegistry>, users: Arc<dyn UserRepository>) -> Self {
        Self { registry, users }
    }

    /// 表示名変更を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Username)` - 変更後の名前
    /// * `Err(ChangeUsernameError)` - レジストリは変化していない
    pub async fn execute(
        &self,
        connection: &ConnectionId,
        username: Option<String>,
    ) -> Result<Username, ChangeUsernameError> {
        let session = self
            .registry
            .get(connection)
            .ok_or(RegistryError::ConnectionNotRegistered(*connection))?;

        let username = username
            .and_then(|name| Username::new(name).ok())
            .filter(|name| name != &session.username)
            .ok_or(ChangeUsernameError::InvalidOrUnchanged)?;

        match self.users.find_by_username(&username).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(ChangeUsernameError::UserNotFound),
            Err(e) => return Err(ChangeUsernameError::Storage(e)),
        }

        self.registry.rename(connection, username.clone())?;
        tracing::info!(
            "Connection {} renamed from {} to {}",
            connection,
            session.username,
            username
        );
        Ok(username)
    }
}
