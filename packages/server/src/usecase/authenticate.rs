//! UseCase: 認証と単一セッション制御
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - AuthenticateUseCase::execute() メソッド
//! - トークン検証後、同じトークン・同じユーザー ID の接続が無い場合のみ昇格する処理
//!
//! ### なぜこのテストが必要か
//! - 1 ユーザーにつき同時接続は 1 つまで、という制約を保証
//! - 既存の接続に「別の場所からのログイン試行」が通知されることを確認
//! - 同時に認証しても二重に昇格しないこと（check-then-act 競合が無いこと）を保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規認証
//! - 異常系：トークン無し、無効トークン、ユーザー不在、既に認証済み
//! - エッジケース：同じトークン / 別トークン同一ユーザーでの同時認証

use std::sync::Arc;

use crate::{
    domain::{
        Admission, ConnectionId, ConnectionRegistry, Credential, CredentialError,
        CredentialValidator, RegistryError, Username,
    },
    infrastructure::dto::websocket::Notice,
};

use super::error::AuthenticateError;

/// 認証試行の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// 認証成功。接続は Authenticated 状態になった
    Admitted { username: Username },
    /// 同じ ID が既に接続中のため拒否された。呼び出し側はこの接続を閉じる
    Rejected { holder: ConnectionId },
}

/// 認証のユースケース
#[derive(Clone)]
pub struct AuthenticateUseCase {
    registry: Arc<ConnectionRegistry>,
    validator: Arc<dyn CredentialValidator>,
}

impl AuthenticateUseCase {
    /// 新しい AuthenticateUseCase を作成
    pub fn new(registry: Arc<ConnectionRegistry>, validator: Arc<dyn CredentialValidator>) -> Self {
        Self {
            registry,
            validator,
        }
    }

    /// 認証を実行
    ///
    /// 1. トークンを検証してユーザーを解決（レジストリのロック外）
    /// 2. 重複チェックと昇格を 1 つのクリティカルセクションで実行
    /// 3. 重複時は既存の接続に警告を送る（ロック解放後）
    ///
    /// # Arguments
    ///
    /// * `connection` - 認証する接続
    /// * `token` - `auth` フレームの token フィールド
    ///
    /// # Returns
    ///
    /// * `Ok(AuthOutcome)` - 昇格した、または重複により拒否された
    /// * `Err(AuthenticateError)` - 状態は変化していない
    pub async fn execute(
        &self,
        connection: &ConnectionId,
        token: Option<String>,
    ) -> Result<AuthOutcome, AuthenticateError> {
        let credential = token
            .and_then(|token| Credential::new(token).ok())
            .ok_or(AuthenticateError::TokenMissing)?;

        let session = self
            .registry
            .get(connection)
            .ok_or(RegistryError::ConnectionNotRegistered(*connection))?;
        if session.is_authenticated() {
            return Err(AuthenticateError::AlreadyAuthenticated);
        }

        let user = self
            .validator
            .validate(&credential)
            .await
            .map_err(|e| match e {
                CredentialError::NotFound | CredentialError::Expired => {
                    tracing::info!("Invalid token {}: {}", credential.masked(), e);
                    AuthenticateError::InvalidToken
                }
                CredentialError::UnknownUser(user_id) => {
                    tracing::info!("User not found: {}", user_id);
                    AuthenticateError::UserNotFound
                }
                CredentialError::Storage(storage) => AuthenticateError::Storage(storage),
            })?;

        tracing::info!(
            "Auth attempt - token: {}, user_id: {}",
            credential.masked(),
            user.user_id
        );

        match self
            .registry
            .admit(connection, credential, user.user_id, user.username)?
        {
            Admission::Admitted(session) => {
                tracing::info!(
                    "Registered new session for user_id: {} on connection {}",
                    user.user_id,
                    connection
                );
                Ok(AuthOutcome::Admitted {
                    username: session.username,
                })
            }
            Admission::Conflict { holder } => {
                tracing::warn!(
                    "User ID {} is already active on connection {}",
                    user.user_id,
                    holder.id
                );
                if let Err(e) = holder
                    .handle
                    .send_text(Notice::LoginAttemptWarning.to_string())
                {
                    tracing::warn!("Error sending warning to existing connection: {}", e);
                }
                Ok(AuthOutcome::Rejected { holder: holder.id })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AuthenticatedUser, ConnectionHandle, ConnectionIdFactory, OutboundFrame, RepositoryError,
        UserId, repository::MockCredentialValidator,
    };
    use tokio::sync::mpsc::UnboundedReceiver;

    fn register_guest(
        registry: &ConnectionRegistry,
    ) -> (ConnectionId, UnboundedReceiver<OutboundFrame>) {
        let (handle, rx) = ConnectionHandle::channel();
        (registry.register(handle, Username::guest()).id, rx)
    }

    /// token "tok-alice-N" → alice(1), "tok-bob" → bob(2), それ以外は NotFound
    fn validator() -> Arc<MockCredentialValidator> {
        let mut validator = MockCredentialValidator::new();
        validator.expect_validate().returning(|credential| {
            let token = credential.as_str();
            if token.starts_with("tok-alice") {
                Ok(AuthenticatedUser {
                    user_id: UserId::new(1).unwrap(),
                    username: Username::new("alice".to_string()).unwrap(),
                })
            } else if token == "tok-bob" {
                Ok(AuthenticatedUser {
                    user_id: UserId::new(2).unwrap(),
                    username: Username::new("bob".to_string()).unwrap(),
                })
            } else if token == "tok-expired" {
                Err(CredentialError::Expired)
            } else if token == "tok-orphan" {
                Err(CredentialError::UnknownUser(UserId::new(9).unwrap()))
            } else if token == "tok-broken" {
                Err(CredentialError::Storage(RepositoryError::Storage(
                    "down".to_string(),
                )))
            } else {
                Err(CredentialError::NotFound)
            }
        });
        Arc::new(validator)
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        // テスト項目: 有効なトークンで認証すると Authenticated 状態になる
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let usecase = AuthenticateUseCase::new(registry.clone(), validator());
        let (conn, _rx) = register_guest(&registry);

        // when (操作):
        let result = usecase.execute(&conn, Some("tok-alice".to_string())).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(AuthOutcome::Admitted {
                username: Username::new("alice".to_string()).unwrap()
            })
        );
        let session = registry.get(&conn).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.username.as_str(), "alice");
        assert_eq!(registry.find_by_identity(UserId::new(1).unwrap()), Some(conn));
    }

    #[tokio::test]
    async fn test_authenticate_missing_token() {
        // テスト項目: token が無い、または空の場合は TokenMissing で状態は変化しない
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let usecase = AuthenticateUseCase::new(registry.clone(), validator());
        let (conn, _rx) = register_guest(&registry);

        // when (操作):
        let missing = usecase.execute(&conn, None).await;
        let empty = usecase.execute(&conn, Some(String::new())).await;

        // then (期待する結果):
        assert_eq!(missing, Err(AuthenticateError::TokenMissing));
        assert_eq!(empty, Err(AuthenticateError::TokenMissing));
        assert!(!registry.get(&conn).unwrap().is_authenticated());
    }

    #[tokio::test]
    async fn test_authenticate_invalid_and_expired_token() {
        // テスト項目: 無効・期限切れトークンはどちらも InvalidToken で接続は閉じない
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let usecase = AuthenticateUseCase::new(registry.clone(), validator());
        let (conn, _rx) = register_guest(&registry);

        // when (操作):
        let invalid = usecase.execute(&conn, Some("nope".to_string())).await;
        let expired = usecase.execute(&conn, Some("tok-expired".to_string())).await;

        // then (期待する結果):
        assert_eq!(invalid, Err(AuthenticateError::InvalidToken));
        assert_eq!(expired, Err(AuthenticateError::InvalidToken));
        assert!(registry.get(&conn).is_some());
        assert_eq!(registry.authenticated_count(), 0);
    }

    #[tokio::test]
    async fn test_authenticate_user_not_found_and_storage_error() {
        // テスト項目: ユーザー不在・ストレージ障害はそれぞれ専用のエラーになる
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let usecase = AuthenticateUseCase::new(registry.clone(), validator());
        let (conn, _rx) = register_guest(&registry);

        // when (操作):
        let orphan = usecase.execute(&conn, Some("tok-orphan".to_string())).await;
        let broken = usecase.execute(&conn, Some("tok-broken".to_string())).await;

        // then (期待する結果):
        assert_eq!(orphan, Err(AuthenticateError::UserNotFound));
        assert!(matches!(broken, Err(AuthenticateError::Storage(_))));
    }

    #[tokio::test]
    async fn test_authenticate_twice_on_same_connection() {
        // テスト項目: 認証済みの接続が再度 auth を送ると AlreadyAuthenticated
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let usecase = AuthenticateUseCase::new(registry.clone(), validator());
        let (conn, _rx) = register_guest(&registry);
        usecase.execute(&conn, Some("tok-alice".to_string())).await.unwrap();

        // when (操作):
        let result = usecase.execute(&conn, Some("tok-bob".to_string())).await;

        // then (期待する結果):
        assert_eq!(result, Err(AuthenticateError::AlreadyAuthenticated));
        assert_eq!(registry.get(&conn).unwrap().username.as_str(), "alice");
        assert_eq!(registry.find_by_identity(UserId::new(2).unwrap()), None);
    }

    #[tokio::test]
    async fn test_authenticate_conflict_warns_existing_holder() {
        // テスト項目: 別トークンで同じユーザーが認証すると拒否され、既存の接続に警告が届く
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let usecase = AuthenticateUseCase::new(registry.clone(), validator());
        let (first, mut first_rx) = register_guest(&registry);
        let (second, mut second_rx) = register_guest(&registry);
        usecase.execute(&first, Some("tok-alice-1".to_string())).await.unwrap();

        // when (操作):
        let result = usecase.execute(&second, Some("tok-alice-2".to_string())).await;

        // then (期待する結果):
        assert_eq!(result, Ok(AuthOutcome::Rejected { holder: first }));
        assert_eq!(
            first_rx.recv().await,
            Some(OutboundFrame::Text(Notice::LoginAttemptWarning.to_string()))
        );
        assert!(second_rx.try_recv().is_err());
        assert!(!registry.get(&second).unwrap().is_authenticated());
        assert!(registry.is_consistent());
    }

    #[tokio::test]
    async fn test_authenticate_unregistered_connection() {
        // テスト項目: 未登録の接続からの認証はレジストリエラー
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let usecase = AuthenticateUseCase::new(registry.clone(), validator());
        let unknown = ConnectionIdFactory::generate();

        // when (操作):
        let result = usecase.execute(&unknown, Some("tok-alice".to_string())).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(AuthenticateError::Registry(
                RegistryError::ConnectionNotRegistered(unknown)
            ))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_authentication_promotes_exactly_one() {
        // テスト項目: 同じトークンで同時に認証しても昇格するのは 1 接続だけ
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let usecase = AuthenticateUseCase::new(registry.clone(), validator());
        let mut receivers = Vec::new();
        let mut connections = Vec::new();
        for _ in 0..8 {
            let (conn, rx) = register_guest(&registry);
            connections.push(conn);
            receivers.push(rx);
        }

        // when (操作):
        let tasks: Vec<_> = connections
            .iter()
            .map(|conn| {
                let usecase = usecase.clone();
                let conn = *conn;
                tokio::spawn(async move { usecase.execute(&conn, Some("tok-alice".to_string())).await })
            })
            .collect();
        let mut outcomes = Vec::new();
        for task in tasks {
            outcomes.push(task.await.unwrap().unwrap());
        }

        // then (期待する結果):
        let admitted = outcomes
            .iter()
            .filter(|o| matches!(o, AuthOutcome::Admitted { .. }))
            .count();
        assert_eq!(admitted, 1);
        assert_eq!(registry.authenticated_count(), 1);
        let holder = registry.find_by_identity(UserId::new(1).unwrap()).unwrap();
        for outcome in &outcomes {
            if let AuthOutcome::Rejected { holder: h } = outcome {
                assert_eq!(*h, holder);
            }
        }
        assert!(registry.is_consistent());
    }
}
