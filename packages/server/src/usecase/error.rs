//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{ConnectionId, RegistryError, RepositoryError, ValueObjectError};

/// 認証（単一セッション制御）のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthenticateError {
    /// token が無い、または空
    #[error("authentication token missing")]
    TokenMissing,

    /// token が存在しない、または期限切れ
    #[error("invalid authentication token")]
    InvalidToken,

    /// token の持ち主が存在しない
    #[error("user not found")]
    UserNotFound,

    /// この接続は既に認証済み
    #[error("connection already authenticated")]
    AlreadyAuthenticated,

    /// クレデンシャル検証中のストレージ障害
    #[error("credential lookup failed: {0}")]
    Storage(RepositoryError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// ブロードキャストのエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BroadcastError {
    /// 送信元がレジストリに存在しない（不変条件が保たれていれば起こらない）
    #[error("origin connection {0} not found in registry")]
    OriginNotRegistered(ConnectionId),
}

/// チャット送信のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendChatError {
    /// 未認証の接続からの送信
    #[error("authentication required")]
    AuthenticationRequired,

    /// content が無い、空、または長すぎる
    #[error("invalid content: {0}")]
    InvalidContent(ValueObjectError),

    /// 永続化に失敗（ブロードキャストは行われない）
    #[error("failed to store message: {0}")]
    Storage(RepositoryError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// 表示名変更のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChangeUsernameError {
    /// 空、長すぎる、または現在の名前と同じ
    #[error("invalid or unchanged username")]
    InvalidOrUnchanged,

    /// 指定された名前のユーザーが存在しない
    #[error("user not found")]
    UserNotFound,

    #[error("user lookup failed: {0}")]
    Storage(RepositoryError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// ユーザー登録のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegisterUserError {
    /// 入力値の検証エラー（フィールドごとのメッセージ）
    #[error("validation failed: {0:?}")]
    Validation(Vec<String>),

    #[error("username already taken: {0}")]
    UsernameTaken(String),

    #[error("failed to store user: {0}")]
    Storage(String),

    #[error("failed to hash password: {0}")]
    Hashing(String),
}

/// ログインのエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// ユーザーが存在しない、またはパスワード不一致
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("failed to generate token: {0}")]
    TokenGeneration(#[from] ValueObjectError),

    #[error("failed to verify password: {0}")]
    Hashing(String),

    #[error(transparent)]
    Storage(#[from] RepositoryError),
}
