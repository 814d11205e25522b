//! UseCase: ユーザー登録処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RegisterUserUseCase::execute() メソッド
//! - 入力値の検証、パスワードのハッシュ化、ユーザーの保存
//!
//! ### なぜこのテストが必要か
//! - 不正な入力がまとめて報告されることを保証
//! - 平文のパスワードが保存されないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規ユーザーの登録
//! - 異常系：検証エラー、ユーザー名の重複、ストレージ障害

use std::sync::Arc;

use crate::{
    domain::{Email, NewUser, RepositoryError, User, UserRepository, Username, ValueObjectError},
    infrastructure::auth::PasswordHasher,
};

use super::error::RegisterUserError;

/// パスワードの最小文字数
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// パスワードの最大文字数
pub const PASSWORD_MAX_LENGTH: usize = 30;

/// ユーザー登録の入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterUserCommand {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// ユーザー登録のユースケース
#[derive(Clone)]
pub struct RegisterUserUseCase {
    /// Repository（データアクセス層の抽象化）
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
}

impl RegisterUserUseCase {
    /// 新しい RegisterUserUseCase を作成
    pub fn new(users: Arc<dyn UserRepository>, hasher: PasswordHasher) -> Self {
        Self { users, hasher }
    }

    /// ユーザー登録を実行
    ///
    /// # Returns
    ///
    /// * `Ok(User)` - 保存されたユーザー
    /// * `Err(RegisterUserError)` - 検証エラー、または保存失敗
    pub async fn execute(&self, command: RegisterUserCommand) -> Result<User, RegisterUserError> {
        let mut errors = Vec::new();

        let username = Username::new(command.username)
            .map_err(|e| errors.push(e.to_string()))
            .ok();
        let email = Email::new(command.email)
            .map_err(|e| errors.push(e.to_string()))
            .ok();
        if let Err(e) = validate_password(&command.password) {
            errors.push(e.to_string());
        }

        let (Some(username), Some(email), true) = (username, email, errors.is_empty()) else {
            return Err(RegisterUserError::Validation(errors));
        };

        // PBKDF2 は数百ミリ秒かかるため blocking スレッドで実行
        let hasher = self.hasher;
        let password = command.password;
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| RegisterUserError::Hashing(e.to_string()))?;

        let new_user = NewUser {
            username,
            email,
            password_hash,
        };

        match self.users.create(new_user).await {
            Ok(user) => {
                tracing::info!("User registered: {} (id: {})", user.username, user.id);
                Ok(user)
            }
            Err(RepositoryError::UsernameTaken(name)) => {
                tracing::warn!("Registration rejected, username taken: {}", name);
                Err(RegisterUserError::UsernameTaken(name))
            }
            Err(RepositoryError::Storage(e)) => {
                tracing::error!("Failed to store user: {}", e);
                Err(RegisterUserError::Storage(e))
            }
        }
    }
}

fn validate_password(password: &str) -> Result<(), ValueObjectError> {
    let actual = password.chars().count();
    if !(PASSWORD_MIN_LENGTH..=PASSWORD_MAX_LENGTH).contains(&actual) {
        return Err(ValueObjectError::PasswordLength {
            min: PASSWORD_MIN_LENGTH,
            max: PASSWORD_MAX_LENGTH,
            actual,
        });
    }
    Ok(())
}
