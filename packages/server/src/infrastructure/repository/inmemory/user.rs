//! InMemory User Repository 実装
//!
//! ドメイン層が定義する UserRepository trait の具体的な実装。
//! ID は 1 から順に採番し、ユーザー名の一意性をここで保証します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{NewUser, RepositoryError, User, UserId, UserRepository, Username};

#[derive(Debug, Default)]
struct UserTable {
    next_id: i64,
    by_id: HashMap<UserId, User>,
}

/// インメモリ User Repository 実装
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    table: Mutex<UserTable>,
}

impl InMemoryUserRepository {
    /// 新しい InMemoryUserRepository を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録済みユーザー数
    pub async fn count(&self) -> usize {
        self.table.lock().await.by_id.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut table = self.table.lock().await;

        if table.by_id.values().any(|u| u.username == user.username) {
            return Err(RepositoryError::UsernameTaken(user.username.into_string()));
        }

        table.next_id += 1;
        let id = UserId::new(table.next_id)
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        let stored = User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
        };
        table.by_id.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let table = self.table.lock().await;
        Ok(table.by_id.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, RepositoryError> {
        let table = self.table.lock().await;
        Ok(table
            .by_id
            .values()
            .find(|u| &u.username == username)
            .cloned())
    }
}
