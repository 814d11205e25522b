//! Connection registry.
//!
//! Authoritative map of live connections plus two non-owning indexes
//! (credential -> connection, user id -> connection) used to enforce that an
//! identity holds at most one live connection.
//!
//! All three maps sit behind one `parking_lot::RwLock`. Every method takes the
//! lock for a short, synchronous critical section and never awaits or performs
//! socket I/O while holding it; delivery goes through [`ConnectionHandle`]
//! queues. Invariant: a connection id appears in the credential and identity
//! indexes iff its session is authenticated, and each index key maps to at
//! most one connection.

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use super::{
    connection::ConnectionHandle,
    entity::{ClientSession, SessionIdentity},
    error::RegistryError,
    factory::ConnectionIdFactory,
    value_object::{ConnectionId, Credential, UserId, Username},
};

/// Result of an admission attempt.
#[derive(Debug, Clone)]
pub enum Admission {
    /// The session was promoted; carries its updated state
    Admitted(ClientSession),
    /// Another live connection already holds the credential or the user id
    Conflict {
        /// The connection that keeps the identity
        holder: ClientSession,
    },
}

/// One broadcast target captured from the registry.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub id: ConnectionId,
    pub username: Username,
    pub handle: ConnectionHandle,
}

/// Consistent view of the registry taken for one broadcast.
#[derive(Debug, Clone)]
pub struct BroadcastSnapshot {
    /// Display name of the originating connection
    pub origin_username: Username,
    /// Every registered connection, the origin included
    pub recipients: Vec<Recipient>,
}

#[derive(Debug, Default)]
struct RegistryState {
    by_connection: HashMap<ConnectionId, ClientSession>,
    by_credential: HashMap<Credential, ConnectionId>,
    by_identity: HashMap<UserId, ConnectionId>,
}

impl RegistryState {
    fn promote(
        &mut self,
        id: &ConnectionId,
        credential: Credential,
        user_id: UserId,
        username: Username,
    ) -> Result<ClientSession, RegistryError> {
        let session = self
            .by_connection
            .get_mut(id)
            .ok_or(RegistryError::ConnectionNotRegistered(*id))?;
        if session.identity.is_some() {
            return Err(RegistryError::AlreadyAuthenticated(*id));
        }

        self.by_credential.insert(credential.clone(), *id);
        self.by_identity.insert(user_id, *id);
        session.identity = Some(SessionIdentity {
            credential,
            user_id,
        });
        session.username = username;
        Ok(session.clone())
    }

    /// Live holder of either key. The identity index wins when both match.
    fn holder_of(&self, credential: &Credential, user_id: UserId) -> Option<&ClientSession> {
        self.by_identity
            .get(&user_id)
            .or_else(|| self.by_credential.get(credential))
            .and_then(|id| self.by_connection.get(id))
    }
}

/// Process-wide registry of live connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    state: RwLock<RegistryState>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly accepted connection in guest state.
    pub fn register(&self, handle: ConnectionHandle, username: Username) -> ClientSession {
        let session = ClientSession::guest(ConnectionIdFactory::generate(), handle, username);
        let total = {
            let mut state = self.state.write();
            state.by_connection.insert(session.id, session.clone());
            state.by_connection.len()
        };
        tracing::info!(
            "New client connected. connection: {}, username: {}, total clients: {}",
            session.id,
            session.username,
            total
        );
        session
    }

    /// Remove a connection and, if it was authenticated, its index entries.
    ///
    /// Returns the removed session; unregistering an unknown or already removed
    /// connection is a no-op that returns `None`.
    pub fn unregister(&self, id: &ConnectionId) -> Option<ClientSession> {
        let (session, tokens, users) = {
            let mut state = self.state.write();
            let session = state.by_connection.remove(id)?;
            if let Some(identity) = &session.identity {
                if state.by_credential.get(&identity.credential) == Some(id) {
                    state.by_credential.remove(&identity.credential);
                }
                if state.by_identity.get(&identity.user_id) == Some(id) {
                    state.by_identity.remove(&identity.user_id);
                }
            }
            (session, state.by_credential.len(), state.by_identity.len())
        };
        tracing::info!(
            "Client disconnected. connection: {}, username: {}",
            session.id,
            session.username
        );
        tracing::debug!("Active sessions - tokens: {}, users: {}", tokens, users);
        Some(session)
    }

    /// Mark a guest session as authenticated and index it.
    ///
    /// Performs no conflict check; callers that need one go through
    /// [`ConnectionRegistry::admit`].
    pub fn promote(
        &self,
        id: &ConnectionId,
        credential: Credential,
        user_id: UserId,
        username: Username,
    ) -> Result<ClientSession, RegistryError> {
        self.state.write().promote(id, credential, user_id, username)
    }

    /// Check for a live holder of `credential` or `user_id` and promote the
    /// session if there is none, all under one write lock.
    pub fn admit(
        &self,
        id: &ConnectionId,
        credential: Credential,
        user_id: UserId,
        username: Username,
    ) -> Result<Admission, RegistryError> {
        let mut state = self.state.write();
        if let Some(holder) = state.holder_of(&credential, user_id) {
            return Ok(Admission::Conflict {
                holder: holder.clone(),
            });
        }
        let session = state.promote(id, credential, user_id, username)?;
        Ok(Admission::Admitted(session))
    }

    /// Connection currently authenticated with `credential`.
    pub fn find_by_credential(&self, credential: &Credential) -> Option<ConnectionId> {
        self.state.read().by_credential.get(credential).copied()
    }

    /// Connection currently authenticated as `user_id`.
    pub fn find_by_identity(&self, user_id: UserId) -> Option<ConnectionId> {
        self.state.read().by_identity.get(&user_id).copied()
    }

    /// Snapshot of one session.
    pub fn get(&self, id: &ConnectionId) -> Option<ClientSession> {
        self.state.read().by_connection.get(id).cloned()
    }

    /// Replace the display name of a connection.
    ///
    /// Name validity (non-empty, different from the current one) is the
    /// caller's concern.
    pub fn rename(&self, id: &ConnectionId, username: Username) -> Result<(), RegistryError> {
        let mut state = self.state.write();
        let session = state
            .by_connection
            .get_mut(id)
            .ok_or(RegistryError::ConnectionNotRegistered(*id))?;
        session.username = username;
        Ok(())
    }

    /// Visit every registered session under the read lock.
    ///
    /// The visitor runs inside the critical section, so it must not block.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&ConnectionId, &ClientSession),
    {
        let state = self.state.read();
        for (id, session) in &state.by_connection {
            visitor(id, session);
        }
    }

    /// Capture the origin's display name and every recipient in one read.
    ///
    /// Returns `None` when the origin is not registered.
    pub fn broadcast_snapshot(&self, origin: &ConnectionId) -> Option<BroadcastSnapshot> {
        let state = self.state.read();
        let origin_username = state.by_connection.get(origin)?.username.clone();
        let recipients = state
            .by_connection
            .values()
            .map(|session| Recipient {
                id: session.id,
                username: session.username.clone(),
                handle: session.handle.clone(),
            })
            .collect();
        Some(BroadcastSnapshot {
            origin_username,
            recipients,
        })
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.state.read().by_connection.len()
    }

    /// Whether no connection is registered.
    pub fn is_empty(&self) -> bool {
        self.state.read().by_connection.is_empty()
    }

    /// Number of authenticated connections.
    pub fn authenticated_count(&self) -> usize {
        self.state.read().by_identity.len()
    }

    /// Check the index invariants.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        let state = self.state.read();
        let authenticated: Vec<&ClientSession> = state
            .by_connection
            .values()
            .filter(|s| s.is_authenticated())
            .collect();

        let indexes_sized = state.by_credential.len() == authenticated.len()
            && state.by_identity.len() == authenticated.len();
        let sessions_indexed = authenticated.iter().all(|session| {
            session.identity.as_ref().is_some_and(|identity| {
                state.by_credential.get(&identity.credential) == Some(&session.id)
                    && state.by_identity.get(&identity.user_id) == Some(&session.id)
            })
        });
        let no_dangling = state
            .by_credential
            .values()
            .chain(state.by_identity.values())
            .all(|id| state.by_connection.contains_key(id));

        indexes_sized && sessions_indexed && no_dangling
    }
}

/// Keeps a connection registered for as long as it lives.
///
/// Dropping the guard unregisters the connection, which makes every exit path
/// of a connection task (normal close, transport error, conflict, abort)
/// converge on exactly one cleanup.
#[derive(Debug)]
pub struct Registration {
    registry: Arc<ConnectionRegistry>,
    id: ConnectionId,
}

impl Registration {
    /// Register `handle` as a guest named `username`.
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        handle: ConnectionHandle,
        username: Username,
    ) -> Self {
        let session = registry.register(handle, username);
        Self {
            registry,
            id: session.id,
        }
    }

    /// The registry key of this connection.
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.unregister(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn credential(token: &str) -> Credential {
        Credential::new(token.to_string()).unwrap()
    }

    fn user_id(id: i64) -> UserId {
        UserId::new(id).unwrap()
    }

    fn username(name: &str) -> Username {
        Username::new(name.to_string()).unwrap()
    }

    fn register_guest(registry: &ConnectionRegistry) -> ClientSession {
        let (handle, _rx) = ConnectionHandle::channel();
        registry.register(handle, Username::guest())
    }

    #[test]
    fn test_register_creates_guest_session() {
        // テスト項目: register でゲスト状態のセッションが登録される
        // given (前提条件):
        let registry = ConnectionRegistry::new();

        // when (操作):
        let session = register_guest(&registry);

        // then (期待する結果):
        assert_eq!(registry.len(), 1);
        let stored = registry.get(&session.id).unwrap();
        assert!(!stored.is_authenticated());
        assert_eq!(stored.username.as_str(), "Guest");
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_promote_indexes_credential_and_identity() {
        // テスト項目: promote でクレデンシャルとユーザー ID の両方が索引される
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let session = register_guest(&registry);

        // when (操作):
        let promoted = registry
            .promote(&session.id, credential("tok-a"), user_id(1), username("alice"))
            .unwrap();

        // then (期待する結果):
        assert_eq!(promoted.username.as_str(), "alice");
        assert_eq!(registry.find_by_credential(&credential("tok-a")), Some(session.id));
        assert_eq!(registry.find_by_identity(user_id(1)), Some(session.id));
        assert_eq!(registry.authenticated_count(), 1);
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_promote_twice_fails() {
        // テスト項目: 認証済みセッションを再度 promote するとエラーになる
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let session = register_guest(&registry);
        registry
            .promote(&session.id, credential("tok-a"), user_id(1), username("alice"))
            .unwrap();

        // when (操作):
        let result = registry.promote(&session.id, credential("tok-b"), user_id(2), username("bob"));

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), RegistryError::AlreadyAuthenticated(session.id));
        assert_eq!(registry.find_by_credential(&credential("tok-b")), None);
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_promote_unknown_connection_fails() {
        // テスト項目: 未登録の接続は promote できない
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let id = ConnectionIdFactory::generate();

        // when (操作):
        let result = registry.promote(&id, credential("tok-a"), user_id(1), username("alice"));

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), RegistryError::ConnectionNotRegistered(id));
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_unregister_removes_indexes() {
        // テスト項目: unregister で 3 つのマップ全てから削除される
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let session = register_guest(&registry);
        registry
            .promote(&session.id, credential("tok-a"), user_id(1), username("alice"))
            .unwrap();

        // when (操作):
        let removed = registry.unregister(&session.id);

        // then (期待する結果):
        assert_eq!(removed.unwrap().username.as_str(), "alice");
        assert!(registry.is_empty());
        assert_eq!(registry.find_by_credential(&credential("tok-a")), None);
        assert_eq!(registry.find_by_identity(user_id(1)), None);
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_unregister_twice_is_noop() {
        // テスト項目: 2 回目の unregister は何もしない
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let session = register_guest(&registry);
        let other = register_guest(&registry);
        registry.unregister(&session.id);

        // when (操作):
        let second = registry.unregister(&session.id);

        // then (期待する結果):
        assert!(second.is_none());
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&other.id).is_some());
    }

    #[test]
    fn test_admit_conflict_by_credential() {
        // テスト項目: 同じクレデンシャルで 2 つ目の接続は拒否される
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let first = register_guest(&registry);
        let second = register_guest(&registry);
        registry
            .admit(&first.id, credential("tok-a"), user_id(1), username("alice"))
            .unwrap();

        // when (操作):
        let result = registry
            .admit(&second.id, credential("tok-a"), user_id(1), username("alice"))
            .unwrap();

        // then (期待する結果):
        match result {
            Admission::Conflict { holder } => assert_eq!(holder.id, first.id),
            Admission::Admitted(_) => panic!("second connection must not be admitted"),
        }
        assert!(!registry.get(&second.id).unwrap().is_authenticated());
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_admit_conflict_by_identity_with_different_token() {
        // テスト項目: 別トークンでも同じユーザー ID なら拒否される
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let first = register_guest(&registry);
        let second = register_guest(&registry);
        registry
            .admit(&first.id, credential("tok-a"), user_id(1), username("alice"))
            .unwrap();

        // when (操作):
        let result = registry
            .admit(&second.id, credential("tok-b"), user_id(1), username("alice"))
            .unwrap();

        // then (期待する結果):
        assert!(matches!(result, Admission::Conflict { holder } if holder.id == first.id));
        assert_eq!(registry.find_by_credential(&credential("tok-b")), None);
    }

    #[test]
    fn test_admit_prefers_identity_holder() {
        // テスト項目: クレデンシャルとユーザー ID が別々の接続に当たった場合、ユーザー ID 側が優先される
        // given (前提条件): tok-a は alice(1) の接続、bob(2) は別の接続
        let registry = ConnectionRegistry::new();
        let alice = register_guest(&registry);
        let bob = register_guest(&registry);
        let newcomer = register_guest(&registry);
        registry
            .promote(&alice.id, credential("tok-a"), user_id(1), username("alice"))
            .unwrap();
        registry
            .promote(&bob.id, credential("tok-b"), user_id(2), username("bob"))
            .unwrap();

        // when (操作): tok-a を提示しつつユーザー ID 2 に解決される
        let result = registry
            .admit(&newcomer.id, credential("tok-a"), user_id(2), username("bob"))
            .unwrap();

        // then (期待する結果):
        assert!(matches!(result, Admission::Conflict { holder } if holder.id == bob.id));
    }

    #[test]
    fn test_rename_updates_username() {
        // テスト項目: rename で表示名が更新される
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let session = register_guest(&registry);

        // when (操作):
        registry.rename(&session.id, username("carol")).unwrap();

        // then (期待する結果):
        assert_eq!(registry.get(&session.id).unwrap().username.as_str(), "carol");
    }

    #[test]
    fn test_broadcast_snapshot_includes_origin() {
        // テスト項目: スナップショットは送信者自身を含む全接続を含む
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let a = register_guest(&registry);
        let b = register_guest(&registry);
        registry.rename(&a.id, username("alice")).unwrap();

        // when (操作):
        let snapshot = registry.broadcast_snapshot(&a.id).unwrap();

        // then (期待する結果):
        assert_eq!(snapshot.origin_username.as_str(), "alice");
        let mut ids: Vec<ConnectionId> = snapshot.recipients.iter().map(|r| r.id).collect();
        ids.sort_by_key(|id| *id.as_uuid());
        let mut expected = vec![a.id, b.id];
        expected.sort_by_key(|id| *id.as_uuid());
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_broadcast_snapshot_unknown_origin() {
        // テスト項目: 未登録の送信者の場合は None を返す
        let registry = ConnectionRegistry::new();
        assert!(registry.broadcast_snapshot(&ConnectionIdFactory::generate()).is_none());
    }

    #[test]
    fn test_for_each_visits_every_session() {
        // テスト項目: for_each が全てのセッションを訪問する
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        register_guest(&registry);
        register_guest(&registry);
        register_guest(&registry);

        // when (操作):
        let mut visited = 0;
        registry.for_each(|id, session| {
            assert_eq!(id, &session.id);
            visited += 1;
        });

        // then (期待する結果):
        assert_eq!(visited, 3);
    }

    #[test]
    fn test_registration_guard_unregisters_on_drop() {
        // テスト項目: Registration を破棄すると登録解除される
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let (handle, _rx) = ConnectionHandle::channel();
        let registration = Registration::new(registry.clone(), handle, Username::guest());
        let id = *registration.id();
        registry
            .promote(&id, credential("tok-a"), user_id(1), username("alice"))
            .unwrap();

        // when (操作):
        drop(registration);

        // then (期待する結果):
        assert!(registry.get(&id).is_none());
        assert_eq!(registry.find_by_identity(user_id(1)), None);
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_concurrent_admit_same_credential_admits_exactly_one() {
        // テスト項目: 同じクレデンシャルで同時に認証しても 1 接続だけが昇格する
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let sessions: Vec<ClientSession> = (0..16).map(|_| register_guest(&registry)).collect();

        // when (操作):
        let workers: Vec<_> = sessions
            .iter()
            .map(|session| {
                let registry = registry.clone();
                let id = session.id;
                thread::spawn(move || {
                    registry
                        .admit(&id, credential("shared"), user_id(7), username("alice"))
                        .unwrap()
                })
            })
            .collect();
        let outcomes: Vec<Admission> = workers.into_iter().map(|w| w.join().unwrap()).collect();

        // then (期待する結果):
        let admitted: Vec<&ClientSession> = outcomes
            .iter()
            .filter_map(|o| match o {
                Admission::Admitted(session) => Some(session),
                Admission::Conflict { .. } => None,
            })
            .collect();
        assert_eq!(admitted.len(), 1);
        assert_eq!(registry.find_by_identity(user_id(7)), Some(admitted[0].id));
        for outcome in &outcomes {
            if let Admission::Conflict { holder } = outcome {
                assert_eq!(holder.id, admitted[0].id);
            }
        }
        assert_eq!(registry.authenticated_count(), 1);
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_concurrent_register_promote_unregister_keeps_invariants() {
        // テスト項目: register / promote / unregister を並行実行しても不変条件が保たれる
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());

        // when (操作):
        let workers: Vec<_> = (0..8)
            .map(|worker| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for round in 0..50 {
                        let session = register_guest(&registry);
                        let user = user_id(1 + (round % 5));
                        let token = credential(&format!("tok-{worker}-{}", round % 3));
                        let _ = registry.admit(&session.id, token, user, username("user"));
                        if round % 2 == 0 {
                            registry.unregister(&session.id);
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        // then (期待する結果):
        assert!(registry.is_consistent());
        assert!(registry.authenticated_count() <= 5);
    }
}
