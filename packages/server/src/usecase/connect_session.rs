//! UseCase: セッション接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectSessionUseCase::authenticate() / execute() メソッド
//! - セッションの Registry への登録と、任意のトークンによるユーザーの紐付け
//!
//! ### なぜこのテストが必要か
//! - トークン付きで接続したセッションは、そのユーザーとしてしか送信できない
//! - 不正なトークンでの接続は WebSocket へのアップグレード前に拒否する
//!
//! ### どのような状況を想定しているか
//! - 正常系：トークンなし、有効なトークン
//! - 異常系：不正なトークン、削除済みユーザーのトークン

use std::sync::Arc;

use crate::{
    domain::{IdFactory, IdentityStore, RepositoryError, SessionId, UserId},
    infrastructure::{RoomRegistry, SessionSender, auth::TokenService},
};

use super::error::RelayError;

/// 接続済みセッションの情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedSession {
    pub session_id: SessionId,
    /// トークンで認証されたユーザー
    pub user: Option<UserId>,
}

/// セッション接続のユースケース
pub struct ConnectSessionUseCase {
    identity: Arc<dyn IdentityStore>,
    registry: Arc<RoomRegistry>,
    tokens: Arc<TokenService>,
}

impl ConnectSessionUseCase {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        registry: Arc<RoomRegistry>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            identity,
            registry,
            tokens,
        }
    }

    /// ハンドシェイクのトークンを検証する
    ///
    /// * `Ok(None)` - トークンなし（匿名セッション）
    /// * `Err(RelayError::Authorization)` - 不正なトークン、存在しないユーザー
    pub async fn authenticate(&self, token: Option<&str>) -> Result<Option<UserId>, RelayError> {
        let Some(token) = token else {
            return Ok(None);
        };
        let claims = self
            .tokens
            .verify(token)
            .map_err(|e| RelayError::Authorization(e.to_string()))?;
        let user_id = claims
            .user_id()
            .map_err(|e| RelayError::Authorization(e.to_string()))?;
        match self.identity.get_user(&user_id).await {
            Ok(user) => Ok(Some(user.id)),
            Err(RepositoryError::NotFound(_)) => Err(RelayError::Authorization(format!(
                "user {user_id} no longer exists"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// 新しいセッション ID を割り当てて Registry に登録する
    ///
    /// # Arguments
    ///
    /// * `user` - `authenticate` で確認済みのユーザー
    /// * `sender` - セッションへの送信チャンネル
    pub async fn execute(&self, user: Option<UserId>, sender: SessionSender) -> ConnectedSession {
        let session_id = IdFactory::session_id();
        self.registry
            .register_session(session_id.clone(), sender)
            .await;

        tracing::info!(
            "Session '{}' connected (user: {})",
            session_id,
            user.as_ref().map_or("anonymous", |u| u.as_str())
        );
        ConnectedSession { session_id, user }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{DisplayName, Email, Timestamp, User},
        infrastructure::repository::InMemoryIdentityStore,
    };
    use std::time::Duration;
    use tokio::sync::mpsc;

    type Fixture = (
        ConnectSessionUseCase,
        Arc<InMemoryIdentityStore>,
        Arc<RoomRegistry>,
        Arc<TokenService>,
    );

    fn create_test_usecase() -> Fixture {
        let identity = Arc::new(InMemoryIdentityStore::default());
        let registry = Arc::new(RoomRegistry::new(identity.clone()));
        let tokens = Arc::new(TokenService::new("test-secret", Duration::from_secs(60)));
        let usecase =
            ConnectSessionUseCase::new(identity.clone(), registry.clone(), tokens.clone());
        (usecase, identity, registry, tokens)
    }

    async fn insert_user(identity: &InMemoryIdentityStore) -> User {
        let user = User::new(
            IdFactory::user_id(),
            Email::new("alice@example.com".to_string()).unwrap(),
            DisplayName::new("alice".to_string()).unwrap(),
            "hash".to_string(),
            None,
            Timestamp::new(0),
        );
        identity.insert_user(user.clone()).await.unwrap();
        user
    }

    #[tokio::test]
    async fn test_connect_without_token() {
        // テスト項目: トークンなしの接続は匿名セッションとして登録される
        // given (前提条件):
        let (usecase, _, registry, _) = create_test_usecase();
        let (tx, _rx) = mpsc::channel(64);

        // when (操作):
        let user = usecase.authenticate(None).await.unwrap();
        let session = usecase.execute(user, tx).await;

        // then (期待する結果):
        assert_eq!(session.user, None);
        assert!(registry.is_registered(&session.session_id).await);
    }

    #[tokio::test]
    async fn test_connect_with_valid_token() {
        // テスト項目: 有効なトークンでの接続はユーザーに紐付く
        // given (前提条件):
        let (usecase, identity, _, tokens) = create_test_usecase();
        let user = insert_user(&identity).await;
        let token = tokens.issue(&user.id, &user.email).unwrap();
        let (tx, _rx) = mpsc::channel(64);

        // when (操作):
        let authenticated = usecase.authenticate(Some(&token)).await.unwrap();
        let session = usecase.execute(authenticated, tx).await;

        // then (期待する結果):
        assert_eq!(session.user, Some(user.id));
    }

    #[tokio::test]
    async fn test_connect_with_invalid_token() {
        // テスト項目: 不正なトークンは拒否される
        // given (前提条件):
        let (usecase, _, _, _) = create_test_usecase();

        // when (操作):
        let result = usecase.authenticate(Some("garbage")).await;

        // then (期待する結果):
        assert!(matches!(result, Err(RelayError::Authorization(_))));
    }

    #[tokio::test]
    async fn test_connect_with_token_of_missing_user() {
        // テスト項目: 存在しないユーザーのトークンは拒否される
        // given (前提条件):
        let (usecase, _, _, tokens) = create_test_usecase();
        let token = tokens
            .issue(
                &IdFactory::user_id(),
                &Email::new("ghost@example.com".to_string()).unwrap(),
            )
            .unwrap();

        // when (操作):
        let result = usecase.authenticate(Some(&token)).await;

        // then (期待する結果):
        assert!(matches!(result, Err(RelayError::Authorization(_))));
    }
}
