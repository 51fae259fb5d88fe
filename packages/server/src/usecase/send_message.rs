//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 検証 → 送信者確認 → 毒性判定 → 保存 → 配信 の順序
//!
//! ### なぜこのテストが必要か
//! - 毒性判定を通過したメッセージだけが保存・配信される（判定不能時は fail closed）
//! - 保存に失敗したメッセージは誰にも配信されない
//! - 同じグループ内では配信順が保存順と一致する
//!
//! ### どのような状況を想定しているか
//! - 正常系：送信者を含む参加中の全セッションへの配信
//! - 異常系：ブロック、判定サービスの障害・タイムアウト、なりすまし、
//!   参加していないグループへの送信、保存失敗
//! - エッジケース：存在しない送信者

use std::{sync::Arc, time::Duration};

use crate::{
    domain::{
        ClassifierError, GroupId, IdentityStore, MessageContent, MessageStore, NewMessage,
        RepositoryError, Timestamp, ToxicityClassifier, ToxicityVerdict, UserId,
    },
    infrastructure::{
        RoomRegistry,
        dto::websocket::{MessageDto, ServerMessage},
    },
};

use super::error::RelayError;

/// 検証済みの送信要求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageCommand {
    pub content: MessageContent,
    pub sender: UserId,
    pub group: GroupId,
    /// クライアントが付けたタイムスタンプ。なければサーバー時刻
    pub timestamp: Option<Timestamp>,
}

/// 送信の結果
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// 保存され、`recipients` 件のセッションに配信された
    Delivered {
        message: MessageDto,
        recipients: usize,
    },
    /// 毒性判定で拒否された（保存も配信もしない）
    Blocked(ToxicityVerdict),
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    identity: Arc<dyn IdentityStore>,
    messages: Arc<dyn MessageStore>,
    classifier: Arc<dyn ToxicityClassifier>,
    registry: Arc<RoomRegistry>,
    classifier_timeout: Duration,
}

impl SendMessageUseCase {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        messages: Arc<dyn MessageStore>,
        classifier: Arc<dyn ToxicityClassifier>,
        registry: Arc<RoomRegistry>,
        classifier_timeout: Duration,
    ) -> Self {
        Self {
            identity,
            messages,
            classifier,
            registry,
            classifier_timeout,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `joined_group` - 送信元セッションが参加中のグループ
    /// * `authenticated` - 送信元セッションに紐付いたユーザー（匿名なら `None`）
    /// * `command` - 送信内容
    ///
    /// # Returns
    ///
    /// * `Ok(SendOutcome)` - 配信済み、またはブロック
    /// * `Err(RelayError)` - 送信失敗（何も保存・配信されていない）
    pub async fn execute(
        &self,
        joined_group: &GroupId,
        authenticated: Option<&UserId>,
        command: SendMessageCommand,
    ) -> Result<SendOutcome, RelayError> {
        // 1. 送信先と送信者の確認
        if &command.group != joined_group {
            return Err(RelayError::Authorization(format!(
                "session has not joined group {}",
                command.group
            )));
        }
        if let Some(user_id) = authenticated
            && user_id != &command.sender
        {
            return Err(RelayError::Authorization(format!(
                "session is authenticated as {user_id}, not {}",
                command.sender
            )));
        }

        // 2. 送信者の存在確認
        let sender = self.identity.get_user(&command.sender).await?;

        // 3. 毒性判定（判定できなければ拒否）
        let verdict = self.classify(command.content.as_str()).await?;
        if !verdict.allowed {
            tracing::info!(
                "Message from '{}' to group '{}' blocked (score: {})",
                command.sender,
                command.group,
                verdict.score
            );
            return Ok(SendOutcome::Blocked(verdict));
        }

        // 4. 保存と配信
        //
        // 送信元が切断しても保存済みのメッセージは配信されるよう、別タスクで実行する
        let new_message = NewMessage::new(
            command.content,
            command.sender,
            command.group,
            command.timestamp.unwrap_or_else(Timestamp::now),
        );
        let sender_name = sender.name.as_str().to_string();
        let messages = self.messages.clone();
        let registry = self.registry.clone();
        let delivery = tokio::spawn(async move {
            let _delivery = registry.delivery_lock(&new_message.group).await;
            let persisted = messages.append(new_message).await?;
            let dto = MessageDto::new(&persisted, Some(sender_name));
            let recipients = registry
                .fan_out(&persisted.group, ServerMessage::ChatMessage(dto.clone()))
                .await;
            Ok::<_, RepositoryError>((dto, recipients))
        });

        let (message, recipients) = delivery
            .await
            .map_err(|e| RelayError::Dependency(format!("delivery task failed: {e}")))??;
        tracing::debug!(
            "Message '{}' delivered to {} session(s) in group '{}'",
            message.id,
            recipients,
            message.group
        );
        Ok(SendOutcome::Delivered {
            message,
            recipients,
        })
    }

    async fn classify(&self, content: &str) -> Result<ToxicityVerdict, RelayError> {
        match tokio::time::timeout(self.classifier_timeout, self.classifier.classify(content)).await
        {
            Ok(Ok(verdict)) => Ok(verdict),
            Ok(Err(e)) => {
                tracing::warn!("Toxicity check failed: {}", e);
                Err(e.into())
            }
            Err(_) => {
                let err = ClassifierError::Timeout(self.classifier_timeout.as_millis() as u64);
                tracing::warn!("Toxicity check failed: {}", err);
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            DisplayName, Email, Group, IdFactory, SessionId, User,
            repository::{MockMessageStore, MockToxicityClassifier},
        },
        infrastructure::repository::{InMemoryIdentityStore, InMemoryMessageStore},
    };
    use async_trait::async_trait;
    use tokio::sync::mpsc::{self, Receiver};

    /// 一定時間待ってから判定する分類器
    struct SlowClassifier(Duration);

    #[async_trait]
    impl ToxicityClassifier for SlowClassifier {
        async fn classify(&self, _text: &str) -> Result<ToxicityVerdict, ClassifierError> {
            tokio::time::sleep(self.0).await;
            Ok(ToxicityVerdict::allow(0.0))
        }
    }

    /// "toxic" を含むメッセージを拒否する分類器
    fn keyword_classifier() -> MockToxicityClassifier {
        let mut classifier = MockToxicityClassifier::new();
        classifier.expect_classify().returning(|text| {
            if text.contains("toxic") {
                Ok(ToxicityVerdict::deny("Toxic content detected", 0.92))
            } else {
                Ok(ToxicityVerdict::allow(0.01))
            }
        });
        classifier
    }

    struct Fixture {
        identity: Arc<InMemoryIdentityStore>,
        registry: Arc<RoomRegistry>,
        group_id: GroupId,
        alice: UserId,
    }

    async fn create_fixture() -> Fixture {
        let identity = Arc::new(InMemoryIdentityStore::default());
        let group_id = IdFactory::group_id();
        identity
            .insert_group(Group::new(
                group_id.clone(),
                DisplayName::new("general".to_string()).unwrap(),
                None,
                Timestamp::new(0),
            ))
            .await
            .unwrap();
        let alice = IdFactory::user_id();
        identity
            .insert_user(User::new(
                alice.clone(),
                Email::new("alice@example.com".to_string()).unwrap(),
                DisplayName::new("alice".to_string()).unwrap(),
                "hash".to_string(),
                None,
                Timestamp::new(0),
            ))
            .await
            .unwrap();
        let registry = Arc::new(RoomRegistry::new(identity.clone()));
        Fixture {
            identity,
            registry,
            group_id,
            alice,
        }
    }

    async fn join_session(
        registry: &RoomRegistry,
        group_id: &GroupId,
    ) -> (SessionId, Receiver<ServerMessage>) {
        let session_id = IdFactory::session_id();
        let (tx, rx) = mpsc::channel(64);
        registry.register_session(session_id.clone(), tx).await;
        registry.join(group_id, &session_id).await.unwrap();
        (session_id, rx)
    }

    fn usecase(
        fixture: &Fixture,
        messages: Arc<dyn MessageStore>,
        classifier: Arc<dyn ToxicityClassifier>,
        timeout: Duration,
    ) -> SendMessageUseCase {
        SendMessageUseCase::new(
            fixture.identity.clone(),
            messages,
            classifier,
            fixture.registry.clone(),
            timeout,
        )
    }

    fn command(fixture: &Fixture, content: &str) -> SendMessageCommand {
        SendMessageCommand {
            content: MessageContent::new(content.to_string()).unwrap(),
            sender: fixture.alice.clone(),
            group: fixture.group_id.clone(),
            timestamp: Some(Timestamp::new(1_000)),
        }
    }

    #[tokio::test]
    async fn test_allowed_message_is_stored_and_delivered_to_all_members() {
        // テスト項目: 許可されたメッセージは保存され、送信者を含む全参加者に 1 回ずつ届く
        // given (前提条件):
        let fixture = create_fixture().await;
        let (_sender_session, mut sender_rx) =
            join_session(&fixture.registry, &fixture.group_id).await;
        let (_other_session, mut other_rx) =
            join_session(&fixture.registry, &fixture.group_id).await;
        let messages = Arc::new(InMemoryMessageStore::default());
        let usecase = usecase(
            &fixture,
            messages.clone(),
            Arc::new(keyword_classifier()),
            Duration::from_secs(1),
        );

        // when (操作):
        let outcome = usecase
            .execute(&fixture.group_id, None, command(&fixture, "hello"))
            .await
            .unwrap();

        // then (期待する結果):
        let SendOutcome::Delivered {
            message,
            recipients,
        } = outcome
        else {
            panic!("expected delivery, got {outcome:?}");
        };
        assert_eq!(recipients, 2);
        assert_eq!(message.content, "hello");
        assert_eq!(message.user.name.as_deref(), Some("alice"));
        assert_eq!(message.timestamp, 1_000);

        let stored = messages.list_by_group(&fixture.group_id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id.as_str(), message.id);

        for rx in [&mut sender_rx, &mut other_rx] {
            assert_eq!(
                rx.try_recv().unwrap(),
                ServerMessage::ChatMessage(message.clone())
            );
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn test_message_without_timestamp_gets_server_time() {
        // テスト項目: タイムスタンプのないメッセージにはサーバー時刻が付く
        // given (前提条件):
        let fixture = create_fixture().await;
        let usecase = usecase(
            &fixture,
            Arc::new(InMemoryMessageStore::default()),
            Arc::new(keyword_classifier()),
            Duration::from_secs(1),
        );
        let mut command = command(&fixture, "hello");
        command.timestamp = None;
        let before = Timestamp::now();

        // when (操作):
        let outcome = usecase
            .execute(&fixture.group_id, None, command)
            .await
            .unwrap();

        // then (期待する結果):
        let SendOutcome::Delivered { message, .. } = outcome else {
            panic!("expected delivery");
        };
        assert!(message.timestamp >= before.value());
    }

    #[tokio::test]
    async fn test_toxic_message_is_blocked() {
        // テスト項目: 拒否されたメッセージは保存も配信もされない
        // given (前提条件):
        let fixture = create_fixture().await;
        let (_session, mut rx) = join_session(&fixture.registry, &fixture.group_id).await;
        let mut messages = MockMessageStore::new();
        messages.expect_append().never();
        let usecase = usecase(
            &fixture,
            Arc::new(messages),
            Arc::new(keyword_classifier()),
            Duration::from_secs(1),
        );

        // when (操作):
        let outcome = usecase
            .execute(&fixture.group_id, None, command(&fixture, "you are toxic"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            outcome,
            SendOutcome::Blocked(ToxicityVerdict::deny("Toxic content detected", 0.92))
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_classifier_failure_fails_closed() {
        // テスト項目: 判定サービスの障害時は Dependency エラーで、保存されない
        // given (前提条件):
        let fixture = create_fixture().await;
        let mut classifier = MockToxicityClassifier::new();
        classifier
            .expect_classify()
            .returning(|_| Err(ClassifierError::Status(500)));
        let mut messages = MockMessageStore::new();
        messages.expect_append().never();
        let usecase = usecase(
            &fixture,
            Arc::new(messages),
            Arc::new(classifier),
            Duration::from_secs(1),
        );

        // when (操作):
        let result = usecase
            .execute(&fixture.group_id, None, command(&fixture, "hello"))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(RelayError::Dependency(_))));
    }

    #[tokio::test]
    async fn test_classifier_timeout_fails_closed() {
        // テスト項目: 判定がタイムアウトした場合は Dependency エラーで、保存されない
        // given (前提条件):
        let fixture = create_fixture().await;
        let messages = Arc::new(InMemoryMessageStore::default());
        let usecase = usecase(
            &fixture,
            messages.clone(),
            Arc::new(SlowClassifier(Duration::from_secs(5))),
            Duration::from_millis(50),
        );

        // when (操作):
        let result = usecase
            .execute(&fixture.group_id, None, command(&fixture, "hello"))
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RelayError::Dependency(
                "toxicity check timed out after 50 ms".to_string()
            ))
        );
        assert!(
            messages
                .list_by_group(&fixture.group_id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_send_to_other_group_is_rejected() {
        // テスト項目: 参加中のグループ以外への送信は Authorization エラー
        // given (前提条件):
        let fixture = create_fixture().await;
        let mut classifier = MockToxicityClassifier::new();
        classifier.expect_classify().never();
        let usecase = usecase(
            &fixture,
            Arc::new(InMemoryMessageStore::default()),
            Arc::new(classifier),
            Duration::from_secs(1),
        );

        // when (操作):
        let result = usecase
            .execute(&IdFactory::group_id(), None, command(&fixture, "hello"))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(RelayError::Authorization(_))));
    }

    #[tokio::test]
    async fn test_impersonation_is_rejected() {
        // テスト項目: 認証済みセッションが別ユーザーとして送信すると Authorization エラー
        // given (前提条件):
        let fixture = create_fixture().await;
        let usecase = usecase(
            &fixture,
            Arc::new(InMemoryMessageStore::default()),
            Arc::new(keyword_classifier()),
            Duration::from_secs(1),
        );
        let mallory = IdFactory::user_id();

        // when (操作):
        let result = usecase
            .execute(&fixture.group_id, Some(&mallory), command(&fixture, "hi"))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(RelayError::Authorization(_))));
    }

    #[tokio::test]
    async fn test_authenticated_sender_matches() {
        // テスト項目: 認証済みユーザー本人としての送信は許可される
        // given (前提条件):
        let fixture = create_fixture().await;
        let usecase = usecase(
            &fixture,
            Arc::new(InMemoryMessageStore::default()),
            Arc::new(keyword_classifier()),
            Duration::from_secs(1),
        );
        let alice = fixture.alice.clone();

        // when (操作):
        let result = usecase
            .execute(&fixture.group_id, Some(&alice), command(&fixture, "hi"))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Ok(SendOutcome::Delivered { .. })));
    }

    #[tokio::test]
    async fn test_unknown_sender_is_not_found() {
        // テスト項目: 存在しない送信者は NotFound エラー
        // given (前提条件):
        let fixture = create_fixture().await;
        let usecase = usecase(
            &fixture,
            Arc::new(InMemoryMessageStore::default()),
            Arc::new(keyword_classifier()),
            Duration::from_secs(1),
        );
        let mut command = command(&fixture, "hello");
        command.sender = IdFactory::user_id();

        // when (操作):
        let result = usecase.execute(&fixture.group_id, None, command).await;

        // then (期待する結果):
        assert!(matches!(result, Err(RelayError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_store_failure_is_not_delivered() {
        // テスト項目: 保存に失敗したメッセージは配信されない
        // given (前提条件):
        let fixture = create_fixture().await;
        let (_session, mut rx) = join_session(&fixture.registry, &fixture.group_id).await;
        let mut messages = MockMessageStore::new();
        messages
            .expect_append()
            .returning(|_| Err(RepositoryError::Unavailable("disk full".to_string())));
        let usecase = usecase(
            &fixture,
            Arc::new(messages),
            Arc::new(keyword_classifier()),
            Duration::from_secs(1),
        );

        // when (操作):
        let result = usecase
            .execute(&fixture.group_id, None, command(&fixture, "hello"))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RelayError::Dependency("disk full".to_string())));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_concurrent_sends_are_delivered_in_store_order() {
        // テスト項目: 同じグループへの並行送信は保存順に配信される
        // given (前提条件):
        let fixture = create_fixture().await;
        let (_session, mut rx) = join_session(&fixture.registry, &fixture.group_id).await;
        let messages = Arc::new(InMemoryMessageStore::default());
        let usecase = Arc::new(usecase(
            &fixture,
            messages.clone(),
            Arc::new(keyword_classifier()),
            Duration::from_secs(1),
        ));

        // when (操作):
        let mut handles = Vec::new();
        for i in 0..20 {
            let usecase = usecase.clone();
            let group_id = fixture.group_id.clone();
            let command = command(&fixture, &format!("message {i}"));
            handles.push(tokio::spawn(async move {
                usecase.execute(&group_id, None, command).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // then (期待する結果):
        let stored: Vec<String> = messages
            .list_by_group(&fixture.group_id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id.into_string())
            .collect();
        let mut delivered = Vec::new();
        while let Ok(ServerMessage::ChatMessage(dto)) = rx.try_recv() {
            delivered.push(dto.id);
        }
        assert_eq!(delivered, stored);
    }
}
