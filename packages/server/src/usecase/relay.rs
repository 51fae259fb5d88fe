//! UseCase: セッションごとの Chat Relay
//!
//! 1 つの WebSocket 接続に対応する状態機械。
//!
//! ```text
//! Connected ──join──▶ JoinPending ──ok──▶ Joined ──leave──▶ Connected
//!     ▲                    │                 │
//!     └──────── err ───────┘                 └──join(other)──▶ JoinPending
//! (any) ──disconnect──▶ Disconnected
//! ```
//!
//! エラーはすべて発生元のセッションにだけ `error` イベントとして通知する。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SessionRelay::handle() / disconnect() による状態遷移と送信イベント
//!
//! ### なぜこのテストが必要か
//! - 参加前の送信、切断後の操作が拒否されること
//! - 失敗した参加が元の状態に戻ること
//! - 送信元が切断しても保存済みのメッセージは他の参加者に届くこと
//! - 配信中に参加したセッションに同じメッセージが 2 回届かないこと
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加 → 履歴 → 送信 → 全員に配信
//! - 異常系：ブロック、参加前の送信、存在しないグループ、切断後の操作
//! - エッジケース：送信途中での切断、保存後・配信前の参加

use std::{sync::Arc, time::Duration};

use crate::{
    domain::{GroupId, IdentityStore, MessageStore, SessionId, ToxicityClassifier, UserId},
    infrastructure::{
        RoomRegistry,
        dto::websocket::{MessageBlockedDto, ServerMessage},
    },
};

use super::{
    connect_session::ConnectedSession,
    disconnect_session::DisconnectSessionUseCase,
    error::RelayError,
    group_history::GroupHistoryUseCase,
    join_group::JoinGroupUseCase,
    leave_group::LeaveGroupUseCase,
    send_message::{SendMessageCommand, SendMessageUseCase, SendOutcome},
};

/// セッションの状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    JoinPending(GroupId),
    Joined(GroupId),
    Disconnected,
}

/// クライアントからの操作（検証済み）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    JoinGroup(GroupId),
    LeaveGroup(GroupId),
    SendMessage(SendMessageCommand),
}

/// 全セッションで共有するユースケース群
pub struct RelayServices {
    registry: Arc<RoomRegistry>,
    join_group: JoinGroupUseCase,
    leave_group: LeaveGroupUseCase,
    history: GroupHistoryUseCase,
    send_message: SendMessageUseCase,
    disconnect: DisconnectSessionUseCase,
}

impl RelayServices {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        messages: Arc<dyn MessageStore>,
        classifier: Arc<dyn ToxicityClassifier>,
        registry: Arc<RoomRegistry>,
        classifier_timeout: Duration,
    ) -> Self {
        Self {
            join_group: JoinGroupUseCase::new(registry.clone()),
            leave_group: LeaveGroupUseCase::new(registry.clone()),
            history: GroupHistoryUseCase::new(identity.clone(), messages.clone()),
            send_message: SendMessageUseCase::new(
                identity,
                messages,
                classifier,
                registry.clone(),
                classifier_timeout,
            ),
            disconnect: DisconnectSessionUseCase::new(registry.clone()),
            registry,
        }
    }
}

/// 1 セッション分の Chat Relay
pub struct SessionRelay {
    services: Arc<RelayServices>,
    session_id: SessionId,
    user: Option<UserId>,
    state: SessionState,
}

impl SessionRelay {
    /// 接続済みセッションの Relay を作成（状態は Connected）
    pub fn new(services: Arc<RelayServices>, session: ConnectedSession) -> Self {
        Self {
            services,
            session_id: session.session_id,
            user: session.user,
            state: SessionState::Connected,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// 操作を処理する
    ///
    /// 失敗した場合はこのセッションに `error` イベントを送ったうえでエラーを返す。
    pub async fn handle(&mut self, command: ClientCommand) -> Result<(), RelayError> {
        let result = match command {
            ClientCommand::JoinGroup(group_id) => self.join_group(group_id).await,
            ClientCommand::LeaveGroup(group_id) => self.leave_group(group_id).await,
            ClientCommand::SendMessage(command) => self.send_message(command).await,
        };
        if let Err(e) = &result {
            self.report(e).await;
        }
        result
    }

    /// エラーをこのセッションにだけ通知する
    pub async fn report(&self, err: &RelayError) {
        tracing::warn!("Session '{}': {}", self.session_id, err);
        self.services
            .registry
            .send_to(&self.session_id, err.to_server_message())
            .await;
    }

    /// 切断。以降の操作はすべて拒否される
    pub async fn disconnect(&mut self) {
        if self.state == SessionState::Disconnected {
            return;
        }
        self.state = SessionState::Disconnected;
        self.services.disconnect.execute(&self.session_id).await;
    }

    fn ensure_connected(&self) -> Result<(), RelayError> {
        if self.state == SessionState::Disconnected {
            return Err(RelayError::Authorization(format!(
                "session {} is disconnected",
                self.session_id
            )));
        }
        Ok(())
    }

    async fn join_group(&mut self, group_id: GroupId) -> Result<(), RelayError> {
        self.ensure_connected()?;

        // 履歴を送り終えるまで保持する。配信中のメッセージは履歴かライブ配信の一方でだけ届く
        let _delivery = self.services.registry.delivery_lock(&group_id).await;

        let previous = std::mem::replace(
            &mut self.state,
            SessionState::JoinPending(group_id.clone()),
        );
        let current = match &previous {
            SessionState::Joined(current) => Some(current),
            _ => None,
        };
        if let Err(e) = self
            .services
            .join_group
            .execute(&self.session_id, &group_id, current)
            .await
        {
            self.state = previous;
            return Err(e);
        }
        self.state = SessionState::Joined(group_id.clone());

        let history = self.services.history.execute(&group_id).await?;
        self.services
            .registry
            .send_to(&self.session_id, ServerMessage::PreviousMessages(history))
            .await;
        Ok(())
    }

    async fn leave_group(&mut self, group_id: GroupId) -> Result<(), RelayError> {
        self.ensure_connected()?;

        self.services
            .leave_group
            .execute(&self.session_id, &group_id)
            .await;
        if self.state == SessionState::Joined(group_id) {
            self.state = SessionState::Connected;
        }
        Ok(())
    }

    async fn send_message(&mut self, command: SendMessageCommand) -> Result<(), RelayError> {
        self.ensure_connected()?;

        let SessionState::Joined(joined) = &self.state else {
            return Err(RelayError::Authorization(format!(
                "session has not joined group {}",
                command.group
            )));
        };

        let outcome = self
            .services
            .send_message
            .execute(joined, self.user.as_ref(), command)
            .await?;
        if let SendOutcome::Blocked(verdict) = outcome {
            self.services
                .registry
                .send_to(
                    &self.session_id,
                    ServerMessage::MessageBlocked(MessageBlockedDto::from(&verdict)),
                )
                .await;
        }
        Ok(())
    }
}
