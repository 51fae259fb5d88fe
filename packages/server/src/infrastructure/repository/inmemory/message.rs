//! InMemory Message Store 実装
//!
//! グループごとのメッセージ履歴を追記専用で保持します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{GroupId, IdFactory, Message, MessageStore, NewMessage, RepositoryError};

/// インメモリ Message Store 実装
#[derive(Default)]
pub struct InMemoryMessageStore {
    /// グループ ID ごとのメッセージ（挿入順）
    messages: RwLock<HashMap<GroupId, Vec<Message>>>,
}

impl InMemoryMessageStore {
    /// 新しい InMemoryMessageStore を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, message: NewMessage) -> Result<Message, RepositoryError> {
        let persisted = Message::persisted(IdFactory::message_id(), message);
        let mut messages = self.messages.write().await;
        messages
            .entry(persisted.group.clone())
            .or_default()
            .push(persisted.clone());
        Ok(persisted)
    }

    async fn list_by_group(&self, group_id: &GroupId) -> Result<Vec<Message>, RepositoryError> {
        let messages = self.messages.read().await;
        let mut history = messages.get(group_id).cloned().unwrap_or_default();
        // stable sort: equal timestamps keep insertion order
        history.sort_by_key(|message| message.timestamp);
        Ok(history)
    }
}
