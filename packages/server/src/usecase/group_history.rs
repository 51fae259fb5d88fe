//! UseCase: グループのメッセージ履歴取得
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - GroupHistoryUseCase::execute() メソッド
//! - 履歴がタイムスタンプ昇順で返り、送信者名が解決されること
//!
//! ### なぜこのテストが必要か
//! - join 直後に届く previous messages の内容を保証する
//! - 送信者のユーザーが削除されていても履歴は返す（名前なし）
//!
//! ### どのような状況を想定しているか
//! - 正常系：複数の送信者による履歴
//! - 異常系：グループが存在しない、ストア障害
//! - エッジケース：履歴が空、送信者が存在しない

use std::{collections::HashMap, sync::Arc};

use crate::{
    domain::{GroupId, IdentityStore, MessageStore, RepositoryError, UserId},
    infrastructure::dto::websocket::MessageDto,
};

use super::error::RelayError;

/// メッセージ履歴取得のユースケース
pub struct GroupHistoryUseCase {
    identity: Arc<dyn IdentityStore>,
    messages: Arc<dyn MessageStore>,
}

impl GroupHistoryUseCase {
    pub fn new(identity: Arc<dyn IdentityStore>, messages: Arc<dyn MessageStore>) -> Self {
        Self { identity, messages }
    }

    /// グループの全メッセージを古い順に返す
    ///
    /// * `Err(RelayError::NotFound)` - グループが存在しない
    /// * `Err(RelayError::Dependency)` - ストア障害
    pub async fn execute(&self, group_id: &GroupId) -> Result<Vec<MessageDto>, RelayError> {
        // 1. グループの存在確認
        self.identity.get_group(group_id).await?;

        // 2. 履歴の取得
        let history = self.messages.list_by_group(group_id).await?;

        // 3. 送信者名の解決（同じ送信者は 1 回だけ引く）
        let mut names: HashMap<UserId, Option<String>> = HashMap::new();
        let mut dtos = Vec::with_capacity(history.len());
        for message in &history {
            let name = match names.get(&message.sender) {
                Some(name) => name.clone(),
                None => {
                    let name = self.sender_name(&message.sender).await?;
                    names.insert(message.sender.clone(), name.clone());
                    name
                }
            };
            dtos.push(MessageDto::new(message, name));
        }
        Ok(dtos)
    }

    async fn sender_name(&self, user_id: &UserId) -> Result<Option<String>, RelayError> {
        match self.identity.get_user(user_id).await {
            Ok(user) => Ok(Some(user.name.as_str().to_string())),
            Err(RepositoryError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
