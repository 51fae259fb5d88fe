//! UseCase: グループ参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinGroupUseCase::execute() メソッド
//! - 参加先グループの検証と Registry への登録、前のグループからの退出
//!
//! ### なぜこのテストが必要か
//! - 1 接続につき参加中のグループは 1 つだけ
//! - 失敗した参加は Registry を一切変更しない（前のグループにも残る）
//!
//! ### どのような状況を想定しているか
//! - 正常系：初回参加、別グループへの切り替え、同じグループへの再参加
//! - 異常系：存在しないグループ、ストア障害

use std::sync::Arc;

use crate::{
    domain::{GroupId, SessionId},
    infrastructure::RoomRegistry,
};

use super::error::RelayError;

/// グループ参加のユースケース
pub struct JoinGroupUseCase {
    registry: Arc<RoomRegistry>,
}

impl JoinGroupUseCase {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// セッションをグループに参加させる
    ///
    /// # Arguments
    ///
    /// * `session_id` - 参加するセッション
    /// * `group_id` - 参加先のグループ
    /// * `previous` - 現在参加中のグループ。参加に成功した場合のみ退出する
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - 新たに参加した
    /// * `Ok(false)` - すでに参加していた
    pub async fn execute(
        &self,
        session_id: &SessionId,
        group_id: &GroupId,
        previous: Option<&GroupId>,
    ) -> Result<bool, RelayError> {
        let joined = self.registry.join(group_id, session_id).await?;

        if let Some(previous) = previous
            && previous != group_id
        {
            self.registry.leave_group(previous, session_id).await;
            tracing::info!("Session '{}' left group '{}'", session_id, previous);
        }

        tracing::info!("Session '{}' joined group '{}'", session_id, group_id);
        Ok(joined)
    }
}
