//! UseCase: セッション切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectSessionUseCase::execute() メソッド
//! - 切断したセッションが全グループの配信対象から外れること
//!
//! ### なぜこのテストが必要か
//! - 切断後のセッションに配信し続けると、閉じたチャンネルへの送信が積み重なる
//!
//! ### どのような状況を想定しているか
//! - 正常系：複数グループに参加中のセッションの切断
//! - エッジケース：2 回目の切断、未登録セッションの切断

use std::sync::Arc;

use crate::{
    domain::{GroupId, SessionId},
    infrastructure::RoomRegistry,
};

/// セッション切断のユースケース
pub struct DisconnectSessionUseCase {
    registry: Arc<RoomRegistry>,
}

impl DisconnectSessionUseCase {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// セッションを Registry から取り除く
    ///
    /// 何度呼んでもよい。参加していたグループを返す。
    pub async fn execute(&self, session_id: &SessionId) -> Vec<GroupId> {
        let groups = self.registry.leave(session_id).await;
        tracing::info!(
            "Session '{}' disconnected (left {} group(s))",
            session_id,
            groups.len()
        );
        groups
    }
}
