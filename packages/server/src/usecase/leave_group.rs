//! UseCase: グループ退出処理

use std::sync::Arc;

use crate::{
    domain::{GroupId, SessionId},
    infrastructure::RoomRegistry,
};

/// グループ退出のユースケース
pub struct LeaveGroupUseCase {
    registry: Arc<RoomRegistry>,
}

impl LeaveGroupUseCase {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// 参加していなければ何もしない。退出した場合は `true`
    pub async fn execute(&self, session_id: &SessionId, group_id: &GroupId) -> bool {
        let left = self.registry.leave_group(group_id, session_id).await;
        if left {
            tracing::info!("Session '{}' left group '{}'", session_id, group_id);
        }
        left
    }
}
