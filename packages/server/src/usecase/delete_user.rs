//! UseCase: アカウントの削除
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DeleteUserUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 本人以外がアカウントを削除できないこと
//! - 削除したユーザーがグループのメンバー一覧に残らないこと
//!
//! ### どのような状況を想定しているか
//! - 正常系：本人による削除
//! - 異常系：他人による削除、存在しないユーザー

use std::sync::Arc;

use crate::domain::{IdentityStore, UserId};

use super::error::AuthError;

/// アカウント削除のユースケース
///
/// 送信済みのメッセージは残り、送信者名は表示されなくなる。
pub struct DeleteUserUseCase {
    identity: Arc<dyn IdentityStore>,
}

impl DeleteUserUseCase {
    pub fn new(identity: Arc<dyn IdentityStore>) -> Self {
        Self { identity }
    }

    pub async fn execute(&self, actor: &UserId, target: &UserId) -> Result<(), AuthError> {
        if actor != target {
            return Err(AuthError::Forbidden(format!(
                "user {actor} cannot delete user {target}"
            )));
        }
        self.identity
            .delete_user(target)
            .await
            .map_err(AuthError::Store)?;
        tracing::info!("User '{}' deleted their account", target);
        Ok(())
    }
}
