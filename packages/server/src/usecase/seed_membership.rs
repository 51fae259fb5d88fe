//! UseCase: グループメンバーシップの初期登録
//!
//! 新規ユーザーを既存の全グループに追加する。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SeedMembershipUseCase::execute() メソッド
//! - 全グループへの冪等な追加と、結果の集計
//!
//! ### なぜこのテストが必要か
//! - 2 回実行されてもメンバーが重複しない
//! - 一部のグループで失敗しても残りのグループには追加される
//!
//! ### どのような状況を想定しているか
//! - 正常系：3 グループへの追加、2 回目の実行
//! - 異常系：一部のグループで失敗、グループ一覧の取得失敗
//! - エッジケース：グループが 0 件

use std::sync::Arc;

use futures_util::future::join_all;

use crate::domain::{GroupId, IdentityStore, RepositoryError, UserId};

/// 初期登録の集計結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub added: usize,
    pub already_member: usize,
    pub failed: Vec<(GroupId, RepositoryError)>,
}

/// メンバーシップ初期登録のユースケース
pub struct SeedMembershipUseCase {
    identity: Arc<dyn IdentityStore>,
}

impl SeedMembershipUseCase {
    pub fn new(identity: Arc<dyn IdentityStore>) -> Self {
        Self { identity }
    }

    /// ユーザーを全グループに追加する（グループごとに並行実行）
    ///
    /// # Returns
    ///
    /// * `Ok(SeedReport)` - グループごとの結果の集計
    /// * `Err(RepositoryError)` - グループ一覧を取得できなかった
    pub async fn execute(&self, user_id: &UserId) -> Result<SeedReport, RepositoryError> {
        let groups = self.identity.list_groups().await?;

        let results = join_all(groups.iter().map(|group| async move {
            let result = self.identity.add_member(&group.id, user_id).await;
            (group.id.clone(), result)
        }))
        .await;

        let mut report = SeedReport::default();
        for (group_id, result) in results {
            match result {
                Ok(true) => report.added += 1,
                Ok(false) => report.already_member += 1,
                Err(e) => {
                    tracing::warn!(
                        "Failed to add user '{}' to group '{}': {}",
                        user_id,
                        group_id,
                        e
                    );
                    report.failed.push((group_id, e));
                }
            }
        }

        tracing::info!(
            "Seeded memberships for user '{}': {} added, {} already member, {} failed",
            user_id,
            report.added,
            report.already_member,
            report.failed.len()
        );
        Ok(report)
    }
}
