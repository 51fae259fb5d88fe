//! UseCase: プロフィールの更新
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - UpdateUserUseCase::execute() / update_avatar() メソッド
//! - 名前・メールアドレス・パスワード・アバターの部分更新
//!
//! ### なぜこのテストが必要か
//! - 本人以外がプロフィールを書き換えられないこと
//! - 新しいパスワードが平文のまま保存されないこと
//! - 他人のメールアドレスを奪えないこと
//!
//! ### どのような状況を想定しているか
//! - 正常系：一部の項目だけの更新、パスワードの再ハッシュ
//! - 異常系：他人の更新、重複したメールアドレス、空のパスワード・アバター、存在しないユーザー

use std::sync::Arc;

use crate::{
    domain::{DisplayName, Email, IdentityStore, RepositoryError, User, UserId},
    infrastructure::auth::hash_password,
};

use super::error::AuthError;

/// 更新内容（未検証）。`None` の項目は変更しない
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// 空文字はアバターの削除
    pub avatar: Option<String>,
}

/// プロフィール更新のユースケース
pub struct UpdateUserUseCase {
    identity: Arc<dyn IdentityStore>,
    bcrypt_cost: u32,
}

impl UpdateUserUseCase {
    pub fn new(identity: Arc<dyn IdentityStore>, bcrypt_cost: u32) -> Self {
        Self {
            identity,
            bcrypt_cost,
        }
    }

    /// 本人のプロフィールを更新し、更新後のユーザーを返す
    pub async fn execute(
        &self,
        actor: &UserId,
        target: &UserId,
        update: UserUpdate,
    ) -> Result<User, AuthError> {
        if actor != target {
            return Err(AuthError::Forbidden(format!(
                "user {actor} cannot modify user {target}"
            )));
        }

        // 1. 入力の検証
        let name = update.name.map(DisplayName::new).transpose()?;
        let email = update.email.map(Email::new).transpose()?;
        if update.password.as_deref() == Some("") {
            return Err(AuthError::Validation("password cannot be empty".to_string()));
        }

        // 2. 現在の値に上書き
        let mut user = self.identity.get_user(target).await.map_err(AuthError::Store)?;
        if let Some(name) = name {
            user.name = name;
        }
        if let Some(email) = email {
            user.email = email;
        }
        if let Some(password) = update.password {
            user.password_hash = hash_password(password, self.bcrypt_cost).await?;
        }
        if let Some(avatar) = update.avatar {
            user.avatar = Some(avatar).filter(|avatar| !avatar.trim().is_empty());
        }

        // 3. 保存
        self.identity
            .update_user(user.clone())
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                e => AuthError::Store(e),
            })?;
        tracing::info!("User '{}' updated their profile", target);
        Ok(user)
    }

    /// アバターだけを差し替える。空のアバターは受け付けない
    pub async fn update_avatar(
        &self,
        actor: &UserId,
        target: &UserId,
        avatar: String,
    ) -> Result<User, AuthError> {
        if avatar.trim().is_empty() {
            return Err(AuthError::Validation("avatar cannot be empty".to_string()));
        }
        self.execute(
            actor,
            target,
            UserUpdate {
                avatar: Some(avatar),
                ..UserUpdate::default()
            },
        )
        .await
    }
}
