//! UseCase: ユーザー登録
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SignupUseCase::execute() メソッド
//! - 入力の検証、メールアドレスの重複チェック、パスワードのハッシュ化、トークン発行
//!
//! ### なぜこのテストが必要か
//! - 平文のパスワードを保存しないこと
//! - 同じメールアドレスで 2 回登録できないこと
//!
//! ### どのような状況を想定しているか
//! - 正常系：登録とトークン発行
//! - 異常系：重複したメールアドレス、不正な入力、ストア障害

use std::sync::Arc;

use crate::{
    domain::{
        DisplayName, Email, IdFactory, IdentityStore, RepositoryError, Timestamp, User, UserId,
    },
    infrastructure::auth::{TokenService, hash_password},
};

use super::error::AuthError;

/// 登録内容（未検証）
#[derive(Debug, Clone)]
pub struct SignupInput {
    pub email: String,
    pub password: String,
    pub name: String,
    pub avatar: Option<String>,
}

/// 登録・ログインの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub user_id: UserId,
    pub token: String,
}

/// ユーザー登録のユースケース
pub struct SignupUseCase {
    identity: Arc<dyn IdentityStore>,
    tokens: Arc<TokenService>,
    bcrypt_cost: u32,
}

impl SignupUseCase {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        tokens: Arc<TokenService>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            identity,
            tokens,
            bcrypt_cost,
        }
    }

    /// ユーザーを登録してトークンを発行する
    ///
    /// グループへの初期登録は呼び出し側で行う。
    pub async fn execute(&self, input: SignupInput) -> Result<AuthOutcome, AuthError> {
        // 1. 入力の検証
        let email = Email::new(input.email)?;
        let name = DisplayName::new(input.name)?;
        if input.password.is_empty() {
            return Err(AuthError::Validation("password cannot be empty".to_string()));
        }

        // 2. 重複チェック
        match self.identity.find_user_by_email(&email).await {
            Ok(_) => return Err(AuthError::EmailTaken),
            Err(RepositoryError::NotFound(_)) => {}
            Err(e) => return Err(AuthError::Store(e)),
        }

        // 3. 保存
        let password_hash = hash_password(input.password, self.bcrypt_cost).await?;
        let user = User::new(
            IdFactory::user_id(),
            email,
            name,
            password_hash,
            input.avatar.filter(|avatar| !avatar.trim().is_empty()),
            Timestamp::now(),
        );
        let user_id = user.id.clone();
        let email = user.email.clone();
        self.identity.insert_user(user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::EmailTaken,
            e => AuthError::Store(e),
        })?;

        // 4. トークン発行
        let token = self.tokens.issue(&user_id, &email)?;
        tracing::info!("User '{}' signed up", user_id);
        Ok(AuthOutcome { user_id, token })
    }
}
