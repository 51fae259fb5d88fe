//! UseCase: ログイン

use std::sync::Arc;

use crate::{
    domain::{Email, IdentityStore, RepositoryError},
    infrastructure::auth::{TokenService, verify_password},
};

use super::{error::AuthError, signup::AuthOutcome};

/// ログインのユースケース
pub struct LoginUseCase {
    identity: Arc<dyn IdentityStore>,
    tokens: Arc<TokenService>,
}

impl LoginUseCase {
    pub fn new(identity: Arc<dyn IdentityStore>, tokens: Arc<TokenService>) -> Self {
        Self { identity, tokens }
    }

    /// メールアドレスとパスワードを照合してトークンを発行する
    ///
    /// 未登録のメールアドレスと誤ったパスワードは区別しない。
    pub async fn execute(
        &self,
        email: String,
        password: String,
    ) -> Result<AuthOutcome, AuthError> {
        let email = Email::new(email).map_err(|_| AuthError::InvalidCredentials)?;
        let user = match self.identity.find_user_by_email(&email).await {
            Ok(user) => user,
            Err(RepositoryError::NotFound(_)) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(AuthError::Store(e)),
        };

        if !verify_password(password, user.password_hash.clone()).await {
            tracing::warn!("Failed login attempt for user '{}'", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user.id, &user.email)?;
        tracing::info!("User '{}' logged in", user.id);
        Ok(AuthOutcome {
            user_id: user.id,
            token,
        })
    }
}
