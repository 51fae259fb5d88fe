//! UseCase 層のエラー定義

use thiserror::Error;

use crate::{
    domain::{ClassifierError, RepositoryError, ValueObjectError},
    infrastructure::{
        RegistryError,
        auth::CredentialError,
        dto::websocket::{ErrorDto, ErrorKind, ServerMessage},
    },
};

/// Chat Relay のエラー分類
///
/// どのエラーも発生元のセッションにのみ通知され、接続や他のセッションには影響しない。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// 対象のユーザー・グループが存在しない
    #[error("not found: {0}")]
    NotFound(String),

    /// 参加していないグループへの送信、なりすまし、切断後の操作
    #[error("not authorized: {0}")]
    Authorization(String),

    /// ストアまたは毒性判定サービスの障害（fail closed）
    #[error("dependency failure: {0}")]
    Dependency(String),

    /// 空のメッセージや不正な ID
    #[error("invalid input: {0}")]
    Validation(String),
}

impl RelayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::NotFound(_) => ErrorKind::NotFound,
            RelayError::Authorization(_) => ErrorKind::Authorization,
            RelayError::Dependency(_) => ErrorKind::Dependency,
            RelayError::Validation(_) => ErrorKind::Validation,
        }
    }

    /// セッションへ送る error イベントに変換
    pub fn to_server_message(&self) -> ServerMessage {
        ServerMessage::Error(ErrorDto {
            kind: self.kind(),
            message: self.to_string(),
        })
    }
}

impl From<ValueObjectError> for RelayError {
    fn from(err: ValueObjectError) -> Self {
        RelayError::Validation(err.to_string())
    }
}

impl From<RepositoryError> for RelayError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => RelayError::NotFound(what),
            RepositoryError::Conflict(what) => RelayError::Validation(what),
            RepositoryError::Unavailable(reason) => RelayError::Dependency(reason),
        }
    }
}

impl From<ClassifierError> for RelayError {
    fn from(err: ClassifierError) -> Self {
        RelayError::Dependency(err.to_string())
    }
}

impl From<RegistryError> for RelayError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::GroupNotFound(group_id) => {
                RelayError::NotFound(format!("group {group_id}"))
            }
            RegistryError::SessionNotRegistered(session_id) => {
                RelayError::Authorization(format!("session {session_id} is not connected"))
            }
            RegistryError::Store(err) => err.into(),
        }
    }
}

/// サインアップ・ログイン・アカウント操作のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("e-mail already registered")]
    EmailTaken,

    #[error("invalid credentials")]
    InvalidCredentials,

    /// 他人のアカウントに対する操作
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("store failure: {0}")]
    Store(RepositoryError),
}

impl From<ValueObjectError> for AuthError {
    fn from(err: ValueObjectError) -> Self {
        AuthError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IdFactory;

    #[test]
    fn test_repository_error_mapping() {
        // テスト項目: ストアのエラーが Relay のエラー分類に変換される
        // then (期待する結果):
        assert_eq!(
            RelayError::from(RepositoryError::NotFound("user x".to_string())),
            RelayError::NotFound("user x".to_string())
        );
        assert_eq!(
            RelayError::from(RepositoryError::Unavailable("down".to_string())),
            RelayError::Dependency("down".to_string())
        );
    }

    #[test]
    fn test_registry_error_mapping() {
        // テスト項目: Registry のエラーが Relay のエラー分類に変換される
        // given (前提条件):
        let group_id = IdFactory::group_id();

        // then (期待する結果):
        assert_eq!(
            RelayError::from(RegistryError::GroupNotFound(group_id.clone())).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            RelayError::from(RegistryError::SessionNotRegistered(IdFactory::session_id()))
                .kind(),
            ErrorKind::Authorization
        );
        assert_eq!(
            RelayError::from(RegistryError::Store(RepositoryError::Unavailable(
                "down".to_string()
            )))
            .kind(),
            ErrorKind::Dependency
        );
    }

    #[test]
    fn test_classifier_error_is_dependency() {
        // テスト項目: 毒性判定サービスの障害は Dependency に分類される
        // then (期待する結果):
        assert_eq!(
            RelayError::from(ClassifierError::Timeout(5000)).kind(),
            ErrorKind::Dependency
        );
    }

    #[test]
    fn test_to_server_message() {
        // テスト項目: error イベントに種別とメッセージが含まれる
        // given (前提条件):
        let err = RelayError::Validation("MessageContent cannot be empty".to_string());

        // when (操作):
        let message = err.to_server_message();

        // then (期待する結果):
        assert_eq!(
            message,
            ServerMessage::Error(ErrorDto {
                kind: ErrorKind::Validation,
                message: "invalid input: MessageContent cannot be empty".to_string(),
            })
        );
    }
}
