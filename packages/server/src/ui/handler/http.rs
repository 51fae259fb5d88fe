//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequestParts, Path, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};

use crate::{
    domain::{
        DisplayName, Group, GroupId, IdFactory, RepositoryError, Timestamp, UserId,
        ValueObjectError,
    },
    infrastructure::{
        auth::CredentialError,
        dto::{
            http::{
                AddUserRequest, AuthResponse, AvatarRequest, CreateGroupRequest, GroupDto,
                LoginRequest, MembershipResponse, SignupRequest, UpdateUserRequest, UserDto,
            },
            websocket::MessageDto,
        },
    },
    ui::state::AppState,
    usecase::{
        AuthError, AuthOutcome, DeleteUserUseCase, GroupHistoryUseCase, LoginUseCase,
        RelayError, SeedMembershipUseCase, SignupInput, SignupUseCase, UpdateUserUseCase,
        UserUpdate,
    },
};

/// Error response: `{"error": "<message>"}` with a matching status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub(crate) fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{} {}", self.status, self.message);
        }
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

impl From<ValueObjectError> for ApiError {
    fn from(err: ValueObjectError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err.to_string())
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        let status = match err {
            RepositoryError::NotFound(_) => StatusCode::NOT_FOUND,
            RepositoryError::Conflict(_) => StatusCode::CONFLICT,
            RepositoryError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self::new(status, err.to_string())
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        let status = match err {
            RelayError::NotFound(_) => StatusCode::NOT_FOUND,
            RelayError::Authorization(_) => StatusCode::FORBIDDEN,
            RelayError::Dependency(_) => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
        };
        Self::new(status, err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            AuthError::EmailTaken => Self::new(StatusCode::CONFLICT, err.to_string()),
            AuthError::Forbidden(_) => Self::new(StatusCode::FORBIDDEN, err.to_string()),
            AuthError::InvalidCredentials | AuthError::Credential(CredentialError::InvalidToken) => {
                Self::unauthorized(err.to_string())
            }
            AuthError::Credential(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            AuthError::Store(e) => e.into(),
        }
    }
}

/// Caller identified by an `Authorization: Bearer <token>` header
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserId);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
        let claims = state
            .tokens
            .verify(token)
            .map_err(|e| ApiError::unauthorized(e.to_string()))?;
        let user_id = claims
            .user_id()
            .map_err(|e| ApiError::unauthorized(e.to_string()))?;
        Ok(AuthUser(user_id))
    }
}

impl From<AuthOutcome> for AuthResponse {
    fn from(outcome: AuthOutcome) -> Self {
        Self {
            user_id: outcome.user_id.into_string(),
            token: outcome.token,
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Register a user. Group memberships are seeded in the background.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let usecase = SignupUseCase::new(
        state.identity.clone(),
        state.tokens.clone(),
        state.config.bcrypt_cost,
    );
    let outcome = usecase
        .execute(SignupInput {
            email: request.email,
            password: request.password,
            name: request.name,
            avatar: request.avatar,
        })
        .await?;

    let seed = SeedMembershipUseCase::new(state.identity.clone());
    let user_id = outcome.user_id.clone();
    tokio::spawn(async move {
        if let Err(e) = seed.execute(&user_id).await {
            tracing::warn!("Membership seeding for user '{}' failed: {}", user_id, e);
        }
    });

    Ok((StatusCode::CREATED, Json(outcome.into())))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let usecase = LoginUseCase::new(state.identity.clone(), state.tokens.clone());
    let outcome = usecase.execute(request.email, request.password).await?;
    Ok(Json(outcome.into()))
}

/// Profile of the authenticated caller
pub async fn current_user(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserDto>, ApiError> {
    let user = state.identity.get_user(&user_id).await?;
    Ok(Json(UserDto::from(&user)))
}

/// Public profile of any user
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserDto>, ApiError> {
    let user_id = UserId::new(user_id)?;
    let user = state.identity.get_user(&user_id).await?;
    Ok(Json(UserDto::from(&user)))
}

/// Update the caller's own profile
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserDto>, ApiError> {
    let user_id = UserId::new(user_id)?;
    let usecase = UpdateUserUseCase::new(state.identity.clone(), state.config.bcrypt_cost);
    let user = usecase
        .execute(
            &caller,
            &user_id,
            UserUpdate {
                name: request.name,
                email: request.email,
                password: request.password,
                avatar: request.avatar,
            },
        )
        .await?;
    Ok(Json(UserDto::from(&user)))
}

pub async fn update_avatar(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<String>,
    Json(request): Json<AvatarRequest>,
) -> Result<Json<UserDto>, ApiError> {
    let user_id = UserId::new(user_id)?;
    let usecase = UpdateUserUseCase::new(state.identity.clone(), state.config.bcrypt_cost);
    let user = usecase
        .update_avatar(&caller, &user_id, request.avatar)
        .await?;
    Ok(Json(UserDto::from(&user)))
}

/// Delete the caller's own account
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user_id = UserId::new(user_id)?;
    DeleteUserUseCase::new(state.identity.clone())
        .execute(&caller, &user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// All groups, sorted by name
pub async fn list_groups(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GroupDto>>, ApiError> {
    let groups = state.identity.list_groups().await?;
    Ok(Json(groups.iter().map(GroupDto::from).collect()))
}

pub async fn create_group(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupDto>), ApiError> {
    let group = Group::new(
        IdFactory::group_id(),
        DisplayName::new(request.name)?,
        request
            .description
            .filter(|description| !description.trim().is_empty()),
        Timestamp::now(),
    );
    state.identity.insert_group(group.clone()).await?;
    tracing::info!("Group '{}' created ({})", group.name, group.id);
    Ok((StatusCode::CREATED, Json(GroupDto::from(&group))))
}

/// Groups the user belongs to, sorted by name
pub async fn list_user_groups(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<GroupDto>>, ApiError> {
    let user_id = UserId::new(user_id)?;
    let groups = state.identity.list_groups_for_member(&user_id).await?;
    Ok(Json(groups.iter().map(GroupDto::from).collect()))
}

/// Idempotently add a user to a group
pub async fn add_user_to_group(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
    Json(request): Json<AddUserRequest>,
) -> Result<Json<MembershipResponse>, ApiError> {
    let group_id = GroupId::new(group_id)?;
    let user_id = UserId::new(request.user_id)?;
    state.identity.get_user(&user_id).await?;
    let added = state.identity.add_member(&group_id, &user_id).await?;
    Ok(Json(MembershipResponse {
        group_id: group_id.into_string(),
        user_id: user_id.into_string(),
        added,
    }))
}

/// Idempotently add the caller to a group
pub async fn join_group(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(group_id): Path<String>,
) -> Result<Json<MembershipResponse>, ApiError> {
    let group_id = GroupId::new(group_id)?;
    let added = state.identity.add_member(&group_id, &user_id).await?;
    Ok(Json(MembershipResponse {
        group_id: group_id.into_string(),
        user_id: user_id.into_string(),
        added,
    }))
}

/// Message history of a group, oldest first
pub async fn group_messages(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let group_id = GroupId::new(group_id)?;
    let usecase = GroupHistoryUseCase::new(state.identity.clone(), state.messages.clone());
    let history = usecase.execute(&group_id).await?;
    Ok(Json(history))
}
