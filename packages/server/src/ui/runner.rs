//! Router assembly and server lifecycle.

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::ServerConfig,
    domain::{DisplayName, Group, IdFactory, IdentityStore, MessageStore, Timestamp},
    error::ServerError,
    infrastructure::{
        HttpToxicityClassifier, RoomRegistry,
        auth::TokenService,
        repository::{InMemoryIdentityStore, InMemoryMessageStore},
    },
    ui::{handler, signal::shutdown_signal, state::AppState},
    usecase::RelayServices,
};

/// Wire stores, registry and use cases, create the configured groups and
/// build the router.
pub async fn create_app(config: &ServerConfig) -> Result<(Router, Arc<AppState>), ServerError> {
    let identity: Arc<dyn IdentityStore> = Arc::new(InMemoryIdentityStore::new());
    let messages: Arc<dyn MessageStore> = Arc::new(InMemoryMessageStore::new());
    let classifier = Arc::new(HttpToxicityClassifier::new(
        &config.classifier_url,
        config.classifier_timeout,
    )?);
    let registry = Arc::new(RoomRegistry::new(identity.clone()));
    let relay = Arc::new(RelayServices::new(
        identity.clone(),
        messages.clone(),
        classifier,
        registry.clone(),
        config.classifier_timeout,
    ));

    seed_groups(identity.as_ref(), &config.seed_groups).await?;

    let state = Arc::new(AppState {
        identity,
        messages,
        registry,
        relay,
        tokens: Arc::new(TokenService::new(&config.jwt_secret, config.token_ttl)),
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(config.cors_origin.parse::<HeaderValue>().map_err(|_| {
            ServerError::Config(format!("invalid CORS origin: {}", config.cors_origin))
        })?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let app = Router::new()
        .route("/api/health", get(handler::health_check))
        .route("/api/signup", post(handler::signup))
        .route("/api/login", post(handler::login))
        .route("/api/user", get(handler::current_user))
        .route(
            "/api/groups",
            get(handler::list_groups).post(handler::create_group),
        )
        .route(
            "/api/users/{user_id}",
            get(handler::get_user)
                .put(handler::update_user)
                .delete(handler::delete_user),
        )
        .route("/api/users/{user_id}/avatar", put(handler::update_avatar))
        .route("/api/users/{user_id}/groups", get(handler::list_user_groups))
        .route(
            "/api/groups/{group_id}/add-user",
            post(handler::add_user_to_group),
        )
        .route("/api/join-group/{group_id}", post(handler::join_group))
        .route("/api/messages/{group_id}", get(handler::group_messages))
        .route("/ws", get(handler::websocket_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    Ok((app, state))
}

/// Create one group per configured name, skipping duplicates
async fn seed_groups(identity: &dyn IdentityStore, names: &[String]) -> Result<(), ServerError> {
    let mut taken: Vec<DisplayName> = identity
        .list_groups()
        .await?
        .into_iter()
        .map(|group| group.name)
        .collect();
    for name in names {
        let name = DisplayName::new(name.clone())?;
        if taken.contains(&name) {
            continue;
        }
        taken.push(name.clone());
        let group = Group::new(IdFactory::group_id(), name, None, Timestamp::now());
        tracing::info!("Creating group '{}' ({})", group.name, group.id);
        identity.insert_group(group).await?;
    }
    Ok(())
}

/// Bind the configured address and serve until Ctrl-C or SIGTERM.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let (app, _state) = create_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.addr,
            source,
        })?;
    tracing::info!("listening on {}", listener.local_addr()?);
    tracing::info!("toxicity classifier at {}", config.classifier_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}
