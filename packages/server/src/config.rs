//! Server configuration: command-line flags with environment fallbacks.

use std::{net::SocketAddr, time::Duration};

use clap::Parser;

use crate::error::ServerError;

/// Campfire group chat server
#[derive(Debug, Clone, Parser)]
#[command(name = "campfire-server", version, about)]
pub struct ServerArgs {
    /// Address to bind
    #[arg(long, env = "CAMPFIRE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(short, long, env = "CAMPFIRE_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Base URL of the toxicity analysis service
    #[arg(
        long,
        env = "CAMPFIRE_CLASSIFIER_URL",
        default_value = "http://localhost:5001"
    )]
    pub classifier_url: String,

    /// Upper bound for one toxicity check, in milliseconds
    #[arg(long, env = "CAMPFIRE_CLASSIFIER_TIMEOUT_MS", default_value_t = 5000)]
    pub classifier_timeout_ms: u64,

    /// Outbound events buffered per WebSocket session before it is dropped
    #[arg(long, env = "CAMPFIRE_SESSION_QUEUE", default_value_t = 256)]
    pub session_queue: usize,

    /// HMAC secret used to sign session tokens
    #[arg(long, env = "CAMPFIRE_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    #[arg(long, env = "CAMPFIRE_TOKEN_TTL_SECS", default_value_t = 3600)]
    pub token_ttl_secs: u64,

    #[arg(long, env = "CAMPFIRE_BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,

    /// Origin allowed by CORS (the web client)
    #[arg(long, env = "CAMPFIRE_CORS_ORIGIN", default_value = "http://localhost:3000")]
    pub cors_origin: String,

    /// Groups created at startup (repeat the flag or separate with commas)
    #[arg(long = "seed-group", env = "CAMPFIRE_SEED_GROUP", value_delimiter = ',')]
    pub seed_groups: Vec<String>,
}

/// Resolved server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub classifier_url: String,
    pub classifier_timeout: Duration,
    pub session_queue: usize,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub cors_origin: String,
    pub seed_groups: Vec<String>,
}

impl ServerConfig {
    /// Settings for tests and local tooling: ephemeral port, cheap hashing.
    pub fn for_local(classifier_url: impl Into<String>) -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            classifier_url: classifier_url.into(),
            classifier_timeout: Duration::from_secs(5),
            session_queue: 256,
            jwt_secret: "campfire-local-secret".to_string(),
            token_ttl: Duration::from_secs(3600),
            bcrypt_cost: 4,
            cors_origin: "http://localhost:3000".to_string(),
            seed_groups: Vec::new(),
        }
    }
}

impl TryFrom<ServerArgs> for ServerConfig {
    type Error = ServerError;

    fn try_from(args: ServerArgs) -> Result<Self, Self::Error> {
        let addr: SocketAddr = format!("{}:{}", args.host, args.port)
            .parse()
            .map_err(|_| {
                ServerError::Config(format!("invalid listen address {}:{}", args.host, args.port))
            })?;
        if args.jwt_secret.trim().is_empty() {
            return Err(ServerError::Config("JWT secret cannot be empty".to_string()));
        }
        if !(4..=31).contains(&args.bcrypt_cost) {
            return Err(ServerError::Config(format!(
                "bcrypt cost must be between 4 and 31 (got {})",
                args.bcrypt_cost
            )));
        }
        if args.classifier_timeout_ms == 0 {
            return Err(ServerError::Config(
                "classifier timeout must be positive".to_string(),
            ));
        }
        if args.session_queue == 0 {
            return Err(ServerError::Config(
                "session queue must hold at least one event".to_string(),
            ));
        }

        Ok(Self {
            addr,
            classifier_url: args.classifier_url,
            classifier_timeout: Duration::from_millis(args.classifier_timeout_ms),
            session_queue: args.session_queue,
            jwt_secret: args.jwt_secret,
            token_ttl: Duration::from_secs(args.token_ttl_secs),
            bcrypt_cost: args.bcrypt_cost,
            cors_origin: args.cors_origin,
            seed_groups: args
                .seed_groups
                .into_iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        })
    }
}
