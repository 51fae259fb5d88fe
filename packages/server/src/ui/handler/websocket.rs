//! WebSocket gateway: one reader task running the session's relay and one
//! writer task draining its outbound channel.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{GroupId, MessageContent, Timestamp, UserId},
    infrastructure::dto::websocket::{ClientEvent, ServerMessage},
    ui::{
        handler::http::ApiError,
        state::{AppState, ConnectQuery},
    },
    usecase::{
        ClientCommand, ConnectSessionUseCase, DisconnectSessionUseCase, RelayError,
        SendMessageCommand, SessionRelay,
    },
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let initial_group = query.group_id.map(GroupId::new).transpose()?;

    // Reject bad tokens before upgrading
    let connect = ConnectSessionUseCase::new(
        state.identity.clone(),
        state.registry.clone(),
        state.tokens.clone(),
    );
    let user = connect
        .authenticate(query.token.as_deref())
        .await
        .map_err(|e| match e {
            RelayError::Authorization(message) => {
                tracing::warn!("Rejected WebSocket handshake: {}", message);
                ApiError::unauthorized(message)
            }
            e => e.into(),
        })?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, connect, user, initial_group)))
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    connect: ConnectSessionUseCase,
    user: Option<UserId>,
    initial_group: Option<GroupId>,
) {
    let (mut sender, mut receiver) = socket.split();

    // Create a channel for this session to receive events
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(state.config.session_queue);
    let session = connect.execute(user, tx).await;
    let session_id = session.session_id.clone();
    let mut relay = SessionRelay::new(state.relay.clone(), session);

    // Spawn a task to receive events from this client and run them through the relay
    let mut recv_task = tokio::spawn(async move {
        if let Some(group_id) = initial_group {
            // Failures are already reported to the session
            let _ = relay.handle(ClientCommand::JoinGroup(group_id)).await;
        }

        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", relay.session_id(), e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!(
                        "Received from '{}': {}",
                        relay.session_id(),
                        text.as_str()
                    );
                    match parse_command(text.as_str()) {
                        Ok(command) => {
                            let _ = relay.handle(command).await;
                        }
                        Err(e) => relay.report(&e).await,
                    }
                }
                Message::Binary(_) => {
                    relay
                        .report(&RelayError::Validation(
                            "binary frames are not supported".to_string(),
                        ))
                        .await;
                }
                Message::Close(_) => {
                    tracing::info!("Session '{}' requested close", relay.session_id());
                    break;
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                _ => {}
            }
        }

        relay.disconnect().await;
    });

    // Spawn a task to forward relay events to this client
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => {
            recv_task.abort();
            DisconnectSessionUseCase::new(state.registry.clone())
                .execute(&session_id)
                .await;
        }
    };
}

/// Decode one inbound frame into a validated relay command
fn parse_command(text: &str) -> Result<ClientCommand, RelayError> {
    let event: ClientEvent = serde_json::from_str(text)
        .map_err(|e| RelayError::Validation(format!("malformed event: {e}")))?;

    let command = match event {
        ClientEvent::JoinGroup(group_id) => ClientCommand::JoinGroup(GroupId::new(group_id)?),
        ClientEvent::LeaveGroup(group_id) => ClientCommand::LeaveGroup(GroupId::new(group_id)?),
        ClientEvent::ChatMessage(payload) => ClientCommand::SendMessage(SendMessageCommand {
            content: MessageContent::new(payload.content)?,
            sender: UserId::new(payload.user.id)?,
            group: GroupId::new(payload.group.id)?,
            timestamp: payload.timestamp.map(Timestamp::new),
        }),
    };
    Ok(command)
}
