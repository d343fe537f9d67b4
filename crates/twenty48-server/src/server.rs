//! WebSocket server and connection handling.

use crate::config::ServerConfig;
use crate::leaderboard::Leaderboard;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::Session;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use twenty48_core::GameEvent;
use uuid::Uuid;

/// Server state shared across all connections.
pub struct ServerState {
    pub config: ServerConfig,
    /// One game per connection, each holding its connection's sender
    pub sessions: DashMap<Uuid, Session>,
    pub leaderboard: Leaderboard,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
            leaderboard: Leaderboard::new(),
        }
    }

    /// Register a connection and start its first game.
    pub fn open_session(&self, session_id: Uuid, sender: mpsc::UnboundedSender<ServerMessage>) {
        let session = Session::new(session_id, sender, None);
        self.sessions.insert(session_id, session);
    }

    pub fn close_session(&self, session_id: Uuid) {
        if let Some((_, session)) = self.sessions.remove(&session_id) {
            debug!(
                session = %session_id,
                finished = session.is_finished(),
                score = session.snapshot().score,
                "Session closed"
            );
        }
    }

    /// Send a message to a specific session. Callers must not hold a
    /// `sessions` guard for the same ID.
    pub fn send_to(&self, session_id: Uuid, msg: ServerMessage) {
        if let Some(session) = self.sessions.get(&session_id) {
            session.send(msg);
        }
    }

    fn send_error(&self, session_id: Uuid, message: impl Into<String>) {
        self.send_to(
            session_id,
            ServerMessage::Error {
                message: message.into(),
            },
        );
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

/// Run the WebSocket server.
pub async fn run_server(state: Arc<ServerState>) -> anyhow::Result<()> {
    let addr = state.config.addr;
    let listener = TcpListener::bind(addr).await?;
    info!("2048 server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let session_id = Uuid::new_v4();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.open_session(session_id, tx);

    let welcome = ServerMessage::Welcome { session_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text)).await?;
    send_state(session_id, &state);

    // Forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    // Messages from one connection are handled in order, so a move is
    // fully applied before the next is read.
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(session_id, client_msg, &state),
                Err(e) => {
                    warn!(session = %session_id, "Invalid message: {}", e);
                    state.send_error(session_id, format!("Invalid message: {}", e));
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", session_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                state.send_to(session_id, ServerMessage::Pong);
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", session_id, e);
                break;
            }
            _ => {}
        }
    }

    state.close_session(session_id);
    send_task.abort();

    info!("Connection closed for {}", session_id);
    Ok(())
}

fn send_state(session_id: Uuid, state: &ServerState) {
    let snapshot = state.sessions.get(&session_id).map(|s| s.state_json());
    if let Some(snapshot) = snapshot {
        state.send_to(session_id, ServerMessage::GameState { state: snapshot });
    }
}

/// Handle a client message.
pub fn handle_message(session_id: Uuid, msg: ClientMessage, state: &ServerState) {
    match msg {
        ClientMessage::NewGame { seed } => {
            if let Some(mut session) = state.sessions.get_mut(&session_id) {
                session.restart(seed);
                debug!(session = %session_id, ?seed, "New game");
            }
            send_state(session_id, state);
        }

        ClientMessage::Move { direction } => {
            let outcome = match state.sessions.get_mut(&session_id) {
                Some(mut session) => session.play(&direction),
                None => return state.send_error(session_id, "No active game"),
            };

            match outcome {
                Ok(events) => {
                    let changed = events
                        .iter()
                        .any(|e| matches!(e, GameEvent::Moved { .. }));

                    state.send_to(
                        session_id,
                        ServerMessage::MoveResult {
                            changed,
                            events: events
                                .iter()
                                .filter_map(|e| serde_json::to_value(e).ok())
                                .collect(),
                            error: None,
                        },
                    );
                    if changed {
                        send_state(session_id, state);
                    }
                }
                Err(e) => {
                    debug!(session = %session_id, %direction, "Move rejected: {}", e);
                    state.send_to(
                        session_id,
                        ServerMessage::MoveResult {
                            changed: false,
                            events: vec![],
                            error: Some(e.to_string()),
                        },
                    );
                }
            }
        }

        ClientMessage::SubmitScore { name } => {
            let submitted = match state.sessions.get_mut(&session_id) {
                Some(mut session) => session.submit(&state.leaderboard, name.as_deref()),
                None => return state.send_error(session_id, "No active game"),
            };

            match submitted {
                Ok(entry) => {
                    info!(
                        session = %session_id,
                        name = %entry.name,
                        score = entry.score,
                        highest_tile = entry.highest_tile,
                        total_entries = state.leaderboard.len(),
                        "Score recorded"
                    );
                    state.send_to(session_id, ServerMessage::ScoreRecorded { entry });
                    let entries = state.leaderboard.top(state.config.leaderboard_size.get());
                    state.send_to(session_id, ServerMessage::Leaderboard { entries });
                }
                Err(e) => state.send_error(session_id, e.to_string()),
            }
        }

        ClientMessage::GetLeaderboard => {
            let entries = state.leaderboard.top(state.config.leaderboard_size.get());
            state.send_to(session_id, ServerMessage::Leaderboard { entries });
        }

        ClientMessage::Hint { difficulty } => {
            let direction = state
                .sessions
                .get(&session_id)
                .and_then(|s| s.hint(difficulty))
                .map(|d| d.to_string());
            state.send_to(session_id, ServerMessage::Hint { direction });
        }

        ClientMessage::Ping => {
            state.send_to(session_id, ServerMessage::Pong);
        }
    }
}
