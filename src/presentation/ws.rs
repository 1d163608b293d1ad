// WebSocket push channel for dashboard updates
use crate::application::dashboard_service::DashboardService;
use crate::domain::dashboard::DashboardView;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, error, info, warn};

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

/// Messages sent from server to client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage<'a> {
    DataUpdate { data: &'a DashboardView },
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    // Subscribe before the initial snapshot so no update slips in between
    let updates = state.broadcaster.subscribe();
    let dashboard = state.dashboard_service.clone();
    let client_id = NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed);

    info!(
        "WebSocket client {} connecting ({} subscriber(s))",
        client_id,
        state.broadcaster.subscriber_count()
    );

    ws.on_upgrade(move |socket| handle_connection(socket, dashboard, updates, client_id))
}

async fn handle_connection(
    socket: WebSocket,
    dashboard: DashboardService,
    updates: broadcast::Receiver<DashboardView>,
    client_id: u64,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    match dashboard.project().await {
        Ok(view) => {
            if let Err(e) = send_view(&mut ws_sender, &view).await {
                warn!("Failed to send initial snapshot to client {}: {}", client_id, e);
                return;
            }
        }
        Err(e) => error!("Failed to project initial snapshot for client {}: {}", client_id, e),
    }

    let mut updates = BroadcastStream::new(updates);

    let mut send_task = tokio::spawn(async move {
        while let Some(update) = updates.next().await {
            match update {
                Ok(view) => {
                    if let Err(e) = send_view(&mut ws_sender, &view).await {
                        debug!("Client {} send failed: {}", client_id, e);
                        break;
                    }
                }
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!("Client {} lagged, skipped {} update(s)", client_id, skipped);
                }
            }
        }
    });

    // Clients only listen; drain until they go away
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("Client {} receive error: {}", client_id, e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!("WebSocket client {} disconnected", client_id);
}

async fn send_view(
    sender: &mut SplitSink<WebSocket, Message>,
    view: &DashboardView,
) -> Result<(), axum::Error> {
    let json = encode_update(view).map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}

fn encode_update(view: &DashboardView) -> serde_json::Result<String> {
    serde_json::to_string(&ServerMessage::DataUpdate { data: view })
}
