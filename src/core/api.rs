//! HTTP + WebSocket API for FormFit
//!
//! Endpoints:
//! - GET /health - Health check
//! - GET /exercises - Exercise catalog listing
//! - POST /session/new - Create new session
//! - GET /session/{id} - Session summary
//! - POST /session/{id}/exercise - Select exercise by id or alias
//! - POST /session/{id}/frame - Process one landmark frame
//! - WS /ws/{id} - Live updates; accepts exercise_selected messages
//!
//! Every session owns its own engine; nothing mutable is shared between
//! sessions.

use axum::{
    extract::{ws::{Message, WebSocket}, Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::core::{AnalysisEngine, ExerciseCatalog, SpeechQueue};
use crate::types::{EngineEvent, ExerciseSummary, FeedbackRecord, FrameOutcome, SessionSummary, TimedFrame};

/// Broadcast buffer per session
const UPDATE_CHANNEL_CAPACITY: usize = 100;

/// Session state
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub engine: AnalysisEngine,
    pub update_tx: broadcast::Sender<SessionUpdate>,
}

/// Live update pushed to WebSocket clients
#[derive(Debug, Clone, Serialize)]
pub struct SessionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<FeedbackRecord>,
    pub events: Vec<EngineEvent>,
}

/// Messages accepted from WebSocket clients (the voice-agent layer)
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    ExerciseSelected {
        #[serde(rename = "exerciseId")]
        exercise_id: String,
    },
}

/// App state
pub struct AppState {
    pub sessions: RwLock<HashMap<String, Session>>,
    pub config: EngineConfig,
    pub catalog: Arc<ExerciseCatalog>,
    /// Server-side voice; clients also receive every `speak` event
    pub speech: Option<Arc<SpeechQueue>>,
    next_id: AtomicU64,
}

impl AppState {
    pub fn new(config: EngineConfig, catalog: Arc<ExerciseCatalog>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
            catalog,
            speech: None,
            next_id: AtomicU64::new(0),
        }
    }

    pub fn with_speech(mut self, speech: Arc<SpeechQueue>) -> Self {
        self.speech = Some(speech);
        self
    }
}

/// Create new session request
#[derive(Debug, Default, Deserialize)]
pub struct NewSessionRequest {
    pub exercise: Option<String>,
}

/// Create new session response
#[derive(Debug, Serialize)]
pub struct NewSessionResponse {
    pub session_id: String,
    pub websocket_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise: Option<String>,
    pub known: bool,
}

/// Session status response
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: SessionSummary,
}

/// Exercise selection request
#[derive(Debug, Deserialize)]
pub struct SelectExerciseRequest {
    #[serde(rename = "exerciseId")]
    pub exercise_id: String,
}

/// Exercise selection response
#[derive(Debug, Serialize)]
pub struct SelectExerciseResponse {
    pub exercise: String,
    pub known: bool,
    pub events: Vec<EngineEvent>,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_active: usize,
    pub exercises: usize,
}

/// Create the API router
pub fn create_router(config: EngineConfig, catalog: Arc<ExerciseCatalog>) -> Router {
    router_with_state(Arc::new(AppState::new(config, catalog)))
}

/// Router over prepared state (e.g. with a speech queue attached)
pub fn router_with_state(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/exercises", get(list_exercises))
        .route("/session/new", post(create_session))
        .route("/session/:id", get(get_session).delete(delete_session))
        .route("/session/:id/exercise", post(select_exercise))
        .route("/session/:id/frame", post(process_frame))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sessions = state.sessions.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        sessions_active: sessions.len(),
        exercises: state.catalog.len(),
    })
}

/// Catalog listing
async fn list_exercises(State(state): State<Arc<AppState>>) -> Json<Vec<ExerciseSummary>> {
    Json(state.catalog.summaries())
}

/// Create new session
async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewSessionRequest>,
) -> Result<Json<NewSessionResponse>, StatusCode> {
    let session_id = generate_session_id(&state.next_id);
    let (tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

    let mut engine = AnalysisEngine::new(state.config.clone(), state.catalog.clone());
    let mut known = false;
    if let Some(name) = req.exercise.as_deref() {
        let events = engine.select_exercise(name);
        known = engine.is_known();
        enqueue_speech(&state, &events);
    }
    let exercise = req.exercise.as_ref().map(|_| engine.exercise().to_string());

    let session = Session {
        id: session_id.clone(),
        created_at: Utc::now(),
        engine,
        update_tx: tx,
    };

    let mut sessions = state.sessions.write().await;
    sessions.insert(session_id.clone(), session);
    info!(session = %session_id, exercise = ?exercise, "session created");

    Ok(Json(NewSessionResponse {
        websocket_url: format!("/ws/{}", session_id),
        session_id,
        exercise,
        known,
    }))
}

/// Get session summary
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatusResponse>, StatusCode> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(SessionStatusResponse {
        session_id: session.id.clone(),
        created_at: session.created_at,
        summary: session.engine.summary(),
    }))
}

/// Drop a session; open WebSockets see their update stream close
async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> StatusCode {
    let mut sessions = state.sessions.write().await;
    match sessions.remove(&id) {
        Some(session) => {
            info!(
                session = %id,
                frames = session.engine.frames_processed(),
                "session closed"
            );
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

/// Select exercise for a session
async fn select_exercise(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SelectExerciseRequest>,
) -> Result<Json<SelectExerciseResponse>, StatusCode> {
    let response = apply_selection(&state, &id, &req.exercise_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(response))
}

/// Process one frame for a session
async fn process_frame(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(frame): Json<TimedFrame>,
) -> Result<Json<FrameOutcome>, StatusCode> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;

    let outcome = session
        .engine
        .process_frame(frame.landmarks.as_ref(), frame.timestamp);

    enqueue_speech(&state, &outcome.events);
    let _ = session.update_tx.send(SessionUpdate {
        record: Some(outcome.record.clone()),
        events: outcome.events.clone(),
    });

    Ok(Json(outcome))
}

/// Select on the session's engine, broadcast and speak the events.
/// `None` when the session does not exist.
async fn apply_selection(
    state: &Arc<AppState>,
    id: &str,
    name: &str,
) -> Option<SelectExerciseResponse> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(id)?;

    let events = session.engine.select_exercise(name);
    enqueue_speech(state, &events);
    let _ = session.update_tx.send(SessionUpdate {
        record: None,
        events: events.clone(),
    });

    Some(SelectExerciseResponse {
        exercise: session.engine.exercise().to_string(),
        known: session.engine.is_known(),
        events,
    })
}

fn enqueue_speech(state: &AppState, events: &[EngineEvent]) {
    if let Some(speech) = &state.speech {
        if let Err(e) = speech.enqueue_events(events) {
            warn!(error = %e, "speech queue unavailable");
        }
    }
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let rx = session.update_tx.subscribe();
    drop(sessions);

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, state, id, rx).await;
    }))
}

/// Handle WebSocket connection: updates out, selections in
async fn handle_websocket(
    socket: WebSocket,
    state: Arc<AppState>,
    id: String,
    mut rx: broadcast::Receiver<SessionUpdate>,
) {
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(update) => {
                    let json = serde_json::to_string(&update).unwrap_or_default();
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket client lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => handle_client_message(&state, &id, &text).await,
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

async fn handle_client_message(state: &Arc<AppState>, id: &str, text: &str) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::ExerciseSelected { exercise_id }) => {
            debug!(session = %id, exercise = %exercise_id, "exercise selected over websocket");
            if apply_selection(state, id, &exercise_id).await.is_none() {
                warn!(session = %id, "session closed before selection");
            }
        }
        Err(e) => warn!(session = %id, error = %e, "unrecognized websocket message"),
    }
}

/// Generate session ID
fn generate_session_id(counter: &AtomicU64) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let seq = counter.fetch_add(1, Ordering::Relaxed);
    format!("session_{:x}_{}", nanos, seq)
}

/// Run the API server
pub async fn run_server(addr: &str, state: AppState) -> crate::Result<()> {
    state.catalog.validate_with(&state.config)?;
    let router = router_with_state(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "FormFit API listening");
    info!("  GET  /health               - Health check");
    info!("  GET  /exercises            - Exercise catalog");
    info!("  POST /session/new          - Create session");
    info!("  GET  /session/:id          - Session summary");
    info!("  DEL  /session/:id          - Close session");
    info!("  POST /session/:id/exercise - Select exercise");
    info!("  POST /session/:id/frame    - Process frame");
    info!("  WS   /ws/:id               - Live updates");
    axum::serve(listener, router).await?;
    Ok(())
}
