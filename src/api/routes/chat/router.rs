//! Router for the chat API

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, sse::Event, sse::KeepAlive, sse::Sse},
    routing::{get, post},
};
use axum_extra::extract::Query;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::public;
use crate::ai::chat::{ChainConfig, ChatSession, Entry, SessionConfig, Submission};
use crate::api::SharedState;
use crate::api::public::ApiError;

const MAX_PAGE_SIZE: usize = 100;

fn send_event(tx: &mpsc::UnboundedSender<String>, event: &public::ChatEvent) {
    match serde_json::to_string(event) {
        // The client going away doesn't stop the run
        Ok(data) => {
            let _ = tx.send(data);
        }
        Err(e) => tracing::error!("Failed to serialize chat event: {}", e),
    }
}

fn send_entry(tx: &mpsc::UnboundedSender<String>, entry: Entry) {
    send_event(tx, &public::ChatEvent::Entry { entry });
}

fn transcript_response(session: &ChatSession) -> public::ChatTranscriptResponse {
    public::ChatTranscriptResponse {
        session_id: session.id().to_string(),
        state: session.state(),
        config: session.config().into(),
        transcript: session.entries(),
    }
}

/// Get a single chat session by ID
async fn chat_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<axum::Json<public::ChatTranscriptResponse>, ApiError> {
    let session = state
        .read()
        .expect("Unable to read share state")
        .find_session(&id)?;

    Ok(axum::Json(transcript_response(&session)))
}

/// End a chat session and discard its transcript
async fn end_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .write()
        .expect("Unable to write share state")
        .end_session(&id)?;
    tracing::info!("Ended chat session {}", id);

    Ok(StatusCode::NO_CONTENT)
}

/// Get a list of all chat sessions, newest first
async fn chat_list(
    State(state): State<SharedState>,
    Query(params): Query<public::ChatSessionsQuery>,
) -> Result<axum::Json<public::ChatSessionsResponse>, ApiError> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1).saturating_mul(limit);

    let mut sessions: Vec<public::ChatSession> = state
        .read()
        .expect("Unable to read share state")
        .sessions
        .values()
        .map(|s| public::ChatSession {
            id: s.id().to_string(),
            created_at: s.created_at(),
            entries: s.len(),
            state: s.state(),
        })
        .collect();
    sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

    let total_sessions = sessions.len();
    let total_pages = total_sessions.div_ceil(limit);
    let paged_sessions = sessions.into_iter().skip(offset).take(limit).collect();

    Ok(axum::Json(public::ChatSessionsResponse {
        sessions: paged_sessions,
        page,
        limit,
        total_sessions,
        total_pages,
    }))
}

/// Get the model selection for a session
async fn get_config(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<axum::Json<public::ChatConfig>, ApiError> {
    let session = state
        .read()
        .expect("Unable to read share state")
        .find_session(&id)?;

    Ok(axum::Json(session.config().into()))
}

/// Replace the model selection for a session, creating the session if
/// needed. A run already in flight keeps the selection it started with.
async fn set_config(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    axum::Json(payload): axum::Json<public::ChatConfig>,
) -> Result<axum::Json<public::ChatConfig>, ApiError> {
    let chain = ChainConfig::new(payload.chain_models, payload.chain_active)?;
    let config = SessionConfig::new(&payload.selected_model, chain)?;

    let session = state
        .write()
        .expect("Unable to write share state")
        .get_or_create_session(&id)?;
    session.set_config(config);

    Ok(axum::Json(session.config().into()))
}

/// Submit a message to a chat session and stream each new transcript
/// entry as it is appended
async fn chat_handler(
    State(state): State<SharedState>,
    axum::Json(payload): axum::Json<public::ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let submission = Submission {
        text: payload.message,
        attachments: payload.attachments,
    };

    // Empty submissions are ignored without touching the session
    if submission.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let (session, orchestrator) = {
        let mut shared_state = state.write().expect("Unable to write share state");
        let session = shared_state.get_or_create_session(&payload.session_id)?;
        (session, shared_state.orchestrator.clone())
    };

    // Claim the session here so a second submission is rejected with a
    // 409 instead of failing inside the stream
    let pending = orchestrator.start(&session, &submission)?;

    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let sse_stream = UnboundedReceiverStream::new(rx)
        .map(|chunk| Ok::<Event, Infallible>(Event::default().data(chunk)));

    // Run in its own task so a client disconnect doesn't cancel the
    // chain half way through
    tokio::spawn(async move {
        let mut entries = session.subscribe();
        let run = orchestrator.execute(&session, pending);
        tokio::pin!(run);

        let result = loop {
            tokio::select! {
                result = &mut run => break result,
                received = entries.recv() => match received {
                    Ok(entry) => send_entry(&tx, entry),
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!("Chat stream skipped {} entries", n);
                    }
                    Err(RecvError::Closed) => break (&mut run).await,
                },
            }
        };

        // Entries appended after the last poll are still buffered
        while let Ok(entry) = entries.try_recv() {
            send_entry(&tx, entry);
        }

        let event = match result {
            Ok(_) => public::ChatEvent::Done {
                state: session.state(),
            },
            Err(e) => public::ChatEvent::Failed {
                error: e.to_string(),
                state: session.state(),
            },
        };
        send_event(&tx, &event);
    });

    let resp = Sse::new(sse_stream)
        .keep_alive(
            KeepAlive::default()
                .text("keep-alive")
                .interval(Duration::from_secs(15)),
        )
        .into_response();

    Ok(resp)
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(chat_handler))
        .route("/sessions", get(chat_list))
        .route("/{id}", get(chat_session).delete(end_session))
        .route("/{id}/config", get(get_config).put(set_config))
}
