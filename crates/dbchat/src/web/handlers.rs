use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::response::sse::{Event, KeepAlive, Sse};
use dbchat_core::conversation::{ConversationState, Turn};
use dbchat_core::{Agent, ProgressEvent, ProgressSink};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tracing::Instrument;
use uuid::Uuid;

use super::error::ApiError;
use crate::session::{Session, TurnOutcome};
use crate::sessions::SharedSession;
use crate::state::AppState;

/// A session as returned by the API.
#[derive(Debug, Serialize)]
pub struct SessionView {
    /// Session id.
    pub id: Uuid,
    /// Whether anything was asked since the last reset.
    pub state: ConversationState,
    /// The transcript, oldest turn first.
    pub turns: Vec<Turn>,
}

impl SessionView {
    fn of(id: Uuid, session: &Session<Agent>) -> Self {
        Self {
            id,
            state: session.conversation().state(),
            turns: session.turns().to_vec(),
        }
    }
}

/// Body of the message endpoints.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    /// The user's question.
    pub query: String,
}

/// Result of a non-streaming message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// What happened to the query.
    pub outcome: TurnOutcome,
    /// The assistant turn the query produced, if any.
    pub reply: Option<Turn>,
    /// The session after the turn.
    pub session: SessionView,
}

/// `GET /`: The chat page.
pub async fn index() -> Html<&'static str> {
    Html(include_str!("./page.html"))
}

/// `GET /healthz`
pub async fn healthz() -> &'static str {
    "ok"
}

/// `POST /api/sessions`: Connects (or reuses the connection), builds an
/// agent and starts a conversation.
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let database = state.connections.get_connection().await?;
    let agent = state.factory.build(database);
    let session =
        Session::new(agent).with_max_output_chars(state.max_output_chars);
    let (id, shared) = state.sessions.insert(session);
    let view = SessionView::of(id, &*shared.lock().await);
    info!("session {id} started");
    Ok((StatusCode::CREATED, Json(view)))
}

/// `GET /api/sessions/{id}`
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let (id, session) = lookup(&state, &id)?;
    let view = SessionView::of(id, &*session.lock().await);
    Ok(Json(view))
}

/// `DELETE /api/sessions/{id}`
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let (id, _) = lookup(&state, &id)?;
    state.sessions.remove(&id);
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/sessions/{id}/reset`: The "Clear Message History" control.
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let (id, session) = lookup(&state, &id)?;
    let mut session = session.lock().await;
    session.reset();
    Ok(Json(SessionView::of(id, &session)))
}

/// `POST /api/sessions/{id}/messages`: Runs one turn and returns when it is
/// complete. The turn runs in its own task, so a client that disconnects
/// midway never leaves a question without its answer.
pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let (id, session) = lookup(&state, &id)?;
    let turn = tokio::spawn(
        async move {
            let mut session = session.lock().await;
            let outcome = session.handle_user_query(&body.query, None).await;
            let reply = (outcome != TurnOutcome::Ignored)
                .then(|| session.conversation().last().clone());
            MessageResponse {
                outcome,
                reply,
                session: SessionView::of(id, &session),
            }
        }
        .instrument(debug_span!("turn", session = %id)),
    );
    let response = turn.await.map_err(|err| {
        error!("turn of session {id} did not complete: {err}");
        ApiError::Internal(format!("turn did not complete: {err}"))
    })?;
    Ok(Json(response))
}

/// `POST /api/sessions/{id}/messages/stream`: Runs one turn, streaming
/// `progress` events while the agent works, then the new `turn`, then
/// `done`.
pub async fn stream_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MessageRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let (id, session) = lookup(&state, &id)?;
    let rx = spawn_turn(id, session, body.query);
    let stream = UnboundedReceiverStream::new(rx)
        .map(|message| Ok::<_, Infallible>(message.into_event()));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn lookup(
    state: &AppState,
    id: &str,
) -> Result<(Uuid, SharedSession), ApiError> {
    let uuid = Uuid::parse_str(id).map_err(|_| {
        ApiError::BadRequest(format!("invalid session id `{id}`"))
    })?;
    let session = state
        .sessions
        .get(&uuid)
        .ok_or_else(|| ApiError::SessionNotFound(id.to_owned()))?;
    Ok((uuid, session))
}

/// One server-sent event of a streamed turn.
#[derive(Debug, PartialEq)]
struct StreamMessage {
    name: &'static str,
    data: String,
}

impl StreamMessage {
    fn json<T: Serialize + ?Sized>(name: &'static str, value: &T) -> Self {
        Self {
            name,
            data: serde_json::to_string(value).unwrap_or_default(),
        }
    }

    fn into_event(self) -> Event {
        Event::default().event(self.name).data(self.data)
    }
}

/// Runs the turn in the background so it completes even if the client
/// goes away.
fn spawn_turn(
    id: Uuid,
    session: SharedSession,
    query: String,
) -> mpsc::UnboundedReceiver<StreamMessage> {
    let (tx, rx) = mpsc::unbounded_channel();
    let sink: Arc<dyn ProgressSink> = Arc::new({
        let tx = tx.clone();
        move |event: ProgressEvent| {
            tx.send(StreamMessage::json("progress", &event)).ok();
        }
    });

    tokio::spawn(
        async move {
            let mut session = session.lock().await;
            let outcome = session.handle_user_query(&query, Some(sink)).await;
            if outcome != TurnOutcome::Ignored {
                let turn = session.conversation().last();
                tx.send(StreamMessage::json("turn", turn)).ok();
            }
            let done = json!({ "outcome": outcome });
            tx.send(StreamMessage::json("done", &done)).ok();
        }
        .instrument(debug_span!("streamed turn", session = %id)),
    );
    rx
}

#[cfg(test)]
mod tests;
