use std::time::Duration;

use axum::response::IntoResponse;
use dbchat_core::conversation::Role;
use dbchat_sql::{ConnectionProvider, DEFAULT_CONNECTION_TTL, SqlConnector};
use dbchat_test_model::ScriptedProvider;
use secrecy::SecretString;
use tempfile::TempDir;

use super::*;
use crate::factory::{AgentFactory, AgentSettings};
use crate::test_support::{shop_database, shop_uri};

async fn app_state(provider: &ScriptedProvider) -> (TempDir, AppState) {
    let (dir, _) = shop_database().await;
    let connections = ConnectionProvider::new(
        SqlConnector::new(),
        SecretString::from(shop_uri(&dir)),
        DEFAULT_CONNECTION_TTL,
    );
    let factory = AgentFactory::new(provider.clone(), AgentSettings::default());
    (dir, AppState::new(connections, factory))
}

async fn new_session(state: &AppState) -> Uuid {
    let (status, Json(view)) =
        create_session(State(state.clone())).await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    view.id
}

#[tokio::test]
async fn test_create_session() {
    let provider = ScriptedProvider::default();
    let (_dir, state) = app_state(&provider).await;

    let (_, Json(view)) = create_session(State(state.clone())).await.unwrap();
    assert_eq!(view.state, ConversationState::Fresh);
    assert_eq!(view.turns, [Turn::assistant("How can I help you?")]);
    assert_eq!(state.sessions.len(), 1);
}

#[tokio::test]
async fn test_connection_failure() {
    let provider = ScriptedProvider::default();
    let connections = ConnectionProvider::new(
        SqlConnector::new(),
        SecretString::from("sqlite:///nonexistent/dir/shop.db"),
        DEFAULT_CONNECTION_TTL,
    );
    let factory = AgentFactory::new(provider, AgentSettings::default());
    let state = AppState::new(connections, factory);

    let err = create_session(State(state.clone())).await.unwrap_err();
    assert!(matches!(err, ApiError::Connection(_)));
    assert_eq!(
        err.into_response().status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert!(state.sessions.is_empty());
}

#[tokio::test]
async fn test_message_round_trip() {
    let provider = ScriptedProvider::default();
    provider.push_text("42 orders.");
    let (_dir, state) = app_state(&provider).await;
    let id = new_session(&state).await;

    let Json(resp) = post_message(
        State(state.clone()),
        Path(id.to_string()),
        Json(MessageRequest {
            query: "How many orders last month?".to_owned(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(resp.outcome, TurnOutcome::Answered);
    assert_eq!(resp.reply, Some(Turn::assistant("42 orders.")));
    assert_eq!(resp.session.state, ConversationState::Active);

    let Json(view) = get_session(State(state.clone()), Path(id.to_string()))
        .await
        .unwrap();
    assert_eq!(
        view.turns,
        [
            Turn::assistant("How can I help you?"),
            Turn::user("How many orders last month?"),
            Turn::assistant("42 orders."),
        ]
    );

    let Json(view) = reset_session(State(state.clone()), Path(id.to_string()))
        .await
        .unwrap();
    assert_eq!(view.turns, [Turn::assistant("How can I help you?")]);
}

#[tokio::test]
async fn test_turn_outlives_disconnected_client() {
    let provider =
        ScriptedProvider::default().with_delay(Duration::from_millis(200));
    provider.push_text("42 orders.");
    let (_dir, state) = app_state(&provider).await;
    let id = new_session(&state).await;

    let request = tokio::spawn(post_message(
        State(state.clone()),
        Path(id.to_string()),
        Json(MessageRequest {
            query: "How many orders last month?".to_owned(),
        }),
    ));
    tokio::time::sleep(Duration::from_millis(50)).await;
    request.abort();
    assert!(request.await.unwrap_err().is_cancelled());

    tokio::time::sleep(Duration::from_millis(400)).await;
    let session = state.sessions.get(&id).unwrap();
    let session = session.lock().await;
    // Every question is followed by its answer.
    assert_eq!(session.turns().len() % 2, 1);
    assert_eq!(
        session.turns(),
        [
            Turn::assistant("How can I help you?"),
            Turn::user("How many orders last month?"),
            Turn::assistant("42 orders."),
        ]
    );
}

#[tokio::test]
async fn test_blank_message() {
    let provider = ScriptedProvider::default();
    let (_dir, state) = app_state(&provider).await;
    let id = new_session(&state).await;

    let Json(resp) = post_message(
        State(state.clone()),
        Path(id.to_string()),
        Json(MessageRequest {
            query: "   ".to_owned(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(resp.outcome, TurnOutcome::Ignored);
    assert_eq!(resp.reply, None);
    assert_eq!(resp.session.turns.len(), 1);
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn test_unknown_and_invalid_ids() {
    let provider = ScriptedProvider::default();
    let (_dir, state) = app_state(&provider).await;
    let id = new_session(&state).await;

    let status = delete_session(State(state.clone()), Path(id.to_string()))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let err = get_session(State(state.clone()), Path(id.to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "SESSION_NOT_FOUND");
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

    let err = reset_session(State(state.clone()), Path("not-a-uuid".to_owned()))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid session id `not-a-uuid`");
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_streamed_turn() {
    let provider = ScriptedProvider::default();
    provider.push_tool_call(
        "call_1",
        "sql_db_list_tables",
        serde_json::json!({}),
    );
    provider.push_text("The only table is orders.");
    let (_dir, state) = app_state(&provider).await;
    let id = new_session(&state).await;
    let session = state.sessions.get(&id).unwrap();

    let query = "Which tables exist?".to_owned();
    let mut rx = spawn_turn(id, Arc::clone(&session), query);
    let mut messages = Vec::new();
    while let Some(message) = rx.recv().await {
        messages.push(message);
    }

    let names: Vec<_> = messages.iter().map(|m| m.name).collect();
    assert_eq!(names, ["progress", "progress", "progress", "turn", "done"]);
    assert_eq!(
        messages[0].data,
        r#"{"kind":"tool_started","tool":"sql_db_list_tables","input":{}}"#
    );
    assert_eq!(
        messages[1].data,
        concat!(
            r#"{"kind":"tool_finished","tool":"sql_db_list_tables","#,
            r#""observation":"orders"}"#,
        )
    );
    assert_eq!(
        messages[2].data,
        r#"{"kind":"thinking","text":"The only table is orders."}"#
    );
    assert_eq!(
        messages[3].data,
        r#"{"role":"assistant","content":"The only table is orders."}"#
    );
    assert_eq!(messages[4].data, r#"{"outcome":"answered"}"#);

    let session = session.lock().await;
    assert_eq!(session.turns().len(), 3);
    assert_eq!(session.turns()[1].role(), Role::User);
}

#[test]
fn test_internal_error_response() {
    let err = ApiError::Internal("turn did not complete".to_owned());
    assert_eq!(err.code(), "INTERNAL_ERROR");
    assert_eq!(
        err.into_response().status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
