//! HTTP endpoints for the chat clients.
//!
//! Both POST endpoints answer `204 No Content`; everything a client sees
//! arrives over the team's WebSocket.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::protocol::{SubmitRequest, WaitRequest};
use crate::state::AppState;
use crate::ws;

/// Submit a chat line.
///
/// POST /chatsubmit
pub async fn chat_submit(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitRequest>,
) -> StatusCode {
    state
        .submit(&request.team, &request.session, &request.text)
        .await;
    StatusCode::NO_CONTENT
}

/// Register a waiting client, starting its team's game on first contact.
///
/// POST /chatwait
pub async fn chat_wait(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WaitRequest>,
) -> StatusCode {
    state
        .on_wait(&request.team, &request.session, request.wait_id)
        .await;
    StatusCode::NO_CONTENT
}

/// Build the application router. `debug_dir` is served under `/chatdebug`
/// when present.
pub fn router(state: Arc<AppState>, debug_dir: Option<PathBuf>) -> Router {
    let mut app = Router::new()
        .route("/chatsubmit", post(chat_submit))
        .route("/chatwait", post(chat_wait))
        .route("/ws", get(ws::ws_handler));

    if let Some(dir) = debug_dir {
        tracing::info!(dir = %dir.display(), "Serving debug assets at /chatdebug");
        app = app.nest_service("/chatdebug", ServeDir::new(dir));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::lexicon::WordListLexicon;
    use crate::puzzle::Puzzle;
    use crate::transform::{ReferenceIndex, TextTransform};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state() -> Arc<AppState> {
        let transform = TextTransform::new(
            Arc::new(WordListLexicon::new(["hello"])),
            ReferenceIndex::from_text("a b c"),
            None,
        );
        Arc::new(AppState::new(
            GameConfig::default(),
            Puzzle::town_hall(),
            transform,
        ))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_chat_wait_returns_no_content() {
        let state = state();
        let app = router(state.clone(), None);

        let response = app
            .oneshot(post_json(
                "/chatwait",
                r#"{"team": "red", "session": "s1", "wait_id": "w1"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let team = state.team("red").await;
        assert!(team.is_started());
        assert_eq!(team.role_of("s1").await.map(|r| r.get()), Some(1));
    }

    #[tokio::test]
    async fn test_chat_submit_unknown_session_is_silent() {
        let state = state();
        let (_, mut rx) = state.events.subscribe("red").await;
        let app = router(state.clone(), None);

        let response = app
            .oneshot(post_json(
                "/chatsubmit",
                r#"{"team": "red", "session": "nobody", "text": "hello"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_body_rejected() {
        let app = router(state(), None);
        let response = app
            .oneshot(post_json("/chatsubmit", r#"{"team": "red"}"#))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_debug_assets_only_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("chatroom.css"), "body {}").unwrap();

        let request = || {
            Request::builder()
                .uri("/chatdebug/chatroom.css")
                .body(Body::empty())
                .unwrap()
        };

        let response = router(state(), Some(dir.path().to_path_buf()))
            .oneshot(request())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/css");

        let response = router(state(), None).oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
