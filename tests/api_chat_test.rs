//! Integration tests for the chat API endpoints

mod test_utils;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::{Error, bail};
    use async_trait::async_trait;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
    };
    use modelverse::ai::provider::CompletionProvider;
    use serde_json::{Value, json};
    use tokio::sync::Semaphore;
    use tower::util::ServiceExt;

    use crate::test_utils::{body_to_string, sse_events, test_app, test_app_with_provider};

    /// Holds every call until the test hands out a permit
    struct GatedProvider {
        gate: Arc<Semaphore>,
    }

    #[async_trait]
    impl CompletionProvider for GatedProvider {
        async fn invoke(&self, model_id: &str, input: &str) -> Result<String, Error> {
            self.gate.acquire().await?.forget();
            Ok(format!("{} says {}", model_id, input))
        }
    }

    /// Fails every call to one model
    struct FailingProvider {
        broken_model: &'static str,
    }

    #[async_trait]
    impl CompletionProvider for FailingProvider {
        async fn invoke(&self, model_id: &str, input: &str) -> Result<String, Error> {
            if model_id == self.broken_model {
                bail!("backend unavailable");
            }
            Ok(format!("{} says {}", model_id, input))
        }
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method(method)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = body_to_string(response.into_body()).await;
        (status, serde_json::from_str(&body).unwrap_or(Value::Null))
    }

    fn delete_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method("DELETE")
            .body(Body::empty())
            .unwrap()
    }

    async fn send_message(app: &Router, session_id: &str, message: &str) -> Vec<Value> {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/chat",
                json!({"session_id": session_id, "message": message}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_to_string(response.into_body()).await;
        sse_events(&body)
    }

    /// Tests a single mode submission streams the user entry, one
    /// model entry and a done event
    #[tokio::test]
    async fn it_streams_single_mode_reply() {
        let app = test_app();

        let events = send_message(&app, "single", "Hello").await;

        assert_eq!(events.len(), 3);
        assert_eq!(events[0]["type"], "entry");
        assert_eq!(events[0]["entry"]["origin"], "user");
        assert_eq!(events[0]["entry"]["content"], "Hello");

        assert_eq!(events[1]["entry"]["origin"], "model");
        assert_eq!(events[1]["entry"]["model_id"], "mistral-7b-instruct");
        assert_eq!(events[1]["entry"]["chained"], false);
        assert!(
            events[1]["entry"]["content"]
                .as_str()
                .unwrap()
                .starts_with("Mistral 7B Instruct Response: I understand you're asking about \"Hello\"")
        );

        assert_eq!(events[2]["type"], "done");
        assert_eq!(events[2]["state"]["status"], "done");
        assert_eq!(events[2]["state"]["steps"], 1);
    }

    /// Tests chain mode feeds each response into the next model and
    /// appends entries in chain order
    #[tokio::test]
    async fn it_runs_chain_in_order() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/chat/chained/config",
                json!({
                    "chain_active": true,
                    "chain_models": ["kimi-72b", "chimera"],
                    "selected_model": "mistral-7b-instruct"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let events = send_message(&app, "chained", "What is Rust?").await;

        assert_eq!(events.len(), 4);
        let first = &events[1]["entry"];
        let second = &events[2]["entry"];
        assert_eq!(first["model_id"], "kimi-72b");
        assert_eq!(first["chained"], true);
        assert_eq!(second["model_id"], "chimera");
        assert_eq!(second["chained"], true);

        // The second model only ever sees the first model's output
        let first_content = first["content"].as_str().unwrap();
        let second_content = second["content"].as_str().unwrap();
        assert!(first_content.contains("\"What is Rust?\""));
        assert!(second_content.starts_with("Chimera Response:"));
        assert!(second_content.contains(first_content));

        assert_eq!(events[3]["type"], "done");
        assert_eq!(events[3]["state"]["steps"], 2);

        let (status, transcript) = get_json(&app, "/api/chat/chained").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(transcript["transcript"].as_array().unwrap().len(), 3);
        assert_eq!(transcript["state"]["status"], "done");
        assert_eq!(transcript["config"]["chain_active"], true);
    }

    /// Tests a second submission appends to the same transcript
    #[tokio::test]
    async fn it_appends_across_submissions() {
        let app = test_app();

        send_message(&app, "repeat", "one").await;
        send_message(&app, "repeat", "two").await;

        let (_, transcript) = get_json(&app, "/api/chat/repeat").await;
        let entries = transcript["transcript"].as_array().unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0]["content"], "one");
        assert_eq!(entries[2]["content"], "two");
    }

    /// Tests attachment names are shown in the user entry
    #[tokio::test]
    async fn it_lists_attachments_in_user_entry() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/chat",
                json!({
                    "session_id": "files",
                    "message": "Summarize",
                    "attachments": [{"name": "a.txt"}, {"name": "b.pdf"}]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let events = sse_events(&body_to_string(response.into_body()).await);
        assert_eq!(
            events[0]["entry"]["content"],
            "Summarize\n\nAttached files: a.txt, b.pdf"
        );
        let reply = events[1]["entry"]["content"].as_str().unwrap();
        assert!(reply.contains("\"Summarize\""));
        assert!(!reply.contains("a.txt"));
    }

    /// Tests an empty submission is ignored without creating a session
    #[tokio::test]
    async fn it_ignores_empty_submission() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/chat",
                json!({"session_id": "empty", "message": "   "}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let (status, _) = get_json(&app, "/api/chat/empty").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    /// Tests chat endpoint requires a valid JSON payload
    #[tokio::test]
    async fn it_requires_valid_json_payload() {
        let app = test_app();

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/chat",
                json!({"session_id": "missing-message"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    /// Tests an unknown session returns 404
    #[tokio::test]
    async fn it_returns_404_for_unknown_session() {
        let app = test_app();

        let (status, _) = get_json(&app, "/api/chat/does-not-exist").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get_json(&app, "/api/chat/does-not-exist/config").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    /// Tests a chain config without models is rejected
    #[tokio::test]
    async fn it_rejects_empty_chain_config() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/chat/bad-config/config",
                json!({
                    "chain_active": true,
                    "chain_models": [],
                    "selected_model": "mistral-7b-instruct"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(json_request(
                "PUT",
                "/api/chat/bad-config/config",
                json!({
                    "chain_active": false,
                    "chain_models": ["kimi-72b"],
                    "selected_model": " "
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    /// Tests new sessions start from the default config
    #[tokio::test]
    async fn it_gets_default_config() {
        let app = test_app();
        send_message(&app, "defaults", "Hi").await;

        let (status, config) = get_json(&app, "/api/chat/defaults/config").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            config,
            json!({
                "chain_active": false,
                "chain_models": ["mistral-7b-instruct", "deepseek-chat"],
                "selected_model": "mistral-7b-instruct"
            })
        );
    }

    /// Tests getting chat sessions returns empty list initially
    #[tokio::test]
    async fn it_gets_empty_chat_sessions() {
        let app = test_app();

        let (status, body) = get_json(&app, "/api/chat/sessions").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_sessions"], 0);
        assert_eq!(body["sessions"].as_array().unwrap().len(), 0);
    }

    /// Tests getting chat sessions with pagination
    #[tokio::test]
    async fn it_gets_chat_sessions_with_pagination() {
        let app = test_app();
        for id in ["s1", "s2", "s3"] {
            send_message(&app, id, "Hello").await;
        }

        let (status, body) = get_json(&app, "/api/chat/sessions?page=2&limit=2").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], 2);
        assert_eq!(body["limit"], 2);
        assert_eq!(body["total_sessions"], 3);
        assert_eq!(body["total_pages"], 2);
        let sessions = body["sessions"].as_array().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["entries"], 2);
    }

    /// Tests ending a session discards it
    #[tokio::test]
    async fn it_ends_a_session() {
        let app = test_app();
        send_message(&app, "ending", "Bye").await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/chat/ending")
                    .method("DELETE")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let (status, _) = get_json(&app, "/api/chat/ending").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    /// Tests a huge page number returns an empty page instead of failing
    #[tokio::test]
    async fn it_handles_out_of_range_page() {
        let app = test_app();
        send_message(&app, "paged", "Hello").await;

        let (status, body) = get_json(
            &app,
            "/api/chat/sessions?page=18446744073709551615&limit=2",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_sessions"], 1);
        assert_eq!(body["sessions"].as_array().unwrap().len(), 0);

        let (status, body) = get_json(
            &app,
            "/api/chat/sessions?page=1&limit=18446744073709551615",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["limit"], 100);
        assert_eq!(body["sessions"].as_array().unwrap().len(), 1);
    }

    /// Tests a session with a run in flight rejects new submissions and
    /// can't be ended until the run finishes
    #[tokio::test]
    async fn it_rejects_requests_while_busy() {
        let gate = Arc::new(Semaphore::new(0));
        let app = test_app_with_provider(Arc::new(GatedProvider { gate: gate.clone() }));

        let first = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/chat",
                json!({"session_id": "busy", "message": "first"}),
            ))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/chat",
                json!({"session_id": "busy", "message": "second"}),
            ))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);

        let response = app
            .clone()
            .oneshot(delete_request("/api/chat/busy"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let (_, transcript) = get_json(&app, "/api/chat/busy").await;
        assert_eq!(transcript["state"]["status"], "running");

        gate.add_permits(1);
        let events = sse_events(&body_to_string(first.into_body()).await);
        assert_eq!(events.len(), 3);
        assert_eq!(events[1]["entry"]["content"], "mistral-7b-instruct says first");
        assert_eq!(events[2]["type"], "done");

        let (_, transcript) = get_json(&app, "/api/chat/busy").await;
        let entries = transcript["transcript"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e["content"] != "second"));

        let response = app
            .oneshot(delete_request("/api/chat/busy"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    /// Tests a provider failure mid-chain streams the entries that
    /// succeeded followed by a failed event
    #[tokio::test]
    async fn it_streams_failure_after_partial_chain() {
        let app = test_app_with_provider(Arc::new(FailingProvider {
            broken_model: "chimera",
        }));

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/chat/broken/config",
                json!({
                    "chain_active": true,
                    "chain_models": ["kimi-72b", "chimera", "glm-z1"],
                    "selected_model": "kimi-72b"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let events = send_message(&app, "broken", "start").await;

        assert_eq!(events.len(), 3);
        assert_eq!(events[0]["entry"]["origin"], "user");
        assert_eq!(events[1]["entry"]["model_id"], "kimi-72b");
        assert_eq!(events[1]["entry"]["content"], "kimi-72b says start");
        assert_eq!(events[2]["type"], "failed");
        assert!(
            events[2]["error"]
                .as_str()
                .unwrap()
                .contains("Model chimera failed at step 2")
        );
        assert_eq!(events[2]["state"]["status"], "failed");
        assert_eq!(events[2]["state"]["step"], 2);
        assert_eq!(events[2]["state"]["model"], "chimera");

        let (_, transcript) = get_json(&app, "/api/chat/broken").await;
        assert_eq!(transcript["transcript"].as_array().unwrap().len(), 2);
        assert_eq!(transcript["state"]["status"], "failed");

        // The session takes submissions again after a failure
        let events = send_message(&app, "broken", "retry").await;
        assert_eq!(events.last().unwrap()["type"], "failed");
        let (_, transcript) = get_json(&app, "/api/chat/broken").await;
        assert_eq!(transcript["transcript"].as_array().unwrap().len(), 4);
    }
}
