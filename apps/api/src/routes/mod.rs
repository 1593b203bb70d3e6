pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::admin::handlers as admin;
use crate::chat::handlers as chat;
use crate::knowledge::handlers as knowledge;
use crate::marketing::handlers as marketing;
use crate::profile::handlers as profile;
use crate::prompting::handlers as prompting;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // User profile
        .route(
            "/api/v1/user-profile",
            get(profile::handle_get_profile).put(profile::handle_update_profile),
        )
        .route(
            "/api/v1/user-profile/reset",
            post(profile::handle_reset_profile),
        )
        .route(
            "/api/v1/user-profile/formatted",
            get(profile::handle_formatted_profile),
        )
        // Knowledge base
        .route(
            "/api/v1/knowledge-base",
            get(knowledge::handle_get_knowledge_base),
        )
        .route(
            "/api/v1/knowledge-base/reset",
            post(knowledge::handle_reset_knowledge_base),
        )
        .route(
            "/api/v1/knowledge-base/formatted",
            get(knowledge::handle_formatted_knowledge_base),
        )
        .route(
            "/api/v1/knowledge-base/:product",
            patch(knowledge::handle_update_product),
        )
        // Final prompt
        .route(
            "/api/v1/final-prompt",
            get(prompting::handle_get_final_prompt).put(prompting::handle_set_final_prompt),
        )
        .route(
            "/api/v1/final-prompt/preview",
            get(prompting::handle_preview_final_prompt),
        )
        .route(
            "/api/v1/final-prompt/versions",
            get(prompting::handle_list_versions).post(prompting::handle_save_version),
        )
        .route(
            "/api/v1/final-prompt/versions/:id/load",
            post(prompting::handle_load_version),
        )
        .route(
            "/api/v1/final-prompt/versions/:id",
            delete(prompting::handle_delete_version),
        )
        // Marketing plans
        .route(
            "/api/v1/marketing-plans",
            get(marketing::handle_list_plans).delete(marketing::handle_clear_plans),
        )
        .route(
            "/api/v1/marketing-plans/prompt",
            get(marketing::handle_get_marketing_prompt).put(marketing::handle_set_marketing_prompt),
        )
        .route(
            "/api/v1/marketing-plans/generate",
            post(marketing::handle_generate_plan),
        )
        .route(
            "/api/v1/marketing-plans/baseline",
            get(marketing::handle_baseline_plan),
        )
        .route(
            "/api/v1/marketing-prompts",
            get(marketing::handle_list_marketing_prompts)
                .post(marketing::handle_create_marketing_prompt)
                .delete(marketing::handle_delete_marketing_prompts),
        )
        // Chat
        .route(
            "/api/v1/chat/messages",
            get(chat::handle_list_messages)
                .post(chat::handle_send_message)
                .delete(chat::handle_clear_messages),
        )
        // Admin
        .route("/api/admin/users", post(admin::handle_create_user))
        .route("/api/admin/users/:id", delete(admin::handle_delete_user))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tokio::time::timeout;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::{CompletionAuth, Config, StorageBackend};
    use crate::llm_client::testing::ScriptedCompletion;
    use crate::persistence::file::FileGateway;

    const ADMIN_KEY: &str = "test-admin-key";

    fn test_app(replies: &[&str]) -> (tempfile::TempDir, Router) {
        test_app_with(ScriptedCompletion::replying(replies))
    }

    fn test_app_with(llm: ScriptedCompletion) -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            storage: StorageBackend::File {
                data_dir: PathBuf::from(dir.path()),
            },
            completion_api_url: "http://localhost:0/chat/completions".into(),
            completion_api_key: "unused".into(),
            completion_auth: CompletionAuth::Bearer,
            completion_model: None,
            admin_api_key: Some(ADMIN_KEY.into()),
            port: 0,
            rust_log: "info".into(),
        };
        let state = AppState::new(
            config,
            Arc::new(FileGateway::new(dir.path())),
            Arc::new(llm),
        );
        (dir, build_router(state))
    }

    fn request(method: &str, uri: &str, user: Option<Uuid>, body: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user.to_string());
        }
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_needs_no_auth() {
        let (_dir, app) = test_app(&[]);
        let response = app
            .oneshot(request("GET", "/health", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["service"], "advisor-api");
    }

    #[tokio::test]
    async fn test_missing_or_bad_user_id_is_unauthorized() {
        let (_dir, app) = test_app(&[]);
        let response = app
            .clone()
            .oneshot(request("GET", "/api/v1/user-profile", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"]["code"], "UNAUTHORIZED");

        let bad = Request::builder()
            .uri("/api/v1/user-profile")
            .header("x-user-id", "not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(bad).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_profile_update_round_trip() {
        let (_dir, app) = test_app(&[]);
        let user = Some(Uuid::new_v4());

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                "/api/v1/user-profile",
                user,
                Some(r#"{"incomeLevel": "Low", "age": 25}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(request("GET", "/api/v1/user-profile", user, None))
            .await
            .unwrap();
        let profile = json_body(response).await;
        assert_eq!(profile["incomeLevel"], "Low");
        assert_eq!(profile["age"], 25);

        let response = app
            .oneshot(request(
                "PUT",
                "/api/v1/user-profile",
                user,
                Some(r#"{"age": 7}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let (_dir, app) = test_app(&[]);
        let response = app
            .oneshot(request(
                "PATCH",
                "/api/v1/knowledge-base/bonds",
                Some(Uuid::new_v4()),
                Some(r#"{"riskLevel": "High"}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_save_and_list_prompt_versions() {
        let (_dir, app) = test_app(&[]);
        let user = Some(Uuid::new_v4());

        app.clone()
            .oneshot(request(
                "PUT",
                "/api/v1/final-prompt",
                user,
                Some(r#"{"prompt": "Be brief."}"#),
            ))
            .await
            .unwrap();
        let response = app
            .clone()
            .oneshot(request("POST", "/api/v1/final-prompt/versions", user, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let saved = json_body(response).await;
        assert_eq!(saved["prompt"], "Be brief.");
        assert_eq!(saved["isActive"], true);

        let response = app
            .oneshot(request("GET", "/api/v1/final-prompt/versions", user, None))
            .await
            .unwrap();
        let listed = json_body(response).await;
        assert_eq!(listed["versions"].as_array().unwrap().len(), 1);
        assert_eq!(listed["activeVersionId"], saved["id"]);
    }

    #[tokio::test]
    async fn test_generate_plan_is_stored() {
        let (_dir, app) = test_app(&[r#"{"bestProducts": "DANA+ - eMAS"}"#]);
        let user = Some(Uuid::new_v4());

        let response = app
            .clone()
            .oneshot(request("POST", "/api/v1/marketing-plans/generate", user, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let plan = json_body(response).await;
        assert_eq!(plan["bestProducts"], serde_json::json!(["DANA+", "eMAS"]));

        let response = app
            .oneshot(request("GET", "/api/v1/marketing-plans", user, None))
            .await
            .unwrap();
        assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_chat_turn_over_http() {
        let (_dir, app) = test_app(&["Happy to help."]);
        let user = Some(Uuid::new_v4());

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/v1/chat/messages",
                user,
                Some(r#"{"message": "hi"}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["content"], "Happy to help.");

        let response = app
            .oneshot(request("GET", "/api/v1/chat/messages", user, None))
            .await
            .unwrap();
        let log = json_body(response).await;
        assert_eq!(log["messages"].as_array().unwrap().len(), 2);
        assert_eq!(log["messages"][0]["role"], "user");
        assert_eq!(log["isBusy"], false);
    }

    #[tokio::test]
    async fn test_session_answers_during_chat_turn() {
        let llm = ScriptedCompletion::replying(&["slow answer"]).with_delay(Duration::from_millis(800));
        let (_dir, app) = test_app_with(llm);
        let user = Some(Uuid::new_v4());

        let turn = tokio::spawn(app.clone().oneshot(request(
            "POST",
            "/api/v1/chat/messages",
            user,
            Some(r#"{"message": "hi"}"#),
        )));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let response = timeout(
            Duration::from_millis(500),
            app.clone()
                .oneshot(request("GET", "/api/v1/chat/messages", user, None)),
        )
        .await
        .expect("chat log should not wait for the turn")
        .unwrap();
        let log = json_body(response).await;
        assert_eq!(log["isBusy"], true);
        assert_eq!(log["messages"].as_array().unwrap().len(), 1);

        let response = timeout(
            Duration::from_millis(500),
            app.clone()
                .oneshot(request("GET", "/api/v1/user-profile", user, None)),
        )
        .await
        .expect("profile should not wait for the turn")
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = turn.await.unwrap().unwrap();
        assert_eq!(json_body(response).await["content"], "slow answer");

        let response = app
            .oneshot(request("GET", "/api/v1/chat/messages", user, None))
            .await
            .unwrap();
        let log = json_body(response).await;
        assert_eq!(log["isBusy"], false);
        assert_eq!(log["messages"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_generate_body_is_bad_request() {
        let (_dir, app) = test_app(&[]);
        let response = app
            .oneshot(request(
                "POST",
                "/api/v1/marketing-plans/generate",
                Some(Uuid::new_v4()),
                Some("{not json"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_requires_matching_key() {
        let (_dir, app) = test_app(&[]);
        let body = r#"{"name": "Ana", "email": "ana@example.com", "password": "longenough"}"#;

        let wrong = Request::builder()
            .method("POST")
            .uri("/api/admin/users")
            .header("x-api-key", "nope")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app.clone().oneshot(wrong).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let right = Request::builder()
            .method("POST")
            .uri("/api/admin/users")
            .header("x-api-key", ADMIN_KEY)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app.clone().oneshot(right).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        assert_eq!(created["email"], "ana@example.com");
        assert!(created.get("passwordHash").is_none());

        let delete = Request::builder()
            .method("DELETE")
            .uri(format!("/api/admin/users/{}", created["id"].as_str().unwrap()))
            .header("x-api-key", ADMIN_KEY)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(delete).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
