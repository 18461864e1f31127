use std::sync::Arc;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use fetchbot_slack::{
    interaction::decode_interaction,
    resolver::{CallbackResolver, ReplyOutcome},
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct CallbackState {
    resolver: Arc<CallbackResolver>,
}

/// The platform posts interactions as a form whose `payload` field holds the
/// JSON-encoded callback.
#[derive(Debug, Default, Deserialize)]
struct CallbackForm {
    #[serde(default)]
    payload: Option<String>,
}

pub fn router(resolver: Arc<CallbackResolver>) -> Router {
    Router::new()
        .route("/", post(handle_callback))
        .fallback(unmatched_path)
        .with_state(CallbackState { resolver })
}

pub async fn spawn(
    bind_address: &str,
    port: u16,
    resolver: Arc<CallbackResolver>,
) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.callback.start",
        bind_address = %address,
        "interaction callback endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(resolver)).await {
            tracing::error!(
                event_name = "system.callback.error",
                error = %error,
                "callback endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

async fn unmatched_path(uri: Uri) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("incorrect path: {}", uri.path()))
}

/// Validation failures each map to a distinct status: the statuses are an
/// externally observable contract the platform-side configuration depends on.
async fn handle_callback(State(state): State<CallbackState>, body: String) -> Response {
    let correlation_id = Uuid::new_v4().to_string();

    if body.is_empty() {
        return (StatusCode::NOT_ACCEPTABLE, "empty body").into_response();
    }

    let form: CallbackForm = match serde_urlencoded::from_str(&body) {
        Ok(form) => form,
        Err(error) => {
            warn!(
                event_name = "ingress.callback.form_unparseable",
                %correlation_id,
                error = %error,
                "rejecting unparseable form body"
            );
            return (StatusCode::GONE, "could not parse body").into_response();
        }
    };

    let Some(payload) = form.payload.filter(|payload| !payload.is_empty()) else {
        return (StatusCode::NO_CONTENT, "could not find payload").into_response();
    };

    let event = match decode_interaction(&payload) {
        Ok(event) => event,
        Err(error) => {
            warn!(
                event_name = "ingress.callback.payload_undecodable",
                %correlation_id,
                error = %error,
                "rejecting undecodable payload"
            );
            return (StatusCode::GONE, "could not process payload").into_response();
        }
    };

    match state.resolver.resolve(&event) {
        Ok(ReplyOutcome::Text(text)) => {
            info!(
                event_name = "ingress.callback.resolved",
                %correlation_id,
                outcome = "text",
                "resolved callback to a text reply"
            );
            (StatusCode::OK, text).into_response()
        }
        Ok(ReplyOutcome::Replace(message)) => {
            info!(
                event_name = "ingress.callback.resolved",
                %correlation_id,
                outcome = "replace",
                "resolved callback to an in-place replacement"
            );
            (StatusCode::OK, Json(message)).into_response()
        }
        Err(error) => {
            let status = if error.is_malformed() {
                StatusCode::GONE
            } else {
                StatusCode::NOT_ACCEPTABLE
            };
            warn!(
                event_name = "ingress.callback.unresolved",
                %correlation_id,
                error = %error,
                "callback did not resolve"
            );
            (status, error.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use fetchbot_core::config::ContentConfig;
    use fetchbot_slack::{prompts::PromptCatalog, resolver::CallbackResolver};
    use tower::ServiceExt;

    use super::router;

    fn resolver() -> Arc<CallbackResolver> {
        Arc::new(CallbackResolver::new(PromptCatalog::new(&ContentConfig {
            repo_url: "https://example.com/fetchbot".to_owned(),
            dog_image_url: "https://example.com/dog.jpg".to_owned(),
        })))
    }

    async fn send(path: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_owned()))
            .expect("request builds");

        let response = router(resolver()).oneshot(request).await.expect("router responds");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");

        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    fn form_with_payload(payload: &str) -> String {
        serde_urlencoded::to_string([("payload", payload)]).expect("form encodes")
    }

    fn button_payload(value: &str) -> String {
        format!(
            r#"{{
                "callback_id": "ask_U123",
                "actions": [{{"name": "action", "type": "button", "value": "{value}"}}],
                "user": {{"id": "U123"}},
                "channel": {{"id": "D456"}},
                "original_message": {{"text": "prompt"}}
            }}"#
        )
    }

    #[tokio::test]
    async fn unmatched_path_returns_404_with_the_path_echoed() {
        let (status, body) = send("/nope", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "incorrect path: /nope");
    }

    #[tokio::test]
    async fn empty_body_returns_406() {
        let (status, body) = send("/", "").await;
        assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
        assert_eq!(body, "empty body");
    }

    #[tokio::test]
    async fn unparseable_form_returns_410() {
        let (status, body) = send("/", "payload=a&payload=b").await;
        assert_eq!(status, StatusCode::GONE);
        assert_eq!(body, "could not parse body");
    }

    #[tokio::test]
    async fn missing_payload_field_returns_204() {
        let (status, body) = send("/", "something=else").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, "could not find payload");
    }

    #[tokio::test]
    async fn undecodable_payload_returns_410() {
        let (status, body) = send("/", &form_with_payload("{not json")).await;
        assert_eq!(status, StatusCode::GONE);
        assert_eq!(body, "could not process payload");
    }

    #[tokio::test]
    async fn yes_code_callback_returns_the_repo_link() {
        let (status, body) = send("/", &form_with_payload(&button_payload("yes_code"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "The source code is at https://example.com/fetchbot!");
    }

    #[tokio::test]
    async fn unknown_action_returns_406_echoing_the_identifier() {
        let (status, body) = send("/", &form_with_payload(&button_payload("bogus"))).await;
        assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
        assert!(body.contains("bogus"));
    }

    #[tokio::test]
    async fn event_without_identifier_returns_410() {
        let payload = r#"{
            "actions": [{"name": "", "type": "button"}],
            "user": {"id": "U123"}
        }"#;

        let (status, body) = send("/", &form_with_payload(payload)).await;
        assert_eq!(status, StatusCode::GONE);
        assert!(body.contains("no action identifier"));
    }

    #[tokio::test]
    async fn menu_selection_replaces_the_menu_with_the_code_prompt() {
        let payload = r#"{
            "actions": [{
                "name": "actionSelect",
                "type": "select",
                "selected_options": [{"value": "Code"}]
            }],
            "user": {"id": "U123"},
            "original_message": {"text": "What would you like to see?"}
        }"#;

        let (status, body) = send("/", &form_with_payload(payload)).await;
        assert_eq!(status, StatusCode::OK);

        let message: serde_json::Value = serde_json::from_str(&body).expect("body is json");
        assert_eq!(message["text"], "What would you like to see?");
        assert_eq!(message["attachments"][0]["actions"][0]["name"], "yes_code");
    }

    #[tokio::test]
    async fn menu_without_selection_returns_406() {
        let payload = r#"{
            "actions": [{"name": "actionSelect", "type": "select"}],
            "user": {"id": "U123"}
        }"#;

        let (status, body) = send("/", &form_with_payload(payload)).await;
        assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
        assert!(body.contains("selected option"));
    }

    #[tokio::test]
    async fn unknown_menu_selection_returns_406_echoing_the_value() {
        let payload = r#"{
            "actions": [{
                "name": "actionSelect",
                "type": "select",
                "selected_options": [{"value": "Cat"}]
            }],
            "user": {"id": "U123"}
        }"#;

        let (status, body) = send("/", &form_with_payload(payload)).await;
        assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
        assert!(body.contains("Cat"));
    }
}
