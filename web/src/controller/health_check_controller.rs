use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct HealthStatus {
    status: String,
    connections: usize,
}

/// GET liveness of the server together with the number of open SSE connections
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "API router is up and responding to requests", body = HealthStatus),
    )
)]
pub async fn health_check(State(app_state): State<AppState>) -> impl IntoResponse {
    let connections = app_state
        .service_state
        .sse_manager
        .connected_clients()
        .await
        .len();

    (
        StatusCode::OK,
        Json(HealthStatus {
            status: "healthy".to_string(),
            connections,
        }),
    )
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_app;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    #[tokio::test]
    async fn reports_healthy_with_connection_count() {
        let app = test_app(10);
        let (client, _mailbox) = app
            .state
            .service_state
            .sse_manager
            .new_client("u1".to_string(), vec![]);
        let _guard = app.state.service_state.sse_manager.register_connection(client);

        let response = app
            .router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "status": "healthy", "connections": 1 }));
    }
}
