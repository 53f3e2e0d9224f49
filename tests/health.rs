use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use storefront_api::{
    app::create_app,
    config::JwtConfig,
    db::create_lazy_pool,
    routes::health::health_check,
    state::AppState,
};
use tower::ServiceExt;

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
}

#[tokio::test]
async fn health_is_served_at_root_and_under_api() {
    let pool = create_lazy_pool("postgres://storefront@localhost/unused").unwrap();
    let jwt = JwtConfig {
        secret: "health-secret".into(),
        ttl_hours: 1,
    };
    let app = create_app(AppState::new(pool, jwt));

    for path in ["/health", "/api/health"] {
        let response = app
            .clone()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert!(response.headers().contains_key("x-request-id"));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["data"]["status"], "ok");
    }
}
