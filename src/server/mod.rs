use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use crate::config::Settings;
use crate::storage::RecordStore;
use crate::ui::Icons;

pub mod render;
pub mod routes;

/// Server state, shared by every handler
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub settings: Settings,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/update", post(routes::update))
        .route("/proxy", get(routes::proxy))
        .route("/settings", get(routes::settings))
        .route("/status", get(routes::status))
        .route("/classifications.csv", get(routes::classifications))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C, then close the store once in-flight requests finish
pub async fn start_server(addr: SocketAddr, store: RecordStore, settings: Settings) -> anyhow::Result<()> {
    let store = Arc::new(store);
    let state = Arc::new(AppState {
        store: Arc::clone(&store),
        settings,
    });

    let app = router(state);

    tracing::info!("Starting server on {}", addr);
    println!("{} Server running at http://{}", Icons::GLOBE, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    match Arc::try_unwrap(store) {
        Ok(store) => store.close()?,
        Err(_) => tracing::warn!("Record store still in use at shutdown; leaving it to drop"),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ItemType;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn test_state(ids: &[&str]) -> Arc<AppState> {
        let store = RecordStore::open_in_memory().unwrap();
        store.import_batch(ids).unwrap();
        Arc::new(AppState {
            store: Arc::new(store),
            settings: Settings {
                item_type: ItemType::Image,
                task: "What is it?".to_string(),
                labels: vec!["cat".to_string(), "animal".to_string()],
            },
        })
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_form(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/update")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_index_redirects_to_next() {
        let app = router(test_state(&["a b.jpg"]));
        let response = app.oneshot(get_req("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/?url=a%20b.jpg");
    }

    #[tokio::test]
    async fn test_index_without_unlabelled_records() {
        let app = router(test_state(&[]));
        let response = app.oneshot(get_req("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains(render::NO_UNLABELLED));
    }

    #[tokio::test]
    async fn test_index_renders_item() {
        let app = router(test_state(&["a.jpg", "b.jpg"]));
        let response = app.oneshot(get_req("/?url=a.jpg")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains(r#"src="/proxy?url=a.jpg""#));
        assert!(body.contains("Total: 2 | Pending: 2 | Done: 0"));
    }

    #[tokio::test]
    async fn test_index_unknown_item_is_bad_request() {
        let app = router(test_state(&["a.jpg"]));
        let response = app.oneshot(get_req("/?url=missing.jpg")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_applies_labels() {
        let state = test_state(&["a.jpg", "b.jpg"]);
        let app = router(Arc::clone(&state));

        let response = app
            .oneshot(post_form("url=a.jpg&label=cat&label=+animal+&label="))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/?url=b.jpg");
        assert_eq!(state.store.get("a.jpg").unwrap().label.as_deref(), Some("cat,animal"));
    }

    #[tokio::test]
    async fn test_update_rejects_bad_forms() {
        let state = test_state(&["a.jpg"]);

        let missing = router(Arc::clone(&state))
            .oneshot(post_form("url=missing.jpg&label=x"))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let no_labels = router(Arc::clone(&state))
            .oneshot(post_form("url=a.jpg"))
            .await
            .unwrap();
        assert_eq!(no_labels.status(), StatusCode::BAD_REQUEST);

        let blank = router(Arc::clone(&state))
            .oneshot(post_form("url=a.jpg&label=+&label="))
            .await
            .unwrap();
        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

        let injected = router(Arc::clone(&state))
            .oneshot(post_form("url=a.jpg&label=cat%0Afake%09row"))
            .await
            .unwrap();
        assert_eq!(injected.status(), StatusCode::BAD_REQUEST);

        assert!(state.store.find("missing.jpg").unwrap().is_none());
        assert_eq!(state.store.status().unwrap().done, 0);
    }

    #[tokio::test]
    async fn test_classifications_csv() {
        let state = test_state(&["a.jpg", "b.jpg"]);
        state.store.update_label("a.jpg", &["cat", "animal"]).unwrap();

        let response = router(state).oneshot(get_req("/classifications.csv")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");

        let body = body_string(response).await;
        assert_eq!(body.lines().count(), 1);
        assert!(body.ends_with("\ta.jpg\tcat,animal\n"));
    }

    #[tokio::test]
    async fn test_status_and_settings_json() {
        let state = test_state(&["a.jpg"]);

        let status = router(Arc::clone(&state)).oneshot(get_req("/status")).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_string(status).await).unwrap();
        assert_eq!(json, serde_json::json!({"total": 1, "pending": 1, "done": 0}));

        let settings = router(state).oneshot(get_req("/settings")).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_string(settings).await).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["task"], "What is it?");
    }

    #[tokio::test]
    async fn test_proxy_serves_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "hello").unwrap();

        let uri = format!("/proxy?url={}", render::encode_query_value(path.to_str().unwrap()));
        let response = router(test_state(&[])).oneshot(get_req(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "hello");

        let missing = router(test_state(&[])).oneshot(get_req("/proxy?url=%2Fno%2Fsuch")).await.unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    }
}
