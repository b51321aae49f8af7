use axum::Router;
use fieldroute::config::PlannerConfig;
use fieldroute::AppState;
use serde_json::{json, Value};
use std::sync::Arc;

/// `count` client records on a 0.003° grid anchored at (lat, lng).
#[allow(dead_code)]
pub fn cluster_records(prefix: &str, lat: f64, lng: f64, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "id": format!("{}-{}", prefix, i + 1),
                "nome": format!("{} {}", prefix, i + 1),
                "latitude": lat + (i % 3) as f64 * 0.003,
                "longitude": lng + (i / 3) as f64 * 0.003,
            })
        })
        .collect()
}

/// `count` records along a parallel, roughly 1 km apart.
#[allow(dead_code)]
pub fn line_records(prefix: &str, lat: f64, lng: f64, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "id": format!("{}-{}", prefix, i + 1),
                "nome": format!("{} {}", prefix, i + 1),
                "lat": lat,
                "lon": lng + i as f64 * 0.0098,
            })
        })
        .collect()
}

/// State with local tours and straight-line geometry only.
#[allow(dead_code)]
pub fn offline_state() -> Arc<AppState> {
    Arc::new(AppState::offline(PlannerConfig::default()))
}

/// Serve `app` on an ephemeral local port and return its base URL.
#[allow(dead_code)]
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock server");
    let addr = listener.local_addr().expect("Mock server has no address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://{}", addr)
}
