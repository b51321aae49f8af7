use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fieldroute::models::Coordinates;
use fieldroute::services::collaborators::{PathRenderer, RouteOptimizer};
use fieldroute::services::ors::OrsClient;
use fieldroute::services::vroom::VroomClient;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

mod common;

fn stops(count: usize) -> Vec<Coordinates> {
    (0..count)
        .map(|i| Coordinates::new(-23.5 - i as f64 * 0.01, -46.6 - i as f64 * 0.01).unwrap())
        .collect()
}

fn vroom_client(base_url: &str) -> VroomClient {
    VroomClient::new(base_url, Duration::from_secs(5), Duration::from_secs(2))
}

fn ors_client(base_url: &str, max_coords: usize) -> OrsClient {
    OrsClient::new(base_url, max_coords, Duration::from_secs(5), Duration::from_secs(2))
}

/// Visits the jobs in reverse id order and returns a two-point road.
async fn reversing_vroom(Json(request): Json<Value>) -> Json<Value> {
    let mut ids: Vec<i64> = request["jobs"]
        .as_array()
        .map(|jobs| jobs.iter().filter_map(|j| j["id"].as_i64()).collect())
        .unwrap_or_default();
    ids.sort_unstable_by(|a, b| b.cmp(a));

    let mut steps = vec![json!({"type": "start"})];
    steps.extend(ids.into_iter().map(|id| json!({"type": "job", "job": id})));
    steps.push(json!({"type": "end"}));

    Json(json!({
        "code": 0,
        "routes": [{
            "steps": steps,
            "geometry": {"type": "LineString", "coordinates": [[-46.6, -23.5], [-46.7, -23.6]]}
        }]
    }))
}

/// Forgets every job but the first.
async fn forgetful_vroom(Json(request): Json<Value>) -> Json<Value> {
    let first = request["jobs"][0]["id"].clone();
    Json(json!({
        "routes": [{"steps": [{"type": "start"}, {"type": "job", "job": first}, {"type": "end"}]}]
    }))
}

#[tokio::test]
async fn test_vroom_order_and_geometry() {
    let base = common::spawn_server(Router::new().route("/", post(reversing_vroom))).await;
    let client = vroom_client(&base);

    let result = client.optimize_sequence(&stops(4)).await.unwrap();

    assert_eq!(result.order, vec![0, 3, 2, 1]);
    assert_eq!(result.geometry, Some(vec![[-23.5, -46.6], [-23.6, -46.7]]));
    assert!(client.health_check().await);
}

#[tokio::test]
async fn test_vroom_incomplete_solution_is_rejected() {
    let base = common::spawn_server(Router::new().route("/", post(forgetful_vroom))).await;
    let client = vroom_client(&base);

    assert!(client.optimize_sequence(&stops(4)).await.is_err());
}

#[tokio::test]
async fn test_vroom_http_error() {
    let app = Router::new().route(
        "/",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "solver crashed") }),
    );
    let base = common::spawn_server(app).await;
    let client = vroom_client(&base);

    assert!(client.optimize_sequence(&stops(3)).await.is_err());
    assert!(!client.health_check().await);
}

#[derive(Clone, Default)]
struct OrsMock {
    calls: Arc<AtomicUsize>,
    /// Batches with exactly this many coordinates fail
    fail_len: Option<usize>,
}

/// Echoes the requested coordinates back as the road geometry.
async fn echo_directions(State(mock): State<OrsMock>, Json(request): Json<Value>) -> Response {
    mock.calls.fetch_add(1, Ordering::SeqCst);
    let coordinates = request["coordinates"].clone();
    let len = coordinates.as_array().map_or(0, |c| c.len());

    if mock.fail_len == Some(len) {
        return (StatusCode::SERVICE_UNAVAILABLE, "overloaded").into_response();
    }

    Json(json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {},
            "geometry": {"type": "LineString", "coordinates": coordinates}
        }]
    }))
    .into_response()
}

fn ors_app(mock: OrsMock) -> Router {
    Router::new()
        .route("/v2/directions/driving-car/geojson", post(echo_directions))
        .route("/v2/health", get(|| async { Json(json!({"status": "ready"})) }))
        .with_state(mock)
}

fn lat_lon(stops: &[Coordinates]) -> Vec<[f64; 2]> {
    stops.iter().map(|s| s.to_lat_lon()).collect()
}

#[tokio::test]
async fn test_ors_batches_are_stitched() {
    let mock = OrsMock::default();
    let base = common::spawn_server(ors_app(mock.clone())).await;
    let client = ors_client(&base, 3);
    let route = stops(5);

    let path = client.render_path(&route).await.unwrap();

    assert_eq!(mock.calls.load(Ordering::SeqCst), 2);
    assert_eq!(path, lat_lon(&route));
    assert!(client.health_check().await);
}

#[tokio::test]
async fn test_ors_failed_batch_becomes_straight_line() {
    let mock = OrsMock {
        fail_len: Some(2),
        ..Default::default()
    };
    let base = common::spawn_server(ors_app(mock.clone())).await;
    let client = ors_client(&base, 3);
    let route = stops(6);

    let path = client.render_path(&route).await.unwrap();

    assert_eq!(mock.calls.load(Ordering::SeqCst), 3);
    assert_eq!(path, lat_lon(&route));
}

#[tokio::test]
async fn test_ors_all_batches_failing_is_an_error() {
    let mock = OrsMock {
        fail_len: Some(3),
        ..Default::default()
    };
    let base = common::spawn_server(ors_app(mock)).await;
    let client = ors_client(&base, 3);

    assert!(client.render_path(&stops(3)).await.is_err());
}

#[tokio::test]
async fn test_unreachable_services_report_unhealthy() {
    // Nothing listens on the discard port
    let vroom = vroom_client("http://127.0.0.1:9");
    let ors = ors_client("http://127.0.0.1:9", 25);

    assert!(!vroom.health_check().await);
    assert!(!ors.health_check().await);
    assert!(ors.render_path(&stops(2)).await.is_err());
}
