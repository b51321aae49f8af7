use crate::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /atlas/status - Check the routing collaborators
pub async fn service_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    let (ors_ok, vroom_ok) = tokio::join!(
        state.renderer.health_check(),
        state.optimizer.health_check()
    );

    if !(ors_ok && vroom_ok) {
        tracing::warn!(ors = ors_ok, vroom = vroom_ok, "Routing collaborator unavailable");
    }

    Json(json!({
        "ok": true,
        "status": {
            "ors": ors_ok,
            "vroom": vroom_ok,
        },
        "logs": {
            "ors": health_log("ORS", ors_ok),
            "vroom": health_log("VROOM", vroom_ok),
        },
        "config": {
            "ors_url": state.ors_url,
            "vroom_url": state.vroom_url,
        }
    }))
}

fn health_log(service: &str, ok: bool) -> String {
    if ok {
        format!("OK: {} service is responding", service)
    } else {
        format!("Erro: {} service unavailable", service)
    }
}
