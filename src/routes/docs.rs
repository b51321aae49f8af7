use axum::Json;
use serde_json::{json, Value};

/// GET /atlas/docs - Endpoint reference
pub async fn api_docs() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            {
                "method": "GET",
                "path": "/api/atlas/status",
                "description": "Health of the ORS and VROOM collaborators",
            },
            {
                "method": "POST",
                "path": "/api/atlas/gerarRoteiro",
                "description": "Split clients into compact daily routes",
                "body": {
                    "clientes": "array of {id, nome, lat|latitude, lon|lng|longitude}",
                    "numDiasAlvo": "optional requested number of days",
                    "base": "optional {lat, lon} start point",
                    "maxPorDia": "accepted, not applied",
                    "minPorDia": "accepted, not applied",
                },
            },
            {
                "method": "POST",
                "path": "/api/atlas/analisarInvasoes",
                "description": "Flag clients closer to another seller's centroid",
                "body": {
                    "vendedores": "2 to 5 of {codVendedor, nomeVendedor, clientes, centroide?}",
                },
            },
            {
                "method": "GET",
                "path": "/api/atlas/docs",
                "description": "This reference",
            },
        ],
    }))
}
