use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

fn setup_test_app() -> axum::Router {
    fieldroute::routes::create_router(common::offline_state())
}

fn post_plan(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/atlas/gerarRoteiro")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn post_audit(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/atlas/analisarInvasoes")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_generate_routes_endpoint() {
    let app = setup_test_app();
    let mut clientes = common::cluster_records("sp", -23.50, -46.60, 6);
    clientes.extend(common::cluster_records("cps", -22.00, -47.50, 6));

    let response = app
        .oneshot(post_plan(json!({
            "clientes": clientes,
            "numDiasAlvo": 2,
            "maxPorDia": 8,
            "minPorDia": 3,
            "base": {"lat": -23.0, "lng": -47.0}
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["success"], true);
    let dias = json["data"]["dias"].as_array().unwrap();
    assert_eq!(dias.len(), 2);
    assert_eq!(dias[0]["dia"], "Dia 1");
    assert_eq!(dias[0]["clientes"][0]["ordem"], 1);
    assert!(dias[0]["clientes"][0]["latitude"].is_number());
    assert!(dias[0]["geometria"][0].is_array());

    assert_eq!(json["data"]["resumo"]["diasGerados"], 2);
    assert_eq!(json["data"]["resumo"]["diasAjustados"], false);
    assert_eq!(json["meta"]["total_clientes"], 12);
    assert_eq!(json["meta"]["total_dias"], 2);
    assert_eq!(json["meta"]["media_clientes_dia"], 6);
    assert_eq!(json["meta"]["ponto_partida"]["lat"], -23.0);
    assert!(json["meta"]["timestamp"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn test_generate_routes_reports_clamping() {
    let app = setup_test_app();
    let clientes = common::cluster_records("poucos", -23.50, -46.60, 4);

    let response = app
        .oneshot(post_plan(json!({"clientes": clientes, "numDiasAlvo": "10"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["resumo"]["diasSolicitados"], 10);
    assert_eq!(json["data"]["resumo"]["diasGerados"], 1);
    assert_eq!(json["data"]["resumo"]["diasAjustados"], true);
    assert_eq!(json["meta"]["ponto_partida"], Value::Null);
}

#[tokio::test]
async fn test_generate_routes_validation() {
    let cases = [
        json!({}),
        json!({"clientes": []}),
        json!({"clientes": "todos"}),
        json!({"clientes": [{"id": 1, "lat": -23.5, "lon": -46.6}], "numDiasAlvo": "abc"}),
        json!({"clientes": [{"id": 1, "lat": -23.5, "lon": -46.6}], "numDiasAlvo": 0}),
        json!({"clientes": [{"id": 1, "lat": -23.5, "lon": -46.6}], "base": {"lat": 120.0, "lon": 0.0}}),
    ];

    for body in cases {
        let response = setup_test_app().oneshot(post_plan(body.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Bad Request");
        assert!(json["message"].is_string());
    }
}

#[tokio::test]
async fn test_generate_routes_without_valid_coordinates() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_plan(json!({
            "clientes": [
                {"id": "a", "latitude": 0, "longitude": 0},
                {"id": "b", "nome": "Sem coordenadas"}
            ]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["message"].as_str().unwrap().contains("2 records received"));
}

#[tokio::test]
async fn test_status_endpoint() {
    let app = setup_test_app();

    let request = Request::builder()
        .uri("/atlas/status")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["ok"], true);
    assert_eq!(json["status"]["ors"], true);
    assert_eq!(json["status"]["vroom"], false);
    assert_eq!(json["logs"]["ors"], "OK: ORS service is responding");
    assert_eq!(json["logs"]["vroom"], "Erro: VROOM service unavailable");
    assert_eq!(json["config"]["vroom_url"], "offline");
}

#[tokio::test]
async fn test_generate_routes_rounds_mean_per_day() {
    let app = setup_test_app();
    let clientes = common::cluster_records("sete", -23.50, -46.60, 7);

    let response = app
        .oneshot(post_plan(json!({"clientes": clientes, "numDiasAlvo": 2})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["meta"]["total_dias"], 2);
    assert_eq!(json["meta"]["media_clientes_dia"], 4);
}

#[tokio::test]
async fn test_analyze_invasions_endpoint() {
    let app = setup_test_app();
    let mut clientes_sp = common::cluster_records("sp", -23.50, -46.60, 4);
    clientes_sp.push(json!({"id": "fronteira", "nome": "Fronteira", "lat": -23.50, "lon": -46.22}));

    let response = app
        .oneshot(post_audit(json!({
            "vendedores": [
                {
                    "codVendedor": "10",
                    "nomeVendedor": "Ana",
                    "clientes": clientes_sp,
                    "centroide": {"lat": -23.50, "lon": -46.60}
                },
                {
                    "codVendedor": 20,
                    "nomeVendedor": "Bruno",
                    "clientes": common::cluster_records("mogi", -23.50, -46.20, 3)
                }
            ]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["success"], true);
    let invasoes = json["invasoes"].as_array().unwrap();
    assert_eq!(invasoes.len(), 1);
    assert_eq!(invasoes[0]["clienteId"], "fronteira");
    assert_eq!(invasoes[0]["vendedorInvadido"], "Ana");
    assert_eq!(invasoes[0]["vendedorInvasor"], "Bruno");
    let degree = invasoes[0]["grauInvasao"].as_f64().unwrap();
    assert!(degree > 90.0 && degree <= 100.0);
    assert!(
        invasoes[0]["distanciaAoInvasor"].as_f64().unwrap()
            < invasoes[0]["distanciaAoInvadido"].as_f64().unwrap()
    );

    let stats = &json["estatisticas"];
    assert_eq!(stats["totalVendedores"], 2);
    assert_eq!(stats["totalClientes"], 8);
    assert_eq!(stats["totalInvasoes"], 1);
    assert_eq!(stats["invasoesPorVendedor"][0]["vendedor"], "Ana");
    assert_eq!(stats["invasoesPorVendedor"][0]["clientesInvadidos"], 1);
    assert_eq!(stats["invasoesPorVendedor"][1]["clientesInvasores"], 1);
    assert_eq!(stats["grauMedioInvasao"].as_f64().unwrap(), degree);
    assert!(json["timestamp"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn test_analyze_invasions_validation() {
    let lone = json!({
        "codVendedor": "1",
        "nomeVendedor": "Sozinho",
        "clientes": common::cluster_records("so", -23.5, -46.6, 3)
    });
    let cases = [
        json!({}),
        json!({"vendedores": [lone.clone()]}),
        json!({"vendedores": [lone.clone(), {"codVendedor": "2", "clientes": []}]}),
    ];

    for body in cases {
        let response = setup_test_app().oneshot(post_audit(body.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(body_json(response).await["error"], "Bad Request");
    }
}

#[tokio::test]
async fn test_docs_endpoint() {
    let app = setup_test_app();

    let request = Request::builder()
        .uri("/atlas/docs")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let paths: Vec<&str> = json["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert!(paths.contains(&"/api/atlas/gerarRoteiro"));
    assert!(paths.contains(&"/api/atlas/analisarInvasoes"));
    assert_eq!(json["name"], "fieldroute");
}
