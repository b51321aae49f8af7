use crate::constants::{MAX_AUDIT_SELLERS, MIN_AUDIT_SELLERS};
use crate::models::client::as_text;
use crate::models::{normalize_clients, Client, Coordinates};
use crate::services::planner::geometry::centroid;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A seller's territory: its clients and the point they are measured against.
#[derive(Debug, Clone, PartialEq)]
pub struct Seller {
    pub code: String,
    pub name: String,
    pub clients: Vec<Client>,
    pub centroid: Coordinates,
}

/// A client sitting closer to another seller's centroid than to its own.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Invasion {
    #[serde(rename = "vendedorInvasor")]
    pub invader: String,
    #[serde(rename = "vendedorInvadido")]
    pub owner: String,
    #[serde(rename = "clienteId")]
    pub client_id: String,
    #[serde(rename = "clienteNome")]
    pub client_name: String,
    #[serde(rename = "distanciaAoInvasor")]
    pub distance_to_invader_km: f64,
    #[serde(rename = "distanciaAoInvadido")]
    pub distance_to_owner_km: f64,
    /// Percentage, 0 to 100
    #[serde(rename = "grauInvasao")]
    pub degree: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SellerInvasions {
    #[serde(rename = "vendedor")]
    pub seller: String,
    #[serde(rename = "clientesInvadidos")]
    pub invaded: usize,
    #[serde(rename = "clientesInvasores")]
    pub invading: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvasionStats {
    pub total_vendedores: usize,
    pub total_clientes: usize,
    pub total_invasoes: usize,
    pub invasoes_por_vendedor: Vec<SellerInvasions>,
    pub grau_medio_invasao: f64,
}

// Request/Response types for the territory audit endpoint

#[derive(Debug, Deserialize)]
pub struct InvasionRequest {
    #[serde(default)]
    pub vendedores: Value,
}

impl InvasionRequest {
    pub fn validate(self) -> Result<Vec<Seller>, String> {
        let records = match self.vendedores {
            Value::Array(items) if items.len() >= MIN_AUDIT_SELLERS => items,
            Value::Array(_) | Value::Null => {
                return Err(format!("At least {} vendedores are required", MIN_AUDIT_SELLERS))
            }
            _ => return Err("vendedores must be an array".to_string()),
        };
        if records.len() > MAX_AUDIT_SELLERS {
            return Err(format!("At most {} vendedores are allowed", MAX_AUDIT_SELLERS));
        }

        records.iter().enumerate().map(|(idx, r)| parse_seller(r, idx)).collect()
    }
}

fn parse_seller(record: &Value, idx: usize) -> Result<Seller, String> {
    let required = || {
        format!(
            "Vendedor at index {} must have codVendedor, nomeVendedor and clientes[]",
            idx
        )
    };

    let code = record.get("codVendedor").and_then(as_text).ok_or_else(required)?;
    let name = record.get("nomeVendedor").and_then(as_text).ok_or_else(required)?;
    let raw_clients = record
        .get("clientes")
        .and_then(Value::as_array)
        .ok_or_else(required)?;
    let clients = normalize_clients(raw_clients);

    let centroid = match record.get("centroide") {
        Some(value) if !value.is_null() => {
            let c: Coordinates = serde_json::from_value(value.clone())
                .map_err(|e| format!("centroide of {} is invalid: {}", code, e))?;
            Coordinates::new(c.lat, c.lng)?
        }
        _ if clients.is_empty() => {
            return Err(format!("Vendedor {} has no clients and no centroide", code));
        }
        _ => centroid(clients.iter().map(|c| c.position())),
    };

    Ok(Seller {
        code,
        name,
        clients,
        centroid,
    })
}

#[derive(Debug, Serialize)]
pub struct InvasionResponse {
    pub success: bool,
    #[serde(rename = "invasoes")]
    pub invasions: Vec<Invasion>,
    #[serde(rename = "estatisticas")]
    pub stats: InvasionStats,
    pub timestamp: String,
}
