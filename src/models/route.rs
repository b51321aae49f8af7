use crate::constants::{MAX_CLIENTS_PER_REQUEST, MAX_REQUESTED_DAYS};
use crate::models::{Client, Coordinates};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A client with its 1-based position in the day's visiting order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SequencedClient {
    #[serde(flatten)]
    pub client: Client,
    #[serde(rename = "ordem")]
    pub order: u32,
}

/// Attach 1-based order numbers, preserving the current order.
pub fn enumerate(clients: Vec<Client>) -> Vec<SequencedClient> {
    clients
        .into_iter()
        .enumerate()
        .map(|(idx, client)| SequencedClient {
            client,
            order: idx as u32 + 1,
        })
        .collect()
}

/// One output day: ordered clients plus the drivable path as `[lat, lon]` pairs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteDay {
    #[serde(rename = "dia")]
    pub label: String,
    #[serde(rename = "clientes")]
    pub clients: Vec<SequencedClient>,
    #[serde(rename = "geometria")]
    pub geometry: Vec<[f64; 2]>,
}

impl RouteDay {
    pub fn label_for(index: usize) -> String {
        format!("Dia {}", index + 1)
    }
}

/// How the requested day count was turned into the effective one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanSummary {
    #[serde(rename = "totalClientes")]
    pub total_clients: usize,
    #[serde(rename = "diasSolicitados")]
    pub requested_days: usize,
    #[serde(rename = "diasGerados")]
    pub effective_days: usize,
    #[serde(rename = "alvoPorDia")]
    pub target_per_day: usize,
    /// True when the requested count was reduced to fit the dataset
    #[serde(rename = "diasAjustados")]
    pub clamped: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutePlan {
    #[serde(rename = "dias")]
    pub days: Vec<RouteDay>,
    #[serde(rename = "resumo")]
    pub summary: PlanSummary,
}

impl RoutePlan {
    pub fn client_count(&self) -> usize {
        self.days.iter().map(|d| d.clients.len()).sum()
    }
}

// Request/Response types for API endpoints

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    #[serde(default)]
    pub clientes: Value,
    #[serde(default)]
    pub num_dias_alvo: Option<Value>,
    /// Accepted for compatibility; the planner does not consult it
    #[serde(default)]
    pub max_por_dia: Option<Value>,
    /// Accepted for compatibility; the planner does not consult it
    #[serde(default)]
    pub min_por_dia: Option<Value>,
    #[serde(default)]
    pub base: Option<Value>,
}

/// Validated form of [`PlanRequest`].
#[derive(Debug, Clone)]
pub struct PlanInput {
    pub clients: Vec<Value>,
    pub requested_days: Option<usize>,
    pub start: Option<Coordinates>,
}

impl PlanRequest {
    pub fn validate(self) -> Result<PlanInput, String> {
        let clients = match self.clientes {
            Value::Array(items) => items,
            Value::Null => return Err("clientes is required".to_string()),
            _ => return Err("clientes must be an array".to_string()),
        };
        if clients.is_empty() {
            return Err("clientes array cannot be empty".to_string());
        }
        if clients.len() > MAX_CLIENTS_PER_REQUEST {
            return Err(format!(
                "Too many clients (max {})",
                MAX_CLIENTS_PER_REQUEST
            ));
        }
        if let Some(idx) = clients.iter().position(|c| !c.is_object()) {
            return Err(format!("Cliente at index {} is invalid", idx));
        }

        let requested_days = match self.num_dias_alvo {
            None | Some(Value::Null) => None,
            Some(value) => Some(parse_day_count(&value)?),
        };

        let start = match self.base {
            None | Some(Value::Null) => None,
            Some(value) => Some(parse_start(value)?),
        };

        Ok(PlanInput {
            clients,
            requested_days,
            start,
        })
    }
}

fn parse_day_count(value: &Value) -> Result<usize, String> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| "numDiasAlvo must be a valid integer".to_string())?;

    if parsed < 1 {
        return Err("numDiasAlvo must be a positive integer".to_string());
    }
    if parsed > MAX_REQUESTED_DAYS {
        return Err(format!("numDiasAlvo must not exceed {}", MAX_REQUESTED_DAYS));
    }
    Ok(parsed as usize)
}

fn parse_start(value: Value) -> Result<Coordinates, String> {
    let coords: Coordinates = serde_json::from_value(value)
        .map_err(|e| format!("base coordinates are invalid: {}", e))?;
    Coordinates::new(coords.lat, coords.lng)
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub total_clientes: usize,
    pub total_dias: usize,
    pub media_clientes_dia: usize,
    pub ponto_partida: Option<Coordinates>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub success: bool,
    pub data: RoutePlan,
    pub meta: ResponseMeta,
}
