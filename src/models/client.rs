use crate::models::Coordinates;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const ID_FIELDS: &[&str] = &["id", "cod", "codcli", "codigo", "_id"];
const NAME_FIELDS: &[&str] = &["nome", "name", "razaosocial"];
const LAT_FIELDS: &[&str] = &["latitude", "lat", "Latitude"];
const LNG_FIELDS: &[&str] = &["longitude", "lon", "Longitude"];

/// A geolocated visit point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Client {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "latitude")]
    pub lat: f64,
    #[serde(rename = "longitude")]
    pub lng: f64,
}

impl Client {
    pub fn new(id: impl Into<String>, name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Client {
            id: id.into(),
            name: name.into(),
            lat,
            lng,
        }
    }

    pub fn position(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lng: self.lng,
        }
    }

    /// Build a client from a loosely-typed record.
    ///
    /// Several field spellings are accepted for each attribute and numbers may
    /// arrive as strings. Returns `None` for non-objects, non-finite coordinates
    /// and the `(0, 0)` placeholder. `index` names records without any id.
    pub fn from_raw(raw: &Value, index: usize) -> Option<Self> {
        let record = raw.as_object()?;

        let lat = LAT_FIELDS
            .iter()
            .find_map(|key| record.get(*key).filter(|v| !v.is_null()))
            .and_then(as_number)?;
        let lng = LNG_FIELDS
            .iter()
            .find_map(|key| record.get(*key).filter(|v| !v.is_null()))
            .and_then(as_number)?;

        if !lat.is_finite() || !lng.is_finite() || (lat == 0.0 && lng == 0.0) {
            return None;
        }

        let id = ID_FIELDS
            .iter()
            .find_map(|key| record.get(*key).and_then(as_text))
            .unwrap_or_else(|| format!("cliente-{}", index + 1));
        let name = NAME_FIELDS
            .iter()
            .find_map(|key| record.get(*key).and_then(as_text))
            .unwrap_or_else(|| format!("Cliente {}", id));

        Some(Client::new(id, name, lat, lng))
    }
}

/// Normalize raw records into clients, dropping unusable ones.
///
/// Duplicate ids get a `#n` suffix so that every client stays addressable.
pub fn normalize_clients(raw: &[Value]) -> Vec<Client> {
    let mut clients: Vec<Client> = Vec::with_capacity(raw.len());
    let mut seen = std::collections::HashSet::new();

    for (index, record) in raw.iter().enumerate() {
        let Some(mut client) = Client::from_raw(record, index) else {
            tracing::debug!(index, "Dropping client record without usable coordinates");
            continue;
        };

        if !seen.insert(client.id.clone()) {
            let mut suffix = 2;
            while !seen.insert(format!("{}#{}", client.id, suffix)) {
                suffix += 1;
            }
            tracing::debug!(id = %client.id, suffix, "Duplicate client id renamed");
            client.id = format!("{}#{}", client.id, suffix);
        }

        clients.push(client);
    }

    clients
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
