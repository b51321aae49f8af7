use crate::config::Config;
use crate::constants::{ROUTING_PROFILE, VROOM_JOB_SERVICE_SECONDS};
use crate::error::{AppError, Result};
use crate::models::Coordinates;
use crate::services::collaborators::{is_permutation, straight_line, OptimizedSequence, RouteOptimizer};
use crate::services::route_geometry::parse_geometry;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// VROOM client: the first stop is the vehicle start, every other stop a job.
#[derive(Clone)]
pub struct VroomClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    health_timeout: Duration,
}

impl VroomClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, health_timeout: Duration) -> Self {
        VroomClient {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            health_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.vroom_base_url.clone(),
            config.vroom_timeout(),
            config.health_check_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn solve(&self, request: &VroomRequest) -> Result<VroomSolution> {
        let url = format!("{}/", self.base_url);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::RouteOptimizer(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(
                status = %status,
                jobs = request.jobs.len(),
                "VROOM HTTP error {}: {}",
                status, error_text
            );
            return Err(AppError::RouteOptimizer(format!("HTTP {}: {}", status, error_text)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::RouteOptimizer(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl RouteOptimizer for VroomClient {
    async fn optimize_sequence(&self, stops: &[Coordinates]) -> Result<OptimizedSequence> {
        match stops {
            [] => {
                return Ok(OptimizedSequence {
                    order: Vec::new(),
                    geometry: None,
                })
            }
            [_] => {
                return Ok(OptimizedSequence {
                    order: vec![0],
                    geometry: Some(straight_line(stops)),
                })
            }
            _ => {}
        }

        let request = VroomRequest::for_stops(stops);
        tracing::debug!(jobs = request.jobs.len(), "VROOM request: {} jobs", request.jobs.len());

        let solution = self.solve(&request).await?;
        let route = solution
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| AppError::RouteOptimizer("No routes in solution".to_string()))?;

        let mut order = vec![0];
        order.extend(
            route
                .steps
                .iter()
                .filter(|s| s.step_type.as_deref() == Some("job"))
                .filter_map(|s| s.job)
                .filter(|&job| job >= 1 && (job as usize) < stops.len())
                .map(|job| job as usize),
        );

        if !is_permutation(&order, stops.len()) {
            tracing::warn!(
                stops = stops.len(),
                visited = order.len(),
                "VROOM solution does not visit every stop exactly once"
            );
            return Err(AppError::RouteOptimizer(format!(
                "Solution visits {} of {} stops",
                order.len(),
                stops.len()
            )));
        }

        let geometry = route
            .geometry
            .as_ref()
            .map(parse_geometry)
            .filter(|g| !g.is_empty());
        tracing::debug!(
            stops = stops.len(),
            path_points = geometry.as_ref().map_or(0, |g| g.len()),
            "VROOM solution accepted"
        );

        Ok(OptimizedSequence { order, geometry })
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/", self.base_url);
        let sample = [
            Coordinates { lat: -23.5614, lng: -46.6559 },
            Coordinates { lat: -23.5872, lng: -46.6576 },
        ];
        let mut request = VroomRequest::for_stops(&sample);
        request.options = None;

        let result = self
            .client
            .post(&url)
            .query(&[("geometry", "false")])
            .timeout(self.health_timeout)
            .json(&request)
            .send()
            .await;

        match result {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!(base_url = %self.base_url, "VROOM health check failed: {}", e);
                false
            }
        }
    }
}

// VROOM API request / response types

#[derive(Debug, Serialize)]
struct VroomRequest {
    jobs: Vec<VroomJob>,
    vehicles: Vec<VroomVehicle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<VroomOptions>,
}

impl VroomRequest {
    /// Caller guarantees at least one stop.
    fn for_stops(stops: &[Coordinates]) -> Self {
        let jobs = stops
            .iter()
            .enumerate()
            .skip(1)
            .map(|(idx, stop)| VroomJob {
                id: idx,
                location: stop.to_lon_lat(),
                service: VROOM_JOB_SERVICE_SECONDS,
            })
            .collect();

        VroomRequest {
            jobs,
            vehicles: vec![VroomVehicle {
                id: 1,
                start: stops.first().map(|s| s.to_lon_lat()).unwrap_or_default(),
                profile: ROUTING_PROFILE,
            }],
            options: Some(VroomOptions {
                geometry: true,
                geometry_format: "geojson",
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct VroomJob {
    id: usize,
    /// `[lon, lat]`
    location: [f64; 2],
    service: u64,
}

#[derive(Debug, Serialize)]
struct VroomVehicle {
    id: usize,
    start: [f64; 2],
    profile: &'static str,
}

#[derive(Debug, Serialize)]
struct VroomOptions {
    geometry: bool,
    geometry_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct VroomSolution {
    #[serde(default)]
    routes: Vec<VroomRoute>,
}

#[derive(Debug, Deserialize)]
struct VroomRoute {
    #[serde(default)]
    steps: Vec<VroomStep>,
    #[serde(default)]
    geometry: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct VroomStep {
    #[serde(rename = "type", default)]
    step_type: Option<String>,
    #[serde(default)]
    job: Option<i64>,
}
