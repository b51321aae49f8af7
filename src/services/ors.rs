use crate::config::Config;
use crate::constants::ROUTING_PROFILE;
use crate::error::{AppError, Result};
use crate::models::Coordinates;
use crate::services::collaborators::{straight_line, PathRenderer};
use crate::services::route_geometry::{append_segment, dedupe_consecutive, parse_geometry};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// openrouteservice directions client used to draw road geometry.
#[derive(Clone)]
pub struct OrsClient {
    client: Client,
    base_url: String,
    max_coords: usize,
    timeout: Duration,
    health_timeout: Duration,
}

impl OrsClient {
    pub fn new(
        base_url: impl Into<String>,
        max_coords: usize,
        timeout: Duration,
        health_timeout: Duration,
    ) -> Self {
        OrsClient {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_coords: max_coords.max(2),
            timeout,
            health_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.ors_base_url.clone(),
            config.ors_directions_max_coords,
            config.ors_directions_timeout(),
            config.health_check_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Directions geometry for one batch of stops, as `[lat, lon]` pairs.
    async fn directions(&self, stops: &[Coordinates]) -> Result<Vec<[f64; 2]>> {
        let url = format!(
            "{}/v2/directions/{}/geojson",
            self.base_url, ROUTING_PROFILE
        );
        let body = DirectionsRequest {
            coordinates: stops.iter().map(|s| s.to_lon_lat()).collect(),
            instructions: false,
            geometry_simplify: true,
            continue_straight: true,
        };

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::PathRenderer(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::PathRenderer(format!("HTTP {}: {}", status, error_text)));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AppError::PathRenderer(format!("Failed to parse response: {}", e)))?;

        let geometry = parse_geometry(&data);
        if geometry.is_empty() {
            return Err(AppError::PathRenderer("Empty geometry".to_string()));
        }
        Ok(geometry)
    }
}

/// Start/end indices of batches of at most `max` stops sharing their boundary stop.
pub fn batch_ranges(len: usize, max: usize) -> Vec<(usize, usize)> {
    let max = max.max(2);
    let mut ranges = Vec::new();
    if len < 2 {
        return ranges;
    }

    let mut start = 0;
    loop {
        let end = (start + max).min(len);
        ranges.push((start, end));
        if end == len {
            break;
        }
        start = end - 1;
    }
    ranges
}

#[async_trait]
impl PathRenderer for OrsClient {
    async fn render_path(&self, stops: &[Coordinates]) -> Result<Vec<[f64; 2]>> {
        if stops.len() < 2 {
            return Ok(straight_line(stops));
        }

        let ranges = batch_ranges(stops.len(), self.max_coords);
        let mut path = Vec::new();
        let mut succeeded = 0;

        for (batch, &(start, end)) in ranges.iter().enumerate() {
            let segment = &stops[start..end];
            match self.directions(segment).await {
                Ok(geometry) => {
                    tracing::debug!(
                        batch = batch + 1,
                        batches = ranges.len(),
                        stops = segment.len(),
                        path_points = geometry.len(),
                        "ORS batch rendered"
                    );
                    succeeded += 1;
                    append_segment(&mut path, geometry);
                }
                Err(e) => {
                    tracing::warn!(
                        batch = batch + 1,
                        batches = ranges.len(),
                        "ORS batch failed, drawing straight line: {}",
                        e
                    );
                    append_segment(&mut path, straight_line(segment));
                }
            }
        }

        if succeeded == 0 {
            return Err(AppError::PathRenderer(format!(
                "All {} directions batches failed",
                ranges.len()
            )));
        }

        Ok(dedupe_consecutive(path))
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/v2/health", self.base_url);
        match self.client.get(&url).timeout(self.health_timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!(base_url = %self.base_url, "ORS health check failed: {}", e);
                false
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct DirectionsRequest {
    /// `[lon, lat]` pairs
    coordinates: Vec<[f64; 2]>,
    instructions: bool,
    geometry_simplify: bool,
    continue_straight: bool,
}
