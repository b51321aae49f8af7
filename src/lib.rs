// Library exports for the server, the CLI and the tests

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use error::{AppError, Result};

use config::{Config, PlannerConfig};
use services::collaborators::{OfflineOptimizer, PathRenderer, RouteOptimizer, StraightLineRenderer};
use services::ors::OrsClient;
use services::planner::sequencing::RouteSequencer;
use services::planner::RoutePlanner;
use services::vroom::VroomClient;
use std::sync::Arc;
use std::time::Duration;

// App state for sharing across the application
pub struct AppState {
    pub planner: RoutePlanner,
    pub optimizer: Arc<dyn RouteOptimizer>,
    pub renderer: Arc<dyn PathRenderer>,
    pub vroom_url: String,
    pub ors_url: String,
}

impl AppState {
    /// State backed by the VROOM and ORS services named in `config`.
    pub fn from_config(config: &Config) -> Self {
        let vroom = VroomClient::from_config(config);
        let ors = OrsClient::from_config(config);
        let vroom_url = vroom.base_url().to_string();
        let ors_url = ors.base_url().to_string();

        Self::with_collaborators(
            config.planner.clone(),
            Arc::new(vroom),
            Arc::new(ors),
            config.vroom_timeout(),
            config.ors_directions_timeout(),
            vroom_url,
            ors_url,
        )
    }

    /// State that never leaves the process: local tours and straight lines.
    pub fn offline(planner: PlannerConfig) -> Self {
        Self::with_collaborators(
            planner,
            Arc::new(OfflineOptimizer),
            Arc::new(StraightLineRenderer),
            Duration::from_secs(1),
            Duration::from_secs(1),
            "offline".to_string(),
            "offline".to_string(),
        )
    }

    pub fn with_collaborators(
        planner: PlannerConfig,
        optimizer: Arc<dyn RouteOptimizer>,
        renderer: Arc<dyn PathRenderer>,
        optimizer_timeout: Duration,
        renderer_timeout: Duration,
        vroom_url: String,
        ors_url: String,
    ) -> Self {
        let sequencer = RouteSequencer::new(
            optimizer.clone(),
            renderer.clone(),
            optimizer_timeout,
            renderer_timeout,
        );

        AppState {
            planner: RoutePlanner::new(planner, sequencer),
            optimizer,
            renderer,
            vroom_url,
            ors_url,
        }
    }
}
