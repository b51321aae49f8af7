//! Stable application-wide constants.
//!
//! Values here are structural invariants, algorithm coefficients, and default
//! fallbacks for env-var-based configuration. They should rarely change.
//! For the tuning knobs of the clustering pipeline, see
//! [`PlannerConfig`](crate::config::PlannerConfig) instead.

// --- Server defaults (used when HOST / PORT env vars are absent) ---

/// Default bind address for the HTTP server.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default port for the HTTP server.
pub const DEFAULT_PORT: &str = "9031";

// --- Collaborator defaults ---

/// Default VROOM endpoint. Overridden by `VROOM_BASE_URL`.
pub const DEFAULT_VROOM_BASE_URL: &str = "http://localhost:3000";
/// Default OpenRouteService endpoint. Overridden by `ORS_BASE_URL`.
pub const DEFAULT_ORS_BASE_URL: &str = "http://localhost:8082/ors";
/// Default VROOM request timeout: 60 seconds. Overridden by `VROOM_TIMEOUT_MS`.
pub const DEFAULT_VROOM_TIMEOUT_MS: u64 = 60_000;
/// Default ORS directions timeout: 2 minutes. Overridden by `ORS_DIRECTIONS_TIMEOUT_MS`.
pub const DEFAULT_ORS_DIRECTIONS_TIMEOUT_MS: u64 = 120_000;
/// Default timeout for the status endpoint health checks.
pub const DEFAULT_HEALTH_CHECK_TIMEOUT_MS: u64 = 10_000;
/// Maximum coordinates per ORS directions call before batching kicks in.
pub const DEFAULT_ORS_DIRECTIONS_MAX_COORDS: usize = 25;
/// Service time (seconds) attached to every VROOM job.
pub const VROOM_JOB_SERVICE_SECONDS: u64 = 300;
/// Routing profile shared by both collaborators.
pub const ROUTING_PROFILE: &str = "driving-car";
/// Precision of encoded polylines returned by VROOM.
pub const POLYLINE_PRECISION: u32 = 5;

// --- Request limits ---

/// Maximum number of client records accepted in one request.
pub const MAX_CLIENTS_PER_REQUEST: usize = 10_000;
/// Upper bound accepted for `numDiasAlvo` at the HTTP boundary.
/// The planner clamps further to `PlannerConfig::max_days`.
pub const MAX_REQUESTED_DAYS: i64 = 365;
/// Day count used when the request does not name one.
pub const DEFAULT_REQUESTED_DAYS: usize = 10;

// --- Geometry ---

/// Mean Earth radius used by every great-circle distance.
pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Minimum gain (km) for a 2-opt reversal to count as an improvement.
pub const TWO_OPT_EPSILON_KM: f64 = 1e-9;

// --- Territory audit ---

/// Fewest sellers an invasion audit compares.
pub const MIN_AUDIT_SELLERS: usize = 2;
/// Most sellers an invasion audit compares.
pub const MAX_AUDIT_SELLERS: usize = 5;
