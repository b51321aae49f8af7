use crate::constants::*;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub vroom_base_url: String,
    pub vroom_timeout_ms: u64,
    pub ors_base_url: String,
    pub ors_directions_max_coords: usize,
    pub ors_directions_timeout_ms: u64,
    pub health_check_timeout_ms: u64,
    pub planner: PlannerConfig,
}

/// Tuning knobs of the clustering pipeline.
///
/// One immutable value is built per process (or per test) and threaded through
/// every stage, so a run is fully determined by its input and this value.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    /// Linkage radius (km) for city detection
    pub city_radius_km: f64,
    /// Linkage radius (km) for island detection inside a day
    pub island_radius_km: f64,
    /// Hard upper bound on the number of days
    pub max_days: usize,
    /// Smallest allowed sector / day population
    pub min_viable: usize,

    /// City is large when size >= factor * target
    pub large_city_factor: f64,
    /// City is medium when size >= factor * target
    pub medium_city_factor: f64,
    /// Sectors above ceil(factor * target) are split
    pub sector_max_factor: f64,
    /// Points within factor * mean radius form the center sector
    pub center_radius_factor: f64,
    /// Sectors below floor(factor * target) are grouping candidates
    pub small_sector_factor: f64,
    /// Maximum centroid distance (km) between grouped small sectors
    pub max_group_distance_km: f64,

    /// Bounding-box overlap ratio that triggers an overlap warning
    pub overlap_threshold: f64,
    /// Centroid distance (km) under which two sectors are flagged as too close
    pub min_centroid_distance_km: f64,

    /// Same-city affinity: maximum sector-to-day distance (km)
    pub same_city_max_distance_km: f64,
    /// Same-city affinity: maximum resulting load as factor of target
    pub same_city_load_factor: f64,
    /// Relaxed load cap for nearest-day placement
    pub relaxed_load_factor: f64,
    /// Nearest-day placement only applies within this distance (km)
    pub nearest_day_max_distance_km: f64,
    /// Load gap tolerated by local rebalancing, as fraction of target
    pub balance_tolerance: f64,
    pub max_balance_iterations: usize,

    /// Maximum client-to-centroid distance (km) of a day
    pub max_day_radius_km: f64,
    /// Fraction of farthest clients considered for relocation
    pub radius_move_fraction: f64,
    /// Destination must be closer than factor * current distance
    pub radius_improvement_factor: f64,
    /// Destination must be closer than factor * max_day_radius_km
    pub radius_target_factor: f64,
    /// A day has spare capacity while its size < factor * target
    pub spare_capacity_factor: f64,
    pub max_forced_balance_iterations: usize,
    /// Days smaller than this are never checked for fragmentation
    pub min_fragmented_day_size: usize,
    /// Client migrates when another centroid is closer than factor * own distance
    pub boundary_threshold: f64,
    pub max_boundary_passes: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            city_radius_km: 8.0,
            island_radius_km: 8.0,
            max_days: 30,
            min_viable: 3,
            large_city_factor: 2.0,
            medium_city_factor: 0.6,
            sector_max_factor: 1.3,
            center_radius_factor: 0.3,
            small_sector_factor: 0.7,
            max_group_distance_km: 20.0,
            overlap_threshold: 0.15,
            min_centroid_distance_km: 5.0,
            same_city_max_distance_km: 30.0,
            same_city_load_factor: 1.5,
            relaxed_load_factor: 1.8,
            nearest_day_max_distance_km: 25.0,
            balance_tolerance: 0.35,
            max_balance_iterations: 50,
            max_day_radius_km: 40.0,
            radius_move_fraction: 0.2,
            radius_improvement_factor: 0.6,
            radius_target_factor: 0.8,
            spare_capacity_factor: 1.8,
            max_forced_balance_iterations: 50,
            min_fragmented_day_size: 4,
            boundary_threshold: 0.7,
            max_boundary_passes: 3,
        }
    }
}

/// Read `key` from the environment, falling back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> Result<T, String>
where
    T: FromStr + ToString,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| format!("Invalid {}", key))
}

impl PlannerConfig {
    pub fn from_env() -> Result<Self, String> {
        let d = Self::default();

        let config = Self {
            city_radius_km: env_or("PLANNER_CITY_RADIUS_KM", d.city_radius_km)?,
            island_radius_km: env_or("PLANNER_ISLAND_RADIUS_KM", d.island_radius_km)?,
            max_days: env_or("PLANNER_MAX_DAYS", d.max_days)?,
            min_viable: env_or("PLANNER_MIN_VIABLE", d.min_viable)?,
            large_city_factor: env_or("PLANNER_LARGE_CITY_FACTOR", d.large_city_factor)?,
            medium_city_factor: env_or("PLANNER_MEDIUM_CITY_FACTOR", d.medium_city_factor)?,
            sector_max_factor: env_or("PLANNER_SECTOR_MAX_FACTOR", d.sector_max_factor)?,
            center_radius_factor: env_or(
                "PLANNER_CENTER_RADIUS_FACTOR",
                d.center_radius_factor,
            )?,
            small_sector_factor: env_or("PLANNER_SMALL_SECTOR_FACTOR", d.small_sector_factor)?,
            max_group_distance_km: env_or(
                "PLANNER_MAX_GROUP_DISTANCE_KM",
                d.max_group_distance_km,
            )?,
            overlap_threshold: env_or("PLANNER_OVERLAP_THRESHOLD", d.overlap_threshold)?,
            min_centroid_distance_km: env_or(
                "PLANNER_MIN_CENTROID_DISTANCE_KM",
                d.min_centroid_distance_km,
            )?,
            same_city_max_distance_km: env_or(
                "PLANNER_SAME_CITY_MAX_DISTANCE_KM",
                d.same_city_max_distance_km,
            )?,
            same_city_load_factor: env_or(
                "PLANNER_SAME_CITY_LOAD_FACTOR",
                d.same_city_load_factor,
            )?,
            relaxed_load_factor: env_or("PLANNER_RELAXED_LOAD_FACTOR", d.relaxed_load_factor)?,
            nearest_day_max_distance_km: env_or(
                "PLANNER_NEAREST_DAY_MAX_DISTANCE_KM",
                d.nearest_day_max_distance_km,
            )?,
            balance_tolerance: env_or("PLANNER_BALANCE_TOLERANCE", d.balance_tolerance)?,
            max_balance_iterations: env_or(
                "PLANNER_MAX_BALANCE_ITERATIONS",
                d.max_balance_iterations,
            )?,
            max_day_radius_km: env_or("PLANNER_MAX_DAY_RADIUS_KM", d.max_day_radius_km)?,
            radius_move_fraction: env_or(
                "PLANNER_RADIUS_MOVE_FRACTION",
                d.radius_move_fraction,
            )?,
            radius_improvement_factor: env_or(
                "PLANNER_RADIUS_IMPROVEMENT_FACTOR",
                d.radius_improvement_factor,
            )?,
            radius_target_factor: env_or(
                "PLANNER_RADIUS_TARGET_FACTOR",
                d.radius_target_factor,
            )?,
            spare_capacity_factor: env_or(
                "PLANNER_SPARE_CAPACITY_FACTOR",
                d.spare_capacity_factor,
            )?,
            max_forced_balance_iterations: env_or(
                "PLANNER_MAX_FORCED_BALANCE_ITERATIONS",
                d.max_forced_balance_iterations,
            )?,
            min_fragmented_day_size: env_or(
                "PLANNER_MIN_FRAGMENTED_DAY_SIZE",
                d.min_fragmented_day_size,
            )?,
            boundary_threshold: env_or("PLANNER_BOUNDARY_THRESHOLD", d.boundary_threshold)?,
            max_boundary_passes: env_or("PLANNER_MAX_BOUNDARY_PASSES", d.max_boundary_passes)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.min_viable == 0 {
            return Err("PLANNER_MIN_VIABLE must be at least 1".to_string());
        }
        if self.max_days == 0 {
            return Err("PLANNER_MAX_DAYS must be at least 1".to_string());
        }
        if self.city_radius_km <= 0.0 || self.island_radius_km <= 0.0 {
            return Err("Linkage radii must be positive".to_string());
        }
        Ok(())
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        let ors_directions_max_coords: usize =
            env_or("ORS_DIRECTIONS_MAX_COORDS", DEFAULT_ORS_DIRECTIONS_MAX_COORDS)?;
        if ors_directions_max_coords < 2 {
            return Err("ORS_DIRECTIONS_MAX_COORDS must be at least 2".to_string());
        }

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| "Invalid PORT")?,
            vroom_base_url: env::var("VROOM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_VROOM_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            vroom_timeout_ms: env_or("VROOM_TIMEOUT_MS", DEFAULT_VROOM_TIMEOUT_MS)?,
            ors_base_url: env::var("ORS_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ORS_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            ors_directions_max_coords,
            ors_directions_timeout_ms: env_or(
                "ORS_DIRECTIONS_TIMEOUT_MS",
                DEFAULT_ORS_DIRECTIONS_TIMEOUT_MS,
            )?,
            health_check_timeout_ms: env_or(
                "HEALTH_CHECK_TIMEOUT_MS",
                DEFAULT_HEALTH_CHECK_TIMEOUT_MS,
            )?,
            planner: PlannerConfig::from_env()?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn vroom_timeout(&self) -> Duration {
        Duration::from_millis(self.vroom_timeout_ms)
    }

    pub fn ors_directions_timeout(&self) -> Duration {
        Duration::from_millis(self.ors_directions_timeout_ms)
    }

    pub fn health_check_timeout(&self) -> Duration {
        Duration::from_millis(self.health_check_timeout_ms)
    }
}
