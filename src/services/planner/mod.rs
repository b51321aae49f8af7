//! Clustering of clients into daily routes.
//!
//! Stages run top-down once per request: city detection and classification,
//! sector building, an overlap audit, consolidation, a second audit, day
//! allocation, refinement, then per-day sequencing. Everything before sequencing is
//! synchronous and deterministic for a given input order and configuration.

pub mod allocation;
pub mod cities;
pub mod consolidation;
pub mod geometry;
pub mod overlap;
pub mod refinement;
pub mod sectors;
pub mod sequencing;

use crate::config::PlannerConfig;
use crate::constants::DEFAULT_REQUESTED_DAYS;
use crate::error::{AppError, Result};
use crate::models::{normalize_clients, Client, Coordinates, PlanSummary, RoutePlan};
use serde_json::Value;

use allocation::allocate_sectors;
use cities::{classify_cities, detect_cities};
use consolidation::{fuse_outliers, group_small_sectors};
use overlap::{audit_overlaps, FlaggedPair};
use refinement::{refine_days, residual_issues, DayIssue};
use sectors::{build_sectors, Sector};
use sequencing::RouteSequencer;

/// Client indices per day, before sequencing.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub days: Vec<Vec<usize>>,
    pub summary: PlanSummary,
    pub issues: Vec<DayIssue>,
}

/// Effective day count for `total` clients.
///
/// The request is clamped to `[1, max_days]`, then to what the dataset can
/// fill with at least `min_viable` clients per day. Fewer than `min_viable`
/// clients always give a single day.
pub fn effective_day_count(total: usize, requested: usize, config: &PlannerConfig) -> usize {
    let k = requested.clamp(1, config.max_days.max(1));
    if total < config.min_viable {
        return 1;
    }
    k.min(total / config.min_viable).max(1)
}

/// Run every stage up to and including refinement.
pub fn partition(clients: &[Client], requested_days: usize, config: &PlannerConfig) -> Partition {
    let total = clients.len();
    let day_count = effective_day_count(total, requested_days, config);
    let target_per_day = total.div_ceil(day_count).max(1);

    let summary = PlanSummary {
        total_clients: total,
        requested_days,
        effective_days: day_count,
        target_per_day,
        clamped: day_count != requested_days,
    };
    if summary.clamped {
        tracing::info!(requested = requested_days, effective = day_count, "Day count adjusted to fit {} clients", total);
    }
    tracing::info!(clients = total, days = day_count, target_per_day, "Planning routes");

    let positions: Vec<Coordinates> = clients.iter().map(|c| c.position()).collect();

    let groups = detect_cities(&positions, config);
    let cities = classify_cities(groups, &positions, target_per_day, config);

    let sectors = build_sectors(&cities, &positions, target_per_day, config);
    let (sectors, _) = consolidate(sectors, &positions, target_per_day, config);

    let mut days = allocate_sectors(sectors, day_count, target_per_day, &positions, config);
    refine_days(&mut days, &positions, target_per_day, config);
    let issues = residual_issues(&days, config);

    Partition {
        days,
        summary,
        issues,
    }
}

/// Fuse outliers and group small sectors.
///
/// Overlaps are audited on the sectors as built, then again after grouping;
/// both audit results are returned in that order.
fn consolidate(
    sectors: Vec<Sector>,
    positions: &[Coordinates],
    target_per_day: usize,
    config: &PlannerConfig,
) -> (Vec<Sector>, [Vec<FlaggedPair>; 2]) {
    let built = audit_overlaps(&sectors, config, "after sector building");
    let sectors = fuse_outliers(sectors, positions, config);
    let sectors = group_small_sectors(sectors, positions, target_per_day, config);
    let grouped = audit_overlaps(&sectors, config, "after grouping");
    (sectors, [built, grouped])
}

/// End-to-end planner: normalization, partitioning and sequencing.
#[derive(Clone)]
pub struct RoutePlanner {
    config: PlannerConfig,
    sequencer: RouteSequencer,
}

impl RoutePlanner {
    pub fn new(config: PlannerConfig, sequencer: RouteSequencer) -> Self {
        RoutePlanner { config, sequencer }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan routes from raw client records.
    ///
    /// Fails only when no record survives normalization. Returns exactly
    /// `summary.effective_days` days, some possibly empty.
    pub async fn plan(
        &self,
        raw: &[Value],
        requested_days: Option<usize>,
        start: Option<Coordinates>,
    ) -> Result<RoutePlan> {
        let clients = normalize_clients(raw);
        if clients.is_empty() {
            return Err(AppError::NoValidClients(raw.len()));
        }
        if clients.len() < raw.len() {
            tracing::info!(received = raw.len(), valid = clients.len(), "Some client records were dropped");
        }

        self.plan_clients(clients, requested_days, start).await
    }

    /// Plan routes for already normalized clients.
    pub async fn plan_clients(
        &self,
        clients: Vec<Client>,
        requested_days: Option<usize>,
        start: Option<Coordinates>,
    ) -> Result<RoutePlan> {
        if clients.is_empty() {
            return Err(AppError::NoValidClients(0));
        }

        let requested = requested_days.unwrap_or(DEFAULT_REQUESTED_DAYS);
        let partition = partition(&clients, requested, &self.config);

        let day_clients: Vec<Vec<Client>> = partition
            .days
            .iter()
            .map(|day| day.iter().map(|&i| clients[i].clone()).collect())
            .collect();
        let days = self.sequencer.sequence_days(day_clients, start).await;

        let plan = RoutePlan {
            days,
            summary: partition.summary,
        };
        if plan.client_count() != clients.len() {
            return Err(AppError::Internal(format!(
                "Plan holds {} of {} clients",
                plan.client_count(),
                clients.len()
            )));
        }

        Ok(plan)
    }
}
