//! Corrective passes over allocated days.
//!
//! Each day is a list of client indices; centroids are recomputed from the
//! current membership whenever a pass needs them.

use crate::config::PlannerConfig;
use crate::models::Coordinates;
use crate::services::planner::geometry::{
    centroid_of, distance_km, group_by_radius, max_radius, nearest_target, sort_along_major_axis,
};

/// Problem left on a day after every pass has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayIssue {
    Empty { day: usize },
    Undersized { day: usize, clients: usize },
}

/// Run radius cap, forced balancing, fragmentation repair and boundary
/// optimization, in that order.
pub fn refine_days(
    days: &mut [Vec<usize>],
    positions: &[Coordinates],
    target_per_day: usize,
    config: &PlannerConfig,
) {
    cap_day_radius(days, positions, target_per_day, config);
    force_balance(days, positions, config);
    repair_fragmentation(days, positions, target_per_day, config);
    optimize_boundaries(days, positions, target_per_day, config);
}

fn has_spare_capacity(day: &[usize], target_per_day: usize, config: &PlannerConfig) -> bool {
    (day.len() as f64) < config.spare_capacity_factor * target_per_day as f64
}

/// Centroids of every non-empty day except `skip`.
fn other_centroids(days: &[Vec<usize>], positions: &[Coordinates], skip: usize) -> Vec<(usize, Coordinates)> {
    days.iter()
        .enumerate()
        .filter(|(idx, day)| *idx != skip && !day.is_empty())
        .map(|(idx, day)| (idx, centroid_of(day, positions)))
        .collect()
}

fn move_client(days: &mut [Vec<usize>], client: usize, from: usize, to: usize) {
    days[from].retain(|&c| c != client);
    days[to].push(client);
}

/// Relocate the farthest clients of days wider than `max_day_radius_km`.
///
/// Distances are measured against the day's centroid before any move. A client
/// only leaves for a non-empty day with spare capacity whose centroid is both
/// markedly closer than its own and within the target radius. Returns the
/// number of clients moved.
pub fn cap_day_radius(
    days: &mut [Vec<usize>],
    positions: &[Coordinates],
    target_per_day: usize,
    config: &PlannerConfig,
) -> usize {
    let mut moved = 0;

    for day in 0..days.len() {
        if days[day].is_empty() {
            continue;
        }

        let center = centroid_of(&days[day], positions);
        let radius = max_radius(&days[day], positions, &center);
        if radius <= config.max_day_radius_km {
            continue;
        }

        let mut by_distance: Vec<(usize, f64)> = days[day]
            .iter()
            .map(|&c| (c, distance_km(&positions[c], &center)))
            .collect();
        by_distance.sort_by(|a, b| b.1.total_cmp(&a.1));

        let count = ((by_distance.len() as f64 * config.radius_move_fraction).ceil() as usize).max(1);
        tracing::warn!(day = day + 1, radius_km = radius, candidates = count, "Day radius too large");

        for &(client, dist) in by_distance.iter().take(count) {
            let targets = other_centroids(days, positions, day);
            let destination = nearest_target(&positions[client], targets, |idx, d| {
                d < config.radius_improvement_factor * dist
                    && d < config.radius_target_factor * config.max_day_radius_km
                    && has_spare_capacity(&days[idx], target_per_day, config)
            });

            if let Some((to, d)) = destination {
                tracing::debug!(client, from = day + 1, to = to + 1, distance_km = d, "Radius cap move");
                move_client(days, client, day, to);
                moved += 1;
            }
        }

        if !days[day].is_empty() {
            let center = centroid_of(&days[day], positions);
            tracing::debug!(
                day = day + 1,
                radius_km = max_radius(&days[day], positions, &center),
                "Day radius after cap"
            );
        }
    }

    moved
}

/// Fill empty days by splitting the fullest days.
///
/// The donor is the fullest day that keeps at least `min_viable` clients after
/// giving away half of them (never fewer than `min_viable`). When no day is
/// that large, the fullest day above `min_viable` gives what it can while
/// keeping one client, which may leave it below `min_viable`. Moved clients
/// are the leading band of the donor along its wider axis, so both halves
/// stay compact.
pub fn force_balance(days: &mut [Vec<usize>], positions: &[Coordinates], config: &PlannerConfig) {
    let min_viable = config.min_viable;

    for _ in 0..config.max_forced_balance_iterations {
        let Some(empty) = days.iter().position(|d| d.is_empty()) else {
            return;
        };

        let fullest = |eligible: &dyn Fn(usize) -> bool| {
            let mut best: Option<usize> = None;
            for (idx, day) in days.iter().enumerate() {
                if eligible(day.len()) && best.map_or(true, |b| day.len() > days[b].len()) {
                    best = Some(idx);
                }
            }
            best
        };

        let donor = fullest(&|len| len >= 2 * min_viable).or_else(|| fullest(&|len| len > min_viable));
        let Some(donor) = donor else {
            tracing::warn!(day = empty + 1, "No day can spare clients for an empty day");
            return;
        };

        let load = days[donor].len();
        let count = (load / 2).max(min_viable).min(load - 1);

        let moving: Vec<usize> = sort_along_major_axis(&days[donor], positions)
            .into_iter()
            .take(count)
            .collect();
        days[donor].retain(|c| !moving.contains(c));
        days[empty] = moving;

        tracing::info!(from = donor + 1, to = empty + 1, clients = count, "Forced balancing move");
    }

    if days.iter().any(|d| d.is_empty()) {
        tracing::warn!("Forced balancing hit its iteration limit");
    }
}

/// Keep each day's largest island and move the smaller ones, whole, to the
/// nearest other non-empty day with spare capacity. Returns islands moved.
pub fn repair_fragmentation(
    days: &mut [Vec<usize>],
    positions: &[Coordinates],
    target_per_day: usize,
    config: &PlannerConfig,
) -> usize {
    let mut moved = 0;

    for day in 0..days.len() {
        if days[day].len() < config.min_fragmented_day_size {
            continue;
        }

        let mut islands = group_by_radius(&days[day], positions, config.island_radius_km);
        if islands.len() <= 1 {
            continue;
        }
        islands.sort_by_key(|island| std::cmp::Reverse(island.len()));
        tracing::warn!(day = day + 1, islands = islands.len(), "Day is fragmented");

        for island in islands.into_iter().skip(1) {
            let center = centroid_of(&island, positions);
            let targets = other_centroids(days, positions, day);
            let destination = nearest_target(&center, targets, |idx, _| {
                has_spare_capacity(&days[idx], target_per_day, config)
            });

            if let Some((to, d)) = destination {
                tracing::debug!(
                    from = day + 1,
                    to = to + 1,
                    clients = island.len(),
                    distance_km = d,
                    "Moving island"
                );
                days[day].retain(|c| !island.contains(c));
                days[to].extend(island);
                moved += 1;
            }
        }
    }

    moved
}

/// Move clients that sit markedly closer to another day's centroid.
///
/// Days with `min_viable` clients or fewer never give clients away. Centroids
/// are snapshotted when a day starts being processed. Passes stop early once
/// nothing moves. Returns the number of clients moved.
pub fn optimize_boundaries(
    days: &mut [Vec<usize>],
    positions: &[Coordinates],
    target_per_day: usize,
    config: &PlannerConfig,
) -> usize {
    let mut total = 0;

    for pass in 0..config.max_boundary_passes {
        let mut moved = 0;

        for day in 0..days.len() {
            if days[day].len() <= config.min_viable {
                continue;
            }

            let own = centroid_of(&days[day], positions);
            let others = other_centroids(days, positions, day);

            for client in days[day].clone() {
                if days[day].len() <= config.min_viable {
                    break;
                }

                let own_dist = distance_km(&positions[client], &own);
                let destination = nearest_target(&positions[client], others.iter().copied(), |idx, d| {
                    d < config.boundary_threshold * own_dist
                        && has_spare_capacity(&days[idx], target_per_day, config)
                });

                if let Some((to, _)) = destination {
                    tracing::debug!(client, from = day + 1, to = to + 1, "Boundary move");
                    move_client(days, client, day, to);
                    moved += 1;
                }
            }
        }

        total += moved;
        if moved == 0 {
            tracing::debug!(pass = pass + 1, "Boundary optimization converged");
            break;
        }
    }

    tracing::info!(moves = total, "Boundary optimization done");
    total
}

/// Days still empty or below `min_viable`, logged as warnings.
pub fn residual_issues(days: &[Vec<usize>], config: &PlannerConfig) -> Vec<DayIssue> {
    let mut issues = Vec::new();

    for (idx, day) in days.iter().enumerate() {
        if day.is_empty() {
            tracing::warn!(day = idx + 1, "Day is still empty after refinement");
            issues.push(DayIssue::Empty { day: idx + 1 });
        } else if day.len() < config.min_viable {
            tracing::warn!(
                day = idx + 1,
                clients = day.len(),
                min = config.min_viable,
                "Day is below minimum size"
            );
            issues.push(DayIssue::Undersized {
                day: idx + 1,
                clients: day.len(),
            });
        }
    }

    issues
}
