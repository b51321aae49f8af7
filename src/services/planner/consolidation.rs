//! Merging of undersized sectors into viable ones.

use crate::config::PlannerConfig;
use crate::models::Coordinates;
use crate::services::planner::geometry::{distance_km, nearest_target};
use crate::services::planner::sectors::{max_sector_size, Sector};

const MERGED_OUTLIERS_ID: &str = "OUTLIERS_AGRUPADOS";

/// Fold every sector smaller than `min_viable` into its nearest viable sector.
///
/// Outliers are handled smallest first and the receiving sector's centroid is
/// updated after each merge. When no viable sector exists, all sectors are
/// combined into one.
pub fn fuse_outliers(
    sectors: Vec<Sector>,
    positions: &[Coordinates],
    config: &PlannerConfig,
) -> Vec<Sector> {
    let (mut viable, mut outliers): (Vec<Sector>, Vec<Sector>) = sectors
        .into_iter()
        .partition(|s| s.len() >= config.min_viable);

    if outliers.is_empty() {
        tracing::debug!(sectors = viable.len(), "No outlier sectors to fuse");
        return viable;
    }

    if viable.is_empty() {
        tracing::warn!(
            outliers = outliers.len(),
            "Every sector is below minimum size, merging all of them"
        );
        let mut rest = outliers.into_iter();
        let Some(first) = rest.next() else {
            return Vec::new();
        };
        let mut merged = Sector::new(
            MERGED_OUTLIERS_ID,
            first.city.clone(),
            None,
            first.into_members(),
            positions,
        );
        for sector in rest {
            merged.absorb(sector, positions);
        }
        return vec![merged];
    }

    outliers.sort_by_key(|s| s.len());
    let mut moved = 0;

    for outlier in outliers {
        let from = outlier.centroid();
        let Some((target, dist)) = nearest_target(
            &from,
            viable.iter().map(|s| s.centroid()).enumerate(),
            |_, _| true,
        ) else {
            continue;
        };

        tracing::debug!(
            outlier = %outlier.id,
            into = %viable[target].id,
            clients = outlier.len(),
            distance_km = dist,
            "Fusing outlier sector"
        );
        moved += outlier.len();
        viable[target].absorb(outlier, positions);
    }

    tracing::info!(clients = moved, sectors = viable.len(), "Outlier sectors fused");
    viable
}

/// Greedily group small same-city sectors that sit close together.
///
/// A sector below `floor(small_sector_factor * target)` seeds a group; later
/// small sectors of the same city join when within `max_group_distance_km`
/// of any sector already in the group and the combined size stays at most
/// `ceil(sector_max_factor * target)`. Adequate sectors come first in the
/// output, followed by groups and ungrouped small sectors in seed order.
pub fn group_small_sectors(
    sectors: Vec<Sector>,
    positions: &[Coordinates],
    target_per_day: usize,
    config: &PlannerConfig,
) -> Vec<Sector> {
    let lower = (config.small_sector_factor * target_per_day as f64).floor() as usize;
    let upper = max_sector_size(target_per_day, config);

    let small_count = sectors.iter().filter(|s| s.len() < lower).count();
    if small_count < 2 {
        tracing::debug!(small = small_count, "Not enough small sectors to group");
        return sectors;
    }

    let (mut result, small): (Vec<Sector>, Vec<Sector>) =
        sectors.into_iter().partition(|s| s.len() >= lower);
    let mut pending: Vec<Option<Sector>> = small.into_iter().map(Some).collect();

    for seed in 0..pending.len() {
        let Some(seed_sector) = pending[seed].take() else {
            continue;
        };

        let mut group_centroids = vec![seed_sector.centroid()];
        let mut group_size = seed_sector.len();
        let mut group = vec![seed_sector];

        for candidate in pending.iter_mut().skip(seed + 1) {
            let joins = candidate.as_ref().is_some_and(|c| {
                c.city == group[0].city
                    && group_size + c.len() <= upper
                    && group_centroids
                        .iter()
                        .any(|g| distance_km(g, &c.centroid()) < config.max_group_distance_km)
            });
            if !joins {
                continue;
            }
            if let Some(sector) = candidate.take() {
                group_centroids.push(sector.centroid());
                group_size += sector.len();
                group.push(sector);
            }
        }

        if group.len() == 1 {
            result.extend(group);
            continue;
        }

        let id = format!(
            "GRUPO_{}",
            group
                .iter()
                .map(|s| s.id.rsplit('_').next().unwrap_or(&s.id).to_string())
                .collect::<Vec<_>>()
                .join("+")
        );
        tracing::debug!(group = %id, sectors = group.len(), clients = group_size, "Grouped small sectors");

        let mut parts = group.into_iter();
        if let Some(first) = parts.next() {
            let mut merged = Sector::new(id, first.city.clone(), None, first.into_members(), positions);
            for part in parts {
                merged.absorb(part, positions);
            }
            result.push(merged);
        }
    }

    tracing::info!(sectors = result.len(), "Small sectors grouped");
    result
}
