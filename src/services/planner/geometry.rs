//! Distance, centroid and tour primitives shared by every planner stage.
//!
//! Points are addressed by index into one `positions` slice so that stages
//! move indices between buckets instead of copying client records.

use crate::constants::TWO_OPT_EPSILON_KM;
use crate::models::Coordinates;
use geo::{coord, BoundingRect, MultiPoint, Rect};
use std::collections::VecDeque;

/// Great-circle distance in kilometers.
pub fn distance_km(a: &Coordinates, b: &Coordinates) -> f64 {
    a.distance_to(b)
}

/// Arithmetic mean of latitudes and longitudes.
///
/// Returns `(0, 0)` for an empty input; callers must guard against it.
pub fn centroid<I>(points: I) -> Coordinates
where
    I: IntoIterator<Item = Coordinates>,
{
    let (mut sum_lat, mut sum_lng, mut count) = (0.0, 0.0, 0usize);
    for p in points {
        sum_lat += p.lat;
        sum_lng += p.lng;
        count += 1;
    }

    if count == 0 {
        return Coordinates::default();
    }

    Coordinates {
        lat: sum_lat / count as f64,
        lng: sum_lng / count as f64,
    }
}

/// Centroid of the points referenced by `members`.
pub fn centroid_of(members: &[usize], positions: &[Coordinates]) -> Coordinates {
    centroid(members.iter().map(|&i| positions[i]))
}

/// Largest distance from `center` to any referenced point (0 for none).
pub fn max_radius(members: &[usize], positions: &[Coordinates], center: &Coordinates) -> f64 {
    members
        .iter()
        .map(|&i| distance_km(&positions[i], center))
        .fold(0.0, f64::max)
}

/// Axis-aligned bounds in degrees (x = longitude, y = latitude).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox(Rect<f64>);

impl BoundingBox {
    /// Bounds of the referenced points; a zero box for an empty input.
    pub fn of(members: &[usize], positions: &[Coordinates]) -> Self {
        let points: MultiPoint<f64> = members
            .iter()
            .map(|&i| (positions[i].lng, positions[i].lat))
            .collect();

        let rect = points
            .bounding_rect()
            .unwrap_or_else(|| Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 0.0, y: 0.0 }));
        BoundingBox(rect)
    }

    pub fn lat_span(&self) -> f64 {
        self.0.height()
    }

    pub fn lng_span(&self) -> f64 {
        self.0.width()
    }

    pub fn area(&self) -> f64 {
        self.lat_span() * self.lng_span()
    }

    /// Intersection area divided by the smaller of the two areas.
    ///
    /// Degenerate (zero-width) intersections count as no overlap.
    pub fn overlap_ratio(&self, other: &BoundingBox) -> f64 {
        let (a_min, a_max) = (self.0.min(), self.0.max());
        let (b_min, b_max) = (other.0.min(), other.0.max());

        let overlap_lat = (a_max.y.min(b_max.y) - a_min.y.max(b_min.y)).max(0.0);
        let overlap_lng = (a_max.x.min(b_max.x) - a_min.x.max(b_min.x)).max(0.0);
        if overlap_lat == 0.0 || overlap_lng == 0.0 {
            return 0.0;
        }

        let min_area = self.area().min(other.area());
        (overlap_lat * overlap_lng) / min_area
    }
}

/// Members ordered along whichever axis their bounding box spans more widely.
///
/// Latitude wins only when strictly wider. The sort is stable.
pub fn sort_along_major_axis(members: &[usize], positions: &[Coordinates]) -> Vec<usize> {
    let bounds = BoundingBox::of(members, positions);
    let by_lat = bounds.lat_span() > bounds.lng_span();

    let mut sorted = members.to_vec();
    sorted.sort_by(|&a, &b| {
        let (ka, kb) = if by_lat {
            (positions[a].lat, positions[b].lat)
        } else {
            (positions[a].lng, positions[b].lng)
        };
        ka.total_cmp(&kb)
    });
    sorted
}

/// Cut members into at most `bands` contiguous bands along the major axis.
pub fn split_into_bands(
    members: &[usize],
    positions: &[Coordinates],
    bands: usize,
) -> Vec<Vec<usize>> {
    if members.is_empty() {
        return Vec::new();
    }
    if members.len() <= bands {
        return members.iter().map(|&i| vec![i]).collect();
    }

    let sorted = sort_along_major_axis(members, positions);
    let band_size = sorted.len().div_ceil(bands.max(1));
    sorted.chunks(band_size).map(|c| c.to_vec()).collect()
}

/// Single-linkage grouping with a fixed radius.
///
/// Each unvisited member seeds a group that absorbs, breadth-first, every
/// unvisited member within `radius_km` of any absorbed member. Groups come
/// out in discovery order; members keep their relative input order of
/// absorption.
pub fn group_by_radius(
    members: &[usize],
    positions: &[Coordinates],
    radius_km: f64,
) -> Vec<Vec<usize>> {
    let mut visited = vec![false; members.len()];
    let mut groups = Vec::new();

    for seed in 0..members.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;

        let mut group = vec![members[seed]];
        let mut queue = VecDeque::from([seed]);

        while let Some(current) = queue.pop_front() {
            let here = positions[members[current]];
            for other in 0..members.len() {
                if visited[other] {
                    continue;
                }
                if distance_km(&here, &positions[members[other]]) <= radius_km {
                    visited[other] = true;
                    group.push(members[other]);
                    queue.push_back(other);
                }
            }
        }

        groups.push(group);
    }

    groups
}

/// Closest target accepted by `accept`, as `(target index, distance)`.
///
/// Ties keep the earliest target. `accept` is only asked about targets that
/// would improve on the current best.
pub fn nearest_target<I, F>(from: &Coordinates, targets: I, mut accept: F) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = (usize, Coordinates)>,
    F: FnMut(usize, f64) -> bool,
{
    let mut best: Option<(usize, f64)> = None;

    for (idx, target) in targets {
        let dist = distance_km(from, &target);
        if best.is_some_and(|(_, best_dist)| dist >= best_dist) {
            continue;
        }
        if accept(idx, dist) {
            best = Some((idx, dist));
        }
    }

    best
}

/// Greedy tour starting from the point with the smallest `lat + lon`.
pub fn nearest_neighbor_tour(points: &[Coordinates]) -> Vec<usize> {
    if points.is_empty() {
        return Vec::new();
    }

    let mut pool: Vec<usize> = (0..points.len()).collect();
    pool.sort_by(|&a, &b| {
        (points[a].lat + points[a].lng).total_cmp(&(points[b].lat + points[b].lng))
    });
    let start = pool.remove(0);

    extend_greedily(points, vec![start], pool)
}

/// Greedy tour that starts at `start` and keeps the remaining input order for ties.
pub fn nearest_neighbor_tour_from(points: &[Coordinates], start: usize) -> Vec<usize> {
    if points.is_empty() {
        return Vec::new();
    }
    let pool: Vec<usize> = (0..points.len()).filter(|&i| i != start).collect();
    extend_greedily(points, vec![start], pool)
}

fn extend_greedily(points: &[Coordinates], mut tour: Vec<usize>, mut pool: Vec<usize>) -> Vec<usize> {
    while let Some(&last) = tour.last() {
        if pool.is_empty() {
            break;
        }
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (pos, &candidate) in pool.iter().enumerate() {
            let dist = distance_km(&points[last], &points[candidate]);
            if dist < best_dist {
                best_dist = dist;
                best = pos;
            }
        }
        tour.push(pool.remove(best));
    }
    tour
}

/// Open-path length of `tour` in kilometers.
pub fn tour_length(points: &[Coordinates], tour: &[usize]) -> f64 {
    tour.windows(2)
        .map(|w| distance_km(&points[w[0]], &points[w[1]]))
        .sum()
}

/// 2-opt local search on an open path with fixed endpoints.
///
/// Full passes repeat until no reversal shortens the path by more than
/// [`TWO_OPT_EPSILON_KM`]. The result is a local optimum.
pub fn two_opt_improve(points: &[Coordinates], mut tour: Vec<usize>) -> Vec<usize> {
    let n = tour.len();
    if n < 4 {
        return tour;
    }

    let dist = |a: usize, b: usize| distance_km(&points[a], &points[b]);
    let mut improved = true;

    while improved {
        improved = false;
        for i in 1..n - 2 {
            for k in i + 1..n - 1 {
                let current = dist(tour[i - 1], tour[i]) + dist(tour[k], tour[k + 1]);
                let swapped = dist(tour[i - 1], tour[k]) + dist(tour[i], tour[k + 1]);

                if swapped + TWO_OPT_EPSILON_KM < current {
                    tour[i..=k].reverse();
                    improved = true;
                }
            }
        }
    }

    tour
}
