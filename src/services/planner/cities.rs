use crate::config::PlannerConfig;
use crate::models::Coordinates;
use crate::services::planner::geometry::{centroid_of, group_by_radius};
use std::fmt;

/// Size of a city relative to the per-day target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    Large,
    Medium,
    Small,
}

impl SizeClass {
    pub fn tag(&self) -> &'static str {
        match self {
            SizeClass::Large => "GRANDE",
            SizeClass::Medium => "MEDIA",
            SizeClass::Small => "PEQUENA",
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A proximity-connected group of clients.
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub label: String,
    pub members: Vec<usize>,
    pub centroid: Coordinates,
    pub size_class: SizeClass,
}

/// Group every client into radius-linked cities, largest first.
///
/// Ties in size keep discovery order. Returns member lists only; labels and
/// classes are attached by [`classify_cities`].
pub fn detect_cities(positions: &[Coordinates], config: &PlannerConfig) -> Vec<Vec<usize>> {
    let everyone: Vec<usize> = (0..positions.len()).collect();
    let mut groups = group_by_radius(&everyone, positions, config.city_radius_km);
    groups.sort_by(|a, b| b.len().cmp(&a.len()));

    tracing::debug!(
        clients = positions.len(),
        cities = groups.len(),
        radius_km = config.city_radius_km,
        "Detected {} cities",
        groups.len()
    );
    groups
}

/// `CIDADE_A`, `CIDADE_B`, ..., `CIDADE_Z`, `CIDADE_AA`, ...
pub fn city_label(index: usize) -> String {
    let mut suffix = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        n -= 1;
        suffix.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    suffix.reverse();
    format!("CIDADE_{}", String::from_utf8_lossy(&suffix))
}

pub fn classify(size: usize, target_per_day: usize, config: &PlannerConfig) -> SizeClass {
    let size = size as f64;
    let target = target_per_day as f64;

    if size >= config.large_city_factor * target {
        SizeClass::Large
    } else if size >= config.medium_city_factor * target {
        SizeClass::Medium
    } else {
        SizeClass::Small
    }
}

/// Label, measure and classify detected cities, preserving their order.
pub fn classify_cities(
    groups: Vec<Vec<usize>>,
    positions: &[Coordinates],
    target_per_day: usize,
    config: &PlannerConfig,
) -> Vec<City> {
    groups
        .into_iter()
        .enumerate()
        .map(|(idx, members)| {
            let city = City {
                label: city_label(idx),
                centroid: centroid_of(&members, positions),
                size_class: classify(members.len(), target_per_day, config),
                members,
            };
            tracing::debug!(
                city = %city.label,
                class = %city.size_class,
                clients = city.members.len(),
                "City classified"
            );
            city
        })
        .collect()
}
