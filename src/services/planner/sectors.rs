use crate::config::PlannerConfig;
use crate::models::Coordinates;
use crate::services::planner::cities::{City, SizeClass};
use crate::services::planner::geometry::{
    centroid_of, distance_km, split_into_bands, BoundingBox,
};
use std::fmt;

/// Position of a sector relative to its city's centroid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    Center,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Quadrant {
    /// Processing order of the quadrant groups.
    pub const ALL: [Quadrant; 5] = [
        Quadrant::Center,
        Quadrant::NorthEast,
        Quadrant::NorthWest,
        Quadrant::SouthEast,
        Quadrant::SouthWest,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Quadrant::Center => "CENTRO",
            Quadrant::NorthEast => "NE",
            Quadrant::NorthWest => "NO",
            Quadrant::SouthEast => "SE",
            Quadrant::SouthWest => "SO",
        }
    }

    /// Quadrant of `point` around `center`; ties fall to the south / west side.
    pub fn of(point: &Coordinates, center: &Coordinates) -> Self {
        let north = point.lat > center.lat;
        let east = point.lng > center.lng;
        match (north, east) {
            (true, true) => Quadrant::NorthEast,
            (true, false) => Quadrant::NorthWest,
            (false, true) => Quadrant::SouthEast,
            (false, false) => Quadrant::SouthWest,
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A compact subset of one city's clients.
///
/// Membership only changes through [`Sector::absorb`], which recomputes the
/// centroid and bounds, so both always describe the current members.
#[derive(Debug, Clone, PartialEq)]
pub struct Sector {
    pub id: String,
    pub city: String,
    pub quadrant: Option<Quadrant>,
    members: Vec<usize>,
    centroid: Coordinates,
    bounds: BoundingBox,
}

impl Sector {
    pub fn new(
        id: impl Into<String>,
        city: impl Into<String>,
        quadrant: Option<Quadrant>,
        members: Vec<usize>,
        positions: &[Coordinates],
    ) -> Self {
        Sector {
            id: id.into(),
            city: city.into(),
            quadrant,
            centroid: centroid_of(&members, positions),
            bounds: BoundingBox::of(&members, positions),
            members,
        }
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn centroid(&self) -> Coordinates {
        self.centroid
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Move `other`'s members into this sector.
    pub fn absorb(&mut self, other: Sector, positions: &[Coordinates]) {
        self.members.extend(other.members);
        self.centroid = centroid_of(&self.members, positions);
        self.bounds = BoundingBox::of(&self.members, positions);
    }

    pub fn into_members(self) -> Vec<usize> {
        self.members
    }
}

/// Turn classified cities into sectors near the per-day target size.
///
/// Small cities, and medium ones no larger than `ceil(sector_max_factor *
/// target)`, stay whole. Everything else is cut into a center disc and
/// four quadrants, each further banded when still too large.
pub fn build_sectors(
    cities: &[City],
    positions: &[Coordinates],
    target_per_day: usize,
    config: &PlannerConfig,
) -> Vec<Sector> {
    let max_sector = max_sector_size(target_per_day, config);
    let mut sectors = Vec::new();

    for city in cities {
        let keep_whole = match city.size_class {
            SizeClass::Small => true,
            SizeClass::Medium => city.members.len() <= max_sector,
            SizeClass::Large => false,
        };

        if keep_whole {
            sectors.push(Sector::new(
                format!("{}_INTEIRA", city.label),
                city.label.clone(),
                None,
                city.members.clone(),
                positions,
            ));
            continue;
        }

        let parts = decompose_city(city, positions, target_per_day, config);
        tracing::debug!(
            city = %city.label,
            clients = city.members.len(),
            sectors = parts.len(),
            "Split {} city into {} sectors",
            city.size_class,
            parts.len()
        );
        sectors.extend(parts);
    }

    tracing::info!(
        cities = cities.len(),
        sectors = sectors.len(),
        target_per_day,
        "Built {} sectors",
        sectors.len()
    );
    sectors
}

pub(crate) fn max_sector_size(target_per_day: usize, config: &PlannerConfig) -> usize {
    (config.sector_max_factor * target_per_day as f64).ceil() as usize
}

fn decompose_city(
    city: &City,
    positions: &[Coordinates],
    target_per_day: usize,
    config: &PlannerConfig,
) -> Vec<Sector> {
    let center = city.centroid;
    let mean_radius = city
        .members
        .iter()
        .map(|&i| distance_km(&positions[i], &center))
        .sum::<f64>()
        / city.members.len().max(1) as f64;
    let center_radius = config.center_radius_factor * mean_radius;

    let mut groups: [Vec<usize>; 5] = Default::default();
    for &member in &city.members {
        let point = &positions[member];
        let quadrant = if distance_km(point, &center) <= center_radius {
            Quadrant::Center
        } else {
            Quadrant::of(point, &center)
        };
        groups[quadrant_slot(quadrant)].push(member);
    }

    let max_sector = max_sector_size(target_per_day, config);
    let mut sectors = Vec::new();

    for (quadrant, members) in Quadrant::ALL.into_iter().zip(groups) {
        if members.is_empty() {
            continue;
        }

        let base_id = format!("{}_{}", city.label, quadrant.tag());
        if members.len() <= max_sector {
            sectors.push(Sector::new(base_id, &city.label, Some(quadrant), members, positions));
            continue;
        }

        let band_count = members.len().div_ceil(target_per_day.max(1));
        for (idx, band) in split_into_bands(&members, positions, band_count)
            .into_iter()
            .enumerate()
        {
            sectors.push(Sector::new(
                format!("{}{}", base_id, idx + 1),
                &city.label,
                Some(quadrant),
                band,
                positions,
            ));
        }
    }

    sectors
}

fn quadrant_slot(quadrant: Quadrant) -> usize {
    match quadrant {
        Quadrant::Center => 0,
        Quadrant::NorthEast => 1,
        Quadrant::NorthWest => 2,
        Quadrant::SouthEast => 3,
        Quadrant::SouthWest => 4,
    }
}
