//! Bin-packing of sectors into day buckets.

use crate::config::PlannerConfig;
use crate::models::Coordinates;
use crate::services::planner::geometry::{centroid_of, nearest_target};
use crate::services::planner::sectors::Sector;

/// Sectors assigned to one day during allocation.
#[derive(Debug, Default)]
struct DayBucket {
    sectors: Vec<Sector>,
    load: usize,
    /// `None` while the day is empty
    centroid: Option<Coordinates>,
}

impl DayBucket {
    fn hosts_city(&self, city: &str) -> bool {
        self.sectors.iter().any(|s| s.city == city)
    }

    fn members(&self) -> Vec<usize> {
        self.sectors.iter().flat_map(|s| s.members().iter().copied()).collect()
    }

    fn push(&mut self, sector: Sector, positions: &[Coordinates]) {
        self.load += sector.len();
        self.sectors.push(sector);
        self.refresh(positions);
    }

    /// Remove the first of the smallest sectors.
    fn take_smallest(&mut self, positions: &[Coordinates]) -> Option<Sector> {
        let idx = self
            .sectors
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| s.len())
            .map(|(idx, _)| idx)?;

        let sector = self.sectors.remove(idx);
        self.load -= sector.len();
        self.refresh(positions);
        Some(sector)
    }

    fn smallest_len(&self) -> Option<usize> {
        self.sectors.iter().map(|s| s.len()).min()
    }

    fn refresh(&mut self, positions: &[Coordinates]) {
        self.centroid = if self.sectors.is_empty() {
            None
        } else {
            Some(centroid_of(&self.members(), positions))
        };
    }
}

/// Index of the first day with the smallest load.
fn least_loaded(days: &[DayBucket]) -> usize {
    days.iter()
        .enumerate()
        .min_by_key(|(_, d)| d.load)
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

/// Index of the first day with the largest load among those accepted by `eligible`.
fn most_loaded(days: &[DayBucket], eligible: impl Fn(&DayBucket) -> bool) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, day) in days.iter().enumerate() {
        if !eligible(day) {
            continue;
        }
        if best.map_or(true, |b| day.load > days[b].load) {
            best = Some(idx);
        }
    }
    best
}

/// Distribute sectors over `day_count` days and flatten each day to client indices.
///
/// Cities are placed largest first and, within a city, sectors largest first.
/// A sector goes to the nearest day already hosting its city when that day is
/// close enough and stays under the same-city load cap; otherwise to the
/// nearest non-empty day under the relaxed cap when it is close; otherwise to
/// the least-loaded day. A bounded rebalancing loop and an empty-day rescue
/// follow.
pub fn allocate_sectors(
    sectors: Vec<Sector>,
    day_count: usize,
    target_per_day: usize,
    positions: &[Coordinates],
    config: &PlannerConfig,
) -> Vec<Vec<usize>> {
    let mut days: Vec<DayBucket> = (0..day_count.max(1)).map(|_| DayBucket::default()).collect();
    let target = target_per_day as f64;

    for city_sectors in sectors_by_city(sectors) {
        for sector in city_sectors {
            let chosen = choose_day(&days, &sector, target, config);
            tracing::debug!(
                sector = %sector.id,
                clients = sector.len(),
                day = chosen + 1,
                "Sector placed"
            );
            days[chosen].push(sector, positions);
        }
    }

    rebalance(&mut days, target, positions, config);
    rescue_empty_days(&mut days, positions);

    for (idx, day) in days.iter().enumerate() {
        tracing::info!(
            day = idx + 1,
            clients = day.load,
            sectors = day.sectors.len(),
            "Day allocated"
        );
    }

    days.iter().map(|d| d.members()).collect()
}

/// Group sectors per city, largest city first, each city's sectors largest first.
fn sectors_by_city(sectors: Vec<Sector>) -> Vec<Vec<Sector>> {
    let mut cities: Vec<Vec<Sector>> = Vec::new();
    for sector in sectors {
        match cities.iter_mut().find(|c| c[0].city == sector.city) {
            Some(city) => city.push(sector),
            None => cities.push(vec![sector]),
        }
    }

    cities.sort_by_key(|c| std::cmp::Reverse(c.iter().map(|s| s.len()).sum::<usize>()));
    for city in &mut cities {
        city.sort_by_key(|s| std::cmp::Reverse(s.len()));
    }
    cities
}

fn choose_day(days: &[DayBucket], sector: &Sector, target: f64, config: &PlannerConfig) -> usize {
    let centroid = sector.centroid();
    let size = sector.len();

    let same_city = nearest_target(
        &centroid,
        days.iter().enumerate().filter_map(|(idx, day)| {
            let fits = (day.load + size) as f64 <= config.same_city_load_factor * target;
            (day.hosts_city(&sector.city) && fits)
                .then_some(day.centroid.map(|c| (idx, c)))
                .flatten()
        }),
        |_, dist| dist <= config.same_city_max_distance_km,
    );
    if let Some((idx, _)) = same_city {
        return idx;
    }

    let nearest = nearest_target(
        &centroid,
        days.iter()
            .enumerate()
            .filter_map(|(idx, day)| day.centroid.map(|c| (idx, c))),
        |idx, _| (days[idx].load + size) as f64 <= config.relaxed_load_factor * target,
    );
    match nearest {
        Some((idx, dist)) if dist < config.nearest_day_max_distance_km => idx,
        _ => least_loaded(days),
    }
}

fn rebalance(days: &mut [DayBucket], target: f64, positions: &[Coordinates], config: &PlannerConfig) {
    let tolerance = config.balance_tolerance * target;

    for iteration in 0..config.max_balance_iterations {
        let Some(max_idx) = most_loaded(days, |_| true) else {
            return;
        };
        let min_idx = least_loaded(days);
        let gap = days[max_idx].load - days[min_idx].load;

        if gap as f64 <= tolerance || days[max_idx].sectors.len() <= 1 {
            return;
        }
        let Some(moved) = days[max_idx].smallest_len() else {
            return;
        };

        let new_max = days[max_idx].load - moved;
        let new_min = days[min_idx].load + moved;
        if new_max.abs_diff(new_min) >= gap {
            return;
        }

        if let Some(sector) = days[max_idx].take_smallest(positions) {
            tracing::debug!(
                iteration,
                sector = %sector.id,
                from = max_idx + 1,
                to = min_idx + 1,
                "Rebalancing sector"
            );
            days[min_idx].push(sector, positions);
        }
    }
}

fn rescue_empty_days(days: &mut [DayBucket], positions: &[Coordinates]) {
    for empty in 0..days.len() {
        if days[empty].load > 0 {
            continue;
        }

        let Some(donor) = most_loaded(days, |d| d.load > 0 && d.sectors.len() > 1) else {
            tracing::warn!(day = empty + 1, "Day left empty, no day can spare a sector");
            continue;
        };

        if let Some(sector) = days[donor].take_smallest(positions) {
            tracing::info!(
                day = empty + 1,
                donor = donor + 1,
                sector = %sector.id,
                "Filling empty day"
            );
            days[empty].push(sector, positions);
        }
    }
}
