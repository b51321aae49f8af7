use crate::config::PlannerConfig;
use crate::services::planner::geometry::distance_km;
use crate::services::planner::sectors::Sector;

/// Why a pair of sectors from different cities was flagged.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlapFlag {
    BoundsOverlap { ratio: f64 },
    CentroidsClose { distance_km: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedPair {
    pub first: String,
    pub second: String,
    pub flag: OverlapFlag,
}

/// Check every cross-city sector pair for overlap and proximity.
///
/// Diagnostic only: flags are logged and returned, sectors are untouched.
pub fn audit_overlaps(sectors: &[Sector], config: &PlannerConfig, stage: &str) -> Vec<FlaggedPair> {
    let mut flagged = Vec::new();

    for (i, a) in sectors.iter().enumerate() {
        for b in &sectors[i + 1..] {
            if a.city == b.city {
                continue;
            }

            let ratio = a.bounds().overlap_ratio(b.bounds());
            if ratio > config.overlap_threshold {
                tracing::warn!(stage, first = %a.id, second = %b.id, ratio, "Sector bounds overlap");
                flagged.push(FlaggedPair {
                    first: a.id.clone(),
                    second: b.id.clone(),
                    flag: OverlapFlag::BoundsOverlap { ratio },
                });
            }

            let distance = distance_km(&a.centroid(), &b.centroid());
            if distance < config.min_centroid_distance_km {
                tracing::warn!(stage, first = %a.id, second = %b.id, distance_km = distance, "Sector centroids too close");
                flagged.push(FlaggedPair {
                    first: a.id.clone(),
                    second: b.id.clone(),
                    flag: OverlapFlag::CentroidsClose { distance_km: distance },
                });
            }
        }
    }

    if flagged.is_empty() {
        tracing::debug!(stage, sectors = sectors.len(), "No sector overlap detected");
    } else {
        tracing::info!(stage, problems = flagged.len(), "Sector overlap audit found problems");
    }
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;

    fn pt(lat: f64, lng: f64) -> Coordinates {
        Coordinates { lat, lng }
    }

    #[test]
    fn test_flags_cross_city_overlap_only() {
        let positions = vec![
            pt(0.0, 0.0),
            pt(0.1, 0.1),
            pt(0.05, 0.05),
            pt(0.15, 0.15),
        ];
        let sectors = vec![
            Sector::new("A1", "CIDADE_A", None, vec![0, 1], &positions),
            Sector::new("A2", "CIDADE_A", None, vec![2, 3], &positions),
            Sector::new("B1", "CIDADE_B", None, vec![2, 3], &positions),
        ];

        let flagged = audit_overlaps(&sectors, &PlannerConfig::default(), "test");

        // A1/B1 overlap by a quarter; A2/B1 are identical boxes
        assert!(flagged.iter().all(|f| f.second == "B1"));
        assert!(flagged.iter().any(|f| f.first == "A1"
            && matches!(f.flag, OverlapFlag::BoundsOverlap { ratio } if (ratio - 0.25).abs() < 1e-9)));
        assert!(flagged.iter().any(|f| f.first == "A2"
            && matches!(f.flag, OverlapFlag::CentroidsClose { distance_km } if distance_km == 0.0)));
    }

    #[test]
    fn test_distant_sectors_are_clean() {
        let positions = vec![pt(0.0, 0.0), pt(0.01, 0.01), pt(1.0, 1.0), pt(1.01, 1.01)];
        let sectors = vec![
            Sector::new("A", "CIDADE_A", None, vec![0, 1], &positions),
            Sector::new("B", "CIDADE_B", None, vec![2, 3], &positions),
        ];
        assert!(audit_overlaps(&sectors, &PlannerConfig::default(), "test").is_empty());
    }
}
