use crate::error::{AppError, Result};
use crate::models::Coordinates;
use async_trait::async_trait;

/// Visiting order proposed by a route optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedSequence {
    /// Indices into the stop list that was sent
    pub order: Vec<usize>,
    /// Road geometry as `[lat, lon]` pairs, when the optimizer returns one
    pub geometry: Option<Vec<[f64; 2]>>,
}

/// External service that reorders stops; the first stop is the start.
#[async_trait]
pub trait RouteOptimizer: Send + Sync {
    async fn optimize_sequence(&self, stops: &[Coordinates]) -> Result<OptimizedSequence>;

    async fn health_check(&self) -> bool;
}

/// External service that draws a drivable path through stops in order.
#[async_trait]
pub trait PathRenderer: Send + Sync {
    async fn render_path(&self, stops: &[Coordinates]) -> Result<Vec<[f64; 2]>>;

    async fn health_check(&self) -> bool;
}

/// `[lat, lon]` polyline through the stops in order.
pub fn straight_line(stops: &[Coordinates]) -> Vec<[f64; 2]> {
    stops.iter().map(|s| s.to_lat_lon()).collect()
}

/// Check that `order` visits each of `len` stops exactly once.
pub fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &idx in order {
        if idx >= len || seen[idx] {
            return false;
        }
        seen[idx] = true;
    }
    true
}

/// Optimizer that always declines, leaving the local tour in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineOptimizer;

#[async_trait]
impl RouteOptimizer for OfflineOptimizer {
    async fn optimize_sequence(&self, _stops: &[Coordinates]) -> Result<OptimizedSequence> {
        Err(AppError::RouteOptimizer("offline mode".to_string()))
    }

    async fn health_check(&self) -> bool {
        false
    }
}

/// Renderer that connects stops with straight segments.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLineRenderer;

#[async_trait]
impl PathRenderer for StraightLineRenderer {
    async fn render_path(&self, stops: &[Coordinates]) -> Result<Vec<[f64; 2]>> {
        Ok(straight_line(stops))
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_permutation() {
        assert!(is_permutation(&[2, 0, 1], 3));
        assert!(is_permutation(&[], 0));
        assert!(!is_permutation(&[0, 1], 3));
        assert!(!is_permutation(&[0, 0, 1], 3));
        assert!(!is_permutation(&[0, 1, 3], 3));
    }

    #[tokio::test]
    async fn test_offline_collaborators() {
        let stops = vec![
            Coordinates::new(-23.5, -46.6).unwrap(),
            Coordinates::new(-23.6, -46.7).unwrap(),
        ];

        assert!(OfflineOptimizer.optimize_sequence(&stops).await.is_err());
        assert_eq!(
            StraightLineRenderer.render_path(&stops).await.unwrap(),
            vec![[-23.5, -46.6], [-23.6, -46.7]]
        );
    }
}
