use crate::models::{enumerate, Client, Coordinates, RouteDay};
use crate::services::collaborators::{is_permutation, straight_line, PathRenderer, RouteOptimizer};
use crate::services::planner::geometry::{
    distance_km, nearest_neighbor_tour, nearest_neighbor_tour_from, tour_length, two_opt_improve,
};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Orders the clients of a day and attaches route geometry.
///
/// The local tour (nearest neighbor then 2-opt) is always computed first.
/// The optimizer may replace it; when it fails, times out or returns an
/// order that drops or repeats stops, the local tour is kept and the
/// renderer draws it. A straight line is the last resort.
#[derive(Clone)]
pub struct RouteSequencer {
    optimizer: Arc<dyn RouteOptimizer>,
    renderer: Arc<dyn PathRenderer>,
    optimizer_timeout: Duration,
    renderer_timeout: Duration,
}

impl RouteSequencer {
    pub fn new(
        optimizer: Arc<dyn RouteOptimizer>,
        renderer: Arc<dyn PathRenderer>,
        optimizer_timeout: Duration,
        renderer_timeout: Duration,
    ) -> Self {
        RouteSequencer {
            optimizer,
            renderer,
            optimizer_timeout,
            renderer_timeout,
        }
    }

    /// Sequence every day concurrently; output keeps day order.
    pub async fn sequence_days(&self, days: Vec<Vec<Client>>, start: Option<Coordinates>) -> Vec<RouteDay> {
        let futures = days.into_iter().enumerate().map(|(idx, clients)| async move {
            let (ordered, geometry) = self.sequence_day(idx, clients, start).await;
            RouteDay {
                label: RouteDay::label_for(idx),
                clients: enumerate(ordered),
                geometry,
            }
        });

        join_all(futures).await
    }

    /// Ordered clients and `[lat, lon]` geometry for one day.
    pub async fn sequence_day(
        &self,
        day: usize,
        clients: Vec<Client>,
        start: Option<Coordinates>,
    ) -> (Vec<Client>, Vec<[f64; 2]>) {
        if clients.len() <= 1 {
            let geometry = clients.iter().map(|c| c.position().to_lat_lon()).collect();
            return (clients, geometry);
        }

        let positions: Vec<Coordinates> = clients.iter().map(|c| c.position()).collect();
        let tour = two_opt_improve(&positions, local_tour(&positions, start));
        let stops: Vec<Coordinates> = tour.iter().map(|&i| positions[i]).collect();
        tracing::debug!(
            day = day + 1,
            stops = stops.len(),
            tour_km = tour_length(&positions, &tour),
            "Local tour built"
        );

        let (order, geometry) = match self.optimize(day, &stops).await {
            Some((order, Some(geometry))) => (order, geometry),
            Some((order, None)) => {
                let ordered_stops: Vec<Coordinates> = order.iter().map(|&i| stops[i]).collect();
                let geometry = self.render(day, &ordered_stops).await;
                (order, geometry)
            }
            None => {
                let geometry = self.render(day, &stops).await;
                ((0..stops.len()).collect(), geometry)
            }
        };

        let mut slots: Vec<Option<Client>> = clients.into_iter().map(Some).collect();
        let ordered = order
            .iter()
            .filter_map(|&i| slots[tour[i]].take())
            .collect();

        (ordered, geometry)
    }

    /// Optimizer order (indices into `stops`) plus optional geometry, or `None` on any failure.
    async fn optimize(&self, day: usize, stops: &[Coordinates]) -> Option<(Vec<usize>, Option<Vec<[f64; 2]>>)> {
        match timeout(self.optimizer_timeout, self.optimizer.optimize_sequence(stops)).await {
            Ok(Ok(sequence)) if is_permutation(&sequence.order, stops.len()) => {
                tracing::debug!(day = day + 1, stops = stops.len(), "Route optimizer accepted");
                let geometry = sequence.geometry.filter(|g| !g.is_empty());
                Some((sequence.order, geometry))
            }
            Ok(Ok(sequence)) => {
                tracing::warn!(
                    day = day + 1,
                    stops = stops.len(),
                    returned = sequence.order.len(),
                    "Route optimizer returned an incomplete order, keeping local tour"
                );
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(day = day + 1, "Route optimizer failed: {}", e);
                None
            }
            Err(_) => {
                tracing::warn!(
                    day = day + 1,
                    timeout_ms = self.optimizer_timeout.as_millis() as u64,
                    "Route optimizer timed out"
                );
                None
            }
        }
    }

    async fn render(&self, day: usize, stops: &[Coordinates]) -> Vec<[f64; 2]> {
        match timeout(self.renderer_timeout, self.renderer.render_path(stops)).await {
            Ok(Ok(geometry)) if !geometry.is_empty() => geometry,
            Ok(Ok(_)) => {
                tracing::warn!(day = day + 1, "Path renderer returned no geometry, using straight line");
                straight_line(stops)
            }
            Ok(Err(e)) => {
                tracing::warn!(day = day + 1, "Path renderer failed, using straight line: {}", e);
                straight_line(stops)
            }
            Err(_) => {
                tracing::warn!(day = day + 1, "Path renderer timed out, using straight line");
                straight_line(stops)
            }
        }
    }
}

/// Nearest-neighbor tour, starting at the client closest to `start` when given.
fn local_tour(positions: &[Coordinates], start: Option<Coordinates>) -> Vec<usize> {
    let Some(start) = start else {
        return nearest_neighbor_tour(positions);
    };

    let mut first = 0;
    let mut best = f64::INFINITY;
    for (idx, p) in positions.iter().enumerate() {
        let d = distance_km(&start, p);
        if d < best {
            best = d;
            first = idx;
        }
    }
    nearest_neighbor_tour_from(positions, first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Result};
    use crate::services::collaborators::{OfflineOptimizer, OptimizedSequence, StraightLineRenderer};
    use async_trait::async_trait;

    struct ReversingOptimizer {
        geometry: Option<Vec<[f64; 2]>>,
    }

    #[async_trait]
    impl RouteOptimizer for ReversingOptimizer {
        async fn optimize_sequence(&self, stops: &[Coordinates]) -> Result<OptimizedSequence> {
            Ok(OptimizedSequence {
                order: (0..stops.len()).rev().collect(),
                geometry: self.geometry.clone(),
            })
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    struct DroppingOptimizer;

    #[async_trait]
    impl RouteOptimizer for DroppingOptimizer {
        async fn optimize_sequence(&self, _stops: &[Coordinates]) -> Result<OptimizedSequence> {
            Ok(OptimizedSequence {
                order: vec![0],
                geometry: None,
            })
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    struct SlowOptimizer;

    #[async_trait]
    impl RouteOptimizer for SlowOptimizer {
        async fn optimize_sequence(&self, stops: &[Coordinates]) -> Result<OptimizedSequence> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(OptimizedSequence {
                order: (0..stops.len()).collect(),
                geometry: None,
            })
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    struct FailingRenderer;

    #[async_trait]
    impl PathRenderer for FailingRenderer {
        async fn render_path(&self, _stops: &[Coordinates]) -> Result<Vec<[f64; 2]>> {
            Err(AppError::PathRenderer("unreachable".to_string()))
        }

        async fn health_check(&self) -> bool {
            false
        }
    }

    fn sequencer(optimizer: Arc<dyn RouteOptimizer>, renderer: Arc<dyn PathRenderer>) -> RouteSequencer {
        RouteSequencer::new(
            optimizer,
            renderer,
            Duration::from_millis(50),
            Duration::from_millis(50),
        )
    }

    fn line_clients() -> Vec<Client> {
        // Deliberately shuffled along a west-east line
        vec![
            Client::new("c", "C", -23.5, -46.58),
            Client::new("a", "A", -23.5, -46.60),
            Client::new("d", "D", -23.5, -46.57),
            Client::new("b", "B", -23.5, -46.59),
        ]
    }

    fn ids(clients: &[Client]) -> Vec<&str> {
        clients.iter().map(|c| c.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_single_client_is_identity() {
        let s = sequencer(Arc::new(OfflineOptimizer), Arc::new(FailingRenderer));
        let (ordered, geometry) = s
            .sequence_day(0, vec![Client::new("x", "X", -23.5, -46.6)], None)
            .await;

        assert_eq!(ids(&ordered), vec!["x"]);
        assert_eq!(geometry, vec![[-23.5, -46.6]]);
    }

    #[tokio::test]
    async fn test_local_tour_with_straight_line_fallback() {
        let s = sequencer(Arc::new(OfflineOptimizer), Arc::new(FailingRenderer));
        let (ordered, geometry) = s.sequence_day(0, line_clients(), None).await;

        assert_eq!(ids(&ordered), vec!["a", "b", "c", "d"]);
        assert_eq!(geometry.len(), 4);
        assert_eq!(geometry[0], [-23.5, -46.60]);
    }

    #[tokio::test]
    async fn test_start_point_picks_first_client() {
        let s = sequencer(Arc::new(OfflineOptimizer), Arc::new(StraightLineRenderer));
        let start = Coordinates::new(-23.5, -46.50).unwrap();
        let (ordered, _) = s.sequence_day(0, line_clients(), Some(start)).await;

        assert_eq!(ids(&ordered), vec!["d", "c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_optimizer_order_and_geometry_are_used() {
        let road = vec![[0.0, 0.0], [1.0, 1.0]];
        let s = sequencer(
            Arc::new(ReversingOptimizer {
                geometry: Some(road.clone()),
            }),
            Arc::new(FailingRenderer),
        );
        let (ordered, geometry) = s.sequence_day(0, line_clients(), None).await;

        assert_eq!(ids(&ordered), vec!["d", "c", "b", "a"]);
        assert_eq!(geometry, road);
    }

    #[tokio::test]
    async fn test_optimizer_without_geometry_uses_renderer() {
        let s = sequencer(
            Arc::new(ReversingOptimizer { geometry: None }),
            Arc::new(StraightLineRenderer),
        );
        let (ordered, geometry) = s.sequence_day(0, line_clients(), None).await;

        assert_eq!(ids(&ordered), vec!["d", "c", "b", "a"]);
        assert_eq!(geometry[0], [-23.5, -46.57]);
    }

    #[tokio::test]
    async fn test_incomplete_optimizer_order_is_rejected() {
        let s = sequencer(Arc::new(DroppingOptimizer), Arc::new(StraightLineRenderer));
        let (ordered, _) = s.sequence_day(0, line_clients(), None).await;

        assert_eq!(ordered.len(), 4);
        assert_eq!(ids(&ordered), vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_optimizer_timeout_falls_back() {
        let s = sequencer(Arc::new(SlowOptimizer), Arc::new(StraightLineRenderer));
        let (ordered, geometry) = s.sequence_day(0, line_clients(), None).await;

        assert_eq!(ids(&ordered), vec!["a", "b", "c", "d"]);
        assert_eq!(geometry.len(), 4);
    }

    #[tokio::test]
    async fn test_sequence_days_keeps_day_order() {
        let s = sequencer(Arc::new(OfflineOptimizer), Arc::new(StraightLineRenderer));
        let days = s
            .sequence_days(
                vec![line_clients(), Vec::new(), vec![Client::new("z", "Z", -22.0, -47.0)]],
                None,
            )
            .await;

        assert_eq!(days.len(), 3);
        assert_eq!(days[0].label, "Dia 1");
        assert_eq!(days[0].clients[0].order, 1);
        assert!(days[1].clients.is_empty());
        assert!(days[1].geometry.is_empty());
        assert_eq!(days[2].clients[0].client.id, "z");
    }
}
