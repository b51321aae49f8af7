//! Territory audit: clients that sit closer to another seller than to their own.

use crate::models::{Invasion, InvasionStats, Seller, SellerInvasions};
use crate::services::planner::geometry::distance_km;

/// Every (client, other seller) pair where the other seller's centroid is
/// strictly closer than the owner's, most severe first.
///
/// The degree is `(owner - invader) / owner * 100`, clamped to `[0, 100]`.
/// Sellers are compared by code, so a seller never invades itself.
pub fn detect_invasions(sellers: &[Seller]) -> Vec<Invasion> {
    let mut invasions = Vec::new();

    for owner in sellers {
        for client in &owner.clients {
            let position = client.position();
            let to_owner = distance_km(&position, &owner.centroid);

            for invader in sellers.iter().filter(|s| s.code != owner.code) {
                let to_invader = distance_km(&position, &invader.centroid);
                if to_invader >= to_owner {
                    continue;
                }

                let degree = (to_owner - to_invader) / to_owner * 100.0;
                invasions.push(Invasion {
                    invader: invader.name.clone(),
                    owner: owner.name.clone(),
                    client_id: client.id.clone(),
                    client_name: client.name.clone(),
                    distance_to_invader_km: to_invader,
                    distance_to_owner_km: to_owner,
                    degree: degree.clamp(0.0, 100.0),
                });
            }
        }
    }

    invasions.sort_by(|a, b| b.degree.total_cmp(&a.degree));
    invasions
}

/// Per-seller and overall figures for an audit result.
pub fn invasion_stats(sellers: &[Seller], invasions: &[Invasion]) -> InvasionStats {
    let per_seller = sellers
        .iter()
        .map(|s| SellerInvasions {
            seller: s.name.clone(),
            invaded: invasions.iter().filter(|i| i.owner == s.name).count(),
            invading: invasions.iter().filter(|i| i.invader == s.name).count(),
        })
        .collect();

    let mean_degree = if invasions.is_empty() {
        0.0
    } else {
        invasions.iter().map(|i| i.degree).sum::<f64>() / invasions.len() as f64
    };

    InvasionStats {
        total_vendedores: sellers.len(),
        total_clientes: sellers.iter().map(|s| s.clients.len()).sum(),
        total_invasoes: invasions.len(),
        invasoes_por_vendedor: per_seller,
        grau_medio_invasao: mean_degree,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Client, Coordinates};

    fn seller(code: &str, centroid: (f64, f64), clients: Vec<Client>) -> Seller {
        Seller {
            code: code.to_string(),
            name: format!("Vendedor {}", code),
            clients,
            centroid: Coordinates {
                lat: centroid.0,
                lng: centroid.1,
            },
        }
    }

    #[test]
    fn test_client_closer_to_other_seller_is_flagged() {
        let sellers = vec![
            seller(
                "A",
                (0.0, 0.0),
                vec![
                    Client::new("a1", "Perto", 0.0, 0.1),
                    Client::new("a2", "Fronteira", 0.0, 0.8),
                ],
            ),
            seller("B", (0.0, 1.0), vec![Client::new("b1", "Casa", 0.0, 1.05)]),
        ];

        let invasions = detect_invasions(&sellers);

        assert_eq!(invasions.len(), 1);
        let hit = &invasions[0];
        assert_eq!(hit.client_id, "a2");
        assert_eq!(hit.owner, "Vendedor A");
        assert_eq!(hit.invader, "Vendedor B");
        assert!(hit.distance_to_invader_km < hit.distance_to_owner_km);
        // 0.2 vs 0.8 degrees along the equator
        assert!((hit.degree - 75.0).abs() < 0.1);
    }

    #[test]
    fn test_invasions_sorted_by_degree() {
        let sellers = vec![
            seller(
                "A",
                (0.0, 0.0),
                vec![
                    Client::new("a1", "Leve", 0.0, 0.6),
                    Client::new("a2", "Forte", 0.0, 0.95),
                ],
            ),
            seller("B", (0.0, 1.0), Vec::new()),
        ];

        let invasions = detect_invasions(&sellers);
        let ids: Vec<&str> = invasions.iter().map(|i| i.client_id.as_str()).collect();

        assert_eq!(ids, vec!["a2", "a1"]);
        assert!(invasions[0].degree > invasions[1].degree);
        assert!(invasions.iter().all(|i| (0.0..=100.0).contains(&i.degree)));
    }

    #[test]
    fn test_client_on_own_centroid_is_never_flagged() {
        let sellers = vec![
            seller("A", (0.0, 0.0), vec![Client::new("a1", "Centro", 0.0, 0.0)]),
            seller("B", (0.0, 0.0), Vec::new()),
        ];

        assert!(detect_invasions(&sellers).is_empty());
    }

    #[test]
    fn test_stats() {
        let sellers = vec![
            seller(
                "A",
                (0.0, 0.0),
                vec![
                    Client::new("a1", "Um", 0.0, 0.6),
                    Client::new("a2", "Dois", 0.0, 0.1),
                ],
            ),
            seller("B", (0.0, 1.0), vec![Client::new("b1", "Tres", 0.0, 0.2)]),
            seller("C", (5.0, 5.0), Vec::new()),
        ];

        let invasions = detect_invasions(&sellers);
        let stats = invasion_stats(&sellers, &invasions);

        assert_eq!(stats.total_vendedores, 3);
        assert_eq!(stats.total_clientes, 3);
        assert_eq!(stats.total_invasoes, 2);
        assert_eq!(stats.invasoes_por_vendedor[0].invaded, 1);
        assert_eq!(stats.invasoes_por_vendedor[0].invading, 1);
        assert_eq!(stats.invasoes_por_vendedor[1].invaded, 1);
        assert_eq!(stats.invasoes_por_vendedor[2].invading, 0);
        let mean = invasions.iter().map(|i| i.degree).sum::<f64>() / 2.0;
        assert!((stats.grau_medio_invasao - mean).abs() < 1e-12);
    }

    #[test]
    fn test_empty_audit_stats() {
        let stats = invasion_stats(&[], &[]);
        assert_eq!(stats.total_invasoes, 0);
        assert_eq!(stats.grau_medio_invasao, 0.0);
    }
}
