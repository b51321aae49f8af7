use crate::error::{AppError, Result};
use crate::models::invasion::{InvasionRequest, InvasionResponse};
use crate::services::invasions::{detect_invasions, invasion_stats};
use axum::Json;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// POST /atlas/analisarInvasoes
/// Flag clients that sit closer to another seller than to their own
pub async fn analyze_invasions(
    Json(request): Json<InvasionRequest>,
) -> Result<Json<InvasionResponse>> {
    let sellers = request.validate().map_err(AppError::InvalidRequest)?;

    for seller in &sellers {
        tracing::debug!(
            seller = %seller.code,
            clients = seller.clients.len(),
            lat = seller.centroid.lat,
            lng = seller.centroid.lng,
            "Seller territory"
        );
    }

    let invasions = detect_invasions(&sellers);
    let stats = invasion_stats(&sellers, &invasions);

    tracing::info!(
        sellers = stats.total_vendedores,
        clients = stats.total_clientes,
        invasions = stats.total_invasoes,
        "Territory audit: {} invasions",
        stats.total_invasoes
    );
    for invasion in invasions.iter().take(5) {
        tracing::debug!(
            client = %invasion.client_id,
            owner = %invasion.owner,
            invader = %invasion.invader,
            degree = invasion.degree,
            "Invasion"
        );
    }

    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| AppError::Internal(format!("Failed to format timestamp: {}", e)))?;

    Ok(Json(InvasionResponse {
        success: true,
        invasions,
        stats,
        timestamp,
    }))
}
