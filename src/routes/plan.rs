use crate::error::{AppError, Result};
use crate::models::route::{PlanRequest, PlanResponse, ResponseMeta};
use crate::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// POST /atlas/gerarRoteiro
/// Split the submitted clients into daily routes
pub async fn generate_routes(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<PlanResponse>> {
    let max_per_day = request.max_por_dia.clone();
    let min_per_day = request.min_por_dia.clone();
    let input = request.validate().map_err(AppError::InvalidRequest)?;

    tracing::info!(
        clients = input.clients.len(),
        requested_days = ?input.requested_days,
        has_start = input.start.is_some(),
        "Route plan request: {} clients",
        input.clients.len()
    );
    if max_per_day.is_some() || min_per_day.is_some() {
        tracing::debug!(
            max_per_day = ?max_per_day,
            min_per_day = ?min_per_day,
            "Per-day limits received but not applied"
        );
    }

    let plan = state
        .planner
        .plan(&input.clients, input.requested_days, input.start)
        .await?;

    let total_clients = plan.client_count();
    let total_days = plan.days.len();
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| AppError::Internal(format!("Failed to format timestamp: {}", e)))?;

    tracing::info!(
        clients = total_clients,
        days = total_days,
        clamped = plan.summary.clamped,
        "Route plan ready"
    );

    Ok(Json(PlanResponse {
        success: true,
        meta: ResponseMeta {
            total_clientes: total_clients,
            total_dias: total_days,
            media_clientes_dia: mean_per_day(total_clients, total_days),
            ponto_partida: input.start,
            timestamp,
        },
        data: plan,
    }))
}

fn mean_per_day(total_clients: usize, total_days: usize) -> usize {
    if total_days == 0 {
        return 0;
    }
    (total_clients as f64 / total_days as f64).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_per_day_rounds() {
        assert_eq!(mean_per_day(7, 2), 4);
        assert_eq!(mean_per_day(10, 4), 3);
        assert_eq!(mean_per_day(9, 4), 2);
        assert_eq!(mean_per_day(6, 3), 2);
        assert_eq!(mean_per_day(0, 0), 0);
    }
}
