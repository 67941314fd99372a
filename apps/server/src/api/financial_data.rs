use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use moneta_core::financial_data::FinancialData;
use serde::Deserialize;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Debug, Deserialize)]
struct FinancialDataQuery {
    q: Option<String>,
}

async fn get_financial_data(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FinancialDataQuery>,
) -> ApiResult<Json<FinancialData>> {
    let q = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Provide a q query parameter.".to_string()))?;
    let data = state.financial_data_service.get(q).await?;
    Ok(Json(data))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/financial-data", get(get_financial_data))
}
