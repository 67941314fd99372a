use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use moneta_core::tickers::{ResolvedTicker, TickerEntry};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Debug, Deserialize)]
struct ResolveRequest {
    names: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ResolveResponse {
    results: Vec<ResolvedTicker>,
}

/// Resolve a batch of names. Names that cannot be identified are omitted.
async fn resolve_tickers(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResolveRequest>,
) -> ApiResult<Json<ResolveResponse>> {
    let results = state.names.resolve_many(&request.names).await?;
    Ok(Json(ResolveResponse { results }))
}

async fn get_ticker(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<TickerEntry>> {
    state
        .directory
        .find_by_symbol(&symbol)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Ticker {} is not in the directory.", symbol)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tickers/resolve", post(resolve_tickers))
        .route("/tickers/{symbol}", get(get_ticker))
}
