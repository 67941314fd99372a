use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use moneta_core::quotes::QuoteLookup;
use serde::Deserialize;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Debug, Deserialize)]
struct QuoteQuery {
    symbol: Option<String>,
    isin: Option<String>,
    mode: Option<String>,
}

/// What the caller asked for.
#[derive(Debug, PartialEq, Eq)]
enum QuoteInput<'a> {
    /// A ticker, quoted as given after upper-casing.
    Symbol(&'a str),
    /// Goes through ticker resolution first.
    Isin(&'a str),
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl QuoteQuery {
    /// The symbol wins when both parameters are present.
    fn input(&self) -> ApiResult<QuoteInput<'_>> {
        if let Some(mode) = self.mode.as_deref() {
            if mode != "quote" {
                return Err(ApiError::BadRequest(format!(
                    "Unsupported mode '{}'. Use mode=quote.",
                    mode
                )));
            }
        }
        if let Some(symbol) = non_blank(self.symbol.as_deref()) {
            return Ok(QuoteInput::Symbol(symbol));
        }
        non_blank(self.isin.as_deref())
            .map(QuoteInput::Isin)
            .ok_or_else(|| {
                ApiError::BadRequest("Provide a symbol or isin query parameter.".to_string())
            })
    }
}

async fn get_quote(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QuoteQuery>,
) -> ApiResult<Json<QuoteLookup>> {
    let lookup = match query.input()? {
        QuoteInput::Symbol(symbol) => state.quote_service.get_quote_for_symbol(symbol).await?,
        QuoteInput::Isin(isin) => state.quote_service.get_quote(isin).await?,
    };
    Ok(Json(lookup))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/quote", get(get_quote))
}
