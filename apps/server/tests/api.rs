use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use moneta_core::{tickers::ReasoningClient, ResolveError};
use moneta_market_data::{
    AlphaVantageProvider, MarketDataError, NormalizedQuote, QuoteProvider, RateLimit,
};
use moneta_server::{api::app_router, build_state_with, config::Config};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const JWT_SECRET: &str = "0123456789abcdef0123456789abcdef";

/// Provider that serves canned GLOBAL_QUOTE bodies.
struct StubProvider {
    prices: Mutex<HashMap<String, String>>,
    calls: AtomicUsize,
    parser: AlphaVantageProvider,
}

impl StubProvider {
    fn new() -> Self {
        Self {
            prices: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            parser: AlphaVantageProvider::new("test-key".to_string()),
        }
    }

    fn with_price(self, symbol: &str, price: &str) -> Self {
        self.prices
            .lock()
            .unwrap()
            .insert(symbol.to_string(), price.to_string());
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for StubProvider {
    fn id(&self) -> &'static str {
        "STUB"
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 5,
            requests_per_day: 25,
        }
    }

    async fn fetch_raw(&self, symbol: &str) -> Result<String, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let body = match self.prices.lock().unwrap().get(symbol) {
            Some(price) => json!({
                "Global Quote": {
                    "01. symbol": symbol,
                    "05. price": price,
                    "06. volume": "1000",
                    "09. change": "0.50",
                    "10. change percent": "0.25%"
                }
            }),
            None => json!({ "Global Quote": {} }),
        };
        Ok(body.to_string())
    }

    fn normalize(&self, symbol: &str, raw: &str) -> Result<NormalizedQuote, MarketDataError> {
        self.parser.normalize(symbol, raw)
    }
}

/// Reasoning client answering by substring match on the prompt.
#[derive(Default)]
struct ScriptedReasoner {
    answers: Vec<(&'static str, &'static str)>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedReasoner {
    fn answer(mut self, needle: &'static str, json: &'static str) -> Self {
        self.answers.push((needle, json));
        self
    }
}

#[async_trait]
impl ReasoningClient for ScriptedReasoner {
    async fn complete_json(
        &self,
        prompt: &str,
        _max_output_tokens: u32,
    ) -> Result<String, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .answers
            .iter()
            .find(|(needle, _)| prompt.contains(needle))
            .map(|(_, json)| json.to_string())
            .unwrap_or_else(|| r#"{"symbol": "UNKNOWN"}"#.to_string()))
    }
}

struct TestApp {
    router: Router,
    provider: Arc<StubProvider>,
    _dir: TempDir,
}

async fn build_test_app(
    provider: StubProvider,
    reasoner: ScriptedReasoner,
    extra: &[(&str, &str)],
) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut vars: HashMap<String, String> = HashMap::from([
        (
            "MONETA_DB_PATH".to_string(),
            dir.path().join("test.db").to_string_lossy().into_owned(),
        ),
        ("ALPHA_VANTAGE_API_KEY".to_string(), "test-key".to_string()),
        ("GEMINI_API_KEY".to_string(), "test-key".to_string()),
        ("MONETA_JWT_SECRET".to_string(), JWT_SECRET.to_string()),
    ]);
    for (key, value) in extra {
        vars.insert(key.to_string(), value.to_string());
    }
    let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();

    let provider = Arc::new(provider);
    let state = build_state_with(&config, provider.clone(), Arc::new(reasoner))
        .await
        .unwrap();
    TestApp {
        router: app_router(state, &config),
        provider,
        _dir: dir,
    }
}

fn bearer() -> String {
    let exp = chrono::Utc::now().timestamp() + 3600;
    let token = encode(
        &Header::default(),
        &json!({ "sub": "report-generator", "exp": exp }),
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_authorized(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, bearer())
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn health_check_is_public() {
    let app = build_test_app(StubProvider::new(), ScriptedReasoner::default(), &[]).await;
    let (status, body) = send(&app, get("/api/v1/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn quote_is_cached_after_first_fetch() {
    let provider = StubProvider::new().with_price("AAPL", "189.50");
    let app = build_test_app(provider, ScriptedReasoner::default(), &[]).await;

    let (status, first) = send(&app, get("/api/v1/quote?symbol=AAPL&mode=quote")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["symbol"], "AAPL");
    assert_eq!(first["price"], 189.5);
    assert_eq!(first["currency"], "USD");
    assert_eq!(first["fromCache"], false);
    assert!(first.get("cachedOnly").is_none());

    let (status, second) = send(&app, get("/api/v1/quote?symbol=AAPL")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["fromCache"], true);
    assert_eq!(app.provider.calls(), 1);
}

#[tokio::test]
async fn lowercase_symbol_is_quoted_without_resolution() {
    let provider = StubProvider::new().with_price("AAPL", "189.50");
    let reasoner = ScriptedReasoner::default();
    let reasoner_calls = reasoner.calls.clone();
    let app = build_test_app(provider, reasoner, &[]).await;

    let (status, first) = send(&app, get("/api/v1/quote?symbol=aapl")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["symbol"], "AAPL");
    assert_eq!(first["fromCache"], false);

    let (status, second) = send(&app, get("/api/v1/quote?symbol=Aapl&mode=quote")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["fromCache"], true);

    assert_eq!(app.provider.calls(), 1);
    assert_eq!(reasoner_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn quote_parameters_are_validated() {
    let app = build_test_app(StubProvider::new(), ScriptedReasoner::default(), &[]).await;

    let (status, body) = send(&app, get("/api/v1/quote?mode=quote")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);

    let (status, _) = send(&app, get("/api/v1/quote?symbol=AAPL&mode=history")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.provider.calls(), 0);
}

#[tokio::test]
async fn unknown_symbol_is_not_found() {
    let app = build_test_app(StubProvider::new(), ScriptedReasoner::default(), &[]).await;
    let (status, body) = send(&app, get("/api/v1/quote?symbol=DELISTED")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No price data found for this symbol.");
}

#[tokio::test]
async fn exhausted_budget_without_cache_is_429() {
    let provider = StubProvider::new()
        .with_price("AAPL", "189.50")
        .with_price("MSFT", "410.00");
    let app = build_test_app(
        provider,
        ScriptedReasoner::default(),
        &[("MONETA_QUOTE_LIMIT_PER_MINUTE", "1")],
    )
    .await;

    let (status, _) = send(&app, get("/api/v1/quote?symbol=AAPL")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/api/v1/quote?symbol=MSFT")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["limitReached"], true);
    assert!(body["resetAt"].is_string());
    assert_eq!(app.provider.calls(), 1);

    // The cached symbol is still served.
    let (status, body) = send(&app, get("/api/v1/quote?symbol=AAPL")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fromCache"], true);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = build_test_app(StubProvider::new(), ScriptedReasoner::default(), &[]).await;

    let (status, body) = send(&app, get("/api/v1/financial-data?q=Mercedes")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let request = Request::builder()
        .uri("/api/v1/tickers/MBG.DE")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn financial_data_resolves_persists_and_prices() {
    let provider = StubProvider::new().with_price("MBG.DE", "63.42");
    let reasoner = ScriptedReasoner::default().answer(
        "Mercedes",
        r#"{"symbol": "MBG.DE", "company_name": "Mercedes-Benz Group AG", "sector": "Consumer Cyclical"}"#,
    );
    let app = build_test_app(provider, reasoner, &[]).await;

    let (status, body) = send(&app, get_authorized("/api/v1/financial-data?q=Mercedes")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "MBG.DE");
    assert_eq!(body["companyName"], "Mercedes-Benz Group AG");
    assert_eq!(body["sector"], "Consumer Cyclical");
    assert_eq!(body["price"], 63.42);
    assert_eq!(body["currency"], "EUR");
    assert_eq!(body["fromCache"], false);

    let (status, entry) = send(&app, get_authorized("/api/v1/tickers/mbg.de")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["symbol"], "MBG.DE");
    assert_eq!(entry["companyName"], "Mercedes-Benz Group AG");

    // Second lookup goes through the directory and the cache.
    let (status, body) = send(&app, get_authorized("/api/v1/financial-data?q=mercedes")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fromCache"], true);
    assert_eq!(app.provider.calls(), 1);
}

#[tokio::test]
async fn unresolvable_name_is_not_found() {
    let app = build_test_app(StubProvider::new(), ScriptedReasoner::default(), &[]).await;
    let (status, body) = send(
        &app,
        get_authorized("/api/v1/financial-data?q=Qzxv%20Capital%20Nonsense%20Inc"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"],
        "No ticker found for this name. Please enter the exchange symbol directly."
    );
    assert_eq!(app.provider.calls(), 0);

    let (status, _) = send(&app, get_authorized("/api/v1/financial-data")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn batch_resolution_returns_the_resolved_subset() {
    let reasoner = ScriptedReasoner::default().answer(
        "Siemens Energy",
        r#"{"results": [
            {"input": "Siemens Energy", "symbol": "ENR.DE", "company_name": "Siemens Energy AG"},
            {"input": "Qzxv Capital", "symbol": "UNKNOWN"}
        ]}"#,
    );
    let app = build_test_app(StubProvider::new(), reasoner, &[]).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/tickers/resolve")
        .header(header::AUTHORIZATION, bearer())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "names": ["Siemens Energy", "Qzxv Capital"] }).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["symbol"], "ENR.DE");

    let (status, entry) = send(&app, get_authorized("/api/v1/tickers/ENR.DE")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["companyName"], "Siemens Energy AG");

    let (status, _) = send(&app, get_authorized("/api/v1/tickers/NOPE")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
