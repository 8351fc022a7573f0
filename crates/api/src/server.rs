//! HTTP surface for the booknaru service.
//!
//! One aggregated search endpoint plus thin proxies over the catalog and AI
//! upstreams. Proxy responses reuse the upstream record shapes; only the
//! aggregator has its own envelope.

use std::cmp::Ordering;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::time::timeout;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use booknaru_catalog::{
    haversine_km, CatalogError, Library, LibraryClient, RecommendType, SearchBooks,
};
use booknaru_discovery::ai::{
    insight_messages, parse_insight, parse_recommendations, recommendation_messages,
};
use booknaru_discovery::matching::normalize;
use booknaru_discovery::{
    AiError, AiProvider, AiResponse, ChatMessage, GenerateOptions, MemoryCache, ResponseCache,
    SearchError, SearchPipeline, SearchRequest,
};

use crate::config::Config;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: LibraryClient,
    pub ai: Arc<dyn AiProvider>,
    pub cache: Arc<dyn ResponseCache>,
    pub pipeline: Arc<SearchPipeline>,
}

impl AppState {
    /// Wire the shared state: one cache instance serves both the aggregator
    /// and the plain search proxy (their key prefixes never collide).
    #[must_use]
    pub fn new(config: Config, catalog: LibraryClient, ai: Arc<dyn AiProvider>) -> Self {
        let cache: Arc<dyn ResponseCache> = Arc::new(MemoryCache::new(config.cache_capacity));
        let pipeline = Arc::new(SearchPipeline::new(
            catalog.clone(),
            ai.clone(),
            cache.clone(),
            config.pipeline_config(),
        ));
        Self { config, catalog, ai, cache, pipeline }
    }
}

/// Build the HTTP router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/api/ai-search", get(ai_search))
        .route("/api/search", get(search_books))
        .route("/api/books/{isbn13}/analysis", get(book_analysis))
        .route("/api/books/{isbn13}/recommend", get(book_recommend))
        .route("/api/libraries", get(libraries_by_book))
        .route("/api/ai-recommend", get(ai_recommend))
        .route("/api/ai-insight", get(ai_insight))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct AiSearchParams {
    #[serde(default)]
    keyword: String,
    lat: Option<String>,
    lon: Option<String>,
    nocache: Option<String>,
}

/// The aggregated search endpoint.
///
/// Coordinates are parsed leniently: a malformed `lat`/`lon` degrades to the
/// no-GPS path instead of rejecting the request.
async fn ai_search(
    State(state): State<AppState>,
    Query(params): Query<AiSearchParams>,
) -> Response {
    let request = SearchRequest {
        keyword: params.keyword,
        lat: parse_coord(params.lat.as_deref()),
        lon: parse_coord(params.lon.as_deref()),
        nocache: flag_set(params.nocache.as_deref()),
    };

    match state.pipeline.run(&request).await {
        Ok(outcome) => json_body(StatusCode::OK, outcome.body().to_string()),
        Err(SearchError::EmptyKeyword) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "keyword is required" })),
        )
            .into_response(),
        Err(error) => {
            error!(%error, "aggregated search failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "AI recommendation failed",
                    "detail": error.to_string(),
                })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    keyword: String,
    page: Option<u32>,
    size: Option<u32>,
}

/// Keyword-search proxy over the catalog, cached per (keyword, page, size).
async fn search_books(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let keyword = params.keyword.trim();
    if keyword.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "keyword is required" })),
        )
            .into_response();
    }
    let page = params.page.unwrap_or(1).max(1);
    let size = params.size.unwrap_or(10).clamp(1, 50);

    let cache_key = search_cache_key(keyword, page, size);
    if let Some(body) = state.cache.get(&cache_key).await {
        debug!(key = %cache_key, "search cache hit");
        return json_body(StatusCode::OK, body);
    }

    let search = SearchBooks::keyword(keyword).page(page).page_size(size);
    match state.catalog.search_books(&search).await {
        Ok(books) => {
            let body = json!({ "books": books }).to_string();
            state
                .cache
                .set(&cache_key, body.clone(), state.config.search_cache_ttl)
                .await;
            json_body(StatusCode::OK, body)
        }
        Err(error) => proxy_error("book search failed", &error),
    }
}

/// Usage-analysis proxy.
async fn book_analysis(State(state): State<AppState>, Path(isbn13): Path<String>) -> Response {
    match state.catalog.usage_analysis(&isbn13).await {
        Ok(analysis) => (StatusCode::OK, Json(analysis)).into_response(),
        Err(error) => proxy_error("usage analysis failed", &error),
    }
}

#[derive(Debug, Deserialize)]
struct RecommendParams {
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Recommendation-list proxy.
async fn book_recommend(
    State(state): State<AppState>,
    Path(isbn13): Path<String>,
    Query(params): Query<RecommendParams>,
) -> Response {
    let Some(kind) = recommend_kind(params.kind.as_deref()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "type must be mania or reader" })),
        )
            .into_response();
    };

    match state.catalog.recommend_list(&[isbn13], kind).await {
        Ok(books) => (StatusCode::OK, Json(json!({ "books": books }))).into_response(),
        Err(error) => proxy_error("recommendation list failed", &error),
    }
}

#[derive(Debug, Deserialize)]
struct LibrariesParams {
    #[serde(default)]
    isbn: String,
    #[serde(default)]
    region: String,
    lat: Option<String>,
    lon: Option<String>,
}

/// A library record annotated with the caller's distance to it.
#[derive(Debug, Serialize)]
struct LibraryEntry {
    #[serde(flatten)]
    library: Library,
    #[serde(rename = "distanceKm", skip_serializing_if = "Option::is_none")]
    distance_km: Option<f64>,
}

/// Holdings proxy. With caller coordinates each library gains `distanceKm`
/// and the list comes back nearest-first.
async fn libraries_by_book(
    State(state): State<AppState>,
    Query(params): Query<LibrariesParams>,
) -> Response {
    let isbn = params.isbn.trim();
    let region = params.region.trim();
    if isbn.is_empty() || region.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "isbn and region are required" })),
        )
            .into_response();
    }

    let libraries = match state.catalog.libraries_by_book(isbn, region).await {
        Ok(libraries) => libraries,
        Err(error) => return proxy_error("library lookup failed", &error),
    };

    let origin = match (
        parse_coord(params.lat.as_deref()),
        parse_coord(params.lon.as_deref()),
    ) {
        (Some(lat), Some(lon)) => Some((lat, lon)),
        _ => None,
    };

    let entries = annotate_distance(libraries, origin);
    (StatusCode::OK, Json(json!({ "libraries": entries }))).into_response()
}

#[derive(Debug, Deserialize)]
struct KeywordParams {
    #[serde(default)]
    keyword: String,
}

/// AI recommendation proxy: the raw candidate list, unresolved.
async fn ai_recommend(
    State(state): State<AppState>,
    Query(params): Query<KeywordParams>,
) -> Response {
    let keyword = params.keyword.trim();
    if keyword.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "keyword is required" })),
        )
            .into_response();
    }

    let options = GenerateOptions {
        temperature: Some(0.7),
        max_tokens: Some(1024),
        json_mode: true,
    };
    let result = generate_with_budget(&state, &recommendation_messages(keyword), &options)
        .await
        .and_then(|response| parse_recommendations(&response.text));

    match result {
        Ok(books) => (StatusCode::OK, Json(json!({ "books": books }))).into_response(),
        Err(error) => ai_proxy_error("AI recommendation failed", &error),
    }
}

/// AI insight proxy: a short summary plus themes for a keyword.
async fn ai_insight(
    State(state): State<AppState>,
    Query(params): Query<KeywordParams>,
) -> Response {
    let keyword = params.keyword.trim();
    if keyword.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "keyword is required" })),
        )
            .into_response();
    }

    let options = GenerateOptions {
        temperature: Some(0.5),
        max_tokens: Some(512),
        json_mode: true,
    };
    let result = generate_with_budget(&state, &insight_messages(keyword), &options)
        .await
        .and_then(|response| parse_insight(&response.text));

    match result {
        Ok(insight) => (StatusCode::OK, Json(insight)).into_response(),
        Err(error) => ai_proxy_error("AI insight failed", &error),
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn readiness_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ready",
        "model": state.config.openai_model,
    }))
}

/// Run one AI generation under the configured budget. The provider's HTTP
/// client has no overall timeout of its own.
async fn generate_with_budget(
    state: &AppState,
    messages: &[ChatMessage],
    options: &GenerateOptions,
) -> Result<AiResponse, AiError> {
    timeout(
        state.config.ai_timeout,
        state.ai.generate(&state.config.openai_model, messages, options),
    )
    .await
    .map_err(|_| AiError::Timeout(state.config.ai_timeout))?
}

/// A pre-serialized JSON body, returned verbatim so cached responses stay
/// byte-identical to the run that produced them.
fn json_body(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn proxy_error(context: &str, error: &CatalogError) -> Response {
    warn!(%error, context, "catalog proxy call failed");
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({ "error": context, "detail": error.to_string() })),
    )
        .into_response()
}

fn ai_proxy_error(context: &str, error: &AiError) -> Response {
    warn!(%error, context, "AI proxy call failed");
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({ "error": context, "detail": error.to_string() })),
    )
        .into_response()
}

/// Lenient coordinate parsing: anything non-numeric reads as absent.
fn parse_coord(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok()
}

fn flag_set(raw: Option<&str>) -> bool {
    matches!(raw.map(str::trim), Some("1" | "true"))
}

fn recommend_kind(raw: Option<&str>) -> Option<RecommendType> {
    match raw.map(str::trim) {
        None | Some("" | "mania") => Some(RecommendType::Mania),
        Some("reader") => Some(RecommendType::Reader),
        Some(_) => None,
    }
}

fn search_cache_key(keyword: &str, page: u32, size: u32) -> String {
    format!("search:{}:{page}:{size}", normalize(keyword))
}

/// Attach `distanceKm` to each library and sort nearest-first when the
/// caller's position is known. Libraries without coordinates sort last.
fn annotate_distance(libraries: Vec<Library>, origin: Option<(f64, f64)>) -> Vec<LibraryEntry> {
    let mut entries: Vec<LibraryEntry> = libraries
        .into_iter()
        .map(|library| {
            let distance_km = origin.and_then(|(lat, lon)| {
                library
                    .coords()
                    .map(|(lib_lat, lib_lon)| haversine_km(lat, lon, lib_lat, lib_lon))
            });
            LibraryEntry { library, distance_km }
        })
        .collect();

    if origin.is_some() {
        entries.sort_by(|a, b| match (a.distance_km, b.distance_km) {
            (Some(left), Some(right)) => left.total_cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }
    entries
}
