use anyhow::Result;
use axum::{
    extract::{Form, Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use parking_lot::RwLock;
use ranker::persist::DataPaths;
use ranker::{format_similarity_percentage, Algorithm, DocId, ScoredResult, SearchEngine};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub per_page: usize,
    pub min_similarity: f64,
    pub admin_token: Option<String>,
}

impl AppConfig {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self { data_dir: data_dir.into(), per_page: 10, min_similarity: 0.01, admin_token: None }
    }
}

#[derive(Deserialize, Default)]
pub struct SearchParams {
    pub query: Option<String>,
    pub category: Option<String>,
    pub algorithm: Option<String>,
    /// Kept as text: a malformed page number falls back to page 1.
    pub page: Option<String>,
}

#[derive(Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
}

#[derive(Deserialize)]
pub struct ContentParams {
    pub query: Option<String>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub algorithm: String,
    pub category: Option<String>,
    pub took_s: f64,
    pub total_results: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub page_range: Vec<usize>,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub result: ScoredResult,
    pub similarity_percent: String,
}

/// One page of a ranked result list plus the page-number window shown around it.
#[derive(Debug, Clone, PartialEq)]
pub struct Pagination {
    pub total_pages: usize,
    pub current_page: usize,
    pub start: usize,
    pub end: usize,
    pub page_range: Vec<usize>,
}

impl Pagination {
    /// Out-of-range pages are clamped; with no results every page is empty.
    pub fn new(total: usize, requested: i64, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let total_pages = total.div_ceil(per_page);
        let mut page = usize::try_from(requested.max(1)).unwrap_or(usize::MAX);
        if page > total_pages && total_pages > 0 {
            page = total_pages;
        }
        // an unclamped page (no results) can be as large as i64::MAX
        let start = page.saturating_sub(1).saturating_mul(per_page).min(total);
        let end = (start + per_page).min(total);
        let page_range = (page.saturating_sub(2).max(1)..=total_pages.min(page.saturating_add(2))).collect();
        Self { total_pages, current_page: page, start, end, page_range }
    }
}

/// Engine slot shared by all handlers. Reload builds a new engine and swaps it
/// in; searches already running keep the `Arc` they cloned.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<RwLock<Arc<SearchEngine>>>,
    pub paths: DataPaths,
    pub per_page: usize,
    pub min_similarity: f64,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(engine: SearchEngine, config: &AppConfig) -> Self {
        Self {
            engine: Arc::new(RwLock::new(Arc::new(engine))),
            paths: DataPaths::from_root(&config.data_dir),
            per_page: config.per_page,
            min_similarity: config.min_similarity,
            admin_token: config.admin_token.clone(),
        }
    }

    pub fn engine(&self) -> Arc<SearchEngine> {
        self.engine.read().clone()
    }

    pub fn replace_engine(&self, engine: SearchEngine) {
        *self.engine.write() = Arc::new(engine);
    }

    /// Admin calls need `X-ADMIN-TOKEN` equal to the configured token; with no
    /// token configured they are always refused.
    fn check_admin(&self, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
        let Some(expected) = self.admin_token.as_deref() else {
            return Err((StatusCode::UNAUTHORIZED, "admin token not configured".into()));
        };
        match headers.get("X-ADMIN-TOKEN").map(|v| v.to_str()) {
            Some(Ok(token)) if token == expected => Ok(()),
            _ => Err((StatusCode::UNAUTHORIZED, "invalid admin token".into())),
        }
    }
}

pub fn build_app(config: AppConfig) -> Result<Router> {
    // Load and build the engine once at startup
    let paths = DataPaths::from_root(&config.data_dir);
    let engine = SearchEngine::load(&paths)?;
    Ok(router(AppState::new(engine, &config)))
}

/// Origins listed in `allowed` (comma separated) or any origin when the list is
/// missing or has no parseable entry.
fn cors_layer(allowed: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed
        .into_iter()
        .flat_map(|list| list.split(','))
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(std::env::var("CORS_ALLOW_ORIGIN").ok().as_deref());

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_get).post(search_post))
        .route("/content/:content_id", get(content_handler))
        .route("/admin/reload", post(reload_handler))
        .fallback(not_found)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_get(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let page = params.page.clone();
    Json(run_search(&state, params, page.as_deref()))
}

pub async fn search_post(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
    Form(params): Form<SearchParams>,
) -> Json<SearchResponse> {
    Json(run_search(&state, params, page.page.as_deref()))
}

fn run_search(state: &AppState, params: SearchParams, page: Option<&str>) -> SearchResponse {
    let start = std::time::Instant::now();
    let query = params.query.unwrap_or_default();
    // the front-end only offers the three models; anything else searches with jaccard
    let algorithm = match Algorithm::from(params.algorithm.as_deref().unwrap_or("jaccard")) {
        Algorithm::Unknown(_) => Algorithm::Jaccard,
        known => known,
    };
    let category = params.category.filter(|c| !c.is_empty());

    let engine = state.engine();
    let all_results = engine.search(&query, &algorithm, category.as_deref(), state.min_similarity);

    let requested = page.and_then(|p| p.trim().parse::<i64>().ok()).unwrap_or(1);
    let pagination = Pagination::new(all_results.len(), requested, state.per_page);
    let total_results = all_results.len();
    let results = all_results
        .into_iter()
        .skip(pagination.start)
        .take(pagination.end - pagination.start)
        .map(|result| SearchHit { similarity_percent: format_similarity_percentage(result.similarity), result })
        .collect();

    let elapsed = start.elapsed();
    tracing::debug!(%algorithm, total_results, page = pagination.current_page, "search served");
    SearchResponse {
        query,
        algorithm: algorithm.to_string(),
        category,
        took_s: elapsed.as_secs_f64(),
        total_results,
        total_pages: pagination.total_pages,
        current_page: pagination.current_page,
        page_range: pagination.page_range,
        results,
    }
}

pub async fn content_handler(
    State(state): State<AppState>,
    Path(content_id): Path<DocId>,
    Query(params): Query<ContentParams>,
) -> impl IntoResponse {
    let engine = state.engine();
    match engine.documents().get(content_id) {
        Some(meta) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "content_id": content_id,
                "query": params.query.unwrap_or_default(),
                "content": meta,
            })),
        ),
        None => (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" }))),
    }
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" })))
}

// --- Admin endpoints ---
async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    state.check_admin(&headers)?;
    let paths = state.paths.clone();
    let loaded = tokio::task::spawn_blocking(move || SearchEngine::load(&paths))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("reload task failed: {e}")))?;
    match loaded {
        Ok(engine) => {
            let num_docs = engine.stats().len();
            state.replace_engine(engine);
            tracing::info!(num_docs, "engine reloaded");
            Ok(Json(serde_json::json!({ "status": "reloaded", "num_docs": num_docs })))
        }
        Err(e) => {
            tracing::error!(error = %e, "reload failed, keeping current engine");
            Err((StatusCode::INTERNAL_SERVER_ERROR, format!("reload failed: {e:#}")))
        }
    }
}
