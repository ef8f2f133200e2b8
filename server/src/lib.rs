use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use parking_lot::RwLock;
use search_core::{SearchConfig, SearchEngine, SearchResponse};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Everything needed to (re)open the engine from disk.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub index_dir: PathBuf,
    pub products: PathBuf,
    pub synonyms: Option<PathBuf>,
    pub config: SearchConfig,
    pub admin_token: Option<String>,
}

impl ServerOptions {
    pub fn open_engine(&self) -> Result<SearchEngine> {
        let engine = SearchEngine::open(
            &self.index_dir,
            &self.products,
            self.synonyms.as_deref(),
            self.config.clone(),
        )
        .with_context(|| format!("opening index at {}", self.index_dir.display()))?;
        Ok(engine)
    }
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub k: Option<usize>,
}

#[derive(Deserialize)]
pub struct DocParams {
    pub url: String,
}

#[derive(Clone)]
pub struct AppState {
    /// Swapped as a whole on reload; queries clone the inner `Arc` and never
    /// hold the lock while scoring.
    pub engine: Arc<RwLock<Arc<SearchEngine>>>,
    pub options: Arc<ServerOptions>,
}

impl AppState {
    fn snapshot(&self) -> Arc<SearchEngine> {
        self.engine.read().clone()
    }
}

pub fn build_app(options: ServerOptions) -> Result<Router> {
    let engine = options.open_engine()?;
    let app_state = AppState {
        engine: Arc::new(RwLock::new(Arc::new(engine))),
        options: Arc::new(options),
    };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc", get(doc_handler))
        .route("/index/reload", post(reload_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let engine = state.snapshot();
    let k = params.k.unwrap_or(engine.config().default_top_k).clamp(1, 100);
    Json(engine.search(&params.q, k))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Query(params): Query<DocParams>,
) -> Json<serde_json::Value> {
    let engine = state.snapshot();
    match engine.store().get(&params.url) {
        Some(rec) => Json(serde_json::to_value(rec).unwrap_or_default()),
        None => Json(serde_json::json!({ "error": "not found" })),
    }
}

/// Rebuilds the engine from disk and swaps it in. On failure the current
/// snapshot keeps serving.
async fn reload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let options = state.options.clone();
    let engine = tokio::task::spawn_blocking(move || options.open_engine())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            tracing::error!(error = %format!("{e:#}"), "index reload failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
        })?;
    let total_documents = engine.store().len();
    *state.engine.write() = Arc::new(engine);
    tracing::info!(total_documents, "index reloaded");
    Ok(Json(serde_json::json!({ "reloaded": true, "total_documents": total_documents })))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.options.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
