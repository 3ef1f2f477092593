use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use niche_core::domain::contract::{AnalysisResponse, AnalyzeRequest, NicheRecommendation};
use niche_core::domain::niche::DomainCandidate;
use niche_core::engine::{AnalysisOptions, NicheEngine};
use niche_core::error::AnalysisError;
use niche_core::scoring::{generate_domain_candidates, score_domain};
use niche_core::storage::{NicheStore, PgNicheStore};

const DEFAULT_DOMAIN_TLDS: [&str; 5] = ["com", "org", "net", "io", "co"];
const DEFAULT_DOMAIN_LIMIT: usize = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = niche_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let pool: Option<sqlx::PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match niche_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API without a niche store");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API without a niche store");
                None
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "DATABASE_URL missing; starting API without a niche store");
            None
        }
    };

    let store: Option<Arc<dyn NicheStore>> = pool
        .clone()
        .map(|p| Arc::new(PgNicheStore::new(p)) as Arc<dyn NicheStore>);

    let mut engine = NicheEngine::from_settings(&settings, AnalysisOptions::from_env())?;
    if let Some(store) = &store {
        engine = engine.with_store(store.clone());
    }

    let state = AppState {
        engine: Arc::new(engine),
        store,
    };

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        pool.close().await;
    }

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/niches/analyze", post(analyze_niches))
        .route("/niches/:name", get(get_niche))
        .route("/domains/score", post(score_domains))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    engine: Arc<NicheEngine>,
    store: Option<Arc<dyn NicheStore>>,
}

async fn analyze_niches(
    State(state): State<AppState>,
    request: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> (StatusCode, Json<AnalysisResponse>) {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            let err = AnalysisError::Input(rejection.body_text());
            return (StatusCode::BAD_REQUEST, Json(AnalysisResponse::failure(&err)));
        }
    };
    let include_keyword_data = request.include_keyword_data;
    let input = match request.validate(state.engine.options().default_limit) {
        Ok(input) => input,
        Err(err) => return (StatusCode::BAD_REQUEST, Json(AnalysisResponse::failure(&err))),
    };

    match state.engine.run(&input).await {
        Ok(outcome) => {
            if let Some(err) = &outcome.persistence_error {
                sentry_anyhow::capture_anyhow(&anyhow::Error::new(err.clone()));
            }
            (StatusCode::OK, Json(outcome.into_response(include_keyword_data)))
        }
        Err(err) => (status_for(&err), Json(AnalysisResponse::failure(&err))),
    }
}

fn status_for(err: &AnalysisError) -> StatusCode {
    match err {
        AnalysisError::Input(_) => StatusCode::BAD_REQUEST,
        AnalysisError::NoValidData => StatusCode::UNPROCESSABLE_ENTITY,
        // Save failures come back in the outcome, not as an error.
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn get_niche(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<NicheRecommendation>, StatusCode> {
    let Some(store) = &state.store else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let scored = store
        .load_niche(name.trim())
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(NicheRecommendation::from(&scored)))
}

#[derive(Debug, Deserialize)]
struct DomainScoreRequest {
    #[serde(default)]
    domains: Vec<String>,
    #[serde(default)]
    keyword: Option<String>,
    #[serde(default)]
    tlds: Vec<String>,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct DomainScoreResponse {
    scored: Vec<DomainCandidate>,
    suggestions: Vec<DomainCandidate>,
}

async fn score_domains(
    Json(request): Json<DomainScoreRequest>,
) -> Result<Json<DomainScoreResponse>, StatusCode> {
    let keyword = request
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty());
    if request.domains.is_empty() && keyword.is_none() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let scored = request
        .domains
        .iter()
        .filter(|d| !d.trim().is_empty())
        .map(|d| score_domain(d))
        .collect();

    let suggestions = match keyword {
        Some(keyword) => {
            let tlds: Vec<&str> = if request.tlds.is_empty() {
                DEFAULT_DOMAIN_TLDS.to_vec()
            } else {
                request.tlds.iter().map(String::as_str).collect()
            };
            generate_domain_candidates(
                keyword,
                &tlds,
                request.limit.unwrap_or(DEFAULT_DOMAIN_LIMIT),
            )
        }
        None => Vec::new(),
    };

    Ok(Json(DomainScoreResponse {
        scored,
        suggestions,
    }))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &niche_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
