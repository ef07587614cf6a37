use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use listing_scout::{export, types::*, AppState, HarvestError, HarvestReport};

fn parse_port_from_args() -> Option<u16> {
    let mut args = std::env::args().peekable();
    while let Some(a) = args.next() {
        if a == "--port" {
            if let Some(v) = args.next() {
                if let Ok(p) = v.parse::<u16>() {
                    return Some(p);
                }
            }
        } else if let Some(rest) = a.strip_prefix("--port=") {
            if let Ok(p) = rest.parse::<u16>() {
                return Some(p);
            }
        }
    }
    None
}

fn port_from_env() -> Option<u16> {
    for k in ["LISTING_SCOUT_PORT", "PORT"] {
        if let Ok(v) = std::env::var(k) {
            if let Ok(p) = v.trim().parse::<u16>() {
                return Some(p);
            }
        }
    }
    None
}

/// `--scrape <url> [--pages N]` one-shot mode.
fn parse_one_shot_from_args() -> anyhow::Result<Option<ScrapeRequest>> {
    let args: Vec<String> = std::env::args().collect();
    let mut url = None;
    let mut pages = 1usize;
    let mut it = args.iter().skip(1);
    while let Some(a) = it.next() {
        if a == "--scrape" {
            url = Some(
                it.next()
                    .ok_or_else(|| anyhow::anyhow!("--scrape requires a URL"))?
                    .clone(),
            );
        } else if let Some(rest) = a.strip_prefix("--scrape=") {
            url = Some(rest.to_string());
        } else if a == "--pages" {
            let v = it
                .next()
                .ok_or_else(|| anyhow::anyhow!("--pages requires a number"))?;
            pages = v.parse()?;
        } else if let Some(rest) = a.strip_prefix("--pages=") {
            pages = rest.parse()?;
        }
    }
    Ok(url.map(|url| ScrapeRequest { url, pages }))
}

fn validate_request(request: &ScrapeRequest) -> Result<(), String> {
    if request.pages == 0 {
        return Err("pages must be at least 1".to_string());
    }
    match url::Url::parse(&request.url) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(()),
        Ok(u) => Err(format!("unsupported URL scheme: {}", u.scheme())),
        Err(e) => Err(format!("invalid URL: {}", e)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=warn"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = listing_scout::core::config::load_scout_config();
    let state = Arc::new(AppState::new(config));

    // Handle one-shot mode
    if let Some(request) = parse_one_shot_from_args()? {
        if let Err(msg) = validate_request(&request) {
            anyhow::bail!(msg);
        }
        let response = harvest(&state, &request).await?;
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    info!("Starting listing-scout server");

    let app = build_router(state.clone());

    // Start server
    let port: u16 = parse_port_from_args()
        .or_else(port_from_env)
        .unwrap_or(5000);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            anyhow::bail!(
                "Address already in use: {}. Stop the existing process or run with --port {} (or set PORT/LISTING_SCOUT_PORT).",
                bind_addr,
                port.saturating_add(1)
            )
        }
        Err(e) => return Err(e.into()),
    };
    info!("listing-scout listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/scrape", post(scrape_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).ok();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = async {
                if let Some(ref mut s) = sigterm {
                    s.recv().await;
                } else {
                    futures::future::pending::<()>().await;
                }
            } => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("Shutdown signal received; draining in-flight requests");
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "listing-scout",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Run one harvest under the run lock, then export the CSV if configured.
async fn harvest(state: &AppState, request: &ScrapeRequest) -> Result<ScrapeResponse, HarvestError> {
    let _guard = state.run_lock.lock().await;
    let report = state.harvester.run(&request.url, request.pages).await?;
    let export_path = export_records(state.config.resolve_output_csv(), &report).await;
    Ok(build_response(report, export_path))
}

/// CSV failures are logged; the harvested records are still returned.
async fn export_records(path: Option<PathBuf>, report: &HarvestReport) -> Option<String> {
    let path = path?;
    let records = report.records.clone();
    let target = path.clone();
    match tokio::task::spawn_blocking(move || export::save_csv(&target, &records)).await {
        Ok(Ok(())) => Some(path.display().to_string()),
        Ok(Err(e)) => {
            warn!("CSV export to {} failed: {}", path.display(), e);
            None
        }
        Err(e) => {
            warn!("CSV export task join error: {}", e);
            None
        }
    }
}

fn build_response(report: HarvestReport, export_path: Option<String>) -> ScrapeResponse {
    let results: Vec<_> = report.records.iter().map(ListingRecord::to_json_row).collect();
    ScrapeResponse {
        message: "Scraping done".to_string(),
        count: results.len(),
        results,
        run_id: Some(report.run_id),
        finished_at: Some(report.finished_at.to_rfc3339()),
        export_path,
    }
}

async fn scrape_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScrapeRequest>,
) -> Result<Json<ScrapeResponse>, (StatusCode, Json<ErrorResponse>)> {
    if let Err(msg) = validate_request(&request) {
        return Err((StatusCode::BAD_REQUEST, Json(ErrorResponse { error: msg })));
    }

    info!("Processing scrape request: {} ({} page(s))", request.url, request.pages);
    match harvest(&state, &request).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!("Scrape error: {}", e);
            let status = if e.is_configuration() {
                StatusCode::SERVICE_UNAVAILABLE
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            Err((
                status,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}
