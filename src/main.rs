use chrono::Local;
use hit_dashboard::controller::DateRangeController;
use hit_dashboard::dashboard::Dashboard;
use hit_dashboard::models::DateWindow;
use hit_dashboard::source::{CachedSource, HttpSource, LocalSource, SourceKind};
use hit_dashboard::{load_log, router, AppState, Config, HitStore};
use std::{net::SocketAddr, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;

    let store = Arc::new(HitStore::from_log(load_log(&config.data_path).await));
    if store.is_empty() {
        warn!(path = %config.data_path.display(), "hit log has no usable rows");
    } else {
        info!(rows = store.len(), path = %config.data_path.display(), "loaded hit log");
    }

    let source = match &config.source_url {
        Some(url) => {
            let remote = HttpSource::new(url)?;
            info!(endpoint = %remote.endpoint(), "reading hits from remote source");
            SourceKind::Remote(remote)
        }
        None => SourceKind::Local(LocalSource::new(Arc::clone(&store))),
    };
    let source = CachedSource::new(source, config.cache_ttl);

    let today = Local::now().date_naive();
    let window = DateWindow::ending_at(today, config.default_days);
    let controller = DateRangeController::new(Dashboard::new(window, config.regions.clone()), source);
    if let Err(err) = controller.refresh().await {
        error!("initial load failed, starting with an empty series: {err}");
    }

    let app = router(AppState::new(store, controller, config.regions));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
