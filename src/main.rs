//! PetMatch API server: reads settings, builds the datastore handle, serves HTTP.

use petmatch::{build_router_with_limit, AppState, PgDatastore, Settings};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("petmatch=info,petmatch_server=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env().inspect_err(|e| tracing::error!(error = %e, "invalid configuration"))?;
    let store = PgDatastore::connect_lazy(&settings.database)?;
    let app = build_router_with_limit(AppState::new(store), settings.max_body_bytes);

    let listener = TcpListener::bind(("0.0.0.0", settings.port)).await?;
    tracing::info!("server is running on {}", listener.local_addr()?);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutting down");
}
