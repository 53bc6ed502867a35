use lignage_api::{app, ApiConfig, AppState, RecordEvent};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ApiConfig::from_env();
    let options = match config.extract_options() {
        Ok(options) => options,
        Err(e) => {
            tracing::error!(error = %e, "failed to load dictionaries");
            std::process::exit(1);
        }
    };

    let addr = config.bind_addr;
    let state = AppState::new(config, options);

    let mut events = state.store.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(RecordEvent::Created(id)) => tracing::debug!(%id, "store: created"),
                Ok(RecordEvent::Updated(id)) => tracing::debug!(%id, "store: updated"),
                Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "store events lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    tracing::info!("listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to bind on {addr}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutting down");
}
