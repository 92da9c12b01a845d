//! Entry point for the `protolane-server` HTTP server.

use clap::Parser;
use protolane_server::AppState;
use protolane_server::ServerConfig;
use protolane_server::create_router;
use protolane_server::logging;
use tracing::info;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();
    logging::init(&config.log_level);

    let state = match AppState::assemble(&config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "failed to assemble services");
            std::process::exit(1);
        }
    };
    let app = create_router(state);

    let listener = match tokio::net::TcpListener::bind(config.listen).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %config.listen, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    info!(
        addr = %config.listen,
        host_policy = %config.host_policy,
        mock = config.enable_mock,
        "protolane-server listening"
    );

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
    info!("protolane-server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
