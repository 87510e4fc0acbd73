mod extract;
mod middleware;
mod pages;
mod routes;
mod session;

use propeller_app::{AppConfig, AppContext};
use std::net::SocketAddr;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.environment.default_log_filter().into()),
        )
        .init();

    let addr = config.bind_addr();
    let environment = config.environment;

    let app_context = match AppContext::from_config(config).await {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!("Failed to start: {}", e);
            std::process::exit(1);
        }
    };

    let autosave = app_context
        .store
        .clone()
        .spawn_autosave(app_context.config.autosave_interval);

    let app = routes::with_layers(routes::routes(&app_context), &app_context.config);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");

    tracing::info!("Propeller AI server running on http://{}", addr);
    tracing::info!("Environment: {}", environment.as_str());
    tracing::info!(
        "Data directory: {}, uploads: {}",
        app_context.store.dir().display(),
        app_context.files.root().display()
    );
    if app_context.google_oauth.is_none() {
        tracing::warn!("GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET not set. Google sign-in will not work.");
    }
    if !app_context.send_message.is_configured() {
        tracing::warn!("OPENROUTER_API_KEY not set. Chat responses will not work.");
    }

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    autosave.abort();
    tracing::info!("Saving data before exit...");
    match app_context.store.save().await {
        Ok(()) => tracing::info!("Data saved. Goodbye."),
        Err(e) => tracing::error!("Final save failed: {}", e),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
    tracing::info!("Shutdown signal received");
}
