mod api;
mod config;
mod dto;
mod error;
mod middleware;
mod state;

use std::net::SocketAddr;

use anyhow::Context;
use axum::http::{header, Method};
use axum::middleware::from_fn;
use dirserve_core::Root;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "dirserve_web=debug,dirserve_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::load()?;
    let bind_addr = config.bind_addr;
    let tls_config = config.tls.clone();
    let tls_enabled = config.tls_enabled();
    let prefix = config.normalized_prefix();

    // `validate` has already rejected a missing value.
    let home = config.home_directory.clone().unwrap_or_default();
    let root = Root::new(&home)
        .with_context(|| format!("cannot serve HomeDirectory {}", home.display()))?;
    tracing::info!(root = %root.path().display(), "serving directory");

    let state = AppState::new(config, root);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let app = if tls_enabled {
        api::router(state).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(from_fn(middleware::security_headers::security_headers_with_hsts)),
        )
    } else {
        api::router(state).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(from_fn(middleware::security_headers::security_headers)),
        )
    };

    if let (Some(cert), Some(key)) = (&tls_config.cert_path, &tls_config.key_path) {
        use axum_server::tls_rustls::RustlsConfig;
        let rustls_config = RustlsConfig::from_pem_file(cert, key)
            .await
            .context("failed to load TLS certificate or key")?;
        tracing::info!("dirserve listening on https://{}{}", bind_addr, prefix);
        axum_server::bind_rustls(bind_addr, rustls_config)
            .serve(app.into_make_service_with_connect_info::<SocketAddr>())
            .await?;
    } else {
        let listener = tokio::net::TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("failed to bind {bind_addr}"))?;
        tracing::info!("dirserve listening on http://{}{}", bind_addr, prefix);
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
    }

    Ok(())
}
