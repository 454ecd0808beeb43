//! Coursedeck - session gateway and course proxy in front of a headless CMS

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coursedeck::{
    api::{self, AppState},
    cms::HttpCmsClient,
    config::Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coursedeck=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting coursedeck...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!(cms = %config.cms.base_url(), "Configuration loaded");

    if !config.server.static_dir.join("index.html").exists() {
        tracing::warn!(
            dir = %config.server.static_dir.display(),
            "Frontend build not found; page navigations will return 404"
        );
    }

    // Connect the CMS client and wire services
    let cms = HttpCmsClient::boxed(&config.cms)?;
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, cms)?;

    // Build router
    let app = api::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
