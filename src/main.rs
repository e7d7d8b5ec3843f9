use hormur_router::config::RouterConfig;
use hormur_router::routes::{AppState, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = RouterConfig::from_env();

    let bind_addr =
        std::env::var("HORMUR_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    eprintln!("📬 Hormur Router v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Listening on: http://{}", bind_addr);
    eprintln!(
        "   Brevo direct: {}",
        if config.brevo.api_key.is_some() { "enabled" } else { "disabled" }
    );
    eprintln!(
        "   Make.com send-response: {}",
        if config.webhooks.send_response.is_some() { "configured" } else { "absent" }
    );
    eprintln!(
        "   Make.com datastore: {}",
        if config.webhooks.datastore_update.is_some() { "configured" } else { "absent" }
    );
    eprintln!(
        "   Apps Script: {}",
        if config.apps_script.is_configured() { "configured" } else { "absent" }
    );
    eprintln!(
        "   Messages source: {}\n",
        if config.webhooks.get_messages.is_some() { "live webhook" } else { "demo data" }
    );

    let state = AppState::new(config);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Hormur router started");
    axum::serve(listener, app).await?;

    Ok(())
}
