/**
 * Hub Collab Server Entry Point
 *
 * Loads configuration, initialises tracing and serves the collaborative
 * editing routes.
 */

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let config = hubcollab::shared::AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .init();

    tracing::info!("[STARTUP] Server initialization started");
    let addr = config.socket_addr()?;

    let app = hubcollab::backend::server::init::create_app(config).await;

    tracing::info!("[STARTUP] Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(not(feature = "ssr"))]
fn main() {
    eprintln!("Server requires the 'ssr' feature to be enabled.");
    eprintln!("Run with: cargo run --bin hubcollab-server --features ssr");
    std::process::exit(1);
}
