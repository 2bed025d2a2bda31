use owl_api::server::{router, ServerState};
use owl_api::BackendConfig;
use owl_store::MemoryBackend;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = BackendConfig::from_env()?;
    let app = router(ServerState::new(MemoryBackend::new()));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
