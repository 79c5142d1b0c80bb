use prodamus_gateway::config::Config;
use prodamus_gateway::observability;
use prodamus_gateway::provider::client::ProdamusClient;
use prodamus_gateway::provider::target::Endpoint;
use prodamus_gateway::router::{create_router, shutdown_on};
use prodamus_gateway::state::AppState;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    observability::init(config.log_format);

    let client = ProdamusClient::new(config.upstream_timeout(), config.upstream_scheme.clone())?;
    let app = create_router(AppState::new(client, config.environment));

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        %addr,
        environment = config.environment.as_str(),
        endpoints = ?Endpoint::ALL.map(Endpoint::as_str),
        "Prodamus API wrapper listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_on(tokio::signal::ctrl_c()))
        .await?;
    Ok(())
}
