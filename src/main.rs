use sketchroom::config::ServerConfig;
use sketchroom::coordinator::Coordinator;
use sketchroom::hub::spawn_hub;
use sketchroom::rate_limit::RateLimiter;
use sketchroom::routes;
use sketchroom::services::eviction::spawn_sweep_task;
use sketchroom::state::{AppState, Rooms};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = ServerConfig::from_env().expect("invalid server configuration");

    let limiter = RateLimiter::new(config.rate_limit_events, config.rate_limit_window);
    let (hub, _hub_task) = spawn_hub(Coordinator::new(Rooms::new()), limiter, config.hub_queue_capacity);

    // Idle room eviction is opt-in.
    let _sweeper = match config.room_idle_ttl {
        Some(ttl) => Some(spawn_sweep_task(hub.clone(), config.sweep_interval, ttl)),
        None => {
            tracing::info!("idle room eviction disabled; rooms live for the process lifetime");
            None
        }
    };

    let bind_addr = config.bind_addr();
    let app = routes::app(AppState::new(hub, config));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind");

    tracing::info!(%bind_addr, "sketchroom listening");
    axum::serve(listener, app).await.expect("server failed");
}
