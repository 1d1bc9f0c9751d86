use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use skyfare_api::{
    app,
    state::{AppState, AuthConfig},
};
use skyfare_booking::{BookingService, DemandSimulator};
use skyfare_core::{Clock, SimulatedGateway, SystemClock};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skyfare_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = skyfare_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Skyfare API on port {}", config.server.port);

    let db = skyfare_store::DbClient::new(&config.database.url)
        .await
        .expect("Failed to open database");
    db.migrate().await.expect("Failed to run migrations");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let gateway = Arc::new(SimulatedGateway::new(config.simulation.payment_success_rate));
    let bookings = Arc::new(BookingService::new(db.clone(), clock.clone(), gateway));
    let simulator = Arc::new(
        DemandSimulator::new(db.clone(), clock.clone())
            .with_interval(Duration::from_secs(config.simulation.demand_interval_seconds)),
    );
    let worker = Arc::clone(&simulator).start();

    let app_state = AppState {
        db,
        bookings,
        simulator,
        clock,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        fare_history_limit: config.simulation.fare_history_limit,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    worker.shutdown().await;
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    tracing::info!("shutdown signal received");
}
