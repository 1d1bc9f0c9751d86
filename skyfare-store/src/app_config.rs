use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

/// Knobs for the simulated parts of the system.
#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    /// Probability a simulated payment attempt succeeds.
    #[serde(default = "default_payment_success_rate")]
    pub payment_success_rate: f64,
    /// Seconds between demand-adjustment passes.
    #[serde(default = "default_demand_interval_seconds")]
    pub demand_interval_seconds: u64,
    /// Hard cap on fare-history rows returned per flight.
    #[serde(default = "default_fare_history_limit")]
    pub fare_history_limit: i64,
}

fn default_payment_success_rate() -> f64 {
    0.9
}

fn default_demand_interval_seconds() -> u64 {
    300
}

fn default_fare_history_limit() -> i64 {
    50
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            // `SKYFARE__SERVER__PORT=9000` overrides server.port
            .add_source(config::Environment::with_prefix("SKYFARE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
