use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub kafka: KafkaConfig,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
}

/// Workflow knobs; mirrored into the engine's `WorkflowRules` at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// Earliest schedulable pickup, hours from now.
    pub pickup_lead_hours: i64,
    /// Laundry price per kilogram, integer currency units.
    pub price_per_kg: i64,
    pub base_delivery_fee: i64,
    pub per_km_delivery_fee: i64,
    pub service_radius_km: f64,
    /// Days after delivery before the sweep confirms on the customer's behalf.
    #[serde(default = "default_auto_confirm_days")]
    pub auto_confirm_days: i64,
    /// Hours a bypass may stay pending before escalation.
    #[serde(default = "default_bypass_grace_hours")]
    pub bypass_grace_hours: i64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

fn default_auto_confirm_days() -> i64 {
    2
}

fn default_bypass_grace_hours() -> i64 {
    12
}

fn default_sweep_interval() -> u64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
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
pub struct KafkaConfig {
    pub brokers: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Layer the environment file on top; optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Env vars win: WASHLINE_SERVER__PORT=8080 etc.
            .add_source(config::Environment::with_prefix("WASHLINE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
