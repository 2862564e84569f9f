use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use washline_api::{app, state::{AppState, AuthConfig}};
use washline_dispatch::fees::DeliveryPricing;
use washline_order::machine::{OrderStateMachine, WorkflowRules};
use washline_store::{
    DbClient, EventProducer, StoreAddressRepository, StoreBypassRepository, StoreJobRepository,
    StoreOrderRepository, StoreOutletRepository, StoreWorkProcessRepository,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "washline_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = washline_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Washline API on port {}", config.server.port);

    // Database
    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    // Kafka
    let kafka_producer =
        EventProducer::new(&config.kafka.brokers).expect("Failed to create Kafka producer");

    let rules = WorkflowRules {
        pickup_lead_hours: config.business_rules.pickup_lead_hours,
        price_per_kg: config.business_rules.price_per_kg,
        delivery_pricing: DeliveryPricing {
            base_fee: config.business_rules.base_delivery_fee,
            per_km_fee: config.business_rules.per_km_delivery_fee,
            service_radius_km: config.business_rules.service_radius_km,
        },
        auto_confirm_days: config.business_rules.auto_confirm_days,
        bypass_grace_hours: config.business_rules.bypass_grace_hours,
    };

    let machine = Arc::new(OrderStateMachine::new(
        Arc::new(StoreOrderRepository::new(db.pool.clone())),
        Arc::new(StoreJobRepository::new(db.pool.clone())),
        Arc::new(StoreWorkProcessRepository::new(db.pool.clone())),
        Arc::new(StoreBypassRepository::new(db.pool.clone())),
        Arc::new(StoreAddressRepository::new(db.pool.clone())),
        Arc::new(StoreOutletRepository::new(db.pool.clone())),
        Arc::new(washline_core::payment::MockPaymentGate),
        Arc::new(kafka_producer),
        rules,
    ));

    // Periodic sweeper: auto-confirmation + bypass escalation
    tokio::spawn(washline_api::worker::start_sweeper(
        machine.clone(),
        config.business_rules.sweep_interval_seconds,
    ));

    let app_state = AppState {
        machine,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
