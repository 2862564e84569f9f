use std::sync::Arc;

use washline_order::machine::OrderStateMachine;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub machine: Arc<OrderStateMachine>,
    pub auth: AuthConfig,
}
