pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;

use std::sync::Arc;

use crate::application::BankService;

pub use error::ApiError;
pub use routes::create_router;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BankService>,
}

impl AppState {
    pub fn new(service: BankService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
