//! HTTP surface: public registration plus the key-gated admin endpoints.
//!
//! | Route | Access |
//! |---|---|
//! | `POST /register` | public |
//! | `GET /listado`, `/historial`, `/status`, `/exportar_csv` | `clave` |
//! | `GET /pausar`, `/modo_simulacion` (`on=...` to change) | `clave` |
//! | `GET /test` | public |
//! | `GET /healthz` | public |

mod error;
mod handlers;

pub use error::{ApiError, INVALID_KEY_MESSAGE};
pub use handlers::{AdminQuery, RegisterRequest, StatusResponse};

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::control::{AdminCredential, ControlSurface};
use crate::notify::Dispatcher;
use crate::recipient::Recipient;
use crate::storage::{DeliveryStore, RecipientStore};

/// Everything the handlers share. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub(crate) control: ControlSurface,
    pub(crate) credential: Arc<AdminCredential>,
    pub(crate) recipients: Arc<dyn RecipientStore>,
    pub(crate) deliveries: Arc<dyn DeliveryStore>,
    pub(crate) dispatcher: Arc<Dispatcher>,
    pub(crate) test_recipient: Option<Recipient>,
}

impl AppState {
    #[allow(missing_docs)]
    pub fn new(
        control: ControlSurface,
        credential: AdminCredential,
        recipients: Arc<dyn RecipientStore>,
        deliveries: Arc<dyn DeliveryStore>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            control,
            credential: Arc::new(credential),
            recipients,
            deliveries,
            dispatcher,
            test_recipient: None,
        }
    }

    /// Recipient of `GET /test`. Without one that route answers 503.
    #[must_use]
    pub fn with_test_recipient(mut self, recipient: Option<Recipient>) -> Self {
        self.test_recipient = recipient;
        self
    }
}

/// Build the router over `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/listado", get(handlers::list_recipients))
        .route("/historial", get(handlers::delivery_history))
        .route("/status", get(handlers::status))
        .route("/exportar_csv", get(handlers::export_csv))
        .route("/pausar", get(handlers::pause))
        .route("/modo_simulacion", get(handlers::simulation))
        .route("/test", get(handlers::send_test))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}
