//! Web dashboard adapter.
//!
//! Axum server with an HTMX front end. The full page is rendered once; every
//! control change re-requests `/` as an HTMX fragment that swaps the option
//! selects and the chart panels together.

mod error;
mod handlers;
mod query;
mod templates;

pub use error::WebError;
pub use query::parse_selection;
pub use templates::{ChartsView, Choice, Controls, PanelView};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::domain::dataset::{Dataset, DatasetStore};
use crate::domain::settings::DashboardSettings;
use crate::ports::data_port::DataPort;

pub struct AppState {
    pub store: DatasetStore,
    pub data_port: Arc<dyn DataPort + Send + Sync>,
    pub settings: DashboardSettings,
}

impl AppState {
    pub fn new(
        dataset: Dataset,
        data_port: Arc<dyn DataPort + Send + Sync>,
        settings: DashboardSettings,
    ) -> Self {
        Self {
            store: DatasetStore::new(dataset),
            data_port,
            settings,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/options", get(handlers::options_fragment))
        .route("/charts", get(handlers::charts_fragment))
        .route("/api/options", get(handlers::options_json))
        .route("/api/charts", get(handlers::charts_json))
        .route("/reload", post(handlers::reload))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

fn is_htmx_request(headers: &axum::http::HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}
