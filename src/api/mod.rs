mod error;
mod rest;
mod store;
mod types;

pub use error::{ApiError, ApiResult};
pub use rest::{ApiState, RestApi};
pub use store::UploadStore;
pub use types::*;

use crate::metrics::metrics_route;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Upload endpoint plus `/metrics`, with CORS and request tracing.
pub fn create_api_server(api: RestApi) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api.router())
        .route("/metrics", metrics_route())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
