use crate::interfaces::http::handlers::{
    AppState, index, ping, update_batch, update_json, update_plain, value_json, value_plain,
};
use axum::Router;
use axum::routing::{get, post};

/// Metric ingestion and query routes. Trailing-slash forms are accepted for
/// the JSON endpoints.
pub fn metric_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ping", get(ping))
        .route("/update", post(update_json))
        .route("/update/", post(update_json))
        .route("/update/:kind/:name/:value", post(update_plain))
        .route("/updates", post(update_batch))
        .route("/updates/", post(update_batch))
        .route("/value", post(value_json))
        .route("/value/", post(value_json))
        .route("/value/:kind/:name", get(value_plain))
        .with_state(state)
}
