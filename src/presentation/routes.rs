use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    get_dashboard, get_entry, health_check, list_agents, list_entry_agents, list_projects,
    patch_entry, post_filters, put_entry, stream_dashboard,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// Compression is applied in the JSON response builder, so no CompressionLayer here.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/stream", get(stream_dashboard))
        .route("/filters", post(post_filters))
        .route("/projects", get(list_projects))
        .route("/agents", get(list_agents))
        .route("/entries/agents", get(list_entry_agents))
        .route(
            "/entries/:agent_id/:date",
            get(get_entry).put(put_entry).patch(patch_entry),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
