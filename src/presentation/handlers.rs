// HTTP request handlers
use crate::application::dashboard_store::RefreshOutcome;
use crate::application::data_entry::EntryField;
use crate::domain::directory::{Agent, Project};
use crate::domain::filters::FilterIntent;
use crate::domain::performance::EntryValues;
use crate::domain::project_table::{SortDirection, SortField, SortState};
use crate::infrastructure::chunked_json::{ndjson_stream, watch_stream};
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use crate::presentation::error::ApiError;
use crate::presentation::views::{DashboardView, EntryFormView};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct SortQuery {
    pub sort: Option<SortField>,
    pub dir: Option<SortDirection>,
}

impl SortQuery {
    /// Selecting a column behaves like a header click on the default ordering.
    fn sort_state(&self) -> SortState {
        let mut state = SortState::default();
        if let Some(field) = self.sort {
            state.select(field);
        }
        if let Some(direction) = self.dir {
            state.direction = direction;
        }
        state
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterResponse {
    pub outcome: RefreshOutcome,
    pub view: DashboardView,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySaved {
    pub record_id: String,
    pub form: EntryFormView,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current dashboard view, Brotli-encoded when the client accepts it
pub async fn get_dashboard(
    query: Result<Query<SortQuery>, QueryRejection>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let view = DashboardView::build(&state.store.current(), query.sort_state());

    Ok(match json_response(StatusCode::OK, &view, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    })
}

/// Streams one view per published state change
pub async fn stream_dashboard(
    query: Result<Query<SortQuery>, QueryRejection>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let sort = query.sort_state();
    let views = watch_stream(state.store.subscribe(), move |s| DashboardView::build(s, sort));

    Ok(match ndjson_stream(views) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    })
}

/// Applies an intent and returns the refresh outcome with the resulting view
pub async fn post_filters(
    State(state): State<Arc<AppState>>,
    intent: Result<Json<FilterIntent>, JsonRejection>,
) -> Result<Json<FilterResponse>, ApiError> {
    let Json(intent) = intent?;
    let outcome = state.store.dispatch(intent).await?;
    tracing::debug!("Filter intent outcome: {:?}", outcome);
    let view = DashboardView::build(&state.store.current(), SortState::default());

    Ok(Json(FilterResponse { outcome, view }))
}

pub async fn list_projects(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Project>>, ApiError> {
    state
        .gateway
        .list_projects()
        .await
        .map(Json)
        .map_err(|e| ApiError::Upstream(format!("Error fetching projects: {:#}", e)))
}

/// Agents selectable under the active project filter
pub async fn list_agents(State(state): State<Arc<AppState>>) -> Json<Vec<Agent>> {
    Json(state.store.current().agents_in_scope())
}

pub async fn list_entry_agents(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Agent>>, ApiError> {
    let project = state.store.current().filters().project.clone();
    let agents = state.data_entry.agents_for_project(&project).await?;
    Ok(Json(agents))
}

pub async fn get_entry(
    path: Result<Path<(String, NaiveDate)>, PathRejection>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<EntryFormView>, ApiError> {
    let Path((agent_id, date)) = path?;
    let form = state.data_entry.open_form(&agent_id, date).await?;
    Ok(Json(form.into()))
}

pub async fn put_entry(
    path: Result<Path<(String, NaiveDate)>, PathRejection>,
    State(state): State<Arc<AppState>>,
    values: Result<Json<EntryValues>, JsonRejection>,
) -> Result<Json<EntrySaved>, ApiError> {
    let Path((agent_id, date)) = path?;
    let Json(values) = values?;
    let mut form = state.data_entry.open_form(&agent_id, date).await?;
    form.set_values(values);
    let record_id = form.submit(state.data_entry.gateway()).await?;

    Ok(Json(EntrySaved {
        record_id,
        form: form.into(),
    }))
}

/// Applies raw field inputs on top of the stored record, then saves
pub async fn patch_entry(
    path: Result<Path<(String, NaiveDate)>, PathRejection>,
    State(state): State<Arc<AppState>>,
    fields: Result<Json<HashMap<EntryField, Value>>, JsonRejection>,
) -> Result<Json<EntrySaved>, ApiError> {
    let Path((agent_id, date)) = path?;
    let Json(fields) = fields?;
    let mut form = state.data_entry.open_form(&agent_id, date).await?;
    for (field, raw) in fields {
        match raw {
            Value::String(text) => form.set_field(field, &text),
            other => form.set_field(field, &other.to_string()),
        }
    }
    let record_id = form.submit(state.data_entry.gateway()).await?;

    Ok(Json(EntrySaved {
        record_id,
        form: form.into(),
    }))
}
