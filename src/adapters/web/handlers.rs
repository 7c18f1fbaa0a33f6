//! HTTP request handlers for web adapter.

use askama::Template;
use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use crate::domain::controller::{self, DashboardView, Selection, SelectionOptions};

use super::query::parse_selection;
use super::templates::{
    ChartsTemplate, ChartsView, Controls, DashboardFragmentTemplate, DashboardTemplate,
    OptionsTemplate,
};
use super::{AppState, WebError, is_htmx_request};

type Pairs = Query<Vec<(String, String)>>;

fn selection(state: &AppState, pairs: &[(String, String)]) -> Result<Selection, WebError> {
    let selection = parse_selection(pairs, &state.settings)?;
    tracing::debug!(?selection, "selection decoded");
    Ok(selection)
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(pairs): Pairs,
) -> Result<Response, WebError> {
    let selection = selection(&state, &pairs)?;
    let dataset = state.store.snapshot();

    let controls = Controls::new(&controller::options(&dataset, &selection), &selection);
    let charts = ChartsView::new(&controller::render(&dataset, &selection), &selection);

    let html = if is_htmx_request(&headers) {
        DashboardFragmentTemplate {
            controls: &controls,
            charts: &charts,
        }
        .render()?
    } else {
        let source = state.data_port.describe();
        DashboardTemplate {
            source: &source,
            dataset_rows: dataset.len(),
            controls: &controls,
            charts: &charts,
        }
        .render()?
    };
    Ok(Html(html).into_response())
}

pub async fn options_fragment(
    State(state): State<Arc<AppState>>,
    Query(pairs): Pairs,
) -> Result<Html<String>, WebError> {
    let selection = selection(&state, &pairs)?;
    let dataset = state.store.snapshot();
    let controls = Controls::new(&controller::options(&dataset, &selection), &selection);
    Ok(Html(OptionsTemplate { controls: &controls }.render()?))
}

pub async fn charts_fragment(
    State(state): State<Arc<AppState>>,
    Query(pairs): Pairs,
) -> Result<Html<String>, WebError> {
    let selection = selection(&state, &pairs)?;
    let dataset = state.store.snapshot();
    let charts = ChartsView::new(&controller::render(&dataset, &selection), &selection);
    Ok(Html(ChartsTemplate { charts: &charts }.render()?))
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub selection: Selection,
    pub options: SelectionOptions,
}

pub async fn options_json(
    State(state): State<Arc<AppState>>,
    Query(pairs): Pairs,
) -> Result<Json<OptionsResponse>, WebError> {
    let selection = selection(&state, &pairs)?;
    let dataset = state.store.snapshot();
    let options = controller::options(&dataset, &selection);
    Ok(Json(OptionsResponse { selection, options }))
}

#[derive(Debug, Serialize)]
pub struct ChartsResponse {
    pub selection: Selection,
    pub view: DashboardView,
}

pub async fn charts_json(
    State(state): State<Arc<AppState>>,
    Query(pairs): Pairs,
) -> Result<Json<ChartsResponse>, WebError> {
    let selection = selection(&state, &pairs)?;
    let dataset = state.store.snapshot();
    let view = controller::render(&dataset, &selection);
    Ok(Json(ChartsResponse { selection, view }))
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub rows: usize,
    pub previous_rows: usize,
    pub contracts: usize,
}

/// Re-read the data source and swap the snapshot. On failure the previous
/// snapshot stays in place.
pub async fn reload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let data_port = Arc::clone(&state.data_port);
    let schema = state.settings.schema.clone();
    let loaded = tokio::task::spawn_blocking(move || data_port.load_dataset(&schema))
        .await
        .map_err(|e| WebError::internal(format!("reload task failed: {e}")))?;

    let dataset = match loaded {
        Ok(dataset) => dataset,
        Err(err) => {
            tracing::warn!(error = %err, "reload failed, keeping previous snapshot");
            return Err(err.into());
        }
    };

    let rows = dataset.len();
    let contracts = dataset.contract_order().len();
    let previous = state.store.replace(dataset);
    tracing::info!(rows, previous_rows = previous.len(), "dataset reloaded");

    if is_htmx_request(&headers) {
        return Ok(Html(format!(
            "<span id=\"reload-status\">Reloaded {rows} rows</span>"
        ))
        .into_response());
    }
    Ok(Json(ReloadResponse {
        rows,
        previous_rows: previous.len(),
        contracts,
    })
    .into_response())
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub rows: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        rows: state.store.snapshot().len(),
    })
}

pub async fn not_found() -> WebError {
    WebError::not_found("Page not found")
}
