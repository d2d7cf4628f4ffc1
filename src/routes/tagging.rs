//! Mandatory tag compliance report and drill-down.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
};
use serde::Deserialize;
use serde_json::json;

use crate::aggregate;
use crate::detail;
use crate::state::AppState;
use crate::store::Collection;

use super::{boundary, display_date, encode_query};

// ============================================================================
// Query Params
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DetailsQuery {
    #[serde(default)]
    pub team: String,
    #[serde(rename = "resourceType", default)]
    pub resource_type: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub search: String,
    #[serde(default = "super::first_page")]
    pub page: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /compliance/tagging/teams - missing-tag counts by team and type
pub async fn teams_report(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let fail = boundary("GET /compliance/tagging/teams");

    let date = state.store.latest_date(Collection::Tags).await.map_err(fail)?;
    let docs = state.store.fetch(Collection::Tags, date).await.map_err(fail)?;
    let summaries = aggregate::aggregate_tagging(&docs, &state.teams, state.mandatory_tags);

    let teams: Vec<serde_json::Value> = summaries
        .iter()
        .map(|s| {
            json!({
                "team": s.team,
                "total_missing": s.total_missing(),
                "resource_types": s.resource_types,
            })
        })
        .collect();

    let html = state
        .presenter
        .render(
            "tagging",
            &json!({
                "title": "Tagging Compliance",
                "date": display_date(date),
                "teams": teams,
            }),
        )
        .map_err(fail)?;
    Ok(Html(html))
}

/// GET /compliance/tagging/details - resources failing one tag's rule
pub async fn details(
    State(state): State<AppState>,
    Query(params): Query<DetailsQuery>,
) -> Result<Html<String>, StatusCode> {
    let fail = boundary("GET /compliance/tagging/details");

    let date = state.store.latest_date(Collection::Tags).await.map_err(fail)?;
    let docs = state.store.fetch(Collection::Tags, date).await.map_err(fail)?;

    let page = detail::tagging_details(
        &docs,
        &state.teams,
        state.mandatory_tags,
        &params.team,
        &params.resource_type,
        &params.tag,
        &params.search,
        params.page,
    );

    let base_query = detail_base_query(&params);
    let fields = search_fields(&params);

    let html = state
        .presenter
        .render(
            "details",
            &json!({
                "title": "Tagging Details",
                "subtitle": format!("{} / {} / {}", params.team, params.resource_type, params.tag),
                "date": display_date(date),
                "back_url": "/compliance/tagging/teams",
                "base_query": base_query,
                "search": params.search,
                "search_action": "/compliance/tagging/details",
                "search_fields": fields,
                "items": page.items,
                "pagination": page.pagination,
            }),
        )
        .map_err(fail)?;
    Ok(Html(html))
}

fn detail_base_query(params: &DetailsQuery) -> String {
    format!(
        "/compliance/tagging/details?team={}&resourceType={}&tag={}&search={}",
        encode_query(&params.team),
        encode_query(&params.resource_type),
        encode_query(&params.tag),
        encode_query(&params.search),
    )
}

fn search_fields(params: &DetailsQuery) -> Vec<serde_json::Value> {
    vec![
        json!({ "name": "team", "value": params.team }),
        json!({ "name": "resourceType", "value": params.resource_type }),
        json!({ "name": "tag", "value": params.tag }),
    ]
}
