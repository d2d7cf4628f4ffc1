//! Database engine/version report and drill-down.
//!
//! The snapshot date anchors on the RDS collection; Redshift clusters are
//! read at that same date and grouped under the `redshift` engine.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
};
use serde::Deserialize;
use serde_json::json;

use crate::aggregate;
use crate::compliance;
use crate::detail;
use crate::state::AppState;
use crate::store::Collection;

use super::{boundary, display_date, encode_query};

#[derive(Debug, Deserialize)]
pub struct DetailsQuery {
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub engine: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub search: String,
    #[serde(default = "super::first_page")]
    pub page: usize,
}

/// GET /compliance/database - engine/version counts by team
pub async fn report(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let fail = boundary("GET /compliance/database");

    let date = state.store.latest_date(Collection::Rds).await.map_err(fail)?;
    let rds = state.store.fetch(Collection::Rds, date).await.map_err(fail)?;
    let redshift = state
        .store
        .fetch(Collection::RedshiftClusters, date)
        .await
        .map_err(fail)?;

    let summaries = aggregate::aggregate_databases(&rds, &redshift, &state.teams);

    let teams: Vec<serde_json::Value> = summaries
        .iter()
        .map(|s| {
            let engines: Vec<serde_json::Value> = s
                .engines
                .iter()
                .map(|e| {
                    json!({
                        "engine": e.engine,
                        "version": e.version,
                        "count": e.count,
                        "warnings": compliance::database_deprecations(&e.engine, &e.version),
                    })
                })
                .collect();
            json!({ "team": s.team, "engines": engines })
        })
        .collect();

    let html = state
        .presenter
        .render(
            "database",
            &json!({
                "title": "Database Versions",
                "date": display_date(date),
                "teams": teams,
            }),
        )
        .map_err(fail)?;
    Ok(Html(html))
}

/// GET /compliance/database/details - databases of one engine/version
pub async fn details(
    State(state): State<AppState>,
    Query(params): Query<DetailsQuery>,
) -> Result<Html<String>, StatusCode> {
    let fail = boundary("GET /compliance/database/details");

    let date = state.store.latest_date(Collection::Rds).await.map_err(fail)?;
    let rds = state.store.fetch(Collection::Rds, date).await.map_err(fail)?;
    let redshift = state
        .store
        .fetch(Collection::RedshiftClusters, date)
        .await
        .map_err(fail)?;

    let page = detail::database_details(
        &rds,
        &redshift,
        &state.teams,
        &params.team,
        &params.engine,
        &params.version,
        &params.search,
        params.page,
    );

    let base_query = format!(
        "/compliance/database/details?team={}&engine={}&version={}&search={}",
        encode_query(&params.team),
        encode_query(&params.engine),
        encode_query(&params.version),
        encode_query(&params.search),
    );

    let html = state
        .presenter
        .render(
            "details",
            &json!({
                "title": "Database Details",
                "subtitle": format!("{} / {} {}", params.team, params.engine, params.version),
                "date": display_date(date),
                "back_url": "/compliance/database",
                "base_query": base_query,
                "search": params.search,
                "search_action": "/compliance/database/details",
                "search_fields": [
                    json!({ "name": "team", "value": params.team }),
                    json!({ "name": "engine", "value": params.engine }),
                    json!({ "name": "version", "value": params.version }),
                ],
                "items": page.items,
                "pagination": page.pagination,
            }),
        )
        .map_err(fail)?;
    Ok(Html(html))
}
