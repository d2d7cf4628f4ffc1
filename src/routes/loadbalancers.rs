//! Load balancer TLS and type reports with drill-downs.
//!
//! Both reports anchor the snapshot date on the v2 load balancer collection
//! and read the listener and classic collections at that same date.

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
use crate::store::{Collection, ResourceDoc, SnapshotDate};

use super::{boundary, display_date, encode_query};

// ============================================================================
// Query Params
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TlsDetailsQuery {
    #[serde(default)]
    pub team: String,
    #[serde(rename = "tlsVersion", default)]
    pub tls_version: String,
    #[serde(default)]
    pub search: String,
    #[serde(default = "super::first_page")]
    pub page: usize,
}

#[derive(Debug, Deserialize)]
pub struct TypeDetailsQuery {
    #[serde(default)]
    pub team: String,
    #[serde(rename = "type", default)]
    pub lb_type: String,
    #[serde(default)]
    pub search: String,
    #[serde(default = "super::first_page")]
    pub page: usize,
}

// ============================================================================
// Handlers
// ============================================================================

async fn fetch_lb_docs(
    state: &AppState,
    fail: &impl Fn(crate::error::ReportError) -> StatusCode,
) -> Result<(SnapshotDate, Vec<ResourceDoc>, Vec<ResourceDoc>, Vec<ResourceDoc>), StatusCode> {
    let date = state.store.latest_date(Collection::ElbV2).await.map_err(fail)?;
    let v2 = state.store.fetch(Collection::ElbV2, date).await.map_err(fail)?;
    let classic = state
        .store
        .fetch(Collection::ElbClassic, date)
        .await
        .map_err(fail)?;
    let listeners = state
        .store
        .fetch(Collection::ElbV2Listeners, date)
        .await
        .map_err(fail)?;
    Ok((date, v2, classic, listeners))
}

/// GET /compliance/loadbalancers/tls - TLS policy usage by team
pub async fn tls_report(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let fail = boundary("GET /compliance/loadbalancers/tls");
    let (date, v2, classic, listeners) = fetch_lb_docs(&state, &fail).await?;

    let summaries = aggregate::aggregate_tls(&v2, &classic, &listeners, &state.teams);

    let html = state
        .presenter
        .render(
            "tls",
            &json!({
                "title": "Load Balancer TLS",
                "date": display_date(date),
                "teams": summaries,
            }),
        )
        .map_err(fail)?;
    Ok(Html(html))
}

/// GET /compliance/loadbalancers/details - LBs under one TLS dimension
pub async fn tls_details(
    State(state): State<AppState>,
    Query(params): Query<TlsDetailsQuery>,
) -> Result<Html<String>, StatusCode> {
    let fail = boundary("GET /compliance/loadbalancers/details");
    let (date, v2, classic, listeners) = fetch_lb_docs(&state, &fail).await?;

    let page = detail::tls_details(
        &v2,
        &classic,
        &listeners,
        &state.teams,
        &params.team,
        &params.tls_version,
        &params.search,
        params.page,
    );

    let base_query = format!(
        "/compliance/loadbalancers/details?team={}&tlsVersion={}&search={}",
        encode_query(&params.team),
        encode_query(&params.tls_version),
        encode_query(&params.search),
    );

    let html = state
        .presenter
        .render(
            "details",
            &json!({
                "title": "TLS Details",
                "subtitle": format!("{} / {}", params.team, params.tls_version),
                "date": display_date(date),
                "back_url": "/compliance/loadbalancers/tls",
                "base_query": base_query,
                "search": params.search,
                "search_action": "/compliance/loadbalancers/details",
                "search_fields": [
                    json!({ "name": "team", "value": params.team }),
                    json!({ "name": "tlsVersion", "value": params.tls_version }),
                ],
                "items": page.items,
                "pagination": page.pagination,
            }),
        )
        .map_err(fail)?;
    Ok(Html(html))
}

/// GET /compliance/loadbalancers/types - LB counts by type by team
pub async fn types_report(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let fail = boundary("GET /compliance/loadbalancers/types");
    let (date, v2, classic, _) = fetch_lb_docs(&state, &fail).await?;

    let summaries = aggregate::aggregate_lb_types(&v2, &classic, &state.teams);

    let html = state
        .presenter
        .render(
            "lb_types",
            &json!({
                "title": "Load Balancer Types",
                "date": display_date(date),
                "teams": summaries,
            }),
        )
        .map_err(fail)?;
    Ok(Html(html))
}

/// GET /compliance/loadbalancers/types/details - LBs of one stored type
pub async fn type_details(
    State(state): State<AppState>,
    Query(params): Query<TypeDetailsQuery>,
) -> Result<Html<String>, StatusCode> {
    let fail = boundary("GET /compliance/loadbalancers/types/details");
    let (date, v2, classic, _) = fetch_lb_docs(&state, &fail).await?;

    let page = detail::lb_type_details(
        &v2,
        &classic,
        &state.teams,
        &params.team,
        &params.lb_type,
        &params.search,
        params.page,
    );

    let base_query = format!(
        "/compliance/loadbalancers/types/details?team={}&type={}&search={}",
        encode_query(&params.team),
        encode_query(&params.lb_type),
        encode_query(&params.search),
    );

    let html = state
        .presenter
        .render(
            "details",
            &json!({
                "title": "Load Balancer Type Details",
                "subtitle": format!("{} / {}", params.team, params.lb_type),
                "date": display_date(date),
                "back_url": "/compliance/loadbalancers/types",
                "base_query": base_query,
                "search": params.search,
                "search_action": "/compliance/loadbalancers/types/details",
                "search_fields": [
                    json!({ "name": "team", "value": params.team }),
                    json!({ "name": "type", "value": params.lb_type }),
                ],
                "items": page.items,
                "pagination": page.pagination,
            }),
        )
        .map_err(fail)?;
    Ok(Html(html))
}
