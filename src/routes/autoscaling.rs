//! Autoscaling group reports: capacity dimensions and empty groups.

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

#[derive(Debug, Deserialize)]
pub struct DimensionDetailsQuery {
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub min: i64,
    #[serde(default)]
    pub max: i64,
    #[serde(default)]
    pub desired: i64,
    #[serde(default)]
    pub search: String,
    #[serde(default = "super::first_page")]
    pub page: usize,
}

/// GET /compliance/autoscaling/dimensions - capacity triples by team
pub async fn dimensions_report(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let fail = boundary("GET /compliance/autoscaling/dimensions");

    let date = state
        .store
        .latest_date(Collection::AutoscalingGroups)
        .await
        .map_err(fail)?;
    let docs = state
        .store
        .fetch(Collection::AutoscalingGroups, date)
        .await
        .map_err(fail)?;

    let summaries = aggregate::aggregate_asg_dimensions(&docs, &state.teams);

    let html = state
        .presenter
        .render(
            "asg_dimensions",
            &json!({
                "title": "Autoscaling Dimensions",
                "date": display_date(date),
                "teams": summaries,
            }),
        )
        .map_err(fail)?;
    Ok(Html(html))
}

/// GET /compliance/autoscaling/dimensions/details - ASGs of one triple
pub async fn dimension_details(
    State(state): State<AppState>,
    Query(params): Query<DimensionDetailsQuery>,
) -> Result<Html<String>, StatusCode> {
    let fail = boundary("GET /compliance/autoscaling/dimensions/details");

    let date = state
        .store
        .latest_date(Collection::AutoscalingGroups)
        .await
        .map_err(fail)?;
    let docs = state
        .store
        .fetch(Collection::AutoscalingGroups, date)
        .await
        .map_err(fail)?;

    let page = detail::asg_dimension_details(
        &docs,
        &state.teams,
        &params.team,
        params.min,
        params.max,
        params.desired,
        &params.search,
        params.page,
    );

    let base_query = format!(
        "/compliance/autoscaling/dimensions/details?team={}&min={}&max={}&desired={}&search={}",
        encode_query(&params.team),
        params.min,
        params.max,
        params.desired,
        encode_query(&params.search),
    );

    let html = state
        .presenter
        .render(
            "details",
            &json!({
                "title": "Autoscaling Details",
                "subtitle": format!(
                    "{} / min {} max {} desired {}",
                    params.team, params.min, params.max, params.desired
                ),
                "date": display_date(date),
                "back_url": "/compliance/autoscaling/dimensions",
                "base_query": base_query,
                "search": params.search,
                "search_action": "/compliance/autoscaling/dimensions/details",
                "search_fields": [
                    json!({ "name": "team", "value": params.team }),
                    json!({ "name": "min", "value": params.min }),
                    json!({ "name": "max", "value": params.max }),
                    json!({ "name": "desired", "value": params.desired }),
                ],
                "items": page.items,
                "pagination": page.pagination,
            }),
        )
        .map_err(fail)?;
    Ok(Html(html))
}

/// GET /compliance/autoscaling/empty - ASGs with no running instances
pub async fn empty_report(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let fail = boundary("GET /compliance/autoscaling/empty");

    let date = state
        .store
        .latest_date(Collection::AutoscalingGroups)
        .await
        .map_err(fail)?;
    let docs = state
        .store
        .fetch(Collection::AutoscalingGroups, date)
        .await
        .map_err(fail)?;

    let summaries = aggregate::aggregate_asg_empty(&docs, &state.teams);

    let html = state
        .presenter
        .render(
            "asg_empty",
            &json!({
                "title": "Empty Autoscaling Groups",
                "date": display_date(date),
                "teams": summaries,
            }),
        )
        .map_err(fail)?;
    Ok(Html(html))
}
