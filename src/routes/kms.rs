//! KMS key age report. Summary only; there is no drill-down for key ages.

use axum::{extract::State, http::StatusCode, response::Html};
use chrono::Utc;
use serde_json::json;

use crate::aggregate;
use crate::state::AppState;
use crate::store::Collection;

use super::{boundary, display_date};

/// GET /compliance/kms - key age buckets by team
pub async fn report(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let fail = boundary("GET /compliance/kms");

    let date = state
        .store
        .latest_date(Collection::KmsKeyMetadata)
        .await
        .map_err(fail)?;
    let docs = state
        .store
        .fetch(Collection::KmsKeyMetadata, date)
        .await
        .map_err(fail)?;

    let summaries = aggregate::aggregate_kms(&docs, &state.teams, Utc::now());

    let html = state
        .presenter
        .render(
            "kms",
            &json!({
                "title": "KMS Key Ages",
                "date": display_date(date),
                "teams": summaries,
            }),
        )
        .map_err(fail)?;
    Ok(Html(html))
}
