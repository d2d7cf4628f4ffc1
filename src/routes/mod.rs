//! HTTP surface.
//!
//! Routes:
//! - GET /                                        - landing page
//! - GET /api/health                              - liveness check
//! - GET /compliance/tagging(/teams|/details)     - mandatory tag report
//! - GET /compliance/loadbalancers/...            - TLS and type reports
//! - GET /compliance/database(/details)           - engine/version report
//! - GET /compliance/kms                          - key age report
//! - GET /compliance/autoscaling/...              - dimension and empty reports
//! - GET /policies(/:policy)                      - Markdown policy documents

pub mod autoscaling;
pub mod database;
pub mod kms;
pub mod loadbalancers;
pub mod policies;
pub mod tagging;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Json, Redirect},
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ReportError;
use crate::state::AppState;
use crate::store::SnapshotDate;

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(landing))
        .route("/api/health", get(health))
        .route(
            "/compliance/tagging",
            get(|| async { Redirect::to("/compliance/tagging/teams") }),
        )
        .route("/compliance/tagging/teams", get(tagging::teams_report))
        .route("/compliance/tagging/details", get(tagging::details))
        .route(
            "/compliance/loadbalancers",
            get(|| async { Redirect::to("/compliance/loadbalancers/tls") }),
        )
        .route("/compliance/loadbalancers/tls", get(loadbalancers::tls_report))
        .route("/compliance/loadbalancers/details", get(loadbalancers::tls_details))
        .route("/compliance/loadbalancers/types", get(loadbalancers::types_report))
        .route(
            "/compliance/loadbalancers/types/details",
            get(loadbalancers::type_details),
        )
        .route("/compliance/database", get(database::report))
        .route("/compliance/database/details", get(database::details))
        .route("/compliance/kms", get(kms::report))
        .route(
            "/compliance/autoscaling",
            get(|| async { Redirect::to("/compliance/autoscaling/dimensions") }),
        )
        .route(
            "/compliance/autoscaling/dimensions",
            get(autoscaling::dimensions_report),
        )
        .route(
            "/compliance/autoscaling/dimensions/details",
            get(autoscaling::dimension_details),
        )
        .route("/compliance/autoscaling/empty", get(autoscaling::empty_report))
        .route("/policies", get(policies::landing))
        .route("/policies/:policy", get(policies::show))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

// ============================================================================
// Shared handler plumbing
// ============================================================================

/// Log a report failure at the boundary and collapse it to its status code.
pub(crate) fn boundary(route: &'static str) -> impl Fn(ReportError) -> StatusCode + Copy {
    move |e| {
        tracing::error!("{} failed: {}", route, e);
        e.status()
    }
}

/// Default for the 1-indexed `page` query parameter.
pub(crate) fn first_page() -> usize {
    1
}

/// Percent-encode one query-string value for the links handlers construct.
pub(crate) fn encode_query(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Snapshot date as shown in page headers.
pub(crate) fn display_date(date: SnapshotDate) -> String {
    format!("{}-{:02}-{:02}", date.year, date.month, date.day)
}

// ============================================================================
// Handlers
// ============================================================================

async fn landing(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let html = state
        .presenter
        .render("index", &json!({ "title": "AWS Inventory Compliance" }))
        .map_err(boundary("GET /"))?;
    Ok(Html(html))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "inventory-dashboard",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::config::TeamDirectory;
    use crate::render::Presenter;

    // A lazy pool never connects unless a query runs, so routes that do not
    // touch the store are testable without a database.
    fn app() -> Router {
        let pool = sqlx::PgPool::connect_lazy("postgresql://localhost/aws_inventory")
            .expect("lazy pool options are valid");
        let state = AppState::new(
            pool,
            TeamDirectory::default(),
            Presenter::new().expect("embedded templates register"),
            "markdown".into(),
        );
        create_router(state)
    }

    #[tokio::test]
    async fn health_endpoint_responds_ok() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn landing_page_renders_without_the_store() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn category_roots_redirect_to_their_reports() {
        for (from, to) in [
            ("/compliance/tagging", "/compliance/tagging/teams"),
            ("/compliance/loadbalancers", "/compliance/loadbalancers/tls"),
            ("/compliance/autoscaling", "/compliance/autoscaling/dimensions"),
        ] {
            let response = app()
                .oneshot(Request::builder().uri(from).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(
                response
                    .headers()
                    .get("location")
                    .and_then(|v| v.to_str().ok()),
                Some(to)
            );
        }
    }
}
