//! Error handling for report generation.
//!
//! Domain errors use thiserror; route handlers convert them to a uniform
//! status code at the request boundary after logging. No partial aggregates
//! are ever returned on failure.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors raised while producing a report.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("no data found in {collection} collection")]
    NoData { collection: &'static str },

    #[error("document store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("template render error: {0}")]
    Template(#[from] handlebars::RenderError),
}

impl ReportError {
    /// Status the request boundary maps this error to. Every scan failure is
    /// a 500 for the whole report, never a silently empty page.
    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
