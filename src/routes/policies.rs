//! Markdown-backed policy documentation pages.
//!
//! Policy documents live as `.md` files under `MARKDOWN_ROOT` and are
//! rendered to HTML per request; a missing document is a 404 page, not a
//! report failure.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use pulldown_cmark::{html, Options, Parser};
use serde_json::json;

use crate::state::AppState;

use super::boundary;

/// GET /policies - list the available policy documents
pub async fn landing(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let fail = boundary("GET /policies");

    let mut policies: Vec<String> = Vec::new();
    match tokio::fs::read_dir(&state.markdown_root).await {
        Ok(mut entries) => {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if let Some(stem) = name.strip_suffix(".md") {
                    policies.push(stem.to_string());
                }
            }
        }
        Err(e) => {
            tracing::warn!(
                "cannot list policy documents in {}: {}",
                state.markdown_root.display(),
                e
            );
        }
    }
    policies.sort();

    let html = state
        .presenter
        .render(
            "policies",
            &json!({ "title": "Policies", "policies": policies }),
        )
        .map_err(fail)?;
    Ok(Html(html))
}

/// GET /policies/:policy - one policy document rendered from Markdown
pub async fn show(
    State(state): State<AppState>,
    Path(policy): Path<String>,
) -> Result<Response, StatusCode> {
    let fail = boundary("GET /policies/:policy");

    // The path segment is a bare document name, never a relative path.
    if policy.contains('/') || policy.contains('\\') || policy.contains("..") {
        return not_found(&state, &policy).map_err(fail);
    }

    let path = state.markdown_root.join(format!("{}.md", policy));
    let markdown = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return not_found(&state, &policy).map_err(fail);
        }
        Err(e) => {
            tracing::error!("cannot read policy document {}: {}", path.display(), e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let html = state
        .presenter
        .render(
            "policy",
            &json!({
                "title": policy,
                "content": markdown_to_html(&markdown),
            }),
        )
        .map_err(fail)?;
    Ok(Html(html).into_response())
}

fn not_found(state: &AppState, policy: &str) -> crate::error::ReportResult<Response> {
    let html = state.presenter.render(
        "not_found",
        &json!({
            "title": "Policy Not Found",
            "path": format!("/policies/{}", policy),
        }),
    )?;
    Ok((StatusCode::NOT_FOUND, Html(html)).into_response())
}

fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_renders_headings_and_tables() {
        let html = markdown_to_html("# Tagging\n\n| Tag | Rule |\n|---|---|\n| PRCode | present |\n");
        assert!(html.contains("<h1>"));
        assert!(html.contains("<table>"));
    }
}
