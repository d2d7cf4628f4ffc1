//! Shared per-process state handed to every handler.

use std::path::PathBuf;
use std::sync::Arc;

use sqlx::PgPool;

use crate::config::{MandatoryTag, TeamDirectory, MANDATORY_TAGS};
use crate::render::Presenter;
use crate::store::SnapshotStore;

/// Immutable after startup; cloned into each request handler.
#[derive(Clone)]
pub struct AppState {
    pub store: SnapshotStore,
    pub teams: Arc<TeamDirectory>,
    pub mandatory_tags: &'static [MandatoryTag],
    pub presenter: Arc<Presenter>,
    pub markdown_root: PathBuf,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        teams: TeamDirectory,
        presenter: Presenter,
        markdown_root: PathBuf,
    ) -> Self {
        Self {
            store: SnapshotStore::new(pool),
            teams: Arc::new(teams),
            mandatory_tags: MANDATORY_TAGS,
            presenter: Arc::new(presenter),
            markdown_root,
        }
    }
}
