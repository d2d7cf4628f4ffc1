//! Snapshot selection and document store access.
//!
//! Each resource category is a distinct Postgres table holding one row per
//! resource per ingestion run, with the ingestion date as a `(year, month,
//! day)` triple and the category payload as JSONB. Reports only ever look at
//! the maximum date present in a category's table; an empty table is an
//! error for that report, not an empty page.

use serde::Serialize;
use sqlx::PgPool;

use crate::error::{ReportError, ReportResult};

// ============================================================================
// Collections
// ============================================================================

/// The per-category snapshot tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Tags,
    ElbV2,
    ElbV2Listeners,
    ElbClassic,
    Rds,
    RedshiftClusters,
    KmsKeyMetadata,
    AutoscalingGroups,
}

impl Collection {
    pub fn table(self) -> &'static str {
        match self {
            Collection::Tags => "tags",
            Collection::ElbV2 => "elb_v2",
            Collection::ElbV2Listeners => "elb_v2_listeners",
            Collection::ElbClassic => "elb_classic",
            Collection::Rds => "rds",
            Collection::RedshiftClusters => "redshift_clusters",
            Collection::KmsKeyMetadata => "kms_key_metadata",
            Collection::AutoscalingGroups => "autoscaling_groups",
        }
    }
}

// ============================================================================
// Rows
// ============================================================================

/// One ingestion snapshot date. Ordering is lexicographic by year, month,
/// day, which the derived `Ord` provides with this field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, sqlx::FromRow)]
pub struct SnapshotDate {
    pub year: i32,
    pub month: i32,
    pub day: i32,
}

/// A snapshot document, projected to the fields the aggregator needs.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResourceDoc {
    pub account_id: String,
    pub resource_id: String,
    pub resource_type: Option<String>,
    pub configuration: serde_json::Value,
}

// ============================================================================
// Store
// ============================================================================

/// Read-only access to the snapshot tables. Connections are checked out of
/// the shared pool per query and released on every exit path.
#[derive(Clone)]
pub struct SnapshotStore {
    pool: PgPool,
}

impl SnapshotStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Most recent `(year, month, day)` present in the collection.
    pub async fn latest_date(&self, collection: Collection) -> ReportResult<SnapshotDate> {
        let sql = format!(
            "SELECT year, month, day FROM {} ORDER BY year DESC, month DESC, day DESC LIMIT 1",
            collection.table()
        );
        let latest: Option<SnapshotDate> = sqlx::query_as(&sql).fetch_optional(&self.pool).await?;
        latest.ok_or(ReportError::NoData {
            collection: collection.table(),
        })
    }

    /// All documents for one snapshot date, projected to the aggregate
    /// fields. Every request re-scans; there is no cross-request cache.
    pub async fn fetch(
        &self,
        collection: Collection,
        date: SnapshotDate,
    ) -> ReportResult<Vec<ResourceDoc>> {
        let sql = format!(
            "SELECT account_id, resource_id, resource_type, configuration \
             FROM {} WHERE year = $1 AND month = $2 AND day = $3",
            collection.table()
        );
        let docs = sqlx::query_as(&sql)
            .bind(date.year)
            .bind(date.month)
            .bind(date.day)
            .fetch_all(&self.pool)
            .await?;
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_dates_order_by_year_then_month_then_day() {
        let a = SnapshotDate {
            year: 2025,
            month: 12,
            day: 31,
        };
        let b = SnapshotDate {
            year: 2026,
            month: 1,
            day: 1,
        };
        let c = SnapshotDate {
            year: 2026,
            month: 1,
            day: 2,
        };
        assert!(a < b);
        assert!(b < c);
        assert_eq!([c, a, b].iter().max(), Some(&c));
    }
}
