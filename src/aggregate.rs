//! The resource aggregator: one pass per category over the latest snapshot.
//!
//! Every category follows the same shape — exclusion rule, team resolution,
//! dedupe, dimension extraction via the compliance evaluator, counter
//! increment — so the team bookkeeping lives in one [`TeamAccumulator`] and
//! each category supplies its own dimension logic. Summaries with nothing
//! notable are pruned; sort keys are category-specific. All state is owned by
//! the pass and discarded with the response.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::compliance::{
    self, AgeBucket, NO_CERTS,
};
use crate::config::{MandatoryTag, TeamDirectory};
use crate::model::{
    decode, AsgConfig, ClassicLbConfig, ElbV2Config, KmsKeyConfig, ListenerConfig, RdsConfig,
    RedshiftConfig, TagListConfig,
};
use crate::store::ResourceDoc;

// ============================================================================
// Team accumulator
// ============================================================================

/// Insertion-ordered per-team records with a per-team dedupe set, scoped to
/// one aggregation pass.
pub struct TeamAccumulator<T> {
    records: Vec<TeamRecord<T>>,
}

struct TeamRecord<T> {
    team: String,
    seen: HashSet<String>,
    data: T,
}

impl<T: Default> TeamAccumulator<T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// The team's record, creating it on first encounter. When `dedupe_key`
    /// is given and was already counted for this team, returns `None` so the
    /// document contributes nothing further.
    pub fn record(&mut self, team: &str, dedupe_key: Option<&str>) -> Option<&mut T> {
        let idx = match self.records.iter().position(|r| r.team == team) {
            Some(idx) => idx,
            None => {
                self.records.push(TeamRecord {
                    team: team.to_string(),
                    seen: HashSet::new(),
                    data: T::default(),
                });
                self.records.len() - 1
            }
        };
        let rec = &mut self.records[idx];
        if let Some(key) = dedupe_key {
            if !rec.seen.insert(key.to_string()) {
                return None;
            }
        }
        Some(&mut rec.data)
    }

    /// Drain into `(team, data)` pairs in first-encounter order.
    pub fn into_entries(self) -> Vec<(String, T)> {
        self.records.into_iter().map(|r| (r.team, r.data)).collect()
    }
}

impl<T: Default> Default for TeamAccumulator<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Increment a count keyed by `key` in an insertion-ordered counter list.
fn bump(counts: &mut Vec<(String, u64)>, key: &str) {
    match counts.iter().position(|(k, _)| k == key) {
        Some(i) => counts[i].1 += 1,
        None => counts.push((key.to_string(), 1)),
    }
}

// ============================================================================
// Tagging
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TeamTagSummary {
    pub team: String,
    pub resource_types: Vec<ResourceTypeTagSummary>,
}

#[derive(Debug, Serialize)]
pub struct ResourceTypeTagSummary {
    pub resource_type: String,
    pub tags: Vec<TagMissingCount>,
}

#[derive(Debug, Serialize)]
pub struct TagMissingCount {
    pub tag_name: &'static str,
    pub missing_count: u64,
    pub has_missing: bool,
}

impl TeamTagSummary {
    pub fn total_missing(&self) -> u64 {
        self.resource_types
            .iter()
            .flat_map(|rt| rt.tags.iter())
            .map(|t| t.missing_count)
            .sum()
    }
}

/// Per-account log buckets are ingestion artifacts: a `bucket` resource whose
/// ARN segment after `:::` starts with a 12-digit account number is excluded
/// from tagging entirely.
pub fn excluded_from_tagging(doc: &ResourceDoc) -> bool {
    doc.resource_type.as_deref() == Some("bucket") && bucket_name_has_account_prefix(&doc.resource_id)
}

fn bucket_name_has_account_prefix(arn: &str) -> bool {
    let name = arn.split_once(":::").map(|(_, rest)| rest).unwrap_or("");
    name.len() >= 12 && name.as_bytes()[..12].iter().all(u8::is_ascii_digit)
}

#[derive(Default)]
struct TagBuckets {
    // (resource type, per-mandatory-tag missing counts)
    by_type: Vec<(String, Vec<u64>)>,
}

/// Aggregate missing-tag counts by team and resource type. Dedupe is per
/// team, keyed by resource id; teams with nothing missing are pruned and the
/// rest sort by total missing descending.
pub fn aggregate_tagging(
    docs: &[ResourceDoc],
    teams: &TeamDirectory,
    mandatory: &[MandatoryTag],
) -> Vec<TeamTagSummary> {
    let mut acc: TeamAccumulator<TagBuckets> = TeamAccumulator::new();

    for doc in docs {
        if excluded_from_tagging(doc) {
            continue;
        }
        let team = teams.resolve(&doc.account_id);
        let Some(buckets) = acc.record(team, Some(&doc.resource_id)) else {
            continue;
        };

        let resource_type = doc.resource_type.as_deref().unwrap_or("Unknown");
        let idx = match buckets.by_type.iter().position(|(rt, _)| rt == resource_type) {
            Some(idx) => idx,
            None => {
                buckets
                    .by_type
                    .push((resource_type.to_string(), vec![0; mandatory.len()]));
                buckets.by_type.len() - 1
            }
        };
        let counts = &mut buckets.by_type[idx].1;

        let tags = decode::<TagListConfig>(&doc.configuration).by_lower_key();
        for (i, tag) in mandatory.iter().enumerate() {
            if tag.violation(&tags).is_some() {
                counts[i] += 1;
            }
        }
    }

    let mut summaries: Vec<TeamTagSummary> = acc
        .into_entries()
        .into_iter()
        .map(|(team, buckets)| TeamTagSummary {
            team,
            resource_types: buckets
                .by_type
                .into_iter()
                .map(|(resource_type, counts)| ResourceTypeTagSummary {
                    resource_type,
                    tags: mandatory
                        .iter()
                        .zip(counts)
                        .map(|(tag, missing_count)| TagMissingCount {
                            tag_name: tag.name,
                            missing_count,
                            has_missing: missing_count > 0,
                        })
                        .collect(),
                })
                .collect(),
        })
        .filter(|summary| summary.total_missing() > 0)
        .collect();

    summaries.sort_by(|a, b| b.total_missing().cmp(&a.total_missing()));
    summaries
}

// ============================================================================
// Load balancer TLS
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TeamTlsSummary {
    pub team: String,
    pub tls_versions: Vec<TlsVersionCount>,
    pub total_lbs: u64,
}

#[derive(Debug, Serialize)]
pub struct TlsVersionCount {
    pub version: String,
    pub count: u64,
    pub is_deprecated: bool,
    pub is_no_certs: bool,
}

#[derive(Default)]
struct TlsBuckets {
    versions: Vec<(String, u64)>,
    total_lbs: u64,
    // Distinct load balancers with at least one TLS-classified listener;
    // keeps the NO CERTS subtraction from going negative on multi-listener
    // load balancers.
    with_tls: HashSet<String>,
}

/// Aggregate TLS policy usage by team across v2 and classic load balancers.
/// `NO CERTS` is total load balancers minus distinct load balancers with a
/// TLS listener; a negative difference is a data bug and gets logged, never
/// clamped into the report.
pub fn aggregate_tls(
    v2_docs: &[ResourceDoc],
    classic_docs: &[ResourceDoc],
    listener_docs: &[ResourceDoc],
    teams: &TeamDirectory,
) -> Vec<TeamTlsSummary> {
    let mut acc: TeamAccumulator<TlsBuckets> = TeamAccumulator::new();

    for doc in v2_docs {
        if let Some(rec) = acc.record(teams.resolve(&doc.account_id), None) {
            rec.total_lbs += 1;
        }
    }

    for doc in classic_docs {
        let team = teams.resolve(&doc.account_id);
        let cfg: ClassicLbConfig = decode(&doc.configuration);
        let policies = compliance::classic_tls_policies(&cfg);
        if let Some(rec) = acc.record(team, None) {
            rec.total_lbs += 1;
            if !policies.is_empty() {
                rec.with_tls.insert(doc.resource_id.clone());
            }
            for policy in policies {
                bump(&mut rec.versions, &policy);
            }
        }
    }

    for doc in listener_docs {
        let team = teams.resolve(&doc.account_id);
        let cfg: ListenerConfig = decode(&doc.configuration);
        let Some(policy) = compliance::v2_listener_tls_policy(&cfg) else {
            continue;
        };
        let parent = cfg
            .load_balancer_arn
            .clone()
            .unwrap_or_else(|| doc.resource_id.clone());
        if let Some(rec) = acc.record(team, None) {
            rec.with_tls.insert(parent);
            bump(&mut rec.versions, &policy);
        }
    }

    acc.into_entries()
        .into_iter()
        .filter(|(_, rec)| rec.total_lbs > 0)
        .map(|(team, rec)| {
            let mut tls_versions: Vec<TlsVersionCount> = rec
                .versions
                .into_iter()
                .map(|(version, count)| TlsVersionCount {
                    is_deprecated: compliance::is_deprecated_tls_policy(&version),
                    is_no_certs: false,
                    version,
                    count,
                })
                .collect();

            let with_tls = rec.with_tls.len() as u64;
            if with_tls > rec.total_lbs {
                tracing::warn!(
                    team = %team,
                    total_lbs = rec.total_lbs,
                    with_tls,
                    "TLS-classified load balancers exceed total; snapshot is inconsistent"
                );
            } else if rec.total_lbs - with_tls > 0 {
                tls_versions.push(TlsVersionCount {
                    version: NO_CERTS.to_string(),
                    count: rec.total_lbs - with_tls,
                    is_deprecated: false,
                    is_no_certs: true,
                });
            }

            TeamTlsSummary {
                team,
                tls_versions,
                total_lbs: rec.total_lbs,
            }
        })
        .collect()
}

// ============================================================================
// Load balancer types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TeamLbTypeSummary {
    pub team: String,
    pub types: Vec<LbTypeCount>,
}

/// `lb_type` is the stored value and the opaque selector detail links carry;
/// `display` is the report-facing label.
#[derive(Debug, Serialize)]
pub struct LbTypeCount {
    pub lb_type: String,
    pub display: String,
    pub count: u64,
}

/// Report-facing label for a stored load balancer type.
pub fn display_lb_type(lb_type: &str) -> &str {
    match lb_type {
        "application" => "ALB",
        "network" => "NLB",
        "classic" => "Classic",
        other => other,
    }
}

#[derive(Default)]
struct TypeBuckets {
    types: Vec<(String, u64)>,
}

/// Count load balancers per type per team; classic load balancers all land
/// under the `classic` type.
pub fn aggregate_lb_types(
    v2_docs: &[ResourceDoc],
    classic_docs: &[ResourceDoc],
    teams: &TeamDirectory,
) -> Vec<TeamLbTypeSummary> {
    let mut acc: TeamAccumulator<TypeBuckets> = TeamAccumulator::new();

    for doc in v2_docs {
        let cfg: ElbV2Config = decode(&doc.configuration);
        let lb_type = cfg.lb_type.as_deref().unwrap_or("Unknown");
        if let Some(rec) = acc.record(teams.resolve(&doc.account_id), None) {
            bump(&mut rec.types, lb_type);
        }
    }

    for doc in classic_docs {
        if let Some(rec) = acc.record(teams.resolve(&doc.account_id), None) {
            bump(&mut rec.types, "classic");
        }
    }

    acc.into_entries()
        .into_iter()
        .filter(|(_, rec)| !rec.types.is_empty())
        .map(|(team, rec)| TeamLbTypeSummary {
            team,
            types: rec
                .types
                .into_iter()
                .map(|(lb_type, count)| LbTypeCount {
                    display: display_lb_type(&lb_type).to_string(),
                    lb_type,
                    count,
                })
                .collect(),
        })
        .collect()
}

// ============================================================================
// Databases
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TeamDatabaseSummary {
    pub team: String,
    pub engines: Vec<EngineVersionCount>,
}

#[derive(Debug, Serialize)]
pub struct EngineVersionCount {
    pub engine: String,
    pub version: String,
    pub count: u64,
}

#[derive(Default)]
struct EngineBuckets {
    // Keyed by the hyphen-joined "engine-version" grouping key.
    engines: Vec<(String, u64)>,
}

/// Grouping key for a database: engine and version joined with a literal
/// hyphen. Split back with [`split_engine_version`] only.
pub fn engine_version_key(engine: &str, version: &str) -> String {
    format!("{}-{}", engine, version)
}

/// Inverse of [`engine_version_key`]: split on the first hyphen only, since
/// versions may themselves contain hyphens.
pub fn split_engine_version(key: &str) -> (&str, &str) {
    key.split_once('-').unwrap_or((key, ""))
}

/// Count databases per engine+version per team. RDS instances use their
/// engine/version; Redshift clusters group under the `redshift` engine.
pub fn aggregate_databases(
    rds_docs: &[ResourceDoc],
    redshift_docs: &[ResourceDoc],
    teams: &TeamDirectory,
) -> Vec<TeamDatabaseSummary> {
    let mut acc: TeamAccumulator<EngineBuckets> = TeamAccumulator::new();

    for doc in rds_docs {
        let cfg: RdsConfig = decode(&doc.configuration);
        let engine = cfg.engine.as_deref().unwrap_or("Unknown");
        let version = cfg.engine_version.as_deref().unwrap_or("Unknown");
        if let Some(rec) = acc.record(teams.resolve(&doc.account_id), None) {
            bump(&mut rec.engines, &engine_version_key(engine, version));
        }
    }

    for doc in redshift_docs {
        let cfg: RedshiftConfig = decode(&doc.configuration);
        let version = cfg.cluster_version.as_deref().unwrap_or("Unknown");
        if let Some(rec) = acc.record(teams.resolve(&doc.account_id), None) {
            bump(&mut rec.engines, &engine_version_key("redshift", version));
        }
    }

    acc.into_entries()
        .into_iter()
        .filter(|(_, rec)| !rec.engines.is_empty())
        .map(|(team, rec)| TeamDatabaseSummary {
            team,
            engines: rec
                .engines
                .into_iter()
                .map(|(key, count)| {
                    let (engine, version) = split_engine_version(&key);
                    EngineVersionCount {
                        engine: engine.to_string(),
                        version: version.to_string(),
                        count,
                    }
                })
                .collect(),
        })
        .collect()
}

// ============================================================================
// KMS key ages
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TeamKeyAgeSummary {
    pub team: String,
    pub age_buckets: Vec<AgeBucketCount>,
}

#[derive(Debug, Serialize)]
pub struct AgeBucketCount {
    pub bucket: &'static str,
    pub count: u64,
}

#[derive(Default)]
struct AgeBuckets {
    counts: [u64; AgeBucket::ORDER.len()],
}

/// Bucket KMS keys by age per team, presented in the canonical bucket order.
/// Keys with no creation date count under `Unknown`.
pub fn aggregate_kms(
    docs: &[ResourceDoc],
    teams: &TeamDirectory,
    now: DateTime<Utc>,
) -> Vec<TeamKeyAgeSummary> {
    let mut acc: TeamAccumulator<AgeBuckets> = TeamAccumulator::new();

    for doc in docs {
        let cfg: KmsKeyConfig = decode(&doc.configuration);
        let bucket = AgeBucket::for_creation(cfg.creation_date, now);
        let idx = AgeBucket::ORDER.iter().position(|b| *b == bucket).unwrap_or(0);
        if let Some(rec) = acc.record(teams.resolve(&doc.account_id), None) {
            rec.counts[idx] += 1;
        }
    }

    acc.into_entries()
        .into_iter()
        .map(|(team, rec)| TeamKeyAgeSummary {
            team,
            age_buckets: AgeBucket::ORDER
                .iter()
                .zip(rec.counts)
                .filter(|(_, count)| *count > 0)
                .map(|(bucket, count)| AgeBucketCount {
                    bucket: bucket.label(),
                    count,
                })
                .collect(),
        })
        .filter(|summary| !summary.age_buckets.is_empty())
        .collect()
}

// ============================================================================
// Autoscaling
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TeamAsgDimensionSummary {
    pub team: String,
    pub dimensions: Vec<AsgDimensionCount>,
}

#[derive(Debug, Serialize)]
pub struct AsgDimensionCount {
    pub min: i64,
    pub max: i64,
    pub desired: i64,
    pub count: u64,
}

#[derive(Default)]
struct DimensionBuckets {
    dimensions: Vec<((i64, i64, i64), u64)>,
}

/// Capacity triple for an autoscaling group; absent bounds default to 0.
pub fn asg_dimensions(cfg: &AsgConfig) -> (i64, i64, i64) {
    (
        cfg.min_size.unwrap_or(0),
        cfg.max_size.unwrap_or(0),
        cfg.desired_capacity.unwrap_or(0),
    )
}

/// Count autoscaling groups per (min, max, desired) triple per team, each
/// team's triples sorted by count descending.
pub fn aggregate_asg_dimensions(
    docs: &[ResourceDoc],
    teams: &TeamDirectory,
) -> Vec<TeamAsgDimensionSummary> {
    let mut acc: TeamAccumulator<DimensionBuckets> = TeamAccumulator::new();

    for doc in docs {
        let cfg: AsgConfig = decode(&doc.configuration);
        let triple = asg_dimensions(&cfg);
        if let Some(rec) = acc.record(teams.resolve(&doc.account_id), None) {
            match rec.dimensions.iter().position(|(t, _)| *t == triple) {
                Some(i) => rec.dimensions[i].1 += 1,
                None => rec.dimensions.push((triple, 1)),
            }
        }
    }

    acc.into_entries()
        .into_iter()
        .filter(|(_, rec)| !rec.dimensions.is_empty())
        .map(|(team, rec)| {
            let mut dimensions: Vec<AsgDimensionCount> = rec
                .dimensions
                .into_iter()
                .map(|((min, max, desired), count)| AsgDimensionCount {
                    min,
                    max,
                    desired,
                    count,
                })
                .collect();
            dimensions.sort_by(|a, b| b.count.cmp(&a.count));
            TeamAsgDimensionSummary { team, dimensions }
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct TeamAsgEmptyCount {
    pub team: String,
    pub count: u64,
}

/// Count autoscaling groups whose instance list is present and empty, by
/// team, sorted by count descending. Documents without an `Instances` field
/// do not count; absent is not length zero.
pub fn aggregate_asg_empty(docs: &[ResourceDoc], teams: &TeamDirectory) -> Vec<TeamAsgEmptyCount> {
    let mut acc: TeamAccumulator<u64> = TeamAccumulator::new();

    for doc in docs {
        let cfg: AsgConfig = decode(&doc.configuration);
        if !matches!(cfg.instances.as_deref(), Some([])) {
            continue;
        }
        if let Some(count) = acc.record(teams.resolve(&doc.account_id), None) {
            *count += 1;
        }
    }

    let mut summaries: Vec<TeamAsgEmptyCount> = acc
        .into_entries()
        .into_iter()
        .map(|(team, count)| TeamAsgEmptyCount { team, count })
        .collect();
    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccountMapping, MANDATORY_TAGS};
    use serde_json::json;

    fn teams() -> TeamDirectory {
        TeamDirectory::from_mappings([
            AccountMapping {
                owner_id: "111111111111".into(),
                team: "Platform".into(),
            },
            AccountMapping {
                owner_id: "222222222222".into(),
                team: "Data".into(),
            },
        ])
    }

    fn doc(
        account: &str,
        resource_id: &str,
        resource_type: Option<&str>,
        configuration: serde_json::Value,
    ) -> ResourceDoc {
        ResourceDoc {
            account_id: account.to_string(),
            resource_id: resource_id.to_string(),
            resource_type: resource_type.map(str::to_string),
            configuration,
        }
    }

    fn untagged(account: &str, id: &str) -> ResourceDoc {
        doc(account, id, Some("instance"), json!({ "Tags": [] }))
    }

    #[test]
    fn tagging_counts_sum_to_distinct_qualifying_documents() {
        // Three docs, one a per-team duplicate: two distinct resources count.
        let docs = vec![
            untagged("111111111111", "i-1"),
            untagged("111111111111", "i-1"),
            untagged("111111111111", "i-2"),
        ];
        let summaries = aggregate_tagging(&docs, &teams(), MANDATORY_TAGS);
        assert_eq!(summaries.len(), 1);
        let prcode = &summaries[0].resource_types[0].tags[0];
        assert_eq!(prcode.tag_name, "PRCode");
        assert_eq!(prcode.missing_count, 2);
    }

    #[test]
    fn tagging_dedupe_is_per_team_not_global() {
        let docs = vec![
            untagged("111111111111", "shared-id"),
            untagged("222222222222", "shared-id"),
        ];
        let summaries = aggregate_tagging(&docs, &teams(), MANDATORY_TAGS);
        assert_eq!(summaries.len(), 2);
        for summary in &summaries {
            assert_eq!(summary.resource_types[0].tags[0].missing_count, 1);
        }
    }

    #[test]
    fn tagging_aggregation_is_idempotent() {
        let docs = vec![
            untagged("111111111111", "i-1"),
            untagged("222222222222", "i-2"),
        ];
        let a = aggregate_tagging(&docs, &teams(), MANDATORY_TAGS);
        let b = aggregate_tagging(&docs, &teams(), MANDATORY_TAGS);
        assert_eq!(
            serde_json::to_value(&a).unwrap(),
            serde_json::to_value(&b).unwrap()
        );
    }

    #[test]
    fn account_log_buckets_are_excluded_entirely() {
        let docs = vec![
            doc(
                "111111111111",
                "arn:aws:s3:::111111111111-logs",
                Some("bucket"),
                json!({ "Tags": [] }),
            ),
            doc(
                "111111111111",
                "arn:aws:s3:::app-assets",
                Some("bucket"),
                json!({ "Tags": [] }),
            ),
        ];
        let summaries = aggregate_tagging(&docs, &teams(), MANDATORY_TAGS);
        assert_eq!(summaries.len(), 1);
        let bucket = &summaries[0].resource_types[0];
        assert_eq!(bucket.resource_type, "bucket");
        assert_eq!(bucket.tags[0].missing_count, 1);
    }

    #[test]
    fn fully_tagged_teams_are_pruned() {
        let tags: Vec<serde_json::Value> = [
            ("PRCode", "p"),
            ("Source", "s"),
            ("SN_ServiceID", "id"),
            ("SN_Environment", "prod"),
            ("SN_Application", "app"),
            ("BillingID", "b"),
            ("Service", "svc"),
        ]
        .iter()
        .map(|(k, v)| json!({ "Key": k, "Value": v }))
        .collect();
        let docs = vec![doc(
            "111111111111",
            "i-1",
            Some("instance"),
            json!({ "Tags": tags }),
        )];
        assert!(aggregate_tagging(&docs, &teams(), MANDATORY_TAGS).is_empty());
    }

    #[test]
    fn tagging_sorts_by_total_missing_descending() {
        let docs = vec![
            untagged("111111111111", "i-1"),
            untagged("222222222222", "i-2"),
            untagged("222222222222", "i-3"),
        ];
        let summaries = aggregate_tagging(&docs, &teams(), MANDATORY_TAGS);
        assert_eq!(summaries[0].team, "Data");
        assert_eq!(summaries[1].team, "Platform");
    }

    fn v2_lb(account: &str, id: &str) -> ResourceDoc {
        doc(account, id, Some("elbv2"), json!({ "Type": "application" }))
    }

    fn v2_listener(account: &str, id: &str, parent: &str, protocol: &str, policy: &str) -> ResourceDoc {
        doc(
            account,
            id,
            Some("listener"),
            json!({ "Protocol": protocol, "SslPolicy": policy, "LoadBalancerArn": parent }),
        )
    }

    #[test]
    fn no_certs_counts_distinct_load_balancers() {
        // One LB with two TLS listeners, one LB with none: NO CERTS is 1,
        // not (2 - 2) = 0 as listener-counting would give.
        let v2 = vec![
            v2_lb("111111111111", "lb-1"),
            v2_lb("111111111111", "lb-2"),
        ];
        let listeners = vec![
            v2_listener("111111111111", "ls-1", "lb-1", "HTTPS", "ELBSecurityPolicy-2016-08"),
            v2_listener("111111111111", "ls-2", "lb-1", "TLS", "ELBSecurityPolicy-TLS13-1-2-2021-06"),
        ];
        let summaries = aggregate_tls(&v2, &[], &listeners, &teams());
        assert_eq!(summaries.len(), 1);
        let no_certs = summaries[0]
            .tls_versions
            .iter()
            .find(|v| v.is_no_certs)
            .expect("NO CERTS entry");
        assert_eq!(no_certs.count, 1);
        assert_eq!(no_certs.version, NO_CERTS);
    }

    #[test]
    fn tls_policy_counts_and_deprecation_flags() {
        let v2 = vec![v2_lb("111111111111", "lb-1")];
        let listeners = vec![v2_listener(
            "111111111111",
            "ls-1",
            "lb-1",
            "HTTPS",
            "ELBSecurityPolicy-2016-08",
        )];
        let summaries = aggregate_tls(&v2, &[], &listeners, &teams());
        let deprecated = &summaries[0].tls_versions[0];
        assert_eq!(deprecated.version, "ELBSecurityPolicy-2016-08");
        assert_eq!(deprecated.count, 1);
        assert!(deprecated.is_deprecated);
        assert!(!summaries[0].tls_versions.iter().any(|v| v.is_no_certs));
    }

    #[test]
    fn classic_lbs_count_toward_totals_and_policies() {
        let classic = vec![doc(
            "222222222222",
            "arn:aws:elasticloadbalancing:eu-west-2:222222222222:loadbalancer/old-lb",
            Some("elb"),
            json!({
                "ListenerDescriptions": [
                    { "Listener": { "Protocol": "HTTPS" }, "PolicyNames": [] }
                ]
            }),
        )];
        let summaries = aggregate_tls(&[], &classic, &[], &teams());
        assert_eq!(summaries[0].total_lbs, 1);
        assert_eq!(summaries[0].tls_versions[0].version, "Classic-Default");
        assert!(summaries[0].tls_versions[0].is_deprecated);
    }

    #[test]
    fn lb_types_keep_stored_selectors_with_display_labels() {
        let v2 = vec![
            v2_lb("111111111111", "lb-1"),
            doc("111111111111", "lb-2", Some("elbv2"), json!({ "Type": "network" })),
        ];
        let classic = vec![doc("111111111111", "lb-3", Some("elb"), json!({}))];
        let summaries = aggregate_lb_types(&v2, &classic, &teams());
        let selectors: Vec<&str> = summaries[0].types.iter().map(|t| t.lb_type.as_str()).collect();
        assert_eq!(selectors, vec!["application", "network", "classic"]);
        let labels: Vec<&str> = summaries[0].types.iter().map(|t| t.display.as_str()).collect();
        assert_eq!(labels, vec!["ALB", "NLB", "Classic"]);
    }

    #[test]
    fn database_key_splits_on_first_hyphen_only() {
        let (engine, version) = split_engine_version("aurora-mysql-5.7.mysql_aurora.2.11");
        assert_eq!(engine, "aurora");
        assert_eq!(version, "mysql-5.7.mysql_aurora.2.11");
    }

    #[test]
    fn databases_group_rds_and_redshift() {
        let rds = vec![doc(
            "111111111111",
            "arn:aws:rds:eu-west-2:111111111111:db:main",
            Some("rds"),
            json!({ "Engine": "mysql", "EngineVersion": "5.7.44" }),
        )];
        let redshift = vec![doc(
            "111111111111",
            "arn:aws:redshift:eu-west-2:111111111111:namespace:abc",
            Some("redshift"),
            json!({ "ClusterVersion": "1.0" }),
        )];
        let summaries = aggregate_databases(&rds, &redshift, &teams());
        assert_eq!(summaries.len(), 1);
        let engines = &summaries[0].engines;
        assert_eq!(engines[0].engine, "mysql");
        assert_eq!(engines[0].version, "5.7.44");
        assert_eq!(engines[1].engine, "redshift");
        assert_eq!(engines[1].version, "1.0");
    }

    #[test]
    fn kms_buckets_follow_canonical_order_and_include_unknown() {
        let now = Utc::now();
        let old = (now - chrono::Duration::days(800)).to_rfc3339();
        let fresh = (now - chrono::Duration::days(5)).to_rfc3339();
        let docs = vec![
            doc("111111111111", "key-1", Some("kms"), json!({ "CreationDate": old })),
            doc("111111111111", "key-2", Some("kms"), json!({ "CreationDate": fresh })),
            doc("111111111111", "key-3", Some("kms"), json!({})),
        ];
        let summaries = aggregate_kms(&docs, &teams(), now);
        let buckets: Vec<&str> = summaries[0].age_buckets.iter().map(|b| b.bucket).collect();
        assert_eq!(buckets, vec!["0-30 days", "2+ years", "Unknown"]);
    }

    #[test]
    fn asg_dimensions_default_absent_bounds_to_zero() {
        let docs = vec![
            doc("111111111111", "asg-1", Some("asg"), json!({ "MaxSize": 4, "DesiredCapacity": 2 })),
            doc("111111111111", "asg-2", Some("asg"), json!({ "MaxSize": 4, "DesiredCapacity": 2 })),
            doc("111111111111", "asg-3", Some("asg"), json!({ "MinSize": 1, "MaxSize": 1, "DesiredCapacity": 1 })),
        ];
        let summaries = aggregate_asg_dimensions(&docs, &teams());
        let dims = &summaries[0].dimensions;
        assert_eq!((dims[0].min, dims[0].max, dims[0].desired), (0, 4, 2));
        assert_eq!(dims[0].count, 2);
        assert_eq!(dims[1].count, 1);
    }

    #[test]
    fn empty_asgs_require_instance_list_of_length_zero() {
        let docs = vec![
            doc("111111111111", "asg-1", Some("asg"), json!({ "Instances": [] })),
            doc(
                "111111111111",
                "asg-2",
                Some("asg"),
                json!({ "Instances": [{ "InstanceId": "i-1" }] }),
            ),
            doc("222222222222", "asg-3", Some("asg"), json!({ "Instances": [] })),
            doc("222222222222", "asg-4", Some("asg"), json!({ "Instances": [] })),
        ];
        let summaries = aggregate_asg_empty(&docs, &teams());
        assert_eq!(summaries[0].team, "Data");
        assert_eq!(summaries[0].count, 2);
        assert_eq!(summaries[1].team, "Platform");
        assert_eq!(summaries[1].count, 1);
    }

    #[test]
    fn asgs_without_an_instance_list_do_not_count_as_empty() {
        let docs = vec![doc("111111111111", "asg-1", Some("asg"), json!({ "MinSize": 1 }))];
        assert!(aggregate_asg_empty(&docs, &teams()).is_empty());
    }
}
