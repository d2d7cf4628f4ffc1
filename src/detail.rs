//! Drill-down pages: filter the latest snapshot to one (team, dimension)
//! selection, search, sort, paginate.
//!
//! Detail builders re-scan the same documents the aggregate pass saw and
//! apply the same exclusion, team, and dedupe rules, so the drill-down counts
//! line up with the summary counts. Each builder produces unpaginated
//! [`DetailItem`]s; [`finish`] applies the shared search/sort/paginate tail.

use std::collections::HashSet;

use serde::Serialize;

use crate::aggregate::{self, excluded_from_tagging};
use crate::compliance::{self, NO_CERTS};
use crate::config::{MandatoryTag, TeamDirectory};
use crate::model::{
    decode, AsgConfig, ClassicLbConfig, ElbV2Config, ListenerConfig, RdsConfig, RedshiftConfig,
    TagListConfig,
};
use crate::store::ResourceDoc;

pub const PAGE_SIZE: usize = 25;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    pub label: String,
    pub value: String,
}

impl Attribute {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailItem {
    pub resource_id: String,
    pub short_name: String,
    pub account_id: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_results: usize,
    pub page_size: usize,
    pub has_next: bool,
    pub has_prev: bool,
    /// Adjacent page numbers, clamped; templates cannot do arithmetic.
    pub prev_page: usize,
    pub next_page: usize,
    /// 1-indexed inclusive bounds of the rendered slice; both 0 when the
    /// page is empty.
    pub start_result: usize,
    pub end_result: usize,
}

#[derive(Debug, Serialize)]
pub struct DetailPage {
    pub items: Vec<DetailItem>,
    pub pagination: Pagination,
}

// ============================================================================
// Shared tail: search, sort, paginate
// ============================================================================

/// Segment after the last `/`, else after the last `:`, else the whole id.
pub fn short_name_from_id(resource_id: &str) -> &str {
    if let Some((_, rest)) = resource_id.rsplit_once('/') {
        rest
    } else if let Some((_, rest)) = resource_id.rsplit_once(':') {
        rest
    } else {
        resource_id
    }
}

fn matches_search(item: &DetailItem, needle_lower: &str, needle_raw: &str) -> bool {
    item.resource_id.to_lowercase().contains(needle_lower)
        || item.short_name.to_lowercase().contains(needle_lower)
        || item.account_id.contains(needle_raw)
}

/// Apply the search filter, sort by short name (case-insensitive), and slice
/// out the requested page. `page` is 1-indexed; 0 is treated as 1.
pub fn finish(mut items: Vec<DetailItem>, search: &str, page: usize) -> DetailPage {
    if !search.is_empty() {
        let needle_lower = search.to_lowercase();
        items.retain(|item| matches_search(item, &needle_lower, search));
    }
    items.sort_by_key(|item| item.short_name.to_lowercase());

    let total_results = items.len();
    let total_pages = total_results.div_ceil(PAGE_SIZE).max(1);
    let current_page = page.max(1);

    let offset = (current_page - 1).saturating_mul(PAGE_SIZE);
    let page_items: Vec<DetailItem> = items
        .into_iter()
        .skip(offset)
        .take(PAGE_SIZE)
        .collect();

    let (start_result, end_result) = if page_items.is_empty() {
        (0, 0)
    } else {
        (offset + 1, offset + page_items.len())
    };

    DetailPage {
        pagination: Pagination {
            current_page,
            total_pages,
            total_results,
            page_size: PAGE_SIZE,
            has_next: current_page < total_pages,
            has_prev: current_page > 1,
            prev_page: current_page.saturating_sub(1).max(1),
            next_page: (current_page + 1).min(total_pages),
            start_result,
            end_result,
        },
        items: page_items,
    }
}

fn or_unknown(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => "Unknown",
    }
}

// ============================================================================
// Tagging
// ============================================================================

/// Resources of one team and resource type that fail one mandatory tag's
/// rule. Dedupe matches the aggregate pass: per team, by resource id.
pub fn tagging_details(
    docs: &[ResourceDoc],
    teams: &TeamDirectory,
    mandatory: &[MandatoryTag],
    team: &str,
    resource_type: &str,
    tag_name: &str,
    search: &str,
    page: usize,
) -> DetailPage {
    let Some(tag) = mandatory.iter().find(|t| t.name == tag_name) else {
        return finish(Vec::new(), search, page);
    };

    let mut seen: HashSet<&str> = HashSet::new();
    let mut items = Vec::new();

    for doc in docs {
        if excluded_from_tagging(doc) {
            continue;
        }
        if teams.resolve(&doc.account_id) != team {
            continue;
        }
        if doc.resource_type.as_deref().unwrap_or("Unknown") != resource_type {
            continue;
        }
        if !seen.insert(&doc.resource_id) {
            continue;
        }

        let cfg: TagListConfig = decode(&doc.configuration);
        let Some(reason) = tag.violation(&cfg.by_lower_key()) else {
            continue;
        };

        let present: Vec<&str> = cfg
            .tags
            .iter()
            .filter_map(|t| t.key.as_deref())
            .collect();
        items.push(DetailItem {
            short_name: short_name_from_id(&doc.resource_id).to_string(),
            resource_id: doc.resource_id.clone(),
            account_id: doc.account_id.clone(),
            attributes: vec![
                Attribute::new("Resource Type", resource_type),
                Attribute::new("Reason", reason),
                Attribute::new(
                    "Tags Present",
                    if present.is_empty() {
                        "(none)".to_string()
                    } else {
                        present.join(", ")
                    },
                ),
            ],
        });
    }

    finish(items, search, page)
}

// ============================================================================
// Load balancer TLS
// ============================================================================

/// Load balancers of one team under one TLS dimension. The `NO CERTS`
/// dimension lists load balancers with no TLS-classified listener; a policy
/// dimension lists the load balancers carrying that policy.
pub fn tls_details(
    v2_docs: &[ResourceDoc],
    classic_docs: &[ResourceDoc],
    listener_docs: &[ResourceDoc],
    teams: &TeamDirectory,
    team: &str,
    tls_version: &str,
    search: &str,
    page: usize,
) -> DetailPage {
    let items = if tls_version == NO_CERTS {
        no_certs_items(v2_docs, classic_docs, listener_docs, teams, team)
    } else {
        policy_items(classic_docs, listener_docs, teams, team, tls_version)
    };
    finish(items, search, page)
}

fn no_certs_items(
    v2_docs: &[ResourceDoc],
    classic_docs: &[ResourceDoc],
    listener_docs: &[ResourceDoc],
    teams: &TeamDirectory,
    team: &str,
) -> Vec<DetailItem> {
    // TLS listeners mark their parent regardless of which account owns the
    // listener document; the team filter applies to the load balancers.
    let mut with_tls: HashSet<String> = HashSet::new();
    for doc in listener_docs {
        let cfg: ListenerConfig = decode(&doc.configuration);
        if compliance::v2_listener_tls_policy(&cfg).is_some() {
            with_tls.insert(
                cfg.load_balancer_arn
                    .unwrap_or_else(|| doc.resource_id.clone()),
            );
        }
    }
    for doc in classic_docs {
        if teams.resolve(&doc.account_id) != team {
            continue;
        }
        let cfg: ClassicLbConfig = decode(&doc.configuration);
        if !compliance::classic_tls_policies(&cfg).is_empty() {
            with_tls.insert(doc.resource_id.clone());
        }
    }

    let mut items = Vec::new();
    for doc in v2_docs {
        if teams.resolve(&doc.account_id) != team || with_tls.contains(&doc.resource_id) {
            continue;
        }
        let cfg: ElbV2Config = decode(&doc.configuration);
        items.push(DetailItem {
            short_name: cfg
                .load_balancer_name
                .clone()
                .unwrap_or_else(|| short_name_from_id(&doc.resource_id).to_string()),
            resource_id: doc.resource_id.clone(),
            account_id: doc.account_id.clone(),
            attributes: vec![
                Attribute::new(
                    "Type",
                    aggregate::display_lb_type(or_unknown(cfg.lb_type.as_deref())),
                ),
                Attribute::new("Scheme", or_unknown(cfg.scheme.as_deref())),
                Attribute::new("DNS Name", or_unknown(cfg.dns_name.as_deref())),
            ],
        });
    }
    for doc in classic_docs {
        if teams.resolve(&doc.account_id) != team || with_tls.contains(&doc.resource_id) {
            continue;
        }
        let cfg: ClassicLbConfig = decode(&doc.configuration);
        items.push(DetailItem {
            short_name: cfg
                .load_balancer_name
                .clone()
                .unwrap_or_else(|| short_name_from_id(&doc.resource_id).to_string()),
            resource_id: doc.resource_id.clone(),
            account_id: doc.account_id.clone(),
            attributes: vec![
                Attribute::new("Type", "Classic"),
                Attribute::new("Scheme", or_unknown(cfg.scheme.as_deref())),
                Attribute::new("DNS Name", or_unknown(cfg.dns_name.as_deref())),
            ],
        });
    }
    items
}

fn policy_items(
    classic_docs: &[ResourceDoc],
    listener_docs: &[ResourceDoc],
    teams: &TeamDirectory,
    team: &str,
    tls_version: &str,
) -> Vec<DetailItem> {
    let mut items = Vec::new();

    for doc in listener_docs {
        if teams.resolve(&doc.account_id) != team {
            continue;
        }
        let cfg: ListenerConfig = decode(&doc.configuration);
        match compliance::v2_listener_tls_policy(&cfg) {
            Some(policy) if policy == tls_version => {}
            _ => continue,
        }
        let parent = cfg
            .load_balancer_arn
            .clone()
            .unwrap_or_else(|| doc.resource_id.clone());
        items.push(DetailItem {
            short_name: short_name_from_id(&parent).to_string(),
            resource_id: parent,
            account_id: doc.account_id.clone(),
            attributes: vec![
                Attribute::new("Protocol", or_unknown(cfg.protocol.as_deref())),
                Attribute::new("SSL Policy", tls_version),
                Attribute::new(
                    "Deprecated",
                    if compliance::is_deprecated_tls_policy(tls_version) {
                        "yes"
                    } else {
                        "no"
                    },
                ),
            ],
        });
    }

    for doc in classic_docs {
        if teams.resolve(&doc.account_id) != team {
            continue;
        }
        let cfg: ClassicLbConfig = decode(&doc.configuration);
        // One entry per load balancer even when several listeners share the
        // policy.
        if !compliance::classic_tls_policies(&cfg)
            .iter()
            .any(|p| p == tls_version)
        {
            continue;
        }
        items.push(DetailItem {
            short_name: cfg
                .load_balancer_name
                .clone()
                .unwrap_or_else(|| short_name_from_id(&doc.resource_id).to_string()),
            resource_id: doc.resource_id.clone(),
            account_id: doc.account_id.clone(),
            attributes: vec![
                Attribute::new("Type", "Classic"),
                Attribute::new("SSL Policy", tls_version),
                Attribute::new(
                    "Deprecated",
                    if compliance::is_deprecated_tls_policy(tls_version) {
                        "yes"
                    } else {
                        "no"
                    },
                ),
            ],
        });
    }

    items
}

// ============================================================================
// Load balancer types
// ============================================================================

/// Load balancers of one team and one stored type (`application`, `network`,
/// `classic`). The selector is the stored value, not the display label.
pub fn lb_type_details(
    v2_docs: &[ResourceDoc],
    classic_docs: &[ResourceDoc],
    teams: &TeamDirectory,
    team: &str,
    lb_type: &str,
    search: &str,
    page: usize,
) -> DetailPage {
    let mut items = Vec::new();

    if lb_type == "classic" {
        for doc in classic_docs {
            if teams.resolve(&doc.account_id) != team {
                continue;
            }
            let cfg: ClassicLbConfig = decode(&doc.configuration);
            items.push(DetailItem {
                short_name: cfg
                    .load_balancer_name
                    .clone()
                    .unwrap_or_else(|| short_name_from_id(&doc.resource_id).to_string()),
                resource_id: doc.resource_id.clone(),
                account_id: doc.account_id.clone(),
                attributes: vec![
                    Attribute::new("Scheme", or_unknown(cfg.scheme.as_deref())),
                    Attribute::new("DNS Name", or_unknown(cfg.dns_name.as_deref())),
                    Attribute::new("VPC", or_unknown(cfg.vpc_id.as_deref())),
                ],
            });
        }
    } else {
        for doc in v2_docs {
            if teams.resolve(&doc.account_id) != team {
                continue;
            }
            let cfg: ElbV2Config = decode(&doc.configuration);
            if or_unknown(cfg.lb_type.as_deref()) != lb_type {
                continue;
            }
            items.push(DetailItem {
                short_name: cfg
                    .load_balancer_name
                    .clone()
                    .unwrap_or_else(|| short_name_from_id(&doc.resource_id).to_string()),
                resource_id: doc.resource_id.clone(),
                account_id: doc.account_id.clone(),
                attributes: vec![
                    Attribute::new("Scheme", or_unknown(cfg.scheme.as_deref())),
                    Attribute::new("DNS Name", or_unknown(cfg.dns_name.as_deref())),
                    Attribute::new("VPC", or_unknown(cfg.vpc_id.as_deref())),
                    Attribute::new(
                        "State",
                        or_unknown(cfg.state.as_ref().and_then(|s| s.code.as_deref())),
                    ),
                ],
            });
        }
    }

    finish(items, search, page)
}

// ============================================================================
// Databases
// ============================================================================

/// Databases of one team under one engine/version pair, with end-of-support
/// warnings attached as extra attributes.
///
/// The summary presents the hyphen-joined grouping key split on its first
/// hyphen, so `engine`/`version` from a summary link cannot be compared
/// against the stored fields directly (hyphenated engines like `oracle-ee`
/// split differently). Both sides are re-joined and the keys compared.
pub fn database_details(
    rds_docs: &[ResourceDoc],
    redshift_docs: &[ResourceDoc],
    teams: &TeamDirectory,
    team: &str,
    engine: &str,
    version: &str,
    search: &str,
    page: usize,
) -> DetailPage {
    let wanted = aggregate::engine_version_key(engine, version);
    let mut items = Vec::new();

    for doc in rds_docs {
        if teams.resolve(&doc.account_id) != team {
            continue;
        }
        let cfg: RdsConfig = decode(&doc.configuration);
        let stored_engine = or_unknown(cfg.engine.as_deref());
        let stored_version = or_unknown(cfg.engine_version.as_deref());
        if aggregate::engine_version_key(stored_engine, stored_version) != wanted {
            continue;
        }
        let mut attributes = vec![
            Attribute::new("Engine", stored_engine),
            Attribute::new("Version", stored_version),
            Attribute::new("Instance Class", or_unknown(cfg.db_instance_class.as_deref())),
            Attribute::new("Status", or_unknown(cfg.db_instance_status.as_deref())),
            Attribute::new(
                "Endpoint",
                or_unknown(cfg.endpoint.as_ref().and_then(|e| e.address.as_deref())),
            ),
        ];
        for warning in compliance::database_deprecations(stored_engine, stored_version) {
            attributes.push(Attribute::new("Warning", warning));
        }
        items.push(DetailItem {
            short_name: cfg
                .db_instance_identifier
                .clone()
                .unwrap_or_else(|| short_name_from_id(&doc.resource_id).to_string()),
            resource_id: doc.resource_id.clone(),
            account_id: doc.account_id.clone(),
            attributes,
        });
    }

    for doc in redshift_docs {
        if teams.resolve(&doc.account_id) != team {
            continue;
        }
        let cfg: RedshiftConfig = decode(&doc.configuration);
        let stored_version = or_unknown(cfg.cluster_version.as_deref());
        if aggregate::engine_version_key("redshift", stored_version) != wanted {
            continue;
        }
        items.push(DetailItem {
            short_name: cfg
                .cluster_identifier
                .clone()
                .unwrap_or_else(|| short_name_from_id(&doc.resource_id).to_string()),
            resource_id: doc.resource_id.clone(),
            account_id: doc.account_id.clone(),
            attributes: vec![
                Attribute::new("Engine", "redshift"),
                Attribute::new("Version", stored_version),
                Attribute::new("Node Type", or_unknown(cfg.node_type.as_deref())),
                Attribute::new("Status", or_unknown(cfg.cluster_status.as_deref())),
                Attribute::new(
                    "Nodes",
                    cfg.number_of_nodes
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "Unknown".to_string()),
                ),
            ],
        });
    }

    finish(items, search, page)
}

// ============================================================================
// Autoscaling dimensions
// ============================================================================

/// Autoscaling groups of one team with one exact (min, max, desired) triple.
pub fn asg_dimension_details(
    docs: &[ResourceDoc],
    teams: &TeamDirectory,
    team: &str,
    min: i64,
    max: i64,
    desired: i64,
    search: &str,
    page: usize,
) -> DetailPage {
    let mut items = Vec::new();

    for doc in docs {
        if teams.resolve(&doc.account_id) != team {
            continue;
        }
        let cfg: AsgConfig = decode(&doc.configuration);
        if aggregate::asg_dimensions(&cfg) != (min, max, desired) {
            continue;
        }
        let launch = cfg
            .launch_template
            .as_ref()
            .and_then(|t| t.launch_template_name.as_deref())
            .or(cfg.launch_configuration_name.as_deref());
        items.push(DetailItem {
            short_name: cfg
                .auto_scaling_group_name
                .clone()
                .unwrap_or_else(|| short_name_from_id(&doc.resource_id).to_string()),
            resource_id: doc.resource_id.clone(),
            account_id: doc.account_id.clone(),
            attributes: vec![
                Attribute::new("Min / Max / Desired", format!("{} / {} / {}", min, max, desired)),
                Attribute::new(
                    "Instances",
                    cfg.instances
                        .as_ref()
                        .map(|v| v.len().to_string())
                        .unwrap_or_else(|| "Unknown".to_string()),
                ),
                Attribute::new("Launch Source", or_unknown(launch)),
                Attribute::new("Health Check", or_unknown(cfg.health_check_type.as_deref())),
                Attribute::new(
                    "Availability Zones",
                    if cfg.availability_zones.is_empty() {
                        "Unknown".to_string()
                    } else {
                        cfg.availability_zones.join(", ")
                    },
                ),
            ],
        });
    }

    finish(items, search, page)
}
