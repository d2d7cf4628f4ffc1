//! Per-category compliance predicates and classifiers.
//!
//! Pure functions of a document's configuration: mandatory tag checks (with
//! the composite billing rule), TLS policy classification, database
//! end-of-support messages, and KMS key age bucketing. No store access, no
//! shared state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::config::{MandatoryTag, TagRule};
use crate::model::{ClassicLbConfig, ListenerConfig};

// ============================================================================
// Tag presence
// ============================================================================

/// A tag value counts as missing when absent, JSON null, or a string that is
/// empty after trimming. Non-empty strings like `"0"` and `"false"` are
/// present, as is any non-string value.
pub fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

impl MandatoryTag {
    /// Why this resource fails the tag's rule, or `None` when compliant.
    /// `tags` is keyed by lowercased tag name.
    pub fn violation(&self, tags: &HashMap<String, Value>) -> Option<String> {
        match self.rule {
            TagRule::Presence => {
                let name = self.name.to_lowercase();
                is_missing(tags.get(&name)).then(|| format!("missing {}", self.name))
            }
            TagRule::RequireWithAny { required, any_of } => {
                let has_required = !is_missing(tags.get(required));
                let has_any = any_of.iter().any(|t| !is_missing(tags.get(*t)));
                if has_required && has_any {
                    None
                } else if !has_required {
                    Some("missing billing identifier".to_string())
                } else {
                    Some("missing service and project".to_string())
                }
            }
        }
    }
}

// ============================================================================
// TLS policies
// ============================================================================

/// Pseudo-dimension for load balancers with no TLS-classified listener.
pub const NO_CERTS: &str = "NO CERTS";

/// Sentinel policy for classic listeners with no policy name attached.
pub const CLASSIC_DEFAULT_POLICY: &str = "Classic-Default";

/// Deprecated when the name carries a 2015/2016 security-policy prefix, is
/// the classic default sentinel, or pins TLS 1.0/1.1.
pub fn is_deprecated_tls_policy(policy: &str) -> bool {
    policy.starts_with("ELBSecurityPolicy-2015")
        || policy.starts_with("ELBSecurityPolicy-2016")
        || policy == CLASSIC_DEFAULT_POLICY
        || policy.contains("TLS-1-0")
        || policy.contains("TLS-1-1")
}

/// TLS policy of a v2 listener, when the listener terminates TLS at all.
pub fn v2_listener_tls_policy(cfg: &ListenerConfig) -> Option<String> {
    match cfg.protocol.as_deref() {
        Some("HTTPS") | Some("TLS") => Some(
            cfg.ssl_policy
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
        ),
        _ => None,
    }
}

/// Policies of a classic load balancer's HTTPS/SSL listeners, one entry per
/// matching listener (first policy name, or the default sentinel).
pub fn classic_tls_policies(cfg: &ClassicLbConfig) -> Vec<String> {
    cfg.listener_descriptions
        .iter()
        .filter(|desc| {
            matches!(
                desc.listener.as_ref().and_then(|l| l.protocol.as_deref()),
                Some("HTTPS") | Some("SSL")
            )
        })
        .map(|desc| {
            desc.policy_names
                .first()
                .cloned()
                .unwrap_or_else(|| CLASSIC_DEFAULT_POLICY.to_string())
        })
        .collect()
}

// ============================================================================
// Database end of support
// ============================================================================

/// End-of-support messages for an engine/version pair. Empty when nothing
/// applies.
pub fn database_deprecations(engine: &str, version: &str) -> Vec<&'static str> {
    let mut issues = Vec::new();

    if engine == "mysql" && version.starts_with("5.7") {
        issues.push(
            "MySQL 5.7 reached end of standard support on February 29, 2024. \
             Now on Extended Support (paid).",
        );
    }

    if engine == "postgres" {
        if version.starts_with("9.6") {
            issues.push("PostgreSQL 9.6 reached end of life on November 11, 2021.");
        }
        if version.starts_with("10.") {
            issues.push("PostgreSQL 10 reached end of life on November 10, 2022.");
        }
        if version.starts_with("11.") {
            issues.push("PostgreSQL 11 reached end of life on November 9, 2023.");
        }
    }

    if engine.starts_with("oracle") {
        if version.contains("12.1") || version.contains("12.2") {
            issues.push("Oracle 12c is no longer supported. End of support was March 31, 2022.");
        }
        if version.contains("11.2") {
            issues.push("Oracle 11g is no longer supported. Legacy version.");
        }
        if version.contains("18.0") {
            issues.push("Oracle 18c is no longer supported. Legacy version.");
        }
    }

    if engine.starts_with("sqlserver") && version.contains("12.00") {
        issues.push("SQL Server 2014 reached end of support on July 9, 2024.");
    }

    issues
}

// ============================================================================
// KMS key ages
// ============================================================================

/// Fixed, non-overlapping key age buckets. Ranges are half-open: the lower
/// bound is inclusive, the upper exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBucket {
    UpTo30Days,
    Days30To90,
    Days90To180,
    Days180To365,
    OneToTwoYears,
    TwoPlusYears,
    Unknown,
}

impl AgeBucket {
    /// Canonical presentation order, regardless of which buckets are
    /// populated.
    pub const ORDER: [AgeBucket; 7] = [
        AgeBucket::UpTo30Days,
        AgeBucket::Days30To90,
        AgeBucket::Days90To180,
        AgeBucket::Days180To365,
        AgeBucket::OneToTwoYears,
        AgeBucket::TwoPlusYears,
        AgeBucket::Unknown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AgeBucket::UpTo30Days => "0-30 days",
            AgeBucket::Days30To90 => "30-90 days",
            AgeBucket::Days90To180 => "90-180 days",
            AgeBucket::Days180To365 => "180-365 days",
            AgeBucket::OneToTwoYears => "1-2 years",
            AgeBucket::TwoPlusYears => "2+ years",
            AgeBucket::Unknown => "Unknown",
        }
    }

    /// Bucket for a key created at `creation`, as of `now`. Keys without a
    /// creation date land in [`AgeBucket::Unknown`].
    pub fn for_creation(creation: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(created) = creation else {
            return AgeBucket::Unknown;
        };
        let age_days = (now - created).num_days();
        match age_days {
            d if d < 30 => AgeBucket::UpTo30Days,
            d if d < 90 => AgeBucket::Days30To90,
            d if d < 180 => AgeBucket::Days90To180,
            d if d < 365 => AgeBucket::Days180To365,
            d if d < 730 => AgeBucket::OneToTwoYears,
            _ => AgeBucket::TwoPlusYears,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MANDATORY_TAGS;
    use chrono::Duration;
    use serde_json::json;

    fn tags(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn bsp() -> MandatoryTag {
        *MANDATORY_TAGS.last().unwrap()
    }

    #[test]
    fn blank_and_absent_values_are_missing() {
        assert!(is_missing(None));
        assert!(is_missing(Some(&Value::Null)));
        assert!(is_missing(Some(&json!(""))));
        assert!(is_missing(Some(&json!("   "))));
        assert!(!is_missing(Some(&json!("0"))));
        assert!(!is_missing(Some(&json!("false"))));
        assert!(!is_missing(Some(&json!(0))));
    }

    #[test]
    fn presence_rule_reports_the_tag_name() {
        let tag = MandatoryTag {
            name: "PRCode",
            rule: TagRule::Presence,
        };
        assert_eq!(tag.violation(&tags(&[])), Some("missing PRCode".into()));
        assert_eq!(tag.violation(&tags(&[("prcode", json!("PR-1"))])), None);
    }

    #[test]
    fn bsp_passes_with_billing_and_project() {
        let t = tags(&[
            ("billingid", json!("123")),
            ("service", json!("")),
            ("project", json!("x")),
        ]);
        assert_eq!(bsp().violation(&t), None);
    }

    #[test]
    fn bsp_without_billing_names_the_billing_half() {
        let t = tags(&[
            ("billingid", json!("")),
            ("service", json!("x")),
            ("project", json!("x")),
        ]);
        assert_eq!(
            bsp().violation(&t),
            Some("missing billing identifier".into())
        );
    }

    #[test]
    fn bsp_without_service_and_project_names_the_other_half() {
        let t = tags(&[
            ("billingid", json!("123")),
            ("service", json!("")),
            ("project", json!("")),
        ]);
        assert_eq!(
            bsp().violation(&t),
            Some("missing service and project".into())
        );
    }

    #[test]
    fn deprecated_tls_policies() {
        assert!(is_deprecated_tls_policy("ELBSecurityPolicy-2015-05"));
        assert!(is_deprecated_tls_policy("ELBSecurityPolicy-2016-08"));
        assert!(is_deprecated_tls_policy("Classic-Default"));
        assert!(is_deprecated_tls_policy("ELBSecurityPolicy-TLS-1-0-2015-04"));
        assert!(is_deprecated_tls_policy("ELBSecurityPolicy-TLS-1-1-2017-01"));
        assert!(!is_deprecated_tls_policy("ELBSecurityPolicy-TLS13-1-2-2021-06"));
    }

    #[test]
    fn v2_listener_policy_only_for_tls_protocols() {
        let https = ListenerConfig {
            protocol: Some("HTTPS".into()),
            ssl_policy: Some("ELBSecurityPolicy-2016-08".into()),
            load_balancer_arn: None,
        };
        assert_eq!(
            v2_listener_tls_policy(&https).as_deref(),
            Some("ELBSecurityPolicy-2016-08")
        );

        let tls_no_policy = ListenerConfig {
            protocol: Some("TLS".into()),
            ssl_policy: None,
            load_balancer_arn: None,
        };
        assert_eq!(v2_listener_tls_policy(&tls_no_policy).as_deref(), Some("Unknown"));

        let http = ListenerConfig {
            protocol: Some("HTTP".into()),
            ssl_policy: None,
            load_balancer_arn: None,
        };
        assert_eq!(v2_listener_tls_policy(&http), None);
    }

    #[test]
    fn classic_listener_without_policy_uses_default_sentinel() {
        let cfg: ClassicLbConfig = crate::model::decode(&json!({
            "ListenerDescriptions": [
                { "Listener": { "Protocol": "HTTPS" }, "PolicyNames": [] },
                { "Listener": { "Protocol": "SSL" }, "PolicyNames": ["ELBSecurityPolicy-2016-08"] },
                { "Listener": { "Protocol": "HTTP" }, "PolicyNames": ["ignored"] }
            ]
        }));
        assert_eq!(
            classic_tls_policies(&cfg),
            vec!["Classic-Default".to_string(), "ELBSecurityPolicy-2016-08".to_string()]
        );
    }

    #[test]
    fn mysql_57_is_past_standard_support() {
        let issues = database_deprecations("mysql", "5.7.44");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("MySQL 5.7"));
        assert!(database_deprecations("mysql", "8.0.36").is_empty());
    }

    #[test]
    fn oracle_and_sqlserver_rules_match_on_substring() {
        assert!(database_deprecations("oracle-ee", "19.0.0.0.ru-2024-01").is_empty());
        assert_eq!(database_deprecations("oracle-ee", "12.1.0.2.v29").len(), 1);
        assert_eq!(database_deprecations("sqlserver-se", "12.00.6449.1.v1").len(), 1);
    }

    #[test]
    fn key_created_exactly_30_days_ago_is_in_the_30_90_bucket() {
        let now = Utc::now();
        let created = now - Duration::days(30);
        assert_eq!(
            AgeBucket::for_creation(Some(created), now),
            AgeBucket::Days30To90
        );
    }

    #[test]
    fn key_age_bucket_boundaries() {
        let now = Utc::now();
        let at = |days: i64| AgeBucket::for_creation(Some(now - Duration::days(days)), now);
        assert_eq!(at(0), AgeBucket::UpTo30Days);
        assert_eq!(at(29), AgeBucket::UpTo30Days);
        assert_eq!(at(89), AgeBucket::Days30To90);
        assert_eq!(at(90), AgeBucket::Days90To180);
        assert_eq!(at(180), AgeBucket::Days180To365);
        assert_eq!(at(365), AgeBucket::OneToTwoYears);
        assert_eq!(at(729), AgeBucket::OneToTwoYears);
        assert_eq!(at(730), AgeBucket::TwoPlusYears);
    }

    #[test]
    fn key_without_creation_date_is_unknown() {
        assert_eq!(AgeBucket::for_creation(None, Utc::now()), AgeBucket::Unknown);
    }
}
