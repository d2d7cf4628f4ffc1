//! Static configuration loaded once at process start.
//!
//! Two tables drive the reports: the account-to-team mapping (a YAML file
//! maintained outside this service) and the mandatory tag set. Both are
//! immutable after startup and injected into the aggregator and evaluator
//! rather than read through globals, so those stay testable in isolation.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// One record of the externally maintained account mapping file.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountMapping {
    #[serde(rename = "OwnerId")]
    pub owner_id: String,
    #[serde(rename = "Team")]
    pub team: String,
}

/// Resolves AWS account ids to organizational team names.
#[derive(Debug, Clone, Default)]
pub struct TeamDirectory {
    by_account: HashMap<String, String>,
}

impl TeamDirectory {
    /// Sentinel team for accounts absent from the mapping table.
    pub const UNKNOWN: &'static str = "Unknown";

    pub fn from_mappings(mappings: impl IntoIterator<Item = AccountMapping>) -> Self {
        Self {
            by_account: mappings
                .into_iter()
                .map(|m| (m.owner_id, m.team))
                .collect(),
        }
    }

    /// Load the YAML mapping file (list of `{OwnerId, Team}` records).
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading account mappings from {}", path.display()))?;
        let mappings: Vec<AccountMapping> =
            serde_yaml::from_str(&raw).context("parsing account mappings YAML")?;
        Ok(Self::from_mappings(mappings))
    }

    /// Pure lookup; unmapped accounts belong to [`Self::UNKNOWN`]. A missing
    /// key is not an error.
    pub fn resolve(&self, account_id: &str) -> &str {
        self.by_account
            .get(account_id)
            .map(String::as_str)
            .unwrap_or(Self::UNKNOWN)
    }
}

/// How a mandatory tag is checked. The rule kind is data, not a branch on a
/// particular tag name, so alternative tag policies are just another list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagRule {
    /// The tag must be present with a non-blank value.
    Presence,
    /// `required` must be present AND at least one of `any_of`.
    RequireWithAny {
        required: &'static str,
        any_of: &'static [&'static str],
    },
}

/// A tag every resource is expected to carry, with its compliance rule.
#[derive(Debug, Clone, Copy)]
pub struct MandatoryTag {
    pub name: &'static str,
    pub rule: TagRule,
}

/// The ordered mandatory tag set. "BSP" is the composite billing rule: a
/// billing identifier tag plus at least one of the service/project tags.
pub const MANDATORY_TAGS: &[MandatoryTag] = &[
    MandatoryTag {
        name: "PRCode",
        rule: TagRule::Presence,
    },
    MandatoryTag {
        name: "Source",
        rule: TagRule::Presence,
    },
    MandatoryTag {
        name: "SN_ServiceID",
        rule: TagRule::Presence,
    },
    MandatoryTag {
        name: "SN_Environment",
        rule: TagRule::Presence,
    },
    MandatoryTag {
        name: "SN_Application",
        rule: TagRule::Presence,
    },
    MandatoryTag {
        name: "BSP",
        rule: TagRule::RequireWithAny {
            required: "billingid",
            any_of: &["service", "project"],
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(owner: &str, team: &str) -> AccountMapping {
        AccountMapping {
            owner_id: owner.to_string(),
            team: team.to_string(),
        }
    }

    #[test]
    fn resolves_mapped_accounts() {
        let teams = TeamDirectory::from_mappings([
            mapping("111111111111", "Platform"),
            mapping("222222222222", "Data"),
        ]);
        assert_eq!(teams.resolve("111111111111"), "Platform");
        assert_eq!(teams.resolve("222222222222"), "Data");
    }

    #[test]
    fn unmapped_account_is_unknown() {
        let teams = TeamDirectory::from_mappings([mapping("111111111111", "Platform")]);
        assert_eq!(teams.resolve("999999999999"), TeamDirectory::UNKNOWN);
    }

    #[test]
    fn parses_mapping_yaml() {
        let yaml = "- OwnerId: \"111111111111\"\n  Team: Platform\n- OwnerId: \"222222222222\"\n  Team: Data\n";
        let mappings: Vec<AccountMapping> = serde_yaml::from_str(yaml).unwrap();
        let teams = TeamDirectory::from_mappings(mappings);
        assert_eq!(teams.resolve("222222222222"), "Data");
    }

    #[test]
    fn mandatory_tag_set_ends_with_composite_rule() {
        let last = MANDATORY_TAGS.last().unwrap();
        assert_eq!(last.name, "BSP");
        assert!(matches!(last.rule, TagRule::RequireWithAny { .. }));
    }
}
