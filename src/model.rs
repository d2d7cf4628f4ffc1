//! Typed views of the per-category `configuration` payloads.
//!
//! The snapshot documents carry loosely shaped JSON from the AWS APIs. Each
//! category gets an explicit struct with named optional fields; a payload
//! that does not decode falls back to the default (all fields absent) rather
//! than failing the whole scan.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Decode a configuration payload, defaulting on malformed input.
pub fn decode<T: DeserializeOwned + Default>(configuration: &Value) -> T {
    match serde_json::from_value(configuration.clone()) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::debug!("undecodable configuration payload: {}", e);
            T::default()
        }
    }
}

// ============================================================================
// Tags
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TagListConfig {
    #[serde(rename = "Tags")]
    pub tags: Vec<TagEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TagEntry {
    #[serde(rename = "Key")]
    pub key: Option<String>,
    #[serde(rename = "Value")]
    pub value: Option<Value>,
}

impl TagListConfig {
    /// Tag values keyed by lowercased tag name. Entries without a key are
    /// dropped; a later duplicate key wins, matching ingestion order.
    pub fn by_lower_key(&self) -> HashMap<String, Value> {
        self.tags
            .iter()
            .filter_map(|t| {
                let key = t.key.as_ref()?;
                Some((key.to_lowercase(), t.value.clone().unwrap_or(Value::Null)))
            })
            .collect()
    }
}

// ============================================================================
// Load balancers
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ElbV2Config {
    #[serde(rename = "Type")]
    pub lb_type: Option<String>,
    #[serde(rename = "Scheme")]
    pub scheme: Option<String>,
    #[serde(rename = "LoadBalancerName")]
    pub load_balancer_name: Option<String>,
    #[serde(rename = "DNSName")]
    pub dns_name: Option<String>,
    #[serde(rename = "VpcId")]
    pub vpc_id: Option<String>,
    #[serde(rename = "State")]
    pub state: Option<ElbV2State>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ElbV2State {
    #[serde(rename = "Code")]
    pub code: Option<String>,
}

/// One ELB v2 listener document's payload. `LoadBalancerArn` ties the
/// listener back to its load balancer for the NO CERTS computation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    #[serde(rename = "Protocol")]
    pub protocol: Option<String>,
    #[serde(rename = "SslPolicy")]
    pub ssl_policy: Option<String>,
    #[serde(rename = "LoadBalancerArn")]
    pub load_balancer_arn: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassicLbConfig {
    #[serde(rename = "LoadBalancerName")]
    pub load_balancer_name: Option<String>,
    #[serde(rename = "Scheme")]
    pub scheme: Option<String>,
    #[serde(rename = "DNSName")]
    pub dns_name: Option<String>,
    #[serde(rename = "VPCId")]
    pub vpc_id: Option<String>,
    #[serde(rename = "ListenerDescriptions")]
    pub listener_descriptions: Vec<ClassicListenerDescription>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassicListenerDescription {
    #[serde(rename = "Listener")]
    pub listener: Option<ClassicListener>,
    #[serde(rename = "PolicyNames")]
    pub policy_names: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassicListener {
    #[serde(rename = "Protocol")]
    pub protocol: Option<String>,
}

// ============================================================================
// Databases
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RdsConfig {
    #[serde(rename = "Engine")]
    pub engine: Option<String>,
    #[serde(rename = "EngineVersion")]
    pub engine_version: Option<String>,
    #[serde(rename = "DBInstanceIdentifier")]
    pub db_instance_identifier: Option<String>,
    #[serde(rename = "DBInstanceClass")]
    pub db_instance_class: Option<String>,
    #[serde(rename = "DBInstanceStatus")]
    pub db_instance_status: Option<String>,
    #[serde(rename = "MultiAZ")]
    pub multi_az: Option<bool>,
    #[serde(rename = "StorageEncrypted")]
    pub storage_encrypted: Option<bool>,
    #[serde(rename = "Endpoint")]
    pub endpoint: Option<DbEndpoint>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RedshiftConfig {
    #[serde(rename = "ClusterVersion")]
    pub cluster_version: Option<String>,
    #[serde(rename = "ClusterIdentifier")]
    pub cluster_identifier: Option<String>,
    #[serde(rename = "NodeType")]
    pub node_type: Option<String>,
    #[serde(rename = "ClusterStatus")]
    pub cluster_status: Option<String>,
    #[serde(rename = "NumberOfNodes")]
    pub number_of_nodes: Option<i64>,
    #[serde(rename = "Encrypted")]
    pub encrypted: Option<bool>,
    #[serde(rename = "Endpoint")]
    pub endpoint: Option<DbEndpoint>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DbEndpoint {
    #[serde(rename = "Address")]
    pub address: Option<String>,
    #[serde(rename = "Port")]
    pub port: Option<i64>,
}

// ============================================================================
// KMS
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KmsKeyConfig {
    #[serde(rename = "CreationDate")]
    pub creation_date: Option<DateTime<Utc>>,
}

// ============================================================================
// Autoscaling
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AsgConfig {
    #[serde(rename = "MinSize")]
    pub min_size: Option<i64>,
    #[serde(rename = "MaxSize")]
    pub max_size: Option<i64>,
    #[serde(rename = "DesiredCapacity")]
    pub desired_capacity: Option<i64>,
    /// `None` when the snapshot omits the field; an absent instance list is
    /// not the same as an empty one.
    #[serde(rename = "Instances")]
    pub instances: Option<Vec<Value>>,
    #[serde(rename = "AutoScalingGroupName")]
    pub auto_scaling_group_name: Option<String>,
    #[serde(rename = "LaunchTemplate")]
    pub launch_template: Option<AsgLaunchTemplate>,
    #[serde(rename = "LaunchConfigurationName")]
    pub launch_configuration_name: Option<String>,
    #[serde(rename = "HealthCheckType")]
    pub health_check_type: Option<String>,
    #[serde(rename = "AvailabilityZones")]
    pub availability_zones: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AsgLaunchTemplate {
    #[serde(rename = "LaunchTemplateName")]
    pub launch_template_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tag_list_lowercases_keys_and_keeps_values() {
        let cfg: TagListConfig = decode(&json!({
            "Tags": [
                { "Key": "PRCode", "Value": "PR-1" },
                { "Key": "Source", "Value": "" },
                { "Value": "orphan" }
            ]
        }));
        let tags = cfg.by_lower_key();
        assert_eq!(tags.get("prcode"), Some(&json!("PR-1")));
        assert_eq!(tags.get("source"), Some(&json!("")));
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn malformed_configuration_decodes_to_default() {
        let cfg: AsgConfig = decode(&json!("not an object"));
        assert!(cfg.min_size.is_none());
        assert!(cfg.instances.is_none());
    }

    #[test]
    fn absent_instance_list_is_not_an_empty_one() {
        let absent: AsgConfig = decode(&json!({ "MinSize": 1 }));
        assert!(absent.instances.is_none());
        let empty: AsgConfig = decode(&json!({ "Instances": [] }));
        assert_eq!(empty.instances.as_deref(), Some(&[][..]));
    }

    #[test]
    fn listener_payload_carries_parent_arn() {
        let cfg: ListenerConfig = decode(&json!({
            "Protocol": "HTTPS",
            "SslPolicy": "ELBSecurityPolicy-TLS-1-2-2017-01",
            "LoadBalancerArn": "arn:aws:elasticloadbalancing:eu-west-2:111111111111:loadbalancer/app/x/abc"
        }));
        assert_eq!(cfg.protocol.as_deref(), Some("HTTPS"));
        assert!(cfg.load_balancer_arn.is_some());
    }
}
