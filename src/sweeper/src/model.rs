//! Resource inventories and activity signals, rebuilt from a live fetch on every run.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use cloud_sdk::types::{AclFilter, AclRecord, ApiKeyRecord, RoleBindingRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Topics,
    Acls,
    ServiceAccounts,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Topics => write!(f, "topics"),
            ResourceKind::Acls => write!(f, "ACLs"),
            ResourceKind::ServiceAccounts => write!(f, "service accounts"),
        }
    }
}

/// Resource type of an access-control binding, following the admin protocol's names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    Topic,
    Group,
    /// Reported as `CLUSTER` by the inventory API
    Broker,
    TransactionalId,
    DelegationToken,
    User,
}

impl ResourceType {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "TOPIC" => Some(Self::Topic),
            "GROUP" => Some(Self::Group),
            "CLUSTER" | "BROKER" => Some(Self::Broker),
            "TRANSACTIONAL_ID" => Some(Self::TransactionalId),
            "DELEGATION_TOKEN" => Some(Self::DelegationToken),
            "USER" => Some(Self::User),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Topic => "TOPIC",
            Self::Group => "GROUP",
            Self::Broker => "BROKER",
            Self::TransactionalId => "TRANSACTIONAL_ID",
            Self::DelegationToken => "DELEGATION_TOKEN",
            Self::User => "USER",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PatternType {
    Literal,
    Prefixed,
}

impl PatternType {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "LITERAL" => Some(Self::Literal),
            "PREFIXED" => Some(Self::Prefixed),
            _ => None,
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal => f.write_str("LITERAL"),
            Self::Prefixed => f.write_str("PREFIXED"),
        }
    }
}

/// Why a fetched ACL record could not be classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedAcl {
    MissingField(&'static str),
    UnknownResourceType(String),
    UnknownPatternType(String),
}

impl fmt::Display for MalformedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing {field}"),
            Self::UnknownResourceType(v) => write!(f, "unknown resource type '{v}'"),
            Self::UnknownPatternType(v) => write!(f, "unknown pattern type '{v}'"),
        }
    }
}

/// An access-control binding. Its identity is the whole tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AclBinding {
    pub resource_type: ResourceType,
    pub resource_name: String,
    pub pattern_type: PatternType,
    pub principal: String,
    pub host: String,
    pub operation: String,
    pub permission: String,
    /// Resource type exactly as fetched, submitted back on deletion
    wire_resource_type: String,
}

impl AclBinding {
    /// The exact tuple originally fetched, as a deletion target
    pub fn to_filter(&self) -> AclFilter {
        AclFilter {
            resource_type: self.wire_resource_type.clone(),
            resource_name: self.resource_name.clone(),
            pattern_type: self.pattern_type.to_string(),
            principal: self.principal.clone(),
            host: self.host.clone(),
            operation: self.operation.clone(),
            permission: self.permission.clone(),
        }
    }
}

impl TryFrom<AclRecord> for AclBinding {
    type Error = MalformedAcl;

    fn try_from(record: AclRecord) -> Result<Self, Self::Error> {
        fn field(value: Option<String>, name: &'static str) -> Result<String, MalformedAcl> {
            value
                .filter(|v| !v.is_empty())
                .ok_or(MalformedAcl::MissingField(name))
        }

        let wire_resource_type = field(record.resource_type, "resource_type")?;
        let resource_type = ResourceType::from_wire(&wire_resource_type)
            .ok_or_else(|| MalformedAcl::UnknownResourceType(wire_resource_type.clone()))?;
        let resource_name = field(record.resource_name, "resource_name")?;
        let pattern = field(record.pattern_type, "pattern_type")?;
        let pattern_type = PatternType::from_wire(&pattern)
            .ok_or(MalformedAcl::UnknownPatternType(pattern))?;

        Ok(Self {
            resource_type,
            resource_name,
            pattern_type,
            principal: field(record.principal, "principal")?,
            host: field(record.host, "host")?,
            operation: field(record.operation, "operation")?,
            permission: field(record.permission, "permission")?,
            wire_resource_type,
        })
    }
}

impl fmt::Display for AclBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}:{} {} {} from {}",
            self.permission,
            self.principal,
            self.resource_type,
            self.resource_name,
            self.pattern_type,
            self.operation,
            self.host
        )
    }
}

/// A role granted to a principal; only `id` is needed to delete it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleBinding {
    pub id: String,
    pub role: String,
    pub resource_pattern: String,
    pub principal: String,
}

impl From<RoleBindingRecord> for RoleBinding {
    fn from(record: RoleBindingRecord) -> Self {
        Self {
            id: record.id,
            role: record.role_name,
            resource_pattern: record.crn_pattern,
            principal: record.principal,
        }
    }
}

/// API keys grouped by owning principal, in principal order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialOwnership {
    keys: BTreeMap<String, Vec<String>>,
}

impl CredentialOwnership {
    pub fn insert(&mut self, owner: &str, key_id: &str) {
        self.keys
            .entry(owner.to_string())
            .or_default()
            .push(key_id.to_string());
    }

    pub fn principals(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.keys.iter().map(|(p, k)| (p.as_str(), k.as_slice()))
    }
}

impl FromIterator<ApiKeyRecord> for CredentialOwnership {
    fn from_iter<I: IntoIterator<Item = ApiKeyRecord>>(iter: I) -> Self {
        let mut ownership = Self::default();
        for record in iter {
            match record.owner_id() {
                Some(owner) => ownership.insert(owner, &record.id),
                None => log::warn!("Skipping API key {} without an owner", record.id),
            }
        }
        ownership
    }
}

/// Topics that ingested records during the activity window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicActivity(BTreeSet<String>);

impl TopicActivity {
    pub fn is_active(&self, topic: &str) -> bool {
        self.0.contains(topic)
    }
}

impl<S: Into<String>> FromIterator<S> for TopicActivity {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Connection weight per principal during the activity window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionActivity(BTreeMap<String, f64>);

impl ConnectionActivity {
    /// Absent principals weigh zero
    pub fn weight(&self, principal: &str) -> f64 {
        self.0.get(principal).copied().unwrap_or(0.0)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ConnectionActivity {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(p, w)| (p.into(), w)).collect())
    }
}

/// A service-account principal and the credentials it owns on the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAccount {
    pub principal: String,
    pub api_keys: Vec<String>,
}

impl fmt::Display for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(resource_type: &str, name: &str, pattern: &str) -> AclRecord {
        AclRecord {
            resource_type: Some(resource_type.into()),
            resource_name: Some(name.into()),
            pattern_type: Some(pattern.into()),
            principal: Some("User:sa-1".into()),
            host: Some("*".into()),
            operation: Some("READ".into()),
            permission: Some("ALLOW".into()),
        }
    }

    #[test]
    fn test_cluster_resource_type_is_normalized_to_broker() {
        let binding = AclBinding::try_from(record("CLUSTER", "kafka-cluster", "LITERAL")).unwrap();
        assert_eq!(binding.resource_type, ResourceType::Broker);
        assert_eq!(binding.resource_type.to_string(), "BROKER");
        // the deletion target keeps the fetched spelling
        assert_eq!(binding.to_filter().resource_type, "CLUSTER");
    }

    #[test]
    fn test_filter_carries_full_tuple() {
        let original = record("TOPIC", "orders-", "PREFIXED");
        let binding = AclBinding::try_from(original.clone()).unwrap();
        assert!(binding.to_filter().matches(&original));
    }

    #[test]
    fn test_malformed_records_are_rejected() {
        let mut missing_host = record("TOPIC", "orders", "LITERAL");
        missing_host.host = None;
        assert_eq!(
            AclBinding::try_from(missing_host),
            Err(MalformedAcl::MissingField("host"))
        );

        let mut blank_name = record("TOPIC", "", "LITERAL");
        blank_name.principal = None;
        assert_eq!(
            AclBinding::try_from(blank_name),
            Err(MalformedAcl::MissingField("resource_name"))
        );

        assert_eq!(
            AclBinding::try_from(record("SCHEMA", "orders", "LITERAL")),
            Err(MalformedAcl::UnknownResourceType("SCHEMA".into()))
        );
        assert_eq!(
            AclBinding::try_from(record("TOPIC", "orders", "MATCH")),
            Err(MalformedAcl::UnknownPatternType("MATCH".into()))
        );
    }

    #[test]
    fn test_absent_principal_weighs_zero() {
        let activity: ConnectionActivity = [("sa-1", 3.0)].into_iter().collect();
        assert_eq!(activity.weight("sa-1"), 3.0);
        assert_eq!(activity.weight("sa-2"), 0.0);
    }

    #[test]
    fn test_ownership_groups_keys_by_owner() {
        let mut ownership = CredentialOwnership::default();
        ownership.insert("sa-2", "K3");
        ownership.insert("sa-1", "K1");
        ownership.insert("sa-1", "K2");

        let principals: Vec<_> = ownership.principals().collect();
        assert_eq!(
            principals,
            vec![
                ("sa-1", ["K1".to_string(), "K2".to_string()].as_slice()),
                ("sa-2", ["K3".to_string()].as_slice()),
            ]
        );
    }
}
