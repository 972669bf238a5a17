//! Output collaborator and the rows each pass hands to it.

use crate::model::{AclBinding, RoleBinding, ServiceAccount};
use crate::reconcile::{Reconciliation, Status};

pub const TOPIC_HEADERS: [&str; 2] = ["Topic", "Active (Last 7 Days)"];

pub const ACL_HEADERS: [&str; 8] = [
    "Type",
    "Principal",
    "Name",
    "Permission",
    "Operation",
    "Pattern",
    "Host",
    "Status",
];

pub const SERVICE_ACCOUNT_HEADERS: [&str; 4] = [
    "Service Account",
    "Active",
    "Cluster API Keys",
    "Cluster Role Bindings",
];

/// Renders tables and notices. Nothing flows back into the sweep.
pub trait Reporter: Send + Sync {
    fn render(&self, headers: &[&str], rows: Vec<Vec<String>>);

    fn notice(&self, message: &str);
}

pub fn topic_rows(reconciliation: &Reconciliation<String>) -> Vec<Vec<String>> {
    reconciliation
        .entries()
        .iter()
        .map(|e| vec![e.item.clone(), e.status.to_string()])
        .collect()
}

/// Binding columns without the status
pub fn acl_columns(binding: &AclBinding) -> Vec<String> {
    vec![
        binding.resource_type.to_string(),
        binding.principal.clone(),
        binding.resource_name.clone(),
        binding.permission.clone(),
        binding.operation.clone(),
        binding.pattern_type.to_string(),
        binding.host.clone(),
    ]
}

pub fn acl_rows(reconciliation: &Reconciliation<AclBinding>) -> Vec<Vec<String>> {
    reconciliation
        .entries()
        .iter()
        .map(|e| {
            let mut row = acl_columns(&e.item);
            row.push(e.status.to_string());
            row
        })
        .collect()
}

pub fn service_account_row(
    account: &ServiceAccount,
    status: Status,
    role_bindings: &[RoleBinding],
) -> Vec<String> {
    let roles: Vec<&str> = role_bindings.iter().map(|rb| rb.role.as_str()).collect();
    vec![
        account.principal.clone(),
        status.to_string(),
        account.api_keys.join(", "),
        roles.join(", "),
    ]
}

/// A single-column listing
pub fn list_rows<T: ToString>(items: &[T]) -> Vec<Vec<String>> {
    items.iter().map(|item| vec![item.to_string()]).collect()
}
