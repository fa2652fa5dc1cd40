//! Manifest loading and validation.
//!
//! A manifest is a YAML document declaring the desired state of a set
//! of Bastion resources:
//!
//! ```yaml
//! version: "1"
//! users:
//!   - name: alice
//!     profile: user
//!     email: alice@example.com
//!     password: changeme
//! devices:
//!   - name: web1
//!     host: 10.0.0.10
//! device_accounts:
//!   - name: root
//!     device: web1
//!     domain: local
//! authorizations:
//!   - name: web-admins
//!     user_group: admins
//!     target_group: web-servers
//!     subprotocols: [SSH_SHELL_SESSION]
//!   - name: old-grant
//!     state: absent
//! ```
//!
//! Every entry carries a `name`, an optional `state` (`present` by
//! default), and arbitrary resource fields that are passed through to
//! the API as-is. Explicit nulls are treated as unset.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use bastion_core::engine::{DesiredState, Lifecycle};
use bastion_core::fields::FieldSet;
use bastion_resources::AccountKey;

use crate::error::{CliError, CliResult};

/// One named resource in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceEntry {
    pub name: String,

    #[serde(default)]
    pub state: Lifecycle,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A device-local account, addressed by device and local domain.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceAccountEntry {
    pub name: String,
    pub device: String,
    pub domain: String,

    #[serde(default)]
    pub state: Lifecycle,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Desired state for a whole appliance.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub version: String,

    #[serde(default)]
    pub users: Vec<ResourceEntry>,

    #[serde(default)]
    pub user_groups: Vec<ResourceEntry>,

    #[serde(default)]
    pub devices: Vec<ResourceEntry>,

    #[serde(default)]
    pub device_accounts: Vec<DeviceAccountEntry>,

    #[serde(default)]
    pub authorizations: Vec<ResourceEntry>,

    #[serde(default)]
    pub target_groups: Vec<ResourceEntry>,
}

fn desired_from(state: Lifecycle, fields: &Map<String, Value>) -> DesiredState {
    match state {
        Lifecycle::Absent => DesiredState::absent(),
        Lifecycle::Present => DesiredState::present(
            fields
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<FieldSet>(),
        ),
    }
}

impl ResourceEntry {
    pub fn desired(&self) -> DesiredState {
        desired_from(self.state, &self.fields)
    }
}

impl DeviceAccountEntry {
    pub fn desired(&self) -> DesiredState {
        desired_from(self.state, &self.fields)
    }

    pub fn key(&self) -> AccountKey {
        AccountKey::new(&self.device, &self.domain, &self.name)
    }
}

impl Manifest {
    /// Total number of declared resources.
    pub fn len(&self) -> usize {
        self.users.len()
            + self.user_groups.len()
            + self.devices.len()
            + self.device_accounts.len()
            + self.authorizations.len()
            + self.target_groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Load and parse a YAML manifest file.
pub fn load_manifest(path: &Path) -> CliResult<Manifest> {
    if !path.exists() {
        return Err(CliError::Validation(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let content = fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("Failed to read file {}: {}", path.display(), e)))?;

    serde_yaml::from_str(&content).map_err(|e| {
        let location = if let Some(loc) = e.location() {
            format!(" at line {}, column {}", loc.line(), loc.column())
        } else {
            String::new()
        };
        CliError::Validation(format!("Invalid YAML{location}: {e}"))
    })
}

/// Validate a manifest before any backend call.
pub fn validate_manifest(manifest: &Manifest) -> CliResult<()> {
    if manifest.version != "1" {
        return Err(CliError::Validation(format!(
            "Unsupported manifest version '{}'. Only version '1' is supported.",
            manifest.version
        )));
    }

    if manifest.is_empty() {
        return Err(CliError::Validation(
            "Manifest declares no resources".to_string(),
        ));
    }

    validate_section("user", &manifest.users)?;
    validate_section("user_group", &manifest.user_groups)?;
    validate_section("device", &manifest.devices)?;
    validate_section("authorization", &manifest.authorizations)?;
    validate_section("target_group", &manifest.target_groups)?;
    validate_device_accounts(&manifest.device_accounts)?;

    for user in &manifest.users {
        validate_user(user)?;
    }
    for authorization in &manifest.authorizations {
        validate_authorization(authorization)?;
    }

    Ok(())
}

fn validate_section(kind: &str, entries: &[ResourceEntry]) -> CliResult<()> {
    let mut seen = HashSet::new();
    for entry in entries {
        if entry.name.is_empty() {
            return Err(CliError::Validation(format!("{kind} with an empty name")));
        }
        if !seen.insert(entry.name.as_str()) {
            return Err(CliError::Validation(format!(
                "Duplicate {kind} '{}'",
                entry.name
            )));
        }
    }
    Ok(())
}

fn validate_device_accounts(entries: &[DeviceAccountEntry]) -> CliResult<()> {
    let mut seen = HashSet::new();
    for entry in entries {
        if entry.name.is_empty() || entry.device.is_empty() || entry.domain.is_empty() {
            return Err(CliError::Validation(
                "device_account entries need name, device and domain".to_string(),
            ));
        }
        let key = entry.key().to_string();
        if !seen.insert(key.clone()) {
            return Err(CliError::Validation(format!(
                "Duplicate device_account '{key}'"
            )));
        }
    }
    Ok(())
}

// A user also needs a password or ssh_public_key to be created, but
// that only matters when the user does not exist yet; the adapter
// rejects a secretless creation, and a manifest that merely updates an
// existing user stays valid here.
fn validate_user(user: &ResourceEntry) -> CliResult<()> {
    if user.state == Lifecycle::Absent {
        return Ok(());
    }
    if !user.fields.contains_key("profile") {
        return Err(CliError::Validation(format!(
            "User '{}' needs a profile",
            user.name
        )));
    }
    Ok(())
}

fn validate_authorization(authorization: &ResourceEntry) -> CliResult<()> {
    if authorization.state == Lifecycle::Absent {
        return Ok(());
    }
    for required in ["user_group", "target_group"] {
        if !authorization.fields.contains_key(required) {
            return Err(CliError::Validation(format!(
                "Authorization '{}' needs a {required}",
                authorization.name
            )));
        }
    }
    Ok(())
}
