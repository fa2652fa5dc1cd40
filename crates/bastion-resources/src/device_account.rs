//! Device-local accounts, addressed by a composite key under
//! `/api/devices/{device}/localdomains/{domain}/accounts`.
//!
//! `credentials` is create-only: the appliance stores but never returns
//! credential material. `account_login` defaults to the account name
//! when the desired state leaves it unset.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use bastion_client::BastionClient;
use bastion_core::adapter::ResourceAdapter;
use bastion_core::error::BastionResult;
use bastion_core::fields::FieldSet;
use bastion_core::policy::FieldPolicy;

static POLICY: FieldPolicy = FieldPolicy {
    mutable: &["account_login", "description", "checkout_policy"],
    create_only: &["credentials"],
    list_clearable: &[],
    gated: &[],
};

/// Composite key for a device-local account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountKey {
    pub device: String,
    pub domain: String,
    pub account: String,
}

impl AccountKey {
    pub fn new(
        device: impl Into<String>,
        domain: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        Self {
            device: device.into(),
            domain: domain.into(),
            account: account.into(),
        }
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.device, self.domain, self.account)
    }
}

pub struct DeviceAccountAdapter {
    client: Arc<BastionClient>,
}

impl DeviceAccountAdapter {
    pub fn new(client: Arc<BastionClient>) -> Self {
        Self { client }
    }

    fn collection_path(key: &AccountKey) -> String {
        format!(
            "/api/devices/{}/localdomains/{}/accounts",
            key.device, key.domain
        )
    }

    fn item_path(key: &AccountKey) -> String {
        format!("{}/{}", Self::collection_path(key), key.account)
    }
}

#[async_trait]
impl ResourceAdapter for DeviceAccountAdapter {
    type Key = AccountKey;

    fn resource_type(&self) -> &'static str {
        "device-account"
    }

    fn policy(&self) -> &FieldPolicy {
        &POLICY
    }

    fn identity_fields(&self, key: &AccountKey) -> FieldSet {
        FieldSet::new()
            .with("account_name", key.account.as_str())
            .with("account_login", key.account.as_str())
    }

    async fn fetch(&self, key: &AccountKey) -> BastionResult<Option<FieldSet>> {
        match self.client.get(&Self::item_path(key)).await? {
            Some(value) => Ok(Some(FieldSet::try_from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, key: &AccountKey, payload: FieldSet) -> BastionResult<()> {
        self.client
            .post(&Self::collection_path(key), &payload.into_value())
            .await
    }

    async fn update(&self, key: &AccountKey, payload: FieldSet) -> BastionResult<()> {
        self.client
            .put(&Self::item_path(key), &payload.into_value())
            .await
    }

    async fn delete(&self, key: &AccountKey) -> BastionResult<()> {
        self.client.delete(&Self::item_path(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display_and_paths() {
        let key = AccountKey::new("web1", "local", "root");
        assert_eq!(key.to_string(), "web1/local/root");
        assert_eq!(
            DeviceAccountAdapter::item_path(&key),
            "/api/devices/web1/localdomains/local/accounts/root"
        );
        assert_eq!(
            DeviceAccountAdapter::collection_path(&key),
            "/api/devices/web1/localdomains/local/accounts"
        );
    }

    #[test]
    fn test_login_defaults_to_account_name() {
        let adapter = DeviceAccountAdapter {
            client: Arc::new(
                BastionClient::new(bastion_client::ApiConfig::new(
                    "http://bastion.invalid",
                    "u",
                    "p",
                ))
                .unwrap(),
            ),
        };
        let identity = adapter.identity_fields(&AccountKey::new("web1", "local", "root"));
        assert_eq!(identity.get_str("account_login"), Some("root"));
    }
}
