//! User accounts, addressed by user name under `/api/users`.
//!
//! `password` and `ssh_public_key` are accepted at creation only; the
//! appliance never returns them, so sending them in updates or diffing
//! on them would leave a converged user permanently "changed".

use std::sync::Arc;

use async_trait::async_trait;

use bastion_client::BastionClient;
use bastion_core::adapter::ResourceAdapter;
use bastion_core::error::{BastionError, BastionResult};
use bastion_core::fields::FieldSet;
use bastion_core::policy::FieldPolicy;

static POLICY: FieldPolicy = FieldPolicy {
    mutable: &[
        "display_name",
        "email",
        "profile",
        "groups",
        "ip_source",
        "preferred_language",
        "force_change_pwd",
        "user_auths",
        "expiration_date",
    ],
    create_only: &["password", "ssh_public_key"],
    list_clearable: &[],
    gated: &[],
};

pub struct UserAdapter {
    client: Arc<BastionClient>,
}

impl UserAdapter {
    pub fn new(client: Arc<BastionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceAdapter for UserAdapter {
    type Key = String;

    fn resource_type(&self) -> &'static str {
        "user"
    }

    fn policy(&self) -> &FieldPolicy {
        &POLICY
    }

    fn identity_fields(&self, key: &String) -> FieldSet {
        FieldSet::new().with("user_name", key.as_str())
    }

    async fn fetch(&self, key: &String) -> BastionResult<Option<FieldSet>> {
        match self.client.get(&format!("/api/users/{key}")).await? {
            Some(value) => Ok(Some(FieldSet::try_from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, key: &String, payload: FieldSet) -> BastionResult<()> {
        // Only creation needs a credential; updates of an existing user
        // never carry one.
        if !payload.has("password") && !payload.has("ssh_public_key") {
            return Err(BastionError::invalid_config(format!(
                "user '{key}' needs a password or an ssh_public_key to be created"
            )));
        }
        self.client.post("/api/users", &payload.into_value()).await
    }

    async fn update(&self, key: &String, payload: FieldSet) -> BastionResult<()> {
        self.client
            .put(&format!("/api/users/{key}"), &payload.into_value())
            .await
    }

    async fn delete(&self, key: &String) -> BastionResult<()> {
        self.client.delete(&format!("/api/users/{key}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_are_create_only() {
        assert!(POLICY.is_create_only("password"));
        assert!(POLICY.is_create_only("ssh_public_key"));
        assert!(!POLICY.is_mutable("password"));
        assert!(POLICY.is_mutable("email"));
    }
}
