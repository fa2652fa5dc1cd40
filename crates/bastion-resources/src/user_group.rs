//! User groups, addressed by group name under `/api/usergroups`.

use std::sync::Arc;

use async_trait::async_trait;

use bastion_client::BastionClient;
use bastion_core::adapter::ResourceAdapter;
use bastion_core::error::BastionResult;
use bastion_core::fields::FieldSet;
use bastion_core::policy::FieldPolicy;

static POLICY: FieldPolicy = FieldPolicy {
    mutable: &[
        "description",
        "timeframes",
        "users",
        "profile",
        "language",
        "email_list",
        "restrictions",
    ],
    create_only: &[],
    list_clearable: &[],
    gated: &[],
};

pub struct UserGroupAdapter {
    client: Arc<BastionClient>,
}

impl UserGroupAdapter {
    pub fn new(client: Arc<BastionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceAdapter for UserGroupAdapter {
    type Key = String;

    fn resource_type(&self) -> &'static str {
        "user-group"
    }

    fn policy(&self) -> &FieldPolicy {
        &POLICY
    }

    fn identity_fields(&self, key: &String) -> FieldSet {
        FieldSet::new().with("group_name", key.as_str())
    }

    async fn fetch(&self, key: &String) -> BastionResult<Option<FieldSet>> {
        match self.client.get(&format!("/api/usergroups/{key}")).await? {
            Some(value) => Ok(Some(FieldSet::try_from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, _key: &String, payload: FieldSet) -> BastionResult<()> {
        self.client
            .post("/api/usergroups", &payload.into_value())
            .await
    }

    async fn update(&self, key: &String, payload: FieldSet) -> BastionResult<()> {
        self.client
            .put(&format!("/api/usergroups/{key}"), &payload.into_value())
            .await
    }

    async fn delete(&self, key: &String) -> BastionResult<()> {
        self.client.delete(&format!("/api/usergroups/{key}")).await
    }
}
