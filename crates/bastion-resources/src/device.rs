//! Devices, addressed by device name under `/api/devices`.

use std::sync::Arc;

use async_trait::async_trait;

use bastion_client::BastionClient;
use bastion_core::adapter::ResourceAdapter;
use bastion_core::error::BastionResult;
use bastion_core::fields::FieldSet;
use bastion_core::policy::FieldPolicy;

static POLICY: FieldPolicy = FieldPolicy {
    mutable: &[
        "alias",
        "description",
        "host",
        "local_domains",
        "services",
        "tags",
    ],
    create_only: &[],
    list_clearable: &[],
    gated: &[],
};

pub struct DeviceAdapter {
    client: Arc<BastionClient>,
}

impl DeviceAdapter {
    pub fn new(client: Arc<BastionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceAdapter for DeviceAdapter {
    type Key = String;

    fn resource_type(&self) -> &'static str {
        "device"
    }

    fn policy(&self) -> &FieldPolicy {
        &POLICY
    }

    fn identity_fields(&self, key: &String) -> FieldSet {
        FieldSet::new().with("device_name", key.as_str())
    }

    async fn fetch(&self, key: &String) -> BastionResult<Option<FieldSet>> {
        match self.client.get(&format!("/api/devices/{key}")).await? {
            Some(value) => Ok(Some(FieldSet::try_from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, _key: &String, payload: FieldSet) -> BastionResult<()> {
        self.client.post("/api/devices", &payload.into_value()).await
    }

    async fn update(&self, key: &String, payload: FieldSet) -> BastionResult<()> {
        self.client
            .put(&format!("/api/devices/{key}"), &payload.into_value())
            .await
    }

    async fn delete(&self, key: &String) -> BastionResult<()> {
        self.client.delete(&format!("/api/devices/{key}")).await
    }
}
