//! Authorizations linking a user group to a target group, addressed by
//! name under `/api/authorizations`.
//!
//! The linked groups are fixed at creation; changing them means a new
//! authorization. Approval workflow fields are only meaningful while
//! `approval_required` is true, and `subprotocols` omitted from the
//! desired state means the protocol list should be empty. Updates go
//! through `?force=true` so the appliance applies them even when
//! sessions reference the authorization.

use std::sync::Arc;

use async_trait::async_trait;

use bastion_client::BastionClient;
use bastion_core::adapter::ResourceAdapter;
use bastion_core::error::BastionResult;
use bastion_core::fields::FieldSet;
use bastion_core::policy::{FieldPolicy, GatedGroup};

static POLICY: FieldPolicy = FieldPolicy {
    mutable: &[
        "description",
        "subprotocols",
        "is_critical",
        "is_recorded",
        "authorize_password_retrieval",
        "authorize_sessions",
        "authorize_session_sharing",
        "session_sharing_mode",
        "approval_required",
    ],
    create_only: &["user_group", "target_group"],
    list_clearable: &["subprotocols"],
    gated: &[GatedGroup {
        toggle: "approval_required",
        fields: &[
            "approvers",
            "has_comment",
            "mandatory_comment",
            "has_ticket",
            "mandatory_ticket",
            "active_quorum",
            "inactive_quorum",
            "single_connection",
            "approval_timeout",
        ],
    }],
};

pub struct AuthorizationAdapter {
    client: Arc<BastionClient>,
}

impl AuthorizationAdapter {
    pub fn new(client: Arc<BastionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceAdapter for AuthorizationAdapter {
    type Key = String;

    fn resource_type(&self) -> &'static str {
        "authorization"
    }

    fn policy(&self) -> &FieldPolicy {
        &POLICY
    }

    fn identity_fields(&self, key: &String) -> FieldSet {
        FieldSet::new().with("authorization_name", key.as_str())
    }

    async fn fetch(&self, key: &String) -> BastionResult<Option<FieldSet>> {
        match self.client.get(&format!("/api/authorizations/{key}")).await? {
            Some(value) => Ok(Some(FieldSet::try_from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, _key: &String, payload: FieldSet) -> BastionResult<()> {
        self.client
            .post("/api/authorizations", &payload.into_value())
            .await
    }

    async fn update(&self, key: &String, payload: FieldSet) -> BastionResult<()> {
        self.client
            .put(
                &format!("/api/authorizations/{key}?force=true"),
                &payload.into_value(),
            )
            .await
    }

    async fn delete(&self, key: &String) -> BastionResult<()> {
        self.client
            .delete(&format!("/api/authorizations/{key}"))
            .await
    }
}
