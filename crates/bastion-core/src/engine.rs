//! Reconciliation engine.
//!
//! Compares desired state against current state and converges the
//! backend through a resource adapter. The decision logic is total over
//! (current, desired) and fully separated from execution, so dry runs
//! exercise the exact code path a real apply would.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::adapter::ResourceAdapter;
use crate::diff::differing_fields;
use crate::error::BastionResult;
use crate::fields::FieldSet;
use crate::policy::FieldPolicy;

/// Whether a resource should exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    #[default]
    Present,
    Absent,
}

impl Lifecycle {
    pub fn is_present(self) -> bool {
        matches!(self, Lifecycle::Present)
    }
}

/// Desired state of one resource instance.
#[derive(Debug, Clone)]
pub struct DesiredState {
    pub lifecycle: Lifecycle,
    pub fields: FieldSet,
}

impl DesiredState {
    /// Desire the resource present with the given fields.
    pub fn present(fields: FieldSet) -> Self {
        Self {
            lifecycle: Lifecycle::Present,
            fields,
        }
    }

    /// Desire the resource absent.
    pub fn absent() -> Self {
        Self {
            lifecycle: Lifecycle::Absent,
            fields: FieldSet::new(),
        }
    }
}

/// Execution mode for a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Apply,
    DryRun,
}

impl Mode {
    pub fn is_dry_run(self) -> bool {
        matches!(self, Mode::DryRun)
    }
}

/// Mutation the engine decided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
    Noop,
}

impl Action {
    pub fn is_mutation(self) -> bool {
        !matches!(self, Action::Noop)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Noop => "noop",
        };
        f.write_str(s)
    }
}

/// Outcome of the decision step, before any request is sent.
#[derive(Debug, Clone)]
pub struct Decision {
    pub action: Action,
    /// Request body for create and update actions.
    pub payload: Option<FieldSet>,
    /// Fields that drove an update decision.
    pub differing: Vec<String>,
}

/// Terminal status of one reconciled resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Created,
    Updated,
    Deleted,
    Unchanged,
}

/// Report for one reconciled resource.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub resource_type: String,
    pub name: String,
    pub status: OutcomeStatus,
    /// True when the backend was mutated, or would have been in a dry
    /// run.
    pub changed: bool,
    pub message: String,
}

/// Drop fields whose gate toggle is not enabled in the desired state.
fn apply_gates(mut fields: FieldSet, desired: &FieldSet, policy: &FieldPolicy) -> FieldSet {
    for group in policy.gated {
        let enabled = matches!(desired.get(group.toggle), Some(Value::Bool(true)));
        if !enabled {
            for &name in group.fields {
                fields.remove(name);
            }
        }
    }
    fields
}

/// Build the request body for a create.
///
/// Identity fields come first so the desired fields can override them,
/// then gated groups whose toggle is off are stripped.
pub fn create_payload(identity: &FieldSet, desired: &FieldSet, policy: &FieldPolicy) -> FieldSet {
    let mut payload = identity.clone();
    for (name, value) in desired.iter() {
        payload.set(name, value.clone());
    }
    apply_gates(payload, desired, policy)
}

/// Build the request body for an update.
///
/// Mutable desired fields plus gated fields, then gated groups whose
/// toggle is off are stripped. Create-only fields never appear here.
pub fn update_payload(desired: &FieldSet, policy: &FieldPolicy) -> FieldSet {
    let mut payload = FieldSet::new();
    for (name, value) in desired.iter() {
        if policy.is_mutable(name) || policy.gate_for(name).is_some() {
            payload.set(name, value.clone());
        }
    }
    apply_gates(payload, desired, policy)
}

/// Decide what to do about one resource.
///
/// An update is warranted only when the update payload itself differs
/// from the current state, so create-only fields the backend never
/// echoes back cannot keep a converged resource permanently "changed".
/// A field outside the policy's mutable and gated sets never enters the
/// payload and therefore never triggers an update on its own.
pub fn decide(
    current: Option<&FieldSet>,
    desired: &DesiredState,
    identity: &FieldSet,
    policy: &FieldPolicy,
) -> Decision {
    match (current, desired.lifecycle) {
        (None, Lifecycle::Present) => Decision {
            action: Action::Create,
            payload: Some(create_payload(identity, &desired.fields, policy)),
            differing: Vec::new(),
        },
        (Some(current), Lifecycle::Present) => {
            let payload = update_payload(&desired.fields, policy);
            let differing = differing_fields(current, &payload, policy);
            if differing.is_empty() {
                Decision {
                    action: Action::Noop,
                    payload: None,
                    differing,
                }
            } else {
                Decision {
                    action: Action::Update,
                    payload: Some(payload),
                    differing,
                }
            }
        }
        (Some(_), Lifecycle::Absent) => Decision {
            action: Action::Delete,
            payload: None,
            differing: Vec::new(),
        },
        (None, Lifecycle::Absent) => Decision {
            action: Action::Noop,
            payload: None,
            differing: Vec::new(),
        },
    }
}

/// Reconcile one resource: fetch the current state, decide, and in
/// apply mode perform the mutation.
///
/// Dry runs stop after the decision; the returned outcome carries the
/// same `changed` flag an apply would have produced.
pub async fn reconcile<A: ResourceAdapter>(
    adapter: &A,
    key: &A::Key,
    desired: &DesiredState,
    mode: Mode,
) -> BastionResult<Outcome> {
    let resource_type = adapter.resource_type();
    let name = key.to_string();
    let policy = adapter.policy();
    let identity = adapter.identity_fields(key);

    let current = adapter.fetch(key).await?;
    let decision = decide(current.as_ref(), desired, &identity, policy);

    debug!(
        resource_type,
        name = %name,
        action = %decision.action,
        differing = ?decision.differing,
        dry_run = mode.is_dry_run(),
        "reconciliation decision"
    );

    let outcome = |status, changed, message: String| Outcome {
        resource_type: resource_type.to_string(),
        name: name.clone(),
        status,
        changed,
        message,
    };

    if mode.is_dry_run() {
        return Ok(match decision.action {
            Action::Create => outcome(OutcomeStatus::Created, true, "would be created".into()),
            Action::Update => outcome(
                OutcomeStatus::Updated,
                true,
                format!("would be updated: {}", decision.differing.join(", ")),
            ),
            Action::Delete => outcome(OutcomeStatus::Deleted, true, "would be deleted".into()),
            Action::Noop => {
                let message = if current.is_some() {
                    "already up to date"
                } else {
                    "already absent"
                };
                outcome(OutcomeStatus::Unchanged, false, message.into())
            }
        });
    }

    let outcome = match decision.action {
        Action::Create => {
            let payload = decision.payload.unwrap_or_default();
            adapter.create(key, payload).await?;
            outcome(OutcomeStatus::Created, true, "created".into())
        }
        Action::Update => {
            let payload = decision.payload.unwrap_or_default();
            adapter.update(key, payload).await?;
            outcome(
                OutcomeStatus::Updated,
                true,
                format!("updated: {}", decision.differing.join(", ")),
            )
        }
        Action::Delete => {
            adapter.delete(key).await?;
            outcome(OutcomeStatus::Deleted, true, "deleted".into())
        }
        Action::Noop => {
            let message = if current.is_some() {
                "already up to date"
            } else {
                "already absent"
            };
            outcome(OutcomeStatus::Unchanged, false, message.into())
        }
    };

    if outcome.changed {
        info!(
            resource_type,
            name = %outcome.name,
            status = ?outcome.status,
            "resource reconciled"
        );
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::policy::GatedGroup;

    fn fields(value: serde_json::Value) -> FieldSet {
        FieldSet::try_from_value(value).unwrap()
    }

    static TEST_POLICY: FieldPolicy = FieldPolicy {
        mutable: &["description", "subprotocols", "approval_required"],
        create_only: &["user_group", "password"],
        list_clearable: &["subprotocols"],
        gated: &[GatedGroup {
            toggle: "approval_required",
            fields: &["approvers"],
        }],
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Fetch,
        Create(FieldSet),
        Update(FieldSet),
        Delete,
    }

    struct MockAdapter {
        current: Option<FieldSet>,
        calls: Mutex<Vec<Call>>,
    }

    impl MockAdapter {
        fn new(current: Option<FieldSet>) -> Self {
            Self {
                current,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResourceAdapter for MockAdapter {
        type Key = String;

        fn resource_type(&self) -> &'static str {
            "authorization"
        }

        fn policy(&self) -> &FieldPolicy {
            &TEST_POLICY
        }

        fn identity_fields(&self, key: &String) -> FieldSet {
            FieldSet::new().with("authorization_name", json!(key))
        }

        async fn fetch(&self, _key: &String) -> BastionResult<Option<FieldSet>> {
            self.calls.lock().unwrap().push(Call::Fetch);
            Ok(self.current.clone())
        }

        async fn create(&self, _key: &String, payload: FieldSet) -> BastionResult<()> {
            self.calls.lock().unwrap().push(Call::Create(payload));
            Ok(())
        }

        async fn update(&self, _key: &String, payload: FieldSet) -> BastionResult<()> {
            self.calls.lock().unwrap().push(Call::Update(payload));
            Ok(())
        }

        async fn delete(&self, _key: &String) -> BastionResult<()> {
            self.calls.lock().unwrap().push(Call::Delete);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_missing_resource_is_created() {
        let adapter = MockAdapter::new(None);
        let desired = DesiredState::present(fields(json!({"description": "d"})));

        let outcome = reconcile(&adapter, &"auth1".to_string(), &desired, Mode::Apply)
            .await
            .unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Created);
        assert!(outcome.changed);
        let calls = adapter.calls();
        assert_eq!(calls[0], Call::Fetch);
        match &calls[1] {
            Call::Create(payload) => {
                assert_eq!(payload.get_str("authorization_name"), Some("auth1"));
                assert_eq!(payload.get_str("description"), Some("d"));
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_converged_resource_is_untouched() {
        let current = fields(json!({"authorization_name": "auth1", "description": "d"}));
        let adapter = MockAdapter::new(Some(current));
        let desired = DesiredState::present(fields(json!({"description": "d"})));

        let outcome = reconcile(&adapter, &"auth1".to_string(), &desired, Mode::Apply)
            .await
            .unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Unchanged);
        assert!(!outcome.changed);
        assert_eq!(outcome.message, "already up to date");
        assert_eq!(adapter.calls(), vec![Call::Fetch]);
    }

    #[tokio::test]
    async fn test_drifted_resource_is_updated_with_mutable_fields_only() {
        let current = fields(json!({"description": "old", "user_group": "g1"}));
        let adapter = MockAdapter::new(Some(current));
        let desired = DesiredState::present(fields(
            json!({"description": "new", "user_group": "g1", "password": "s3cret"}),
        ));

        let outcome = reconcile(&adapter, &"auth1".to_string(), &desired, Mode::Apply)
            .await
            .unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Updated);
        assert_eq!(outcome.message, "updated: description");
        match &adapter.calls()[1] {
            Call::Update(payload) => {
                assert_eq!(payload.get_str("description"), Some("new"));
                assert!(!payload.has("user_group"));
                assert!(!payload.has("password"));
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unsent_secret_does_not_force_update() {
        let current = fields(json!({"description": "d"}));
        let adapter = MockAdapter::new(Some(current));
        let desired =
            DesiredState::present(fields(json!({"description": "d", "password": "s3cret"})));

        let outcome = reconcile(&adapter, &"u1".to_string(), &desired, Mode::Apply)
            .await
            .unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Unchanged);
        assert_eq!(adapter.calls(), vec![Call::Fetch]);
    }

    #[tokio::test]
    async fn test_unwanted_resource_is_deleted() {
        let adapter = MockAdapter::new(Some(fields(json!({"description": "d"}))));

        let outcome = reconcile(
            &adapter,
            &"auth1".to_string(),
            &DesiredState::absent(),
            Mode::Apply,
        )
        .await
        .unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Deleted);
        assert!(outcome.changed);
        assert_eq!(adapter.calls(), vec![Call::Fetch, Call::Delete]);
    }

    #[tokio::test]
    async fn test_absent_resource_desired_absent_is_noop() {
        let adapter = MockAdapter::new(None);

        let outcome = reconcile(
            &adapter,
            &"auth1".to_string(),
            &DesiredState::absent(),
            Mode::Apply,
        )
        .await
        .unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Unchanged);
        assert!(!outcome.changed);
        assert_eq!(outcome.message, "already absent");
        assert_eq!(adapter.calls(), vec![Call::Fetch]);
    }

    #[tokio::test]
    async fn test_dry_run_decides_without_mutating() {
        let current = fields(json!({"description": "old"}));
        let adapter = MockAdapter::new(Some(current));
        let desired = DesiredState::present(fields(json!({"description": "new"})));

        let outcome = reconcile(&adapter, &"auth1".to_string(), &desired, Mode::DryRun)
            .await
            .unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Updated);
        assert!(outcome.changed);
        assert_eq!(outcome.message, "would be updated: description");
        assert_eq!(adapter.calls(), vec![Call::Fetch]);
    }

    #[tokio::test]
    async fn test_gated_fields_dropped_when_toggle_off() {
        let adapter = MockAdapter::new(None);
        let desired = DesiredState::present(fields(json!({
            "description": "d",
            "approval_required": false,
            "approvers": ["grp"]
        })));

        reconcile(&adapter, &"auth1".to_string(), &desired, Mode::Apply)
            .await
            .unwrap();

        match &adapter.calls()[1] {
            Call::Create(payload) => {
                assert!(!payload.has("approvers"));
                assert_eq!(payload.get_bool("approval_required"), Some(false));
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_gated_fields_kept_when_toggle_on() {
        let adapter = MockAdapter::new(None);
        let desired = DesiredState::present(fields(json!({
            "description": "d",
            "approval_required": true,
            "approvers": ["grp"]
        })));

        reconcile(&adapter, &"auth1".to_string(), &desired, Mode::Apply)
            .await
            .unwrap();

        match &adapter.calls()[1] {
            Call::Create(payload) => {
                assert_eq!(payload.get("approvers"), Some(&json!(["grp"])));
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_gated_fields_included_in_updates_when_toggle_on() {
        let current = fields(json!({
            "description": "d",
            "approval_required": true,
            "approvers": ["old"]
        }));
        let adapter = MockAdapter::new(Some(current));
        let desired = DesiredState::present(fields(json!({
            "description": "d",
            "approval_required": true,
            "approvers": ["new"]
        })));

        let outcome = reconcile(&adapter, &"auth1".to_string(), &desired, Mode::Apply)
            .await
            .unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Updated);
        match &adapter.calls()[1] {
            Call::Update(payload) => {
                assert_eq!(payload.get("approvers"), Some(&json!(["new"])));
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn test_decision_table_is_total() {
        let identity = FieldSet::new();
        let present = DesiredState::present(fields(json!({"description": "d"})));
        let absent = DesiredState::absent();
        let existing = fields(json!({"description": "d"}));
        let drifted = fields(json!({"description": "other"}));

        assert_eq!(
            decide(None, &present, &identity, &TEST_POLICY).action,
            Action::Create
        );
        assert_eq!(
            decide(Some(&existing), &present, &identity, &TEST_POLICY).action,
            Action::Noop
        );
        assert_eq!(
            decide(Some(&drifted), &present, &identity, &TEST_POLICY).action,
            Action::Update
        );
        assert_eq!(
            decide(Some(&existing), &absent, &identity, &TEST_POLICY).action,
            Action::Delete
        );
        assert_eq!(
            decide(None, &absent, &identity, &TEST_POLICY).action,
            Action::Noop
        );
    }

    #[test]
    fn test_drift_outside_mutable_and_gated_never_triggers_update() {
        let current = fields(json!({"user_group": "old", "description": "d"}));
        let desired =
            DesiredState::present(fields(json!({"user_group": "new", "description": "d"})));

        let decision = decide(Some(&current), &desired, &FieldSet::new(), &TEST_POLICY);
        assert_eq!(decision.action, Action::Noop);

        // An empty policy admits no update payload at all, so present
        // plus present can only ever be a no-op.
        let empty = FieldPolicy::default();
        let decision = decide(Some(&current), &desired, &FieldSet::new(), &empty);
        assert_eq!(decision.action, Action::Noop);
    }
}
