//! The adapter seam between the reconciliation engine and a concrete
//! resource endpoint.

use async_trait::async_trait;

use crate::error::BastionResult;
use crate::fields::FieldSet;
use crate::policy::FieldPolicy;

/// Uniform CRUD surface for one resource type.
///
/// The engine drives adapters through this trait only; adapters own the
/// endpoint paths, the identity fields, and the field policy, and never
/// make decisions about whether to mutate.
#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    /// Natural key addressing one resource instance. Single name for
    /// most resources, a composite for domain-scoped ones.
    type Key: std::fmt::Display + Send + Sync;

    /// Stable lowercase resource type name, used in outcomes and logs.
    fn resource_type(&self) -> &'static str;

    /// Field-handling policy for this resource.
    fn policy(&self) -> &FieldPolicy;

    /// Fields derived from the key that must be present in a create
    /// payload, e.g. the naming field the endpoint path is built from.
    fn identity_fields(&self, key: &Self::Key) -> FieldSet;

    /// Fetch the current state, `None` when the resource does not
    /// exist.
    async fn fetch(&self, key: &Self::Key) -> BastionResult<Option<FieldSet>>;

    /// Create the resource.
    async fn create(&self, key: &Self::Key, payload: FieldSet) -> BastionResult<()>;

    /// Update the resource in place.
    async fn update(&self, key: &Self::Key, payload: FieldSet) -> BastionResult<()>;

    /// Delete the resource.
    async fn delete(&self, key: &Self::Key) -> BastionResult<()>;
}
