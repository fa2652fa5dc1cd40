//! # Bastion reconciliation core
//!
//! Generic desired-state reconciliation for WALLIX Bastion resources.
//!
//! Given the current remote representation of a resource (possibly
//! absent) and a desired declaration, the engine decides whether a
//! create, update, delete, or no-op is required and builds the payload
//! to send. The decision logic is written once against the
//! [`ResourceAdapter`] contract; adapters supply endpoint addressing
//! and a [`FieldPolicy`], never decision logic of their own.
//!
//! ## Crate organization
//!
//! - [`fields`] - field maps for desired and current state
//! - [`policy`] - per-resource field policy declarations
//! - [`diff`] - normalization-aware comparison
//! - [`adapter`] - the resource adapter contract
//! - [`engine`] - decision table, payload construction, reconciliation
//! - [`error`] - error taxonomy
//!
//! ## Example
//!
//! ```ignore
//! use bastion_core::prelude::*;
//!
//! let desired = DesiredState::present(
//!     FieldSet::new()
//!         .with("profile", "user")
//!         .with("email", "alice@example.com"),
//! );
//! let outcome = reconcile(&adapter, &"alice".to_string(), &desired, Mode::Apply).await?;
//! assert!(outcome.changed);
//! ```
//!
//! [`ResourceAdapter`]: adapter::ResourceAdapter
//! [`FieldPolicy`]: policy::FieldPolicy

pub mod adapter;
pub mod diff;
pub mod engine;
pub mod error;
pub mod fields;
pub mod policy;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::adapter::ResourceAdapter;
    pub use crate::engine::{
        decide, reconcile, Action, Decision, DesiredState, Lifecycle, Mode, Outcome, OutcomeStatus,
    };
    pub use crate::error::{BastionError, BastionResult};
    pub use crate::fields::FieldSet;
    pub use crate::policy::{FieldPolicy, GatedGroup};
}

// Re-export async_trait for adapter implementors
pub use async_trait::async_trait;
