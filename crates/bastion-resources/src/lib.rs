//! Resource adapters for the WALLIX Bastion appliance.
//!
//! One adapter per resource type, each declaring its endpoint paths,
//! identity fields, and field policy. The reconciliation engine in
//! `bastion-core` drives them; the adapters themselves never decide
//! whether to mutate.

pub mod authorization;
pub mod device;
pub mod device_account;
pub mod target_group;
pub mod user;
pub mod user_group;

pub use authorization::AuthorizationAdapter;
pub use device::DeviceAdapter;
pub use device_account::{AccountKey, DeviceAccountAdapter};
pub use target_group::TargetGroupAdapter;
pub use user::UserAdapter;
pub use user_group::UserGroupAdapter;
