//! HTTP client for the WALLIX Bastion REST API.
//!
//! Provides [`BastionClient`], a thin transport layer the resource
//! adapters build on: basic-auth JSON requests with the status-code
//! conventions the appliance uses (404 means absent, 204 acknowledges
//! mutations).

pub mod client;
pub mod config;

pub use client::BastionClient;
pub use config::{ApiConfig, ConnectionSettings, TlsConfig};
