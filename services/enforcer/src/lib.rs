//! EMI device enforcement service library crate.
//!
//! # Purpose
//! Exposes vendor onboarding, device enrollment, lock enforcement, and the
//! HTTP API over them for use by the binary and tests.
//!
//! # Notes
//! Domain services (`registry`, `vendors`, `enforcement`) sit between the
//! HTTP handlers in `api` and the storage backends in `store`.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod enforcement;
pub mod error;
pub mod model;
pub mod observability;
pub mod overlay;
pub mod provisioning;
pub mod registry;
pub mod store;
pub mod vendors;
