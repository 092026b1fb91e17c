// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Alpha Gateway - agent trust protocol and classification API
//!
//! Endpoint agents exchange their device id for a short-lived credential,
//! then fetch the active blocklist, report visits and ask for URL
//! classifications. Classification is delegated to
//! [`alpha_policy_engine`] behind a TTL cache.

pub mod agent;
pub mod app;
pub mod audit;
pub mod auth;
pub mod cache;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod state;
pub mod store;

pub use app::build_router;
pub use config::Config;
pub use error::GatewayError;
pub use state::AppState;
