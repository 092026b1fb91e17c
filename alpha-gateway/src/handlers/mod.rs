// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
mod agent;
mod filter;
mod health;
mod metrics;

pub use agent::{agent_config, agent_handshake, agent_report};
pub use filter::classify_url;
pub use health::{health_live, health_ready, health_startup};
pub use metrics::{metrics_handler, track_requests};
