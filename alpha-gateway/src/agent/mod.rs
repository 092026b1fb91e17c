// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Agent protocol: handshake, report and config.

pub mod service;
pub mod types;

pub use service::AgentGateway;
pub use types::{
    AgentConfigResponse, AgentReport, AgentReportRequest, BlocklistEntry, ClassifyRequest,
    ClassifyResponse, FocusModeSchedule, HandshakeRequest, HandshakeResponse, PolicyDescriptor,
    RejectedLog, ReportResponse, StoredLog,
};
