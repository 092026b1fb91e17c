// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::policy::domain::is_same_or_subdomain;
use crate::policy::heuristics::SOCIAL_MEDIA_DOMAINS;

/// Daily time range during which social-media domains are restricted.
///
/// Both ends are inclusive and compared against the local time-of-day of the
/// evaluation instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyWindow {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub domains: Vec<String>,
}

impl Default for PolicyWindow {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            domains: SOCIAL_MEDIA_DOMAINS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl PolicyWindow {
    /// Whether a local time-of-day falls inside the window
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time <= self.end
    }

    /// Whether a domain is one of the windowed domains (or a subdomain of one)
    pub fn covers(&self, domain: &str) -> bool {
        self.domains
            .iter()
            .any(|d| is_same_or_subdomain(domain, d.as_str()))
    }
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
