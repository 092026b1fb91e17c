// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Keyword heuristics applied when no explicit rule or policy window fires.
//!
//! These are best-effort signals over the raw URL and its domain, not a
//! content classifier.

use crate::policy::category::Category;
use crate::policy::domain::is_same_or_subdomain;

/// Domains restricted during the policy window
pub const SOCIAL_MEDIA_DOMAINS: &[&str] = &[
    "facebook.com",
    "instagram.com",
    "tiktok.com",
    "x.com",
    "twitter.com",
];

pub const ADULT_KEYWORDS: &[&str] = &["porn", "xxx", "nsfw", "hentai", "camgirl"];

pub const GAMING_KEYWORDS: &[&str] = &[
    "game",
    "roblox",
    "minecraft",
    "fortnite",
    "steampowered",
    "twitch.tv",
    "epicgames",
];

pub const EDUCATION_KEYWORDS: &[&str] = &[
    "scholar",
    "khanacademy",
    "wikipedia.org",
    "coursera",
    "edx.org",
    "school",
    "university",
];

/// Outcome of the heuristic pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicVerdict {
    pub category: Category,
    pub reason: &'static str,
}

/// Classify by keyword containment. `None` means no heuristic applied.
///
/// Order matters: adult content beats everything else, then social media,
/// gaming and finally education.
pub fn classify(url: &str, domain: &str) -> Option<HeuristicVerdict> {
    let url = url.to_lowercase();
    let mentions = |keywords: &[&str]| {
        keywords
            .iter()
            .any(|k| url.contains(k) || domain.contains(k))
    };

    if mentions(ADULT_KEYWORDS) {
        return Some(HeuristicVerdict {
            category: Category::C,
            reason: "Adult content keyword",
        });
    }

    if SOCIAL_MEDIA_DOMAINS
        .iter()
        .any(|d| is_same_or_subdomain(domain, d))
    {
        return Some(HeuristicVerdict {
            category: Category::A,
            reason: "Social media outside policy window",
        });
    }

    if mentions(GAMING_KEYWORDS) {
        return Some(HeuristicVerdict {
            category: Category::B,
            reason: "Gaming keyword",
        });
    }

    if domain.ends_with(".edu") || mentions(EDUCATION_KEYWORDS) {
        return Some(HeuristicVerdict {
            category: Category::A,
            reason: "Educational resource (heuristic)",
        });
    }

    None
}
