//! Cache namespaces, content classification, and retry policy.
//!
//! ### Cache namespaces
//! Three named caches exist per worker version: `{VERSION}-static`,
//! `{VERSION}-dynamic` and `{VERSION}-media`. Any cache carrying the product
//! prefix under a different name belongs to an older version and is evicted
//! on activation.
//!
//! ### Classification
//! - `static`: `.js .css .woff .woff2 .ttf .otf`
//! - `media`: `.jpg .jpeg .png .gif .svg .webp .mp4 .webm`
//! - `dynamic`: everything else
//!
//! Extensions match case-insensitively. `max_age` and `max_items` on each
//! policy are declared intent only; eviction happens by version.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

static STATIC_ASSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(js|css|woff2?|ttf|otf)$").expect("valid static asset pattern"));

static MEDIA_ASSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(jpg|jpeg|png|gif|svg|webp|mp4|webm)$").expect("valid media asset pattern")
});

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Logical cache a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    Static,
    Dynamic,
    Media,
}

impl CacheKind {
    pub const ALL: [CacheKind; 3] = [CacheKind::Static, CacheKind::Dynamic, CacheKind::Media];

    pub fn as_str(self) -> &'static str {
        match self {
            CacheKind::Static => "static",
            CacheKind::Dynamic => "dynamic",
            CacheKind::Media => "media",
        }
    }
}

impl std::fmt::Display for CacheKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Versioned cache names for one worker generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNames {
    version: String,
}

impl CacheNames {
    pub fn new(version: impl Into<String>) -> Self {
        Self { version: version.into() }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn name(&self, kind: CacheKind) -> String {
        format!("{}-{}", self.version, kind.as_str())
    }

    pub fn all(&self) -> [String; 3] {
        CacheKind::ALL.map(|kind| self.name(kind))
    }

    pub fn is_current(&self, name: &str) -> bool {
        CacheKind::ALL.iter().any(|kind| self.name(*kind) == name)
    }

    /// A product cache left behind by another version.
    pub fn is_stale(&self, name: &str, prefix: &str) -> bool {
        name.starts_with(prefix) && !self.is_current(name)
    }
}

/// Per-kind cache policy.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    pub kind: CacheKind,
    pub max_age: Duration,
    pub max_items: Option<usize>,
    patterns: Vec<Regex>,
}

impl CachePolicy {
    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(path))
    }
}

/// Ordered classification rules; the first matching policy wins.
#[derive(Debug, Clone)]
pub struct CacheRules {
    policies: Vec<CachePolicy>,
}

impl Default for CacheRules {
    fn default() -> Self {
        Self {
            policies: vec![
                CachePolicy {
                    kind: CacheKind::Static,
                    max_age: DAY * 30,
                    max_items: None,
                    patterns: vec![STATIC_ASSET.clone()],
                },
                CachePolicy { kind: CacheKind::Media, max_age: DAY * 365, max_items: None, patterns: vec![MEDIA_ASSET.clone()] },
                CachePolicy { kind: CacheKind::Dynamic, max_age: DAY, max_items: Some(50), patterns: Vec::new() },
            ],
        }
    }
}

impl CacheRules {
    /// Classify a URL path. Total: anything unmatched is `Dynamic`.
    pub fn classify(&self, path: &str) -> CacheKind {
        self.policies
            .iter()
            .find(|policy| policy.matches(path))
            .map(|policy| policy.kind)
            .unwrap_or(CacheKind::Dynamic)
    }

    pub fn policy(&self, kind: CacheKind) -> Option<&CachePolicy> {
        self.policies.iter().find(|p| p.kind == kind)
    }
}

/// Bounded retry schedule for network fetches. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    delays: Vec<Duration>,
    timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            3,
            vec![Duration::from_millis(1000), Duration::from_millis(2000), Duration::from_millis(4000)],
            Duration::from_millis(10_000),
        )
    }
}

impl RetryPolicy {
    /// `attempts` is clamped to at least one.
    pub fn new(attempts: u32, delays: Vec<Duration>, timeout: Duration) -> Self {
        Self { attempts: attempts.max(1), delays, timeout }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether `attempt` (0-based) is the last one allowed.
    pub fn is_final(&self, attempt: u32) -> bool {
        attempt + 1 >= self.attempts
    }

    /// Delay to wait after a failed `attempt`, indexed by attempt number.
    /// Falls back to the last listed delay when the list is short.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.delays
            .get(attempt as usize)
            .or_else(|| self.delays.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}
