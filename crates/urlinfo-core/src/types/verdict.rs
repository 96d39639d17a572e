use serde::{Deserialize, Serialize};

use super::{ThreatLevel, ThreatType};
use crate::NormalizedUrl;

/// Aggregated determination for one URL, as returned to callers and cached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// The normalized URL that was checked
    pub url: NormalizedUrl,

    /// True if any responding source reported a match
    pub is_malicious: bool,

    /// Severity derived from the strongest match
    pub threat_level: ThreatLevel,

    /// Threat category of the dominant match
    #[serde(default)]
    pub threat_type: Option<ThreatType>,

    /// Highest confidence among malicious matches, 0.0 when safe
    pub confidence_score: f64,

    /// Sources that answered in time, in registration order
    #[serde(default)]
    pub sources_queried: Vec<String>,
}

impl Verdict {
    /// A clean verdict for `url`
    #[must_use]
    pub fn safe(url: NormalizedUrl, sources_queried: Vec<String>) -> Self {
        Self {
            url,
            is_malicious: false,
            threat_level: ThreatLevel::Safe,
            threat_type: None,
            confidence_score: 0.0,
            sources_queried,
        }
    }
}
