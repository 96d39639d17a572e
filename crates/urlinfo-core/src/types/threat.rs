use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Category of threat a source attributes to a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatType {
    /// Credential harvesting or impersonation
    Phishing,
    /// Generic malicious payload
    #[default]
    Malware,
    /// Trojan distribution
    Trojan,
    /// Spam or unsolicited content
    Spam,
    /// No threat attributed
    None,
}

impl ThreatType {
    /// Parse a type label from a threat feed.
    ///
    /// Feeds use their own vocabularies; anything unrecognised is reported as
    /// generic malware rather than discarded.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or(Self::Malware)
    }
}

impl FromStr for ThreatType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "phishing" => Ok(Self::Phishing),
            "malware" => Ok(Self::Malware),
            "trojan" => Ok(Self::Trojan),
            "spam" => Ok(Self::Spam),
            "none" | "" => Ok(Self::None),
            other => Err(format!("unknown threat type: {other}")),
        }
    }
}

impl std::fmt::Display for ThreatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Phishing => write!(f, "phishing"),
            Self::Malware => write!(f, "malware"),
            Self::Trojan => write!(f, "trojan"),
            Self::Spam => write!(f, "spam"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Severity of an aggregated verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    /// No source reported a match
    #[default]
    Safe,
    /// Matched, but no match crossed the high-confidence threshold
    Suspicious,
    /// At least one high-confidence match
    Malicious,
}

impl std::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => write!(f, "safe"),
            Self::Suspicious => write!(f, "suspicious"),
            Self::Malicious => write!(f, "malicious"),
        }
    }
}

/// A single source's answer for one URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatInfo {
    /// Whether the source considers the URL malicious
    pub is_malicious: bool,

    /// Threat category, absent when safe
    #[serde(default)]
    pub threat_type: Option<ThreatType>,

    /// Confidence in [0.0, 1.0]
    pub confidence_score: f64,

    /// Identifier of the reporting source
    pub source_id: String,
}

impl ThreatInfo {
    /// A malicious match reported by `source_id`
    #[must_use]
    pub fn malicious(source_id: impl Into<String>, threat_type: ThreatType, confidence: f64) -> Self {
        Self {
            is_malicious: true,
            threat_type: Some(threat_type),
            confidence_score: clamp_confidence(confidence, 1.0),
            source_id: source_id.into(),
        }
    }
}

/// Clamp a reported confidence into [0.0, 1.0], substituting `fallback` for
/// NaN and infinities.
#[must_use]
pub fn clamp_confidence(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}
