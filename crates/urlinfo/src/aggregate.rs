//! Combining per-source answers into a single verdict.

use urlinfo_core::{NormalizedUrl, ThreatInfo, ThreatLevel, ThreatType, Verdict};
use urlinfo_sources::SourceError;

/// Default confidence above which a match is reported as malicious
pub const DEFAULT_HIGH_CONFIDENCE: f64 = 0.7;

/// What one source contributed to a check
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    /// The source reported a record for the URL
    Match(ThreatInfo),
    /// The source answered and has no record
    Clean,
    /// The source answered with an error before the deadline
    Failed(String),
    /// The deadline passed first
    TimedOut,
}

impl SourceOutcome {
    /// True if the source responded in time, successfully or not
    #[must_use]
    pub const fn responded(&self) -> bool {
        !matches!(self, Self::TimedOut)
    }

    /// True if the source gave a usable answer
    #[must_use]
    pub const fn answered(&self) -> bool {
        matches!(self, Self::Match(_) | Self::Clean)
    }
}

impl From<Result<Option<ThreatInfo>, SourceError>> for SourceOutcome {
    fn from(result: Result<Option<ThreatInfo>, SourceError>) -> Self {
        match result {
            Ok(Some(info)) => Self::Match(info),
            Ok(None) => Self::Clean,
            Err(err) if err.is_timeout() => Self::TimedOut,
            Err(err) => Self::Failed(err.to_string()),
        }
    }
}

/// Fold source outcomes, given in registration order, into a verdict.
///
/// The malicious match with the highest confidence dominates; on a tie the
/// earliest registered source wins. Sources that timed out are left out of
/// `sources_queried`. Failures are listed but carry no signal.
#[must_use]
pub fn aggregate(url: NormalizedUrl, outcomes: &[(String, SourceOutcome)], high_confidence: f64) -> Verdict {
    let sources_queried = outcomes
        .iter()
        .filter(|(_, outcome)| outcome.responded())
        .map(|(id, _)| id.clone())
        .collect();

    let dominant = outcomes
        .iter()
        .filter_map(|(_, outcome)| match outcome {
            SourceOutcome::Match(info) if info.is_malicious => Some(info),
            _ => None,
        })
        .fold(None::<&ThreatInfo>, |best, info| match best {
            Some(best) if best.confidence_score >= info.confidence_score => Some(best),
            _ => Some(info),
        });

    let Some(info) = dominant else {
        return Verdict::safe(url, sources_queried);
    };

    let threat_level = if info.confidence_score > high_confidence {
        ThreatLevel::Malicious
    } else {
        ThreatLevel::Suspicious
    };

    Verdict {
        url,
        is_malicious: true,
        threat_level,
        threat_type: Some(info.threat_type.unwrap_or(ThreatType::Malware)),
        confidence_score: info.confidence_score,
        sources_queried,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> NormalizedUrl {
        NormalizedUrl::parse("http://evil.net/").unwrap()
    }

    fn matched(id: &str, threat_type: ThreatType, confidence: f64) -> (String, SourceOutcome) {
        (
            id.to_string(),
            SourceOutcome::Match(ThreatInfo::malicious(id, threat_type, confidence)),
        )
    }

    #[test]
    fn test_no_outcomes_is_safe() {
        let verdict = aggregate(url(), &[], DEFAULT_HIGH_CONFIDENCE);
        assert!(!verdict.is_malicious);
        assert_eq!(verdict.threat_level, ThreatLevel::Safe);
        assert_eq!(verdict.confidence_score, 0.0);
        assert!(verdict.sources_queried.is_empty());
    }

    #[test]
    fn test_highest_confidence_dominates() {
        let outcomes = vec![
            matched("file-a", ThreatType::Spam, 0.4),
            ("http-endpoint-0".to_string(), SourceOutcome::Clean),
            matched("file-b", ThreatType::Phishing, 0.95),
        ];
        let verdict = aggregate(url(), &outcomes, DEFAULT_HIGH_CONFIDENCE);
        assert!(verdict.is_malicious);
        assert_eq!(verdict.threat_level, ThreatLevel::Malicious);
        assert_eq!(verdict.threat_type, Some(ThreatType::Phishing));
        assert_eq!(verdict.confidence_score, 0.95);
        assert_eq!(verdict.sources_queried, vec!["file-a", "http-endpoint-0", "file-b"]);
    }

    #[test]
    fn test_tie_goes_to_first_registered() {
        let outcomes = vec![
            matched("file-a", ThreatType::Trojan, 0.9),
            matched("file-b", ThreatType::Phishing, 0.9),
        ];
        let verdict = aggregate(url(), &outcomes, DEFAULT_HIGH_CONFIDENCE);
        assert_eq!(verdict.threat_type, Some(ThreatType::Trojan));
    }

    #[test]
    fn test_threshold_is_strict() {
        let outcomes = vec![matched("file-a", ThreatType::Malware, 0.7)];
        let verdict = aggregate(url(), &outcomes, 0.7);
        assert!(verdict.is_malicious);
        assert_eq!(verdict.threat_level, ThreatLevel::Suspicious);
    }

    #[test]
    fn test_timeouts_excluded_failures_listed() {
        let outcomes = vec![
            ("file-a".to_string(), SourceOutcome::Clean),
            ("http-endpoint-0".to_string(), SourceOutcome::TimedOut),
            ("http-endpoint-1".to_string(), SourceOutcome::Failed("status 503".into())),
        ];
        let verdict = aggregate(url(), &outcomes, DEFAULT_HIGH_CONFIDENCE);
        assert!(!verdict.is_malicious);
        assert_eq!(verdict.sources_queried, vec!["file-a", "http-endpoint-1"]);
    }

    #[test]
    fn test_non_malicious_match_counts_as_clean() {
        let info = ThreatInfo {
            is_malicious: false,
            threat_type: None,
            confidence_score: 0.0,
            source_id: "http-endpoint-0".into(),
        };
        let outcomes = vec![("http-endpoint-0".to_string(), SourceOutcome::Match(info))];
        let verdict = aggregate(url(), &outcomes, DEFAULT_HIGH_CONFIDENCE);
        assert!(!verdict.is_malicious);
        assert_eq!(verdict.sources_queried, vec!["http-endpoint-0"]);
    }

    #[test]
    fn test_outcome_from_source_result() {
        assert_eq!(SourceOutcome::from(Ok(None)), SourceOutcome::Clean);
        assert_eq!(SourceOutcome::from(Err(SourceError::Timeout)), SourceOutcome::TimedOut);
        assert!(matches!(
            SourceOutcome::from(Err(SourceError::Status(503))),
            SourceOutcome::Failed(_)
        ));
        assert!(!SourceOutcome::TimedOut.responded());
        assert!(SourceOutcome::Failed(String::new()).responded());
        assert!(!SourceOutcome::Failed(String::new()).answered());
    }
}
