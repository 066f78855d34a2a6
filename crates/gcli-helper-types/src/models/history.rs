//! Verification history records.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// What caused a verification attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TriggerReason {
    /// Timer-driven sweep.
    Scheduled,
    /// Operator-triggered sweep.
    Manual,
}

impl TriggerReason {
    fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(Self::Scheduled),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// Outcome of a single verification attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VerifyOutcome {
    /// Upstream confirmed the credential is usable again.
    Success,
    /// The verify call failed or the upstream rejected it.
    Failure,
    /// The attempt was skipped (e.g. a sweep was already in flight).
    Skipped,
}

impl VerifyOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Skipped => "skipped",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failure" => Some(Self::Failure),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}

/// One verification attempt. Immutable once created; the history store
/// appends these and evicts oldest-first past its bound.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationRecord {
    /// When the attempt happened.
    pub timestamp: DateTime<Utc>,
    /// Credential the attempt targeted. Sweep-level events (e.g. the
    /// listing call failing) use an empty id.
    pub credential: String,
    /// What caused the attempt.
    pub reason: TriggerReason,
    /// How the attempt ended.
    pub outcome: VerifyOutcome,
    /// Upstream message or error detail, if any.
    pub detail: Option<String>,
}

impl VerificationRecord {
    /// Create a record stamped with the current time.
    pub fn now(
        credential: impl Into<String>,
        reason: TriggerReason,
        outcome: VerifyOutcome,
        detail: Option<String>,
    ) -> Self {
        Self { timestamp: Utc::now(), credential: credential.into(), reason, outcome, detail }
    }

    /// Serialize to one export line:
    /// `[timestamp] [reason] [outcome] credential - detail`
    pub fn to_line(&self) -> String {
        let ts = self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut line = format!(
            "[{}] [{}] [{}] {}",
            ts,
            self.reason.as_str(),
            self.outcome.as_str(),
            self.credential
        );
        if let Some(detail) = &self.detail {
            line.push_str(" - ");
            line.push_str(detail);
        }
        line
    }

    /// Parse a line produced by [`Self::to_line`]. Returns `None` for
    /// lines that don't match the export format.
    pub fn parse_line(line: &str) -> Option<Self> {
        let rest = line.strip_prefix('[')?;
        let (ts, rest) = rest.split_once("] [")?;
        let (reason, rest) = rest.split_once("] [")?;
        let (outcome, rest) = rest.split_once("] ")?;

        let timestamp = DateTime::parse_from_rfc3339(ts).ok()?.with_timezone(&Utc);
        let reason = TriggerReason::parse(reason)?;
        let outcome = VerifyOutcome::parse(outcome)?;

        let (credential, detail) = match rest.split_once(" - ") {
            Some((cred, detail)) => (cred.to_string(), Some(detail.to_string())),
            None => (rest.to_string(), None),
        };

        Some(Self { timestamp, credential, reason, outcome, detail })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_round_trip() {
        let record = VerificationRecord::now(
            "cred-1.json",
            TriggerReason::Scheduled,
            VerifyOutcome::Success,
            Some("credential re-enabled".to_string()),
        );
        let parsed = VerificationRecord::parse_line(&record.to_line()).unwrap();
        assert_eq!(parsed.credential, record.credential);
        assert_eq!(parsed.reason, record.reason);
        assert_eq!(parsed.outcome, record.outcome);
        assert_eq!(parsed.detail, record.detail);
        assert_eq!(
            parsed.timestamp.timestamp_millis(),
            record.timestamp.timestamp_millis()
        );
    }

    #[test]
    fn test_line_round_trip_without_detail() {
        let record = VerificationRecord::now(
            "cred-2.json",
            TriggerReason::Manual,
            VerifyOutcome::Failure,
            None,
        );
        let parsed = VerificationRecord::parse_line(&record.to_line()).unwrap();
        assert_eq!(parsed.detail, None);
        assert_eq!(parsed.outcome, VerifyOutcome::Failure);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(VerificationRecord::parse_line("not a record").is_none());
        assert!(VerificationRecord::parse_line("[ts] [bogus] [success] x").is_none());
    }
}
