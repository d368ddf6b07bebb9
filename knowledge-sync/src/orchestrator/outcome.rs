//! Per-message outcomes.

/// What happened to a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// The routed action was applied (or intentionally skipped) and recorded.
    Processed,
    /// The fingerprint was already in the ledger.
    SkippedDuplicate,
    /// The event failed validation and was recorded without touching the index.
    SkippedInvalid,
    /// The circuit breaker refused execution.
    CircuitOpen,
    /// The rate limiter refused an index operation.
    RateLimited,
    /// The payload could not be parsed.
    Malformed,
    /// A downstream call failed or timed out.
    Failed,
}

impl MessageOutcome {
    /// Whether the source may move past this message.
    ///
    /// Deferred outcomes are left uncommitted so the message is delivered again.
    pub fn should_commit(&self) -> bool {
        !matches!(
            self,
            MessageOutcome::CircuitOpen | MessageOutcome::RateLimited | MessageOutcome::Failed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageOutcome::Processed => "processed",
            MessageOutcome::SkippedDuplicate => "skipped_duplicate",
            MessageOutcome::SkippedInvalid => "skipped_invalid",
            MessageOutcome::CircuitOpen => "circuit_open",
            MessageOutcome::RateLimited => "rate_limited",
            MessageOutcome::Malformed => "malformed",
            MessageOutcome::Failed => "failed",
        }
    }
}

impl std::fmt::Display for MessageOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deferred_outcomes_are_not_committed() {
        assert!(MessageOutcome::Processed.should_commit());
        assert!(MessageOutcome::SkippedDuplicate.should_commit());
        assert!(MessageOutcome::SkippedInvalid.should_commit());
        assert!(MessageOutcome::Malformed.should_commit());

        assert!(!MessageOutcome::CircuitOpen.should_commit());
        assert!(!MessageOutcome::RateLimited.should_commit());
        assert!(!MessageOutcome::Failed.should_commit());
    }
}
