use thiserror::Error;

/// Failures of the client-side staking pipeline.
///
/// Encoding and assembly problems are raised before any network call is
/// made. Submission problems carry the underlying detail so the caller
/// can decide whether to retry; the service itself never retries.
#[derive(Debug, Error)]
pub enum StakingError {
    #[error("invalid public key: {0}")]
    InvalidKey(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("transaction has no instructions")]
    EmptyTransaction,

    #[error("missing required signature(s): {0}")]
    SignatureMissing(String),

    #[error("account resolution failed: {0}")]
    ResolutionFailed(String),

    #[error("simulation failed: {0}")]
    SimulationFailed(String),

    #[error("confirmation timeout after {waited_secs}s for {signature}")]
    Timeout { signature: String, waited_secs: u64 },

    #[error("network error: {0}")]
    NetworkError(String),
}

impl StakingError {
    /// Whether the same request may be retried unchanged.
    ///
    /// `Timeout` is ambiguous: the transaction may still land, so check
    /// the ledger for the signature before resubmitting.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StakingError::ResolutionFailed(_)
                | StakingError::Timeout { .. }
                | StakingError::NetworkError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_key() {
        let err = StakingError::InvalidKey("not base58".into());
        assert_eq!(err.to_string(), "invalid public key: not base58");
    }

    #[test]
    fn display_empty_transaction() {
        assert_eq!(
            StakingError::EmptyTransaction.to_string(),
            "transaction has no instructions"
        );
    }

    #[test]
    fn display_timeout() {
        let err = StakingError::Timeout {
            signature: "5kGo".into(),
            waited_secs: 60,
        };
        assert_eq!(err.to_string(), "confirmation timeout after 60s for 5kGo");
    }

    #[test]
    fn retryable_split_matches_taxonomy() {
        assert!(StakingError::ResolutionFailed("rpc down".into()).is_retryable());
        assert!(StakingError::NetworkError("connection reset".into()).is_retryable());
        assert!(StakingError::Timeout {
            signature: "sig".into(),
            waited_secs: 1,
        }
        .is_retryable());

        assert!(!StakingError::InvalidKey("bad".into()).is_retryable());
        assert!(!StakingError::EncodingError("bad".into()).is_retryable());
        assert!(!StakingError::EmptyTransaction.is_retryable());
        assert!(!StakingError::SignatureMissing("who".into()).is_retryable());
        assert!(!StakingError::SimulationFailed("logs".into()).is_retryable());
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> =
            Box::new(StakingError::SimulationFailed("insufficient funds".into()));
        assert!(err.to_string().contains("insufficient funds"));
    }
}
