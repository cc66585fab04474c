use async_trait::async_trait;

/// One peer's contribution to a failed transaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeerError {
    /// The peer ran the contract and it answered with a non-OK status.
    #[error("peer {peer} responded with status {code}: {message}")]
    Status {
        peer: String,
        code: i32,
        message: String,
    },

    /// The peer failed in a way that carries no status code.
    #[error("peer {peer}: {description}")]
    Unstructured { peer: String, description: String },
}

/// Error returned by the ledger network for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvocationError {
    /// Per-peer failures aggregated for one transaction.
    #[error("transaction rejected: [{}]", join_peers(.0))]
    Composite(Vec<PeerError>),

    /// The network could not be reached.
    #[error("ledger network unavailable: {0}")]
    Unavailable(String),

    /// The transaction ran but was rolled back.
    #[error("transaction {tx_id} aborted: {reason}")]
    Aborted { tx_id: String, reason: String },

    /// Anything the network reports in a shape this client does not model.
    #[error("unrecognized ledger error: {0}")]
    Other(String),
}

fn join_peers(peers: &[PeerError]) -> String {
    peers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Invocation boundary of a ledger network.
///
/// Implementations must be safe for concurrent use by several partition
/// workers. Ordering of writes to the same key is the network's concern.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Run a state-changing entry point and wait for it to commit.
    async fn submit_transaction(
        &self,
        function: &str,
        args: &[Vec<u8>],
    ) -> Result<Vec<u8>, InvocationError>;

    /// Run a read-only entry point. Never changes ledger state.
    async fn evaluate_transaction(
        &self,
        function: &str,
        args: &[Vec<u8>],
    ) -> Result<Vec<u8>, InvocationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_display_lists_every_peer() {
        let err = InvocationError::Composite(vec![
            PeerError::Status {
                peer: "peer0".into(),
                code: 500,
                message: "dup".into(),
            },
            PeerError::Unstructured {
                peer: "peer1".into(),
                description: "timeout".into(),
            },
        ]);
        let text = err.to_string();
        assert!(text.contains("peer0 responded with status 500: dup"));
        assert!(text.contains("peer peer1: timeout"));
    }
}
