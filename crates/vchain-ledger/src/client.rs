use std::sync::Arc;

use tracing::debug;

use vchain_codec::VoteCodec;
use vchain_contract::{status, FN_FIND_VOTE, FN_REGISTER_VOTE};
use vchain_types::{format_candidate_id, Vote};

use crate::error::{LedgerError, LedgerResult};
use crate::gateway::{InvocationError, LedgerGateway, PeerError};

/// Outcome of submitting one vote to the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Registration {
    /// The vote was committed.
    Ack,
    /// The contract refused the vote because its key already holds an
    /// entry. Final: the refusal is already recorded on the ledger.
    RejectedDuplicate { reason: String },
    /// The ledger could not be reached or rolled the transaction back.
    Transient { cause: String },
    /// The ledger answered with an error shape this client does not
    /// recognize. Retried like a transient failure, but signals that the
    /// contract and client disagree.
    ProtocolViolation { cause: String },
}

impl Registration {
    /// `true` when retrying cannot change the outcome.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Ack | Self::RejectedDuplicate { .. })
    }

    /// Classify an invocation error of the state-changing entry point.
    ///
    /// A composite error is scanned peer by peer: the first peer carrying
    /// the contract's rejection status decides `RejectedDuplicate`; a peer
    /// without a status code means the error shape changed. A composite made
    /// only of other status codes is transient.
    pub fn classify(err: InvocationError) -> Self {
        match err {
            InvocationError::Composite(peers) if peers.is_empty() => Self::ProtocolViolation {
                cause: "composite error without peer responses".into(),
            },
            InvocationError::Composite(peers) => {
                for peer in &peers {
                    match peer {
                        PeerError::Status { code, message, .. } if *code == status::ERROR => {
                            return Self::RejectedDuplicate {
                                reason: message.clone(),
                            };
                        }
                        PeerError::Status { .. } => {}
                        PeerError::Unstructured { .. } => {
                            return Self::ProtocolViolation {
                                cause: format!("failed to decode one of composite errors: {peer}"),
                            };
                        }
                    }
                }
                Self::Transient {
                    cause: InvocationError::Composite(peers).to_string(),
                }
            }
            InvocationError::Unavailable(_) | InvocationError::Aborted { .. } => Self::Transient {
                cause: err.to_string(),
            },
            InvocationError::Other(_) => Self::ProtocolViolation {
                cause: format!("failed to decode contract error: {err}"),
            },
        }
    }
}

/// Registers and finds votes through a [`LedgerGateway`].
#[derive(Clone)]
pub struct LedgerClient {
    gateway: Arc<dyn LedgerGateway>,
}

impl LedgerClient {
    pub fn new(gateway: Arc<dyn LedgerGateway>) -> Self {
        Self { gateway }
    }

    /// Submit a vote to the registration entry point.
    ///
    /// Errors only when the vote cannot be encoded; every ledger-side
    /// outcome is a [`Registration`].
    pub async fn register_vote(&self, vote: &Vote) -> LedgerResult<Registration> {
        let encoded = VoteCodec::encode(vote).map_err(LedgerError::Encode)?;
        let registration = match self.gateway.submit_transaction(FN_REGISTER_VOTE, &[encoded]).await {
            Ok(_) => Registration::Ack,
            Err(err) => Registration::classify(err),
        };
        debug!(key = %vote.key(), ?registration, "register vote");
        Ok(registration)
    }

    /// Look up the vote stored for a candidate/passport pair.
    pub async fn find_vote(&self, candidate_id: u64, passport: &str) -> LedgerResult<Vote> {
        if candidate_id == 0 {
            return Err(LedgerError::InvalidInput("candidate id must be positive".into()));
        }
        if passport.is_empty() {
            return Err(LedgerError::InvalidInput("passport must not be empty".into()));
        }

        let args = [
            format_candidate_id(candidate_id).into_bytes(),
            passport.as_bytes().to_vec(),
        ];
        let stored = self
            .gateway
            .evaluate_transaction(FN_FIND_VOTE, &args)
            .await
            .map_err(|source| LedgerError::Invocation {
                function: FN_FIND_VOTE,
                source,
            })?;

        if stored.is_empty() {
            return Err(LedgerError::VoteNotFound);
        }
        VoteCodec::decode(&stored).map_err(LedgerError::Inconsistent)
    }
}
