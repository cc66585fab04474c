use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use vchain_contract::{ContractError, Response, VoteContract};
use vchain_state::{StateStore, TxContext, WriteSet};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::gateway::{InvocationError, LedgerGateway, PeerError};
use crate::identity::Identity;
use crate::txlog::{ChainError, NewTransaction, TransactionLog, TransactionRecord};

/// Single-process ledger network hosting the vote contract.
///
/// Submissions are serialized through one ordering lock, so concurrent
/// registrations of the same key are decided one after another by the
/// contract. A submission's write set reaches world state only when the
/// contract returns a response; a contract error rolls the whole
/// transaction back. Every submission, committed or not, is appended to a
/// hash-linked [`TransactionLog`].
pub struct InProcessNetwork {
    channel: String,
    identity: Identity,
    peers: Vec<String>,
    contract: VoteContract,
    state: Arc<dyn StateStore>,
    log: Mutex<TransactionLog>,
}

impl InProcessNetwork {
    pub fn new(
        channel: impl Into<String>,
        identity: Identity,
        contract: VoteContract,
        state: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            channel: channel.into(),
            identity,
            peers: vec!["peer0".into()],
            contract,
            state,
            log: Mutex::new(TransactionLog::new()),
        }
    }

    /// Replace the set of endorsing peers.
    pub fn with_peers(mut self, peers: Vec<String>) -> Self {
        self.peers = peers;
        self
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn contract(&self) -> &VoteContract {
        &self.contract
    }

    /// Snapshot of the transaction history.
    pub fn history(&self) -> Vec<TransactionRecord> {
        self.log.lock().expect("transaction log lock poisoned").records().to_vec()
    }

    /// Verify the hash chain of the transaction history.
    pub fn verify_history(&self) -> Result<(), ChainError> {
        self.log.lock().expect("transaction log lock poisoned").verify()
    }

    fn tx_id(&self, seq: u64, function: &str, args: &[Vec<u8>]) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"vchain-txid-v1:");
        hasher.update(self.channel.as_bytes());
        hasher.update(&seq.to_le_bytes());
        hasher.update(function.as_bytes());
        for arg in args {
            hasher.update(&(arg.len() as u64).to_le_bytes());
            hasher.update(arg);
        }
        hex::encode(&hasher.finalize().as_bytes()[..16])
    }

    /// Every peer reports the same non-OK contract response.
    fn rejection(&self, response: &Response) -> InvocationError {
        InvocationError::Composite(
            self.peers
                .iter()
                .map(|peer| PeerError::Status {
                    peer: peer.clone(),
                    code: response.status,
                    message: response.message.clone(),
                })
                .collect(),
        )
    }
}

#[async_trait]
impl LedgerGateway for InProcessNetwork {
    async fn submit_transaction(
        &self,
        function: &str,
        args: &[Vec<u8>],
    ) -> Result<Vec<u8>, InvocationError> {
        let mut log = self
            .log
            .lock()
            .map_err(|_| InvocationError::Unavailable("ordering lock poisoned".into()))?;
        let tx_id = self.tx_id(log.next_seq(), function, args);

        let mut ctx = TxContext::new(self.state.as_ref());
        let outcome = self.contract.invoke(&mut ctx, function, args);
        let writes = ctx.into_write_set();

        let (status, committed, result) = match outcome {
            Ok(response) => match self.state.apply(&writes) {
                Ok(()) if response.is_ok() => (response.status, true, Ok(response.payload)),
                Ok(()) => (response.status, true, Err(self.rejection(&response))),
                Err(e) => (
                    response.status,
                    false,
                    Err(InvocationError::Aborted {
                        tx_id: tx_id.clone(),
                        reason: e.to_string(),
                    }),
                ),
            },
            Err(e) => (
                0,
                false,
                Err(InvocationError::Aborted {
                    tx_id: tx_id.clone(),
                    reason: e.to_string(),
                }),
            ),
        };

        let write_set_digest = if committed {
            writes.digest()
        } else {
            WriteSet::new().digest()
        };
        let record = log.append(NewTransaction {
            tx_id,
            function: function.to_string(),
            submitter: self.identity.msp_id().to_string(),
            status,
            committed,
            write_set_digest,
        });

        if committed {
            debug!(
                channel = %self.channel,
                seq = record.seq,
                tx_id = %record.tx_id,
                status,
                hash = %record.short_hash(),
                "transaction committed"
            );
        } else {
            warn!(channel = %self.channel, seq = record.seq, tx_id = %record.tx_id, "transaction aborted");
        }
        result
    }

    async fn evaluate_transaction(
        &self,
        function: &str,
        args: &[Vec<u8>],
    ) -> Result<Vec<u8>, InvocationError> {
        let mut ctx = TxContext::read_only(self.state.as_ref());
        match self.contract.invoke(&mut ctx, function, args) {
            Ok(response) if response.is_ok() => Ok(response.payload),
            Ok(response) => Err(self.rejection(&response)),
            Err(ContractError::Store(e)) => Err(InvocationError::Unavailable(e.to_string())),
            Err(e) => Err(InvocationError::Other(e.to_string())),
        }
    }
}

/// Load the configured identity and start an in-process network over `state`.
pub fn connect(config: &LedgerConfig, state: Arc<dyn StateStore>) -> LedgerResult<InProcessNetwork> {
    if config.channel.is_empty() {
        return Err(LedgerError::Config("channel must not be empty".into()));
    }
    if config.peers.is_empty() {
        return Err(LedgerError::Config("at least one peer is required".into()));
    }
    let identity = Identity::from_files(&config.msp_id, &config.cert_path, &config.private_key_path)?;
    info!(
        channel = %config.channel,
        msp_id = %identity.msp_id(),
        peers = config.peers.len(),
        policy = ?config.duplicate_policy,
        "connected to ledger network"
    );
    Ok(InProcessNetwork::new(
        config.channel.clone(),
        identity,
        VoteContract::new(config.duplicate_policy),
        state,
    )
    .with_peers(config.peers.clone()))
}
