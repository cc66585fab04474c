use serde::Serialize;

/// One transaction as recorded by the ledger network.
///
/// Records form a hash chain: each record's `hash` covers its own fields and
/// the previous record's hash, so rewriting any past record breaks every
/// link after it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRecord {
    pub seq: u64,
    pub tx_id: String,
    pub function: String,
    /// MSP id of the submitting identity.
    pub submitter: String,
    /// Contract response status; meaningless when `committed` is `false`.
    pub status: i32,
    /// Whether the write set reached world state.
    pub committed: bool,
    pub write_set_digest: [u8; 32],
    pub prev_hash: Option<[u8; 32]>,
    pub hash: [u8; 32],
}

/// Fields of a record that the chain hash commits to.
#[derive(Serialize)]
struct RecordPayload<'a> {
    seq: u64,
    tx_id: &'a str,
    function: &'a str,
    submitter: &'a str,
    status: i32,
    committed: bool,
    write_set_digest: [u8; 32],
}

impl TransactionRecord {
    fn payload_bytes(&self) -> Vec<u8> {
        let payload = RecordPayload {
            seq: self.seq,
            tx_id: &self.tx_id,
            function: &self.function,
            submitter: &self.submitter,
            status: self.status,
            committed: self.committed,
            write_set_digest: self.write_set_digest,
        };
        // Serializing a struct of plain fields into a Vec cannot fail.
        bincode::serialize(&payload).unwrap_or_default()
    }

    /// Compute the chain hash for a payload and optional previous hash.
    fn compute_hash(payload: &[u8], prev_hash: Option<[u8; 32]>) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"vchain-tx-v1:");
        if let Some(prev) = prev_hash {
            hasher.update(&prev);
        }
        hasher.update(payload);
        *hasher.finalize().as_bytes()
    }

    pub fn short_hash(&self) -> String {
        hex::encode(&self.hash[..4])
    }
}

/// Fields supplied by the network when appending a transaction.
#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub tx_id: String,
    pub function: String,
    pub submitter: String,
    pub status: i32,
    pub committed: bool,
    pub write_set_digest: [u8; 32],
}

/// Append-only, hash-linked transaction history.
#[derive(Clone, Debug, Default)]
pub struct TransactionLog {
    records: Vec<TransactionRecord>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number the next appended record will carry.
    pub fn next_seq(&self) -> u64 {
        self.records.len() as u64 + 1
    }

    pub fn append(&mut self, tx: NewTransaction) -> &TransactionRecord {
        let prev_hash = self.records.last().map(|r| r.hash);
        let mut record = TransactionRecord {
            seq: self.next_seq(),
            tx_id: tx.tx_id,
            function: tx.function,
            submitter: tx.submitter,
            status: tx.status,
            committed: tx.committed,
            write_set_digest: tx.write_set_digest,
            prev_hash,
            hash: [0; 32],
        };
        record.hash = TransactionRecord::compute_hash(&record.payload_bytes(), prev_hash);
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Verify sequence numbers, hash links, and every record hash.
    pub fn verify(&self) -> Result<(), ChainError> {
        Self::verify_records(&self.records)
    }

    pub fn verify_records(records: &[TransactionRecord]) -> Result<(), ChainError> {
        let mut expected_prev = None;
        for (index, record) in records.iter().enumerate() {
            if record.seq != index as u64 + 1 {
                return Err(ChainError::SequenceGap { index });
            }
            match (index, record.prev_hash) {
                (0, Some(_)) => return Err(ChainError::GenesisHasPrevHash),
                (0, None) => {}
                (_, None) => return Err(ChainError::MissingPrevHash { index }),
                (_, Some(prev)) if Some(prev) != expected_prev => {
                    return Err(ChainError::BrokenLink { index })
                }
                _ => {}
            }
            let computed = TransactionRecord::compute_hash(&record.payload_bytes(), record.prev_hash);
            if computed != record.hash {
                return Err(ChainError::HashMismatch { index });
            }
            expected_prev = Some(record.hash);
        }
        Ok(())
    }
}

/// Errors from transaction log verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("genesis record has a previous hash (should be None)")]
    GenesisHasPrevHash,

    #[error("sequence gap at index {index}")]
    SequenceGap { index: usize },

    #[error("broken link at index {index}: prev_hash does not match")]
    BrokenLink { index: usize },

    #[error("missing prev_hash at index {index} (should reference previous record)")]
    MissingPrevHash { index: usize },

    #[error("hash mismatch at index {index}: computed hash differs from stored")]
    HashMismatch { index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(n: u8) -> NewTransaction {
        NewTransaction {
            tx_id: format!("tx{n}"),
            function: "RegisterVote".into(),
            submitter: "Org1MSP".into(),
            status: 200,
            committed: true,
            write_set_digest: [n; 32],
        }
    }

    fn log_of(n: u8) -> TransactionLog {
        let mut log = TransactionLog::new();
        for i in 0..n {
            log.append(tx(i));
        }
        log
    }

    #[test]
    fn empty_log_verifies() {
        assert!(TransactionLog::new().verify().is_ok());
    }

    #[test]
    fn appended_records_link() {
        let log = log_of(3);
        assert_eq!(log.len(), 3);
        assert!(log.records()[0].prev_hash.is_none());
        assert_eq!(log.records()[1].prev_hash, Some(log.records()[0].hash));
        assert_eq!(log.records()[2].seq, 3);
        assert!(log.verify().is_ok());
    }

    #[test]
    fn tampered_field_is_detected() {
        let mut records = log_of(3).records().to_vec();
        records[1].status = 500;
        assert_eq!(
            TransactionLog::verify_records(&records),
            Err(ChainError::HashMismatch { index: 1 })
        );
    }

    #[test]
    fn rehashed_record_breaks_next_link() {
        let mut records = log_of(3).records().to_vec();
        records[1].committed = false;
        records[1].hash =
            TransactionRecord::compute_hash(&records[1].payload_bytes(), records[1].prev_hash);
        assert_eq!(
            TransactionLog::verify_records(&records),
            Err(ChainError::BrokenLink { index: 2 })
        );
    }

    #[test]
    fn removed_record_is_a_gap() {
        let mut records = log_of(3).records().to_vec();
        records.remove(1);
        assert_eq!(
            TransactionLog::verify_records(&records),
            Err(ChainError::SequenceGap { index: 1 })
        );
    }

    #[test]
    fn genesis_with_prev_hash() {
        let mut records = log_of(1).records().to_vec();
        records[0].prev_hash = Some([1; 32]);
        assert_eq!(
            TransactionLog::verify_records(&records),
            Err(ChainError::GenesisHasPrevHash)
        );
    }
}
