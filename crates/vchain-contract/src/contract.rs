use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use vchain_codec::VoteCodec;
use vchain_state::TxContext;
use vchain_types::LedgerKey;

use crate::error::ContractResult;
use crate::response::Response;

/// State-changing entry point: one argument, the encoded vote.
pub const FN_REGISTER_VOTE: &str = "RegisterVote";

/// Read-only entry point: `(candidate_id, passport)`, candidate id in decimal.
pub const FN_FIND_VOTE: &str = "FindVote";

/// Fail reason stamped on, and returned for, a duplicate registration.
pub const DUPLICATE_REASON: &str = "vote by voter with this passport already exists";

/// What a registration does when its key already holds an entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Replace the entry with the incoming vote, marked `FAIL` with the
    /// rejection reason. The entry always reflects the latest attempt.
    #[default]
    Overwrite,
    /// Leave the existing entry untouched. The entry always reflects the
    /// first accepted vote.
    Reject,
}

/// The vote registration contract.
#[derive(Clone, Debug, Default)]
pub struct VoteContract {
    policy: DuplicatePolicy,
}

impl VoteContract {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Dispatch an invocation by entry-point name.
    pub fn invoke(
        &self,
        ctx: &mut TxContext<'_>,
        function: &str,
        args: &[Vec<u8>],
    ) -> ContractResult<Response> {
        match (function, args) {
            (FN_REGISTER_VOTE, [vote]) => self.register_vote(ctx, vote),
            (FN_FIND_VOTE, [candidate_id, passport]) => {
                let (Ok(candidate_id), Ok(passport)) =
                    (std::str::from_utf8(candidate_id), std::str::from_utf8(passport))
                else {
                    return Ok(Response::bad_request("arguments must be UTF-8"));
                };
                self.find_vote(ctx, candidate_id, passport)
            }
            (FN_REGISTER_VOTE | FN_FIND_VOTE, _) => Ok(Response::bad_request(format!(
                "wrong number of arguments for {function}: {}",
                args.len()
            ))),
            _ => Ok(Response::bad_request(format!("unknown function {function:?}"))),
        }
    }

    /// Register one encoded vote.
    ///
    /// An absent key gets the vote stamped `SUCCESS`. A present key yields a
    /// business rejection ([`crate::status::ERROR`]); under
    /// [`DuplicatePolicy::Overwrite`] the incoming vote is also stored,
    /// stamped `FAIL` with the rejection reason. Storage errors abort the
    /// invocation.
    pub fn register_vote(&self, ctx: &mut TxContext<'_>, encoded: &[u8]) -> ContractResult<Response> {
        let vote = match VoteCodec::decode(encoded) {
            Ok(vote) => vote,
            Err(e) => return Ok(Response::bad_request(format!("invalid vote: {e}"))),
        };
        let key = vote.key();

        if ctx.get_state(key.as_str())?.is_none() {
            ctx.put_state(key.as_str(), VoteCodec::encode(&vote.succeeded())?)?;
            info!(%key, "vote registered");
            return Ok(Response::ok(Vec::new()));
        }

        warn!(%key, candidate_id = vote.candidate_id, policy = ?self.policy, "duplicate vote");
        if self.policy == DuplicatePolicy::Overwrite {
            ctx.put_state(key.as_str(), VoteCodec::encode(&vote.failed(DUPLICATE_REASON))?)?;
        }
        Ok(Response::error(DUPLICATE_REASON))
    }

    /// Return the stored bytes for a candidate/passport pair.
    ///
    /// The bytes are not interpreted. An empty payload means no entry.
    pub fn find_vote(
        &self,
        ctx: &TxContext<'_>,
        candidate_id: &str,
        passport: &str,
    ) -> ContractResult<Response> {
        let key = match LedgerKey::from_args(candidate_id, passport) {
            Ok(key) => key,
            Err(e) => return Ok(Response::bad_request(e.to_string())),
        };
        let stored = ctx.get_state(key.as_str())?.unwrap_or_default();
        debug!(%key, found = !stored.is_empty(), "vote lookup");
        Ok(Response::ok(stored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContractError;
    use crate::response::status;
    use vchain_state::{InMemoryStateStore, StateStore, StoreError, StoreResult};
    use vchain_types::{format_candidate_id, Vote, VoteStatus, Voter};

    fn vote(candidate_id: u64, passport: &str, name: &str) -> Vote {
        Vote::new(candidate_id, Voter::new(passport, name, 100))
    }

    /// Run one state-changing invocation and commit it if it did not error.
    fn submit(
        contract: &VoteContract,
        store: &InMemoryStateStore,
        function: &str,
        args: &[Vec<u8>],
    ) -> ContractResult<Response> {
        let mut ctx = TxContext::new(store);
        let response = contract.invoke(&mut ctx, function, args)?;
        store.apply(ctx.write_set())?;
        Ok(response)
    }

    fn register(contract: &VoteContract, store: &InMemoryStateStore, v: &Vote) -> Response {
        let encoded = VoteCodec::encode(v).unwrap();
        submit(contract, store, FN_REGISTER_VOTE, &[encoded]).unwrap()
    }

    fn find(contract: &VoteContract, store: &InMemoryStateStore, id: u64, passport: &str) -> Option<Vote> {
        let mut ctx = TxContext::read_only(store);
        let args = [format_candidate_id(id).into_bytes(), passport.as_bytes().to_vec()];
        let response = contract.invoke(&mut ctx, FN_FIND_VOTE, &args).unwrap();
        assert!(response.is_ok());
        (!response.payload.is_empty()).then(|| VoteCodec::decode(&response.payload).unwrap())
    }

    #[test]
    fn first_registration_succeeds() {
        let contract = VoteContract::default();
        let store = InMemoryStateStore::new();
        let v = vote(7, "P1", "A");

        assert!(register(&contract, &store, &v).is_ok());

        let found = find(&contract, &store, 7, "P1").unwrap();
        assert_eq!(found.status, VoteStatus::Success);
        assert_eq!(found.voter, v.voter);
        assert!(found.fail_reason.is_none());
    }

    #[test]
    fn distinct_keys_each_get_an_entry() {
        let contract = VoteContract::default();
        let store = InMemoryStateStore::new();
        let votes = [vote(1, "P1", "A"), vote(2, "P1", "A"), vote(1, "P2", "B")];
        for v in &votes {
            assert!(register(&contract, &store, v).is_ok());
        }
        assert_eq!(store.len(), votes.len());
        for v in &votes {
            let found = find(&contract, &store, v.candidate_id, &v.voter.passport).unwrap();
            assert_eq!(found.status, VoteStatus::Success);
        }
    }

    #[test]
    fn duplicate_overwrites_with_failed_copy_of_new_vote() {
        let contract = VoteContract::new(DuplicatePolicy::Overwrite);
        let store = InMemoryStateStore::new();
        register(&contract, &store, &vote(7, "P1", "A"));

        let response = register(&contract, &store, &vote(7, "P1", "B"));
        assert_eq!(response.status, status::ERROR);
        assert!(response.message.contains("already exists"));

        let found = find(&contract, &store, 7, "P1").unwrap();
        assert_eq!(found.voter.full_name, "B");
        assert_eq!(found.status, VoteStatus::Fail);
        assert_eq!(found.fail_reason.as_deref(), Some(response.message.as_str()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn duplicate_of_large_vote_is_still_rejected() {
        let contract = VoteContract::new(DuplicatePolicy::Overwrite);
        let store = InMemoryStateStore::new();
        let passport = "P".repeat(33_000);
        assert_eq!(register(&contract, &store, &vote(7, &passport, "A")).status, status::OK);

        let response = register(&contract, &store, &vote(7, &passport, "B"));
        assert_eq!(response.status, status::ERROR);
        assert_eq!(response.message, DUPLICATE_REASON);

        let found = find(&contract, &store, 7, &passport).unwrap();
        assert_eq!(found.voter.full_name, "B");
        assert_eq!(found.fail_reason.as_deref(), Some(DUPLICATE_REASON));
    }

    #[test]
    fn duplicate_reason_fits_the_reserved_slot() {
        assert!(DUPLICATE_REASON.len() <= vchain_codec::MAX_FAIL_REASON_LEN);
    }

    #[test]
    fn duplicate_under_reject_policy_keeps_first_writer() {
        let contract = VoteContract::new(DuplicatePolicy::Reject);
        let store = InMemoryStateStore::new();
        register(&contract, &store, &vote(7, "P1", "A"));

        let response = register(&contract, &store, &vote(7, "P1", "B"));
        assert_eq!(response.status, status::ERROR);

        let found = find(&contract, &store, 7, "P1").unwrap();
        assert_eq!(found.voter.full_name, "A");
        assert_eq!(found.status, VoteStatus::Success);
    }

    #[test]
    fn every_later_duplicate_is_rejected() {
        let contract = VoteContract::default();
        let store = InMemoryStateStore::new();
        register(&contract, &store, &vote(7, "P1", "A"));
        for name in ["B", "C"] {
            let response = register(&contract, &store, &vote(7, "P1", name));
            assert_eq!(response.status, status::ERROR);
        }
        assert_eq!(find(&contract, &store, 7, "P1").unwrap().voter.full_name, "C");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn find_absent_returns_empty_payload() {
        let contract = VoteContract::default();
        let store = InMemoryStateStore::new();
        assert!(find(&contract, &store, 7, "nobody").is_none());
    }

    #[test]
    fn find_rejects_bad_candidate_id() {
        let contract = VoteContract::default();
        let store = InMemoryStateStore::new();
        let mut ctx = TxContext::read_only(&store);
        let response = contract
            .invoke(&mut ctx, FN_FIND_VOTE, &[b"7x".to_vec(), b"P1".to_vec()])
            .unwrap();
        assert_eq!(response.status, status::BAD_REQUEST);
    }

    #[test]
    fn undecodable_vote_is_bad_request_without_writes() {
        let contract = VoteContract::default();
        let store = InMemoryStateStore::new();
        let response = submit(&contract, &store, FN_REGISTER_VOTE, &[vec![1, 2, 3]]).unwrap();
        assert_eq!(response.status, status::BAD_REQUEST);
        assert!(store.is_empty());
    }

    #[test]
    fn unknown_function_and_arity() {
        let contract = VoteContract::default();
        let store = InMemoryStateStore::new();
        let mut ctx = TxContext::new(&store);
        let r = contract.invoke(&mut ctx, "DeleteVote", &[]).unwrap();
        assert_eq!(r.status, status::BAD_REQUEST);
        let r = contract.invoke(&mut ctx, FN_REGISTER_VOTE, &[]).unwrap();
        assert_eq!(r.status, status::BAD_REQUEST);
    }

    struct BrokenStore;

    impl StateStore for BrokenStore {
        fn get(&self, _key: &str) -> StoreResult<Option<Vec<u8>>> {
            Err(StoreError::Unavailable("disk gone".into()))
        }
        fn put(&self, _key: &str, _value: &[u8]) -> StoreResult<()> {
            Err(StoreError::Unavailable("disk gone".into()))
        }
    }

    #[test]
    fn storage_failure_aborts_invocation() {
        let contract = VoteContract::default();
        let store = BrokenStore;
        let mut ctx = TxContext::new(&store);
        let encoded = VoteCodec::encode(&vote(7, "P1", "A")).unwrap();
        let err = contract
            .invoke(&mut ctx, FN_REGISTER_VOTE, &[encoded])
            .unwrap_err();
        assert!(matches!(err, ContractError::Store(StoreError::Unavailable(_))));
        assert!(ctx.write_set().is_empty());
    }
}
