use serde::{Deserialize, Serialize};
use vchain_types::{Vote, Voter};

/// Voter as it appears on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireVoter {
    pub passport: String,
    pub full_name: String,
    pub birth_date: i64,
}

/// Vote as it appears on the wire, before validation.
///
/// Every field may be absent or zero here. [`crate::validate`] turns a
/// `WireVote` into a [`Vote`] or explains which required field is missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireVote {
    pub candidate_id: u64,
    pub voter: Option<WireVoter>,
    pub status: u8,
    pub fail_reason: Option<String>,
}

impl From<&Voter> for WireVoter {
    fn from(voter: &Voter) -> Self {
        Self {
            passport: voter.passport.clone(),
            full_name: voter.full_name.clone(),
            birth_date: voter.birth_date,
        }
    }
}

impl From<&Vote> for WireVote {
    fn from(vote: &Vote) -> Self {
        Self {
            candidate_id: vote.candidate_id,
            voter: Some(WireVoter::from(&vote.voter)),
            status: vote.status.tag(),
            fail_reason: vote.fail_reason.clone(),
        }
    }
}
