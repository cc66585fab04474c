use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::key::LedgerKey;

/// Registration outcome carried by a [`Vote`].
///
/// Publishers leave the status [`VoteStatus::Unset`]; an unset status counts
/// as success. The ledger contract stamps `Success` or `Fail` when it stores
/// the vote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteStatus {
    #[default]
    Unset,
    Pending,
    Success,
    Fail,
}

impl VoteStatus {
    /// Wire tag for this status.
    pub fn tag(self) -> u8 {
        match self {
            Self::Unset => 0,
            Self::Pending => 1,
            Self::Success => 2,
            Self::Fail => 3,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self, TypeError> {
        match tag {
            0 => Ok(Self::Unset),
            1 => Ok(Self::Pending),
            2 => Ok(Self::Success),
            3 => Ok(Self::Fail),
            other => Err(TypeError::UnknownStatus(other)),
        }
    }

    /// `true` for `Success` and for the implicit success of `Unset`.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Unset | Self::Success)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "UNSET",
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Fail => "FAIL",
        }
    }
}

impl fmt::Display for VoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The person casting a vote.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Voter {
    /// Identity document number; unique per voter.
    pub passport: String,
    pub full_name: String,
    /// Birth date as seconds since the Unix epoch. Zero means "absent".
    pub birth_date: i64,
}

impl Voter {
    pub fn new(passport: impl Into<String>, full_name: impl Into<String>, birth_date: i64) -> Self {
        Self {
            passport: passport.into(),
            full_name: full_name.into(),
            birth_date,
        }
    }
}

/// A single vote for a candidate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vote {
    pub candidate_id: u64,
    pub voter: Voter,
    #[serde(default)]
    pub status: VoteStatus,
    /// Present only when `status` is [`VoteStatus::Fail`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_reason: Option<String>,
}

impl Vote {
    /// A freshly cast vote with an unset status.
    pub fn new(candidate_id: u64, voter: Voter) -> Self {
        Self {
            candidate_id,
            voter,
            status: VoteStatus::Unset,
            fail_reason: None,
        }
    }

    /// The ledger address of this vote.
    pub fn key(&self) -> LedgerKey {
        LedgerKey::derive(self.candidate_id, &self.voter.passport)
    }

    /// This vote marked as successfully registered.
    pub fn succeeded(mut self) -> Self {
        self.status = VoteStatus::Success;
        self.fail_reason = None;
        self
    }

    /// This vote marked as rejected, with a human-readable reason.
    pub fn failed(mut self, reason: impl Into<String>) -> Self {
        self.status = VoteStatus::Fail;
        self.fail_reason = Some(reason.into());
        self
    }

    pub fn is_failed(&self) -> bool {
        self.status == VoteStatus::Fail
    }
}
