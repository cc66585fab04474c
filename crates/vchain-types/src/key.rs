use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Address of one vote in ledger state.
///
/// A `LedgerKey` is derived deterministically from a `(candidate_id, passport)`
/// pair. Two votes with the same key refer to the same voter choosing the same
/// candidate, and are therefore in conflict.
///
/// The rendered form is `vote (candidate=<id> passport=<passport>)`. The id is
/// rendered in base 10 and never contains a space, and the passport runs up to
/// the final `)`, so distinct pairs can never render to the same key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LedgerKey(String);

impl LedgerKey {
    /// Derive the key for a candidate/passport pair.
    ///
    /// This is the only derivation: both the write path and the read path go
    /// through it.
    pub fn derive(candidate_id: u64, passport: &str) -> Self {
        Self(format!(
            "vote (candidate={} passport={passport})",
            format_candidate_id(candidate_id)
        ))
    }

    /// Derive the key from the string arguments of a ledger query.
    pub fn from_args(candidate_id: &str, passport: &str) -> Result<Self, TypeError> {
        let candidate_id = parse_candidate_id(candidate_id)?;
        Ok(Self::derive(candidate_id, passport))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LedgerKey({})", self.0)
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LedgerKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Render a candidate id the way ledger arguments and keys expect it.
pub fn format_candidate_id(candidate_id: u64) -> String {
    candidate_id.to_string()
}

/// Parse a candidate id rendered by [`format_candidate_id`].
///
/// Only plain ASCII digits are accepted, and zero is rejected: a vote always
/// names a real candidate.
pub fn parse_candidate_id(s: &str) -> Result<u64, TypeError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TypeError::InvalidCandidateId(s.to_string()));
    }
    match s.parse::<u64>() {
        Ok(0) | Err(_) => Err(TypeError::InvalidCandidateId(s.to_string())),
        Ok(id) => Ok(id),
    }
}
