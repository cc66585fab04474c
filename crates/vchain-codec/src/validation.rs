use vchain_types::{Vote, VoteStatus, Voter};

use crate::error::ValidationError;
use crate::wire::WireVote;

/// Turn a wire record into a structurally complete [`Vote`].
///
/// Required: a non-zero candidate id, a voter with non-empty passport and
/// full name, and a non-zero birth date. A fail reason must accompany a
/// `FAIL` status and nothing else.
pub fn validate(wire: WireVote) -> Result<Vote, ValidationError> {
    if wire.candidate_id == 0 {
        return Err(ValidationError::MissingCandidate);
    }
    let voter = wire.voter.ok_or(ValidationError::MissingVoter)?;
    if voter.passport.is_empty() {
        return Err(ValidationError::MissingPassport);
    }
    if voter.full_name.is_empty() {
        return Err(ValidationError::MissingFullName);
    }
    if voter.birth_date == 0 {
        return Err(ValidationError::MissingBirthDate);
    }

    let status =
        VoteStatus::from_tag(wire.status).map_err(|_| ValidationError::UnknownStatus(wire.status))?;
    match (status, wire.fail_reason.as_deref()) {
        (VoteStatus::Fail, None | Some("")) => return Err(ValidationError::MissingFailReason),
        (VoteStatus::Fail, Some(_)) | (_, None) => {}
        (other, Some(_)) => return Err(ValidationError::UnexpectedFailReason(other.as_str())),
    }

    Ok(Vote {
        candidate_id: wire.candidate_id,
        voter: Voter {
            passport: voter.passport,
            full_name: voter.full_name,
            birth_date: voter.birth_date,
        },
        status,
        fail_reason: wire.fail_reason,
    })
}
