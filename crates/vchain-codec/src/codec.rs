use bincode::Options;
use vchain_types::Vote;

use crate::error::{CodecError, CodecResult};
use crate::validation::validate;
use crate::wire::WireVote;

/// Current wire format version, written as the first byte of every message.
pub const WIRE_VERSION: u8 = 1;

/// Upper bound on an encoded vote payload. Larger inputs are rejected before
/// any allocation is attempted.
pub const MAX_VOTE_SIZE: u64 = 64 * 1024;

/// Longest fail reason a vote may carry, in bytes.
///
/// Every vote is sized as if it carried a reason this long, so stamping any
/// decodable vote `FAIL` keeps it encodable.
pub const MAX_FAIL_REASON_LEN: usize = 256;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_VOTE_SIZE)
        .reject_trailing_bytes()
}

/// Codec for encoding/decoding votes: `[1 byte version][bincode payload]`.
pub struct VoteCodec;

impl VoteCodec {
    /// Encode a vote. Refuses votes that would not decode.
    pub fn encode(vote: &Vote) -> CodecResult<Vec<u8>> {
        let wire = WireVote::from(vote);
        check_size(&wire)?;
        validate(wire.clone())?;
        Self::encode_wire(&wire)
    }

    /// Encode a wire record as-is, without validation.
    ///
    /// Used to forward records verbatim and to build fixtures for incomplete
    /// votes.
    pub fn encode_wire(wire: &WireVote) -> CodecResult<Vec<u8>> {
        let payload = options()
            .serialize(wire)
            .map_err(|e| CodecError::Serialization(e.to_string()))?;
        let mut buf = Vec::with_capacity(1 + payload.len());
        buf.push(WIRE_VERSION);
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    /// Parse a wire record without validating it.
    pub fn decode_wire(data: &[u8]) -> CodecResult<WireVote> {
        let (&version, payload) = data.split_first().ok_or(CodecError::Empty)?;
        if version != WIRE_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }
        options()
            .deserialize(payload)
            .map_err(|e| CodecError::Deserialization(e.to_string()))
    }

    /// Parse and validate a vote.
    ///
    /// Fails if the bytes cannot be parsed or if any required field is
    /// absent. The result depends only on the input bytes.
    pub fn decode(data: &[u8]) -> CodecResult<Vote> {
        let wire = Self::decode_wire(data)?;
        check_size(&wire)?;
        Ok(validate(wire)?)
    }
}

/// Reject records that would not fit once given a maximal fail reason.
fn check_size(wire: &WireVote) -> CodecResult<()> {
    let reason_len = wire.fail_reason.as_ref().map_or(0, String::len);
    if reason_len > MAX_FAIL_REASON_LEN {
        return Err(CodecError::FailReasonTooLong(reason_len));
    }
    let too_large = CodecError::TooLarge { limit: MAX_VOTE_SIZE };
    let size = options().serialized_size(wire).map_err(|_| too_large)?;
    // A present reason costs a u64 length prefix plus its bytes.
    let without_reason = size - wire.fail_reason.as_ref().map_or(0, |r| 8 + r.len() as u64);
    if without_reason + 8 + MAX_FAIL_REASON_LEN as u64 > MAX_VOTE_SIZE {
        return Err(CodecError::TooLarge { limit: MAX_VOTE_SIZE });
    }
    Ok(())
}
