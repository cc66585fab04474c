use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use vchain_contract::DuplicatePolicy;

/// Connection settings for the ledger network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Channel the vote contract is deployed on.
    pub channel: String,
    /// Membership service provider id of the submitting identity.
    pub msp_id: String,
    pub cert_path: PathBuf,
    pub private_key_path: PathBuf,
    /// Endorsing peers; each contributes one response to a failed transaction.
    pub peers: Vec<String>,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            channel: "mychannel".into(),
            msp_id: "Org1MSP".into(),
            cert_path: PathBuf::from("cert.pem"),
            private_key_path: PathBuf::from("key.pem"),
            peers: vec!["peer0".into()],
            duplicate_policy: DuplicatePolicy::Overwrite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = LedgerConfig::default();
        assert_eq!(c.channel, "mychannel");
        assert_eq!(c.peers, vec!["peer0".to_string()]);
        assert_eq!(c.duplicate_policy, DuplicatePolicy::Overwrite);
    }
}
