use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use vchain_broker::BrokerConfig;
use vchain_ingest::ConsumerConfig;
use vchain_ledger::LedgerConfig;
use vchain_server::ServerConfig;

use crate::cli::RunArgs;

/// Complete node configuration, built once at startup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub broker: BrokerConfig,
    pub consumer: ConsumerConfig,
    pub ledger: LedgerConfig,
    pub server: ServerConfig,
}

impl NodeConfig {
    /// Defaults, overlaid by the TOML file at `path` when given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Apply flags and environment variables on top of the loaded values.
    pub fn apply_overrides(&mut self, args: &RunArgs) {
        if let Some(addr) = &args.broker_addr {
            self.broker.addr = addr.clone();
        }
        if let Some(topic) = &args.topic {
            self.consumer.topic = topic.clone();
        }
        if let Some(dead) = args.topic_is_dead {
            self.consumer.topic_is_dead = dead;
        }
        if let Some(group_id) = &args.group_id {
            self.consumer.group_id = group_id.clone();
        }
        if let Some(secs) = args.consumption_interval_secs {
            self.consumer.consumption_interval_secs = secs;
        }
        if let Some(channel) = &args.channel {
            self.ledger.channel = channel.clone();
        }
        if let Some(msp_id) = &args.msp_id {
            self.ledger.msp_id = msp_id.clone();
        }
        if let Some(path) = &args.cert_path {
            self.ledger.cert_path = path.clone();
        }
        if let Some(path) = &args.private_key_path {
            self.ledger.private_key_path = path.clone();
        }
        if let Some(policy) = args.duplicate_policy {
            self.ledger.duplicate_policy = policy.into();
        }
        if let Some(addr) = args.bind_addr {
            self.server.bind_addr = addr;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.consumer.validate()?;
        if self.broker.addr.trim().is_empty() {
            bail!("broker address must not be empty");
        }
        if self.ledger.channel.trim().is_empty() {
            bail!("ledger channel must not be empty");
        }
        if self.ledger.msp_id.trim().is_empty() {
            bail!("MSP id must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use vchain_contract::DuplicatePolicy;

    use crate::cli::PolicyArg;

    #[test]
    fn no_file_gives_defaults() {
        let config = NodeConfig::load(None).unwrap();
        assert_eq!(config, NodeConfig::default());
        assert_eq!(config.broker.addr, "localhost:9092");
        assert_eq!(config.consumer.consumption_interval_secs, 10);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[consumer]
topic = "votes"
group_id = "chain"

[ledger]
channel = "elections"
duplicate_policy = "reject"
"#
        )
        .unwrap();

        let config = NodeConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.consumer.topic, "votes");
        assert_eq!(config.consumer.dead_letter_suffix, ".dead");
        assert_eq!(config.ledger.channel, "elections");
        assert_eq!(config.ledger.msp_id, "Org1MSP");
        assert_eq!(config.ledger.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(config.server.bind_addr.port(), 8080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unreadable_or_invalid_file_is_an_error() {
        assert!(NodeConfig::load(Some(Path::new("/nonexistent/vchain.toml"))).is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[consumer\ntopic = ").unwrap();
        assert!(NodeConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn overrides_win_over_file_values() {
        let mut config = NodeConfig::default();
        config.consumer.topic = "from-file".into();
        let args = RunArgs {
            topic: Some("votes.dead".into()),
            topic_is_dead: Some(true),
            group_id: Some("chain".into()),
            consumption_interval_secs: Some(1),
            duplicate_policy: Some(PolicyArg::Reject),
            ..RunArgs::default()
        };
        config.apply_overrides(&args);
        assert_eq!(config.consumer.topic, "votes.dead");
        assert!(config.consumer.topic_is_dead);
        assert_eq!(config.consumer.consumption_interval_secs, 1);
        assert_eq!(config.ledger.duplicate_policy, DuplicatePolicy::Reject);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_topic_or_group_is_invalid() {
        assert!(NodeConfig::default().validate().is_err());
        let mut config = NodeConfig::default();
        config.consumer.topic = "votes".into();
        assert!(config.validate().is_err());
        config.consumer.group_id = "chain".into();
        assert!(config.validate().is_ok());
    }
}
