use serde::{Deserialize, Serialize};

/// Where a consumer group starts on a partition it has never committed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetReset {
    /// Replay from the beginning of retained history.
    #[default]
    Oldest,
    /// Start after the last record present when the claim opens.
    Newest,
}

/// Broker connection settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Broker address.
    pub addr: String,
    /// Partition count for topics created implicitly on first use.
    pub default_partitions: u32,
    pub offset_reset: OffsetReset,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            addr: "localhost:9092".into(),
            default_partitions: 1,
            offset_reset: OffsetReset::Oldest,
        }
    }
}
