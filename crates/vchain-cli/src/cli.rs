use std::net::SocketAddr;
use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};

use vchain_contract::DuplicatePolicy;

#[derive(Parser, Debug)]
#[command(
    name = "vchain",
    about = "VoteChain: register broker-delivered votes on a tamper-evident ledger",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log level: "trace", "debug", "info", "warn", "error". `RUST_LOG` wins.
    #[arg(long, global = true, default_value = "info", env = "VCHAIN_LOG_LEVEL")]
    pub log_level: String,

    /// Path to a TOML configuration file. Flags and env vars override it.
    #[arg(long, global = true, env = "VCHAIN_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the ingestion consumer and the HTTP server
    Run(RunArgs),
    /// Print the ledger key of a candidate/passport pair
    Key(KeyArgs),
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Broker address.
    #[arg(long, env = "VCHAIN_BROKER_ADDR")]
    pub broker_addr: Option<String>,

    /// Topic to consume.
    #[arg(long, env = "VCHAIN_TOPIC")]
    pub topic: Option<String>,

    /// Consume the topic as a dead-letter topic.
    #[arg(long, env = "VCHAIN_TOPIC_IS_DEAD", value_parser = BoolishValueParser::new())]
    pub topic_is_dead: Option<bool>,

    /// Consumer group id.
    #[arg(long, env = "VCHAIN_GROUP_ID")]
    pub group_id: Option<String>,

    /// Pause between dead-letter messages, in seconds.
    #[arg(long, env = "VCHAIN_CONSUMPTION_INTERVAL_SECS")]
    pub consumption_interval_secs: Option<u64>,

    /// Ledger channel.
    #[arg(long, env = "VCHAIN_CHANNEL")]
    pub channel: Option<String>,

    /// MSP id of the submitting identity.
    #[arg(long, env = "VCHAIN_MSP_ID")]
    pub msp_id: Option<String>,

    /// Certificate (PEM) of the submitting identity.
    #[arg(long, env = "VCHAIN_CERT_PATH")]
    pub cert_path: Option<PathBuf>,

    /// Private key (PEM) of the submitting identity.
    #[arg(long, env = "VCHAIN_PRIVATE_KEY_PATH")]
    pub private_key_path: Option<PathBuf>,

    /// What the contract does with a second vote for the same key.
    #[arg(long, env = "VCHAIN_DUPLICATE_POLICY")]
    pub duplicate_policy: Option<PolicyArg>,

    /// HTTP listen address.
    #[arg(long, env = "VCHAIN_BIND_ADDR")]
    pub bind_addr: Option<SocketAddr>,

    /// JSON array of votes to publish to the topic before consuming.
    #[arg(long)]
    pub votes: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct KeyArgs {
    /// Candidate id (positive decimal integer).
    #[arg(long)]
    pub candidate: String,

    /// Voter passport.
    #[arg(long)]
    pub passport: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Overwrite,
    Reject,
}

impl From<PolicyArg> for DuplicatePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Overwrite => DuplicatePolicy::Overwrite,
            PolicyArg::Reject => DuplicatePolicy::Reject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_overrides() {
        let cli = Cli::try_parse_from([
            "vchain",
            "--log-level",
            "debug",
            "run",
            "--topic",
            "votes.dead",
            "--topic-is-dead",
            "true",
            "--group-id",
            "chain",
            "--consumption-interval-secs",
            "3",
            "--duplicate-policy",
            "reject",
            "--bind-addr",
            "0.0.0.0:9000",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.topic.as_deref(), Some("votes.dead"));
        assert_eq!(args.topic_is_dead, Some(true));
        assert_eq!(args.consumption_interval_secs, Some(3));
        assert_eq!(args.duplicate_policy, Some(PolicyArg::Reject));
        assert_eq!(args.bind_addr.map(|a| a.port()), Some(9000));
    }

    #[test]
    fn parses_key() {
        let cli = Cli::try_parse_from(["vchain", "key", "--candidate", "7", "--passport", "P1"]).unwrap();
        let Command::Key(args) = cli.command else {
            panic!("expected key");
        };
        assert_eq!(args.candidate, "7");
        assert_eq!(args.passport, "P1");
    }

    #[test]
    fn rejects_bad_bind_addr() {
        assert!(Cli::try_parse_from(["vchain", "run", "--bind-addr", "nowhere"]).is_err());
    }
}
