use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use colored::Colorize;
use tracing::{info, warn};

use vchain_broker::{InMemoryBroker, Producer, ProducerRecord, Shutdown};
use vchain_codec::VoteCodec;
use vchain_ingest::{ChainHandler, ConsumeMode, ConsumerRunner, DeadLetterRouter};
use vchain_ledger::{connect, LedgerClient};
use vchain_server::{AppState, VoteServer};
use vchain_state::InMemoryStateStore;
use vchain_types::{parse_candidate_id, LedgerKey, Vote};

use crate::cli::*;
use crate::config::NodeConfig;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run(args) => cmd_run(cli.config.as_deref(), args).await,
        Command::Key(args) => cmd_key(args),
    }
}

fn cmd_key(args: KeyArgs) -> anyhow::Result<()> {
    let candidate_id = parse_candidate_id(&args.candidate)
        .with_context(|| format!("invalid candidate id {:?}", args.candidate))?;
    let key = LedgerKey::derive(candidate_id, &args.passport);
    println!("{} {}", "key:".bold(), key.as_str().cyan());
    Ok(())
}

async fn cmd_run(config_path: Option<&Path>, args: RunArgs) -> anyhow::Result<()> {
    let mut config = NodeConfig::load(config_path)?;
    config.apply_overrides(&args);
    config.validate()?;

    let broker = InMemoryBroker::new(config.broker.clone());
    let network = Arc::new(
        connect(&config.ledger, Arc::new(InMemoryStateStore::new()))
            .context("failed to connect to the ledger network")?,
    );
    let client = LedgerClient::new(network.clone());

    if let Some(path) = &args.votes {
        let count = publish_votes(&broker, &config.consumer.topic, path).await?;
        println!(
            "{} published {} votes to {}",
            "✓".green(),
            count.to_string().bold(),
            config.consumer.topic.yellow()
        );
    }

    let router = DeadLetterRouter::with_suffix(
        Arc::new(broker.clone()),
        config.consumer.dead_letter_suffix.clone(),
    );
    let handler = ChainHandler::new(
        client.clone(),
        router,
        ConsumeMode::from_config(&config.consumer),
    );
    let runner = ConsumerRunner::new(
        broker.consumer_group(config.consumer.group_id.clone()),
        config.consumer.topic.clone(),
        handler,
    );

    let shutdown = Shutdown::new();
    let server = VoteServer::new(
        config.server.clone(),
        AppState {
            ledger: client,
            admin: Arc::new(broker.clone()),
            producer: Arc::new(broker.clone()),
            readiness_topic: config.server.readiness_topic.clone(),
        },
    );
    let server_task = tokio::spawn(server.serve(shutdown.subscribe()));

    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown requested"),
            Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
        }
        on_signal.trigger();
    });

    let consumed = runner.run(&shutdown).await;
    shutdown.trigger();
    server_task.await.context("HTTP server task panicked")??;
    consumed?;

    network
        .verify_history()
        .context("transaction log failed verification")?;
    println!(
        "{} stopped; {} transactions on {}",
        "✓".green().bold(),
        network.history().len().to_string().bold(),
        config.ledger.channel.yellow()
    );
    Ok(())
}

/// Publish the votes in a JSON array file to `topic`, keyed by ledger key.
async fn publish_votes(producer: &dyn Producer, topic: &str, path: &Path) -> anyhow::Result<usize> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read votes file {}", path.display()))?;
    let votes: Vec<Vote> = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse votes file {}", path.display()))?;
    for vote in &votes {
        let value = VoteCodec::encode(vote)
            .with_context(|| format!("invalid vote for passport {:?}", vote.voter.passport))?;
        let record = ProducerRecord::new(topic, Bytes::from(value))
            .with_key(Bytes::from(vote.key().into_string()));
        producer.send(record).await?;
    }
    Ok(votes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use vchain_broker::BrokerConfig;

    fn votes_file(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn publishes_votes_keyed_by_ledger_key() {
        let broker = InMemoryBroker::new(BrokerConfig::default());
        let file = votes_file(
            r#"[
                {"candidate_id": 7, "voter": {"passport": "P1", "full_name": "A", "birth_date": 100}},
                {"candidate_id": 8, "voter": {"passport": "P2", "full_name": "B", "birth_date": 200}}
            ]"#,
        );
        let count = publish_votes(&broker, "votes", file.path()).await.unwrap();
        assert_eq!(count, 2);

        let records = broker.records("votes");
        assert_eq!(records.len(), 2);
        let first = VoteCodec::decode(&records[0].value).unwrap();
        assert_eq!(first.candidate_id, 7);
        assert_eq!(
            records[0].key.as_deref(),
            Some(LedgerKey::derive(7, "P1").as_str().as_bytes())
        );
    }

    #[tokio::test]
    async fn incomplete_vote_aborts_publishing() {
        let broker = InMemoryBroker::new(BrokerConfig::default());
        let file = votes_file(
            r#"[{"candidate_id": 7, "voter": {"passport": "", "full_name": "A", "birth_date": 100}}]"#,
        );
        assert!(publish_votes(&broker, "votes", file.path()).await.is_err());
        assert!(broker.records("votes").is_empty());
    }

    #[tokio::test]
    async fn malformed_votes_file_is_an_error() {
        let broker = InMemoryBroker::new(BrokerConfig::default());
        let file = votes_file("{not json");
        assert!(publish_votes(&broker, "votes", file.path()).await.is_err());
    }

    #[test]
    fn key_rejects_bad_candidate() {
        let args = KeyArgs {
            candidate: "abc".into(),
            passport: "P1".into(),
        };
        assert!(cmd_key(args).is_err());
        let args = KeyArgs {
            candidate: "7".into(),
            passport: "P1".into(),
        };
        assert!(cmd_key(args).is_ok());
    }
}
