use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tracing::{debug, info, trace, warn};

use crate::config::{BrokerConfig, OffsetReset};
use crate::error::{BrokerError, BrokerResult};
use crate::message::{Message, ProducerRecord, RecordMetadata};
use crate::session::{Claim, Session};
use crate::shutdown::Shutdown;
use crate::traits::{BrokerAdmin, ClaimHandler, ConsumerGroup, Producer};

struct Partition {
    records: Vec<Message>,
    notify: Arc<Notify>,
}

impl Partition {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            notify: Arc::new(Notify::new()),
        }
    }
}

struct Topic {
    partitions: Vec<Partition>,
}

impl Topic {
    fn new(partitions: u32) -> Self {
        Self {
            partitions: (0..partitions).map(|_| Partition::new()).collect(),
        }
    }
}

/// Result of reading one offset of a partition.
pub(crate) enum Position {
    Record(Message),
    /// Nothing at this offset yet; the notifier fires on the next append.
    End(Arc<Notify>),
    /// The topic or partition no longer exists.
    Gone,
}

/// (group, topic, partition)
type OffsetKey = (String, String, u32);

pub(crate) struct Shared {
    config: BrokerConfig,
    topics: RwLock<HashMap<String, Topic>>,
    offsets: RwLock<HashMap<OffsetKey, u64>>,
    round_robin: AtomicU64,
}

impl Shared {
    pub(crate) fn read(&self, topic: &str, partition: u32, offset: u64) -> Position {
        let topics = self.topics.read().expect("topics lock poisoned");
        let Some(p) = topics
            .get(topic)
            .and_then(|t| t.partitions.get(partition as usize))
        else {
            return Position::Gone;
        };
        match p.records.get(offset as usize) {
            Some(message) => Position::Record(message.clone()),
            None => Position::End(Arc::clone(&p.notify)),
        }
    }

    /// Record `next_offset` as the group's resume point. Never moves back.
    pub(crate) fn commit(&self, group: &str, topic: &str, partition: u32, next_offset: u64) {
        let mut offsets = self.offsets.write().expect("offsets lock poisoned");
        let entry = offsets
            .entry((group.to_string(), topic.to_string(), partition))
            .or_insert(0);
        *entry = (*entry).max(next_offset);
    }

    fn committed(&self, group: &str, topic: &str, partition: u32) -> Option<u64> {
        let offsets = self.offsets.read().expect("offsets lock poisoned");
        offsets
            .get(&(group.to_string(), topic.to_string(), partition))
            .copied()
    }

    fn end_offset(&self, topic: &str, partition: u32) -> u64 {
        let topics = self.topics.read().expect("topics lock poisoned");
        topics
            .get(topic)
            .and_then(|t| t.partitions.get(partition as usize))
            .map_or(0, |p| p.records.len() as u64)
    }

    fn default_partitions(&self) -> u32 {
        self.config.default_partitions.max(1)
    }

    /// Partition count of `name`, creating the topic if it does not exist.
    fn ensure_topic(&self, name: &str) -> BrokerResult<u32> {
        validate_topic_name(name)?;
        let mut topics = self.topics.write().expect("topics lock poisoned");
        let topic = topics.entry(name.to_string()).or_insert_with(|| {
            debug!(topic = name, "topic auto-created");
            Topic::new(self.default_partitions())
        });
        Ok(topic.partitions.len() as u32)
    }
}

fn validate_topic_name(name: &str) -> BrokerResult<()> {
    let valid = !name.is_empty()
        && name.len() <= 249
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'));
    if valid {
        Ok(())
    } else {
        Err(BrokerError::InvalidTopic(name.to_string()))
    }
}

fn key_partition(key: &[u8], partitions: u32) -> u32 {
    let hash = blake3::hash(key);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[..8]);
    (u64::from_le_bytes(prefix) % u64::from(partitions)) as u32
}

/// In-memory partitioned log with consumer-group offsets.
///
/// Cloning shares the same topics and offsets.
#[derive(Clone)]
pub struct InMemoryBroker {
    shared: Arc<Shared>,
}

impl InMemoryBroker {
    pub fn new(config: BrokerConfig) -> Self {
        info!(addr = %config.addr, offset_reset = ?config.offset_reset, "in-memory broker started");
        Self {
            shared: Arc::new(Shared {
                config,
                topics: RwLock::new(HashMap::new()),
                offsets: RwLock::new(HashMap::new()),
                round_robin: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.shared.config
    }

    /// Join `group_id` on this broker.
    pub fn consumer_group(&self, group_id: impl Into<String>) -> InMemoryConsumerGroup {
        InMemoryConsumerGroup {
            group_id: group_id.into(),
            shared: Arc::clone(&self.shared),
            generation: AtomicU64::new(0),
        }
    }

    /// Sorted topic names.
    pub fn topics(&self) -> Vec<String> {
        let topics = self.shared.topics.read().expect("topics lock poisoned");
        let mut names: Vec<String> = topics.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn partition_count(&self, topic: &str) -> Option<u32> {
        let topics = self.shared.topics.read().expect("topics lock poisoned");
        topics.get(topic).map(|t| t.partitions.len() as u32)
    }

    /// Every record of `topic`, partition by partition.
    pub fn records(&self, topic: &str) -> Vec<Message> {
        let topics = self.shared.topics.read().expect("topics lock poisoned");
        topics
            .get(topic)
            .map(|t| {
                t.partitions
                    .iter()
                    .flat_map(|p| p.records.iter().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Offset `group` resumes from on `topic`/`partition`, if it ever committed.
    pub fn committed_offset(&self, group: &str, topic: &str, partition: u32) -> Option<u64> {
        self.shared.committed(group, topic, partition)
    }
}

impl std::fmt::Debug for InMemoryBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBroker")
            .field("addr", &self.shared.config.addr)
            .field("topics", &self.topics())
            .finish()
    }
}

#[async_trait]
impl Producer for InMemoryBroker {
    async fn send(&self, record: ProducerRecord) -> BrokerResult<RecordMetadata> {
        validate_topic_name(&record.topic)?;
        let default_partitions = self.shared.default_partitions();
        let mut topics = self.shared.topics.write().expect("topics lock poisoned");
        let topic = topics
            .entry(record.topic.clone())
            .or_insert_with(|| Topic::new(default_partitions));

        let count = topic.partitions.len() as u32;
        let partition = match &record.key {
            Some(key) => key_partition(key, count),
            None => (self.shared.round_robin.fetch_add(1, Ordering::Relaxed) % u64::from(count)) as u32,
        };
        let log = &mut topic.partitions[partition as usize];
        let offset = log.records.len() as u64;
        log.records.push(Message {
            topic: record.topic,
            partition,
            offset,
            key: record.key,
            value: record.value,
        });
        log.notify.notify_waiters();

        trace!(partition, offset, "record appended");
        Ok(RecordMetadata { partition, offset })
    }
}

#[async_trait]
impl BrokerAdmin for InMemoryBroker {
    async fn create_topic(&self, name: &str, partitions: u32) -> BrokerResult<()> {
        validate_topic_name(name)?;
        if partitions == 0 {
            return Err(BrokerError::NoPartitions);
        }
        let mut topics = self.shared.topics.write().expect("topics lock poisoned");
        if topics.contains_key(name) {
            return Err(BrokerError::TopicExists(name.to_string()));
        }
        topics.insert(name.to_string(), Topic::new(partitions));
        debug!(topic = name, partitions, "topic created");
        Ok(())
    }

    async fn delete_topic(&self, name: &str) -> BrokerResult<()> {
        let removed = self
            .shared
            .topics
            .write()
            .expect("topics lock poisoned")
            .remove(name)
            .ok_or_else(|| BrokerError::UnknownTopic(name.to_string()))?;
        // Wake claims parked on the deleted partitions so they observe it.
        for partition in &removed.partitions {
            partition.notify.notify_waiters();
        }
        self.shared
            .offsets
            .write()
            .expect("offsets lock poisoned")
            .retain(|(_, topic, _), _| topic != name);
        debug!(topic = name, "topic deleted");
        Ok(())
    }
}

/// Consumer group over an [`InMemoryBroker`].
///
/// Each session claims every partition of the requested topics and runs one
/// task per claim.
pub struct InMemoryConsumerGroup {
    group_id: String,
    shared: Arc<Shared>,
    generation: AtomicU64,
}

impl InMemoryConsumerGroup {
    fn start_offset(&self, topic: &str, partition: u32) -> u64 {
        self.shared
            .committed(&self.group_id, topic, partition)
            .unwrap_or_else(|| match self.shared.config.offset_reset {
                OffsetReset::Oldest => 0,
                OffsetReset::Newest => self.shared.end_offset(topic, partition),
            })
    }
}

#[async_trait]
impl ConsumerGroup for InMemoryConsumerGroup {
    fn group_id(&self) -> &str {
        &self.group_id
    }

    async fn consume<H>(&self, topics: &[String], handler: Arc<H>, shutdown: &Shutdown) -> BrokerResult<()>
    where
        H: ClaimHandler,
    {
        if topics.is_empty() {
            return Err(BrokerError::NoTopics);
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let session = Arc::new(Session::new(
            self.group_id.clone(),
            generation,
            Arc::clone(&self.shared),
            shutdown.subscribe(),
        ));
        handler
            .setup(&session)
            .await
            .map_err(|e| BrokerError::Session(Box::new(e)))?;

        let mut claims = Vec::new();
        for topic in topics {
            let partitions = self.shared.ensure_topic(topic)?;
            for partition in 0..partitions {
                let offset = self.start_offset(topic, partition);
                claims.push(Claim::new(
                    topic.clone(),
                    partition,
                    offset,
                    Arc::clone(&self.shared),
                    session.cancellation(),
                ));
            }
        }
        info!(group = %self.group_id, generation, claims = claims.len(), "session started");

        let mut workers = JoinSet::new();
        for mut claim in claims {
            let handler = Arc::clone(&handler);
            let session = Arc::clone(&session);
            workers.spawn(async move {
                debug!(topic = %claim.topic, partition = claim.partition, offset = claim.initial_offset(), "claim started");
                let result = handler.consume_claim(&session, &mut claim).await;
                if result.is_err() {
                    session.cancel();
                }
                (claim.topic, claim.partition, result)
            });
        }

        let mut first_error = None;
        while let Some(joined) = workers.join_next().await {
            let err = match joined {
                Ok((_, _, Ok(()))) => continue,
                Ok((topic, partition, Err(e))) => BrokerError::Claim {
                    topic,
                    partition,
                    source: Box::new(e),
                },
                Err(e) => {
                    session.cancel();
                    BrokerError::Worker(e.to_string())
                }
            };
            warn!(group = %self.group_id, generation, error = %err, "claim ended with error");
            first_error.get_or_insert(err);
        }

        let cleanup = handler.cleanup(&session).await;
        if let Some(err) = first_error {
            return Err(err);
        }
        cleanup.map_err(|e| BrokerError::Session(Box::new(e)))?;
        info!(group = %self.group_id, generation, "session ended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, thiserror::Error)]
    #[error("handler failed at offset {0}")]
    struct Boom(u64);

    /// Marks every message, stopping the process after `stop_after` of them.
    /// Fails without marking on `fail_at`.
    struct Recorder {
        seen: Mutex<Vec<(String, u32, u64)>>,
        stop_after: usize,
        fail_at: Option<u64>,
        shutdown: Shutdown,
    }

    impl Recorder {
        fn new(stop_after: usize, shutdown: &Shutdown) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                stop_after,
                fail_at: None,
                shutdown: shutdown.clone(),
            })
        }

        fn failing_at(offset: u64, shutdown: &Shutdown) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                stop_after: usize::MAX,
                fail_at: Some(offset),
                shutdown: shutdown.clone(),
            })
        }

        fn offsets(&self) -> Vec<u64> {
            self.seen.lock().unwrap().iter().map(|(_, _, o)| *o).collect()
        }
    }

    #[async_trait]
    impl ClaimHandler for Recorder {
        type Error = Boom;

        async fn consume_claim(&self, session: &Session, claim: &mut Claim) -> Result<(), Boom> {
            while let Some(message) = claim.next().await {
                if self.fail_at == Some(message.offset) {
                    return Err(Boom(message.offset));
                }
                session.mark_message(&message);
                let mut seen = self.seen.lock().unwrap();
                seen.push((message.topic.clone(), message.partition, message.offset));
                if seen.len() >= self.stop_after {
                    self.shutdown.trigger();
                }
            }
            Ok(())
        }
    }

    async fn publish(broker: &InMemoryBroker, topic: &str, n: u8) {
        for i in 0..n {
            broker.send(ProducerRecord::new(topic, vec![i])).await.unwrap();
        }
    }

    async fn run<H: ClaimHandler>(
        group: &InMemoryConsumerGroup,
        topic: &str,
        handler: Arc<H>,
        shutdown: &Shutdown,
    ) -> BrokerResult<()> {
        tokio::time::timeout(
            Duration::from_secs(5),
            group.consume(&[topic.to_string()], handler, shutdown),
        )
        .await
        .expect("session did not end")
    }

    #[tokio::test]
    async fn send_auto_creates_topic_and_assigns_offsets() {
        let broker = InMemoryBroker::new(BrokerConfig::default());
        let first = broker.send(ProducerRecord::new("votes", "a")).await.unwrap();
        let second = broker.send(ProducerRecord::new("votes", "b")).await.unwrap();
        assert_eq!((first.partition, first.offset), (0, 0));
        assert_eq!((second.partition, second.offset), (0, 1));
        assert_eq!(broker.topics(), vec!["votes".to_string()]);
        assert_eq!(broker.records("votes")[1].value, "b");
    }

    #[tokio::test]
    async fn keyed_records_share_a_partition() {
        let broker = InMemoryBroker::new(BrokerConfig::default());
        broker.create_topic("votes", 4).await.unwrap();
        let mut partitions = Vec::new();
        for i in 0..5u8 {
            let record = ProducerRecord::new("votes", vec![i]).with_key("voter-1");
            partitions.push(broker.send(record).await.unwrap().partition);
        }
        assert!(partitions.iter().all(|p| *p == partitions[0]));
    }

    #[tokio::test]
    async fn unkeyed_records_spread_round_robin() {
        let broker = InMemoryBroker::new(BrokerConfig::default());
        broker.create_topic("votes", 3).await.unwrap();
        let mut partitions = Vec::new();
        for i in 0..3u8 {
            partitions.push(broker.send(ProducerRecord::new("votes", vec![i])).await.unwrap().partition);
        }
        partitions.sort();
        assert_eq!(partitions, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn admin_errors() {
        let broker = InMemoryBroker::new(BrokerConfig::default());
        broker.create_topic("health", 1).await.unwrap();
        assert!(matches!(
            broker.create_topic("health", 1).await,
            Err(BrokerError::TopicExists(_))
        ));
        assert!(matches!(broker.create_topic("x", 0).await, Err(BrokerError::NoPartitions)));
        assert!(matches!(
            broker.create_topic("bad name", 1).await,
            Err(BrokerError::InvalidTopic(_))
        ));
        broker.delete_topic("health").await.unwrap();
        assert!(matches!(
            broker.delete_topic("health").await,
            Err(BrokerError::UnknownTopic(_))
        ));
        assert!(matches!(
            broker.send(ProducerRecord::new("", "v")).await,
            Err(BrokerError::InvalidTopic(_))
        ));
    }

    #[tokio::test]
    async fn session_delivers_in_order_and_commits() {
        let broker = InMemoryBroker::new(BrokerConfig::default());
        publish(&broker, "votes", 3).await;
        let group = broker.consumer_group("g1");
        let shutdown = Shutdown::new();
        let handler = Recorder::new(3, &shutdown);

        run(&group, "votes", handler.clone(), &shutdown).await.unwrap();
        assert_eq!(handler.offsets(), vec![0, 1, 2]);
        assert_eq!(broker.committed_offset("g1", "votes", 0), Some(3));
        assert_eq!(broker.committed_offset("g2", "votes", 0), None);
    }

    #[tokio::test]
    async fn next_session_resumes_from_commit() {
        let broker = InMemoryBroker::new(BrokerConfig::default());
        publish(&broker, "votes", 2).await;
        let group = broker.consumer_group("g1");

        let shutdown = Shutdown::new();
        run(&group, "votes", Recorder::new(2, &shutdown), &shutdown).await.unwrap();

        publish(&broker, "votes", 1).await;
        let shutdown = Shutdown::new();
        let handler = Recorder::new(1, &shutdown);
        run(&group, "votes", handler.clone(), &shutdown).await.unwrap();
        assert_eq!(handler.offsets(), vec![2]);
    }

    #[tokio::test]
    async fn claim_waits_for_new_records() {
        let broker = InMemoryBroker::new(BrokerConfig::default());
        let group = broker.consumer_group("g1");
        let shutdown = Shutdown::new();
        let handler = Recorder::new(2, &shutdown);

        let producer = broker.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            publish(&producer, "votes", 2).await;
        });
        run(&group, "votes", handler.clone(), &shutdown).await.unwrap();
        assert_eq!(handler.offsets(), vec![0, 1]);
    }

    #[tokio::test]
    async fn handler_error_ends_session_without_commit() {
        let broker = InMemoryBroker::new(BrokerConfig::default());
        publish(&broker, "votes", 3).await;
        let group = broker.consumer_group("g1");

        let shutdown = Shutdown::new();
        let err = run(&group, "votes", Recorder::failing_at(1, &shutdown), &shutdown)
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::Claim { partition: 0, .. }));
        assert!(err.handler_error().unwrap().downcast_ref::<Boom>().is_some());
        assert_eq!(broker.committed_offset("g1", "votes", 0), Some(1));

        // The failed message is redelivered to the next session.
        let shutdown = Shutdown::new();
        let handler = Recorder::new(2, &shutdown);
        run(&group, "votes", handler.clone(), &shutdown).await.unwrap();
        assert_eq!(handler.offsets(), vec![1, 2]);
    }

    #[tokio::test]
    async fn handler_error_cancels_sibling_claims() {
        let broker = InMemoryBroker::new(BrokerConfig {
            default_partitions: 3,
            ..BrokerConfig::default()
        });
        broker.send(ProducerRecord::new("votes", "x")).await.unwrap();
        let group = broker.consumer_group("g1");

        // Partitions without records park in `next` until the session ends.
        let shutdown = Shutdown::new();
        let err = run(&group, "votes", Recorder::failing_at(0, &shutdown), &shutdown)
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::Claim { .. }));
        assert!(!shutdown.is_triggered());
    }

    #[tokio::test]
    async fn newest_reset_skips_history() {
        let broker = InMemoryBroker::new(BrokerConfig {
            offset_reset: OffsetReset::Newest,
            ..BrokerConfig::default()
        });
        publish(&broker, "votes", 2).await;
        let group = broker.consumer_group("g1");
        let shutdown = Shutdown::new();
        let handler = Recorder::new(1, &shutdown);

        let producer = broker.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            publish(&producer, "votes", 1).await;
        });
        run(&group, "votes", handler.clone(), &shutdown).await.unwrap();
        assert_eq!(handler.offsets(), vec![2]);
    }

    #[tokio::test]
    async fn shutdown_before_start_claims_nothing() {
        let broker = InMemoryBroker::new(BrokerConfig::default());
        publish(&broker, "votes", 2).await;
        let group = broker.consumer_group("g1");
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let handler = Recorder::new(usize::MAX, &shutdown);

        run(&group, "votes", handler.clone(), &shutdown).await.unwrap();
        assert!(handler.offsets().is_empty());
        assert_eq!(broker.committed_offset("g1", "votes", 0), None);
    }

    #[tokio::test]
    async fn deleted_topic_ends_its_claims() {
        let broker = InMemoryBroker::new(BrokerConfig::default());
        broker.create_topic("health", 1).await.unwrap();
        let group = broker.consumer_group("g1");
        let shutdown = Shutdown::new();
        let handler = Recorder::new(usize::MAX, &shutdown);

        let admin = broker.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            admin.delete_topic("health").await.unwrap();
        });
        run(&group, "health", handler, &shutdown).await.unwrap();
    }

    #[tokio::test]
    async fn consume_requires_topics() {
        let broker = InMemoryBroker::new(BrokerConfig::default());
        let group = broker.consumer_group("g1");
        let shutdown = Shutdown::new();
        let result = group.consume(&[], Recorder::new(1, &shutdown), &shutdown).await;
        assert!(matches!(result, Err(BrokerError::NoTopics)));
    }

    #[test]
    fn key_partition_is_stable() {
        assert_eq!(key_partition(b"k", 8), key_partition(b"k", 8));
        assert!(key_partition(b"k", 8) < 8);
    }
}
