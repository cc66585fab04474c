use std::sync::Arc;

use tokio::sync::watch;
use tracing::trace;

use crate::memory::{Position, Shared};
use crate::message::Message;
use crate::shutdown::{wait_until_set, ShutdownSignal};

/// Cancellation seen by claims: the session ended or shutdown was requested.
#[derive(Clone, Debug)]
pub(crate) struct Cancellation {
    session: watch::Receiver<bool>,
    shutdown: ShutdownSignal,
}

impl Cancellation {
    fn is_cancelled(&self) -> bool {
        *self.session.borrow() || self.shutdown.is_triggered()
    }

    async fn cancelled(&mut self) {
        tokio::select! {
            _ = wait_until_set(&mut self.session) => {}
            _ = self.shutdown.triggered() => {}
        }
    }
}

/// One generation of a consumer group's membership.
///
/// Shared by every claim of the generation. Offsets marked through the
/// session are committed for the group immediately.
pub struct Session {
    group_id: String,
    generation: u64,
    shared: Arc<Shared>,
    cancel: watch::Sender<bool>,
    shutdown: ShutdownSignal,
}

impl Session {
    pub(crate) fn new(
        group_id: String,
        generation: u64,
        shared: Arc<Shared>,
        shutdown: ShutdownSignal,
    ) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            group_id,
            generation,
            shared,
            cancel,
            shutdown,
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Commit `message` as processed: the group resumes after it.
    pub fn mark_message(&self, message: &Message) {
        self.shared
            .commit(&self.group_id, &message.topic, message.partition, message.offset + 1);
        trace!(
            group = %self.group_id,
            topic = %message.topic,
            partition = message.partition,
            offset = message.offset,
            "offset marked"
        );
    }

    /// `true` once the session ended or shutdown was requested.
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow() || self.shutdown.is_triggered()
    }

    /// End the session: every claim stops before its next message.
    pub(crate) fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub(crate) fn cancellation(&self) -> Cancellation {
        Cancellation {
            session: self.cancel.subscribe(),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("group_id", &self.group_id)
            .field("generation", &self.generation)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// The ordered messages of one partition assigned to a session.
pub struct Claim {
    pub(crate) topic: String,
    pub(crate) partition: u32,
    initial_offset: u64,
    next_offset: u64,
    shared: Arc<Shared>,
    cancel: Cancellation,
}

impl Claim {
    pub(crate) fn new(
        topic: String,
        partition: u32,
        initial_offset: u64,
        shared: Arc<Shared>,
        cancel: Cancellation,
    ) -> Self {
        Self {
            topic,
            partition,
            initial_offset,
            next_offset: initial_offset,
            shared,
            cancel,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn partition(&self) -> u32 {
        self.partition
    }

    /// Offset the claim started from.
    pub fn initial_offset(&self) -> u64 {
        self.initial_offset
    }

    /// Next message of the partition, waiting for one to be published.
    ///
    /// Cancellation is checked before each message. Returns `None` once the
    /// session is cancelled or the topic is deleted.
    pub async fn next(&mut self) -> Option<Message> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }
            let notify = match self.shared.read(&self.topic, self.partition, self.next_offset) {
                Position::Record(message) => {
                    self.next_offset = message.offset + 1;
                    return Some(message);
                }
                Position::Gone => return None,
                Position::End(notify) => notify,
            };

            let notified = notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            // A record published between the read and `enable` would be missed.
            if !matches!(
                self.shared.read(&self.topic, self.partition, self.next_offset),
                Position::End(_)
            ) {
                continue;
            }
            tokio::select! {
                _ = &mut notified => {}
                _ = self.cancel.cancelled() => {}
            }
        }
    }
}

impl std::fmt::Debug for Claim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Claim")
            .field("topic", &self.topic)
            .field("partition", &self.partition)
            .field("initial_offset", &self.initial_offset)
            .field("next_offset", &self.next_offset)
            .finish()
    }
}
