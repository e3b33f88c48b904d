use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Mutex},
};

use futures_util::{Stream, StreamExt};
use tokio::task::JoinHandle;

/// Append-only, shared history of event identifiers.
///
/// The producer side appends with [`push`](Self::push); an
/// [`ExpectationMatcher`](crate::ExpectationMatcher) consumes entries from the
/// front as it matches them. Cloning an `EventLog` yields another handle to
/// the same buffer, so the producer and the matcher can each hold one.
///
/// Each push and each front removal is atomic. Nothing spans several
/// operations: the log may grow between any two calls.
///
/// ```ignore
/// let log = EventLog::new();
/// let matcher = ExpectationMatcher::new(log.clone());
///
/// log.push(["spawned", "transferred"]);
/// matcher.resolve(["spawned", "transferred"]).await?;
/// ```
#[derive(Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<VecDeque<String>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append identifiers in iteration order. Pushing nothing is allowed.
    pub fn push<I>(&self, events: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut entries = self.entries.lock().unwrap();
        entries.extend(events.into_iter().map(Into::into));
    }

    /// Append a single identifier.
    pub fn push_one(&self, event: impl Into<String>) {
        self.entries.lock().unwrap().push_back(event.into());
    }

    /// Number of entries not yet consumed.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the unconsumed entries, front first.
    pub fn snapshot(&self) -> Vec<String> {
        self.entries.lock().unwrap().iter().cloned().collect()
    }

    /// Remove and return the oldest entry.
    pub(crate) fn pop_front(&self) -> Option<String> {
        self.entries.lock().unwrap().pop_front()
    }

    /// Forward every item of `stream` into the log from a background task.
    ///
    /// Handy when the system under test reports events through a channel.
    /// The task ends when the stream does; abort the returned handle to stop
    /// forwarding early.
    ///
    /// ```ignore
    /// let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    /// let feeder = log.feed(UnboundedReceiverStream::new(rx));
    /// client.on_block(move |b| { let _ = tx.send(b.to_string()); });
    /// ```
    pub fn feed<S>(&self, stream: S) -> JoinHandle<()>
    where
        S: Stream + Send + 'static,
        S::Item: Into<String> + Send,
    {
        let log = self.clone();
        tokio::spawn(async move {
            let mut stream = std::pin::pin!(stream);
            while let Some(event) = stream.next().await {
                log.push_one(event);
            }
            tracing::trace!(remaining = log.len(), "event feed ended");
        })
    }
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.lock().unwrap();
        f.debug_struct("EventLog")
            .field("len", &entries.len())
            .field("entries", &*entries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::wrappers::UnboundedReceiverStream;

    #[test]
    fn push_preserves_order() {
        let log = EventLog::new();
        log.push(["a", "b"]);
        log.push(Vec::<String>::new());
        log.push_one("c");
        assert_eq!(log.snapshot(), vec!["a", "b", "c"]);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn pop_front_is_fifo() {
        let log = EventLog::new();
        log.push(["first", "second"]);
        assert_eq!(log.pop_front().as_deref(), Some("first"));
        assert_eq!(log.pop_front().as_deref(), Some("second"));
        assert_eq!(log.pop_front(), None);
        assert!(log.is_empty());
    }

    #[test]
    fn clones_share_the_buffer() {
        let producer = EventLog::new();
        let consumer = producer.clone();
        producer.push_one("x");
        assert_eq!(consumer.len(), 1);
        consumer.pop_front();
        assert!(producer.is_empty());
    }

    #[test]
    fn concurrent_pushes_keep_every_entry() {
        let log = EventLog::new();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        log.push_one(format!("{t}-{i}"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(log.len(), 400);

        // Per-thread order survives interleaving
        let entries = log.snapshot();
        let from_zero: Vec<_> = entries.iter().filter(|e| e.starts_with("0-")).collect();
        let expected: Vec<_> = (0..100).map(|i| format!("0-{i}")).collect();
        assert_eq!(from_zero, expected.iter().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn feed_forwards_stream_items() {
        let log = EventLog::new();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<&'static str>();
        let feeder = log.feed(UnboundedReceiverStream::new(rx));

        tx.send("one").unwrap();
        tx.send("two").unwrap();
        drop(tx);
        feeder.await.unwrap();

        assert_eq!(log.snapshot(), vec!["one", "two"]);
    }

    #[test]
    fn debug_shows_contents() {
        let log = EventLog::new();
        log.push_one("a");
        let dbg = format!("{log:?}");
        assert!(dbg.contains("len: 1"));
        assert!(dbg.contains("\"a\""));
    }
}
