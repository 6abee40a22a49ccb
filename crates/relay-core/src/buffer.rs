//! Shared FIFO buffer of opaque JSON values.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Notify;

/// Point-in-time counters for a [`RelayBuffer`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BufferStats {
    /// Messages currently queued.
    pub depth: usize,
    /// Messages accepted since the buffer was created.
    pub enqueued: u64,
    /// Messages acknowledged as delivered via [`RelayBuffer::mark_delivered`].
    pub delivered: u64,
}

/// An async FIFO queue shared by all producer and consumer sessions.
///
/// Messages are opaque `serde_json::Value`s; ownership transfers fully
/// into the buffer on enqueue and out of it on dequeue, so no message is
/// ever visible to two sessions at once. The buffer is the only shared
/// mutable state in the relay. Constructed once at startup and passed to
/// every session by `Arc` — never a process-wide global, so tests get
/// isolated instances.
///
/// The default mode is unbounded: `enqueue` never suspends and the queue
/// grows without limit under slow consumers. [`RelayBuffer::bounded`]
/// opts into backpressure instead.
pub struct RelayBuffer {
    queue: Mutex<VecDeque<Value>>,
    /// Signalled once per enqueued message. `Notify` resumes registered
    /// waiters in arrival order, so the oldest-waiting consumer wins.
    readable: Notify,
    /// Signalled once per dequeued message; only awaited in bounded mode.
    writable: Notify,
    capacity: Option<usize>,
    enqueued: AtomicU64,
    delivered: AtomicU64,
}

impl RelayBuffer {
    /// Create an unbounded buffer (the default mode).
    pub fn unbounded() -> Self {
        Self::with_capacity(None)
    }

    /// Create a bounded buffer: `enqueue` suspends while `capacity`
    /// messages are already queued.
    pub fn bounded(capacity: usize) -> Self {
        assert!(capacity > 0, "bounded buffer capacity must be nonzero");
        Self::with_capacity(Some(capacity))
    }

    fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            readable: Notify::new(),
            writable: Notify::new(),
            capacity,
            enqueued: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
        }
    }

    /// Append a message to the tail of the buffer.
    ///
    /// Returns once the buffer owns the message. Never suspends in
    /// unbounded mode; in bounded mode, suspends until a slot frees up.
    pub async fn enqueue(&self, message: Value) {
        let mut message = Some(message);
        loop {
            // Register for a free slot before checking, so a dequeue
            // that lands in between cannot be missed.
            let writable = self.writable.notified();
            {
                let mut queue = self.queue.lock();
                if self.capacity.is_none_or(|cap| queue.len() < cap) {
                    if let Some(message) = message.take() {
                        queue.push_back(message);
                    }
                }
            }
            if message.is_none() {
                break;
            }
            writable.await;
        }
        let _ = self.enqueued.fetch_add(1, Ordering::Relaxed);
        self.readable.notify_one();
    }

    /// Remove and return the head message, suspending while the buffer
    /// is empty. Exactly one waiter is resumed per enqueued message.
    ///
    /// Cancel-safe: the head is only popped when the returned future
    /// completes, so dropping it mid-wait never loses a message (the
    /// wakeup is handed to the next waiter).
    pub async fn dequeue(&self) -> Value {
        loop {
            let readable = self.readable.notified();
            if let Some(message) = self.queue.lock().pop_front() {
                self.writable.notify_one();
                return message;
            }
            readable.await;
        }
    }

    /// Acknowledge that a dequeued message has been fully processed.
    ///
    /// A tracking hook retained for symmetry with flow-controlled queue
    /// designs; there is no redelivery, so this only feeds the stats.
    pub fn mark_delivered(&self) {
        let _ = self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Messages currently queued.
    pub fn depth(&self) -> usize {
        self.queue.lock().len()
    }

    /// Whether the buffer is currently empty.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// The configured capacity, or `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Snapshot of the buffer counters.
    pub fn stats(&self) -> BufferStats {
        BufferStats {
            depth: self.depth(),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
        }
    }
}

impl Default for RelayBuffer {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use tokio::time::timeout;

    use super::*;

    const SHORT: Duration = Duration::from_millis(50);
    const LONG: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn fifo_order_single_consumer() {
        let buf = RelayBuffer::unbounded();
        for i in 0..5 {
            buf.enqueue(json!({ "seq": i })).await;
        }
        for i in 0..5 {
            let msg = buf.dequeue().await;
            assert_eq!(msg["seq"], i);
        }
    }

    #[tokio::test]
    async fn dequeue_suspends_while_empty() {
        let buf = Arc::new(RelayBuffer::unbounded());

        let waiter = {
            let buf = buf.clone();
            tokio::spawn(async move { buf.dequeue().await })
        };

        // No message yet — the waiter must stay parked.
        tokio::time::sleep(SHORT).await;
        assert!(!waiter.is_finished());

        buf.enqueue(json!("wake up")).await;
        let msg = timeout(LONG, waiter).await.unwrap().unwrap();
        assert_eq!(msg, json!("wake up"));
    }

    #[tokio::test]
    async fn one_message_resumes_exactly_one_waiter() {
        let buf = Arc::new(RelayBuffer::unbounded());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        for _ in 0..2 {
            let buf = buf.clone();
            let tx = tx.clone();
            drop(tokio::spawn(async move {
                let msg = buf.dequeue().await;
                tx.send(msg).unwrap();
            }));
        }
        tokio::time::sleep(SHORT).await;

        buf.enqueue(json!({ "value": 5 })).await;
        tokio::time::sleep(SHORT).await;

        let first = rx.try_recv();
        assert!(first.is_ok(), "one waiter should have been resumed");
        assert!(rx.try_recv().is_err(), "second waiter must still be parked");

        // A second message releases the other waiter.
        buf.enqueue(json!({ "value": 6 })).await;
        let second = timeout(LONG, rx.recv()).await.unwrap();
        assert!(second.is_some());
    }

    #[tokio::test]
    async fn unbounded_enqueue_never_suspends() {
        let buf = RelayBuffer::unbounded();
        for i in 0..1_000 {
            // Would deadlock here if enqueue could block without consumers.
            buf.enqueue(json!(i)).await;
        }
        assert_eq!(buf.depth(), 1_000);
    }

    #[tokio::test]
    async fn bounded_enqueue_suspends_at_capacity() {
        let buf = Arc::new(RelayBuffer::bounded(2));
        buf.enqueue(json!(1)).await;
        buf.enqueue(json!(2)).await;

        let blocked = {
            let buf = buf.clone();
            tokio::spawn(async move { buf.enqueue(json!(3)).await })
        };
        tokio::time::sleep(SHORT).await;
        assert!(!blocked.is_finished(), "third enqueue must wait for a slot");

        // Freeing one slot unparks the producer.
        assert_eq!(buf.dequeue().await, json!(1));
        timeout(LONG, blocked).await.unwrap().unwrap();
        assert_eq!(buf.depth(), 2);
        assert_eq!(buf.dequeue().await, json!(2));
        assert_eq!(buf.dequeue().await, json!(3));
    }

    #[tokio::test]
    async fn bounded_preserves_fifo_under_backpressure() {
        let buf = Arc::new(RelayBuffer::bounded(1));
        let producer = {
            let buf = buf.clone();
            tokio::spawn(async move {
                for i in 0..10 {
                    buf.enqueue(json!(i)).await;
                }
            })
        };
        for i in 0..10 {
            assert_eq!(timeout(LONG, buf.dequeue()).await.unwrap(), json!(i));
        }
        timeout(LONG, producer).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn concurrent_producers_lose_nothing() {
        let buf = Arc::new(RelayBuffer::unbounded());
        let mut handles = Vec::new();
        for p in 0..4 {
            let buf = buf.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..25 {
                    buf.enqueue(json!({ "producer": p, "seq": i })).await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut seen = vec![0u32; 4];
        for _ in 0..100 {
            let msg = timeout(LONG, buf.dequeue()).await.unwrap();
            let p = msg["producer"].as_u64().unwrap() as usize;
            // Per-producer order must be preserved in the interleaving.
            assert_eq!(msg["seq"], seen[p]);
            seen[p] += 1;
        }
        assert!(buf.is_empty());
        assert_eq!(seen, vec![25; 4]);
    }

    #[tokio::test]
    async fn aborted_waiter_hands_wakeup_to_next() {
        let buf = Arc::new(RelayBuffer::unbounded());

        let doomed = {
            let buf = buf.clone();
            tokio::spawn(async move { buf.dequeue().await })
        };
        let survivor = {
            let buf = buf.clone();
            tokio::spawn(async move { buf.dequeue().await })
        };
        tokio::time::sleep(SHORT).await;

        doomed.abort();
        buf.enqueue(json!("still delivered")).await;

        let msg = timeout(LONG, survivor).await.unwrap().unwrap();
        assert_eq!(msg, json!("still delivered"));
    }

    #[tokio::test]
    async fn stats_track_enqueue_and_delivery() {
        let buf = RelayBuffer::unbounded();
        assert_eq!(buf.stats().enqueued, 0);

        buf.enqueue(json!(1)).await;
        buf.enqueue(json!(2)).await;
        let stats = buf.stats();
        assert_eq!(stats.depth, 2);
        assert_eq!(stats.enqueued, 2);
        assert_eq!(stats.delivered, 0);

        let _ = buf.dequeue().await;
        buf.mark_delivered();
        let stats = buf.stats();
        assert_eq!(stats.depth, 1);
        assert_eq!(stats.enqueued, 2);
        assert_eq!(stats.delivered, 1);
    }

    #[tokio::test]
    async fn stats_serialize_as_json() {
        let buf = RelayBuffer::unbounded();
        buf.enqueue(json!("x")).await;
        let json = serde_json::to_value(buf.stats()).unwrap();
        assert_eq!(json["depth"], 1);
        assert_eq!(json["enqueued"], 1);
        assert_eq!(json["delivered"], 0);
    }

    #[tokio::test]
    async fn opaque_payloads_pass_through_unchanged() {
        let buf = RelayBuffer::unbounded();
        let payloads = vec![
            json!(null),
            json!(42),
            json!("scalar"),
            json!([1, 2, 3]),
            json!({ "nested": { "deep": [true, null] } }),
        ];
        for payload in &payloads {
            buf.enqueue(payload.clone()).await;
        }
        for payload in &payloads {
            assert_eq!(&buf.dequeue().await, payload);
        }
    }

    #[test]
    fn default_is_unbounded() {
        let buf = RelayBuffer::default();
        assert_eq!(buf.capacity(), None);
    }

    #[test]
    fn bounded_reports_capacity() {
        let buf = RelayBuffer::bounded(8);
        assert_eq!(buf.capacity(), Some(8));
    }

    #[test]
    #[should_panic(expected = "nonzero")]
    fn zero_capacity_rejected() {
        let _ = RelayBuffer::bounded(0);
    }
}
