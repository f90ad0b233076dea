//! ChatHub: single-consumer dispatcher, the broadcast bus for one room.

use std::collections::HashMap;

use tokio::sync::mpsc;

/// Bound on the register/unregister control channels; these are control
/// plane, not data plane, so a small bound is enough.
const CONTROL_CAPACITY: usize = 16;
/// Bound on the broadcast channel and on each subscriber's outbound
/// channel; gives the eviction backpressure in the client model room to
/// actually kick in before an unbounded channel would hide a slow reader.
const BROADCAST_CAPACITY: usize = 256;

/// What the hub stores per subscriber: its outbound sender, used to attempt
/// delivery, and dropped on eviction/unregister to close the writer loop.
struct Subscriber {
    tx: mpsc::Sender<String>,
}

/// A registration request: id + outbound sender, built by `ChatClient::new`.
pub struct ChatClientHandle {
    pub id: u64,
    tx: mpsc::Sender<String>,
}

/// Cheap, cloneable handle to a room's chat dispatcher. The dispatcher
/// itself (the subscriber set) lives exclusively inside the task spawned
/// by `ChatHub::spawn`; nothing outside that task ever touches it.
#[derive(Clone)]
pub struct ChatHub {
    register_tx: mpsc::Sender<ChatClientHandle>,
    unregister_tx: mpsc::Sender<u64>,
    broadcast_tx: mpsc::Sender<String>,
}

impl ChatHub {
    /// Spawn the dispatcher task and return a handle to it.
    pub fn spawn() -> Self {
        let (register_tx, register_rx) = mpsc::channel(CONTROL_CAPACITY);
        let (unregister_tx, unregister_rx) = mpsc::channel(CONTROL_CAPACITY);
        let (broadcast_tx, broadcast_rx) = mpsc::channel(BROADCAST_CAPACITY);

        tokio::spawn(run_dispatcher(register_rx, unregister_rx, broadcast_rx));

        Self {
            register_tx,
            unregister_tx,
            broadcast_tx,
        }
    }

    /// Register a client. Idempotent: re-registering the same id just
    /// replaces its sender.
    pub async fn register(&self, handle: ChatClientHandle) {
        let _ = self.register_tx.send(handle).await;
    }

    /// Unregister a client by id. Idempotent: unregistering an id that
    /// isn't present (or twice) is a no-op.
    pub async fn unregister(&self, id: u64) {
        let _ = self.unregister_tx.send(id).await;
    }

    /// Submit a message for broadcast. Normalization (§4.2) happens before
    /// this is called, at the reader loop.
    pub async fn broadcast(&self, message: String) {
        let _ = self.broadcast_tx.send(message).await;
    }
}

async fn run_dispatcher(
    mut register_rx: mpsc::Receiver<ChatClientHandle>,
    mut unregister_rx: mpsc::Receiver<u64>,
    mut broadcast_rx: mpsc::Receiver<String>,
) {
    let mut subscribers: HashMap<u64, Subscriber> = HashMap::new();

    loop {
        tokio::select! {
            maybe = register_rx.recv() => {
                match maybe {
                    Some(handle) => {
                        subscribers.insert(handle.id, Subscriber { tx: handle.tx });
                    }
                    None => break,
                }
            }
            maybe = unregister_rx.recv() => {
                match maybe {
                    Some(id) => {
                        // Dropping the stored Sender closes the writer loop's receiver.
                        subscribers.remove(&id);
                    }
                    None => break,
                }
            }
            maybe = broadcast_rx.recv() => {
                match maybe {
                    Some(message) => {
                        let mut delinquent = Vec::new();
                        for (&id, sub) in subscribers.iter() {
                            if sub.tx.try_send(message.clone()).is_err() {
                                delinquent.push(id);
                            }
                        }
                        for id in delinquent {
                            subscribers.remove(&id);
                        }
                    }
                    None => break,
                }
            }
        }
    }
}

pub(crate) fn new_client_handle(id: u64) -> (ChatClientHandle, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(BROADCAST_CAPACITY);
    (ChatClientHandle { id, tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn register_then_broadcast_is_delivered() {
        let hub = ChatHub::spawn();
        let (handle, mut rx) = new_client_handle(1);
        hub.register(handle).await;
        hub.broadcast("hello".to_string()).await;

        let got = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("did not time out")
            .expect("channel open");
        assert_eq!(got, "hello");
    }

    #[tokio::test]
    async fn unregister_closes_outbound_channel() {
        let hub = ChatHub::spawn();
        let (handle, mut rx) = new_client_handle(2);
        hub.register(handle).await;
        hub.unregister(2).await;

        // give the dispatcher a moment to process the unregister
        tokio::time::sleep(Duration::from_millis(20)).await;
        hub.broadcast("after-unregister".to_string()).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn delinquent_subscriber_is_evicted_without_blocking_others() {
        let hub = ChatHub::spawn();

        // A subscriber whose channel is already full (capacity 1, unread).
        let (slow_tx, mut slow_rx) = mpsc::channel::<String>(1);
        slow_tx.try_send("stale".to_string()).unwrap();
        hub.register(ChatClientHandle { id: 10, tx: slow_tx }).await;

        let (fast_handle, mut fast_rx) = new_client_handle(11);
        hub.register(fast_handle).await;

        hub.broadcast("hello".to_string()).await;

        let got = tokio::time::timeout(Duration::from_secs(1), fast_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, "hello");

        // The slow subscriber only ever sees its stale message; it never
        // gets "hello" because it was evicted, and its channel is closed.
        assert_eq!(slow_rx.recv().await, Some("stale".to_string()));
        assert_eq!(slow_rx.recv().await, None);
    }
}
