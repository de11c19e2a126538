use std::collections::HashMap;

use logpilot_logs::LogStore;
use logpilot_types::ServerMessage;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Identifier of a connected websocket client
pub type ClientId = u64;

struct ClientSlot {
    /// Next index this client has not been sent
    cursor: usize,

    tx: mpsc::UnboundedSender<ServerMessage>,
}

#[derive(Default)]
struct PoolInner {
    next_id: ClientId,
    clients: HashMap<ClientId, ClientSlot>,
}

/// Connected clients and their delivery cursors
///
/// Every operation takes the pool lock for its whole duration, so two frame
/// deliveries can never interleave on the same client's cursor.
#[derive(Default)]
pub struct ClientPool {
    inner: Mutex<PoolInner>,
}

impl ClientPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client with cursor 0.
    ///
    /// When the store already holds lines, `awaiting-log-data` is queued
    /// ahead of any frame.
    pub fn add(&self, store: &LogStore) -> (ClientId, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();

        if !store.is_empty() {
            let _ = tx.send(ServerMessage::AwaitingLogData);
        }

        let id = inner.next_id;
        inner.next_id += 1;
        inner.clients.insert(id, ClientSlot { cursor: 0, tx });
        (id, rx)
    }

    pub fn remove(&self, id: ClientId) -> bool {
        self.inner.lock().clients.remove(&id).is_some()
    }

    pub fn count(&self) -> usize {
        self.inner.lock().clients.len()
    }

    /// Send `message` to every client
    pub fn broadcast(&self, message: &ServerMessage) {
        let inner = self.inner.lock();
        for slot in inner.clients.values() {
            let _ = slot.tx.send(message.clone());
        }
    }

    /// Send each lagging client its next slice of at most `max_lines` lines,
    /// advancing its cursor by exactly the number sent. Returns the number
    /// of frames sent.
    pub fn deliver_frames(&self, store: &LogStore, max_lines: usize) -> usize {
        let mut inner = self.inner.lock();
        let available = store.len();
        let mut sent = 0;

        for slot in inner.clients.values_mut() {
            if slot.cursor >= available {
                continue;
            }
            let (lines, next) = store.slice_from(slot.cursor, max_lines);
            if lines.is_empty() {
                continue;
            }
            // A closed receiver means the client is going away; its slot is
            // removed by the connection handler
            if slot.tx.send(ServerMessage::frame(lines, slot.cursor)).is_ok() {
                slot.cursor = next;
                sent += 1;
            }
        }

        sent
    }

    #[cfg(test)]
    fn cursor(&self, id: ClientId) -> Option<usize> {
        self.inner.lock().clients.get(&id).map(|slot| slot.cursor)
    }
}
