//! In-process transport: sessions are pairs of tokio channels, rooms live
//! in a shared registry keyed by the host's peer id.
//!
//! This is the transport used by tests, the loopback demo, and local
//! split-screen-style play. It honors the same contract as a real data
//! channel: reliable, ordered per session, fire-and-forget send, buffered
//! data delivered before the terminal close.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};

use crate::{PeerId, Session, SessionEvent, Transport, TransportError};

/// One hosted room: the host's identity plus the queue its transport polls
/// for freshly connected sessions.
struct RoomEntry {
    host_id: PeerId,
    inbound: UnboundedSender<MemorySession>,
}

type RoomMap = Arc<Mutex<HashMap<String, RoomEntry>>>;

/// Shared room registry. Construct one hub, then hand each endpoint its
/// own [`MemoryTransport`] via [`transport`](Self::transport).
#[derive(Clone, Default)]
pub struct MemoryHub {
    rooms: RoomMap,
}

impl MemoryHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport endpoint attached to this hub.
    pub fn transport(&self) -> MemoryTransport {
        MemoryTransport {
            rooms: Arc::clone(&self.rooms),
            local_id: None,
            inbound: None,
            hosted_room: None,
        }
    }
}

/// A single endpoint on a [`MemoryHub`].
pub struct MemoryTransport {
    rooms: RoomMap,
    local_id: Option<PeerId>,
    inbound: Option<UnboundedReceiver<MemorySession>>,
    hosted_room: Option<String>,
}

impl Transport for MemoryTransport {
    type Session = MemorySession;
    type Error = TransportError;

    async fn open(&mut self) -> Result<PeerId, Self::Error> {
        let id = PeerId::random();
        self.local_id = Some(id.clone());
        tracing::debug!(peer = %id, "memory transport opened");
        Ok(id)
    }

    fn listen(&mut self) -> Result<(), Self::Error> {
        let host_id = self.local_id.clone().ok_or(TransportError::NotOpened)?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.rooms.lock().expect("room registry poisoned").insert(
            host_id.0.clone(),
            RoomEntry {
                host_id: host_id.clone(),
                inbound: tx,
            },
        );
        self.inbound = Some(rx);
        self.hosted_room = Some(host_id.0.clone());
        tracing::info!(room = %host_id, "hosting room");
        Ok(())
    }

    async fn connect(&mut self, room: &str) -> Result<Self::Session, Self::Error> {
        let member_id = self.local_id.clone().ok_or(TransportError::NotOpened)?;

        let rooms = self.rooms.lock().expect("room registry poisoned");
        let entry = rooms
            .get(room)
            .ok_or_else(|| TransportError::RoomNotFound(room.to_string()))?;

        // Two one-way pipes make one session pair.
        let (to_host_tx, to_host_rx) = mpsc::unbounded_channel();
        let (to_member_tx, to_member_rx) = mpsc::unbounded_channel();

        let host_side = MemorySession {
            peer: member_id,
            tx: Some(to_member_tx),
            rx: to_host_rx,
            terminated: false,
        };
        entry
            .inbound
            .send(host_side)
            .map_err(|_| TransportError::Refused("host is gone".to_string()))?;

        Ok(MemorySession {
            peer: entry.host_id.clone(),
            tx: Some(to_host_tx),
            rx: to_member_rx,
            terminated: false,
        })
    }

    fn poll_accept(&mut self) -> Option<Self::Session> {
        let rx = self.inbound.as_mut()?;
        match rx.try_recv() {
            Ok(session) => {
                tracing::debug!(peer = %session.peer, "inbound session accepted");
                Some(session)
            }
            Err(_) => None,
        }
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        if let Some(room) = self.hosted_room.take() {
            if let Ok(mut rooms) = self.rooms.lock() {
                rooms.remove(&room);
            }
        }
    }
}

/// A channel-pair [`Session`] produced by [`MemoryTransport`].
pub struct MemorySession {
    peer: PeerId,
    tx: Option<UnboundedSender<Vec<u8>>>,
    rx: UnboundedReceiver<Vec<u8>>,
    /// Set once the terminal `Closed` has been reported, or on local close.
    terminated: bool,
}

impl Session for MemorySession {
    fn peer_id(&self) -> &PeerId {
        &self.peer
    }

    fn send(&self, data: &[u8]) {
        if let Some(tx) = &self.tx {
            // The receiver being gone is indistinguishable from an
            // in-flight disconnect; the next poll reports Closed.
            let _ = tx.send(data.to_vec());
        }
    }

    fn poll_event(&mut self) -> Option<SessionEvent> {
        if self.terminated {
            return None;
        }
        match self.rx.try_recv() {
            Ok(data) => Some(SessionEvent::Data(data)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.terminated = true;
                Some(SessionEvent::Closed)
            }
        }
    }

    fn close(&mut self) {
        self.tx = None;
        self.rx.close();
        self.terminated = true;
    }

    fn is_open(&self) -> bool {
        !self.terminated && self.tx.is_some()
    }
}
