//! In-process peer hub.
//!
//! Each connected peer gets an unbounded outbound channel; all peers share
//! one inbound channel. Two tokio tasks drive the server: the inbound task
//! applies peer actions one at a time, the tick task advances the
//! simulation at the configured rate. Both go through [`SharedServer`] and
//! deliver the routed results before releasing the server lock. The lock
//! order is always server, then peer table.
//!
//! The byte transport stays outside: a bridge (see the `rts_server`
//! binary) owns a [`PeerHandle`] and moves encoded actions to and from it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rts_core::components::PlayerId;
use rts_core::protocol::Action;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::error::{Result, ServerError};
use crate::router::{Outgoing, Recipient};
use crate::shared::SharedServer;

/// Connection identifier assigned by the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(pub u64);

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

struct Inbound {
    peer: PeerId,
    action: Action,
}

#[derive(Default)]
struct PeerTable {
    next_id: u64,
    senders: BTreeMap<PeerId, mpsc::UnboundedSender<Action>>,
    players: HashMap<PlayerId, PeerId>,
}

impl PeerTable {
    fn bind(&mut self, peer: PeerId, player: PlayerId) {
        self.players.insert(player, peer);
    }

    fn deliver(&mut self, outgoing: Vec<Outgoing>) {
        for Outgoing { recipient, action } in outgoing {
            match recipient {
                Recipient::Everyone => {
                    let mut closed = Vec::new();
                    for (peer, sender) in &self.senders {
                        if sender.send(action.clone()).is_err() {
                            closed.push(*peer);
                        }
                    }
                    for peer in closed {
                        self.drop_peer(peer);
                    }
                }
                Recipient::Player(player) => {
                    let Some(peer) = self.players.get(&player).copied() else {
                        debug!(%player, kind = %action.kind(), "no peer for player, dropping");
                        continue;
                    };
                    let delivered = self
                        .senders
                        .get(&peer)
                        .is_some_and(|sender| sender.send(action).is_ok());
                    if !delivered {
                        self.drop_peer(peer);
                    }
                }
            }
        }
    }

    fn drop_peer(&mut self, peer: PeerId) {
        if self.senders.remove(&peer).is_some() {
            info!(%peer, "peer disconnected");
        }
        self.players.retain(|_, bound| *bound != peer);
    }
}

/// One end of a hub connection.
#[derive(Debug)]
pub struct PeerHandle {
    id: PeerId,
    inbound: mpsc::UnboundedSender<Inbound>,
    outbound: mpsc::UnboundedReceiver<Action>,
}

impl std::fmt::Debug for Inbound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inbound")
            .field("peer", &self.peer)
            .field("kind", &self.action.kind())
            .finish()
    }
}

impl PeerHandle {
    /// Connection id.
    #[must_use]
    pub const fn id(&self) -> PeerId {
        self.id
    }

    /// Queue an action for the server.
    pub fn send(&self, action: Action) -> Result<()> {
        self.inbound
            .send(Inbound {
                peer: self.id,
                action,
            })
            .map_err(|_| ServerError::Disconnected(self.id))
    }

    /// Next action routed to this peer, or `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<Action> {
        self.outbound.recv().await
    }

    /// Split into a sending half and the receiving channel.
    #[must_use]
    pub fn into_split(self) -> (PeerSender, mpsc::UnboundedReceiver<Action>) {
        (
            PeerSender {
                id: self.id,
                inbound: self.inbound,
            },
            self.outbound,
        )
    }
}

/// Sending half of a [`PeerHandle`].
#[derive(Debug, Clone)]
pub struct PeerSender {
    id: PeerId,
    inbound: mpsc::UnboundedSender<Inbound>,
}

impl PeerSender {
    /// Queue an action for the server.
    pub fn send(&self, action: Action) -> Result<()> {
        self.inbound
            .send(Inbound {
                peer: self.id,
                action,
            })
            .map_err(|_| ServerError::Disconnected(self.id))
    }
}

/// Running hub: peer table plus the inbound and tick tasks.
#[derive(Debug)]
pub struct Hub {
    server: SharedServer,
    peers: Arc<Mutex<PeerTable>>,
    inbound: mpsc::UnboundedSender<Inbound>,
    tasks: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for PeerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerTable")
            .field("peers", &self.senders.len())
            .field("players", &self.players.len())
            .finish()
    }
}

impl Hub {
    /// Spawn the inbound and tick tasks on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn start(server: SharedServer, tick_rate: u32) -> Self {
        let peers = Arc::new(Mutex::new(PeerTable::default()));
        let (inbound, mut inbound_rx) = mpsc::unbounded_channel::<Inbound>();

        let inbound_task = {
            let server = server.clone();
            let peers = Arc::clone(&peers);
            tokio::spawn(async move {
                while let Some(Inbound { peer, action }) = inbound_rx.recv().await {
                    if let Action::PlayerInit(player) = &action {
                        peers.lock().bind(peer, player.id);
                    }
                    server.apply_and(action, |outgoing| peers.lock().deliver(outgoing));
                }
                debug!("inbound channel closed");
            })
        };

        let tick_task = {
            let server = server.clone();
            let peers = Arc::clone(&peers);
            let period = Duration::from_secs_f64(1.0 / f64::from(tick_rate.max(1)));
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    interval.tick().await;
                    server.tick_and(|outgoing| {
                        if !outgoing.is_empty() {
                            peers.lock().deliver(outgoing);
                        }
                    });
                }
            })
        };

        info!(tick_rate, "hub started");
        Self {
            server,
            peers,
            inbound,
            tasks: vec![inbound_task, tick_task],
        }
    }

    /// Register a new peer.
    #[must_use]
    pub fn connect(&self) -> PeerHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut peers = self.peers.lock();
        let id = PeerId(peers.next_id);
        peers.next_id += 1;
        peers.senders.insert(id, tx);
        info!(peer = %id, "peer connected");
        PeerHandle {
            id,
            inbound: self.inbound.clone(),
            outbound: rx,
        }
    }

    /// Number of connected peers.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.peers.lock().senders.len()
    }

    /// The game this hub drives.
    #[must_use]
    pub fn server(&self) -> &SharedServer {
        &self.server
    }

    /// Stop both tasks. Peers see their channels close.
    pub fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        self.peers.lock().senders.clear();
        info!("hub stopped");
    }
}
