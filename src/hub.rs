//! Hub: the single event queue in front of the coordinator.
//!
//! DESIGN
//! ======
//! One tokio task owns the `Coordinator`, the flood guard, and the
//! per-connection outbound channels. Websocket tasks talk to it only through
//! `HubHandle`, which pushes `HubCommand`s onto one bounded `mpsc` queue.
//! Commands are processed strictly in arrival order, so room state needs no
//! locks and every client observes the same mutation order.
//!
//! The coordinator returns an `Outcome`; `apply` turns it into calls on the
//! four transport primitives (`emit_to`, `emit_to_room`, `join_group`,
//! `leave_group`). `ChannelTransport` implements them over the connection
//! channels; tests substitute a recording transport.
//!
//! DELIVERY
//! ========
//! Outbound sends are best effort (`try_send`). A full connection queue drops
//! that event for that connection only; the hub never blocks on a slow client.
//! A handler panic is caught per event and logged as `E_HANDLER_PANIC`.

use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::coordinator::Coordinator;
use crate::frame::{ErrorCode, Frame};
use crate::outcome::{Dropped, Effect, Outcome};
use crate::protocol::{self, ClientId, RoomId, ServerEvent};
use crate::rate_limit::RateLimiter;
use crate::state::RoomStats;

/// Outbound event as queued to one connection. Shared across a broadcast.
pub type Outbound = Arc<ServerEvent>;

// =============================================================================
// TRANSPORT
// =============================================================================

/// Delivery primitives the coordinator's outcomes are applied through.
pub trait Transport {
    /// Send to one connection.
    fn emit_to(&mut self, client_id: ClientId, event: &ServerEvent);
    /// Send to every member of a room's group, optionally skipping one.
    fn emit_to_room(&mut self, room_id: &str, event: &ServerEvent, except: Option<ClientId>);
    fn join_group(&mut self, client_id: ClientId, room_id: &str);
    fn leave_group(&mut self, client_id: ClientId, room_id: &str);
    /// Forget a connection entirely, including every group membership.
    fn drop_client(&mut self, client_id: ClientId);
}

/// Apply an outcome's effects in order on behalf of `sender`.
pub fn apply(transport: &mut impl Transport, sender: ClientId, outcome: Outcome) {
    for effect in outcome.effects {
        match effect {
            Effect::Reply(event) => transport.emit_to(sender, &event),
            Effect::Broadcast { room_id, event } => transport.emit_to_room(&room_id, &event, None),
            Effect::BroadcastExcludeSender { room_id, event } => {
                transport.emit_to_room(&room_id, &event, Some(sender));
            }
            Effect::JoinGroup(room_id) => transport.join_group(sender, &room_id),
            Effect::LeaveGroup(room_id) => transport.leave_group(sender, &room_id),
        }
    }
}

/// Transport over per-connection bounded channels.
#[derive(Debug, Default)]
pub struct ChannelTransport {
    clients: HashMap<ClientId, mpsc::Sender<Outbound>>,
    groups: HashMap<RoomId, HashSet<ClientId>>,
}

impl ChannelTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, client_id: ClientId, tx: mpsc::Sender<Outbound>) {
        self.clients.insert(client_id, tx);
    }

    #[must_use]
    pub fn connections(&self) -> usize {
        self.clients.len()
    }

    #[must_use]
    pub fn group_size(&self, room_id: &str) -> usize {
        self.groups.get(room_id).map_or(0, HashSet::len)
    }
}

impl Transport for ChannelTransport {
    fn emit_to(&mut self, client_id: ClientId, event: &ServerEvent) {
        if let Some(tx) = self.clients.get(&client_id) {
            deliver(client_id, tx, Arc::new(event.clone()));
        }
    }

    fn emit_to_room(&mut self, room_id: &str, event: &ServerEvent, except: Option<ClientId>) {
        let Some(members) = self.groups.get(room_id) else {
            return;
        };
        let shared: Outbound = Arc::new(event.clone());
        for client_id in members {
            if except == Some(*client_id) {
                continue;
            }
            if let Some(tx) = self.clients.get(client_id) {
                deliver(*client_id, tx, Arc::clone(&shared));
            }
        }
    }

    fn join_group(&mut self, client_id: ClientId, room_id: &str) {
        self.groups.entry(room_id.to_owned()).or_default().insert(client_id);
    }

    fn leave_group(&mut self, client_id: ClientId, room_id: &str) {
        if let Some(members) = self.groups.get_mut(room_id) {
            members.remove(&client_id);
            if members.is_empty() {
                self.groups.remove(room_id);
            }
        }
    }

    fn drop_client(&mut self, client_id: ClientId) {
        self.clients.remove(&client_id);
        self.groups.retain(|_, members| {
            members.remove(&client_id);
            !members.is_empty()
        });
    }
}

fn deliver(client_id: ClientId, tx: &mpsc::Sender<Outbound>, event: Outbound) {
    match tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) if event.is_cursor() => {
            trace!(%client_id, "client queue full; cursor update dropped");
        }
        Err(TrySendError::Full(event)) => {
            warn!(%client_id, event = event.name(), "client queue full; event dropped");
        }
        Err(TrySendError::Closed(_)) => {
            debug!(%client_id, "client channel closed");
        }
    }
}

// =============================================================================
// HUB
// =============================================================================

pub enum HubCommand {
    Connect { client_id: ClientId, tx: mpsc::Sender<Outbound> },
    Inbound { client_id: ClientId, text: String },
    Disconnect { client_id: ClientId },
    Sweep { ttl: Duration },
    Stats { reply: oneshot::Sender<Vec<RoomStats>> },
}

pub struct Hub<T: Transport> {
    coordinator: Coordinator,
    transport: T,
    limiter: RateLimiter,
}

impl<T: Transport> Hub<T> {
    #[must_use]
    pub fn new(coordinator: Coordinator, transport: T, limiter: RateLimiter) -> Self {
        Self { coordinator, transport, limiter }
    }

    #[must_use]
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Greet a connection whose channel is already reachable by the transport.
    pub fn connect(&mut self, client_id: ClientId) {
        info!(%client_id, "client connected");
        let outcome = self.coordinator.connect(client_id);
        apply(&mut self.transport, client_id, outcome);
    }

    /// Decode, validate, and dispatch one inbound text message.
    pub fn inbound(&mut self, client_id: ClientId, text: &str) {
        match self.dispatch(client_id, text) {
            Ok(outcome) => apply(&mut self.transport, client_id, outcome),
            Err(err) => warn!(%client_id, code = err.error_code(), error = %err, "event dropped"),
        }
    }

    pub fn disconnect(&mut self, client_id: ClientId) {
        let outcome = self.coordinator.disconnect(client_id);
        apply(&mut self.transport, client_id, outcome);
        self.transport.drop_client(client_id);
        self.limiter.forget(client_id);
        info!(%client_id, "client disconnected");
    }

    pub fn sweep(&mut self, ttl: Duration) -> Vec<RoomId> {
        let evicted = self.coordinator.sweep(Instant::now(), ttl);
        debug!(evicted = evicted.len(), rooms = self.coordinator.rooms().len(), "idle sweep finished");
        evicted
    }

    #[must_use]
    pub fn stats(&self) -> Vec<RoomStats> {
        self.coordinator.stats()
    }

    fn dispatch(&mut self, client_id: ClientId, text: &str) -> Result<Outcome, Dropped> {
        self.limiter
            .check_and_record(client_id)
            .map_err(|e| {
                debug!(%client_id, error = %e, "flood guard tripped");
                Dropped::RateLimited
            })?;

        let frame = Frame::decode(text).map_err(|e| Dropped::MalformedFrame(e.to_string()))?;
        let inbound = protocol::parse(&frame)?;
        if frame.is_cursor() {
            trace!(%client_id, event = inbound.event.name(), "recv event");
        } else {
            debug!(%client_id, event = inbound.event.name(), room_hint = ?inbound.room_hint, "recv event");
        }

        self.guarded(|coordinator| coordinator.handle(client_id, inbound))
    }

    /// Run one handler against the coordinator, turning a panic into
    /// `Dropped::Panicked`. Mutations made before the panic are kept.
    fn guarded<F>(&mut self, handler: F) -> Result<Outcome, Dropped>
    where
        F: FnOnce(&mut Coordinator) -> Result<Outcome, Dropped>,
    {
        let coordinator = &mut self.coordinator;
        panic::catch_unwind(AssertUnwindSafe(|| handler(coordinator))).unwrap_or(Err(Dropped::Panicked))
    }
}

impl Hub<ChannelTransport> {
    fn handle_command(&mut self, command: HubCommand) {
        match command {
            HubCommand::Connect { client_id, tx } => {
                self.transport.register(client_id, tx);
                self.connect(client_id);
            }
            HubCommand::Inbound { client_id, text } => self.inbound(client_id, &text),
            HubCommand::Disconnect { client_id } => self.disconnect(client_id),
            HubCommand::Sweep { ttl } => {
                self.sweep(ttl);
            }
            HubCommand::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
        }
    }
}

/// Spawn the hub task. It runs until every `HubHandle` is dropped.
pub fn spawn_hub(coordinator: Coordinator, limiter: RateLimiter, capacity: usize) -> (HubHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<HubCommand>(capacity);
    let mut hub = Hub::new(coordinator, ChannelTransport::new(), limiter);
    info!(capacity, flood_guard = hub.limiter.is_enabled(), "hub started");

    let task = tokio::spawn(async move {
        while let Some(command) = rx.recv().await {
            hub.handle_command(command);
        }
        info!("hub stopped");
    });
    (HubHandle { tx }, task)
}

// =============================================================================
// HANDLE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("hub is not running")]
    Closed,
}

impl ErrorCode for HubError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Closed => "E_HUB_CLOSED",
        }
    }
}

/// Cloneable sender side of the hub queue.
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// # Errors
    ///
    /// Returns `Closed` if the hub task has stopped.
    pub async fn connect(&self, client_id: ClientId, tx: mpsc::Sender<Outbound>) -> Result<(), HubError> {
        self.send(HubCommand::Connect { client_id, tx }).await
    }

    /// # Errors
    ///
    /// Returns `Closed` if the hub task has stopped.
    pub async fn inbound(&self, client_id: ClientId, text: String) -> Result<(), HubError> {
        self.send(HubCommand::Inbound { client_id, text }).await
    }

    /// # Errors
    ///
    /// Returns `Closed` if the hub task has stopped.
    pub async fn disconnect(&self, client_id: ClientId) -> Result<(), HubError> {
        self.send(HubCommand::Disconnect { client_id }).await
    }

    /// # Errors
    ///
    /// Returns `Closed` if the hub task has stopped.
    pub async fn sweep(&self, ttl: Duration) -> Result<(), HubError> {
        self.send(HubCommand::Sweep { ttl }).await
    }

    /// Per-room summary, computed on the hub task.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the hub task has stopped.
    pub async fn stats(&self) -> Result<Vec<RoomStats>, HubError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Stats { reply }).await?;
        rx.await.map_err(|_| HubError::Closed)
    }

    async fn send(&self, command: HubCommand) -> Result<(), HubError> {
        self.tx.send(command).await.map_err(|_| HubError::Closed)
    }
}

#[cfg(test)]
#[path = "hub_test.rs"]
mod tests;
