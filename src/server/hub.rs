//! Outbound queues of all connected clients

use crate::controller::registry::SessionId;
use crate::server::protocol::ServerMessage;
use chrono::{DateTime, Local};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Role of a connection, fixed at connect time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientKind {
    Player,
    Dashboard,
}

impl ClientKind {
    /// Dashboards connect on `/dashboard`, everything else is a gamepad
    pub fn from_path(path: &str) -> Self {
        if path.trim_end_matches('/') == "/dashboard" {
            ClientKind::Dashboard
        } else {
            ClientKind::Player
        }
    }
}

#[derive(Debug)]
struct ClientEntry {
    kind: ClientKind,
    outbox: mpsc::Sender<ServerMessage>,
    connected_at: DateTime<Local>,
}

/// Registered clients and their outbound channels.
///
/// Sends never wait: a full queue drops the message for that client only.
#[derive(Debug, Default)]
pub struct ClientHub {
    clients: HashMap<SessionId, ClientEntry>,
}

impl ClientHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(
        &mut self,
        session: SessionId,
        kind: ClientKind,
        outbox: mpsc::Sender<ServerMessage>,
    ) {
        debug!("Attaching {} as {:?}", session, kind);
        self.clients.insert(
            session,
            ClientEntry {
                kind,
                outbox,
                connected_at: Local::now(),
            },
        );
    }

    /// Removes a client and returns its kind and connection time
    pub fn detach(&mut self, session: SessionId) -> Option<(ClientKind, DateTime<Local>)> {
        self.clients
            .remove(&session)
            .map(|entry| (entry.kind, entry.connected_at))
    }

    pub fn dashboards(&self) -> usize {
        self.clients
            .values()
            .filter(|entry| entry.kind == ClientKind::Dashboard)
            .count()
    }

    pub fn send_to(&self, session: SessionId, message: ServerMessage) {
        match self.clients.get(&session) {
            Some(entry) => deliver(session, entry, message),
            None => debug!("No client {} for {}", session, message.kind()),
        }
    }

    pub fn broadcast_dashboards(&self, message: &ServerMessage) {
        for (session, entry) in &self.clients {
            if entry.kind == ClientKind::Dashboard {
                deliver(*session, entry, message.clone());
            }
        }
    }

    pub fn broadcast_all(&self, message: &ServerMessage) {
        for (session, entry) in &self.clients {
            deliver(*session, entry, message.clone());
        }
    }
}

fn deliver(session: SessionId, entry: &ClientEntry, message: ServerMessage) {
    let kind = message.kind();
    match entry.outbox.try_send(message) {
        Ok(_) => debug!("Queued {} for {}", kind, session),
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!("Outbound queue of {} is full, {} dropped", session, kind)
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("{} already closed, {} dropped", session, kind)
        }
    }
}
