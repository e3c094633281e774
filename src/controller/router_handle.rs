//! Router Handle - shared access to the input router
//!
//! Every connection task holds a clone. All engine state sits behind one
//! async mutex, so handlers for different clients never interleave inside the
//! registry or the debouncer.

use super::registry::{PlayerSlot, SessionId};
use super::router::{ConnectOutcome, InputRouter};
use crate::mapping::EngineError;
use crate::server::hub::ClientKind;
use crate::server::protocol::{ClientMessage, ServerMessage};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Cloneable handle to the single [`InputRouter`]
///
/// Session ids are handed out here so that they are unique for the lifetime
/// of the process, also across reconnects.
#[derive(Clone)]
pub struct RouterHandle {
    router: Arc<Mutex<InputRouter>>,
    next_session: Arc<AtomicU64>,
}

impl RouterHandle {
    pub fn new(router: InputRouter) -> Self {
        Self {
            router: Arc::new(Mutex::new(router)),
            next_session: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn next_session(&self) -> SessionId {
        SessionId::new(self.next_session.fetch_add(1, Ordering::Relaxed))
    }

    pub async fn connect(
        &self,
        session: SessionId,
        kind: ClientKind,
        outbox: mpsc::Sender<ServerMessage>,
    ) -> Result<ConnectOutcome, EngineError> {
        self.router.lock().await.on_connect(session, kind, outbox)
    }

    pub async fn disconnect(&self, session: SessionId) -> Option<PlayerSlot> {
        self.router.lock().await.on_disconnect(session)
    }

    /// Parses and routes one text frame; malformed frames are dropped
    pub async fn dispatch_text(&self, session: SessionId, text: &str) {
        match ClientMessage::parse(text) {
            Some(message) => self.dispatch(session, message).await,
            None => debug!("Dropping malformed frame from {}", session),
        }
    }

    pub async fn dispatch(&self, session: SessionId, message: ClientMessage) {
        self.router.lock().await.handle_message(session, message);
    }

    pub async fn roster(&self) -> Vec<PlayerSlot> {
        self.router.lock().await.roster()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::RecordingKeySink;
    use crate::server::onboarding::OnboardingData;

    #[test]
    fn session_ids_are_unique_across_clones() {
        let handle = RouterHandle::new(InputRouter::new(
            Box::new(RecordingKeySink::new()),
            OnboardingData::new("http://127.0.0.1:8000", Vec::new()),
        ));
        let clone = handle.clone();

        let first = handle.next_session();
        let second = clone.next_session();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn malformed_frames_are_dropped() {
        let recorder = RecordingKeySink::new();
        let handle = RouterHandle::new(InputRouter::new(
            Box::new(recorder.clone()),
            OnboardingData::new("http://127.0.0.1:8000", Vec::new()),
        ));
        let session = handle.next_session();
        let (tx, _rx) = mpsc::channel(8);
        handle.connect(session, ClientKind::Player, tx).await.unwrap();

        handle.dispatch_text(session, "{not json").await;
        handle
            .dispatch_text(
                session,
                r#"{"type":"button_event","control":"A","action":"press"}"#,
            )
            .await;

        assert_eq!(recorder.take().len(), 1);
    }
}
