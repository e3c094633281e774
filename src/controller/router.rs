//! Input router - turns client events into host key commands
//!
//! Owns every piece of mutable engine state: slot bindings, the per-player key
//! tables, the stick state machines and the set of connected clients. All
//! handlers are synchronous and are expected to run under one lock (see
//! [`RouterHandle`](super::router_handle::RouterHandle)), which makes
//! assign-or-reject and debounce read-then-transition atomic.
//!
//! # Data Flow
//!
//! ```text
//! ClientMessage ──► PlayerRegistry.lookup ──► KeyTranslationTable ──► KeySink
//!                         │                          ▲
//!                         └──► AnalogDebouncer ──────┘ (sticks only)
//! ```

use crate::controller::debouncer::{AnalogDebouncer, Edge};
use crate::controller::registry::{PlayerRegistry, PlayerSlot, SessionId, MAX_PLAYERS};
use crate::mapping::{
    EngineError, KeyAction, KeyCommand, KeySink, KeyTranslationTable, LogicalControl, Stick,
};
use crate::server::hub::{ClientHub, ClientKind};
use crate::server::onboarding::OnboardingData;
use crate::server::protocol::{ClientMessage, MappingSnapshot, ServerMessage};
use chrono::Local;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Result of a successful connect
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectOutcome {
    Player(PlayerSlot),
    Dashboard,
}

pub struct InputRouter {
    registry: PlayerRegistry,
    tables: MappingSnapshot,
    debouncer: AnalogDebouncer,
    hub: ClientHub,
    sink: Box<dyn KeySink>,
    onboarding: OnboardingData,
}

impl InputRouter {
    /// Creates the router with a default key table for every slot.
    ///
    /// Tables live as long as the router; a player reconnecting to a slot
    /// finds the bindings the operator left there.
    pub fn new(sink: Box<dyn KeySink>, onboarding: OnboardingData) -> Self {
        info!("Creating input router with key sink: {}", sink.name());
        Self {
            registry: PlayerRegistry::new(),
            tables: PlayerSlot::all()
                .map(|slot| (slot, KeyTranslationTable::create_default()))
                .collect(),
            debouncer: AnalogDebouncer::new(),
            hub: ClientHub::new(),
            sink,
            onboarding,
        }
    }

    /// Registers a new connection.
    ///
    /// Dashboards receive the roster and the onboarding data. Players get the
    /// lowest free slot and an `assign_id`.
    ///
    /// # Errors
    ///
    /// [`EngineError::CapacityExceeded`] if no slot is free. Nothing is sent to
    /// the rejected client and it is not registered.
    pub fn on_connect(
        &mut self,
        session: SessionId,
        kind: ClientKind,
        outbox: mpsc::Sender<ServerMessage>,
    ) -> Result<ConnectOutcome, EngineError> {
        match kind {
            ClientKind::Dashboard => {
                self.hub.attach(session, kind, outbox);
                info!(
                    "Dashboard connected: {} ({} watching)",
                    session,
                    self.hub.dashboards()
                );
                self.hub.send_to(
                    session,
                    ServerMessage::RosterChanged {
                        player_ids: self.registry.roster(),
                    },
                );
                self.hub.send_to(
                    session,
                    ServerMessage::onboarding(
                        &self.onboarding.join_url,
                        &self.onboarding.qr_image,
                    ),
                );
                Ok(ConnectOutcome::Dashboard)
            }
            ClientKind::Player => {
                let slot = match self.registry.assign(session) {
                    Ok(slot) => slot,
                    Err(e) => {
                        warn!("Refusing {}: {}", session, e);
                        return Err(e);
                    }
                };
                self.hub.attach(session, kind, outbox);
                self.debouncer.attach(slot);
                self.hub
                    .send_to(session, ServerMessage::AssignId { player_id: slot });
                info!(
                    "Player {} connected ({}), {}/{} slots in use",
                    slot,
                    session,
                    self.registry.occupied(),
                    MAX_PLAYERS
                );
                self.broadcast_roster();
                Ok(ConnectOutcome::Player(slot))
            }
        }
    }

    /// Forgets a connection; frees its slot and drops its stick state
    pub fn on_disconnect(&mut self, session: SessionId) -> Option<PlayerSlot> {
        if let Some((kind, since)) = self.hub.detach(session) {
            let connected_for = Local::now().signed_duration_since(since);
            debug!(
                "{} ({:?}) detached after {}s",
                session,
                kind,
                connected_for.num_seconds()
            );
        }

        let slot = self.registry.release(session)?;
        let held = self.debouncer.discard(slot);
        if held > 0 {
            warn!(
                "Player {} left with {} stick direction(s) still pressed",
                slot, held
            );
        }
        info!("Player {} disconnected", slot);
        self.broadcast_roster();
        Some(slot)
    }

    /// Passes a digital button through to the host, 1:1.
    ///
    /// Events of sessions without a slot are ignored. Actions other than
    /// `press` and `release` do nothing.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownControl`] for a name outside the control set.
    pub fn on_button_event(
        &mut self,
        session: SessionId,
        control: &str,
        action: &str,
    ) -> Result<(), EngineError> {
        let Some(slot) = self.registry.lookup(session) else {
            debug!("Ignoring button from unassigned {}", session);
            return Ok(());
        };
        let control: LogicalControl = control.parse()?;

        let action = match action {
            "press" => KeyAction::Press,
            "release" => KeyAction::Release,
            other => {
                debug!("Ignoring button action {:?} from player {}", other, slot);
                return Ok(());
            }
        };
        self.emit(slot, control, action);
        Ok(())
    }

    /// Feeds a stick sample through the debouncer; missing axes count as 0.0
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownStick`] for a stick name other than
    /// `left-stick`/`right-stick`.
    pub fn on_stick_event(
        &mut self,
        session: SessionId,
        stick: &str,
        x: Option<f32>,
        y: Option<f32>,
    ) -> Result<(), EngineError> {
        let Some(slot) = self.registry.lookup(session) else {
            return Ok(());
        };
        let stick: Stick = stick.parse()?;

        let edges = self
            .debouncer
            .update(slot, stick, x.unwrap_or(0.0), y.unwrap_or(0.0));
        for edge in edges {
            // Key is looked up per edge, a remap mid-hold only affects later edges
            let control = LogicalControl::stick_direction(stick, edge.direction);
            let action = match edge.edge {
                Edge::Press => KeyAction::Press,
                Edge::Release => KeyAction::Release,
            };
            self.emit(slot, control, action);
        }
        Ok(())
    }

    /// Sends every player's table to the requesting session only
    pub fn on_request_mappings(&mut self, session: SessionId) {
        self.hub.send_to(
            session,
            ServerMessage::MappingsChanged {
                mappings: self.tables.clone(),
            },
        );
    }

    /// Rebinds one control of one player and re-sends all tables to all clients
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownControl`] or [`EngineError::UnknownPlayer`]; the
    /// tables are left untouched.
    pub fn on_update_mapping(
        &mut self,
        player_id: i64,
        control: &str,
        key: &str,
    ) -> Result<(), EngineError> {
        let control: LogicalControl = control.parse()?;
        let slot = PlayerSlot::from_wire(player_id)?;
        let table = self
            .tables
            .get_mut(&slot)
            .ok_or(EngineError::UnknownPlayer(player_id))?;

        let previous = table.set(control, key);
        debug!("Player {} {} was '{}'", slot, control, previous);
        info!(
            "Player {} keybinding updated: {} is now '{}'",
            slot, control, key
        );

        self.hub.broadcast_all(&ServerMessage::MappingsChanged {
            mappings: self.tables.clone(),
        });
        Ok(())
    }

    /// Dispatches one inbound message. Rejected events are logged and dropped.
    pub fn handle_message(&mut self, session: SessionId, message: ClientMessage) {
        let result = match message {
            ClientMessage::ButtonEvent { control, action } => {
                self.on_button_event(session, &control, &action)
            }
            ClientMessage::StickEvent { stick, x, y } => self.on_stick_event(session, &stick, x, y),
            ClientMessage::RequestMappings => {
                self.on_request_mappings(session);
                Ok(())
            }
            ClientMessage::UpdateMapping {
                player_id,
                control,
                key,
            } => self.on_update_mapping(player_id, &control, &key),
            ClientMessage::Unknown => {
                debug!("Ignoring unknown message type from {}", session);
                Ok(())
            }
        };

        if let Err(e) = result {
            debug!("Dropped event from {}: {}", session, e);
        }
    }

    pub fn roster(&self) -> Vec<PlayerSlot> {
        self.registry.roster()
    }

    pub fn mappings(&self) -> &MappingSnapshot {
        &self.tables
    }

    fn broadcast_roster(&self) {
        self.hub.broadcast_dashboards(&ServerMessage::RosterChanged {
            player_ids: self.registry.roster(),
        });
    }

    fn emit(&mut self, slot: PlayerSlot, control: LogicalControl, action: KeyAction) {
        let Some(table) = self.tables.get(&slot) else {
            error!("Player {} has no key table", slot);
            return;
        };
        let key = table.get(control);
        if key.is_empty() {
            debug!("Player {} {} is unbound", slot, control);
            return;
        }
        let command = match action {
            KeyAction::Press => KeyCommand::press(key),
            KeyAction::Release => KeyCommand::release(key),
        };
        debug!(
            "Player {} {} -> {:?} {}",
            slot, control, command.action, command.key
        );
        if let Err(e) = self.sink.apply(&command) {
            warn!("Key sink {} failed: {}", self.sink.name(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::RecordingKeySink;

    fn router() -> (InputRouter, RecordingKeySink) {
        let recorder = RecordingKeySink::new();
        let router = InputRouter::new(
            Box::new(recorder.clone()),
            OnboardingData::new("http://127.0.0.1:8000", b"<svg/>".to_vec()),
        );
        (router, recorder)
    }

    fn connect_player(router: &mut InputRouter, id: u64) -> mpsc::Receiver<ServerMessage> {
        let (tx, rx) = mpsc::channel(16);
        router
            .on_connect(SessionId::new(id), ClientKind::Player, tx)
            .unwrap();
        rx
    }

    #[test]
    fn unassigned_sessions_are_ignored() {
        let (mut router, recorder) = router();
        let stranger = SessionId::new(99);

        assert_eq!(router.on_button_event(stranger, "A", "press"), Ok(()));
        assert_eq!(router.on_stick_event(stranger, "left-stick", Some(1.0), None), Ok(()));
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn unknown_names_are_rejected_without_output() {
        let (mut router, recorder) = router();
        let _rx = connect_player(&mut router, 1);

        assert!(matches!(
            router.on_button_event(SessionId::new(1), "TURBO", "press"),
            Err(EngineError::UnknownControl(_))
        ));
        assert!(matches!(
            router.on_stick_event(SessionId::new(1), "tail-stick", Some(1.0), Some(1.0)),
            Err(EngineError::UnknownStick(_))
        ));
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn other_button_actions_are_noops() {
        let (mut router, recorder) = router();
        let _rx = connect_player(&mut router, 1);

        router.handle_message(
            SessionId::new(1),
            ClientMessage::ButtonEvent {
                control: "A".to_string(),
                action: "hold".to_string(),
            },
        );
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn buttons_are_not_debounced() {
        let (mut router, recorder) = router();
        let _rx = connect_player(&mut router, 1);

        router.on_button_event(SessionId::new(1), "B", "press").unwrap();
        router.on_button_event(SessionId::new(1), "B", "press").unwrap();

        assert_eq!(
            recorder.take(),
            vec![KeyCommand::press(" "), KeyCommand::press(" ")]
        );
    }

    #[test]
    fn missing_axes_default_to_center() {
        let (mut router, recorder) = router();
        let _rx = connect_player(&mut router, 1);

        router
            .on_stick_event(SessionId::new(1), "left-stick", Some(0.9), None)
            .unwrap();
        router
            .on_stick_event(SessionId::new(1), "left-stick", None, None)
            .unwrap();

        assert_eq!(
            recorder.take(),
            vec![KeyCommand::press("d"), KeyCommand::release("d")]
        );
    }

    #[test]
    fn remap_mid_hold_only_affects_next_edge() {
        let (mut router, recorder) = router();
        let _rx = connect_player(&mut router, 1);
        let session = SessionId::new(1);

        router
            .on_stick_event(session, "left-stick", Some(0.0), Some(0.8))
            .unwrap();
        router.on_update_mapping(1, "LEFT_STICK_UP", "i").unwrap();
        router
            .on_stick_event(session, "left-stick", Some(0.0), Some(0.0))
            .unwrap();

        assert_eq!(
            recorder.take(),
            vec![KeyCommand::press("w"), KeyCommand::release("i")]
        );
    }

    #[test]
    fn empty_binding_emits_nothing() {
        let (mut router, recorder) = router();
        let _rx = connect_player(&mut router, 1);
        let session = SessionId::new(1);

        router.on_update_mapping(1, "A", "").unwrap();
        router.on_update_mapping(1, "LEFT_STICK_RIGHT", "").unwrap();
        router.on_button_event(session, "A", "press").unwrap();
        router.on_button_event(session, "A", "release").unwrap();
        router
            .on_stick_event(session, "left-stick", Some(0.9), None)
            .unwrap();
        assert!(recorder.take().is_empty());

        router.on_update_mapping(1, "A", "x").unwrap();
        router.on_button_event(session, "A", "press").unwrap();
        assert_eq!(recorder.take(), vec![KeyCommand::press("x")]);
    }

    #[test]
    fn failed_remap_leaves_tables_untouched() {
        let (mut router, _recorder) = router();
        let before = router.mappings().clone();

        assert!(matches!(
            router.on_update_mapping(1, "TURBO", "k"),
            Err(EngineError::UnknownControl(_))
        ));
        assert_eq!(
            router.on_update_mapping(6, "A", "k"),
            Err(EngineError::UnknownPlayer(6))
        );
        assert_eq!(router.mappings(), &before);
    }

    #[test]
    fn dashboard_gets_roster_and_onboarding() {
        let (mut router, _recorder) = router();
        let _p1 = connect_player(&mut router, 1);
        let (tx, mut rx) = mpsc::channel(16);

        assert_eq!(
            router.on_connect(SessionId::new(50), ClientKind::Dashboard, tx),
            Ok(ConnectOutcome::Dashboard)
        );
        assert_eq!(
            rx.try_recv().ok(),
            Some(ServerMessage::RosterChanged {
                player_ids: vec![PlayerSlot::new(1).unwrap()]
            })
        );
        assert_eq!(
            rx.try_recv().ok(),
            Some(ServerMessage::onboarding("http://127.0.0.1:8000", b"<svg/>"))
        );
        assert_eq!(router.on_disconnect(SessionId::new(50)), None);
        assert_eq!(router.roster(), vec![PlayerSlot::new(1).unwrap()]);
    }
}
