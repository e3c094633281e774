//! Player slot allocation
//!
//! Binds transport sessions to numbered controller seats `1..=MAX_PLAYERS`.
//! The lowest free number is always handed out first, so a seat freed by a
//! disconnect is the next one to be reused.

use crate::mapping::EngineError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Number of controller seats
pub const MAX_PLAYERS: u8 = 5;

/// One controller seat, always in `1..=MAX_PLAYERS`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PlayerSlot(u8);

impl PlayerSlot {
    pub fn new(number: u8) -> Option<Self> {
        (1..=MAX_PLAYERS).contains(&number).then_some(Self(number))
    }

    /// Resolves a player number as sent by a client
    pub fn from_wire(number: i64) -> Result<Self, EngineError> {
        u8::try_from(number)
            .ok()
            .and_then(Self::new)
            .ok_or(EngineError::UnknownPlayer(number))
    }

    #[cfg(test)]
    pub fn get(self) -> u8 {
        self.0
    }

    /// All seats in ascending order
    pub fn all() -> impl Iterator<Item = PlayerSlot> {
        (1..=MAX_PLAYERS).map(PlayerSlot)
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identity of one transport connection
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Session ↔ slot bindings.
///
/// Lookups scan the (at most `MAX_PLAYERS`) occupied slots.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    slots: BTreeMap<PlayerSlot, SessionId>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `session` to the smallest free slot.
    ///
    /// A session that already owns a slot keeps it.
    ///
    /// # Errors
    ///
    /// [`EngineError::CapacityExceeded`] when every slot is taken.
    pub fn assign(&mut self, session: SessionId) -> Result<PlayerSlot, EngineError> {
        if let Some(existing) = self.lookup(session) {
            debug!("{} already owns slot {}", session, existing);
            return Ok(existing);
        }

        let slot = PlayerSlot::all()
            .find(|slot| !self.slots.contains_key(slot))
            .ok_or(EngineError::CapacityExceeded {
                capacity: MAX_PLAYERS,
            })?;

        self.slots.insert(slot, session);
        debug!("Bound {} to slot {}", session, slot);
        Ok(slot)
    }

    /// Frees the slot owned by `session`; `None` if it owned none
    pub fn release(&mut self, session: SessionId) -> Option<PlayerSlot> {
        let slot = self.lookup(session)?;
        self.slots.remove(&slot);
        debug!("Released slot {} from {}", slot, session);
        Some(slot)
    }

    pub fn lookup(&self, session: SessionId) -> Option<PlayerSlot> {
        self.slots
            .iter()
            .find(|(_, owner)| **owner == session)
            .map(|(slot, _)| *slot)
    }

    /// Occupied slots in ascending order
    pub fn roster(&self) -> Vec<PlayerSlot> {
        self.slots.keys().copied().collect()
    }

    pub fn occupied(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(n: u8) -> PlayerSlot {
        PlayerSlot::new(n).unwrap()
    }

    #[test]
    fn slot_numbers_are_bounded() {
        assert!(PlayerSlot::new(0).is_none());
        assert!(PlayerSlot::new(MAX_PLAYERS + 1).is_none());
        assert_eq!(PlayerSlot::new(3).map(PlayerSlot::get), Some(3));
        assert_eq!(PlayerSlot::from_wire(-1), Err(EngineError::UnknownPlayer(-1)));
        assert_eq!(PlayerSlot::from_wire(300), Err(EngineError::UnknownPlayer(300)));
        assert_eq!(PlayerSlot::from_wire(5), Ok(slot(5)));
    }

    #[test]
    fn assigns_lowest_free_slot_and_reuses_released() {
        let mut registry = PlayerRegistry::new();
        for n in 1..=5u64 {
            assert_eq!(registry.assign(SessionId::new(n)), Ok(slot(n as u8)));
        }

        assert_eq!(
            registry.assign(SessionId::new(6)),
            Err(EngineError::CapacityExceeded { capacity: 5 })
        );

        assert_eq!(registry.release(SessionId::new(3)), Some(slot(3)));
        assert_eq!(registry.roster(), vec![slot(1), slot(2), slot(4), slot(5)]);
        assert_eq!(registry.assign(SessionId::new(7)), Ok(slot(3)));
        assert_eq!(registry.lookup(SessionId::new(7)), Some(slot(3)));
        assert_eq!(registry.occupied(), 5);
    }

    #[test]
    fn release_of_unknown_session_is_noop() {
        let mut registry = PlayerRegistry::new();
        registry.assign(SessionId::new(1)).unwrap();

        assert_eq!(registry.release(SessionId::new(42)), None);
        assert_eq!(registry.roster(), vec![slot(1)]);
    }

    #[test]
    fn assign_is_stable_for_bound_session() {
        let mut registry = PlayerRegistry::new();
        let first = registry.assign(SessionId::new(9)).unwrap();
        let second = registry.assign(SessionId::new(9)).unwrap();

        assert_eq!(first, second);
        assert_eq!(registry.occupied(), 1);
    }
}
