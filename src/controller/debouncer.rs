//! Analog stick to digital direction conversion
//!
//! Every (player, stick, direction) triple is a two-state machine:
//!
//! ```text
//!            active
//! Released ──────────► Pressed
//!    ▲                    │
//!    └────────────────────┘
//!           !active
//! ```
//!
//! An edge is reported only on a state change. Repeating the same sample
//! produces nothing, which keeps the host keyboard from being flooded by the
//! high-rate stick stream.

use crate::controller::registry::PlayerSlot;
use crate::mapping::{Direction, Stick};
use std::collections::HashMap;
use tracing::debug;

/// Deflection a stick axis must exceed (strictly) to activate a direction
pub const STICK_THRESHOLD: f32 = 0.5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DirectionState {
    #[default]
    Released,
    Pressed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Press,
    Release,
}

/// Transition produced by one sample for one direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StickEdge {
    pub direction: Direction,
    pub edge: Edge,
}

/// Last emitted state of the four directions of one stick
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StickAxisState {
    directions: [DirectionState; 4],
}

impl StickAxisState {
    pub fn state(&self, direction: Direction) -> DirectionState {
        self.directions[direction.index()]
    }

    pub fn is_pressed(&self, direction: Direction) -> bool {
        self.state(direction) == DirectionState::Pressed
    }

    pub fn held(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL
            .into_iter()
            .filter(move |direction| self.is_pressed(*direction))
    }

    fn apply(&mut self, direction: Direction, active: bool) -> Option<Edge> {
        let state = &mut self.directions[direction.index()];
        match (active, *state) {
            (true, DirectionState::Released) => {
                *state = DirectionState::Pressed;
                Some(Edge::Press)
            }
            (false, DirectionState::Pressed) => {
                *state = DirectionState::Released;
                Some(Edge::Release)
            }
            _ => None,
        }
    }
}

/// Whether `direction` is active for the sample `(x, y)`.
/// Each direction is evaluated on its own axis, so diagonals activate two.
pub fn is_active(direction: Direction, x: f32, y: f32, threshold: f32) -> bool {
    match direction {
        Direction::Up => y > threshold,
        Direction::Down => y < -threshold,
        Direction::Left => x < -threshold,
        Direction::Right => x > threshold,
    }
}

/// Per-player stick state machines
#[derive(Debug)]
pub struct AnalogDebouncer {
    threshold: f32,
    sticks: HashMap<(PlayerSlot, Stick), StickAxisState>,
}

impl Default for AnalogDebouncer {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalogDebouncer {
    pub fn new() -> Self {
        Self {
            threshold: STICK_THRESHOLD,
            sticks: HashMap::new(),
        }
    }

    /// Creates released state for both sticks of a newly assigned slot
    pub fn attach(&mut self, slot: PlayerSlot) {
        for stick in [Stick::Left, Stick::Right] {
            self.sticks.insert((slot, stick), StickAxisState::default());
        }
    }

    /// Drops the state of a released slot.
    ///
    /// Returns the number of directions that were still pressed. No release
    /// is emitted for them.
    pub fn discard(&mut self, slot: PlayerSlot) -> usize {
        [Stick::Left, Stick::Right]
            .into_iter()
            .filter_map(|stick| self.sticks.remove(&(slot, stick)))
            .map(|state| state.held().count())
            .sum()
    }

    pub fn state(&self, slot: PlayerSlot, stick: Stick) -> Option<&StickAxisState> {
        self.sticks.get(&(slot, stick))
    }

    /// Feeds one sample and returns the resulting edges in
    /// up, down, left, right order
    pub fn update(&mut self, slot: PlayerSlot, stick: Stick, x: f32, y: f32) -> Vec<StickEdge> {
        let threshold = self.threshold;
        let state = self.sticks.entry((slot, stick)).or_default();

        let edges: Vec<StickEdge> = Direction::ALL
            .into_iter()
            .filter_map(|direction| {
                state
                    .apply(direction, is_active(direction, x, y, threshold))
                    .map(|edge| StickEdge { direction, edge })
            })
            .collect();

        if !edges.is_empty() {
            debug!(
                "Player {} {} ({:.2}, {:.2}) -> {:?}",
                slot, stick, x, y, edges
            );
        }
        edges
    }
}
