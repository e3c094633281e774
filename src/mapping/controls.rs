//! Der feste Satz logischer Controls eines Phone-Gamepads.

use crate::mapping::EngineError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Ein benannter Button, eine D-Pad-Richtung oder eine Stick-Richtung.
///
/// Die Wire-Namen (`A`, `DPAD_UP`, `LSHLDR`, ...) sind die, die der Browser-Client
/// sendet und im Dashboard anzeigt. Die Menge ist geschlossen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogicalControl {
    A,
    B,
    X,
    Y,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    LeftShoulder,
    RightShoulder,
    LeftTrigger,
    RightTrigger,
    View,
    Menu,
    LeftStickUp,
    LeftStickDown,
    LeftStickLeft,
    LeftStickRight,
    RightStickUp,
    RightStickDown,
    RightStickLeft,
    RightStickRight,
}

impl LogicalControl {
    pub const COUNT: usize = 22;

    /// Alle Controls in Tabellen-Reihenfolge; `ALL[c.index()] == c`.
    pub const ALL: [LogicalControl; Self::COUNT] = [
        LogicalControl::A,
        LogicalControl::B,
        LogicalControl::X,
        LogicalControl::Y,
        LogicalControl::DPadUp,
        LogicalControl::DPadDown,
        LogicalControl::DPadLeft,
        LogicalControl::DPadRight,
        LogicalControl::LeftShoulder,
        LogicalControl::RightShoulder,
        LogicalControl::LeftTrigger,
        LogicalControl::RightTrigger,
        LogicalControl::View,
        LogicalControl::Menu,
        LogicalControl::LeftStickUp,
        LogicalControl::LeftStickDown,
        LogicalControl::LeftStickLeft,
        LogicalControl::LeftStickRight,
        LogicalControl::RightStickUp,
        LogicalControl::RightStickDown,
        LogicalControl::RightStickLeft,
        LogicalControl::RightStickRight,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            LogicalControl::A => "A",
            LogicalControl::B => "B",
            LogicalControl::X => "X",
            LogicalControl::Y => "Y",
            LogicalControl::DPadUp => "DPAD_UP",
            LogicalControl::DPadDown => "DPAD_DOWN",
            LogicalControl::DPadLeft => "DPAD_LEFT",
            LogicalControl::DPadRight => "DPAD_RIGHT",
            LogicalControl::LeftShoulder => "LSHLDR",
            LogicalControl::RightShoulder => "RSHLDR",
            LogicalControl::LeftTrigger => "L2",
            LogicalControl::RightTrigger => "R2",
            LogicalControl::View => "VIEW",
            LogicalControl::Menu => "MENU",
            LogicalControl::LeftStickUp => "LEFT_STICK_UP",
            LogicalControl::LeftStickDown => "LEFT_STICK_DOWN",
            LogicalControl::LeftStickLeft => "LEFT_STICK_LEFT",
            LogicalControl::LeftStickRight => "LEFT_STICK_RIGHT",
            LogicalControl::RightStickUp => "RIGHT_STICK_UP",
            LogicalControl::RightStickDown => "RIGHT_STICK_DOWN",
            LogicalControl::RightStickLeft => "RIGHT_STICK_LEFT",
            LogicalControl::RightStickRight => "RIGHT_STICK_RIGHT",
        }
    }

    /// Pseudo-Control einer Stick-Richtung
    pub const fn stick_direction(stick: Stick, direction: Direction) -> Self {
        match (stick, direction) {
            (Stick::Left, Direction::Up) => LogicalControl::LeftStickUp,
            (Stick::Left, Direction::Down) => LogicalControl::LeftStickDown,
            (Stick::Left, Direction::Left) => LogicalControl::LeftStickLeft,
            (Stick::Left, Direction::Right) => LogicalControl::LeftStickRight,
            (Stick::Right, Direction::Up) => LogicalControl::RightStickUp,
            (Stick::Right, Direction::Down) => LogicalControl::RightStickDown,
            (Stick::Right, Direction::Left) => LogicalControl::RightStickLeft,
            (Stick::Right, Direction::Right) => LogicalControl::RightStickRight,
        }
    }
}

impl FromStr for LogicalControl {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogicalControl::ALL
            .iter()
            .copied()
            .find(|control| control.as_str() == s)
            .ok_or_else(|| EngineError::UnknownControl(s.to_string()))
    }
}

impl fmt::Display for LogicalControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LogicalControl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Einer der beiden Analog-Sticks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stick {
    Left,
    Right,
}

impl Stick {
    pub const fn as_str(self) -> &'static str {
        match self {
            Stick::Left => "left-stick",
            Stick::Right => "right-stick",
        }
    }
}

impl FromStr for Stick {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left-stick" => Ok(Stick::Left),
            "right-stick" => Ok(Stick::Right),
            other => Err(EngineError::UnknownStick(other.to_string())),
        }
    }
}

impl fmt::Display for Stick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aus einer Stick-Position abgeleitete digitale Richtung
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Auswertungsreihenfolge bei jedem Sample
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}
