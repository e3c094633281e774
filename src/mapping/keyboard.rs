//! Tastatur-Zuordnung pro Spieler

use crate::mapping::LogicalControl;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Standard-Belegung eines Controls.
///
/// Browser-Clients gehen von genau dieser Belegung aus, bevor ein Remap
/// stattgefunden hat.
pub const fn default_key(control: LogicalControl) -> &'static str {
    match control {
        LogicalControl::A => "x",
        LogicalControl::B => " ",
        LogicalControl::X => "c",
        LogicalControl::Y => "z",
        LogicalControl::DPadUp => "ArrowUp",
        LogicalControl::DPadDown => "ArrowDown",
        LogicalControl::DPadLeft => "ArrowLeft",
        LogicalControl::DPadRight => "ArrowRight",
        LogicalControl::LeftShoulder => "q",
        LogicalControl::RightShoulder => "e",
        LogicalControl::LeftTrigger => "f",
        LogicalControl::RightTrigger => "g",
        LogicalControl::View => "1",
        LogicalControl::Menu => "2",
        LogicalControl::LeftStickUp => "w",
        LogicalControl::LeftStickDown => "s",
        LogicalControl::LeftStickLeft => "a",
        LogicalControl::LeftStickRight => "d",
        LogicalControl::RightStickUp => "ArrowUp",
        LogicalControl::RightStickDown => "ArrowDown",
        LogicalControl::RightStickLeft => "ArrowLeft",
        LogicalControl::RightStickRight => "ArrowRight",
    }
}

/// Zuordnung von logischen Controls zu Tastenbezeichnern für einen Spieler-Slot.
///
/// Jeder Eintrag existiert zu jeder Zeit: die Tabelle ist ein Array über den
/// geschlossenen Control-Satz, `set` überschreibt nur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTranslationTable {
    bindings: [String; LogicalControl::COUNT],
}

impl KeyTranslationTable {
    /// Erstellt eine Tabelle mit der Standard-Belegung
    pub fn create_default() -> Self {
        Self {
            bindings: std::array::from_fn(|i| default_key(LogicalControl::ALL[i]).to_string()),
        }
    }

    /// Aktueller Tastenbezeichner eines Controls
    pub fn get(&self, control: LogicalControl) -> &str {
        &self.bindings[control.index()]
    }

    /// Überschreibt eine Belegung und liefert die vorherige zurück.
    /// Der Bezeichner wird nicht validiert.
    pub fn set(&mut self, control: LogicalControl, key: impl Into<String>) -> String {
        std::mem::replace(&mut self.bindings[control.index()], key.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = (LogicalControl, &str)> + '_ {
        LogicalControl::ALL
            .iter()
            .map(move |control| (*control, self.get(*control)))
    }
}

impl Default for KeyTranslationTable {
    fn default() -> Self {
        Self::create_default()
    }
}

impl Serialize for KeyTranslationTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(LogicalControl::COUNT))?;
        for (control, key) in self.iter() {
            map.serialize_entry(control.as_str(), key)?;
        }
        map.end()
    }
}
