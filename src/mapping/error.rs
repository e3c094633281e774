//! Fehlerdefinitionen für Routing und Mapping

use thiserror::Error;

/// Fehler, die bei der Verarbeitung eines Client-Events entstehen können.
///
/// Keiner dieser Fehler ist fatal: der Router verwirft das betroffene Event
/// und protokolliert den Grund, der Client erfährt davon nichts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Alle Spieler-Slots sind belegt
    #[error("all {capacity} player slots are occupied")]
    CapacityExceeded { capacity: u8 },

    /// Der Name gehört nicht zum festen Satz logischer Controls
    #[error("unknown control: {0:?}")]
    UnknownControl(String),

    /// Der Stick-Name ist weder `left-stick` noch `right-stick`
    #[error("unknown stick: {0:?}")]
    UnknownStick(String),

    /// Für diese Spieler-Nummer existiert keine Tabelle
    #[error("no key table for player {0}")]
    UnknownPlayer(i64),
}
