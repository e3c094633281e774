//! Modul für die Übersetzung von Controls in Host-Tastenbefehle.
//!
//! Enthält den festen Control-Satz, die pro Spieler änderbare
//! Tastentabelle und die Schnittstelle zur Tastatur-Simulation.

pub mod controls;
pub mod error;
pub mod key_sink;
pub mod keyboard;

// Re-exports für einfacheren Zugriff
pub use controls::{Direction, LogicalControl, Stick};
pub use error::EngineError;
pub use key_sink::{
    KeyAction, KeyCommand, KeyId, KeySink, KeySinkError, LogKeySink, RecordingKeySink, SpecialKey,
};
pub use keyboard::KeyTranslationTable;

#[cfg(feature = "host-keys")]
pub use key_sink::RdevKeySink;
