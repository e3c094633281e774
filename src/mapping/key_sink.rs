//! Schnittstelle zur Tastatur-Simulation auf dem Host

use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::info;

/// Benannte Sondertasten, die ein Tastenbezeichner ansprechen kann
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpecialKey {
    Space,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Enter,
    Escape,
    Shift,
    Control,
    Alt,
}

impl SpecialKey {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            " " => Some(SpecialKey::Space),
            "ArrowUp" => Some(SpecialKey::ArrowUp),
            "ArrowDown" => Some(SpecialKey::ArrowDown),
            "ArrowLeft" => Some(SpecialKey::ArrowLeft),
            "ArrowRight" => Some(SpecialKey::ArrowRight),
            "Enter" => Some(SpecialKey::Enter),
            "Escape" => Some(SpecialKey::Escape),
            "Shift" => Some(SpecialKey::Shift),
            "Control" => Some(SpecialKey::Control),
            "Alt" => Some(SpecialKey::Alt),
            _ => None,
        }
    }
}

/// Aufgelöster Tastenbezeichner.
///
/// Alles, was keine bekannte Sondertaste ist, wird als Literal durchgereicht.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyId {
    Special(SpecialKey),
    Literal(String),
}

impl KeyId {
    pub fn parse(raw: &str) -> Self {
        match SpecialKey::from_name(raw) {
            Some(special) => KeyId::Special(special),
            None => KeyId::Literal(raw.to_string()),
        }
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyId::Special(special) => write!(f, "{special:?}"),
            KeyId::Literal(literal) => write!(f, "{literal:?}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Release,
}

/// Ein an den Host abgegebener Tastenbefehl
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyCommand {
    pub action: KeyAction,
    pub key: KeyId,
}

impl KeyCommand {
    pub fn press(raw: &str) -> Self {
        Self {
            action: KeyAction::Press,
            key: KeyId::parse(raw),
        }
    }

    pub fn release(raw: &str) -> Self {
        Self {
            action: KeyAction::Release,
            key: KeyId::parse(raw),
        }
    }
}

#[derive(Debug, Error)]
pub enum KeySinkError {
    /// Der Bezeichner lässt sich auf keine Host-Taste abbilden
    #[error("no host key for {0}")]
    Unmappable(KeyId),

    #[error("simulation failed: {0}")]
    Simulate(String),
}

/// Ziel der Press/Release-Befehle.
///
/// Aufrufe erfolgen synchron unter dem Router-Lock; Implementierungen dürfen
/// nicht blockieren.
pub trait KeySink: Send + 'static {
    fn press(&mut self, key: &KeyId) -> Result<(), KeySinkError>;

    fn release(&mut self, key: &KeyId) -> Result<(), KeySinkError>;

    fn name(&self) -> &str;

    fn apply(&mut self, command: &KeyCommand) -> Result<(), KeySinkError> {
        match command.action {
            KeyAction::Press => self.press(&command.key),
            KeyAction::Release => self.release(&command.key),
        }
    }
}

/// Protokolliert Befehle nur, ohne den Host zu berühren (`--dry-run`)
#[derive(Debug, Default)]
pub struct LogKeySink;

impl KeySink for LogKeySink {
    fn press(&mut self, key: &KeyId) -> Result<(), KeySinkError> {
        info!("press {}", key);
        Ok(())
    }

    fn release(&mut self, key: &KeyId) -> Result<(), KeySinkError> {
        info!("release {}", key);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Sammelt Befehle im Speicher, z.B. für Tests gegen den Router.
/// Klone teilen sich dieselbe Liste.
#[derive(Debug, Default, Clone)]
pub struct RecordingKeySink {
    commands: Arc<Mutex<Vec<KeyCommand>>>,
}

impl RecordingKeySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entnimmt alle bisher aufgezeichneten Befehle
    pub fn take(&self) -> Vec<KeyCommand> {
        match self.commands.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    fn record(&self, command: KeyCommand) {
        match self.commands.lock() {
            Ok(mut guard) => guard.push(command),
            Err(poisoned) => poisoned.into_inner().push(command),
        }
    }
}

impl KeySink for RecordingKeySink {
    fn press(&mut self, key: &KeyId) -> Result<(), KeySinkError> {
        self.record(KeyCommand {
            action: KeyAction::Press,
            key: key.clone(),
        });
        Ok(())
    }

    fn release(&mut self, key: &KeyId) -> Result<(), KeySinkError> {
        self.record(KeyCommand {
            action: KeyAction::Release,
            key: key.clone(),
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

#[cfg(feature = "host-keys")]
pub use host::RdevKeySink;

#[cfg(feature = "host-keys")]
mod host {
    use super::{KeyId, KeySink, KeySinkError, SpecialKey};
    use rdev::{simulate, EventType, Key};
    use tracing::debug;

    /// Simuliert Tastendrücke über rdev auf dem Host-System
    #[derive(Debug, Default)]
    pub struct RdevKeySink;

    impl RdevKeySink {
        fn send(&self, event: EventType) -> Result<(), KeySinkError> {
            debug!("Simulating {:?}", event);
            simulate(&event).map_err(|e| KeySinkError::Simulate(format!("{:?}", e)))
        }
    }

    impl KeySink for RdevKeySink {
        fn press(&mut self, key: &KeyId) -> Result<(), KeySinkError> {
            let host_key = host_key(key).ok_or_else(|| KeySinkError::Unmappable(key.clone()))?;
            self.send(EventType::KeyPress(host_key))
        }

        fn release(&mut self, key: &KeyId) -> Result<(), KeySinkError> {
            let host_key = host_key(key).ok_or_else(|| KeySinkError::Unmappable(key.clone()))?;
            self.send(EventType::KeyRelease(host_key))
        }

        fn name(&self) -> &str {
            "rdev"
        }
    }

    fn host_key(key: &KeyId) -> Option<Key> {
        match key {
            KeyId::Special(special) => Some(match special {
                SpecialKey::Space => Key::Space,
                SpecialKey::ArrowUp => Key::UpArrow,
                SpecialKey::ArrowDown => Key::DownArrow,
                SpecialKey::ArrowLeft => Key::LeftArrow,
                SpecialKey::ArrowRight => Key::RightArrow,
                SpecialKey::Enter => Key::Return,
                SpecialKey::Escape => Key::Escape,
                SpecialKey::Shift => Key::ShiftLeft,
                SpecialKey::Control => Key::ControlLeft,
                SpecialKey::Alt => Key::Alt,
            }),
            KeyId::Literal(literal) => {
                let mut chars = literal.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => char_key(c),
                    _ => None,
                }
            }
        }
    }

    /// Taste für ein einzelnes, ohne Umschalttaste tippbares Zeichen.
    ///
    /// Großbuchstaben und Shift-Symbole liefern `None`; ein `KeyK` würde
    /// sonst still als `k` getippt.
    fn char_key(c: char) -> Option<Key> {
        let key = match c {
            'a' => Key::KeyA,
            'b' => Key::KeyB,
            'c' => Key::KeyC,
            'd' => Key::KeyD,
            'e' => Key::KeyE,
            'f' => Key::KeyF,
            'g' => Key::KeyG,
            'h' => Key::KeyH,
            'i' => Key::KeyI,
            'j' => Key::KeyJ,
            'k' => Key::KeyK,
            'l' => Key::KeyL,
            'm' => Key::KeyM,
            'n' => Key::KeyN,
            'o' => Key::KeyO,
            'p' => Key::KeyP,
            'q' => Key::KeyQ,
            'r' => Key::KeyR,
            's' => Key::KeyS,
            't' => Key::KeyT,
            'u' => Key::KeyU,
            'v' => Key::KeyV,
            'w' => Key::KeyW,
            'x' => Key::KeyX,
            'y' => Key::KeyY,
            'z' => Key::KeyZ,
            '0' => Key::Num0,
            '1' => Key::Num1,
            '2' => Key::Num2,
            '3' => Key::Num3,
            '4' => Key::Num4,
            '5' => Key::Num5,
            '6' => Key::Num6,
            '7' => Key::Num7,
            '8' => Key::Num8,
            '9' => Key::Num9,
            '-' => Key::Minus,
            '=' => Key::Equal,
            ',' => Key::Comma,
            '.' => Key::Dot,
            '/' => Key::Slash,
            ';' => Key::SemiColon,
            '\'' => Key::Quote,
            '\\' => Key::BackSlash,
            '[' => Key::LeftBracket,
            ']' => Key::RightBracket,
            '`' => Key::BackQuote,
            '\t' => Key::Tab,
            '\n' => Key::Return,
            _ => return None,
        };
        Some(key)
    }

}
