//! Network side: wire format, client registry, onboarding and the socket server

pub mod hub;
pub mod onboarding;
pub mod protocol;
pub mod websocket;

pub use hub::{ClientHub, ClientKind};
pub use onboarding::OnboardingData;
pub use protocol::{ClientMessage, MappingSnapshot, ServerMessage};
pub use websocket::{ServerError, TransportSettings, WebSocketServer};
