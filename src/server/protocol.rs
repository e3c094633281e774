//! JSON wire format between browser clients and the server
//!
//! Every frame is a text frame holding one object tagged by `"type"`.

use crate::controller::registry::PlayerSlot;
use crate::mapping::KeyTranslationTable;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every player's full key table, keyed by slot number
pub type MappingSnapshot = BTreeMap<PlayerSlot, KeyTranslationTable>;

/// Client → server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    ButtonEvent {
        #[serde(default)]
        control: String,
        #[serde(default)]
        action: String,
    },

    StickEvent {
        #[serde(default)]
        stick: String,
        #[serde(default)]
        x: Option<f32>,
        #[serde(default)]
        y: Option<f32>,
    },

    RequestMappings,

    UpdateMapping {
        player_id: i64,
        control: String,
        key: String,
    },

    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Parses one text frame; malformed frames yield `None`
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// Server → client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    AssignId { player_id: PlayerSlot },

    RosterChanged { player_ids: Vec<PlayerSlot> },

    MappingsChanged { mappings: MappingSnapshot },

    OnboardingData {
        join_url: String,
        /// Base64 encoded SVG image
        qr_image: String,
    },
}

impl ServerMessage {
    pub fn onboarding(join_url: &str, qr_image: &[u8]) -> Self {
        ServerMessage::OnboardingData {
            join_url: join_url.to_string(),
            qr_image: STANDARD.encode(qr_image),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Short name for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::AssignId { .. } => "assign_id",
            ServerMessage::RosterChanged { .. } => "roster_changed",
            ServerMessage::MappingsChanged { .. } => "mappings_changed",
            ServerMessage::OnboardingData { .. } => "onboarding_data",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_input_events() {
        assert_eq!(
            ClientMessage::parse(r#"{"type":"button_event","control":"A","action":"press"}"#),
            Some(ClientMessage::ButtonEvent {
                control: "A".to_string(),
                action: "press".to_string()
            })
        );
        assert_eq!(
            ClientMessage::parse(r#"{"type":"stick_event","stick":"left-stick","y":0.8}"#),
            Some(ClientMessage::StickEvent {
                stick: "left-stick".to_string(),
                x: None,
                y: Some(0.8)
            })
        );
        assert_eq!(
            ClientMessage::parse(r#"{"type":"request_mappings"}"#),
            Some(ClientMessage::RequestMappings)
        );
        assert_eq!(
            ClientMessage::parse(
                r#"{"type":"update_mapping","player_id":2,"control":"A","key":"k"}"#
            ),
            Some(ClientMessage::UpdateMapping {
                player_id: 2,
                control: "A".to_string(),
                key: "k".to_string()
            })
        );
    }

    #[test]
    fn unknown_and_malformed_frames() {
        assert_eq!(
            ClientMessage::parse(r#"{"type":"vibrate","ms":20}"#),
            Some(ClientMessage::Unknown)
        );
        assert_eq!(ClientMessage::parse("not json"), None);
        assert_eq!(
            ClientMessage::parse(r#"{"type":"stick_event","x":"left"}"#),
            None
        );
    }

    #[test]
    fn serializes_outbound_messages() {
        let slot = PlayerSlot::new(1).unwrap();
        let assign = serde_json::to_value(ServerMessage::AssignId { player_id: slot }).unwrap();
        assert_eq!(assign, json!({"type": "assign_id", "player_id": 1}));

        let roster = serde_json::to_value(ServerMessage::RosterChanged {
            player_ids: vec![slot, PlayerSlot::new(3).unwrap()],
        })
        .unwrap();
        assert_eq!(roster, json!({"type": "roster_changed", "player_ids": [1, 3]}));

        let mut mappings = MappingSnapshot::new();
        mappings.insert(slot, KeyTranslationTable::create_default());
        let changed = serde_json::to_value(ServerMessage::MappingsChanged { mappings }).unwrap();
        assert_eq!(changed["mappings"]["1"]["A"], "x");
        assert_eq!(changed["mappings"]["1"]["B"], " ");
    }

    #[test]
    fn onboarding_image_is_base64() {
        let message = ServerMessage::onboarding("http://10.0.0.2:8000", b"<svg/>");
        assert_eq!(message.kind(), "onboarding_data");
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "type": "onboarding_data",
                "join_url": "http://10.0.0.2:8000",
                "qr_image": "PHN2Zy8+"
            })
        );
    }
}
