use serde::{Deserialize, Serialize};

/// Messages sent by the companion control surface.
///
/// Wire format: `{"action": "activate", "token": "..."}` or
/// `{"action": "deactivate"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControlMessage {
    Activate { token: String },
    Deactivate,
}

impl ControlMessage {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
