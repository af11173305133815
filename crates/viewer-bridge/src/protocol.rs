//! Wire messages exchanged with the viewer through `postMessage`
//!
//! Host to viewer:
//! `{"type":"control-update","action":"set-zoom","payload":1.5,"id":"..."}`
//!
//! Viewer to host:
//! - `{"type":"control-response","id":"...","success":true,"action":"set-zoom"}`
//! - `{"type":"viewer-readiness","viewerId":"v1","stage":4}`
//! - `{"viewerId":"v1","event":"pageChange","param":3}`

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::ViewerCommand;
use crate::error::{BridgeError, Result};
use crate::readiness::ReadinessStage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HostMessage {
    ControlUpdate {
        action: String,
        payload: Value,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        id: Option<String>,
    },
}

impl HostMessage {
    pub fn control_update(id: &str, command: &ViewerCommand) -> Self {
        HostMessage::ControlUpdate {
            action: command.action().to_string(),
            payload: command.payload(),
            id: Some(id.to_string()),
        }
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlResponse {
    pub id: String,
    pub success: bool,
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ControlResponse {
    pub fn ok(id: &str, action: &str, payload: Option<Value>) -> Self {
        Self {
            id: id.to_string(),
            success: true,
            action: action.to_string(),
            payload,
            error: None,
        }
    }

    pub fn rejected(id: &str, action: &str, error: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            success: false,
            action: action.to_string(),
            payload: None,
            error: Some(error.into()),
        }
    }

    /// Wire form, including the `type` discriminator
    pub fn to_value(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.insert("type".to_string(), Value::from(CONTROL_RESPONSE));
        }
        Ok(value)
    }

    /// Turn the response into the executor's outcome
    pub fn into_result(self) -> Result<Option<Value>> {
        if self.success {
            Ok(self.payload)
        } else {
            Err(BridgeError::RemoteRejected(
                self.error.unwrap_or_else(|| format!("{} failed", self.action)),
            ))
        }
    }
}

/// Unsolicited event emitted by the viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerEventMessage {
    #[serde(rename = "viewerId")]
    pub viewer_id: String,
    pub event: String,
    #[serde(default)]
    pub param: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Response(ControlResponse),
    Readiness {
        viewer_id: Option<String>,
        stage: ReadinessStage,
    },
    Event(ViewerEventMessage),
}

pub const CONTROL_RESPONSE: &str = "control-response";
pub const VIEWER_READINESS: &str = "viewer-readiness";

impl InboundMessage {
    /// Classify a `message` event payload.
    ///
    /// Returns `Ok(None)` for messages that are not ours (other scripts on
    /// the page post messages too) and `Err` for ours that are malformed.
    pub fn parse(data: &Value) -> Result<Option<Self>> {
        let Some(object) = data.as_object() else {
            return Ok(None);
        };

        match object.get("type").and_then(Value::as_str) {
            Some(CONTROL_RESPONSE) => {
                let response: ControlResponse = serde_json::from_value(data.clone())?;
                Ok(Some(InboundMessage::Response(response)))
            }
            Some(VIEWER_READINESS) => {
                let stage = object
                    .get("stage")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| BridgeError::Protocol("readiness without stage".to_string()))?;
                let viewer_id = object
                    .get("viewerId")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Ok(Some(InboundMessage::Readiness {
                    viewer_id,
                    stage: ReadinessStage::from_wire(stage),
                }))
            }
            Some(_) => Ok(None),
            None => {
                if object.contains_key("viewerId") && object.contains_key("event") {
                    let event: ViewerEventMessage = serde_json::from_value(data.clone())?;
                    Ok(Some(InboundMessage::Event(event)))
                } else {
                    Ok(None)
                }
            }
        }
    }
}
