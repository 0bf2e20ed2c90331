//! WebSocket wire protocol.
//!
//! Inbound frames are a single JSON object whose keys are independent
//! intents (`name`, `color`, `roomCode`, `selected`, `setValue`). Outbound
//! frames carry either a batch of cell updates or a join error.

use serde::de;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CollabError;
use crate::grid::{validate_digit, Cell, Position};

/// Cell coordinates as sent by a client, not yet range-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRef {
    pub row: i64,
    pub column: i64,
}

impl CellRef {
    pub fn position(&self) -> Result<Position, CollabError> {
        Position::new(self.row, self.column)
    }
}

/// A cell value as sent on the wire: a digit or `""` for empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(i64),
    Text(String),
}

impl RawValue {
    /// Resolves to `None` for an empty cell or a digit in `1..=9`.
    pub fn into_digit(self) -> Result<Option<u8>, CollabError> {
        match self {
            RawValue::Number(n) => validate_digit(n).map(Some),
            RawValue::Text(text) if text.is_empty() => Ok(None),
            RawValue::Text(text) => match text.parse::<i64>() {
                Ok(n) => validate_digit(n).map(Some),
                Err(_) => Err(CollabError::InvalidValue(text)),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct SetValuePayload {
    row: i64,
    column: i64,
    /// Required; `null` and `""` both clear the cell.
    #[serde(deserialize_with = "nullable")]
    value: Option<RawValue>,
}

fn nullable<'de, D: de::Deserializer<'de>>(deserializer: D) -> Result<Option<RawValue>, D::Error> {
    Option::<RawValue>::deserialize(deserializer)
}

/// One decoded client intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    SetName(Option<String>),
    SetColor(Option<String>),
    JoinRoom(String),
    Select(CellRef),
    SetValue {
        cell: CellRef,
        value: Option<RawValue>,
    },
    /// Unrecognized top-level key; ignored by the server.
    Unknown(String),
}

impl Intent {
    fn decode(key: &str, value: Value) -> Result<Self, CollabError> {
        let intent = match key {
            "name" => Intent::SetName(field(key, value)?),
            "color" => Intent::SetColor(field(key, value)?),
            "roomCode" => {
                let code: Option<String> = field(key, value)?;
                Intent::JoinRoom(code.unwrap_or_default())
            }
            "selected" => Intent::Select(field(key, value)?),
            "setValue" => {
                let payload: SetValuePayload = field(key, value)?;
                Intent::SetValue {
                    cell: CellRef {
                        row: payload.row,
                        column: payload.column,
                    },
                    value: payload.value,
                }
            }
            other => Intent::Unknown(other.to_string()),
        };
        Ok(intent)
    }
}

fn field<T: de::DeserializeOwned>(key: &str, value: Value) -> Result<T, CollabError> {
    serde_json::from_value(value)
        .map_err(|e| CollabError::MalformedMessage(format!("invalid `{key}`: {e}")))
}

/// Decodes one inbound frame into its intents.
///
/// Any recognized key with a bad shape rejects the whole frame.
pub fn decode_message(text: &str) -> Result<Vec<Intent>, CollabError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| CollabError::MalformedMessage(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(CollabError::MalformedMessage(
            "expected a JSON object".to_string(),
        ));
    };
    map.into_iter()
        .map(|(key, value)| Intent::decode(&key, value))
        .collect()
}

/// Wire view of a cell. The selecting session's id is never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellUpdate {
    pub row: u8,
    pub column: u8,
    #[serde(with = "cell_value")]
    pub value: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    /// Always serialized; `null` tells merging clients to clear the highlight.
    #[serde(default)]
    pub selected_by_name: Option<String>,
    #[serde(default)]
    pub selected_by_color: Option<String>,
}

impl From<&Cell> for CellUpdate {
    fn from(cell: &Cell) -> Self {
        let selection = cell.selected_by.as_ref();
        Self {
            row: cell.position.row(),
            column: cell.position.column(),
            value: cell.value,
            disabled: cell.fixed.then_some(true),
            selected_by_name: selection.and_then(|s| s.name.clone()),
            selected_by_color: selection.and_then(|s| s.color.clone()),
        }
    }
}

mod cell_value {
    use serde::de::{self, Deserializer};
    use serde::ser::Serializer;
    use serde::Deserialize;

    use super::RawValue;

    pub fn serialize<S: Serializer>(value: &Option<u8>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(digit) => serializer.serialize_u8(*digit),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
        RawValue::deserialize(deserializer)?
            .into_digit()
            .map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

/// Server-to-client frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Updates { updates: Vec<CellUpdate> },
    Error { error: ErrorPayload },
}

impl ServerMessage {
    pub fn updates(cells: &[Cell]) -> Self {
        ServerMessage::Updates {
            updates: cells.iter().map(CellUpdate::from).collect(),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            error: ErrorPayload {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn encode(&self) -> Result<String, CollabError> {
        serde_json::to_string(self).map_err(|e| CollabError::Other(e.into()))
    }
}
