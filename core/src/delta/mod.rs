//! Live protocol units pushed from the coordinator to a viewing client.
//!
//! On the wire every delta is a `{ "type": ..., "content": ... }` object; in
//! Rust it is a closed enum so producers and consumers match exhaustively.

mod smooth;

use serde::{Deserialize, Serialize};

use crate::document::DocumentKind;

pub use smooth::smooth_words;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "DeltaFrame", try_from = "DeltaFrame")]
pub enum StreamDelta {
    TextDelta(String),
    Kind(DocumentKind),
    Id(String),
    Title(String),
    Clear,
    Finish,
    /// Terminal failure signal, distinct from `Finish`.
    Error(String),
}

impl StreamDelta {
    pub fn type_tag(&self) -> &'static str {
        match self {
            StreamDelta::TextDelta(_) => "text-delta",
            StreamDelta::Kind(_) => "kind",
            StreamDelta::Id(_) => "id",
            StreamDelta::Title(_) => "title",
            StreamDelta::Clear => "clear",
            StreamDelta::Finish => "finish",
            StreamDelta::Error(_) => "error",
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            StreamDelta::TextDelta(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamDelta::Finish | StreamDelta::Error(_))
    }
}

/// Wire shape of a delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaFrame {
    #[serde(rename = "type")]
    pub delta_type: String,
    #[serde(default)]
    pub content: String,
}

impl From<StreamDelta> for DeltaFrame {
    fn from(delta: StreamDelta) -> Self {
        let delta_type = delta.type_tag().to_string();
        let content = match delta {
            StreamDelta::TextDelta(s)
            | StreamDelta::Id(s)
            | StreamDelta::Title(s)
            | StreamDelta::Error(s) => s,
            StreamDelta::Kind(k) => k.as_str().to_string(),
            StreamDelta::Clear | StreamDelta::Finish => String::new(),
        };
        Self {
            delta_type,
            content,
        }
    }
}

impl TryFrom<DeltaFrame> for StreamDelta {
    type Error = String;

    fn try_from(frame: DeltaFrame) -> Result<Self, String> {
        let delta = match frame.delta_type.as_str() {
            "text-delta" => StreamDelta::TextDelta(frame.content),
            "kind" => StreamDelta::Kind(frame.content.parse().map_err(|e| format!("{e}"))?),
            "id" => StreamDelta::Id(frame.content),
            "title" => StreamDelta::Title(frame.content),
            "clear" => StreamDelta::Clear,
            "finish" => StreamDelta::Finish,
            "error" => StreamDelta::Error(frame.content),
            other => return Err(format!("unknown delta type: {other}")),
        };
        Ok(delta)
    }
}
