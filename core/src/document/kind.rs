use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tag selecting which handler produces a document.
///
/// Adding a variant forces every exhaustive match (prompt selection, wire
/// names) to be revisited at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Text,
    Code,
    Sheet,
    Image,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::Text,
        DocumentKind::Code,
        DocumentKind::Sheet,
        DocumentKind::Image,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Text => "text",
            DocumentKind::Code => "code",
            DocumentKind::Sheet => "sheet",
            DocumentKind::Image => "image",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown document kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for DocumentKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        DocumentKind::ALL
            .into_iter()
            .find(|k| k.as_str() == tag)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Text".parse::<DocumentKind>().unwrap(), DocumentKind::Text);
        assert_eq!(" sheet ".parse::<DocumentKind>().unwrap(), DocumentKind::Sheet);
    }

    #[test]
    fn rejects_unknown_tag() {
        let err = "video".parse::<DocumentKind>().unwrap_err();
        assert_eq!(err, UnknownKind("video".to_string()));
    }

    #[test]
    fn serializes_as_lowercase_tag() {
        let v = serde_json::to_value(DocumentKind::Code).unwrap();
        assert_eq!(v, serde_json::json!("code"));
    }
}
