use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::DocumentKind;

/// A persisted artifact snapshot.
///
/// Every create or update produces a new snapshot; stores keep the history
/// and return the newest one from `load_document`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub kind: DocumentKind,
    pub title: String,
    pub content: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Snapshot for a freshly generated document.
    pub fn created(
        id: String,
        kind: DocumentKind,
        title: String,
        owner_id: String,
        content: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            title,
            content,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Next snapshot after an update: content replaced wholesale, identity
    /// fields carried over, `updated_at` strictly after the previous value.
    pub fn revised(&self, content: String, now: DateTime<Utc>) -> Self {
        let updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
        Self {
            id: self.id.clone(),
            kind: self.kind,
            title: self.title.clone(),
            content,
            owner_id: self.owner_id.clone(),
            created_at: self.created_at,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(now: DateTime<Utc>) -> Document {
        Document::created(
            "doc-1".into(),
            DocumentKind::Text,
            "Essay Workspace".into(),
            "user-1".into(),
            "draft".into(),
            now,
        )
    }

    #[test]
    fn revision_replaces_content_and_keeps_identity() {
        let now = Utc::now();
        let doc = sample(now);
        let next = doc.revised("final".into(), now + Duration::seconds(5));
        assert_eq!(next.content, "final");
        assert_eq!(next.id, doc.id);
        assert_eq!(next.title, doc.title);
        assert_eq!(next.owner_id, doc.owner_id);
        assert_eq!(next.created_at, doc.created_at);
        assert!(next.updated_at > doc.updated_at);
    }

    #[test]
    fn revision_bumps_timestamp_when_clock_does_not_advance() {
        let now = Utc::now();
        let doc = sample(now);
        let next = doc.revised("final".into(), now - Duration::seconds(1));
        assert!(next.updated_at > doc.updated_at);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let doc = sample(Utc::now());
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["ownerId"], "user-1");
        assert_eq!(v["kind"], "text");
        assert!(v.get("createdAt").is_some());
        assert!(v.get("updatedAt").is_some());
    }
}
