use crate::document::DocumentKind;

#[derive(Debug, Clone)]
pub struct CreateDocument {
    pub kind: DocumentKind,
    pub title: String,
    pub owner_id: String,
}

/// Full-body rewrite of an existing document.
///
/// Callers must not issue an update for a document in the same turn that
/// created it; the coordinator cannot detect that sequencing.
#[derive(Debug, Clone)]
pub struct UpdateDocument {
    pub id: String,
    pub description: String,
}
