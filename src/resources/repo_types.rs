use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// The three document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Contacts,
    Projects,
    Qualifications,
}

impl Collection {
    /// Table name, also the URL segment under `/api`.
    pub fn table(self) -> &'static str {
        match self {
            Collection::Contacts => "contacts",
            Collection::Projects => "projects",
            Collection::Qualifications => "qualifications",
        }
    }

    /// Capitalized singular, as in "Project not found".
    pub fn label(self) -> &'static str {
        match self {
            Collection::Contacts => "Contact",
            Collection::Projects => "Project",
            Collection::Qualifications => "Qualification",
        }
    }

    /// Lowercase singular, as in "Invalid project ID format".
    pub fn noun(self) -> &'static str {
        match self {
            Collection::Contacts => "contact",
            Collection::Projects => "project",
            Collection::Qualifications => "qualification",
        }
    }
}

/// A stored document: the entity's fields as JSON plus server-owned columns.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct StoredDocument {
    pub id: Uuid,
    pub body: serde_json::Value,
    /// Listing order, newest first.
    pub sort_key: OffsetDateTime,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub body: serde_json::Value,
    /// `None` sorts the document by its creation time.
    pub sort_key: Option<OffsetDateTime>,
}
