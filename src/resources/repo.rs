use anyhow::Context;
use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::resources::repo_types::{Collection, NewDocument, StoredDocument};

const DOCUMENT_COLUMNS: &str = "id, body, sort_key, created_at, updated_at";

/// Resource store. Every operation touches a single document, or a whole
/// collection for `delete_all`, atomically.
#[async_trait]
pub trait DocumentRepo: Send + Sync {
    /// Whole collection, newest first.
    async fn list(&self, collection: Collection) -> anyhow::Result<Vec<StoredDocument>>;
    async fn get(&self, collection: Collection, id: Uuid) -> anyhow::Result<Option<StoredDocument>>;
    async fn insert(&self, collection: Collection, doc: NewDocument) -> anyhow::Result<StoredDocument>;
    /// Replaces the body; `None` when the id does not exist.
    async fn replace(
        &self,
        collection: Collection,
        id: Uuid,
        doc: NewDocument,
    ) -> anyhow::Result<Option<StoredDocument>>;
    /// Removes and returns the document.
    async fn delete(&self, collection: Collection, id: Uuid) -> anyhow::Result<Option<StoredDocument>>;
    /// Number of removed documents.
    async fn delete_all(&self, collection: Collection) -> anyhow::Result<u64>;
}

#[derive(Clone)]
pub struct PgDocumentRepo {
    db: PgPool,
}

impl PgDocumentRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentRepo for PgDocumentRepo {
    async fn list(&self, collection: Collection) -> anyhow::Result<Vec<StoredDocument>> {
        let rows = sqlx::query_as::<_, StoredDocument>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM {} ORDER BY sort_key DESC, created_at DESC",
            collection.table()
        ))
        .fetch_all(&self.db)
        .await
        .with_context(|| format!("list {}", collection.table()))?;
        Ok(rows)
    }

    async fn get(&self, collection: Collection, id: Uuid) -> anyhow::Result<Option<StoredDocument>> {
        let row = sqlx::query_as::<_, StoredDocument>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM {} WHERE id = $1",
            collection.table()
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("get {} {}", collection.noun(), id))?;
        Ok(row)
    }

    async fn insert(&self, collection: Collection, doc: NewDocument) -> anyhow::Result<StoredDocument> {
        let row = sqlx::query_as::<_, StoredDocument>(&format!(
            r#"
            INSERT INTO {} (id, body, sort_key)
            VALUES ($1, $2, COALESCE($3, now()))
            RETURNING {DOCUMENT_COLUMNS}
            "#,
            collection.table()
        ))
        .bind(Uuid::new_v4())
        .bind(&doc.body)
        .bind(doc.sort_key)
        .fetch_one(&self.db)
        .await
        .with_context(|| format!("insert {}", collection.noun()))?;
        Ok(row)
    }

    async fn replace(
        &self,
        collection: Collection,
        id: Uuid,
        doc: NewDocument,
    ) -> anyhow::Result<Option<StoredDocument>> {
        let row = sqlx::query_as::<_, StoredDocument>(&format!(
            r#"
            UPDATE {}
               SET body = $2,
                   sort_key = COALESCE($3, created_at),
                   updated_at = now()
             WHERE id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#,
            collection.table()
        ))
        .bind(id)
        .bind(&doc.body)
        .bind(doc.sort_key)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("replace {} {}", collection.noun(), id))?;
        Ok(row)
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> anyhow::Result<Option<StoredDocument>> {
        let row = sqlx::query_as::<_, StoredDocument>(&format!(
            "DELETE FROM {} WHERE id = $1 RETURNING {DOCUMENT_COLUMNS}",
            collection.table()
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("delete {} {}", collection.noun(), id))?;
        Ok(row)
    }

    async fn delete_all(&self, collection: Collection) -> anyhow::Result<u64> {
        let result = sqlx::query(&format!("DELETE FROM {}", collection.table()))
            .execute(&self.db)
            .await
            .with_context(|| format!("delete all {}", collection.table()))?;
        Ok(result.rows_affected())
    }
}
