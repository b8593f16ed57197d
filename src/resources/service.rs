use std::{marker::PhantomData, sync::Arc};

use anyhow::Context;
use axum::extract::FromRef;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    resources::{
        repo::DocumentRepo,
        repo_types::{NewDocument, StoredDocument},
        Record, Resource,
    },
    state::AppState,
};

/// CRUD for one resource type over the shared document store.
pub struct ResourceService<R> {
    documents: Arc<dyn DocumentRepo>,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            documents: self.documents.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> FromRef<AppState> for ResourceService<R> {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.documents.clone())
    }
}

impl<R: Resource> ResourceService<R> {
    pub fn new(documents: Arc<dyn DocumentRepo>) -> Self {
        Self {
            documents,
            _resource: PhantomData,
        }
    }

    fn parse_id(raw: &str) -> Result<Uuid, AppError> {
        Uuid::parse_str(raw).map_err(|_| AppError::InvalidId(R::COLLECTION.noun()))
    }

    fn not_found() -> AppError {
        AppError::NotFound(R::COLLECTION.label())
    }

    fn to_document(value: &R) -> Result<NewDocument, AppError> {
        let body = serde_json::to_value(value)
            .with_context(|| format!("encode {}", R::COLLECTION.noun()))?;
        Ok(NewDocument {
            body,
            sort_key: value.sort_key(),
        })
    }

    fn to_record(doc: StoredDocument) -> Result<Record<R>, AppError> {
        Ok(Record::try_from(doc)?)
    }

    pub async fn list(&self) -> Result<Vec<Record<R>>, AppError> {
        self.documents
            .list(R::COLLECTION)
            .await?
            .into_iter()
            .map(Self::to_record)
            .collect()
    }

    pub async fn get(&self, raw_id: &str) -> Result<Record<R>, AppError> {
        let id = Self::parse_id(raw_id)?;
        let doc = self
            .documents
            .get(R::COLLECTION, id)
            .await?
            .ok_or_else(Self::not_found)?;
        Self::to_record(doc)
    }

    pub async fn create(&self, input: R::Input) -> Result<Record<R>, AppError> {
        let value = R::validate(input).map_err(AppError::Validation)?;
        let doc = self
            .documents
            .insert(R::COLLECTION, Self::to_document(&value)?)
            .await?;
        info!(id = %doc.id, collection = R::COLLECTION.table(), "document created");
        Self::to_record(doc)
    }

    /// Supplied fields override the stored ones; the result is validated
    /// as a whole before it replaces the document.
    pub async fn update(&self, raw_id: &str, input: R::Input) -> Result<Record<R>, AppError> {
        let current = self.get(raw_id).await?;
        let merged = current.fields.merge(input);
        let value = R::validate(merged).map_err(AppError::Validation)?;
        let doc = self
            .documents
            .replace(R::COLLECTION, current.id, Self::to_document(&value)?)
            .await?
            .ok_or_else(Self::not_found)?;
        info!(id = %doc.id, collection = R::COLLECTION.table(), "document updated");
        Self::to_record(doc)
    }

    pub async fn delete(&self, raw_id: &str) -> Result<Record<R>, AppError> {
        let id = Self::parse_id(raw_id)?;
        let doc = self
            .documents
            .delete(R::COLLECTION, id)
            .await?
            .ok_or_else(Self::not_found)?;
        info!(id = %doc.id, collection = R::COLLECTION.table(), "document deleted");
        Self::to_record(doc)
    }

    pub async fn delete_all(&self) -> Result<u64, AppError> {
        let removed = self.documents.delete_all(R::COLLECTION).await?;
        info!(removed, collection = R::COLLECTION.table(), "collection cleared");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{
        contacts::{Contact, ContactInput},
        projects::{Project, ProjectInput},
    };

    fn contacts() -> ResourceService<Contact> {
        ResourceService::from_ref(&AppState::fake())
    }

    fn contact_input(message: &str) -> ContactInput {
        ContactInput {
            firstname: Some("Ann".into()),
            lastname: Some("Lee".into()),
            email: Some("Ann@X.com".into()),
            message: Some(message.into()),
        }
    }

    fn project_input(title: &str, completion: &str) -> ProjectInput {
        ProjectInput {
            title: Some(title.into()),
            firstname: Some("Ann".into()),
            lastname: Some("Lee".into()),
            email: Some("ann@x.com".into()),
            completion: Some(completion.into()),
            description: Some("A portfolio backend in Rust".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_then_get_returns_normalized_fields() {
        let service = contacts();
        let created = service.create(contact_input("Hello there, nice site!")).await.unwrap();
        let fetched = service.get(&created.id.to_string()).await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.fields.email, "ann@x.com");
        assert_eq!(fetched.fields.message, "Hello there, nice site!");
        assert_eq!(fetched.created_at, created.created_at);
    }

    #[tokio::test]
    async fn invalid_payload_lists_every_field() {
        let err = contacts()
            .create(ContactInput {
                firstname: Some("A".into()),
                email: Some("nope".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        let violations = match err {
            AppError::Validation(violations) => violations,
            other => panic!("expected validation error, got {other:?}"),
        };
        let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["firstname", "lastname", "email", "message"]);
    }

    #[tokio::test]
    async fn malformed_and_missing_ids_differ() {
        let service = contacts();
        assert!(matches!(
            service.get("not-a-uuid").await,
            Err(AppError::InvalidId("contact"))
        ));
        assert!(matches!(
            service.get(&Uuid::new_v4().to_string()).await,
            Err(AppError::NotFound("Contact"))
        ));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let service = contacts();
        let created = service.create(contact_input("Twenty characters!!!")).await.unwrap();
        let id = created.id.to_string();
        let removed = service.delete(&id).await.unwrap();
        assert_eq!(removed.id, created.id);
        assert!(matches!(service.get(&id).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.delete(&id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_merges_and_revalidates() {
        let service: ResourceService<Project> = ResourceService::from_ref(&AppState::fake());
        let created = service.create(project_input("Portfolio", "2024-01-15")).await.unwrap();
        let id = created.id.to_string();

        let bad = ProjectInput {
            completion: Some("someday".into()),
            ..Default::default()
        };
        assert!(matches!(service.update(&id, bad).await, Err(AppError::Validation(_))));

        let good = ProjectInput {
            completion: Some("2024-06-30".into()),
            ..Default::default()
        };
        let updated = service.update(&id, good).await.unwrap();
        assert_eq!(updated.fields.title, "Portfolio");
        assert_eq!(updated.fields.completion.to_string(), "2024-06-30");
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn update_of_missing_or_malformed_id_fails() {
        let service: ResourceService<Project> = ResourceService::from_ref(&AppState::fake());
        let missing = service
            .update(&Uuid::new_v4().to_string(), project_input("Portfolio", "2024-01-15"))
            .await;
        assert!(matches!(missing, Err(AppError::NotFound("Project"))));

        let malformed = service
            .update("123", project_input("Portfolio", "2024-01-15"))
            .await;
        assert!(matches!(malformed, Err(AppError::InvalidId("project"))));
    }

    #[tokio::test]
    async fn list_is_newest_completion_first_and_delete_all_counts() {
        let service: ResourceService<Project> = ResourceService::from_ref(&AppState::fake());
        assert!(service.list().await.unwrap().is_empty());

        service.create(project_input("Older", "2021-03-01")).await.unwrap();
        service.create(project_input("Newest", "2024-03-01")).await.unwrap();
        service.create(project_input("Middle", "2022-03-01")).await.unwrap();

        let titles: Vec<_> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.fields.title)
            .collect();
        assert_eq!(titles, vec!["Newest", "Middle", "Older"]);

        assert_eq!(service.delete_all().await.unwrap(), 3);
        assert!(service.list().await.unwrap().is_empty());
    }
}
