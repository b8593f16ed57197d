//! Generic CRUD over the document collections.
//!
//! Each entity implements [`Resource`]: its field set, validation, how a
//! partial update is merged over the stored value, its listing order and
//! who may perform which [`Operation`]. [`router`] then mounts the same
//! six endpoints for it.

use axum::{routing::get, Router};
use serde::{de::DeserializeOwned, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::access::Access,
    resources::repo_types::{Collection, StoredDocument},
    state::AppState,
    validation::FieldViolation,
};

pub mod contacts;
pub mod handlers;
pub mod projects;
pub mod qualifications;
pub mod repo;
pub mod repo_types;
pub mod service;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
    DeleteAll,
}

pub trait Resource: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Request body; every field optional so that absence is a validation error.
    type Input: DeserializeOwned + Send + 'static;

    const COLLECTION: Collection;

    fn validate(input: Self::Input) -> Result<Self, Vec<FieldViolation>>;

    /// Fills the fields missing from `input` with the stored values.
    fn merge(&self, input: Self::Input) -> Self::Input;

    /// Listing key, newest first. `None` orders by creation time.
    fn sort_key(&self) -> Option<OffsetDateTime> {
        None
    }

    fn access(op: Operation) -> Access;
}

/// A stored entity as returned to clients.
#[derive(Debug, Serialize)]
pub struct Record<R> {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: R,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl<R: Resource> TryFrom<StoredDocument> for Record<R> {
    type Error = anyhow::Error;

    fn try_from(doc: StoredDocument) -> Result<Self, Self::Error> {
        let fields = serde_json::from_value(doc.body).map_err(|e| {
            anyhow::Error::new(e).context(format!("decode {} {}", R::COLLECTION.noun(), doc.id))
        })?;
        Ok(Self {
            id: doc.id,
            fields,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}

pub fn router<R: Resource>() -> Router<AppState> {
    let table = R::COLLECTION.table();
    Router::new()
        .route(
            &format!("/api/{table}"),
            get(handlers::list::<R>)
                .post(handlers::create::<R>)
                .delete(handlers::delete_all::<R>),
        )
        .route(
            &format!("/api/{table}/:id"),
            get(handlers::get::<R>)
                .put(handlers::update::<R>)
                .delete(handlers::delete::<R>),
        )
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(router::<contacts::Contact>())
        .merge(router::<projects::Project>())
        .merge(router::<qualifications::Qualification>())
}
