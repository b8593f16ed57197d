//! In-memory implementations of the repositories, used by the test suite
//! and by `DATABASE_URL=memory://` deployments. Data is lost on restart.

use std::collections::HashMap;

use axum::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    resources::{
        repo::DocumentRepo,
        repo_types::{Collection, NewDocument, StoredDocument},
    },
    users::{
        repo::{UserRepo, UserRepoError},
        repo_types::{NewUser, User, UserChanges},
    },
};

#[derive(Default)]
pub struct MemoryUserRepo {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(users: &HashMap<Uuid, User>, email: &str, except: Option<Uuid>) -> bool {
    users
        .values()
        .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email))
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn create(&self, user: NewUser) -> Result<User, UserRepoError> {
        let mut users = self.users.write().await;
        if email_taken(&users, &user.email, None) {
            return Err(UserRepoError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
            last_login: None,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, UserRepoError> {
        let mut users = self.users.write().await;
        if let Some(email) = changes.email.as_deref() {
            if email_taken(&users, email, Some(id)) {
                return Err(UserRepoError::DuplicateEmail);
            }
        }
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(user, OffsetDateTime::now_utc());
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.write().await.remove(&id))
    }
}

#[derive(Default)]
pub struct MemoryDocumentRepo {
    collections: RwLock<HashMap<Collection, HashMap<Uuid, StoredDocument>>>,
}

impl MemoryDocumentRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepo for MemoryDocumentRepo {
    async fn list(&self, collection: Collection) -> anyhow::Result<Vec<StoredDocument>> {
        let collections = self.collections.read().await;
        let mut docs: Vec<StoredDocument> = collections
            .get(&collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default();
        docs.sort_by(|a, b| {
            b.sort_key
                .cmp(&a.sort_key)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(docs)
    }

    async fn get(&self, collection: Collection, id: Uuid) -> anyhow::Result<Option<StoredDocument>> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).and_then(|docs| docs.get(&id)).cloned())
    }

    async fn insert(&self, collection: Collection, doc: NewDocument) -> anyhow::Result<StoredDocument> {
        let now = OffsetDateTime::now_utc();
        let stored = StoredDocument {
            id: Uuid::new_v4(),
            body: doc.body,
            sort_key: doc.sort_key.unwrap_or(now),
            created_at: now,
            updated_at: now,
        };
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn replace(
        &self,
        collection: Collection,
        id: Uuid,
        doc: NewDocument,
    ) -> anyhow::Result<Option<StoredDocument>> {
        let mut collections = self.collections.write().await;
        let Some(stored) = collections.get_mut(&collection).and_then(|docs| docs.get_mut(&id)) else {
            return Ok(None);
        };
        stored.body = doc.body;
        stored.sort_key = doc.sort_key.unwrap_or(stored.created_at);
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> anyhow::Result<Option<StoredDocument>> {
        let mut collections = self.collections.write().await;
        Ok(collections.get_mut(&collection).and_then(|docs| docs.remove(&id)))
    }

    async fn delete_all(&self, collection: Collection) -> anyhow::Result<u64> {
        let mut collections = self.collections.write().await;
        let removed = collections.remove(&collection).map(|docs| docs.len()).unwrap_or(0);
        Ok(removed as u64)
    }
}
