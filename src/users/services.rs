use anyhow::anyhow;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::password::hash_password_async,
    config::AdminSeed,
    error::AppError,
    state::AppState,
    users::{
        dto::UserPayload,
        repo::UserRepoError,
        repo_types::{NewUser, Role, User, UserChanges},
    },
    validation::{FieldRules, FieldViolation, Rule, Validator, EMAIL},
};

const NAME_LENGTH: Rule = Rule::Length {
    min: 2,
    max: 100,
    message: "Name must be between 2 and 100 characters",
};
const PASSWORD_LENGTH: Rule = Rule::MinLength {
    min: 6,
    message: "Password must be at least 6 characters long",
};
const PASSWORD_STRENGTH: Rule = Rule::StrongPassword(
    "Password must contain at least one uppercase letter, one lowercase letter, and one number",
);

pub const NAME: FieldRules = FieldRules {
    field: "name",
    trim: true,
    rules: &[Rule::Required("Name is required"), NAME_LENGTH],
};

pub const PASSWORD: FieldRules = FieldRules {
    field: "password",
    trim: false,
    rules: &[
        Rule::Required("Password must be at least 6 characters long"),
        PASSWORD_LENGTH,
        PASSWORD_STRENGTH,
    ],
};

const NAME_UPDATE: FieldRules = FieldRules {
    field: "name",
    trim: true,
    rules: &[NAME_LENGTH],
};

const EMAIL_UPDATE: FieldRules = FieldRules {
    field: "email",
    trim: true,
    rules: &[Rule::Email("Please provide a valid email")],
};

const PASSWORD_UPDATE: FieldRules = FieldRules {
    field: "password",
    trim: false,
    rules: &[PASSWORD_LENGTH, PASSWORD_STRENGTH],
};

#[derive(Debug)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub fn validate_registration(payload: &UserPayload) -> Result<Registration, Vec<FieldViolation>> {
    let mut v = Validator::new();
    let name = v.text(&NAME, payload.name.as_deref());
    let email = v.text(&EMAIL, payload.email.as_deref());
    let password = v.text(&PASSWORD, payload.password.as_deref());
    v.finish(|| {
        Some(Registration {
            name: name?,
            email: email?,
            password: password?,
        })
    })
}

/// Validated partial update; the password is still plaintext here.
#[derive(Debug, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

pub fn validate_update(payload: &UserPayload) -> Result<UserUpdate, Vec<FieldViolation>> {
    let mut v = Validator::new();
    let name = v.text(&NAME_UPDATE, payload.name.as_deref());
    let email = v.text(&EMAIL_UPDATE, payload.email.as_deref());
    let password = v.text(&PASSWORD_UPDATE, payload.password.as_deref());
    v.finish(|| Some(UserUpdate { name, email, password }))
}

pub fn parse_user_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidId("user"))
}

/// Validates, hashes and stores a new account.
pub async fn create_user(state: &AppState, payload: &UserPayload, role: Role) -> Result<User, AppError> {
    let reg = validate_registration(payload).map_err(AppError::Validation)?;
    let password_hash = hash_password_async(reg.password).await?;
    let user = state
        .users
        .create(NewUser {
            name: reg.name,
            email: reg.email,
            password_hash,
            role,
        })
        .await
        .map_err(|e| {
            if matches!(e, UserRepoError::DuplicateEmail) {
                warn!("registration with taken email");
            }
            AppError::from(e)
        })?;
    info!(user_id = %user.id, role = ?user.role, "user created");
    Ok(user)
}

/// Applies a validated partial update. `role` is only passed by admins.
pub async fn update_user(
    state: &AppState,
    id: Uuid,
    payload: &UserPayload,
    role: Option<Role>,
) -> Result<User, AppError> {
    let update = validate_update(payload).map_err(AppError::Validation)?;
    let password_hash = match update.password {
        Some(plain) => Some(hash_password_async(plain).await?),
        None => None,
    };
    let changes = UserChanges {
        name: update.name,
        email: update.email,
        password_hash,
        role,
        last_login: None,
    };
    let user = state
        .users
        .update(id, changes)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    info!(user_id = %user.id, "user updated");
    Ok(user)
}

pub async fn get_user(state: &AppState, id: Uuid) -> Result<User, AppError> {
    state
        .users
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("User"))
}

pub async fn list_users(state: &AppState) -> Result<Vec<User>, AppError> {
    Ok(state.users.list().await?)
}

pub async fn delete_user(state: &AppState, id: Uuid) -> Result<User, AppError> {
    let user = state
        .users
        .delete(id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    info!(user_id = %user.id, "user deleted");
    Ok(user)
}

/// Creates the configured admin unless a user with that email exists.
pub async fn ensure_admin(state: &AppState, seed: &AdminSeed) -> anyhow::Result<()> {
    let payload = UserPayload {
        name: Some(seed.name.clone()),
        email: Some(seed.email.clone()),
        password: Some(seed.password.clone()),
        role: None,
    };
    let reg = validate_registration(&payload).map_err(|violations| {
        let messages: Vec<_> = violations.into_iter().map(|v| v.message).collect();
        anyhow!("invalid admin seed: {}", messages.join("; "))
    })?;

    if let Some(existing) = state.users.find_by_email(&reg.email).await? {
        info!(user_id = %existing.id, "admin seed: user already exists, leaving it untouched");
        return Ok(());
    }

    match create_user(state, &payload, Role::Admin).await {
        Ok(user) => {
            info!(user_id = %user.id, "admin seed: admin created");
            Ok(())
        }
        Err(AppError::Conflict(_)) => Ok(()),
        Err(e) => Err(anyhow!("admin seed failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str, email: &str, password: &str) -> UserPayload {
        UserPayload {
            name: Some(name.into()),
            email: Some(email.into()),
            password: Some(password.into()),
            role: None,
        }
    }

    #[test]
    fn registration_reports_each_bad_field_once() {
        let err = validate_registration(&payload("A", "nope", "abc")).unwrap_err();
        assert_eq!(
            err,
            vec![
                FieldViolation::new("name", "Name must be between 2 and 100 characters"),
                FieldViolation::new("email", "Please provide a valid email"),
                FieldViolation::new("password", "Password must be at least 6 characters long"),
            ]
        );

        let err = validate_registration(&payload("Ann", "ann@x.com", "abcdef1")).unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(err[0].message.contains("uppercase"));
    }

    #[test]
    fn update_fields_are_optional() {
        let update = validate_update(&UserPayload::default()).unwrap();
        assert!(update.name.is_none() && update.email.is_none() && update.password.is_none());

        let err = validate_update(&UserPayload {
            password: Some("short".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err[0].field, "password");
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let state = AppState::fake();
        create_user(&state, &payload("Ann", "ann@x.com", "Abcdef1"), Role::User)
            .await
            .unwrap();
        let err = create_user(&state, &payload("Ann", "ANN@x.com", "Abcdef1"), Role::User)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), "User already exists with this email");
    }

    #[tokio::test]
    async fn update_rehashes_password_and_keeps_role() {
        let state = AppState::fake();
        let ann = create_user(&state, &payload("Ann", "ann@x.com", "Abcdef1"), Role::User)
            .await
            .unwrap();
        let update = UserPayload {
            password: Some("Xyz12345".into()),
            role: Some(Role::Admin),
            ..Default::default()
        };
        let updated = update_user(&state, ann.id, &update, None).await.unwrap();
        assert_ne!(updated.password_hash, ann.password_hash);
        assert_eq!(updated.role, Role::User);
        assert_eq!(updated.name, "Ann");

        let missing = update_user(&state, Uuid::new_v4(), &update, None).await.unwrap_err();
        assert!(matches!(missing, AppError::NotFound("User")));
    }

    #[test]
    fn malformed_user_id() {
        assert!(matches!(parse_user_id("123"), Err(AppError::InvalidId("user"))));
    }

    #[tokio::test]
    async fn admin_seed_is_idempotent() {
        let state = AppState::fake();
        let seed = AdminSeed {
            name: "Admin User".into(),
            email: "Admin@Example.com".into(),
            password: "Admin123".into(),
        };
        ensure_admin(&state, &seed).await.unwrap();
        ensure_admin(&state, &seed).await.unwrap();

        let users = list_users(&state).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "admin@example.com");
        assert!(users[0].role.is_admin());
    }

    #[tokio::test]
    async fn admin_seed_rejects_weak_password() {
        let state = AppState::fake();
        let seed = AdminSeed {
            name: "Admin User".into(),
            email: "admin@example.com".into(),
            password: "admin".into(),
        };
        assert!(ensure_admin(&state, &seed).await.is_err());
    }
}
