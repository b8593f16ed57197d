use std::sync::Arc;

use axum::extract::FromRef;
use lazy_static::lazy_static;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{AuthResponse, SignInRequest},
        error::AuthError,
        jwt::JwtKeys,
        password::{hash_password, verify_password_async},
    },
    error::AppError,
    state::AppState,
    users::{
        dto::PublicUser,
        repo::UserRepo,
        repo_types::{User, UserChanges},
    },
    validation::{FieldRules, FieldViolation, Rule, Validator, EMAIL},
};

lazy_static! {
    /// Checked against when the email is unknown, so both failures cost one Argon2 verify.
    static ref DECOY_HASH: String = hash_password("decoy-password").unwrap();
}

const SIGN_IN_PASSWORD: FieldRules = FieldRules {
    field: "password",
    trim: false,
    rules: &[Rule::Required("Password is required")],
};

pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub fn validate_sign_in(req: SignInRequest) -> Result<Credentials, Vec<FieldViolation>> {
    let mut v = Validator::new();
    let email = v.text(&EMAIL, req.email.as_deref());
    let password = v.text(&SIGN_IN_PASSWORD, req.password.as_deref());
    v.finish(|| {
        Some(Credentials {
            email: email?,
            password: password?,
        })
    })
}

/// Credential checks and token issuance over the user store.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepo>,
    keys: JwtKeys,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.users.clone(), JwtKeys::from_ref(state))
    }
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepo>, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    /// Unknown email and wrong password fail identically.
    pub async fn sign_in(&self, credentials: Credentials) -> Result<(String, User), AppError> {
        let Some(user) = self.users.find_by_email(&credentials.email).await? else {
            verify_password_async(credentials.password, DECOY_HASH.to_string()).await?;
            warn!("sign-in with unknown email");
            return Err(AuthError::InvalidCredentials.into());
        };

        let ok = verify_password_async(credentials.password, user.password_hash.clone()).await?;
        if !ok {
            warn!(user_id = %user.id, "sign-in with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let user = self.record_login(&user).await?;
        let token = self.issue_token(&user)?;
        info!(user_id = %user.id, "user signed in");
        Ok((token, user))
    }

    /// Stamps `last_login`; called whenever a token is handed out for a login.
    pub async fn record_login(&self, user: &User) -> Result<User, AppError> {
        let changes = UserChanges {
            last_login: Some(OffsetDateTime::now_utc()),
            ..Default::default()
        };
        Ok(self
            .users
            .update(user.id, changes)
            .await?
            .ok_or(AuthError::InvalidCredentials)?)
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AppError> {
        Ok(self.keys.sign(user.id)?)
    }

    pub fn respond(&self, message: &str, token: String, user: &User) -> AuthResponse {
        AuthResponse {
            success: true,
            message: message.to_string(),
            token,
            expires_in: self.keys.ttl().whole_seconds(),
            user: PublicUser::from(user),
        }
    }

    /// Validates the token and loads its user, who must still exist.
    pub async fn verify_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.keys.verify(token)?;
        match self.users.find_by_id(claims.sub).await? {
            Some(user) => Ok(user),
            None => {
                warn!(user_id = %claims.sub, "token for deleted user");
                Err(AuthError::UnknownUser.into())
            }
        }
    }
}

pub fn require_admin(user: &User) -> Result<(), AuthError> {
    if user.role.is_admin() {
        Ok(())
    } else {
        warn!(user_id = %user.id, "admin route refused");
        Err(AuthError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::users::repo_types::{NewUser, Role};

    async fn service_with_ann() -> (AuthService, User) {
        let state = AppState::fake();
        let ann = state
            .users
            .create(NewUser {
                name: "Ann".into(),
                email: "ann@x.com".into(),
                password_hash: hash_password("Abcdef1").unwrap(),
                role: Role::User,
            })
            .await
            .unwrap();
        (AuthService::from_ref(&state), ann)
    }

    fn credentials(email: &str, password: &str) -> Credentials {
        validate_sign_in(SignInRequest {
            email: Some(email.into()),
            password: Some(password.into()),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn sign_in_round_trip() {
        let (auth, ann) = service_with_ann().await;
        let (token, user) = auth.sign_in(credentials("ANN@x.com", "Abcdef1")).await.unwrap();
        assert_eq!(user.id, ann.id);
        assert!(user.last_login.is_some());

        let verified = auth.verify_token(&token).await.unwrap();
        assert_eq!(verified.id, ann.id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let (auth, _) = service_with_ann().await;
        let wrong = auth.sign_in(credentials("ann@x.com", "Abcdef2")).await.unwrap_err();
        let unknown = auth.sign_in(credentials("bob@x.com", "Abcdef1")).await.unwrap_err();
        assert!(matches!(wrong, AppError::Auth(AuthError::InvalidCredentials)));
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert_eq!(wrong.status_code(), unknown.status_code());
    }

    #[tokio::test]
    async fn unknown_email_costs_as_much_as_wrong_password() {
        let (auth, _) = service_with_ann().await;
        // First call builds the decoy hash.
        let _ = auth.sign_in(credentials("bob@x.com", "Abcdef1")).await;

        let started = Instant::now();
        let _ = auth.sign_in(credentials("ann@x.com", "Abcdef2")).await;
        let wrong_password = started.elapsed();

        let started = Instant::now();
        let _ = auth.sign_in(credentials("bob@x.com", "Abcdef1")).await;
        let unknown_email = started.elapsed();

        assert!(
            unknown_email * 10 >= wrong_password,
            "unknown email took {unknown_email:?}, wrong password {wrong_password:?}"
        );
    }

    #[tokio::test]
    async fn record_login_sets_last_login() {
        let (auth, ann) = service_with_ann().await;
        assert!(ann.last_login.is_none());
        let stamped = auth.record_login(&ann).await.unwrap();
        assert!(stamped.last_login.is_some());
    }

    #[tokio::test]
    async fn token_of_deleted_user_is_rejected() {
        let state = AppState::fake();
        let (auth, ann) = service_with_ann().await;
        let token = auth.issue_token(&ann).unwrap();
        // A fresh store does not know Ann.
        let other = AuthService::from_ref(&state);
        let err = other.verify_token(&token).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::UnknownUser)));
    }

    #[test]
    fn sign_in_payload_is_validated() {
        let err = validate_sign_in(SignInRequest {
            email: Some("nope".into()),
            password: None,
        })
        .err()
        .unwrap();
        let fields: Vec<_> = err.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "password"]);
    }

    #[tokio::test]
    async fn require_admin_checks_role() {
        let (_, mut ann) = service_with_ann().await;
        assert_eq!(require_admin(&ann), Err(AuthError::Forbidden));
        ann.role = Role::Admin;
        assert!(require_admin(&ann).is_ok());
    }
}
