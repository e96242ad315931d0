use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::{AuthResponse, LoginRequest, RegisterRequest},
    jwt::JwtKeys,
    password::{hash_password, verify_password},
    repo::UserStore,
    repo_types::NewUser,
};
use crate::error::{ApiError, ApiResult};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_USERNAME_LEN: usize = 3;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn default_profile_image(username: &str) -> String {
    format!("https://api.dicebear.com/7.x/avataaars/svg?seed={}", username)
}

fn required(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.is_empty())
}

fn all_fields_required() -> ApiError {
    ApiError::Validation("All fields are required".into())
}

pub async fn register(
    users: &dyn UserStore,
    keys: &JwtKeys,
    req: RegisterRequest,
) -> ApiResult<AuthResponse> {
    let (Some(email), Some(username), Some(password)) = (
        required(req.email),
        required(req.username),
        required(req.password),
    ) else {
        return Err(all_fields_required());
    };

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(ApiError::Validation(format!(
            "Username must be at least {} characters",
            MIN_USERNAME_LEN
        )));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }

    if users.email_or_username_taken(&email, &username).await? {
        warn!(%email, %username, "user already exists");
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let password_hash = hash_password(&password)?;
    let user = users
        .create(NewUser {
            profile_image: default_profile_image(&username),
            email,
            username,
            password_hash,
        })
        .await?;

    let token = keys.sign(user.id)?;
    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

pub async fn login(
    users: &dyn UserStore,
    keys: &JwtKeys,
    req: LoginRequest,
) -> ApiResult<AuthResponse> {
    let (Some(email), Some(password)) = (required(req.email), required(req.password)) else {
        return Err(all_fields_required());
    };

    let Some(user) = users.find_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = keys.sign(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::memory::MemoryStore;

    fn keys() -> JwtKeys {
        JwtKeys::from(&AppConfig::for_tests().jwt)
    }

    fn register_req(email: &str, username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.into()),
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    #[tokio::test]
    async fn register_returns_token_and_profile() {
        let store = MemoryStore::default();
        let keys = keys();
        let res = register(&store, &keys, register_req("alice@x.com", "alice", "secret1"))
            .await
            .unwrap();

        assert_eq!(res.user.email, "alice@x.com");
        assert_eq!(res.user.username, "alice");
        assert_eq!(res.user.profile_image, default_profile_image("alice"));
        assert_eq!(keys.verify(&res.token).unwrap().sub, res.user.id);

        let stored = store.find_by_email("alice@x.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "secret1");
    }

    #[tokio::test]
    async fn register_conflicts_on_either_field() {
        let store = MemoryStore::default();
        let keys = keys();
        register(&store, &keys, register_req("alice@x.com", "alice", "secret1"))
            .await
            .unwrap();

        let same_email = register(&store, &keys, register_req("alice@x.com", "bob", "secret1")).await;
        assert!(matches!(same_email, Err(ApiError::Conflict(_))));

        let same_username = register(&store, &keys, register_req("bob@x.com", "alice", "secret1")).await;
        assert!(matches!(same_username, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn register_validates_before_persisting() {
        let store = MemoryStore::default();
        let keys = keys();

        let short_pw = register(&store, &keys, register_req("a@x.com", "alice", "12345")).await;
        assert!(matches!(short_pw, Err(ApiError::Validation(m)) if m.contains("Password")));

        let short_name = register(&store, &keys, register_req("a@x.com", "al", "secret1")).await;
        assert!(matches!(short_name, Err(ApiError::Validation(m)) if m.contains("Username")));

        let missing = register(&store, &keys, RegisterRequest::default()).await;
        assert!(matches!(missing, Err(ApiError::Validation(m)) if m == "All fields are required"));

        let bad_email = register(&store, &keys, register_req("nope", "alice", "secret1")).await;
        assert!(matches!(bad_email, Err(ApiError::Validation(_))));

        assert_eq!(store.user_count().await, 0);
    }

    #[tokio::test]
    async fn login_succeeds_with_right_password() {
        let store = MemoryStore::default();
        let keys = keys();
        let registered = register(&store, &keys, register_req("alice@x.com", "alice", "secret1"))
            .await
            .unwrap();

        let res = login(&store, &keys, login_req("alice@x.com", "secret1"))
            .await
            .unwrap();
        assert_eq!(res.user, registered.user);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let store = MemoryStore::default();
        let keys = keys();
        register(&store, &keys, register_req("alice@x.com", "alice", "secret1"))
            .await
            .unwrap();

        let wrong_pw = login(&store, &keys, login_req("alice@x.com", "nope-nope"))
            .await
            .unwrap_err();
        let unknown = login(&store, &keys, login_req("ghost@x.com", "secret1"))
            .await
            .unwrap_err();

        assert!(matches!(wrong_pw, ApiError::InvalidCredentials));
        assert!(matches!(unknown, ApiError::InvalidCredentials));
        assert_eq!(wrong_pw.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let store = MemoryStore::default();
        let err = login(&store, &keys(), LoginRequest {
            email: Some("alice@x.com".into()),
            password: None,
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("alice@x.com"));
        assert!(!is_valid_email("alice@x"));
        assert!(!is_valid_email("alice x@x.com"));
    }
}
