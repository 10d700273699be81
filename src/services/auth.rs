//! Authentication and user management service

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use sha2::{Digest, Sha256};
use validator::Validate;

use crate::{
    config::{AuthConfig, PasswordScheme},
    error::{AppError, AppResult},
    models::user::{
        NewUser, ResetPasswordRequest, Role, SessionClaims, SignupRequest, UserSummary,
    },
    repository::Repository,
    services::events::{DomainEvent, EventPublisher},
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
    events: Arc<dyn EventPublisher>,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig, events: Arc<dyn EventPublisher>) -> Self {
        Self {
            repository,
            config,
            events,
        }
    }

    /// Register a new user. The role comes from the admin allow-list.
    pub async fn signup(&self, request: SignupRequest) -> AppResult<UserSummary> {
        request.validate()?;

        let role = if self.config.is_admin_email(&request.email_id) {
            Role::Admin
        } else {
            Role::Visitor
        };

        let user = NewUser {
            password_hash: self.hash_password(&request.password)?,
            email_id: request.email_id,
            name: request.name,
            role,
        };

        self.repository.users.create(&user).await?;

        tracing::info!(email = %user.email_id, role = %role, "User registered");
        self.events.publish(DomainEvent::UserCreated {
            email_id: user.email_id.clone(),
        });

        Ok(UserSummary {
            email_id: user.email_id,
            name: user.name,
            role: user.role,
        })
    }

    /// Check credentials and issue a session token
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(String, UserSummary)> {
        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found, sign up to proceed".to_string()))?;

        if !self.verify_password(&user.password, password)? {
            return Err(AppError::InvalidCredentials("Invalid email or password".to_string()));
        }

        let token = self.create_token(&user.email_id, &user.name, user.role)?;

        tracing::info!(email = %user.email_id, "User logged in");
        self.events.publish(DomainEvent::UserLoggedIn {
            email_id: user.email_id.clone(),
        });

        Ok((token, user.into()))
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> AppResult<()> {
        request.validate()?;

        let password_hash = self.hash_password(&request.new_password)?;
        let updated = self
            .repository
            .users
            .update_password(&request.email_id, &password_hash)
            .await?;

        if !updated {
            return Err(AppError::NotFound("Email not found".to_string()));
        }

        tracing::info!(email = %request.email_id, "Password reset");
        self.events.publish(DomainEvent::PasswordReset {
            email_id: request.email_id,
        });

        Ok(())
    }

    pub async fn list_users(&self) -> AppResult<Vec<UserSummary>> {
        self.repository.users.list().await
    }

    pub async fn update_role(&self, email: &str, role: Role) -> AppResult<()> {
        if !self.repository.users.update_role(email, role).await? {
            return Err(AppError::NotFound(format!("User {} not found", email)));
        }

        tracing::info!(email = %email, role = %role, "Role updated");
        self.events.publish(DomainEvent::UserRoleUpdated {
            email_id: email.to_string(),
            role,
        });

        Ok(())
    }

    /// Require the caller to be an admin right now.
    ///
    /// The role is read from the store rather than the token, so a role
    /// change applies to tokens already issued.
    pub async fn require_admin(&self, caller: &SessionClaims) -> AppResult<()> {
        let user = self
            .repository
            .users
            .get_by_email(caller.email())
            .await?
            .ok_or_else(|| AppError::Unauthenticated("Account no longer exists".to_string()))?;

        if user.role != Role::Admin {
            tracing::warn!(email = %caller.email(), "Admin operation refused");
            return Err(AppError::Forbidden(
                "Administrator privileges required".to_string(),
            ));
        }

        Ok(())
    }

    /// Store round-trip for readiness checks
    pub async fn ready(&self) -> AppResult<()> {
        self.repository.users.ping().await
    }

    fn create_token(&self, email: &str, name: &str, role: Role) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = SessionClaims {
            sub: email.to_string(),
            name: name.to_string(),
            role,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Hash a password with the configured scheme
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        match self.config.password_scheme {
            PasswordScheme::Sha256 => Ok(sha256_hex(password)),
            PasswordScheme::Argon2 => {
                let salt = SaltString::generate(&mut OsRng);
                let hash = Argon2::default()
                    .hash_password(password.as_bytes(), &salt)
                    .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
                Ok(hash.to_string())
            }
        }
    }

    /// Verify a password against a stored digest of either scheme
    pub fn verify_password(&self, stored: &str, password: &str) -> AppResult<bool> {
        if stored.starts_with("$argon2") {
            let parsed_hash = PasswordHash::new(stored)
                .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
            return Ok(Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok());
        }

        Ok(stored == sha256_hex(password))
    }
}

fn sha256_hex(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::user::User,
        repository::{
            books::MockBooksStore, collections::MockCollectionsStore, users::MockUsersStore,
        },
        services::events::RecordingPublisher,
    };

    fn service(users: MockUsersStore, config: AuthConfig) -> (AuthService, Arc<RecordingPublisher>) {
        let repository = Repository::from_stores(
            Arc::new(users),
            Arc::new(MockBooksStore::new()),
            Arc::new(MockCollectionsStore::new()),
        );
        let events = Arc::new(RecordingPublisher::default());
        (AuthService::new(repository, config, events.clone()), events)
    }

    fn stored_user(password_hash: String) -> User {
        User {
            email_id: "ann@example.com".to_string(),
            name: "Ann".to_string(),
            password: password_hash,
            role: Role::Visitor,
        }
    }

    fn signup_request(email: &str) -> SignupRequest {
        SignupRequest {
            name: "Ann".to_string(),
            email_id: email.to_string(),
            password: "hunter2".to_string(),
        }
    }

    #[test]
    fn sha256_digest_is_deterministic_hex() {
        let (service, _) = service(MockUsersStore::new(), AuthConfig::default());
        let first = service.hash_password("hunter2").unwrap();
        let second = service.hash_password("hunter2").unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert_ne!(first, service.hash_password("hunter3").unwrap());
    }

    #[test]
    fn argon2_hashes_are_salted_and_still_verify() {
        let config = AuthConfig {
            password_scheme: PasswordScheme::Argon2,
            ..AuthConfig::default()
        };
        let (service, _) = service(MockUsersStore::new(), config);
        let first = service.hash_password("hunter2").unwrap();
        let second = service.hash_password("hunter2").unwrap();

        assert_ne!(first, second);
        assert!(service.verify_password(&first, "hunter2").unwrap());
        assert!(!service.verify_password(&first, "hunter3").unwrap());
        // legacy digests keep working after the switch
        assert!(service.verify_password(&sha256_hex("old"), "old").unwrap());
    }

    #[tokio::test]
    async fn signup_assigns_admin_role_from_allow_list() {
        let mut users = MockUsersStore::new();
        users
            .expect_create()
            .withf(|user| user.role == Role::Admin && user.password_hash == sha256_hex("hunter2"))
            .times(1)
            .returning(|_| Ok(()));
        let config = AuthConfig {
            admin_emails: vec!["boss@example.com".to_string()],
            ..AuthConfig::default()
        };
        let (service, events) = service(users, config);

        let user = service.signup(signup_request("boss@example.com")).await.unwrap();

        assert_eq!(user.role, Role::Admin);
        assert_eq!(
            events.events(),
            vec![DomainEvent::UserCreated {
                email_id: "boss@example.com".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn second_signup_with_same_email_is_rejected() {
        let mut users = MockUsersStore::new();
        let mut calls = 0;
        users.expect_create().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(())
            } else {
                Err(AppError::AlreadyExists("User already exists".to_string()))
            }
        });
        let (service, events) = service(users, AuthConfig::default());

        service.signup(signup_request("ann@example.com")).await.unwrap();
        let err = service.signup(signup_request("ann@example.com")).await.unwrap_err();

        assert!(matches!(err, AppError::AlreadyExists(_)));
        assert_eq!(events.events().len(), 1);
    }

    #[tokio::test]
    async fn blank_signup_never_reaches_the_store() {
        let mut users = MockUsersStore::new();
        users.expect_create().never();
        let (service, _) = service(users, AuthConfig::default());

        let mut request = signup_request("ann@example.com");
        request.password = "   ".to_string();

        assert!(matches!(
            service.signup(request).await,
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn login_succeeds_only_with_matching_password() {
        let mut users = MockUsersStore::new();
        users
            .expect_get_by_email()
            .returning(|_| Ok(Some(stored_user(sha256_hex("hunter2")))));
        let config = AuthConfig::default();
        let secret = config.jwt_secret.clone();
        let (service, events) = service(users, config);

        let err = service.login("ann@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials(_)));
        assert!(events.events().is_empty());

        let (token, user) = service.login("ann@example.com", "hunter2").await.unwrap();
        assert_eq!(user.name, "Ann");

        let claims = SessionClaims::from_token(&token, &secret).unwrap();
        assert_eq!(claims.email(), "ann@example.com");
        assert_eq!(claims.role, Role::Visitor);
        assert_eq!(events.events().len(), 1);
    }

    #[tokio::test]
    async fn login_for_unknown_email_is_not_found() {
        let mut users = MockUsersStore::new();
        users.expect_get_by_email().returning(|_| Ok(None));
        let (service, _) = service(users, AuthConfig::default());

        assert!(matches!(
            service.login("ghost@example.com", "x").await,
            Err(AppError::NotFound(_))
        ));
    }

    fn claims_with(role: Role) -> SessionClaims {
        let now = Utc::now().timestamp();
        SessionClaims {
            sub: "ann@example.com".to_string(),
            name: "Ann".to_string(),
            role,
            exp: now + 3600,
            iat: now,
        }
    }

    #[tokio::test]
    async fn admin_check_follows_stored_role_not_token() {
        let mut users = MockUsersStore::new();
        users
            .expect_get_by_email()
            .withf(|email| email == "ann@example.com")
            .returning(|_| Ok(Some(stored_user(sha256_hex("x")))));
        let (service, _) = service(users, AuthConfig::default());

        // token still says admin, store says visitor
        assert!(matches!(
            service.require_admin(&claims_with(Role::Admin)).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn promoted_user_passes_admin_check_with_old_token() {
        let mut users = MockUsersStore::new();
        users.expect_get_by_email().returning(|_| {
            let mut user = stored_user(sha256_hex("x"));
            user.role = Role::Admin;
            Ok(Some(user))
        });
        let (service, _) = service(users, AuthConfig::default());

        assert!(service.require_admin(&claims_with(Role::Visitor)).await.is_ok());
    }

    #[tokio::test]
    async fn admin_check_for_vanished_account_is_unauthenticated() {
        let mut users = MockUsersStore::new();
        users.expect_get_by_email().returning(|_| Ok(None));
        let (service, _) = service(users, AuthConfig::default());

        assert!(matches!(
            service.require_admin(&claims_with(Role::Admin)).await,
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn reset_password_for_unknown_email_is_not_found() {
        let mut users = MockUsersStore::new();
        users.expect_update_password().returning(|_, _| Ok(false));
        let (service, events) = service(users, AuthConfig::default());

        let request = ResetPasswordRequest {
            email_id: "ghost@example.com".to_string(),
            new_password: "fresh".to_string(),
        };

        assert!(matches!(
            service.reset_password(request).await,
            Err(AppError::NotFound(_))
        ));
        assert!(events.events().is_empty());
    }

    #[tokio::test]
    async fn reset_password_stores_digest_of_new_password() {
        let mut users = MockUsersStore::new();
        users
            .expect_update_password()
            .withf(|email, hash| email == "ann@example.com" && *hash == sha256_hex("fresh"))
            .times(1)
            .returning(|_, _| Ok(true));
        let (service, events) = service(users, AuthConfig::default());

        service
            .reset_password(ResetPasswordRequest {
                email_id: "ann@example.com".to_string(),
                new_password: "fresh".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(
            events.events(),
            vec![DomainEvent::PasswordReset {
                email_id: "ann@example.com".to_string()
            }]
        );
    }
}
