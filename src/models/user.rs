//! User model, roles and session claims

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

use super::not_blank;

/// User role, assigned at signup from the admin allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Visitor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Visitor => "visitor",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "visitor" => Ok(Role::Visitor),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

// SQLx conversion for Role (stored as TEXT)
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Full user row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub email_id: String,
    pub name: String,
    /// Password digest (SHA-256 hex or argon2 PHC string)
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
}

/// User as exposed over the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserSummary {
    pub email_id: String,
    pub name: String,
    pub role: Role,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        UserSummary {
            email_id: user.email_id,
            name: user.name,
            role: user.role,
        }
    }
}

/// Row to insert on signup
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email_id: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
}

/// Signup request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(custom(function = "not_blank"))]
    pub email_id: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email_id: String,
    pub password: String,
}

/// Reset password request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    pub email_id: String,
    #[validate(custom(function = "not_blank"))]
    pub new_password: String,
}

/// Role change request (admin only)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub email_id: String,
    pub role: Role,
}

/// JWT claims identifying the caller of a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User email, the unique user key
    pub sub: String,
    pub name: String,
    /// Role at login time. Privileged checks re-read the store.
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl SessionClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse and verify a JWT token (signature and expiry)
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn email(&self) -> &str {
        &self.sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn claims(role: Role, exp_offset: i64) -> SessionClaims {
        let now = Utc::now().timestamp();
        SessionClaims {
            sub: "ann@example.com".to_string(),
            name: "Ann".to_string(),
            role,
            exp: now + exp_offset,
            iat: now,
        }
    }

    #[test]
    fn token_round_trip_keeps_identity() {
        let token = claims(Role::Visitor, 3600).create_token("secret").unwrap();
        let parsed = SessionClaims::from_token(&token, "secret").unwrap();
        assert_eq!(parsed.email(), "ann@example.com");
        assert_eq!(parsed.name, "Ann");
        assert_eq!(parsed.role, Role::Visitor);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = claims(Role::Admin, 3600).create_token("secret").unwrap();
        assert!(SessionClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = claims(Role::Visitor, -3600).create_token("secret").unwrap();
        assert!(SessionClaims::from_token(&token, "secret").is_err());
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("visitor".parse::<Role>().unwrap(), Role::Visitor);
        assert!("librarian".parse::<Role>().is_err());
    }

    #[test]
    fn blank_signup_fields_fail_validation() {
        let request = SignupRequest {
            name: "  ".to_string(),
            email_id: "ann@example.com".to_string(),
            password: "pw".to_string(),
        };
        assert!(request.validate().is_err());
    }
}
