use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use model::entities::user;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::context::{RequestContext, Role};
use crate::error::{Result, ServiceError};

/// Tokens are valid for this many hours unless configured otherwise.
pub const DEFAULT_VALIDITY_HOURS: i64 = 24;

/// Claims embedded in every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: String,
    pub username: String,
    pub role: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiration, seconds since the epoch.
    pub exp: i64,
}

impl Claims {
    /// Builds the request context for a verified token.
    ///
    /// A role outside the known set is refused; a subject that is not a
    /// user id leaves the requester unresolved.
    pub fn context(&self) -> Result<RequestContext> {
        let role: Role = self.role.parse().map_err(|_| {
            debug!("Token carries unknown role '{}'", self.role);
            ServiceError::forbidden("Not allowed to access this resource")
        })?;

        Ok(RequestContext {
            requester_id: self.sub.parse().ok(),
            role,
        })
    }
}

/// A freshly signed bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Arc<[u8]>,
    validity: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"<redacted>")
            .field("validity", &self.validity)
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(secret: impl AsRef<[u8]>, validity: Duration) -> Self {
        Self {
            secret: Arc::from(secret.as_ref()),
            validity,
        }
    }

    pub fn issue(&self, user: &user::Model) -> Result<IssuedToken> {
        self.issue_at(user, Utc::now())
    }

    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub fn issue_at(&self, user: &user::Model, issued_at: DateTime<Utc>) -> Result<IssuedToken> {
        let expires_at = issued_at + self.validity;
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )?;
        debug!("Issued token for '{}' valid until {}", user.username, expires_at);

        Ok(IssuedToken { token, expires_at })
    }

    /// Checks signature and expiry and returns the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Rejected bearer token: {}", e);
                ServiceError::unauthorized("Invalid or expired token")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Status;
    use rust_decimal::Decimal;

    const SECRET: &str = "test secret for the loan api token issuer";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET, Duration::hours(DEFAULT_VALIDITY_HOURS))
    }

    fn accountant() -> user::Model {
        user::Model {
            id: 7,
            first_name: "Lika".to_string(),
            last_name: "Tsereteli".to_string(),
            username: "ltsereteli".to_string(),
            age: 41,
            salary: Decimal::new(6000, 0),
            is_blocked: false,
            password_hash: String::new(),
            role: Role::Accountant,
        }
    }

    fn sign(claims: &Claims) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issued_token_round_trips_identity() {
        let issued = issuer().issue(&accountant()).unwrap();
        let claims = issuer().verify(&issued.token).unwrap();

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.username, "ltsereteli");
        assert_eq!(claims.role, "Accountant");
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
        assert_eq!(claims.context().unwrap(), RequestContext::new(7, Role::Accountant));
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let issued_at = Utc::now() - Duration::hours(25);
        let issued = issuer().issue_at(&accountant(), issued_at).unwrap();

        let err = issuer().verify(&issued.token).unwrap_err();
        assert_eq!(err.status(), Status::Unauthorized);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_unauthorized() {
        let other = TokenIssuer::new("another secret", Duration::hours(1));
        let issued = other.issue(&accountant()).unwrap();

        let err = issuer().verify(&issued.token).unwrap_err();
        assert_eq!(err.status(), Status::Unauthorized);
        assert!(issuer().verify("not.a.token").is_err());
    }

    #[test]
    fn test_unknown_role_is_forbidden() {
        let now = Utc::now().timestamp();
        let token = sign(&Claims {
            sub: "3".to_string(),
            username: "someadmin".to_string(),
            role: "Admin".to_string(),
            iat: now,
            exp: now + 3600,
        });

        let claims = issuer().verify(&token).unwrap();
        assert_eq!(claims.context().unwrap_err().status(), Status::Forbidden);
    }

    #[test]
    fn test_non_numeric_subject_leaves_requester_unresolved() {
        let now = Utc::now().timestamp();
        let token = sign(&Claims {
            sub: "nobody".to_string(),
            username: "nobody".to_string(),
            role: "RegularUser".to_string(),
            iat: now,
            exp: now + 3600,
        });

        let ctx = issuer().verify(&token).unwrap().context().unwrap();
        assert_eq!(ctx, RequestContext::unresolved(Role::RegularUser));
    }

    #[test]
    fn test_debug_hides_secret() {
        assert!(!format!("{:?}", issuer()).contains(SECRET));
    }
}
